#![allow(dead_code)]

pub mod models;
pub mod synthetic_image;
