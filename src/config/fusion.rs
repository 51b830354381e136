//! Runtime configuration for `fusion_demo`.
//!
//! ```json
//! {
//!   "input_path": "frame.png",
//!   "output": { "json_out": "out/report.json", "format": "both" },
//!   "params": { "conf_threshold": 0.3, "iou_threshold": 0.55 },
//!   "models": {
//!     "gate_weights": [0.8, 0.2],
//!     "experts": [
//!       { "name": "day", "detections": [
//!         { "box": { "x1": 10, "y1": 10, "x2": 50, "y2": 50 }, "confidence": 0.9, "label": 0 }
//!       ] },
//!       { "name": "night" }
//!     ]
//!   }
//! }
//! ```
use crate::detector::FusionParams;
use crate::error::{ConfigError, FusionError};
use crate::models::{ExpertDetector, ExpertPool, FixedExpert, FixedGate, GateWeights};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Both,
}

impl OutputFormat {
    pub fn includes_text(self) -> bool {
        matches!(self, Self::Text | Self::Both)
    }

    pub fn includes_json(self) -> bool {
        matches!(self, Self::Json | Self::Both)
    }
}

impl FromStr for OutputFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            "both" => Ok(Self::Both),
            other => Err(ConfigError::Usage(format!(
                "unknown format '{other}', expected text|json|both"
            ))),
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub json_out: Option<PathBuf>,
    pub format: OutputFormat,
}

/// Constant gate weights and expert outputs standing in for real models.
#[derive(Clone, Debug, Deserialize)]
pub struct ModelsConfig {
    pub gate_weights: GateWeights,
    pub experts: Vec<FixedExpert>,
}

impl ModelsConfig {
    /// Build the gate and the expert pool described by this config.
    pub fn build(&self) -> Result<(FixedGate, ExpertPool), FusionError> {
        self.gate_weights.ensure_len(self.experts.len())?;
        let experts = self
            .experts
            .iter()
            .cloned()
            .map(|e| Box::new(e) as Box<dyn ExpertDetector>)
            .collect();
        Ok((FixedGate::new(self.gate_weights.clone()), ExpertPool::new(experts)?))
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct RuntimeConfig {
    pub input_path: PathBuf,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub params: FusionParams,
    pub models: ModelsConfig,
}

pub fn load_config(path: &Path) -> Result<RuntimeConfig, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let config: RuntimeConfig =
        serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
    config.params.validate()?;
    Ok(config)
}

/// Parse `<config.json> [--format text|json|both]`; the flag overrides the
/// format stored in the config file.
pub fn parse_cli<I>(program: &str, args: I) -> Result<RuntimeConfig, ConfigError>
where
    I: IntoIterator<Item = String>,
{
    let usage = || {
        ConfigError::Usage(format!(
            "usage: {program} <config.json> [--format text|json|both]"
        ))
    };
    let mut config_path: Option<PathBuf> = None;
    let mut format: Option<OutputFormat> = None;

    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--format" => {
                let value = args.next().ok_or_else(usage)?;
                format = Some(value.parse()?);
            }
            "-h" | "--help" => return Err(usage()),
            _ if config_path.is_none() && !arg.starts_with('-') => {
                config_path = Some(PathBuf::from(&arg))
            }
            _ => return Err(usage()),
        }
    }

    let mut config = load_config(&config_path.ok_or_else(usage)?)?;
    if let Some(format) = format {
        config.output.format = format;
    }
    Ok(config)
}
