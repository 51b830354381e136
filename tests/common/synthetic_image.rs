use moe_fusion::image::ImageF32;

/// RGB image with a bright axis-aligned rectangle `[x1, x2) × [y1, y2)` on a
/// black background.
pub fn bright_rect(width: usize, height: usize, rect: (usize, usize, usize, usize)) -> ImageF32 {
    let (x1, y1, x2, y2) = rect;
    assert!(x1 < x2 && x2 <= width, "rectangle must fit horizontally");
    assert!(y1 < y2 && y2 <= height, "rectangle must fit vertically");

    let mut img = ImageF32::new(width, height, 3);
    for y in y1..y2 {
        for x in x1..x2 {
            for c in 0..3 {
                img.set(x, y, c, 0.9);
            }
        }
    }
    img
}
