/// Box colors, cycled by detection index.
pub const PALETTE: [[u8; 3]; 10] = [
    [255, 56, 56],
    [255, 157, 151],
    [255, 112, 31],
    [255, 178, 29],
    [207, 210, 49],
    [72, 249, 10],
    [26, 147, 52],
    [0, 194, 255],
    [52, 69, 147],
    [203, 56, 255],
];

/// Palette color for the detection at `index`.
pub fn color_for(index: usize) -> [u8; 3] {
    PALETTE[index % PALETTE.len()]
}

/// Black or white, whichever reads better on `background`.
pub fn contrasting_text(background: [u8; 3]) -> [u8; 3] {
    let [r, g, b] = background.map(f32::from);
    let luma = 0.299 * r + 0.587 * g + 0.114 * b;
    if luma > 150.0 { [0, 0, 0] } else { [255, 255, 255] }
}
