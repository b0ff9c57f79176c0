use std::path::Path;

use image::{Rgb, RgbImage};

use crate::error::EvalError;

/// Cityscapes train-id colors: road, sidewalk, building, wall, fence, pole,
/// traffic light, traffic sign, vegetation, terrain, sky, person, rider,
/// car, truck, bus, train, motorcycle, bicycle.
pub const CITYSCAPES_COLORS: [[u8; 3]; 19] = [
    [128, 64, 128],
    [244, 35, 232],
    [70, 70, 70],
    [102, 102, 156],
    [190, 153, 153],
    [153, 153, 153],
    [250, 170, 30],
    [220, 220, 0],
    [107, 142, 35],
    [152, 251, 152],
    [70, 130, 180],
    [220, 20, 60],
    [255, 0, 0],
    [0, 0, 142],
    [0, 0, 70],
    [0, 60, 100],
    [0, 80, 100],
    [0, 0, 230],
    [119, 11, 32],
];

/// Turns a flat row-major label map into a color image. Ids beyond the
/// palette render as black.
pub fn decode_labels(labels: &[u32], width: u32, height: u32) -> RgbImage {
    debug_assert_eq!(labels.len(), (width * height) as usize);

    RgbImage::from_fn(width, height, |x, y| {
        let class = labels[(y * width + x) as usize] as usize;
        match CITYSCAPES_COLORS.get(class) {
            Some(&color) => Rgb(color),
            None => Rgb([0, 0, 0]),
        }
    })
}

/// Decodes `labels` and writes the result as a PNG.
pub fn save_mask(labels: &[u32], width: u32, height: u32, path: &Path) -> Result<(), EvalError> {
    decode_labels(labels, width, height)
        .save(path)
        .map_err(|source| EvalError::MaskWrite {
            path: path.to_path_buf(),
            source,
        })
}
