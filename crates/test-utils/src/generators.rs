//! Generators for point sets and marker icons.

use base64::Engine;
use image::{ImageOutputFormat, Rgba, RgbaImage};
use mapa_common::PointSet;
use std::io::Cursor;

/// Creates a regular grid of points covering a bounding box.
///
/// `bbox` is (min_lon, min_lat, max_lon, max_lat). Points are emitted row by
/// row from the south-west corner, so the order is predictable.
pub fn create_point_grid(bbox: (f64, f64, f64, f64), rows: usize, cols: usize) -> PointSet {
    let (min_lon, min_lat, max_lon, max_lat) = bbox;
    let step = |min: f64, max: f64, n: usize, i: usize| {
        if n <= 1 {
            (min + max) / 2.0
        } else {
            min + (max - min) * i as f64 / (n - 1) as f64
        }
    };

    PointSet::from_pairs((0..rows).flat_map(|r| {
        (0..cols).map(move |c| {
            (
                step(min_lat, max_lat, rows, r),
                step(min_lon, max_lon, cols, c),
            )
        })
    }))
}

/// Creates `count` pseudo-random points inside a bounding box.
///
/// Uses a linear congruential generator so the same seed always gives the
/// same set.
pub fn create_scattered_points(bbox: (f64, f64, f64, f64), count: usize, seed: u32) -> PointSet {
    let (min_lon, min_lat, max_lon, max_lat) = bbox;
    let mut state = seed as u64 | 1;
    let mut next = move || {
        state = state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        (state >> 11) as f64 / (1u64 << 53) as f64
    };

    PointSet::from_pairs((0..count).map(|_| {
        let lat = min_lat + (max_lat - min_lat) * next();
        let lon = min_lon + (max_lon - min_lon) * next();
        (lat, lon)
    }))
}

/// Encodes a solid-colour square icon as PNG bytes.
pub fn create_icon_png(width: u32, height: u32, rgba: [u8; 4]) -> Vec<u8> {
    let img = RgbaImage::from_pixel(width, height, Rgba(rgba));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageOutputFormat::Png)
        .expect("Failed to encode test icon");
    out.into_inner()
}

/// A solid-colour icon wrapped in a `data:image/png;base64,` URI.
pub fn create_icon_data_uri(width: u32, height: u32, rgba: [u8; 4]) -> String {
    let png = create_icon_png(width, height, rgba);
    format!(
        "data:image/png;base64,{}",
        base64::engine::general_purpose::STANDARD.encode(png)
    )
}

/// RGBA pixels with a smooth gradient, so they do not fit a 256-colour
/// palette.
pub fn create_test_rgba_pixels(width: usize, height: usize) -> Vec<u8> {
    let mut pixels = Vec::with_capacity(width * height * 4);
    for y in 0..height {
        for x in 0..width {
            let r = ((x as f32 / width as f32) * 255.0) as u8;
            let g = ((y as f32 / height as f32) * 255.0) as u8;
            pixels.extend_from_slice(&[r, g, 128, 255]);
        }
    }
    pixels
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_grid_order_and_bounds() {
        let grid = create_point_grid((-50.0, -30.0, -40.0, -20.0), 2, 3);
        assert_eq!(grid.len(), 6);
        let first = grid.iter().next().unwrap();
        assert_eq!(first, (-30.0, -50.0));
        let last = grid.iter().last().unwrap();
        assert_eq!(last, (-20.0, -40.0));
    }

    #[test]
    fn test_scattered_points_are_deterministic_and_bounded() {
        let bbox = (-53.0, -25.5, -44.0, -19.5);
        let a = create_scattered_points(bbox, 100, 7);
        let b = create_scattered_points(bbox, 100, 7);
        assert_eq!(a, b);
        assert!(a
            .iter()
            .all(|(lat, lon)| (-25.5..=-19.5).contains(&lat) && (-53.0..=-44.0).contains(&lon)));
    }

    #[test]
    fn test_icon_data_uri_prefix() {
        let uri = create_icon_data_uri(4, 4, [255, 0, 0, 255]);
        assert!(uri.starts_with("data:image/png;base64,iVBOR"));
    }
}
