//! Conservative screen-space footprint of a projected triangle
//!
//! Rows run from the floor of the topmost vertex to the ceiling of the
//! bottommost one. Each row's span takes the x of the long edge and of the
//! active short edge (upper before the middle vertex, lower after it),
//! widened outward to whole pixels. Everything is clamped to the buffer.

use image::{Rgb, RgbImage};
use sightline_core::Point2f;

const FLAT_EDGE_HEIGHT: f32 = 1e-6;

/// Horizontal extent of edge `p -> q` at row `y`. Flat edges cover both
/// endpoints; rows outside the edge's vertical range clamp to its ends.
fn edge_span(p: &Point2f, q: &Point2f, y: f32) -> (f32, f32) {
    let height = q.y - p.y;
    if height.abs() < FLAT_EDGE_HEIGHT {
        return (p.x.min(q.x), p.x.max(q.x));
    }
    let t = ((y - p.y) / height).clamp(0.0, 1.0);
    let x = p.x + (q.x - p.x) * t;
    (x, x)
}

/// Pixels `(x, y)` covered by the triangle with the given screen corners
/// (x right, y down), clamped to a `width` x `height` buffer.
pub fn footprint_pixels(corners: &[Point2f; 3], width: u32, height: u32) -> Vec<(u32, u32)> {
    if width == 0 || height == 0 || corners.iter().any(|c| !c.x.is_finite() || !c.y.is_finite()) {
        return Vec::new();
    }

    let mut sorted = *corners;
    sorted.sort_by(|a, b| a.y.total_cmp(&b.y));
    let [top, middle, bottom] = sorted;

    let max_x = i64::from(width) - 1;
    let max_y = i64::from(height) - 1;
    let first_row = (top.y.floor() as i64).max(0);
    let last_row = (bottom.y.ceil() as i64).min(max_y);

    let mut pixels = Vec::new();
    for row in first_row..=last_row {
        let y = row as f32;
        let (long_min, long_max) = edge_span(&top, &bottom, y);
        let (short_min, short_max) = if y < middle.y {
            edge_span(&top, &middle, y)
        } else {
            edge_span(&middle, &bottom, y)
        };

        let left = (long_min.min(short_min).floor() as i64).max(0);
        let right = (long_max.max(short_max).ceil() as i64).min(max_x);
        for column in left..=right {
            pixels.push((column as u32, row as u32));
        }
    }
    pixels
}

/// Whether any footprint pixel carries exactly the marker color
pub fn sample_footprint(image: &RgbImage, pixels: &[(u32, u32)], marker: Rgb<u8>) -> bool {
    pixels
        .iter()
        .any(|&(x, y)| x < image.width() && y < image.height() && *image.get_pixel(x, y) == marker)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    const WHITE: Rgb<u8> = Rgb([255, 255, 255]);

    #[test]
    fn test_footprint_covers_vertices_and_interior() {
        let corners = [
            Point2f::new(10.2, 4.7),
            Point2f::new(3.5, 20.1),
            Point2f::new(18.9, 15.3),
        ];
        let pixels: HashSet<_> = footprint_pixels(&corners, 32, 32).into_iter().collect();
        for c in &corners {
            assert!(pixels.contains(&(c.x.floor() as u32, c.y.floor() as u32)));
        }
        // Centroid
        assert!(pixels.contains(&(10, 13)));
        // Far corner is outside
        assert!(!pixels.contains(&(30, 1)));
    }

    #[test]
    fn test_footprint_is_clamped() {
        let corners = [
            Point2f::new(-20.0, -5.0),
            Point2f::new(40.0, 3.0),
            Point2f::new(5.0, 50.0),
        ];
        let pixels = footprint_pixels(&corners, 16, 16);
        assert!(!pixels.is_empty());
        assert!(pixels.iter().all(|&(x, y)| x < 16 && y < 16));
    }

    #[test]
    fn test_offscreen_triangle_has_no_pixels() {
        let corners = [
            Point2f::new(-30.0, 2.0),
            Point2f::new(-10.0, 4.0),
            Point2f::new(-20.0, 9.0),
        ];
        assert!(footprint_pixels(&corners, 16, 16).is_empty());
    }

    #[test]
    fn test_flat_triangle_keeps_its_row() {
        let corners = [
            Point2f::new(2.0, 5.0),
            Point2f::new(9.0, 5.0),
            Point2f::new(4.0, 5.0),
        ];
        let pixels = footprint_pixels(&corners, 16, 16);
        for x in 2..=9 {
            assert!(pixels.contains(&(x, 5)));
        }
    }

    #[test]
    fn test_sample_footprint() {
        let mut image = RgbImage::new(8, 8);
        image.put_pixel(3, 4, WHITE);
        assert!(sample_footprint(&image, &[(0, 0), (3, 4)], WHITE));
        assert!(!sample_footprint(&image, &[(0, 0), (4, 4)], WHITE));
        assert!(!sample_footprint(&image, &[(3, 4)], Rgb([254, 255, 255])));
        assert!(!sample_footprint(&image, &[(100, 4)], WHITE));
    }
}
