//! Per-frame feature computation. These functions only see decoded RGB frames, so they are
//! independent of whichever backend decoded the video.

use image::{
    imageops::{self, FilterType},
    RgbImage,
};
use imageproc::edges::canny;

use crate::{definitions::*, FrameSample};

/// Compute every feature of one decoded frame taken from `position` within its video.
#[must_use]
pub fn frame_sample(position: f64, frame: &RgbImage) -> FrameSample {
    let mut descriptor = Vec::with_capacity(DESCRIPTOR_LEN);
    descriptor.extend(edge_map(frame));
    descriptor.extend(color_map(frame));

    FrameSample {
        position,
        histogram: hue_saturation_histogram(frame),
        descriptor,
        mean_color: mean_color(frame),
    }
}

/// Convert one pixel to 8 bit HSV hue and saturation, with hue in [0, 180) and saturation
/// in [0, 255].
fn hue_saturation([r, g, b]: [u8; 3]) -> (f32, f32) {
    let (r, g, b) = (f32::from(r), f32::from(g), f32::from(b));
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let saturation = if max == 0.0 { 0.0 } else { delta * 255.0 / max };

    let hue_degrees = if delta == 0.0 {
        0.0
    } else if max == r {
        60.0 * (g - b) / delta
    } else if max == g {
        120.0 + 60.0 * (b - r) / delta
    } else {
        240.0 + 60.0 * (r - g) / delta
    };

    (hue_degrees.rem_euclid(360.0) / 2.0, saturation)
}

fn bin(value: f32, range: f32, bins: usize) -> usize {
    ((value / range * bins as f32) as usize).min(bins - 1)
}

/// HUE_BINS x SAT_BINS histogram of hue against saturation, L1-normalized. Laid out row-major by hue.
pub(crate) fn hue_saturation_histogram(frame: &RgbImage) -> Vec<f32> {
    let mut histogram = vec![0.0f32; HISTOGRAM_LEN];

    for pixel in frame.pixels() {
        let (hue, sat) = hue_saturation(pixel.0);
        let idx = bin(hue, HUE_RANGE, HUE_BINS) * SAT_BINS + bin(sat, SAT_RANGE, SAT_BINS);
        histogram[idx] += 1.0;
    }

    let total = histogram.iter().sum::<f32>();
    if total > 0.0 {
        histogram.iter_mut().for_each(|v| *v /= total);
    }
    histogram
}

/// Canny edges of the frame, downsampled to DESCRIPTOR_X x DESCRIPTOR_Y and scaled to [0, 1].
pub(crate) fn edge_map(frame: &RgbImage) -> Vec<f32> {
    let gray = imageops::grayscale(frame);
    let edges = canny(&gray, CANNY_LOW_THRESHOLD, CANNY_HIGH_THRESHOLD);
    let small = imageops::resize(&edges, DESCRIPTOR_X, DESCRIPTOR_Y, FilterType::Triangle);

    small.as_raw().iter().map(|v| f32::from(*v) / 255.0).collect()
}

/// The frame downsampled to DESCRIPTOR_X x DESCRIPTOR_Y, flattened as RGBRGB... and scaled to [0, 1].
pub(crate) fn color_map(frame: &RgbImage) -> Vec<f32> {
    let small = imageops::resize(frame, DESCRIPTOR_X, DESCRIPTOR_Y, FilterType::Triangle);

    small.as_raw().iter().map(|v| f32::from(*v) / 255.0).collect()
}

pub(crate) fn mean_color(frame: &RgbImage) -> [f32; 3] {
    let num_pixels = u64::from(frame.width()) * u64::from(frame.height());
    if num_pixels == 0 {
        return [0.0; 3];
    }

    let sums = frame.pixels().fold([0u64; 3], |acc, p| {
        [
            acc[0] + u64::from(p[0]),
            acc[1] + u64::from(p[1]),
            acc[2] + u64::from(p[2]),
        ]
    });

    sums.map(|s| (s as f64 / num_pixels as f64) as f32)
}

#[cfg(test)]
mod test {
    use image::Rgb;

    use super::*;

    fn solid(color: [u8; 3]) -> RgbImage {
        RgbImage::from_pixel(32, 24, Rgb(color))
    }

    #[test]
    fn test_hue_saturation_of_primaries() {
        assert_eq!(hue_saturation([255, 0, 0]), (0.0, 255.0));
        assert_eq!(hue_saturation([0, 255, 0]), (60.0, 255.0));
        assert_eq!(hue_saturation([0, 0, 255]), (120.0, 255.0));
        assert_eq!(hue_saturation([255, 0, 255]), (150.0, 255.0));
        assert_eq!(hue_saturation([128, 128, 128]), (0.0, 0.0));
        assert_eq!(hue_saturation([0, 0, 0]), (0.0, 0.0));
    }

    #[test]
    fn test_histogram_is_normalized() {
        let mut frame = solid([0, 0, 255]);
        for x in 0..16 {
            for y in 0..24 {
                frame.put_pixel(x, y, Rgb([255, 0, 0]));
            }
        }

        let hist = hue_saturation_histogram(&frame);
        assert_eq!(hist.len(), HISTOGRAM_LEN);
        assert!((hist.iter().sum::<f32>() - 1.0).abs() < 1e-6);

        // red: hue bin 0, blue: hue 120 -> bin 5. Both fully saturated.
        assert_eq!(hist[SAT_BINS - 1], 0.5);
        assert_eq!(hist[5 * SAT_BINS + SAT_BINS - 1], 0.5);
    }

    #[test]
    fn test_flat_frame_has_no_edges() {
        let edges = edge_map(&solid([40, 80, 120]));
        assert_eq!(edges.len(), EDGE_MAP_LEN);
        assert!(edges.iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_sharp_boundary_produces_edges() {
        let frame = RgbImage::from_fn(64, 64, |x, _y| {
            if x < 32 {
                Rgb([0, 0, 0])
            } else {
                Rgb([255, 255, 255])
            }
        });

        let edges = edge_map(&frame);
        assert!(edges.iter().any(|v| *v > 0.0));
        assert!(edges.iter().all(|v| (0.0..=1.0).contains(v)));
    }

    #[test]
    fn test_descriptor_layout() {
        let sample = frame_sample(0.5, &solid([255, 0, 51]));

        assert_eq!(sample.position, 0.5);
        assert_eq!(sample.descriptor.len(), DESCRIPTOR_LEN);
        assert_eq!(&sample.descriptor[EDGE_MAP_LEN..EDGE_MAP_LEN + 3], &[1.0, 0.0, 0.2]);
        assert_eq!(sample.mean_color, [255.0, 0.0, 51.0]);
    }
}
