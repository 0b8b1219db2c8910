use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{definitions::*, Error};

// Positions that differ by at most POSITION_WINDOW are aligned. The slack absorbs rounding in
// positions such as 0.4 - 0.3.
const POSITION_SLACK: f64 = 1e-9;

/// Whole-file properties reported by a feature extractor.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct VideoMetadata {
    /// Unit: Seconds
    pub duration: f64,
    /// (width, height) in pixels.
    pub resolution: (u32, u32),
    pub fps: f64,
    /// Unit: Bytes
    pub file_size: u64,
}

/// The features of one decoded frame.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FrameSample {
    /// Where the frame was taken from, as a fraction of the video's length. Must lie in (0, 1).
    pub position: f64,
    /// L1-normalized colour histogram.
    pub histogram: Vec<f32>,
    /// Structural descriptor with values in [0, 1].
    pub descriptor: Vec<f32>,
    /// Mean pixel value of each RGB channel.
    pub mean_color: [f32; 3],
}

/// Perceptual features sampled from a handful of positions within one video.
///
/// Created once per file by a [`crate::FeatureExtractor`] and never modified afterwards. Two
/// feature sets are compared with [`VideoFeatures::similarity`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoFeatures {
    src_path: PathBuf,
    metadata: VideoMetadata,
    positions: Vec<f64>,
    histograms: Vec<Vec<f32>>,
    descriptors: Vec<Vec<f32>>,
    average_color: [f32; 3],
}

impl VideoFeatures {
    /// Assemble features from the frames that were successfully sampled. A frame that could not
    /// be decoded should simply be left out.
    ///
    /// # Errors
    /// * `samples` is empty.
    /// * A position lies outside (0, 1), or the positions are not strictly increasing.
    /// * The duration is negative or not finite.
    /// * The resolution has a zero width or height.
    pub fn from_samples(
        src_path: impl Into<PathBuf>,
        metadata: VideoMetadata,
        samples: Vec<FrameSample>,
    ) -> Result<Self, Error> {
        if samples.is_empty() {
            return Err(Error::InvalidFeatures("no frame samples".to_string()));
        }

        if !(metadata.duration.is_finite() && metadata.duration >= 0.0) {
            return Err(Error::InvalidFeatures(format!(
                "invalid duration {}",
                metadata.duration
            )));
        }

        let (width, height) = metadata.resolution;
        if width == 0 || height == 0 {
            return Err(Error::InvalidFeatures(format!(
                "invalid resolution {width}x{height}"
            )));
        }

        if let Some(bad) = samples
            .iter()
            .find(|s| !(s.position > 0.0 && s.position < 1.0))
        {
            return Err(Error::InvalidFeatures(format!(
                "sample position {} is outside (0, 1)",
                bad.position
            )));
        }

        if samples.windows(2).any(|w| w[0].position >= w[1].position) {
            return Err(Error::InvalidFeatures(
                "sample positions are not strictly increasing".to_string(),
            ));
        }

        let n = samples.len() as f32;
        let average_color = samples.iter().fold([0.0f32; 3], |acc, s| {
            [
                acc[0] + s.mean_color[0] / n,
                acc[1] + s.mean_color[1] / n,
                acc[2] + s.mean_color[2] / n,
            ]
        });

        let mut positions = Vec::with_capacity(samples.len());
        let mut histograms = Vec::with_capacity(samples.len());
        let mut descriptors = Vec::with_capacity(samples.len());
        for sample in samples {
            positions.push(sample.position);
            histograms.push(sample.histogram);
            descriptors.push(sample.descriptor);
        }

        Ok(Self {
            src_path: src_path.into(),
            metadata,
            positions,
            histograms,
            descriptors,
            average_color,
        })
    }

    pub fn src_path(&self) -> &Path {
        &self.src_path
    }

    pub fn metadata(&self) -> &VideoMetadata {
        &self.metadata
    }

    /// Unit: Seconds
    pub fn duration(&self) -> f64 {
        self.metadata.duration
    }

    pub fn resolution(&self) -> (u32, u32) {
        self.metadata.resolution
    }

    pub fn fps(&self) -> f64 {
        self.metadata.fps
    }

    pub fn file_size(&self) -> u64 {
        self.metadata.file_size
    }

    /// Estimated from duration and frame rate.
    pub fn frame_count(&self) -> f64 {
        self.metadata.duration * self.metadata.fps
    }

    pub fn positions(&self) -> &[f64] {
        &self.positions
    }

    pub fn histograms(&self) -> &[Vec<f32>] {
        &self.histograms
    }

    pub fn descriptors(&self) -> &[Vec<f32>] {
        &self.descriptors
    }

    pub fn average_color(&self) -> [f32; 3] {
        self.average_color
    }

    /// Score how alike two videos are, from 0.0 (unrelated) to 1.0 (indistinguishable).
    ///
    /// Videos whose durations differ by more than 10% of the longer one always score 0.0.
    /// Otherwise the score is a weighted sum of duration, resolution, histogram and descriptor
    /// similarity, where frames are only compared against frames from nearby positions.
    ///
    /// Frames are matched by walking `self`'s positions. When both videos were sampled at the same
    /// positions, and those positions are further apart than the alignment window (fewer than 9
    /// samples from [`crate::sample_positions`]), every frame only meets its counterpart and the
    /// score is exactly symmetric. Otherwise it is approximately symmetric.
    #[must_use]
    pub fn similarity(&self, other: &Self) -> f64 {
        let duration_sim = duration_similarity(self.duration(), other.duration());
        if duration_sim < DURATION_GATE {
            return 0.0;
        }

        let resolution_sim = resolution_similarity(self.resolution(), other.resolution());

        let histogram_sim = self.aligned_mean(other, |i, j| {
            histogram_intersection(&self.histograms[i], &other.histograms[j])
        });

        let descriptor_sim = self.aligned_mean(other, |i, j| {
            cosine_similarity(&self.descriptors[i], &other.descriptors[j])
        });

        let score = DURATION_WEIGHT * duration_sim
            + RESOLUTION_WEIGHT * resolution_sim
            + HISTOGRAM_WEIGHT * histogram_sim
            + DESCRIPTOR_WEIGHT * descriptor_sim;

        score.clamp(0.0, 1.0)
    }

    // For each of self's positions, the best score against any of other's positions within the
    // window. Averaged over the positions that had a candidate at all.
    fn aligned_mean(&self, other: &Self, score: impl Fn(usize, usize) -> f64) -> f64 {
        let best_matches = self
            .positions
            .iter()
            .enumerate()
            .filter_map(|(i, pos)| {
                other
                    .positions
                    .iter()
                    .enumerate()
                    .filter(|(_j, other_pos)| {
                        (pos - *other_pos).abs() <= POSITION_WINDOW + POSITION_SLACK
                    })
                    .map(|(j, _other_pos)| score(i, j))
                    .reduce(f64::max)
            })
            .collect::<Vec<_>>();

        if best_matches.is_empty() {
            0.0
        } else {
            best_matches.iter().sum::<f64>() / best_matches.len() as f64
        }
    }
}

pub(crate) fn duration_similarity(a: f64, b: f64) -> f64 {
    let longest = a.max(b).max(1.0);
    (1.0 - (a - b).abs() / longest).max(0.0)
}

/// Area of the overlap of two resolutions divided by the area of their bounding box.
pub(crate) fn resolution_similarity((wa, ha): (u32, u32), (wb, hb): (u32, u32)) -> f64 {
    let enclosing = f64::from(wa.max(wb)) * f64::from(ha.max(hb));
    let overlap = f64::from(wa.min(wb)) * f64::from(ha.min(hb));

    if overlap == 0.0 {
        0.0
    } else {
        overlap / enclosing
    }
}

pub(crate) fn histogram_intersection(a: &[f32], b: &[f32]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| f64::from(x.min(*y)))
        .sum()
}

// Two all-zero vectors are identical and score 1.0. A zero vector against anything else scores 0.0.
pub(crate) fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    let (dot, norm_a, norm_b) = a.iter().zip(b).fold((0.0, 0.0, 0.0), |(dot, na, nb), (x, y)| {
        let (x, y) = (f64::from(*x), f64::from(*y));
        (dot + x * y, na + x * x, nb + y * y)
    });

    match (norm_a == 0.0, norm_b == 0.0) {
        (true, true) => 1.0,
        (true, false) | (false, true) => 0.0,
        (false, false) => dot / (norm_a.sqrt() * norm_b.sqrt()),
    }
}

#[cfg(test)]
pub mod test_util {
    use rand::prelude::*;

    use super::*;
    use crate::{
        definitions::{DESCRIPTOR_LEN, HISTOGRAM_LEN},
        sample_positions,
    };

    pub fn random_sample(rng: &mut StdRng, position: f64) -> FrameSample {
        let raw = (0..HISTOGRAM_LEN).map(|_| rng.gen::<f32>()).collect::<Vec<_>>();
        let total = raw.iter().sum::<f32>();
        FrameSample {
            position,
            histogram: raw.into_iter().map(|v| v / total).collect(),
            descriptor: (0..DESCRIPTOR_LEN).map(|_| rng.gen::<f32>()).collect(),
            mean_color: [(); 3].map(|_| rng.gen_range(0.0..255.0)),
        }
    }

    pub fn metadata(duration: f64) -> VideoMetadata {
        VideoMetadata {
            duration,
            resolution: (1920, 1080),
            fps: 25.0,
            file_size: 1_000_000,
        }
    }

    pub fn random_features(rng: &mut StdRng, duration: f64, samples: usize) -> VideoFeatures {
        let samples = sample_positions(samples)
            .into_iter()
            .map(|pos| random_sample(rng, pos))
            .collect();
        VideoFeatures::from_samples("random.mp4", metadata(duration), samples).unwrap()
    }

    /// A copy of `features` with every histogram and descriptor value nudged by up to `noise`.
    pub fn perturbed(rng: &mut StdRng, features: &VideoFeatures, noise: f32) -> VideoFeatures {
        let mut ret = features.clone();
        for v in ret.histograms.iter_mut().chain(ret.descriptors.iter_mut()).flatten() {
            *v = (*v + rng.gen_range(-noise..=noise)).max(0.0);
        }
        ret
    }
}
