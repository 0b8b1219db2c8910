use std::{path::Path, time::Duration};

use crate::{definitions::DEFAULT_SAMPLE_COUNT, VideoFeatures};

/// Produces the [`VideoFeatures`] of a video file.
///
/// Returning `None` means features are unavailable for this file (for example it is unreadable, has
/// no frames, or no decoder is installed). The file is then only matched by its content hash.
///
/// `progress` may be called with the fraction of the file's work that is complete, from 0.0 to 1.0.
///
/// Any `Fn(&Path) -> Option<VideoFeatures>` closure is a `FeatureExtractor` that does not report
/// progress.
pub trait FeatureExtractor {
    fn extract(&self, src_path: &Path, progress: &mut dyn FnMut(f64)) -> Option<VideoFeatures>;
}

impl<F> FeatureExtractor for F
where
    F: Fn(&Path) -> Option<VideoFeatures>,
{
    fn extract(&self, src_path: &Path, _progress: &mut dyn FnMut(f64)) -> Option<VideoFeatures> {
        self(src_path)
    }
}

/// The positions within a video to sample frames from, as fractions of its length.
///
/// A single sample is taken from the middle. Otherwise `n` samples are spread evenly, never
/// touching the very first or last frame.
#[must_use]
pub fn sample_positions(n: usize) -> Vec<f64> {
    match n {
        0 => vec![],
        1 => vec![0.5],
        n => {
            let step = 1.0 / (n + 1) as f64;
            (1..=n).map(|i| i as f64 * step).collect()
        }
    }
}

/// Options for how frames are sampled when extracting features with the default extractor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExtractionOptions {
    /// The number of frames sampled from each video. Must be at least 1.
    /// More samples make matching more reliable but take proportionally longer to extract.
    pub samples: usize,

    /// How long each invocation of ffprobe/ffmpeg may run before it is abandoned.
    pub timeout: Duration,
}

impl std::default::Default for ExtractionOptions {
    fn default() -> Self {
        Self {
            samples: DEFAULT_SAMPLE_COUNT,
            timeout: Duration::from_secs(60),
        }
    }
}

#[cfg(feature = "ffmpeg_backend")]
pub use ffmpeg_backend::FfmpegFeatureExtractor;

#[cfg(feature = "ffmpeg_backend")]
mod ffmpeg_backend {
    use std::path::Path;

    use ffmpeg_cmdline_utils::{read_frame_at, FfmpegError, VideoInfo};
    use log::{debug, warn};

    use super::{sample_positions, ExtractionOptions, FeatureExtractor};
    use crate::{frame_sample, Error, VideoFeatures, VideoMetadata};

    impl From<FfmpegError> for Error {
        fn from(e: FfmpegError) -> Self {
            match e {
                FfmpegError::Info(_) | FfmpegError::InvalidResolution => Error::NotVideo,
                other => Error::VidProc(other.to_string()),
            }
        }
    }

    /// Extracts features by calling the `ffprobe` and `ffmpeg` command line tools, which must be
    /// installed and visible on the `PATH`.
    ///
    /// Recommend to always use [`FfmpegFeatureExtractor::default`] unless supplying custom options.
    #[derive(Debug, Clone, Default)]
    pub struct FfmpegFeatureExtractor {
        options: ExtractionOptions,
    }

    impl FfmpegFeatureExtractor {
        /// Create an extractor with the selected [`ExtractionOptions`]
        ///
        /// # Panics
        /// If `options.samples` is 0.
        pub fn from_options(options: ExtractionOptions) -> Self {
            assert!(options.samples >= 1, "at least one frame must be sampled");
            Self { options }
        }

        pub fn options(&self) -> &ExtractionOptions {
            &self.options
        }

        /// Like [`FeatureExtractor::extract`], but says why features are unavailable.
        ///
        /// # Errors
        /// * ffprobe does not recognise the file as a video, or ffmpeg is not installed.
        /// * The video has no frames or a non-positive duration.
        /// * None of the sampled frames could be decoded.
        pub fn try_extract(
            &self,
            src_path: &Path,
            progress: &mut dyn FnMut(f64),
        ) -> Result<VideoFeatures, Error> {
            let info = VideoInfo::with_timeout(src_path, self.options.timeout)?;

            let duration = info.duration().as_secs_f64();
            let frame_count = info.frame_count();
            if frame_count == 0 || duration <= 0.0 {
                return Err(Error::NoFrames);
            }

            let (width, height) = info.resolution();
            if width == 0 || height == 0 {
                return Err(Error::NotVideo);
            }

            let positions = sample_positions(self.options.samples);
            let num_positions = positions.len();
            let mut samples = Vec::with_capacity(num_positions);

            for (i, position) in positions.into_iter().enumerate() {
                // Seek to the start of the frame nearest to the position.
                let frame_no = (position * frame_count as f64).floor();
                let timestamp = if info.fps() > 0.0 {
                    frame_no / info.fps()
                } else {
                    position * duration
                };

                match read_frame_at(src_path, timestamp, (width, height), self.options.timeout) {
                    Ok(frame) => samples.push(frame_sample(position, &frame)),
                    Err(e) => debug!(
                        target: "feature_extraction",
                        "{}: no frame at {timestamp:.3}s: {e}",
                        src_path.display()
                    ),
                }

                progress((i + 1) as f64 / num_positions as f64);
            }

            if samples.is_empty() {
                return Err(Error::NoFrames);
            }

            let metadata = VideoMetadata {
                duration,
                resolution: (width, height),
                fps: info.fps(),
                file_size: info.file_size(),
            };

            VideoFeatures::from_samples(src_path, metadata, samples)
        }
    }

    impl FeatureExtractor for FfmpegFeatureExtractor {
        fn extract(&self, src_path: &Path, progress: &mut dyn FnMut(f64)) -> Option<VideoFeatures> {
            match self.try_extract(src_path, progress) {
                Ok(features) => Some(features),
                Err(e) => {
                    warn!(
                        target: "feature_extraction",
                        "Features unavailable for {}: {e}",
                        src_path.display()
                    );
                    None
                }
            }
        }
    }
}
