use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::*;

#[derive(Debug, Deserialize, Serialize, Clone, Error)]
pub enum VideoInfoError {
    #[error("Error parsing stats: {0}")]
    JsonError(String),
    #[error("Error parsing stats: {0}")]
    ParseIntError(String),
    #[error("Error parsing stats: {0}")]
    ParseFloatError(String),
    #[error("Unexpected rotation in stream metadata: {0}")]
    Rotation(String),
}

impl From<serde_json::Error> for VideoInfoError {
    fn from(e: serde_json::Error) -> Self {
        //limit maximum number of characters
        let error_string = format!("{e}").chars().take(500).collect::<String>();
        VideoInfoError::JsonError(error_string)
    }
}

impl From<std::num::ParseIntError> for VideoInfoError {
    fn from(e: std::num::ParseIntError) -> Self {
        VideoInfoError::ParseIntError(format!("{e}"))
    }
}

impl From<std::num::ParseFloatError> for VideoInfoError {
    fn from(e: std::num::ParseFloatError) -> Self {
        VideoInfoError::ParseFloatError(format!("{e}"))
    }
}

// There is a slighty gotcha in ffmpeg where if the video metadata declares a rotation,
// raw (x, y) resolution in that metadata refers to the "unrotated" resolution. we must
// therefore swap the x and y values if the rotation is 90 or 270
#[derive(PartialEq, Eq, Clone, Copy, Debug, Default)]
enum Rotation {
    #[default]
    Upright,
    Sideways,
}

/// The video metadata needed to sample frames from a file, as reported by ffprobe.
#[derive(PartialEq, Clone, Debug, Serialize, Deserialize, Default)]
pub struct VideoInfo {
    duration: Duration,
    file_size: u64,
    resolution: (u32, u32),
    fps: f64,
    frame_count: u64,
}

impl VideoInfo {
    /// Use ffprobe to get the metadata of a video. If the video contains multiple streams then only
    /// information about the first video stream is returned.
    ///
    /// # errors
    /// * The file cannot be read or is not recognized as a video by ffprobe
    /// * The output from ffprobe could not be parsed as JSON
    /// * A field in the output had an unexpected type or value.
    pub fn new<P>(src_path: P) -> Result<Self, FfmpegError>
    where
        P: AsRef<Path>,
    {
        Self::with_timeout(src_path, DEFAULT_FFMPEG_TIMEOUT)
    }

    /// As [`VideoInfo::new`], but ffprobe is killed if it runs for longer than `timeout`.
    pub fn with_timeout<P>(src_path: P, timeout: Duration) -> Result<Self, FfmpegError>
    where
        P: AsRef<Path>,
    {
        let stats_string = get_video_stats(&src_path, timeout)?;
        let info = Self::from_ffprobe_json(&stats_string)?;
        log::trace!(
            target: "ffprobe",
            "{}: {:?}",
            src_path.as_ref().display(),
            info
        );
        Ok(info)
    }

    /// Interpret the JSON printed by `ffprobe -show_format -show_streams -print_format json`.
    pub fn from_ffprobe_json(stats_string: &str) -> Result<Self, VideoInfoError> {
        let stats_parsed: Value = serde_json::from_str(stats_string)?;

        let duration = match &stats_parsed["format"]["duration"] {
            Value::String(d) => Duration::try_from_secs_f64(d.parse::<f64>()?.max(0.0))
                .map_err(|e| VideoInfoError::ParseFloatError(format!("duration {d}: {e}")))?,
            _ => Duration::ZERO,
        };

        let file_size = match &stats_parsed["format"]["size"] {
            Value::String(s) => s.parse()?,
            _ => 0,
        };

        let first_video = Self::first_video(&stats_parsed);

        let rotation = match first_video {
            Some(stream) => Self::rotation(stream)?,
            None => Rotation::Upright,
        };

        let resolution = {
            let width = first_video.and_then(|s| Self::u32_field(s, "width")).unwrap_or(0);
            let height = first_video.and_then(|s| Self::u32_field(s, "height")).unwrap_or(0);

            match rotation {
                Rotation::Upright => (width, height),
                Rotation::Sideways => (height, width),
            }
        };

        // avg_frame_rate is 0/0 for some containers, in which case fall back to r_frame_rate.
        let fps = first_video
            .and_then(|s| {
                Self::rational_field(s, "avg_frame_rate")
                    .filter(|fps| *fps > 0.0)
                    .or_else(|| Self::rational_field(s, "r_frame_rate"))
            })
            .unwrap_or(0.0);

        let frame_count = match first_video.map(|s| &s["nb_frames"]) {
            Some(Value::String(n)) => n.parse()?,
            _ => (duration.as_secs_f64() * fps).floor() as u64,
        };

        Ok(VideoInfo {
            duration,
            file_size,
            resolution,
            fps,
            frame_count,
        })
    }

    /// The duration of the video
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// The size of the video in bytes
    pub fn file_size(&self) -> u64 {
        self.file_size
    }

    /// The resolution of the video in pixels.
    /// Note the returned value is correct for the orientation that the video is intended
    /// to be viewed. (Ffprobe returns a surprising value by default if the video is stored rotated)
    pub fn resolution(&self) -> (u32, u32) {
        self.resolution
    }

    /// Frames per second of the first video stream, or 0 if unknown.
    pub fn fps(&self) -> f64 {
        self.fps
    }

    /// Number of frames in the first video stream. Estimated from duration and fps when the
    /// container does not declare it.
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    fn first_video(stats_parsed: &Value) -> Option<&Value> {
        match &stats_parsed["streams"] {
            Value::Array(streams) => streams
                .iter()
                .find(|s| matches!(&s["codec_type"], Value::String(t) if t == "video")),
            _ => None,
        }
    }

    fn rotation(stream: &Value) -> Result<Rotation, VideoInfoError> {
        let raw = stream
            .get("side_data_list")
            .and_then(|list| list.get(0))
            .and_then(|side_data| side_data.get("rotation"));

        //the rotation may either be a JSON String or JSON number
        let degrees = match raw {
            None => return Ok(Rotation::Upright),
            Some(Value::Number(n)) => n
                .as_i64()
                .ok_or_else(|| VideoInfoError::Rotation(n.to_string()))?,
            Some(Value::String(s)) => s.trim().parse::<i64>()?,
            Some(other) => return Err(VideoInfoError::Rotation(other.to_string())),
        };

        match degrees.rem_euclid(360) {
            0 | 180 => Ok(Rotation::Upright),
            90 | 270 => Ok(Rotation::Sideways),
            _ => Err(VideoInfoError::Rotation(degrees.to_string())),
        }
    }

    fn u32_field(stream: &Value, field_name: &str) -> Option<u32> {
        match &stream[field_name] {
            Value::Number(v) => v.as_u64().and_then(|v| u32::try_from(v).ok()),
            _ => None,
        }
    }

    // ffprobe writes frame rates as "num/den" strings, e.g "30000/1001"
    fn rational_field(stream: &Value, field_name: &str) -> Option<f64> {
        let Value::String(raw) = &stream[field_name] else {
            return None;
        };

        let (num, den) = raw.split_once('/').unwrap_or((raw.as_str(), "1"));
        let num = num.trim().parse::<f64>().ok()?;
        let den = den.trim().parse::<f64>().ok()?;

        (den != 0.0).then(|| num / den)
    }
}
