use std::{
    ffi::OsStr,
    io::Read,
    path::Path,
    process::{Child, Command, Stdio},
    thread::JoinHandle,
    time::Duration,
};

#[cfg(target_family = "windows")]
use std::os::windows::process::CommandExt;

use image::RgbImage;
use wait_timeout::ChildExt;
use FfmpegCommandName::*;
use FfmpegError::*;

use crate::*;

/// How long a single ffprobe/ffmpeg invocation may run before it is killed.
pub const DEFAULT_FFMPEG_TIMEOUT: Duration = Duration::from_secs(60);

/// Decode the single frame that is presented at `timestamp_secs` into an RGB image.
///
/// The caller supplies the resolution (normally from [`VideoInfo::resolution`]) so that the raw
/// bytes written by ffmpeg can be reassembled into an image.
pub fn read_frame_at(
    src_path: impl AsRef<Path>,
    timestamp_secs: f64,
    resolution: (u32, u32),
    timeout: Duration,
) -> Result<RgbImage, FfmpegError> {
    let (x, y) = resolution;
    if x == 0 || y == 0 {
        return Err(InvalidResolution);
    }

    let expected = (x as usize)
        .checked_mul(y as usize)
        .and_then(|px| px.checked_mul(3))
        .ok_or(InvalidResolution)?;

    // Seeking before -i is fast, and since ffmpeg 2.1 also frame accurate.
    let timestamp = format!("{:.6}", timestamp_secs.max(0.0));

    #[rustfmt::skip]
    let args = [
        OsStr::new("-hide_banner"),
        OsStr::new("-loglevel"), OsStr::new("error"),
        OsStr::new("-nostats"),
        OsStr::new("-threads"),  OsStr::new("1"),
        OsStr::new("-ss"),       OsStr::new(&timestamp),
        OsStr::new("-i"),        src_path.as_ref().as_os_str(),
        OsStr::new("-frames:v"), OsStr::new("1"),
        OsStr::new("-pix_fmt"),  OsStr::new("rgb24"),
        OsStr::new("-c:v"),      OsStr::new("rawvideo"),
        OsStr::new("-f"),        OsStr::new("rawvideo"),
        OsStr::new("-"),
    ];

    let mut raw_buf = run_ffmpeg_command(Ffmpeg, &args, timeout)?.stdout;

    if raw_buf.len() < expected {
        return Err(ShortFrame {
            expected,
            actual: raw_buf.len(),
        });
    }
    raw_buf.truncate(expected);

    RgbImage::from_raw(x, y, raw_buf).ok_or(ShortFrame {
        expected,
        actual: expected,
    })
}

/// Run ffprobe on `src_path`, returning its JSON description of the container and streams.
pub fn get_video_stats<P: AsRef<Path>>(
    src_path: P,
    timeout: Duration,
) -> Result<String, FfmpegError> {
    let args = [
        OsStr::new("-v"),
        OsStr::new("quiet"),
        OsStr::new("-show_format"),
        OsStr::new("-show_streams"),
        OsStr::new("-print_format"),
        OsStr::new("json"),
        src_path.as_ref().as_os_str(),
    ];

    let stdout = run_ffmpeg_command(Ffprobe, &args, timeout)?.stdout;

    String::from_utf8(stdout).map_err(|_| Utf8Conversion)
}

pub fn ffmpeg_and_ffprobe_are_callable() -> bool {
    let version = [OsStr::new("-version")];

    run_ffmpeg_command(Ffprobe, &version, DEFAULT_FFMPEG_TIMEOUT).is_ok()
        && run_ffmpeg_command(Ffmpeg, &version, DEFAULT_FFMPEG_TIMEOUT).is_ok()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FfmpegCommandName {
    Ffprobe,
    Ffmpeg,
}

impl FfmpegCommandName {
    pub fn as_os_str(&self) -> &'static OsStr {
        match self {
            Self::Ffprobe => OsStr::new("ffprobe"),
            Self::Ffmpeg => OsStr::new("ffmpeg"),
        }
    }
}

fn spawn_ffmpeg_command(name: FfmpegCommandName, args: &[&OsStr]) -> Result<Child, FfmpegError> {
    let mut command = Command::new(name.as_os_str());
    command
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    //do not spawn a command window on windows when when in a gui application
    #[cfg(target_family = "windows")]
    command.creation_flags(winapi::um::winbase::CREATE_NO_WINDOW);

    command.spawn().map_err(|e| match e.kind() {
        //shell failed to execute the command. Separate out FileNotFound from all other errors
        //as by far the most likely cause is ffmpeg is not installed.
        std::io::ErrorKind::NotFound => FfmpegNotFound,
        _ => Io(format!("{:?}", e.kind())),
    })
}

struct FfmpegOutput {
    stdout: Vec<u8>,
}

// Drain a pipe on its own thread, so that neither pipe can fill up and stall the child.
fn drain(pipe: Option<impl Read + Send + 'static>) -> JoinHandle<Vec<u8>> {
    std::thread::spawn(move || {
        let mut acc = vec![];
        if let Some(mut pipe) = pipe {
            let _read_error = pipe.read_to_end(&mut acc);
        }
        acc
    })
}

fn run_ffmpeg_command(
    name: FfmpegCommandName,
    args: &[&OsStr],
    timeout: Duration,
) -> Result<FfmpegOutput, FfmpegError> {
    fn truncate_ffmpeg_err_msg(stderr: &[u8]) -> FfmpegError {
        match std::str::from_utf8(stderr) {
            Ok(error_text) => FfmpegInternal(error_text.chars().take(500).collect::<String>()),
            Err(_) => Utf8Conversion,
        }
    }

    let mut child = spawn_ffmpeg_command(name, args)?;

    let stdout_reader = drain(child.stdout.take());
    let stderr_reader = drain(child.stderr.take());

    let status = match child.wait_timeout(timeout) {
        Ok(Some(status)) => status,
        Ok(None) => {
            let _kill_error = child.kill();
            let _wait_error = child.wait();
            return Err(Timeout(timeout.as_secs()));
        }
        Err(e) => {
            let _kill_error = child.kill();
            let _wait_error = child.wait();
            return Err(Io(format!("{:?}", e.kind())));
        }
    };

    let stdout = stdout_reader
        .join()
        .map_err(|_| Io("stdout reader panicked".to_string()))?;
    let stderr = stderr_reader
        .join()
        .map_err(|_| Io("stderr reader panicked".to_string()))?;

    if status.success() {
        Ok(FfmpegOutput { stdout })
    } else {
        //sometimes ffmpeg creates very long error messages. Limit them to the first 500 characters
        Err(truncate_ffmpeg_err_msg(&stderr))
    }
}
