use std::{
    error::Error,
    io::{BufWriter, Write},
};

use vid_dup_engine::{find_duplicate_videos, DuplicateGroup, ScanHooks, SearchOptions};

use super::{arg_parse, AppCfg, AppError, DetectorCfg, ReportVerbosity, SearchCfg, SearchOutput};

// Progress is logged each time it passes another multiple of this many percent.
const PROGRESS_LOG_STEP: u8 = 10;

pub fn run_app() -> i32 {
    let cfg = arg_parse::parse_args();
    configure_logs(cfg.output_cfg.verbosity);

    let ret = match run_app_inner(&cfg) {
        Ok(()) => 0,
        Err(fatal_error) => {
            print_fatal_err(fatal_error, cfg.output_cfg.verbosity);
            1
        }
    };

    ret
}

fn run_app_inner(cfg: &AppCfg) -> eyre::Result<()> {
    if !cfg.search_cfg.dir.is_dir() {
        return Err(AppError::NotADirectory(cfg.search_cfg.dir.clone()).into());
    }

    let options = search_options(&cfg.search_cfg);
    debug!(target: "app", "Searching {} with {options:?}", cfg.search_cfg.dir.display());

    let mut last_logged = 0;
    let mut hooks = ScanHooks::new().on_progress(|pct| {
        if pct >= last_logged + PROGRESS_LOG_STEP || (pct == 100 && last_logged < 100) {
            info!(target: "app", "Search progress: {pct}%");
            last_logged = pct;
        }
    });

    let groups = match cfg.detector {
        DetectorCfg::HashOnly => find_duplicate_videos(&cfg.search_cfg.dir, &options, &mut hooks),
        DetectorCfg::WithFeatures { samples } => {
            run_feature_search(&cfg.search_cfg, &options, samples, &mut hooks)?
        }
    };
    drop(hooks);

    let search_output = SearchOutput::new(groups);
    info!(
        target: "app",
        "Found {} duplicate groups containing {} files",
        search_output.len(),
        search_output.dup_groups().map(DuplicateGroup::len).sum::<usize>()
    );

    let mut stdout = BufWriter::new(std::io::stdout().lock());
    search_output
        .write(cfg.output_cfg.format, &mut stdout)
        .map_err(AppError::from)?;
    stdout.flush().map_err(AppError::from)?;

    Ok(())
}

fn search_options(search_cfg: &SearchCfg) -> SearchOptions {
    let mut options = SearchOptions::default()
        .recursive(search_cfg.recursive)
        .similarity_threshold(search_cfg.threshold)
        .min_feature_file_size(search_cfg.min_size_bytes);

    if let Some(exts) = &search_cfg.exts {
        options = options.extensions(exts);
    }

    options
}

#[cfg(feature = "ffmpeg_backend")]
fn run_feature_search(
    search_cfg: &SearchCfg,
    options: &SearchOptions,
    samples: usize,
    hooks: &mut ScanHooks,
) -> Result<Vec<DuplicateGroup>, AppError> {
    use vid_dup_engine::{
        find_duplicate_videos_with_features, ExtractionOptions, FfmpegFeatureExtractor,
    };

    if !ffmpeg_cmdline_utils::ffmpeg_and_ffprobe_are_callable() {
        return Err(AppError::FfmpegNotCallable);
    }

    let extractor = FfmpegFeatureExtractor::from_options(ExtractionOptions {
        samples,
        ..ExtractionOptions::default()
    });

    Ok(find_duplicate_videos_with_features(
        &search_cfg.dir,
        options,
        &extractor,
        hooks,
    ))
}

#[cfg(not(feature = "ffmpeg_backend"))]
fn run_feature_search(
    _search_cfg: &SearchCfg,
    _options: &SearchOptions,
    _samples: usize,
    _hooks: &mut ScanHooks,
) -> Result<Vec<DuplicateGroup>, AppError> {
    Err(AppError::NoFeatureBackend)
}

fn print_fatal_err(fatal_err: eyre::Report, verbosity: ReportVerbosity) {
    error!(target: "app-errorlog", "{}", fatal_err);

    if verbosity == ReportVerbosity::Verbose {
        let mut source: Option<&(dyn Error + 'static)> = fatal_err.source();
        while let Some(e) = source {
            error!(target: "app-errorlog", "    caused by: {}", e);
            source = e.source();
        }
    }
}

pub fn configure_logs(verbosity: ReportVerbosity) {
    use simplelog::*;

    let mut cfg = simplelog::ConfigBuilder::new();
    cfg.set_target_level(LevelFilter::Debug);

    let min_loglevel = match verbosity {
        ReportVerbosity::Quiet => LevelFilter::Warn,
        ReportVerbosity::Default => LevelFilter::Info,
        ReportVerbosity::Verbose => LevelFilter::Trace,
    };

    // Only fails if a logger is already installed, in which case that one keeps working.
    let _ = TermLogger::init(
        min_loglevel,
        cfg.build(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    );
}

#[cfg(test)]
mod test {
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn test_search_options_from_cfg() {
        let search_cfg = SearchCfg {
            dir: PathBuf::from("videos"),
            recursive: false,
            exts: Some(vec!["MKV".to_string()]),
            threshold: 0.5,
            min_size_bytes: 42,
        };

        let options = search_options(&search_cfg);
        assert!(!options.is_recursive());
        assert_eq!(options.video_extensions(), ["mkv"]);
        assert_eq!(options.threshold(), 0.5);
        assert_eq!(options.min_size(), 42);
    }

    #[test]
    fn test_default_extensions_are_kept() {
        let search_cfg = SearchCfg {
            dir: PathBuf::from("videos"),
            recursive: true,
            exts: None,
            threshold: 0.95,
            min_size_bytes: 0,
        };

        let options = search_options(&search_cfg);
        assert_eq!(
            options.video_extensions(),
            SearchOptions::default().video_extensions()
        );
    }
}
