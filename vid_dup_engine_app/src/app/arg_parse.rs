use std::path::PathBuf;

use clap::{value_parser, ArgAction::*};
use vid_dup_engine::{
    DEFAULT_MIN_FEATURE_FILE_SIZE, DEFAULT_SAMPLE_COUNT, DEFAULT_SIMILARITY_THRESHOLD,
};

use crate::app::*;

// input files
const DIR: &str = "Directory to search";
const NO_RECURSIVE: &str = "Do not search subdirectories";
const EXTS: &str = "Video file extensions";

// search configuration
const FEATURES: &str = "Compare frame features";
const THRESHOLD: &str = "Similarity threshold";
const MIN_SIZE_MB: &str = "Minimum file size";
const SAMPLES: &str = "Frame samples";

// output settings
const OUTPUT_FORMAT: &str = "Format";

// verbosity
const VERBOSITY_QUIET: &str = "Quiet";
const VERBOSITY_VERBOSE: &str = "Verbose";

const DISPLAY_ORDERING: [&str; 10] = [
    //
    // input files
    DIR,
    NO_RECURSIVE,
    EXTS,
    //
    // search configuration
    FEATURES,
    THRESHOLD,
    MIN_SIZE_MB,
    SAMPLES,
    //
    // output
    OUTPUT_FORMAT,
    //
    // verbosity
    VERBOSITY_QUIET,
    VERBOSITY_VERBOSE,
];

const BYTES_PER_MB: u64 = 1024 * 1024;

fn parse_threshold(s: &str) -> Result<f64, String> {
    let threshold = s.parse::<f64>().map_err(|e| e.to_string())?;
    if threshold > 0.0 && threshold <= 1.0 {
        Ok(threshold)
    } else {
        Err(format!("{threshold} is not in the range (0, 1]"))
    }
}

pub(super) fn build_app() -> clap::Command {
    let get_ordering = |arg_name: &str| -> usize {
        match DISPLAY_ORDERING.iter().position(|x| *x == arg_name) {
            Some(idx) => idx,
            None => {
                panic!("argument not assigned a display order: {arg_name:?}");
            }
        }
    };

    // clap wants default values as strings, so build them from the library's defaults.
    let default_threshold = DEFAULT_SIMILARITY_THRESHOLD.to_string();
    let default_min_size = (DEFAULT_MIN_FEATURE_FILE_SIZE / BYTES_PER_MB).to_string();
    let default_samples = DEFAULT_SAMPLE_COUNT.to_string();

    //args are not added through method chaining because rustfmt struggles with very long expressions.
    let mut clap_app = clap::Command::new("Video duplicate engine")
        .version(clap::crate_version!())
        .about("Finds byte-identical and near-identical duplicate videos in a directory tree");

    clap_app = clap_app.arg(
        clap::Arg::new(DIR)
            .long("dir")
            .required(true)
            .num_args(1)
            .value_parser(value_parser!(PathBuf))
            .help("The directory to search for video files")
            .display_order(get_ordering(DIR)),
    );

    clap_app = clap_app.arg(
        clap::Arg::new(NO_RECURSIVE)
            .long("no-recursive")
            .action(SetTrue)
            .help("Only search the top level of --dir. Symlinked directories are never followed either way")
            .display_order(get_ordering(NO_RECURSIVE)),
    );

    clap_app = clap_app.arg(
        clap::Arg::new(EXTS)
            .long("exts")
            .num_args(1..)
            .value_parser(value_parser!(String))
            .value_delimiter(',')
            .action(Append)
            .help("File extensions of videos to search. When specified the default extensions are replaced with the given values. Extensions must be comma separated with no spaces, e.g '--exts mp4,mkv,webm'")
            .display_order(get_ordering(EXTS)),
    );

    clap_app = clap_app.arg(
        clap::Arg::new(FEATURES)
            .long("features")
            .action(SetTrue)
            .help("Also merge groups of same-sized videos whose sampled frames look alike. Requires ffmpeg and ffprobe on the PATH")
            .display_order(get_ordering(FEATURES)),
    );

    clap_app = clap_app.arg(
        clap::Arg::new(THRESHOLD)
            .long("threshold")
            .requires(FEATURES)
            .num_args(1)
            .value_parser(parse_threshold)
            .default_value(default_threshold)
            .help("Similarity score (between 0.0 and 1.0) at which two videos are considered near-identical. Higher values require closer matches")
            .display_order(get_ordering(THRESHOLD)),
    );

    clap_app = clap_app.arg(
        clap::Arg::new(MIN_SIZE_MB)
            .long("min-size-mb")
            .requires(FEATURES)
            .num_args(1)
            .value_parser(value_parser!(u64))
            .default_value(default_min_size)
            .help("Videos smaller than this many MiB are ignored when comparing frame features")
            .display_order(get_ordering(MIN_SIZE_MB)),
    );

    clap_app = clap_app.arg(
        clap::Arg::new(SAMPLES)
            .long("samples")
            .requires(FEATURES)
            .num_args(1)
            .value_parser(value_parser!(u64).range(1..))
            .default_value(default_samples)
            .help("Number of frames sampled from each video when comparing frame features")
            .display_order(get_ordering(SAMPLES)),
    );

    clap_app = clap_app.arg(
        clap::Arg::new(OUTPUT_FORMAT)
            .long("output-format")
            .help("Whether to output as normal text, or JSON.")
            .value_parser(value_parser!(OutputFormat))
            .default_value("normal")
            .num_args(1)
            .display_order(get_ordering(OUTPUT_FORMAT)),
    );

    clap_app = clap_app.arg(
        clap::Arg::new(VERBOSITY_QUIET)
            .long("quiet")
            .help("Reduced verbosity")
            .conflicts_with(VERBOSITY_VERBOSE)
            .action(SetTrue)
            .display_order(get_ordering(VERBOSITY_QUIET)),
    );

    clap_app = clap_app.arg(
        clap::Arg::new(VERBOSITY_VERBOSE)
            .long("verbose")
            .help("Increased verbosity")
            .conflicts_with(VERBOSITY_QUIET)
            .action(SetTrue)
            .display_order(get_ordering(VERBOSITY_VERBOSE)),
    );

    clap_app
}

pub fn parse_args() -> AppCfg {
    cfg_from_matches(&build_app().get_matches())
}

fn cfg_from_matches(args: &clap::ArgMatches) -> AppCfg {
    // every arg below is either required or has a default value, so clap always supplies it.
    let dir = args.get_one::<PathBuf>(DIR).cloned().unwrap_or_default();

    let exts = args
        .get_many::<String>(EXTS)
        .map(|exts| exts.cloned().collect::<Vec<_>>());

    let threshold = args
        .get_one::<f64>(THRESHOLD)
        .copied()
        .unwrap_or(DEFAULT_SIMILARITY_THRESHOLD);

    let min_size_bytes = args
        .get_one::<u64>(MIN_SIZE_MB)
        .map_or(DEFAULT_MIN_FEATURE_FILE_SIZE, |mb| mb.saturating_mul(BYTES_PER_MB));

    let search_cfg = SearchCfg {
        dir,
        recursive: !args.get_flag(NO_RECURSIVE),
        exts,
        threshold,
        min_size_bytes,
    };

    let detector = if args.get_flag(FEATURES) {
        let samples = args
            .get_one::<u64>(SAMPLES)
            .map_or(DEFAULT_SAMPLE_COUNT, |n| *n as usize);
        DetectorCfg::WithFeatures { samples }
    } else {
        DetectorCfg::HashOnly
    };

    let verbosity = if args.get_flag(VERBOSITY_QUIET) {
        ReportVerbosity::Quiet
    } else if args.get_flag(VERBOSITY_VERBOSE) {
        ReportVerbosity::Verbose
    } else {
        ReportVerbosity::Default
    };

    let output_cfg = OutputCfg {
        format: args
            .get_one::<OutputFormat>(OUTPUT_FORMAT)
            .copied()
            .unwrap_or(OutputFormat::Normal),
        verbosity,
    };

    AppCfg {
        search_cfg,
        detector,
        output_cfg,
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn parse(args: &[&str]) -> Result<AppCfg, clap::Error> {
        let argv = std::iter::once("vid_dup_engine").chain(args.iter().copied());
        build_app()
            .try_get_matches_from(argv)
            .map(|matches| cfg_from_matches(&matches))
    }

    #[test]
    fn test_app_is_well_formed() {
        build_app().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let cfg = parse(&["--dir", "videos"]).unwrap();

        assert_eq!(cfg.search_cfg.dir, PathBuf::from("videos"));
        assert!(cfg.search_cfg.recursive);
        assert_eq!(cfg.search_cfg.exts, None);
        assert_eq!(cfg.search_cfg.threshold, DEFAULT_SIMILARITY_THRESHOLD);
        assert_eq!(cfg.search_cfg.min_size_bytes, DEFAULT_MIN_FEATURE_FILE_SIZE);
        assert_eq!(cfg.detector, DetectorCfg::HashOnly);
        assert_eq!(cfg.output_cfg.format, OutputFormat::Normal);
        assert_eq!(cfg.output_cfg.verbosity, ReportVerbosity::Default);
    }

    #[test]
    fn test_feature_search_args() {
        let cfg = parse(&[
            "--dir",
            "videos",
            "--features",
            "--threshold",
            "0.8",
            "--min-size-mb",
            "2",
            "--samples",
            "3",
            "--exts",
            "mp4,mkv",
            "--no-recursive",
            "--output-format",
            "json",
            "--verbose",
        ])
        .unwrap();

        assert!(!cfg.search_cfg.recursive);
        assert_eq!(
            cfg.search_cfg.exts,
            Some(vec!["mp4".to_string(), "mkv".to_string()])
        );
        assert_eq!(cfg.search_cfg.threshold, 0.8);
        assert_eq!(cfg.search_cfg.min_size_bytes, 2 * 1024 * 1024);
        assert_eq!(cfg.detector, DetectorCfg::WithFeatures { samples: 3 });
        assert_eq!(cfg.output_cfg.format, OutputFormat::Json);
        assert_eq!(cfg.output_cfg.verbosity, ReportVerbosity::Verbose);
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(parse(&[]).is_err());
        assert!(parse(&["--dir", "v", "--features", "--threshold", "0"]).is_err());
        assert!(parse(&["--dir", "v", "--features", "--threshold", "1.5"]).is_err());
        assert!(parse(&["--dir", "v", "--features", "--samples", "0"]).is_err());
        assert!(parse(&["--dir", "v", "--quiet", "--verbose"]).is_err());
    }

    #[test]
    fn test_feature_options_require_features() {
        assert!(parse(&["--dir", "v", "--samples", "4"]).is_err());
        assert!(parse(&["--dir", "v", "--threshold", "0.5"]).is_err());
    }
}
