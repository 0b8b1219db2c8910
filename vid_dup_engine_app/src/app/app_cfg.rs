use std::path::PathBuf;

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ReportVerbosity {
    Quiet,
    Default,
    Verbose,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OutputFormat {
    Normal,
    Json,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchCfg {
    pub dir: PathBuf,
    pub recursive: bool,
    pub exts: Option<Vec<String>>,
    pub threshold: f64,
    pub min_size_bytes: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectorCfg {
    HashOnly,
    WithFeatures { samples: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputCfg {
    pub format: OutputFormat,
    pub verbosity: ReportVerbosity,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppCfg {
    pub search_cfg: SearchCfg,
    pub detector: DetectorCfg,
    pub output_cfg: OutputCfg,
}
