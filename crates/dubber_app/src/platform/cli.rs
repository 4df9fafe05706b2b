use std::path::PathBuf;

use clap::{Parser, ValueEnum};

#[derive(Debug, Parser)]
#[command(
    name = "dubber",
    version,
    about = "Upload a video for Taiwanese dubbing and follow the job until it finishes"
)]
pub struct Cli {
    /// Video to upload (MP4, MOV or AVI, at most 100MB)
    #[arg(value_name = "VIDEO")]
    pub video: PathBuf,

    /// Settings file in RON; `./dubber.ron` is used when present
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Processing service base URL, overrides the settings file
    #[arg(long, value_name = "URL")]
    pub base_url: Option<String>,

    /// Where log output goes
    #[arg(long, value_enum, default_value_t = LogTarget::File)]
    pub log: LogTarget,

    /// Log at debug level
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogTarget {
    Terminal,
    File,
    Both,
}
