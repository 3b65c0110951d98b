use clap::{Parser, ValueEnum};
use rundata_plan::PlanFormat;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "addrundata",
    about = "Check and fix test identity records, and merge them into test-plan documents",
    version
)]
pub struct Cli {
    /// Repository root containing the feature directory
    #[arg(long, default_value = ".")]
    pub root: PathBuf,

    /// Rewrite identity records that are missing or out of date
    #[arg(long)]
    pub fix: bool,

    /// Path to a rundata TOML config
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Emit a test-plan document in this format
    #[arg(long, value_enum)]
    pub format: Option<FormatArg>,

    /// Existing plan document to merge into
    #[arg(long, requires = "format")]
    pub merge: Option<PathBuf>,

    /// Write the plan document here instead of stdout
    #[arg(long, requires = "format")]
    pub output: Option<PathBuf>,

    /// Output the check report as JSON
    #[arg(long, conflicts_with_all = ["fix", "format"])]
    pub json: bool,

    /// Log filter (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    pub log_level: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FormatArg {
    Jstree,
    Testtracker,
}

impl From<FormatArg> for PlanFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Jstree => PlanFormat::JsTree,
            FormatArg::Testtracker => PlanFormat::TestTracker,
        }
    }
}
