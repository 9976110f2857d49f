use clap::{Args, Parser, Subcommand, ValueEnum};
use siteaudit_config::OutputFormat;
use siteaudit_core::Metric;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "siteaudit")]
#[command(about = "Heuristic site auditor for captured page snapshots", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Config file to use instead of the default location
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Audit a snapshot file
    Audit(AuditArgs),

    /// Rate a single timing value
    Rate {
        /// Metric name (LCP, FID, INP, CLS, FCP, TTFB, ...)
        metric: Metric,

        /// Value in milliseconds, unitless for CLS
        #[arg(allow_negative_numbers = true)]
        value: f64,
    },

    /// Run the browser compatibility checklist
    Compat {
        /// Snapshot JSON file
        snapshot: PathBuf,

        /// Output format (default from config)
        #[arg(long, value_enum)]
        format: Option<FormatArg>,
    },

    /// Run the responsive layout and accessibility checklist
    Responsive {
        /// Snapshot JSON file
        snapshot: PathBuf,

        /// Output format (default from config)
        #[arg(long, value_enum)]
        format: Option<FormatArg>,
    },

    /// Compare two saved reports
    Compare {
        /// Newer report JSON file
        current: PathBuf,

        /// Older report JSON file
        previous: PathBuf,

        /// Output format (default from config)
        #[arg(long, value_enum)]
        format: Option<FormatArg>,
    },

    /// Show the effective configuration
    Config,
}

#[derive(Args)]
pub struct AuditArgs {
    /// Snapshot JSON file
    pub snapshot: PathBuf,

    /// Output format (default from config)
    #[arg(long, value_enum)]
    pub format: Option<FormatArg>,

    /// Report to compare against (default: last saved report)
    #[arg(long)]
    pub compare: Option<PathBuf>,

    /// Also write the report to this file
    #[arg(long)]
    pub save: Option<PathBuf>,

    /// Wait for the snapshot file to be written before reading it
    #[arg(long)]
    pub wait_for_load: bool,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum FormatArg {
    Text,
    Json,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Text => OutputFormat::Text,
            FormatArg::Json => OutputFormat::Json,
        }
    }
}

/// Flag wins over config
pub fn resolve_format(arg: Option<FormatArg>, configured: OutputFormat) -> OutputFormat {
    arg.map(Into::into).unwrap_or(configured)
}
