use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use log::LevelFilter;
use std::path::PathBuf;

/// Filter and search record collections (candidates, job postings, volunteers)
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// TOML config file with the schema, search fields and default criteria
    #[arg(short, long, global = true, env = "RECORD_FILTER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Built-in profile used when no config file is given (candidates, jobs, volunteers)
    #[arg(short, long, global = true)]
    pub profile: Option<String>,

    /// Output format
    #[arg(short = 'F', long, value_enum, default_value_t = OutputFormat::Text, global = true)]
    pub format: OutputFormat,

    /// Also write the output to this file
    #[arg(short, long, global = true)]
    pub output: Option<PathBuf>,

    /// When to use terminal colors
    #[arg(long, value_enum, default_value_t = ColorMode::Auto, global = true)]
    pub color: ColorMode,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,
}

impl Cli {
    pub fn log_level(&self) -> LevelFilter {
        if self.quiet {
            return LevelFilter::Error;
        }
        match self.verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the records that match the search term and filters
    Search {
        /// Record file (.json, .json5, .jsonl)
        file: PathBuf,

        #[command(flatten)]
        filters: FilterArgs,

        /// Show at most this many records
        #[arg(short = 'n', long)]
        limit: Option<usize>,

        /// Fields to print for each record (comma separated, default: all)
        #[arg(long, value_delimiter = ',')]
        show: Vec<String>,
    },
    /// Count matching records grouped by the values of a field
    Count {
        /// Record file (.json, .json5, .jsonl)
        file: PathBuf,

        /// Field to group by; list fields count each element
        #[arg(long)]
        by: String,

        #[command(flatten)]
        filters: FilterArgs,
    },
    /// Summarize the fields and values of a record file
    Info {
        /// Record file (.json, .json5, .jsonl)
        file: PathBuf,
    },
    /// List the built-in profiles
    Profiles,
}

/// Filter options shared by the search and count commands
#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    /// Filter expression, e.g. "status:Interview experience:3.. skills:any(React,Vue)"
    #[arg(short, long)]
    pub filter: Option<String>,

    /// Free-text search term (case-insensitive substring)
    #[arg(short, long)]
    pub search: Option<String>,

    /// Fields the search term is matched against (comma separated)
    #[arg(long, value_delimiter = ',')]
    pub fields: Vec<String>,

    /// JSON file holding an array of criteria objects
    #[arg(long)]
    pub criteria: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    Auto,
    Always,
    Never,
}

pub fn cli_parse() -> Cli {
    Cli::parse()
}
