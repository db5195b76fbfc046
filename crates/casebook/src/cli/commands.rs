//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};

use crate::query::{CategoryFilter, SortKey};
use crate::record::Category;
use crate::stats::TimeRange;

/// List command arguments.
#[derive(Debug, Args)]
pub struct ListCommand {
    /// Only show records whose name, phone or case details contain this text
    #[arg(short, long, default_value = "")]
    pub search: String,

    /// Sort order
    #[arg(long, value_enum, default_value = "nameAsc")]
    pub sort: SortArg,

    /// Only show this category ("all" for every record)
    #[arg(long, default_value = "all")]
    pub category: CategoryFilter,

    /// Output format
    #[arg(short, long, value_enum, default_value_t)]
    pub format: OutputFormat,
}

/// Show command arguments.
#[derive(Debug, Args)]
pub struct ShowCommand {
    /// Id of the record
    pub id: String,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Add command arguments.
#[derive(Debug, Args)]
pub struct AddCommand {
    /// Full name
    #[arg(short, long)]
    pub name: String,

    /// Phone number (digits, '+' and '-')
    #[arg(short, long)]
    pub phone: String,

    /// Case details
    #[arg(short, long)]
    pub details: String,

    /// Case category
    #[arg(long)]
    pub category: Option<Category>,

    /// Tag to attach (repeatable)
    #[arg(short, long = "tag", value_name = "TAG")]
    pub tags: Vec<String>,

    /// Photo as a data URI
    #[arg(long, value_name = "DATA_URI")]
    pub image: Option<String>,
}

/// Edit command arguments.
///
/// Only the given fields change.
#[derive(Debug, Args)]
pub struct EditCommand {
    /// Id of the record
    pub id: String,

    /// New full name
    #[arg(short, long)]
    pub name: Option<String>,

    /// New phone number
    #[arg(short, long)]
    pub phone: Option<String>,

    /// New case details
    #[arg(short, long)]
    pub details: Option<String>,

    /// New case category
    #[arg(long, conflicts_with = "clear_category")]
    pub category: Option<Category>,

    /// Remove the category
    #[arg(long)]
    pub clear_category: bool,

    /// Tag to add (repeatable)
    #[arg(short, long = "tag", value_name = "TAG")]
    pub tags: Vec<String>,

    /// Tag to remove (repeatable)
    #[arg(long = "untag", value_name = "TAG")]
    pub untag: Vec<String>,

    /// New photo as a data URI
    #[arg(long, value_name = "DATA_URI", conflicts_with = "clear_image")]
    pub image: Option<String>,

    /// Remove the photo
    #[arg(long)]
    pub clear_image: bool,
}

/// Delete command arguments.
#[derive(Debug, Args)]
pub struct DeleteCommand {
    /// Id of the record
    pub id: String,
}

/// Import command arguments.
#[derive(Debug, Args)]
pub struct ImportCommand {
    /// JSON document to import; replaces every stored record
    pub file: PathBuf,
}

/// Export command arguments.
#[derive(Debug, Args)]
pub struct ExportCommand {
    /// Directory to write the export file to (defaults to the configured one)
    #[arg(short, long, value_name = "DIR")]
    pub dir: Option<PathBuf>,

    /// Print the document to stdout instead of writing a file
    #[arg(long, conflicts_with = "dir")]
    pub stdout: bool,
}

/// Clear command arguments.
#[derive(Debug, Args)]
pub struct ClearCommand {
    /// Skip confirmation
    #[arg(short, long)]
    pub yes: bool,
}

/// Stats command arguments.
#[derive(Debug, Args)]
pub struct StatsCommand {
    /// Time window to report on
    #[arg(short, long, value_enum, default_value = "all")]
    pub range: RangeArg,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Dump command arguments.
#[derive(Debug, Args)]
pub struct DumpCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Watch command arguments.
#[derive(Debug, Args)]
pub struct WatchCommand {
    /// Poll interval in milliseconds (defaults to the configured one)
    #[arg(short, long, value_name = "MS")]
    pub interval: Option<u64>,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

/// Sort order argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SortArg {
    /// Name, A to Z
    #[value(name = "nameAsc")]
    NameAsc,
    /// Name, Z to A
    #[value(name = "nameDesc")]
    NameDesc,
    /// Oldest first
    #[value(name = "dateAsc")]
    DateAsc,
    /// Newest first
    #[value(name = "dateDesc")]
    DateDesc,
}

impl From<SortArg> for SortKey {
    fn from(arg: SortArg) -> Self {
        match arg {
            SortArg::NameAsc => Self::NameAsc,
            SortArg::NameDesc => Self::NameDesc,
            SortArg::DateAsc => Self::DateAsc,
            SortArg::DateDesc => Self::DateDesc,
        }
    }
}

/// Statistics time window argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RangeArg {
    /// Every record
    All,
    /// Last 30 days
    Month,
    /// Last 7 days
    Week,
}

impl From<RangeArg> for TimeRange {
    fn from(arg: RangeArg) -> Self {
        match arg {
            RangeArg::All => Self::All,
            RangeArg::Month => Self::Month,
            RangeArg::Week => Self::Week,
        }
    }
}

/// Output format for commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// One record per line
    Plain,
    /// Aligned columns with a header
    #[default]
    Table,
    /// JSON output
    Json,
}
