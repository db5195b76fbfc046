//! Command-line interface for casebook.
//!
//! This module provides the CLI structure for the `casebook` binary.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{
    AddCommand, ClearCommand, ConfigCommand, DeleteCommand, DumpCommand, EditCommand,
    ExportCommand, ImportCommand, ListCommand, OutputFormat, RangeArg, ShowCommand, SortArg,
    StatsCommand, WatchCommand,
};

/// casebook - Keep local case records
///
/// Stores suspect case records on this machine, with search, sorting,
/// JSON import/export and summary statistics.
#[derive(Debug, Parser)]
#[command(name = "casebook")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// List records, filtered and sorted
    List(ListCommand),

    /// Show one record
    Show(ShowCommand),

    /// Add a record
    Add(AddCommand),

    /// Edit a record
    Edit(EditCommand),

    /// Delete a record
    Delete(DeleteCommand),

    /// Replace all records with the contents of a JSON document
    Import(ImportCommand),

    /// Export all records as a JSON document
    Export(ExportCommand),

    /// Delete every record
    Clear(ClearCommand),

    /// Show summary statistics
    Stats(StatsCommand),

    /// Show storage diagnostics
    Dump(DumpCommand),

    /// Report changes made to the store by other processes
    Watch(WatchCommand),

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> crate::logging::Verbosity {
        if self.quiet {
            crate::logging::Verbosity::Quiet
        } else {
            match self.verbose {
                0 => crate::logging::Verbosity::Normal,
                1 => crate::logging::Verbosity::Verbose,
                _ => crate::logging::Verbosity::Trace,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::CategoryFilter;
    use crate::record::Category;
    use clap::CommandFactory;

    fn dump_cli(verbose: u8, quiet: bool) -> Cli {
        Cli {
            config: None,
            verbose,
            quiet,
            command: Command::Dump(DumpCommand { json: false }),
        }
    }

    #[test]
    fn test_cli_debug() {
        let cli = Cli::command();
        assert_eq!(cli.get_name(), "casebook");
    }

    #[test]
    fn test_verbosity_levels() {
        use crate::logging::Verbosity;

        assert_eq!(dump_cli(0, true).verbosity(), Verbosity::Quiet);
        assert_eq!(dump_cli(0, false).verbosity(), Verbosity::Normal);
        assert_eq!(dump_cli(1, false).verbosity(), Verbosity::Verbose);
        assert_eq!(dump_cli(2, false).verbosity(), Verbosity::Trace);
    }

    #[test]
    fn test_cli_verify() {
        // Verify the CLI structure is valid
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_list_defaults() {
        let cli = Cli::try_parse_from(["casebook", "list"]).unwrap();
        let Command::List(list) = cli.command else {
            panic!("expected list command");
        };
        assert_eq!(list.search, "");
        assert_eq!(list.sort, SortArg::NameAsc);
        assert_eq!(list.category, CategoryFilter::All);
        assert_eq!(list.format, OutputFormat::Table);
        assert_eq!(list.format, OutputFormat::default());
    }

    #[test]
    fn test_parse_list_options() {
        let args = [
            "casebook",
            "list",
            "--search",
            "bike",
            "--sort",
            "dateDesc",
            "--category",
            "Drug Offense",
            "--format",
            "json",
        ];
        let cli = Cli::try_parse_from(args).unwrap();
        let Command::List(list) = cli.command else {
            panic!("expected list command");
        };
        assert_eq!(list.search, "bike");
        assert_eq!(list.sort, SortArg::DateDesc);
        assert_eq!(list.category, CategoryFilter::Only(Category::DrugOffense));
        assert_eq!(list.format, OutputFormat::Json);
    }

    #[test]
    fn test_parse_list_rejects_unknown_category() {
        assert!(Cli::try_parse_from(["casebook", "list", "--category", "Arson"]).is_err());
    }

    #[test]
    fn test_parse_add() {
        let args = [
            "casebook", "add", "-n", "Ada", "-p", "555", "-d", "forgery", "-t", "a", "-t", "b",
            "--category", "fraud",
        ];
        let cli = Cli::try_parse_from(args).unwrap();
        let Command::Add(add) = cli.command else {
            panic!("expected add command");
        };
        assert_eq!(add.name, "Ada");
        assert_eq!(add.tags, ["a", "b"]);
        assert_eq!(add.category, Some(Category::Fraud));
        assert!(add.image.is_none());
    }

    #[test]
    fn test_parse_add_requires_fields() {
        assert!(Cli::try_parse_from(["casebook", "add", "-n", "Ada"]).is_err());
    }

    #[test]
    fn test_parse_edit_conflicts() {
        let args = ["casebook", "edit", "1", "--image", "data:,x", "--clear-image"];
        assert!(Cli::try_parse_from(args).is_err());
    }

    #[test]
    fn test_parse_stats() {
        let cli = Cli::try_parse_from(["casebook", "stats", "--range", "week", "--json"]).unwrap();
        let Command::Stats(stats) = cli.command else {
            panic!("expected stats command");
        };
        assert_eq!(stats.range, RangeArg::Week);
        assert!(stats.json);
    }

    #[test]
    fn test_parse_export_stdout_conflicts_with_dir() {
        let args = ["casebook", "export", "--stdout", "--dir", "/tmp"];
        assert!(Cli::try_parse_from(args).is_err());
    }

    #[test]
    fn test_parse_config_validate() {
        let args = ["casebook", "config", "validate", "--file", "/tmp/c.toml"];
        let cli = Cli::try_parse_from(args).unwrap();
        assert!(matches!(
            cli.command,
            Command::Config(ConfigCommand::Validate { file: Some(_) })
        ));
    }

    #[test]
    fn test_parse_with_config() {
        let args = ["casebook", "-c", "/custom/config.toml", "dump"];
        let cli = Cli::try_parse_from(args).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/custom/config.toml")));
    }

    #[test]
    fn test_parse_with_verbose() {
        let cli = Cli::try_parse_from(["casebook", "-vv", "list"]).unwrap();
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn test_parse_with_quiet() {
        let cli = Cli::try_parse_from(["casebook", "-q", "list"]).unwrap();
        assert!(cli.quiet);
    }
}
