//! Command-line interface for contentfield.
//!
//! This module provides the CLI structure for the `cfield` binary, plus the
//! list operations it applies to a [`ListStore`](crate::editor::ListStore).

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{
    apply_at, CheckCommand, ConfigCommand, FieldTypeArg, InferCommand, ListCommand, ListOp,
    MediaCommand, NestedStep, OutputFormat, RenderCommand, UploadCommand, UploadKindArg,
};

use crate::logging::Verbosity;

/// cfield - Edit structured content values from the terminal
///
/// Infers list schemas, renders section components to editor widgets, and
/// applies list and schema edits to JSON content files.
#[derive(Debug, Parser)]
#[command(name = "cfield")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
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
    /// Print the schema inferred from a list value
    Infer(InferCommand),

    /// Render every component of a section as an editor widget tree
    Render(RenderCommand),

    /// Validate a raw JSON document
    Check(CheckCommand),

    /// Apply one edit to a list value file
    List(ListCommand),

    /// Upload a file, optionally attaching it to a media field
    Upload(UploadCommand),

    /// Manage the media library
    #[command(subcommand)]
    Media(MediaCommand),

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> Verbosity {
        Verbosity::from_flags(self.verbose, self.quiet)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_cli_name() {
        assert_eq!(Cli::command().get_name(), "cfield");
    }

    #[test]
    fn test_cli_verify() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_verbosity_flags() {
        assert_eq!(parse(&["cfield", "check", "a.json"]).verbosity(), Verbosity::Normal);
        assert_eq!(parse(&["cfield", "-v", "check", "a.json"]).verbosity(), Verbosity::Verbose);
        assert_eq!(parse(&["cfield", "-vv", "check", "a.json"]).verbosity(), Verbosity::Trace);
        assert_eq!(parse(&["cfield", "-q", "check", "a.json"]).verbosity(), Verbosity::Quiet);
    }

    #[test]
    fn test_parse_with_config() {
        let cli = parse(&["cfield", "-c", "/custom/config.toml", "config", "show"]);
        assert_eq!(cli.config, Some(PathBuf::from("/custom/config.toml")));
        assert!(matches!(cli.command, Command::Config(ConfigCommand::Show { json: false })));
    }

    #[test]
    fn test_parse_infer() {
        let cli = parse(&["cfield", "infer", "items.json", "--format", "json"]);
        let Command::Infer(cmd) = cli.command else {
            panic!("expected infer");
        };
        assert_eq!(cmd.file, PathBuf::from("items.json"));
        assert_eq!(cmd.format, OutputFormat::Json);
    }

    #[test]
    fn test_parse_list_rename_nested() {
        let cli = parse(&[
            "cfield",
            "list",
            "page.json",
            "--at",
            "0:features",
            "--dry-run",
            "rename-field",
            "title",
            "heading",
        ]);
        let Command::List(cmd) = cli.command else {
            panic!("expected list");
        };
        assert!(cmd.dry_run);
        assert_eq!(
            cmd.at,
            vec![NestedStep {
                index: 0,
                key: "features".to_string()
            }]
        );
        assert!(matches!(cmd.op, ListOp::RenameField { ref old, ref new } if old == "title" && new == "heading"));
    }

    #[test]
    fn test_parse_list_retype() {
        let cli = parse(&["cfield", "list", "a.json", "retype-field", "body", "long-text"]);
        let Command::List(cmd) = cli.command else {
            panic!("expected list");
        };
        assert!(matches!(
            cmd.op,
            ListOp::RetypeField {
                field_type: FieldTypeArg::LongText,
                ..
            }
        ));
    }

    #[test]
    fn test_parse_upload_into() {
        let cli = parse(&[
            "cfield", "upload", "hero.png", "--into", "cards.json", "--item", "2", "--key", "image",
        ]);
        let Command::Upload(cmd) = cli.command else {
            panic!("expected upload");
        };
        assert_eq!(cmd.into, Some(PathBuf::from("cards.json")));
        assert_eq!(cmd.item, Some(2));
        assert_eq!(cmd.key.as_deref(), Some("image"));
    }

    #[test]
    fn test_upload_into_requires_target() {
        assert!(Cli::try_parse_from(["cfield", "upload", "a.png", "--into", "cards.json"]).is_err());
    }

    #[test]
    fn test_parse_media_delete() {
        let cli = parse(&["cfield", "media", "delete", "7", "--keep-file"]);
        assert!(matches!(
            cli.command,
            Command::Media(MediaCommand::Delete { id: 7, keep_file: true })
        ));
    }

    #[test]
    fn test_bad_nested_step_is_rejected() {
        assert!(Cli::try_parse_from(["cfield", "list", "a.json", "--at", "x:key", "append"]).is_err());
        assert!(Cli::try_parse_from(["cfield", "list", "a.json", "--at", "3", "append"]).is_err());
    }
}
