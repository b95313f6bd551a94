use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "quill")]
#[command(about = "Incremental background source analysis")]
#[command(version)]
/// Command-line arguments.
pub struct Cli {
	/// Verbose logging
	#[arg(short, long, global = true)]
	pub verbose: bool,

	/// Subcommand to execute.
	#[command(subcommand)]
	pub command: Command,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
	/// Analyze a file, optionally replaying scripted edits on top of it
	Analyze {
		/// Source file to analyze
		file: PathBuf,

		/// Analyzer configuration (TOML)
		#[arg(long, short = 'c', value_name = "PATH")]
		config: Option<PathBuf>,

		/// Edit script (TOML) replayed after the first analysis
		#[arg(long, short = 'e', value_name = "PATH")]
		edits: Option<PathBuf>,
	},
}

#[cfg(test)]
mod tests {
	use clap::CommandFactory;

	use super::*;

	#[test]
	fn test_cli_definition_is_valid() {
		Cli::command().debug_assert();
	}

	#[test]
	fn test_analyze_arguments() {
		let cli = Cli::try_parse_from(["quill", "-v", "analyze", "main.c", "--edits", "edits.toml"]).unwrap();
		assert!(cli.verbose);
		let Command::Analyze { file, config, edits } = cli.command;
		assert_eq!(file, PathBuf::from("main.c"));
		assert_eq!(config, None);
		assert_eq!(edits, Some(PathBuf::from("edits.toml")));
	}
}
