//! CLI argument definitions (clap derive)

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use ctxbuf_config::CliArgs;

/// ctxbuf - context-buffer selection for LLM chat assistants
#[derive(Parser, Debug)]
#[command(name = "ctxbuf")]
#[command(about = "Select the files an LLM chat assistant should see, and import folders into chats")]
#[command(long_about = r#"
ctxbuf picks a small, relevant set of project files (the context buffer) for
the next chat turn with one model call, and assembles folder imports into chat
messages.

EXAMPLES:
  # Show which project files are candidates after ignore rules
  ctxbuf filter ./my-app

  # Check whether a folder is treated as a static HTML site
  ctxbuf classify ./landing-page

  # Parse a saved model response
  ctxbuf parse-response response.txt

  # Run a selection against the configured provider
  ctxbuf select ./my-app --history chat.json --summary "adding auth"

  # Build the import messages for a folder
  ctxbuf import ./my-app

CONFIGURATION:
  Configuration is loaded with precedence: CLI flags > config file > defaults
  Config file is discovered by searching upward from CWD for .ctxbuf/config.toml
  Use --config to specify an explicit config file path
"#)]
#[command(version)]
pub struct Cli {
    /// Path to configuration file (overrides discovery)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Prefix under which project files are addressed (default: /home/project/)
    #[arg(long, global = true)]
    pub project_root: Option<String>,

    /// Maximum number of files in the context buffer (default: 5)
    #[arg(long, global = true)]
    pub max_context_files: Option<usize>,

    /// Provider used when the chat names none
    #[arg(long, global = true)]
    pub provider: Option<String>,

    /// Model used when the chat names none
    #[arg(long, global = true)]
    pub model: Option<String>,

    /// Model call timeout in seconds (default: 120)
    #[arg(long, global = true)]
    pub timeout_secs: Option<u64>,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Configuration overrides carried by the global flags.
    #[must_use]
    pub fn config_args(&self) -> CliArgs {
        CliArgs {
            config_path: self.config.clone(),
            project_root: self.project_root.clone(),
            max_context_files: self.max_context_files,
            provider: self.provider.clone(),
            model: self.model.clone(),
            timeout_secs: self.timeout_secs,
        }
    }
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the project paths that survive the ignore rules
    Filter {
        /// Project directory
        dir: PathBuf,
    },

    /// Report whether a project is a static HTML site and what it would select
    Classify {
        /// Project directory
        dir: PathBuf,
    },

    /// Parse a model response and print its includes and excludes as JSON
    ParseResponse {
        /// Response file, or '-' for stdin
        #[arg(default_value = "-")]
        input: String,
    },

    /// Run a full selection and print the selected files as JSON
    Select {
        /// Project directory
        dir: PathBuf,

        /// Chat history as a JSON array of messages
        #[arg(long)]
        history: PathBuf,

        /// Running chat summary
        #[arg(long)]
        summary: Option<String>,
    },

    /// Assemble the chat messages importing a folder and print them as JSON
    Import {
        /// Folder to import
        dir: PathBuf,
    },
}

/// Build the CLI command for documentation and completion generation.
#[must_use]
pub fn build_cli() -> clap::Command {
    <Cli as clap::CommandFactory>::command()
}
