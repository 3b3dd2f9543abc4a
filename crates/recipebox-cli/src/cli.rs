//! Command-line interface definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use recipebox_core::CollectionKind;

#[derive(Parser, Debug)]
#[command(name = "recipebox", version, about = "Local notes and recipes that work offline")]
pub struct Cli {
    /// Work on the recipe collection instead of notes
    #[arg(long, global = true)]
    pub recipes: bool,

    /// Use a custom storage key instead of the collection default
    #[arg(long, global = true)]
    pub key: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    pub fn kind(&self) -> CollectionKind {
        if self.recipes {
            CollectionKind::Recipes
        } else {
            CollectionKind::Notes
        }
    }

    pub fn storage_key(&self) -> String {
        self.key
            .clone()
            .unwrap_or_else(|| self.kind().storage_key().to_string())
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List records, newest first, optionally filtered
    List {
        /// Case-insensitive text to look for in title or body
        query: Option<String>,
    },

    /// Add a record
    Add {
        #[arg(long, default_value = "")]
        title: String,
        #[arg(long, default_value = "")]
        body: String,
    },

    /// Edit a record
    Edit {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        body: Option<String>,
    },

    /// Delete a record
    Rm { id: String },

    /// Export the collection as pretty-printed JSON
    Export {
        /// Output file; defaults to the collection's export name
        path: Option<PathBuf>,
    },

    /// Merge records from a JSON array file
    Import {
        path: PathBuf,
        /// Keep an existing record when it is newer than the imported copy
        #[arg(long)]
        newer_wins: bool,
    },

    /// Show the effective configuration
    Config {
        /// Write it to the config file
        #[arg(long)]
        save: bool,
    },

    /// Offline cache worker
    Worker {
        #[command(subcommand)]
        command: WorkerCommand,
    },
}

#[derive(Subcommand, Debug)]
pub enum WorkerCommand {
    /// Precache the manifest and evict stale cache versions
    Install,

    /// Route a request through the worker
    Fetch {
        url: String,
        /// Treat the request as a page navigation
        #[arg(long)]
        navigate: bool,
        /// Treat the request as an image load
        #[arg(long)]
        image: bool,
    },

    /// List caches and their entries
    Caches,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_recipes_list() {
        let cli = Cli::parse_from(["recipebox", "--recipes", "list", "ajvar"]);
        assert_eq!(cli.kind(), CollectionKind::Recipes);
        assert_eq!(cli.storage_key(), "recipes-mk-v1");
        assert!(matches!(cli.command, Command::List { query: Some(ref q) } if q == "ajvar"));
    }

    #[test]
    fn test_custom_key() {
        let cli = Cli::parse_from(["recipebox", "list", "--key", "scratch"]);
        assert_eq!(cli.storage_key(), "scratch");
    }

    #[test]
    fn test_parse_worker_fetch() {
        let cli = Cli::parse_from(["recipebox", "worker", "fetch", "/", "--navigate"]);
        assert!(matches!(
            cli.command,
            Command::Worker {
                command: WorkerCommand::Fetch { navigate: true, image: false, .. }
            }
        ));
    }

    #[test]
    fn test_parse_config_save() {
        let cli = Cli::parse_from(["recipebox", "config", "--save"]);
        assert!(matches!(cli.command, Command::Config { save: true }));
    }

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
