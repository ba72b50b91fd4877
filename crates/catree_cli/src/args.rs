use std::path::PathBuf;

use catree_core::Command;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "catree")]
#[command(about = "Manage a named, strictly hierarchical category tree")]
#[command(version)]
pub struct Cli {
    /// SQLite database file (created when missing)
    #[arg(long, global = true, default_value = "catree.sqlite3")]
    pub db: PathBuf,

    /// Log level: trace|debug|info|warn|error
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Write rolling log files into this directory instead of stderr
    #[arg(long, global = true)]
    pub log_dir: Option<PathBuf>,

    /// Directory receiving exported tables
    #[arg(long, global = true, default_value = ".")]
    pub export_dir: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the category tree
    ListTree,

    /// Add a root category, or a child when CHILD is given
    AddElement {
        /// Root name, or parent name when CHILD is given
        name: String,
        /// Child category name
        child: Option<String>,
    },

    /// Remove a category and all of its descendants
    RemoveElement {
        /// Category name
        name: String,
    },

    /// Export the tree as a CSV table
    ExportTree,

    /// Import categories from a CSV table
    ImportTree {
        /// Table with ID, Name, Parent ID columns
        file: PathBuf,
    },

    /// Run one raw command line (e.g. "addElement Books Poetry")
    Exec {
        #[arg(required = true, num_args = 1.., trailing_var_arg = true)]
        line: Vec<String>,
    },

    /// Read command lines from stdin until EOF
    Shell,
}

impl Commands {
    /// Maps a one-shot subcommand onto the core command surface.
    ///
    /// Returns `None` for `Shell`, which reads its commands from stdin.
    pub fn into_command(self) -> Option<Command> {
        let command = match self {
            Self::ListTree => Command::ListTree,
            Self::AddElement { name, child: None } => Command::AddRoot { name },
            Self::AddElement {
                name,
                child: Some(child),
            } => Command::AddChild {
                parent: name,
                child,
            },
            Self::RemoveElement { name } => Command::Remove { name },
            Self::ExportTree => Command::ExportTree,
            Self::ImportTree { file } => Command::ImportTree { path: file },
            Self::Exec { line } => Command::parse(&line.join(" ")),
            Self::Shell => return None,
        };
        Some(command)
    }
}
