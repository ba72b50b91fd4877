//! Text command surface over the category service.
//!
//! # Responsibility
//! - Parse one command line (`listTree`, `addElement`, `removeElement`,
//!   `exportTree`, `importTree`, `help`) into a `Command`.
//! - Execute it and turn every outcome into a `CommandReply`.
//!
//! # Invariants
//! - Execution never panics and never returns an error: failures become
//!   replies with `ok == false`.
//! - Unknown commands fall back to the help text.

use crate::repo::category_repo::CategoryRepository;
use crate::service::category_service::CategoryService;
use crate::tabular::{export_to_path, import_from_path, DEFAULT_EXPORT_FILE_NAME};
use log::{error, info};
use std::path::{Path, PathBuf};

/// Help text listing every command.
pub const HELP_MESSAGE: &str = "Available commands:
listTree - show the category tree.
addElement <name> - add a root category.
addElement <parent> <child> - add a child category under <parent>.
removeElement <name> - remove a category and all of its descendants.
exportTree - export the tree as a CSV table.
importTree <file> - import categories from a CSV table.
help - show this list.";

const ADD_USAGE: &str = "Invalid command format. Use: addElement <name> or addElement <parent> <child>";
const REMOVE_USAGE: &str = "Invalid command format. Use: removeElement <name>";
const IMPORT_USAGE: &str = "Invalid command format. Use: importTree <file>";

/// One parsed command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    ListTree,
    AddRoot { name: String },
    AddChild { parent: String, child: String },
    Remove { name: String },
    ExportTree,
    ImportTree { path: PathBuf },
    Help,
    /// Known command with wrong arguments; carries the usage text.
    Usage(&'static str),
}

impl Command {
    /// Parses a whitespace-separated command line.
    ///
    /// A leading `/` is ignored and command names match case-insensitively.
    pub fn parse(line: &str) -> Self {
        let mut parts = line.split_whitespace();
        let Some(head) = parts.next() else {
            return Self::Help;
        };
        let args: Vec<&str> = parts.collect();
        let name = head.strip_prefix('/').unwrap_or(head);

        let is = |expected: &str| name.eq_ignore_ascii_case(expected);
        if is("listTree") || is("viewTree") {
            Self::ListTree
        } else if is("addElement") {
            match args.as_slice() {
                [name] => Self::AddRoot {
                    name: (*name).to_string(),
                },
                [parent, child] => Self::AddChild {
                    parent: (*parent).to_string(),
                    child: (*child).to_string(),
                },
                _ => Self::Usage(ADD_USAGE),
            }
        } else if is("removeElement") {
            match args.as_slice() {
                [name] => Self::Remove {
                    name: (*name).to_string(),
                },
                _ => Self::Usage(REMOVE_USAGE),
            }
        } else if is("exportTree") || is("download") {
            Self::ExportTree
        } else if is("importTree") || is("upload") {
            match args.as_slice() {
                [path] => Self::ImportTree {
                    path: PathBuf::from(*path),
                },
                _ => Self::Usage(IMPORT_USAGE),
            }
        } else {
            Self::Help
        }
    }

    fn event_name(&self) -> &'static str {
        match self {
            Self::ListTree => "list_tree",
            Self::AddRoot { .. } | Self::AddChild { .. } => "add_element",
            Self::Remove { .. } => "remove_element",
            Self::ExportTree => "export_tree",
            Self::ImportTree { .. } => "import_tree",
            Self::Help => "help",
            Self::Usage(_) => "usage",
        }
    }
}

/// Reply envelope handed back to the transport layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandReply {
    /// Whether the operation succeeded.
    pub ok: bool,
    /// Human-readable text to show the caller.
    pub message: String,
    /// File produced by the command, if any (export).
    pub document: Option<PathBuf>,
}

impl CommandReply {
    fn success(message: impl Into<String>) -> Self {
        Self {
            ok: true,
            message: message.into(),
            document: None,
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            message: message.into(),
            document: None,
        }
    }
}

/// Dispatches commands to a `CategoryService`.
pub struct CommandHandler<R: CategoryRepository> {
    service: CategoryService<R>,
    export_dir: PathBuf,
}

impl<R: CategoryRepository> CommandHandler<R> {
    /// Creates a handler exporting into `export_dir`.
    pub fn new(service: CategoryService<R>, export_dir: impl Into<PathBuf>) -> Self {
        Self {
            service,
            export_dir: export_dir.into(),
        }
    }

    /// Returns the wrapped service.
    pub fn service(&self) -> &CategoryService<R> {
        &self.service
    }

    /// Parses and executes one command line.
    pub fn handle_line(&self, line: &str) -> CommandReply {
        self.execute(Command::parse(line))
    }

    /// Executes one parsed command.
    pub fn execute(&self, command: Command) -> CommandReply {
        let event = command.event_name();
        let reply = match command {
            Command::ListTree => match self.service.render_tree() {
                Ok(tree) => CommandReply::success(tree),
                Err(err) => CommandReply::failure(err.to_string()),
            },
            Command::AddRoot { name } => match self.service.add_root(&name) {
                Ok(added) => CommandReply::success(added.message()),
                Err(err) => CommandReply::failure(err.to_string()),
            },
            Command::AddChild { parent, child } => {
                match self.service.add_child_by_name(&parent, &child) {
                    Ok(added) => CommandReply::success(added.message()),
                    Err(err) => CommandReply::failure(err.to_string()),
                }
            }
            Command::Remove { name } => match self.service.remove(&name) {
                Ok(removed) => CommandReply::success(removed.message()),
                Err(err) => CommandReply::failure(err.to_string()),
            },
            Command::ExportTree => self.export_tree(),
            Command::ImportTree { path } => self.import_tree(&path),
            Command::Help => CommandReply::success(HELP_MESSAGE),
            Command::Usage(usage) => CommandReply::failure(usage),
        };
        info!(
            "event=command module=command command={event} status={}",
            if reply.ok { "ok" } else { "error" }
        );
        reply
    }

    fn export_tree(&self) -> CommandReply {
        let categories = match self.service.list_all() {
            Ok(categories) => categories,
            Err(err) => return CommandReply::failure(err.to_string()),
        };

        let path = self.export_dir.join(DEFAULT_EXPORT_FILE_NAME);
        match export_to_path(&path, &categories) {
            Ok(()) => CommandReply {
                ok: true,
                message: format!(
                    "Exported {} category(ies) to {}.",
                    categories.len(),
                    path.display()
                ),
                document: Some(path),
            },
            Err(err) => {
                error!(
                    "event=export_tree module=command status=error error_code=io_failure error={err}"
                );
                CommandReply::failure(format!("Failed to create the export file: {err}"))
            }
        }
    }

    fn import_tree(&self, path: &Path) -> CommandReply {
        match import_from_path(&self.service, path) {
            Ok(report) => CommandReply::success(report.message()),
            Err(err) => CommandReply::failure(err.to_string()),
        }
    }
}
