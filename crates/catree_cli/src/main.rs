//! `catree` command-line entry point.
//!
//! # Responsibility
//! - Resolve runtime configuration from flags and initialize logging.
//! - Open the category database and route commands through the core
//!   command surface, one-shot or as a line-oriented shell.

mod args;

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use args::Cli;
use catree_core::db::open_db;
use catree_core::{
    default_log_level, init_logging, init_stderr_logging, CategoryService, CommandHandler,
    CommandReply, SqliteCategoryRepository,
};
use clap::Parser;
use log::{error, info};

const STDERR_DEFAULT_LOG_LEVEL: &str = "warn";

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(err) = init_cli_logging(&cli) {
        eprintln!("catree: failed to initialize logging: {err}");
        return ExitCode::FAILURE;
    }

    match run(cli) {
        Ok(code) => code,
        Err(message) => {
            error!("event=cli_run module=cli status=error error={message}");
            eprintln!("catree: {message}");
            ExitCode::FAILURE
        }
    }
}

fn init_cli_logging(cli: &Cli) -> Result<(), String> {
    match &cli.log_dir {
        Some(dir) => {
            let level = cli.log_level.as_deref().unwrap_or(default_log_level());
            let dir = absolute_path(dir)?;
            init_logging(level, &dir.to_string_lossy())
        }
        None => {
            let level = cli.log_level.as_deref().unwrap_or(STDERR_DEFAULT_LOG_LEVEL);
            init_stderr_logging(level)
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode, String> {
    let conn = open_db(&cli.db)
        .map_err(|err| format!("failed to open database `{}`: {err}", cli.db.display()))?;
    let repo = SqliteCategoryRepository::try_new(&conn)
        .map_err(|err| format!("database `{}` is not usable: {err}", cli.db.display()))?;
    let handler = CommandHandler::new(CategoryService::new(repo), cli.export_dir);
    info!(
        "event=cli_run module=cli status=start db={}",
        cli.db.display()
    );

    match cli.command.into_command() {
        Some(command) => {
            let reply = handler.execute(command);
            print_reply(&reply);
            Ok(if reply.ok {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        None => run_shell(&handler),
    }
}

fn run_shell(handler: &CommandHandler<SqliteCategoryRepository<'_>>) -> Result<ExitCode, String> {
    let stdin = io::stdin();
    let mut failures = 0usize;
    for line in stdin.lock().lines() {
        let line = line.map_err(|err| format!("failed to read stdin: {err}"))?;
        if line.trim().is_empty() {
            continue;
        }
        let reply = handler.handle_line(&line);
        if !reply.ok {
            failures += 1;
        }
        print_reply(&reply);
        io::stdout()
            .flush()
            .map_err(|err| format!("failed to write stdout: {err}"))?;
    }
    info!("event=cli_shell module=cli status=ok failures={failures}");
    Ok(ExitCode::SUCCESS)
}

fn print_reply(reply: &CommandReply) {
    let message = reply.message.trim_end_matches('\n');
    if reply.ok {
        println!("{message}");
    } else {
        eprintln!("{message}");
    }
    if let Some(document) = &reply.document {
        println!("document: {}", document.display());
    }
}

fn absolute_path(path: &Path) -> Result<PathBuf, String> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    std::env::current_dir()
        .map(|cwd| cwd.join(path))
        .map_err(|err| format!("failed to resolve current directory: {err}"))
}
