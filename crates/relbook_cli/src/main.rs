//! `relbook` command-line entry point.
//!
//! # Responsibility
//! - Resolve configuration, start logging and open the selected store.
//! - Map every store error kind to its own process exit code.

mod args;
mod commands;

use args::{Cli, SchemaArg};
use clap::Parser;
use relbook_core::{init_logging, Blog, Campus, CoreConfig, RepoError};
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(exit_code_for(&err))
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = CoreConfig::from_env()?;
    if let Some(db) = &cli.db {
        config.db_path = db.clone();
    }
    if let Some(dir) = &cli.log_dir {
        config.log_dir = Some(dir.clone());
    }
    let level = cli.log_level.as_deref().unwrap_or(config.log_level);
    init_logging(level, config.log_target())?;

    let output = match cli.schema {
        SchemaArg::Blog => commands::dispatch::<Blog>(&cli, &config)?,
        SchemaArg::Campus => commands::dispatch::<Campus>(&cli, &config)?,
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

/// One exit code per error kind; `1` for anything outside the store.
fn exit_code_for(err: &anyhow::Error) -> u8 {
    if let Some(repo_err) = err.downcast_ref::<RepoError>() {
        return match repo_err {
            RepoError::Validation(_) => 3,
            RepoError::AlreadyExists { .. } => 4,
            RepoError::ParentNotFound(_) => 5,
            RepoError::ChildNotFound(_) => 6,
            RepoError::Db(_) => 7,
            RepoError::UninitializedConnection { .. } => 8,
            RepoError::MissingRequiredTable(_) => 9,
            RepoError::InvalidData(_) => 10,
            RepoError::LockPoisoned => 11,
        };
    }
    if err.downcast_ref::<commands::RecordNotFound>().is_some() {
        return 12;
    }
    1
}
