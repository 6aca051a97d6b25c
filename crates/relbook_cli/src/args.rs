//! Command-line argument definitions using clap derive.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Relbook - relational entity store with referential integrity
#[derive(Parser, Debug)]
#[command(name = "relbook")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// SQLite file to use (overrides RELBOOK_DB_PATH)
    #[arg(long, global = true, conflicts_with = "memory")]
    pub db: Option<PathBuf>,

    /// Use a throwaway in-memory store instead of a file
    #[arg(long, global = true)]
    pub memory: bool,

    /// Which concrete schema to operate on
    #[arg(long, global = true, value_enum, default_value_t = SchemaArg::Blog)]
    pub schema: SchemaArg,

    /// Absolute directory for rotating log files (overrides RELBOOK_LOG_DIR)
    #[arg(long, global = true)]
    pub log_dir: Option<PathBuf>,

    /// Log level (overrides RELBOOK_LOG_LEVEL)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaArg {
    /// users, posts, comments
    Blog,
    /// students, courses, enrollments
    Campus,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Manage parent records (users / students)
    #[command(subcommand)]
    Parent(EntityCommand),
    /// Manage child records (posts / courses)
    #[command(subcommand)]
    Child(EntityCommand),
    /// Manage links (comments / enrollments)
    #[command(subcommand)]
    Link(LinkCommand),
}

#[derive(Subcommand, Debug)]
pub enum EntityCommand {
    /// Create a record with a caller-chosen id
    Add { id: i64, name: String },
    /// List records in insertion order
    List(PageArgs),
    /// Show one record with its links
    Show { id: i64 },
}

#[derive(Subcommand, Debug)]
pub enum LinkCommand {
    /// Link an existing parent to an existing child
    Add {
        id: i64,
        parent_id: i64,
        child_id: i64,
        /// Comment body (blog schema only)
        #[arg(long)]
        text: Option<String>,
    },
    /// List links, optionally for one endpoint
    List {
        #[arg(long, conflicts_with = "child_id")]
        parent_id: Option<i64>,
        #[arg(long)]
        child_id: Option<i64>,
        #[command(flatten)]
        page: PageArgs,
    },
}

#[derive(Args, Debug, Clone, Copy)]
pub struct PageArgs {
    /// 1-based page number; omit to list everything
    #[arg(long)]
    pub page: Option<i64>,
    /// Page size; defaults to RELBOOK_PER_PAGE or 5
    #[arg(long)]
    pub per_page: Option<i64>,
}

impl PageArgs {
    pub fn is_paged(&self) -> bool {
        self.page.is_some() || self.per_page.is_some()
    }
}
