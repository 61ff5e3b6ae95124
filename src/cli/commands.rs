use clap::{Args, Parser, Subcommand};

use crate::model::config::Backend;
use crate::model::item::Filter;

#[derive(Parser)]
#[command(name = "chore", about = concat!("[x] chore v", env!("CARGO_PKG_VERSION"), " - one list, local or shared"), version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Run against a different workspace directory
    #[arg(short = 'C', long = "workspace-dir", global = true)]
    pub workspace_dir: Option<String>,

    /// Use this backend for this run instead of the configured one
    #[arg(long, global = true, value_parser = parse_backend)]
    pub backend: Option<Backend>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a .chore/ workspace in the current directory
    Init(InitArgs),
    /// Add an item
    Add(AddArgs),
    /// List items, newest first
    List(ListArgs),
    /// Mark an item completed
    Done(IdArgs),
    /// Mark an item not completed
    Undone(IdArgs),
    /// Change an item's title
    Edit(EditArgs),
    /// Delete items
    Rm(RmArgs),
    /// Delete every completed item
    ClearCompleted,
    /// Delete every item
    ClearAll(ClearAllArgs),
    /// Switch the configured backend
    Backend(BackendArgs),
    /// View the recovery log
    Recovery(RecoveryCmd),
}

fn parse_backend(s: &str) -> Result<Backend, String> {
    s.parse()
}

fn parse_filter(s: &str) -> Result<Filter, String> {
    s.parse()
}

#[derive(Args)]
pub struct InitArgs {
    /// Reinitialize even if .chore/ already exists
    #[arg(long)]
    pub force: bool,
}

#[derive(Args)]
pub struct AddArgs {
    /// Item title (words are joined with spaces)
    #[arg(required = true, num_args = 1..)]
    pub title: Vec<String>,
}

#[derive(Args)]
pub struct ListArgs {
    /// Show only: all, active, completed
    #[arg(long, short = 'f', value_parser = parse_filter, default_value = "all")]
    pub filter: Filter,
}

#[derive(Args)]
pub struct IdArgs {
    /// Item id, or a unique prefix of one
    pub id: String,
}

#[derive(Args)]
pub struct EditArgs {
    /// Item id, or a unique prefix of one
    pub id: String,
    /// New title (words are joined with spaces)
    #[arg(required = true, num_args = 1..)]
    pub title: Vec<String>,
}

#[derive(Args)]
pub struct RmArgs {
    /// Item ids or unique prefixes
    #[arg(required = true, num_args = 1..)]
    pub ids: Vec<String>,
}

#[derive(Args)]
pub struct ClearAllArgs {
    /// Skip the confirmation prompt
    #[arg(long, short = 'y')]
    pub yes: bool,
}

#[derive(Args)]
pub struct BackendArgs {
    /// local or remote
    #[arg(value_parser = parse_backend)]
    pub backend: Backend,
}

#[derive(Args)]
pub struct RecoveryCmd {
    #[command(subcommand)]
    pub action: Option<RecoveryAction>,
    /// Maximum number of entries to show (default: 10)
    #[arg(long)]
    pub limit: Option<usize>,
}

#[derive(Subcommand)]
pub enum RecoveryAction {
    /// Print the absolute path to the recovery log
    Path,
}
