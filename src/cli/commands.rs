use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::ops::sort::SortMode;

#[derive(Parser)]
#[command(
    name = "craftdo",
    about = concat!("[▓▓] craftdo v", env!("CARGO_PKG_VERSION"), " - mine your todo list"),
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Directory holding tasks.json, completed.json and config.toml
    #[arg(short = 'D', long = "data-dir", env = "CRAFTDO_DIR", global = true)]
    pub data_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create the data directory and a commented config.toml
    Init(InitArgs),
    /// List tasks in the inventory
    List(ListArgs),
    /// List tasks in the chest
    Chest,
    /// Add a task to the inventory
    Add(AddArgs),
    /// Edit an inventory task
    Edit(EditArgs),
    /// Delete an inventory task
    Rm(RmArgs),
    /// Complete a task, moving it to the chest
    Done(IdArg),
    /// Move a chest task back to the inventory
    Restore(IdArg),
    /// Delete a task from the chest
    ChestRm(RmArgs),
    /// Empty the chest
    Clear(ClearArgs),
    /// Show capacity and deadline counters
    Stats,
    /// Read or change config.toml
    Config(ConfigCmd),
}

#[derive(Args)]
pub struct InitArgs {
    /// Seed the inventory with a few example tasks
    #[arg(long)]
    pub sample: bool,
    /// Rewrite config.toml even if one exists
    #[arg(long)]
    pub force: bool,
}

#[derive(Args)]
pub struct ListArgs {
    /// Display order (none, deadline, priority); defaults to config
    #[arg(long)]
    pub sort: Option<SortMode>,
}

#[derive(Args)]
pub struct AddArgs {
    /// Task name
    pub name: String,
    /// Priority 1 (dirt) to 5 (obsidian); defaults to config
    #[arg(short = 'p', long, value_parser = clap::value_parser!(u8).range(1..=5))]
    pub priority: Option<u8>,
    /// Deadline: YYYY-MM-DD, "YYYY-MM-DD HH:MM", RFC 3339, or +30m/+2h/+3d
    #[arg(long)]
    pub deadline: Option<String>,
}

#[derive(Args)]
pub struct EditArgs {
    /// Task id (a unique prefix is enough)
    pub id: String,
    /// New name
    #[arg(long)]
    pub name: Option<String>,
    /// New priority 1-5
    #[arg(short = 'p', long, value_parser = clap::value_parser!(u8).range(1..=5))]
    pub priority: Option<u8>,
    /// New deadline
    #[arg(long, conflicts_with = "clear_deadline")]
    pub deadline: Option<String>,
    /// Remove the deadline
    #[arg(long)]
    pub clear_deadline: bool,
}

#[derive(Args)]
pub struct IdArg {
    /// Task id (a unique prefix is enough)
    pub id: String,
}

#[derive(Args)]
pub struct RmArgs {
    /// Task id (a unique prefix is enough)
    pub id: String,
    /// Skip the confirmation prompt
    #[arg(short = 'y', long)]
    pub yes: bool,
}

#[derive(Args)]
pub struct ClearArgs {
    /// Skip the confirmation prompt
    #[arg(short = 'y', long)]
    pub yes: bool,
}

#[derive(Args)]
pub struct ConfigCmd {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print a config value
    Get {
        /// Key, e.g. tasks.default_sort or ui.colors.background
        key: String,
    },
    /// Set a config value, keeping the rest of the file intact
    Set {
        key: String,
        value: String,
    },
}
