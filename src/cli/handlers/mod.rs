mod init;
pub use init::cmd_init;

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::info;

use crate::cli::commands::*;
use crate::cli::output::*;
use crate::io::config_io;
use crate::io::lock::DataLock;
use crate::io::storage;
use crate::model::config::AppConfig;
use crate::model::task::Priority;
use crate::ops::store::TaskUpdate;
use crate::ops::world::World;
use crate::util::time::parse_deadline;

type CmdResult = Result<(), Box<dyn std::error::Error>>;

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub fn dispatch(cli: Cli) -> CmdResult {
    let json = cli.json;
    let data_dir = storage::resolve_data_dir(cli.data_dir.as_deref())?;

    let Some(cmd) = cli.command else {
        return Err("no command given (run without arguments to open the TUI)".into());
    };
    match cmd {
        Commands::Init(args) => cmd_init(&data_dir, args),

        // Read commands
        Commands::List(args) => cmd_list(&data_dir, args, json),
        Commands::Chest => cmd_chest(&data_dir, json),
        Commands::Stats => cmd_stats(&data_dir, json),

        // Write commands
        Commands::Add(args) => cmd_add(&data_dir, args, json),
        Commands::Edit(args) => cmd_edit(&data_dir, args, json),
        Commands::Rm(args) => cmd_rm(&data_dir, args),
        Commands::Done(args) => cmd_done(&data_dir, args, json),
        Commands::Restore(args) => cmd_restore(&data_dir, args, json),
        Commands::ChestRm(args) => cmd_chest_rm(&data_dir, args),
        Commands::Clear(args) => cmd_clear(&data_dir, args, json),

        Commands::Config(args) => cmd_config(&data_dir, args),
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Loaded data for one command. Write sessions hold the data lock until dropped.
struct Session {
    dir: PathBuf,
    config: AppConfig,
    world: World,
    _lock: Option<DataLock>,
}

impl Session {
    fn read(dir: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        Self::open(dir, None)
    }

    fn write(dir: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let lock = DataLock::acquire_default(dir)?;
        Self::open(dir, Some(lock))
    }

    fn open(dir: &Path, lock: Option<DataLock>) -> Result<Self, Box<dyn std::error::Error>> {
        let config = config_io::load_config(dir)?;
        let store = storage::load_store(dir)?;
        let mut world = World::new(store);
        world.set_sort_mode(config.tasks.default_sort);
        Ok(Session {
            dir: dir.to_path_buf(),
            config,
            world,
            _lock: lock,
        })
    }

    fn save(&mut self) -> Result<(), storage::StorageError> {
        storage::save_store(&self.dir, self.world.store())?;
        self.world.mark_saved();
        Ok(())
    }
}

/// Ask a yes/no question on stderr. Anything but `y`/`yes` (including EOF) is no.
fn confirm(prompt: &str) -> io::Result<bool> {
    eprint!("{} [y/N] ", prompt);
    io::stderr().flush()?;
    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}

fn print_json<T: serde::Serialize>(value: &T) -> CmdResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

// ---------------------------------------------------------------------------
// Read commands
// ---------------------------------------------------------------------------

fn cmd_list(dir: &Path, args: ListArgs, json: bool) -> CmdResult {
    let mut session = Session::read(dir)?;
    if let Some(sort) = args.sort {
        session.world.set_sort_mode(sort);
    }
    let now = Utc::now();
    let snapshot = session.world.snapshot(now);

    if json {
        let tasks: Vec<TaskJson> = snapshot.active.iter().map(|t| task_to_json(t, now)).collect();
        return print_json(&tasks);
    }
    if snapshot.active.is_empty() {
        println!("inventory is empty");
        return Ok(());
    }
    for task in &snapshot.active {
        println!("{}", format_task_line(task, now));
    }
    Ok(())
}

fn cmd_chest(dir: &Path, json: bool) -> CmdResult {
    let session = Session::read(dir)?;
    let snapshot = session.world.snapshot(Utc::now());

    if json {
        let tasks: Vec<CompletedJson> = snapshot
            .completed
            .iter()
            .map(|d| completed_to_json(d))
            .collect();
        return print_json(&tasks);
    }
    if snapshot.completed.is_empty() {
        println!("chest is empty");
        return Ok(());
    }
    for done in &snapshot.completed {
        println!("{}", format_completed_line(done));
    }
    Ok(())
}

fn cmd_stats(dir: &Path, json: bool) -> CmdResult {
    let session = Session::read(dir)?;
    let snapshot = session.world.snapshot(Utc::now());
    if json {
        return print_json(&stats_to_json(&snapshot));
    }
    println!("{}", snapshot.counters());
    Ok(())
}

// ---------------------------------------------------------------------------
// Write commands
// ---------------------------------------------------------------------------

fn cmd_add(dir: &Path, args: AddArgs, json: bool) -> CmdResult {
    let mut session = Session::write(dir)?;
    let priority = args
        .priority
        .or(Some(session.config.tasks.default_priority))
        .and_then(Priority::new)
        .unwrap_or_default();
    let now = Utc::now();
    let deadline = args
        .deadline
        .as_deref()
        .map(|d| parse_deadline(d, now))
        .transpose()?;

    let task = session.world.create_task(&args.name, priority, deadline)?;
    session.save()?;
    info!(id = %task.id, "added task from cli");

    if json {
        return print_json(&task_to_json(&task, now));
    }
    println!("{}", task.id);
    Ok(())
}

fn cmd_edit(dir: &Path, args: EditArgs, json: bool) -> CmdResult {
    let mut session = Session::write(dir)?;
    let id = session.world.store().resolve_active(&args.id)?;
    let now = Utc::now();

    let deadline = if args.clear_deadline {
        Some(None)
    } else {
        args.deadline
            .as_deref()
            .map(|d| parse_deadline(d, now).map(Some))
            .transpose()?
    };
    let update = TaskUpdate {
        name: args.name,
        priority: args.priority.and_then(Priority::new),
        deadline,
    };
    if update.is_empty() {
        return Err(
            "nothing to change (use --name, --priority, --deadline or --clear-deadline)".into(),
        );
    }

    let task = session.world.edit_task(&id, update)?;
    session.save()?;

    if json {
        return print_json(&task_to_json(&task, now));
    }
    println!("{}", format_task_line(&task, now));
    Ok(())
}

fn cmd_rm(dir: &Path, args: RmArgs) -> CmdResult {
    let preview = Session::read(dir)?;
    let id = preview.world.store().resolve_active(&args.id)?;
    let name = preview
        .world
        .store()
        .get(&id)
        .map(|t| t.name.clone())
        .unwrap_or_default();

    if !args.yes && !confirm(&format!("Delete '{}'?", name))? {
        println!("aborted");
        return Ok(());
    }
    let mut session = Session::write(dir)?;
    let task = session.world.delete_task(&id)?;
    session.save()?;
    println!("deleted {} {}", task.id.short(), task.name);
    Ok(())
}

fn cmd_done(dir: &Path, args: IdArg, json: bool) -> CmdResult {
    let mut session = Session::write(dir)?;
    let id = session.world.store().resolve_active(&args.id)?;
    let done = session.world.complete_now(&id)?;
    session.save()?;
    info!(id = %done.id(), "completed task from cli");

    if json {
        return print_json(&completed_to_json(&done));
    }
    println!("mined {} {}", done.task.block().name(), done.task.name);
    Ok(())
}

fn cmd_restore(dir: &Path, args: IdArg, json: bool) -> CmdResult {
    let mut session = Session::write(dir)?;
    let id = session.world.store().resolve_completed(&args.id)?;
    let task = session.world.restore_completed(&id)?;
    session.save()?;

    if json {
        return print_json(&task_to_json(&task, Utc::now()));
    }
    println!("restored {} {}", task.id.short(), task.name);
    Ok(())
}

fn cmd_chest_rm(dir: &Path, args: RmArgs) -> CmdResult {
    let preview = Session::read(dir)?;
    let id = preview.world.store().resolve_completed(&args.id)?;
    let name = preview
        .world
        .store()
        .get_completed(&id)
        .map(|d| d.task.name.clone())
        .unwrap_or_default();

    if !args.yes && !confirm(&format!("Delete '{}' from the chest?", name))? {
        println!("aborted");
        return Ok(());
    }
    let mut session = Session::write(dir)?;
    let done = session.world.delete_completed(&id)?;
    session.save()?;
    println!("deleted {} {}", done.id().short(), done.task.name);
    Ok(())
}

fn cmd_clear(dir: &Path, args: ClearArgs, json: bool) -> CmdResult {
    let count = Session::read(dir)?.world.store().completed_len();

    if count > 0 && !args.yes && !confirm(&format!("Empty the chest ({} tasks)?", count))? {
        println!("aborted");
        return Ok(());
    }
    let mut session = Session::write(dir)?;
    let cleared = session.world.clear_completed()?;
    session.save()?;

    if json {
        return print_json(&ClearedJson { cleared });
    }
    println!("cleared {} tasks from the chest", cleared);
    Ok(())
}

fn cmd_config(dir: &Path, args: ConfigCmd) -> CmdResult {
    match args.action {
        ConfigAction::Get { key } => {
            let config = config_io::load_config(dir)?;
            println!("{}", config_io::get_value(&config, &key)?);
        }
        ConfigAction::Set { key, value } => {
            let _lock = DataLock::acquire_default(dir)?;
            let (_, mut doc) = config_io::read_config(dir)?;
            config_io::set_value(&mut doc, &key, &value)?;
            config_io::write_config(dir, &doc)?;
            println!("{} = {}", key, value);
        }
    }
    Ok(())
}
