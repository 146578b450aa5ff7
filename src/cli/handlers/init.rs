use std::fs;
use std::path::Path;

use chrono::{Duration, Utc};

use crate::cli::commands::InitArgs;
use crate::io::config_io::CONFIG_FILE;
use crate::io::lock::DataLock;
use crate::io::storage::{self, atomic_write};
use crate::model::task::Priority;
use crate::ops::world::World;

const CONFIG_TEMPLATE: &str = r##"# craftdo configuration

[tasks]
# Priority used when none is given: 1 dirt, 2 wood, 3 stone, 4 iron, 5 obsidian
default_priority = 3
# Inventory order: "none" (insertion), "deadline" or "priority"
default_sort = "none"

[ui]
# Event loop tick in milliseconds; animations advance once per tick
frame_ms = 16
show_key_hints = true

# [ui.colors]
# background = "#1E1E1E"
# text = "#E0E0E0"
# text_bright = "#FFFFFF"
# highlight = "#55FF55"
# dim = "#6B6B6B"
# slot = "#8B8B8B"
# red = "#FF5555"
# yellow = "#FFD700"
# green = "#55FF55"
"##;

/// (name, priority, deadline offset in hours)
const SAMPLE_TASKS: &[(&str, u8, Option<i64>)] = &[
    ("Punch a tree", 1, None),
    ("Craft a workbench", 2, Some(2)),
    ("Build a shelter before nightfall", 3, Some(20)),
    ("Smelt iron for armour", 4, Some(72)),
    ("Find diamonds", 5, None),
];

pub fn cmd_init(dir: &Path, args: InitArgs) -> Result<(), Box<dyn std::error::Error>> {
    fs::create_dir_all(dir)
        .map_err(|e| format!("could not create {}: {}", dir.display(), e))?;
    let _lock = DataLock::acquire_default(dir)?;

    let config_path = dir.join(CONFIG_FILE);
    if args.force || !config_path.exists() {
        atomic_write(&config_path, CONFIG_TEMPLATE.as_bytes())?;
    }

    let mut world = World::new(storage::load_store(dir)?);
    if args.sample {
        if world.store().active_len() > 0 {
            return Err("inventory is not empty; refusing to add sample tasks".into());
        }
        let now = Utc::now();
        for (name, priority, hours) in SAMPLE_TASKS {
            let priority = Priority::new(*priority).unwrap_or_default();
            let deadline = hours.map(|h| now + Duration::hours(h));
            world.create_task(name, priority, deadline)?;
        }
    }
    storage::save_store(dir, world.store())?;

    println!("initialized {}", dir.display());
    Ok(())
}
