//! Stores several documents as sections of one shared file.
//!
//! Run with `cargo run --example shared_registry`.

use cfgtree::{DocumentOptions, Registry};
use std::env;

fn main() -> cfgtree::Result<()> {
    let dir = env::temp_dir().join("cfgtree-demo");
    let registry = Registry::open(dir.join("main.cfg"), DocumentOptions::default())?;

    let mut chat = registry.attach(dir.join("modules/chat.cfg"), DocumentOptions::default());
    chat.get_bool("filter", "enabled", true);
    chat.get_list("filter", "words", &["spam", "scam"]);
    chat.try_save()?;

    let mut backup = registry.attach(dir.join("modules/backup.cfg"), DocumentOptions::default());
    backup.get_int("schedule", "interval_minutes", 30);
    backup.try_save()?;

    println!("sections: {:?}", registry.sections());
    println!("{}", std::fs::read_to_string(dir.join("main.cfg"))?);
    Ok(())
}
