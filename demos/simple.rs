//! Reads a configuration file, fills in defaults and writes it back.
//!
//! Run with `cargo run --example simple`.

use cfgtree::{Document, DocumentOptions, CATEGORY_GENERAL};
use std::borrow::Cow;
use std::env;

fn main() -> cfgtree::Result<()> {
    let path = env::temp_dir().join("cfgtree-demo").join("server.cfg");
    let mut doc = Document::open(&path, DocumentOptions::default())?;

    let port = doc.get_int(CATEGORY_GENERAL, "port", 25565).as_int(25565);
    let motd = doc
        .get_string(CATEGORY_GENERAL, "motd", "Welcome")
        .to_raw()
        .into_owned();
    let admins: Vec<String> = doc
        .get_list("server.access", "admins", &["alice"])
        .as_list()
        .into_iter()
        .map(Cow::into_owned)
        .collect();
    doc.add_comment(CATEGORY_GENERAL, "Basic server settings");
    doc.add_property_comment(CATEGORY_GENERAL, "port", "Port to listen on");

    println!("port:   {}", port);
    println!("motd:   {}", motd);
    println!("admins: {:?}", admins);

    doc.try_save()?;
    println!("\nWritten to {}:\n", path.display());
    println!("{}", std::fs::read_to_string(&path)?);
    Ok(())
}
