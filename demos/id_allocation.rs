//! Assigns ids to a few named resources, avoiding ids the host already uses.
//!
//! Run twice with `cargo run --example id_allocation`: the second run reads
//! the assignments back instead of choosing new ones.

use cfgtree::{AllocatorConfig, Document, DocumentOptions, Domain, IdAllocator};
use std::collections::HashSet;
use std::env;

fn main() -> cfgtree::Result<()> {
    let path = env::temp_dir().join("cfgtree-demo").join("ids.cfg");
    let mut doc = Document::open(&path, DocumentOptions::default())?;

    // Ids registered by the host before configuration was read.
    let builtin: HashSet<usize> = [1, 2, 3, 500, 4095].into_iter().collect();
    let oracle = |domain: Domain, slot: usize| domain == Domain::Primary && builtin.contains(&slot);
    let mut ids = IdAllocator::new(AllocatorConfig::default(), oracle);

    for (name, wanted) in [("torch", 500), ("lamp", 501), ("lantern", 2)] {
        let id = ids.get_or_assign_default(&mut doc, name, wanted, Domain::Primary)?;
        println!("{:<8} wanted {:>4}, got {:>4}", name, wanted, id);
    }
    for (name, wanted) in [("wand", 0), ("staff", 0)] {
        let id = ids.get_or_assign(&mut doc, "items.magic", name, wanted, Domain::Secondary)?;
        println!("{:<8} wanted {:>4}, got {:>4}", name, wanted, id);
    }

    doc.try_save()?;
    println!("\nSaved to {}", path.display());
    Ok(())
}
