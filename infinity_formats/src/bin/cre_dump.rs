use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use infinity_formats::cre::stats::{
    ARMORCLASS, CHR, CLASS, CON, DEX, HITPOINTS, INT, LEVEL, MAXHITPOINTS, RACE, STR, WIS,
};
use infinity_formats::decode;

/// Inspect a creature (.cre) or character sheet (.chr).
#[derive(Parser)]
struct Args {
    /// Record to inspect
    path: PathBuf,

    /// Print the whole record as JSON instead of a summary
    #[arg(long)]
    json: bool,
}

const SUMMARY_STATS: &[(&str, usize)] = &[
    ("hp", HITPOINTS),
    ("max hp", MAXHITPOINTS),
    ("ac", ARMORCLASS),
    ("level", LEVEL),
    ("str", STR),
    ("dex", DEX),
    ("con", CON),
    ("int", INT),
    ("wis", WIS),
    ("cha", CHR),
    ("race", RACE),
    ("class", CLASS),
];

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    let file =
        File::open(&args.path).with_context(|| format!("opening {}", args.path.display()))?;
    let actor = decode(&mut BufReader::new(file))
        .with_context(|| format!("decoding {}", args.path.display()))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&actor)?);
        return Ok(());
    }

    println!("{} {:?}", args.path.display(), actor.version);
    if !actor.name.is_empty() {
        println!("name: {}", actor.name);
    }
    println!("strrefs: {} / {}", actor.long_name, actor.short_name);
    println!("dialog: {}", actor.dialog);
    for (label, stat) in SUMMARY_STATS {
        let delta = actor.modifier_delta(*stat);
        if delta == 0 {
            println!("{label:>8}: {}", actor.stat(*stat));
        } else {
            println!("{label:>8}: {} ({:+})", actor.stat(*stat), delta);
        }
    }
    println!("known spells: {}", actor.known_spells.len());
    for page in &actor.spell_pages {
        println!(
            "  kind {} level {}: {}/{} memorized",
            page.kind,
            page.level,
            page.memorized.len(),
            page.slots
        );
    }
    println!("items: {}", actor.inventory.occupied());
    for (slot, item) in actor.inventory.items() {
        println!("  {slot:>3} {:<8} charges {:?}", item.resref, item.charges);
    }
    println!("effects: {}", actor.effects().len());
    Ok(())
}
