use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use infinity_engine::area::selection_circle;
use infinity_engine::{
    ActorService, BuiltinDecoders, CatalogConfig, EngineContext, GameDirectory, ProjectileServer,
    ResourceKind,
};
use infinity_formats::ResRef;

/// Inspect creatures and projectiles from a game override directory.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Game directory to index (defaults to $IE_GAME_PATH)
    #[arg(long)]
    root: Option<PathBuf>,

    /// Built-in projectile symbol table
    #[arg(long, default_value = "gemprjtl")]
    builtin_symbols: String,

    /// Game projectile symbol table
    #[arg(long, default_value = "projectl")]
    game_symbols: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List every catalog slot with its projectile name
    Projectiles,
    /// Print one projectile, by catalog index or name, as JSON
    Projectile { key: String },
    /// Summarise a creature or character sheet
    Actor {
        name: String,
        /// Read NAME.chr instead of NAME.cre
        #[arg(long)]
        chr: bool,
        /// Print the whole record as JSON
        #[arg(long)]
        json: bool,
    },
    /// Re-save a creature, optionally as a character sheet
    Export {
        name: String,
        /// Destination file
        #[arg(long)]
        out: PathBuf,
        #[arg(long)]
        chr: bool,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    let root = match args.root {
        Some(path) => path,
        None => std::env::var("IE_GAME_PATH")
            .map(PathBuf::from)
            .context("IE_GAME_PATH not set; pass --root")?,
    };

    let game = GameDirectory::open(&root)
        .with_context(|| format!("indexing game directory {}", root.display()))?;
    let decoders = BuiltinDecoders::default();
    let context = EngineContext::from_source(&game, &decoders);

    match args.command {
        Command::Projectiles => {
            let config = CatalogConfig {
                builtin_symbols: args.builtin_symbols,
                game_symbols: args.game_symbols,
                ..CatalogConfig::default()
            };
            let mut server = ProjectileServer::with_config(context, config);
            let count = server.resolve_count();
            let mut lines = Vec::with_capacity(count);
            for index in 0..count {
                let name = server
                    .name_of(index)
                    .context("building projectile catalog")?;
                if name.is_set() {
                    lines.push((index, name));
                }
            }
            println!("{} slots, {} named", count, lines.len());
            for (index, name) in lines {
                println!("{index:>5} {name}");
            }
        }
        Command::Projectile { key } => {
            let config = CatalogConfig {
                builtin_symbols: args.builtin_symbols,
                game_symbols: args.game_symbols,
                ..CatalogConfig::default()
            };
            let mut server = ProjectileServer::with_config(context, config);
            let record = match key.parse::<usize>() {
                Ok(index) => server.get_by_index(index)?,
                Err(_) => match server.get_by_name(&ResRef::new(&key))? {
                    Some(record) => record,
                    None => bail!("no projectile named {key}"),
                },
            };
            println!("{}", serde_json::to_string_pretty(&record)?);
        }
        Command::Actor { name, chr, json } => {
            let service = ActorService::new(context);
            let kind = if chr {
                ResourceKind::Character
            } else {
                ResourceKind::Creature
            };
            let actor = service
                .try_get_actor(&ResRef::new(&name), kind)
                .with_context(|| format!("loading {name}.{kind}"))?;
            if json {
                println!("{}", serde_json::to_string_pretty(&actor)?);
            } else {
                println!("{name}.{kind} {:?}", actor.version);
                println!("items: {}", actor.inventory.occupied());
                println!("known spells: {}", actor.known_spells.len());
                println!("effects: {}", actor.effects().len());
                match selection_circle(&actor, true, true, 1) {
                    Some(circle) => println!("selection circle: {:?}", circle.hue),
                    None => println!("selection circle: none"),
                }
            }
        }
        Command::Export { name, out, chr } => {
            let service = ActorService::new(context);
            let actor = service
                .try_get_actor(&ResRef::new(&name), ResourceKind::Creature)
                .with_context(|| format!("loading {name}.cre"))?;
            let mut bytes = Vec::new();
            let written = service
                .put_actor(&mut bytes, &actor, chr)
                .with_context(|| format!("encoding {name}"))?;
            fs::write(&out, &bytes).with_context(|| format!("writing {}", out.display()))?;
            println!("wrote {} ({written} bytes)", out.display());
        }
    }
    Ok(())
}
