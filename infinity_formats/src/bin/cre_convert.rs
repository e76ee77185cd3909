use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use infinity_formats::{CreVersion, DecodeOptions, SubVersionPolicy, decode_with, encode};

/// Re-save a creature, optionally as another generation or as a character sheet.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Creature or character sheet to read
    input: PathBuf,

    /// Destination file
    output: PathBuf,

    /// Wrap the creature in a character sheet header
    #[arg(long)]
    chr: bool,

    /// Target generation (defaults to the input's)
    #[arg(long, value_enum)]
    to: Option<VersionArg>,

    /// What to do with unknown creature versions
    #[arg(long, value_enum, default_value_t = PolicyArg::BestEffort)]
    sub_version_policy: PolicyArg,

    /// Overwrite an existing output file
    #[arg(long)]
    force: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum VersionArg {
    V10,
    V11,
    V12,
    V90,
    V22,
}

impl From<VersionArg> for CreVersion {
    fn from(arg: VersionArg) -> Self {
        match arg {
            VersionArg::V10 => CreVersion::V1_0,
            VersionArg::V11 => CreVersion::V1_1,
            VersionArg::V12 => CreVersion::V1_2,
            VersionArg::V90 => CreVersion::V9_0,
            VersionArg::V22 => CreVersion::V2_2,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum PolicyArg {
    Reject,
    DefaultRecord,
    BestEffort,
}

impl From<PolicyArg> for SubVersionPolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::Reject => SubVersionPolicy::Reject,
            PolicyArg::DefaultRecord => SubVersionPolicy::DefaultRecord,
            PolicyArg::BestEffort => SubVersionPolicy::BestEffort,
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if args.output.exists() && !args.force {
        anyhow::bail!(
            "{} already exists, use --force to overwrite",
            args.output.display()
        );
    }

    let options = DecodeOptions {
        sub_version_policy: args.sub_version_policy.into(),
    };
    let file =
        File::open(&args.input).with_context(|| format!("opening {}", args.input.display()))?;
    let mut actor = decode_with(&mut BufReader::new(file), &options)
        .with_context(|| format!("decoding {}", args.input.display()))?;
    if let Some(target) = args.to {
        actor.convert_to(target.into());
    }

    if let Some(parent) = args.output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
    }
    let mut sink = BufWriter::new(
        File::create(&args.output)
            .with_context(|| format!("creating {}", args.output.display()))?,
    );
    let written = encode(&actor, &mut sink, args.chr)
        .with_context(|| format!("encoding {:?} record", actor.version))?;
    sink.flush()?;
    println!(
        "wrote {} ({:?}{}, {written} bytes)",
        args.output.display(),
        actor.version,
        if args.chr { ", character sheet" } else { "" }
    );
    Ok(())
}
