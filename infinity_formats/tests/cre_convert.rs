use std::fs::{self, File};
use std::io::BufReader;
use std::process::Command;

use anyhow::{Context, Result};
use infinity_formats::cre::stats::{DEX, EA, STR};
use infinity_formats::{ActorRecord, CreVersion, Effect, ModifierKind, decode, encode};
use tempfile::tempdir;

fn write_creature(path: &std::path::Path) -> Result<ActorRecord> {
    let mut actor = ActorRecord::new(CreVersion::V1_0);
    actor.set_base(STR, 17);
    actor.set_base(DEX, 12);
    actor.set_base(EA, 255);
    actor.add_effect(Effect::stat_modifier(15, 3, ModifierKind::Cumulative));
    let mut bytes = Vec::new();
    encode(&actor, &mut bytes, false).context("encoding input creature")?;
    fs::write(path, bytes).with_context(|| format!("writing {}", path.display()))?;
    Ok(actor)
}

#[test]
fn converts_creature_to_icewind_character_sheet() -> Result<()> {
    let dir = tempdir().context("creating temporary directory")?;
    let input = dir.path().join("guard.cre");
    let output = dir.path().join("out").join("guard.chr");
    let original = write_creature(&input)?;

    let status = Command::new(env!("CARGO_BIN_EXE_cre_convert"))
        .arg(&input)
        .arg(&output)
        .args(["--to", "v90", "--chr"])
        .status()
        .context("executing cre_convert")?;
    assert!(status.success(), "cre_convert exited with {status:?}");

    let header = fs::read(&output).context("reading converted sheet")?;
    assert_eq!(&header[0..8], b"CHR V9.0");
    assert_eq!(&header[0x64..0x6c], b"CRE V9.0");

    let file = File::open(&output)?;
    let converted = decode(&mut BufReader::new(file)).context("decoding converted sheet")?;
    assert_eq!(converted.version, CreVersion::V9_0);
    assert_eq!(converted.base(STR), 17);
    assert_eq!(converted.base(EA), 255);
    assert_eq!(converted.stat(DEX), 15);
    assert_eq!(converted.stat(DEX), original.stat(DEX));
    assert_eq!(converted.effects().len(), 1);
    Ok(())
}

#[test]
fn refuses_to_overwrite_without_force() -> Result<()> {
    let dir = tempdir().context("creating temporary directory")?;
    let input = dir.path().join("guard.cre");
    write_creature(&input)?;
    let output = dir.path().join("taken.cre");
    fs::write(&output, b"keep me")?;

    let status = Command::new(env!("CARGO_BIN_EXE_cre_convert"))
        .arg(&input)
        .arg(&output)
        .status()
        .context("executing cre_convert")?;
    assert!(!status.success());
    assert_eq!(fs::read(&output)?, b"keep me");

    let status = Command::new(env!("CARGO_BIN_EXE_cre_convert"))
        .arg(&input)
        .arg(&output)
        .arg("--force")
        .status()
        .context("executing cre_convert with --force")?;
    assert!(status.success());
    assert_eq!(&fs::read(&output)?[0..8], b"CRE V1.0");
    Ok(())
}
