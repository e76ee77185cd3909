use std::fs;
use std::path::Path;
use std::process::Command;

use anyhow::{Context, Result};
use infinity_engine::{BuiltinDecoders, EngineContext, GameDirectory, ProjectileServer};
use infinity_formats::cre::stats::STR;
use infinity_formats::{ActorRecord, AreaFlags, CreVersion, ResRef};
use tempfile::tempdir;

fn fireball_projectile() -> Vec<u8> {
    let mut bytes = vec![0u8; 0x300];
    bytes[..8].copy_from_slice(b"PRO V1.0");
    bytes[0x08] = 3;
    bytes[0x0a] = 20;
    bytes[0x208..0x210].copy_from_slice(b"EFF_E02\0");
    bytes[0x217] = 1;
    bytes[0x21c..0x224].copy_from_slice(b"OWNVVC\0\0");
    bytes
}

fn write_fixture(root: &Path) -> Result<()> {
    let override_dir = root.join("override");
    fs::create_dir_all(&override_dir).context("creating override directory")?;
    fs::write(
        root.join("PROJECTL.IDS"),
        "IDS V1.0\n1 ARROW\n2 FIREBALL\n3 OLDBOLT\n",
    )?;
    fs::write(override_dir.join("gemprjtl.ids"), "3 MAGICMSL\n")?;
    fs::write(
        root.join("areapro.2da"),
        "2DA V1.0\n*\nSPREAD CENTER SECONDARY SOUND AREA FLAGS\n\
         NONE * * * * * 0\n\
         FIRE SPREAD1 FIREVVC * EFF_E99 * 5\n",
    )?;
    fs::write(override_dir.join("FIREBALL.PRO"), fireball_projectile())?;

    let mut actor = ActorRecord::new(CreVersion::V1_0);
    actor.set_base(STR, 18);
    let mut cre = Vec::new();
    infinity_formats::encode(&actor, &mut cre, false).context("encoding fixture creature")?;
    fs::write(override_dir.join("guard.cre"), cre)?;
    Ok(())
}

#[test]
fn catalog_resolves_fixture_directory() -> Result<()> {
    let dir = tempdir().context("creating fixture directory")?;
    write_fixture(dir.path())?;

    let game = GameDirectory::open(dir.path())?;
    let decoders = BuiltinDecoders::default();
    let mut server = ProjectileServer::new(EngineContext::from_source(&game, &decoders));

    assert_eq!(server.resolve_count(), 4);
    assert_eq!(server.name_of(3)?, ResRef::new("MAGICMSL"));

    let fireball = server.get_by_index(2)?;
    assert_eq!(fireball.name, ResRef::new("FIREBALL"));
    assert_eq!(fireball.index, 2);
    let ext = fireball.extension.as_ref().context("fireball has no area extension")?;
    assert_eq!(ext.spread, ResRef::new("SPREAD1"));
    assert_eq!(ext.vvc, ResRef::new("FIREVVC"));
    assert!(ext.flags.contains(AreaFlags::VVC));
    assert_eq!(ext.sound, ResRef::new("EFF_E99"));
    assert_eq!(ext.ap_flags, 5);

    let arrow = server
        .get_by_name(&ResRef::new("arrow"))?
        .context("arrow should resolve to a placeholder")?;
    assert_eq!(arrow.index, 1);
    assert!(arrow.extension.is_none());

    let fallback = server.get_by_index(0x4000)?;
    assert_eq!(fallback.index, 0);
    Ok(())
}

#[test]
fn cli_lists_projectiles_and_actors() -> Result<()> {
    let dir = tempdir().context("creating fixture directory")?;
    write_fixture(dir.path())?;
    let root = dir
        .path()
        .to_str()
        .context("fixture path is not valid UTF-8")?;

    let output = Command::new(env!("CARGO_BIN_EXE_infinity_engine"))
        .args(["--root", root, "projectiles"])
        .output()
        .context("executing infinity_engine projectiles")?;
    assert!(
        output.status.success(),
        "infinity_engine exited with {:?}",
        output.status
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("4 slots, 3 named"), "unexpected listing:\n{stdout}");
    assert!(stdout.contains("MAGICMSL"));
    assert!(!stdout.contains("OLDBOLT"));

    let output = Command::new(env!("CARGO_BIN_EXE_infinity_engine"))
        .args(["--root", root, "projectile", "fireball"])
        .output()
        .context("executing infinity_engine projectile")?;
    assert!(output.status.success());
    let record: serde_json::Value = serde_json::from_slice(&output.stdout)
        .context("projectile output is not JSON")?;
    assert_eq!(record["name"], "FIREBALL");
    assert_eq!(record["extension"]["vvc"], "FIREVVC");

    let output = Command::new(env!("CARGO_BIN_EXE_infinity_engine"))
        .args(["--root", root, "actor", "guard", "--json"])
        .output()
        .context("executing infinity_engine actor")?;
    assert!(output.status.success());
    let actor: serde_json::Value =
        serde_json::from_slice(&output.stdout).context("actor output is not JSON")?;
    assert_eq!(actor["version"], "V1_0");
    Ok(())
}

#[test]
fn cli_ignores_numbers_past_the_catalog_limit() -> Result<()> {
    let dir = tempdir().context("creating fixture directory")?;
    write_fixture(dir.path())?;
    fs::write(dir.path().join("broken.ids"), "9000 TOOFAR\n")?;
    let root = dir
        .path()
        .to_str()
        .context("fixture path is not valid UTF-8")?;

    let output = Command::new(env!("CARGO_BIN_EXE_infinity_engine"))
        .args(["--root", root, "--builtin-symbols", "broken", "projectiles"])
        .output()
        .context("executing infinity_engine projectiles")?;
    assert!(
        output.status.success(),
        "infinity_engine exited with {:?}",
        output.status
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("4 slots, 3 named"), "unexpected listing:\n{stdout}");
    assert!(stdout.contains("OLDBOLT"));
    assert!(!stdout.contains("TOOFAR"));

    let output = Command::new(env!("CARGO_BIN_EXE_infinity_engine"))
        .args(["--root", root, "projectile", "nosuch"])
        .output()
        .context("executing infinity_engine projectile")?;
    assert!(!output.status.success());
    Ok(())
}
