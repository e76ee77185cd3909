use std::io::Write;

use infinity_formats::{ActorRecord, FormatError, ResRef};
use log::{debug, error, warn};

use crate::context::{EngineContext, ResourceKind};
use crate::error::EngineError;

/// Creature import and export on top of the engine context.
pub struct ActorService<'a> {
    context: EngineContext<'a>,
}

impl<'a> ActorService<'a> {
    pub fn new(context: EngineContext<'a>) -> Self {
        ActorService { context }
    }

    /// Decodes `name` of the given kind, surfacing every failure.
    pub fn try_get_actor(
        &self,
        name: &ResRef,
        kind: ResourceKind,
    ) -> Result<ActorRecord, EngineError> {
        let decoder = self
            .context
            .decoders
            .actor_decoder()
            .ok_or(EngineError::NoDecoder { kind })?;
        let mut stream = self.context.resources.open_resource(name, kind)?;
        Ok(decoder.decode_actor(stream.as_mut())?)
    }

    /// Creature `name`, or an empty actor when it cannot be read.
    pub fn get_actor(&self, name: &ResRef) -> ActorRecord {
        self.get_or_default(name, ResourceKind::Creature)
    }

    /// Character sheet `name`, or an empty actor when it cannot be read.
    pub fn get_character(&self, name: &ResRef) -> ActorRecord {
        self.get_or_default(name, ResourceKind::Character)
    }

    fn get_or_default(&self, name: &ResRef, kind: ResourceKind) -> ActorRecord {
        match self.try_get_actor(name, kind) {
            Ok(actor) => actor,
            Err(err) => {
                match &err {
                    EngineError::Format(FormatError::TruncatedRecord { .. }) => {
                        error!("{name}.{kind}: {err}")
                    }
                    err if err.is_missing() => debug!("{name}.{kind}: {err}"),
                    _ => warn!("{name}.{kind}: {err}"),
                }
                ActorRecord::default()
            }
        }
    }

    /// Saves `actor`, wrapped in a character sheet when `chr` is set.
    pub fn put_actor<W: Write>(
        &self,
        sink: &mut W,
        actor: &ActorRecord,
        chr: bool,
    ) -> Result<usize, EngineError> {
        Ok(infinity_formats::encode(actor, sink, chr)?)
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use infinity_formats::cre::stats::{DEX, STR};
    use infinity_formats::CreVersion;
    use tempfile::tempdir;

    use super::*;
    use crate::context::BuiltinDecoders;
    use crate::game_directory::GameDirectory;

    #[test]
    fn saves_and_reloads_through_the_directory() {
        let dir = tempdir().unwrap();
        let mut actor = ActorRecord::new(CreVersion::V9_0);
        actor.set_base(STR, 18);
        actor.set_base(DEX, 17);
        actor.set_name("Sheemish");

        {
            let game = GameDirectory::open(dir.path()).unwrap();
            let decoders = BuiltinDecoders::default();
            let service = ActorService::new(EngineContext::from_source(&game, &decoders));
            let mut cre = Vec::new();
            service.put_actor(&mut cre, &actor, false).unwrap();
            fs::write(dir.path().join("sheemish.cre"), cre).unwrap();
            let mut chr = Vec::new();
            service.put_actor(&mut chr, &actor, true).unwrap();
            fs::write(dir.path().join("SHEEMISH.CHR"), chr).unwrap();
        }

        let game = GameDirectory::open(dir.path()).unwrap();
        let decoders = BuiltinDecoders::default();
        let service = ActorService::new(EngineContext::from_source(&game, &decoders));
        let loaded = service.get_actor(&ResRef::new("SHEEMISH"));
        assert_eq!(loaded.version, CreVersion::V9_0);
        assert_eq!(loaded.stat(STR), 18);
        assert!(loaded.name.is_empty());

        let sheet = service.get_character(&ResRef::new("sheemish"));
        assert_eq!(sheet.name, "Sheemish");
        assert_eq!(sheet.stat(DEX), 17);
    }

    #[test]
    fn unreadable_actors_degrade_to_default() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("broken.cre"), b"CRE V1.0").unwrap();
        let game = GameDirectory::open(dir.path()).unwrap();
        let decoders = BuiltinDecoders::default();
        let service = ActorService::new(EngineContext::from_source(&game, &decoders));

        let err = service
            .try_get_actor(&ResRef::new("BROKEN"), ResourceKind::Creature)
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Format(FormatError::TruncatedRecord { .. })
        ));
        let actor = service.get_actor(&ResRef::new("BROKEN"));
        assert_eq!(actor.base_stats(), ActorRecord::default().base_stats());
        let missing = service.get_actor(&ResRef::new("NOBODY"));
        assert_eq!(missing.version, CreVersion::V1_0);
    }
}
