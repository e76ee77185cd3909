//! Explosion descriptor table and the overrides it applies to area projectiles.

use infinity_formats::pro::NO_EXPLOSION;
use infinity_formats::{AreaFlags, ProjectileRecord, ResRef, Table2da};

/// Rows past this are ignored; 0xff is reserved for "no explosion".
pub const MAX_EXPLOSIONS: usize = NO_EXPLOSION as usize - 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExplosionColumn {
    Spread = 0,
    Center = 1,
    Secondary = 2,
    Sound = 3,
    AreaSound = 4,
}

impl ExplosionColumn {
    pub const COUNT: usize = 5;
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExplosionEntry {
    pub resources: [ResRef; ExplosionColumn::COUNT],
    pub flags: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExplosionTable {
    entries: Vec<ExplosionEntry>,
}

impl ExplosionTable {
    /// Reads the first [`MAX_EXPLOSIONS`] rows: five resource columns, then flags.
    pub fn from_table(table: &Table2da) -> Self {
        let rows = table.row_count().min(MAX_EXPLOSIONS);
        let entries = (0..rows)
            .map(|row| {
                let mut entry = ExplosionEntry::default();
                for (column, resource) in entry.resources.iter_mut().enumerate() {
                    *resource = ResRef::new(table.query_field(row, column));
                }
                entry.flags = table.query_int(row, ExplosionColumn::COUNT) as u32;
                entry
            })
            .collect();
        ExplosionTable { entries }
    }

    pub fn from_entries(mut entries: Vec<ExplosionEntry>) -> Self {
        entries.truncate(MAX_EXPLOSIONS);
        ExplosionTable { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Override named by a cell; `*`, blank and out-of-range rows give `None`.
    pub fn resource(&self, kind: usize, column: ExplosionColumn) -> Option<ResRef> {
        self.entries
            .get(kind)
            .map(|entry| entry.resources[column as usize])
            .filter(ResRef::is_set)
    }

    pub fn flags(&self, kind: usize) -> u32 {
        self.entries.get(kind).map_or(0, |entry| entry.flags)
    }
}

/// Fills a decoded projectile's explosion fields from its table row.
/// Running it twice leaves the record unchanged.
pub fn resolve_explosion(record: &mut ProjectileRecord, table: &ExplosionTable) {
    let Some(kind) = record.explosion_type() else {
        return;
    };
    let Some(ext) = record.extension.as_mut() else {
        return;
    };
    let kind = usize::from(kind);

    if let Some(spread) = table.resource(kind, ExplosionColumn::Spread) {
        ext.spread = spread;
    }
    if let Some(vvc) = table.resource(kind, ExplosionColumn::Center) {
        ext.flags |= AreaFlags::VVC;
        ext.vvc = vvc;
    }
    if let Some(secondary) = table.resource(kind, ExplosionColumn::Secondary) {
        ext.secondary = secondary;
    }
    if let Some(sound) = table.resource(kind, ExplosionColumn::Sound) {
        ext.sound = sound;
    }
    if let Some(area_sound) = table.resource(kind, ExplosionColumn::AreaSound) {
        ext.area_sound = area_sound;
    }
    ext.ap_flags = table.flags(kind);
}
