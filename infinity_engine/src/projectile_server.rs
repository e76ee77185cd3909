//! Index-addressed projectile catalog.
//!
//! Projectile numbers come from two IDS tables: the engine's built-in list
//! and the game's own. Both are read once, the first time anything asks for
//! the catalog size. Records are decoded on first use, augmented from the
//! explosion table and cached; callers always receive their own copy.

use infinity_formats::{FormatError, ProjectileRecord, ResRef, SymbolTable};
use log::{debug, error, warn};

use crate::context::{EngineContext, ResourceKind};
use crate::error::{CatalogError, EngineError};
use crate::explosion::{resolve_explosion, ExplosionColumn, ExplosionTable};

/// Highest projectile number a symbol table may assign.
pub const MAX_PROJ_IDX: u32 = 0x1fff;

/// A value computed at most once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Lazy<T> {
    #[default]
    Uninitialized,
    Computed(T),
}

impl<T> Lazy<T> {
    pub fn get(&self) -> Option<&T> {
        match self {
            Lazy::Computed(value) => Some(value),
            Lazy::Uninitialized => None,
        }
    }

    pub fn is_computed(&self) -> bool {
        matches!(self, Lazy::Computed(_))
    }

    /// Runs `init` on first use and returns the stored value.
    pub fn get_or_init(&mut self, init: impl FnOnce() -> T) -> &mut T {
        if let Lazy::Uninitialized = self {
            *self = Lazy::Computed(init());
        }
        match self {
            Lazy::Computed(value) => value,
            Lazy::Uninitialized => unreachable!("initialised above"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogConfig {
    /// Engine-supplied projectile list; wins on conflicts.
    pub builtin_symbols: String,
    /// Game or mod projectile list.
    pub game_symbols: String,
    pub explosion_table: String,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        CatalogConfig {
            builtin_symbols: "gemprjtl".to_string(),
            game_symbols: "projectl".to_string(),
            explosion_table: "areapro".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default)]
struct ProjectileEntry {
    name: ResRef,
    record: Option<ProjectileRecord>,
}

/// Symbol tables held between sizing the catalog and filling its names.
#[derive(Debug, Default)]
struct PendingSymbols {
    builtin: Option<SymbolTable>,
    game: Option<SymbolTable>,
}

pub struct ProjectileServer<'a> {
    context: EngineContext<'a>,
    config: CatalogConfig,
    count: Lazy<usize>,
    pending: PendingSymbols,
    entries: Lazy<Vec<ProjectileEntry>>,
    explosions: Lazy<ExplosionTable>,
}

impl<'a> ProjectileServer<'a> {
    pub fn new(context: EngineContext<'a>) -> Self {
        Self::with_config(context, CatalogConfig::default())
    }

    pub fn with_config(context: EngineContext<'a>, config: CatalogConfig) -> Self {
        ProjectileServer {
            context,
            config,
            count: Lazy::Uninitialized,
            pending: PendingSymbols::default(),
            entries: Lazy::Uninitialized,
            explosions: Lazy::Uninitialized,
        }
    }

    /// Number of catalog slots: one past the highest valid projectile number
    /// in either table, and at least one.
    pub fn resolve_count(&mut self) -> usize {
        if let Lazy::Computed(count) = self.count {
            return count;
        }
        let symbols = self.context.symbols;
        let builtin = symbols.load_symbol_table(&self.config.builtin_symbols);
        let game = symbols.load_symbol_table(&self.config.game_symbols);
        if builtin.is_none() && game.is_none() {
            warn!(
                "neither {} nor {} could be loaded, projectile catalog is empty",
                self.config.builtin_symbols, self.config.game_symbols
            );
        }

        let count = [
            (self.config.builtin_symbols.as_str(), &builtin),
            (self.config.game_symbols.as_str(), &game),
        ]
        .into_iter()
        .filter_map(|(name, table)| table.as_ref().map(|table| highest_value(name, table) + 1))
        .max()
        .unwrap_or(1);

        debug!("projectile catalog holds {count} entries");
        self.pending = PendingSymbols { builtin, game };
        self.count = Lazy::Computed(count);
        count
    }

    /// Alias of [`ProjectileServer::resolve_count`].
    pub fn highest_index(&mut self) -> usize {
        self.resolve_count()
    }

    /// Builds the index to name table. The game table is applied first so the
    /// built-in table overrides it.
    pub fn resolve_names(&mut self) -> Result<(), CatalogError> {
        if self.entries.is_computed() {
            return Ok(());
        }
        let count = self.resolve_count();
        let mut entries = vec![ProjectileEntry::default(); count];
        let tables = [
            (&self.config.game_symbols, &self.pending.game),
            (&self.config.builtin_symbols, &self.pending.builtin),
        ];
        for (name, table) in tables {
            if let Some(table) = table {
                add_symbols(name, table, &mut entries)?;
            }
        }
        // Tables stay pending until a fill succeeds so a failure repeats.
        self.pending = PendingSymbols::default();
        self.entries = Lazy::Computed(entries);
        Ok(())
    }

    /// Name assigned to `index`, after out-of-range substitution.
    pub fn name_of(&mut self, index: usize) -> Result<ResRef, CatalogError> {
        let index = self.clamp_index(index)?;
        Ok(self.entries_mut()[index].name)
    }

    /// Copy of projectile `index`. Indices past the catalog fall back to 0;
    /// anything that cannot be loaded yields a placeholder carrying its name
    /// and index, cached like a real record.
    pub fn get_by_index(&mut self, index: usize) -> Result<ProjectileRecord, CatalogError> {
        let index = self.clamp_index(index)?;
        let entry = &self.entries_mut()[index];
        if let Some(record) = &entry.record {
            return Ok(record.clone());
        }
        let name = entry.name;
        let record = self.load(name, index as u32);
        self.entries_mut()[index].record = Some(record.clone());
        Ok(record)
    }

    /// Copy of the projectile named `name`; the highest matching index wins.
    pub fn get_by_name(&mut self, name: &ResRef) -> Result<Option<ProjectileRecord>, CatalogError> {
        if !name.is_set() {
            return Ok(None);
        }
        self.resolve_names()?;
        let found = self
            .entries_mut()
            .iter()
            .rposition(|entry| entry.name == *name);
        found.map(|index| self.get_by_index(index)).transpose()
    }

    /// Loads the explosion table once and returns its row count. A missing
    /// table is reported once and treated as empty.
    pub fn resolve_explosion_table(&mut self) -> usize {
        self.explosion_table().len()
    }

    pub fn explosion(&mut self, kind: usize, column: ExplosionColumn) -> Option<ResRef> {
        self.explosion_table().resource(kind, column)
    }

    pub fn explosion_flags(&mut self, kind: usize) -> u32 {
        self.explosion_table().flags(kind)
    }

    fn explosion_table(&mut self) -> &ExplosionTable {
        let tables = self.context.tables;
        let name = &self.config.explosion_table;
        self.explosions
            .get_or_init(|| match tables.load_table(name) {
                Some(raw) => ExplosionTable::from_table(&raw),
                None => {
                    error!("explosion table {name} unavailable, explosions keep their own fields");
                    ExplosionTable::default()
                }
            })
    }

    fn clamp_index(&mut self, index: usize) -> Result<usize, CatalogError> {
        self.resolve_names()?;
        let count = self.resolve_count();
        Ok(if index >= count { 0 } else { index })
    }

    fn entries_mut(&mut self) -> &mut Vec<ProjectileEntry> {
        self.entries.get_or_init(Vec::new)
    }

    fn load(&mut self, name: ResRef, index: u32) -> ProjectileRecord {
        if !name.is_set() {
            debug!("projectile {index} has no name, using a placeholder");
            return ProjectileRecord::placeholder(name, index);
        }
        match self.decode(&name) {
            Ok(mut record) => {
                record.set_identifiers(name, index);
                if record.explosion_type().is_some() {
                    resolve_explosion(&mut record, self.explosion_table());
                }
                record
            }
            Err(err) => {
                match &err {
                    EngineError::Format(FormatError::TruncatedRecord { .. }) => {
                        error!("projectile {name} ({index}): {err}")
                    }
                    err if err.is_missing() => debug!("projectile {name} ({index}): {err}"),
                    _ => warn!("projectile {name} ({index}): {err}"),
                }
                ProjectileRecord::placeholder(name, index)
            }
        }
    }

    fn decode(&self, name: &ResRef) -> Result<ProjectileRecord, EngineError> {
        let decoder = self
            .context
            .decoders
            .projectile_decoder()
            .ok_or(EngineError::NoDecoder {
                kind: ResourceKind::Projectile,
            })?;
        let mut stream = self
            .context
            .resources
            .open_resource(name, ResourceKind::Projectile)?;
        Ok(decoder.decode_projectile(stream.as_mut())?)
    }
}

fn highest_value(table_name: &str, table: &SymbolTable) -> usize {
    let mut highest = 0;
    for entry in table.iter() {
        if entry.value > MAX_PROJ_IDX {
            warn!(
                "{table_name}: projectile number {} for {} is above {MAX_PROJ_IDX:#x}, ignored",
                entry.value, entry.name
            );
            continue;
        }
        highest = highest.max(entry.value as usize);
    }
    highest
}

fn add_symbols(
    table_name: &str,
    table: &SymbolTable,
    entries: &mut [ProjectileEntry],
) -> Result<(), CatalogError> {
    for entry in table.iter() {
        if entry.value > MAX_PROJ_IDX {
            continue;
        }
        let count = entries.len();
        let slot = entries
            .get_mut(entry.value as usize)
            .ok_or_else(|| CatalogError::ConsistencyViolation {
                table: table_name.to_string(),
                index: entry.value,
                count,
            })?;
        slot.name = ResRef::new(&entry.name);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::io::Cursor;

    use infinity_formats::Table2da;

    use super::*;
    use crate::context::{
        BuiltinDecoders, ResourceAccessor, ResourceStream, SymbolTableLoader, TableLoader,
    };

    #[derive(Default)]
    struct FakeGame {
        symbols: HashMap<String, SymbolTable>,
        tables: HashMap<String, Table2da>,
        files: HashMap<ResRef, Vec<u8>>,
        symbol_loads: RefCell<Vec<String>>,
        table_loads: RefCell<usize>,
        opens: RefCell<usize>,
    }

    impl FakeGame {
        fn with_symbols(mut self, name: &str, entries: &[(u32, &str)]) -> Self {
            self.symbols.insert(
                name.to_string(),
                SymbolTable::from_entries(entries.iter().map(|&(value, name)| (value, name))),
            );
            self
        }
    }

    impl ResourceAccessor for FakeGame {
        fn open_resource(
            &self,
            name: &ResRef,
            kind: ResourceKind,
        ) -> Result<Box<dyn ResourceStream>, EngineError> {
            *self.opens.borrow_mut() += 1;
            self.files
                .get(name)
                .map(|bytes| Box::new(Cursor::new(bytes.clone())) as Box<dyn ResourceStream>)
                .ok_or(EngineError::NotFound { name: *name, kind })
        }
    }

    impl SymbolTableLoader for FakeGame {
        fn load_symbol_table(&self, name: &str) -> Option<SymbolTable> {
            self.symbol_loads.borrow_mut().push(name.to_string());
            self.symbols.get(name).cloned()
        }
    }

    impl TableLoader for FakeGame {
        fn load_table(&self, name: &str) -> Option<Table2da> {
            *self.table_loads.borrow_mut() += 1;
            self.tables.get(name).cloned()
        }
    }

    fn area_projectile(explosion_type: u8) -> Vec<u8> {
        let mut bytes = vec![0u8; 0x300];
        bytes[..8].copy_from_slice(b"PRO V1.0");
        bytes[0x08] = 3;
        bytes[0x217] = explosion_type;
        bytes[0x21c..0x224].copy_from_slice(b"OWNVVC\0\0");
        bytes
    }

    #[test]
    fn count_is_resolved_once() {
        let game = FakeGame::default()
            .with_symbols("gemprjtl", &[(3, "GEMONE")])
            .with_symbols("projectl", &[(7, "ARROW"), (0x2000, "TOOHIGH")]);
        let decoders = BuiltinDecoders::default();
        let mut server = ProjectileServer::new(EngineContext::from_source(&game, &decoders));

        assert_eq!(server.resolve_count(), 8);
        assert_eq!(server.resolve_count(), 8);
        assert_eq!(server.highest_index(), 8);
        server.resolve_names().unwrap();
        server.resolve_names().unwrap();
        assert_eq!(*game.symbol_loads.borrow(), vec!["gemprjtl", "projectl"]);
    }

    #[test]
    fn empty_catalog_still_has_one_entry() {
        let game = FakeGame::default();
        let decoders = BuiltinDecoders::default();
        let mut server = ProjectileServer::new(EngineContext::from_source(&game, &decoders));
        assert_eq!(server.resolve_count(), 1);
        let record = server.get_by_index(0).unwrap();
        assert_eq!(record, ProjectileRecord::placeholder(ResRef::EMPTY, 0));
    }

    #[test]
    fn builtin_names_win() {
        let game = FakeGame::default()
            .with_symbols("gemprjtl", &[(5, "FIREBALL")])
            .with_symbols("projectl", &[(5, "MODPROJ"), (6, "ARROW")]);
        let decoders = BuiltinDecoders::default();
        let mut server = ProjectileServer::new(EngineContext::from_source(&game, &decoders));
        assert_eq!(server.name_of(5).unwrap(), ResRef::new("FIREBALL"));
        assert_eq!(server.name_of(6).unwrap(), ResRef::new("ARROW"));
    }

    #[test]
    fn out_of_range_falls_back_to_zero() {
        let mut game = FakeGame::default().with_symbols("projectl", &[(0, "NONE"), (2, "ARROW")]);
        game.files.insert(ResRef::new("NONE"), area_projectile(0xff));
        let decoders = BuiltinDecoders::default();
        let mut server = ProjectileServer::new(EngineContext::from_source(&game, &decoders));

        let zero = server.get_by_index(0).unwrap();
        assert_eq!(server.get_by_index(3).unwrap(), zero);
        assert_eq!(server.get_by_index(9999).unwrap(), zero);
        assert_eq!(zero.name, ResRef::new("NONE"));
    }

    #[test]
    fn copies_are_independent_and_cached() {
        let mut game = FakeGame::default().with_symbols("projectl", &[(1, "FIREBALL")]);
        game.files.insert(ResRef::new("FIREBALL"), area_projectile(0xff));
        let decoders = BuiltinDecoders::default();
        let mut server = ProjectileServer::new(EngineContext::from_source(&game, &decoders));

        let mut first = server.get_by_index(1).unwrap();
        let second = server.get_by_index(1).unwrap();
        assert_eq!(first, second);
        first.speed = 99;
        first.extension = None;
        assert_eq!(server.get_by_index(1).unwrap(), second);
        assert_eq!(*game.opens.borrow(), 1);
    }

    #[test]
    fn missing_resource_is_cached_as_placeholder() {
        let game = FakeGame::default().with_symbols("projectl", &[(4, "GHOST")]);
        let decoders = BuiltinDecoders::default();
        let mut server = ProjectileServer::new(EngineContext::from_source(&game, &decoders));

        let record = server.get_by_index(4).unwrap();
        assert_eq!(record, ProjectileRecord::placeholder(ResRef::new("GHOST"), 4));
        server.get_by_index(4).unwrap();
        assert_eq!(*game.opens.borrow(), 1);
    }

    #[test]
    fn lookup_by_name() {
        let mut game =
            FakeGame::default().with_symbols("projectl", &[(1, "ARROW"), (2, "FIREBALL")]);
        game.files.insert(ResRef::new("FIREBALL"), area_projectile(0xff));
        let decoders = BuiltinDecoders::default();
        let mut server = ProjectileServer::new(EngineContext::from_source(&game, &decoders));

        let fireball = server.get_by_name(&ResRef::new("fireball")).unwrap().unwrap();
        assert_eq!(fireball.index, 2);
        assert!(server.get_by_name(&ResRef::new("LIGHTNIN")).unwrap().is_none());
        assert!(server.get_by_name(&ResRef::EMPTY).unwrap().is_none());
    }

    #[test]
    fn explosion_overrides_are_applied_on_load() {
        let mut game = FakeGame::default().with_symbols("projectl", &[(1, "ICESTORM")]);
        game.files.insert(ResRef::new("ICESTORM"), area_projectile(0));
        game.tables.insert(
            "areapro".to_string(),
            Table2da::parse_str("2DA V1.0\n*\nA B C D E F\nICE SPREADX * SECONDX * * 12\n")
                .unwrap(),
        );
        let decoders = BuiltinDecoders::default();
        let mut server = ProjectileServer::new(EngineContext::from_source(&game, &decoders));

        let record = server.get_by_index(1).unwrap();
        let ext = record.extension.unwrap();
        assert_eq!(ext.spread, ResRef::new("SPREADX"));
        assert_eq!(ext.secondary, ResRef::new("SECONDX"));
        assert_eq!(ext.vvc, ResRef::new("OWNVVC"));
        assert_eq!(ext.ap_flags, 12);
        assert_eq!(server.explosion(0, ExplosionColumn::Spread), Some(ResRef::new("SPREADX")));
        assert_eq!(server.explosion(0, ExplosionColumn::Center), None);
        assert_eq!(server.explosion(300, ExplosionColumn::Spread), None);
        assert_eq!(server.explosion_flags(0), 12);
        assert_eq!(server.explosion_flags(1), 0);
    }

    #[test]
    fn missing_explosion_table_is_empty() {
        let game = FakeGame::default();
        let decoders = BuiltinDecoders::default();
        let mut server = ProjectileServer::new(EngineContext::from_source(&game, &decoders));
        assert_eq!(server.resolve_explosion_table(), 0);
        assert_eq!(server.resolve_explosion_table(), 0);
        assert_eq!(server.explosion_flags(0), 0);
        assert_eq!(server.explosion(0, ExplosionColumn::Spread), None);
        assert_eq!(*game.table_loads.borrow(), 1);
    }

    #[test]
    fn explosion_table_is_loaded_once() {
        let mut game =
            FakeGame::default().with_symbols("projectl", &[(1, "ICESTORM"), (2, "FIRESTRM")]);
        game.files.insert(ResRef::new("ICESTORM"), area_projectile(0));
        game.files.insert(ResRef::new("FIRESTRM"), area_projectile(1));
        game.tables.insert(
            "areapro".to_string(),
            Table2da::parse_str(
                "2DA V1.0\n*\nA B C D E F\nICE SPREADX * * * * 3\nFIRE SPREADY * * * * 4\n",
            )
            .unwrap(),
        );
        let decoders = BuiltinDecoders::default();
        let mut server = ProjectileServer::new(EngineContext::from_source(&game, &decoders));

        assert_eq!(server.resolve_explosion_table(), 2);
        assert_eq!(server.explosion_flags(1), 4);
        assert_eq!(server.explosion(1, ExplosionColumn::Spread), Some(ResRef::new("SPREADY")));
        server.get_by_index(1).unwrap();
        server.get_by_index(2).unwrap();
        assert_eq!(server.resolve_explosion_table(), 2);
        assert_eq!(*game.table_loads.borrow(), 1);
    }

    #[test]
    fn failed_fill_is_reported_again() {
        let game = FakeGame::default();
        let decoders = BuiltinDecoders::default();
        let mut server = ProjectileServer::new(EngineContext::from_source(&game, &decoders));
        server.count = Lazy::Computed(2);
        server.pending = PendingSymbols {
            builtin: None,
            game: Some(SymbolTable::from_entries([(5u32, "LATE")])),
        };

        for _ in 0..2 {
            let err = server.resolve_names().unwrap_err();
            assert!(matches!(
                err,
                CatalogError::ConsistencyViolation { index: 5, count: 2, .. }
            ));
        }
        assert!(server.name_of(0).is_err());
        assert!(server.get_by_index(1).is_err());
        assert!(!server.entries.is_computed());
    }

    #[test]
    fn inconsistent_tables_are_fatal() {
        let table = SymbolTable::from_entries([(9u32, "LATE")]);
        let mut entries = vec![ProjectileEntry::default(); 4];
        let err = add_symbols("projectl", &table, &mut entries).unwrap_err();
        assert!(matches!(
            err,
            CatalogError::ConsistencyViolation { index: 9, count: 4, .. }
        ));
    }
}
