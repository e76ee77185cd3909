//! Narrow interfaces to the rest of the engine.
//!
//! Services never reach for globals; they receive an [`EngineContext`]
//! bundling the collaborators they need.

use std::fmt;
use std::io::{Read, Seek};

use infinity_formats::{
    ActorRecord, DecodeOptions, FormatError, ProjectileRecord, ResRef, SymbolTable, Table2da,
};

use crate::error::EngineError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Creature,
    Character,
    Projectile,
    Symbols,
    Table,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 5] = [
        ResourceKind::Creature,
        ResourceKind::Character,
        ResourceKind::Projectile,
        ResourceKind::Symbols,
        ResourceKind::Table,
    ];

    pub fn extension(self) -> &'static str {
        match self {
            ResourceKind::Creature => "cre",
            ResourceKind::Character => "chr",
            ResourceKind::Projectile => "pro",
            ResourceKind::Symbols => "ids",
            ResourceKind::Table => "2da",
        }
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.extension().eq_ignore_ascii_case(ext))
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

pub trait ResourceStream: Read + Seek {}

impl<T: Read + Seek> ResourceStream for T {}

pub trait ResourceAccessor {
    fn open_resource(
        &self,
        name: &ResRef,
        kind: ResourceKind,
    ) -> Result<Box<dyn ResourceStream>, EngineError>;
}

/// Loads an IDS symbol table by name. Dropping the table releases it.
pub trait SymbolTableLoader {
    fn load_symbol_table(&self, name: &str) -> Option<SymbolTable>;
}

pub trait TableLoader {
    fn load_table(&self, name: &str) -> Option<Table2da>;
}

pub trait ProjectileDecoder {
    fn decode_projectile(
        &self,
        stream: &mut dyn ResourceStream,
    ) -> Result<ProjectileRecord, FormatError>;
}

pub trait ActorDecoder {
    fn decode_actor(&self, stream: &mut dyn ResourceStream) -> Result<ActorRecord, FormatError>;
}

/// Registry of the decoders available to the engine.
pub trait DecoderPlugins {
    fn projectile_decoder(&self) -> Option<&dyn ProjectileDecoder>;
    fn actor_decoder(&self) -> Option<&dyn ActorDecoder>;
}

/// The codecs from `infinity_formats`.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinDecoders {
    pub actor_options: DecodeOptions,
}

impl ProjectileDecoder for BuiltinDecoders {
    fn decode_projectile(
        &self,
        mut stream: &mut dyn ResourceStream,
    ) -> Result<ProjectileRecord, FormatError> {
        ProjectileRecord::decode(&mut stream)
    }
}

impl ActorDecoder for BuiltinDecoders {
    fn decode_actor(
        &self,
        mut stream: &mut dyn ResourceStream,
    ) -> Result<ActorRecord, FormatError> {
        infinity_formats::decode_with(&mut stream, &self.actor_options)
    }
}

impl DecoderPlugins for BuiltinDecoders {
    fn projectile_decoder(&self) -> Option<&dyn ProjectileDecoder> {
        Some(self)
    }

    fn actor_decoder(&self) -> Option<&dyn ActorDecoder> {
        Some(self)
    }
}

/// Collaborators handed to every service.
#[derive(Clone, Copy)]
pub struct EngineContext<'a> {
    pub resources: &'a dyn ResourceAccessor,
    pub symbols: &'a dyn SymbolTableLoader,
    pub tables: &'a dyn TableLoader,
    pub decoders: &'a dyn DecoderPlugins,
}

impl<'a> EngineContext<'a> {
    /// Context whose loaders are all served by one value, such as a game directory.
    pub fn from_source<S>(source: &'a S, decoders: &'a dyn DecoderPlugins) -> Self
    where
        S: ResourceAccessor + SymbolTableLoader + TableLoader + 'a,
    {
        EngineContext {
            resources: source,
            symbols: source,
            tables: source,
            decoders,
        }
    }
}
