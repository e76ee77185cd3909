pub mod cre;
pub mod error;
pub mod ids;
pub mod pro;
pub mod resref;
pub mod twoda;

pub use cre::{
    ActorRecord, CreVersion, DecodeOptions, Effect, EffectFormat, ModifierKind, SubVersionPolicy,
    decode, decode_with, encode, stored_size,
};
pub use error::{FormatError, Result};
pub use ids::{SymbolEntry, SymbolTable};
pub use pro::{AreaExtension, AreaFlags, ProjectileRecord};
pub use resref::ResRef;
pub use twoda::Table2da;
