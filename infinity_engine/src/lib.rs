pub mod actor_service;
pub mod area;
pub mod context;
pub mod error;
pub mod explosion;
pub mod game_directory;
pub mod projectile_server;

pub use actor_service::ActorService;
pub use context::{BuiltinDecoders, EngineContext, ResourceKind};
pub use error::{CatalogError, EngineError};
pub use game_directory::GameDirectory;
pub use projectile_server::{CatalogConfig, ProjectileServer};
