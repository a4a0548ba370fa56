//! Activity tracking and state-rollback engine.
//!
//! Chronicle records every tracked mutation as an immutable
//! [`ActivityRecord`](chronicle_store::ActivityRecord), addresses each
//! recoverable record with an unguessable rollback token, and restores
//! captured state on demand, recreating entities that have since been
//! deleted. Recording is fire-and-forget: business transactions never
//! block on, or fail because of, the audit write.
//!
//! The engine performs no HTTP handling, authentication, or
//! authorization; callers hand it an [`ActorSnapshot`]
//! (chronicle-core) and a [`CallContext`](chronicle_core::CallContext)
//! and gate access to restoration and the global feed themselves.
//!
//! [`ActorSnapshot`]: chronicle_core::ActorSnapshot

pub mod builder;
pub mod error;
pub mod history;
pub mod normalize;
pub mod recorder;
pub mod restore;

pub use builder::{Chronicle, ChronicleBuilder};
pub use error::{EngineError, RestoreError};
pub use history::{HistoryFeed, HistoryOptions};
pub use normalize::{FieldMigration, SchemaNormalizer};
pub use recorder::{ActivityRecorder, Audience, CompositeEvent};
pub use restore::{DEFAULT_STEP_TIMEOUT, RestorationEngine, RestoreReport};
