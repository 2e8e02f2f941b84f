//! notekeep-store: Storage layer for the notekeep backend
//!
//! This crate provides:
//! - PostgreSQL storage for users, notes, note nodes and sessions
//! - The node sequencer keeping every note's node orders contiguous
//! - The ownership guard and an ownership-gated [`Repository`]
//! - Refresh-token session lifecycle ([`SessionManager`]) and the
//!   background [`SessionSweeper`]
//! - Migration management
//!
//! # Architecture
//!
//! Every component is a narrow capability trait (see [`capability`]).
//! [`Store`] implements all of them over one connection pool; the
//! [`Repository`], [`SessionManager`] and [`SessionSweeper`] are generic over
//! the capabilities they need and are composed at startup.
//!
//! Every mutating operation runs in a single transaction and either commits
//! fully or leaves storage untouched.
//!
//! # Usage
//!
//! ```rust,ignore
//! use notekeep_store::{Repository, Store, StoreConfig};
//!
//! let store = Store::connect(StoreConfig::from_env()?).await?;
//! let repo = Repository::new(store.clone());
//!
//! let note_id = repo.create_note(user_id, "groceries").await?;
//! repo.reorder_nodes(user_id, note_id, NodeMove::new(0, 2)).await?;
//! ```

pub mod capability;
pub mod error;
pub mod guard;
pub mod ledger;
pub mod models;
pub mod nodes;
pub mod notes;
pub mod repository;
pub mod schema;
pub mod sessions;
pub mod store;
pub mod sweeper;
pub mod users;

#[cfg(test)]
pub(crate) mod memory;
#[cfg(all(test, feature = "integration-tests"))]
pub(crate) mod test_db;

pub use capability::{CredentialStore, NodeSequencer, NoteStore, OwnershipGuard, SessionLedger};
pub use error::{Resource, StoreError, StoreResult};
pub use models::*;
pub use nodes::NodeMove;
pub use repository::Repository;
pub use sessions::{IssuedSession, SessionManager};
pub use store::{Store, StoreConfig};
pub use sweeper::{SessionSweeper, SweepStats};

// Re-export notekeep-core for downstream crates
pub use notekeep_core;
