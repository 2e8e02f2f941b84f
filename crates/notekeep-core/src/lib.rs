//! notekeep-core: Core types and token primitives for the notekeep backend
//!
//! This crate provides:
//! - Typed identifiers for users, notes, nodes and sessions
//! - The note/node data model shared by storage and HTTP layers
//! - The closed [`ErrorKind`] discriminant every layer reports through
//! - The [`TokenIssuer`]: signed access/refresh tokens and keyed
//!   refresh-token fingerprints
//!
//! The crate has no I/O. Storage lives in `notekeep-store`, transport in
//! `notekeep-server`.

pub mod error;
pub mod token;
pub mod types;

pub use error::ErrorKind;
pub use token::{AccessClaims, RefreshClaims, SignedRefresh, TokenConfig, TokenError, TokenIssuer};
pub use types::*;
