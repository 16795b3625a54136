//! # colmirror Reference Service
//!
//! In-process implementation of the remote collection/item service the
//! sync engine consumes.
//!
//! This crate provides:
//! - A revisioned change log of collections, items and memberships
//! - Paginated change listings with numeric cursors
//! - Membership removal reporting
//! - Maintenance mode for exercising transient failures
//!
//! # Cursors
//!
//! Every mutation is stamped with the next value of one revision counter.
//! A cursor is the decimal revision of the last change a client has seen;
//! listing from it returns only later changes.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod changelog;
mod config;
mod error;
mod handler;
mod server;

pub use changelog::{CollectionChange, ServerLog};
pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use handler::{HandlerContext, RequestHandler};
pub use server::SyncServer;
