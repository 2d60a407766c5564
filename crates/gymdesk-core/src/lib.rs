//! gymdesk-core library.
//!
//! A generic filter/sort/paginate/aggregate engine over the gym back
//! office's record collections, plus the immutable snapshots and actions
//! that produce those collections.
//!
//! # Conventions
//!
//! - **Errors**: Library operations return `Result<_, GymError>`; loading
//!   and config use `anyhow::Result` with a [`error::LoadError`] in the chain.
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `error!`, `debug!`, `trace!`).

pub mod aggregate;
pub mod config;
pub mod dataset;
pub mod error;
pub mod export;
pub mod model;
pub mod query;
pub mod session;
pub mod store;
pub mod validate;
