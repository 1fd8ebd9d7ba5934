//! Axum request extractors.

pub mod actor;

pub use actor::ActorContext;
