// src/watch/mod.rs

//! File watching and source collection.
//!
//! This module is responsible for:
//! - Compiling the per-group source globs and walking them ([`patterns`]).
//! - Wiring up a cross-platform filesystem watcher (`notify`).
//! - Turning changed paths into triggers for the matching group routes.
//!
//! It does **not** know what the handler graphs do; each route only names
//! the roots to trigger and the runtime channel to trigger them on.

pub mod event_handler;
pub mod patterns;
pub mod watcher;

pub use event_handler::GroupRoute;
pub use patterns::{build_group_profiles, slash_path, GroupWatchProfile, SourceFile, SourceGlob};
pub use watcher::{spawn_watcher, WatcherHandle};
