// src/config/mod.rs

//! Configuration loading and validation for assetdag.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`): the asset group path
//!   table plus per-group transform, server and watch settings.
//! - Load a config file from disk (`loader.rs`).
//! - Validate globs, lint rule ids and numeric knobs (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_from_path, load_or_default};
pub use model::{
    ConfigFile, GifOptions, ImagesSection, JpegOptions, PathsSection, RawConfigFile,
    ScriptsSection, ServerSection, StylesSection, SvgOptions, WatchSection,
};
pub use validate::validate_config;
