// src/config/validate.rs

use globset::Glob;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{AssetdagError, Result};
use crate::lint;
use crate::transform::{css, js};
use crate::types::AssetGroup;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::AssetdagError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw))
    }
}

/// Run every check on an already-built config (e.g. one mutated by tests).
pub fn validate_config(cfg: &ConfigFile) -> Result<()> {
    let raw = RawConfigFile {
        paths: cfg.paths.clone(),
        styles: cfg.styles.clone(),
        scripts: cfg.scripts.clone(),
        images: cfg.images.clone(),
        server: cfg.server.clone(),
        watch: cfg.watch.clone(),
    };
    validate_raw_config(&raw)
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    validate_paths(cfg)?;
    validate_styles(cfg)?;
    validate_scripts(cfg)?;
    validate_images(cfg)?;
    validate_watch(cfg)?;
    Ok(())
}

fn config_error(msg: impl Into<String>) -> AssetdagError {
    AssetdagError::ConfigError(msg.into())
}

fn validate_paths(cfg: &RawConfigFile) -> Result<()> {
    if cfg.paths.output.trim().is_empty() {
        return Err(config_error("[paths].output must not be empty"));
    }

    let globs = [
        (AssetGroup::Styles, &cfg.paths.styles.src),
        (AssetGroup::Scripts, &cfg.paths.scripts.src),
        (AssetGroup::Images, &cfg.paths.images.src),
        (AssetGroup::Html, &cfg.paths.html.src),
    ];

    for (group, pattern) in globs {
        if let Err(err) = Glob::new(pattern) {
            return Err(config_error(format!(
                "[paths.{group}].src is not a valid glob ({pattern}): {err}"
            )));
        }
    }

    let dests = [
        ("styles", &cfg.paths.styles.dest),
        ("scripts", &cfg.paths.scripts.dest),
        ("images", &cfg.paths.images.dest),
        ("maps", &cfg.paths.maps.dest),
    ];
    for (name, dest) in dests {
        if dest.trim().is_empty() {
            return Err(config_error(format!("[paths.{name}].dest must not be empty")));
        }
    }

    Ok(())
}

fn validate_styles(cfg: &RawConfigFile) -> Result<()> {
    let styles = &cfg.styles;
    if styles.basename.trim().is_empty() {
        return Err(config_error("[styles].basename must not be empty"));
    }

    css::targets_from_query(&styles.browsers)
        .map_err(|e| config_error(format!("[styles].browsers: {e}")))?;
    css::targets_from_query(&styles.compatibility)
        .map_err(|e| config_error(format!("[styles].compatibility: {e}")))?;

    for rule in styles.rules.keys() {
        if !lint::styles::RULE_IDS.contains(&rule.as_str()) {
            return Err(config_error(format!(
                "[styles.rules] unknown rule '{rule}' (known: {})",
                lint::styles::RULE_IDS.join(", ")
            )));
        }
    }
    Ok(())
}

fn validate_scripts(cfg: &RawConfigFile) -> Result<()> {
    let scripts = &cfg.scripts;
    if scripts.bundle.trim().is_empty() {
        return Err(config_error("[scripts].bundle must not be empty"));
    }

    if js::parse_target(&scripts.target).is_none() {
        return Err(config_error(format!(
            "[scripts].target '{}' is not a known language level (es3, es5, es2015..es2022, esnext)",
            scripts.target
        )));
    }

    for rule in scripts.rules.keys() {
        if !lint::scripts::RULE_IDS.contains(&rule.as_str()) {
            return Err(config_error(format!(
                "[scripts.rules] unknown rule '{rule}' (known: {})",
                lint::scripts::RULE_IDS.join(", ")
            )));
        }
    }
    Ok(())
}

fn validate_images(cfg: &RawConfigFile) -> Result<()> {
    let images = &cfg.images;
    if images.optimization_level > 6 {
        return Err(config_error(format!(
            "[images].optimization_level must be between 0 and 6 (got {})",
            images.optimization_level
        )));
    }
    if images.jpeg.quality == 0 || images.jpeg.quality > 100 {
        return Err(config_error(format!(
            "[images.jpeg].quality must be between 1 and 100 (got {})",
            images.jpeg.quality
        )));
    }
    Ok(())
}

fn validate_watch(cfg: &RawConfigFile) -> Result<()> {
    // triggered_while_running_behaviour is checked during deserialization.
    if cfg.watch.queue_length == 0 {
        return Err(config_error("[watch].queue_length must be >= 1 (got 0)"));
    }
    Ok(())
}
