// tests/config_errors.rs

use assetdag::config::loader::{load_and_validate, load_or_default};
use assetdag::config::validate_config;
use assetdag::errors::AssetdagError;
use assetdag::types::{LintPolicy, TriggerWhileRunningBehaviour};
use assetdag_test_utils::{ConfigBuilder, TempProject};

fn load(toml: &str) -> Result<assetdag::config::ConfigFile, AssetdagError> {
    let project = TempProject::new();
    project.write("Assetdag.toml", toml);
    load_and_validate(project.join("Assetdag.toml"))
}

fn config_error_mentions(toml: &str, needle: &str) {
    match load(toml) {
        Err(AssetdagError::ConfigError(msg)) => {
            assert!(msg.contains(needle), "expected '{needle}' in: {msg}")
        }
        other => panic!("expected ConfigError, got {other:?}"),
    }
}

#[test]
fn unknown_field_is_a_toml_error() {
    let err = load("[styles]\nsourcemaps = true\n").unwrap_err();
    assert!(matches!(err, AssetdagError::TomlError(_)), "got {err:?}");
}

#[test]
fn unknown_queue_behaviour_is_a_toml_error() {
    let err = load("[watch]\ntriggered_while_running_behaviour = \"restart\"\n").unwrap_err();
    assert!(matches!(err, AssetdagError::TomlError(_)), "got {err:?}");
}

#[test]
fn invalid_source_glob_is_rejected() {
    config_error_mentions("[paths.styles]\nsrc = \"resources/{scss\"\n", "[paths.styles].src");
}

#[test]
fn zero_queue_length_is_rejected() {
    config_error_mentions("[watch]\nqueue_length = 0\n", "queue_length");
}

#[test]
fn unknown_lint_rule_is_rejected() {
    config_error_mentions("[scripts.rules]\nno-console = \"error\"\n", "no-console");
}

#[test]
fn jpeg_quality_out_of_range_is_rejected() {
    config_error_mentions("[images.jpeg]\nquality = 0\n", "quality");
}

#[test]
fn unknown_script_target_is_rejected() {
    config_error_mentions("[scripts]\ntarget = \"es1999\"\n", "es1999");
}

#[test]
fn mutated_config_can_be_revalidated() {
    let mut cfg = ConfigBuilder::new().build();
    assert!(validate_config(&cfg).is_ok());

    cfg.images.optimization_level = 9;
    let err = validate_config(&cfg).unwrap_err();
    assert!(matches!(err, AssetdagError::ConfigError(msg) if msg.contains("optimization_level")));
}

#[test]
fn missing_explicit_file_is_an_io_error() {
    let project = TempProject::new();
    let err = load_and_validate(project.join("nope.toml")).unwrap_err();
    assert!(matches!(err, AssetdagError::IoError(_)), "got {err:?}");
}

#[test]
fn missing_default_file_falls_back_to_defaults() {
    let project = TempProject::new();
    let cfg = load_or_default(project.join("Assetdag.toml")).unwrap();

    assert_eq!(cfg.root(), project.path());
    assert_eq!(cfg.output_dir(), project.join("public_html"));
    assert_eq!(cfg.styles.lint, LintPolicy::Warn);
    assert_eq!(cfg.scripts.lint, LintPolicy::Fail);
    assert_eq!(cfg.server.port, 3000);
}

#[test]
fn overrides_are_anchored_on_the_config_directory() {
    let project = TempProject::new();
    project.write(
        "site/Assetdag.toml",
        r#"
[paths]
output = "dist"

[watch]
triggered_while_running_behaviour = "cancel"
queue_length = 3
"#,
    );

    let cfg = load_and_validate(project.join("site/Assetdag.toml")).unwrap();
    assert_eq!(cfg.output_dir(), project.join("site/dist"));
    assert_eq!(
        cfg.watch.triggered_while_running_behaviour,
        TriggerWhileRunningBehaviour::Cancel
    );
    assert_eq!(cfg.watch.queue_length, 3);
}
