use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

/// Behaviour when a watched group changes while its handler graph is running.
///
/// - `Queue`: remember the trigger and start a new run when the current one
///   finishes (default, matches the usual watch-and-rebuild loop).
/// - `Cancel`: drop anything already queued and keep only the latest trigger.
///   The running graph is never interrupted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TriggerWhileRunningBehaviour {
    #[default]
    Queue,
    Cancel,
}

impl FromStr for TriggerWhileRunningBehaviour {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "queue" => Ok(TriggerWhileRunningBehaviour::Queue),
            "cancel" => Ok(TriggerWhileRunningBehaviour::Cancel),
            other => Err(format!(
                "invalid triggered_while_running_behaviour: {other} (expected \"queue\" or \"cancel\")"
            )),
        }
    }
}

/// What a lint task does when it finds error-severity violations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LintPolicy {
    /// Report violations and fail the task (dependents do not run).
    Fail,
    /// Report violations only.
    Warn,
}

/// Severity of a single lint rule, as configured per group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Off,
    Warn,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::Off => "off",
            Severity::Warn => "warning",
            Severity::Error => "error",
        };
        f.write_str(s)
    }
}

/// The asset groups the pipeline knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AssetGroup {
    Styles,
    Scripts,
    Images,
    Html,
}

impl AssetGroup {
    pub const ALL: [AssetGroup; 4] = [
        AssetGroup::Styles,
        AssetGroup::Scripts,
        AssetGroup::Images,
        AssetGroup::Html,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AssetGroup::Styles => "styles",
            AssetGroup::Scripts => "scripts",
            AssetGroup::Images => "images",
            AssetGroup::Html => "html",
        }
    }
}

impl fmt::Display for AssetGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
