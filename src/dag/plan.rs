// src/dag/plan.rs

//! Task vocabulary and series/parallel composition.
//!
//! A [`Plan`] is the declarative shape of a composite task
//! (`series(clean, parallel(styles, scripts, images))`). It is compiled into
//! a [`DagGraph`](crate::dag::DagGraph) whose edges encode "must finish
//! before", and then driven by the scheduler.

use std::fmt;

use crate::types::AssetGroup;

/// Atomic units of work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TaskKind {
    Clean,
    StylesLint,
    Styles,
    ScriptsLint,
    Scripts,
    Images,
    Serve,
    Reload,
    WatchFiles,
}

impl TaskKind {
    pub const ALL: [TaskKind; 9] = [
        TaskKind::Clean,
        TaskKind::StylesLint,
        TaskKind::Styles,
        TaskKind::ScriptsLint,
        TaskKind::Scripts,
        TaskKind::Images,
        TaskKind::Serve,
        TaskKind::Reload,
        TaskKind::WatchFiles,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            TaskKind::Clean => "clean",
            TaskKind::StylesLint => "styles-lint",
            TaskKind::Styles => "styles",
            TaskKind::ScriptsLint => "scripts-lint",
            TaskKind::Scripts => "scripts",
            TaskKind::Images => "images",
            TaskKind::Serve => "serve",
            TaskKind::Reload => "reload",
            TaskKind::WatchFiles => "watch-files",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        TaskKind::ALL.into_iter().find(|k| k.name() == name)
    }

    /// Never completes; stopping it is how the process ends.
    pub fn runs_until_stopped(&self) -> bool {
        matches!(self, TaskKind::WatchFiles)
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Composition of tasks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Plan {
    Task(TaskKind),
    /// Each element starts only after the previous one has fully completed.
    Series(Vec<Plan>),
    /// Elements start together; the composite completes when all complete.
    Parallel(Vec<Plan>),
}

/// Names accepted on the command line, in listing order.
pub const EXPORTED_TASKS: [&str; 7] = ["clean", "css", "js", "images", "build", "watch", "default"];

impl Plan {
    pub fn task(kind: TaskKind) -> Self {
        Plan::Task(kind)
    }

    pub fn series(items: impl IntoIterator<Item = Plan>) -> Self {
        Plan::Series(items.into_iter().collect())
    }

    pub fn parallel(items: impl IntoIterator<Item = Plan>) -> Self {
        Plan::Parallel(items.into_iter().collect())
    }

    /// Resolve an exported task name into its plan.
    pub fn exported(name: &str) -> Option<Plan> {
        use TaskKind::*;

        let plan = match name {
            "clean" => Plan::task(Clean),
            "css" => Plan::series([Plan::task(StylesLint), Plan::task(Styles)]),
            "js" => Plan::series([Plan::task(ScriptsLint), Plan::task(Scripts)]),
            "images" => Plan::task(Images),
            "build" => Plan::series([
                Plan::task(Clean),
                Plan::parallel([Plan::task(Styles), Plan::task(Scripts), Plan::task(Images)]),
            ]),
            "watch" | "default" => {
                Plan::parallel([Plan::task(WatchFiles), Plan::task(Serve)])
            }
            _ => return None,
        };
        Some(plan)
    }

    /// Handler graph re-run when a file in `group` changes.
    pub fn watch_handler(group: AssetGroup) -> Plan {
        use TaskKind::*;

        match group {
            AssetGroup::Styles => Plan::series([Plan::task(StylesLint), Plan::task(Styles)]),
            AssetGroup::Scripts => Plan::series([
                Plan::task(ScriptsLint),
                Plan::task(Scripts),
                Plan::task(Reload),
            ]),
            AssetGroup::Images => Plan::series([Plan::task(Images), Plan::task(Reload)]),
            AssetGroup::Html => Plan::task(Reload),
        }
    }

    /// All atomic tasks in the plan, in declaration order.
    pub fn tasks(&self) -> Vec<TaskKind> {
        let mut out = Vec::new();
        self.collect_tasks(&mut out);
        out
    }

    fn collect_tasks(&self, out: &mut Vec<TaskKind>) {
        match self {
            Plan::Task(kind) => out.push(*kind),
            Plan::Series(items) | Plan::Parallel(items) => {
                for item in items {
                    item.collect_tasks(out);
                }
            }
        }
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (label, items) = match self {
            Plan::Task(kind) => return write!(f, "{kind}"),
            Plan::Series(items) => ("series", items),
            Plan::Parallel(items) => ("parallel", items),
        };

        write!(f, "{label}(")?;
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{item}")?;
        }
        f.write_str(")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_exported_name_resolves() {
        for name in EXPORTED_TASKS {
            assert!(Plan::exported(name).is_some(), "{name} should resolve");
        }
        assert!(Plan::exported("styles").is_none());
    }

    #[test]
    fn build_displays_as_nested_composition() {
        let plan = Plan::exported("build").unwrap();
        assert_eq!(
            plan.to_string(),
            "series(clean, parallel(styles, scripts, images))"
        );
    }

    #[test]
    fn default_is_watch() {
        assert_eq!(Plan::exported("default"), Plan::exported("watch"));
    }

    #[test]
    fn task_names_round_trip() {
        for kind in TaskKind::ALL {
            assert_eq!(TaskKind::from_name(kind.name()), Some(kind));
        }
    }

    #[test]
    fn html_handler_only_reloads() {
        assert_eq!(
            Plan::watch_handler(AssetGroup::Html).tasks(),
            vec![TaskKind::Reload]
        );
    }
}
