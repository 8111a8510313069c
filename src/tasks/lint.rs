// src/tasks/lint.rs

use std::sync::Arc;

use anyhow::{bail, Result};
use tracing::{info, warn};

use crate::errors::AssetdagError;
use crate::lint::{file_report, scripts, styles, LintReport, RuleSet};
use crate::tasks::{blocking, TaskContext};
use crate::types::{AssetGroup, LintPolicy};

/// Lint every source of `group`, print the report and apply the group's
/// lint policy.
pub async fn run(ctx: &Arc<TaskContext>, group: AssetGroup) -> Result<()> {
    let inner = ctx.clone();
    let report = blocking(move || lint_group(&inner, group)).await?;

    if !report.is_clean() {
        print!("{report}");
    }

    let errors = report.error_count();
    let warnings = report.warning_count();
    let policy = policy_for(ctx, group);

    if errors > 0 && policy == LintPolicy::Fail {
        warn!(%group, errors, warnings, "lint failed");
        return Err(AssetdagError::LintFailed {
            group: group.to_string(),
            errors,
        }
        .into());
    }

    info!(%group, errors, warnings, "lint finished");
    Ok(())
}

pub fn policy_for(ctx: &TaskContext, group: AssetGroup) -> LintPolicy {
    match group {
        AssetGroup::Scripts => ctx.config.scripts.lint,
        _ => ctx.config.styles.lint,
    }
}

/// Build the lint report for `group` without printing or judging it.
pub fn lint_group(ctx: &TaskContext, group: AssetGroup) -> Result<LintReport> {
    let mut report = LintReport::default();

    match group {
        AssetGroup::Styles => {
            let rules = RuleSet::new(styles::DEFAULT_RULES, &ctx.config.styles.rules);
            for file in ctx.sources(group)? {
                let source = ctx.fs.read_to_string(&file.path)?;
                let found = styles::lint_source(&*ctx.fs, &file.path, &source, &rules);
                report.push(file_report(ctx.display_path(&file.path), found));
            }
        }
        AssetGroup::Scripts => {
            let rules = RuleSet::new(scripts::DEFAULT_RULES, &ctx.config.scripts.rules);
            for file in ctx.sources(group)? {
                let source = ctx.fs.read_to_string(&file.path)?;
                let name = ctx.display_path(&file.path);
                let found = scripts::lint_source(&name, &source, &rules);
                report.push(file_report(name, found));
            }
        }
        other => bail!("no linter for {other}"),
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConfigFile, RawConfigFile};
    use crate::fs::mock::MockFileSystem;

    fn context(fs: &MockFileSystem, scripts_lint: LintPolicy) -> Arc<TaskContext> {
        let mut raw = RawConfigFile::default();
        raw.scripts.lint = scripts_lint;
        let cfg = ConfigFile::try_from(raw).unwrap().with_root(".");
        Arc::new(TaskContext::new(cfg, Arc::new(fs.clone())))
    }

    #[tokio::test]
    async fn fail_policy_fails_on_errors() {
        let fs = MockFileSystem::new();
        fs.add_file("resources/js/app.js", "debugger;\n");

        let err = run(&context(&fs, LintPolicy::Fail), AssetGroup::Scripts)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("1 error(s) in scripts"), "{err}");
    }

    #[tokio::test]
    async fn warn_policy_only_reports() {
        let fs = MockFileSystem::new();
        fs.add_file("resources/js/app.js", "debugger;\n");

        run(&context(&fs, LintPolicy::Warn), AssetGroup::Scripts)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn warnings_never_fail() {
        let fs = MockFileSystem::new();
        fs.add_file("resources/js/app.js", "if (a == 1) { go(); }\n");

        let ctx = context(&fs, LintPolicy::Fail);
        let report = lint_group(&ctx, AssetGroup::Scripts).unwrap();
        assert_eq!(report.warning_count(), 1);
        run(&ctx, AssetGroup::Scripts).await.unwrap();
    }

    #[test]
    fn style_reports_use_project_relative_paths() {
        let fs = MockFileSystem::new();
        fs.add_file("resources/scss/main.scss", "a {}\n");

        let report = lint_group(&context(&fs, LintPolicy::Fail), AssetGroup::Styles).unwrap();
        assert_eq!(report.files.len(), 1);
        assert_eq!(report.files[0].path.to_string_lossy(), "resources/scss/main.scss");
        assert_eq!(report.files[0].violations[0].rule, "block-no-empty");
    }
}
