// tests/build_end_to_end.rs

use std::error::Error;
use std::sync::Arc;

use assetdag::dag::Plan;
use assetdag::fs::RealFileSystem;
use assetdag::tasks::TaskContext;
use assetdag::types::LintPolicy;
use assetdag::{into_result, run_plan};
use assetdag_test_utils::{init_tracing, with_timeout, ConfigBuilder, TempProject};

type TestResult = Result<(), Box<dyn Error>>;

const INDEX: &str = "<!doctype html>\n<html><body><h1>hi</h1></body></html>\n";

fn project() -> TempProject {
    let project = TempProject::new();
    project
        .write("resources/scss/_vars.scss", "$brand: red;\n")
        .write(
            "resources/scss/main.scss",
            "@import 'vars';\n\nbody {\n  color: $brand;\n}\n\n.box {\n  user-select: none;\n}\n",
        )
        .write("resources/js/a.js", "const x = 1;\nconsole.log(x);\n")
        .write("resources/js/b.js", "let greet = (name) => `hi ${name}`;\ngreet('you');\n")
        .write(
            "resources/images/logo.svg",
            "<svg xmlns=\"http://www.w3.org/2000/svg\">\n  <!-- logo -->\n  <rect width=\"1\" height=\"1\"/>\n</svg>\n",
        )
        .write("public_html/index.html", INDEX)
        .write("public_html/css/stale.css", "old{}");
    project
}

fn context(project: &TempProject, builder: ConfigBuilder) -> Arc<TaskContext> {
    Arc::new(TaskContext::new(
        project.config(builder),
        Arc::new(RealFileSystem),
    ))
}

async fn build(ctx: &Arc<TaskContext>) -> TestResult {
    let plan = Plan::exported("build").ok_or("build plan")?;
    let report = with_timeout(run_plan(ctx.clone(), &plan)).await?;
    into_result(report)?;
    Ok(())
}

#[tokio::test]
async fn build_writes_every_output_and_keeps_html() -> TestResult {
    init_tracing();
    let project = project();
    let ctx = context(&project, ConfigBuilder::new());

    build(&ctx).await?;

    assert_eq!(
        project.files_under("public_html"),
        vec![
            "public_html/css/styles.min.css",
            "public_html/images/logo.svg",
            "public_html/index.html",
            "public_html/js/scripts.min.js",
            "public_html/maps/scripts.min.js.map",
            "public_html/maps/styles.min.css.map",
        ]
    );

    let css = project.read("public_html/css/styles.min.css");
    assert!(css.starts_with("body{color:red}"), "{css}");
    assert!(
        css.contains("-webkit-user-select:none") || css.contains("-ms-user-select:none"),
        "prefixes survive minification: {css}"
    );
    assert!(css.contains("sourceMappingURL=../maps/styles.min.css.map"));

    let js = project.read("public_html/js/scripts.min.js");
    assert!(!js.contains("const "), "{js}");
    assert!(!js.contains("=>"), "{js}");
    assert!(js.contains("sourceMappingURL=../maps/scripts.min.js.map"));

    let svg = project.read("public_html/images/logo.svg");
    assert!(!svg.contains("logo -->"), "{svg}");

    assert_eq!(project.read("public_html/index.html"), INDEX);
    Ok(())
}

#[tokio::test]
async fn rebuilding_unchanged_sources_is_byte_identical() -> TestResult {
    init_tracing();
    let project = project();
    let ctx = context(&project, ConfigBuilder::new());

    build(&ctx).await?;
    let first: Vec<(String, Vec<u8>)> = project
        .files_under("public_html")
        .into_iter()
        .map(|f| {
            let bytes = project.read_bytes(&f);
            (f, bytes)
        })
        .collect();

    build(&ctx).await?;
    let second: Vec<(String, Vec<u8>)> = project
        .files_under("public_html")
        .into_iter()
        .map(|f| {
            let bytes = project.read_bytes(&f);
            (f, bytes)
        })
        .collect();

    assert_eq!(first, second);
    Ok(())
}

#[tokio::test]
async fn without_maps_no_map_files_or_comments_are_written() -> TestResult {
    init_tracing();
    let project = project();
    let ctx = context(&project, ConfigBuilder::new().source_maps(false));

    build(&ctx).await?;

    assert!(!project.exists("public_html/maps"));
    assert!(!project.read("public_html/css/styles.min.css").contains("sourceMappingURL"));
    assert!(!project.read("public_html/js/scripts.min.js").contains("sourceMappingURL"));
    Ok(())
}

#[tokio::test]
async fn clean_keeps_html_only() -> TestResult {
    init_tracing();
    let project = project();
    let ctx = context(&project, ConfigBuilder::new());
    build(&ctx).await?;

    let report = with_timeout(run_plan(ctx.clone(), &Plan::exported("clean").ok_or("clean")?)).await?;
    into_result(report)?;

    assert_eq!(project.files_under("public_html"), vec!["public_html/index.html"]);
    assert!(!project.exists("public_html/css"));
    Ok(())
}

#[tokio::test]
async fn failing_script_lint_fails_js_but_warn_policy_passes() -> TestResult {
    init_tracing();
    let project = project();
    project.write("resources/js/c.js", "debugger;\n");

    let strict = context(&project, ConfigBuilder::new());
    let report = with_timeout(run_plan(strict.clone(), &Plan::exported("js").ok_or("js")?)).await?;
    let failed: Vec<&str> = report.failed().into_iter().map(|(t, _)| t).collect();
    assert_eq!(failed, vec!["scripts", "scripts-lint"]);
    assert!(into_result(report).is_err());
    assert!(!project.exists("public_html/js/scripts.min.js"));

    let lenient = context(&project, ConfigBuilder::new().scripts_lint(LintPolicy::Warn));
    let report = with_timeout(run_plan(lenient.clone(), &Plan::exported("js").ok_or("js")?)).await?;
    into_result(report)?;
    assert!(project.exists("public_html/js/scripts.min.js"));
    Ok(())
}
