// src/transform/js.rs

use anyhow::{anyhow, Context, Result};
use serde_json::json;
use swc_core::base::config::{
    Config, IsModule, JsMinifyOptions, JscConfig, Options, SourceMapsConfig,
};
use swc_core::base::{try_with_handler, Compiler, HandlerOpts, TransformOutput};
use swc_core::common::errors::ColorConfig;
use swc_core::common::sync::Lrc;
use swc_core::common::{FileName, SourceMap, GLOBALS};
use swc_core::ecma::ast::EsVersion;

use crate::pipeline::{Asset, Transform};

/// Parse a language level such as `es5`, `es2017` or `esnext`.
pub fn parse_target(s: &str) -> Option<EsVersion> {
    let v = match s.trim().to_ascii_lowercase().as_str() {
        "es3" => EsVersion::Es3,
        "es5" => EsVersion::Es5,
        "es6" | "es2015" => EsVersion::Es2015,
        "es2016" => EsVersion::Es2016,
        "es2017" => EsVersion::Es2017,
        "es2018" => EsVersion::Es2018,
        "es2019" => EsVersion::Es2019,
        "es2020" => EsVersion::Es2020,
        "es2021" => EsVersion::Es2021,
        "es2022" => EsVersion::Es2022,
        "esnext" => EsVersion::EsNext,
        _ => return None,
    };
    Some(v)
}

/// Run `op` against a fresh swc compiler with the asset loaded as a source file.
fn with_compiler<F>(name: &str, source: String, op: F) -> Result<TransformOutput>
where
    F: FnOnce(&Compiler, Lrc<swc_core::common::SourceFile>, &swc_core::common::errors::Handler) -> Result<TransformOutput>,
{
    let cm: Lrc<SourceMap> = Default::default();
    let compiler = Compiler::new(cm.clone());

    GLOBALS.set(&Default::default(), || {
        try_with_handler(
            cm.clone(),
            HandlerOpts {
                color: ColorConfig::Never,
                skip_filename: false,
            },
            |handler| {
                let fm = cm.new_source_file(FileName::Custom(name.to_string()), source);
                op(&compiler, fm, handler)
            },
        )
    })
}

/// `transpile` stage: lower each file to the configured language level,
/// parsed as a classic script.
#[derive(Debug, Clone, Copy)]
pub struct Transpile {
    target: EsVersion,
}

impl Transpile {
    pub fn new(target: EsVersion) -> Self {
        Self { target }
    }
}

impl Transform for Transpile {
    fn name(&self) -> &'static str {
        "transpile"
    }

    fn apply(&self, mut asset: Asset) -> Result<Option<Asset>> {
        let name = asset.path.to_string_lossy().replace('\\', "/");
        let options = Options {
            config: Config {
                jsc: JscConfig {
                    target: Some(self.target),
                    ..Default::default()
                },
                is_module: Some(IsModule::Bool(false)),
                ..Default::default()
            },
            swcrc: false,
            filename: name.clone(),
            source_maps: asset.track_maps.then_some(SourceMapsConfig::Bool(true)),
            ..Default::default()
        };

        let output = with_compiler(&name, asset.text()?.to_string(), |compiler, fm, handler| {
            compiler.process_js_file(fm, handler, &options)
        })
        .with_context(|| format!("transpiling {name}"))?;

        asset.set_text(output.code);
        asset.source_map = output.map;
        Ok(Some(asset))
    }
}

/// `minify` stage: compress, mangle, and print each file compactly,
/// composing the map of the previous stage.
#[derive(Debug, Clone, Copy, Default)]
pub struct MinifyJs;

impl Transform for MinifyJs {
    fn name(&self) -> &'static str {
        "minify"
    }

    fn apply(&self, mut asset: Asset) -> Result<Option<Asset>> {
        let name = asset.path.to_string_lossy().replace('\\', "/");

        let source_map = match (&asset.source_map, asset.track_maps) {
            (_, false) => json!(false),
            (Some(previous), true) => json!({ "filename": name, "content": previous }),
            (None, true) => json!({ "filename": name }),
        };
        let options: JsMinifyOptions = serde_json::from_value(json!({
            "compress": true,
            "mangle": true,
            "sourceMap": source_map,
        }))
        .map_err(|e| anyhow!("building minifier options: {e}"))?;

        let output = with_compiler(&name, asset.text()?.to_string(), |compiler, fm, handler| {
            compiler.minify(fm, handler, &options)
        })
        .with_context(|| format!("minifying {name}"))?;

        asset.set_text(output.code);
        asset.source_map = if asset.track_maps { output.map } else { None };
        Ok(Some(asset))
    }
}
