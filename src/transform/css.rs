// src/transform/css.rs

use anyhow::{anyhow, Result};
use lightningcss::stylesheet::{MinifyOptions, ParserOptions, PrinterOptions, StyleSheet};
use lightningcss::targets::{Browsers, Targets};
use parcel_sourcemap::SourceMap;

use crate::pipeline::{Asset, Transform};

/// Resolve a browserslist query into lightningcss targets.
///
/// An empty query means "no targets" (no prefixing, no lowering).
pub fn targets_from_query(query: &[String]) -> Result<Targets> {
    if query.is_empty() {
        return Ok(Targets::default());
    }

    let browsers = Browsers::from_browserslist(query.iter().map(String::as_str))
        .map_err(|e| anyhow!("invalid browserslist query {query:?}: {e}"))?;

    Ok(Targets {
        browsers,
        ..Targets::default()
    })
}

/// Targets satisfying both `a` and `b`: the oldest version of each browser.
///
/// The minifier runs with the union of the prefix and compatibility queries;
/// minifying for the compatibility query alone would drop prefixes added
/// for the prefix query.
pub fn combine_targets(a: &Targets, b: &Targets) -> Targets {
    let browsers = match (a.browsers, b.browsers) {
        (Some(x), Some(y)) => Some(oldest(x, y)),
        (x, y) => x.or(y),
    };
    Targets {
        browsers,
        ..Targets::default()
    }
}

fn oldest(a: Browsers, b: Browsers) -> Browsers {
    fn min(x: Option<u32>, y: Option<u32>) -> Option<u32> {
        match (x, y) {
            (Some(x), Some(y)) => Some(x.min(y)),
            (x, y) => x.or(y),
        }
    }

    Browsers {
        android: min(a.android, b.android),
        chrome: min(a.chrome, b.chrome),
        edge: min(a.edge, b.edge),
        firefox: min(a.firefox, b.firefox),
        ie: min(a.ie, b.ie),
        ios_saf: min(a.ios_saf, b.ios_saf),
        opera: min(a.opera, b.opera),
        safari: min(a.safari, b.safari),
        samsung: min(a.samsung, b.samsung),
    }
}

/// Parse, optimize for `targets`, and print a stylesheet.
fn print(
    name: &str,
    code: &str,
    targets: Targets,
    minify: bool,
    source_map: Option<&mut SourceMap>,
) -> Result<String> {
    let mut sheet = StyleSheet::parse(
        code,
        ParserOptions {
            filename: name.to_string(),
            ..ParserOptions::default()
        },
    )
    .map_err(|e| anyhow!("{name}: {e}"))?;

    sheet
        .minify(MinifyOptions {
            targets: targets.clone(),
            ..MinifyOptions::default()
        })
        .map_err(|e| anyhow!("{name}: {e}"))?;

    let out = sheet
        .to_css(PrinterOptions {
            minify,
            source_map,
            targets,
            ..PrinterOptions::default()
        })
        .map_err(|e| anyhow!("{name}: {e}"))?;

    Ok(out.code)
}

/// `autoprefix` stage: add vendor prefixes for the configured browsers,
/// keeping the output readable.
#[derive(Debug, Clone)]
pub struct Autoprefix {
    targets: Targets,
}

impl Autoprefix {
    pub fn new(targets: Targets) -> Self {
        Self { targets }
    }
}

impl Transform for Autoprefix {
    fn name(&self) -> &'static str {
        "autoprefix"
    }

    fn apply(&self, mut asset: Asset) -> Result<Option<Asset>> {
        let name = asset.file_name();
        let css = print(&name, asset.text()?, self.targets.clone(), false, None)?;
        asset.set_text(css);
        Ok(Some(asset))
    }
}

/// `minify` stage: minify for the compatibility profile and, when maps are
/// tracked, emit a map whose source is the stage input.
#[derive(Debug, Clone)]
pub struct MinifyCss {
    targets: Targets,
}

impl MinifyCss {
    pub fn new(targets: Targets) -> Self {
        Self { targets }
    }
}

impl Transform for MinifyCss {
    fn name(&self) -> &'static str {
        "minify"
    }

    fn apply(&self, mut asset: Asset) -> Result<Option<Asset>> {
        let name = asset.file_name();
        let input = asset.text()?.to_string();

        if !asset.track_maps {
            let css = print(&name, &input, self.targets.clone(), true, None)?;
            asset.set_text(css);
            return Ok(Some(asset));
        }

        let mut map = SourceMap::new("/");
        let index = map.add_source(&name);
        map.set_source_content(index as usize, &input)
            .map_err(|e| anyhow!("{name}: {e}"))?;

        let css = print(&name, &input, self.targets.clone(), true, Some(&mut map))?;
        let json = map.to_json(None).map_err(|e| anyhow!("{name}: {e}"))?;

        asset.set_text(css);
        asset.source_map = Some(json);
        Ok(Some(asset))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn default_queries_resolve() {
        assert!(targets_from_query(&query(&["> 0.5%", "last 2 versions", "ie >= 8"])).is_ok());
        assert!(targets_from_query(&query(&["ie 8"])).is_ok());
        assert!(targets_from_query(&[]).is_ok());
    }

    #[test]
    fn nonsense_query_is_rejected() {
        assert!(targets_from_query(&query(&["definitely not a browser 99"])).is_err());
    }

    #[test]
    fn autoprefix_adds_vendor_prefixes_for_old_browsers() {
        let targets = targets_from_query(&query(&["safari 5"])).unwrap();
        let asset = Asset::new("a.css", ".a { user-select: none; }");

        let out = Autoprefix::new(targets).apply(asset).unwrap().unwrap();
        let css = out.text().unwrap();
        assert!(css.contains("-webkit-user-select"), "{css}");
        assert!(css.contains('\n'), "autoprefix output should stay readable");
    }

    #[test]
    fn combined_targets_keep_prefixes_through_minify() {
        let prefix = targets_from_query(&query(&["safari 5"])).unwrap();
        let compat = targets_from_query(&query(&["ie 8"])).unwrap();
        let combined = combine_targets(&prefix, &compat);
        let browsers = combined.browsers.unwrap();
        assert_eq!(browsers.ie, compat.browsers.unwrap().ie);
        assert_eq!(browsers.safari, prefix.browsers.unwrap().safari);

        let asset = Asset::new("a.css", ".a { user-select: none; }");
        let prefixed = Autoprefix::new(prefix).apply(asset).unwrap().unwrap();
        let out = MinifyCss::new(combined).apply(prefixed).unwrap().unwrap();
        let css = out.text().unwrap();
        assert!(css.contains("-webkit-user-select:none"), "{css}");
        assert!(!css.contains('\n'));
    }

    #[test]
    fn minify_strips_whitespace_and_emits_a_map_when_tracking() {
        let mut asset = Asset::new("styles.css", "body {\n  color: red;\n}\n");
        asset.track_maps = true;

        let out = MinifyCss::new(Targets::default()).apply(asset).unwrap().unwrap();
        assert_eq!(out.text().unwrap(), "body{color:red}");

        let map: serde_json::Value = serde_json::from_str(out.source_map.as_deref().unwrap()).unwrap();
        assert_eq!(map["version"], 3);
    }

    #[test]
    fn minify_without_tracking_leaves_no_map() {
        let asset = Asset::new("styles.css", "a { color: #ff0000 }");
        let out = MinifyCss::new(Targets::default()).apply(asset).unwrap().unwrap();
        assert!(out.source_map.is_none());
        assert_eq!(out.text().unwrap(), "a{color:red}");
    }
}
