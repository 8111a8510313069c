// src/config/model.rs

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::types::{AssetGroup, LintPolicy, Severity, TriggerWhileRunningBehaviour};

/// Raw configuration as read from a TOML file, before validation.
///
/// Every section is optional; an empty file yields the stock layout:
///
/// ```toml
/// [paths]
/// output = "public_html"
///
/// [paths.styles]
/// src = "resources/scss/**/*.scss"
/// dest = "public_html/css"
///
/// [styles]
/// lint = "warn"
///
/// [scripts]
/// lint = "fail"
/// target = "es5"
///
/// [server]
/// port = 3000
/// ```
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct RawConfigFile {
    #[serde(default)]
    pub paths: PathsSection,

    #[serde(default)]
    pub styles: StylesSection,

    #[serde(default)]
    pub scripts: ScriptsSection,

    #[serde(default)]
    pub images: ImagesSection,

    #[serde(default)]
    pub server: ServerSection,

    #[serde(default)]
    pub watch: WatchSection,
}

/// Validated configuration.
///
/// Can only be built through `TryFrom<RawConfigFile>` (see `validate.rs`),
/// so holders of a `ConfigFile` may assume globs compile and numeric knobs
/// are in range. `root` is the directory every relative path is resolved
/// against.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub paths: PathsSection,
    pub styles: StylesSection,
    pub scripts: ScriptsSection,
    pub images: ImagesSection,
    pub server: ServerSection,
    pub watch: WatchSection,
    root: PathBuf,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(raw: RawConfigFile) -> Self {
        Self {
            paths: raw.paths,
            styles: raw.styles,
            scripts: raw.scripts,
            images: raw.images,
            server: raw.server,
            watch: raw.watch,
            root: PathBuf::from("."),
        }
    }

    /// Re-anchor all relative paths on `root`.
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = root.into();
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a configured (relative) path against the project root.
    pub fn resolve(&self, rel: &str) -> PathBuf {
        let p = Path::new(rel);
        if p.is_absolute() {
            p.to_path_buf()
        } else {
            self.root.join(p)
        }
    }

    pub fn output_dir(&self) -> PathBuf {
        self.resolve(&self.paths.output)
    }

    pub fn maps_dir(&self) -> PathBuf {
        self.resolve(&self.paths.maps.dest)
    }

    /// Source glob for a group (relative to the project root).
    pub fn source_glob(&self, group: AssetGroup) -> &str {
        match group {
            AssetGroup::Styles => &self.paths.styles.src,
            AssetGroup::Scripts => &self.paths.scripts.src,
            AssetGroup::Images => &self.paths.images.src,
            AssetGroup::Html => &self.paths.html.src,
        }
    }

    /// Destination directory for a group; HTML has none.
    pub fn dest_dir(&self, group: AssetGroup) -> Option<PathBuf> {
        match group {
            AssetGroup::Styles => Some(self.resolve(&self.paths.styles.dest)),
            AssetGroup::Scripts => Some(self.resolve(&self.paths.scripts.dest)),
            AssetGroup::Images => Some(self.resolve(&self.paths.images.dest)),
            AssetGroup::Html => None,
        }
    }

    pub fn server_root(&self) -> PathBuf {
        match &self.server.root {
            Some(root) => self.resolve(root),
            None => self.output_dir(),
        }
    }
}

/// `[paths]` section: the asset group table.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PathsSection {
    /// Output root; `clean` empties it (HTML excepted).
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default)]
    pub styles: StylesPaths,

    #[serde(default)]
    pub scripts: ScriptsPaths,

    #[serde(default)]
    pub images: ImagesPaths,

    #[serde(default)]
    pub html: HtmlPaths,

    #[serde(default)]
    pub maps: MapsPaths,
}

fn default_output() -> String {
    "public_html".to_string()
}

impl Default for PathsSection {
    fn default() -> Self {
        Self {
            output: default_output(),
            styles: StylesPaths::default(),
            scripts: ScriptsPaths::default(),
            images: ImagesPaths::default(),
            html: HtmlPaths::default(),
            maps: MapsPaths::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StylesPaths {
    #[serde(default = "default_styles_src")]
    pub src: String,
    #[serde(default = "default_styles_dest")]
    pub dest: String,
}

fn default_styles_src() -> String {
    "resources/scss/**/*.scss".to_string()
}

fn default_styles_dest() -> String {
    "public_html/css".to_string()
}

impl Default for StylesPaths {
    fn default() -> Self {
        Self {
            src: default_styles_src(),
            dest: default_styles_dest(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScriptsPaths {
    #[serde(default = "default_scripts_src")]
    pub src: String,
    #[serde(default = "default_scripts_dest")]
    pub dest: String,
}

fn default_scripts_src() -> String {
    "resources/js/**/*.js".to_string()
}

fn default_scripts_dest() -> String {
    "public_html/js".to_string()
}

impl Default for ScriptsPaths {
    fn default() -> Self {
        Self {
            src: default_scripts_src(),
            dest: default_scripts_dest(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ImagesPaths {
    #[serde(default = "default_images_src")]
    pub src: String,
    #[serde(default = "default_images_dest")]
    pub dest: String,
}

fn default_images_src() -> String {
    "resources/images/**/*".to_string()
}

fn default_images_dest() -> String {
    "public_html/images".to_string()
}

impl Default for ImagesPaths {
    fn default() -> Self {
        Self {
            src: default_images_src(),
            dest: default_images_dest(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HtmlPaths {
    #[serde(default = "default_html_src")]
    pub src: String,
}

fn default_html_src() -> String {
    "public_html/**/*.html".to_string()
}

impl Default for HtmlPaths {
    fn default() -> Self {
        Self {
            src: default_html_src(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MapsPaths {
    #[serde(default = "default_maps_dest")]
    pub dest: String,
}

fn default_maps_dest() -> String {
    "public_html/maps".to_string()
}

impl Default for MapsPaths {
    fn default() -> Self {
        Self {
            dest: default_maps_dest(),
        }
    }
}

/// `[styles]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StylesSection {
    #[serde(default = "default_true")]
    pub source_maps: bool,

    /// Output base name; the artifact is `{basename}{suffix}.css`.
    #[serde(default = "default_styles_basename")]
    pub basename: String,

    #[serde(default = "default_min_suffix")]
    pub suffix: String,

    /// Browserslist query driving vendor prefixes.
    #[serde(default = "default_prefix_browsers")]
    pub browsers: Vec<String>,

    /// Browserslist query the minifier must stay compatible with.
    #[serde(default = "default_compat_browsers")]
    pub compatibility: Vec<String>,

    #[serde(default = "default_styles_lint")]
    pub lint: LintPolicy,

    /// Per-rule severity overrides, keyed by rule id.
    #[serde(default)]
    pub rules: BTreeMap<String, Severity>,
}

fn default_true() -> bool {
    true
}

fn default_styles_basename() -> String {
    "styles".to_string()
}

fn default_min_suffix() -> String {
    ".min".to_string()
}

fn default_prefix_browsers() -> Vec<String> {
    vec![
        "> 0.5%".to_string(),
        "last 2 versions".to_string(),
        "ie >= 8".to_string(),
    ]
}

fn default_compat_browsers() -> Vec<String> {
    vec!["ie 8".to_string()]
}

fn default_styles_lint() -> LintPolicy {
    LintPolicy::Warn
}

impl Default for StylesSection {
    fn default() -> Self {
        Self {
            source_maps: true,
            basename: default_styles_basename(),
            suffix: default_min_suffix(),
            browsers: default_prefix_browsers(),
            compatibility: default_compat_browsers(),
            lint: default_styles_lint(),
            rules: BTreeMap::new(),
        }
    }
}

impl StylesSection {
    /// File name of the compiled stylesheet, e.g. `styles.min.css`.
    pub fn output_name(&self) -> String {
        format!("{}{}.css", self.basename, self.suffix)
    }
}

/// `[scripts]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScriptsSection {
    #[serde(default = "default_true")]
    pub source_maps: bool,

    /// Name of the single bundle written to the scripts destination.
    #[serde(default = "default_bundle")]
    pub bundle: String,

    /// Language level the transpiler lowers to (`es5`, `es2015`, ...).
    #[serde(default = "default_target")]
    pub target: String,

    #[serde(default = "default_scripts_lint")]
    pub lint: LintPolicy,

    #[serde(default)]
    pub rules: BTreeMap<String, Severity>,
}

fn default_bundle() -> String {
    "scripts.min.js".to_string()
}

fn default_target() -> String {
    "es5".to_string()
}

fn default_scripts_lint() -> LintPolicy {
    LintPolicy::Fail
}

impl Default for ScriptsSection {
    fn default() -> Self {
        Self {
            source_maps: true,
            bundle: default_bundle(),
            target: default_target(),
            lint: default_scripts_lint(),
            rules: BTreeMap::new(),
        }
    }
}

/// `[images]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ImagesSection {
    /// PNG recompression preset (0-6).
    #[serde(default = "default_png_level")]
    pub optimization_level: u8,

    #[serde(default)]
    pub gif: GifOptions,

    #[serde(default)]
    pub jpeg: JpegOptions,

    #[serde(default)]
    pub svg: SvgOptions,
}

fn default_png_level() -> u8 {
    5
}

impl Default for ImagesSection {
    fn default() -> Self {
        Self {
            optimization_level: default_png_level(),
            gif: GifOptions::default(),
            jpeg: JpegOptions::default(),
            svg: SvgOptions::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GifOptions {
    #[serde(default = "default_true")]
    pub interlaced: bool,
}

impl Default for GifOptions {
    fn default() -> Self {
        Self { interlaced: true }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JpegOptions {
    #[serde(default = "default_true")]
    pub progressive: bool,

    /// Quality used for the progressive re-encode (1-100).
    #[serde(default = "default_jpeg_quality")]
    pub quality: u8,
}

fn default_jpeg_quality() -> u8 {
    90
}

impl Default for JpegOptions {
    fn default() -> Self {
        Self {
            progressive: true,
            quality: default_jpeg_quality(),
        }
    }
}

/// SVG minifier plugins.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SvgOptions {
    #[serde(default)]
    pub remove_view_box: bool,
    #[serde(default = "default_true")]
    pub collapse_groups: bool,
    #[serde(default = "default_true")]
    pub remove_comments: bool,
    #[serde(default = "default_true")]
    pub remove_metadata: bool,
}

impl Default for SvgOptions {
    fn default() -> Self {
        Self {
            remove_view_box: false,
            collapse_groups: true,
            remove_comments: true,
            remove_metadata: true,
        }
    }
}

/// `[server]` section for the dev server.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerSection {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Default document for directory requests.
    #[serde(default = "default_index")]
    pub index: String,

    /// Directory to serve; defaults to `paths.output`.
    #[serde(default)]
    pub root: Option<String>,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_index() -> String {
    "index.html".to_string()
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            index: default_index(),
            root: None,
        }
    }
}

/// `[watch]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WatchSection {
    #[serde(default)]
    pub triggered_while_running_behaviour: TriggerWhileRunningBehaviour,

    /// Maximum number of queued runs per watched group.
    #[serde(default = "default_queue_length")]
    pub queue_length: usize,
}

fn default_queue_length() -> usize {
    1
}

impl Default for WatchSection {
    fn default() -> Self {
        Self {
            triggered_while_running_behaviour: TriggerWhileRunningBehaviour::Queue,
            queue_length: default_queue_length(),
        }
    }
}
