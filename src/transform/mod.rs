// src/transform/mod.rs

//! Pipeline stages for styles and scripts.
//!
//! The compilers themselves are libraries: `grass` for SCSS, `lightningcss`
//! for prefixing and CSS minification, `swc_core` for transpiling and
//! minifying scripts. This module adapts them to [`Transform`] and
//! [`Collect`] stages and handles the map/concat/dest plumbing around them.
//!
//! [`Transform`]: crate::pipeline::Transform
//! [`Collect`]: crate::pipeline::Collect

pub mod concat;
pub mod css;
pub mod dest;
pub mod js;
pub mod scss;
pub mod sourcemap;

pub use concat::Concat;
pub use css::{Autoprefix, MinifyCss};
pub use dest::Dest;
pub use js::{MinifyJs, Transpile};
pub use scss::CompileScss;
pub use sourcemap::{SourcemapsInit, WriteMaps};
