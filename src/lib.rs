//! md2svg
//!
//! Converts a Markdown document into a standalone SVG mind-map. The pipeline
//! is sequential: read the file, transform the text into an outline tree,
//! start an ephemeral loopback server hosting the render template, drive
//! headless Chrome to lay the tree out with markmap, then extract, repair and
//! write the resulting SVG.
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//!
//! # fn main() -> md2svg::Result<()> {
//! let options = md2svg::ExportOptions::default();
//! let written = md2svg::export(Path::new("notes.md"), None, &options)?;
//! println!("Exported {}", written.display());
//! # Ok(())
//! # }
//! ```

use log::info;
use std::fs;
use std::path::{Path, PathBuf};

pub mod error;
pub mod outline;
pub mod renderer;
pub mod repair;
pub mod server;

pub use error::{Error, Result};
pub use outline::OutlineNode;
pub use renderer::MindmapRenderer;
pub use server::RenderHost;

/// Configuration for the headless render step.
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Browser window size
    pub viewport: Viewport,
    /// How long to wait for the first rendered path element, in milliseconds
    pub render_timeout_ms: u64,
    /// Budget for the layout-settle polling loop, in milliseconds
    pub settle_budget_ms: u64,
    /// Interval between settle samples, in milliseconds
    pub settle_poll_ms: u64,
    /// Padding added around the content bounding box, in pixels
    pub padding: u32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            viewport: Viewport::default(),
            render_timeout_ms: 10_000,
            settle_budget_ms: 3_000,
            settle_poll_ms: 200,
            padding: 20,
        }
    }
}

/// Browser window dimensions
#[derive(Debug, Clone, Copy)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1200,
            height: 800,
        }
    }
}

/// Options for a single export run.
#[derive(Debug, Clone, Default)]
pub struct ExportOptions {
    /// Directory of static assets for the render host; its `template.html`
    /// overrides the embedded template page.
    pub assets: Option<PathBuf>,
    pub render: RenderConfig,
}

/// Default output path: the input path with a `.md` extension replaced by
/// `.svg`, or `.svg` appended when the input has some other extension.
pub fn resolve_output_path(input: &Path) -> PathBuf {
    match input.extension().and_then(|e| e.to_str()) {
        Some("md") => input.with_extension("svg"),
        _ => {
            let mut name = input.as_os_str().to_os_string();
            name.push(".svg");
            PathBuf::from(name)
        }
    }
}

/// Run the whole pipeline: Markdown in, SVG file out.
///
/// Returns the path the SVG was written to. The render host and the browser
/// are released on every exit path, including errors.
pub fn export(input: &Path, output: Option<&Path>, options: &ExportOptions) -> Result<PathBuf> {
    if !input.exists() {
        return Err(Error::InputNotFound(input.to_path_buf()));
    }
    let output = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| resolve_output_path(input));

    let markdown = fs::read_to_string(input)?;
    let tree = outline::transform(&markdown);
    info!("outline tree has {} nodes", tree.count());

    let host = RenderHost::start(options.assets.clone())?;
    let renderer = MindmapRenderer::launch(options.render.clone())?;
    let svg = renderer.render(&host.url(), &tree)?;

    let svg = repair::repair_void_tags(&svg);
    fs::write(&output, svg)?;
    info!("wrote {}", output.display());
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_path_replaces_md_extension() {
        assert_eq!(
            resolve_output_path(Path::new("notes.md")),
            PathBuf::from("notes.svg")
        );
        assert_eq!(
            resolve_output_path(Path::new("dir/deep/notes.md")),
            PathBuf::from("dir/deep/notes.svg")
        );
    }

    #[test]
    fn output_path_appends_svg_for_other_inputs() {
        assert_eq!(
            resolve_output_path(Path::new("notes.markdown")),
            PathBuf::from("notes.markdown.svg")
        );
        assert_eq!(
            resolve_output_path(Path::new("README")),
            PathBuf::from("README.svg")
        );
    }
}
