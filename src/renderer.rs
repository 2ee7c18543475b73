//! Headless renderer driving Chrome over the DevTools protocol
//!
//! Launches a headless Chrome instance, loads the render host page, hands
//! the outline tree to the in-page `renderMindMap` entry point and waits for
//! the layout to stabilize before running the DOM fixup pass and extracting
//! the serialized SVG.

use crate::error::{Error, Result};
use crate::outline::OutlineNode;
use crate::RenderConfig;
use headless_chrome::browser::tab::Tab;
use headless_chrome::{Browser, LaunchOptions};
use log::{debug, warn};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Selector that only matches once markmap has drawn at least one link.
const FIRST_PATH_SELECTOR: &str = "#mindmap path";

/// Returns a `count:WxH` fingerprint of the rendered mind-map, used to
/// detect when the asynchronous layout has stopped changing.
const FINGERPRINT_JS: &str = r#"(function(){
    const svg = document.querySelector('svg#mindmap');
    if (!svg) return '';
    const box = svg.getBBox();
    const paths = svg.querySelectorAll('path').length;
    return paths + ':' + Math.round(box.width) + 'x' + Math.round(box.height);
})()"#;

/// DOM fixup pass making the rendered SVG valid as a standalone document:
/// self-closed `img` elements, namespace attributes, a content-sized
/// `viewBox`, and no inline root style (downstream viewers restyle the root).
const FIXUP_JS_TEMPLATE: &str = r#"(function(){
    const svg = document.querySelector('svg#mindmap');
    if (!svg) return 'missing';

    svg.querySelectorAll('img').forEach(img => {
        if (!img.outerHTML.endsWith('/>')) {
            const clone = img.cloneNode(true);
            const markup = clone.outerHTML.replace(/>$/, ' />');
            img.replaceWith(new DOMParser().parseFromString(markup, 'image/svg+xml').documentElement);
        }
    });

    if (!svg.getAttribute('xmlns')) {
        svg.setAttribute('xmlns', 'http://www.w3.org/2000/svg');
    }
    svg.querySelectorAll('foreignObject > div').forEach(div => {
        if (!div.getAttribute('xmlns')) {
            div.setAttribute('xmlns', 'http://www.w3.org/1999/xhtml');
        }
    });

    const box = svg.getBBox();
    const pad = __PADDING__;
    svg.setAttribute('viewBox',
        (box.x - pad) + ' ' + (box.y - pad) + ' ' +
        (box.width + 2 * pad) + ' ' + (box.height + 2 * pad));
    svg.setAttribute('width', String(box.width + 2 * pad));
    svg.setAttribute('height', String(box.height + 2 * pad));
    svg.removeAttribute('style');
    return 'ok';
})()"#;

const EXTRACT_JS: &str = r#"(function(){
    const el = document.querySelector('svg#mindmap');
    return el ? el.outerHTML : '';
})()"#;

/// A headless Chrome session rendering one mind-map per call.
pub struct MindmapRenderer {
    // Kept alive for the session; the guard kills the child process on drop.
    _browser: Browser,
    tab: Arc<Tab>,
    config: RenderConfig,
}

impl MindmapRenderer {
    /// Launch headless Chrome with the configured window size.
    pub fn launch(config: RenderConfig) -> Result<Self> {
        let launch_options = LaunchOptions::default_builder()
            .headless(true)
            .window_size(Some((config.viewport.width, config.viewport.height)))
            .build()
            .map_err(|e| Error::Browser(format!("failed to build launch options: {e}")))?;

        let browser = Browser::new(launch_options)
            .map_err(|e| Error::Browser(format!("failed to launch headless Chrome: {e}")))?;
        let tab = browser
            .new_tab()
            .map_err(|e| Error::Browser(format!("failed to open tab: {e}")))?;

        Ok(Self {
            _browser: browser,
            tab,
            config,
        })
    }

    /// Render the outline tree on the page at `url` and return the repaired
    /// outer markup of the mind-map SVG element.
    pub fn render(&self, url: &str, tree: &OutlineNode) -> Result<String> {
        self.tab
            .navigate_to(url)
            .map_err(|e| Error::Load(format!("navigation to {url} failed: {e}")))?;
        self.tab
            .wait_until_navigated()
            .map_err(|e| Error::Load(format!("wait for navigation failed: {e}")))?;

        let tree_json = serde_json::to_string(tree)
            .map_err(|e| Error::Transform(format!("outline tree is not serializable: {e}")))?;
        self.eval(&format!("window.renderMindMap({tree_json})"))?;

        self.tab
            .wait_for_element_with_custom_timeout(
                FIRST_PATH_SELECTOR,
                Duration::from_millis(self.config.render_timeout_ms),
            )
            .map_err(|_| {
                Error::Timeout(self.config.render_timeout_ms, FIRST_PATH_SELECTOR.into())
            })?;

        self.wait_for_settle()?;
        self.apply_fixups()?;
        self.extract_svg()
    }

    /// Poll the layout fingerprint until two consecutive samples match.
    ///
    /// The markmap layout animates after the first path appears, and Chrome
    /// exposes no layout-complete signal, so sampling is bounded by the
    /// settle budget and the render proceeds with whatever is on screen once
    /// the budget elapses.
    fn wait_for_settle(&self) -> Result<()> {
        let deadline = Instant::now() + Duration::from_millis(self.config.settle_budget_ms);
        let mut last = self.fingerprint()?;
        let mut rounds = 0u32;
        loop {
            std::thread::sleep(Duration::from_millis(self.config.settle_poll_ms));
            let next = self.fingerprint()?;
            rounds += 1;
            if !next.is_empty() && next == last {
                debug!("layout settled after {rounds} samples ({next})");
                return Ok(());
            }
            if Instant::now() >= deadline {
                warn!(
                    "layout did not settle within {}ms; exporting current state",
                    self.config.settle_budget_ms
                );
                return Ok(());
            }
            last = next;
        }
    }

    fn fingerprint(&self) -> Result<String> {
        let value = self.eval(FINGERPRINT_JS)?;
        Ok(value.as_str().map(str::to_string).unwrap_or_default())
    }

    fn apply_fixups(&self) -> Result<()> {
        let script = FIXUP_JS_TEMPLATE.replace("__PADDING__", &self.config.padding.to_string());
        let value = self.eval(&script)?;
        match value.as_str() {
            Some("ok") => Ok(()),
            _ => Err(Error::Render("mind-map SVG element missing after render".into())),
        }
    }

    fn extract_svg(&self) -> Result<String> {
        let value = self.eval(EXTRACT_JS)?;
        match value.as_str() {
            Some(markup) if !markup.is_empty() => Ok(markup.to_string()),
            _ => Err(Error::Render("extracted SVG markup is empty".into())),
        }
    }

    fn eval(&self, script: &str) -> Result<serde_json::Value> {
        let result = self
            .tab
            .evaluate(script, false)
            .map_err(|e| Error::Script(format!("evaluation failed: {e}")))?;
        Ok(result.value.unwrap_or(serde_json::Value::Null))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixup_script_substitutes_padding() {
        let script = FIXUP_JS_TEMPLATE.replace("__PADDING__", "20");
        assert!(script.contains("const pad = 20;"));
        assert!(!script.contains("__PADDING__"));
    }

    #[test]
    fn scripts_target_the_mindmap_root() {
        for script in [FINGERPRINT_JS, FIXUP_JS_TEMPLATE, EXTRACT_JS] {
            assert!(script.contains("svg#mindmap"));
        }
    }
}
