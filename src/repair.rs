//! String-level repair of the extracted SVG markup
//!
//! Chrome serializes `outerHTML` with HTML void-element syntax (`<br>`),
//! which is invalid in a standalone SVG document. XML requires the void
//! elements to be self-closing, so every `img`, `br` and `hr` occurrence is
//! rewritten to `<tag attrs />` form. Already self-closed tags pass through
//! unchanged, which keeps the repair idempotent.

use regex::Regex;
use std::sync::OnceLock;

static VOID_TAG: OnceLock<Regex> = OnceLock::new();

fn void_tag() -> &'static Regex {
    VOID_TAG.get_or_init(|| {
        Regex::new(r"<(img|br|hr)\b([^>]*?)\s*/?>").expect("void-tag pattern is valid")
    })
}

/// Make every `<img>`, `<br>` and `<hr>` tag self-closing.
pub fn repair_void_tags(svg: &str) -> String {
    void_tag().replace_all(svg, "<${1}${2} />").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_void_tags_are_closed() {
        assert_eq!(repair_void_tags("a<br>b"), "a<br />b");
        assert_eq!(repair_void_tags("<hr>"), "<hr />");
    }

    #[test]
    fn attributes_are_preserved() {
        assert_eq!(
            repair_void_tags(r#"<img src="x.png" alt="x">"#),
            r#"<img src="x.png" alt="x" />"#
        );
    }

    #[test]
    fn already_self_closed_tags_are_untouched() {
        let input = r#"<img src="x.png" /><br /><hr />"#;
        assert_eq!(repair_void_tags(input), input);
    }

    #[test]
    fn repair_is_idempotent() {
        let once = repair_void_tags(r#"text<br><img src="a"><hr>more"#);
        assert_eq!(repair_void_tags(&once), once);
    }

    #[test]
    fn non_void_tags_are_ignored() {
        let input = "<svg><g><path d=\"M0 0\"/></g></svg>";
        assert_eq!(repair_void_tags(input), input);
    }

    #[test]
    fn tag_name_prefixes_do_not_match() {
        // <hrule> / <brand> style names must not be rewritten
        let input = "<brand><hrule>";
        assert_eq!(repair_void_tags(input), input);
    }
}
