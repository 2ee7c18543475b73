//! Markdown to outline-tree transformation
//!
//! Consumes the `pulldown-cmark` event stream and builds the hierarchical
//! outline the in-page renderer understands: headings open levels, list items
//! nest beneath them, and inline markup is carried as small HTML fragments
//! (the renderer places node content inside `foreignObject` elements).

use pulldown_cmark::{html, CodeBlockKind, Event, HeadingLevel, Options, Parser, Tag};
use serde::Serialize;
use serde_json::json;

/// A node of the outline tree.
///
/// Field names match what `window.renderMindMap` expects on the wire:
/// `content` is an inline HTML fragment, `children` the ordered subtrees,
/// `payload` optional metadata (task-list state, code-block language).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutlineNode {
    pub content: String,
    pub children: Vec<OutlineNode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,
}

impl OutlineNode {
    fn leaf(content: String) -> Self {
        Self {
            content,
            children: Vec::new(),
            payload: None,
        }
    }

    /// Total number of nodes in this subtree, the node itself included.
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(OutlineNode::count).sum::<usize>()
    }
}

/// Transform Markdown text into an outline tree.
///
/// If the document has exactly one top-level node (the common single-`#`
/// layout) that node becomes the root; otherwise a synthetic empty root
/// holds the top-level nodes.
pub fn transform(markdown: &str) -> OutlineNode {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);

    let parser = Parser::new_ext(markdown, options);
    let mut builder = TreeBuilder::new();
    for event in parser {
        builder.push(event);
    }
    builder.finish()
}

/// What kind of open container a stack entry represents.
enum Container {
    Root,
    /// A heading with its rank (1 for `#` through 6 for `######`)
    Heading(u32),
    Item,
}

struct Open {
    container: Container,
    node: OutlineNode,
}

struct TreeBuilder<'a> {
    /// Open containers; index 0 is always the synthetic root.
    stack: Vec<Open>,
    /// Inline events buffered for the text block currently being read.
    inline: Vec<Event<'a>>,
    capturing: bool,
    in_table: bool,
    /// Language of the open code block (empty for indented / no info string).
    code: Option<String>,
    code_text: String,
}

impl<'a> TreeBuilder<'a> {
    fn new() -> Self {
        Self {
            stack: vec![Open {
                container: Container::Root,
                node: OutlineNode::leaf(String::new()),
            }],
            inline: Vec::new(),
            capturing: false,
            in_table: false,
            code: None,
            code_text: String::new(),
        }
    }

    fn push(&mut self, event: Event<'a>) {
        // Tables are kept whole: buffer the entire subtree and render it
        // into a single child node.
        if self.in_table {
            let done = matches!(&event, Event::End(Tag::Table(_)));
            self.inline.push(event);
            if done {
                self.in_table = false;
                let table = render_events(std::mem::take(&mut self.inline));
                self.attach_child(OutlineNode::leaf(table.trim().to_string()));
            }
            return;
        }

        // Code blocks collapse to their first line.
        if self.code.is_some() {
            match event {
                Event::Text(text) => self.code_text.push_str(&text),
                Event::End(Tag::CodeBlock(_)) => self.finish_code_block(),
                _ => {}
            }
            return;
        }

        match event {
            Event::Start(Tag::Heading(..)) => self.capturing = true,
            Event::End(Tag::Heading(level, _, _)) => {
                let content = self.take_inline();
                let rank = heading_rank(level);
                while matches!(
                    self.stack.last(),
                    Some(open) if matches!(open.container, Container::Heading(h) if h >= rank)
                ) {
                    self.close_top();
                }
                self.stack.push(Open {
                    container: Container::Heading(rank),
                    node: OutlineNode::leaf(content),
                });
            }

            // Lists themselves carry no content; nesting comes from items.
            // A tight item's text may still be buffered when its nested list
            // starts, so block openers flush first.
            Event::Start(Tag::List(_)) => self.flush_inline(),
            Event::End(Tag::List(_)) => {}
            Event::Start(Tag::Item) => {
                self.flush_inline();
                self.stack.push(Open {
                    container: Container::Item,
                    node: OutlineNode::leaf(String::new()),
                });
            }
            Event::End(Tag::Item) => {
                self.flush_inline();
                // Close containers opened inside the item (e.g. a heading in
                // a list item) before closing the item itself.
                while self.stack.len() > 1 && !self.top_is_item() {
                    self.close_top();
                }
                self.close_top();
            }

            Event::Start(Tag::Paragraph) => self.capturing = true,
            Event::End(Tag::Paragraph) => self.flush_inline(),

            Event::Start(Tag::CodeBlock(kind)) => {
                self.flush_inline();
                self.code = Some(match kind {
                    CodeBlockKind::Fenced(info) => {
                        info.split_whitespace().next().unwrap_or("").to_string()
                    }
                    CodeBlockKind::Indented => String::new(),
                });
            }

            e @ Event::Start(Tag::Table(_)) => {
                self.flush_inline();
                self.in_table = true;
                self.inline.push(e);
            }

            Event::TaskListMarker(checked) => {
                if let Some(open) = self.stack.last_mut() {
                    if matches!(open.container, Container::Item) {
                        open.node.payload = Some(json!({ "checked": checked }));
                    }
                }
                let marker = if checked { "☑ " } else { "☐ " };
                self.inline.push(Event::Text(marker.into()));
            }

            // Block quotes are transparent; their paragraphs become child
            // nodes of the enclosing container. Rules have no outline shape.
            Event::Start(Tag::BlockQuote) | Event::End(Tag::BlockQuote) => {}
            Event::Rule => {}
            Event::Start(Tag::FootnoteDefinition(_))
            | Event::End(Tag::FootnoteDefinition(_))
            | Event::FootnoteReference(_) => {}

            // Everything else is inline content (text, code spans, raw HTML,
            // emphasis/link/image delimiters, breaks) for the current block.
            other => {
                if self.capturing || self.top_is_item() {
                    self.inline.push(other);
                }
            }
        }
    }

    fn finish(mut self) -> OutlineNode {
        self.flush_inline();
        while self.stack.len() > 1 {
            self.close_top();
        }
        let mut root = match self.stack.pop() {
            Some(open) => open.node,
            None => OutlineNode::leaf(String::new()),
        };
        if root.content.is_empty() && root.children.len() == 1 {
            root = root.children.remove(0);
        }
        root
    }

    fn top_is_item(&self) -> bool {
        matches!(
            self.stack.last(),
            Some(open) if matches!(open.container, Container::Item)
        )
    }

    /// Pop the top container and attach its node to the new top.
    fn close_top(&mut self) {
        if self.stack.len() > 1 {
            if let Some(open) = self.stack.pop() {
                if let Some(parent) = self.stack.last_mut() {
                    parent.node.children.push(open.node);
                }
            }
        }
    }

    fn take_inline(&mut self) -> String {
        self.capturing = false;
        let html = render_events(std::mem::take(&mut self.inline));
        html.trim().to_string()
    }

    /// Render the buffered inline events and place the result: a list item's
    /// first text block becomes the item's own content, everything else a
    /// child node.
    fn flush_inline(&mut self) {
        let html = self.take_inline();
        if html.is_empty() {
            return;
        }
        if let Some(top) = self.stack.last_mut() {
            if matches!(top.container, Container::Item) && top.node.content.is_empty() {
                top.node.content = html;
                return;
            }
        }
        self.attach_child(OutlineNode::leaf(html));
    }

    fn attach_child(&mut self, node: OutlineNode) {
        if let Some(top) = self.stack.last_mut() {
            top.node.children.push(node);
        }
    }

    fn finish_code_block(&mut self) {
        let first_line = self
            .code_text
            .lines()
            .next()
            .unwrap_or("")
            .trim_end()
            .to_string();
        let lang = self.code.take().unwrap_or_default();
        self.code_text.clear();

        let mut node = OutlineNode::leaf(format!("<code>{}</code>", escape_html(&first_line)));
        if !lang.is_empty() {
            node.payload = Some(json!({ "lang": lang }));
        }
        self.attach_child(node);
    }
}

fn heading_rank(level: HeadingLevel) -> u32 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

fn render_events(events: Vec<Event>) -> String {
    let mut out = String::new();
    html::push_html(&mut out, events.into_iter());
    out
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}
