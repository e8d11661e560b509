pub mod report;

use crate::dom::{Element, ListContainer, Node};
use crate::fetcher::PageFetcher;
use crate::model::BuildRecord;
use crate::page::StatusPage;
use crate::renderer::cancel_action;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
    Html,
}

impl OutputFormat {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "text" | "txt" => Some(Self::Text),
            "json" => Some(Self::Json),
            "html" | "htm" => Some(Self::Html),
            _ => None,
        }
    }
}

/// One line of plain text for a rendered list item. The cancel form is shown
/// as a marker rather than its button label.
pub fn item_line(item: &Element) -> String {
    let mut raw = String::new();
    for child in item.children() {
        match child {
            Node::Element(e) if e.tag() == "form" => {}
            other => raw.push_str(&other.text_content()),
        }
    }
    let mut line = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    if cancel_action(item).is_some() {
        line.push_str(" [cancellable]");
    }
    line
}

pub fn render_text(list: &ListContainer) -> Vec<u8> {
    let mut out = String::new();
    for item in list.items() {
        out.push_str(&item_line(item));
        out.push('\n');
    }
    out.into_bytes()
}

pub fn render_json(records: &[BuildRecord]) -> Vec<u8> {
    serde_json::to_vec_pretty(records).unwrap_or_else(|_| b"[]\n".to_vec())
}

pub fn render_html<F: PageFetcher>(page: &StatusPage<F>) -> Vec<u8> {
    report::render_html(&page.document())
}

pub fn render<F: PageFetcher>(format: OutputFormat, page: &StatusPage<F>) -> Vec<u8> {
    match format {
        OutputFormat::Text => render_text(page.controller().list()),
        OutputFormat::Json => render_json(page.controller().rendered()),
        OutputFormat::Html => render_html(page),
    }
}
