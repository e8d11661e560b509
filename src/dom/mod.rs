//! A small element tree standing in for the status page document.
//!
//! The page exposes a handful of anchors (the build list, the pagination
//! buttons and their container, the submit button). Each anchor is a distinct
//! value owned by whoever is allowed to mutate it; there is no global lookup.

pub const ID_ATTRIBUTE: &str = "rb-id";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
}

impl Node {
    pub fn text_content(&self) -> String {
        match self {
            Node::Element(e) => e.text_content(),
            Node::Text(t) => t.clone(),
        }
    }

    fn write_html(&self, out: &mut String) {
        match self {
            Node::Element(e) => e.write_html(out),
            Node::Text(t) => out.push_str(&escape_html(t)),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Element {
    tag: String,
    attributes: Vec<(String, String)>,
    children: Vec<Node>,
}

impl Element {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    // mirrors the `el(tag, content)` helper pattern: an element with a text child
    pub fn with_text(tag: &str, text: &str) -> Self {
        let mut e = Self::new(tag);
        if !text.is_empty() {
            e.append_text(text);
        }
        e
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn set_attr(&mut self, name: &str, value: &str) {
        match self.attributes.iter_mut().find(|(k, _)| k == name) {
            Some((_, v)) => *v = value.to_string(),
            None => self
                .attributes
                .push((name.to_string(), value.to_string())),
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn append(&mut self, child: Element) -> &mut Element {
        self.children.push(Node::Element(child));
        match self.children.last_mut() {
            Some(Node::Element(e)) => e,
            _ => unreachable!("just pushed an element"),
        }
    }

    pub fn append_text(&mut self, text: &str) {
        self.children.push(Node::Text(text.to_string()));
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|n| match n {
            Node::Element(e) => Some(e),
            Node::Text(_) => None,
        })
    }

    /// First descendant (depth first, self excluded) with the given tag.
    pub fn find_tag(&self, tag: &str) -> Option<&Element> {
        for child in self.child_elements() {
            if child.tag == tag {
                return Some(child);
            }
            if let Some(found) = child.find_tag(tag) {
                return Some(found);
            }
        }
        None
    }

    pub fn clear(&mut self) {
        self.children.clear();
    }

    pub fn text_content(&self) -> String {
        self.children.iter().map(Node::text_content).collect()
    }

    pub fn to_html(&self) -> String {
        let mut out = String::new();
        self.write_html(&mut out);
        out
    }

    fn write_html(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.tag);
        for (k, v) in &self.attributes {
            out.push(' ');
            out.push_str(k);
            out.push_str("=\"");
            out.push_str(&escape_html(v));
            out.push('"');
        }
        out.push('>');
        for child in &self.children {
            child.write_html(out);
        }
        out.push_str("</");
        out.push_str(&self.tag);
        out.push('>');
    }
}

pub fn escape_html(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// The `#recentBuilds` list. Deliberately not `Clone`: exactly one owner may
/// mutate the rendered items.
#[derive(Debug)]
pub struct ListContainer {
    root: Element,
}

impl ListContainer {
    pub fn new(id: &str) -> Self {
        let mut root = Element::new("ul");
        root.set_attr("id", id);
        Self { root }
    }

    pub(crate) fn clear(&mut self) {
        self.root.clear();
    }

    pub(crate) fn append(&mut self, item: Element) -> &mut Element {
        self.root.append(item)
    }

    pub fn items(&self) -> impl Iterator<Item = &Element> {
        self.root.child_elements()
    }

    pub fn len(&self) -> usize {
        self.root.children().len()
    }

    pub fn is_empty(&self) -> bool {
        self.root.children().is_empty()
    }

    pub fn ids(&self) -> Vec<&str> {
        self.items().filter_map(|li| li.attr(ID_ATTRIBUTE)).collect()
    }

    pub fn find_by_id(&self, id: &str) -> Option<&Element> {
        self.items().find(|li| li.attr(ID_ATTRIBUTE) == Some(id))
    }

    pub fn element(&self) -> &Element {
        &self.root
    }

    pub fn to_html(&self) -> String {
        self.root.to_html()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Control {
    id: String,
    label: String,
    visible: bool,
    disabled: bool,
}

impl Control {
    pub fn new(id: &str, label: &str) -> Self {
        Self {
            id: id.to_string(),
            label: label.to_string(),
            visible: true,
            disabled: false,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    /// Visible and enabled.
    pub fn is_active(&self) -> bool {
        self.visible && !self.disabled
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    pub fn set_disabled(&mut self, disabled: bool) {
        self.disabled = disabled;
    }

    pub fn to_element(&self) -> Element {
        let mut e = Element::with_text("button", &self.label);
        e.set_attr("id", &self.id);
        e.set_attr("type", "button");
        if self.disabled {
            e.set_attr("disabled", "disabled");
        }
        if !self.visible {
            e.set_attr("style", "display: none");
        }
        e
    }
}

/// The `.historyButtons` group holding the older/newer controls.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PaginationControls {
    pub group_visible: bool,
    pub older: Control,
    pub newer: Control,
}

impl Default for PaginationControls {
    fn default() -> Self {
        let mut older = Control::new("olderBuildsButton", "Older builds");
        let mut newer = Control::new("newerBuildsButton", "Newer builds");
        older.set_visible(false);
        newer.set_visible(false);
        Self {
            group_visible: false,
            older,
            newer,
        }
    }
}

impl PaginationControls {
    pub fn set_disabled(&mut self, disabled: bool) {
        self.older.set_disabled(disabled);
        self.newer.set_disabled(disabled);
    }

    pub fn to_element(&self) -> Element {
        let mut group = Element::new("div");
        group.set_attr("class", "historyButtons");
        if !self.group_visible {
            group.set_attr("style", "display: none");
        }
        group.append(self.newer.to_element());
        group.append(self.older.to_element());
        group
    }
}
