use crate::dom::{Element, ListContainer, ID_ATTRIBUTE};
use crate::model::{BuildRecord, DisplayZone};

/// Turns a fetched page into list items. The container is replaced wholesale
/// on every call so repeated renders never accumulate stale entries.
#[derive(Clone, Copy, Debug, Default)]
pub struct ListRenderer {
    zone: DisplayZone,
}

impl ListRenderer {
    pub fn new(zone: DisplayZone) -> Self {
        Self { zone }
    }

    pub fn render(&self, records: &[BuildRecord], container: &mut ListContainer) {
        container.clear();
        for record in records {
            container.append(self.render_item(record));
        }
    }

    pub fn render_item(&self, b: &BuildRecord) -> Element {
        let mut li = Element::new("li");
        li.set_attr(ID_ATTRIBUTE, &b.id);

        let a = li.append(Element::with_text("a", &b.queued_at_display(self.zone)));
        a.set_attr("href", &b.log_url);

        li.append(Element::with_text("span", &format!(" {} ", b.friendly_name())));
        li.append(Element::with_text("strong", &b.status));

        let tags = b.tags();
        if !tags.is_empty() {
            li.append_text(" - created tags ");
            for tag in tags {
                li.append(Element::with_text("code", tag));
                li.append_text(" ");
            }
        }

        if let Some(cancel_url) = b.cancel_url.as_deref() {
            let form = li.append(Element::new("form"));
            form.set_attr("method", "post");
            form.set_attr("action", cancel_url);
            form.append(Element::with_text("button", "Cancel"));
        }

        li
    }
}

/// Reads the cancel action back out of a rendered item.
pub fn cancel_action(item: &Element) -> Option<&str> {
    item.find_tag("form").and_then(|f| f.attr("action"))
}
