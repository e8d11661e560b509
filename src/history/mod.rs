use crate::controller::{LoadRequest, PaginationController};
use crate::form::FormState;

/// A `pageshow` notification. `persisted` is set when the page instance was
/// resumed from the back/forward cache instead of being loaded fresh.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageShowEvent {
    pub persisted: bool,
}

/// Re-synchronises a page that was restored from the history cache: the list
/// on screen and the disabled submit button both predate the navigation.
#[derive(Clone, Copy, Debug, Default)]
pub struct HistoryCacheBridge;

impl HistoryCacheBridge {
    pub fn on_page_show(
        &self,
        event: PageShowEvent,
        controller: &mut PaginationController,
        form: &mut FormState,
        fetch_available: bool,
    ) -> Option<LoadRequest> {
        if !event.persisted {
            return None;
        }
        form.submit_button_mut().set_disabled(false);
        if !fetch_available {
            return None;
        }
        tracing::debug!(
            skip = controller.cursor().skip,
            "page restored from history cache, reloading first page"
        );
        controller.clear();
        Some(controller.request_first_page())
    }
}
