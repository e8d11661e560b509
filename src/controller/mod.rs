//! Pagination state machine for the build list.
//!
//! Loads are split into two synchronous steps: [`PaginationController::request`]
//! issues a [`LoadRequest`] and [`PaginationController::complete`] applies its
//! outcome. Whatever performs the fetch in between is up to the caller, so
//! several requests may be in flight at once. Only the most recently issued
//! request is allowed to touch the list; older completions are discarded.

use crate::dom::{Control, ListContainer, PaginationControls};
use crate::fetcher::FetchError;
use crate::model::BuildRecord;
use crate::renderer::ListRenderer;

pub const DEFAULT_PAGE_SIZE: u32 = 10;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PaginationCursor {
    pub limit: u32,
    pub skip: u32,
}

impl PaginationCursor {
    pub fn new(limit: u32, skip: u32) -> Self {
        Self {
            limit: limit.max(1),
            skip,
        }
    }

    pub fn first(limit: u32) -> Self {
        Self::new(limit, 0)
    }

    pub fn older(self) -> Self {
        Self::new(self.limit, self.skip.saturating_add(self.limit))
    }

    pub fn newer(self) -> Self {
        Self::new(self.limit, self.skip.saturating_sub(self.limit))
    }

    pub fn reset(self) -> Self {
        Self::first(self.limit)
    }
}

impl Default for PaginationCursor {
    fn default() -> Self {
        Self::first(DEFAULT_PAGE_SIZE)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoadState {
    Idle,
    Loading,
    Error,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoadEvent {
    Requested,
    Succeeded,
    Failed,
}

impl LoadState {
    pub fn next(self, event: LoadEvent) -> LoadState {
        match (self, event) {
            (_, LoadEvent::Requested) => LoadState::Loading,
            (LoadState::Loading, LoadEvent::Succeeded) => LoadState::Idle,
            (LoadState::Loading, LoadEvent::Failed) => LoadState::Error,
            // a completion only counts while its request is the pending one
            (state, _) => state,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LoadRequest {
    pub seq: u64,
    pub cursor: PaginationCursor,
    pub cache_bust: i64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Completion {
    Rendered { count: usize },
    Failed(FetchError),
    Stale,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Activation {
    Older,
    Newer,
}

#[derive(Debug)]
pub struct PaginationController {
    page_size: u32,
    cursor: PaginationCursor,
    displayed: Option<PaginationCursor>,
    state: LoadState,
    issued: u64,
    last_cache_bust: i64,
    renderer: ListRenderer,
    list: ListContainer,
    controls: PaginationControls,
    rendered: Vec<BuildRecord>,
}

impl PaginationController {
    pub fn new(page_size: u32, renderer: ListRenderer) -> Self {
        let cursor = PaginationCursor::first(page_size);
        Self {
            page_size: cursor.limit,
            cursor,
            displayed: None,
            state: LoadState::Idle,
            issued: 0,
            last_cache_bust: 0,
            renderer,
            list: ListContainer::new("recentBuilds"),
            controls: PaginationControls::default(),
            rendered: Vec::new(),
        }
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// The cursor of the most recently issued request.
    pub fn cursor(&self) -> PaginationCursor {
        self.cursor
    }

    /// The cursor whose page is currently on screen.
    pub fn displayed_cursor(&self) -> Option<PaginationCursor> {
        self.displayed
    }

    pub fn state(&self) -> LoadState {
        self.state
    }

    pub fn list(&self) -> &ListContainer {
        &self.list
    }

    pub fn controls(&self) -> &PaginationControls {
        &self.controls
    }

    pub fn rendered(&self) -> &[BuildRecord] {
        &self.rendered
    }

    pub fn older_control(&self) -> &Control {
        &self.controls.older
    }

    pub fn newer_control(&self) -> &Control {
        &self.controls.newer
    }

    pub fn request(&mut self, cursor: PaginationCursor) -> LoadRequest {
        let cursor = PaginationCursor::new(self.page_size, cursor.skip);
        self.issued += 1;
        self.cursor = cursor;
        self.state = self.state.next(LoadEvent::Requested);
        self.controls.set_disabled(true);
        let req = LoadRequest {
            seq: self.issued,
            cursor,
            cache_bust: self.next_cache_bust(),
        };
        tracing::debug!(
            seq = req.seq,
            limit = cursor.limit,
            skip = cursor.skip,
            "load requested"
        );
        req
    }

    pub fn request_first_page(&mut self) -> LoadRequest {
        self.request(PaginationCursor::first(self.page_size))
    }

    pub fn request_current(&mut self) -> LoadRequest {
        self.request(self.cursor)
    }

    /// Activating a control only issues a request when the control is both
    /// visible and enabled; controls are disabled while a load is pending.
    pub fn activate(&mut self, activation: Activation) -> Option<LoadRequest> {
        // step from the page on screen, not from a request that may have failed
        let base = self.displayed.unwrap_or(self.cursor);
        let (control, cursor) = match activation {
            Activation::Older => (&self.controls.older, base.older()),
            Activation::Newer => (&self.controls.newer, base.newer()),
        };
        if !control.is_active() {
            tracing::debug!(?activation, "ignoring inactive pagination control");
            return None;
        }
        Some(self.request(cursor))
    }

    pub fn is_current(&self, req: &LoadRequest) -> bool {
        req.seq == self.issued
    }

    pub fn complete(
        &mut self,
        req: LoadRequest,
        result: Result<Vec<BuildRecord>, FetchError>,
    ) -> Completion {
        if !self.is_current(&req) {
            tracing::debug!(
                seq = req.seq,
                latest = self.issued,
                "discarding stale load completion"
            );
            return Completion::Stale;
        }
        self.controls.set_disabled(false);

        match result {
            Ok(records) => {
                self.renderer.render(&records, &mut self.list);
                self.update_visibility(req.cursor, records.len());
                self.displayed = Some(req.cursor);
                self.state = self.state.next(LoadEvent::Succeeded);
                let count = records.len();
                self.rendered = records;
                Completion::Rendered { count }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Error looking up builds");
                self.state = self.state.next(LoadEvent::Failed);
                Completion::Failed(e)
            }
        }
    }

    /// Empties the list and forgets what was displayed. Used when a page is
    /// restored from the history cache with stale content.
    pub fn clear(&mut self) {
        self.renderer.render(&[], &mut self.list);
        self.rendered.clear();
        self.displayed = None;
    }

    fn update_visibility(&mut self, cursor: PaginationCursor, count: usize) {
        let has_older = count == cursor.limit as usize;
        let has_newer = cursor.skip > 0;
        self.controls.older.set_visible(has_older);
        self.controls.newer.set_visible(has_newer);
        self.controls.group_visible = has_older || has_newer;
    }

    fn next_cache_bust(&mut self) -> i64 {
        let now = chrono::Utc::now().timestamp_millis();
        self.last_cache_bust = now.max(self.last_cache_bust + 1);
        self.last_cache_bust
    }
}
