use std::collections::VecDeque;
use std::sync::Mutex;

use futures::future::BoxFuture;

use crate::controller::{Activation, Completion, LoadState, PaginationCursor};
use crate::fetcher::{decode_page, FetchError, PageFetcher};
use crate::history::PageShowEvent;
use crate::model::{BuildRecord, DisplayZone};
use crate::page::{PageOptions, StatusPage};

type Scripted = Result<Vec<BuildRecord>, FetchError>;

// hands out queued responses in order and remembers every cursor asked for
#[derive(Default)]
pub(crate) struct ScriptedFetcher {
    responses: Mutex<VecDeque<Scripted>>,
    requests: Mutex<Vec<PaginationCursor>>,
    unavailable: bool,
}

impl ScriptedFetcher {
    pub(crate) fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::default()
        }
    }

    pub(crate) fn respond(self, response: Scripted) -> Self {
        self.responses.lock().unwrap().push_back(response);
        self
    }

    pub(crate) fn respond_json(self, body: &str) -> Self {
        self.respond(decode_page("scripted", body.as_bytes()))
    }

    pub(crate) fn requests(&self) -> Vec<PaginationCursor> {
        self.requests.lock().unwrap().clone()
    }
}

impl PageFetcher for ScriptedFetcher {
    fn fetch(
        &self,
        cursor: PaginationCursor,
        _cache_bust: i64,
    ) -> BoxFuture<'_, Result<Vec<BuildRecord>, FetchError>> {
        self.requests.lock().unwrap().push(cursor);
        let response = self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| {
                Err(FetchError::NetworkError {
                    url: "scripted".to_string(),
                    message: "no scripted response left".to_string(),
                })
            });
        Box::pin(async move { response })
    }

    fn is_available(&self) -> bool {
        !self.unavailable
    }
}

fn options() -> PageOptions {
    PageOptions {
        zone: DisplayZone::Utc,
        ..PageOptions::default()
    }
}

fn builds_json(n: usize, prefix: &str) -> String {
    let items: Vec<String> = (0..n)
        .map(|i| {
            format!(
                r#"{{"id":"{prefix}{i}","gitUrl":"https://host/org/repo{i}","gitBranch":"master","queuedAt":"2024-01-01T00:00:00Z","status":"SUCCESS","logUrl":"/log/{prefix}{i}"}}"#
            )
        })
        .collect();
    format!(r#"{{"builds":[{}]}}"#, items.join(","))
}

const SINGLE_MASTER: &str = r#"{"builds":[{"id":"b1","gitUrl":"https://host/org/repo/","gitBranch":"master","queuedAt":"2024-01-01T00:00:00Z","status":"SUCCESS","logUrl":"/log/b1"}]}"#;
const SINGLE_FEATURE: &str = r#"{"builds":[{"id":"b1","gitUrl":"https://host/org/repo/","gitBranch":"feature-x","queuedAt":"2024-01-01T00:00:00Z","status":"SUCCESS","logUrl":"/log/b1"}]}"#;

#[tokio::test]
async fn single_master_build_renders_bare_repo_name() {
    let fetcher = ScriptedFetcher::default().respond_json(SINGLE_MASTER);
    let mut page = StatusPage::new(fetcher, options());

    assert_eq!(page.start().await, Some(Completion::Rendered { count: 1 }));

    let list = page.controller().list();
    assert_eq!(list.ids(), vec!["b1"]);
    let li = list.find_by_id("b1").unwrap();
    assert_eq!(li.find_tag("span").unwrap().text_content().trim(), "repo");
    assert_eq!(li.find_tag("strong").unwrap().text_content(), "SUCCESS");
    assert!(li.find_tag("code").is_none());
    assert!(li.find_tag("form").is_none());
    assert!(!page.controller().older_control().is_visible());
    assert!(!page.controller().controls().group_visible);
    assert_eq!(page.fetcher().requests(), vec![PaginationCursor::new(10, 0)]);
}

#[tokio::test]
async fn feature_branch_is_shown_next_to_repo() {
    let fetcher = ScriptedFetcher::default().respond_json(SINGLE_FEATURE);
    let mut page = StatusPage::new(fetcher, options());
    page.start().await;
    let li = page.controller().list().find_by_id("b1").unwrap();
    assert_eq!(
        li.find_tag("span").unwrap().text_content().trim(),
        "repo (feature-x)"
    );
}

#[tokio::test]
async fn rendered_items_match_fetch_for_various_cursors() {
    for (limit, skip, len) in [(10u32, 0u32, 10usize), (5, 10, 3), (3, 3, 0), (1, 7, 1)] {
        let fetcher = ScriptedFetcher::default().respond_json(&builds_json(len, "x"));
        let mut page = StatusPage::new(
            fetcher,
            PageOptions {
                page_size: limit,
                ..options()
            },
        );
        let req = page
            .controller_mut()
            .request(PaginationCursor::new(limit, skip));
        page.load(req).await;

        let expected: Vec<String> = (0..len).map(|i| format!("x{i}")).collect();
        assert_eq!(page.controller().list().ids(), expected);
        assert_eq!(
            page.controller().older_control().is_visible(),
            len == limit as usize
        );
        assert_eq!(page.controller().newer_control().is_visible(), skip > 0);
    }
}

#[tokio::test]
async fn server_error_keeps_previous_list() {
    let fetcher = ScriptedFetcher::default()
        .respond_json(&builds_json(10, "a"))
        .respond(Err(FetchError::BadStatus {
            code: 500,
            url: "http://h/api/v1/builds".to_string(),
        }));
    let mut page = StatusPage::new(fetcher, options());
    page.start().await;
    let before = page.controller().list().to_html();

    let outcome = page.activate(Activation::Older).await;
    assert!(matches!(
        outcome,
        Some(Completion::Failed(FetchError::BadStatus { code: 500, .. }))
    ));
    assert_eq!(page.controller().list().to_html(), before);
    assert_eq!(page.controller().state(), LoadState::Error);
    assert!(page.controller().older_control().is_active());
}

#[tokio::test]
async fn parse_failure_is_handled_like_other_errors() {
    let fetcher = ScriptedFetcher::default().respond_json("not json");
    let mut page = StatusPage::new(fetcher, options());
    let outcome = page.start().await;
    assert!(matches!(
        outcome,
        Some(Completion::Failed(FetchError::ParseError { .. }))
    ));
    assert!(page.controller().list().is_empty());
}

#[tokio::test]
async fn paging_older_then_newer() {
    let fetcher = ScriptedFetcher::default()
        .respond_json(&builds_json(10, "p1-"))
        .respond_json(&builds_json(4, "p2-"))
        .respond_json(&builds_json(10, "p1-"));
    let mut page = StatusPage::new(fetcher, options());
    page.start().await;

    page.activate(Activation::Older).await;
    assert_eq!(page.controller().list().len(), 4);
    assert!(!page.controller().older_control().is_visible());
    assert!(page.controller().newer_control().is_active());

    page.activate(Activation::Newer).await;
    assert_eq!(page.controller().list().ids()[0], "p1-0");
    assert_eq!(
        page.fetcher().requests(),
        vec![
            PaginationCursor::new(10, 0),
            PaginationCursor::new(10, 10),
            PaginationCursor::new(10, 0),
        ]
    );
}

#[tokio::test]
async fn history_restore_resets_to_first_page() {
    let fetcher = ScriptedFetcher::default()
        .respond_json(&builds_json(10, "deep"))
        .respond_json(&builds_json(10, "top"));
    let mut page = StatusPage::new(fetcher, options());
    let req = page.controller_mut().request(PaginationCursor::new(10, 20));
    page.load(req).await;
    page.submit();
    assert!(page.form().submit_button().is_disabled());

    let outcome = page.page_show(PageShowEvent { persisted: true }).await;
    assert_eq!(outcome, Some(Completion::Rendered { count: 10 }));
    assert_eq!(page.controller().cursor(), PaginationCursor::new(10, 0));
    assert_eq!(page.controller().list().ids()[0], "top0");
    assert!(!page.form().submit_button().is_disabled());
    assert_eq!(
        page.fetcher().requests(),
        vec![PaginationCursor::new(10, 20), PaginationCursor::new(10, 0)]
    );
}

#[tokio::test]
async fn history_restore_clears_list_even_if_reload_fails() {
    let fetcher = ScriptedFetcher::default()
        .respond_json(&builds_json(10, "deep"))
        .respond(Err(FetchError::NetworkError {
            url: "u".to_string(),
            message: "offline".to_string(),
        }));
    let mut page = StatusPage::new(fetcher, options());
    let req = page.controller_mut().request(PaginationCursor::new(10, 20));
    page.load(req).await;

    page.page_show(PageShowEvent { persisted: true }).await;
    assert!(page.controller().list().is_empty());
}

#[tokio::test]
async fn later_request_wins_regardless_of_completion_order() {
    let fetcher = ScriptedFetcher::default()
        .respond_json(&builds_json(10, "first"))
        .respond_json(&builds_json(10, "second"));
    let mut page = StatusPage::new(fetcher, options());

    let first = page.controller_mut().request(PaginationCursor::new(10, 0));
    let second = page.controller_mut().request(PaginationCursor::new(10, 10));
    let (first_result, second_result) = {
        let f = page.fetcher();
        tokio::join!(
            f.fetch(first.cursor, first.cache_bust),
            f.fetch(second.cursor, second.cache_bust)
        )
    };

    let c = page.controller_mut();
    assert_eq!(
        c.complete(second, second_result),
        Completion::Rendered { count: 10 }
    );
    assert_eq!(c.complete(first, first_result), Completion::Stale);
    assert_eq!(c.list().ids()[0], "second0");
    assert_eq!(c.displayed_cursor(), Some(PaginationCursor::new(10, 10)));
}

#[tokio::test]
async fn refresh_reuses_current_cursor() {
    let fetcher = ScriptedFetcher::default()
        .respond_json(&builds_json(10, "a"))
        .respond_json(&builds_json(10, "b"))
        .respond_json(&builds_json(10, "c"));
    let mut page = StatusPage::new(fetcher, options());
    page.start().await;
    page.activate(Activation::Older).await;
    page.refresh().await;
    assert_eq!(page.controller().list().ids()[0], "c0");
    assert_eq!(
        page.fetcher().requests()[2],
        PaginationCursor::new(10, 10)
    );
}

#[tokio::test]
async fn paging_after_failed_older_steps_from_page_on_screen() {
    let fetcher = ScriptedFetcher::default()
        .respond_json(&builds_json(10, "mid"))
        .respond(Err(FetchError::BadStatus {
            code: 500,
            url: "http://h/api/v1/builds".to_string(),
        }))
        .respond(Err(FetchError::BadStatus {
            code: 500,
            url: "http://h/api/v1/builds".to_string(),
        }))
        .respond_json(&builds_json(10, "top"));
    let mut page = StatusPage::new(fetcher, options());
    let req = page.controller_mut().request(PaginationCursor::new(10, 10));
    page.load(req).await;

    page.activate(Activation::Older).await;
    page.activate(Activation::Older).await;
    page.activate(Activation::Newer).await;

    assert_eq!(
        page.fetcher().requests(),
        vec![
            PaginationCursor::new(10, 10),
            PaginationCursor::new(10, 20),
            PaginationCursor::new(10, 20),
            PaginationCursor::new(10, 0),
        ]
    );
    assert_eq!(page.controller().list().ids()[0], "top0");
    assert_eq!(page.controller().displayed_cursor(), Some(PaginationCursor::first(10)));
}
