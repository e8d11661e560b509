use crate::controller::{Activation, Completion, LoadRequest, PaginationController, DEFAULT_PAGE_SIZE};
use crate::dom::Element;
use crate::fetcher::PageFetcher;
use crate::form::FormState;
use crate::history::{HistoryCacheBridge, PageShowEvent};
use crate::model::DisplayZone;
use crate::renderer::ListRenderer;

#[derive(Clone, Debug)]
pub struct PageOptions {
    pub page_size: u32,
    pub zone: DisplayZone,
    // where the build form posts to
    pub form_action: String,
    pub path: String,
    pub query: String,
}

impl Default for PageOptions {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            zone: DisplayZone::Local,
            form_action: "api/v1/builds".to_string(),
            path: "/".to_string(),
            query: String::new(),
        }
    }
}

/// The status page: one fetcher, one controller owning the build list, and
/// the request form around it.
pub struct StatusPage<F> {
    fetcher: F,
    controller: PaginationController,
    form: FormState,
    history: HistoryCacheBridge,
    form_action: String,
    path: String,
}

impl<F: PageFetcher> StatusPage<F> {
    pub fn new(fetcher: F, options: PageOptions) -> Self {
        Self {
            fetcher,
            controller: PaginationController::new(
                options.page_size,
                ListRenderer::new(options.zone),
            ),
            form: FormState::from_query(&options.query),
            history: HistoryCacheBridge,
            form_action: options.form_action,
            path: options.path,
        }
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    pub fn controller(&self) -> &PaginationController {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut PaginationController {
        &mut self.controller
    }

    pub fn form(&self) -> &FormState {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut FormState {
        &mut self.form
    }

    pub fn fetch_available(&self) -> bool {
        self.fetcher.is_available()
    }

    pub async fn load(&mut self, req: LoadRequest) -> Completion {
        let result = self.fetcher.fetch(req.cursor, req.cache_bust).await;
        self.controller.complete(req, result)
    }

    /// Initial population of the list once the page is ready.
    pub async fn start(&mut self) -> Option<Completion> {
        if !self.fetch_available() {
            tracing::debug!("fetch unavailable, build list stays empty");
            return None;
        }
        let req = self.controller.request_first_page();
        Some(self.load(req).await)
    }

    pub async fn activate(&mut self, activation: Activation) -> Option<Completion> {
        let req = self.controller.activate(activation)?;
        Some(self.load(req).await)
    }

    /// Reloads whatever cursor was last requested.
    pub async fn refresh(&mut self) -> Option<Completion> {
        if !self.fetch_available() {
            return None;
        }
        let req = self.controller.request_current();
        Some(self.load(req).await)
    }

    pub async fn page_show(&mut self, event: PageShowEvent) -> Option<Completion> {
        let available = self.fetch_available();
        let req = self
            .history
            .on_page_show(event, &mut self.controller, &mut self.form, available)?;
        Some(self.load(req).await)
    }

    pub fn submit(&mut self) {
        self.form.submit();
    }

    pub fn curl_command(&self) -> String {
        self.form.curl_command(&self.form_action)
    }

    pub fn location(&self) -> String {
        self.form.mirrored_location(&self.path)
    }

    pub fn document(&self) -> Element {
        let mut body = Element::new("body");

        let form = body.append(Element::new("form"));
        form.set_attr("id", "createForm");
        form.set_attr("method", "post");
        form.set_attr("action", &self.form_action);
        for (id, name, value) in [
            ("gitUrlBox", "gitUrl", &self.form.git_url),
            ("branchBox", "branch", &self.form.branch),
            ("buildParamBox", "buildParam", &self.form.param),
        ] {
            let input = form.append(Element::new("input"));
            input.set_attr("id", id);
            input.set_attr("name", name);
            input.set_attr("value", value);
        }
        let mut submit = self.form.submit_button().to_element();
        submit.set_attr("type", "submit");
        form.append(submit);

        let curl = body.append(Element::with_text("pre", &self.curl_command()));
        curl.set_attr("id", "curlCommand");

        body.append(self.controller.list().element().clone());
        body.append(self.controller.controls().to_element());
        body
    }
}
