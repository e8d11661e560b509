use std::time::Duration;

use futures::future::BoxFuture;
use thiserror::Error;

use crate::controller::PaginationCursor;
use crate::model::{BuildPage, BuildRecord};

pub const BUILDS_PATH: &str = "api/v1/builds";

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("request to {url} did not complete: {message}")]
    NetworkError { url: String, message: String },

    #[error("got {code} from {url}")]
    BadStatus { code: u16, url: String },

    #[error("could not decode response from {url}: {message}")]
    ParseError { url: String, message: String },
}

#[derive(Debug, Error)]
pub enum SetupError {
    #[error("invalid base URL '{url}': {message}")]
    InvalidBaseUrl { url: String, message: String },

    #[error("failed to build HTTP client: {source}")]
    HttpClientBuild {
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to setup proxy: {proxy}: {source}")]
    ProxySetup {
        proxy: String,
        #[source]
        source: reqwest::Error,
    },
}

/// Source of build pages. Implementations do one request per call and never
/// retry.
pub trait PageFetcher {
    fn fetch(
        &self,
        cursor: PaginationCursor,
        cache_bust: i64,
    ) -> BoxFuture<'_, Result<Vec<BuildRecord>, FetchError>>;

    /// Whether fetching is possible at all in this environment.
    fn is_available(&self) -> bool {
        true
    }
}

pub fn decode_page(url: &str, body: &[u8]) -> Result<Vec<BuildRecord>, FetchError> {
    serde_json::from_slice::<BuildPage>(body)
        .map(|page| page.builds)
        .map_err(|e| FetchError::ParseError {
            url: url.to_string(),
            message: e.to_string(),
        })
}

#[derive(Clone, Debug)]
pub struct ClientOptions {
    pub timeout_seconds: usize,
    pub proxy: Option<String>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout_seconds: 10,
            proxy: None,
        }
    }
}

/// Talks to a restabuild server over HTTP.
#[derive(Clone, Debug)]
pub struct BuildsApi {
    client: reqwest::Client,
    base: reqwest::Url,
}

impl BuildsApi {
    pub fn new(base_url: &str, options: &ClientOptions) -> Result<Self, SetupError> {
        let base = parse_base_url(base_url)?;
        let client = build_client(options.proxy.as_deref(), options.timeout_seconds)?;
        Ok(Self { client, base })
    }

    pub fn base(&self) -> &reqwest::Url {
        &self.base
    }

    pub fn builds_url(&self, cursor: PaginationCursor, cache_bust: i64) -> String {
        builds_url(&self.base, cursor, cache_bust)
    }

    /// The form action builds are submitted to.
    pub fn submit_url(&self) -> String {
        self.base
            .join(BUILDS_PATH)
            .map(|u| u.to_string())
            .unwrap_or_else(|_| format!("{}{}", self.base, BUILDS_PATH))
    }

    pub async fn get_page(
        &self,
        cursor: PaginationCursor,
        cache_bust: i64,
    ) -> Result<Vec<BuildRecord>, FetchError> {
        let url = self.builds_url(cursor, cache_bust);
        tracing::debug!(%url, "fetching builds");
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| FetchError::NetworkError {
                url: url.clone(),
                message: e.to_string(),
            })?;
        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::BadStatus {
                code: status.as_u16(),
                url,
            });
        }
        let body = resp.bytes().await.map_err(|e| FetchError::NetworkError {
            url: url.clone(),
            message: e.to_string(),
        })?;
        let builds = decode_page(&url, &body)?;
        tracing::debug!(%url, count = builds.len(), "fetched builds");
        Ok(builds)
    }

    /// Submits a cancel form: `POST <cancel_url>` with no body.
    pub async fn cancel(&self, cancel_url: &str) -> Result<(), FetchError> {
        let url = self
            .base
            .join(cancel_url)
            .map(|u| u.to_string())
            .unwrap_or_else(|_| cancel_url.to_string());
        tracing::debug!(%url, "cancelling build");
        let resp = self
            .client
            .post(&url)
            .send()
            .await
            .map_err(|e| FetchError::NetworkError {
                url: url.clone(),
                message: e.to_string(),
            })?;
        let status = resp.status();
        // the server answers a form post with a redirect to the build
        if !(status.is_success() || status.is_redirection()) {
            return Err(FetchError::BadStatus {
                code: status.as_u16(),
                url,
            });
        }
        Ok(())
    }
}

impl PageFetcher for BuildsApi {
    fn fetch(
        &self,
        cursor: PaginationCursor,
        cache_bust: i64,
    ) -> BoxFuture<'_, Result<Vec<BuildRecord>, FetchError>> {
        Box::pin(self.get_page(cursor, cache_bust))
    }
}

pub fn parse_base_url(raw: &str) -> Result<reqwest::Url, SetupError> {
    let trimmed = raw.trim();
    let mut base = reqwest::Url::parse(trimmed).map_err(|e| SetupError::InvalidBaseUrl {
        url: trimmed.to_string(),
        message: e.to_string(),
    })?;
    if base.scheme() != "http" && base.scheme() != "https" {
        return Err(SetupError::InvalidBaseUrl {
            url: trimmed.to_string(),
            message: "expected an http or https URL".to_string(),
        });
    }
    // relative joins replace the last segment unless the path ends with a slash
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base.set_query(None);
    base.set_fragment(None);
    Ok(base)
}

pub fn builds_url(base: &reqwest::Url, cursor: PaginationCursor, cache_bust: i64) -> String {
    format!(
        "{}{}?limit={}&skip={}&timestamp={}",
        base, BUILDS_PATH, cursor.limit, cursor.skip, cache_bust
    )
}

fn build_client(proxy: Option<&str>, timeout_seconds: usize) -> Result<reqwest::Client, SetupError> {
    let mut headers = reqwest::header::HeaderMap::new();
    headers.insert(
        reqwest::header::ACCEPT,
        reqwest::header::HeaderValue::from_static("application/json"),
    );

    let timeout = Duration::from_secs(timeout_seconds.try_into().unwrap_or(10));
    let mut builder = reqwest::Client::builder()
        .default_headers(headers)
        .user_agent(concat!("restabuild-status/", env!("CARGO_PKG_VERSION")))
        .redirect(reqwest::redirect::Policy::none())
        .timeout(timeout);

    if let Some(proxy) = proxy.filter(|p| !p.trim().is_empty()) {
        let proxy = reqwest::Proxy::all(proxy).map_err(|e| SetupError::ProxySetup {
            proxy: proxy.to_string(),
            source: e,
        })?;
        builder = builder.proxy(proxy);
    }

    builder
        .build()
        .map_err(|e| SetupError::HttpClientBuild { source: e })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_gains_trailing_slash() {
        let base = parse_base_url("http://localhost:8080/restabuild").unwrap();
        assert_eq!(base.as_str(), "http://localhost:8080/restabuild/");
        let url = builds_url(&base, PaginationCursor::new(10, 20), 1700000000000);
        assert_eq!(
            url,
            "http://localhost:8080/restabuild/api/v1/builds?limit=10&skip=20&timestamp=1700000000000"
        );
    }

    #[test]
    fn base_url_rejects_other_schemes() {
        assert!(parse_base_url("ftp://host/").is_err());
        assert!(parse_base_url("not a url").is_err());
    }

    #[test]
    fn decode_page_classifies_bad_bodies_as_parse_errors() {
        let err = decode_page("u", b"<html>oops</html>").unwrap_err();
        assert!(matches!(err, FetchError::ParseError { .. }));
        let err = decode_page("u", br#"{"items": []}"#).unwrap_err();
        assert!(matches!(err, FetchError::ParseError { .. }));
    }

    #[test]
    fn decode_page_keeps_server_order() {
        let body = br#"{"builds": [
            {"id":"b2","gitUrl":"u","gitBranch":"master","queuedAt":"2024-01-02T00:00:00Z","status":"QUEUED","logUrl":"/l/2"},
            {"id":"b1","gitUrl":"u","gitBranch":"master","queuedAt":"2024-01-01T00:00:00Z","status":"SUCCESS","logUrl":"/l/1","tagsCreated":["v1"]}
        ]}"#;
        let builds = decode_page("u", body).unwrap();
        let ids: Vec<_> = builds.iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids, vec!["b2", "b1"]);
        assert_eq!(builds[1].tags(), ["v1".to_string()]);
    }

    #[test]
    fn bad_status_message_names_code_and_url() {
        let err = FetchError::BadStatus {
            code: 500,
            url: "http://h/api/v1/builds".to_string(),
        };
        assert_eq!(err.to_string(), "got 500 from http://h/api/v1/builds");
    }

    #[test]
    fn submit_url_is_relative_to_base() {
        let api = BuildsApi::new("http://localhost:8080", &ClientOptions::default()).unwrap();
        assert_eq!(api.submit_url(), "http://localhost:8080/api/v1/builds");
    }

    // answers one connection with a canned response and hands back the request head
    async fn serve_once(response: &'static str) -> (String, tokio::task::JoinHandle<String>) {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut head = Vec::new();
            let mut buf = [0u8; 1024];
            while !head.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                head.extend_from_slice(&buf[..n]);
            }
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
            String::from_utf8_lossy(&head).into_owned()
        });
        (format!("http://{addr}/"), handle)
    }

    fn local_api(base: &str) -> BuildsApi {
        let client = reqwest::Client::builder()
            .no_proxy()
            .redirect(reqwest::redirect::Policy::none())
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap();
        BuildsApi {
            client,
            base: parse_base_url(base).unwrap(),
        }
    }

    #[tokio::test]
    async fn cancel_treats_redirect_as_success() {
        let (base, server) = serve_once(
            "HTTP/1.1 302 Found\r\nLocation: /build/b1\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
        )
        .await;
        let api = local_api(&base);
        assert_eq!(api.cancel("api/v1/builds/b1/cancel").await, Ok(()));
        let head = server.await.unwrap();
        assert!(head.starts_with("POST /api/v1/builds/b1/cancel "), "{head}");
    }

    #[tokio::test]
    async fn cancel_maps_server_error_to_bad_status() {
        let (base, server) = serve_once(
            "HTTP/1.1 500 Internal Server Error\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
        )
        .await;
        let api = local_api(&base);
        let err = api.cancel("api/v1/builds/b1/cancel").await.unwrap_err();
        assert_eq!(
            err,
            FetchError::BadStatus {
                code: 500,
                url: format!("{base}api/v1/builds/b1/cancel"),
            }
        );
        server.await.unwrap();
    }

    #[tokio::test]
    async fn get_page_maps_server_error_to_bad_status() {
        let (base, server) = serve_once(
            "HTTP/1.1 500 Internal Server Error\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
        )
        .await;
        let api = local_api(&base);
        let err = api
            .get_page(PaginationCursor::new(10, 0), 1)
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::BadStatus { code: 500, .. }), "{err:?}");
        let head = server.await.unwrap();
        assert!(
            head.starts_with("GET /api/v1/builds?limit=10&skip=0&timestamp=1 "),
            "{head}"
        );
    }

    #[tokio::test]
    async fn get_page_decodes_a_successful_body() {
        let (base, server) = serve_once(
            "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: 13\r\nConnection: close\r\n\r\n{\"builds\":[]}",
        )
        .await;
        let api = local_api(&base);
        let builds = api.get_page(PaginationCursor::new(5, 5), 2).await.unwrap();
        assert!(builds.is_empty());
        server.await.unwrap();
    }

    #[tokio::test]
    async fn refused_connection_is_a_network_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let api = local_api(&format!("http://{addr}/"));

        let err = api.cancel("api/v1/builds/b1/cancel").await.unwrap_err();
        assert!(matches!(err, FetchError::NetworkError { .. }), "{err:?}");
        let err = api
            .get_page(PaginationCursor::new(10, 0), 1)
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::NetworkError { .. }), "{err:?}");
    }
}
