use std::time::Duration;

use async_trait::async_trait;
use dom_query::Document;
use reqwest::header::{ACCEPT, USER_AGENT};
use url::Url;

const MAX_BODY_BYTES: usize = 8 * 1024 * 1024;
const USER_AGENT_VALUE: &str = "chapterbook/0.1";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOptions {
    /// CSS selector that must be present before the page counts as loaded.
    pub wait_for: Option<String>,
    /// Time a rendering fetcher lets scripts settle before returning HTML.
    pub settle_delay: Duration,
}

impl FetchOptions {
    pub fn landing() -> Self {
        Self {
            wait_for: Some("body".to_owned()),
            settle_delay: Duration::from_millis(2000),
        }
    }

    pub fn chapter() -> Self {
        Self {
            wait_for: Some("body".to_owned()),
            settle_delay: Duration::from_millis(1500),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedPage {
    pub success: bool,
    pub html: String,
    pub markdown: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("build http client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("GET {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("read response body from {url}: {source}")]
    Body {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{0}")]
    Other(String),
}

/// Retrieves rendered HTML for a URL.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &Url, options: &FetchOptions) -> Result<FetchedPage, FetchError>;
}

/// Plain HTTP fetcher. It does not execute scripts, so `settle_delay` has
/// nothing to wait for; `wait_for` is checked against the returned HTML.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .map_err(FetchError::Client)?;
        Ok(Self { client })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &Url, options: &FetchOptions) -> Result<FetchedPage, FetchError> {
        let response = self
            .client
            .get(url.clone())
            .header(USER_AGENT, USER_AGENT_VALUE)
            .header(ACCEPT, "text/html,application/xhtml+xml;q=0.9,*/*;q=0.8")
            .send()
            .await
            .map_err(|source| FetchError::Transport {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        let html = read_text_limited(response, MAX_BODY_BYTES)
            .await
            .map_err(|source| FetchError::Body {
                url: url.to_string(),
                source,
            })?;

        if !status.is_success() {
            tracing::debug!(%url, %status, "fetch returned unsuccessful status");
            return Ok(FetchedPage {
                success: false,
                html,
                markdown: None,
            });
        }

        let ready = options
            .wait_for
            .as_deref()
            .is_none_or(|selector| Document::from(html.as_str()).select(selector).exists());
        if !ready {
            tracing::debug!(%url, wait_for = ?options.wait_for, "wait_for selector not present");
        }

        let markdown = html2md::parse_html(&html);
        Ok(FetchedPage {
            success: ready,
            html,
            markdown: Some(markdown),
        })
    }
}

async fn read_text_limited(
    mut resp: reqwest::Response,
    limit: usize,
) -> Result<String, reqwest::Error> {
    let mut out: Vec<u8> = Vec::new();

    while let Some(chunk) = resp.chunk().await? {
        if out.len() + chunk.len() > limit {
            let remaining = limit.saturating_sub(out.len());
            out.extend_from_slice(&chunk[..remaining]);
            tracing::debug!(limit, "response body truncated");
            break;
        }
        out.extend_from_slice(&chunk);
    }

    Ok(String::from_utf8_lossy(&out).into_owned())
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc;
    use std::thread;

    use super::*;

    fn spawn_page_server() -> (String, mpsc::Sender<()>, thread::JoinHandle<()>) {
        let server = tiny_http::Server::http("127.0.0.1:0").expect("start tiny_http server");
        let base_url = format!("http://{}", server.server_addr());
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();

        let handle = thread::spawn(move || {
            loop {
                if shutdown_rx.try_recv().is_ok() {
                    break;
                }
                let request = match server.recv_timeout(Duration::from_millis(50)) {
                    Ok(Some(req)) => req,
                    Ok(None) => continue,
                    Err(_) => break,
                };

                let (status, body) = match request.url() {
                    "/page" => (200, "<html><body><p>Hello <b>page</b></p></body></html>"),
                    _ => (404, "not found"),
                };
                let header =
                    tiny_http::Header::from_bytes(&b"Content-Type"[..], &b"text/html"[..])
                        .expect("content-type header");
                let resp = tiny_http::Response::from_string(body)
                    .with_status_code(status)
                    .with_header(header);
                let _ = request.respond(resp);
            }
        });

        (base_url, shutdown_tx, handle)
    }

    #[tokio::test]
    async fn fetches_html_and_markdown_rendition() {
        let (base_url, shutdown_tx, handle) = spawn_page_server();
        let fetcher = HttpFetcher::new(Duration::from_secs(5)).unwrap();
        let url = Url::parse(&format!("{base_url}/page")).unwrap();

        let page = fetcher.fetch(&url, &FetchOptions::chapter()).await.unwrap();
        assert!(page.success);
        assert!(page.html.contains("Hello"));
        assert!(page.markdown.unwrap().contains("page"));

        let _ = shutdown_tx.send(());
        let _ = handle.join();
    }

    #[tokio::test]
    async fn non_success_status_is_unsuccessful_not_error() {
        let (base_url, shutdown_tx, handle) = spawn_page_server();
        let fetcher = HttpFetcher::new(Duration::from_secs(5)).unwrap();
        let url = Url::parse(&format!("{base_url}/missing")).unwrap();

        let page = fetcher.fetch(&url, &FetchOptions::chapter()).await.unwrap();
        assert!(!page.success);

        let _ = shutdown_tx.send(());
        let _ = handle.join();
    }

    #[tokio::test]
    async fn unmet_wait_for_selector_marks_page_unsuccessful() {
        let (base_url, shutdown_tx, handle) = spawn_page_server();
        let fetcher = HttpFetcher::new(Duration::from_secs(5)).unwrap();
        let url = Url::parse(&format!("{base_url}/page")).unwrap();
        let options = FetchOptions {
            wait_for: Some("#reader".to_owned()),
            settle_delay: Duration::ZERO,
        };

        let page = fetcher.fetch(&url, &options).await.unwrap();
        assert!(!page.success);

        let _ = shutdown_tx.send(());
        let _ = handle.join();
    }

    #[tokio::test]
    async fn connection_failure_is_a_transport_error() {
        let fetcher = HttpFetcher::new(Duration::from_secs(2)).unwrap();
        let url = Url::parse("http://127.0.0.1:1/unreachable").unwrap();

        let err = fetcher
            .fetch(&url, &FetchOptions::chapter())
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Transport { .. }));
    }
}
