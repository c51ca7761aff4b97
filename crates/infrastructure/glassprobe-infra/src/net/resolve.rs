use std::sync::LazyLock;

use glassprobe_config::ALTERNATE_LINK_TOKEN;
use glassprobe_core::MeasureError;
use regex::Regex;
use reqwest::Client;
use tracing::debug;

use super::link::resolve_link;
use super::signal::StopSignal;
use super::{status_error, transport_error};

static HREF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<a\b[^>]*?\bhref\s*=\s*["']([^"']*)["']"#).expect("valid href pattern")
});

/// Turns a companion page into an alternate transfer link.
#[async_trait::async_trait]
pub trait AlternateLinkResolver: Send + Sync {
    /// Absolute link to a transfer resource listed on `page`, or `NoAlternateFound`.
    async fn resolve_alternate(
        &self,
        page: &str,
        signal: &StopSignal,
    ) -> Result<String, MeasureError>;
}

/// Fetches the page over HTTP and picks the first anchor whose target
/// contains the size token (e.g. `/1000.mb`).
pub struct HttpAlternateResolver {
    client: Client,
    token: String,
}

impl HttpAlternateResolver {
    pub fn new(client: Client) -> Self {
        Self::with_token(client, ALTERNATE_LINK_TOKEN)
    }

    pub fn with_token(client: Client, token: impl Into<String>) -> Self {
        Self {
            client,
            token: token.into(),
        }
    }
}

/// First anchor target on `html` containing `token`, resolved against `page`.
pub fn find_alternate_link(html: &str, page: &str, token: &str) -> Option<String> {
    HREF.captures_iter(html)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str())
        .filter(|href| href.contains(token))
        .find_map(|href| resolve_link(page, href))
}

#[async_trait::async_trait]
impl AlternateLinkResolver for HttpAlternateResolver {
    async fn resolve_alternate(
        &self,
        page: &str,
        signal: &StopSignal,
    ) -> Result<String, MeasureError> {
        debug!("fetching companion page {page}");
        let fetch = async {
            let resp = self
                .client
                .get(page)
                .send()
                .await
                .map_err(transport_error)?;
            if !resp.status().is_success() {
                return Err(status_error("GET", page, resp.status()));
            }
            resp.text().await.map_err(transport_error)
        };

        let html = tokio::select! {
            biased;
            reason = signal.stopped() => return Err(reason.into_error(0)),
            res = fetch => res?,
        };

        find_alternate_link(&html, page, &self.token).ok_or_else(|| {
            debug!("no link containing {:?} on {page}", self.token);
            MeasureError::NoAlternateFound {
                page: page.to_string(),
            }
        })
    }
}
