//! Async scan orchestration: URL extraction, fetching, offloaded matching.
//!
//! One scan per inbound candidate message; scans are independent and may
//! run concurrently. Hashing runs on the blocking pool so event delivery is
//! never stalled behind it. Fetch and decode failures degrade the affected
//! URL to "no usable image" and the scan proceeds to the next one.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, warn};
use url::Url;

use crate::error::{HashwardError, Result};
use crate::matcher::{check_bytes, MatchOutcome, MatcherConfig};
use crate::store::{has_image_extension, SignatureStore};

/// Default per-URL fetch timeout.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(8);

/// An attachment descriptor as exposed by the platform event source.
#[derive(Debug, Clone)]
pub struct AttachmentRef {
    pub url: String,
    pub content_type: Option<String>,
}

/// The one extraction capability shared by every message-like shape.
///
/// Primary messages, forwarded snapshots, and referenced messages all
/// expose the same attachment/embed/text surface; implement this once per
/// concrete source shape instead of probing attributes ad hoc.
pub trait MessageContent {
    fn attachments(&self) -> &[AttachmentRef];
    /// Embed image and thumbnail URLs, already flattened.
    fn embed_image_urls(&self) -> Vec<String>;
    fn text(&self) -> &str;
}

/// Collect the plausible image URLs from one source: attachments with an
/// image content type, embed image/thumbnail URLs, and raw links whose path
/// (query string ignored) ends in a supported image extension.
pub fn extract_image_urls(source: &dyn MessageContent) -> BTreeSet<String> {
    let mut urls = BTreeSet::new();
    for attachment in source.attachments() {
        let is_image = attachment
            .content_type
            .as_deref()
            .is_some_and(|ct| ct.contains("image"));
        if is_image {
            urls.insert(attachment.url.clone());
        }
    }
    urls.extend(source.embed_image_urls());
    for token in source.text().split_whitespace() {
        if !token.starts_with("http://") && !token.starts_with("https://") {
            continue;
        }
        if let Ok(parsed) = Url::parse(token) {
            if has_image_extension(parsed.path()) {
                urls.insert(token.to_string());
            }
        }
    }
    urls
}

/// Flatten and de-duplicate image URLs across a message and its related
/// sources (forwarded snapshots, a referenced message). The set keeps the
/// scan order stable.
pub fn collect_image_urls<'a, I>(sources: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = &'a dyn MessageContent>,
{
    let mut urls = BTreeSet::new();
    for source in sources {
        urls.extend(extract_image_urls(source));
    }
    urls
}

/// Fetch collaborator: raw bytes or a fetch failure. Any failure is treated
/// by the scanner as "no signature available for this URL", never as fatal.
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

/// `reqwest`-backed fetcher with an independent per-request timeout.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ImageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(HashwardError::Fetch {
                url: url.to_string(),
                reason: format!("HTTP status {status}"),
            });
        }
        Ok(response.bytes().await?.to_vec())
    }
}

/// A match found while scanning a set of URLs.
#[derive(Debug, Clone, Serialize)]
pub struct ScanMatch {
    /// URL whose content matched.
    pub url: String,
    #[serde(flatten)]
    pub outcome: MatchOutcome,
}

/// Per-candidate scan pipeline over a store snapshot.
pub struct Scanner<F: ImageFetcher> {
    store: Arc<SignatureStore>,
    fetcher: F,
    config: MatcherConfig,
}

impl<F: ImageFetcher> Scanner<F> {
    pub fn new(store: Arc<SignatureStore>, fetcher: F, config: MatcherConfig) -> Self {
        Self {
            store,
            fetcher,
            config,
        }
    }

    /// Scan URLs in order, short-circuiting the whole message on the first
    /// match. Fetch and decode failures skip to the next URL.
    pub async fn scan_urls<I, S>(&self, urls: I) -> Option<ScanMatch>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for url in urls {
            let url = url.into();
            let bytes = match self.fetcher.fetch(&url).await {
                Ok(bytes) => bytes,
                Err(err) => {
                    warn!(%url, error = %err, "fetch failed, skipping url");
                    continue;
                }
            };
            let db = self.store.snapshot();
            let config = self.config.clone();
            match tokio::task::spawn_blocking(move || check_bytes(&bytes, &db, &config)).await {
                Ok(Some(outcome)) => return Some(ScanMatch { url, outcome }),
                Ok(None) => debug!(%url, "no match"),
                Err(err) => warn!(%url, error = %err, "matching task failed"),
            }
        }
        None
    }

    /// Extract, flatten, and scan every image URL from the given sources.
    pub async fn scan_sources<'a, I>(&self, sources: I) -> Option<ScanMatch>
    where
        I: IntoIterator<Item = &'a dyn MessageContent>,
    {
        self.scan_urls(collect_image_urls(sources)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
    use std::collections::HashMap;
    use std::io::Cursor;
    use tempfile::TempDir;

    struct TestMessage {
        attachments: Vec<AttachmentRef>,
        embeds: Vec<String>,
        text: String,
    }

    impl MessageContent for TestMessage {
        fn attachments(&self) -> &[AttachmentRef] {
            &self.attachments
        }

        fn embed_image_urls(&self) -> Vec<String> {
            self.embeds.clone()
        }

        fn text(&self) -> &str {
            &self.text
        }
    }

    struct StaticFetcher {
        responses: HashMap<String, Vec<u8>>,
    }

    #[async_trait]
    impl ImageFetcher for StaticFetcher {
        async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
            self.responses
                .get(url)
                .cloned()
                .ok_or_else(|| HashwardError::Fetch {
                    url: url.to_string(),
                    reason: "connection refused".into(),
                })
        }
    }

    fn png_bytes() -> Vec<u8> {
        let img = RgbImage::from_fn(48, 48, |x, y| {
            let shade = if (x / 8 + y / 8) % 2 == 0 { 230 } else { 25 };
            Rgb([shade, shade / 2, x as u8])
        });
        let mut buf = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(img)
            .write_to(&mut buf, ImageFormat::Png)
            .unwrap();
        buf.into_inner()
    }

    #[test]
    fn test_extract_filters_and_dedupes() {
        let message = TestMessage {
            attachments: vec![
                AttachmentRef {
                    url: "https://cdn.example/a.png".into(),
                    content_type: Some("image/png".into()),
                },
                AttachmentRef {
                    url: "https://cdn.example/notes.pdf".into(),
                    content_type: Some("application/pdf".into()),
                },
                AttachmentRef {
                    url: "https://cdn.example/untyped.png".into(),
                    content_type: None,
                },
            ],
            embeds: vec!["https://cdn.example/a.png".into()],
            text: "look https://evil.example/scam.JPG?v=2 and https://evil.example/page.html"
                .into(),
        };

        let urls = extract_image_urls(&message);
        assert_eq!(
            urls.into_iter().collect::<Vec<_>>(),
            [
                "https://cdn.example/a.png",
                "https://evil.example/scam.JPG?v=2",
            ]
        );
    }

    #[test]
    fn test_collect_spans_forwarded_sources() {
        let primary = TestMessage {
            attachments: vec![],
            embeds: vec![],
            text: "https://evil.example/one.png".into(),
        };
        let forwarded = TestMessage {
            attachments: vec![],
            embeds: vec!["https://evil.example/two.gif".into()],
            text: String::new(),
        };

        let urls = collect_image_urls([
            &primary as &dyn MessageContent,
            &forwarded as &dyn MessageContent,
        ]);
        assert_eq!(urls.len(), 2);
    }

    #[tokio::test]
    async fn test_scan_skips_failed_fetches_and_short_circuits() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(SignatureStore::open(dir.path()).unwrap());
        store.append("ref.png", &png_bytes()).unwrap();

        let fetcher = StaticFetcher {
            responses: HashMap::from([("https://ok.example/scam.png".to_string(), png_bytes())]),
        };
        let scanner = Scanner::new(store, fetcher, MatcherConfig::default());

        let hit = scanner
            .scan_urls([
                "https://down.example/gone.png",
                "https://ok.example/scam.png",
            ])
            .await
            .expect("reposted reference should match");
        assert_eq!(hit.url, "https://ok.example/scam.png");
        assert_eq!(hit.outcome.reference, "ref.png");
    }

    #[tokio::test]
    async fn test_scan_with_empty_store_is_no_match() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(SignatureStore::open(dir.path()).unwrap());
        let fetcher = StaticFetcher {
            responses: HashMap::from([("https://ok.example/a.png".to_string(), png_bytes())]),
        };
        let scanner = Scanner::new(store, fetcher, MatcherConfig::default());
        assert!(scanner.scan_urls(["https://ok.example/a.png"]).await.is_none());
    }
}
