use crate::address::Address;
use crate::error::{Result, ScanError};
use crate::renderer::{DomQuery, EventSink, PageLoad, PageRenderer, ResourceStage};
use futures::stream::{self, StreamExt};
use reqwest::header::LOCATION;
use reqwest::{Client, redirect::Policy};
use scraper::{Html, Selector};
use std::future::Future;
use std::time::{Duration, Instant};
use tracing::{debug, info};
use url::Url;

const MAX_REDIRECTS: usize = 5;
const RESOURCE_CONCURRENCY: usize = 8;

/// `rel` tokens a browser fetches eagerly
const FETCHING_RELS: [&str; 6] = [
    "stylesheet",
    "icon",
    "preload",
    "modulepreload",
    "manifest",
    "apple-touch-icon",
];

/// Elements whose attribute triggers a subresource fetch while loading
const RESOURCE_SOURCES: [(&str, &str); 10] = [
    ("script[src]", "src"),
    ("img[src]", "src"),
    ("source[src]", "src"),
    ("video[src]", "src"),
    ("video[poster]", "poster"),
    ("audio[src]", "src"),
    ("track[src]", "src"),
    ("embed[src]", "src"),
    ("object[data]", "data"),
    ("input[type=image][src]", "src"),
];

struct Document {
    url: Url,
    base: Url,
    body: String,
}

/// Fetch-and-parse renderer.
///
/// Loads the document over HTTP, fetches every subresource the markup asks
/// for once, and answers DOM queries from the parsed document. Scripts are
/// not executed.
pub struct HttpRenderer {
    client: Client,
    /// Subresources follow redirects by hand so every hop is observed
    resource_client: Client,
    document: Option<Document>,
    fetch_resources: bool,
}

impl HttpRenderer {
    pub fn new() -> Result<Self> {
        Self::with_timeout(30)
    }

    pub fn with_timeout(timeout_secs: u64) -> Result<Self> {
        let client = client_builder(timeout_secs)
            .redirect(Policy::limited(MAX_REDIRECTS))
            .build()?;
        let resource_client = client_builder(timeout_secs).redirect(Policy::none()).build()?;

        Ok(Self {
            client,
            resource_client,
            document: None,
            fetch_resources: true,
        })
    }

    /// When disabled, resource events are still emitted but nothing is fetched
    pub fn with_resource_fetching(mut self, enabled: bool) -> Self {
        self.fetch_resources = enabled;
        self
    }

    async fn navigate(&mut self, url: &Url, events: EventSink) -> Result<PageLoad> {
        self.document = None;
        debug!("Navigating to {}", url);

        let start = Instant::now();
        let response = self.client.get(url.clone()).send().await?;
        // Nothing is observed for a document that never answered
        events.emit(url.as_str(), ResourceStage::Start);

        let final_url = response.url().clone();
        if final_url != *url {
            debug!("{} redirected to {}", url, final_url);
            events.emit(final_url.as_str(), ResourceStage::Start);
        }

        let status_code = response.status().as_u16();
        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        let body = response.text().await?;
        events.emit(final_url.as_str(), ResourceStage::End);

        // Without a content type, assume markup like a browser sniffing would
        let is_html = content_type
            .as_ref()
            .map(|ct| ct.contains("html"))
            .unwrap_or(true);

        let (base, resources) = if is_html {
            let html = Html::parse_document(&body);
            let base = document_base(&html, &final_url)?;
            let resources = subresource_urls(&html, &base)?;
            (base, resources)
        } else {
            (final_url.clone(), Vec::new())
        };

        let resources_requested = resources.len();
        let client = &self.resource_client;
        let fetch_resources = self.fetch_resources;

        stream::iter(resources)
            .for_each_concurrent(RESOURCE_CONCURRENCY, |resource| {
                let events = events.clone();
                async move {
                    events.emit(resource.as_str(), ResourceStage::Start);
                    if fetch_resources && let Some(target) = fetchable(&resource) {
                        fetch_resource(client, target.clone(), &events).await;
                    }
                    events.emit(resource.as_str(), ResourceStage::End);
                }
            })
            .await;

        let elapsed = start.elapsed();
        info!(
            "Loaded {} ({}) with {} resources in {:?}",
            final_url, status_code, resources_requested, elapsed
        );

        self.document = Some(Document {
            url: final_url.clone(),
            base,
            body: if is_html { body } else { String::new() },
        });

        Ok(PageLoad {
            final_url,
            status_code,
            content_type,
            elapsed,
            resources_requested,
        })
    }
}

impl PageRenderer for HttpRenderer {
    fn open(&mut self, url: &Url, events: EventSink) -> impl Future<Output = Result<PageLoad>> {
        self.navigate(url, events)
    }

    fn evaluate(&self, query: DomQuery) -> Result<Vec<String>> {
        let document = self.document.as_ref().ok_or(ScanError::NoDocument)?;
        let html = Html::parse_document(&document.body);

        let (css, attribute) = match query {
            DomQuery::Links => ("a[href]", "href"),
            DomQuery::FormActions => ("form", "action"),
            DomQuery::IframeSources => ("iframe[src]", "src"),
        };
        let selector = selector(css)?;

        Ok(html
            .select(&selector)
            .filter_map(|element| match element.value().attr(attribute) {
                // A form without an action submits back to its own document
                Some(value) if query == DomQuery::FormActions && value.trim().is_empty() => {
                    Some(document.url.to_string())
                }
                Some(value) => Some(Address::resolve(&document.base, value).to_string()),
                None if query == DomQuery::FormActions => Some(document.url.to_string()),
                None => None,
            })
            .collect())
    }
}

fn client_builder(timeout_secs: u64) -> reqwest::ClientBuilder {
    Client::builder()
        .user_agent("Snitch/0.1 (mixed content auditor)")
        .timeout(Duration::from_secs(timeout_secs))
        .connect_timeout(Duration::from_secs(timeout_secs.div_ceil(2)))
        .pool_max_idle_per_host(10)
}

/// Fetch one subresource, reporting each redirect target as a request of its own
async fn fetch_resource(client: &Client, mut current: Url, events: &EventSink) {
    for hop in 0..=MAX_REDIRECTS {
        let response = match client.get(current.clone()).send().await {
            Ok(response) => response,
            Err(e) => {
                debug!("Resource fetch failed for {}: {}", current, e);
                return;
            }
        };

        let location = response
            .status()
            .is_redirection()
            .then(|| response.headers().get(LOCATION))
            .flatten()
            .and_then(|v| v.to_str().ok())
            .map(|location| Address::resolve(&current, location));

        let Some(next) = location else {
            debug!("Fetched {} ({})", current, response.status());
            return;
        };
        if hop == MAX_REDIRECTS {
            debug!("Giving up on {} after {} redirects", current, MAX_REDIRECTS);
            return;
        }

        debug!("{} redirected to {}", current, next);
        events.emit(next.as_str(), ResourceStage::Start);
        match fetchable(&next) {
            Some(url) => current = url.clone(),
            None => return,
        }
    }
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| ScanError::ParseError(format!("{}: {:?}", css, e)))
}

/// `<base href>` when present, otherwise the document URL
fn document_base(html: &Html, document_url: &Url) -> Result<Url> {
    let base_selector = selector("base[href]")?;
    let base = html
        .select(&base_selector)
        .next()
        .and_then(|element| element.value().attr("href"))
        .and_then(|href| Address::resolve(document_url, href).url().cloned());
    Ok(base.unwrap_or_else(|| document_url.clone()))
}

fn subresource_urls(html: &Html, base: &Url) -> Result<Vec<Address>> {
    let mut resources = Vec::new();

    for (css, attribute) in RESOURCE_SOURCES {
        let selector = selector(css)?;
        for element in html.select(&selector) {
            if let Some(value) = element.value().attr(attribute)
                && !value.trim().is_empty()
            {
                resources.push(Address::resolve(base, value));
            }
        }
    }

    let link_selector = selector("link[href]")?;
    for element in html.select(&link_selector) {
        let rel = element.value().attr("rel").unwrap_or("").to_ascii_lowercase();
        if rel.split_ascii_whitespace().any(|token| FETCHING_RELS.contains(&token))
            && let Some(href) = element.value().attr("href")
            && !href.trim().is_empty()
        {
            resources.push(Address::resolve(base, href));
        }
    }

    Ok(resources)
}

/// Only network schemes are fetched; `data:` and broken URLs are observed but not requested
fn fetchable(resource: &Address) -> Option<&Url> {
    resource
        .url()
        .filter(|url| matches!(url.scheme(), "http" | "https"))
}
