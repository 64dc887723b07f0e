// Contract between the crawl controller and whatever loads pages

use crate::error::Result;
use std::future::Future;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;
use url::Url;

/// Point in a resource fetch's life a `ResourceEvent` describes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceStage {
    Start,
    End,
}

/// One network fetch observed while a page loads
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceEvent {
    /// Page cycle the event belongs to
    pub generation: u64,
    pub url: String,
    pub stage: ResourceStage,
}

/// Sending half of a page's resource event stream.
///
/// Every event is tagged with the generation of the page cycle that created
/// the sink. Once that cycle ends its receiver is gone and further events
/// are dropped.
#[derive(Debug, Clone)]
pub struct EventSink {
    generation: u64,
    sender: UnboundedSender<ResourceEvent>,
}

impl EventSink {
    pub fn new(generation: u64, sender: UnboundedSender<ResourceEvent>) -> Self {
        Self { generation, sender }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn emit(&self, url: &str, stage: ResourceStage) {
        let event = ResourceEvent {
            generation: self.generation,
            url: url.to_string(),
            stage,
        };
        if self.sender.send(event).is_err() {
            debug!("Page cycle {} is over, dropping event for {}", self.generation, url);
        }
    }
}

/// DOM queries the extractor runs against the loaded page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DomQuery {
    /// `href` of every anchor
    Links,
    /// `action` of every form
    FormActions,
    /// `src` of every iframe
    IframeSources,
}

/// Completion signal for a navigation
#[derive(Debug, Clone)]
pub struct PageLoad {
    /// URL of the document after redirects
    pub final_url: Url,
    pub status_code: u16,
    pub content_type: Option<String>,
    pub elapsed: Duration,
    /// Subresources requested while loading
    pub resources_requested: usize,
}

impl PageLoad {
    pub fn new(final_url: Url) -> Self {
        Self {
            final_url,
            status_code: 0,
            content_type: None,
            elapsed: Duration::from_secs(0),
            resources_requested: 0,
        }
    }
}

/// A page loading engine.
///
/// `open` resolves once the page and its resources have finished loading,
/// emitting a `ResourceEvent` through `events` for every fetch it makes.
/// `evaluate` runs a query against the page most recently opened and returns
/// absolute URLs (or the raw text, when resolution fails).
pub trait PageRenderer {
    fn open(&mut self, url: &Url, events: EventSink) -> impl Future<Output = Result<PageLoad>>;

    fn evaluate(&self, query: DomQuery) -> Result<Vec<String>>;
}
