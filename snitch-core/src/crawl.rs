use crate::error::{AuditError, Result};
use crate::log::{AuditLog, Level};
use crate::model::{GlobalStats, PageAuditState, PageRecord, Verdict};
use crate::report::{AuditReport, running_totals_line, summary_level, summary_line};
use crate::security::Classifier;
use chrono::Utc;
use snitch_scanner::extract::{Extraction, extract_all};
use snitch_scanner::{Address, EventSink, Frontier, PageLoad, PageRenderer, ResourceEvent};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Options for configuring an audit
#[derive(Debug, Clone, Default)]
pub struct AuditOptions {
    pub start_url: Option<String>,
    /// Follow same-host links instead of stopping after the start page
    pub crawl: bool,
    pub log_all_requests: bool,
    pub ignore_iframes: bool,
    pub ignore_forms: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrawlState {
    Idle,
    Validating,
    Cycling,
    Done,
}

/// Mutable context of one audit run. Nothing else touches the counters.
struct Session<L> {
    classifier: Classifier,
    stats: GlobalStats,
    /// Findings of the page in flight, folded into `stats` once it loads
    cycle: GlobalStats,
    log: L,
    pages: Vec<PageRecord>,
}

impl<L: AuditLog> Session<L> {
    /// Each cycle gets a fresh channel, which already keeps late events out.
    /// The generation tag still guards a renderer that replays an old sink.
    fn observe(&mut self, generation: u64, event: ResourceEvent, page: &mut PageAuditState) {
        if event.generation != generation {
            debug!(
                "Discarding resource event from page cycle {} during cycle {}: {}",
                event.generation, generation, event.url
            );
            return;
        }
        self.classifier.classify_resource_event(
            &Address::parse(&event.url),
            event.stage,
            page,
            &mut self.cycle,
            &mut self.log,
        );
    }

    fn classify_link(&mut self, url: &Address, page: &mut PageAuditState) -> bool {
        self.classifier
            .classify_link(url, page, &mut self.cycle, &mut self.log)
    }

    fn classify_form_action(&mut self, url: &Address, page: &mut PageAuditState) -> bool {
        self.classifier
            .classify_form_action(url, page, &mut self.cycle, &mut self.log)
    }

    fn classify_iframe_source(&mut self, url: &Address, page: &mut PageAuditState) -> bool {
        self.classifier
            .classify_iframe_source(url, page, &mut self.cycle, &mut self.log)
    }

    fn begin_cycle(&mut self) {
        self.cycle = GlobalStats::default();
    }

    fn record_verdict(&mut self, address: &Address, page: &PageAuditState, load: &PageLoad) {
        let record = PageRecord::audited(address.to_string(), page, load.status_code);
        let level = match record.verdict {
            Verdict::Insecure => {
                self.cycle.mixed_content_pages += 1;
                Level::Error
            }
            _ => Level::Success,
        };
        self.log
            .write(level, &format!("\t{}: {}", record.verdict.label(), address));

        let cycle = std::mem::take(&mut self.cycle);
        self.stats.absorb(&cycle);
        self.pages.push(record);
    }

    fn record_unreachable(&mut self, address: &Address, error: String) {
        if self.cycle != GlobalStats::default() {
            debug!("Dropping findings of unreachable page {}: {:?}", address, self.cycle);
        }
        self.cycle = GlobalStats::default();
        self.stats.unreachable_pages += 1;
        self.log.write(
            Level::Warning,
            &format!("\tUnreachable page: {} ({})", address, error),
        );
        self.pages
            .push(PageRecord::unreachable(address.to_string(), error));
    }
}

/// Drives the audit: one page at a time, breadth first from the start URL.
///
/// Pages are never loaded concurrently. Resource events are tagged with the
/// generation of the page cycle that produced them and anything from an
/// older cycle is dropped, so findings always land on the page being loaded.
pub struct Auditor<R, L> {
    renderer: R,
    options: AuditOptions,
    frontier: Frontier,
    session: Session<L>,
    generation: u64,
    state: CrawlState,
}

impl<R: PageRenderer, L: AuditLog> Auditor<R, L> {
    pub fn new(renderer: R, options: AuditOptions, log: L) -> Self {
        let classifier = Classifier::new(&options);
        Self {
            renderer,
            options,
            frontier: Frontier::new(),
            session: Session {
                classifier,
                stats: GlobalStats::default(),
                cycle: GlobalStats::default(),
                log,
                pages: Vec::new(),
            },
            generation: 0,
            state: CrawlState::Idle,
        }
    }

    pub fn state(&self) -> CrawlState {
        self.state
    }

    pub fn stats(&self) -> &GlobalStats {
        &self.session.stats
    }

    pub fn frontier(&self) -> &Frontier {
        &self.frontier
    }

    pub fn pages(&self) -> &[PageRecord] {
        &self.session.pages
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn log(&self) -> &L {
        &self.session.log
    }

    /// Check the start URL before anything is loaded
    pub fn validate(&mut self) -> Result<Address> {
        self.state = CrawlState::Validating;

        let result = match self.options.start_url.as_deref().map(str::trim) {
            None | Some("") => Err(AuditError::MissingStartUrl),
            Some(raw) => match Address::parse(raw) {
                Address::Unparseable(raw) => Err(AuditError::InvalidStartUrl(raw)),
                address if !address.is_secure() => {
                    Err(AuditError::InsecureStartUrl(address.to_string()))
                }
                address => Ok(address),
            },
        };

        if let Err(ref e) = result {
            self.state = CrawlState::Done;
            self.session.log.write(Level::Error, &e.to_string());
        }
        result
    }

    /// Run the whole audit and return the report
    pub async fn run(&mut self) -> Result<AuditReport> {
        if self.state != CrawlState::Idle {
            return Err(AuditError::AlreadyRun);
        }

        let started_at = Utc::now();
        let start = self.validate()?;
        info!("Starting audit of {} (crawl: {})", start, self.options.crawl);

        self.state = CrawlState::Cycling;
        self.frontier.enqueue(start.clone());

        while let Some(address) = self.frontier.dequeue_next() {
            self.frontier.mark_visited(&address);
            self.audit_page(address).await;

            if !self.options.crawl || self.frontier.is_empty() {
                break;
            }
            self.session
                .log
                .write(Level::Info, &running_totals_line(&self.session.stats));
        }

        self.state = CrawlState::Done;
        let stats = self.session.stats;
        info!("Audit complete. Visited {} pages", stats.pages_visited);

        self.session
            .log
            .write(summary_level(&stats), &summary_line(&stats, &self.options));

        Ok(AuditReport {
            start_url: start.to_string(),
            started_at: started_at.to_rfc3339(),
            finished_at: Utc::now().to_rfc3339(),
            crawl: self.options.crawl,
            stats,
            pages: self.session.pages.clone(),
            pending_urls: self.frontier.pending().map(|a| a.to_string()).collect(),
        })
    }

    async fn audit_page(&mut self, address: Address) {
        self.session
            .log
            .write(Level::InfoBar, &format!("==> Testing page: {}", address));
        self.session.stats.pages_visited += 1;
        self.session.begin_cycle();
        self.generation += 1;
        let generation = self.generation;
        let mut page = PageAuditState::new();

        let Some(url) = address.url().cloned() else {
            self.session
                .record_unreachable(&address, "unparseable URL".to_string());
            return;
        };

        let (sender, mut receiver) = mpsc::unbounded_channel();
        let outcome = {
            let navigation = self.renderer.open(&url, EventSink::new(generation, sender));
            tokio::pin!(navigation);

            loop {
                tokio::select! {
                    biased;
                    Some(event) = receiver.recv() => self.session.observe(generation, event, &mut page),
                    outcome = &mut navigation => break outcome,
                }
            }
        };

        // Whatever was queued before navigation settled still belongs to this page
        receiver.close();
        while let Ok(event) = receiver.try_recv() {
            self.session.observe(generation, event, &mut page);
        }

        match outcome {
            Ok(load) => self.inspect_page(&address, page, &load),
            Err(e) => {
                warn!("Navigation to {} failed: {}", address, e);
                self.session.record_unreachable(&address, e.to_string());
            }
        }
    }

    fn inspect_page(&mut self, address: &Address, mut page: PageAuditState, load: &PageLoad) {
        let extraction = extract_all(&self.renderer).unwrap_or_else(|e| {
            warn!("Could not query {}: {}", address, e);
            Extraction::default()
        });
        debug!(
            "{}: {} links, {} forms, {} iframes",
            address,
            extraction.links.len(),
            extraction.form_actions.len(),
            extraction.iframe_sources.len()
        );

        for link in extraction.links {
            // Scoped to the page being processed, not the start URL
            if !link.same_host(address) || link.same_document(address) {
                continue;
            }
            if self.frontier.is_known(&link) {
                continue;
            }
            self.session.classify_link(&link, &mut page);
            self.frontier.enqueue(link);
        }

        for action in &extraction.form_actions {
            self.session.classify_form_action(action, &mut page);
        }

        for source in &extraction.iframe_sources {
            self.session.classify_iframe_source(source, &mut page);
        }

        self.session.record_verdict(address, &page, load);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log::MemoryLog;
    use snitch_scanner::ResourceStage;

    fn session() -> Session<MemoryLog> {
        Session {
            classifier: Classifier::new(&AuditOptions::default()),
            stats: GlobalStats::default(),
            cycle: GlobalStats::default(),
            log: MemoryLog::new(),
            pages: Vec::new(),
        }
    }

    fn event(generation: u64, url: &str) -> ResourceEvent {
        ResourceEvent {
            generation,
            url: url.to_string(),
            stage: ResourceStage::Start,
        }
    }

    #[test]
    fn test_observe_drops_events_from_older_cycles() {
        let mut session = session();
        let mut page = PageAuditState::new();

        session.observe(3, event(2, "http://late.example.com/leak.js"), &mut page);
        assert!(page.is_secure);
        assert_eq!(session.cycle, GlobalStats::default());
        assert!(session.log.lines().is_empty());

        session.observe(3, event(3, "http://cdn.example.com/x.js"), &mut page);
        assert!(!page.is_secure);
        assert_eq!(session.cycle.insecure_resource_requests, 1);
    }

    #[test]
    fn test_unreachable_page_findings_stay_out_of_totals() {
        let mut session = session();
        let mut page = PageAuditState::new();
        let address = Address::parse("http://example.com/down");

        session.begin_cycle();
        session.observe(1, event(1, "http://example.com/down"), &mut page);
        session.record_unreachable(&address, "connection refused".to_string());

        assert_eq!(session.stats.insecure_resource_requests, 0);
        assert_eq!(session.stats.unreachable_pages, 1);
        assert_eq!(session.cycle, GlobalStats::default());
        assert_eq!(session.pages[0].insecure_resources, 0);
    }

    #[test]
    fn test_verdict_folds_cycle_into_totals() {
        let mut session = session();
        let mut page = PageAuditState::new();
        let address = Address::parse("https://example.com/");

        session.begin_cycle();
        session.observe(1, event(1, "http://cdn.example.com/x.js"), &mut page);
        session.record_verdict(&address, &page, &PageLoad::new(address.url().cloned().unwrap()));

        assert_eq!(session.stats.insecure_resource_requests, 1);
        assert_eq!(session.stats.mixed_content_pages, 1);
        assert!(session.log.contains("INSECURE: https://example.com/"));
    }
}
