// Mixed content checks for everything a page loads or points at

use crate::crawl::AuditOptions;
use crate::log::{AuditLog, Level};
use crate::model::{GlobalStats, PageAuditState};
use snitch_scanner::{Address, ResourceStage};
use tracing::debug;

/// Decides what counts as insecure and records it.
///
/// Every call stands for one observed artifact, so repeated fetches of the
/// same resource are counted each time. Each method returns whether a
/// finding was recorded.
#[derive(Debug, Clone, Copy, Default)]
pub struct Classifier {
    pub log_all_requests: bool,
    pub ignore_forms: bool,
    pub ignore_iframes: bool,
}

impl Classifier {
    pub fn new(options: &AuditOptions) -> Self {
        Self {
            log_all_requests: options.log_all_requests,
            ignore_forms: options.ignore_forms,
            ignore_iframes: options.ignore_iframes,
        }
    }

    /// An insecure link is worth a comment, but it is not this page's mixed content
    pub fn classify_link(
        &self,
        url: &Address,
        page: &mut PageAuditState,
        stats: &mut GlobalStats,
        log: &mut dyn AuditLog,
    ) -> bool {
        if url.is_secure() {
            return false;
        }
        stats.insecure_links += 1;
        page.insecure_links += 1;
        log.write(Level::Comment, &format!("\tLink to insecure page found: {}", url));
        true
    }

    pub fn classify_form_action(
        &self,
        url: &Address,
        page: &mut PageAuditState,
        stats: &mut GlobalStats,
        log: &mut dyn AuditLog,
    ) -> bool {
        if self.ignore_forms || url.is_secure() {
            return false;
        }
        stats.insecure_forms += 1;
        page.insecure_forms += 1;
        page.mark_insecure();
        log.write(Level::Error, &format!("\tInsecure form action found: {}", url));
        true
    }

    pub fn classify_iframe_source(
        &self,
        url: &Address,
        page: &mut PageAuditState,
        stats: &mut GlobalStats,
        log: &mut dyn AuditLog,
    ) -> bool {
        if self.ignore_iframes || url.is_secure() {
            return false;
        }
        stats.insecure_iframes += 1;
        page.insecure_iframes += 1;
        page.mark_insecure();
        log.write(Level::Error, &format!("\tInsecure iframe source found: {}", url));
        true
    }

    /// Only the start of a fetch is classified
    pub fn classify_resource_event(
        &self,
        url: &Address,
        stage: ResourceStage,
        page: &mut PageAuditState,
        stats: &mut GlobalStats,
        log: &mut dyn AuditLog,
    ) -> bool {
        if stage != ResourceStage::Start {
            return false;
        }

        if url.is_secure() {
            debug!("Secure resource {}", url);
            if self.log_all_requests {
                log.write(Level::Trace, &format!("\tRequested resource '{}'", url));
            }
            return false;
        }

        stats.insecure_resource_requests += 1;
        page.insecure_resources += 1;
        page.mark_insecure();
        log.write(
            Level::Warning,
            &format!("\tERROR: Requested an insecure resource '{}'", url),
        );
        true
    }
}
