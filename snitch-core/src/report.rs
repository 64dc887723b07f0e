// Final summary and JSON report

use crate::crawl::AuditOptions;
use crate::error::Result;
use crate::log::Level;
use crate::model::{GlobalStats, PageRecord, Verdict};
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::Path;

#[derive(Debug, Clone, Serialize)]
pub struct AuditReport {
    pub start_url: String,
    pub started_at: String,
    pub finished_at: String,
    pub crawl: bool,
    pub stats: GlobalStats,
    pub pages: Vec<PageRecord>,
    /// Discovered but never audited (single page mode leaves these behind)
    pub pending_urls: Vec<String>,
}

impl AuditReport {
    pub fn has_insecurity(&self) -> bool {
        self.stats.has_insecurity()
    }

    pub fn pages_with(&self, verdict: Verdict) -> impl Iterator<Item = &PageRecord> {
        self.pages.iter().filter(move |page| page.verdict == verdict)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn write_json(&self, path: &Path) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(self.to_json()?.as_bytes())?;
        file.write_all(b"\n")?;
        Ok(())
    }
}

/// The single `SUMMARY ::` line printed when the audit finishes.
/// Form and iframe totals are left out when those checks are switched off.
pub fn summary_line(stats: &GlobalStats, options: &AuditOptions) -> String {
    let mut line = format!(
        "SUMMARY :: Total Pages Tested: {}, Total Mixed Content Pages: {}, Total Insecure Resource Requests: {}",
        stats.pages_visited, stats.mixed_content_pages, stats.insecure_resource_requests
    );
    if !options.ignore_forms {
        line.push_str(&format!(", Total Insecure Forms: {}", stats.insecure_forms));
    }
    if !options.ignore_iframes {
        line.push_str(&format!(", Total Insecure Iframes: {}", stats.insecure_iframes));
    }
    line.push_str(&format!(", Total Insecure Links: {}", stats.insecure_links));
    if stats.unreachable_pages > 0 {
        line.push_str(&format!(" (Unreachable Pages: {})", stats.unreachable_pages));
    }
    line
}

pub fn summary_level(stats: &GlobalStats) -> Level {
    if stats.has_insecurity() {
        Level::Error
    } else {
        Level::Success
    }
}

/// Interim totals shown between pages while crawling
pub fn running_totals_line(stats: &GlobalStats) -> String {
    format!(
        "Total Mixed Content Pages: {} Total Insecure Resources: {}",
        stats.mixed_content_pages, stats.insecure_resource_requests
    )
}
