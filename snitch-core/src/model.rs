use serde::Serialize;

/// Counters for the whole audit. They only ever go up.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GlobalStats {
    pub pages_visited: usize,
    pub mixed_content_pages: usize,
    pub insecure_resource_requests: usize,
    pub insecure_forms: usize,
    pub insecure_iframes: usize,
    pub insecure_links: usize,
    pub unreachable_pages: usize,
}

impl GlobalStats {
    /// Links alone don't count: they point elsewhere
    pub fn has_insecurity(&self) -> bool {
        self.insecure_resource_requests > 0 || self.insecure_forms > 0 || self.insecure_iframes > 0
    }

    pub fn absorb(&mut self, other: &GlobalStats) {
        self.pages_visited += other.pages_visited;
        self.mixed_content_pages += other.mixed_content_pages;
        self.insecure_resource_requests += other.insecure_resource_requests;
        self.insecure_forms += other.insecure_forms;
        self.insecure_iframes += other.insecure_iframes;
        self.insecure_links += other.insecure_links;
        self.unreachable_pages += other.unreachable_pages;
    }
}

/// Findings for the page currently being audited
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageAuditState {
    pub is_secure: bool,
    pub insecure_links: usize,
    pub insecure_forms: usize,
    pub insecure_iframes: usize,
    pub insecure_resources: usize,
}

impl PageAuditState {
    pub fn new() -> Self {
        Self {
            is_secure: true,
            insecure_links: 0,
            insecure_forms: 0,
            insecure_iframes: 0,
            insecure_resources: 0,
        }
    }

    pub fn mark_insecure(&mut self) {
        self.is_secure = false;
    }
}

impl Default for PageAuditState {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Ok,
    Insecure,
    Unreachable,
}

impl Verdict {
    pub fn label(&self) -> &'static str {
        match self {
            Verdict::Ok => "OK",
            Verdict::Insecure => "INSECURE",
            Verdict::Unreachable => "UNREACHABLE",
        }
    }
}

/// Outcome of one page visit
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageRecord {
    pub url: String,
    pub verdict: Verdict,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    pub insecure_resources: usize,
    pub insecure_forms: usize,
    pub insecure_iframes: usize,
    pub insecure_links: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PageRecord {
    pub fn audited(url: String, state: &PageAuditState, status_code: u16) -> Self {
        Self {
            url,
            verdict: if state.is_secure {
                Verdict::Ok
            } else {
                Verdict::Insecure
            },
            status_code: Some(status_code),
            insecure_resources: state.insecure_resources,
            insecure_forms: state.insecure_forms,
            insecure_iframes: state.insecure_iframes,
            insecure_links: state.insecure_links,
            error: None,
        }
    }

    /// Nothing observed before the failure is kept
    pub fn unreachable(url: String, error: String) -> Self {
        Self {
            url,
            verdict: Verdict::Unreachable,
            status_code: None,
            insecure_resources: 0,
            insecure_forms: 0,
            insecure_iframes: 0,
            insecure_links: 0,
            error: Some(error),
        }
    }
}
