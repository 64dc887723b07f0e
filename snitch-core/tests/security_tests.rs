// Tests for mixed content classification

use snitch_core::crawl::AuditOptions;
use snitch_core::log::{Level, MemoryLog};
use snitch_core::model::{GlobalStats, PageAuditState};
use snitch_core::security::Classifier;
use snitch_scanner::{Address, ResourceStage};

struct Fixture {
    page: PageAuditState,
    stats: GlobalStats,
    log: MemoryLog,
}

fn fixture() -> Fixture {
    Fixture {
        page: PageAuditState::new(),
        stats: GlobalStats::default(),
        log: MemoryLog::new(),
    }
}

fn classifier(ignore_forms: bool, ignore_iframes: bool, log_all_requests: bool) -> Classifier {
    Classifier::new(&AuditOptions {
        ignore_forms,
        ignore_iframes,
        log_all_requests,
        ..Default::default()
    })
}

// ============================================================================
// Form Action Tests
// ============================================================================

#[test]
fn test_insecure_form_action() {
    let mut f = fixture();
    let found = classifier(false, false, false).classify_form_action(
        &Address::parse("http://example.com/login"),
        &mut f.page,
        &mut f.stats,
        &mut f.log,
    );

    assert!(found);
    assert!(!f.page.is_secure);
    assert_eq!(f.stats.insecure_forms, 1);
    assert_eq!(f.page.insecure_forms, 1);
    assert_eq!(f.log.at(Level::Error).len(), 1);
}

#[test]
fn test_ignored_form_action() {
    let mut f = fixture();
    let found = classifier(true, false, false).classify_form_action(
        &Address::parse("http://example.com/login"),
        &mut f.page,
        &mut f.stats,
        &mut f.log,
    );

    assert!(!found);
    assert!(f.page.is_secure);
    assert_eq!(f.stats.insecure_forms, 0);
    assert!(f.log.lines().is_empty());
}

#[test]
fn test_secure_form_action() {
    let mut f = fixture();
    let found = classifier(false, false, false).classify_form_action(
        &Address::parse("https://example.com/login"),
        &mut f.page,
        &mut f.stats,
        &mut f.log,
    );

    assert!(!found);
    assert!(f.page.is_secure);
}

#[test]
fn test_unparseable_form_action_fails_closed() {
    let mut f = fixture();
    let found = classifier(false, false, false).classify_form_action(
        &Address::parse("http://[broken"),
        &mut f.page,
        &mut f.stats,
        &mut f.log,
    );

    assert!(found);
    assert!(!f.page.is_secure);
}

// ============================================================================
// Iframe Tests
// ============================================================================

#[test]
fn test_insecure_iframe_source() {
    let mut f = fixture();
    let found = classifier(false, false, false).classify_iframe_source(
        &Address::parse("http://widgets.example.net/embed"),
        &mut f.page,
        &mut f.stats,
        &mut f.log,
    );

    assert!(found);
    assert!(!f.page.is_secure);
    assert_eq!(f.stats.insecure_iframes, 1);
}

#[test]
fn test_ignored_iframe_source() {
    let mut f = fixture();
    let found = classifier(false, true, false).classify_iframe_source(
        &Address::parse("http://widgets.example.net/embed"),
        &mut f.page,
        &mut f.stats,
        &mut f.log,
    );

    assert!(!found);
    assert!(f.page.is_secure);
    assert_eq!(f.stats.insecure_iframes, 0);
}

#[test]
fn test_data_iframe_is_secure() {
    let mut f = fixture();
    let found = classifier(false, false, false).classify_iframe_source(
        &Address::parse("data:text/html,<p>hi</p>"),
        &mut f.page,
        &mut f.stats,
        &mut f.log,
    );

    assert!(!found);
}

// ============================================================================
// Resource Event Tests
// ============================================================================

#[test]
fn test_insecure_resource() {
    let mut f = fixture();
    let found = classifier(false, false, false).classify_resource_event(
        &Address::parse("http://cdn.example.com/x.js"),
        ResourceStage::Start,
        &mut f.page,
        &mut f.stats,
        &mut f.log,
    );

    assert!(found);
    assert!(!f.page.is_secure);
    assert_eq!(f.stats.insecure_resource_requests, 1);
    assert_eq!(f.log.at(Level::Warning).len(), 1);
}

#[test]
fn test_secure_resource_logged_only_when_asked() {
    let resource = Address::parse("https://cdn.example.com/x.js");

    let mut quiet = fixture();
    classifier(false, false, false).classify_resource_event(
        &resource,
        ResourceStage::Start,
        &mut quiet.page,
        &mut quiet.stats,
        &mut quiet.log,
    );
    assert!(quiet.log.lines().is_empty());

    let mut verbose = fixture();
    classifier(false, false, true).classify_resource_event(
        &resource,
        ResourceStage::Start,
        &mut verbose.page,
        &mut verbose.stats,
        &mut verbose.log,
    );
    assert_eq!(verbose.log.at(Level::Trace).len(), 1);
    assert!(verbose.page.is_secure);
}

#[test]
fn test_ignore_flags_do_not_affect_resources() {
    let mut f = fixture();
    let found = classifier(true, true, false).classify_resource_event(
        &Address::parse("http://example.com/frame.html"),
        ResourceStage::Start,
        &mut f.page,
        &mut f.stats,
        &mut f.log,
    );

    assert!(found);
    assert_eq!(f.stats.insecure_resource_requests, 1);
}

// ============================================================================
// Page Verdict Tests
// ============================================================================

#[test]
fn test_page_insecure_only_from_resources_forms_iframes() {
    let mut f = fixture();
    let classifier = classifier(false, false, false);

    classifier.classify_link(
        &Address::parse("http://example.com/old"),
        &mut f.page,
        &mut f.stats,
        &mut f.log,
    );
    assert!(f.page.is_secure);

    classifier.classify_iframe_source(
        &Address::parse("http://example.com/frame"),
        &mut f.page,
        &mut f.stats,
        &mut f.log,
    );
    assert!(!f.page.is_secure);
    assert!(f.stats.has_insecurity());
}
