use crate::address::Address;
use crate::error::Result;
use crate::renderer::{DomQuery, PageRenderer};

/// Everything pulled out of one loaded page
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    pub links: Vec<Address>,
    pub form_actions: Vec<Address>,
    pub iframe_sources: Vec<Address>,
}

fn extract<R: PageRenderer>(renderer: &R, query: DomQuery) -> Result<Vec<Address>> {
    // The renderer hands back absolute URLs, nothing is resolved here
    Ok(renderer
        .evaluate(query)?
        .iter()
        .map(|raw| Address::parse(raw))
        .collect())
}

pub fn extract_links<R: PageRenderer>(renderer: &R) -> Result<Vec<Address>> {
    extract(renderer, DomQuery::Links)
}

pub fn extract_form_actions<R: PageRenderer>(renderer: &R) -> Result<Vec<Address>> {
    extract(renderer, DomQuery::FormActions)
}

pub fn extract_iframe_sources<R: PageRenderer>(renderer: &R) -> Result<Vec<Address>> {
    extract(renderer, DomQuery::IframeSources)
}

pub fn extract_all<R: PageRenderer>(renderer: &R) -> Result<Extraction> {
    Ok(Extraction {
        links: extract_links(renderer)?,
        form_actions: extract_form_actions(renderer)?,
        iframe_sources: extract_iframe_sources(renderer)?,
    })
}
