pub mod address;
pub mod error;
pub mod extract;
pub mod frontier;
pub mod http;
pub mod renderer;

pub use address::Address;
pub use error::ScanError;
pub use extract::Extraction;
pub use frontier::Frontier;
pub use http::HttpRenderer;
pub use renderer::{DomQuery, EventSink, PageLoad, PageRenderer, ResourceEvent, ResourceStage};
