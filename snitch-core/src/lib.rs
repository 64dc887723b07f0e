use colored::Colorize;

pub mod crawl;
pub mod error;
pub mod log;
pub mod model;
pub mod report;
pub mod security;

pub use crawl::{AuditOptions, Auditor, CrawlState};
pub use error::AuditError;
pub use log::{AuditLog, ConsoleLog, Level, MemoryLog};
pub use model::{GlobalStats, PageAuditState, PageRecord, Verdict};
pub use report::AuditReport;

const BANNER: &str = r#"
   ███████╗███╗   ██╗██╗████████╗ ██████╗██╗  ██╗
   ██╔════╝████╗  ██║██║╚══██╔══╝██╔════╝██║  ██║
   ███████╗██╔██╗ ██║██║   ██║   ██║     ███████║
   ╚════██║██║╚██╗██║██║   ██║   ██║     ██╔══██║
   ███████║██║ ╚████║██║   ██║   ╚██████╗██║  ██║
   ╚══════╝╚═╝  ╚═══╝╚═╝   ╚═╝    ╚═════╝╚═╝  ╚═╝
"#;

pub fn print_banner() {
    println!("{}", BANNER.bright_blue().bold());
    println!(
        "   {} v{}\n",
        "mixed content auditor".bright_white(),
        env!("CARGO_PKG_VERSION")
    );
}
