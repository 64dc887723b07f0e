use crate::CLAP_STYLING;
use clap::arg;

pub fn command_argument_builder() -> clap::Command {
    clap::Command::new("snitch")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("snitch")
        .about("Audit an HTTPS site for mixed content: insecure resources, forms and iframes")
        .styles(CLAP_STYLING)
        .arg(arg!(-q --"quiet" "Suppress banner and non-essential output").required(false))
        .arg(arg!(-v --"verbose" "Print debug diagnostics to stderr").required(false))
        .arg(
            arg!(-u --"url" <URL>)
                .required(false)
                .help("The secure (https) URL to start the audit from"),
        )
        .arg(
            arg!(--"crawl")
                .required(false)
                .help("Follow same-host links instead of auditing only the start page")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            arg!(--"logAllRequests")
                .required(false)
                .help("Log secure resource requests as well as insecure ones")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            arg!(--"ignoreIframes")
                .required(false)
                .help("Don't check iframe sources")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            arg!(--"ignoreForms")
                .required(false)
                .help("Don't check form actions")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            arg!(--"timeout" <SECONDS>)
                .required(false)
                .help("Request timeout in seconds")
                .value_parser(clap::value_parser!(u64))
                .default_value("30"),
        )
        .arg(
            arg!(-o --"output" <PATH>)
                .required(false)
                .help("Save a JSON report to a file (default: summary on screen only)"),
        )
}
