use snitch::commands::command_argument_builder;
use snitch::handlers::{handle_audit, init_tracing};
use snitch_core::print_banner;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    let matches = command_argument_builder().get_matches();
    init_tracing(matches.get_flag("verbose"));

    // Show banner unless --quiet flag is set
    if !matches.get_flag("quiet") {
        print_banner();
    }

    let outcome = handle_audit(&matches).await;
    ExitCode::from(outcome.code())
}
