use std::process::ExitCode;

fn main() -> ExitCode {
    cleardesk_cli::run()
}
