use std::process::ExitCode;

fn main() -> ExitCode {
    shopmind_cli::run()
}
