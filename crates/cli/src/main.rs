use std::process::ExitCode;

fn main() -> ExitCode {
    rankly_cli::run()
}
