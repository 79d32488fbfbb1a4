use std::process::ExitCode;

fn main() -> ExitCode {
    pantree_cli::run()
}
