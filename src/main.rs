//! Binary entry point: parses arguments and maps the CLI's exit code
//! (spec.md §6: 0 success, 1 compile failure, 2 usage error) straight onto
//! the process exit code, the way the teacher's own `main.rs` forwards
//! `start_cli`'s result.

fn main() {
    std::process::exit(lilyc::cli::start_cli());
}
