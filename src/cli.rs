//! Command-line surface (spec.md §6), hand-rolled the way the teacher's
//! `projects/cli.rs` parses `std::env::args()` itself rather than pulling in
//! a derive-macro arg parser — the teacher doesn't depend on `clap`, so this
//! doesn't either.
//!
//! Only the front-end/mid-end pipeline (through MIR) lives in this crate;
//! object emission, linking, and the embedded C subsystem are external
//! collaborators (spec.md §1 Non-goals), so `run`/`test`/`to`/`cc`/`cpp`
//! still run the pipeline and report diagnostics, then note that codegen is
//! handed off rather than performed here.

use crate::config::Config;
use crate::diagnostics::display::{messages_to_json, print_compiler_messages};
use crate::driver;
use saying::say;
use std::env;
use std::path::PathBuf;

const USAGE_ERROR: i32 = 2;
const COMPILE_FAILURE: i32 = 1;
const SUCCESS: i32 = 0;

enum TranspileTarget {
    Cc,
    Cpp,
    Js,
}

enum Command {
    Build { path: String, verbose: bool },
    Run { path: String, verbose: bool, args: Vec<String> },
    Test { path: String },
    Compile { path: String },
    To { path: String, target: TranspileTarget },
    Cc { path: String },
    Cpp { path: String },
    Init { path: String },
    New { name: String },
    Help,
}

struct Options {
    json_errors: bool,
}

pub fn start_cli() -> i32 {
    let raw_args: Vec<String> = env::args().collect();
    if raw_args.len() < 2 {
        print_help();
        return USAGE_ERROR;
    }

    let options = Options { json_errors: raw_args.iter().any(|a| a == "--json-errors") };

    let command = match parse_command(&raw_args[1..]) {
        Ok(command) => command,
        Err(message) => {
            say!(Red "error", ": ", message.as_str());
            print_help();
            return USAGE_ERROR;
        }
    };

    run_command(command, &options)
}

fn run_command(command: Command, options: &Options) -> i32 {
    match command {
        Command::Help => {
            print_help();
            SUCCESS
        }
        Command::Build { path, verbose } => run_pipeline(&path, verbose, options),
        Command::Compile { path } => run_pipeline(&path, false, options),
        Command::Run { path, verbose, args: _ } => {
            let code = run_pipeline(&path, verbose, options);
            if code == SUCCESS {
                say!(Yellow "note", ": execution is handed off to the LLVM backend (external collaborator, not part of this crate)");
            }
            code
        }
        Command::Test { path } => {
            let code = run_pipeline(&path, false, options);
            if code == SUCCESS {
                say!(Yellow "note", ": test execution is handed off to the LLVM backend (external collaborator)");
            }
            code
        }
        Command::To { path, target } => {
            let code = run_pipeline(&path, false, options);
            if code == SUCCESS {
                let name = match target {
                    TranspileTarget::Cc => "C",
                    TranspileTarget::Cpp => "C++",
                    TranspileTarget::Js => "JS",
                };
                say!(Yellow "note", ": ", name, " transpilation is an external collaborator, not part of this crate");
            }
            code
        }
        Command::Cc { path } | Command::Cpp { path } => {
            say!(Yellow "note", ": the embedded C subsystem (CI) is out of scope for this compiler");
            let _ = path;
            SUCCESS
        }
        Command::Init { path } => init_project(&path),
        Command::New { name } => new_project(&name),
    }
}

fn run_pipeline(path: &str, verbose: bool, options: &Options) -> i32 {
    let entry = PathBuf::from(if path.is_empty() { "src/main.lily" } else { path });

    if entry.extension().is_none_or(|ext| !ext.eq_ignore_ascii_case("lily")) {
        say!(Red "error", ": source files must use the '.lily' extension, got '", entry.display(), "'");
        return USAGE_ERROR;
    }

    let config = resolve_config(&entry);
    if verbose {
        say!(Bright "compiling", " '", config.entry_path().display(), "'");
    }

    let outcome = driver::compile(&config, None);

    if options.json_errors {
        println!("{}", messages_to_json(&outcome.messages));
    } else {
        print_compiler_messages(&outcome.messages);
    }

    if outcome.messages.has_errors() {
        COMPILE_FAILURE
    } else {
        SUCCESS
    }
}

/// Loads `lily.toml` from the entry file's directory when present, falling
/// back to a manifest-less single-file config otherwise.
fn resolve_config(entry: &std::path::Path) -> Config {
    let project_root = entry.parent().unwrap_or_else(|| std::path::Path::new("."));
    match Config::load(project_root) {
        Ok(config) => config,
        Err(_) => Config::single_file(entry),
    }
}

fn init_project(path: &str) -> i32 {
    let dir = if path.is_empty() { PathBuf::from(".") } else { PathBuf::from(path) };
    if let Err(error) = std::fs::create_dir_all(dir.join("src")) {
        say!(Red "error", ": could not create project directory: ", error.to_string().as_str());
        return COMPILE_FAILURE;
    }

    let manifest_path = dir.join(crate::config::MANIFEST_FILE_NAME);
    let name = dir
        .canonicalize()
        .ok()
        .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
        .unwrap_or_else(|| "project".to_string());

    let manifest = format!("[package]\nname = \"{name}\"\nversion = \"0.1.0\"\nentry = \"src/main.lily\"\n");
    if let Err(error) = std::fs::write(&manifest_path, manifest) {
        say!(Red "error", ": could not write '", manifest_path.display(), "': ", error.to_string().as_str());
        return COMPILE_FAILURE;
    }

    let main_path = dir.join("src/main.lily");
    if !main_path.exists() {
        let _ = std::fs::write(&main_path, "fun main() {\n}\n");
    }

    say!(Green "created", " project at '", dir.display(), "'");
    SUCCESS
}

fn new_project(name: &str) -> i32 {
    if name.is_empty() {
        say!(Red "error", ": 'new' requires a project name");
        return USAGE_ERROR;
    }
    init_project(name)
}

fn parse_command(args: &[String]) -> Result<Command, String> {
    let name = args.first().map(String::as_str).ok_or("no command given")?;
    let rest = &args[1..];
    let path_arg = || rest.iter().find(|a| !a.starts_with("--")).cloned().unwrap_or_default();
    let verbose = rest.iter().any(|a| a == "--verbose");

    match name {
        "help" | "--help" | "-h" => Ok(Command::Help),
        "build" => Ok(Command::Build { path: path_arg(), verbose }),
        "compile" => Ok(Command::Compile { path: path_arg() }),
        "run" => {
            let path = path_arg();
            let args: Vec<String> = rest.iter().filter(|a| !a.starts_with("--") && **a != path).cloned().collect();
            Ok(Command::Run { path, verbose, args })
        }
        "test" => Ok(Command::Test { path: path_arg() }),
        "to" => {
            let target = if rest.iter().any(|a| a == "--cpp") {
                TranspileTarget::Cpp
            } else if rest.iter().any(|a| a == "--js") {
                TranspileTarget::Js
            } else if rest.iter().any(|a| a == "--cc") {
                TranspileTarget::Cc
            } else {
                return Err("'to' requires one of --cc, --cpp, --js".to_string());
            };
            Ok(Command::To { path: path_arg(), target })
        }
        "cc" => Ok(Command::Cc { path: path_arg() }),
        "cpp" => Ok(Command::Cpp { path: path_arg() }),
        "init" => Ok(Command::Init { path: path_arg() }),
        "new" => Ok(Command::New { name: path_arg() }),
        other => Err(format!("unknown command '{other}'")),
    }
}

fn print_help() {
    say!(Bright "lilyc", " — the Lily compiler");
    println!("Usage: lilyc <command> [path] [flags]");
    println!();
    println!("Commands:");
    println!("  build <path>   builds a package through MIR and reports diagnostics");
    println!("  run <path>     builds, then hands execution to the LLVM backend");
    println!("  test <path>    builds, then hands test execution to the LLVM backend");
    println!("  compile <path> alias for build");
    println!("  to <path>      transpiles via --cc, --cpp, or --js (external collaborator)");
    println!("  cc <path>      invokes the embedded C subsystem (out of scope)");
    println!("  cpp <path>     invokes the embedded C subsystem (out of scope)");
    println!("  init [path]    writes a lily.toml manifest and src/main.lily stub");
    println!("  new <name>     creates a new project directory named <name>");
    println!();
    println!("Flags: --verbose  --json-errors  --max-stack-capacity=N  --max-heap-capacity=N");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_build_with_a_path() {
        let args = vec!["build".to_string(), "src/main.lily".to_string()];
        match parse_command(&args).unwrap() {
            Command::Build { path, verbose } => {
                assert_eq!(path, "src/main.lily");
                assert!(!verbose);
            }
            _ => panic!("expected Build"),
        }
    }

    #[test]
    fn rejects_to_without_a_target_flag() {
        let args = vec!["to".to_string(), "src/main.lily".to_string()];
        assert!(parse_command(&args).is_err());
    }

    #[test]
    fn rejects_unknown_commands() {
        let args = vec!["frobnicate".to_string()];
        assert!(parse_command(&args).is_err());
    }
}
