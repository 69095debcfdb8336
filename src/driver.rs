//! Top-level pipeline orchestration (spec.md §1/§5): wires the precompiler,
//! worker pool, and diagnostic aggregation into the single entry point the
//! CLI calls. The precompiler runs on the driver thread; everything after it
//! runs on [`WorkerPool`], one job per dependency-tree node.

use crate::concurrency::WorkerPool;
use crate::config::Config;
use crate::diagnostics::errors::{CompilerError, CompilerMessages, ErrorLocation, ErrorType};
use crate::diagnostics::warnings::CompilerWarning;
use crate::mir::MirModule;
use crate::precompiler::{FsPackageSource, PackageId, Precompiler};
use crate::string_interning::StringTable;
use crate::token::SourceFileTable;

pub struct CompileOutcome {
    pub messages: CompilerMessages,
    /// One MIR module per compiled package, in precompiler registration
    /// order (index == `PackageId::as_u32`).
    pub modules: Vec<MirModule>,
}

impl CompileOutcome {
    pub fn root_module(&self, root: PackageId) -> Option<&MirModule> {
        self.modules.get(root.as_u32() as usize)
    }
}

/// Runs the full pipeline over the project described by `config`.
/// `cache_dir`, if given, is created by the precompiler as the build's
/// output cache (spec.md §4.3).
pub fn compile(config: &Config, cache_dir: Option<&std::path::Path>) -> CompileOutcome {
    let start = std::time::Instant::now();
    let entry = config.entry_path();
    if !entry.exists() {
        let mut messages = CompilerMessages::new();
        messages.errors.push(
            CompilerError::new(
                format!("Entry file '{}' does not exist", entry.display()),
                ErrorLocation::unknown(),
                ErrorType::File,
            )
            .with_file_path(entry.clone()),
        );
        return CompileOutcome { messages, modules: Vec::new() };
    }

    let source = FsPackageSource;
    let mut files = SourceFileTable::new();
    let mut strings = StringTable::new();
    let precompiled = Precompiler::new(&source, &mut files, &mut strings).run(&entry, cache_dir);

    let mut messages = CompilerMessages::new();
    messages.errors.extend(precompiled.errors);

    if messages.has_errors() {
        return CompileOutcome { messages, modules: Vec::new() };
    }

    let num_threads = std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1);
    let pool = match WorkerPool::new(num_threads) {
        Ok(pool) => pool,
        Err(error) => {
            messages.errors.push(CompilerError::compiler_bug(format!("failed to start worker pool: {error}")));
            return CompileOutcome { messages, modules: Vec::new() };
        }
    };

    let mut results = pool.compile_all(&precompiled.packages, &precompiled.dependency_tree);
    results.sort_by_key(|result| result.package_id.as_u32());

    let mut modules = Vec::with_capacity(results.len());
    let mut warnings: Vec<CompilerWarning> = Vec::new();
    for result in results {
        messages.errors.extend(result.errors);
        warnings.extend(result.warnings);
        modules.push(result.mir);
    }
    messages.warnings = warnings;
    crate::timer_log!(start, "compiled in ");

    CompileOutcome { messages, modules }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_project(dir: &tempfile::TempDir, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).expect("creates fixture file");
        file.write_all(content.as_bytes()).expect("writes fixture file");
        path
    }

    #[test]
    fn compiles_a_single_file_project_with_no_errors() {
        let dir = tempfile::tempdir().expect("creates temp dir");
        let entry = write_project(&dir, "main.lily", "fun main() { }");

        let config = Config::single_file(&entry);
        let outcome = compile(&config, None);

        assert!(!outcome.messages.has_errors(), "{:?}", outcome.messages.errors);
        assert_eq!(outcome.modules.len(), 1);
    }

    #[test]
    fn reports_a_missing_entry_file_as_a_file_error() {
        let dir = tempfile::tempdir().expect("creates temp dir");
        let config = Config::single_file(&dir.path().join("nope.lily"));
        let outcome = compile(&config, None);

        assert!(outcome.messages.has_errors());
        assert_eq!(outcome.messages.errors[0].error_type, ErrorType::File);
    }
}
