//! Fixed-size worker pool (spec.md §5): one `rayon::ThreadPool` job per
//! dependency-tree node. A job blocks on [`Handoff`] until every dependency
//! node's `is_done` flag is set, then runs parser -> analyzer -> MIR
//! generator for its own package and marks itself done. `MirModule`
//! construction only ever happens inside the job that owns its package, so
//! no two workers ever write the same module.

use crate::ast::AstDecl;
use crate::checked::analyze_package;
use crate::diagnostics::errors::CompilerError;
use crate::diagnostics::warnings::CompilerWarning;
use crate::mir::{generate_package, MirModule};
use crate::parser::parse_package;
use crate::precompiler::{Package, PackageDependencyTree, PackageId};
use std::collections::HashSet;
use std::sync::{Condvar, Mutex};

pub struct PackageResult {
    pub package_id: PackageId,
    pub mir: MirModule,
    pub errors: Vec<CompilerError>,
    pub warnings: Vec<CompilerWarning>,
}

/// "Is_done flags guarded by one mutex" (spec.md §5), implemented as a
/// blocking wait rather than a spin loop: a worker parks on the condvar
/// instead of busy-polling its dependencies.
struct Handoff {
    done: Mutex<HashSet<PackageId>>,
    condvar: Condvar,
}

impl Handoff {
    fn new() -> Self {
        Handoff {
            done: Mutex::new(HashSet::new()),
            condvar: Condvar::new(),
        }
    }

    fn wait_for(&self, deps: &[PackageId]) {
        if deps.is_empty() {
            return;
        }
        let mut guard = self.done.lock().expect("handoff mutex poisoned");
        while !deps.iter().all(|dep| guard.contains(dep)) {
            guard = self.condvar.wait(guard).expect("handoff mutex poisoned");
        }
    }

    fn mark_done(&self, id: PackageId) {
        let mut guard = self.done.lock().expect("handoff mutex poisoned");
        guard.insert(id);
        self.condvar.notify_all();
    }
}

pub struct WorkerPool {
    pool: rayon::ThreadPool,
}

impl WorkerPool {
    pub fn new(num_threads: usize) -> Result<Self, rayon::ThreadPoolBuildError> {
        let pool = rayon::ThreadPoolBuilder::new().num_threads(num_threads.max(1)).build()?;
        Ok(WorkerPool { pool })
    }

    /// Runs parser -> analyzer -> MIR generator for every package in
    /// `packages`, leaves of `tree` first. Spawn order follows
    /// `tree.topological_order` purely as a scheduling hint; correctness
    /// comes from each job blocking on its own dependency set, not from
    /// spawn order.
    pub fn compile_all(&self, packages: &[Package], tree: &PackageDependencyTree) -> Vec<PackageResult> {
        let handoff = Handoff::new();
        let results: Vec<Mutex<Option<PackageResult>>> = (0..packages.len()).map(|_| Mutex::new(None)).collect();
        // Each job publishes its own parsed decls here once `parse_package`
        // returns, so a dependent package can re-lower them into its own
        // analyzer once `handoff.wait_for` unblocks it — safe without extra
        // synchronization, since that unblock only happens after the
        // dependency's `mark_done` call below, which happens after this
        // write (spec.md line 197).
        let asts: Vec<Mutex<Option<Vec<AstDecl>>>> = (0..packages.len()).map(|_| Mutex::new(None)).collect();

        let order: Vec<PackageId> = if tree.topological_order.len() == packages.len() {
            tree.topological_order.clone()
        } else {
            (0..packages.len() as u32).map(PackageId).collect()
        };

        self.pool.scope(|scope| {
            for package_id in order {
                let index = package_id.as_u32() as usize;
                let package = &packages[index];
                let deps: Vec<PackageId> = tree.node(package_id).map(|node| node.dependencies.clone()).unwrap_or_default();
                let handoff = &handoff;
                let slot = &results[index];
                let asts = &asts;

                scope.spawn(move |_| {
                    handoff.wait_for(&deps);

                    let (parsed, mut errors) = parse_package(package);
                    crate::ast_log!(package.name.as_str(), ": ", {parsed.decls.len()}, " declarations parsed");

                    *asts[index].lock().expect("ast slot mutex poisoned") = Some(parsed.decls.clone());

                    let imported: Vec<AstDecl> = deps
                        .iter()
                        .flat_map(|dep| asts[dep.as_u32() as usize].lock().expect("ast slot mutex poisoned").clone().unwrap_or_default())
                        .collect();

                    let analyzed = analyze_package(&parsed.decls, &imported);
                    crate::analysis_log!(package.name.as_str(), ": ", {analyzed.errors.len()}, " errors, ", {analyzed.warnings.len()}, " warnings");

                    let mir = generate_package(&analyzed.decls, &analyzed.types);
                    crate::mir_log!(package.name.as_str(), ": ", {mir.functions.len()}, " functions lowered");
                    errors.extend(analyzed.errors);

                    *slot.lock().expect("result slot mutex poisoned") = Some(PackageResult {
                        package_id,
                        mir,
                        errors,
                        warnings: analyzed.warnings,
                    });
                    handoff.mark_done(package_id);
                });
            }
        });

        results
            .into_iter()
            .map(|slot| slot.into_inner().expect("result slot mutex poisoned").expect("every scheduled package produces a result"))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::precompiler::source::InMemoryPackageSource;
    use crate::precompiler::Precompiler;
    use crate::string_interning::StringTable;
    use crate::token::SourceFileTable;
    use std::path::Path;

    #[test]
    fn compiles_a_package_with_a_file_dependency() {
        let mut source = InMemoryPackageSource::new();
        source.insert("main.lily", "@file(\"util.lily\")\nfun main() -> Int32 { return helper() }");
        source.insert("util.lily", "fun helper() -> Int32 { return 1 }");

        let mut files = SourceFileTable::new();
        let mut strings = StringTable::new();
        let precompiled = Precompiler::new(&source, &mut files, &mut strings).run(Path::new("main.lily"), None);
        assert!(precompiled.errors.is_empty());

        let pool = WorkerPool::new(2).expect("builds a thread pool");
        let results = pool.compile_all(&precompiled.packages, &precompiled.dependency_tree);

        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.errors.is_empty()), "cross-package call to `helper` should resolve");
        assert!(results.iter().all(|r| r.mir.is_self_consistent()));
    }
}
