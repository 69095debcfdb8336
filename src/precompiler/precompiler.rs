//! The precompiler driver (spec.md §4.3): walks a root package's imports,
//! recursively scans and preparses every `@file(...)` sub-package it finds,
//! resolves `@library`/`@url`/stdlib-root imports to dependency records
//! without recursing into them, detects import cycles with an in-progress
//! set during the walk, and assembles the `PackageDependencyTree` forest.
//!
//! The cache-directory step mirrors the teacher's
//! `build_system::build::write_project_outputs`, which creates its output
//! root with `fs::create_dir_all` and folds any failure into a
//! `CompilerError::File`.

use super::dependency_tree::PackageDependencyTree;
use super::package::{Package, PackageId, PackageStatus, Visibility};
use super::source::PackageSource;
use crate::diagnostics::errors::{CompilerError, ErrorLocation, ErrorType};
use crate::preparser::{ImportDirective, ImportRoot, Preparser};
use crate::scanner::Scanner;
use crate::string_interning::StringTable;
use crate::token::{SourceFile, SourceFileId, SourceFileTable};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

pub struct Precompiler<'a> {
    source: &'a dyn PackageSource,
    files: &'a mut SourceFileTable,
    strings: &'a mut StringTable,
    packages: Vec<Package>,
    /// Resolved, canonical-ish source path -> already-built package id, so a
    /// diamond-shaped import graph (A and B both import C) scans C once.
    by_path: std::collections::HashMap<PathBuf, PackageId>,
    tree: PackageDependencyTree,
    errors: Vec<CompilerError>,
}

/// Everything the precompiler produced for one compilation unit.
pub struct PrecompileResult {
    pub root: PackageId,
    pub packages: Vec<Package>,
    pub dependency_tree: PackageDependencyTree,
    pub errors: Vec<CompilerError>,
}

impl<'a> Precompiler<'a> {
    pub fn new(source: &'a dyn PackageSource, files: &'a mut SourceFileTable, strings: &'a mut StringTable) -> Self {
        Precompiler {
            source,
            files,
            strings,
            packages: Vec::new(),
            by_path: std::collections::HashMap::new(),
            tree: PackageDependencyTree::new(),
            errors: Vec::new(),
        }
    }

    /// Runs the precompiler over `root_path`, producing the root package,
    /// its full package list, and the dependency forest. `cache_dir`, if
    /// given, is created (or reused) as the compilation's output cache.
    pub fn run(mut self, root_path: &Path, cache_dir: Option<&Path>) -> PrecompileResult {
        let mut in_progress = HashSet::new();
        let root = match self.resolve_file_package(root_path, true, &mut in_progress) {
            Ok(id) => id,
            Err(_) => {
                return PrecompileResult {
                    root: PackageId(0),
                    packages: self.packages,
                    dependency_tree: self.tree,
                    errors: self.errors,
                };
            }
        };

        if let Some(dir) = cache_dir {
            if let Err(error) = std::fs::create_dir_all(dir) {
                self.errors.push(
                    CompilerError::new(
                        format!("Failed to create output cache directory '{}': {error}", dir.display()),
                        ErrorLocation::unknown(),
                        ErrorType::File,
                    )
                    .with_file_path(dir.to_path_buf()),
                );
            }
        }

        if let Err(cycle) = self.tree.compute_topological_order(&[root]) {
            let names: Vec<String> = cycle
                .iter()
                .map(|&id| self.packages[id.as_u32() as usize].global_name.clone())
                .collect();
            self.errors.push(CompilerError::new(
                format!("Import cycle detected among packages: {}", names.join(" -> ")),
                ErrorLocation::unknown(),
                ErrorType::Precompiler,
            ));
        }

        PrecompileResult {
            root,
            packages: self.packages,
            dependency_tree: self.tree,
            errors: self.errors,
        }
    }

    /// Scans, preparses, and registers the package rooted at `path`,
    /// recursing into every `@file(...)` import it carries. `in_progress`
    /// holds the canonicalized paths currently on the DFS stack so a cycle
    /// back to an ancestor is caught before it recurses infinitely.
    fn resolve_file_package(
        &mut self,
        path: &Path,
        is_root: bool,
        in_progress: &mut HashSet<PathBuf>,
    ) -> Result<PackageId, ()> {
        let canonical = path.to_path_buf();
        // Cycle check first: a path still on the DFS stack is a real cycle
        // regardless of whether it was already fully resolved once before
        // (it can't have been, or it wouldn't still be `in_progress`). Only
        // once that's ruled out does the `by_path` lookup apply, so a
        // diamond-shaped import (two already-finished branches sharing a
        // dependency) still scans that dependency once.
        if in_progress.contains(&canonical) {
            self.errors.push(CompilerError::new(
                format!("Import cycle detected at '{}'", path.display()),
                ErrorLocation::unknown(),
                ErrorType::Precompiler,
            ));
            return Err(());
        }
        if let Some(&existing) = self.by_path.get(&canonical) {
            return Ok(existing);
        }
        in_progress.insert(canonical.clone());

        let content = match self.source.read(path) {
            Ok(content) => content,
            Err(error) => {
                self.errors.push(CompilerError::new(
                    format!("Could not read package source '{}': {error}", path.display()),
                    ErrorLocation::unknown(),
                    ErrorType::File,
                ));
                in_progress.remove(&canonical);
                return Err(());
            }
        };

        let file_id = self.files.insert(SourceFile::new(path, content));
        let scan = Scanner::scan(self.files.get(file_id).content.as_str(), file_id, self.strings);
        crate::token_log!(path.display(), ": ", {scan.tokens.len()}, " tokens");
        self.push_located_errors(scan.errors, path);

        let (preparsed, preparser_errors) = Preparser::run(scan.tokens);
        crate::preparser_log!(path.display(), ": ", {preparsed.items.len()}, " preparsed items, ", {preparsed.imports.len()}, " imports");
        self.push_located_errors(preparser_errors, path);

        let name = package_name_from_path(path);
        // Full dotted qualification (root::sub::…) is assigned once the
        // analyzer builds the scope graph; the precompiler only needs a
        // stable per-package name for diagnostics and dependency records.
        let global_name = name.clone();
        let status = if is_root { PackageStatus::RootMain } else { PackageStatus::Normal };

        let mut package = Package::new(name, global_name, Visibility::Public, status, file_id);
        package.set_imports(preparsed.imports.clone());
        package.set_preparsed_items(preparsed.items);

        let package_id = PackageId(self.packages.len() as u32);
        self.packages.push(package);
        self.by_path.insert(canonical.clone(), package_id);
        self.tree.ensure_node(package_id);

        for import in &preparsed.imports {
            self.resolve_import(package_id, import, path, in_progress)?;
        }

        in_progress.remove(&canonical);
        Ok(package_id)
    }

    fn resolve_import(
        &mut self,
        package_id: PackageId,
        import: &ImportDirective,
        current_path: &Path,
        in_progress: &mut HashSet<PathBuf>,
    ) -> Result<(), ()> {
        match &import.root {
            ImportRoot::Std => self.register_library(package_id, "std"),
            ImportRoot::Core => self.register_library(package_id, "core"),
            ImportRoot::Sys => self.register_library(package_id, "sys"),
            ImportRoot::Builtin => self.register_library(package_id, "builtin"),
            ImportRoot::Library(name) => self.register_library(package_id, name),
            ImportRoot::Url(url) => self.register_library(package_id, url),
            ImportRoot::File(relative) => {
                let base = current_path.parent().unwrap_or_else(|| Path::new(""));
                let sub_path = base.join(relative);
                let sub_id = self.resolve_file_package(&sub_path, false, in_progress)?;
                self.packages[package_id.as_u32() as usize].sub_packages.push(sub_id);
                self.packages[package_id.as_u32() as usize].package_dependencies.push(sub_id);
                self.tree.add_edge(package_id, sub_id);
            }
        }
        Ok(())
    }

    fn register_library(&mut self, package_id: PackageId, name: &str) {
        let package = &mut self.packages[package_id.as_u32() as usize];
        if !package.library_dependencies.iter().any(|existing| existing == name) {
            package.library_dependencies.push(name.to_string());
        }
    }

    fn push_located_errors(&mut self, errors: Vec<CompilerError>, path: &Path) {
        self.errors
            .extend(errors.into_iter().map(|error| error.with_file_path(path.to_path_buf())));
    }
}

fn package_name_from_path(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::source::InMemoryPackageSource;

    fn run_over(entries: &[(&str, &str)], root: &str) -> PrecompileResult {
        let mut source = InMemoryPackageSource::new();
        for (path, content) in entries {
            source.insert(*path, *content);
        }
        let mut files = SourceFileTable::new();
        let mut strings = StringTable::new();
        Precompiler::new(&source, &mut files, &mut strings).run(Path::new(root), None)
    }

    #[test]
    fn builds_single_package_with_no_imports() {
        let result = run_over(&[("main.lily", "fun main() { }")], "main.lily");
        assert!(result.errors.is_empty());
        assert_eq!(result.packages.len(), 1);
        assert_eq!(result.packages[result.root.as_u32() as usize].status, PackageStatus::RootMain);
    }

    #[test]
    fn recurses_into_file_imports() {
        let result = run_over(
            &[
                ("main.lily", "@file(\"util.lily\")\nfun main() { }"),
                ("util.lily", "fun helper() { }"),
            ],
            "main.lily",
        );
        assert!(result.errors.is_empty());
        assert_eq!(result.packages.len(), 2);
        let root = &result.packages[result.root.as_u32() as usize];
        assert_eq!(root.sub_packages.len(), 1);
    }

    #[test]
    fn detects_import_cycle() {
        let result = run_over(
            &[
                ("a.lily", "@file(\"b.lily\")\nfun a() { }"),
                ("b.lily", "@file(\"a.lily\")\nfun b() { }"),
            ],
            "a.lily",
        );
        assert!(result.errors.iter().any(|e| e.error_type == ErrorType::Precompiler));
    }

    #[test]
    fn records_stdlib_and_library_imports_without_recursing() {
        let result = run_over(
            &[("main.lily", "@std.io\n@library(\"zlib\")\nfun main() { }")],
            "main.lily",
        );
        assert_eq!(result.packages.len(), 1);
        let root = &result.packages[result.root.as_u32() as usize];
        assert!(root.library_dependencies.contains(&"std".to_string()));
        assert!(root.library_dependencies.contains(&"zlib".to_string()));
    }
}
