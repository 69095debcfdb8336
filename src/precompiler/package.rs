//! The package data model (spec.md §3): one `Package` per `.lily` source
//! file, addressed by a small `Copy` handle the way `SourceFileId` addresses
//! entries in the `SourceFileTable`.
//!
//! AST, checked-tree, and MIR state are deliberately absent here — those get
//! attached by the later pipeline stages once those modules exist, rather
//! than speculatively stubbed out now.

use crate::preparser::{ImportDirective, PreparsedItem};
use crate::token::SourceFileId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct PackageId(pub(crate) u32);

impl PackageId {
    pub fn as_u32(self) -> u32 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Public,
    Private,
}

/// A package's role in the compilation, per spec.md §3. `RootMain` is the
/// entry package invoked on the command line; `SubMain` is a package with a
/// `main` declaration reachable only as a sub-package; `LibMain`/`LibSub`
/// mirror the distinction for library dependencies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageStatus {
    RootMain,
    SubMain,
    Normal,
    LibMain,
    LibSub,
}

#[derive(Debug, Clone)]
pub struct Package {
    pub name: String,
    pub global_name: String,
    pub visibility: Visibility,
    pub status: PackageStatus,
    pub source_file: SourceFileId,
    pub sub_packages: Vec<PackageId>,
    pub public_imports: Vec<ImportDirective>,
    pub private_imports: Vec<ImportDirective>,
    pub package_dependencies: Vec<PackageId>,
    pub library_dependencies: Vec<String>,
    /// Declaration spans the preparser grouped but left unparsed, handed to
    /// the parser stage to turn into [`crate::ast::AstDecl`]s.
    pub preparsed_items: Vec<PreparsedItem>,
}

impl Package {
    pub fn new(
        name: impl Into<String>,
        global_name: impl Into<String>,
        visibility: Visibility,
        status: PackageStatus,
        source_file: SourceFileId,
    ) -> Self {
        Package {
            name: name.into(),
            global_name: global_name.into(),
            visibility,
            status,
            source_file,
            sub_packages: Vec::new(),
            public_imports: Vec::new(),
            private_imports: Vec::new(),
            package_dependencies: Vec::new(),
            library_dependencies: Vec::new(),
            preparsed_items: Vec::new(),
        }
    }

    /// Splits a preparser's flat import list into this package's public and
    /// private import sets, per each directive's `exported` flag.
    pub fn set_imports(&mut self, imports: Vec<ImportDirective>) {
        self.public_imports.clear();
        self.private_imports.clear();
        for import in imports {
            if import.exported {
                self.public_imports.push(import);
            } else {
                self.private_imports.push(import);
            }
        }
    }

    pub fn all_imports(&self) -> impl Iterator<Item = &ImportDirective> {
        self.public_imports.iter().chain(self.private_imports.iter())
    }

    pub fn set_preparsed_items(&mut self, items: Vec<PreparsedItem>) {
        self.preparsed_items = items;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_imports_splits_by_exported_flag() {
        use crate::preparser::ImportRoot;
        use crate::token::{Location, Position};

        let loc = Location::new(SourceFileId(0), Position::default(), Position::default());
        let public = ImportDirective {
            root: ImportRoot::Std,
            path: vec!["io".into()],
            alias: None,
            members: Vec::new(),
            exported: true,
            location: loc,
        };
        let private = ImportDirective {
            exported: false,
            ..public.clone()
        };

        let mut package = Package::new("main", "app::main", Visibility::Public, PackageStatus::RootMain, SourceFileId(0));
        package.set_imports(vec![public, private]);

        assert_eq!(package.public_imports.len(), 1);
        assert_eq!(package.private_imports.len(), 1);
    }
}
