//! Groups a package's preparsed declaration spans into a full [`AstDecl`]
//! list (spec.md §4.4). Each [`PreparsedItem`] parses independently of its
//! siblings, so a malformed declaration doesn't block the rest of the
//! package from parsing — mirroring the preparser's per-item error recovery.

pub(crate) mod cursor;
pub(crate) mod data_type;
pub(crate) mod decl;
pub(crate) mod expr;
pub(crate) mod pattern;
pub(crate) mod stmt;

use crate::ast::AstDecl;
use crate::diagnostics::errors::CompilerError;
use crate::precompiler::Package;
use crate::preparser::PreparsedItem;

pub struct ParsedPackage {
    pub decls: Vec<AstDecl>,
}

/// Parses every declaration in `package.preparsed_items`, collecting errors
/// from each item independently rather than aborting at the first failure.
pub fn parse_package(package: &Package) -> (ParsedPackage, Vec<CompilerError>) {
    let mut decls = Vec::with_capacity(package.preparsed_items.len());
    let mut errors = Vec::new();

    for item in &package.preparsed_items {
        match decl::parse_item(item) {
            Ok(decl) => decls.push(decl),
            Err(error) => errors.push(error),
        }
    }

    (ParsedPackage { decls }, errors)
}

fn item_by_name<'a>(items: &'a [PreparsedItem], name: &str) -> Option<&'a PreparsedItem> {
    items.iter().find(|item| item.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::precompiler::{PackageStatus, Visibility};
    use crate::preparser::Preparser;
    use crate::scanner::Scanner;
    use crate::string_interning::StringTable;
    use crate::token::SourceFileId;

    fn build_package(src: &str) -> Package {
        let mut strings = StringTable::default();
        let scan = Scanner::scan(src, SourceFileId(0), &mut strings);
        let (preparsed, errors) = Preparser::run(scan.tokens);
        assert!(errors.is_empty(), "unexpected preparser errors: {errors:?}");
        let mut package = Package::new("main", "main", Visibility::Public, PackageStatus::RootMain, SourceFileId(0));
        package.set_imports(preparsed.imports);
        package.set_preparsed_items(preparsed.items);
        package
    }

    #[test]
    fn parses_a_function_with_a_body() {
        let package = build_package("fun add(a: Int32, b: Int32) -> Int32 { return a + b }");
        let (parsed, errors) = parse_package(&package);
        assert!(errors.is_empty(), "unexpected parser errors: {errors:?}");
        assert_eq!(parsed.decls.len(), 1);
        match &parsed.decls[0].kind {
            crate::ast::AstDeclKind::Fun(fun) => {
                assert_eq!(fun.name, "add");
                assert_eq!(fun.params.len(), 2);
            }
            other => panic!("expected a function declaration, got {other:?}"),
        }
    }

    #[test]
    fn parses_a_record_type_and_a_constant() {
        let package = build_package("type Point = record { x: Int32, y: Int32 }\nconst ORIGIN: Point = Point{x: 0, y: 0}");
        let (parsed, errors) = parse_package(&package);
        assert!(errors.is_empty(), "unexpected parser errors: {errors:?}");
        assert_eq!(parsed.decls.len(), 2);
        assert!(item_by_name(&package.preparsed_items, "Point").is_some());
        assert!(item_by_name(&package.preparsed_items, "ORIGIN").is_some());
    }

    #[test]
    fn a_malformed_declaration_does_not_block_the_rest_of_the_package() {
        let package = build_package("fun broken(123) { }\nfun ok() { }");
        let (parsed, errors) = parse_package(&package);
        assert!(!errors.is_empty());
        assert!(parsed.decls.iter().any(|d| matches!(&d.kind, crate::ast::AstDeclKind::Fun(f) if f.name == "ok")));
    }
}
