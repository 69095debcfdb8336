pub(crate) mod dependency_tree;
pub(crate) mod package;
pub(crate) mod precompiler;
pub(crate) mod source;

pub use dependency_tree::{DependencyTreeNode, PackageDependencyTree};
pub use package::{Package, PackageId, PackageStatus, Visibility};
pub use precompiler::{PrecompileResult, Precompiler};
pub use source::{FsPackageSource, PackageSource};
