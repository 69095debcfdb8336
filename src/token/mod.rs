//! Token and location model: the leaf data model every later stage is built on.

pub(crate) mod location;
pub(crate) mod source_file;
pub(crate) mod token;

pub use location::{Location, Position};
pub use source_file::{SourceFile, SourceFileId, SourceFileTable};
pub use token::{IntBase, Token, TokenKind};
