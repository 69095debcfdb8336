use crate::token::source_file::SourceFileId;

/// A single point in a source file: line and column are 1-based for
/// diagnostics, `offset` is the 0-based byte offset used for slicing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    pub offset: u32,
    pub line: u32,
    pub column: u32,
}

/// An immutable span within one source file. Once produced by the scanner a
/// `Location` is never mutated — later stages only ever clone it onto the
/// node they attach it to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    pub file: SourceFileId,
    pub start: Position,
    pub end: Position,
}

impl Location {
    pub fn new(file: SourceFileId, start: Position, end: Position) -> Self {
        debug_assert!(start.offset <= end.offset, "location must not be inverted");
        Self { file, start, end }
    }

    /// Merge two locations in the same file into the span that contains both.
    pub fn merge(self, other: Location) -> Location {
        debug_assert_eq!(self.file, other.file, "cannot merge locations across files");

        let start = if self.start.offset <= other.start.offset {
            self.start
        } else {
            other.start
        };
        let end = if self.end.offset >= other.end.offset {
            self.end
        } else {
            other.end
        };

        Location::new(self.file, start, end)
    }

    pub fn contains(&self, inner: &Location) -> bool {
        self.file == inner.file
            && self.start.offset <= inner.start.offset
            && self.end.offset >= inner.end.offset
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos(offset: u32, line: u32, column: u32) -> Position {
        Position {
            offset,
            line,
            column,
        }
    }

    #[test]
    fn merge_picks_outermost_bounds() {
        let file = SourceFileId(0);
        let a = Location::new(file, pos(4, 1, 5), pos(8, 1, 9));
        let b = Location::new(file, pos(0, 1, 1), pos(6, 1, 7));
        let merged = a.merge(b);
        assert_eq!(merged.start.offset, 0);
        assert_eq!(merged.end.offset, 8);
    }

    #[test]
    fn parent_location_contains_child() {
        let file = SourceFileId(0);
        let parent = Location::new(file, pos(0, 1, 1), pos(20, 1, 21));
        let child = Location::new(file, pos(4, 1, 5), pos(8, 1, 9));
        assert!(parent.contains(&child));
        assert!(!child.contains(&parent));
    }
}
