use crate::arena::ArenaId;
use crate::catalog::{Catalog, KindId};
use crate::range::{Position, Range};

/// Identifier of an [`Occurrence`] within its line's arena.
pub type OccId = ArenaId<Occurrence>;

/// A single delimiter token found in the document.
///
/// Balanced kinds are always recorded with `is_open` true; whether such an
/// occurrence opens or closes a span is only decided during reduction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Occurrence {
    pub kind: KindId,
    pub is_open: bool,
    pub is_triple: bool,
    /// True when this occurrence starts at or before the cursor column on
    /// the cursor line, or on an earlier line.
    pub before_cursor: bool,
    pub line: usize,
    /// Byte offset of the first byte of the token.
    pub column: usize,
    /// Token length in bytes.
    pub len: usize,
}

impl Occurrence {
    /// Byte offset just past the token.
    pub fn end(&self) -> usize {
        self.column + self.len
    }

    /// The token text as registered in the catalog.
    pub fn token<'a>(&self, catalog: &'a Catalog) -> &'a str {
        let kind = &catalog[self.kind];
        if self.is_triple {
            // is_triple is only set for kinds that declare a triple form
            kind.triple().unwrap_or_else(|| kind.open())
        } else if self.is_open {
            kind.open()
        } else {
            kind.close().unwrap_or_else(|| kind.open())
        }
    }

    pub fn range(&self) -> Range {
        Range {
            start: Position {
                line: self.line,
                column: self.column,
            },
            end: Position {
                line: self.line,
                column: self.end(),
            },
        }
    }
}
