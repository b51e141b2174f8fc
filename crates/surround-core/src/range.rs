/// A position inside a block of lines.
///
/// `line` is a zero-based line index and `column` a byte offset within that
/// line. Cursor positions may sit one past the last byte of a line (the
/// "end of line" cursor).
#[derive(PartialEq, Eq, PartialOrd, Ord, Debug, Clone, Copy, Default, Hash)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Position { line, column }
    }
}

/// A half-open span `[start, end)` within a block of lines.
#[derive(PartialEq, Eq, PartialOrd, Ord, Debug, Clone, Copy, Default, Hash)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

impl Range {
    /// Returns `true` if `position` falls strictly inside this range.
    pub fn straddles(&self, position: &Position) -> bool {
        (self.start.line < position.line
            || (self.start.line == position.line && self.start.column < position.column))
            && (self.end.line > position.line
                || (self.end.line == position.line && self.end.column > position.column))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Position::new(0, 0), Position::new(0, 3), Position::new(0, 1), true)]
    #[case(Position::new(0, 0), Position::new(0, 3), Position::new(0, 0), false)]
    #[case(Position::new(0, 0), Position::new(0, 3), Position::new(0, 3), false)]
    #[case(Position::new(0, 0), Position::new(1, 1), Position::new(0, 9), true)]
    fn test_straddles(
        #[case] start: Position,
        #[case] end: Position,
        #[case] position: Position,
        #[case] expected: bool,
    ) {
        assert_eq!(Range { start, end }.straddles(&position), expected);
    }
}
