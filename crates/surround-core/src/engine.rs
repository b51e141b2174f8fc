use std::sync::Arc;

use tracing::debug;

use crate::catalog::{Catalog, KindId};
use crate::error::ResolveError;
use crate::merge::{LineSlot, SerialSource, SlotSource, merge};
use crate::pool::ThreadPool;
use crate::range::Position;
use crate::scanner::occurrence::Occurrence;
use crate::scanner::{ParseRequest, scan_line};

/// Resolves which delimiters enclose a cursor, reusing one worker pool
/// across calls.
///
/// With a pool, every line is scanned as a separate task while the merge
/// streams results on the calling thread; a cursor near the top of the
/// document typically finishes before later lines are even scanned. The
/// serial variant scans each line on demand instead and spawns no threads.
pub struct Engine {
    catalog: Catalog,
    pool: Option<ThreadPool>,
}

impl Engine {
    pub fn new(catalog: Catalog) -> Self {
        Self {
            catalog,
            pool: Some(ThreadPool::with_default_size()),
        }
    }

    pub fn with_pool_size(catalog: Catalog, size: usize) -> Self {
        Self {
            catalog,
            pool: Some(ThreadPool::new(size)),
        }
    }

    /// An engine that scans on the calling thread only.
    pub fn serial(catalog: Catalog) -> Self {
        Self {
            catalog,
            pool: None,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// The delimiters enclosing `cursor`, outermost first.
    ///
    /// `cursor.column` is a byte offset and may sit one past the end of its
    /// line; it must fall on a character boundary.
    pub fn resolve<S: AsRef<str>>(
        &self,
        lines: &[S],
        target: KindId,
        cursor: Position,
    ) -> Result<Vec<Occurrence>, ResolveError> {
        self.validate(lines, target, cursor)?;

        let request = ParseRequest {
            lines: lines.iter().map(|line| line.as_ref().to_string()).collect(),
            catalog: self.catalog.clone(),
            target,
            cursor,
        };
        debug!(
            lines = request.lines.len(),
            cursor_line = cursor.line,
            cursor_column = cursor.column,
            parallel = self.pool.is_some(),
            "resolving enclosing delimiters"
        );

        match &self.pool {
            Some(pool) => {
                let request = Arc::new(request);
                let slots: Arc<Vec<LineSlot>> = Arc::new(
                    (0..request.lines.len())
                        .map(|_| LineSlot::default())
                        .collect(),
                );
                for line in 0..request.lines.len() {
                    let request = Arc::clone(&request);
                    let slots = Arc::clone(&slots);
                    pool.submit(move || slots[line].fill(scan_line(&request, line)));
                }

                Ok(merge(&request, &SlotSource::new(&slots)))
            }
            None => Ok(merge(&request, &SerialSource::new(&request))),
        }
    }

    fn validate<S: AsRef<str>>(
        &self,
        lines: &[S],
        target: KindId,
        cursor: Position,
    ) -> Result<(), ResolveError> {
        if self.catalog.is_empty() {
            return Err(ResolveError::EmptyCatalog);
        }
        if self.catalog.get(target).is_none() {
            return Err(ResolveError::UnknownTargetKind(target.index()));
        }

        let invalid = || ResolveError::InvalidCursor {
            line: cursor.line,
            column: cursor.column,
        };
        let line = lines.get(cursor.line).ok_or_else(invalid)?;
        if !line.as_ref().is_char_boundary(cursor.column) {
            return Err(invalid());
        }

        Ok(())
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(Catalog::default())
    }
}

/// One-shot convenience over [`Engine::resolve`].
pub fn resolve_enclosing_delimiters<S: AsRef<str>>(
    lines: &[S],
    catalog: Catalog,
    target: KindId,
    cursor: Position,
) -> Result<Vec<Occurrence>, ResolveError> {
    Engine::new(catalog).resolve(lines, target, cursor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::ArenaId;
    use rstest::rstest;

    fn text(engine: &Engine, occurrences: &[Occurrence]) -> String {
        occurrences
            .iter()
            .map(|occ| occ.token(engine.catalog()))
            .collect()
    }

    #[rstest]
    #[case(&["(", ")"], "(", Position::new(0, 0))]
    #[case(&["(", "))"], "(", Position::new(0, 0))]
    #[case(&["(/*", ")"], "(", Position::new(0, 0))]
    #[case(&["(''')", "''')"], "(", Position::new(0, 0))]
    #[case(&["/*(", "*/)"], "(", Position::new(0, 3))]
    #[case(&["(", "')"], "'", Position::new(0, 0))]
    #[case(&["fn main() {", "    let x = [1, 2];", "}"], "{", Position::new(1, 8))]
    fn test_parallel_matches_serial(
        #[case] lines: &[&str],
        #[case] target: &str,
        #[case] cursor: Position,
    ) {
        let parallel = Engine::with_pool_size(Catalog::default(), 4);
        let serial = Engine::serial(Catalog::default());
        let target = serial.catalog().kind_of(target).unwrap();

        assert_eq!(
            parallel.resolve(lines, target, cursor).unwrap(),
            serial.resolve(lines, target, cursor).unwrap()
        );
    }

    #[test]
    fn test_resolve_reports_enclosing_pairs() {
        let engine = Engine::serial(Catalog::default());
        let target = engine.catalog().kind_of("{").unwrap();
        let lines = ["fn main() {", "    let x = 1;"];

        let result = engine.resolve(&lines, target, Position::new(1, 4)).unwrap();
        assert_eq!(text(&engine, &result), "{");
    }

    #[test]
    fn test_empty_catalog_fails_fast() {
        let engine = Engine::serial(Catalog::new(vec![]));

        assert_eq!(
            engine.resolve(&["("], ArenaId::new(0), Position::new(0, 0)),
            Err(ResolveError::EmptyCatalog)
        );
    }

    #[test]
    fn test_unknown_target_kind_is_rejected() {
        let engine = Engine::serial(Catalog::default());

        assert_eq!(
            engine.resolve(&["("], ArenaId::new(99), Position::new(0, 0)),
            Err(ResolveError::UnknownTargetKind(99))
        );
    }

    #[rstest]
    #[case(Position::new(2, 0))]
    #[case(Position::new(0, 9))]
    fn test_cursor_outside_document_is_rejected(#[case] cursor: Position) {
        let engine = Engine::serial(Catalog::default());
        let target = engine.catalog().kind_of("(").unwrap();

        assert_eq!(
            engine.resolve(&["(abc)", ")"], target, cursor),
            Err(ResolveError::InvalidCursor {
                line: cursor.line,
                column: cursor.column
            })
        );
    }

    #[test]
    fn test_cursor_inside_multibyte_char_is_rejected() {
        let engine = Engine::serial(Catalog::default());
        let target = engine.catalog().kind_of("(").unwrap();

        assert!(matches!(
            engine.resolve(&["(é)"], target, Position::new(0, 2)),
            Err(ResolveError::InvalidCursor { .. })
        ));
    }

    #[test]
    fn test_cursor_at_end_of_line_is_valid() {
        let engine = Engine::serial(Catalog::default());
        let target = engine.catalog().kind_of("(").unwrap();

        let result = engine.resolve(&["("], target, Position::new(0, 1)).unwrap();
        assert_eq!(text(&engine, &result), "(");
    }

    #[test]
    fn test_one_shot_entry_point() {
        let catalog = Catalog::default();
        let target = catalog.kind_of("(").unwrap();

        let result =
            resolve_enclosing_delimiters(&["((", ")"], catalog.clone(), target, Position::new(0, 0))
                .unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].token(&catalog), "(");
    }
}
