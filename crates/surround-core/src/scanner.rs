pub mod occurrence;

use std::collections::VecDeque;

use tracing::trace;

use crate::arena::Arena;
use crate::catalog::{Catalog, KindId};
use crate::range::{Position, Range};
use crate::reduce::{Mode, prune_line_scope, reduce};
use crate::scanner::occurrence::{OccId, Occurrence};

/// Immutable context shared by every scan task and the merge controller.
#[derive(Debug, Clone)]
pub struct ParseRequest {
    pub lines: Vec<String>,
    pub catalog: Catalog,
    pub target: KindId,
    pub cursor: Position,
}

/// Per-line scan output: every occurrence in scan order plus the locally
/// reduced cache (preprocessing mode, so balanced kinds are deferred).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinePlan {
    pub occurrences: Arena<Occurrence>,
    pub cache: VecDeque<OccId>,
}

/// Scans one line of the request.
///
/// A pure function of its input: rerunning a scan produces an identical
/// plan, so scan tasks need no teardown on restart. Each matched occurrence
/// is folded into the local cache as it is found; trailing opens whose kind
/// has no close token are pruned before returning.
pub fn scan_line(request: &ParseRequest, line_index: usize) -> LinePlan {
    let line = &request.lines[line_index];
    let mut plan = LinePlan::default();
    let mut col = 0;

    while col < line.len() {
        if line.as_bytes()[col] == b'\\' {
            // the escape consumes itself and the following character; a
            // trailing backslash consumes just itself
            col += 1;
            if col < line.len() {
                col += char_width(line, col);
            }
            continue;
        }

        match match_at(request, line_index, line, col) {
            Some((kind, is_open, is_triple, len)) => {
                let before_cursor = line_index < request.cursor.line
                    || (line_index == request.cursor.line && col <= request.cursor.column);
                let id = plan.occurrences.alloc(Occurrence {
                    kind,
                    is_open,
                    is_triple,
                    before_cursor,
                    line: line_index,
                    column: col,
                    len,
                });
                reduce(
                    &mut plan.cache,
                    id,
                    &request.catalog,
                    Mode::Preprocess,
                    |r| plan.occurrences[r],
                );
                col += len;
            }
            None => col += char_width(line, col),
        }
    }

    prune_line_scope(&mut plan.cache, &request.catalog, |r| plan.occurrences[r]);
    trace!(
        line_index,
        occurrences = plan.occurrences.len(),
        cached = plan.cache.len(),
        "scanned line"
    );

    plan
}

/// Tries every catalog kind at `col`, longest form first within a kind
/// (triple, then open, then close). The first accepted match wins.
fn match_at(
    request: &ParseRequest,
    line_index: usize,
    line: &str,
    col: usize,
) -> Option<(KindId, bool, bool, usize)> {
    let rest = &line[col..];

    for id in request.catalog.ids() {
        let kind = &request.catalog[id];

        if let Some(triple) = kind.triple()
            && rest.starts_with(triple)
            && accepts(request, line_index, col, triple.len())
        {
            return Some((id, true, true, triple.len()));
        }
        if rest.starts_with(kind.open()) && accepts(request, line_index, col, kind.open().len()) {
            return Some((id, true, false, kind.open().len()));
        }
        if !kind.is_balanced()
            && let Some(close) = kind.close()
            && rest.starts_with(close)
            && accepts(request, line_index, col, close.len())
        {
            return Some((id, false, false, close.len()));
        }
    }

    None
}

/// A match that straddles the cursor on the cursor's own line is rejected:
/// the token under the cursor must not be classified as a delimiter.
fn accepts(request: &ParseRequest, line_index: usize, col: usize, len: usize) -> bool {
    let range = Range {
        start: Position::new(line_index, col),
        end: Position::new(line_index, col + len),
    };

    !range.straddles(&request.cursor)
}

fn char_width(line: &str, col: usize) -> usize {
    line[col..].chars().next().map_or(1, char::len_utf8)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    fn request(lines: &[&str], cursor: Position) -> ParseRequest {
        let catalog = Catalog::default();
        let target = catalog.kind_of("(").unwrap();
        ParseRequest {
            lines: lines.iter().map(|s| s.to_string()).collect(),
            catalog,
            target,
            cursor,
        }
    }

    fn occurrences_text(plan: &LinePlan, catalog: &Catalog) -> String {
        plan.occurrences
            .ids()
            .map(|id| plan.occurrences[id].token(catalog))
            .collect()
    }

    fn cache_text(plan: &LinePlan, catalog: &Catalog) -> String {
        plan.cache
            .iter()
            .map(|&id| plan.occurrences[id].token(catalog))
            .collect()
    }

    #[rstest]
    #[case("(", "(", "(")]
    #[case("((", "((", "((")]
    #[case(")", ")", ")")]
    #[case("))", "))", "))")]
    #[case("()", "()", "")]
    #[case("(text))", "())", ")")]
    #[case("((text)", "(()", "(")]
    #[case("(//)", "(//)", "(")]
    #[case("(//()", "(//()", "(")]
    #[case("(/*)*/", "(/*)*/", "(")]
    #[case("(/*)*/)", "(/*)*/)", "")]
    #[case("'(", "'(", "'(")]
    #[case("(')", "(')", "(')")]
    #[case("'''", "'''", "'''")]
    #[case("''''", "''''", "''''")]
    #[case("(''')", "(''')", "(''')")]
    #[case("\\(", "", "")]
    #[case("\\()", ")", ")")]
    #[case("(\\)", "(", "(")]
    #[case("(\\))", "()", "")]
    #[case("(\\", "(", "(")]
    fn test_scan_line(#[case] line: &str, #[case] occurrences: &str, #[case] cache: &str) {
        let request = request(&[line], Position::new(0, 0));
        let plan = scan_line(&request, 0);

        assert_eq!(occurrences_text(&plan, &request.catalog), occurrences);
        assert_eq!(cache_text(&plan, &request.catalog), cache);
    }

    #[test]
    fn test_cursor_straddling_triple_falls_back_to_singles() {
        let request = request(&["'''"], Position::new(0, 1));
        let plan = scan_line(&request, 0);

        assert_eq!(plan.occurrences.len(), 3);
        assert!(plan.occurrences.ids().all(|id| !plan.occurrences[id].is_triple));
    }

    #[test]
    fn test_before_cursor_split() {
        let request = request(&["()()"], Position::new(0, 2));
        let plan = scan_line(&request, 0);
        let flags: Vec<bool> = plan
            .occurrences
            .ids()
            .map(|id| plan.occurrences[id].before_cursor)
            .collect();

        assert_eq!(flags, vec![true, true, true, false]);
    }

    #[test]
    fn test_lines_after_cursor_are_never_before_cursor() {
        let request = request(&["(", ")"], Position::new(0, 0));
        let plan = scan_line(&request, 1);

        assert!(plan.occurrences.ids().all(|id| !plan.occurrences[id].before_cursor));
    }

    #[test]
    fn test_multibyte_text_between_delimiters() {
        let request = request(&["(héllo✓)"], Position::new(0, 0));
        let plan = scan_line(&request, 0);

        assert_eq!(occurrences_text(&plan, &request.catalog), "()");
        assert!(cache_text(&plan, &request.catalog).is_empty());
    }

    proptest! {
        #[test]
        fn test_scan_is_pure(line in "[ -~]{0,40}") {
            let request = request(&[line.as_str()], Position::new(0, 0));
            prop_assert_eq!(scan_line(&request, 0), scan_line(&request, 0));
        }

        #[test]
        fn test_open_only_lines_keep_full_cache(n in 1usize..20) {
            let line = "(".repeat(n);
            let request = request(&[line.as_str()], Position::new(0, 0));
            let plan = scan_line(&request, 0);

            prop_assert_eq!(plan.occurrences.len(), n);
            prop_assert_eq!(plan.cache.len(), n);
        }

        #[test]
        fn test_nested_brackets_reduce_to_empty(n in 1usize..20) {
            let line = format!("{}{}", "(".repeat(n), ")".repeat(n));
            let request = request(&[line.as_str()], Position::new(0, 0));
            let plan = scan_line(&request, 0);

            prop_assert_eq!(plan.occurrences.len(), 2 * n);
            prop_assert!(plan.cache.is_empty());
        }
    }
}
