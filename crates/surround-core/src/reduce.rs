use std::collections::VecDeque;

use crate::catalog::Catalog;
use crate::scanner::occurrence::Occurrence;

/// Which disambiguation rules the fold applies.
///
/// Per-line reduction runs in [`Mode::Preprocess`], which defers every
/// balanced-kind decision: whether a quote opens or closes a span depends on
/// text the line cannot see. The merge controller re-folds with
/// [`Mode::Final`], where balanced occurrences toggle against each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Preprocess,
    Final,
}

/// Folds one occurrence into a reduction stack.
///
/// The stack stores caller-chosen references (arena ids locally, cross-line
/// refs globally); `occ` resolves a reference to its occurrence. The stack
/// invariant after every call: the top two entries never form a cancellable
/// pair under the current mode.
pub fn reduce<R, F>(stack: &mut VecDeque<R>, item: R, catalog: &Catalog, mode: Mode, occ: F)
where
    R: Copy,
    F: Fn(R) -> Occurrence,
{
    let incoming = occ(item);

    loop {
        let Some(&top_ref) = stack.back() else {
            stack.push_back(item);
            return;
        };
        let top = occ(top_ref);
        let top_kind = &catalog[top.kind];
        let incoming_kind = &catalog[incoming.kind];

        if mode == Mode::Preprocess && (top_kind.is_balanced() || incoming_kind.is_balanced()) {
            stack.push_back(item);
            return;
        }

        if top.kind == incoming.kind {
            if top_kind.is_balanced() || (top.is_open && !incoming.is_open) {
                stack.pop_back();
            } else {
                stack.push_back(item);
            }
            return;
        }

        if top.is_open && top_kind.priority() > incoming_kind.priority() {
            // swallowed inside a higher-priority open span
            return;
        }

        if !incoming.is_open && top_kind.priority() <= incoming_kind.priority() {
            stack.pop_back();
            continue;
        }

        stack.push_back(item);
        return;
    }
}

/// Drops trailing opens that cannot survive past the end of their line even
/// locally: kinds with no close token at all (a line comment opener).
pub fn prune_line_scope<R, F>(stack: &mut VecDeque<R>, catalog: &Catalog, occ: F)
where
    R: Copy,
    F: Fn(R) -> Occurrence,
{
    while let Some(&top_ref) = stack.back() {
        let top = occ(top_ref);
        if top.is_open && catalog[top.kind].close().is_none() {
            stack.pop_back();
        } else {
            break;
        }
    }
}

/// Drops trailing opens whose kind cannot carry across a line boundary.
/// Triple forms are exempt even when their base kind is line-scoped.
pub fn prune_cross_line<R, F>(stack: &mut VecDeque<R>, catalog: &Catalog, occ: F)
where
    R: Copy,
    F: Fn(R) -> Occurrence,
{
    while let Some(&top_ref) = stack.back() {
        let top = occ(top_ref);
        if top.is_open && !top.is_triple && !catalog[top.kind].spans_lines() {
            stack.pop_back();
        } else {
            break;
        }
    }
}
