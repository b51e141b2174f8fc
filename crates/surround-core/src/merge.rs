use std::collections::VecDeque;
use std::sync::{Condvar, Mutex};

use tracing::{debug, trace};

use crate::catalog::KindId;
use crate::reduce::{Mode, prune_cross_line, reduce};
use crate::scanner::occurrence::{OccId, Occurrence};
use crate::scanner::{LinePlan, ParseRequest, scan_line};

/// A reference into one line's occurrence arena, usable across lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct OccRef {
    line: usize,
    id: OccId,
}

/// Hands finished line plans to the merge controller, in line order.
///
/// `take_plan` is called exactly once per line index, in increasing order,
/// and may block until that line's scan has finished.
pub trait PlanSource {
    fn take_plan(&self, line: usize) -> LinePlan;
}

/// Scans lines on the calling thread, on demand.
pub struct SerialSource<'a> {
    request: &'a ParseRequest,
}

impl<'a> SerialSource<'a> {
    pub fn new(request: &'a ParseRequest) -> Self {
        Self { request }
    }
}

impl PlanSource for SerialSource<'_> {
    fn take_plan(&self, line: usize) -> LinePlan {
        scan_line(self.request, line)
    }
}

#[derive(Default)]
struct SlotState {
    plan: Option<LinePlan>,
    done: bool,
}

/// One scan task's output cell. `done` is written exactly once, under the
/// lock, and awaited by the merge controller.
#[derive(Default)]
pub struct LineSlot {
    state: Mutex<SlotState>,
    ready: Condvar,
}

impl LineSlot {
    pub fn fill(&self, plan: LinePlan) {
        let mut state = self.state.lock().expect("line slot poisoned");
        state.plan = Some(plan);
        state.done = true;
        self.ready.notify_one();
    }

    fn take(&self) -> LinePlan {
        let mut state = self.state.lock().expect("line slot poisoned");
        while !state.done {
            state = self.ready.wait(state).expect("line slot poisoned");
        }
        state.plan.take().expect("line plan taken twice")
    }
}

/// Blocks on the per-line slots filled by pooled scan tasks.
pub struct SlotSource<'a> {
    slots: &'a [LineSlot],
}

impl<'a> SlotSource<'a> {
    pub fn new(slots: &'a [LineSlot]) -> Self {
        Self { slots }
    }
}

impl PlanSource for SlotSource<'_> {
    fn take_plan(&self, line: usize) -> LinePlan {
        self.slots[line].take()
    }
}

/// Folds line plans into the global stack, outer to inner, restarting from a
/// shadowing open delimiter when one is found at the cursor.
pub fn merge<S: PlanSource>(request: &ParseRequest, source: &S) -> Vec<Occurrence> {
    Merger {
        request,
        source,
        plans: Vec::with_capacity(request.lines.len()),
        stack: VecDeque::new(),
    }
    .run()
}

struct Merger<'a, S> {
    request: &'a ParseRequest,
    source: &'a S,
    /// Plans consumed so far, indexed by line. Kept around so a restart can
    /// revisit an earlier line without rescanning it.
    plans: Vec<LinePlan>,
    stack: VecDeque<OccRef>,
}

impl<S: PlanSource> Merger<'_, S> {
    fn run(mut self) -> Vec<Occurrence> {
        let line_count = self.request.lines.len();
        let cursor = self.request.cursor;
        let mut bound: Option<OccRef> = None;
        // raw occurrence index to resume at, set only just after a restart
        let mut resume = 0;
        let mut line = 0;

        'lines: while line < line_count {
            self.pull_plans(line);

            if let Some(b) = bound {
                let bound_occ = self.occ(b);
                let ids: Vec<OccId> = self.plans[line].occurrences.ids().skip(resume).collect();
                resume = 0;
                for id in ids {
                    let item = OccRef { line, id };
                    let occ = self.occ(item);
                    if occ.kind == bound_occ.kind
                        && !occ.is_open
                        && !self.top_is_open_of(bound_occ.kind)
                    {
                        // the bound's scope closed without the target ever
                        // matching; the stack as it stands is the answer
                        trace!(line, column = occ.column, "bound scope exited");
                        return self.finish();
                    }
                    self.fold(item);
                }
            } else if line == cursor.line {
                let ids: Vec<OccId> = self.plans[line].cache.iter().copied().collect();
                let mut checked = false;
                for id in ids {
                    let item = OccRef { line, id };
                    if !checked && !self.occ(item).before_cursor {
                        checked = true;
                        if let Some(b) = self.shadowing_open() {
                            bound = Some(b);
                            (line, resume) = self.restart_from(b);
                            continue 'lines;
                        }
                    }
                    self.fold(item);
                }
                if !checked
                    && let Some(b) = self.shadowing_open()
                {
                    bound = Some(b);
                    (line, resume) = self.restart_from(b);
                    continue 'lines;
                }
            } else {
                let ids: Vec<OccId> = self.plans[line].cache.iter().copied().collect();
                for id in ids {
                    self.fold(OccRef { line, id });
                }
            }

            prune_cross_line(&mut self.stack, &self.request.catalog, |r| {
                self.plans[r.line].occurrences[r.id]
            });
            line += 1;
        }

        self.finish()
    }

    fn pull_plans(&mut self, line: usize) {
        while self.plans.len() <= line {
            let plan = self.source.take_plan(self.plans.len());
            self.plans.push(plan);
        }
    }

    fn fold(&mut self, item: OccRef) {
        reduce(&mut self.stack, item, &self.request.catalog, Mode::Final, |r| {
            self.plans[r.line].occurrences[r.id]
        });
    }

    fn occ(&self, r: OccRef) -> Occurrence {
        self.plans[r.line].occurrences[r.id]
    }

    /// An open, non-balanced occurrence of a kind other than the target,
    /// sitting on top of the stack at the cursor, shadows the target's true
    /// match and becomes the restart bound.
    fn shadowing_open(&self) -> Option<OccRef> {
        let &top = self.stack.back()?;
        let occ = self.occ(top);
        let kind = &self.request.catalog[occ.kind];

        (occ.is_open && occ.kind != self.request.target && !kind.is_balanced()).then_some(top)
    }

    /// Clears the stack and repositions just past the bound occurrence.
    fn restart_from(&mut self, b: OccRef) -> (usize, usize) {
        let occ = self.occ(b);
        debug!(
            line = occ.line,
            column = occ.column,
            "restarting merge past shadowing open"
        );
        self.stack.clear();
        (b.line, b.id.index() + 1)
    }

    fn top_is_open_of(&self, kind: KindId) -> bool {
        self.stack.back().is_some_and(|&r| {
            let occ = self.occ(r);
            occ.is_open && occ.kind == kind
        })
    }

    fn finish(self) -> Vec<Occurrence> {
        self.stack.iter().map(|&r| self.occ(r)).collect()
    }
}
