//! Reachability between nodes of a CFG
//!
//! A "connection" is a directed path from a matched start statement to a
//! matched end statement. Start and end are sought with caller-provided
//! predicates over statement nodes, which keeps the facility flexible
//! enough for both tests and later analyses. Traversal memoizes on branch
//! ids to break loops.

use crate::cfg::{BasicBlock, BranchId, Cfg};
use rc0_frontend::ast::Node;
use std::collections::HashSet;

pub type NodeMatcher<'a> = dyn Fn(&Node) -> bool + 'a;

/// Index just past the first statement at or after `from` matching `cb`
fn node_in_block(cb: &NodeMatcher, from: usize, b: &BasicBlock) -> Option<usize> {
    b.stmts[from.min(b.stmts.len())..]
        .iter()
        .position(|n| cb(n))
        .map(|i| from + i + 1)
}

fn connect(
    cfg: &Cfg,
    start: Option<&NodeMatcher>,
    end: &NodeMatcher,
    b: &BasicBlock,
    mem: &mut HashSet<BranchId>,
) -> bool {
    match start {
        None => {
            // Either the caller wants a path from function entry, or the
            // start was already found on an earlier call. Both reduce to
            // plain end-seeking.
            if node_in_block(end, 0, b).is_some() {
                return true;
            }
            b.successors.iter().any(|succ| {
                mem.insert(succ.id) && connect(cfg, None, end, cfg.block(succ.to), mem)
            })
        }
        Some(startcb) => {
            let istart = node_in_block(startcb, 0, b);
            let startend = istart.unwrap_or(0);
            let iend = node_in_block(end, startend, b);
            match (istart, iend) {
                // Both in the present block, the end after the start.
                (Some(_), Some(_)) => true,
                // Start here; recurse for the end with a nil start.
                (Some(_), None) => b.successors.iter().any(|succ| {
                    mem.insert(succ.id) && connect(cfg, None, end, cfg.block(succ.to), mem)
                }),
                // The end is here but the start is nowhere upstream.
                (None, Some(_)) => false,
                // Neither: recurse harder.
                (None, None) => b.successors.iter().any(|succ| {
                    mem.insert(succ.id) && connect(cfg, start, end, cfg.block(succ.to), mem)
                }),
            }
        }
    }
}

impl Cfg {
    /// Whether at least one branching path leads from a statement matched
    /// by `start` to one matched by `end`. A `None` start means the
    /// function entry.
    pub fn connect(&self, start: Option<&NodeMatcher>, end: &NodeMatcher) -> bool {
        connect(self, start, end, self.entry(), &mut HashSet::new())
    }
}
