//! CFG formation
//!
//! Simple recursion over statement lists: statements append to the
//! current block until a branching construct is met, which creates new
//! blocks and edges and recurses into the remaining statements.
//!
//! The recursion passes a "branch parent" describing where the current
//! block's fall-through edge must attach and with which kind. For an `if`
//! the fall-through is unconditional, but a loop body's closing edge is
//! the loop's false-kind: execution only leaves the loop once its
//! condition turns false. A loop also installs a loop context describing
//! where `break` and `continue` edges lead.

use crate::cfg::{
    BasicBlock, BlockId, Branch, BranchId, BranchKind, Cfg, BLOCK_ENTRY, BLOCK_EXIT,
};
use log::trace;
use rc0_frontend::ast::{Node, NodeId, NodeKind};

struct BranchParent {
    to: BlockId,
    node: Option<NodeId>,
    how: BranchKind,
}

struct LoopCtx {
    node: NodeId,
    break_to: BlockId,
    continue_to: BlockId,
}

struct Builder {
    blocks: Vec<BasicBlock>,
    next_branch: BranchId,
}

impl Builder {
    fn new() -> Self {
        Self {
            blocks: vec![BasicBlock::new(BLOCK_ENTRY), BasicBlock::new(BLOCK_EXIT)],
            next_branch: 0,
        }
    }

    fn new_block(&mut self) -> BlockId {
        let id = self.blocks.len();
        self.blocks.push(BasicBlock::new(id));
        id
    }

    fn new_stmt(&mut self, b: BlockId, n: &Node) {
        self.blocks[b].stmts.push(n.clone());
    }

    fn new_succ(&mut self, b: BlockId, rp: &BranchParent) {
        self.next_branch += 1;
        trace!(
            "branch {}: {} -> {} ({})",
            self.next_branch,
            b,
            rp.to,
            rp.how
        );
        self.blocks[b].successors.push(Branch {
            id: self.next_branch,
            from: b,
            to: rp.to,
            kind: rp.how,
            node: rp.node,
        });
    }

    /// Loops share one shape: `lb` is the loop body, `sb` the end-of-body
    /// block where a `for` loop's step statement lives, `afterloop` the
    /// first block beyond the loop.
    #[allow(clippy::too_many_arguments)]
    fn new_loop(
        &mut self,
        this: BlockId,
        n: &Node,
        body: &Node,
        kt: BranchKind,
        kf: BranchKind,
        rp: &BranchParent,
        lp: Option<&LoopCtx>,
        left: &[&Node],
        step: Option<&Node>,
    ) {
        let afterloop = self.new_block();
        self.form(afterloop, rp, lp, left);
        let lb = self.new_block();
        let sb = self.new_block();
        let step_stmts: Vec<&Node> = step.into_iter().collect();
        // The step block has a true-edge back into the loop body.
        self.form(sb, &BranchParent { to: lb, node: Some(n.id), how: kt }, None, &step_stmts);
        // break and continue mean immediate edges to post-loop and
        // step block respectively.
        let ctx = LoopCtx {
            node: n.id,
            break_to: afterloop,
            continue_to: sb,
        };
        // The loop body unconditionally falls through into the step
        // block, which runs on every iteration.
        let body_stmts = body.body_stmts();
        self.form(
            lb,
            &BranchParent { to: sb, node: Some(n.id), how: BranchKind::Always },
            Some(&ctx),
            &body_stmts,
        );
        // Conditional false-edge after the step block.
        self.new_succ(sb, &BranchParent { to: afterloop, node: Some(n.id), how: kf });
        // Entering the loop, and skipping it entirely.
        self.new_succ(this, &BranchParent { to: lb, node: Some(n.id), how: kt });
        self.new_succ(this, &BranchParent { to: afterloop, node: Some(n.id), how: kf });
    }

    fn new_if(
        &mut self,
        this: BlockId,
        n: &Node,
        then: &Node,
        otherwise: Option<&Node>,
        rp: &BranchParent,
        lp: Option<&LoopCtx>,
        left: &[&Node],
    ) {
        // Everything after the `if` goes on in its own block, which the
        // true and false arms reach unconditionally.
        let afterif = self.new_block();
        self.form(
            afterif,
            &BranchParent { to: rp.to, node: Some(n.id), how: rp.how },
            lp,
            left,
        );

        let t = self.new_block();
        let then_stmts = then.body_stmts();
        self.form(
            t,
            &BranchParent { to: afterif, node: Some(n.id), how: BranchKind::Always },
            lp,
            &then_stmts,
        );
        self.new_succ(this, &BranchParent { to: t, node: Some(n.id), how: BranchKind::IfTrue });

        match otherwise {
            Some(otherwise) => {
                let f = self.new_block();
                let else_stmts = otherwise.body_stmts();
                self.form(
                    f,
                    &BranchParent { to: afterif, node: Some(n.id), how: BranchKind::Always },
                    lp,
                    &else_stmts,
                );
                self.new_succ(
                    this,
                    &BranchParent { to: f, node: Some(n.id), how: BranchKind::IfFalse },
                );
            }
            None => {
                // No `else`: the false case goes straight past.
                self.new_succ(
                    this,
                    &BranchParent { to: afterif, node: Some(n.id), how: BranchKind::IfNoElse },
                );
            }
        }
    }

    fn form(&mut self, b: BlockId, rp: &BranchParent, lp: Option<&LoopCtx>, left: &[&Node]) {
        for (i, n) in left.iter().enumerate() {
            match &n.kind {
                NodeKind::If { cond: _, then, otherwise } => {
                    self.new_if(b, n, then, otherwise.as_deref(), rp, lp, &left[i + 1..]);
                    return;
                }
                NodeKind::For { init, cond: _, step, body } => {
                    self.new_stmt(b, init);
                    self.new_loop(
                        b,
                        n,
                        body,
                        BranchKind::ForTrue,
                        BranchKind::ForFalse,
                        rp,
                        lp,
                        &left[i + 1..],
                        Some(step),
                    );
                    return;
                }
                NodeKind::While { body, .. } => {
                    self.new_loop(
                        b,
                        n,
                        body,
                        BranchKind::WhileTrue,
                        BranchKind::WhileFalse,
                        rp,
                        lp,
                        &left[i + 1..],
                        None,
                    );
                    return;
                }
                NodeKind::Return(_) => {
                    // No statement after a return is reachable in this
                    // block.
                    self.new_stmt(b, n);
                    self.new_succ(
                        b,
                        &BranchParent {
                            to: BLOCK_EXIT,
                            node: Some(n.id),
                            how: BranchKind::Always,
                        },
                    );
                    return;
                }
                NodeKind::Break => {
                    let lp = lp.expect("missing loop context on break");
                    self.new_succ(
                        b,
                        &BranchParent {
                            to: lp.break_to,
                            node: Some(lp.node),
                            how: BranchKind::Always,
                        },
                    );
                    self.new_stmt(b, n);
                    return;
                }
                NodeKind::Continue => {
                    let lp = lp.expect("missing loop context on continue");
                    self.new_succ(
                        b,
                        &BranchParent {
                            to: lp.continue_to,
                            node: Some(lp.node),
                            how: BranchKind::Always,
                        },
                    );
                    self.new_stmt(b, n);
                    return;
                }
                _ => self.new_stmt(b, n),
            }
        }
        self.new_succ(b, rp);
    }
}

/// Form the control-flow graph of one function definition. The forest
/// must have passed analysis; in particular `break`/`continue` outside a
/// loop is a caller bug here.
pub fn form_cfg(fundef: &Node) -> Cfg {
    let NodeKind::FunDef { decl, body } = &fundef.kind else {
        panic!("forming a CFG of a non-function: {}", fundef);
    };
    let mut builder = Builder::new();
    let second = builder.new_block();
    builder.new_succ(
        BLOCK_ENTRY,
        &BranchParent { to: second, node: None, how: BranchKind::Always },
    );
    let stmts = body.body_stmts();
    builder.form(
        second,
        &BranchParent { to: BLOCK_EXIT, node: None, how: BranchKind::Always },
        None,
        &stmts,
    );
    Cfg {
        name: decl.name.clone(),
        blocks: builder.blocks,
    }
}
