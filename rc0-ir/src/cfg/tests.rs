use crate::cfg::{form_cfg, BranchKind, Cfg};
use rc0_frontend::ast::{Node, NodeKind};
use rc0_frontend::Frontend;

/// Lex, parse and analyze; the code must be clean. Returns the CFG of the
/// first function definition.
fn cfg_for(code: &str) -> Cfg {
    let unit = Frontend::analyze_source("<test>", code)
        .unwrap_or_else(|errs| panic!("analysis failed: {:?}", errs));
    let fundef = unit
        .nodes
        .iter()
        .find(|n| matches!(n.kind, NodeKind::FunDef { .. }))
        .expect("no function definition");
    form_cfg(fundef)
}

/// Matches the numeric literal expression statement `i;`
fn num(i: i32) -> impl Fn(&Node) -> bool {
    move |n: &Node| matches!(n.kind, NodeKind::Numeric { value, .. } if value == i)
}

/// Matches `return i;`
fn ret(i: i32) -> impl Fn(&Node) -> bool {
    move |n: &Node| match &n.kind {
        NodeKind::Return(Some(expr)) => {
            matches!(expr.kind, NodeKind::Numeric { value, .. } if value == i)
        }
        _ => false,
    }
}

#[test]
fn test_basic() {
    let c = cfg_for("void a() { return; }");
    assert_eq!(c.entry().id, 0);
    // Entry has the single fall-in edge to the first content block.
    assert_eq!(c.entry().successors.len(), 1);
    assert_eq!(c.entry().successors[0].kind, BranchKind::Always);
}

#[test]
fn test_if_else() {
    let c = cfg_for(
        "void f() {
             0;
             if (true)
                 1;
             else
                 2;
             3;
         }",
    );
    assert!(c.connect(Some(&num(0)), &num(1)));
    assert!(c.connect(Some(&num(0)), &num(2)));
    assert!(c.connect(Some(&num(0)), &num(3)));
    assert!(!c.connect(Some(&num(1)), &num(2)));
}

#[test]
fn test_if_without_else_connects_past() {
    // Every statement is reachable from the function entry, and the
    // then-arm cannot reach the else that is not there.
    let c = cfg_for("void f() { int i = 1; if (true) 1; else 2; 3; }");
    assert!(c.connect(None, &num(1)));
    assert!(c.connect(None, &num(2)));
    assert!(c.connect(None, &num(3)));
    assert!(!c.connect(Some(&num(1)), &num(2)));
}

#[test]
fn test_if_early_return() {
    let c = cfg_for(
        "int a() {
             0;
             if (true) {
                 1;
                 return 10;
             }
             2;
             return 20;
         }",
    );
    assert!(c.connect(Some(&num(0)), &num(1)));
    assert!(c.connect(Some(&num(0)), &num(2)));
    assert!(c.connect(Some(&num(1)), &ret(10)));
    assert!(!c.connect(Some(&num(1)), &num(0)));
    assert!(!c.connect(Some(&num(2)), &num(0)));
    assert!(!c.connect(Some(&num(2)), &num(1)));
    assert!(!c.connect(Some(&num(1)), &ret(20)));
}

#[test]
fn test_if_nested() {
    let c = cfg_for(
        "int a() {
             0;
             bool zap = true;
             int ret = 0;
             if (zap) {
                 1;
                 zap = false;
                 if (!zap) {
                     2;
                     zap = true;
                     if (zap) {
                         3;
                     } else {
                         4;
                         return 10;
                     }
                     5;
                 }
                 6;
             } else {
                 7;
                 return 20;
             }
             8;
             return 30;
         }",
    );
    assert!(c.connect(Some(&num(0)), &num(4)));
    assert!(c.connect(Some(&num(0)), &num(8)));
    assert!(c.connect(Some(&num(2)), &num(5)));
    assert!(c.connect(Some(&num(2)), &num(4)));
    assert!(c.connect(Some(&num(0)), &ret(10)));
    assert!(c.connect(Some(&num(0)), &ret(20)));
    assert!(c.connect(Some(&num(0)), &ret(30)));
    assert!(c.connect(Some(&num(4)), &ret(10)));
    assert!(c.connect(Some(&num(7)), &ret(20)));
    assert!(c.connect(Some(&num(8)), &ret(30)));
    assert!(!c.connect(Some(&num(1)), &num(7)));
    assert!(!c.connect(Some(&num(3)), &num(4)));
    assert!(!c.connect(Some(&num(4)), &ret(30)));
    assert!(!c.connect(Some(&num(2)), &ret(20)));
    assert!(!c.connect(Some(&num(4)), &ret(20)));
    assert!(!c.connect(Some(&num(5)), &ret(20)));
}

#[test]
fn test_while() {
    let c = cfg_for(
        "int a() {
             int i;
             0;
             while (i < 10) {
                 1;
                 if (i > 5) {
                     2;
                 }
                 3;
                 i++;
             }
             return 10;
         }",
    );
    assert!(c.connect(None, &ret(10)));
    assert!(c.connect(Some(&num(0)), &num(1)));
    assert!(c.connect(Some(&num(0)), &num(2)));
    assert!(c.connect(Some(&num(0)), &num(3)));
    assert!(c.connect(Some(&num(0)), &ret(10)));
    // Seeking is directional from the entry: every path reaches the block
    // holding "1;" before the one holding "3;", so no connection is found
    // even though the loop wraps around.
    assert!(!c.connect(Some(&num(3)), &num(1)));
    assert!(c.connect(Some(&num(1)), &num(3)));
}

#[test]
fn test_for() {
    let c = cfg_for(
        "int a() {
             0;
             int zap = 0;
             for (int i = 0; i < 10; i++) {
                 1;
                 if (i > 5) {
                     2;
                     zap++;
                 }
                 3;
             }
             4;
             return 10;
         }",
    );
    assert!(c.connect(None, &ret(10)));
    for i in 0..4 {
        assert!(c.connect(None, &num(i)), "entry should reach {}", i);
    }
    assert!(c.connect(Some(&num(1)), &num(4)));
    assert!(c.connect(Some(&num(3)), &num(4)));
}

#[test]
fn test_nested_loops_in_branches() {
    let c = cfg_for(
        "int a() {
             0;
             int i;
             if (i == 0) {
                 1;
                 while (i < 10) {
                     2;
                     i++;
                 }
                 3;
                 i;
             } else {
                 4;
                 for (int j = 0; j < 5; j++) {
                     5;
                     i--;
                 }
                 6;
                 j;
             }
             7;
             return 10;
         }",
    );
    for i in 0..7 {
        assert!(c.connect(None, &num(i)), "entry should reach {}", i);
    }
    assert!(c.connect(Some(&num(3)), &num(7)));
    assert!(c.connect(Some(&num(6)), &num(7)));
    assert!(!c.connect(Some(&num(1)), &num(4)));
    assert!(!c.connect(Some(&num(3)), &num(6)));
}

#[test]
fn test_for_break() {
    let c = cfg_for(
        "int a() {
             0;
             for (int i = 0; i < 10; i++) {
                 if (i > 5) {
                     1;
                     break;
                     2;
                 } else {
                     3;
                 }
             }
             4;
             return 10;
         }",
    );
    assert!(c.connect(None, &ret(10)));
    assert!(c.connect(Some(&num(0)), &num(1)));
    assert!(c.connect(Some(&num(0)), &num(3)));
    assert!(c.connect(Some(&num(0)), &num(4)));
    assert!(c.connect(Some(&num(1)), &num(4)));
    assert!(c.connect(Some(&num(3)), &num(4)));
    assert!(!c.connect(Some(&num(0)), &num(2)));
    assert!(!c.connect(Some(&num(1)), &num(2)));
    assert!(!c.connect(Some(&num(1)), &num(3)));
    assert!(!c.connect(Some(&num(2)), &num(3)));
    assert!(!c.connect(Some(&num(2)), &num(4)));
}

#[test]
fn test_break_edge_goes_straight_past_the_loop() {
    let c = cfg_for(
        "int a() {
             0;
             for (int i = 0; i < 10; i++) {
                 if (i > 5) {
                     1;
                     break;
                 }
                 3;
             }
             4;
             return 10;
         }",
    );
    // The block carrying the break holds "1;" and the break statement.
    let brk = c
        .blocks()
        .iter()
        .find(|b| b.stmts.iter().any(|s| num(1)(s)))
        .expect("no block holding the break");
    assert!(brk.stmts.iter().any(|s| matches!(s.kind, NodeKind::Break)));
    // Its single edge is ALWAYS and leads directly to the post-loop
    // block, never back to the loop step.
    assert_eq!(brk.successors.len(), 1);
    let edge = &brk.successors[0];
    assert_eq!(edge.kind, BranchKind::Always);
    let target = c.block(edge.to);
    assert!(target.stmts.iter().any(|s| num(4)(s)));
    let step = c
        .blocks()
        .iter()
        .find(|b| {
            b.stmts
                .iter()
                .any(|s| matches!(&s.kind, NodeKind::OpUnary { operand, .. }
                    if matches!(&operand.kind, NodeKind::Variable(v) if v == "i")))
        })
        .expect("no step block");
    assert_ne!(edge.to, step.id);
}

#[test]
fn test_for_break_without_else() {
    let c = cfg_for(
        "int a() {
             0;
             for (int i = 0; i < 10; i++) {
                 if (i > 5) {
                     1;
                     break;
                     2;
                 }
                 3;
             }
             4;
             return 10;
         }",
    );
    assert!(c.connect(None, &ret(10)));
    assert!(c.connect(Some(&num(0)), &num(1)));
    assert!(c.connect(Some(&num(0)), &num(3)));
    assert!(c.connect(Some(&num(0)), &num(4)));
    assert!(c.connect(Some(&num(1)), &num(4)));
    assert!(c.connect(Some(&num(3)), &num(4)));
    assert!(!c.connect(Some(&num(0)), &num(2)));
    assert!(!c.connect(Some(&num(1)), &num(2)));
    assert!(!c.connect(Some(&num(1)), &num(3)));
    assert!(!c.connect(Some(&num(2)), &num(3)));
    assert!(!c.connect(Some(&num(2)), &num(4)));
}

#[test]
fn test_for_continue() {
    let c = cfg_for(
        "int a() {
             0;
             for (int i = 0; i < 10; i++) {
                 if (i > 5) {
                     1;
                     continue;
                     2;
                 }
                 3;
             }
             4;
             return 10;
         }",
    );
    assert!(c.connect(None, &ret(10)));
    assert!(c.connect(Some(&num(0)), &num(1)));
    assert!(c.connect(Some(&num(0)), &num(3)));
    assert!(c.connect(Some(&num(0)), &num(4)));
    assert!(c.connect(Some(&num(1)), &num(4)));
    assert!(c.connect(Some(&num(3)), &num(4)));
    // continue wraps around through the step block.
    assert!(c.connect(Some(&num(1)), &num(3)));
    assert!(!c.connect(Some(&num(0)), &num(2)));
    assert!(!c.connect(Some(&num(1)), &num(2)));
    assert!(!c.connect(Some(&num(2)), &num(3)));
    assert!(!c.connect(Some(&num(2)), &num(4)));
}

#[test]
fn test_every_reachable_block_has_a_predecessor() {
    let c = cfg_for(
        "int a() {
             0;
             if (true) { 1; return 10; }
             2;
             return 20;
         }",
    );
    let mut has_pred = vec![false; c.blocks().len()];
    for block in c.blocks() {
        for succ in &block.successors {
            has_pred[succ.to] = true;
        }
    }
    // Walk reachable blocks from entry.
    let mut seen = vec![false; c.blocks().len()];
    let mut stack = vec![c.entry().id];
    while let Some(id) = stack.pop() {
        if std::mem::replace(&mut seen[id], true) {
            continue;
        }
        for succ in &c.block(id).successors {
            stack.push(succ.to);
        }
    }
    for block in c.blocks() {
        if block.id == c.entry().id || !seen[block.id] {
            continue;
        }
        assert!(has_pred[block.id], "block {} has no predecessor", block.id);
    }
    // EXIT is reachable since the function returns.
    assert!(seen[crate::cfg::BLOCK_EXIT]);
}

#[test]
fn test_dot_output_names_blocks_and_edges() {
    let c = cfg_for("int a() { 0; if (true) { 1; } return 10; }");
    let dot = c.dot();
    assert!(dot.starts_with("digraph \"a\""));
    assert!(dot.contains("ENTRY"));
    assert!(dot.contains("EXIT"));
    assert!(dot.contains("if-true"));
}

#[test]
fn test_empty_function_body() {
    let c = cfg_for("void a() { }");
    // Entry leads to one empty content block which falls through to EXIT.
    assert_eq!(c.entry().successors.len(), 1);
    let second = c.block(c.entry().successors[0].to);
    assert!(second.stmts.is_empty());
    assert_eq!(second.successors.len(), 1);
    assert_eq!(second.successors[0].to, crate::cfg::BLOCK_EXIT);
}

#[test]
fn test_loop_with_empty_body() {
    let c = cfg_for("void a() { while (false) { } 1; }");
    assert!(c.connect(None, &num(1)));
}
