//! Graphviz rendering of a CFG, used by the driver's `--dot`

use crate::cfg::{Cfg, BLOCK_ENTRY, BLOCK_EXIT};
use std::fmt::Write;

impl Cfg {
    pub fn dot(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "digraph \"{}\" {{", self.name());
        let _ = writeln!(out, "  node [shape=box fontname=monospace];");
        for block in self.blocks() {
            let label = match block.id {
                BLOCK_ENTRY => "ENTRY".to_string(),
                BLOCK_EXIT => "EXIT".to_string(),
                _ => {
                    let mut stmts: Vec<String> =
                        block.stmts.iter().map(|s| s.to_string()).collect();
                    if stmts.is_empty() {
                        stmts.push(format!("<{}>", block.id));
                    }
                    stmts.join("\\n")
                }
            };
            let _ = writeln!(
                out,
                "  b{} [label=\"{}\"];",
                block.id,
                label.replace('"', "\\\"")
            );
        }
        for block in self.blocks() {
            for succ in &block.successors {
                let _ = writeln!(
                    out,
                    "  b{} -> b{} [label=\"{}\"];",
                    succ.from, succ.to, succ.kind
                );
            }
        }
        out.push_str("}\n");
        out
    }
}
