//! Nested variable scopes
//!
//! C0 permits no shadowing of any kind, so an insertion fails if the name
//! is bound in the present frame or any enclosing one. Lookup returns the
//! innermost binding.

use crate::types::Type;
use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct ScopeStack {
    frames: Vec<HashMap<String, Type>>,
}

impl ScopeStack {
    pub fn new() -> Self {
        Self {
            frames: vec![HashMap::new()],
        }
    }

    pub fn push(&mut self) {
        self.frames.push(HashMap::new());
    }

    pub fn pop(&mut self) {
        if self.frames.len() == 1 {
            panic!("popping the outermost scope");
        }
        self.frames.pop();
    }

    pub fn insert(&mut self, name: &str, ty: Type) -> Result<(), ()> {
        if self.lookup(name).is_some() {
            return Err(());
        }
        self.frames
            .last_mut()
            .expect("scope stack is never empty")
            .insert(name.to_string(), ty);
        Ok(())
    }

    pub fn lookup(&self, name: &str) -> Option<&Type> {
        self.frames.iter().rev().find_map(|frame| frame.get(name))
    }
}
