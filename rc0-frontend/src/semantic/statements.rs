//! Assignment checking and the analyzer's integration tests

use crate::ast::{Node, NodeId};
use crate::semantic::{Analyzer, SemanticErrorKind};
use crate::types::TypeBase;

impl Analyzer {
    /// Assignment is permitted when the target has been classified as an
    /// lvalue and the value's type matches, with two extra allowances:
    /// NULL assigns to any pointer, and an `alloc_array` result assigns to
    /// a matching array (it types as one).
    pub(crate) fn check_assign(&mut self, id: NodeId, target: &Node, value: Option<&Node>) {
        if !self.is_assignable(target.id) {
            self.error(
                target.id,
                SemanticErrorKind::AssignNotLvalue,
                &format!("{}", target),
            );
            return;
        }
        // A declaration may come without a value.
        let Some(value) = value else {
            return;
        };
        let (Some(kt), Some(kw)) = (self.get_type(target.id), self.get_type(value.id)) else {
            return;
        };
        if !kt.matches(&kw) && !(kt.pointer_level > 0 && kw.base == TypeBase::Null) {
            self.error(
                id,
                SemanticErrorKind::AssignTypeMismatch,
                &format!("{} vs {}", kt, kw),
            );
        }
        self.set_type(id, kt);
    }
}
