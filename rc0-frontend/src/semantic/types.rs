//! Type construction during analysis
//!
//! `kind_to_type` performs the impedance matching between parsed `Kind`
//! declarations and semantic `Type`s. Primitive bases map directly;
//! typedefs and structs resolve against the analyzer's book-keeping, with
//! struct definitions taking precedence over forward declarations.

use crate::ast::{BaseKind, FunDecl, Kind, NodeId, VarDecl};
use crate::semantic::errors::SemanticErrorKind;
use crate::semantic::Analyzer;
use crate::types::{FunctionType, StructField, StructType, Type, TypeBase, TypeExtra};
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

/// Everything the analysis stage passes onwards: the user-defined type
/// tables and the node id -> type map.
#[derive(Debug, Clone, Default)]
pub struct Results {
    pub functions: HashMap<String, Rc<FunctionType>>,
    pub typedefs: HashMap<String, Type>,
    pub typedef_funcs: HashMap<String, Rc<FunctionType>>,
    pub structs: HashMap<String, Rc<StructType>>,
    pub struct_fwds: HashSet<String>,
    pub node_types: HashMap<NodeId, Type>,
}

impl Analyzer {
    pub(crate) fn kind_to_type(&mut self, k: &Kind) -> Option<Type> {
        let mut pointer_level = k.pointer_level;
        let mut array_level = k.array_level;
        let (base, extra) = match k.base {
            BaseKind::Typedef => {
                if k.name.is_empty() {
                    panic!("no name for typedef: {}", k);
                }
                // Plain and function typedefs are stored separately since
                // function typing carries the full signature.
                if let Some(td) = self.res.typedefs.get(&k.name).cloned() {
                    pointer_level += td.pointer_level;
                    array_level += td.array_level;
                    (td.base, td.extra)
                } else if let Some(tdf) = self.res.typedef_funcs.get(&k.name).cloned() {
                    (TypeBase::Func, Some(TypeExtra::Function(tdf)))
                } else {
                    self.error(
                        k.id,
                        SemanticErrorKind::TypeUnrecognizedTypedef,
                        &format!("{:?}", k.name),
                    );
                    return None;
                }
            }
            BaseKind::Struct => {
                if k.name.is_empty() {
                    panic!("no name for struct: {}", k);
                }
                // A definition wins over a forward declaration; a name with
                // only a forward declaration types as StructFwd, which the
                // declaration checks restrict to pointer uses.
                if let Some(st) = self.res.structs.get(&k.name).cloned() {
                    (TypeBase::Struct, Some(TypeExtra::Struct(st)))
                } else if self.res.struct_fwds.contains(&k.name) {
                    (
                        TypeBase::StructFwd,
                        Some(TypeExtra::StructForward(k.name.clone())),
                    )
                } else {
                    self.error(
                        k.id,
                        SemanticErrorKind::TypeUnrecognizedStruct,
                        &format!("{:?}", k.name),
                    );
                    return None;
                }
            }
            BaseKind::Int => (TypeBase::Int, None),
            BaseKind::Bool => (TypeBase::Bool, None),
            BaseKind::String => (TypeBase::String, None),
            BaseKind::Void => (TypeBase::Void, None),
            BaseKind::Char => (TypeBase::Char, None),
        };
        Some(Type {
            base,
            pointer_level,
            array_level,
            extra,
        })
    }

    /// Struct fields from member declarations; a by-value field of a
    /// merely forward-declared struct has unknown size and is rejected.
    /// Errors land on `at`, the surrounding definition.
    pub(crate) fn struct_fields_from_var_decls(
        &mut self,
        at: NodeId,
        members: &[VarDecl],
    ) -> Option<Vec<StructField>> {
        let mut fields = Vec::new();
        for member in members {
            let t = self.kind_to_type(&member.kind)?;
            if t.base == TypeBase::StructFwd && t.pointer_level == 0 {
                self.error(at, SemanticErrorKind::StructSizeUnknown, "");
                return None;
            }
            fields.push(StructField {
                name: member.name.clone(),
                ty: t,
            });
        }
        Some(fields)
    }

    pub(crate) fn types_from_var_decls(&mut self, decls: &[VarDecl]) -> Option<Vec<Type>> {
        decls
            .iter()
            .map(|vd| self.kind_to_type(&vd.kind))
            .collect()
    }

    pub(crate) fn function_from_decl(&mut self, fd: &FunDecl) -> Option<FunctionType> {
        let param_types = self.types_from_var_decls(&fd.params)?;
        let returns = self.kind_to_type(&fd.returns)?;
        Some(FunctionType {
            returns,
            param_types,
        })
    }

    pub(crate) fn add_struct(&mut self, id: NodeId, name: &str, members: &[VarDecl]) {
        if self.res.structs.contains_key(name) {
            self.error(
                id,
                SemanticErrorKind::StructAlreadyDefined,
                &format!("{:?}", name),
            );
            return;
        }
        let Some(fields) = self.struct_fields_from_var_decls(id, members) else {
            return;
        };
        self.res.structs.insert(
            name.to_string(),
            Rc::new(StructType {
                name: name.to_string(),
                fields,
            }),
        );
    }

    pub(crate) fn add_typedef(&mut self, id: NodeId, name: &str, kind: &Kind) {
        if self.res.typedefs.contains_key(name) {
            self.error(
                id,
                SemanticErrorKind::TypedefAlreadyDefined,
                &format!("{:?}", name),
            );
            return;
        }
        let Some(t) = self.kind_to_type(kind) else {
            return;
        };
        self.res.typedefs.insert(name.to_string(), t);
    }

    pub(crate) fn add_typedef_func(
        &mut self,
        id: NodeId,
        name: &str,
        returns: &Kind,
        params: &[VarDecl],
    ) {
        if self.res.typedef_funcs.contains_key(name) {
            self.error(
                id,
                SemanticErrorKind::TypedefAlreadyDefined,
                &format!("{:?}", name),
            );
            return;
        }
        let Some(rt) = self.kind_to_type(returns) else {
            return;
        };
        let Some(param_types) = self.types_from_var_decls(params) else {
            return;
        };
        self.res.typedef_funcs.insert(
            name.to_string(),
            Rc::new(FunctionType {
                returns: rt,
                param_types,
            }),
        );
    }
}
