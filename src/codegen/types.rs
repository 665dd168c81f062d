//! Struct/enum field layout and the best-effort expression type resolver
//! used to disambiguate member access and array indexing.

use crate::ast::{Expr, TypeSpec, UnaryOp};

use super::error::CodegenError;
use super::state::CodeGen;

impl CodeGen {
    /// Byte offset of a field within a struct, computed as the prefix sum of
    /// preceding field sizes (8 bytes per scalar/pointer/enum field, or the
    /// nested struct's own size). Referencing a struct name that was never
    /// registered is a fatal error -- unlike [`CodeGen::struct_size`], which
    /// silently defaults unregistered nested types to 8 bytes, a member
    /// access against a wholly unknown struct cannot produce a meaningful
    /// offset at all, so this asymmetry is preserved rather than unified.
    pub(super) fn find_field_offset(
        &self,
        struct_name: &str,
        field_name: &str,
    ) -> Result<i32, CodegenError> {
        let si = self
            .find_struct(struct_name)
            .ok_or_else(|| CodegenError(format!("unknown struct '{struct_name}'")))?;
        let s = &self.structs[si];
        let mut offset = 0;
        for (name, ty) in &s.fields {
            if name == field_name {
                return Ok(offset);
            }
            let field_size = if ty.is_struct() {
                self.struct_size(ty.struct_name())
            } else {
                8
            };
            offset += field_size;
        }
        Err(CodegenError(format!(
            "struct '{struct_name}' has no field '{field_name}'"
        )))
    }

    pub(super) fn find_field_type(&self, struct_name: &str, field_name: &str) -> Option<TypeSpec> {
        let si = self.find_struct(struct_name)?;
        self.structs[si]
            .fields
            .iter()
            .find(|(name, _)| name == field_name)
            .map(|(_, ty)| ty.clone())
    }

    /// Best-effort resolution of an expression's static type, used only to
    /// decide member-access field offsets and whether an indexed load reads
    /// a `char`. Defaults to `int` whenever it cannot tell -- this is
    /// deliberately not a full type checker (out of scope), so it is wrong
    /// in ways a real checker would catch; see DESIGN.md.
    pub(super) fn resolve_expr_type(&self, expr: &Expr) -> TypeSpec {
        match expr {
            Expr::Identifier(name) => match self.find_local(name) {
                Some(li) => self.locals[li].ty.clone(),
                None => TypeSpec::new("int", 0),
            },
            Expr::Member { object, member } => {
                let obj_type = self.resolve_expr_type(object);
                if obj_type.is_struct()
                    && let Some(ft) = self.find_field_type(obj_type.struct_name(), member)
                {
                    return ft;
                }
                TypeSpec::new("int", 0)
            }
            Expr::Index { array, .. } => {
                let arr_type = self.resolve_expr_type(array);
                if arr_type.name == "char" {
                    TypeSpec::new("char", 0)
                } else {
                    TypeSpec::new("int", 0)
                }
            }
            Expr::Unary {
                op: UnaryOp::Deref,
                operand,
            } => self.resolve_expr_type(operand),
            _ => TypeSpec::new("int", 0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::state::StructInfo;

    fn point_struct() -> StructInfo {
        StructInfo {
            name: "Point".into(),
            fields: vec![
                ("x".into(), TypeSpec::new("int", 0)),
                ("y".into(), TypeSpec::new("int", 0)),
            ],
            total_size: 16,
        }
    }

    #[test]
    fn field_offset_is_prefix_sum() {
        let mut cg = CodeGen::new();
        cg.structs.push(point_struct());
        assert_eq!(cg.find_field_offset("Point", "x").unwrap(), 0);
        assert_eq!(cg.find_field_offset("Point", "y").unwrap(), 8);
    }

    #[test]
    fn unknown_struct_in_member_access_is_fatal() {
        let cg = CodeGen::new();
        assert!(cg.find_field_offset("Nope", "x").is_err());
    }

    #[test]
    fn unknown_field_in_known_struct_is_fatal() {
        let mut cg = CodeGen::new();
        cg.structs.push(point_struct());
        assert!(cg.find_field_offset("Point", "z").is_err());
    }

    #[test]
    fn resolve_expr_type_defaults_to_int() {
        let cg = CodeGen::new();
        assert_eq!(cg.resolve_expr_type(&Expr::Number(1)).name, "int");
    }
}
