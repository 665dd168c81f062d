//! Lvalue emission: leaves an address in `x0`.

use crate::ast::{Expr, UnaryOp};

use super::error::CodegenError;
use super::state::CodeGen;

impl CodeGen {
    pub(super) fn codegen_lvalue(&mut self, expr: &Expr) -> Result<(), CodegenError> {
        match expr {
            Expr::Identifier(name) => {
                let li = self
                    .find_local(name)
                    .ok_or_else(|| CodegenError(format!("undefined variable '{name}'")))?;
                self.emit(format!("    add x0, x29, #{}", self.locals[li].offset))?;
                Ok(())
            }

            Expr::Index { array, index } => {
                // An array local already holds the address of element 0; a
                // pointer local holds a value that must itself be evaluated.
                if let Expr::Identifier(name) = array.as_ref() {
                    if let Some(li) = self.find_local(name) {
                        if self.locals[li].array_size.is_some() {
                            self.emit(format!("    add x0, x29, #{}", self.locals[li].offset))?;
                        } else {
                            self.codegen_expr(array)?;
                        }
                    } else {
                        self.codegen_expr(array)?;
                    }
                } else {
                    self.codegen_expr(array)?;
                }

                self.emit("    str x0, [sp, #-16]!")?;
                self.codegen_expr(index)?;
                self.emit("    lsl x0, x0, #3")?;
                self.emit("    ldr x9, [sp], #16")?;
                self.emit("    add x0, x0, x9")?;
                Ok(())
            }

            Expr::Member { object, member } => {
                let obj_type = self.resolve_expr_type(object);
                let offset = self.find_field_offset(obj_type.struct_name(), member)?;

                self.codegen_lvalue(object)?;
                if offset != 0 {
                    self.emit(format!("    add x0, x0, #{offset}"))?;
                }
                Ok(())
            }

            Expr::Unary {
                op: UnaryOp::Deref,
                operand,
            } => self.codegen_expr(operand),

            Expr::Unary { op, .. } => Err(CodegenError(format!(
                "invalid lvalue (unary op '{op:?}')"
            ))),

            other => Err(CodegenError(format!("invalid lvalue ({other:?})"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::TypeSpec;

    #[test]
    fn identifier_lvalue_is_frame_relative_address() {
        let mut cg = CodeGen::new();
        cg.add_local("x", TypeSpec::new("int", 0), None, 8);
        cg.codegen_lvalue(&Expr::Identifier("x".into())).unwrap();
        assert!(cg.out.contains("add x0, x29, #-8"));
    }

    #[test]
    fn undefined_variable_is_an_error() {
        let mut cg = CodeGen::new();
        assert!(cg.codegen_lvalue(&Expr::Identifier("nope".into())).is_err());
    }

    #[test]
    fn literal_is_not_an_lvalue() {
        let mut cg = CodeGen::new();
        assert!(cg.codegen_lvalue(&Expr::Number(1)).is_err());
    }
}
