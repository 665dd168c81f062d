//! Rvalue expression emission: leaves a value in `x0` (or, for arrays and
//! struct values, the address that stands in for that value).

use crate::ast::{Expr, UnaryOp};

use super::error::CodegenError;
use super::state::{ARG_REGS, CodeGen};

impl CodeGen {
    pub(super) fn codegen_expr(&mut self, expr: &Expr) -> Result<(), CodegenError> {
        match expr {
            Expr::Number(n) => {
                self.emit(format!("    mov x0, #{n}"))?;
                Ok(())
            }

            Expr::CharLit(c) => {
                self.emit(format!("    mov x0, #{c}"))?;
                Ok(())
            }

            Expr::Str(s) => {
                let label = self.register_string(s);
                self.emit(format!("    adrp x0, .str{label}@PAGE"))?;
                self.emit(format!("    add x0, x0, .str{label}@PAGEOFF"))?;
                Ok(())
            }

            Expr::Identifier(name) => {
                if let Some(ev) = self.find_enum_value(name) {
                    self.emit(format!("    mov x0, #{ev}"))?;
                    return Ok(());
                }

                let li = self
                    .find_local(name)
                    .ok_or_else(|| CodegenError(format!("undefined variable '{name}'")))?;
                let local = &self.locals[li];

                if local.array_size.is_some() || local.is_struct_value() {
                    self.emit(format!("    add x0, x29, #{}", local.offset))?;
                } else {
                    self.emit(format!("    ldr x0, [x29, #{}]", local.offset))?;
                }
                Ok(())
            }

            Expr::Binary { op, left, right } => self.codegen_binary(op, left, right),

            Expr::Unary { op, operand } => self.codegen_unary(*op, operand),

            Expr::Call { name, args } => self.codegen_call(name, args),

            Expr::Index { .. } => {
                self.codegen_lvalue(expr)?;
                self.emit("    ldr x0, [x0]")?;
                Ok(())
            }

            Expr::Member { object, member } => {
                let obj_type = self.resolve_expr_type(object);
                let field_ty = self.find_field_type(obj_type.struct_name(), member);

                self.codegen_lvalue(expr)?;

                match field_ty {
                    Some(ft) if ft.is_struct() => {} // leave address in x0
                    _ => {
                        self.emit("    ldr x0, [x0]")?;
                    }
                }
                Ok(())
            }
        }
    }

    fn codegen_binary(
        &mut self,
        op: &str,
        left: &Expr,
        right: &Expr,
    ) -> Result<(), CodegenError> {
        if op == "&&" {
            let lbl_false = self.new_label();
            let lbl_end = self.new_label();

            self.codegen_expr(left)?;
            self.emit("    cmp x0, #0")?;
            self.emit(format!("    b.eq .L{lbl_false}"))?;

            self.codegen_expr(right)?;
            self.emit("    cmp x0, #0")?;
            self.emit(format!("    b.eq .L{lbl_false}"))?;

            self.emit("    mov x0, #1")?;
            self.emit(format!("    b .L{lbl_end}"))?;
            self.emit(format!(".L{lbl_false}:"))?;
            self.emit("    mov x0, #0")?;
            self.emit(format!(".L{lbl_end}:"))?;
            return Ok(());
        }

        if op == "||" {
            let lbl_true = self.new_label();
            let lbl_end = self.new_label();

            self.codegen_expr(left)?;
            self.emit("    cmp x0, #0")?;
            self.emit(format!("    b.ne .L{lbl_true}"))?;

            self.codegen_expr(right)?;
            self.emit("    cmp x0, #0")?;
            self.emit(format!("    b.ne .L{lbl_true}"))?;

            self.emit("    mov x0, #0")?;
            self.emit(format!("    b .L{lbl_end}"))?;
            self.emit(format!(".L{lbl_true}:"))?;
            self.emit("    mov x0, #1")?;
            self.emit(format!(".L{lbl_end}:"))?;
            return Ok(());
        }

        self.codegen_expr(left)?;
        self.emit("    str x0, [sp, #-16]!")?;
        self.codegen_expr(right)?;
        self.emit("    ldr x9, [sp], #16")?;
        // left is now in x9, right in x0

        match op {
            "+" => self.emit("    add x0, x9, x0")?,
            "-" => self.emit("    sub x0, x9, x0")?,
            "*" => self.emit("    mul x0, x9, x0")?,
            "/" => self.emit("    sdiv x0, x9, x0")?,
            "%" => {
                self.emit("    sdiv x10, x9, x0")?;
                self.emit("    msub x0, x10, x0, x9")?;
            }
            "==" => {
                self.emit("    cmp x9, x0")?;
                self.emit("    cset x0, eq")?;
            }
            "!=" => {
                self.emit("    cmp x9, x0")?;
                self.emit("    cset x0, ne")?;
            }
            "<" => {
                self.emit("    cmp x9, x0")?;
                self.emit("    cset x0, lt")?;
            }
            ">" => {
                self.emit("    cmp x9, x0")?;
                self.emit("    cset x0, gt")?;
            }
            "<=" => {
                self.emit("    cmp x9, x0")?;
                self.emit("    cset x0, le")?;
            }
            ">=" => {
                self.emit("    cmp x9, x0")?;
                self.emit("    cset x0, ge")?;
            }
            other => return Err(CodegenError(format!("unknown binary op '{other}'"))),
        }
        Ok(())
    }

    fn codegen_unary(&mut self, op: UnaryOp, operand: &Expr) -> Result<(), CodegenError> {
        match op {
            UnaryOp::Neg => {
                self.codegen_expr(operand)?;
                self.emit("    neg x0, x0")?;
            }
            UnaryOp::Not => {
                self.codegen_expr(operand)?;
                self.emit("    cmp x0, #0")?;
                self.emit("    cset x0, eq")?;
            }
            UnaryOp::AddrOf => {
                self.codegen_lvalue(operand)?;
            }
            UnaryOp::Deref => {
                self.codegen_expr(operand)?;
                self.emit("    ldr x0, [x0]")?;
            }
        }
        Ok(())
    }

    /// Arguments beyond the sixth are evaluated (for side effects) and
    /// discarded rather than spilled to the outgoing stack area -- a
    /// documented limitation carried over unfixed from the source this was
    /// ported from; see DESIGN.md.
    fn codegen_call(&mut self, name: &str, args: &[Expr]) -> Result<(), CodegenError> {
        for arg in args {
            self.codegen_expr(arg)?;
            self.emit("    str x0, [sp, #-16]!")?;
        }

        for i in (0..args.len()).rev() {
            if i < 6 {
                self.emit(format!("    ldr {}, [sp], #16", ARG_REGS[i]))?;
            } else {
                self.emit("    ldr x0, [sp], #16")?;
            }
        }

        self.emit(format!("    bl _{name}"))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::TypeSpec;

    #[test]
    fn number_literal_moves_immediate() {
        let mut cg = CodeGen::new();
        cg.codegen_expr(&Expr::Number(42)).unwrap();
        assert!(cg.out.contains("mov x0, #42"));
    }

    #[test]
    fn string_literal_is_pc_relative() {
        let mut cg = CodeGen::new();
        cg.codegen_expr(&Expr::Str("hi".into())).unwrap();
        assert!(cg.out.contains("adrp x0, .str0@PAGE"));
        assert!(cg.out.contains("add x0, x0, .str0@PAGEOFF"));
    }

    #[test]
    fn enum_value_resolves_before_local_lookup() {
        let mut cg = CodeGen::new();
        cg.enums.push(crate::codegen::state::EnumInfo {
            values: vec!["RED".into(), "GREEN".into()],
        });
        cg.codegen_expr(&Expr::Identifier("GREEN".into())).unwrap();
        assert!(cg.out.contains("mov x0, #1"));
    }

    #[test]
    fn modulo_lowers_to_sdiv_and_msub() {
        let mut cg = CodeGen::new();
        cg.codegen_expr(&Expr::Binary {
            op: "%".into(),
            left: Box::new(Expr::Number(7)),
            right: Box::new(Expr::Number(3)),
        })
        .unwrap();
        assert!(cg.out.contains("sdiv x10, x9, x0"));
        assert!(cg.out.contains("msub x0, x10, x0, x9"));
    }

    #[test]
    fn logical_and_short_circuits_via_branch() {
        let mut cg = CodeGen::new();
        cg.codegen_expr(&Expr::Binary {
            op: "&&".into(),
            left: Box::new(Expr::Number(1)),
            right: Box::new(Expr::Number(0)),
        })
        .unwrap();
        assert!(cg.out.contains("b.eq .L0"));
        assert!(!cg.out.contains("and"));
    }

    #[test]
    fn array_identifier_yields_address_not_load() {
        let mut cg = CodeGen::new();
        cg.add_local("arr", TypeSpec::new("int", 0), Some(4), 32);
        cg.codegen_expr(&Expr::Identifier("arr".into())).unwrap();
        assert!(cg.out.contains("add x0, x29"));
        assert!(!cg.out.contains("ldr x0, [x29"));
    }

    #[test]
    fn call_with_seven_args_discards_the_seventh() {
        let mut cg = CodeGen::new();
        let args: Vec<Expr> = (0..7).map(Expr::Number).collect();
        cg.codegen_call("f", &args).unwrap();
        // The 7th argument (index 6) is popped into scratch x0 and never
        // reaches a register a callee would read; arg 0 also legitimately
        // loads into x0 (ARG_REGS[0]), so "ldr x0, [sp], #16" appears twice.
        assert_eq!(cg.out.matches("ldr x0, [sp], #16").count(), 2);
        assert!(!cg.out.contains("ldr x6"));
        assert!(cg.out.contains("bl _f"));
    }
}
