//! Statement dispatch and block-scoped variable bookkeeping.

use crate::ast::{Block, Stmt};

use super::error::CodegenError;
use super::state::CodeGen;

impl CodeGen {
    pub(super) fn codegen_stmt(&mut self, stmt: &Stmt) -> Result<(), CodegenError> {
        match stmt {
            Stmt::Return(value) => {
                match value {
                    Some(e) => self.codegen_expr(e)?,
                    None => self.emit("    mov x0, #0")?,
                }
                self.emit_epilogue()?;
                Ok(())
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => self.codegen_if(condition, then_branch, else_branch),

            Stmt::Block(b) => self.codegen_block(b),

            Stmt::While { condition, body } => self.codegen_while(condition, body),

            Stmt::For {
                init,
                condition,
                update,
                body,
            } => self.codegen_for(init, condition, update, body),

            Stmt::Break => self.codegen_break(),

            Stmt::VarDecl(decl) => self.codegen_var_decl(decl),

            Stmt::Assign { target, value } => {
                self.codegen_lvalue(target)?;
                self.emit("    str x0, [sp, #-16]!")?;
                self.codegen_expr(value)?;
                self.emit("    ldr x9, [sp], #16")?;
                self.emit("    str x0, [x9]")?;
                Ok(())
            }

            Stmt::Expr(e) => {
                self.codegen_expr(e)?;
                Ok(())
            }
        }
    }

    fn codegen_var_decl(&mut self, decl: &crate::ast::VarDecl) -> Result<(), CodegenError> {
        let size_bytes = if let Some(n) = decl.array_size {
            (n.max(1) * 8) as i32
        } else if decl.ty.is_struct() && decl.ty.ptr_level == 0 {
            self.struct_size(decl.ty.struct_name())
        } else {
            8
        };

        let li = self.add_local(&decl.name, decl.ty.clone(), decl.array_size, size_bytes);

        if let Some(init) = &decl.init {
            self.codegen_expr(init)?;
            self.emit(format!("    str x0, [x29, #{}]", self.locals[li].offset))?;
        }
        Ok(())
    }

    pub(super) fn emit_epilogue(&mut self) -> Result<(), CodegenError> {
        self.emit("    mov sp, x29")?;
        self.emit("    ldp x29, x30, [sp], #16")?;
        self.emit("    ret")?;
        Ok(())
    }

    /// Emit every statement in a block, then pop its locally-declared names
    /// back out of scope. The running `stack_offset` is *not* restored: the
    /// function prologue reserves the whole frame up front, and restoring it
    /// here would let a later block's locals alias a loop body's earlier
    /// iteration slots.
    pub(super) fn codegen_block(&mut self, block: &Block) -> Result<(), CodegenError> {
        let saved_local_count = self.locals.len();

        for stmt in &block.statements {
            self.codegen_stmt(stmt)?;
        }

        self.locals.truncate(saved_local_count);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Expr, TypeSpec, VarDecl};

    #[test]
    fn return_emits_epilogue() {
        let mut cg = CodeGen::new();
        cg.codegen_stmt(&Stmt::Return(Some(Expr::Number(0)))).unwrap();
        assert!(cg.out.contains("ldp x29, x30, [sp], #16"));
        assert!(cg.out.contains("ret"));
    }

    #[test]
    fn block_exit_drops_names_but_keeps_stack_offset() {
        let mut cg = CodeGen::new();
        let block = Block {
            statements: vec![Stmt::VarDecl(VarDecl {
                name: "x".into(),
                ty: TypeSpec::new("int", 0),
                array_size: None,
                init: None,
            })],
        };
        cg.codegen_block(&block).unwrap();
        assert!(cg.locals.is_empty());
        assert_eq!(cg.stack_offset, -8);
    }

    #[test]
    fn var_decl_without_init_emits_no_store() {
        let mut cg = CodeGen::new();
        cg.codegen_var_decl(&VarDecl {
            name: "x".into(),
            ty: TypeSpec::new("int", 0),
            array_size: None,
            init: None,
        })
        .unwrap();
        assert!(!cg.out.contains("str"));
    }
}
