//! If/else, while, for, and break emission.

use crate::ast::{Block, Expr, Stmt};

use super::error::CodegenError;
use super::state::CodeGen;

impl CodeGen {
    pub(super) fn codegen_if(
        &mut self,
        condition: &Expr,
        then_branch: &Block,
        else_branch: &Option<Box<Stmt>>,
    ) -> Result<(), CodegenError> {
        let lbl_else = self.new_label();
        let lbl_end = self.new_label();

        self.codegen_expr(condition)?;
        self.emit("    cmp x0, #0")?;

        if else_branch.is_some() {
            self.emit(format!("    b.eq .L{lbl_else}"))?;
        } else {
            self.emit(format!("    b.eq .L{lbl_end}"))?;
        }

        self.codegen_block(then_branch)?;

        if let Some(eb) = else_branch {
            self.emit(format!("    b .L{lbl_end}"))?;
            self.emit(format!(".L{lbl_else}:"))?;
            self.codegen_stmt(eb)?;
        }

        self.emit(format!(".L{lbl_end}:"))?;
        Ok(())
    }

    pub(super) fn codegen_while(&mut self, condition: &Expr, body: &Block) -> Result<(), CodegenError> {
        let lbl_start = self.new_label();
        let lbl_end = self.new_label();

        self.break_labels.push(lbl_end);

        self.emit(format!(".L{lbl_start}:"))?;
        self.codegen_expr(condition)?;
        self.emit("    cmp x0, #0")?;
        self.emit(format!("    b.eq .L{lbl_end}"))?;

        self.codegen_block(body)?;

        self.emit(format!("    b .L{lbl_start}"))?;
        self.emit(format!(".L{lbl_end}:"))?;

        self.break_labels.pop();
        Ok(())
    }

    pub(super) fn codegen_for(
        &mut self,
        init: &Option<Box<Stmt>>,
        condition: &Option<Expr>,
        update: &Option<Box<Stmt>>,
        body: &Block,
    ) -> Result<(), CodegenError> {
        let lbl_start = self.new_label();
        let lbl_end = self.new_label();

        self.break_labels.push(lbl_end);

        if let Some(s) = init {
            self.codegen_stmt(s)?;
        }

        self.emit(format!(".L{lbl_start}:"))?;

        if let Some(cond) = condition {
            self.codegen_expr(cond)?;
            self.emit("    cmp x0, #0")?;
            self.emit(format!("    b.eq .L{lbl_end}"))?;
        }

        self.codegen_block(body)?;

        if let Some(s) = update {
            self.codegen_stmt(s)?;
        }

        self.emit(format!("    b .L{lbl_start}"))?;
        self.emit(format!(".L{lbl_end}:"))?;

        self.break_labels.pop();
        Ok(())
    }

    pub(super) fn codegen_break(&mut self) -> Result<(), CodegenError> {
        let lbl = *self
            .break_labels
            .last()
            .ok_or_else(|| CodegenError("break outside of loop".to_string()))?;
        self.emit(format!("    b .L{lbl}"))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn break_outside_loop_is_an_error() {
        let mut cg = CodeGen::new();
        assert!(cg.codegen_break().is_err());
    }

    #[test]
    fn while_loop_pushes_and_pops_break_label() {
        let mut cg = CodeGen::new();
        cg.codegen_while(&Expr::Number(0), &Block::default()).unwrap();
        assert!(cg.break_labels.is_empty());
    }
}
