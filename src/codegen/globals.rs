//! String literal pool: collection pre-pass and `__DATA,__data` emission.

use crate::ast::{Block, Expr, Item, Program, Stmt};

use super::error::CodegenError;
use super::state::CodeGen;

impl CodeGen {
    /// Walk the whole program once, in AST order, registering every string
    /// literal so labels are assigned before any function body is emitted.
    pub(super) fn collect_strings(&mut self, program: &Program) {
        for item in &program.items {
            if let Item::Function(f) = item {
                self.collect_strings_block(&f.body);
            }
        }
    }

    fn collect_strings_block(&mut self, block: &Block) {
        for stmt in &block.statements {
            self.collect_strings_stmt(stmt);
        }
    }

    fn collect_strings_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Return(value) => {
                if let Some(e) = value {
                    self.collect_strings_expr(e);
                }
            }
            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.collect_strings_expr(condition);
                self.collect_strings_block(then_branch);
                if let Some(eb) = else_branch {
                    self.collect_strings_stmt(eb);
                }
            }
            Stmt::Block(b) => self.collect_strings_block(b),
            Stmt::While { condition, body } => {
                self.collect_strings_expr(condition);
                self.collect_strings_block(body);
            }
            Stmt::For {
                init,
                condition,
                update,
                body,
            } => {
                if let Some(s) = init {
                    self.collect_strings_stmt(s);
                }
                if let Some(e) = condition {
                    self.collect_strings_expr(e);
                }
                if let Some(s) = update {
                    self.collect_strings_stmt(s);
                }
                self.collect_strings_block(body);
            }
            Stmt::VarDecl(decl) => {
                if let Some(init) = &decl.init {
                    self.collect_strings_expr(init);
                }
            }
            Stmt::Assign { target, value } => {
                self.collect_strings_expr(target);
                self.collect_strings_expr(value);
            }
            Stmt::Expr(e) => self.collect_strings_expr(e),
            Stmt::Break => {}
        }
    }

    fn collect_strings_expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Str(s) => {
                self.register_string(s);
            }
            Expr::Binary { left, right, .. } => {
                self.collect_strings_expr(left);
                self.collect_strings_expr(right);
            }
            Expr::Unary { operand, .. } => self.collect_strings_expr(operand),
            Expr::Call { args, .. } => {
                for a in args {
                    self.collect_strings_expr(a);
                }
            }
            Expr::Index { array, index } => {
                self.collect_strings_expr(array);
                self.collect_strings_expr(index);
            }
            Expr::Member { object, .. } => self.collect_strings_expr(object),
            Expr::Number(_) | Expr::CharLit(_) | Expr::Identifier(_) => {}
        }
    }

    /// Emit `.section __DATA,__data` with one `.strN: .asciz "..."` per
    /// pooled literal, re-escaping any byte the assembler requires escaped
    /// (quotes, backslashes, control bytes) rather than writing it verbatim.
    pub(super) fn emit_data_section(&mut self) -> Result<(), CodegenError> {
        if self.strings.is_empty() {
            return Ok(());
        }
        self.emit(".section __DATA,__data")?;
        for s in self.strings.clone() {
            self.emit(format!(".str{}:", s.label))?;
            self.emit(format!("    .asciz \"{}\"", escape_for_asm(&s.value)))?;
        }
        self.emit("")?;
        Ok(())
    }
}

fn escape_for_asm(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\0' => out.push_str("\\000"),
            c => out.push(c),
        }
    }
    out
}
