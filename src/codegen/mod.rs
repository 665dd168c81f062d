//! AArch64 Darwin code generation.
//!
//! Turns a parsed [`Program`][crate::ast::Program] into assembly text for
//! the `as`/`cc` toolchain to assemble and link. Generation is split into
//! focused submodules.
//!
//! # Key concepts
//!
//! ## Lvalue vs rvalue emission
//!
//! Every expression is emitted one of two ways: as an *lvalue* (an address,
//! left in `x0`, used as an assignment target or under `&`) or as an
//! *rvalue* (a value, left in `x0` -- except arrays and struct values,
//! which are represented by their address even in rvalue position, since
//! nothing in this language copies them by value into a register).
//!
//! ## Frame layout
//!
//! Each function's stack frame is sized once, before any code is emitted,
//! by walking the whole body and summing every `VarDecl`'s size -- including
//! ones nested under `if`/`while`/`for` blocks that haven't executed yet.
//! Locals are assigned a negative offset from `x29` when declared and never
//! have that offset reused, even after the block that declared them exits.
//! This trades some frame space for a codegen pass that never needs to
//! reconcile two blocks wanting the same slot.
//!
//! ## Struct values
//!
//! A struct held by value is always represented by its address. Passing one
//! as an argument passes that address; the callee copies the fields into its
//! own frame slot (see `program.rs`), after which the parameter behaves like
//! any other local struct.
//!
//! # Module structure
//!
//! - `state.rs`: Core types (`CodeGen`, `Local`, `StructInfo`, `EnumInfo`)
//! - `program.rs`: Struct/enum registration, frame sizing, function + program entry points
//! - `types.rs`: Field offset/type lookups, the best-effort expression type resolver
//! - `globals.rs`: String pool collection and data-section emission
//! - `lvalue.rs`: Lvalue (address) emission
//! - `expr.rs`: Rvalue expression emission
//! - `statements.rs`: Statement dispatch and block scoping
//! - `control_flow.rs`: If/else, while, for, break
//! - `error.rs`: Error type

mod control_flow;
mod error;
mod expr;
mod globals;
mod lvalue;
mod program;
mod state;
mod statements;
mod types;

pub use error::CodegenError;
pub use state::CodeGen;

use crate::ast::Program;
use crate::error::CompileError;

/// Generate assembly text for a complete program.
pub fn codegen_program(program: &Program) -> Result<String, CompileError> {
    let mut cg = CodeGen::new();
    cg.codegen_program(program)?;
    Ok(cg.take_output())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_program;

    #[test]
    fn end_to_end_return_constant() {
        let program = parse_program("int main() { return 42; }").unwrap();
        let asm = codegen_program(&program).unwrap();
        assert!(asm.contains(".globl _main"));
        assert!(asm.contains("mov x0, #42"));
        assert!(asm.contains("ret"));
    }

    #[test]
    fn end_to_end_arithmetic_precedence() {
        let program = parse_program("int main() { return 2 + 3 * 4; }").unwrap();
        let asm = codegen_program(&program).unwrap();
        assert!(asm.contains("mul x0, x9, x0"));
        assert!(asm.contains("add x0, x9, x0"));
    }

    #[test]
    fn end_to_end_loop_sum() {
        let program = parse_program(
            "int main() { int i; int sum; sum = 0; for (i = 0; i < 10; i = i + 1) { sum = sum + i; } return sum; }",
        )
        .unwrap();
        let asm = codegen_program(&program).unwrap();
        // start label, loop test branch, and back-edge jump must all be present
        assert!(asm.contains(".L0:"));
        assert!(asm.contains("b.eq .L"));
        assert!(asm.contains("b .L0"));
    }

    #[test]
    fn end_to_end_recursion() {
        let program = parse_program(
            "int fact(int n) { if (n <= 1) { return 1; } return n * fact(n - 1); }",
        )
        .unwrap();
        let asm = codegen_program(&program).unwrap();
        assert!(asm.contains("bl _fact"));
    }

    #[test]
    fn end_to_end_pointer_roundtrip() {
        let program = parse_program(
            "int main() { int x; int *p; x = 5; p = &x; *p = 10; return *p; }",
        )
        .unwrap();
        let asm = codegen_program(&program).unwrap();
        assert!(asm.contains("ldr x0, [x0]"));
    }

    #[test]
    fn end_to_end_struct_value_and_field_access() {
        let program = parse_program(
            "struct Point { int x; int y; };\nint main() { struct Point p; p.x = 1; p.y = 2; return p.x + p.y; }",
        )
        .unwrap();
        let asm = codegen_program(&program).unwrap();
        assert!(asm.contains("add x0, x0, #8")); // field y at offset 8
    }

    #[test]
    fn end_to_end_enum_and_short_circuit() {
        let program = parse_program(
            "enum Color { RED, GREEN };\nint main() { int a; a = 1; return a == 1 && GREEN == 1; }",
        )
        .unwrap();
        let asm = codegen_program(&program).unwrap();
        assert!(asm.contains("mov x0, #1")); // GREEN's ordinal
    }

    #[test]
    fn negative_break_outside_loop_is_rejected() {
        let program = parse_program("int main() { break; return 0; }").unwrap();
        assert!(codegen_program(&program).is_err());
    }

    #[test]
    fn negative_assignment_to_literal_is_rejected() {
        // The grammar can't produce `1 = 2;` as an Assign target through the
        // parser (only postfix/identifier expressions feed the `=` branch),
        // so this is exercised directly against the lvalue emitter.
        let mut cg = CodeGen::new();
        assert!(cg.codegen_lvalue(&crate::ast::Expr::Number(1)).is_err());
    }

    #[test]
    fn negative_unregistered_struct_member_access_is_rejected() {
        let program = parse_program(
            "int main() { struct Ghost g; return g.x; }",
        )
        .unwrap();
        assert!(codegen_program(&program).is_err());
    }
}
