//! Core types shared by every codegen submodule: the [`CodeGen`] struct and
//! its registries (locals, structs, enums, the string pool).

use std::fmt::Write as _;

use crate::ast::TypeSpec;

use super::error::CodegenError;

/// A local variable or parameter, addressed as `[x29, #offset]`.
///
/// `offset` is negative and assigned once, at declaration time, and is never
/// reused even after the variable's name goes out of scope at the end of its
/// enclosing block -- the function's frame reserves space for every local
/// ever declared in its body, not just the live set at any one point.
#[derive(Debug, Clone)]
pub struct Local {
    pub name: String,
    pub offset: i32,
    pub ty: TypeSpec,
    pub array_size: Option<i64>,
}

impl Local {
    /// A struct held by value (not behind a pointer, not an array) is
    /// represented by its address even where it behaves as an "rvalue".
    pub fn is_struct_value(&self) -> bool {
        self.ty.is_struct() && self.ty.ptr_level == 0 && self.array_size.is_none()
    }
}

#[derive(Debug, Clone)]
pub struct StructInfo {
    pub name: String,
    pub fields: Vec<(String, TypeSpec)>,
    pub total_size: i32,
}

#[derive(Debug, Clone)]
pub struct EnumInfo {
    pub values: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct StringLit {
    pub value: String,
    pub label: usize,
}

/// ARM64 AAPCS64 argument registers. Only the first six are ever populated;
/// see [`CodeGen::codegen_call`][crate::codegen::program] for the documented
/// limitation on calls with more than six arguments.
pub(super) const ARG_REGS: [&str; 8] = ["x0", "x1", "x2", "x3", "x4", "x5", "x6", "x7"];

/// Per-compilation code generator state: output buffer, label counter, and
/// the symbol registries built up across the pre-passes in `program.rs`.
///
/// Never global -- every [`CodeGen::new`] call is an independent instance,
/// so compiling two programs in the same process never lets one leak into
/// the other's symbol tables.
#[derive(Default)]
pub struct CodeGen {
    pub(super) out: String,
    pub(super) label_count: i32,

    pub(super) locals: Vec<Local>,
    pub(super) stack_offset: i32,

    pub(super) structs: Vec<StructInfo>,
    pub(super) enums: Vec<EnumInfo>,
    pub(super) strings: Vec<StringLit>,

    pub(super) break_labels: Vec<i32>,
}

impl CodeGen {
    pub fn new() -> Self {
        Self::default()
    }

    pub(super) fn emit(&mut self, line: impl AsRef<str>) -> Result<(), CodegenError> {
        writeln!(self.out, "{}", line.as_ref()).map_err(|e| CodegenError(e.to_string()))?;
        Ok(())
    }

    pub(super) fn new_label(&mut self) -> i32 {
        let l = self.label_count;
        self.label_count += 1;
        l
    }

    pub(super) fn find_local(&self, name: &str) -> Option<usize> {
        self.locals.iter().rposition(|l| l.name == name)
    }

    pub(super) fn find_struct(&self, name: &str) -> Option<usize> {
        self.structs.iter().position(|s| s.name == name)
    }

    /// Search all enums for a value name, earliest-registered enum first --
    /// the original implementation's forward scan, which means a later
    /// enum's identically-named value is simply unreachable by lookup.
    pub(super) fn find_enum_value(&self, name: &str) -> Option<i32> {
        for e in &self.enums {
            if let Some(idx) = e.values.iter().position(|v| v == name) {
                return Some(idx as i32);
            }
        }
        None
    }

    /// Register a string literal if not already present, returning its label.
    pub(super) fn register_string(&mut self, value: &str) -> usize {
        if let Some(s) = self.strings.iter().find(|s| s.value == value) {
            return s.label;
        }
        let label = self.strings.len();
        self.strings.push(StringLit {
            value: value.to_string(),
            label,
        });
        label
    }

    pub(super) fn add_local(
        &mut self,
        name: &str,
        ty: TypeSpec,
        array_size: Option<i64>,
        size_bytes: i32,
    ) -> usize {
        self.stack_offset -= size_bytes;
        let idx = self.locals.len();
        self.locals.push(Local {
            name: name.to_string(),
            offset: self.stack_offset,
            ty,
            array_size,
        });
        idx
    }

    /// Size in bytes of a struct by name. Unregistered struct names silently
    /// default to 8 bytes -- a documented quirk inherited from the source
    /// this was ported from (see DESIGN.md).
    pub(super) fn struct_size(&self, name: &str) -> i32 {
        match self.find_struct(name) {
            Some(i) => self.structs[i].total_size,
            None => 8,
        }
    }

    pub(super) fn take_output(self) -> String {
        self.out
    }
}

pub(super) fn align16(n: i32) -> i32 {
    (n + 15) & !15
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn find_enum_value_returns_first_registered_match() {
        let mut cg = CodeGen::new();
        cg.enums.push(EnumInfo {
            values: vec!["X".into()],
        });
        cg.enums.push(EnumInfo {
            values: vec!["X".into()],
        });
        assert_eq!(cg.find_enum_value("X"), Some(0));
    }

    #[test]
    fn register_string_deduplicates() {
        let mut cg = CodeGen::new();
        let a = cg.register_string("hi");
        let b = cg.register_string("hi");
        let c = cg.register_string("bye");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn align16_rounds_up() {
        assert_eq!(align16(0), 0);
        assert_eq!(align16(1), 16);
        assert_eq!(align16(16), 16);
        assert_eq!(align16(17), 32);
    }

    #[test]
    fn unregistered_struct_size_defaults_to_eight() {
        let cg = CodeGen::new();
        assert_eq!(cg.struct_size("Nope"), 8);
    }
}
