//! Orchestrates a single compile: source -> assembly -> optional peephole
//! pass -> optional assemble/link via the system `cc`.

use std::fs;
use std::path::Path;
use std::process::Command;

use crate::config::CompilerConfig;
use crate::error::CompileError;
use crate::{codegen, parser};

/// Compile source text to AArch64 assembly text, without touching the
/// filesystem or invoking an external toolchain.
pub fn compile_source(source: &str) -> Result<String, CompileError> {
    let program = parser::parse_program(source)?;
    codegen::codegen_program(&program)
}

/// Compile `input` to an executable at `output`, writing the intermediate
/// `.s` file alongside `output` and invoking `config.cc` to assemble and
/// link it. The `.s` file is removed afterward unless `config.keep_asm`.
pub fn compile_file(input: &Path, output: &Path, config: &CompilerConfig) -> Result<(), CompileError> {
    let source = fs::read_to_string(input)
        .map_err(|e| CompileError::codegen(format!("reading {}: {e}", input.display())))?;

    let mut asm = compile_source(&source)?;
    if config.peephole {
        let (optimized, _removed) = crate::peephole::optimize(&asm);
        asm = optimized;
    }

    let asm_path = output.with_extension("s");
    fs::write(&asm_path, &asm)
        .map_err(|e| CompileError::codegen(format!("writing {}: {e}", asm_path.display())))?;

    let status = Command::new(&config.cc)
        .arg(&asm_path)
        .arg("-o")
        .arg(output)
        .status()
        .map_err(|e| CompileError::codegen(format!("running {}: {e}", config.cc)))?;

    if !config.keep_asm {
        fs::remove_file(&asm_path).ok();
    }

    if !status.success() {
        return Err(CompileError::codegen(format!(
            "{} exited with status {status}",
            config.cc
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compile_source_emits_darwin_assembly() {
        let asm = compile_source("int main() { return 0; }").unwrap();
        assert!(asm.contains(".globl _main"));
        assert!(asm.contains(".section __TEXT,__text"));
    }

    #[test]
    fn compile_source_propagates_parse_errors() {
        let err = compile_source("int main( { return 0; }").unwrap_err();
        assert!(matches!(err, CompileError::Parse { .. }));
    }

    #[test]
    fn compile_file_reports_missing_input() {
        let config = CompilerConfig::default();
        let err = compile_file(Path::new("/nonexistent/input.nc"), Path::new("/tmp/out"), &config)
            .unwrap_err();
        assert!(matches!(err, CompileError::Codegen { .. }));
    }
}
