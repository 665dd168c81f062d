//! Compiler configuration.
//!
//! Options can come from the CLI or from an optional `nullc.toml` file;
//! CLI flags always win when both are present.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::CompileError;

/// Runtime configuration for a single compile.
#[derive(Debug, Clone)]
pub struct CompilerConfig {
    /// Run the peephole pass over generated assembly before assembling.
    pub peephole: bool,

    /// Keep the intermediate `.s` file after assembling/linking.
    pub keep_asm: bool,

    /// Assembler/linker driver to invoke (defaults to `cc`).
    pub cc: String,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        CompilerConfig {
            peephole: true,
            keep_asm: false,
            cc: "cc".to_string(),
        }
    }
}

/// On-disk shape of `nullc.toml`. Every field is optional; an absent field
/// falls back to the built-in default rather than overriding it.
#[derive(Debug, Deserialize, Default)]
struct TomlConfig {
    peephole: Option<bool>,
    keep_asm: Option<bool>,
    cc: Option<String>,
}

impl CompilerConfig {
    /// Load a config file, merging its fields over the defaults.
    pub fn from_file(path: &Path) -> Result<Self, CompileError> {
        let text = fs::read_to_string(path)
            .map_err(|e| CompileError::codegen(format!("reading config {}: {e}", path.display())))?;
        Self::from_toml(&text)
    }

    /// Parse TOML config text, merging its fields over the defaults.
    pub fn from_toml(text: &str) -> Result<Self, CompileError> {
        let parsed: TomlConfig =
            toml::from_str(text).map_err(|e| CompileError::codegen(format!("parsing config: {e}")))?;

        let mut config = CompilerConfig::default();
        if let Some(v) = parsed.peephole {
            config.peephole = v;
        }
        if let Some(v) = parsed.keep_asm {
            config.keep_asm = v;
        }
        if let Some(v) = parsed.cc {
            config.cc = v;
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_runs_peephole_and_discards_asm() {
        let config = CompilerConfig::default();
        assert!(config.peephole);
        assert!(!config.keep_asm);
        assert_eq!(config.cc, "cc");
    }

    #[test]
    fn toml_overrides_only_the_fields_it_sets() {
        let config = CompilerConfig::from_toml("keep_asm = true\n").unwrap();
        assert!(config.keep_asm);
        assert!(config.peephole); // untouched default
    }

    #[test]
    fn toml_can_override_every_field() {
        let config = CompilerConfig::from_toml("peephole = false\nkeep_asm = true\ncc = \"clang\"\n").unwrap();
        assert!(!config.peephole);
        assert!(config.keep_asm);
        assert_eq!(config.cc, "clang");
    }

    #[test]
    fn malformed_toml_is_an_error() {
        assert!(CompilerConfig::from_toml("not = [valid").is_err());
    }
}
