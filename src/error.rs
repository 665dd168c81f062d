//! Compiler-wide error type.
//!
//! Every phase (lex, parse, codegen) reports failures through [`CompileError`],
//! a hand-rolled enum with manual `Display`/`Error` impls rather than a
//! derive-macro crate -- this mirrors how the rest of the pipeline is wired:
//! each phase's error is a thin wrapper carrying a source position and a
//! message, formatted uniformly as `<phase> error [at line L col C]: <msg>`.

use std::fmt;

/// A source position, 1-indexed in both dimensions (matches what a human
/// points at in an editor, and what the original lexer/parser reported).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Position { line, column }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {} col {}", self.line, self.column)
    }
}

#[derive(Debug)]
pub enum CompileError {
    Lex { pos: Position, message: String },
    Parse { pos: Position, message: String },
    Codegen { message: String },
}

impl CompileError {
    pub fn lex(pos: Position, message: impl Into<String>) -> Self {
        CompileError::Lex {
            pos,
            message: message.into(),
        }
    }

    pub fn parse(pos: Position, message: impl Into<String>) -> Self {
        CompileError::Parse {
            pos,
            message: message.into(),
        }
    }

    pub fn codegen(message: impl Into<String>) -> Self {
        CompileError::Codegen {
            message: message.into(),
        }
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompileError::Lex { pos, message } => {
                write!(f, "lex error [at {pos}]: {message}")
            }
            CompileError::Parse { pos, message } => {
                write!(f, "parse error [at {pos}]: {message}")
            }
            CompileError::Codegen { message } => write!(f, "codegen error: {message}"),
        }
    }
}

impl std::error::Error for CompileError {}

impl From<fmt::Error> for CompileError {
    fn from(e: fmt::Error) -> Self {
        CompileError::Codegen {
            message: format!("assembly formatting error: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_lex_error_with_position() {
        let e = CompileError::lex(Position::new(3, 7), "unterminated string literal");
        assert_eq!(
            e.to_string(),
            "lex error [at line 3 col 7]: unterminated string literal"
        );
    }

    #[test]
    fn formats_codegen_error_without_position() {
        let e = CompileError::codegen("unknown struct 'Foo'");
        assert_eq!(e.to_string(), "codegen error: unknown struct 'Foo'");
    }
}
