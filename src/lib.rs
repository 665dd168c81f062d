//! An ahead-of-time compiler for a small C-like statically typed language,
//! emitting AArch64 Darwin assembly text.
//!
//! The pipeline is three stages, each its own module: [`lexer`] turns
//! source text into a token stream, [`parser`] turns tokens into an
//! [`ast::Program`], and [`codegen`] turns that program into assembly.
//! [`driver`] wires the three together with file I/O and an optional
//! assemble/link step.

pub mod ast;
pub mod codegen;
pub mod config;
pub mod driver;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod peephole;

pub use config::CompilerConfig;
pub use driver::{compile_file, compile_source};
pub use error::{CompileError, Position};
