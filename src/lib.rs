//! Jander - a compiler for the LA teaching language
//!
//! Pipeline: [`frontend`] (lexer, parser, semantic analysis) then
//! [`backend`] (C generation), wired together by [`driver`].

pub mod backend;
pub mod driver;
pub mod frontend;
pub mod types;
pub mod utils;

pub use driver::{compile_program, compile_source, Outcome};
