//! Backend module - Code generation

pub mod codegen;

pub mod c;

pub use c::CCodeGen;
pub use codegen::CodeGen;
