//! C Backend - Generate C code from a checked LA program
//!
//! The output is plain C99 that any C compiler accepts.

mod c_codegen;

pub use c_codegen::{CCodeGen, STRING_CAPACITY};
