//! Code Generation trait - Backend abstraction

use crate::frontend::ast::Program;
use crate::utils::Result;

/// Code generation backend trait
pub trait CodeGen {
    /// Generate target source text from a checked program
    fn generate(&mut self, program: &Program) -> Result<String>;

    /// Get the backend name
    fn name(&self) -> &str;
}
