//! Error handling for Jander
//!
//! `Error` covers everything that stops a compilation outright: lexical and
//! syntax errors, malformed trees and internal code generation failures.
//! Semantic rule violations are not errors, they are collected as
//! [`Diagnostic`](crate::utils::Diagnostic)s.

use crate::utils::Span;
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Compiler error
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    // ==================== Lexer Errors ====================

    #[error("{text} - simbolo nao identificado")]
    UnknownSymbol { text: String, span: Span },

    #[error("cadeia literal nao fechada")]
    UnclosedString { span: Span },

    #[error("comentario nao fechado")]
    UnclosedComment { span: Span },

    // ==================== Parser Errors ====================

    #[error("erro sintatico proximo a {got}")]
    UnexpectedToken { got: String, span: Span },

    #[error("erro sintatico proximo a EOF")]
    UnexpectedEof { span: Span },

    // ==================== Tree / Backend Errors ====================

    #[error("malformed tree: {message}")]
    MalformedTree { message: String, span: Span },

    #[error("Code generation error: {0}")]
    CodeGen(String),
}

impl Error {
    /// Get the span associated with this error
    pub fn span(&self) -> Option<Span> {
        match self {
            Self::UnknownSymbol { span, .. } => Some(*span),
            Self::UnclosedString { span } => Some(*span),
            Self::UnclosedComment { span } => Some(*span),
            Self::UnexpectedToken { span, .. } => Some(*span),
            Self::UnexpectedEof { span } => Some(*span),
            Self::MalformedTree { span, .. } => Some(*span),
            Self::CodeGen(_) => None,
        }
    }

    /// Source line of the error, when it has one
    pub fn line(&self) -> Option<usize> {
        self.span().and_then(|span| span.known_line())
    }

    /// Whether this error comes from reading the program text
    pub fn is_syntax(&self) -> bool {
        matches!(
            self,
            Self::UnknownSymbol { .. }
                | Self::UnclosedString { .. }
                | Self::UnclosedComment { .. }
                | Self::UnexpectedToken { .. }
                | Self::UnexpectedEof { .. }
        )
    }

    /// Render the error the way diagnostics are printed
    pub fn render(&self) -> String {
        match self.line() {
            Some(line) => format!("Linha {}: {}", line, self),
            None => format!("Error: {}", self),
        }
    }
}
