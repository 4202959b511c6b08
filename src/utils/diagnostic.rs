//! Semantic diagnostics
//!
//! A diagnostic is one violated rule, tagged with the source line of the
//! offending token. Diagnostics are kept in source order and never merged.

use std::fmt;

use serde::Serialize;

use crate::utils::Span;

/// Marker line printed after the diagnostics of a failed compilation
pub const END_OF_COMPILATION: &str = "Fim da compilacao";

/// A single reported rule violation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub line: Option<usize>,
    pub message: String,
}

impl Diagnostic {
    pub fn new(span: Span, message: impl Into<String>) -> Self {
        Self {
            line: span.known_line(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "Linha {}: {}", line, self.message),
            None => write!(f, "Error: {}", self.message),
        }
    }
}

/// Ordered, append-only list of diagnostics for one compiled unit
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a violation at `span`
    pub fn report(&mut self, span: Span, message: impl Into<String>) {
        let diagnostic = Diagnostic::new(span, message);
        log::debug!("{}", diagnostic);
        self.items.push(diagnostic);
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter()
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.items
    }
}

/// Render diagnostics one per line followed by the end marker
pub fn render_failure<'a>(diagnostics: impl IntoIterator<Item = &'a Diagnostic>) -> String {
    let mut out = String::new();
    for diagnostic in diagnostics {
        out.push_str(&diagnostic.to_string());
        out.push('\n');
    }
    out.push_str(END_OF_COMPILATION);
    out.push('\n');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_line_prefix() {
        let d = Diagnostic::new(Span::at_line(3), "identificador x nao declarado");
        assert_eq!(d.to_string(), "Linha 3: identificador x nao declarado");
    }

    #[test]
    fn test_generic_prefix_without_line() {
        let d = Diagnostic::new(Span::dummy(), "registro sem campos");
        assert_eq!(d.to_string(), "Error: registro sem campos");
    }

    #[test]
    fn test_render_keeps_order_and_duplicates() {
        let mut diags = Diagnostics::new();
        diags.report(Span::at_line(5), "b");
        diags.report(Span::at_line(2), "a");
        diags.report(Span::at_line(2), "a");
        assert_eq!(diags.len(), 3);
        assert_eq!(
            render_failure(diags.iter()),
            "Linha 5: b\nLinha 2: a\nLinha 2: a\nFim da compilacao\n"
        );
    }
}
