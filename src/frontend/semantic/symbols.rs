//! Symbol table with nested lexical scopes

use std::collections::HashMap;

use crate::types::{Fields, Type};
use crate::utils::Span;

/// Symbol information
#[derive(Debug, Clone, PartialEq)]
pub struct Symbol {
    pub name: String,
    pub kind: SymbolKind,
    pub ty: Type,
    pub span: Span,
}

impl Symbol {
    pub fn new(name: impl Into<String>, kind: SymbolKind, ty: Type, span: Span) -> Self {
        Self { name: name.into(), kind, ty, span }
    }

    /// Whether the symbol can be read as a value
    pub fn is_value(&self) -> bool {
        matches!(
            self.kind,
            SymbolKind::Variable | SymbolKind::Constant | SymbolKind::Parameter { .. }
        )
    }
}

/// Kind of symbol
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SymbolKind {
    Variable,
    Constant,
    /// `by_reference` for `var` parameters
    Parameter { by_reference: bool },
    /// Declared with `tipo`
    TypeName,
    /// Procedure or function; one flag per parameter
    Subprogram { by_reference: Vec<bool> },
}

/// A scope containing symbols
#[derive(Debug, Default)]
struct Scope {
    symbols: HashMap<String, Symbol>,
}

/// Stack of scopes, innermost last. The global scope is never popped.
#[derive(Debug)]
pub struct SymbolTable {
    scopes: Vec<Scope>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self {
            scopes: vec![Scope::default()],
        }
    }

    /// Enter a new scope
    pub fn open_scope(&mut self) {
        self.scopes.push(Scope::default());
        log::trace!("open scope (depth {})", self.depth());
    }

    /// Exit the current scope; a no-op on the global scope
    pub fn close_scope(&mut self) {
        if self.scopes.len() > 1 {
            self.scopes.pop();
            log::trace!("close scope (depth {})", self.depth());
        }
    }

    /// Number of open scopes, including the global one
    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    fn current(&mut self) -> &mut Scope {
        let last = self.scopes.len() - 1;
        &mut self.scopes[last]
    }

    /// Declare a symbol in the current scope.
    ///
    /// Returns false and leaves the scope untouched if the name is taken.
    pub fn declare(&mut self, symbol: Symbol) -> bool {
        let scope = self.current();
        if scope.symbols.contains_key(&symbol.name) {
            return false;
        }
        scope.symbols.insert(symbol.name.clone(), symbol);
        true
    }

    pub fn contains_in_current_scope(&self, name: &str) -> bool {
        self.scopes
            .last()
            .map_or(false, |scope| scope.symbols.contains_key(name))
    }

    /// Look up a symbol, searching from the innermost scope outward
    pub fn lookup(&self, name: &str) -> Option<&Symbol> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.symbols.get(name))
    }

    // ==================== Kind-specific accessors ====================

    /// Pointee of a pointer symbol
    pub fn pointed_type(&self, name: &str) -> Type {
        self.lookup(name).map_or(Type::Invalid, |s| s.ty.pointee())
    }

    /// Field map of a record symbol (an independent copy)
    pub fn record_fields(&self, name: &str) -> Fields {
        match self.lookup(name).map(|s| &s.ty) {
            Some(Type::Record(fields)) => fields.clone(),
            _ => Fields::new(),
        }
    }

    /// Element type of an array symbol
    pub fn array_element_type(&self, name: &str) -> Type {
        self.lookup(name).map_or(Type::Invalid, |s| s.ty.element())
    }

    /// Parameter types of a subprogram symbol
    pub fn param_types(&self, name: &str) -> Vec<Type> {
        match self.lookup(name).map(|s| &s.ty) {
            Some(Type::Function { params, .. }) => params.clone(),
            _ => Vec::new(),
        }
    }

    /// Return type of a function symbol
    pub fn return_type(&self, name: &str) -> Type {
        match self.lookup(name).map(|s| &s.ty) {
            Some(Type::Function { ret: Some(ret), .. }) => (**ret).clone(),
            _ => Type::Invalid,
        }
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}
