//! Scope construction shared by the analyzer and the code generator
//!
//! Both passes build their symbol table through the same routines, so the
//! generator sees exactly the scopes and types the analyzer verified.

use crate::frontend::ast::*;
use crate::frontend::semantic::symbols::{Symbol, SymbolKind, SymbolTable};
use crate::types::{types_incompatible, Fields, Type};
use crate::utils::{Diagnostics, Error, Result, Span};

/// Symbol table plus the diagnostics its rules report
#[derive(Debug, Default)]
pub struct Resolver {
    pub symbols: SymbolTable,
    pub diagnostics: Diagnostics,
}

impl Resolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn report(&mut self, span: Span, message: impl Into<String>) {
        self.diagnostics.report(span, message);
    }

    /// Declare `name` in the current scope unless it is already taken there
    fn declare_unique(&mut self, ident: &Ident, kind: SymbolKind, ty: Type) {
        if self.symbols.contains_in_current_scope(&ident.name) {
            self.report(
                ident.span,
                format!("identificador {} ja declarado anteriormente", ident.name),
            );
            return;
        }
        log::debug!("declare {} : {}", ident.name, ty);
        self.symbols.declare(Symbol::new(ident.name.clone(), kind, ty, ident.span));
    }

    // ==================== Types ====================

    pub fn basic_type(ty: BasicType) -> Type {
        match ty {
            BasicType::Literal => Type::Literal,
            BasicType::Integer => Type::Integer,
            BasicType::Real => Type::Real,
            BasicType::Logical => Type::Logical,
        }
    }

    /// Resolve `^? (tipo_basico | IDENT)`
    pub fn resolve_extended(&mut self, ext: &ExtendedType) -> Type {
        let base = match &ext.base {
            TypeName::Basic(basic) => Self::basic_type(*basic),
            TypeName::Named(ident) => match self.symbols.lookup(&ident.name) {
                Some(symbol) if symbol.kind == SymbolKind::TypeName => symbol.ty.clone(),
                Some(_) => {
                    self.report(ident.span, format!("identificador {} nao eh um tipo", ident.name));
                    Type::Invalid
                }
                None => {
                    self.report(ident.span, format!("tipo {} nao declarado", ident.name));
                    Type::Invalid
                }
            },
        };
        if ext.pointer && !base.is_invalid() {
            Type::pointer(base)
        } else {
            base
        }
    }

    /// Resolve a `registro` body into an ordered field map
    pub fn resolve_record(&mut self, record: &RecordDef) -> Result<Type> {
        let mut fields = Fields::new();
        for field in &record.fields {
            let ty = match &field.ty {
                TypeExpr::Extended(ext) => self.resolve_extended(ext),
                TypeExpr::Record(nested) => {
                    self.report(
                        nested.span,
                        "registro aninhado anonimo nao suportado; declare-o com tipo",
                    );
                    Type::Invalid
                }
            };
            for name in &field.names {
                let ident = name
                    .base()
                    .ok_or_else(|| malformed("field without a name", name.span))?;
                if !name.is_simple() {
                    self.report(name.span, format!("nome de campo {} invalido", name.path()));
                } else if !fields.insert(ident.name.clone(), ty.clone()) {
                    self.report(
                        ident.span,
                        format!("campo {} declarado em duplicidade no registro", ident.name),
                    );
                }
            }
        }
        Ok(Type::Record(fields))
    }

    pub fn resolve_type(&mut self, ty: &TypeExpr) -> Result<Type> {
        match ty {
            TypeExpr::Record(record) => self.resolve_record(record),
            TypeExpr::Extended(ext) => Ok(self.resolve_extended(ext)),
        }
    }

    // ==================== Declarations ====================

    /// Process one `declare`, `constante` or `tipo`
    pub fn declare_local(&mut self, decl: &LocalDecl) -> Result<()> {
        match decl {
            LocalDecl::Variable(var) => self.declare_variables(var),
            LocalDecl::Constant(constant) => {
                let ty = Self::basic_type(constant.ty);
                let value_ty = match constant.value {
                    ConstValue::Str(_) => Type::Literal,
                    ConstValue::Int(_) => Type::Integer,
                    ConstValue::Real(_) => Type::Real,
                    ConstValue::Bool(_) => Type::Logical,
                };
                if types_incompatible(&ty, &value_ty) {
                    self.report(
                        constant.name.span,
                        format!("valor incompativel para a constante {}", constant.name.name),
                    );
                }
                self.declare_unique(&constant.name, SymbolKind::Constant, ty);
                Ok(())
            }
            LocalDecl::Type(type_decl) => {
                if self.symbols.contains_in_current_scope(&type_decl.name.name) {
                    self.report(
                        type_decl.name.span,
                        format!("identificador {} ja declarado anteriormente", type_decl.name.name),
                    );
                    return Ok(());
                }
                let ty = self.resolve_type(&type_decl.ty)?;
                self.declare_unique(&type_decl.name, SymbolKind::TypeName, ty);
                Ok(())
            }
        }
    }

    fn declare_variables(&mut self, var: &VariableDecl) -> Result<()> {
        if var.names.is_empty() {
            return Err(malformed("declaration without names", var.span));
        }
        let ty = self.resolve_type(&var.ty)?;
        let anonymous_record = matches!(var.ty, TypeExpr::Record(_));

        for name in &var.names {
            let ident = name
                .base()
                .ok_or_else(|| malformed("variable without a name", name.span))?;
            if name.parts.len() > 1 {
                self.report(name.span, format!("nome de variavel {} invalido", name.path()));
                continue;
            }

            for dim in &name.indices {
                let dim_ty = self.type_of(dim)?;
                if !dim_ty.is_invalid() && dim_ty != Type::Integer {
                    self.report(dim.span(), "dimensao de array deve ser do tipo inteiro");
                }
            }

            let declared = if name.indices.is_empty() {
                ty.clone()
            } else if anonymous_record {
                self.report(name.span, "arrays de registros anonimos nao sao suportados");
                Type::Invalid
            } else {
                Type::array(ty.clone())
            };
            self.declare_unique(ident, SymbolKind::Variable, declared);
        }
        Ok(())
    }

    /// Register a subprogram's signature in the current (enclosing) scope.
    ///
    /// Returns false when the name was already taken; the body must then be
    /// skipped.
    pub fn declare_subprogram(&mut self, sub: &Subprogram) -> Result<bool> {
        let mut params = Vec::new();
        let mut by_reference = Vec::new();
        for group in &sub.params {
            if group.names.is_empty() {
                return Err(malformed("parameter group without names", group.span));
            }
            let ty = self.resolve_extended(&group.ty);
            for _ in &group.names {
                params.push(ty.clone());
                by_reference.push(group.by_reference);
            }
        }
        let ret = match &sub.kind {
            SubprogramKind::Procedure => None,
            SubprogramKind::Function(ext) => Some(Box::new(self.resolve_extended(ext))),
        };

        if self.symbols.contains_in_current_scope(&sub.name.name) {
            self.report(
                sub.name.span,
                format!("identificador {} ja declarado anteriormente", sub.name.name),
            );
            return Ok(false);
        }
        log::debug!("declare subprogram {} ({} params)", sub.name.name, params.len());
        self.symbols.declare(Symbol::new(
            sub.name.name.clone(),
            SymbolKind::Subprogram { by_reference },
            Type::Function { params, ret },
            sub.name.span,
        ));
        Ok(true)
    }

    /// Open the body scope of a subprogram already registered with
    /// [`declare_subprogram`](Self::declare_subprogram), declaring its
    /// parameters and local declarations.
    pub fn enter_subprogram(&mut self, sub: &Subprogram) -> Result<()> {
        let mut param_types = self.symbols.param_types(&sub.name.name).into_iter();
        self.symbols.open_scope();

        for group in &sub.params {
            for name in &group.names {
                let ty = param_types.next().unwrap_or(Type::Invalid);
                let ident = name
                    .base()
                    .ok_or_else(|| malformed("parameter without a name", name.span))?;
                if !name.is_simple() {
                    self.report(name.span, format!("nome de parametro {} invalido", name.path()));
                    continue;
                }
                let kind = SymbolKind::Parameter { by_reference: group.by_reference };
                self.declare_unique(ident, kind, ty);
            }
        }

        for decl in &sub.declarations {
            self.declare_local(decl)?;
        }
        Ok(())
    }

    pub fn leave_subprogram(&mut self) {
        self.symbols.close_scope();
    }
}

pub(crate) fn malformed(message: &str, span: Span) -> Error {
    Error::MalformedTree { message: message.to_string(), span }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ident(name: &str, line: usize) -> Ident {
        Ident::new(name, Span::at_line(line))
    }

    fn basic(ty: BasicType) -> TypeExpr {
        TypeExpr::Extended(ExtendedType {
            pointer: false,
            base: TypeName::Basic(ty),
            span: Span::dummy(),
        })
    }

    fn declare(names: &[&str], ty: TypeExpr) -> LocalDecl {
        LocalDecl::Variable(VariableDecl {
            names: names.iter().map(|n| VarRef::simple(ident(n, 1))).collect(),
            ty,
            span: Span::at_line(1),
        })
    }

    #[test]
    fn test_variables_are_declared_with_their_type() {
        let mut resolver = Resolver::new();
        resolver.declare_local(&declare(&["a", "b"], basic(BasicType::Real))).unwrap();
        assert_eq!(resolver.symbols.lookup("b").map(|s| s.ty.clone()), Some(Type::Real));
        assert!(resolver.diagnostics.is_empty());
    }

    #[test]
    fn test_unknown_type_declares_invalid_once() {
        let mut resolver = Resolver::new();
        let ty = TypeExpr::Extended(ExtendedType {
            pointer: true,
            base: TypeName::Named(ident("Fantasma", 2)),
            span: Span::at_line(2),
        });
        resolver.declare_local(&declare(&["p", "q"], ty)).unwrap();
        assert_eq!(resolver.diagnostics.len(), 1);
        assert_eq!(resolver.symbols.lookup("p").map(|s| s.ty.clone()), Some(Type::Invalid));
    }

    #[test]
    fn test_record_with_duplicate_field() {
        let mut resolver = Resolver::new();
        let record = RecordDef {
            fields: vec![
                VariableDecl {
                    names: vec![VarRef::simple(ident("x", 3))],
                    ty: basic(BasicType::Integer),
                    span: Span::at_line(3),
                },
                VariableDecl {
                    names: vec![VarRef::simple(ident("x", 4))],
                    ty: basic(BasicType::Real),
                    span: Span::at_line(4),
                },
            ],
            span: Span::at_line(3),
        };
        let ty = resolver.resolve_record(&record).unwrap();
        let Type::Record(fields) = ty else { panic!("expected a record") };
        assert_eq!(fields.len(), 1);
        let messages: Vec<_> = resolver.diagnostics.iter().map(|d| d.to_string()).collect();
        assert_eq!(messages, vec!["Linha 4: campo x declarado em duplicidade no registro"]);
    }

    #[test]
    fn test_empty_declaration_is_malformed() {
        let mut resolver = Resolver::new();
        let err = resolver.declare_local(&declare(&[], basic(BasicType::Integer))).unwrap_err();
        assert!(matches!(err, Error::MalformedTree { .. }));
    }

    #[test]
    fn test_subprogram_scope_round_trip() {
        let mut resolver = Resolver::new();
        let sub = Subprogram {
            name: ident("soma", 1),
            kind: SubprogramKind::Function(ExtendedType {
                pointer: false,
                base: TypeName::Basic(BasicType::Integer),
                span: Span::dummy(),
            }),
            params: vec![ParamGroup {
                by_reference: true,
                names: vec![VarRef::simple(ident("a", 1)), VarRef::simple(ident("b", 1))],
                ty: ExtendedType {
                    pointer: false,
                    base: TypeName::Basic(BasicType::Integer),
                    span: Span::dummy(),
                },
                span: Span::dummy(),
            }],
            declarations: vec![declare(&["t"], basic(BasicType::Real))],
            statements: Vec::new(),
            span: Span::at_line(1),
        };

        assert!(resolver.declare_subprogram(&sub).unwrap());
        resolver.enter_subprogram(&sub).unwrap();
        assert_eq!(resolver.symbols.depth(), 2);
        let a = resolver.symbols.lookup("a").cloned().unwrap();
        assert_eq!(a.kind, SymbolKind::Parameter { by_reference: true });
        assert!(resolver.symbols.lookup("t").is_some());
        resolver.leave_subprogram();
        assert_eq!(resolver.symbols.depth(), 1);
        assert!(resolver.symbols.lookup("a").is_none());
        assert_eq!(resolver.symbols.param_types("soma").len(), 2);

        assert!(!resolver.declare_subprogram(&sub).unwrap());
        assert_eq!(resolver.diagnostics.len(), 1);
    }
}
