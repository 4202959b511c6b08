//! Identifier resolution, expression typing and call validation
//!
//! Every rule checks for `Invalid` first and stays silent on it, so one
//! mistake produces one diagnostic.

use crate::frontend::ast::*;
use crate::frontend::semantic::resolver::{malformed, Resolver};
use crate::frontend::semantic::symbols::SymbolKind;
use crate::types::{compare, promote, Type};
use crate::utils::Result;

/// Where a `^` dereference appears; each site has its own message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessSite {
    /// Expression or assignment target
    Value,
    /// Target of `leia`
    Read,
}

impl Resolver {
    // ==================== Identifiers ====================

    /// Resolve `nome(.campo)?([indice])*` to its type.
    ///
    /// Applies at most one field step and then one index step. The name is
    /// resolved before the indices are typed, so reports follow the source.
    pub fn resolve_var_ref(&mut self, var: &VarRef) -> Result<Type> {
        let ty = self.resolve_path(var)?;

        // Index expressions are always typed so their own errors surface
        for index in &var.indices {
            let index_ty = self.type_of(index)?;
            if !index_ty.is_invalid() && index_ty != Type::Integer {
                self.report(index.span(), "indice de array deve ser do tipo inteiro");
            }
        }
        Ok(ty)
    }

    /// Name, field and index steps of a reference, without typing the indices
    fn resolve_path(&mut self, var: &VarRef) -> Result<Type> {
        let base = var
            .base()
            .ok_or_else(|| malformed("identifier without a name", var.span))?;

        let symbol = match self.symbols.lookup(&base.name) {
            Some(symbol) => symbol.clone(),
            None => {
                self.report(base.span, format!("identificador {} nao declarado", var.path()));
                return Ok(Type::Invalid);
            }
        };
        if !symbol.is_value() {
            self.report(base.span, format!("identificador {} nao eh uma variavel", base.name));
            return Ok(Type::Invalid);
        }
        if var.parts.len() > 2 {
            self.report(
                var.parts[2].span,
                format!("acesso a campos aninhados nao suportado: {}", var.path()),
            );
            return Ok(Type::Invalid);
        }

        let ty = match var.parts.get(1) {
            None if var.indices.is_empty() => return Ok(symbol.ty),
            None => match symbol.ty {
                Type::Invalid => return Ok(Type::Invalid),
                Type::Array(_) => return Ok(self.symbols.array_element_type(&base.name)),
                other => other,
            },
            Some(field) => match symbol.ty {
                Type::Invalid => return Ok(Type::Invalid),
                Type::Record(_) => match self.symbols.record_fields(&base.name).get(&field.name) {
                    Some(field_ty) => field_ty.clone(),
                    None => {
                        self.report(field.span, format!("identificador {} nao declarado", var.path()));
                        return Ok(Type::Invalid);
                    }
                },
                _ => {
                    self.report(base.span, format!("identificador {} nao eh um registro", base.name));
                    return Ok(Type::Invalid);
                }
            },
        };

        if var.indices.is_empty() {
            return Ok(ty);
        }
        Ok(match ty {
            Type::Array(element) => *element,
            Type::Invalid => Type::Invalid,
            _ => {
                self.report(var.span, format!("identificador {} nao eh um array", var.path()));
                Type::Invalid
            }
        })
    }

    /// Resolve an identifier with an optional leading `^`
    pub fn resolve_access(&mut self, access: &Access, site: AccessSite) -> Result<Type> {
        let ty = self.resolve_var_ref(&access.var)?;
        if !access.deref {
            return Ok(ty);
        }
        Ok(match ty {
            Type::Pointer(_) if access.var.is_simple() => {
                self.symbols.pointed_type(&access.var.path())
            }
            Type::Pointer(inner) => *inner,
            Type::Invalid => Type::Invalid,
            _ => {
                let message = match site {
                    AccessSite::Value => {
                        format!("operador '^' aplicado a um nao-ponteiro: {}", access.var.path())
                    }
                    AccessSite::Read => format!(
                        "operador '^' aplicado a um nao-ponteiro no comando leia: {}",
                        access.var.path()
                    ),
                };
                self.report(access.span, message);
                Type::Invalid
            }
        })
    }

    // ==================== Expressions ====================

    /// Type an expression, reporting every rule it breaks
    pub fn type_of(&mut self, expr: &Expr) -> Result<Type> {
        match expr {
            Expr::IntLit(..) => Ok(Type::Integer),
            Expr::RealLit(..) => Ok(Type::Real),
            Expr::StrLit(..) => Ok(Type::Literal),
            Expr::BoolLit(..) => Ok(Type::Logical),
            Expr::Paren(inner, _) => self.type_of(inner),
            Expr::Access(access) => self.resolve_access(access, AccessSite::Value),
            Expr::AddressOf(var, _) => {
                let ty = self.resolve_var_ref(var)?;
                Ok(if ty.is_invalid() { ty } else { Type::pointer(ty) })
            }
            Expr::Call { callee, args, .. } => self.check_call(callee, args, true),
            Expr::Neg { expr: inner, span } => {
                let ty = self.type_of(inner)?;
                if ty.is_invalid() || ty.is_numeric() {
                    Ok(ty)
                } else {
                    self.report(*span, "tipos incompativeis no operador -");
                    Ok(Type::Invalid)
                }
            }
            Expr::Not { expr: inner, span } => {
                let ty = self.type_of(inner)?;
                match ty {
                    Type::Invalid | Type::Logical => Ok(ty),
                    _ => {
                        self.report(*span, "tipos incompativeis no operador nao");
                        Ok(Type::Invalid)
                    }
                }
            }
            Expr::Binary { op, left, right, .. } => {
                let left_ty = self.type_of(left)?;
                let right_ty = self.type_of(right)?;
                if left_ty.is_invalid() || right_ty.is_invalid() {
                    return Ok(Type::Invalid);
                }
                let result = Self::binary_result(*op, &left_ty, &right_ty);
                if result.is_invalid() {
                    self.report(
                        left.span(),
                        format!("tipos incompativeis no operador {}", op.symbol()),
                    );
                }
                Ok(result)
            }
        }
    }

    /// Result type of `left op right` for two valid operands
    pub fn binary_result(op: BinOp, left: &Type, right: &Type) -> Type {
        match op {
            BinOp::Or | BinOp::And => match (left, right) {
                (Type::Logical, Type::Logical) => Type::Logical,
                _ => Type::Invalid,
            },
            BinOp::Eq | BinOp::Ne | BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge => {
                compare(left, right)
            }
            BinOp::Add => match (left, right) {
                (Type::Literal, Type::Literal) => Type::Literal,
                _ => promote(left, right),
            },
            BinOp::Sub | BinOp::Mul | BinOp::Div => promote(left, right),
            BinOp::Mod => match (left, right) {
                (Type::Integer, Type::Integer) => Type::Integer,
                _ => Type::Invalid,
            },
        }
    }

    // ==================== Calls ====================

    /// Validate a call and return the callee's return type.
    ///
    /// Arguments must match parameter types exactly; no promotion. Problems
    /// with the callee are reported before the arguments are typed.
    pub fn check_call(&mut self, callee: &Ident, args: &[Expr], in_expression: bool) -> Result<Type> {
        let signature = self.callee_signature(callee, args.len(), in_expression);

        let mut arg_types = Vec::with_capacity(args.len());
        for arg in args {
            arg_types.push(self.type_of(arg)?);
        }

        let (by_reference, ret) = match signature {
            Some(signature) => signature,
            None => return Ok(Type::Invalid),
        };
        let params = self.symbols.param_types(&callee.name);
        if params.len() != args.len() {
            return Ok(ret);
        }

        let mismatch = format!("incompatibilidade de parametros na chamada de {}", callee.name);
        for (i, (arg, arg_ty)) in args.iter().zip(&arg_types).enumerate() {
            if arg_ty.is_invalid() {
                continue;
            }
            if *arg_ty != params[i] {
                self.report(arg.span(), mismatch.clone());
            } else if by_reference.get(i).copied().unwrap_or(false)
                && !matches!(arg, Expr::Access(_))
            {
                self.report(
                    arg.span(),
                    format!(
                        "argumento para parametro var deve ser uma variavel na chamada de {}",
                        callee.name
                    ),
                );
            }
        }
        Ok(ret)
    }

    /// Checks on the callee that do not need the argument types.
    ///
    /// Returns the `var` flags and the return type when the call can go on.
    fn callee_signature(
        &mut self,
        callee: &Ident,
        arg_count: usize,
        in_expression: bool,
    ) -> Option<(Vec<bool>, Type)> {
        let symbol = match self.symbols.lookup(&callee.name) {
            Some(symbol) => symbol.clone(),
            None => {
                self.report(callee.span, format!("identificador {} nao declarado", callee.name));
                return None;
            }
        };
        let (by_reference, param_count, returns_value) = match (symbol.kind, &symbol.ty) {
            (SymbolKind::Subprogram { by_reference }, Type::Function { params, ret }) => {
                (by_reference, params.len(), ret.is_some())
            }
            _ => {
                self.report(
                    callee.span,
                    format!("identificador {} nao eh um procedimento ou funcao", callee.name),
                );
                return None;
            }
        };

        if in_expression && !returns_value {
            self.report(
                callee.span,
                format!("procedimento {} nao retorna valor", callee.name),
            );
            return None;
        }
        if param_count != arg_count {
            self.report(
                callee.span,
                format!("incompatibilidade de parametros na chamada de {}", callee.name),
            );
        }
        Some((by_reference, self.symbols.return_type(&callee.name)))
    }
}
