//! Semantic Analysis for the LA language
//!
//! Performs:
//! - Symbol table management (scopes, declarations)
//! - Type checking of expressions, assignments, calls and I/O commands
//! - Context checks (`retorne` only inside a function)
//!
//! Violations are collected as diagnostics; analysis never stops at the first
//! one. Only a malformed tree aborts with an [`Error`](crate::utils::Error).

mod expressions;
mod resolver;
mod symbols;

pub use expressions::AccessSite;
pub use resolver::Resolver;
pub use symbols::{Symbol, SymbolKind, SymbolTable};

use crate::frontend::ast::*;
use crate::types::{types_incompatible, Type};
use crate::utils::{Diagnostics, Result};

/// Widest `n..m` interval a `caso` label may cover; each value becomes a C
/// `case` line
pub const MAX_CASE_INTERVAL: u64 = 1024;

/// Return type of the function whose body is being checked
#[derive(Debug, Clone)]
struct FunctionContext {
    name: String,
    ret: Type,
}

/// Semantic analyzer; one per compiled unit
pub struct SemanticAnalyzer {
    resolver: Resolver,
    current_function: Option<FunctionContext>,
}

impl SemanticAnalyzer {
    pub fn new() -> Self {
        Self {
            resolver: Resolver::new(),
            current_function: None,
        }
    }

    /// Analyze a whole program
    pub fn analyze(&mut self, program: &Program) -> Result<()> {
        for decl in &program.declarations {
            match decl {
                Declaration::Local(local) => self.resolver.declare_local(local)?,
                Declaration::Subprogram(sub) => self.analyze_subprogram(sub)?,
            }
        }
        for decl in &program.body.declarations {
            self.resolver.declare_local(decl)?;
        }
        self.check_block(&program.body.statements)?;

        log::debug!(
            "semantic analysis finished with {} diagnostic(s)",
            self.resolver.diagnostics.len()
        );
        Ok(())
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.resolver.diagnostics
    }

    pub fn into_diagnostics(self) -> Diagnostics {
        self.resolver.diagnostics
    }

    /// Current scope depth; 1 once a whole program has been analyzed
    pub fn scope_depth(&self) -> usize {
        self.resolver.symbols.depth()
    }

    fn analyze_subprogram(&mut self, sub: &Subprogram) -> Result<()> {
        if !self.resolver.declare_subprogram(sub)? {
            return Ok(());
        }
        log::debug!("checking body of {}", sub.name.name);

        let context = match sub.kind {
            SubprogramKind::Function(_) => Some(FunctionContext {
                name: sub.name.name.clone(),
                ret: self.resolver.symbols.return_type(&sub.name.name),
            }),
            SubprogramKind::Procedure => None,
        };
        let saved = std::mem::replace(&mut self.current_function, context);

        let result = self
            .resolver
            .enter_subprogram(sub)
            .and_then(|_| self.check_block(&sub.statements));
        self.resolver.leave_subprogram();

        self.current_function = saved;
        result
    }

    // ==================== Statements ====================

    fn check_block(&mut self, stmts: &[Stmt]) -> Result<()> {
        for stmt in stmts {
            self.check_stmt(stmt)?;
        }
        Ok(())
    }

    fn check_stmt(&mut self, stmt: &Stmt) -> Result<()> {
        match stmt {
            Stmt::Read { targets, .. } => {
                for target in targets {
                    self.check_read_target(target)?;
                }
            }
            Stmt::Write { args, .. } => {
                for arg in args {
                    let ty = self.resolver.type_of(arg)?;
                    if !ty.is_invalid() && !ty.is_scalar() {
                        self.resolver
                            .report(arg.span(), format!("tipo {} nao pode ser escrito", ty));
                    }
                }
            }
            Stmt::If { cond, then_branch, else_branch, .. } => {
                self.resolver.type_of(cond)?;
                self.check_block(then_branch)?;
                if let Some(else_branch) = else_branch {
                    self.check_block(else_branch)?;
                }
            }
            Stmt::Case { scrutinee, arms, default, .. } => {
                self.resolver.type_of(scrutinee)?;
                for arm in arms {
                    for label in &arm.labels {
                        if label.count() > MAX_CASE_INTERVAL {
                            let values = label.values();
                            self.resolver.report(
                                arm.span,
                                format!(
                                    "intervalo {}..{} grande demais no comando caso",
                                    values.start(),
                                    values.end()
                                ),
                            );
                        }
                    }
                    self.check_block(&arm.body)?;
                }
                if let Some(default) = default {
                    self.check_block(default)?;
                }
            }
            Stmt::For { var, start, end, body, .. } => {
                if self.resolver.symbols.lookup(&var.name).is_none() {
                    self.resolver
                        .report(var.span, format!("identificador {} nao declarado", var.name));
                }
                self.resolver.type_of(start)?;
                self.resolver.type_of(end)?;
                self.check_block(body)?;
            }
            Stmt::While { cond, body, .. } => {
                self.resolver.type_of(cond)?;
                self.check_block(body)?;
            }
            Stmt::DoUntil { body, cond, .. } => {
                self.check_block(body)?;
                self.resolver.type_of(cond)?;
            }
            Stmt::Assign { target, value, .. } => self.check_assign(target, value)?,
            Stmt::Call { callee, args, .. } => {
                self.resolver.check_call(callee, args, false)?;
            }
            Stmt::Return { value, span } => {
                let ty = self.resolver.type_of(value)?;
                match self.current_function.clone() {
                    None => self
                        .resolver
                        .report(*span, "comando retorne nao permitido nesse escopo"),
                    Some(function) => {
                        if !ty.is_invalid()
                            && !function.ret.is_invalid()
                            && types_incompatible(&function.ret, &ty)
                        {
                            self.resolver.report(
                                value.span(),
                                format!("tipo de retorno incompativel na funcao {}", function.name),
                            );
                        }
                    }
                }
            }
        }
        Ok(())
    }

    fn check_assign(&mut self, target: &Access, value: &Expr) -> Result<()> {
        let target_ty = self.resolver.resolve_access(target, AccessSite::Value)?;
        let value_ty = self.resolver.type_of(value)?;

        if let Some(base) = target.var.base() {
            let is_constant = self
                .resolver
                .symbols
                .lookup(&base.name)
                .map_or(false, |symbol| symbol.kind == SymbolKind::Constant);
            if is_constant {
                self.resolver.report(
                    base.span,
                    format!("atribuicao a constante {} nao permitida", base.name),
                );
                return Ok(());
            }
        }

        if target_ty.is_invalid() || value_ty.is_invalid() {
            return Ok(());
        }
        if types_incompatible(&target_ty, &value_ty) {
            let prefix = if target.deref { "^" } else { "" };
            self.resolver.report(
                target.span,
                format!("atribuicao nao compativel para {}{}", prefix, target.var.path()),
            );
        }
        Ok(())
    }

    fn check_read_target(&mut self, target: &Access) -> Result<()> {
        let ty = self.resolver.resolve_access(target, AccessSite::Read)?;
        let path = target.var.path();
        let message = match ty {
            Type::Invalid | Type::Integer | Type::Real | Type::Literal | Type::Logical => return Ok(()),
            Type::Pointer(_) => {
                format!("nao eh permitido ler diretamente o ponteiro {}; use '^'", path)
            }
            Type::Record(_) => format!("nao eh permitido ler diretamente o registro {}", path),
            other => format!("tipo {} de {} nao pode ser lido", other, path),
        };
        self.resolver.report(target.span, message);
        Ok(())
    }
}

impl Default for SemanticAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::lexer::Lexer;
    use crate::frontend::parser::Parser;
    use pretty_assertions::assert_eq;

    fn analyze(source: &str) -> Vec<String> {
        let lexer = Lexer::new(source);
        let mut parser = Parser::new(lexer);
        let program = parser.parse_program().unwrap();
        let mut analyzer = SemanticAnalyzer::new();
        analyzer.analyze(&program).unwrap();
        assert_eq!(analyzer.scope_depth(), 1);
        analyzer.diagnostics().iter().map(|d| d.to_string()).collect()
    }

    #[test]
    fn test_well_typed_program() {
        let errors = analyze(
            "algoritmo\n\
               declare x: inteiro\n\
               declare r: real\n\
               x <- 5\n\
               r <- x * 2.5\n\
               escreva(\"x = \", x, r)\n\
             fim_algoritmo",
        );
        assert!(errors.is_empty(), "{:?}", errors);
    }

    #[test]
    fn test_incompatible_assignment() {
        let errors = analyze(
            "algoritmo\n\
               declare x: inteiro\n\
               x <- \"abc\"\n\
             fim_algoritmo",
        );
        assert_eq!(errors, vec!["Linha 3: atribuicao nao compativel para x"]);
    }

    #[test]
    fn test_call_argument_is_strict() {
        let errors = analyze(
            "funcao dobro(n: inteiro): inteiro\n\
               retorne n * 2\n\
             fim_funcao\n\
             algoritmo\n\
               declare r: real\n\
               declare i: inteiro\n\
               i <- dobro(r)\n\
             fim_algoritmo",
        );
        assert_eq!(errors, vec!["Linha 7: incompatibilidade de parametros na chamada de dobro"]);
    }

    #[test]
    fn test_redeclaration_versus_shadowing() {
        let errors = analyze(
            "declare x: inteiro\n\
             procedimento p(x: real)\n\
               declare y: literal\n\
             fim_procedimento\n\
             algoritmo\n\
               declare x: logico\n\
             fim_algoritmo",
        );
        assert_eq!(errors, vec!["Linha 6: identificador x ja declarado anteriormente"]);
    }

    #[test]
    fn test_every_independent_error_is_reported() {
        let errors = analyze(
            "algoritmo\n\
               declare a: inteiro\n\
               b <- 1\n\
               a <- c + 2\n\
               leia(d)\n\
             fim_algoritmo",
        );
        assert_eq!(
            errors,
            vec![
                "Linha 3: identificador b nao declarado",
                "Linha 4: identificador c nao declarado",
                "Linha 5: identificador d nao declarado",
            ]
        );
    }

    #[test]
    fn test_return_outside_function() {
        let errors = analyze(
            "procedimento p()\n\
               retorne 1\n\
             fim_procedimento\n\
             algoritmo\n\
               retorne 2\n\
             fim_algoritmo",
        );
        assert_eq!(
            errors,
            vec![
                "Linha 2: comando retorne nao permitido nesse escopo",
                "Linha 5: comando retorne nao permitido nesse escopo",
            ]
        );
    }

    #[test]
    fn test_return_type_checked() {
        let errors = analyze(
            "funcao nome(): literal\n\
               retorne 3\n\
             fim_funcao\n\
             algoritmo fim_algoritmo",
        );
        assert_eq!(errors, vec!["Linha 2: tipo de retorno incompativel na funcao nome"]);
    }

    #[test]
    fn test_records_and_pointers() {
        let errors = analyze(
            "tipo Pessoa: registro\n\
               nome: literal\n\
               idade: inteiro\n\
             fim_registro\n\
             algoritmo\n\
               declare p: Pessoa\n\
               declare ptr: ^inteiro\n\
               declare n: inteiro\n\
               p.idade <- 30\n\
               leia(p.nome)\n\
               ptr <- &n\n\
               ^ptr <- p.idade + 1\n\
               p.altura <- 2\n\
               ^n <- 3\n\
             fim_algoritmo",
        );
        assert_eq!(
            errors,
            vec![
                "Linha 13: identificador p.altura nao declarado",
                "Linha 14: operador '^' aplicado a um nao-ponteiro: n",
            ]
        );
    }

    #[test]
    fn test_read_rejects_pointers_and_records() {
        let errors = analyze(
            "algoritmo\n\
               declare p: ^inteiro\n\
               declare r: registro a: inteiro fim_registro\n\
               leia(p, ^p, r, r.a)\n\
             fim_algoritmo",
        );
        assert_eq!(
            errors,
            vec![
                "Linha 4: nao eh permitido ler diretamente o ponteiro p; use '^'",
                "Linha 4: nao eh permitido ler diretamente o registro r",
            ]
        );
    }

    #[test]
    fn test_unknown_type_reported_once() {
        let errors = analyze(
            "algoritmo\n\
               declare a, b: Fantasma\n\
               a <- 1\n\
               b <- a\n\
             fim_algoritmo",
        );
        assert_eq!(errors, vec!["Linha 2: tipo Fantasma nao declarado"]);
    }

    #[test]
    fn test_constants() {
        let errors = analyze(
            "constante MAX: inteiro = 10\n\
             constante NOME: literal = 3\n\
             algoritmo\n\
               declare v[MAX]: real\n\
               v[0] <- MAX\n\
               MAX <- 2\n\
             fim_algoritmo",
        );
        assert_eq!(
            errors,
            vec![
                "Linha 2: valor incompativel para a constante NOME",
                "Linha 6: atribuicao a constante MAX nao permitida",
            ]
        );
    }

    #[test]
    fn test_for_loop_variable_must_exist() {
        let errors = analyze(
            "algoritmo\n\
               para i <- 1 ate 10 faca\n\
                 escreva(i)\n\
               fim_para\n\
             fim_algoritmo",
        );
        assert_eq!(
            errors,
            vec![
                "Linha 2: identificador i nao declarado",
                "Linha 3: identificador i nao declarado",
            ]
        );
    }

    #[test]
    fn test_operator_mismatch() {
        let errors = analyze(
            "algoritmo\n\
               declare b: logico\n\
               declare s: literal\n\
               b <- s > 1\n\
               b <- nao 3\n\
             fim_algoritmo",
        );
        assert_eq!(
            errors,
            vec![
                "Linha 4: tipos incompativeis no operador >",
                "Linha 5: tipos incompativeis no operador nao",
            ]
        );
    }

    #[test]
    fn test_redeclared_subprogram_body_is_skipped() {
        let errors = analyze(
            "procedimento p()\n\
             fim_procedimento\n\
             procedimento p()\n\
               x <- 1\n\
             fim_procedimento\n\
             algoritmo fim_algoritmo",
        );
        assert_eq!(errors, vec!["Linha 3: identificador p ja declarado anteriormente"]);
    }

    #[test]
    fn test_diagnostics_follow_source_order() {
        let errors = analyze(
            "algoritmo
               declare x: inteiro
               x <- desconhecida(
                 fantasma)
               x <- w[
                 sombra]
             fim_algoritmo",
        );
        assert_eq!(
            errors,
            vec![
                "Linha 3: identificador desconhecida nao declarado",
                "Linha 4: identificador fantasma nao declarado",
                "Linha 5: identificador w nao declarado",
                "Linha 6: identificador sombra nao declarado",
            ]
        );
    }

    #[test]
    fn test_case_interval_is_bounded() {
        let errors = analyze(
            "algoritmo
               declare n: inteiro
               caso n seja
                 1..1024: escreva(\"ok\")
                 5..3: escreva(\"vazio\")
                 0..2000000000: escreva(\"enorme\")
               fim_caso
             fim_algoritmo",
        );
        assert_eq!(errors, vec!["Linha 6: intervalo 0..2000000000 grande demais no comando caso"]);
    }
}
