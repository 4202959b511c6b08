//! Compilation pipeline: source text -> tree -> diagnostics -> C source

use serde::Serialize;

use crate::backend::{CCodeGen, CodeGen};
use crate::frontend::ast::Program;
use crate::frontend::lexer::Lexer;
use crate::frontend::parser::Parser;
use crate::frontend::semantic::SemanticAnalyzer;
use crate::utils::{render_failure, Diagnostic, Result};

/// What a compilation produced. Exactly one of C text or diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    /// The program is well-typed; `code` is the generated C
    Generated { code: String },
    /// Semantic analysis found violations; nothing was generated
    Rejected { diagnostics: Vec<Diagnostic> },
    /// The first lexical or syntax error
    SyntaxError { diagnostic: Diagnostic },
}

impl Outcome {
    pub fn is_generated(&self) -> bool {
        matches!(self, Outcome::Generated { .. })
    }

    /// Text written to the output file
    pub fn render(&self) -> String {
        match self {
            Outcome::Generated { code } => code.clone(),
            Outcome::Rejected { diagnostics } => render_failure(diagnostics),
            Outcome::SyntaxError { diagnostic } => render_failure(std::iter::once(diagnostic)),
        }
    }
}

/// Compile LA source text.
///
/// Only malformed trees and internal generator failures are `Err`; syntax
/// errors and semantic violations are ordinary outcomes.
pub fn compile_source(source: &str) -> Result<Outcome> {
    log::info!("parsing ({} bytes)", source.len());
    let lexer = Lexer::new(source);
    let mut parser = Parser::new(lexer);
    let program = match parser.parse_program() {
        Ok(program) => program,
        Err(err) if err.is_syntax() => {
            log::info!("syntax error: {}", err.render());
            let span = err.span().unwrap_or_default();
            return Ok(Outcome::SyntaxError {
                diagnostic: Diagnostic::new(span, err.to_string()),
            });
        }
        Err(err) => return Err(err),
    };
    compile_program(&program)
}

/// Analyze a parsed program and, when it is clean, generate C
pub fn compile_program(program: &Program) -> Result<Outcome> {
    log::info!("semantic analysis");
    let mut analyzer = SemanticAnalyzer::new();
    analyzer.analyze(program)?;
    let diagnostics = analyzer.into_diagnostics();
    if !diagnostics.is_empty() {
        log::info!("rejected with {} diagnostic(s)", diagnostics.len());
        return Ok(Outcome::Rejected { diagnostics: diagnostics.into_vec() });
    }

    let mut codegen = CCodeGen::new();
    log::info!("code generation ({} backend)", codegen.name());
    let code = codegen.generate(program)?;
    Ok(Outcome::Generated { code })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::END_OF_COMPILATION;
    use pretty_assertions::assert_eq;

    fn compile(source: &str) -> Outcome {
        compile_source(source).unwrap()
    }

    #[test]
    fn test_example_simple_assignment() {
        let outcome = compile("algoritmo declare x: inteiro x <- 5 fim_algoritmo");
        assert!(outcome.is_generated());
        assert!(outcome.render().contains("    x = 5;\n"));
    }

    #[test]
    fn test_example_incompatible_assignment() {
        let outcome = compile(
            "algoritmo\n\
               declare x: inteiro\n\
               x <- \"abc\"\n\
             fim_algoritmo",
        );
        assert_eq!(
            outcome.render(),
            "Linha 3: atribuicao nao compativel para x\nFim da compilacao\n"
        );
    }

    #[test]
    fn test_example_call_mismatch() {
        let outcome = compile(
            "procedimento mostra(n: inteiro)\n\
               escreva(n)\n\
             fim_procedimento\n\
             algoritmo\n\
               declare r: real\n\
               mostra(r)\n\
             fim_algoritmo",
        );
        match outcome {
            Outcome::Rejected { diagnostics } => {
                assert_eq!(diagnostics.len(), 1);
                assert_eq!(
                    diagnostics[0].to_string(),
                    "Linha 6: incompatibilidade de parametros na chamada de mostra"
                );
            }
            other => panic!("expected diagnostics, got {:?}", other),
        }
    }

    #[test]
    fn test_example_percent_in_literal() {
        let outcome = compile("algoritmo escreva(\"100% feito\") fim_algoritmo");
        assert!(outcome.render().contains("printf(\"100%% feito\");"));
    }

    #[test]
    fn test_example_case_range() {
        let outcome = compile(
            "algoritmo\n\
               declare n: inteiro\n\
               leia(n)\n\
               caso n seja\n\
                 1..3: escreva(\"pequeno\")\n\
               fim_caso\n\
             fim_algoritmo",
        );
        let code = outcome.render();
        assert!(code.contains("case 1:\n"));
        assert!(code.contains("case 2:\n"));
        assert!(code.contains("case 3:\n"));
        assert_eq!(code.matches("break;").count(), 1);
    }

    #[test]
    fn test_concatenation_in_return_and_argument() {
        let outcome = compile(
            "funcao saudacao(nome: literal): literal\n\
               retorne \"ola \" + nome\n\
             fim_funcao\n\
             procedimento mostra(t: literal)\n\
               escreva(t)\n\
             fim_procedimento\n\
             algoritmo\n\
               declare s: literal\n\
               s <- saudacao(\"ana\")\n\
               escreva(s)\n\
               mostra(s + \"!\")\n\
             fim_algoritmo",
        );
        assert!(outcome.is_generated(), "{:?}", outcome);
        let code = outcome.render();
        assert!(code.contains("    return _t0;\n"), "{}", code);
        assert!(code.contains("    mostra(_t1);\n"), "{}", code);
    }

    #[test]
    fn test_syntax_error_outcome() {
        let outcome = compile(
            "algoritmo\n\
               declare x: inteiro\n\
               x <- \n\
             fim_algoritmo",
        );
        assert_eq!(
            outcome.render(),
            format!("Linha 4: erro sintatico proximo a fim_algoritmo\n{}\n", END_OF_COMPILATION)
        );
    }

    #[test]
    fn test_lexical_error_outcome() {
        let outcome = compile("algoritmo\n  declare x: inteiro\n  x <- 1 $\nfim_algoritmo");
        assert_eq!(
            outcome.render(),
            "Linha 3: $ - simbolo nao identificado\nFim da compilacao\n"
        );
    }

    #[test]
    fn test_outcome_json() {
        let outcome = compile("algoritmo\n  y <- 1\nfim_algoritmo");
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "status": "rejected",
                "diagnostics": [
                    { "line": 2, "message": "identificador y nao declarado" }
                ]
            })
        );
    }
}
