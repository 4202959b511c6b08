//! Token definitions for the LA language

use crate::utils::Span;

/// A token produced by the lexer
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// Source text of the token, used by syntax error messages
    pub text: String,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, span: Span) -> Self {
        Self { kind, text: text.into(), span }
    }

    pub fn eof(span: Span) -> Self {
        Self { kind: TokenKind::Eof, text: "EOF".to_string(), span }
    }
}

/// Token kinds
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // ============ Keywords ============
    Algoritmo,
    FimAlgoritmo,
    Declare,
    Constante,
    Tipo,
    Literal,
    Inteiro,
    Real,
    Logico,
    Verdadeiro,
    Falso,
    Registro,
    FimRegistro,
    Procedimento,
    FimProcedimento,
    Funcao,
    FimFuncao,
    Var,
    Leia,
    Escreva,
    Se,
    Entao,
    Senao,
    FimSe,
    Caso,
    Seja,
    FimCaso,
    Para,
    Ate,
    Faca,
    FimPara,
    Enquanto,
    FimEnquanto,
    Retorne,
    E,
    Ou,
    Nao,

    // ============ Identifiers and Literals ============
    Ident(String),
    IntLit(i64),
    /// Kept as written so generated C reproduces it exactly
    RealLit(String),
    /// Raw contents between the quotes
    StringLit(String),

    // ============ Operators ============
    /// `<-`
    Assign,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Caret,
    Ampersand,
    Dot,
    DotDot,

    // ============ Delimiters ============
    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,
    Colon,

    // ============ Lexical errors ============
    /// A character outside the language alphabet
    Unknown(String),
    UnclosedString,
    UnclosedComment,

    // ============ Special ============
    Eof,
}

impl TokenKind {
    pub fn is_keyword(&self) -> bool {
        Self::keyword_name(self).is_some()
    }

    pub fn keyword_from_str(s: &str) -> Option<TokenKind> {
        let kind = match s {
            "algoritmo" => TokenKind::Algoritmo,
            "fim_algoritmo" => TokenKind::FimAlgoritmo,
            "declare" => TokenKind::Declare,
            "constante" => TokenKind::Constante,
            "tipo" => TokenKind::Tipo,
            "literal" => TokenKind::Literal,
            "inteiro" => TokenKind::Inteiro,
            "real" => TokenKind::Real,
            "logico" => TokenKind::Logico,
            "verdadeiro" => TokenKind::Verdadeiro,
            "falso" => TokenKind::Falso,
            "registro" => TokenKind::Registro,
            "fim_registro" => TokenKind::FimRegistro,
            "procedimento" => TokenKind::Procedimento,
            "fim_procedimento" => TokenKind::FimProcedimento,
            "funcao" => TokenKind::Funcao,
            "fim_funcao" => TokenKind::FimFuncao,
            "var" => TokenKind::Var,
            "leia" => TokenKind::Leia,
            "escreva" => TokenKind::Escreva,
            "se" => TokenKind::Se,
            "entao" => TokenKind::Entao,
            "senao" => TokenKind::Senao,
            "fim_se" => TokenKind::FimSe,
            "caso" => TokenKind::Caso,
            "seja" => TokenKind::Seja,
            "fim_caso" => TokenKind::FimCaso,
            "para" => TokenKind::Para,
            "ate" => TokenKind::Ate,
            "faca" => TokenKind::Faca,
            "fim_para" => TokenKind::FimPara,
            "enquanto" => TokenKind::Enquanto,
            "fim_enquanto" => TokenKind::FimEnquanto,
            "retorne" => TokenKind::Retorne,
            "e" => TokenKind::E,
            "ou" => TokenKind::Ou,
            "nao" => TokenKind::Nao,
            _ => return None,
        };
        Some(kind)
    }

    fn keyword_name(kind: &TokenKind) -> Option<&'static str> {
        let name = match kind {
            TokenKind::Algoritmo => "algoritmo",
            TokenKind::FimAlgoritmo => "fim_algoritmo",
            TokenKind::Declare => "declare",
            TokenKind::Constante => "constante",
            TokenKind::Tipo => "tipo",
            TokenKind::Literal => "literal",
            TokenKind::Inteiro => "inteiro",
            TokenKind::Real => "real",
            TokenKind::Logico => "logico",
            TokenKind::Verdadeiro => "verdadeiro",
            TokenKind::Falso => "falso",
            TokenKind::Registro => "registro",
            TokenKind::FimRegistro => "fim_registro",
            TokenKind::Procedimento => "procedimento",
            TokenKind::FimProcedimento => "fim_procedimento",
            TokenKind::Funcao => "funcao",
            TokenKind::FimFuncao => "fim_funcao",
            TokenKind::Var => "var",
            TokenKind::Leia => "leia",
            TokenKind::Escreva => "escreva",
            TokenKind::Se => "se",
            TokenKind::Entao => "entao",
            TokenKind::Senao => "senao",
            TokenKind::FimSe => "fim_se",
            TokenKind::Caso => "caso",
            TokenKind::Seja => "seja",
            TokenKind::FimCaso => "fim_caso",
            TokenKind::Para => "para",
            TokenKind::Ate => "ate",
            TokenKind::Faca => "faca",
            TokenKind::FimPara => "fim_para",
            TokenKind::Enquanto => "enquanto",
            TokenKind::FimEnquanto => "fim_enquanto",
            TokenKind::Retorne => "retorne",
            TokenKind::E => "e",
            TokenKind::Ou => "ou",
            TokenKind::Nao => "nao",
            _ => return None,
        };
        Some(name)
    }

    /// Tokens that begin a command
    pub fn starts_command(&self) -> bool {
        matches!(
            self,
            TokenKind::Leia
                | TokenKind::Escreva
                | TokenKind::Se
                | TokenKind::Caso
                | TokenKind::Para
                | TokenKind::Enquanto
                | TokenKind::Faca
                | TokenKind::Retorne
                | TokenKind::Caret
                | TokenKind::Ident(_)
        )
    }

    /// Tokens that begin a local declaration
    pub fn starts_declaration(&self) -> bool {
        matches!(self, TokenKind::Declare | TokenKind::Constante | TokenKind::Tipo)
    }
}
