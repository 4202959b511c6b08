//! Parser for the LA language
//!
//! Recursive descent, one method per grammar level. The first lexical or
//! syntax error ends parsing.

use crate::frontend::ast::*;
use crate::frontend::lexer::Lexer;
use crate::frontend::token::{Token, TokenKind};
use crate::utils::{Error, Result, Span};

/// The parser
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    /// Create a new parser from a lexer
    pub fn new(mut lexer: Lexer) -> Self {
        Self::from_tokens(lexer.tokenize())
    }

    /// Create a parser from pre-tokenized input
    pub fn from_tokens(mut tokens: Vec<Token>) -> Self {
        if tokens.last().map_or(true, |t| t.kind != TokenKind::Eof) {
            let span = tokens.last().map(|t| t.span).unwrap_or_default();
            tokens.push(Token::eof(span));
        }
        Self { tokens, pos: 0 }
    }

    // ==================== Helper Methods ====================

    fn current(&self) -> &Token {
        let last = self.tokens.len() - 1;
        &self.tokens[self.pos.min(last)]
    }

    fn current_kind(&self) -> &TokenKind {
        &self.current().kind
    }

    fn peek_kind(&self) -> Option<&TokenKind> {
        self.tokens.get(self.pos + 1).map(|t| &t.kind)
    }

    fn previous_span(&self) -> Span {
        self.tokens[self.pos.saturating_sub(1)].span
    }

    fn advance(&mut self) -> Token {
        let token = self.current().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    fn check(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(self.current_kind()) == std::mem::discriminant(kind)
    }

    fn expect(&mut self, expected: TokenKind) -> Result<Token> {
        if self.check(&expected) {
            Ok(self.advance())
        } else {
            Err(self.error_at_current())
        }
    }

    fn consume(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Syntax error at the current token. Lexical error tokens report
    /// their own message.
    fn error_at_current(&self) -> Error {
        let token = self.current();
        let span = token.span;
        match &token.kind {
            TokenKind::Unknown(text) => Error::UnknownSymbol { text: text.clone(), span },
            TokenKind::UnclosedString => Error::UnclosedString { span },
            TokenKind::UnclosedComment => Error::UnclosedComment { span },
            TokenKind::Eof => Error::UnexpectedEof { span },
            _ => Error::UnexpectedToken { got: token.text.clone(), span },
        }
    }

    fn parse_ident(&mut self) -> Result<Ident> {
        let token = self.current().clone();
        match token.kind {
            TokenKind::Ident(name) => {
                self.advance();
                Ok(Ident::new(name, token.span))
            }
            _ => Err(self.error_at_current()),
        }
    }

    // ==================== Declarations ====================

    /// Parse a complete program
    pub fn parse_program(&mut self) -> Result<Program> {
        let start = self.current().span;
        let mut declarations = Vec::new();

        loop {
            match self.current_kind() {
                TokenKind::Declare | TokenKind::Constante | TokenKind::Tipo => {
                    declarations.push(Declaration::Local(self.parse_local_decl()?));
                }
                TokenKind::Procedimento | TokenKind::Funcao => {
                    declarations.push(Declaration::Subprogram(self.parse_subprogram()?));
                }
                _ => break,
            }
        }

        self.expect(TokenKind::Algoritmo)?;
        let body = Body {
            declarations: self.parse_local_decls()?,
            statements: self.parse_commands()?,
        };
        self.expect(TokenKind::FimAlgoritmo)?;
        self.expect(TokenKind::Eof)?;

        Ok(Program {
            declarations,
            body,
            span: start.merge(&self.previous_span()),
        })
    }

    fn parse_local_decls(&mut self) -> Result<Vec<LocalDecl>> {
        let mut decls = Vec::new();
        while self.current_kind().starts_declaration() {
            decls.push(self.parse_local_decl()?);
        }
        Ok(decls)
    }

    fn parse_local_decl(&mut self) -> Result<LocalDecl> {
        let start = self.current().span;
        match self.current_kind() {
            TokenKind::Declare => {
                self.advance();
                Ok(LocalDecl::Variable(self.parse_variable()?))
            }
            TokenKind::Constante => {
                self.advance();
                let name = self.parse_ident()?;
                self.expect(TokenKind::Colon)?;
                let ty = self.parse_basic_type()?;
                self.expect(TokenKind::Eq)?;
                let value = self.parse_const_value()?;
                Ok(LocalDecl::Constant(ConstantDecl {
                    name,
                    ty,
                    value,
                    span: start.merge(&self.previous_span()),
                }))
            }
            TokenKind::Tipo => {
                self.advance();
                let name = self.parse_ident()?;
                self.expect(TokenKind::Colon)?;
                let ty = self.parse_type()?;
                Ok(LocalDecl::Type(TypeDecl {
                    name,
                    ty,
                    span: start.merge(&self.previous_span()),
                }))
            }
            _ => Err(self.error_at_current()),
        }
    }

    /// `identificador (',' identificador)* ':' tipo`
    fn parse_variable(&mut self) -> Result<VariableDecl> {
        let start = self.current().span;
        let mut names = vec![self.parse_var_ref()?];
        while self.consume(&TokenKind::Comma) {
            names.push(self.parse_var_ref()?);
        }
        self.expect(TokenKind::Colon)?;
        let ty = self.parse_type()?;
        Ok(VariableDecl {
            names,
            ty,
            span: start.merge(&self.previous_span()),
        })
    }

    fn parse_type(&mut self) -> Result<TypeExpr> {
        if self.check(&TokenKind::Registro) {
            let start = self.advance().span;
            let mut fields = Vec::new();
            while matches!(self.current_kind(), TokenKind::Ident(_)) {
                fields.push(self.parse_variable()?);
            }
            self.expect(TokenKind::FimRegistro)?;
            Ok(TypeExpr::Record(RecordDef {
                fields,
                span: start.merge(&self.previous_span()),
            }))
        } else {
            Ok(TypeExpr::Extended(self.parse_extended_type()?))
        }
    }

    fn parse_extended_type(&mut self) -> Result<ExtendedType> {
        let start = self.current().span;
        let pointer = self.consume(&TokenKind::Caret);
        let base = if matches!(self.current_kind(), TokenKind::Ident(_)) {
            TypeName::Named(self.parse_ident()?)
        } else {
            TypeName::Basic(self.parse_basic_type()?)
        };
        Ok(ExtendedType {
            pointer,
            base,
            span: start.merge(&self.previous_span()),
        })
    }

    fn parse_basic_type(&mut self) -> Result<BasicType> {
        let ty = match self.current_kind() {
            TokenKind::Literal => BasicType::Literal,
            TokenKind::Inteiro => BasicType::Integer,
            TokenKind::Real => BasicType::Real,
            TokenKind::Logico => BasicType::Logical,
            _ => return Err(self.error_at_current()),
        };
        self.advance();
        Ok(ty)
    }

    fn parse_const_value(&mut self) -> Result<ConstValue> {
        let value = match self.current_kind() {
            TokenKind::StringLit(s) => ConstValue::Str(s.clone()),
            TokenKind::IntLit(n) => ConstValue::Int(*n),
            TokenKind::RealLit(text) => ConstValue::Real(text.clone()),
            TokenKind::Verdadeiro => ConstValue::Bool(true),
            TokenKind::Falso => ConstValue::Bool(false),
            _ => return Err(self.error_at_current()),
        };
        self.advance();
        Ok(value)
    }

    /// `procedimento` / `funcao` definition
    fn parse_subprogram(&mut self) -> Result<Subprogram> {
        let start = self.current().span;
        let is_function = self.check(&TokenKind::Funcao);
        self.advance();

        let name = self.parse_ident()?;
        self.expect(TokenKind::LParen)?;
        let mut params = Vec::new();
        if !self.check(&TokenKind::RParen) {
            params.push(self.parse_param_group()?);
            while self.consume(&TokenKind::Comma) {
                params.push(self.parse_param_group()?);
            }
        }
        self.expect(TokenKind::RParen)?;

        let kind = if is_function {
            self.expect(TokenKind::Colon)?;
            SubprogramKind::Function(self.parse_extended_type()?)
        } else {
            SubprogramKind::Procedure
        };

        let declarations = self.parse_local_decls()?;
        let statements = self.parse_commands()?;
        if is_function {
            self.expect(TokenKind::FimFuncao)?;
        } else {
            self.expect(TokenKind::FimProcedimento)?;
        }

        Ok(Subprogram {
            name,
            kind,
            params,
            declarations,
            statements,
            span: start.merge(&self.previous_span()),
        })
    }

    /// `var? identificador (',' identificador)* ':' tipo_estendido`
    fn parse_param_group(&mut self) -> Result<ParamGroup> {
        let start = self.current().span;
        let by_reference = self.consume(&TokenKind::Var);
        let mut names = vec![self.parse_var_ref()?];
        while self.consume(&TokenKind::Comma) {
            names.push(self.parse_var_ref()?);
        }
        self.expect(TokenKind::Colon)?;
        let ty = self.parse_extended_type()?;
        Ok(ParamGroup {
            by_reference,
            names,
            ty,
            span: start.merge(&self.previous_span()),
        })
    }

    /// `IDENT ('.' IDENT)* ('[' exp_aritmetica ']')*`
    fn parse_var_ref(&mut self) -> Result<VarRef> {
        let first = self.parse_ident()?;
        let start = first.span;
        let mut parts = vec![first];
        while self.consume(&TokenKind::Dot) {
            parts.push(self.parse_ident()?);
        }
        let mut indices = Vec::new();
        while self.consume(&TokenKind::LBracket) {
            indices.push(self.parse_arith()?);
            self.expect(TokenKind::RBracket)?;
        }
        Ok(VarRef {
            parts,
            indices,
            span: start.merge(&self.previous_span()),
        })
    }

    fn parse_access(&mut self) -> Result<Access> {
        let start = self.current().span;
        let deref = self.consume(&TokenKind::Caret);
        let var = self.parse_var_ref()?;
        Ok(Access {
            deref,
            var,
            span: start.merge(&self.previous_span()),
        })
    }

    // ==================== Commands ====================

    fn parse_commands(&mut self) -> Result<Vec<Stmt>> {
        let mut stmts = Vec::new();
        while self.current_kind().starts_command() {
            stmts.push(self.parse_command()?);
        }
        Ok(stmts)
    }

    fn parse_command(&mut self) -> Result<Stmt> {
        let start = self.current().span;
        match self.current_kind() {
            TokenKind::Leia => {
                self.advance();
                self.expect(TokenKind::LParen)?;
                let mut targets = vec![self.parse_access()?];
                while self.consume(&TokenKind::Comma) {
                    targets.push(self.parse_access()?);
                }
                self.expect(TokenKind::RParen)?;
                Ok(Stmt::Read { targets, span: start.merge(&self.previous_span()) })
            }
            TokenKind::Escreva => {
                self.advance();
                self.expect(TokenKind::LParen)?;
                let args = self.parse_expr_list()?;
                self.expect(TokenKind::RParen)?;
                Ok(Stmt::Write { args, span: start.merge(&self.previous_span()) })
            }
            TokenKind::Se => self.parse_if(),
            TokenKind::Caso => self.parse_case(),
            TokenKind::Para => {
                self.advance();
                let var = self.parse_ident()?;
                self.expect(TokenKind::Assign)?;
                let from = self.parse_arith()?;
                self.expect(TokenKind::Ate)?;
                let to = self.parse_arith()?;
                self.expect(TokenKind::Faca)?;
                let body = self.parse_commands()?;
                self.expect(TokenKind::FimPara)?;
                Ok(Stmt::For {
                    var,
                    start: from,
                    end: to,
                    body,
                    span: start.merge(&self.previous_span()),
                })
            }
            TokenKind::Enquanto => {
                self.advance();
                let cond = self.parse_expr()?;
                self.expect(TokenKind::Faca)?;
                let body = self.parse_commands()?;
                self.expect(TokenKind::FimEnquanto)?;
                Ok(Stmt::While { cond, body, span: start.merge(&self.previous_span()) })
            }
            TokenKind::Faca => {
                self.advance();
                let body = self.parse_commands()?;
                self.expect(TokenKind::Ate)?;
                let cond = self.parse_expr()?;
                Ok(Stmt::DoUntil { body, cond, span: start.merge(&self.previous_span()) })
            }
            TokenKind::Retorne => {
                self.advance();
                let value = self.parse_expr()?;
                Ok(Stmt::Return { value, span: start.merge(&self.previous_span()) })
            }
            TokenKind::Ident(_) if self.peek_kind() == Some(&TokenKind::LParen) => {
                let callee = self.parse_ident()?;
                self.expect(TokenKind::LParen)?;
                let args = self.parse_call_args()?;
                self.expect(TokenKind::RParen)?;
                Ok(Stmt::Call { callee, args, span: start.merge(&self.previous_span()) })
            }
            TokenKind::Ident(_) | TokenKind::Caret => {
                let target = self.parse_access()?;
                self.expect(TokenKind::Assign)?;
                let value = self.parse_expr()?;
                Ok(Stmt::Assign { target, value, span: start.merge(&self.previous_span()) })
            }
            _ => Err(self.error_at_current()),
        }
    }

    fn parse_if(&mut self) -> Result<Stmt> {
        let start = self.advance().span;
        let cond = self.parse_expr()?;
        self.expect(TokenKind::Entao)?;
        let then_branch = self.parse_commands()?;
        let else_branch = if self.consume(&TokenKind::Senao) {
            Some(self.parse_commands()?)
        } else {
            None
        };
        self.expect(TokenKind::FimSe)?;
        Ok(Stmt::If {
            cond,
            then_branch,
            else_branch,
            span: start.merge(&self.previous_span()),
        })
    }

    fn parse_case(&mut self) -> Result<Stmt> {
        let start = self.advance().span;
        let scrutinee = self.parse_arith()?;
        self.expect(TokenKind::Seja)?;

        let mut arms = Vec::new();
        while matches!(self.current_kind(), TokenKind::IntLit(_) | TokenKind::Minus) {
            let arm_start = self.current().span;
            let mut labels = vec![self.parse_case_label()?];
            while self.consume(&TokenKind::Comma) {
                labels.push(self.parse_case_label()?);
            }
            self.expect(TokenKind::Colon)?;
            let body = self.parse_commands()?;
            arms.push(CaseArm {
                labels,
                body,
                span: arm_start.merge(&self.previous_span()),
            });
        }

        let default = if self.consume(&TokenKind::Senao) {
            Some(self.parse_commands()?)
        } else {
            None
        };
        self.expect(TokenKind::FimCaso)?;
        Ok(Stmt::Case {
            scrutinee,
            arms,
            default,
            span: start.merge(&self.previous_span()),
        })
    }

    fn parse_case_label(&mut self) -> Result<CaseLabel> {
        let start = self.parse_case_bound()?;
        let end = if self.consume(&TokenKind::DotDot) {
            Some(self.parse_case_bound()?)
        } else {
            None
        };
        Ok(CaseLabel { start, end })
    }

    fn parse_case_bound(&mut self) -> Result<CaseBound> {
        let negative = self.consume(&TokenKind::Minus);
        match self.current_kind() {
            TokenKind::IntLit(value) => {
                let value = *value;
                self.advance();
                Ok(CaseBound { negative, value })
            }
            _ => Err(self.error_at_current()),
        }
    }

    // ==================== Expressions ====================

    fn parse_expr_list(&mut self) -> Result<Vec<Expr>> {
        let mut exprs = vec![self.parse_expr()?];
        while self.consume(&TokenKind::Comma) {
            exprs.push(self.parse_expr()?);
        }
        Ok(exprs)
    }

    fn parse_call_args(&mut self) -> Result<Vec<Expr>> {
        if self.check(&TokenKind::RParen) {
            Ok(Vec::new())
        } else {
            self.parse_expr_list()
        }
    }

    /// Parse an expression (`ou` level)
    pub fn parse_expr(&mut self) -> Result<Expr> {
        let mut left = self.parse_and()?;
        while self.consume(&TokenKind::Ou) {
            let right = self.parse_and()?;
            left = Self::binary(BinOp::Or, left, right);
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr> {
        let mut left = self.parse_not()?;
        while self.consume(&TokenKind::E) {
            let right = self.parse_not()?;
            left = Self::binary(BinOp::And, left, right);
        }
        Ok(left)
    }

    /// `nao? (verdadeiro | falso | exp_relacional)`
    fn parse_not(&mut self) -> Result<Expr> {
        let start = self.current().span;
        let negated = self.consume(&TokenKind::Nao);
        let operand = match self.current_kind() {
            TokenKind::Verdadeiro | TokenKind::Falso => {
                let token = self.advance();
                Expr::BoolLit(token.kind == TokenKind::Verdadeiro, token.span)
            }
            _ => self.parse_relational()?,
        };
        if negated {
            Ok(Expr::Not {
                expr: Box::new(operand),
                span: start.merge(&self.previous_span()),
            })
        } else {
            Ok(operand)
        }
    }

    fn parse_relational(&mut self) -> Result<Expr> {
        let left = self.parse_arith()?;
        let op = match self.current_kind() {
            TokenKind::Eq => BinOp::Eq,
            TokenKind::Ne => BinOp::Ne,
            TokenKind::Lt => BinOp::Lt,
            TokenKind::Le => BinOp::Le,
            TokenKind::Gt => BinOp::Gt,
            TokenKind::Ge => BinOp::Ge,
            _ => return Ok(left),
        };
        self.advance();
        let right = self.parse_arith()?;
        Ok(Self::binary(op, left, right))
    }

    /// `termo (('+' | '-') termo)*`
    fn parse_arith(&mut self) -> Result<Expr> {
        let mut left = self.parse_term()?;
        loop {
            let op = match self.current_kind() {
                TokenKind::Plus => BinOp::Add,
                TokenKind::Minus => BinOp::Sub,
                _ => return Ok(left),
            };
            self.advance();
            let right = self.parse_term()?;
            left = Self::binary(op, left, right);
        }
    }

    fn parse_term(&mut self) -> Result<Expr> {
        let mut left = self.parse_factor()?;
        loop {
            let op = match self.current_kind() {
                TokenKind::Star => BinOp::Mul,
                TokenKind::Slash => BinOp::Div,
                _ => return Ok(left),
            };
            self.advance();
            let right = self.parse_factor()?;
            left = Self::binary(op, left, right);
        }
    }

    fn parse_factor(&mut self) -> Result<Expr> {
        let mut left = self.parse_unary()?;
        while self.consume(&TokenKind::Percent) {
            let right = self.parse_unary()?;
            left = Self::binary(BinOp::Mod, left, right);
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr> {
        if self.check(&TokenKind::Minus) {
            let start = self.advance().span;
            let expr = self.parse_primary()?;
            return Ok(Expr::Neg {
                expr: Box::new(expr),
                span: start.merge(&self.previous_span()),
            });
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<Expr> {
        let token = self.current().clone();
        let span = token.span;
        match token.kind {
            TokenKind::IntLit(n) => {
                self.advance();
                Ok(Expr::IntLit(n, span))
            }
            TokenKind::RealLit(text) => {
                self.advance();
                Ok(Expr::RealLit(text, span))
            }
            TokenKind::StringLit(text) => {
                self.advance();
                Ok(Expr::StrLit(text, span))
            }
            TokenKind::LParen => {
                self.advance();
                let inner = self.parse_expr()?;
                self.expect(TokenKind::RParen)?;
                Ok(Expr::Paren(Box::new(inner), span.merge(&self.previous_span())))
            }
            TokenKind::Ampersand => {
                self.advance();
                let var = self.parse_var_ref()?;
                Ok(Expr::AddressOf(var, span.merge(&self.previous_span())))
            }
            TokenKind::Ident(_) if self.peek_kind() == Some(&TokenKind::LParen) => {
                let callee = self.parse_ident()?;
                self.expect(TokenKind::LParen)?;
                let args = self.parse_call_args()?;
                self.expect(TokenKind::RParen)?;
                Ok(Expr::Call { callee, args, span: span.merge(&self.previous_span()) })
            }
            TokenKind::Ident(_) | TokenKind::Caret => Ok(Expr::Access(self.parse_access()?)),
            _ => Err(self.error_at_current()),
        }
    }

    fn binary(op: BinOp, left: Expr, right: Expr) -> Expr {
        let span = left.span().merge(&right.span());
        Expr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
            span,
        }
    }
}
