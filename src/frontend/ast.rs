//! Abstract Syntax Tree definitions for the LA language
//!
//! Every node that a diagnostic can blame carries a [`Span`].

use crate::utils::Span;

/// A complete program (compilation unit)
#[derive(Debug, Clone)]
pub struct Program {
    /// Global declarations in source order
    pub declarations: Vec<Declaration>,
    /// The `algoritmo ... fim_algoritmo` block
    pub body: Body,
    pub span: Span,
}

/// Global declaration
#[derive(Debug, Clone)]
pub enum Declaration {
    Local(LocalDecl),
    Subprogram(Subprogram),
}

/// Declarations and commands of the main block
#[derive(Debug, Clone, Default)]
pub struct Body {
    pub declarations: Vec<LocalDecl>,
    pub statements: Vec<Stmt>,
}

/// `declare`, `constante` or `tipo`
#[derive(Debug, Clone)]
pub enum LocalDecl {
    Variable(VariableDecl),
    Constant(ConstantDecl),
    Type(TypeDecl),
}

/// `declare a, b[10]: tipo`, also used for record fields
#[derive(Debug, Clone)]
pub struct VariableDecl {
    pub names: Vec<VarRef>,
    pub ty: TypeExpr,
    pub span: Span,
}

/// `constante NOME: tipo_basico = valor`
#[derive(Debug, Clone)]
pub struct ConstantDecl {
    pub name: Ident,
    pub ty: BasicType,
    pub value: ConstValue,
    pub span: Span,
}

/// `tipo NOME: tipo`
#[derive(Debug, Clone)]
pub struct TypeDecl {
    pub name: Ident,
    pub ty: TypeExpr,
    pub span: Span,
}

/// Type written in a declaration
#[derive(Debug, Clone)]
pub enum TypeExpr {
    Record(RecordDef),
    Extended(ExtendedType),
}

/// `registro ... fim_registro`
#[derive(Debug, Clone)]
pub struct RecordDef {
    pub fields: Vec<VariableDecl>,
    pub span: Span,
}

/// `^? (tipo_basico | IDENT)`
#[derive(Debug, Clone)]
pub struct ExtendedType {
    pub pointer: bool,
    pub base: TypeName,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum TypeName {
    Basic(BasicType),
    Named(Ident),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BasicType {
    Literal,
    Integer,
    Real,
    Logical,
}

/// Value of a `constante`
#[derive(Debug, Clone, PartialEq)]
pub enum ConstValue {
    /// Raw text between the quotes
    Str(String),
    Int(i64),
    /// Kept as written
    Real(String),
    Bool(bool),
}

/// `procedimento` or `funcao`
#[derive(Debug, Clone)]
pub struct Subprogram {
    pub name: Ident,
    pub kind: SubprogramKind,
    pub params: Vec<ParamGroup>,
    pub declarations: Vec<LocalDecl>,
    pub statements: Vec<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum SubprogramKind {
    Procedure,
    /// Function with its declared return type
    Function(ExtendedType),
}

impl Subprogram {
    pub fn is_function(&self) -> bool {
        matches!(self.kind, SubprogramKind::Function(_))
    }
}

/// `var? a, b: tipo_estendido`
#[derive(Debug, Clone)]
pub struct ParamGroup {
    pub by_reference: bool,
    pub names: Vec<VarRef>,
    pub ty: ExtendedType,
    pub span: Span,
}

/// Identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ident {
    pub name: String,
    pub span: Span,
}

impl Ident {
    pub fn new(name: impl Into<String>, span: Span) -> Self {
        Self { name: name.into(), span }
    }
}

/// `nome(.campo)*([indice])*`
#[derive(Debug, Clone)]
pub struct VarRef {
    pub parts: Vec<Ident>,
    pub indices: Vec<Expr>,
    pub span: Span,
}

impl VarRef {
    /// Plain name with no fields or indices
    pub fn simple(ident: Ident) -> Self {
        let span = ident.span;
        Self { parts: vec![ident], indices: Vec::new(), span }
    }

    pub fn base(&self) -> Option<&Ident> {
        self.parts.first()
    }

    /// Dotted path without indices, e.g. `ponto.x`
    pub fn path(&self) -> String {
        self.parts
            .iter()
            .map(|part| part.name.as_str())
            .collect::<Vec<_>>()
            .join(".")
    }

    pub fn is_simple(&self) -> bool {
        self.parts.len() == 1 && self.indices.is_empty()
    }
}

/// A variable reference, optionally dereferenced with `^`
#[derive(Debug, Clone)]
pub struct Access {
    pub deref: bool,
    pub var: VarRef,
    pub span: Span,
}

/// Statement (LA command)
#[derive(Debug, Clone)]
pub enum Stmt {
    /// leia(a, ^p, ...)
    Read { targets: Vec<Access>, span: Span },
    /// escreva(expr, ...)
    Write { args: Vec<Expr>, span: Span },
    /// se cond entao ... [senao ...] fim_se
    If {
        cond: Expr,
        then_branch: Vec<Stmt>,
        else_branch: Option<Vec<Stmt>>,
        span: Span,
    },
    /// caso expr seja 1..3: ... senao ... fim_caso
    Case {
        scrutinee: Expr,
        arms: Vec<CaseArm>,
        default: Option<Vec<Stmt>>,
        span: Span,
    },
    /// para i <- a ate b faca ... fim_para
    For {
        var: Ident,
        start: Expr,
        end: Expr,
        body: Vec<Stmt>,
        span: Span,
    },
    /// enquanto cond faca ... fim_enquanto
    While { cond: Expr, body: Vec<Stmt>, span: Span },
    /// faca ... ate cond
    DoUntil { body: Vec<Stmt>, cond: Expr, span: Span },
    /// ^? alvo <- expr
    Assign { target: Access, value: Expr, span: Span },
    /// proc(args)
    Call { callee: Ident, args: Vec<Expr>, span: Span },
    /// retorne expr
    Return { value: Expr, span: Span },
}

/// One `caso` branch
#[derive(Debug, Clone)]
pub struct CaseArm {
    pub labels: Vec<CaseLabel>,
    pub body: Vec<Stmt>,
    pub span: Span,
}

/// `n` or `n..m`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaseLabel {
    pub start: CaseBound,
    pub end: Option<CaseBound>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaseBound {
    pub negative: bool,
    pub value: i64,
}

impl CaseBound {
    pub fn signed(&self) -> i64 {
        if self.negative {
            -self.value
        } else {
            self.value
        }
    }
}

impl CaseLabel {
    /// Every integer covered by this label, inclusive
    pub fn values(&self) -> std::ops::RangeInclusive<i64> {
        let start = self.start.signed();
        let end = self.end.map_or(start, |bound| bound.signed());
        start..=end
    }

    /// How many integers the label covers; zero when `n..m` runs backwards
    pub fn count(&self) -> u64 {
        let values = self.values();
        if values.is_empty() {
            return 0;
        }
        (i128::from(*values.end()) - i128::from(*values.start()) + 1) as u64
    }
}

/// Expression
#[derive(Debug, Clone)]
pub enum Expr {
    Binary {
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
        span: Span,
    },
    /// nao expr
    Not { expr: Box<Expr>, span: Span },
    /// -expr
    Neg { expr: Box<Expr>, span: Span },
    IntLit(i64, Span),
    /// Kept as written
    RealLit(String, Span),
    /// Raw text between the quotes
    StrLit(String, Span),
    BoolLit(bool, Span),
    Access(Access),
    Call { callee: Ident, args: Vec<Expr>, span: Span },
    Paren(Box<Expr>, Span),
    /// &variavel
    AddressOf(VarRef, Span),
}

impl Expr {
    pub fn span(&self) -> Span {
        match self {
            Expr::Binary { span, .. }
            | Expr::Not { span, .. }
            | Expr::Neg { span, .. }
            | Expr::Call { span, .. } => *span,
            Expr::IntLit(_, span)
            | Expr::RealLit(_, span)
            | Expr::StrLit(_, span)
            | Expr::BoolLit(_, span)
            | Expr::Paren(_, span)
            | Expr::AddressOf(_, span) => *span,
            Expr::Access(access) => access.span,
        }
    }
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    // Logical
    Or,
    And,
    // Relational
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

impl BinOp {
    pub fn is_logical(&self) -> bool {
        matches!(self, BinOp::Or | BinOp::And)
    }

    pub fn is_relational(&self) -> bool {
        matches!(self, BinOp::Eq | BinOp::Ne | BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge)
    }

    /// Operator as written in LA
    pub fn symbol(&self) -> &'static str {
        match self {
            BinOp::Or => "ou",
            BinOp::And => "e",
            BinOp::Eq => "=",
            BinOp::Ne => "<>",
            BinOp::Lt => "<",
            BinOp::Le => "<=",
            BinOp::Gt => ">",
            BinOp::Ge => ">=",
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Mod => "%",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_case_label_values() {
        let label = CaseLabel {
            start: CaseBound { negative: true, value: 2 },
            end: Some(CaseBound { negative: false, value: 1 }),
        };
        assert_eq!(label.values().collect::<Vec<_>>(), vec![-2, -1, 0, 1]);

        let single = CaseLabel { start: CaseBound { negative: false, value: 7 }, end: None };
        assert_eq!(single.values().collect::<Vec<_>>(), vec![7]);
    }

    #[test]
    fn test_case_label_count() {
        let bound = |value: i64| CaseBound { negative: value < 0, value: value.abs() };
        let label = |a: i64, b: i64| CaseLabel { start: bound(a), end: Some(bound(b)) };
        assert_eq!(label(-2, 1).count(), 4);
        assert_eq!(label(5, 3).count(), 0);
        assert_eq!(label(0, 2_000_000_000).count(), 2_000_000_001);
        assert_eq!(label(-i64::MAX, i64::MAX).count(), u64::MAX);
    }

    #[test]
    fn test_var_ref_path() {
        let var = VarRef {
            parts: vec![Ident::new("ponto", Span::dummy()), Ident::new("x", Span::dummy())],
            indices: Vec::new(),
            span: Span::dummy(),
        };
        assert_eq!(var.path(), "ponto.x");
        assert!(!var.is_simple());
    }
}
