//! C Code Generator
//!
//! Translates a checked LA program to C source for compilation with gcc/clang.
//! The scope structure is rebuilt with the same [`Resolver`] routines the
//! analyzer used, so every lookup here sees the types that were verified.

use crate::backend::codegen::CodeGen;
use crate::frontend::ast::*;
use crate::frontend::semantic::{AccessSite, Resolver, SymbolKind};
use crate::types::Type;
use crate::utils::{Error, Result};

/// Size of the buffer behind every `literal` variable
pub const STRING_CAPACITY: usize = 100;

/// C code generator
pub struct CCodeGen {
    resolver: Resolver,
    output: String,
    indent: usize,
    var_counter: usize,
}

/// Top-level text, assembled in a fixed order once the walk is done
#[derive(Default)]
struct Sections {
    types: String,
    constants: String,
    globals: String,
    prototypes: String,
    functions: String,
}

impl CCodeGen {
    pub fn new() -> Self {
        Self {
            resolver: Resolver::new(),
            output: String::new(),
            indent: 0,
            var_counter: 0,
        }
    }

    /// Write indented line
    fn writeln(&mut self, line: &str) {
        for _ in 0..self.indent {
            self.output.push_str("    ");
        }
        self.output.push_str(line);
        self.output.push('\n');
    }

    /// Hand over everything written since the last call
    fn take_output(&mut self) -> String {
        std::mem::take(&mut self.output)
    }

    /// Generate a fresh temporary name
    fn fresh_var(&mut self) -> String {
        let name = format!("_t{}", self.var_counter);
        self.var_counter += 1;
        name
    }

    /// Generate the complete C source file
    pub fn generate_source(&mut self, program: &Program) -> Result<String> {
        self.resolver = Resolver::new();
        self.output.clear();
        self.indent = 0;
        self.var_counter = 0;

        let mut sections = Sections::default();
        for decl in &program.declarations {
            match decl {
                Declaration::Local(local) => {
                    self.resolver.declare_local(local)?;
                    self.write_local(local)?;
                    let text = self.take_output();
                    match local {
                        LocalDecl::Type(_) => sections.types.push_str(&text),
                        LocalDecl::Constant(_) => sections.constants.push_str(&text),
                        LocalDecl::Variable(_) => sections.globals.push_str(&text),
                    }
                }
                Declaration::Subprogram(sub) => {
                    let (prototype, body) = self.generate_subprogram(sub)?;
                    sections.prototypes.push_str(&prototype);
                    sections.functions.push_str(&body);
                    sections.functions.push('\n');
                }
            }
        }
        let main = self.generate_main(&program.body)?;

        if let Some(diagnostic) = self.resolver.diagnostics.iter().next() {
            return Err(Error::CodeGen(format!(
                "program was not fully checked before generation: {}",
                diagnostic
            )));
        }

        let mut source = String::new();
        source.push_str("#include <stdio.h>\n");
        source.push_str("#include <stdlib.h>\n");
        source.push_str("#include <stdbool.h>\n");
        source.push_str("#include <string.h>\n\n");
        for section in [
            &sections.types,
            &sections.constants,
            &sections.globals,
            &sections.prototypes,
        ] {
            if !section.is_empty() {
                source.push_str(section);
                source.push('\n');
            }
        }
        source.push_str(&sections.functions);
        source.push_str(&main);
        Ok(source)
    }

    fn generate_main(&mut self, body: &Body) -> Result<String> {
        self.writeln("int main() {");
        self.indent += 1;
        for decl in &body.declarations {
            self.resolver.declare_local(decl)?;
            self.write_local(decl)?;
        }
        self.write_block(&body.statements)?;
        self.writeln("return 0;");
        self.indent -= 1;
        self.writeln("}");
        Ok(self.take_output())
    }

    /// Returns the prototype and the definition
    fn generate_subprogram(&mut self, sub: &Subprogram) -> Result<(String, String)> {
        if !self.resolver.declare_subprogram(sub)? {
            return Err(Error::CodeGen(format!(
                "subprogram {} declared twice",
                sub.name.name
            )));
        }
        log::debug!("generating {}", sub.name.name);

        let signature = self.signature(sub);
        let prototype = format!("{};\n", signature);

        self.writeln(&format!("{} {{", signature));
        self.indent += 1;
        let result = self
            .resolver
            .enter_subprogram(sub)
            .and_then(|_| self.write_subprogram_body(sub));
        self.resolver.leave_subprogram();
        result?;
        self.indent -= 1;
        self.writeln("}");

        Ok((prototype, self.take_output()))
    }

    fn write_subprogram_body(&mut self, sub: &Subprogram) -> Result<()> {
        for decl in &sub.declarations {
            self.write_local(decl)?;
        }
        self.write_block(&sub.statements)
    }

    // ==================== Types ====================

    fn basic_to_c(ty: BasicType) -> &'static str {
        match ty {
            BasicType::Literal => "char*",
            BasicType::Integer => "int",
            BasicType::Real => "float",
            BasicType::Logical => "bool",
        }
    }

    /// Spell `^? (tipo_basico | IDENT)` as written
    fn spell(ext: &ExtendedType) -> String {
        let base = match &ext.base {
            TypeName::Basic(basic) => Self::basic_to_c(*basic).to_string(),
            TypeName::Named(ident) => ident.name.clone(),
        };
        if ext.pointer {
            format!("{}*", base)
        } else {
            base
        }
    }

    /// C type of a parameter, return value or constant
    fn value_type(ext: &ExtendedType, semantic: &Type) -> String {
        if *semantic == Type::Literal {
            "char*".to_string()
        } else {
            Self::spell(ext)
        }
    }

    /// Storage type and declarator suffix of a variable or field
    fn storage_type(ext: &ExtendedType) -> (String, String) {
        match ext.base {
            TypeName::Basic(BasicType::Literal) if !ext.pointer => {
                ("char".to_string(), format!("[{}]", STRING_CAPACITY))
            }
            _ => (Self::spell(ext), String::new()),
        }
    }

    fn signature(&self, sub: &Subprogram) -> String {
        let name = &sub.name.name;
        let ret = match &sub.kind {
            SubprogramKind::Procedure => "void".to_string(),
            SubprogramKind::Function(ext) => {
                Self::value_type(ext, &self.resolver.symbols.return_type(name))
            }
        };

        let mut param_types = self.resolver.symbols.param_types(name).into_iter();
        let mut params = Vec::new();
        for group in &sub.params {
            for param in &group.names {
                let semantic = param_types.next().unwrap_or(Type::Invalid);
                let mut ty = Self::value_type(&group.ty, &semantic);
                if group.by_reference && semantic != Type::Literal {
                    ty.push('*');
                }
                params.push(format!("{} {}", ty, param.path()));
            }
        }
        let params = if params.is_empty() { "void".to_string() } else { params.join(", ") };
        format!("{} {}({})", ret, name, params)
    }

    // ==================== Declarations ====================

    fn write_local(&mut self, decl: &LocalDecl) -> Result<()> {
        match decl {
            LocalDecl::Variable(var) => self.write_variable(var),
            LocalDecl::Constant(constant) => {
                let ty = match constant.ty {
                    BasicType::Literal => "char*",
                    other => Self::basic_to_c(other),
                };
                let value = match &constant.value {
                    ConstValue::Str(text) => format!("\"{}\"", text),
                    ConstValue::Int(n) => n.to_string(),
                    ConstValue::Real(text) => text.clone(),
                    ConstValue::Bool(b) => b.to_string(),
                };
                self.writeln(&format!("const {} {} = {};", ty, constant.name.name, value));
                Ok(())
            }
            LocalDecl::Type(type_decl) => {
                let name = &type_decl.name.name;
                match &type_decl.ty {
                    TypeExpr::Record(record) => {
                        self.writeln("typedef struct {");
                        self.write_fields(record)?;
                        self.writeln(&format!("}} {};", name));
                    }
                    TypeExpr::Extended(ext) => {
                        let (ty, suffix) = Self::storage_type(ext);
                        self.writeln(&format!("typedef {} {}{};", ty, name, suffix));
                    }
                }
                Ok(())
            }
        }
    }

    fn write_variable(&mut self, var: &VariableDecl) -> Result<()> {
        match &var.ty {
            TypeExpr::Extended(ext) => {
                let (ty, suffix) = Self::storage_type(ext);
                let names = self.declarators(&var.names, &suffix)?;
                self.writeln(&format!("{} {};", ty, names));
            }
            TypeExpr::Record(record) => {
                self.writeln("struct {");
                self.write_fields(record)?;
                let names = self.declarators(&var.names, "")?;
                self.writeln(&format!("}} {};", names));
            }
        }
        Ok(())
    }

    fn write_fields(&mut self, record: &RecordDef) -> Result<()> {
        self.indent += 1;
        for field in &record.fields {
            if let TypeExpr::Record(_) = field.ty {
                return Err(Error::CodeGen("nested anonymous record".to_string()));
            }
            self.write_variable(field)?;
        }
        self.indent -= 1;
        Ok(())
    }

    /// `a, v[10], ...` with the storage suffix after each name
    fn declarators(&mut self, names: &[VarRef], suffix: &str) -> Result<String> {
        let mut out = Vec::with_capacity(names.len());
        for name in names {
            let mut text = name.path();
            for dim in &name.indices {
                text.push_str(&format!("[{}]", self.expr(dim)?));
            }
            text.push_str(suffix);
            out.push(text);
        }
        Ok(out.join(", "))
    }

    // ==================== Statements ====================

    fn write_block(&mut self, stmts: &[Stmt]) -> Result<()> {
        for stmt in stmts {
            self.write_stmt(stmt)?;
        }
        Ok(())
    }

    fn write_nested(&mut self, stmts: &[Stmt]) -> Result<()> {
        self.indent += 1;
        self.write_block(stmts)?;
        self.indent -= 1;
        Ok(())
    }

    fn write_stmt(&mut self, stmt: &Stmt) -> Result<()> {
        match stmt {
            Stmt::Read { targets, .. } => {
                for target in targets {
                    let ty = self.resolver.resolve_access(target, AccessSite::Read)?;
                    let place = self.access(target)?;
                    match ty {
                        Type::Literal => self.writeln(&format!("gets({});", place)),
                        Type::Real => self.writeln(&format!("scanf(\"%f\", &{});", place)),
                        _ => self.writeln(&format!("scanf(\"%d\", &{});", place)),
                    }
                }
            }
            Stmt::Write { args, .. } => self.write_printf(args)?,
            Stmt::If { cond, then_branch, else_branch, .. } => {
                let cond = self.expr(cond)?;
                self.writeln(&format!("if ({}) {{", cond));
                self.write_nested(then_branch)?;
                if let Some(else_branch) = else_branch {
                    self.writeln("} else {");
                    self.write_nested(else_branch)?;
                }
                self.writeln("}");
            }
            Stmt::Case { scrutinee, arms, default, .. } => {
                let scrutinee = self.expr(scrutinee)?;
                self.writeln(&format!("switch ({}) {{", scrutinee));
                self.indent += 1;
                for arm in arms {
                    for label in &arm.labels {
                        for value in label.values() {
                            self.writeln(&format!("case {}:", value));
                        }
                    }
                    self.indent += 1;
                    self.write_block(&arm.body)?;
                    self.writeln("break;");
                    self.indent -= 1;
                }
                if let Some(default) = default {
                    self.writeln("default:");
                    self.indent += 1;
                    self.write_block(default)?;
                    self.writeln("break;");
                    self.indent -= 1;
                }
                self.indent -= 1;
                self.writeln("}");
            }
            Stmt::For { var, start, end, body, .. } => {
                let var = self.var_ref(&VarRef::simple(var.clone()))?;
                let start = self.expr(start)?;
                let end = self.expr(end)?;
                self.writeln(&format!(
                    "for ({v} = {}; {v} <= {}; {v}++) {{",
                    start,
                    end,
                    v = var
                ));
                self.write_nested(body)?;
                self.writeln("}");
            }
            Stmt::While { cond, body, .. } => {
                let (cond, setup) = self.loop_condition(cond)?;
                if setup.is_empty() {
                    self.writeln(&format!("while ({}) {{", cond));
                    self.write_nested(body)?;
                } else {
                    self.writeln("while (true) {");
                    self.output.push_str(&setup);
                    self.indent += 1;
                    self.writeln(&format!("if (!({})) break;", cond));
                    self.write_block(body)?;
                    self.indent -= 1;
                }
                self.writeln("}");
            }
            Stmt::DoUntil { body, cond, .. } => {
                let (cond, setup) = self.loop_condition(cond)?;
                if setup.is_empty() {
                    self.writeln("do {");
                    self.write_nested(body)?;
                    self.writeln(&format!("}} while ({});", cond));
                } else {
                    self.writeln("while (true) {");
                    self.write_nested(body)?;
                    self.output.push_str(&setup);
                    self.indent += 1;
                    self.writeln(&format!("if (!({})) break;", cond));
                    self.indent -= 1;
                    self.writeln("}");
                }
            }
            Stmt::Assign { target, value, .. } => {
                let ty = self.resolver.resolve_access(target, AccessSite::Value)?;
                let place = self.access(target)?;
                if ty == Type::Literal {
                    self.write_string_copy(&place, value)?;
                } else {
                    let value = self.expr(value)?;
                    self.writeln(&format!("{} = {};", place, value));
                }
            }
            Stmt::Call { callee, args, .. } => {
                let call = self.call(callee, args)?;
                self.writeln(&format!("{};", call));
            }
            Stmt::Return { value, .. } => {
                let value = self.expr(value)?;
                self.writeln(&format!("return {};", value));
            }
        }
        Ok(())
    }

    /// Condition of a loop, plus the lines that rebuild its temporaries.
    ///
    /// The lines are indented one level deeper, ready to go inside the loop.
    fn loop_condition(&mut self, cond: &Expr) -> Result<(String, String)> {
        let outer = std::mem::take(&mut self.output);
        self.indent += 1;
        let cond = self.expr(cond);
        self.indent -= 1;
        let setup = std::mem::replace(&mut self.output, outer);
        Ok((cond?, setup))
    }

    /// Bounded copy into a `literal` buffer, one `strncat` per extra piece
    fn write_string_copy(&mut self, place: &str, value: &Expr) -> Result<()> {
        let limit = STRING_CAPACITY - 1;
        let mut pieces = Vec::new();
        self.literal_pieces(value, &mut pieces)?;
        // Temporaries inside the pieces must be ready before the first copy
        let mut texts = Vec::with_capacity(pieces.len());
        for piece in pieces {
            texts.push(self.expr(piece)?);
        }
        for (i, piece) in texts.into_iter().enumerate() {
            if i == 0 {
                self.writeln(&format!("strncpy({}, {}, {});", place, piece, limit));
            } else {
                self.writeln(&format!(
                    "strncat({p}, {}, {} - strlen({p}));",
                    piece,
                    limit,
                    p = place
                ));
            }
        }
        Ok(())
    }

    fn write_printf(&mut self, args: &[Expr]) -> Result<()> {
        let mut format = String::new();
        let mut values = Vec::new();
        for arg in args {
            let mut pieces = Vec::new();
            self.literal_pieces(arg, &mut pieces)?;
            for piece in pieces {
                if let Expr::StrLit(text, _) = piece {
                    format.push_str(&text.replace('%', "%%"));
                    continue;
                }
                let ty = self.resolver.type_of(piece)?;
                let value = self.expr(piece)?;
                match ty {
                    Type::Integer => {
                        format.push_str("%d");
                        values.push(value);
                    }
                    Type::Real => {
                        format.push_str("%f");
                        values.push(value);
                    }
                    Type::Literal => {
                        format.push_str("%s");
                        values.push(value);
                    }
                    Type::Logical => {
                        format.push_str("%s");
                        values.push(format!("{} ? \"verdadeiro\" : \"falso\"", value));
                    }
                    other => {
                        return Err(Error::CodeGen(format!("cannot write a value of type {}", other)))
                    }
                }
            }
        }

        let mut line = format!("printf(\"{}\"", format);
        for value in values {
            line.push_str(", ");
            line.push_str(&value);
        }
        line.push_str(");");
        self.writeln(&line);
        Ok(())
    }

    /// Split a `literal` concatenation into its operands, left to right
    fn literal_pieces<'e>(&mut self, expr: &'e Expr, pieces: &mut Vec<&'e Expr>) -> Result<()> {
        let is_literal = self.resolver.type_of(expr)? == Type::Literal;
        match expr {
            Expr::Binary { op: BinOp::Add, left, right, .. } if is_literal => {
                self.literal_pieces(left, pieces)?;
                self.literal_pieces(right, pieces)?;
            }
            Expr::Paren(inner, _) if is_literal => self.literal_pieces(inner, pieces)?,
            _ => pieces.push(expr),
        }
        Ok(())
    }

    // ==================== Expressions ====================

    /// Convert binary operator to C operator
    fn binop_to_c(op: BinOp) -> &'static str {
        match op {
            BinOp::Or => "||",
            BinOp::And => "&&",
            BinOp::Eq => "==",
            BinOp::Ne => "!=",
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

    fn expr(&mut self, expr: &Expr) -> Result<String> {
        Ok(match expr {
            Expr::IntLit(n, _) => n.to_string(),
            Expr::RealLit(text, _) => text.clone(),
            Expr::StrLit(text, _) => format!("\"{}\"", text),
            Expr::BoolLit(b, _) => b.to_string(),
            Expr::Paren(inner, _) => format!("({})", self.expr(inner)?),
            Expr::Access(access) => self.access(access)?,
            Expr::AddressOf(var, _) => format!("&{}", self.var_ref(var)?),
            Expr::Call { callee, args, .. } => self.call(callee, args)?,
            Expr::Not { expr: inner, .. } => format!("!({})", self.expr(inner)?),
            Expr::Neg { expr: inner, .. } => {
                let inner = self.expr(inner)?;
                if inner.starts_with('-') {
                    format!("-({})", inner)
                } else {
                    format!("-{}", inner)
                }
            }
            Expr::Binary { op, left, right, .. } => {
                if *op == BinOp::Add && self.resolver.type_of(expr)? == Type::Literal {
                    return self.concatenation(expr);
                }
                let string_compare =
                    op.is_relational() && self.resolver.type_of(left)? == Type::Literal;
                let l = self.operand(*op, left)?;
                let r = self.operand(*op, right)?;
                let c_op = Self::binop_to_c(*op);
                if string_compare {
                    format!("strcmp({}, {}) {} 0", l, r, c_op)
                } else {
                    format!("{} {} {}", l, c_op, r)
                }
            }
        })
    }

    /// Build a concatenation used as a value in its own buffer, written just
    /// before the statement that reads it. `static` keeps the buffer valid
    /// after a `retorne`.
    fn concatenation(&mut self, expr: &Expr) -> Result<String> {
        let name = self.fresh_var();
        self.writeln(&format!("static char {}[{}];", name, STRING_CAPACITY));
        self.write_string_copy(&name, expr)?;
        Ok(name)
    }

    /// `%` binds tighter than `*` and `/` in LA but not in C
    fn operand(&mut self, parent: BinOp, child: &Expr) -> Result<String> {
        let text = self.expr(child)?;
        let needs_parens = matches!(parent, BinOp::Mul | BinOp::Div)
            && matches!(child, Expr::Binary { op: BinOp::Mod, .. });
        Ok(if needs_parens { format!("({})", text) } else { text })
    }

    fn access(&mut self, access: &Access) -> Result<String> {
        let var = self.var_ref(&access.var)?;
        Ok(if access.deref { format!("*{}", var) } else { var })
    }

    fn var_ref(&mut self, var: &VarRef) -> Result<String> {
        let base = var
            .base()
            .ok_or_else(|| Error::CodeGen("identifier without a name".to_string()))?;

        let through_pointer = self.resolver.symbols.lookup(&base.name).map_or(false, |symbol| {
            symbol.kind == (SymbolKind::Parameter { by_reference: true })
                && symbol.ty != Type::Literal
        });
        let mut text = if through_pointer {
            format!("(*{})", base.name)
        } else {
            base.name.clone()
        };
        for field in var.parts.iter().skip(1) {
            text.push('.');
            text.push_str(&field.name);
        }
        for index in &var.indices {
            text.push_str(&format!("[{}]", self.expr(index)?));
        }
        Ok(text)
    }

    fn call(&mut self, callee: &Ident, args: &[Expr]) -> Result<String> {
        let (by_reference, params) = match self.resolver.symbols.lookup(&callee.name) {
            Some(symbol) => match (&symbol.kind, &symbol.ty) {
                (SymbolKind::Subprogram { by_reference }, Type::Function { params, .. }) => {
                    (by_reference.clone(), params.clone())
                }
                _ => return Err(Error::CodeGen(format!("{} is not callable", callee.name))),
            },
            None => return Err(Error::CodeGen(format!("unknown subprogram {}", callee.name))),
        };

        let mut out = Vec::with_capacity(args.len());
        for (i, arg) in args.iter().enumerate() {
            let text = self.expr(arg)?;
            let pass_address = by_reference.get(i).copied().unwrap_or(false)
                && params.get(i).map_or(false, |ty| *ty != Type::Literal);
            out.push(if pass_address { format!("&{}", text) } else { text });
        }
        Ok(format!("{}({})", callee.name, out.join(", ")))
    }
}

impl Default for CCodeGen {
    fn default() -> Self {
        Self::new()
    }
}

impl CodeGen for CCodeGen {
    fn generate(&mut self, program: &Program) -> Result<String> {
        self.generate_source(program)
    }

    fn name(&self) -> &str {
        "C"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::lexer::Lexer;
    use crate::frontend::parser::Parser;
    use pretty_assertions::assert_eq;

    fn parse(source: &str) -> Program {
        let lexer = Lexer::new(source);
        let mut parser = Parser::new(lexer);
        parser.parse_program().unwrap()
    }

    fn generate_c(source: &str) -> String {
        let program = parse(source);
        let mut codegen = CCodeGen::new();
        codegen.generate_source(&program).unwrap()
    }

    #[test]
    fn test_minimal_program() {
        let c = generate_c(
            "algoritmo\n\
               declare x: inteiro\n\
               x <- 5\n\
             fim_algoritmo",
        );
        assert_eq!(
            c,
            "#include <stdio.h>\n\
             #include <stdlib.h>\n\
             #include <stdbool.h>\n\
             #include <string.h>\n\
             \n\
             int main() {\n    \
                 int x;\n    \
                 x = 5;\n    \
                 return 0;\n\
             }\n"
        );
    }

    #[test]
    fn test_percent_is_escaped() {
        let c = generate_c("algoritmo escreva(\"100% feito\") fim_algoritmo");
        assert!(c.contains("    printf(\"100%% feito\");\n"), "{}", c);
    }

    #[test]
    fn test_write_arguments() {
        let c = generate_c(
            "algoritmo\n\
               declare n: inteiro\n\
               declare r: real\n\
               declare s: literal\n\
               declare b: logico\n\
               escreva(\"n=\", n, \" r=\", r, s, b)\n\
             fim_algoritmo",
        );
        assert!(c.contains("    char s[100];\n"), "{}", c);
        assert!(
            c.contains("printf(\"n=%d r=%f%s%s\", n, r, s, b ? \"verdadeiro\" : \"falso\");"),
            "{}",
            c
        );
    }

    #[test]
    fn test_case_range_expands() {
        let c = generate_c(
            "algoritmo\n\
               declare n: inteiro\n\
               caso n seja\n\
                 1..3: escreva(\"baixo\")\n\
                 -1: escreva(\"negativo\")\n\
               senao\n\
                 escreva(\"outro\")\n\
               fim_caso\n\
             fim_algoritmo",
        );
        let expected = "    switch (n) {\n\
        \x20       case 1:\n\
        \x20       case 2:\n\
        \x20       case 3:\n\
        \x20           printf(\"baixo\");\n\
        \x20           break;\n\
        \x20       case -1:\n\
        \x20           printf(\"negativo\");\n\
        \x20           break;\n\
        \x20       default:\n\
        \x20           printf(\"outro\");\n\
        \x20           break;\n\
        \x20   }\n";
        assert!(c.contains(expected), "{}", c);
    }

    #[test]
    fn test_read_by_type() {
        let c = generate_c(
            "algoritmo\n\
               declare nome: literal\n\
               declare r: real\n\
               declare i: inteiro\n\
               leia(nome, r, i)\n\
             fim_algoritmo",
        );
        assert!(c.contains("    gets(nome);\n"), "{}", c);
        assert!(c.contains("    scanf(\"%f\", &r);\n"), "{}", c);
        assert!(c.contains("    scanf(\"%d\", &i);\n"), "{}", c);
    }

    #[test]
    fn test_string_comparison_and_copy() {
        let c = generate_c(
            "algoritmo\n\
               declare nome, s: literal\n\
               se nome = \"ana\" entao\n\
                 s <- \"ola, \" + nome\n\
               senao\n\
                 s <- nome\n\
               fim_se\n\
             fim_algoritmo",
        );
        assert!(c.contains("    char nome[100], s[100];\n"), "{}", c);
        assert!(c.contains("    if (strcmp(nome, \"ana\") == 0) {\n"), "{}", c);
        assert!(c.contains("        strncpy(s, \"ola, \", 99);\n"), "{}", c);
        assert!(c.contains("        strncat(s, nome, 99 - strlen(s));\n"), "{}", c);
        assert!(c.contains("    } else {\n        strncpy(s, nome, 99);\n    }\n"), "{}", c);
    }

    #[test]
    fn test_concatenation_used_as_a_value() {
        let c = generate_c(
            "funcao saudacao(nome: literal): literal\n\
               retorne \"ola \" + nome\n\
             fim_funcao\n\
             procedimento mostra(t: literal)\n\
               escreva(t)\n\
             fim_procedimento\n\
             algoritmo\n\
               declare s: literal\n\
               s <- saudacao(\"ana\")\n\
               mostra(s + \"!\")\n\
               se s + \"a\" = \"b\" entao escreva(s) fim_se\n\
             fim_algoritmo",
        );
        let function = "char* saudacao(char* nome) {\n    \
                            static char _t0[100];\n    \
                            strncpy(_t0, \"ola \", 99);\n    \
                            strncat(_t0, nome, 99 - strlen(_t0));\n    \
                            return _t0;\n\
                        }\n";
        assert!(c.contains(function), "{}", c);
        let call = "    static char _t1[100];\n    \
                        strncpy(_t1, s, 99);\n    \
                        strncat(_t1, \"!\", 99 - strlen(_t1));\n    \
                        mostra(_t1);\n";
        assert!(c.contains(call), "{}", c);
        let compare = "    static char _t2[100];\n    \
                           strncpy(_t2, s, 99);\n    \
                           strncat(_t2, \"a\", 99 - strlen(_t2));\n    \
                           if (strcmp(_t2, \"b\") == 0) {\n";
        assert!(c.contains(compare), "{}", c);
    }

    #[test]
    fn test_loop_condition_rebuilds_concatenation() {
        let c = generate_c(
            "algoritmo\n\
               declare s: literal\n\
               enquanto s + \"x\" <> \"fim\" faca\n\
                 leia(s)\n\
               fim_enquanto\n\
               faca\n\
                 leia(s)\n\
               ate \"a\" + s = \"ab\"\n\
             fim_algoritmo",
        );
        let while_loop = "    while (true) {\n        \
                              static char _t0[100];\n        \
                              strncpy(_t0, s, 99);\n        \
                              strncat(_t0, \"x\", 99 - strlen(_t0));\n        \
                              if (!(strcmp(_t0, \"fim\") != 0)) break;\n        \
                              gets(s);\n    \
                          }\n";
        assert!(c.contains(while_loop), "{}", c);
        let do_loop = "    while (true) {\n        \
                           gets(s);\n        \
                           static char _t1[100];\n        \
                           strncpy(_t1, \"a\", 99);\n        \
                           strncat(_t1, s, 99 - strlen(_t1));\n        \
                           if (!(strcmp(_t1, \"ab\") == 0)) break;\n    \
                       }\n";
        assert!(c.contains(do_loop), "{}", c);
    }

    #[test]
    fn test_nested_concatenation_is_built_before_the_copy() {
        let c = generate_c(
            "funcao eco(t: literal): literal\n\
               retorne t\n\
             fim_funcao\n\
             algoritmo\n\
               declare s: literal\n\
               s <- s + eco(s + \"?\")\n\
             fim_algoritmo",
        );
        let expected = "    static char _t0[100];\n    \
                            strncpy(_t0, s, 99);\n    \
                            strncat(_t0, \"?\", 99 - strlen(_t0));\n    \
                            strncpy(s, s, 99);\n    \
                            strncat(s, eco(_t0), 99 - strlen(s));\n";
        assert!(c.contains(expected), "{}", c);
    }

    #[test]
    fn test_var_parameter_is_passed_by_address() {
        let c = generate_c(
            "procedimento incrementa(var n: inteiro, var s: literal)\n\
               n <- n + 1\n\
             fim_procedimento\n\
             algoritmo\n\
               declare x: inteiro\n\
               declare t: literal\n\
               incrementa(x, t)\n\
             fim_algoritmo",
        );
        assert!(c.contains("void incrementa(int* n, char* s);\n"), "{}", c);
        assert!(c.contains("void incrementa(int* n, char* s) {\n    (*n) = (*n) + 1;\n}\n"), "{}", c);
        assert!(c.contains("    incrementa(&x, t);\n"), "{}", c);
    }

    #[test]
    fn test_function_with_locals() {
        let c = generate_c(
            "funcao maior(a: inteiro, b: inteiro): logico\n\
               declare r: logico\n\
               r <- a > b\n\
               retorne r\n\
             fim_funcao\n\
             algoritmo\n\
               escreva(maior(2, 1))\n\
             fim_algoritmo",
        );
        assert!(c.contains("bool maior(int a, int b);\n\nbool maior(int a, int b) {\n"), "{}", c);
        assert!(c.contains("    bool r;\n    r = a > b;\n    return r;\n"), "{}", c);
        assert!(c.contains("printf(\"%s\", maior(2, 1) ? \"verdadeiro\" : \"falso\");"), "{}", c);
    }

    #[test]
    fn test_procedure_without_parameters() {
        let c = generate_c(
            "procedimento ola()\n\
               escreva(\"ola\")\n\
             fim_procedimento\n\
             algoritmo ola() fim_algoritmo",
        );
        assert!(c.contains("void ola(void);\n"), "{}", c);
        assert!(c.contains("    ola();\n"), "{}", c);
    }

    #[test]
    fn test_records_and_typedefs() {
        let c = generate_c(
            "tipo Pessoa: registro\n\
               nome: literal\n\
               idade: inteiro\n\
             fim_registro\n\
             algoritmo\n\
               declare p: Pessoa\n\
               declare ponto: registro x, y: real fim_registro\n\
               p.idade <- 30\n\
               leia(p.idade)\n\
               ponto.x <- 1.5\n\
             fim_algoritmo",
        );
        assert!(
            c.contains("typedef struct {\n    char nome[100];\n    int idade;\n} Pessoa;\n"),
            "{}",
            c
        );
        assert!(c.contains("    Pessoa p;\n"), "{}", c);
        assert!(c.contains("    struct {\n        float x, y;\n    } ponto;\n"), "{}", c);
        assert!(c.contains("    p.idade = 30;\n"), "{}", c);
        assert!(c.contains("    scanf(\"%d\", &p.idade);\n"), "{}", c);
        assert!(c.contains("    ponto.x = 1.5;\n"), "{}", c);
    }

    #[test]
    fn test_pointers() {
        let c = generate_c(
            "algoritmo\n\
               declare n: inteiro\n\
               declare p: ^inteiro\n\
               p <- &n\n\
               ^p <- 3\n\
               escreva(^p)\n\
             fim_algoritmo",
        );
        assert!(c.contains("    int* p;\n"), "{}", c);
        assert!(c.contains("    p = &n;\n"), "{}", c);
        assert!(c.contains("    *p = 3;\n"), "{}", c);
        assert!(c.contains("    printf(\"%d\", *p);\n"), "{}", c);
    }

    #[test]
    fn test_global_sections_order() {
        let c = generate_c(
            "constante MAX: inteiro = 10\n\
             constante NOME: literal = \"jander\"\n\
             declare total: real\n\
             algoritmo\n\
               declare v[MAX]: inteiro\n\
               total <- MAX\n\
             fim_algoritmo",
        );
        let constant = c.find("const int MAX = 10;\n").unwrap();
        assert!(c.contains("const char* NOME = \"jander\";\n"), "{}", c);
        let global = c.find("float total;\n").unwrap();
        let main = c.find("int main() {\n").unwrap();
        assert!(constant < global && global < main);
        assert!(c.contains("    int v[MAX];\n"), "{}", c);
    }

    #[test]
    fn test_loops() {
        let c = generate_c(
            "algoritmo\n\
               declare i: inteiro\n\
               para i <- 1 ate 10 faca\n\
                 escreva(i)\n\
               fim_para\n\
               enquanto i > 0 e i <> 5 faca\n\
                 i <- i - 1\n\
               fim_enquanto\n\
               faca\n\
                 i <- i + 1\n\
               ate nao i > 3\n\
             fim_algoritmo",
        );
        assert!(c.contains("    for (i = 1; i <= 10; i++) {\n        printf(\"%d\", i);\n    }\n"), "{}", c);
        assert!(c.contains("    while (i > 0 && i != 5) {\n"), "{}", c);
        assert!(c.contains("    do {\n        i = i + 1;\n    } while (!(i > 3));\n"), "{}", c);
    }

    #[test]
    fn test_modulo_keeps_precedence() {
        let c = generate_c(
            "algoritmo\n\
               declare a, b, c: inteiro\n\
               a <- a * b % c\n\
               b <- (a + b) % 2\n\
             fim_algoritmo",
        );
        assert!(c.contains("    a = a * (b % c);\n"), "{}", c);
        assert!(c.contains("    b = (a + b) % 2;\n"), "{}", c);
    }

    #[test]
    fn test_inconsistent_program_is_an_internal_error() {
        let program = parse("algoritmo x <- 1 fim_algoritmo");
        let err = CCodeGen::new().generate(&program).unwrap_err();
        assert!(matches!(err, Error::CodeGen(_)));
    }
}
