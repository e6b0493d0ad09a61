use super::span::Span;

use std::rc::Rc;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum LogicalOperator {
    And,
    Or,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum PrefixOperator {
    Negate,
    LogicalNot,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum InfixOperator {
    Add,
    Subtract,
    Multiply,
    Divide,
    EqualTo,
    NotEqualTo,
    GreaterThan,
    GreaterEq,
    LessThan,
    LessEq,
}

/// An operator together with the position of the token it was parsed from.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct Spanned<T> {
    pub node: T,
    pub span: Span,
}

#[derive(Debug, PartialEq, Clone, Default)]
pub struct Tree {
    pub stmts: Vec<Stmt>,
}

#[derive(Debug, PartialEq, Clone)]
pub struct Stmt {
    pub stmt: StmtType,
    pub span: Span,
}

#[derive(Debug, PartialEq, Clone)]
pub enum StmtType {
    Expression(Expr),
    VariableDecl(Identifier, Option<Expr>),
    Block(Vec<Stmt>),
    IfElse(Expr, Box<Stmt>, Option<Box<Stmt>>),
    While(Expr, Box<Stmt>),
    FuncDecl(Rc<FuncInfo>),
    Return(Span, Option<Expr>),
}

#[derive(Debug, PartialEq, Clone)]
pub struct Expr {
    pub expr: ExprType,
    pub span: Span,
}

#[derive(Debug, PartialEq, Clone)]
pub enum ExprType {
    Literal(Literal),
    Variable(Identifier),
    Assignment(Identifier, Box<Expr>),
    Infix(Spanned<InfixOperator>, Box<Expr>, Box<Expr>),
    Logical(Spanned<LogicalOperator>, Box<Expr>, Box<Expr>),
    Prefix(Spanned<PrefixOperator>, Box<Expr>),
    Grouping(Box<Expr>),
    /// Callee, closing paren span, arguments.
    Call(Box<Expr>, Span, Vec<Expr>),
    List(Vec<Expr>),
    /// Collection, opening bracket span, index.
    Index(Box<Expr>, Span, Box<Expr>),
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Identifier {
    pub name: String,
    pub span: Span,
}

#[derive(Debug, PartialEq, Clone)]
pub struct FuncInfo {
    pub ident: Identifier,
    pub params: Vec<Identifier>,
    pub body: Vec<Stmt>,
    pub span: Span,
}

#[derive(Debug, PartialEq, Clone)]
pub enum Literal {
    Number(f64),
    Str(String),
    Nothing,
}

impl LogicalOperator {
    pub fn symbol(&self) -> &str {
        match self {
            LogicalOperator::And => "&&",
            LogicalOperator::Or => "||",
        }
    }
}

impl PrefixOperator {
    pub fn symbol(&self) -> &str {
        match self {
            PrefixOperator::LogicalNot => "!",
            PrefixOperator::Negate => "-",
        }
    }
}

impl InfixOperator {
    pub fn symbol(&self) -> &str {
        match self {
            InfixOperator::Add => "+",
            InfixOperator::Subtract => "-",
            InfixOperator::Multiply => "*",
            InfixOperator::Divide => "/",
            InfixOperator::EqualTo => "==",
            InfixOperator::NotEqualTo => "!=",
            InfixOperator::GreaterThan => ">",
            InfixOperator::GreaterEq => ">=",
            InfixOperator::LessThan => "<",
            InfixOperator::LessEq => "<=",
        }
    }
}

impl<T> Spanned<T> {
    pub fn new(node: T, span: Span) -> Self {
        Spanned { node, span }
    }
}

impl Identifier {
    pub fn new(name: String, span: Span) -> Self {
        Self { name, span }
    }
}

impl FuncInfo {
    pub fn new(ident: Identifier, params: Vec<Identifier>, body: Vec<Stmt>, span: Span) -> Self {
        FuncInfo {
            ident,
            params,
            body,
            span,
        }
    }
}

impl Tree {
    pub fn ast_string(&self) -> String {
        let stmts: Vec<_> = self.stmts.iter().map(|s| s.ast_string()).collect();
        stmts.join("\n")
    }
}

impl Stmt {
    pub fn new(stmt: StmtType, span: Span) -> Self {
        Stmt { stmt, span }
    }

    pub fn ast_string(&self) -> String {
        match &self.stmt {
            StmtType::Expression(expr) => expr.ast_string(),
            StmtType::VariableDecl(name, init) => match init {
                Some(expr) => format!("(var {} {})", name.name, expr.ast_string()),
                None => format!("(var {})", name.name),
            },
            StmtType::Block(stmts) => {
                let mut parts = vec![String::from("block")];
                parts.extend(stmts.iter().map(|s| s.ast_string()));
                format!("({})", parts.join(" "))
            }
            StmtType::IfElse(cond, if_body, else_body) => match else_body {
                Some(else_body) => format!(
                    "(if {} {} {})",
                    cond.ast_string(),
                    if_body.ast_string(),
                    else_body.ast_string()
                ),
                None => format!("(if {} {})", cond.ast_string(), if_body.ast_string()),
            },
            StmtType::While(cond, body) => {
                format!("(while {} {})", cond.ast_string(), body.ast_string())
            }
            StmtType::FuncDecl(func_info) => {
                let params: Vec<_> = func_info.params.iter().map(|p| p.name.as_str()).collect();
                let mut parts = vec![
                    String::from("fun"),
                    func_info.ident.name.clone(),
                    format!("({})", params.join(" ")),
                ];
                parts.extend(func_info.body.iter().map(|s| s.ast_string()));
                format!("({})", parts.join(" "))
            }
            StmtType::Return(_, expr) => match expr {
                Some(expr) => format!("(giveback {})", expr.ast_string()),
                None => String::from("(giveback)"),
            },
        }
    }
}

impl Expr {
    pub fn new(expr: ExprType, span: Span) -> Self {
        Expr { expr, span }
    }

    pub fn ast_string(&self) -> String {
        match &self.expr {
            ExprType::Literal(l) => match l {
                Literal::Number(n) => n.to_string(),
                Literal::Str(s) => format!("\"{}\"", s),
                Literal::Nothing => "nothing".to_owned(),
            },
            ExprType::Infix(op, lhs, rhs) => format!(
                "({} {} {})",
                op.node.symbol(),
                lhs.ast_string(),
                rhs.ast_string()
            ),
            ExprType::Prefix(op, expr) => format!("({} {})", op.node.symbol(), expr.ast_string()),
            ExprType::Logical(op, lhs, rhs) => format!(
                "({} {} {})",
                op.node.symbol(),
                lhs.ast_string(),
                rhs.ast_string()
            ),
            ExprType::Grouping(expr) => format!("(group {})", expr.ast_string()),
            ExprType::Variable(var) => var.name.clone(),
            ExprType::Assignment(var, expr) => format!("(= {} {})", var.name, expr.ast_string()),
            ExprType::Call(callee, _, args) => {
                let mut parts = vec![String::from("call"), callee.ast_string()];
                parts.extend(args.iter().map(|a| a.ast_string()));
                format!("({})", parts.join(" "))
            }
            ExprType::List(elements) => {
                let mut parts = vec![String::from("list")];
                parts.extend(elements.iter().map(|e| e.ast_string()));
                format!("({})", parts.join(" "))
            }
            ExprType::Index(collection, _, index) => {
                format!("(index {} {})", collection.ast_string(), index.ast_string())
            }
        }
    }
}
