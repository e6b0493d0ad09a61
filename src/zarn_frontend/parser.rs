use super::constants::MAX_FUNC_ARGS;
use super::errors::{Item, ParserError, ParserErrorType, ParserResult};
use super::grammar::{Expr, ExprType, FuncInfo, Identifier, Literal, Spanned, Stmt, StmtType, Tree};
use super::parser_utils::{prefix_operator, ParserOperator, Precedence};
use super::span::{CodePosition, Span};
use super::token::{Token, TokenKind, TokenLiteral};

use std::rc::Rc;
use tracing::debug;

pub struct Parser<I>
where
    I: Iterator<Item = Token>,
{
    tokens: I,
    current: Token,
    previous: Token,
    function_depth: usize,
    recover: bool,
    errors: Vec<ParserError>,
}

impl<I> Parser<I>
where
    I: Iterator<Item = Token>,
{
    pub fn new<T>(tokens: T) -> Self
    where
        T: IntoIterator<Item = Token, IntoIter = I>,
    {
        let mut tokens = tokens.into_iter();
        let start = CodePosition::new(0, 1, 1);
        let current = tokens.next().unwrap_or_else(|| Token::end_of_file(start));

        Parser {
            tokens,
            previous: Token::end_of_file(start),
            current,
            function_depth: 0,
            recover: false,
            errors: vec![],
        }
    }

    /// Advances the stream. Past the end, the end-of-file token repeats.
    fn bump(&mut self) {
        let next = match self.tokens.next() {
            Some(token) => token,
            None => Token::end_of_file(self.current.span.end_pos),
        };
        self.previous = std::mem::replace(&mut self.current, next);
    }

    /// Checks whether or not the current token matches the given token.
    fn check(&self, kind: TokenKind) -> bool {
        self.current.kind == kind
    }

    /// Checks whether or not the current token matches the given token.
    /// If true consume it and return true, else return false.
    fn check_consume(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.bump();
            return true;
        }
        false
    }

    /// Consumes the expected token or fails at the current one.
    fn consume(&mut self, kind: TokenKind, error: ParserErrorType) -> ParserResult<()> {
        if self.check_consume(kind) {
            Ok(())
        } else {
            Err(ParserError::at(&self.current, error))
        }
    }

    /// A statement ends at ';' or a newline, or may run straight into the
    /// end of input.
    fn consume_statement_end(&mut self, item: Item) -> ParserResult<()> {
        if self.check_consume(TokenKind::Semicolon)
            || self.check_consume(TokenKind::Newline)
            || self.check(TokenKind::EndOfFile)
        {
            Ok(())
        } else {
            Err(ParserError::at(
                &self.current,
                ParserErrorType::ExpectedStatementEnd(item),
            ))
        }
    }

    fn skip_newlines(&mut self) {
        while self.check_consume(TokenKind::Newline) {}
    }

    /// Parses program from the top of treating it as a set of statements.
    /// The first syntax error aborts the parse.
    pub fn parse(mut self) -> ParserResult<Tree> {
        let mut stmts = vec![];

        loop {
            self.skip_newlines();
            if self.check(TokenKind::EndOfFile) {
                break;
            }

            match self.parse_declaration() {
                Ok(stmt) => stmts.push(stmt),
                Err(err) => {
                    self.synchronize();
                    debug!(next = %self.current, "parse aborted after resync");
                    return Err(err);
                }
            }
        }

        if let Some(err) = self.errors.into_iter().next() {
            return Err(err);
        }

        debug!(statements = stmts.len(), "parsed program");
        Ok(Tree { stmts })
    }

    /// Parses the whole program, resynchronizing after every syntax error
    /// so that all of them are reported.
    pub fn parse_with_recovery(mut self) -> Result<Tree, Vec<ParserError>> {
        self.recover = true;
        let mut stmts = vec![];

        loop {
            self.skip_newlines();
            if self.check(TokenKind::EndOfFile) {
                break;
            }

            // In recovery mode errors are recorded, never returned.
            if let Ok(Some(stmt)) = self.parse_declaration_with_recovery() {
                stmts.push(stmt);
            }
        }

        if self.errors.is_empty() {
            Ok(Tree { stmts })
        } else {
            Err(self.errors)
        }
    }

    /// Skips tokens up to the next statement boundary: a consumed ';' or
    /// newline, or a token that starts a new statement.
    fn synchronize(&mut self) {
        self.bump();

        while !self.check(TokenKind::EndOfFile) {
            if self.previous.kind.is_statement_end() || self.current.kind.starts_statement() {
                return;
            }
            self.bump();
        }
    }

    fn emit_error(&mut self, error: ParserError) {
        self.errors.push(error);
    }

    fn parse_declaration_with_recovery(&mut self) -> ParserResult<Option<Stmt>> {
        match self.parse_declaration() {
            Ok(stmt) => Ok(Some(stmt)),
            Err(err) if self.recover => {
                self.emit_error(err);
                self.synchronize();
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    fn parse_declaration(&mut self) -> ParserResult<Stmt> {
        let curr_span = self.current.span;

        let stmt_type = match self.current.kind {
            TokenKind::Fun => {
                self.bump();
                StmtType::FuncDecl(Rc::new(self.parse_func_info()?))
            }
            _ => return self.parse_statement(),
        };

        Ok(Stmt::new(stmt_type, curr_span.extend(self.previous.span)))
    }

    /// Parse func info into func info struct.
    fn parse_func_info(&mut self) -> ParserResult<FuncInfo> {
        let curr_span = self.current.span;

        let name = self.parse_identifier(ParserErrorType::ExpectedFunctionName)?;
        self.consume(
            TokenKind::LeftParen,
            ParserErrorType::ExpectedAfter("(", Item::FunctionName),
        )?;
        let params = self.parse_func_params()?;
        self.consume(
            TokenKind::LeftBrace,
            ParserErrorType::ExpectedBefore("{", Item::FunctionBody),
        )?;

        self.function_depth += 1;
        let body = self.parse_block_stmts();
        self.function_depth -= 1;

        let span = curr_span.extend(self.previous.span);
        Ok(FuncInfo::new(name, params, body?, span))
    }

    fn parse_func_params(&mut self) -> ParserResult<Vec<Identifier>> {
        let mut params = vec![];

        if !self.check(TokenKind::RightParen) {
            loop {
                params.push(self.parse_identifier(ParserErrorType::ExpectedParameterName)?);
                if !self.check_consume(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.consume(
            TokenKind::RightParen,
            ParserErrorType::ExpectedAfter(")", Item::Parameters),
        )?;

        if let Some(extra_params) = params.get(MAX_FUNC_ARGS..) {
            for ident in extra_params.iter() {
                self.emit_error(ParserError {
                    error: ParserErrorType::TooManyParams,
                    span: ident.span,
                    found: format!("'{}'", ident.name),
                });
            }
        }

        Ok(params)
    }

    fn parse_statement(&mut self) -> ParserResult<Stmt> {
        let curr_span = self.current.span;

        let stmt_type = match self.current.kind {
            TokenKind::If => {
                self.bump();
                self.parse_if_else()?
            }
            TokenKind::While => self.parse_while()?,
            TokenKind::Giveback => self.parse_return()?,
            TokenKind::LeftBrace => {
                self.bump();
                StmtType::Block(self.parse_block_stmts()?)
            }
            _ => self.parse_expression_statement()?,
        };

        Ok(Stmt::new(stmt_type, curr_span.extend(self.previous.span)))
    }

    fn parse_expression_statement(&mut self) -> ParserResult<StmtType> {
        let expr = self.parse_expression()?;
        self.consume_statement_end(Item::Expression)?;
        Ok(StmtType::Expression(expr))
    }

    /// Parses the rest of an `if` whose keyword was consumed.
    fn parse_if_else(&mut self) -> ParserResult<StmtType> {
        let condition = self.parse_expression()?;
        let if_body = self.parse_braced_block(Item::Condition)?;

        let else_body = if self.check_consume(TokenKind::Else) {
            if self.check(TokenKind::If) {
                let curr_span = self.current.span;
                self.bump();
                let nested = self.parse_if_else()?;
                Some(Box::new(Stmt::new(nested, curr_span.extend(self.previous.span))))
            } else {
                Some(Box::new(self.parse_braced_block(Item::Else)?))
            }
        } else {
            None
        };

        Ok(StmtType::IfElse(condition, Box::new(if_body), else_body))
    }

    fn parse_while(&mut self) -> ParserResult<StmtType> {
        self.bump();
        let condition = self.parse_expression()?;
        let body = self.parse_braced_block(Item::Condition)?;

        Ok(StmtType::While(condition, Box::new(body)))
    }

    /// Parse return statement.
    fn parse_return(&mut self) -> ParserResult<StmtType> {
        let keyword_span = self.current.span;
        if self.function_depth == 0 {
            return Err(ParserError::at(
                &self.current,
                ParserErrorType::GivebackOutsideFunction,
            ));
        }
        self.bump();

        let value = if self.check(TokenKind::Semicolon)
            || self.check(TokenKind::Newline)
            || self.check(TokenKind::EndOfFile)
        {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.consume_statement_end(Item::ReturnValue)?;

        Ok(StmtType::Return(keyword_span, value))
    }

    /// Parses `{ ... }` into a block statement.
    fn parse_braced_block(&mut self, after: Item) -> ParserResult<Stmt> {
        let curr_span = self.current.span;
        self.consume(TokenKind::LeftBrace, ParserErrorType::ExpectedAfter("{", after))?;
        let stmts = self.parse_block_stmts()?;

        Ok(Stmt::new(
            StmtType::Block(stmts),
            curr_span.extend(self.previous.span),
        ))
    }

    /// Parses block contents up to and including the closing brace.
    fn parse_block_stmts(&mut self) -> ParserResult<Vec<Stmt>> {
        let mut stmts = vec![];

        loop {
            self.skip_newlines();
            if self.check(TokenKind::RightBrace) || self.check(TokenKind::EndOfFile) {
                break;
            }

            if let Some(stmt) = self.parse_declaration_with_recovery()? {
                stmts.push(stmt);
            }
        }

        self.consume(TokenKind::RightBrace, ParserErrorType::UnclosedBrace)?;
        Ok(stmts)
    }

    /// Parse expression with precedence.
    pub fn parse_expression(&mut self) -> ParserResult<Expr> {
        self.run_pratt_parse_algo(Precedence::Lowest)
    }

    /// Pratt parsing algo.
    fn run_pratt_parse_algo(&mut self, min_precedence: Precedence) -> ParserResult<Expr> {
        let mut lhs = match prefix_operator(self.current.kind) {
            Some(op) => {
                let op_span = self.current.span;
                self.bump();
                let expr = self.run_pratt_parse_algo(Precedence::Unary)?;
                to_expr(
                    ExprType::Prefix(Spanned::new(op, op_span), Box::new(expr)),
                    op_span.extend(self.previous.span),
                )
            }
            None => self.parse_primary()?,
        };

        while let Some(op) = ParserOperator::from_token(self.current.kind) {
            if !op.is_higher_precedence(min_precedence) {
                break;
            }

            let op_span = self.current.span;
            self.bump();

            let precedence = op.precedence();
            let lhs_span = lhs.span;

            let new_lhs = match op {
                ParserOperator::Arithequal(op) => {
                    let rhs = self.run_pratt_parse_algo(precedence)?;
                    ExprType::Infix(Spanned::new(op, op_span), Box::new(lhs), Box::new(rhs))
                }
                ParserOperator::Logical(op) => {
                    let rhs = self.run_pratt_parse_algo(precedence)?;
                    ExprType::Logical(Spanned::new(op, op_span), Box::new(lhs), Box::new(rhs))
                }
                ParserOperator::Assignment => {
                    let rhs_box = Box::new(self.run_pratt_parse_algo(precedence)?);
                    match lhs.expr {
                        ExprType::Variable(var) => ExprType::Assignment(var, rhs_box),
                        _ => {
                            return Err(ParserError {
                                error: ParserErrorType::InvalidAssignmentTarget,
                                span: op_span,
                                found: "'='".to_owned(),
                            });
                        }
                    }
                }
                ParserOperator::Call => {
                    let arguments = self.parse_func_args()?;
                    ExprType::Call(Box::new(lhs), self.previous.span, arguments)
                }
                ParserOperator::Index => {
                    let index = self.parse_expression()?;
                    self.consume(
                        TokenKind::RightBracket,
                        ParserErrorType::ExpectedAfter("]", Item::Index),
                    )?;
                    ExprType::Index(Box::new(lhs), op_span, Box::new(index))
                }
            };

            lhs = to_expr(new_lhs, lhs_span.extend(self.previous.span));
        }

        Ok(lhs)
    }

    /// Parse primary token.
    fn parse_primary(&mut self) -> ParserResult<Expr> {
        let curr_span = self.current.span;

        let expr = match self.current.kind {
            TokenKind::Number | TokenKind::String | TokenKind::Nothing => {
                self.bump();
                let literal = match self.previous.literal.take() {
                    Some(TokenLiteral::Number(n)) => Literal::Number(n),
                    Some(TokenLiteral::Str(s)) => Literal::Str(s),
                    None => Literal::Nothing,
                };
                ExprType::Literal(literal)
            }
            TokenKind::Identifier => {
                self.bump();
                ExprType::Variable(Identifier::new(self.previous.lexeme.clone(), curr_span))
            }
            TokenKind::LeftParen => {
                self.bump();
                let sub_expr = self.parse_expression()?;
                self.consume(
                    TokenKind::RightParen,
                    ParserErrorType::ExpectedAfter(")", Item::Expression),
                )?;
                ExprType::Grouping(Box::new(sub_expr))
            }
            TokenKind::LeftBracket => {
                self.bump();
                ExprType::List(self.parse_list_elements()?)
            }
            _ => return Err(ParserError::at(&self.current, ParserErrorType::ExpectedExpr)),
        };

        Ok(to_expr(expr, curr_span.extend(self.previous.span)))
    }

    fn parse_identifier(&mut self, error: ParserErrorType) -> ParserResult<Identifier> {
        if !self.check(TokenKind::Identifier) {
            return Err(ParserError::at(&self.current, error));
        }
        self.bump();
        Ok(Identifier::new(self.previous.lexeme.clone(), self.previous.span))
    }

    /// Parses comma separated expressions up to the closing token.
    fn parse_comma_sep(&mut self, close: TokenKind, error: ParserErrorType) -> ParserResult<Vec<Expr>> {
        let mut exprs = vec![];
        if self.check_consume(close) {
            return Ok(exprs);
        }

        loop {
            exprs.push(self.parse_expression()?);
            if !self.check_consume(TokenKind::Comma) {
                break;
            }
        }
        self.consume(close, error)?;

        Ok(exprs)
    }

    /// Parse function args. The opening paren was consumed.
    fn parse_func_args(&mut self) -> ParserResult<Vec<Expr>> {
        let args = self.parse_comma_sep(
            TokenKind::RightParen,
            ParserErrorType::ExpectedAfter(")", Item::Arguments),
        )?;

        if let Some(extra_args) = args.get(MAX_FUNC_ARGS..) {
            for arg in extra_args.iter() {
                self.emit_error(ParserError {
                    error: ParserErrorType::TooManyArgs,
                    span: arg.span,
                    found: "argument".to_owned(),
                });
            }
        }

        Ok(args)
    }

    fn parse_list_elements(&mut self) -> ParserResult<Vec<Expr>> {
        self.parse_comma_sep(
            TokenKind::RightBracket,
            ParserErrorType::ExpectedAfter("]", Item::ListElements),
        )
    }
}

fn to_expr(expr: ExprType, span: Span) -> Expr {
    Expr::new(expr, span)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::zarn_frontend::Lexer;

    fn parse(source: &str) -> ParserResult<Tree> {
        let tokens = Lexer::new(source).scan().unwrap();
        Parser::new(tokens).parse()
    }

    fn ast(source: &str) -> String {
        parse(source).unwrap().ast_string()
    }

    fn parse_error(source: &str) -> ParserErrorType {
        parse(source).unwrap_err().error
    }

    #[test]
    fn test_precedence_ladder() {
        assert_eq!(ast("3 + 99 * 20 - 5"), "(- (+ 3 (* 99 20)) 5)");
        assert_eq!(ast("-3 * (110 + 220)"), "(* (- 3) (group (+ 110 220)))");
        assert_eq!(ast("!a == b"), "(== (! a) b)");
        assert_eq!(ast("a || b && c"), "(|| a (&& b c))");
        assert_eq!(ast("1 < 2 == 3 >= 4"), "(== (< 1 2) (>= 3 4))");
        assert_eq!(ast("8 / 4 / 2"), "(/ (/ 8 4) 2)");
    }

    #[test]
    fn test_assignment() {
        assert_eq!(ast("a = b = 3"), "(= a (= b 3))");
        assert_eq!(ast("x = y || z"), "(= x (|| y z))");

        assert_eq!(parse_error("a + b = 3"), ParserErrorType::InvalidAssignmentTarget);
        assert_eq!(parse_error("f() = 3"), ParserErrorType::InvalidAssignmentTarget);
        assert_eq!(parse_error("-x = 3"), ParserErrorType::InvalidAssignmentTarget);
    }

    #[test]
    fn test_postfix_chains() {
        assert_eq!(ast("f()[0](x)"), "(call (index (call f) 0) x)");
        assert_eq!(ast("m[1][2]"), "(index (index m 1) 2)");
        assert_eq!(ast("-f(1, 2)"), "(- (call f 1 2))");
        assert_eq!(ast("[1, [2], nothing, \"s\"]"), "(list 1 (list 2) nothing \"s\")");
        assert_eq!(ast("[]"), "(list)");
    }

    #[test]
    fn test_statement_terminators() {
        let tree = parse("x = 1\ny = 2; z = 3\n\n\nsay(x)").unwrap();
        assert_eq!(tree.stmts.len(), 4);

        // Missing terminator between two statements.
        assert_eq!(
            parse_error("x = 1 y = 2"),
            ParserErrorType::ExpectedStatementEnd(Item::Expression)
        );

        // A closing brace does not terminate a statement.
        assert_eq!(
            parse_error("fun f() { giveback 1 }"),
            ParserErrorType::ExpectedStatementEnd(Item::ReturnValue)
        );
    }

    #[test]
    fn test_if_else_chain() {
        assert_eq!(
            ast("if x > 0 {\n say(1)\n} else if x < 0 {\n say(2)\n} else {\n say(3)\n}"),
            "(if (> x 0) (block (call say 1)) (if (< x 0) (block (call say 2)) (block (call say 3))))"
        );
        assert_eq!(
            ast("while i < 3 { i = i + 1; }"),
            "(while (< i 3) (block (= i (+ i 1))))"
        );
    }

    #[test]
    fn test_functions() {
        assert_eq!(
            ast("fun add(a, b) { giveback a + b; } say(add(2, 3));"),
            "(fun add (a b) (giveback (+ a b)))\n(call say (call add 2 3))"
        );
        assert_eq!(
            ast("fun outer() {\n fun inner() { giveback; }\n giveback inner\n}"),
            "(fun outer () (fun inner () (giveback)) (giveback inner))"
        );

        assert_eq!(parse_error("giveback 1"), ParserErrorType::GivebackOutsideFunction);
        assert_eq!(
            parse_error("{ giveback 1; }"),
            ParserErrorType::GivebackOutsideFunction
        );
        assert_eq!(parse_error("fun (a) {}"), ParserErrorType::ExpectedFunctionName);
        assert_eq!(parse_error("fun f(a, 1) {}"), ParserErrorType::ExpectedParameterName);
    }

    #[test]
    fn test_block_delimiters() {
        assert_eq!(ast("{ x = 1 \n }"), "(block (= x 1))");
        assert_eq!(parse_error("{ x = 1;"), ParserErrorType::UnclosedBrace);
        assert_eq!(
            parse_error("if x say(x)"),
            ParserErrorType::ExpectedAfter("{", Item::Condition)
        );
    }

    #[test]
    fn test_reserved_keywords_are_rejected() {
        for source in ["class A {}", "this", "use x", "try { }", "x = catch"] {
            assert_eq!(parse_error(source), ParserErrorType::ExpectedExpr, "{}", source);
        }
    }

    #[test]
    fn test_error_position() {
        let err = parse("x = 1\ny = (2 + )").unwrap_err();
        assert_eq!(err.error, ParserErrorType::ExpectedExpr);
        assert_eq!((err.span.line(), err.span.column()), (2, 10));
        assert_eq!(err.to_string(), "[line 2:10] Error at ')': Expected expression.");
    }

    #[test]
    fn test_recovery_reports_every_error() {
        let source = "x = (1\nsay(2)\ny = + 3\nfun f() { giveback\n}\nz = ]";
        let tokens = Lexer::new(source).scan().unwrap();
        let errors = Parser::new(tokens).parse_with_recovery().unwrap_err();

        let kinds: Vec<_> = errors.iter().map(|e| e.error.clone()).collect();
        assert_eq!(
            kinds,
            vec![
                ParserErrorType::ExpectedAfter(")", Item::Expression),
                ParserErrorType::ExpectedExpr,
                ParserErrorType::ExpectedExpr,
            ]
        );
        assert_eq!(errors[1].span.line(), 3);
        assert_eq!(errors[2].span.line(), 6);
    }

    #[test]
    fn test_recovery_inside_block() {
        let source = "fun f() {\n x = )\n giveback 1\n}\ny = (";
        let tokens = Lexer::new(source).scan().unwrap();
        let errors = Parser::new(tokens).parse_with_recovery().unwrap_err();

        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].span.line(), 2);
        assert_eq!(errors[1].span.line(), 5);
    }

    #[test]
    fn test_clean_source_parses_in_recovery_mode() {
        let tokens = Lexer::new("x = 1\nsay(x)").scan().unwrap();
        let tree = Parser::new(tokens).parse_with_recovery().unwrap();
        assert_eq!(tree.stmts.len(), 2);
    }
}
