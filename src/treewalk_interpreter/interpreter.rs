use super::environment::Environment;
use super::errors::{InterpreterError, RuntimeResult};
use super::function::ZarnFn;
use super::native_function::get_native_funcs;
use super::object::Value;
use crate::zarn_frontend::grammar::{
    Expr, ExprType, Identifier, InfixOperator, Literal, LogicalOperator, PrefixOperator, Spanned,
    Stmt, StmtType, Tree,
};
use crate::zarn_frontend::span::Span;

use std::io::{self, BufRead, BufReader, Write};
use tracing::debug;

/// Knobs that change language semantics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InterpreterConfig {
    /// Assigning to a name that is bound nowhere in the scope chain is an
    /// error instead of creating the binding in the innermost scope.
    pub strict_assignment: bool,
}

/// How a statement finished. `Returned` unwinds up to the enclosing call.
#[derive(Debug, PartialEq)]
pub enum ExecOutcome {
    Completed,
    Returned(Value),
}

pub struct Interpreter<'io> {
    pub(crate) env: Environment,
    pub(crate) output: Box<dyn Write + 'io>,
    pub(crate) input: Box<dyn BufRead + 'io>,
    // Number of user function calls in progress.
    pub(crate) call_depth: usize,
    config: InterpreterConfig,
}

impl Interpreter<'static> {
    /// Interpreter wired to the process stdout and stdin.
    pub fn new() -> Self {
        Self::with_io(io::stdout(), BufReader::new(io::stdin()))
    }
}

impl Default for Interpreter<'static> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'io> Interpreter<'io> {
    pub fn with_io<W, R>(output: W, input: R) -> Self
    where
        W: Write + 'io,
        R: BufRead + 'io,
    {
        let mut env = Environment::new();
        for native_func in get_native_funcs().into_iter() {
            let name = native_func.name().to_owned();
            env.define(name, Value::NativeFunc(native_func));
        }

        Interpreter {
            env,
            output: Box::new(output),
            input: Box::new(input),
            call_depth: 0,
            config: InterpreterConfig::default(),
        }
    }

    pub fn with_config(mut self, config: InterpreterConfig) -> Self {
        self.config = config;
        self
    }

    /// Runs a program. Globals persist across calls, so a REPL can feed it
    /// one line at a time.
    pub fn interpret(&mut self, tree: &Tree) -> RuntimeResult<()> {
        let result = self.eval_statements(&tree.stmts);
        let flushed = self.output.flush();
        debug!(scopes = self.env.len(), ok = result.is_ok(), "program finished");

        // A giveback in a hand-built top-level tree just ends the program.
        result?;
        flushed.map_err(|e| InterpreterError::from(e).at(Span::default()))
    }

    /// Reads one line from the same stream `input()` reads from.
    pub fn read_line(&mut self, buf: &mut String) -> io::Result<usize> {
        self.input.read_line(buf)
    }

    /// Writes text to the program output and flushes it.
    pub fn write_output(&mut self, text: &str) -> io::Result<()> {
        self.output.write_all(text.as_bytes())?;
        self.output.flush()
    }

    /// Looks up a global binding.
    pub fn global(&self, name: &str) -> Option<Value> {
        self.env.get(name)
    }

    pub fn eval_statements(&mut self, stmts: &[Stmt]) -> RuntimeResult<ExecOutcome> {
        for stmt in stmts.iter() {
            // Outside any call every live value sits in a scope.
            if self.call_depth == 0 {
                self.env.collect_if_needed();
            }
            if let ExecOutcome::Returned(value) = self.eval_statement(stmt)? {
                return Ok(ExecOutcome::Returned(value));
            }
        }
        Ok(ExecOutcome::Completed)
    }

    pub fn eval_statement(&mut self, stmt: &Stmt) -> RuntimeResult<ExecOutcome> {
        match &stmt.stmt {
            StmtType::Expression(expr) => {
                self.eval_expression(expr)?;
            }
            StmtType::IfElse(if_condition, if_body, else_body) => {
                return self.eval_if_else(if_condition, if_body, else_body.as_deref());
            }
            StmtType::While(condition, body) => return self.eval_while(condition, body),
            StmtType::VariableDecl(ident, init) => {
                let value = match init {
                    Some(expr) => self.eval_expression(expr)?,
                    None => Value::Nothing,
                };
                self.env.define(ident.name.clone(), value);
            }
            StmtType::Block(stmts) => return self.eval_block(stmts),
            StmtType::FuncDecl(func_info) => {
                let closure = self.env.capture();
                let func = ZarnFn::new(func_info.clone(), closure);
                self.env
                    .define(func_info.ident.name.clone(), Value::UserFunc(func));
            }
            StmtType::Return(_, expr) => {
                let value = match expr {
                    Some(expr) => self.eval_expression(expr)?,
                    None => Value::Nothing,
                };
                return Ok(ExecOutcome::Returned(value));
            }
        }

        Ok(ExecOutcome::Completed)
    }

    pub fn eval_if_else(
        &mut self,
        if_condition: &Expr,
        if_body: &Stmt,
        else_body: Option<&Stmt>,
    ) -> RuntimeResult<ExecOutcome> {
        if self.eval_expression(if_condition)?.is_truthy() {
            return self.eval_statement(if_body);
        }
        if let Some(else_body) = else_body {
            return self.eval_statement(else_body);
        }

        Ok(ExecOutcome::Completed)
    }

    pub fn eval_while(&mut self, condition: &Expr, body: &Stmt) -> RuntimeResult<ExecOutcome> {
        while self.eval_expression(condition)?.is_truthy() {
            if let ExecOutcome::Returned(value) = self.eval_statement(body)? {
                return Ok(ExecOutcome::Returned(value));
            }
        }

        Ok(ExecOutcome::Completed)
    }

    pub fn eval_block(&mut self, stmts: &[Stmt]) -> RuntimeResult<ExecOutcome> {
        let prev = self.env.enter(self.env.current());
        let result = self.eval_statements(stmts);

        // Reset to enclosing scope, also on error.
        self.env.exit(prev);
        result
    }

    pub fn eval_expression(&mut self, expr: &Expr) -> RuntimeResult<Value> {
        match &expr.expr {
            ExprType::Literal(l) => Ok(eval_literal(l)),
            ExprType::Infix(op, lhs, rhs) => self.eval_infix_operator(*op, lhs, rhs),
            ExprType::Prefix(op, expr) => self.eval_prefix_operator(*op, expr),
            ExprType::Logical(op, lhs, rhs) => self.eval_logical_operator(op.node, lhs, rhs),
            ExprType::Grouping(expr) => self.eval_expression(expr),
            ExprType::Variable(ident) => self.lookup_variable(ident),
            ExprType::Assignment(ident, expr) => {
                let value = self.eval_expression(expr)?;
                self.assign_variable(ident, value.clone())?;
                Ok(value)
            }
            ExprType::Call(callee, paren_span, args) => {
                self.eval_func_call(callee, *paren_span, args)
            }
            ExprType::List(elements) => {
                let mut values = Vec::with_capacity(elements.len());
                for element in elements.iter() {
                    values.push(self.eval_expression(element)?);
                }
                Ok(Value::new_list(values))
            }
            ExprType::Index(collection, bracket_span, index) => {
                let collection = self.eval_expression(collection)?;
                let index = self.eval_expression(index)?;
                collection
                    .index(&index)
                    .map_err(|e| e.at(*bracket_span))
            }
        }
    }

    fn lookup_variable(&self, ident: &Identifier) -> RuntimeResult<Value> {
        match self.env.get(&ident.name) {
            Some(value) => Ok(value),
            None => Err(InterpreterError::UndefinedVariable(ident.name.clone()).at(ident.span)),
        }
    }

    fn assign_variable(&mut self, ident: &Identifier, value: Value) -> RuntimeResult<()> {
        match self.env.assign(&ident.name, value) {
            Ok(()) => Ok(()),
            Err(_) if self.config.strict_assignment => {
                Err(InterpreterError::UndefinedVariable(ident.name.clone()).at(ident.span))
            }
            // No binding anywhere: create it in the innermost scope.
            Err(value) => {
                self.env.define(ident.name.clone(), value);
                Ok(())
            }
        }
    }

    pub fn eval_logical_operator(
        &mut self,
        op: LogicalOperator,
        lhs: &Expr,
        rhs: &Expr,
    ) -> RuntimeResult<Value> {
        let lhs = self.eval_expression(lhs)?;

        // Handle short circuiting.
        match op {
            LogicalOperator::And if !lhs.is_truthy() => Ok(lhs),
            LogicalOperator::Or if lhs.is_truthy() => Ok(lhs),
            _ => self.eval_expression(rhs),
        }
    }

    pub fn eval_infix_operator(
        &mut self,
        op: Spanned<InfixOperator>,
        lhs: &Expr,
        rhs: &Expr,
    ) -> RuntimeResult<Value> {
        let lhs = self.eval_expression(lhs)?;
        let rhs = self.eval_expression(rhs)?;
        Value::apply_infix_op(op.node, lhs, rhs).map_err(|e| e.at(op.span))
    }

    pub fn eval_prefix_operator(
        &mut self,
        op: Spanned<PrefixOperator>,
        expr: &Expr,
    ) -> RuntimeResult<Value> {
        let value = self.eval_expression(expr)?;
        Value::apply_prefix_op(op.node, value).map_err(|e| e.at(op.span))
    }

    pub fn eval_func_call(
        &mut self,
        callee: &Expr,
        paren_span: Span,
        raw_args: &[Expr],
    ) -> RuntimeResult<Value> {
        let callee = self.eval_expression(callee)?;
        let mut args = Vec::with_capacity(raw_args.len());
        for raw_arg in raw_args.iter() {
            args.push(self.eval_expression(raw_arg)?);
        }

        callee.execute(args, self, paren_span)
    }
}

fn eval_literal(l: &Literal) -> Value {
    match l {
        Literal::Number(n) => Value::Number(*n),
        Literal::Str(s) => Value::String(s.clone()),
        Literal::Nothing => Value::Nothing,
    }
}
