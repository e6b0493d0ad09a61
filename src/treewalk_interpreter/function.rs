use super::environment::ScopeId;
use super::errors::{InterpreterError, RuntimeResult};
use super::interpreter::{ExecOutcome, Interpreter};
use super::object::Value;
use crate::zarn_frontend::grammar::FuncInfo;
use crate::zarn_frontend::span::Span;

use std::fmt;
use std::rc::Rc;
use tracing::trace;

pub struct ZarnFnData {
    info: Rc<FuncInfo>,
    closure: ScopeId,
}

/// A user-defined function together with the scope it was declared in.
#[derive(Clone)]
pub struct ZarnFn(Rc<ZarnFnData>);

impl ZarnFn {
    pub fn new(info: Rc<FuncInfo>, closure: ScopeId) -> Self {
        ZarnFn(Rc::new(ZarnFnData { info, closure }))
    }

    pub fn name(&self) -> &str {
        &self.0.info.ident.name
    }

    /// Scope the function was declared in.
    pub fn closure(&self) -> ScopeId {
        self.0.closure
    }

    pub fn arity(&self) -> usize {
        self.0.info.params.len()
    }

    pub fn execute(
        &self,
        args: Vec<Value>,
        interpreter: &mut Interpreter<'_>,
        call_span: Span,
    ) -> RuntimeResult<Value> {
        if args.len() != self.arity() {
            let error = InterpreterError::WrongArity {
                expected: self.arity(),
                got: args.len(),
            };
            return Err(error.at(call_span));
        }

        trace!(name = self.name(), line = call_span.line(), "call");

        // Parameters and body locals share one scope chained to the closure.
        let prev = interpreter.env.enter(self.0.closure);
        for (param, arg) in self.0.info.params.iter().zip(args.into_iter()) {
            interpreter.env.define(param.name.clone(), arg);
        }

        interpreter.call_depth += 1;
        let result = interpreter.eval_statements(&self.0.info.body);
        interpreter.call_depth -= 1;
        interpreter.env.exit(prev);

        match result? {
            ExecOutcome::Returned(value) => Ok(value),
            ExecOutcome::Completed => Ok(Value::Nothing),
        }
    }
}

impl fmt::Debug for ZarnFn {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "<fn {}>", self.name())
    }
}

impl PartialEq<ZarnFn> for ZarnFn {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for ZarnFn {}
