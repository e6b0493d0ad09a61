use crate::zarn_frontend::span::Span;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum InterpreterError {
    #[error("Undefined variable '{0}'.")]
    UndefinedVariable(String),
    #[error("Operands must be numbers.")]
    OperandsMustBeNumbers,
    #[error("Operand must be a number.")]
    OperandMustBeNumber,
    #[error("Operands must be two numbers or at least one string.")]
    IllegalAddOperands,
    #[error("Division by zero.")]
    DivideByZero,
    #[error("Expected {expected} arguments but got {got}.")]
    WrongArity { expected: usize, got: usize },
    #[error("Can only call functions.")]
    NotCallable,
    #[error("Only lists can be indexed.")]
    NotIndexable,
    #[error("List index must be a number.")]
    IndexNotNumber,
    #[error("List index {index} out of bounds for length {len}.")]
    IndexOutOfBounds { index: f64, len: usize },
    #[error("{message}")]
    NativeArgument {
        func: &'static str,
        message: &'static str,
    },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A runtime failure tied to the source position that raised it.
#[derive(Debug, Error)]
#[error("Runtime error at line {}, column {}: {error}", .span.line(), .span.column())]
pub struct RuntimeError {
    pub error: InterpreterError,
    pub span: Span,
}

/// Result of operations on values that know nothing about source positions.
pub type ValueResult<T> = Result<T, InterpreterError>;

pub type RuntimeResult<T> = Result<T, RuntimeError>;

impl InterpreterError {
    pub fn at(self, span: Span) -> RuntimeError {
        RuntimeError { error: self, span }
    }
}
