use super::errors::{InterpreterError, RuntimeResult, ValueResult};
use super::function::ZarnFn;
use super::interpreter::Interpreter;
use super::native_function::NativeFn;
use crate::zarn_frontend::constants::NOTHING_STR;
use crate::zarn_frontend::grammar::{InfixOperator, PrefixOperator};
use crate::zarn_frontend::span::Span;

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Lists are shared by reference; every binding sees the same elements.
pub type ListRef = Rc<RefCell<Vec<Value>>>;

#[derive(Debug, Clone)]
pub enum Value {
    Nothing,
    Boolean(bool),
    Number(f64),
    String(String),
    List(ListRef),
    NativeFunc(NativeFn),
    UserFunc(ZarnFn),
}

impl Value {
    pub fn new_list(elements: Vec<Value>) -> Self {
        Value::List(Rc::new(RefCell::new(elements)))
    }

    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Nothing | Value::Boolean(false))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nothing => "nothing",
            Value::Boolean(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::List(_) => "list",
            Value::NativeFunc(_) | Value::UserFunc(_) => "function",
        }
    }

    /// Invokes a callable value. Arity is checked by the callee.
    pub fn execute(
        &self,
        args: Vec<Value>,
        interpreter: &mut Interpreter<'_>,
        call_span: Span,
    ) -> RuntimeResult<Value> {
        match self {
            Value::NativeFunc(f) => f.execute(args, interpreter).map_err(|e| e.at(call_span)),
            Value::UserFunc(f) => f.execute(args, interpreter, call_span),
            _ => Err(InterpreterError::NotCallable.at(call_span)),
        }
    }

    pub fn apply_infix_op(op: InfixOperator, lhs: Value, rhs: Value) -> ValueResult<Value> {
        match op {
            InfixOperator::Add => match (lhs, rhs) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
                (a @ Value::String(_), b) | (a, b @ Value::String(_)) => {
                    Ok(Value::String(format!("{}{}", a, b)))
                }
                _ => Err(InterpreterError::IllegalAddOperands),
            },
            InfixOperator::Subtract => numerical_binop(lhs, rhs, |a, b| Value::Number(a - b)),
            InfixOperator::Multiply => numerical_binop(lhs, rhs, |a, b| Value::Number(a * b)),
            InfixOperator::Divide => match (lhs, rhs) {
                (Value::Number(_), Value::Number(b)) if b == 0.0 => {
                    Err(InterpreterError::DivideByZero)
                }
                (lhs, rhs) => numerical_binop(lhs, rhs, |a, b| Value::Number(a / b)),
            },
            InfixOperator::EqualTo => Ok(Value::Boolean(lhs == rhs)),
            InfixOperator::NotEqualTo => Ok(Value::Boolean(lhs != rhs)),
            InfixOperator::GreaterEq => numerical_binop(lhs, rhs, |a, b| Value::Boolean(a >= b)),
            InfixOperator::GreaterThan => numerical_binop(lhs, rhs, |a, b| Value::Boolean(a > b)),
            InfixOperator::LessEq => numerical_binop(lhs, rhs, |a, b| Value::Boolean(a <= b)),
            InfixOperator::LessThan => numerical_binop(lhs, rhs, |a, b| Value::Boolean(a < b)),
        }
    }

    pub fn apply_prefix_op(op: PrefixOperator, value: Value) -> ValueResult<Value> {
        match op {
            PrefixOperator::Negate => match value {
                Value::Number(n) => Ok(Value::Number(-n)),
                _ => Err(InterpreterError::OperandMustBeNumber),
            },
            PrefixOperator::LogicalNot => Ok(Value::Boolean(!value.is_truthy())),
        }
    }

    /// Reads `self[index]`.
    pub fn index(&self, index: &Value) -> ValueResult<Value> {
        let list = match self {
            Value::List(list) => list,
            _ => return Err(InterpreterError::NotIndexable),
        };

        let index = match index {
            Value::Number(n) => *n,
            _ => return Err(InterpreterError::IndexNotNumber),
        };

        let elements = list.borrow();
        let idx = list_index(index, elements.len())?;
        Ok(elements[idx].clone())
    }
}

/// Truncates a numeric index and bounds-checks it against `len`.
pub fn list_index(index: f64, len: usize) -> ValueResult<usize> {
    let truncated = index.trunc();
    if truncated.is_finite() && truncated >= 0.0 && truncated < len as f64 {
        Ok(truncated as usize)
    } else {
        Err(InterpreterError::IndexOutOfBounds { index, len })
    }
}

fn numerical_binop<F>(lhs: Value, rhs: Value, func: F) -> ValueResult<Value>
where
    F: Fn(f64, f64) -> Value,
{
    match (lhs, rhs) {
        (Value::Number(a), Value::Number(b)) => Ok(func(a, b)),
        _ => Err(InterpreterError::OperandsMustBeNumbers),
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Nothing, Value::Nothing) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::List(a), Value::List(b)) => Rc::ptr_eq(a, b),
            (Value::NativeFunc(a), Value::NativeFunc(b)) => a == b,
            (Value::UserFunc(a), Value::UserFunc(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write_value(self, f, &mut vec![])
    }
}

// `open` holds the lists currently being printed; meeting one again prints
// `[...]` instead of recursing forever.
fn write_value(
    value: &Value,
    f: &mut fmt::Formatter,
    open: &mut Vec<*const RefCell<Vec<Value>>>,
) -> fmt::Result {
    match value {
        Value::Nothing => f.write_str(NOTHING_STR),
        Value::Boolean(b) => write!(f, "{}", b),
        // f64's Display already omits a zero fraction: 5.0 prints as "5".
        Value::Number(n) => write!(f, "{}", n),
        Value::String(s) => f.write_str(s),
        Value::List(list) => {
            let ptr = Rc::as_ptr(list);
            if open.contains(&ptr) {
                return f.write_str("[...]");
            }

            open.push(ptr);
            f.write_str("[")?;
            for (i, element) in list.borrow().iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write_value(element, f, open)?;
            }
            open.pop();
            f.write_str("]")
        }
        Value::NativeFunc(func) => write!(f, "<native fn {}>", func.name()),
        Value::UserFunc(func) => write!(f, "<fn {}>", func.name()),
    }
}
