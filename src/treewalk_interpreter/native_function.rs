use super::errors::{InterpreterError, ValueResult};
use super::interpreter::Interpreter;
use super::object::{list_index, ListRef, Value};

use std::fmt;
use std::io::{BufRead, Write};
use std::rc::Rc;
use tracing::debug;

/// Natives receive their arguments after the arity check.
type FnType = fn(&mut Interpreter<'_>, Vec<Value>) -> ValueResult<Value>;

pub struct NativeFnData {
    pub func: FnType,
    pub arity: usize,
    pub name: &'static str,
}

#[derive(Clone)]
pub struct NativeFn(Rc<NativeFnData>);

impl NativeFn {
    fn new(name: &'static str, func: FnType, arity: usize) -> Self {
        let data = NativeFnData { func, arity, name };
        NativeFn(Rc::new(data))
    }

    pub fn name(&self) -> &'static str {
        self.0.name
    }

    pub fn arity(&self) -> usize {
        self.0.arity
    }

    pub fn execute(&self, args: Vec<Value>, interpreter: &mut Interpreter<'_>) -> ValueResult<Value> {
        if self.arity() == args.len() {
            (self.0.func)(interpreter, args)
        } else {
            Err(InterpreterError::WrongArity {
                expected: self.arity(),
                got: args.len(),
            })
        }
    }
}

impl fmt::Debug for NativeFn {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "<native fn {}>", self.0.name)
    }
}

impl PartialEq<NativeFn> for NativeFn {
    // Function pointers have no reliable identity, two natives with
    // identical bodies may be merged. Compare the Rcs instead.
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for NativeFn {}

pub fn get_native_funcs() -> Vec<NativeFn> {
    vec![
        NativeFn::new("say", say, 1),
        NativeFn::new("input", input, 1),
        NativeFn::new("append", append, 2),
        NativeFn::new("get", get, 2),
        NativeFn::new("set", set, 3),
        NativeFn::new("len", len, 1),
    ]
}

fn say(interpreter: &mut Interpreter<'_>, args: Vec<Value>) -> ValueResult<Value> {
    writeln!(interpreter.output, "{}", args[0])?;
    Ok(Value::Nothing)
}

fn input(interpreter: &mut Interpreter<'_>, args: Vec<Value>) -> ValueResult<Value> {
    write!(interpreter.output, "{}", args[0])?;
    interpreter.output.flush()?;

    let mut line = String::new();
    interpreter.input.read_line(&mut line)?;
    if line.ends_with('\n') {
        line.pop();
        if line.ends_with('\r') {
            line.pop();
        }
    }

    Ok(Value::String(line))
}

fn append(_interpreter: &mut Interpreter<'_>, args: Vec<Value>) -> ValueResult<Value> {
    let list = expect_list(&args[0], "append", "First argument to append() must be a list.")?;
    list.borrow_mut().push(args[1].clone());
    Ok(Value::Nothing)
}

fn get(_interpreter: &mut Interpreter<'_>, args: Vec<Value>) -> ValueResult<Value> {
    let list = expect_list(&args[0], "get", "First argument to get() must be a list.")?;
    let index = expect_number(&args[1], "get", "Second argument to get() must be a number.")?;

    let elements = list.borrow();
    let idx = list_index(index, elements.len())?;
    Ok(elements[idx].clone())
}

fn set(_interpreter: &mut Interpreter<'_>, args: Vec<Value>) -> ValueResult<Value> {
    let list = expect_list(&args[0], "set", "First argument to set() must be a list.")?;
    let index = expect_number(&args[1], "set", "Second argument to set() must be a number.")?;

    let mut elements = list.borrow_mut();
    let idx = list_index(index, elements.len())?;
    elements[idx] = args[2].clone();
    Ok(Value::Nothing)
}

fn len(_interpreter: &mut Interpreter<'_>, args: Vec<Value>) -> ValueResult<Value> {
    let count = match &args[0] {
        Value::List(list) => list.borrow().len(),
        Value::String(s) => s.chars().count(),
        other => {
            return Err(bad_argument(
                other,
                "len",
                "Argument to len() must be a list or string.",
            ))
        }
    };

    Ok(Value::Number(count as f64))
}

fn expect_list<'a>(
    value: &'a Value,
    func: &'static str,
    message: &'static str,
) -> ValueResult<&'a ListRef> {
    match value {
        Value::List(list) => Ok(list),
        other => Err(bad_argument(other, func, message)),
    }
}

fn expect_number(value: &Value, func: &'static str, message: &'static str) -> ValueResult<f64> {
    match value {
        Value::Number(n) => Ok(*n),
        other => Err(bad_argument(other, func, message)),
    }
}

fn bad_argument(value: &Value, func: &'static str, message: &'static str) -> InterpreterError {
    debug!(func, got = value.type_name(), "rejected native argument");
    InterpreterError::NativeArgument { func, message }
}
