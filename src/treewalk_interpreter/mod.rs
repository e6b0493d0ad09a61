mod environment;
mod errors;
mod function;
mod interpreter;
mod native_function;
mod object;

pub use errors::{InterpreterError, RuntimeError, RuntimeResult};
pub use interpreter::{ExecOutcome, Interpreter, InterpreterConfig};
pub use object::Value;
