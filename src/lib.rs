pub mod treewalk_interpreter;
pub mod zarn_frontend;

use treewalk_interpreter::{Interpreter, RuntimeError};
use zarn_frontend::errors::{LexerError, ParserError};
use zarn_frontend::grammar::Tree;
use zarn_frontend::{Lexer, Parser};

use std::io;
use thiserror::Error;

/// Exit status for a malformed command line.
pub const EX_USAGE: i32 = 64;
/// Exit status for malformed input (lexing or parsing).
pub const EX_DATAERR: i32 = 65;
/// Exit status for a program that failed while running.
pub const EX_SOFTWARE: i32 = 70;
/// Exit status when the script cannot be read.
pub const EX_IOERR: i32 = 74;

#[derive(Debug, Error)]
pub enum ZarnError {
    #[error(transparent)]
    Lexer(#[from] LexerError),
    #[error(transparent)]
    Parser(#[from] ParserError),
    #[error("{}", join_lines(.0))]
    Syntax(Vec<ParserError>),
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

impl ZarnError {
    pub fn exit_code(&self) -> i32 {
        match self {
            ZarnError::Lexer(_) | ZarnError::Parser(_) | ZarnError::Syntax(_) => EX_DATAERR,
            ZarnError::Runtime(_) => EX_SOFTWARE,
        }
    }
}

fn join_lines(errors: &[ParserError]) -> String {
    let lines: Vec<_> = errors.iter().map(|e| e.to_string()).collect();
    lines.join("\n")
}

/// Lexes and parses a program, stopping at the first error.
pub fn parse_source(source: &str) -> Result<Tree, ZarnError> {
    let tokens = Lexer::new(source).scan()?;
    Ok(Parser::new(tokens).parse()?)
}

/// Lexes and parses a program, collecting every syntax error.
pub fn check_source(source: &str) -> Result<Tree, ZarnError> {
    let tokens = Lexer::new(source).scan()?;
    Parser::new(tokens)
        .parse_with_recovery()
        .map_err(ZarnError::Syntax)
}

/// Runs `source` on an existing interpreter, keeping its globals.
pub fn run_source(interpreter: &mut Interpreter<'_>, source: &str) -> Result<(), ZarnError> {
    let tree = parse_source(source)?;
    interpreter.interpret(&tree)?;
    Ok(())
}

/// Reads lines from the interpreter's input and runs each one until the
/// input is exhausted. `input()` shares the stream, so lines it consumes are
/// never run as code. Errors go to `report` and the session continues.
pub fn run_prompt<F>(
    interpreter: &mut Interpreter<'_>,
    print_ast: bool,
    mut report: F,
) -> io::Result<()>
where
    F: FnMut(&ZarnError),
{
    loop {
        interpreter.write_output("> ")?;

        let mut line = String::new();
        if interpreter.read_line(&mut line)? == 0 {
            return interpreter.write_output("\n");
        }

        let tree = match parse_source(&line) {
            Ok(tree) => tree,
            Err(e) => {
                report(&e);
                continue;
            }
        };
        if print_ast {
            interpreter.write_output(&format!("{}\n", tree.ast_string()))?;
        }
        if let Err(e) = interpreter.interpret(&tree) {
            report(&ZarnError::from(e));
        }
    }
}
