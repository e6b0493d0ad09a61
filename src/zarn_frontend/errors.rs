use super::constants::MAX_FUNC_ARGS;
use super::span::{CodePosition, Span};
use super::token::Token;

use std::fmt;
use thiserror::Error;

#[derive(Debug, PartialEq, Eq, Clone, Error)]
pub enum LexerErrorType {
    #[error("Unexpected character '{0}'")]
    UnexpectedCharacter(char),
    #[error("Unterminated string")]
    UnterminatedString,
    #[error("Unparsable number `{0}`")]
    UnparsableNumber(String),
}

#[derive(Debug, PartialEq, Eq, Clone, Error)]
#[error("{error} at line {}, column {}", .position.line_no, .position.column_no)]
pub struct LexerError {
    pub error: LexerErrorType,
    pub position: CodePosition,
}

pub type LexerResult<T> = Result<T, LexerError>;

/// Syntactic element named in parser error messages.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Item {
    Arguments,
    Condition,
    Else,
    Expression,
    FunctionBody,
    FunctionName,
    Index,
    ListElements,
    Parameters,
    ReturnValue,
}

#[derive(Debug, PartialEq, Eq, Clone, Error)]
pub enum ParserErrorType {
    #[error("Expected '{0}' after {1}.")]
    ExpectedAfter(&'static str, Item),
    #[error("Expected '{0}' before {1}.")]
    ExpectedBefore(&'static str, Item),
    #[error("Expected ';' or newline after {0}.")]
    ExpectedStatementEnd(Item),
    #[error("Expected expression.")]
    ExpectedExpr,
    #[error("Expected function name.")]
    ExpectedFunctionName,
    #[error("Expected parameter name.")]
    ExpectedParameterName,
    #[error("Invalid assignment target.")]
    InvalidAssignmentTarget,
    #[error("giveback outside function.")]
    GivebackOutsideFunction,
    #[error("Can't have more than {} arguments.", MAX_FUNC_ARGS)]
    TooManyArgs,
    #[error("Can't have more than {} parameters.", MAX_FUNC_ARGS)]
    TooManyParams,
    #[error("Expected '}}' after block.")]
    UnclosedBrace,
}

#[derive(Debug, PartialEq, Eq, Clone, Error)]
#[error("[line {}:{}] Error at {found}: {error}", .span.start_pos.line_no, .span.start_pos.column_no)]
pub struct ParserError {
    pub error: ParserErrorType,
    pub span: Span,
    pub found: String,
}

pub type ParserResult<T> = Result<T, ParserError>;

impl ParserError {
    pub fn at(token: &Token, error: ParserErrorType) -> Self {
        ParserError {
            error,
            span: token.span,
            found: token.to_string(),
        }
    }
}

impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Item::Arguments => "arguments",
            Item::Condition => "condition",
            Item::Else => "else",
            Item::Expression => "expression",
            Item::FunctionBody => "function body",
            Item::FunctionName => "function name",
            Item::Index => "index",
            Item::ListElements => "list elements",
            Item::Parameters => "parameters",
            Item::ReturnValue => "return value",
        };
        f.write_str(name)
    }
}
