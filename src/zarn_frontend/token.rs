use super::span::{CodePosition, Span};

use std::fmt;

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum TokenKind {
    // Literals.
    Identifier,
    String,
    Number,

    // Keywords.
    Fun,
    If,
    Else,
    While,
    Giveback,
    Nothing,
    This,
    Class,
    Use,
    Try,
    Catch,

    // Operators.
    Plus,
    Minus,
    Asterisk,
    Slash,
    Equals,
    DoubleEq,
    BangEq,
    RightAngle,
    RightAngleEq,
    LeftAngle,
    LeftAngleEq,
    DoubleAmpersand,
    DoublePipe,
    Bang,

    // Delimiters.
    LeftParen,
    RightParen,
    LeftBrace,
    RightBrace,
    LeftBracket,
    RightBracket,
    Comma,
    Semicolon,
    Dot,

    Newline,
    EndOfFile,
}

/// Decoded value carried by number and string tokens.
#[derive(Debug, PartialEq, Clone)]
pub enum TokenLiteral {
    Number(f64),
    Str(String),
}

#[derive(Debug, PartialEq, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub literal: Option<TokenLiteral>,
    pub span: Span,
}

impl TokenKind {
    pub fn keyword(word: &str) -> Option<TokenKind> {
        let kind = match word {
            "fun" => TokenKind::Fun,
            "if" => TokenKind::If,
            "else" => TokenKind::Else,
            "while" => TokenKind::While,
            "giveback" => TokenKind::Giveback,
            "nothing" => TokenKind::Nothing,
            "this" => TokenKind::This,
            "class" => TokenKind::Class,
            "use" => TokenKind::Use,
            "try" => TokenKind::Try,
            "catch" => TokenKind::Catch,
            _ => return None,
        };
        Some(kind)
    }

    /// True for tokens that begin a statement the parser can resynchronize on.
    pub fn starts_statement(&self) -> bool {
        matches!(
            self,
            TokenKind::Class
                | TokenKind::Fun
                | TokenKind::If
                | TokenKind::While
                | TokenKind::Giveback
        )
    }

    pub fn is_statement_end(&self) -> bool {
        matches!(self, TokenKind::Semicolon | TokenKind::Newline)
    }
}

impl Token {
    pub fn new(kind: TokenKind, lexeme: &str, literal: Option<TokenLiteral>, span: Span) -> Self {
        Token {
            kind,
            lexeme: lexeme.to_owned(),
            literal,
            span,
        }
    }

    pub fn end_of_file(position: CodePosition) -> Self {
        Token::new(TokenKind::EndOfFile, "", None, Span::new(position, position))
    }

    pub fn line(&self) -> usize {
        self.span.line()
    }

    pub fn column(&self) -> usize {
        self.span.column()
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.kind {
            TokenKind::EndOfFile => write!(f, "end of file"),
            TokenKind::Newline => write!(f, "newline"),
            _ => write!(f, "'{}'", self.lexeme),
        }
    }
}
