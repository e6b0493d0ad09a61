use super::cursor::Cursor;
use super::errors::{LexerError, LexerErrorType, LexerResult};
use super::span::{CodePosition, Span};
use super::token::{Token, TokenKind, TokenLiteral};

use tracing::debug;

pub struct Lexer<'src> {
    cursor: Cursor<'src>,
}

impl<'src> Lexer<'src> {
    /// Creates a lexer from source.
    pub fn new(source: &'src str) -> Self {
        Lexer {
            cursor: Cursor::new(source),
        }
    }

    /// Scans the whole source. The result always ends with a single
    /// end-of-file token; the first bad character aborts the scan.
    pub fn scan(mut self) -> LexerResult<Vec<Token>> {
        let mut tokens = vec![];

        loop {
            let token = self.next_token()?;
            let is_eof = token.kind == TokenKind::EndOfFile;
            tokens.push(token);
            if is_eof {
                break;
            }
        }

        debug!(tokens = tokens.len(), "scanned source");
        Ok(tokens)
    }

    /// Returns the next token.
    pub fn next_token(&mut self) -> LexerResult<Token> {
        loop {
            // Get rid of whitespace. Newlines are significant.
            self.cursor.take_while(|ch| matches!(ch, ' ' | '\r' | '\t'));

            let start_pos = self.cursor.get_position();
            let token = self.lex_token(start_pos)?;
            let end_pos = self.cursor.get_position();

            if let Some((kind, literal)) = token {
                let lexeme = self.cursor.slice(start_pos.byte_pos, end_pos.byte_pos);
                return Ok(Token::new(
                    kind,
                    lexeme,
                    literal,
                    Span::new(start_pos, end_pos),
                ));
            }
        }
    }

    /// Lexes a single token. Returns `None` for input that produces no
    /// token, i.e. comments.
    fn lex_token(
        &mut self,
        start_pos: CodePosition,
    ) -> LexerResult<Option<(TokenKind, Option<TokenLiteral>)>> {
        let ch = match self.cursor.take() {
            Some(ch) => ch,
            None => return Ok(Some((TokenKind::EndOfFile, None))),
        };

        let kind = match ch {
            '\n' => TokenKind::Newline,

            // Single-character tokens.
            '(' => TokenKind::LeftParen,
            ')' => TokenKind::RightParen,
            '{' => TokenKind::LeftBrace,
            '}' => TokenKind::RightBrace,
            '[' => TokenKind::LeftBracket,
            ']' => TokenKind::RightBracket,
            ',' => TokenKind::Comma,
            '.' => TokenKind::Dot,
            '-' => TokenKind::Minus,
            '+' => TokenKind::Plus,
            ';' => TokenKind::Semicolon,
            '*' => TokenKind::Asterisk,

            // Slash can either be comment or division.
            '/' => {
                if self.cursor.take_if('/') {
                    // Leave the newline in place, it still ends the statement.
                    self.cursor.take_until(|ch| ch == '\n');
                    return Ok(None);
                }
                TokenKind::Slash
            }

            // Potentially two character tokens.
            '!' => self.look_for_eq_sign(TokenKind::Bang, TokenKind::BangEq),
            '=' => self.look_for_eq_sign(TokenKind::Equals, TokenKind::DoubleEq),
            '<' => self.look_for_eq_sign(TokenKind::LeftAngle, TokenKind::LeftAngleEq),
            '>' => self.look_for_eq_sign(TokenKind::RightAngle, TokenKind::RightAngleEq),

            // Doubled-only tokens.
            '&' => self.expect_double('&', TokenKind::DoubleAmpersand, start_pos)?,
            '|' => self.expect_double('|', TokenKind::DoublePipe, start_pos)?,

            // String literals.
            '"' => return self.lex_string(start_pos).map(Some),

            // Numbers.
            _ if ch.is_ascii_digit() => return self.lex_number(start_pos).map(Some),

            // Identifiers.
            _ if is_identifier_start(ch) => {
                self.cursor.take_while(is_identifier_char);
                let end_pos = self.cursor.get_position();
                let word = self.cursor.slice(start_pos.byte_pos, end_pos.byte_pos);
                TokenKind::keyword(word).unwrap_or(TokenKind::Identifier)
            }

            // Unrecognized token.
            _ => {
                return Err(LexerError {
                    error: LexerErrorType::UnexpectedCharacter(ch),
                    position: start_pos,
                })
            }
        };

        Ok(Some((kind, None)))
    }

    /// Checks if next char is '='. If so, consume it and return t2.
    /// Otherwise, return t1.
    fn look_for_eq_sign(&mut self, t1: TokenKind, t2: TokenKind) -> TokenKind {
        if self.cursor.take_if('=') {
            t2
        } else {
            t1
        }
    }

    fn expect_double(
        &mut self,
        ch: char,
        kind: TokenKind,
        start_pos: CodePosition,
    ) -> LexerResult<TokenKind> {
        if self.cursor.take_if(ch) {
            Ok(kind)
        } else {
            Err(LexerError {
                error: LexerErrorType::UnexpectedCharacter(ch),
                position: start_pos,
            })
        }
    }

    /// Scans string up to next '"'. There are no escape sequences and the
    /// string may span several lines.
    fn lex_string(&mut self, start_pos: CodePosition) -> LexerResult<(TokenKind, Option<TokenLiteral>)> {
        self.cursor.take_until(|ch| ch == '"');

        let end_idx = self.cursor.get_position().byte_pos;
        if !self.cursor.take_if('"') {
            return Err(LexerError {
                error: LexerErrorType::UnterminatedString,
                position: start_pos,
            });
        }

        // Move past starting quote.
        let string = self.cursor.slice(start_pos.byte_pos + 1, end_idx).to_owned();
        Ok((TokenKind::String, Some(TokenLiteral::Str(string))))
    }

    /// Scans a number. A fractional part needs at least one digit after the dot.
    fn lex_number(&mut self, start_pos: CodePosition) -> LexerResult<(TokenKind, Option<TokenLiteral>)> {
        self.cursor.take_while(|ch| ch.is_ascii_digit());

        // Check for period in float.
        if self.cursor.peek() == Some('.')
            && self.cursor.peek_next().map_or(false, |ch| ch.is_ascii_digit())
        {
            self.cursor.take();
            self.cursor.take_while(|ch| ch.is_ascii_digit());
        }

        let end_idx = self.cursor.get_position().byte_pos;
        let scanned_number = self.cursor.slice(start_pos.byte_pos, end_idx);
        match scanned_number.parse() {
            Ok(value) => Ok((TokenKind::Number, Some(TokenLiteral::Number(value)))),
            Err(_) => Err(LexerError {
                error: LexerErrorType::UnparsableNumber(scanned_number.to_owned()),
                position: start_pos,
            }),
        }
    }
}

fn is_identifier_start(ch: char) -> bool {
    ch.is_ascii_alphabetic() || ch == '_'
}

fn is_identifier_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        Lexer::new(source)
            .scan()
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_operators_are_greedy() {
        assert_eq!(
            kinds("= == ! != < <= > >= && ||"),
            vec![
                TokenKind::Equals,
                TokenKind::DoubleEq,
                TokenKind::Bang,
                TokenKind::BangEq,
                TokenKind::LeftAngle,
                TokenKind::LeftAngleEq,
                TokenKind::RightAngle,
                TokenKind::RightAngleEq,
                TokenKind::DoubleAmpersand,
                TokenKind::DoublePipe,
                TokenKind::EndOfFile,
            ]
        );

        assert_eq!(
            kinds("=!"),
            vec![TokenKind::Equals, TokenKind::Bang, TokenKind::EndOfFile]
        );
    }

    #[test]
    fn test_newlines_and_comments() {
        assert_eq!(
            kinds("x = 1 // set x\nsay(x)"),
            vec![
                TokenKind::Identifier,
                TokenKind::Equals,
                TokenKind::Number,
                TokenKind::Newline,
                TokenKind::Identifier,
                TokenKind::LeftParen,
                TokenKind::Identifier,
                TokenKind::RightParen,
                TokenKind::EndOfFile,
            ]
        );
    }

    #[test]
    fn test_keywords() {
        assert_eq!(
            kinds("fun if else while giveback nothing this class use try catch funny"),
            vec![
                TokenKind::Fun,
                TokenKind::If,
                TokenKind::Else,
                TokenKind::While,
                TokenKind::Giveback,
                TokenKind::Nothing,
                TokenKind::This,
                TokenKind::Class,
                TokenKind::Use,
                TokenKind::Try,
                TokenKind::Catch,
                TokenKind::Identifier,
                TokenKind::EndOfFile,
            ]
        );

        // No boolean keywords.
        assert_eq!(kinds("true")[0], TokenKind::Identifier);
    }

    #[test]
    fn test_literals() {
        let tokens = Lexer::new("12.5 7. \"hi there\" _name2").scan().unwrap();

        assert_eq!(tokens[0].literal, Some(TokenLiteral::Number(12.5)));
        assert_eq!(tokens[0].lexeme, "12.5");

        // The dot is not part of the number without a following digit.
        assert_eq!(tokens[1].literal, Some(TokenLiteral::Number(7.0)));
        assert_eq!(tokens[2].kind, TokenKind::Dot);

        assert_eq!(tokens[3].lexeme, "\"hi there\"");
        assert_eq!(tokens[3].literal, Some(TokenLiteral::Str("hi there".to_owned())));

        assert_eq!(tokens[4].kind, TokenKind::Identifier);
        assert_eq!(tokens[4].lexeme, "_name2");
        assert_eq!(tokens[4].literal, None);
    }

    #[test]
    fn test_positions() {
        let tokens = Lexer::new("a = 1\n  say(a)").scan().unwrap();
        let say = &tokens[4];

        assert_eq!(say.lexeme, "say");
        assert_eq!((say.line(), say.column()), (2, 3));
        assert_eq!(tokens[2].column(), 5);
    }

    #[test]
    fn test_multiline_string_advances_line() {
        let tokens = Lexer::new("\"a\nb\" x").scan().unwrap();
        assert_eq!(tokens[0].literal, Some(TokenLiteral::Str("a\nb".to_owned())));
        assert_eq!(tokens[1].line(), 2);
    }

    #[test]
    fn test_lexer_errors() {
        let err = Lexer::new("x = \"open").scan().unwrap_err();
        assert_eq!(err.error, LexerErrorType::UnterminatedString);
        assert_eq!(err.position.column_no, 5);

        let err = Lexer::new("a\n  # b").scan().unwrap_err();
        assert_eq!(err.error, LexerErrorType::UnexpectedCharacter('#'));
        assert_eq!((err.position.line_no, err.position.column_no), (2, 3));
        assert_eq!(err.to_string(), "Unexpected character '#' at line 2, column 3");

        let err = Lexer::new("a & b").scan().unwrap_err();
        assert_eq!(err.error, LexerErrorType::UnexpectedCharacter('&'));
    }
}
