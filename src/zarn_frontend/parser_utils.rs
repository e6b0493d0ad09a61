use super::grammar::{InfixOperator, LogicalOperator, PrefixOperator};
use super::token::TokenKind;

/// Operators that may follow a complete left-hand expression.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ParserOperator {
    Arithequal(InfixOperator),
    Logical(LogicalOperator),
    Assignment,
    Call,
    Index,
}

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Copy)]
pub enum Precedence {
    // Lowest precedence
    Lowest,
    Assignment,
    LogicalOr,
    LogicalAnd,
    Equality,
    Comparison,
    Addition,
    Multiplication,
    Unary,
    Call, // Highest precedence
}

#[derive(Debug, Clone, Copy)]
pub enum Associativity {
    Left,
    Right,
}

impl ParserOperator {
    pub fn from_token(token: TokenKind) -> Option<ParserOperator> {
        if let Some(op) = Self::try_arithequal(token) {
            return Some(ParserOperator::Arithequal(op));
        }

        if let Some(op) = Self::try_logical(token) {
            return Some(ParserOperator::Logical(op));
        }

        match token {
            TokenKind::Equals => Some(ParserOperator::Assignment),
            TokenKind::LeftParen => Some(ParserOperator::Call),
            TokenKind::LeftBracket => Some(ParserOperator::Index),
            _ => None,
        }
    }

    fn try_arithequal(token: TokenKind) -> Option<InfixOperator> {
        let op = match token {
            TokenKind::Plus => InfixOperator::Add,
            TokenKind::Minus => InfixOperator::Subtract,
            TokenKind::Asterisk => InfixOperator::Multiply,
            TokenKind::Slash => InfixOperator::Divide,
            TokenKind::DoubleEq => InfixOperator::EqualTo,
            TokenKind::BangEq => InfixOperator::NotEqualTo,
            TokenKind::RightAngle => InfixOperator::GreaterThan,
            TokenKind::RightAngleEq => InfixOperator::GreaterEq,
            TokenKind::LeftAngle => InfixOperator::LessThan,
            TokenKind::LeftAngleEq => InfixOperator::LessEq,
            _ => return None,
        };
        Some(op)
    }

    fn try_logical(token: TokenKind) -> Option<LogicalOperator> {
        let op = match token {
            TokenKind::DoubleAmpersand => LogicalOperator::And,
            TokenKind::DoublePipe => LogicalOperator::Or,
            _ => return None,
        };

        Some(op)
    }

    pub fn is_higher_precedence(&self, min_precedence: Precedence) -> bool {
        use std::cmp::Ordering;
        match self.precedence().cmp(&min_precedence) {
            Ordering::Greater => true,
            Ordering::Less => false,
            Ordering::Equal => match self.associativity() {
                Associativity::Left => false,
                Associativity::Right => true,
            },
        }
    }

    pub fn precedence(&self) -> Precedence {
        match self {
            ParserOperator::Arithequal(op) => match op {
                InfixOperator::Add | InfixOperator::Subtract => Precedence::Addition,
                InfixOperator::Multiply | InfixOperator::Divide => Precedence::Multiplication,
                InfixOperator::EqualTo | InfixOperator::NotEqualTo => Precedence::Equality,
                InfixOperator::GreaterEq
                | InfixOperator::LessEq
                | InfixOperator::GreaterThan
                | InfixOperator::LessThan => Precedence::Comparison,
            },
            ParserOperator::Logical(op) => match op {
                LogicalOperator::And => Precedence::LogicalAnd,
                LogicalOperator::Or => Precedence::LogicalOr,
            },
            ParserOperator::Assignment => Precedence::Assignment,
            ParserOperator::Call | ParserOperator::Index => Precedence::Call,
        }
    }

    pub fn associativity(&self) -> Associativity {
        match self.precedence() {
            Precedence::Assignment => Associativity::Right,
            _ => Associativity::Left,
        }
    }
}

pub fn prefix_operator(token: TokenKind) -> Option<PrefixOperator> {
    match token {
        TokenKind::Bang => Some(PrefixOperator::LogicalNot),
        TokenKind::Minus => Some(PrefixOperator::Negate),
        _ => None,
    }
}
