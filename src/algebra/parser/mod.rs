use std::iter::Peekable;

use crate::algebra::parser::{
    ast::{Consts, Expression, Operation},
    lexer::{Keyword, Lexer, Token},
};
use crate::algebra::schema::Relation;
use crate::error::{Error, Result};

pub mod ast;
mod lexer;

/// Predicate Parser - Converts a selection condition into an expression tree
///
/// Grammar, loosest binding first:
///
/// ```text
/// or      := and ( '||' and )*
/// and     := cmp ( '&&' cmp )*
/// cmp     := operand ( ( '=' | '!=' | '<' | '<=' | '>' | '>=' ) operand )?
/// operand := '(' or ')' | number | string | TRUE | FALSE | NULL | ident
/// ```
pub struct Parser<'a> {
    lexer: Peekable<Lexer<'a>>,
}

impl<'a> Parser<'a> {
    pub fn new(input: &'a str) -> Self {
        Parser {
            lexer: Lexer::new(input).peekable(),
        }
    }

    /// Parses the whole input as one expression
    pub fn parse(&mut self) -> Result<Expression> {
        let expr = self.parse_or()?;
        // No tokens allowed after the expression
        if let Some(token) = self.peek()? {
            return Err(Error::InvalidExpression(format!(
                "[Parser] Unexpected token {}",
                token
            )));
        }
        Ok(expr)
    }

    fn parse_or(&mut self) -> Result<Expression> {
        let mut expr = self.parse_and()?;
        while self.next_if_token(Token::Or).is_some() {
            let rhs = self.parse_and()?;
            expr = Operation::Or(Box::new(expr), Box::new(rhs)).into();
        }
        Ok(expr)
    }

    fn parse_and(&mut self) -> Result<Expression> {
        let mut expr = self.parse_comparison()?;
        while self.next_if_token(Token::And).is_some() {
            let rhs = self.parse_comparison()?;
            expr = Operation::And(Box::new(expr), Box::new(rhs)).into();
        }
        Ok(expr)
    }

    fn parse_comparison(&mut self) -> Result<Expression> {
        let lhs = self.parse_operand()?;
        let Some(op) = self.next_if(|t| {
            matches!(
                t,
                Token::Equal
                    | Token::NotEqual
                    | Token::Less
                    | Token::LessEqual
                    | Token::Greater
                    | Token::GreaterEqual
            )
        }) else {
            return Ok(lhs);
        };
        let (l, r) = (Box::new(lhs), Box::new(self.parse_operand()?));
        Ok(match op {
            Token::Equal => Operation::Equal(l, r),
            Token::NotEqual => Operation::NotEqual(l, r),
            Token::Less => Operation::Less(l, r),
            Token::LessEqual => Operation::LessEqual(l, r),
            Token::Greater => Operation::Greater(l, r),
            Token::GreaterEqual => Operation::GreaterEqual(l, r),
            token => {
                return Err(Error::InvalidExpression(format!(
                    "[Parser] Unexpected token {}",
                    token
                )));
            }
        }
        .into())
    }

    fn parse_operand(&mut self) -> Result<Expression> {
        Ok(match self.next()? {
            Token::OpenParen => {
                let expr = self.parse_or()?;
                self.next_expect(Token::CloseParen)?;
                expr
            }
            Token::Number(n) => Consts::Number(n.parse().map_err(|_| {
                Error::InvalidExpression(format!("[Parser] Invalid number {}", n))
            })?)
            .into(),
            Token::String(s) => Consts::String(s).into(),
            Token::Keyword(Keyword::True) => Consts::Boolean(true).into(),
            Token::Keyword(Keyword::False) => Consts::Boolean(false).into(),
            Token::Keyword(Keyword::Null) => Consts::Null.into(),
            Token::Ident(name) => Expression::Field(name),
            t => {
                return Err(Error::InvalidExpression(format!(
                    "[Parser] Unexpected expression token {}",
                    t
                )));
            }
        })
    }

    fn peek(&mut self) -> Result<Option<Token>> {
        self.lexer.peek().cloned().transpose()
    }

    fn next(&mut self) -> Result<Token> {
        self.lexer.next().unwrap_or_else(|| {
            Err(Error::InvalidExpression(
                "[Parser] Unexpected end of input".into(),
            ))
        })
    }

    /// Expects a specific token, returns error if different
    fn next_expect(&mut self, expect: Token) -> Result<()> {
        let token = self.next()?;
        if token != expect {
            return Err(Error::InvalidExpression(format!(
                "[Parser] Expected token {}, got {}",
                expect, token
            )));
        }
        Ok(())
    }

    /// Consumes next token if it satisfies the predicate
    fn next_if<F: Fn(&Token) -> bool>(&mut self, predicate: F) -> Option<Token> {
        self.peek().unwrap_or(None).filter(|t| predicate(t))?;
        self.next().ok()
    }

    fn next_if_token(&mut self, token: Token) -> Option<Token> {
        self.next_if(|t| t == &token)
    }
}

/// Parses `condition` and binds it to `relation`'s attribute positions
pub fn compile(condition: &str, relation: &Relation) -> Result<Expression> {
    Parser::new(condition).parse()?.bind(relation)
}
