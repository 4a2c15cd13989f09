//! Predicate Lexer - Tokenizes a selection condition into a stream of tokens

use std::{fmt::Display, iter::Peekable, str::Chars};

use crate::error::{Error, Result};

/// Represents a single lexical token in a condition
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Reserved keyword
    Keyword(Keyword),
    /// Attribute reference: short (`a`), pedantic (`R.a`) or synthesized (`SUM(a)`)
    Ident(String),
    /// String literal
    String(String),
    /// Numeric literal
    Number(String),
    OpenParen,
    CloseParen,
    /// `=` or `==`
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    And,
    Or,
}

impl Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Token::Keyword(keyword) => keyword.to_str(),
            Token::Ident(ident) => ident,
            Token::String(v) => v,
            Token::Number(n) => n,
            Token::OpenParen => "(",
            Token::CloseParen => ")",
            Token::Equal => "=",
            Token::NotEqual => "!=",
            Token::Less => "<",
            Token::LessEqual => "<=",
            Token::Greater => ">",
            Token::GreaterEqual => ">=",
            Token::And => "&&",
            Token::Or => "||",
        })
    }
}

/// Reserved keywords
#[derive(Debug, Clone, PartialEq)]
pub enum Keyword {
    True,
    False,
    Null,
}

impl Keyword {
    /// Attempts to parse a string as a keyword (case-insensitive)
    pub fn from_str(ident: &str) -> Option<Keyword> {
        Some(match ident.to_uppercase().as_ref() {
            "TRUE" => Keyword::True,
            "FALSE" => Keyword::False,
            "NULL" => Keyword::Null,
            _ => return None,
        })
    }

    pub fn to_str(&self) -> &str {
        match self {
            Keyword::True => "TRUE",
            Keyword::False => "FALSE",
            Keyword::Null => "NULL",
        }
    }
}

impl Display for Keyword {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.to_str())
    }
}

/// Condition lexical analyzer
pub struct Lexer<'a> {
    iter: Peekable<Chars<'a>>,
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Result<Token>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.scan() {
            Ok(Some(token)) => Some(Ok(token)),
            Ok(None) => self
                .iter
                .peek()
                .map(|c| Err(Error::InvalidExpression(format!("[Lexer] Unexpected character {}", c)))),
            Err(err) => Some(Err(err)),
        }
    }
}

impl<'a> Lexer<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            iter: text.chars().peekable(),
        }
    }

    /// Consumes the next character if it satisfies the predicate
    fn next_if<F: Fn(char) -> bool>(&mut self, predicate: F) -> Option<char> {
        self.iter.peek().filter(|&c| predicate(*c))?;
        self.iter.next()
    }

    /// Consumes consecutive characters while they satisfy the predicate
    fn next_while<F: Fn(char) -> bool>(&mut self, predicate: F) -> Option<String> {
        let mut value = String::new();
        while let Some(c) = self.next_if(&predicate) {
            value.push(c);
        }
        Some(value).filter(|v| !v.is_empty())
    }

    fn erase_whitespace(&mut self) {
        self.next_while(|c| c.is_whitespace());
    }

    /// Scans and returns the next token
    fn scan(&mut self) -> Result<Option<Token>> {
        self.erase_whitespace();
        match self.iter.peek() {
            Some(&q) if q == '\'' || q == '"' => self.scan_string(q),
            Some(c) if c.is_ascii_digit() => Ok(self.scan_number(String::new())),
            Some(c) if c.is_alphabetic() || *c == '_' => self.scan_ident(),
            Some(_) => self.scan_symbol(),
            None => Ok(None),
        }
    }

    /// Scans a string literal enclosed in `quote`
    fn scan_string(&mut self, quote: char) -> Result<Option<Token>> {
        self.iter.next();
        let mut val = String::new();
        loop {
            match self.iter.next() {
                Some(c) if c == quote => break,
                Some(c) => val.push(c),
                None => {
                    return Err(Error::InvalidExpression(
                        "[Lexer] Unexpected end of string".into(),
                    ));
                }
            }
        }
        Ok(Some(Token::String(val)))
    }

    /// Scans a numeric literal, `prefix` holds an already consumed sign
    fn scan_number(&mut self, prefix: String) -> Option<Token> {
        let mut val = prefix;
        val.push_str(&self.next_while(|c| c.is_ascii_digit())?);
        if let Some(sep) = self.next_if(|c| c == '.') {
            val.push(sep);
            while let Some(c) = self.next_if(|c| c.is_ascii_digit()) {
                val.push(c);
            }
        }
        if let Some(exp) = self.next_if(|c| c == 'e' || c == 'E') {
            val.push(exp);
            if let Some(sign) = self.next_if(|c| c == '+' || c == '-') {
                val.push(sign);
            }
            while let Some(c) = self.next_if(|c| c.is_ascii_digit()) {
                val.push(c);
            }
        }
        Some(Token::Number(val))
    }

    /// Scans an identifier or keyword
    ///
    /// Dots are part of pedantic names. A parenthesis directly after the name
    /// belongs to a synthesized aggregate name such as `COUNT(code)`.
    fn scan_ident(&mut self) -> Result<Option<Token>> {
        let mut val = self
            .next_while(|c| c.is_alphanumeric() || c == '_' || c == '.')
            .unwrap_or_default();
        if let Some(open) = self.next_if(|c| c == '(') {
            val.push(open);
            let mut depth = 1;
            while depth > 0 {
                match self.iter.next() {
                    Some(c) => {
                        match c {
                            '(' => depth += 1,
                            ')' => depth -= 1,
                            _ => {}
                        }
                        val.push(c);
                    }
                    None => {
                        return Err(Error::InvalidExpression(format!(
                            "[Lexer] Unclosed parenthesis in {}",
                            val
                        )));
                    }
                }
            }
            return Ok(Some(Token::Ident(val)));
        }
        Ok(Some(
            Keyword::from_str(&val).map_or(Token::Ident(val), Token::Keyword),
        ))
    }

    /// Scans an operator or parenthesis
    fn scan_symbol(&mut self) -> Result<Option<Token>> {
        let Some(c) = self.iter.next() else {
            return Ok(None);
        };
        let token = match c {
            '(' => Token::OpenParen,
            ')' => Token::CloseParen,
            '=' => {
                self.next_if(|c| c == '=');
                Token::Equal
            }
            '!' if self.next_if(|c| c == '=').is_some() => Token::NotEqual,
            '<' if self.next_if(|c| c == '=').is_some() => Token::LessEqual,
            '<' if self.next_if(|c| c == '>').is_some() => Token::NotEqual,
            '<' => Token::Less,
            '>' if self.next_if(|c| c == '=').is_some() => Token::GreaterEqual,
            '>' => Token::Greater,
            '&' if self.next_if(|c| c == '&').is_some() => Token::And,
            '|' if self.next_if(|c| c == '|').is_some() => Token::Or,
            '-' if self.iter.peek().is_some_and(|c| c.is_ascii_digit()) => {
                return Ok(self.scan_number("-".to_string()));
            }
            c => {
                return Err(Error::InvalidExpression(format!(
                    "[Lexer] Unexpected character {}",
                    c
                )));
            }
        };
        Ok(Some(token))
    }
}

#[cfg(test)]
mod tests {
    use super::{Keyword, Lexer, Token};
    use crate::error::Result;

    #[test]
    fn test_lexer_comparison_chain() -> Result<()> {
        let tokens = Lexer::new("Offices.code = Employees.code && city != 'NYC'")
            .collect::<Result<Vec<_>>>()?;

        assert_eq!(
            tokens,
            vec![
                Token::Ident("Offices.code".to_string()),
                Token::Equal,
                Token::Ident("Employees.code".to_string()),
                Token::And,
                Token::Ident("city".to_string()),
                Token::NotEqual,
                Token::String("NYC".to_string()),
            ]
        );
        Ok(())
    }

    #[test]
    fn test_lexer_numbers_and_keywords() -> Result<()> {
        let tokens = Lexer::new("(amount>=-12.5||amount<1e3)==TRUE || x == null")
            .collect::<Result<Vec<_>>>()?;

        assert_eq!(
            tokens,
            vec![
                Token::OpenParen,
                Token::Ident("amount".to_string()),
                Token::GreaterEqual,
                Token::Number("-12.5".to_string()),
                Token::Or,
                Token::Ident("amount".to_string()),
                Token::Less,
                Token::Number("1e3".to_string()),
                Token::CloseParen,
                Token::Equal,
                Token::Keyword(Keyword::True),
                Token::Or,
                Token::Ident("x".to_string()),
                Token::Equal,
                Token::Keyword(Keyword::Null),
            ]
        );
        Ok(())
    }

    #[test]
    fn test_lexer_aggregate_name() -> Result<()> {
        let tokens = Lexer::new("COUNT(code) > 1").collect::<Result<Vec<_>>>()?;
        assert_eq!(
            tokens,
            vec![
                Token::Ident("COUNT(code)".to_string()),
                Token::Greater,
                Token::Number("1".to_string()),
            ]
        );
        Ok(())
    }

    #[test]
    fn test_lexer_errors() {
        assert!(Lexer::new("name = 'open").collect::<Result<Vec<_>>>().is_err());
        assert!(Lexer::new("a & b").collect::<Result<Vec<_>>>().is_err());
        assert!(Lexer::new("a # b").collect::<Result<Vec<_>>>().is_err());
    }
}
