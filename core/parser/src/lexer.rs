//! FILENAME: core/parser/src/lexer.rs
//! PURPOSE: Scans a raw formula string and produces a stream of Tokens.
//! CONTEXT: First stage of the parsing pipeline. Handles whitespace, numbers
//! (with optional exponent), string literals with doubled-quote escapes,
//! quoted sheet names and the multi-character operators <=, >= and <>.
//! A `$` absolute marker is kept inside the identifier it belongs to.

use crate::token::Token;
use std::iter::Peekable;
use std::str::Chars;

pub struct Lexer<'a> {
    input: Peekable<Chars<'a>>,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Lexer {
            input: input.chars().peekable(),
        }
    }

    /// Advances the lexer and returns the next token.
    pub fn next_token(&mut self) -> Token {
        self.skip_whitespace();

        match self.input.next() {
            Some('+') => Token::Plus,
            Some('-') => Token::Minus,
            Some('*') => Token::Asterisk,
            Some('/') => Token::Slash,
            Some('^') => Token::Caret,
            Some('&') => Token::Ampersand,
            Some('%') => Token::Percent,
            Some('(') => Token::LParen,
            Some(')') => Token::RParen,
            Some(',') => Token::Comma,
            Some(':') => Token::Colon,
            Some('!') => Token::Exclamation,
            Some('=') => Token::Equals,
            Some('<') => match self.input.peek() {
                Some('=') => {
                    self.input.next();
                    Token::LessEqual
                }
                Some('>') => {
                    self.input.next();
                    Token::NotEqual
                }
                _ => Token::LessThan,
            },
            Some('>') => {
                if self.input.peek() == Some(&'=') {
                    self.input.next();
                    Token::GreaterEqual
                } else {
                    Token::GreaterThan
                }
            }
            Some('"') => self.read_string(),
            Some('\'') => self.read_quoted_identifier(),
            Some(ch) if ch.is_ascii_digit() || ch == '.' => self.read_number(ch),
            Some(ch) if starts_identifier(ch) => self.read_identifier(ch),
            None => Token::EOF,
            Some(ch) => Token::Illegal(ch),
        }
    }

    fn skip_whitespace(&mut self) {
        while self.input.next_if(|ch| ch.is_whitespace()).is_some() {}
    }

    /// Reads a string literal. `""` inside the literal is an escaped quote.
    fn read_string(&mut self) -> Token {
        let mut result = String::new();
        while let Some(ch) = self.input.next() {
            if ch == '"' {
                if self.input.next_if_eq(&'"').is_some() {
                    result.push('"');
                    continue;
                }
                return Token::String(result);
            }
            result.push(ch);
        }
        // Unterminated literal: keep what was read.
        Token::String(result)
    }

    /// Reads a quoted sheet name. `''` inside the name is an escaped quote.
    fn read_quoted_identifier(&mut self) -> Token {
        let mut result = String::new();
        while let Some(ch) = self.input.next() {
            if ch == '\'' {
                if self.input.next_if_eq(&'\'').is_some() {
                    result.push('\'');
                    continue;
                }
                return Token::QuotedIdentifier(result);
            }
            result.push(ch);
        }
        Token::QuotedIdentifier(result)
    }

    fn read_number(&mut self, first_char: char) -> Token {
        let mut text = String::from(first_char);
        let mut has_dot = first_char == '.';

        while let Some(&ch) = self.input.peek() {
            if ch.is_ascii_digit() {
                text.push(ch);
            } else if ch == '.' && !has_dot {
                has_dot = true;
                text.push(ch);
            } else {
                break;
            }
            self.input.next();
        }

        // Optional exponent: 1E3, 2.5e-4
        if let Some(&e) = self.input.peek() {
            if e == 'e' || e == 'E' {
                let mut lookahead = self.input.clone();
                lookahead.next();
                let sign = lookahead.next_if(|c| *c == '+' || *c == '-');
                if lookahead.peek().is_some_and(|c| c.is_ascii_digit()) {
                    self.input.next();
                    text.push('e');
                    if let Some(sign) = sign {
                        self.input.next();
                        text.push(sign);
                    }
                    while let Some(d) = self.input.next_if(|c| c.is_ascii_digit()) {
                        text.push(d);
                    }
                }
            }
        }

        match text.parse::<f64>() {
            Ok(n) => Token::Number(n),
            Err(_) => Token::Illegal(first_char),
        }
    }

    fn read_identifier(&mut self, first_char: char) -> Token {
        let mut ident = String::from(first_char);

        while let Some(ch) = self
            .input
            .next_if(|&ch| starts_identifier(ch) || ch.is_ascii_digit() || ch == '.')
        {
            ident.push(ch);
        }

        if ident.eq_ignore_ascii_case("TRUE") {
            Token::Boolean(true)
        } else if ident.eq_ignore_ascii_case("FALSE") {
            Token::Boolean(false)
        } else {
            Token::Identifier(ident)
        }
    }
}

fn starts_identifier(ch: char) -> bool {
    ch.is_ascii_alphabetic() || ch == '_' || ch == '$'
}
