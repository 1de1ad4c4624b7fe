use anyhow::{Result, bail, ensure};

use super::expr::{CmpOp, Expr, Literal};

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    Text(String),
    Number(f64),
    Cmp(CmpOp),
    LParen,
    RParen,
    Comma,
}

fn lex(input: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();
    while let Some(&c) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '\'' => {
                chars.next();
                let mut text = String::new();
                loop {
                    match chars.next() {
                        Some('\'') => {
                            // Doubled quote escapes a literal quote.
                            if chars.peek() == Some(&'\'') {
                                chars.next();
                                text.push('\'');
                            } else {
                                break;
                            }
                        }
                        Some(ch) => text.push(ch),
                        None => bail!("unterminated string literal in query"),
                    }
                }
                tokens.push(Token::Text(text));
            }
            '(' => {
                chars.next();
                tokens.push(Token::LParen);
            }
            ')' => {
                chars.next();
                tokens.push(Token::RParen);
            }
            ',' => {
                chars.next();
                tokens.push(Token::Comma);
            }
            '=' => {
                chars.next();
                tokens.push(Token::Cmp(CmpOp::Eq));
            }
            '<' => {
                chars.next();
                let op = match chars.peek() {
                    Some('=') => {
                        chars.next();
                        CmpOp::Le
                    }
                    Some('>') => {
                        chars.next();
                        CmpOp::Ne
                    }
                    _ => CmpOp::Lt,
                };
                tokens.push(Token::Cmp(op));
            }
            '>' => {
                chars.next();
                let op = match chars.peek() {
                    Some('=') => {
                        chars.next();
                        CmpOp::Ge
                    }
                    _ => CmpOp::Gt,
                };
                tokens.push(Token::Cmp(op));
            }
            '!' => {
                chars.next();
                ensure!(chars.next() == Some('='), "expected '=' after '!' in query");
                tokens.push(Token::Cmp(CmpOp::Ne));
            }
            c if c.is_ascii_digit() || c == '-' || c == '.' => {
                let mut text = String::new();
                text.push(c);
                chars.next();
                while let Some(&d) = chars.peek() {
                    if d.is_ascii_digit() || d == '.' {
                        text.push(d);
                        chars.next();
                    } else {
                        break;
                    }
                }
                let value: f64 = text
                    .parse()
                    .map_err(|_| anyhow::anyhow!("invalid number '{text}' in query"))?;
                tokens.push(Token::Number(value));
            }
            c if c.is_alphabetic() || c == '_' => {
                let mut ident = String::new();
                while let Some(&d) = chars.peek() {
                    if d.is_alphanumeric() || d == '_' {
                        ident.push(d);
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(Token::Ident(ident));
            }
            other => bail!("unexpected character '{other}' in query"),
        }
    }
    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn eat_keyword(&mut self, keyword: &str) -> bool {
        if let Some(Token::Ident(word)) = self.peek() {
            if word.eq_ignore_ascii_case(keyword) {
                self.pos += 1;
                return true;
            }
        }
        false
    }

    fn or_expr(&mut self) -> Result<Expr> {
        let mut expr = self.and_expr()?;
        while self.eat_keyword("OR") {
            let rhs = self.and_expr()?;
            expr = Expr::Or(Box::new(expr), Box::new(rhs));
        }
        Ok(expr)
    }

    fn and_expr(&mut self) -> Result<Expr> {
        let mut expr = self.unary_expr()?;
        while self.eat_keyword("AND") {
            let rhs = self.unary_expr()?;
            expr = Expr::And(Box::new(expr), Box::new(rhs));
        }
        Ok(expr)
    }

    fn unary_expr(&mut self) -> Result<Expr> {
        if self.eat_keyword("NOT") {
            return Ok(Expr::Not(Box::new(self.unary_expr()?)));
        }
        self.primary()
    }

    fn primary(&mut self) -> Result<Expr> {
        match self.next() {
            Some(Token::LParen) => {
                let expr = self.or_expr()?;
                match self.next() {
                    Some(Token::RParen) => Ok(expr),
                    _ => bail!("expected ')' in query"),
                }
            }
            Some(Token::Ident(name)) => self.predicate(name.to_lowercase()),
            other => bail!("expected a field name or '(' in query, found {other:?}"),
        }
    }

    fn predicate(&mut self, field: String) -> Result<Expr> {
        if self.eat_keyword("IN") {
            match self.next() {
                Some(Token::LParen) => {}
                _ => bail!("expected '(' after IN"),
            }
            let mut values = vec![self.literal()?];
            loop {
                match self.next() {
                    Some(Token::Comma) => values.push(self.literal()?),
                    Some(Token::RParen) => break,
                    _ => bail!("expected ',' or ')' in IN list"),
                }
            }
            return Ok(Expr::In { field, values });
        }
        if self.eat_keyword("IS") {
            let negated = self.eat_keyword("NOT");
            ensure!(self.eat_keyword("NULL"), "expected NULL after IS");
            return Ok(Expr::IsNull { field, negated });
        }
        match self.next() {
            Some(Token::Cmp(op)) => {
                let value = self.literal()?;
                Ok(Expr::Cmp { field, op, value })
            }
            other => bail!("expected a comparison after '{field}', found {other:?}"),
        }
    }

    fn literal(&mut self) -> Result<Literal> {
        match self.next() {
            Some(Token::Text(s)) => Ok(Literal::Text(s)),
            Some(Token::Number(n)) => Ok(Literal::Number(n)),
            other => bail!("expected a literal in query, found {other:?}"),
        }
    }
}

/// Parse a definition query into an expression tree.
pub fn parse(input: &str) -> Result<Expr> {
    let tokens = lex(input)?;
    ensure!(!tokens.is_empty(), "empty definition query");
    let mut parser = Parser { tokens, pos: 0 };
    let expr = parser.or_expr()?;
    ensure!(
        parser.peek().is_none(),
        "trailing input after position {} in query",
        parser.pos
    );
    Ok(expr)
}
