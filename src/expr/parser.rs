//! Recursive-descent parser for expression fragments.
//!
//! Precedence, loosest first:
//!
//! ```text
//! a if c else b
//! or
//! and
//! not
//! == != < <= > >= in, not in
//! + -
//! * / // %
//! unary - +
//! .attr  call()  [index]
//! ```

use super::token::{tokenize, Token, TokenKind};
use crate::error::SyntaxError;
use crate::types::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Pos,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    FloorDiv,
    Mod,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    In,
    NotIn,
}

#[derive(Debug, Clone)]
pub enum Expr {
    Literal(Value),
    Name(String),
    Attribute(Box<Expr>, String),
    Subscript(Box<Expr>, Box<Expr>),
    Call(Box<Expr>, Vec<Expr>),
    List(Vec<Expr>),
    Unary(UnaryOp, Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
    /// Chained comparison `a < b <= c`.
    Compare(Box<Expr>, Vec<(CompareOp, Expr)>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Conditional {
        test: Box<Expr>,
        body: Box<Expr>,
        orelse: Box<Expr>,
    },
}

#[derive(Debug, Clone)]
pub enum Statement {
    Expr(Expr),
    /// `object.attribute = value`
    Assign {
        object: Expr,
        attribute: String,
        value: Expr,
    },
}

/// Parse a single expression.
pub fn parse_expression(source: &str) -> Result<Expr, SyntaxError> {
    let mut parser = Parser::new(source)?;
    let expr = parser.expression()?;
    parser.expect_end()?;
    Ok(expr)
}

/// Parse `;`-separated statements. A trailing `;` is allowed.
pub fn parse_statements(source: &str) -> Result<Vec<Statement>, SyntaxError> {
    let mut parser = Parser::new(source)?;
    let mut statements = Vec::new();
    loop {
        while parser.eat_op(";") {}
        if parser.at_end() {
            break;
        }
        statements.push(parser.statement()?);
        if !parser.eat_op(";") {
            break;
        }
    }
    parser.expect_end()?;
    if statements.is_empty() {
        return Err(SyntaxError::new("expected a statement", 0));
    }
    Ok(statements)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn new(source: &str) -> Result<Self, SyntaxError> {
        Ok(Self {
            tokens: tokenize(source)?,
            pos: 0,
        })
    }

    // =========================================================================
    // Token helpers
    // =========================================================================

    fn peek(&self) -> &Token {
        // `tokenize` always ends with `End`, and `advance` never passes it.
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek_at(&self, ahead: usize) -> &TokenKind {
        let index = (self.pos + ahead).min(self.tokens.len() - 1);
        &self.tokens[index].kind
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if token.kind != TokenKind::End {
            self.pos += 1;
        }
        token
    }

    fn at_end(&self) -> bool {
        self.peek().kind == TokenKind::End
    }

    fn is_op(&self, op: &str) -> bool {
        matches!(&self.peek().kind, TokenKind::Op(o) if *o == op)
    }

    fn is_keyword(&self, keyword: &str) -> bool {
        matches!(&self.peek().kind, TokenKind::Name(n) if n == keyword)
    }

    fn eat_op(&mut self, op: &str) -> bool {
        if self.is_op(op) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn eat_keyword(&mut self, keyword: &str) -> bool {
        if self.is_keyword(keyword) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect_op(&mut self, op: &str) -> Result<(), SyntaxError> {
        if self.eat_op(op) {
            Ok(())
        } else {
            Err(self.error(format!("expected '{op}'")))
        }
    }

    fn expect_end(&self) -> Result<(), SyntaxError> {
        if self.at_end() {
            Ok(())
        } else {
            Err(self.error("unexpected trailing input"))
        }
    }

    fn error(&self, message: impl Into<String>) -> SyntaxError {
        SyntaxError::new(message, self.peek().offset)
    }

    // =========================================================================
    // Grammar
    // =========================================================================

    fn statement(&mut self) -> Result<Statement, SyntaxError> {
        let offset = self.peek().offset;
        let expr = self.expression()?;
        if !self.eat_op("=") {
            return Ok(Statement::Expr(expr));
        }
        let value = self.expression()?;
        match expr {
            Expr::Attribute(object, attribute) => Ok(Statement::Assign {
                object: *object,
                attribute,
                value,
            }),
            _ => Err(SyntaxError::new(
                "only attribute assignment is supported",
                offset,
            )),
        }
    }

    fn expression(&mut self) -> Result<Expr, SyntaxError> {
        let body = self.or_expr()?;
        if !self.eat_keyword("if") {
            return Ok(body);
        }
        let test = self.or_expr()?;
        if !self.eat_keyword("else") {
            return Err(self.error("expected 'else'"));
        }
        let orelse = self.expression()?;
        Ok(Expr::Conditional {
            test: Box::new(test),
            body: Box::new(body),
            orelse: Box::new(orelse),
        })
    }

    fn or_expr(&mut self) -> Result<Expr, SyntaxError> {
        let mut lhs = self.and_expr()?;
        while self.eat_keyword("or") {
            let rhs = self.and_expr()?;
            lhs = Expr::Or(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn and_expr(&mut self) -> Result<Expr, SyntaxError> {
        let mut lhs = self.not_expr()?;
        while self.eat_keyword("and") {
            let rhs = self.not_expr()?;
            lhs = Expr::And(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn not_expr(&mut self) -> Result<Expr, SyntaxError> {
        if self.eat_keyword("not") {
            let operand = self.not_expr()?;
            return Ok(Expr::Unary(UnaryOp::Not, Box::new(operand)));
        }
        self.comparison()
    }

    fn compare_op(&mut self) -> Option<CompareOp> {
        let (op, width) = match &self.peek().kind {
            TokenKind::Op("==") => (CompareOp::Eq, 1),
            TokenKind::Op("!=") => (CompareOp::Ne, 1),
            TokenKind::Op("<") => (CompareOp::Lt, 1),
            TokenKind::Op("<=") => (CompareOp::Le, 1),
            TokenKind::Op(">") => (CompareOp::Gt, 1),
            TokenKind::Op(">=") => (CompareOp::Ge, 1),
            TokenKind::Name(n) if n == "in" => (CompareOp::In, 1),
            TokenKind::Name(n)
                if n == "not" && matches!(self.peek_at(1), TokenKind::Name(m) if m == "in") =>
            {
                (CompareOp::NotIn, 2)
            }
            _ => return None,
        };
        self.pos += width;
        Some(op)
    }

    fn comparison(&mut self) -> Result<Expr, SyntaxError> {
        let lhs = self.arith()?;
        let mut chain = Vec::new();
        while let Some(op) = self.compare_op() {
            chain.push((op, self.arith()?));
        }
        if chain.is_empty() {
            Ok(lhs)
        } else {
            Ok(Expr::Compare(Box::new(lhs), chain))
        }
    }

    fn arith(&mut self) -> Result<Expr, SyntaxError> {
        let mut lhs = self.term()?;
        loop {
            let op = if self.eat_op("+") {
                BinaryOp::Add
            } else if self.eat_op("-") {
                BinaryOp::Sub
            } else {
                return Ok(lhs);
            };
            let rhs = self.term()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
    }

    fn term(&mut self) -> Result<Expr, SyntaxError> {
        let mut lhs = self.factor()?;
        loop {
            let op = if self.eat_op("*") {
                BinaryOp::Mul
            } else if self.eat_op("//") {
                BinaryOp::FloorDiv
            } else if self.eat_op("/") {
                BinaryOp::Div
            } else if self.eat_op("%") {
                BinaryOp::Mod
            } else {
                return Ok(lhs);
            };
            let rhs = self.factor()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
    }

    fn factor(&mut self) -> Result<Expr, SyntaxError> {
        if self.eat_op("-") {
            return Ok(Expr::Unary(UnaryOp::Neg, Box::new(self.factor()?)));
        }
        if self.eat_op("+") {
            return Ok(Expr::Unary(UnaryOp::Pos, Box::new(self.factor()?)));
        }
        self.postfix()
    }

    fn postfix(&mut self) -> Result<Expr, SyntaxError> {
        let mut expr = self.atom()?;
        loop {
            if self.eat_op(".") {
                let token = self.advance();
                let TokenKind::Name(name) = token.kind else {
                    return Err(SyntaxError::new("expected attribute name", token.offset));
                };
                expr = Expr::Attribute(Box::new(expr), name);
            } else if self.eat_op("(") {
                let args = self.sequence(")")?.0;
                expr = Expr::Call(Box::new(expr), args);
            } else if self.eat_op("[") {
                let index = self.expression()?;
                self.expect_op("]")?;
                expr = Expr::Subscript(Box::new(expr), Box::new(index));
            } else {
                return Ok(expr);
            }
        }
    }

    /// Comma-separated expressions up to `close`. Also reports whether a
    /// comma was seen, which turns `(x,)` into a tuple.
    fn sequence(&mut self, close: &str) -> Result<(Vec<Expr>, bool), SyntaxError> {
        let mut items = Vec::new();
        let mut comma = false;
        while !self.eat_op(close) {
            items.push(self.expression()?);
            if self.eat_op(",") {
                comma = true;
            } else {
                self.expect_op(close)?;
                break;
            }
        }
        Ok((items, comma))
    }

    fn atom(&mut self) -> Result<Expr, SyntaxError> {
        let token = self.advance();
        match token.kind {
            TokenKind::Int(i) => Ok(Expr::Literal(Value::Int(i))),
            TokenKind::Float(f) => Ok(Expr::Literal(Value::Float(f))),
            TokenKind::Str(mut s) => {
                // Adjacent literals concatenate.
                while let TokenKind::Str(next) = &self.peek().kind {
                    s.push_str(next);
                    self.pos += 1;
                }
                Ok(Expr::Literal(Value::from(s)))
            }
            TokenKind::Name(name) => match name.as_str() {
                "True" => Ok(Expr::Literal(Value::Bool(true))),
                "False" => Ok(Expr::Literal(Value::Bool(false))),
                "None" => Ok(Expr::Literal(Value::None)),
                "and" | "or" | "not" | "if" | "else" | "in" => Err(SyntaxError::new(
                    format!("unexpected keyword '{name}'"),
                    token.offset,
                )),
                _ => Ok(Expr::Name(name)),
            },
            TokenKind::Op("(") => {
                let (mut items, comma) = self.sequence(")")?;
                if items.len() == 1 && !comma {
                    Ok(items.remove(0))
                } else {
                    Ok(Expr::List(items))
                }
            }
            TokenKind::Op("[") => Ok(Expr::List(self.sequence("]")?.0)),
            TokenKind::End => Err(SyntaxError::new("unexpected end of input", token.offset)),
            TokenKind::Op(op) => Err(SyntaxError::new(
                format!("unexpected '{op}'"),
                token.offset,
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precedence() {
        let expr = parse_expression("1 + 2 * 3").unwrap();
        let Expr::Binary(BinaryOp::Add, _, rhs) = expr else {
            panic!("expected addition, got {expr:?}");
        };
        assert!(matches!(*rhs, Expr::Binary(BinaryOp::Mul, _, _)));
    }

    #[test]
    fn test_postfix_chain() {
        let expr = parse_expression("model.items[0].name").unwrap();
        let Expr::Attribute(inner, name) = expr else {
            panic!("expected attribute");
        };
        assert_eq!(name, "name");
        assert!(matches!(*inner, Expr::Subscript(_, _)));
    }

    #[test]
    fn test_conditional_and_not_in() {
        let expr = parse_expression("'a' if x not in items else 'b'").unwrap();
        let Expr::Conditional { test, .. } = expr else {
            panic!("expected conditional");
        };
        assert!(matches!(*test, Expr::Compare(_, ref chain) if chain[0].0 == CompareOp::NotIn));
    }

    #[test]
    fn test_tuples() {
        assert!(matches!(parse_expression("(1)").unwrap(), Expr::Literal(Value::Int(1))));
        assert!(matches!(parse_expression("(1,)").unwrap(), Expr::List(ref v) if v.len() == 1));
        assert!(matches!(parse_expression("()").unwrap(), Expr::List(ref v) if v.is_empty()));
    }

    #[test]
    fn test_statements() {
        let stmts = parse_statements("print(new); self.count = self.count + 1;").unwrap();
        assert_eq!(stmts.len(), 2);
        assert!(matches!(&stmts[1], Statement::Assign { attribute, .. } if attribute == "count"));

        let err = parse_statements("x = 1").unwrap_err();
        assert_eq!(err.offset, 0);
    }

    #[test]
    fn test_syntax_errors() {
        assert!(parse_expression("1 +").is_err());
        assert!(parse_expression("a b").is_err());
        assert!(parse_expression("f(1, 2").is_err());
        assert!(parse_statements("").is_err());
    }
}
