use std::rc::Rc;

use crate::{
    ast::{BinaryOp, Node, NodeKind, Param, UnaryOp},
    error::{Error, ErrorKind},
    lexer::{SpannedToken, Token},
    position::Span,
};

/// Maximum expression nesting depth accepted by the parser.
///
/// Prevents stack overflow on pathological inputs like `((((((x))))))`.
const MAX_NESTING_DEPTH: u16 = 200;

/// Parses a lexed token stream into a program node (`NodeKind::Statements`).
pub fn parse(tokens: Vec<SpannedToken>) -> Result<Node, Error> {
    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
    };
    parser.parse_program()
}

struct Parser {
    tokens: Vec<SpannedToken>,
    pos: usize,
    depth: u16,
}

impl Parser {
    fn current(&self) -> &SpannedToken {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn current_token(&self) -> &Token {
        &self.current().token
    }

    fn current_span(&self) -> Span {
        self.current().span.clone()
    }

    fn prev_span(&self) -> Span {
        self.tokens[self.pos.saturating_sub(1).min(self.tokens.len() - 1)].span.clone()
    }

    fn advance(&mut self) -> SpannedToken {
        let tok = self.current().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        tok
    }

    fn check(&self, token: &Token) -> bool {
        self.current_token() == token
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.check(token) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: &Token, expected: &str) -> Result<SpannedToken, Error> {
        if self.check(token) {
            Ok(self.advance())
        } else {
            Err(self.syntax_error(format!("Expected {expected}, found {}", self.current_token().describe())))
        }
    }

    fn syntax_error(&self, message: impl Into<String>) -> Error {
        Error::new(ErrorKind::InvalidSyntaxError, self.current_span(), message)
    }

    fn skip_newlines(&mut self) {
        while self.check(&Token::Newline) {
            self.advance();
        }
    }

    fn enter(&mut self) -> Result<(), Error> {
        self.depth += 1;
        if self.depth > MAX_NESTING_DEPTH {
            return Err(self.syntax_error("Expression nesting is too deep"));
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    // --- statements ---

    fn parse_program(&mut self) -> Result<Node, Error> {
        let start = self.current_span();
        let statements = self.parse_statement_list(&[Token::Eof])?;
        let end = self.prev_span();
        self.expect(&Token::Eof, "end of input")?;
        Ok(Node::new(NodeKind::Statements(statements), start.to(&end)))
    }

    /// Parses newline-separated statements until one of the terminators.
    fn parse_statement_list(&mut self, terminators: &[Token]) -> Result<Vec<Node>, Error> {
        let mut statements = Vec::new();
        self.skip_newlines();
        while !terminators.iter().any(|t| self.check(t)) {
            statements.push(self.parse_statement()?);
            if !self.check(&Token::Newline) {
                break;
            }
            self.skip_newlines();
        }
        Ok(statements)
    }

    /// Parses a `{ ... }` block body.
    fn parse_block(&mut self) -> Result<Vec<Node>, Error> {
        self.expect(&Token::LBrace, "'{'")?;
        let body = self.parse_statement_list(&[Token::RBrace])?;
        self.expect(&Token::RBrace, "'}'")?;
        Ok(body)
    }

    fn parse_statement(&mut self) -> Result<Node, Error> {
        let start = self.current_span();
        match self.current_token() {
            Token::Return => {
                self.advance();
                let value = if self.check(&Token::Newline)
                    || self.check(&Token::Eof)
                    || self.check(&Token::RBrace)
                {
                    None
                } else {
                    Some(Box::new(self.parse_expr()?))
                };
                Ok(Node::new(NodeKind::Return(value), start.to(&self.prev_span())))
            }
            Token::Break => {
                self.advance();
                Ok(Node::new(NodeKind::Break, start))
            }
            Token::Continue => {
                self.advance();
                Ok(Node::new(NodeKind::Continue, start))
            }
            Token::ContinueOuter => {
                self.advance();
                Ok(Node::new(NodeKind::ContinueOuter, start))
            }
            Token::Let => {
                self.advance();
                let name = self.expect_ident()?;
                self.expect(&Token::Assign, "'='")?;
                let value = self.parse_expr()?;
                Ok(Node::new(
                    NodeKind::Let {
                        name,
                        value: Box::new(value),
                    },
                    start.to(&self.prev_span()),
                ))
            }
            Token::Fun => self.parse_fun(false),
            Token::Class => self.parse_class(),
            Token::If => self.parse_if(),
            Token::While => self.parse_while(),
            Token::For => self.parse_for(),
            _ => {
                let expr = self.parse_expr()?;
                if !self.eat(&Token::Assign) {
                    return Ok(expr);
                }
                let value = Box::new(self.parse_expr()?);
                let span = start.to(&self.prev_span());
                match expr.kind {
                    NodeKind::Ident(name) => Ok(Node::new(NodeKind::Let { name, value }, span)),
                    NodeKind::Index { obj, index } => Ok(Node::new(
                        NodeKind::SetIndex {
                            target: obj,
                            index,
                            value,
                        },
                        span,
                    )),
                    NodeKind::Attr { obj, attr } => Ok(Node::new(
                        NodeKind::SetAttr {
                            target: obj,
                            attr,
                            value,
                        },
                        span,
                    )),
                    _ => Err(Error::new(
                        ErrorKind::InvalidSyntaxError,
                        expr.span,
                        "Invalid assignment target",
                    )),
                }
            }
        }
    }

    fn expect_ident(&mut self) -> Result<Rc<str>, Error> {
        match self.current_token() {
            Token::Ident(name) => {
                let name = Rc::from(name.as_str());
                self.advance();
                Ok(name)
            }
            other => Err(self.syntax_error(format!("Expected identifier, found {}", other.describe()))),
        }
    }

    fn parse_fun(&mut self, anonymous: bool) -> Result<Node, Error> {
        let start = self.current_span();
        self.expect(&Token::Fun, "'fun'")?;
        let name = if matches!(self.current_token(), Token::Ident(_)) {
            Some(self.expect_ident()?)
        } else if anonymous {
            None
        } else {
            return Err(self.syntax_error("Expected function name"));
        };
        self.expect(&Token::LParen, "'('")?;
        let params = self.parse_params()?;
        self.expect(&Token::RParen, "')'")?;

        let (body, auto_return) = if self.eat(&Token::Arrow) {
            let expr = self.parse_expr()?;
            (vec![expr], true)
        } else {
            self.skip_newlines();
            (self.parse_block()?, false)
        };
        Ok(Node::new(
            NodeKind::FunDef {
                name,
                params,
                body,
                auto_return,
            },
            start.to(&self.prev_span()),
        ))
    }

    fn parse_params(&mut self) -> Result<Vec<Param>, Error> {
        let mut params = Vec::new();
        let mut seen_default = false;
        self.skip_newlines();
        while matches!(self.current_token(), Token::Ident(_)) {
            let name = self.expect_ident()?;
            let default = if self.eat(&Token::Assign) {
                seen_default = true;
                Some(self.parse_expr()?)
            } else {
                if seen_default {
                    return Err(self.syntax_error("Parameter without a default follows a defaulted parameter"));
                }
                None
            };
            params.push(Param { name, default });
            if !self.eat(&Token::Comma) {
                break;
            }
            self.skip_newlines();
        }
        self.skip_newlines();
        Ok(params)
    }

    fn parse_class(&mut self) -> Result<Node, Error> {
        let start = self.current_span();
        self.expect(&Token::Class, "'class'")?;
        let name = self.expect_ident()?;
        self.skip_newlines();
        let body = self.parse_block()?;
        Ok(Node::new(NodeKind::ClassDef { name, body }, start.to(&self.prev_span())))
    }

    fn parse_if(&mut self) -> Result<Node, Error> {
        let start = self.current_span();
        self.expect(&Token::If, "'if'")?;
        let mut cases = Vec::new();
        let cond = self.parse_expr()?;
        self.skip_newlines();
        cases.push((cond, self.parse_block()?));

        let mut otherwise = None;
        loop {
            // `elif`/`else` may sit on the line after the closing brace.
            let checkpoint = self.pos;
            self.skip_newlines();
            if self.eat(&Token::Elif) {
                let cond = self.parse_expr()?;
                self.skip_newlines();
                cases.push((cond, self.parse_block()?));
            } else if self.eat(&Token::Else) {
                self.skip_newlines();
                otherwise = Some(self.parse_block()?);
                break;
            } else {
                self.pos = checkpoint;
                break;
            }
        }
        Ok(Node::new(
            NodeKind::If { cases, otherwise },
            start.to(&self.prev_span()),
        ))
    }

    fn parse_while(&mut self) -> Result<Node, Error> {
        let start = self.current_span();
        self.expect(&Token::While, "'while'")?;
        let cond = Box::new(self.parse_expr()?);
        self.skip_newlines();
        let body = self.parse_block()?;
        Ok(Node::new(NodeKind::While { cond, body }, start.to(&self.prev_span())))
    }

    fn parse_for(&mut self) -> Result<Node, Error> {
        let start = self.current_span();
        self.expect(&Token::For, "'for'")?;
        let var = self.expect_ident()?;
        self.expect(&Token::In, "'in'")?;
        let iterable = Box::new(self.parse_expr()?);
        self.skip_newlines();
        let body = self.parse_block()?;
        Ok(Node::new(
            NodeKind::For { var, iterable, body },
            start.to(&self.prev_span()),
        ))
    }

    // --- expressions, loosest binding first ---

    fn parse_expr(&mut self) -> Result<Node, Error> {
        self.enter()?;
        let result = self.parse_or();
        self.leave();
        result
    }

    fn parse_or(&mut self) -> Result<Node, Error> {
        let mut lhs = self.parse_and()?;
        while self.eat(&Token::Or) {
            let rhs = self.parse_and()?;
            lhs = binary(BinaryOp::Or, lhs, rhs);
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> Result<Node, Error> {
        let mut lhs = self.parse_not()?;
        while self.eat(&Token::And) {
            let rhs = self.parse_not()?;
            lhs = binary(BinaryOp::And, lhs, rhs);
        }
        Ok(lhs)
    }

    fn parse_not(&mut self) -> Result<Node, Error> {
        if self.check(&Token::Not) {
            let start = self.current_span();
            self.advance();
            let operand = self.parse_not()?;
            let span = start.to(&operand.span);
            return Ok(Node::new(
                NodeKind::Unary {
                    op: UnaryOp::Not,
                    operand: Box::new(operand),
                },
                span,
            ));
        }
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> Result<Node, Error> {
        let mut lhs = self.parse_arith()?;
        loop {
            let op = match self.current_token() {
                Token::EqEq => BinaryOp::Eq,
                Token::Neq => BinaryOp::Ne,
                Token::Lt => BinaryOp::Lt,
                Token::Gt => BinaryOp::Gt,
                Token::Lte => BinaryOp::Le,
                Token::Gte => BinaryOp::Ge,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_arith()?;
            lhs = binary(op, lhs, rhs);
        }
        Ok(lhs)
    }

    fn parse_arith(&mut self) -> Result<Node, Error> {
        let mut lhs = self.parse_term()?;
        loop {
            let op = match self.current_token() {
                Token::Plus => BinaryOp::Add,
                Token::Minus => BinaryOp::Sub,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_term()?;
            lhs = binary(op, lhs, rhs);
        }
        Ok(lhs)
    }

    fn parse_term(&mut self) -> Result<Node, Error> {
        let mut lhs = self.parse_factor()?;
        loop {
            let op = match self.current_token() {
                Token::Star => BinaryOp::Mul,
                Token::Slash => BinaryOp::Div,
                Token::Percent => BinaryOp::Mod,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_factor()?;
            lhs = binary(op, lhs, rhs);
        }
        Ok(lhs)
    }

    fn parse_factor(&mut self) -> Result<Node, Error> {
        let op = match self.current_token() {
            Token::Minus => Some(UnaryOp::Neg),
            Token::Plus => Some(UnaryOp::Pos),
            _ => None,
        };
        if let Some(op) = op {
            let start = self.current_span();
            self.advance();
            let operand = self.parse_factor()?;
            let span = start.to(&operand.span);
            return Ok(Node::new(
                NodeKind::Unary {
                    op,
                    operand: Box::new(operand),
                },
                span,
            ));
        }
        self.parse_power()
    }

    fn parse_power(&mut self) -> Result<Node, Error> {
        let base = self.parse_postfix()?;
        if self.eat(&Token::Caret) {
            // Right-associative: a ^ b ^ c parses as a ^ (b ^ c).
            let exp = self.parse_factor()?;
            return Ok(binary(BinaryOp::Pow, base, exp));
        }
        Ok(base)
    }

    fn parse_postfix(&mut self) -> Result<Node, Error> {
        let mut node = self.parse_atom()?;
        loop {
            match self.current_token() {
                Token::LParen => {
                    self.advance();
                    let (args, kwargs) = self.parse_call_args()?;
                    self.expect(&Token::RParen, "')'")?;
                    let span = node.span.to(&self.prev_span());
                    node = Node::new(
                        NodeKind::Call {
                            callee: Box::new(node),
                            args,
                            kwargs,
                        },
                        span,
                    );
                }
                Token::LBracket => {
                    self.advance();
                    self.skip_newlines();
                    let index = self.parse_expr()?;
                    self.skip_newlines();
                    self.expect(&Token::RBracket, "']'")?;
                    let span = node.span.to(&self.prev_span());
                    node = Node::new(
                        NodeKind::Index {
                            obj: Box::new(node),
                            index: Box::new(index),
                        },
                        span,
                    );
                }
                Token::Dot => {
                    self.advance();
                    let attr = self.expect_ident()?;
                    let span = node.span.to(&self.prev_span());
                    node = Node::new(
                        NodeKind::Attr {
                            obj: Box::new(node),
                            attr,
                        },
                        span,
                    );
                }
                _ => break,
            }
        }
        Ok(node)
    }

    #[expect(clippy::type_complexity, reason = "positional and keyword argument lists travel together")]
    fn parse_call_args(&mut self) -> Result<(Vec<Node>, Vec<(Rc<str>, Node)>), Error> {
        let mut args = Vec::new();
        let mut kwargs: Vec<(Rc<str>, Node)> = Vec::new();
        self.skip_newlines();
        while !self.check(&Token::RParen) {
            // `name = expr` is a keyword argument; anything else is positional.
            let is_kwarg = matches!(self.current_token(), Token::Ident(_))
                && matches!(self.tokens.get(self.pos + 1).map(|t| &t.token), Some(Token::Assign));
            if is_kwarg {
                let name = self.expect_ident()?;
                self.expect(&Token::Assign, "'='")?;
                let value = self.parse_expr()?;
                kwargs.push((name, value));
            } else {
                if !kwargs.is_empty() {
                    return Err(self.syntax_error("Positional argument follows keyword argument"));
                }
                args.push(self.parse_expr()?);
            }
            if !self.eat(&Token::Comma) {
                break;
            }
            self.skip_newlines();
        }
        self.skip_newlines();
        Ok((args, kwargs))
    }

    fn parse_atom(&mut self) -> Result<Node, Error> {
        self.enter()?;
        let result = self.parse_atom_inner();
        self.leave();
        result
    }

    fn parse_atom_inner(&mut self) -> Result<Node, Error> {
        let start = self.current_span();
        match self.current_token().clone() {
            Token::Int(n) => {
                self.advance();
                Ok(Node::new(NodeKind::Int(n), start))
            }
            Token::Float(n) => {
                self.advance();
                Ok(Node::new(NodeKind::Float(n), start))
            }
            Token::Str(s) => {
                self.advance();
                Ok(Node::new(NodeKind::Str(Rc::from(s.as_str())), start))
            }
            Token::Ident(name) => {
                self.advance();
                Ok(Node::new(NodeKind::Ident(Rc::from(name.as_str())), start))
            }
            Token::LParen => {
                self.advance();
                self.skip_newlines();
                let expr = self.parse_expr()?;
                self.skip_newlines();
                self.expect(&Token::RParen, "')'")?;
                Ok(expr)
            }
            Token::LBracket => {
                self.advance();
                let mut elements = Vec::new();
                self.skip_newlines();
                while !self.check(&Token::RBracket) {
                    elements.push(self.parse_expr()?);
                    if !self.eat(&Token::Comma) {
                        break;
                    }
                    self.skip_newlines();
                }
                self.skip_newlines();
                self.expect(&Token::RBracket, "']'")?;
                Ok(Node::new(NodeKind::Array(elements), start.to(&self.prev_span())))
            }
            Token::LBrace => {
                self.advance();
                let mut pairs = Vec::new();
                self.skip_newlines();
                while !self.check(&Token::RBrace) {
                    let key = self.parse_expr()?;
                    self.expect(&Token::Colon, "':'")?;
                    let value = self.parse_expr()?;
                    pairs.push((key, value));
                    if !self.eat(&Token::Comma) {
                        break;
                    }
                    self.skip_newlines();
                }
                self.skip_newlines();
                self.expect(&Token::RBrace, "'}'")?;
                Ok(Node::new(NodeKind::Map(pairs), start.to(&self.prev_span())))
            }
            Token::Fun => self.parse_fun(true),
            other => Err(self.syntax_error(format!("Expected expression, found {}", other.describe()))),
        }
    }
}

fn binary(op: BinaryOp, lhs: Node, rhs: Node) -> Node {
    let span = lhs.span.to(&rhs.span);
    Node::new(
        NodeKind::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        },
        span,
    )
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::lexer::lex;

    fn parse_src(src: &str) -> Node {
        parse(lex("t.rn", src).unwrap()).unwrap()
    }

    fn first_statement(src: &str) -> NodeKind {
        match parse_src(src).kind {
            NodeKind::Statements(mut stmts) => stmts.remove(0).kind,
            other => panic!("expected statements, got {other:?}"),
        }
    }

    #[test]
    fn precedence_of_arithmetic() {
        // 1 + 2 * 3 parses as 1 + (2 * 3)
        let NodeKind::Binary { op, rhs, .. } = first_statement("1 + 2 * 3") else {
            panic!("expected binary node");
        };
        assert_eq!(op, BinaryOp::Add);
        assert!(matches!(rhs.kind, NodeKind::Binary { op: BinaryOp::Mul, .. }));
    }

    #[test]
    fn power_is_right_associative() {
        let NodeKind::Binary { op, rhs, .. } = first_statement("2 ^ 3 ^ 2") else {
            panic!("expected binary node");
        };
        assert_eq!(op, BinaryOp::Pow);
        assert!(matches!(rhs.kind, NodeKind::Binary { op: BinaryOp::Pow, .. }));
    }

    #[test]
    fn arrow_function_has_auto_return() {
        let NodeKind::FunDef {
            name,
            params,
            auto_return,
            ..
        } = first_statement("fun f(x, y=2) -> x + y")
        else {
            panic!("expected fun def");
        };
        assert_eq!(name.as_deref(), Some("f"));
        assert_eq!(params.len(), 2);
        assert!(params[0].default.is_none());
        assert!(params[1].default.is_some());
        assert!(auto_return);
    }

    #[test]
    fn assignment_targets() {
        assert!(matches!(first_statement("a = 1"), NodeKind::Let { .. }));
        assert!(matches!(first_statement("a[0] = 1"), NodeKind::SetIndex { .. }));
        assert!(matches!(first_statement("a.b = 1"), NodeKind::SetAttr { .. }));
        let err = parse(lex("t.rn", "1 + 2 = 3").unwrap()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidSyntaxError);
        assert_eq!(err.message, "Invalid assignment target");
    }

    #[test]
    fn kwargs_after_positional_only() {
        assert!(matches!(first_statement("f(1, x=2)"), NodeKind::Call { .. }));
        let err = parse(lex("t.rn", "f(x=2, 1)").unwrap()).unwrap_err();
        assert_eq!(err.message, "Positional argument follows keyword argument");
    }

    #[test]
    fn if_elif_else_chain() {
        let NodeKind::If { cases, otherwise } = first_statement("if a { 1 } elif b { 2 } else { 3 }") else {
            panic!("expected if node");
        };
        assert_eq!(cases.len(), 2);
        assert!(otherwise.is_some());
    }

    #[test]
    fn nesting_depth_is_bounded() {
        // Run on a thread with a larger stack: the recursive-descent call chain
        // for ~300 nested parens needs more than the default test-thread stack
        // before the parser's own depth guard can kick in and return cleanly.
        std::thread::Builder::new()
            .stack_size(64 * 1024 * 1024)
            .spawn(|| {
                let deep = format!("{}1{}", "(".repeat(300), ")".repeat(300));
                let err = parse(lex("t.rn", &deep).unwrap()).unwrap_err();
                assert_eq!(err.kind, ErrorKind::InvalidSyntaxError);
            })
            .unwrap()
            .join()
            .unwrap();
    }
}
