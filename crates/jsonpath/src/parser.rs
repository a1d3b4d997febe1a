//! A recursive-descent parser over the token stream.
//!
//! Selector pipelines are parsed step by step; filter and index expressions use
//! precedence climbing driven by [`BinaryOp::precedence`].
use crate::ast::{BinaryOp, Literal, Selector, Term, UnaryOp};
use crate::error::{SyntaxError, SyntaxErrorKind};
use crate::token::{NumberLit, Token, TokenKind, tokenize};
use regex::Regex;

// --- Main Public Parsers ---

/// Tokenizes and parses a complete path expression.
pub fn parse_path(expr: &str) -> Result<Vec<Selector>, SyntaxError> {
    let tokens = tokenize(expr)?;
    parse(&tokens)
}

/// Parses a token stream into a selector pipeline anchored at `$`.
pub fn parse(tokens: &[Token]) -> Result<Vec<Selector>, SyntaxError> {
    let mut parser = TokenParser::new(tokens);
    let pipeline = match parser.peek() {
        TokenKind::Root => parser.pipeline()?,
        TokenKind::Current => {
            return Err(SyntaxError::new(
                parser.offset(),
                SyntaxErrorKind::CurrentNodeAtTopLevel,
            ));
        }
        _ => return Err(parser.unexpected("'$'")),
    };
    parser.expect_end()?;
    Ok(pipeline)
}

/// Parses a token stream holding a single filter expression.
pub fn parse_expr(tokens: &[Token]) -> Result<Term, SyntaxError> {
    let mut parser = TokenParser::new(tokens);
    let term = parser.expression(1)?;
    parser.expect_end()?;
    Ok(term)
}

/// Compiles a regex literal, mapping its trailing flags onto inline flags.
pub fn build_regex(pattern: &str, flags: &str) -> Result<Regex, regex::Error> {
    let mut regex_pattern = String::new();

    if flags.contains('i') {
        regex_pattern.push_str("(?i)");
    }
    if flags.contains('m') {
        regex_pattern.push_str("(?m)");
    }
    if flags.contains('s') {
        regex_pattern.push_str("(?s)");
    }
    if flags.contains('x') {
        regex_pattern.push_str("(?x)");
    }

    regex_pattern.push_str(pattern);
    Regex::new(&regex_pattern)
}

struct TokenParser<'t> {
    tokens: &'t [Token],
    pos: usize,
}

impl<'t> TokenParser<'t> {
    fn new(tokens: &'t [Token]) -> Self {
        Self { tokens, pos: 0 }
    }

    fn peek(&self) -> &'t TokenKind {
        self.peek_at(0)
    }

    fn peek_at(&self, ahead: usize) -> &'t TokenKind {
        self.tokens
            .get(self.pos + ahead)
            .or_else(|| self.tokens.last())
            .map(|t| &t.kind)
            .unwrap_or(&TokenKind::End)
    }

    fn offset(&self) -> usize {
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .map(|t| t.offset)
            .unwrap_or(0)
    }

    fn advance(&mut self) -> &'t TokenKind {
        let kind = self.peek();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        kind
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.peek() == kind {
            self.advance();
            true
        } else {
            false
        }
    }

    fn unexpected(&self, expected: &str) -> SyntaxError {
        match self.peek() {
            TokenKind::End => SyntaxError::unexpected_end(self.offset(), expected),
            found => SyntaxError::unexpected(self.offset(), expected, found.to_string()),
        }
    }

    fn expect(&mut self, kind: &TokenKind) -> Result<(), SyntaxError> {
        if self.eat(kind) {
            Ok(())
        } else {
            Err(self.unexpected(&kind.to_string()))
        }
    }

    fn expect_end(&self) -> Result<(), SyntaxError> {
        match self.peek() {
            TokenKind::End => Ok(()),
            _ => Err(self.unexpected("end of expression")),
        }
    }

    // --- Path/Selection Parser ---

    /// `'$' Step*` or `'@' Step*`.
    fn pipeline(&mut self) -> Result<Vec<Selector>, SyntaxError> {
        let anchor = match self.advance() {
            TokenKind::Root => Selector::Root,
            _ => Selector::Current,
        };
        let mut selectors = vec![anchor];
        self.steps(&mut selectors)?;
        Ok(selectors)
    }

    fn steps(&mut self, selectors: &mut Vec<Selector>) -> Result<(), SyntaxError> {
        loop {
            match self.peek() {
                TokenKind::Dot => {
                    self.advance();
                    let selector = match self.advance() {
                        TokenKind::Identifier(name) | TokenKind::String(name) => {
                            Selector::Member(name.clone())
                        }
                        TokenKind::Star => Selector::Wildcard,
                        TokenKind::Number(NumberLit::Int(n)) if *n >= 0 => {
                            Selector::Member(n.to_string())
                        }
                        _ => {
                            self.pos -= 1;
                            return Err(self.unexpected("member name"));
                        }
                    };
                    selectors.push(selector);
                }
                TokenKind::DotDot => {
                    self.advance();
                    selectors.push(Selector::RecursiveDescent);
                    match self.peek() {
                        TokenKind::Identifier(name) | TokenKind::String(name) => {
                            selectors.push(Selector::Member(name.clone()));
                            self.advance();
                        }
                        TokenKind::Star => {
                            selectors.push(Selector::Wildcard);
                            self.advance();
                        }
                        _ => {}
                    }
                }
                TokenKind::LBracket => {
                    self.advance();
                    let selector = self.bracket()?;
                    selectors.push(selector);
                }
                TokenKind::Parent => {
                    self.advance();
                    selectors.push(Selector::Parent);
                }
                _ => return Ok(()),
            }
        }
    }

    /// The contents of `[...]` after the opening bracket, up to and including `]`.
    fn bracket(&mut self) -> Result<Selector, SyntaxError> {
        let mut items = vec![self.bracket_item()?];
        while self.eat(&TokenKind::Comma) {
            items.push(self.bracket_item()?);
        }
        self.expect(&TokenKind::RBracket)?;

        if items.len() == 1 && items[0].len() == 1 {
            let is_anchor = matches!(items[0][0], Selector::Root | Selector::Current);
            if !is_anchor {
                if let Some(selector) = items.pop().and_then(|mut item| item.pop()) {
                    return Ok(selector);
                }
            }
        }
        Ok(Selector::Union(items))
    }

    fn bracket_item(&mut self) -> Result<Vec<Selector>, SyntaxError> {
        let item = match self.peek() {
            TokenKind::Star => {
                self.advance();
                Selector::Wildcard
            }
            TokenKind::String(name) => {
                self.advance();
                Selector::Member(name.clone())
            }
            TokenKind::Number(_) | TokenKind::Colon => self.index_or_slice()?,
            TokenKind::Question => {
                self.advance();
                let empty = match self.peek() {
                    TokenKind::RBracket | TokenKind::End => true,
                    TokenKind::LParen => self.peek_at(1) == &TokenKind::RParen,
                    _ => false,
                };
                if empty {
                    return Err(SyntaxError::new(self.offset(), SyntaxErrorKind::EmptyFilter));
                }
                Selector::Filter(self.expression(1)?)
            }
            TokenKind::LParen => Selector::ExpressionIndex(self.expression(1)?),
            TokenKind::Root | TokenKind::Current => return self.pipeline(),
            _ => return Err(self.unexpected("bracket selector")),
        };
        Ok(vec![item])
    }

    fn integer(&mut self) -> Result<Option<i64>, SyntaxError> {
        match self.peek() {
            TokenKind::Number(NumberLit::Int(n)) => {
                self.advance();
                Ok(Some(*n))
            }
            TokenKind::Number(_) => Err(SyntaxError::new(self.offset(), SyntaxErrorKind::InvalidNumber)),
            _ => Ok(None),
        }
    }

    /// `Index` or `start? ':' stop? (':' step?)?`.
    fn index_or_slice(&mut self) -> Result<Selector, SyntaxError> {
        let start = self.integer()?;
        if !self.eat(&TokenKind::Colon) {
            return start.map(Selector::Index).ok_or_else(|| self.unexpected("index"));
        }
        let stop = self.integer()?;
        let mut step = None;
        if self.eat(&TokenKind::Colon) {
            let step_offset = self.offset();
            step = self.integer()?;
            if step == Some(0) {
                return Err(SyntaxError::new(step_offset, SyntaxErrorKind::ZeroSliceStep));
            }
        }
        Ok(Selector::Slice { start, stop, step })
    }

    // --- Filter Expression Parser ---

    fn peek_binary_op(&self) -> Option<BinaryOp> {
        let op = match self.peek() {
            TokenKind::Or => BinaryOp::Or,
            TokenKind::And => BinaryOp::And,
            TokenKind::Eq => BinaryOp::Eq,
            TokenKind::Ne => BinaryOp::Ne,
            TokenKind::Lt => BinaryOp::Lt,
            TokenKind::Le => BinaryOp::Le,
            TokenKind::Gt => BinaryOp::Gt,
            TokenKind::Ge => BinaryOp::Ge,
            TokenKind::Plus => BinaryOp::Add,
            TokenKind::Minus => BinaryOp::Sub,
            TokenKind::Star => BinaryOp::Mul,
            TokenKind::Slash => BinaryOp::Div,
            TokenKind::RegexMatch => BinaryOp::RegexMatch,
            _ => return None,
        };
        Some(op)
    }

    fn expression(&mut self, min_precedence: u8) -> Result<Term, SyntaxError> {
        let mut lhs = self.unary()?;
        while let Some(op) = self.peek_binary_op() {
            let precedence = op.precedence();
            if precedence < min_precedence {
                break;
            }
            self.advance();
            let rhs = match (op, self.peek()) {
                (BinaryOp::RegexMatch, TokenKind::Regex { pattern, flags }) => {
                    let offset = self.offset();
                    self.advance();
                    let regex = build_regex(pattern, flags).map_err(|e| {
                        SyntaxError::new(offset, SyntaxErrorKind::InvalidRegex(e.to_string()))
                    })?;
                    Term::Regex(regex)
                }
                _ => self.expression(precedence + 1)?,
            };
            lhs = Term::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    fn unary(&mut self) -> Result<Term, SyntaxError> {
        let op = match self.peek() {
            TokenKind::Not => UnaryOp::Not,
            TokenKind::Minus => UnaryOp::Neg,
            _ => return self.primary(),
        };
        self.advance();
        let operand = self.unary()?;
        Ok(Term::Unary {
            op,
            operand: Box::new(operand),
        })
    }

    fn primary(&mut self) -> Result<Term, SyntaxError> {
        let term = match self.peek() {
            TokenKind::LParen => {
                self.advance();
                let inner = self.expression(1)?;
                self.expect(&TokenKind::RParen)?;
                inner
            }
            TokenKind::Number(n) => {
                self.advance();
                Term::Value(match *n {
                    NumberLit::Int(n) => Literal::Int(n),
                    NumberLit::UInt(n) => Literal::UInt(n),
                    NumberLit::Float(n) => Literal::Float(n),
                })
            }
            TokenKind::String(s) => {
                self.advance();
                Term::Value(Literal::String(s.clone()))
            }
            TokenKind::Root | TokenKind::Current => Term::Path(self.pipeline()?),
            TokenKind::Identifier(name) if self.peek_at(1) == &TokenKind::LParen => {
                self.advance();
                self.advance();
                self.function_call(name)?
            }
            TokenKind::Identifier(name) => {
                let literal = match name.as_str() {
                    "true" => Literal::Bool(true),
                    "false" => Literal::Bool(false),
                    "null" => Literal::Null,
                    _ => return Err(self.unexpected("expression")),
                };
                self.advance();
                Term::Value(literal)
            }
            _ => return Err(self.unexpected("expression")),
        };
        Ok(term)
    }

    /// Arguments and closing parenthesis of a call, then any postfix steps.
    fn function_call(&mut self, name: &str) -> Result<Term, SyntaxError> {
        let mut args = Vec::new();
        if !self.eat(&TokenKind::RParen) {
            args.push(self.expression(1)?);
            while self.eat(&TokenKind::Comma) {
                args.push(self.expression(1)?);
            }
            self.expect(&TokenKind::RParen)?;
        }
        let mut postfix = Vec::new();
        self.steps(&mut postfix)?;
        Ok(Term::Function {
            name: name.to_string(),
            args,
            postfix,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter_term(expr: &str) -> Term {
        parse_expr(&tokenize(expr).unwrap()).unwrap()
    }

    #[test]
    fn test_parse_dotted_path() {
        let pipeline = parse_path("$.store.book[*].author").unwrap();
        assert!(matches!(
            pipeline.as_slice(),
            [
                Selector::Root,
                Selector::Member(a),
                Selector::Member(b),
                Selector::Wildcard,
                Selector::Member(c),
            ] if a == "store" && b == "book" && c == "author"
        ));
    }

    #[test]
    fn test_parse_recursive_descent_forms() {
        let pipeline = parse_path("$..author").unwrap();
        assert!(matches!(
            pipeline.as_slice(),
            [Selector::Root, Selector::RecursiveDescent, Selector::Member(name)] if name == "author"
        ));

        let pipeline = parse_path("$..[0]").unwrap();
        assert!(matches!(
            pipeline.as_slice(),
            [Selector::Root, Selector::RecursiveDescent, Selector::Index(0)]
        ));

        let pipeline = parse_path("$..").unwrap();
        assert_eq!(pipeline.len(), 2);
    }

    #[test]
    fn test_parse_slices() {
        let pipeline = parse_path("$[1:-1:2]").unwrap();
        assert!(matches!(
            pipeline[1],
            Selector::Slice {
                start: Some(1),
                stop: Some(-1),
                step: Some(2)
            }
        ));
        let pipeline = parse_path("$[::-1]").unwrap();
        assert!(matches!(
            pipeline[1],
            Selector::Slice {
                start: None,
                stop: None,
                step: Some(-1)
            }
        ));
        let pipeline = parse_path("$[:2]").unwrap();
        assert!(matches!(
            pipeline[1],
            Selector::Slice {
                start: None,
                stop: Some(2),
                step: None
            }
        ));
    }

    #[test]
    fn test_parse_union_keeps_item_order() {
        let pipeline = parse_path("$['x', 'y', 0, @.z]").unwrap();
        let Selector::Union(items) = &pipeline[1] else {
            panic!("expected union, got {:?}", pipeline[1]);
        };
        assert_eq!(items.len(), 4);
        assert!(matches!(items[0].as_slice(), [Selector::Member(x)] if x == "x"));
        assert!(matches!(items[1].as_slice(), [Selector::Member(y)] if y == "y"));
        assert!(matches!(items[2].as_slice(), [Selector::Index(0)]));
        assert!(matches!(items[3].as_slice(), [Selector::Current, Selector::Member(z)] if z == "z"));
    }

    #[test]
    fn test_precedence_climbing() {
        // 1 + 2 * 3 == 7 parses as (1 + (2 * 3)) == 7
        let term = filter_term("1 + 2 * 3 == 7");
        let Term::Binary { op: BinaryOp::Eq, lhs, .. } = term else {
            panic!("expected ==");
        };
        let Term::Binary { op: BinaryOp::Add, rhs, .. } = *lhs else {
            panic!("expected +");
        };
        assert!(matches!(*rhs, Term::Binary { op: BinaryOp::Mul, .. }));

        // a || b && c parses as a || (b && c)
        let term = filter_term("@.a || @.b && @.c");
        assert!(matches!(
            term,
            Term::Binary { op: BinaryOp::Or, rhs, .. } if matches!(*rhs, Term::Binary { op: BinaryOp::And, .. })
        ));
    }

    #[test]
    fn test_left_associativity() {
        // 8 - 4 - 2 parses as (8 - 4) - 2
        let term = filter_term("8 - 4 - 2");
        let Term::Binary { op: BinaryOp::Sub, lhs, rhs } = term else {
            panic!("expected -");
        };
        assert!(matches!(*lhs, Term::Binary { op: BinaryOp::Sub, .. }));
        assert!(matches!(*rhs, Term::Value(Literal::Int(2))));
    }

    #[test]
    fn test_unary_binds_tighter() {
        let term = filter_term("!@.a && @.b");
        assert!(matches!(
            term,
            Term::Binary { op: BinaryOp::And, lhs, .. } if matches!(*lhs, Term::Unary { op: UnaryOp::Not, .. })
        ));
    }

    #[test]
    fn test_function_call_with_postfix() {
        let term = filter_term("tokenize(@.name, ' ')[-1] == 'Smith'");
        let Term::Binary { lhs, .. } = term else {
            panic!("expected comparison");
        };
        let Term::Function { name, args, postfix } = *lhs else {
            panic!("expected function call");
        };
        assert_eq!(name, "tokenize");
        assert_eq!(args.len(), 2);
        assert!(matches!(postfix.as_slice(), [Selector::Index(-1)]));
    }

    #[test]
    fn test_regex_literal() {
        let term = filter_term("@.name =~ /^j.*/i");
        let Term::Binary { op: BinaryOp::RegexMatch, rhs, .. } = term else {
            panic!("expected =~");
        };
        let Term::Regex(regex) = *rhs else {
            panic!("expected regex");
        };
        assert!(regex.is_match("John"));
    }

    #[test]
    fn test_expression_index_and_parent() {
        let pipeline = parse_path("$.books[(@.length - 1)]^^").unwrap();
        assert!(matches!(pipeline[2], Selector::ExpressionIndex(_)));
        assert!(matches!(pipeline[3], Selector::Parent));
    }

    #[test]
    fn test_syntax_errors() {
        let err = parse_path("$[?()]").unwrap_err();
        assert_eq!(err.kind, SyntaxErrorKind::EmptyFilter);

        let err = parse_path("$[1:2:0]").unwrap_err();
        assert_eq!(err.kind, SyntaxErrorKind::ZeroSliceStep);
        assert_eq!(err.offset, 6);

        let err = parse_path("$['a'").unwrap_err();
        assert!(matches!(err.kind, SyntaxErrorKind::UnexpectedEnd { .. }));

        let err = parse_path("@.a").unwrap_err();
        assert_eq!(err.kind, SyntaxErrorKind::CurrentNodeAtTopLevel);

        let err = parse_path("$.a]").unwrap_err();
        assert_eq!(err.offset, 3);

        let err = parse_path("$[?(@.a =~ /(/)]").unwrap_err();
        assert!(matches!(err.kind, SyntaxErrorKind::InvalidRegex(_)));
    }
}
