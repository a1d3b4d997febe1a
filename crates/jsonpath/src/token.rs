//! Scans a path expression into a flat token stream.
//!
//! Lexemes with a regular shape (whitespace, identifiers, numbers, punctuation and
//! operators) are recognized with `nom`; quoted strings and regex literals are scanned
//! by hand because their escape handling produces decoded text.
use crate::error::{SyntaxError, SyntaxErrorKind};
use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::{tag, take_while, take_while1},
    character::complete::{char, digit1, multispace0, one_of, satisfy},
    combinator::{opt, recognize, value},
};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NumberLit {
    Int(i64),
    UInt(u64),
    Float(f64),
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Root,
    Current,
    Dot,
    DotDot,
    LBracket,
    RBracket,
    LParen,
    RParen,
    Comma,
    Colon,
    Question,
    Star,
    Parent,
    Plus,
    Minus,
    Slash,
    Not,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
    RegexMatch,
    Identifier(String),
    Number(NumberLit),
    String(String),
    Regex { pattern: String, flags: String },
    End,
}

impl TokenKind {
    /// True for tokens after which a `-` is a binary operator rather than a sign.
    fn ends_operand(&self) -> bool {
        matches!(
            self,
            TokenKind::Identifier(_)
                | TokenKind::Number(_)
                | TokenKind::String(_)
                | TokenKind::RParen
                | TokenKind::RBracket
                | TokenKind::Root
                | TokenKind::Current
        )
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            TokenKind::Root => "'$'",
            TokenKind::Current => "'@'",
            TokenKind::Dot => "'.'",
            TokenKind::DotDot => "'..'",
            TokenKind::LBracket => "'['",
            TokenKind::RBracket => "']'",
            TokenKind::LParen => "'('",
            TokenKind::RParen => "')'",
            TokenKind::Comma => "','",
            TokenKind::Colon => "':'",
            TokenKind::Question => "'?'",
            TokenKind::Star => "'*'",
            TokenKind::Parent => "'^^'",
            TokenKind::Plus => "'+'",
            TokenKind::Minus => "'-'",
            TokenKind::Slash => "'/'",
            TokenKind::Not => "'!'",
            TokenKind::Eq => "'=='",
            TokenKind::Ne => "'!='",
            TokenKind::Lt => "'<'",
            TokenKind::Le => "'<='",
            TokenKind::Gt => "'>'",
            TokenKind::Ge => "'>='",
            TokenKind::And => "'&&'",
            TokenKind::Or => "'||'",
            TokenKind::RegexMatch => "'=~'",
            TokenKind::Identifier(name) => return write!(f, "identifier '{name}'"),
            TokenKind::Number(NumberLit::Int(n)) => return write!(f, "number {n}"),
            TokenKind::Number(NumberLit::UInt(n)) => return write!(f, "number {n}"),
            TokenKind::Number(NumberLit::Float(n)) => return write!(f, "number {n}"),
            TokenKind::String(s) => return write!(f, "string '{s}'"),
            TokenKind::Regex { pattern, .. } => return write!(f, "regex /{pattern}/"),
            TokenKind::End => "end of expression",
        };
        f.write_str(symbol)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// Byte offset of the first character of the token.
    pub offset: usize,
}

/// Tokenizes `expr`. The returned stream always ends with a [`TokenKind::End`] token.
pub fn tokenize(expr: &str) -> Result<Vec<Token>, SyntaxError> {
    let mut tokens: Vec<Token> = Vec::new();
    // One entry per open `[` or `(`; true once it holds a filter or an expression.
    let mut groups: Vec<bool> = Vec::new();
    let mut rest = skip_ws(expr);

    while !rest.is_empty() {
        let offset = expr.len() - rest.len();
        let prev = tokens.last().map(|t| &t.kind);
        let after_operand = prev.is_some_and(TokenKind::ends_operand);
        let after_dot = matches!(prev, Some(TokenKind::Dot | TokenKind::DotDot));
        let in_expression = groups.iter().any(|&expression| expression);

        let (remaining, kind) = if rest.starts_with(['\'', '"']) {
            scan_string(rest, offset)?
        } else if rest.starts_with('/') && prev == Some(&TokenKind::RegexMatch) {
            scan_regex(rest, offset)?
        } else if let Some((remaining, name)) = (after_dot && !in_expression)
            .then(|| member_name(rest).ok())
            .flatten()
        {
            (remaining, TokenKind::Identifier(name.to_string()))
        } else if let Ok((remaining, number)) = signed_number(rest, after_operand) {
            (remaining, TokenKind::Number(classify_number(number, offset)?))
        } else if let Ok((remaining, name)) = identifier(rest) {
            (remaining, TokenKind::Identifier(name.to_string()))
        } else if let Ok((remaining, kind)) = symbol(rest) {
            (remaining, kind)
        } else {
            let c = rest.chars().next().unwrap_or_default();
            return Err(SyntaxError::new(offset, SyntaxErrorKind::UnexpectedCharacter(c)));
        };

        match kind {
            TokenKind::LBracket => groups.push(false),
            TokenKind::LParen => groups.push(true),
            TokenKind::Question => {
                if let Some(group) = groups.last_mut() {
                    *group = true;
                }
            }
            TokenKind::RBracket | TokenKind::RParen => {
                groups.pop();
            }
            _ => {}
        }
        tokens.push(Token { kind, offset });
        rest = skip_ws(remaining);
    }

    tokens.push(Token {
        kind: TokenKind::End,
        offset: expr.len(),
    });
    Ok(tokens)
}

fn skip_ws(input: &str) -> &str {
    let parsed: IResult<&str, &str> = multispace0(input);
    parsed.map(|(rest, _)| rest).unwrap_or(input)
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || !c.is_ascii()
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || !c.is_ascii()
}

/// Characters that end an unquoted member name in a path step.
fn is_name_stop(c: char) -> bool {
    c.is_whitespace() || matches!(c, '[' | ']' | '.' | ',' | '^' | '(' | ')' | '\'' | '"')
}

/// An unquoted member name after `.` or `..` outside filters, e.g. `first-name`.
/// Inside filters and index expressions names follow the identifier rule instead.
fn member_name(input: &str) -> IResult<&str, &str> {
    recognize((
        satisfy(|c| c != '*' && !is_name_stop(c)),
        take_while(|c| !is_name_stop(c)),
    ))
    .parse(input)
}

fn identifier(input: &str) -> IResult<&str, &str> {
    recognize((satisfy(is_ident_start), take_while(is_ident_char))).parse(input)
}

/// Recognizes a number lexeme. A leading `-` is part of the literal only when the
/// previous token cannot end an operand.
fn signed_number(input: &str, after_operand: bool) -> IResult<&str, &str> {
    let fraction = (char('.'), digit1);
    let exponent = (one_of("eE"), opt(one_of("+-")), digit1);
    if after_operand {
        recognize((digit1, opt(fraction), opt(exponent))).parse(input)
    } else {
        recognize((opt(char('-')), digit1, opt(fraction), opt(exponent))).parse(input)
    }
}

fn classify_number(lexeme: &str, offset: usize) -> Result<NumberLit, SyntaxError> {
    let invalid = || SyntaxError::new(offset, SyntaxErrorKind::InvalidNumber);
    if lexeme.contains(['.', 'e', 'E']) {
        return lexeme.parse::<f64>().map(NumberLit::Float).map_err(|_| invalid());
    }
    if let Ok(n) = lexeme.parse::<i64>() {
        return Ok(NumberLit::Int(n));
    }
    if let Ok(n) = lexeme.parse::<u64>() {
        return Ok(NumberLit::UInt(n));
    }
    lexeme.parse::<f64>().map(NumberLit::Float).map_err(|_| invalid())
}

fn symbol(input: &str) -> IResult<&str, TokenKind> {
    alt((
        alt((
            value(TokenKind::DotDot, tag("..")),
            value(TokenKind::Eq, tag("==")),
            value(TokenKind::Ne, tag("!=")),
            value(TokenKind::Le, tag("<=")),
            value(TokenKind::Ge, tag(">=")),
            value(TokenKind::And, tag("&&")),
            value(TokenKind::Or, tag("||")),
            value(TokenKind::RegexMatch, tag("=~")),
            value(TokenKind::Parent, tag("^^")),
            value(TokenKind::Parent, tag("^")),
        )),
        alt((
            value(TokenKind::Root, char('$')),
            value(TokenKind::Current, char('@')),
            value(TokenKind::Dot, char('.')),
            value(TokenKind::LBracket, char('[')),
            value(TokenKind::RBracket, char(']')),
            value(TokenKind::LParen, char('(')),
            value(TokenKind::RParen, char(')')),
            value(TokenKind::Comma, char(',')),
            value(TokenKind::Colon, char(':')),
            value(TokenKind::Question, char('?')),
            value(TokenKind::Star, char('*')),
            value(TokenKind::Plus, char('+')),
            value(TokenKind::Minus, char('-')),
            value(TokenKind::Slash, char('/')),
            value(TokenKind::Lt, char('<')),
            value(TokenKind::Gt, char('>')),
            value(TokenKind::Not, char('!')),
        )),
    ))
    .parse(input)
}

fn scan_string(input: &str, offset: usize) -> Result<(&str, TokenKind), SyntaxError> {
    let mut chars = input.char_indices();
    let quote = chars.next().map(|(_, c)| c).unwrap_or('\'');
    let mut out = String::new();

    while let Some((i, c)) = chars.next() {
        match c {
            c if c == quote => return Ok((&input[i + c.len_utf8()..], TokenKind::String(out))),
            '\\' => {
                let escape_at = offset + i;
                let invalid = || SyntaxError::new(escape_at, SyntaxErrorKind::InvalidEscape);
                let (_, e) = chars
                    .next()
                    .ok_or_else(|| SyntaxError::new(offset, SyntaxErrorKind::UnterminatedString))?;
                match e {
                    '\'' | '"' | '\\' | '/' => out.push(e),
                    'b' => out.push('\u{0008}'),
                    'f' => out.push('\u{000C}'),
                    'n' => out.push('\n'),
                    'r' => out.push('\r'),
                    't' => out.push('\t'),
                    'u' => {
                        let high = read_hex4(&mut chars).ok_or_else(invalid)?;
                        let code = if (0xD800..0xDC00).contains(&high) {
                            let backslash = chars.next().map(|(_, c)| c);
                            let u = chars.next().map(|(_, c)| c);
                            if backslash != Some('\\') || u != Some('u') {
                                return Err(invalid());
                            }
                            let low = read_hex4(&mut chars).ok_or_else(invalid)?;
                            if !(0xDC00..0xE000).contains(&low) {
                                return Err(invalid());
                            }
                            0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00)
                        } else {
                            high
                        };
                        out.push(char::from_u32(code).ok_or_else(invalid)?);
                    }
                    _ => return Err(invalid()),
                }
            }
            _ => out.push(c),
        }
    }
    Err(SyntaxError::new(offset, SyntaxErrorKind::UnterminatedString))
}

fn read_hex4(chars: &mut std::str::CharIndices<'_>) -> Option<u32> {
    let mut code = 0;
    for _ in 0..4 {
        let (_, c) = chars.next()?;
        code = code * 16 + c.to_digit(16)?;
    }
    Some(code)
}

fn scan_regex(input: &str, offset: usize) -> Result<(&str, TokenKind), SyntaxError> {
    let mut pattern = String::new();
    let mut chars = input.char_indices().skip(1);

    while let Some((i, c)) = chars.next() {
        match c {
            '/' => {
                let rest = &input[i + 1..];
                let flags: IResult<&str, &str> = take_while1(|c: char| c.is_ascii_alphabetic()).parse(rest);
                let (rest, flags) = flags.unwrap_or((rest, ""));
                return Ok((
                    rest,
                    TokenKind::Regex {
                        pattern,
                        flags: flags.to_string(),
                    },
                ));
            }
            '\\' => match chars.next() {
                Some((_, '/')) => pattern.push('/'),
                Some((_, e)) => {
                    pattern.push('\\');
                    pattern.push(e);
                }
                None => break,
            },
            _ => pattern.push(c),
        }
    }
    Err(SyntaxError::new(offset, SyntaxErrorKind::UnterminatedRegex))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(expr: &str) -> Vec<TokenKind> {
        tokenize(expr).unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_simple_path() {
        assert_eq!(
            kinds("$.store..book[0]"),
            vec![
                TokenKind::Root,
                TokenKind::Dot,
                TokenKind::Identifier("store".into()),
                TokenKind::DotDot,
                TokenKind::Identifier("book".into()),
                TokenKind::LBracket,
                TokenKind::Number(NumberLit::Int(0)),
                TokenKind::RBracket,
                TokenKind::End,
            ]
        );
    }

    #[test]
    fn test_minus_is_sign_or_operator_by_context() {
        assert_eq!(
            kinds("[-1:]")[1],
            TokenKind::Number(NumberLit::Int(-1)),
        );
        assert_eq!(
            kinds("(@.length-1)")[4..6],
            [TokenKind::Minus, TokenKind::Number(NumberLit::Int(1))]
        );
        assert_eq!(
            kinds("(@.a - 2)")[3..5],
            [TokenKind::Minus, TokenKind::Number(NumberLit::Int(2))]
        );
    }

    #[test]
    fn test_member_names_in_paths_and_filters() {
        assert_eq!(
            kinds("$.first-name..x:y")[..5],
            [
                TokenKind::Root,
                TokenKind::Dot,
                TokenKind::Identifier("first-name".into()),
                TokenKind::DotDot,
                TokenKind::Identifier("x:y".into()),
            ]
        );
        assert_eq!(kinds("$.a-b[0]")[2..4], [TokenKind::Identifier("a-b".into()), TokenKind::LBracket]);
        assert_eq!(kinds("$.*")[2], TokenKind::Star);
        assert_eq!(
            kinds("$[?(@.a-b)]")[6..9],
            [
                TokenKind::Identifier("a".into()),
                TokenKind::Minus,
                TokenKind::Identifier("b".into()),
            ]
        );
        assert_eq!(kinds("$[?(@.a)].b-c")[10], TokenKind::Identifier("b-c".into()));
    }

    #[test]
    fn test_numbers() {
        assert_eq!(kinds("2.5e3")[0], TokenKind::Number(NumberLit::Float(2500.0)));
        assert_eq!(
            kinds("18446744073709551615")[0],
            TokenKind::Number(NumberLit::UInt(u64::MAX))
        );
    }

    #[test]
    fn test_string_escapes() {
        assert_eq!(
            kinds(r#"'it\'s' "aé\n""#)[..2],
            [
                TokenKind::String("it's".into()),
                TokenKind::String("a\u{e9}\n".into()),
            ]
        );
        assert_eq!(kinds(r"'\uD83D\uDE00'")[0], TokenKind::String("\u{1F600}".into()));
    }

    #[test]
    fn test_regex_only_after_match_operator() {
        assert_eq!(
            kinds(r"@.a =~ /ab\/c/i")[3],
            TokenKind::Regex {
                pattern: "ab/c".into(),
                flags: "i".into(),
            }
        );
        assert_eq!(kinds("@.a / 2")[3], TokenKind::Slash);
    }

    #[test]
    fn test_parent_spellings() {
        assert_eq!(kinds("@^^")[1], TokenKind::Parent);
        assert_eq!(kinds("@^")[1], TokenKind::Parent);
    }

    #[test]
    fn test_errors_carry_offsets() {
        let err = tokenize("$['abc").unwrap_err();
        assert_eq!(err.offset, 2);
        assert_eq!(err.kind, SyntaxErrorKind::UnterminatedString);

        let err = tokenize("$.a =~ /abc").unwrap_err();
        assert_eq!(err.kind, SyntaxErrorKind::UnterminatedRegex);

        let err = tokenize("$.a # b").unwrap_err();
        assert_eq!(err, SyntaxError::new(4, SyntaxErrorKind::UnexpectedCharacter('#')));

        let err = tokenize(r"'\q'").unwrap_err();
        assert_eq!(err.kind, SyntaxErrorKind::InvalidEscape);
    }
}
