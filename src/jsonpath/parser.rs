//! JSONPath expression parser
//!
//! Hand-written recursive descent over the expression characters. Follows
//! RFC 9535 segment/selector syntax plus the Jayway habits found in existing
//! bindings: implicit root, `[?(...)]` filters, dashes in dotted names and a
//! trailing function call such as `.length()`.

use super::ast::{CompareOp, FilterExpr, Operand, PathFunction, QueryPath, Segment, Selector};
use super::PathError;
use serde_json::{Number, Value};

/// Filters, negations and parentheses nested deeper than this are rejected
const MAX_NESTING: usize = 128;

/// A parsed expression: segments plus an optional trailing function
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ParsedPath {
    pub segments: Vec<Segment>,
    pub function: Option<PathFunction>,
}

/// Parse a full path expression
pub(crate) fn parse(expression: &str) -> Result<ParsedPath, PathError> {
    let trimmed = expression.trim();
    if trimmed.is_empty() {
        return Err(PathError::Empty);
    }

    // Bare names and brackets get an implicit root
    let (source, prefix_len) = match trimmed.chars().next() {
        Some('$') => (trimmed.to_string(), 0),
        Some('@') => {
            return Err(PathError::syntax(
                expression,
                0,
                "current node identifier '@' is only valid within filter expressions",
            ))
        }
        Some('[') => (format!("${}", trimmed), 1),
        _ => (format!("$.{}", trimmed), 2),
    };

    let mut parser = Parser {
        expression,
        chars: source.chars().collect(),
        pos: 0,
        prefix_len,
        depth: 0,
    };
    parser.expect('$')?;
    let mut segments = parser.parse_segments()?;
    let function = parser.parse_function(&mut segments)?;
    if let Some(c) = parser.peek() {
        return Err(parser.error(format!("unexpected character '{}'", c)));
    }
    Ok(ParsedPath { segments, function })
}

struct Parser<'a> {
    expression: &'a str,
    chars: Vec<char>,
    pos: usize,
    prefix_len: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn starts_with(&self, text: &str) -> bool {
        text.chars()
            .enumerate()
            .all(|(i, c)| self.peek_at(i) == Some(c))
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(' ' | '\t' | '\n' | '\r')) {
            self.pos += 1;
        }
    }

    fn expect(&mut self, expected: char) -> Result<(), PathError> {
        match self.peek() {
            Some(c) if c == expected => {
                self.pos += 1;
                Ok(())
            }
            Some(c) => Err(self.error(format!("expected '{}', found '{}'", expected, c))),
            None => Err(self.error(format!("expected '{}', found end of expression", expected))),
        }
    }

    fn error(&self, message: impl Into<String>) -> PathError {
        PathError::syntax(
            self.expression,
            self.pos.saturating_sub(self.prefix_len),
            message,
        )
    }

    /// Run `parse` one nesting level deeper
    fn nested<T>(&mut self, parse: impl FnOnce(&mut Self) -> Result<T, PathError>) -> Result<T, PathError> {
        if self.depth >= MAX_NESTING {
            return Err(self.error(format!("expression nested deeper than {} levels", MAX_NESTING)));
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    /// `name()` after the last segment; the name segment becomes the function
    fn parse_function(&mut self, segments: &mut Vec<Segment>) -> Result<Option<PathFunction>, PathError> {
        if self.peek() != Some('(') {
            return Ok(None);
        }
        let name = match segments.last() {
            Some(Segment::Child(selectors)) => match selectors.as_slice() {
                [Selector::Name(name)] => name.clone(),
                _ => return Err(self.error("function call must follow a dotted name")),
            },
            _ => return Err(self.error("function call must follow a dotted name")),
        };
        let Some(function) = PathFunction::from_name(&name) else {
            return Err(self.error(format!("unsupported function '{}()'", name)));
        };
        self.pos += 1;
        self.skip_whitespace();
        if self.peek() != Some(')') {
            return Err(self.error(format!("function '{}()' takes no arguments", name)));
        }
        self.pos += 1;
        segments.pop();
        Ok(Some(function))
    }

    /// Segments until a character that cannot start one
    fn parse_segments(&mut self) -> Result<Vec<Segment>, PathError> {
        let mut segments = Vec::new();
        loop {
            match self.peek() {
                Some('.') if self.peek_at(1) == Some('.') => {
                    self.pos += 2;
                    segments.push(Segment::Descendant(self.parse_descendant()?));
                }
                Some('.') => {
                    self.pos += 1;
                    segments.push(Segment::Child(self.parse_dotted()?));
                }
                Some('[') => segments.push(Segment::Child(self.parse_bracket()?)),
                _ => return Ok(segments),
            }
        }
    }

    fn parse_descendant(&mut self) -> Result<Vec<Selector>, PathError> {
        match self.peek() {
            Some('[') => self.parse_bracket(),
            Some('*') => {
                self.pos += 1;
                Ok(vec![Selector::Wildcard])
            }
            Some(c) if is_name_char(c) => Ok(vec![Selector::Name(self.parse_name())]),
            _ => Err(self.error("descendant segment '..' must be followed by a name, '*' or '['")),
        }
    }

    fn parse_dotted(&mut self) -> Result<Vec<Selector>, PathError> {
        match self.peek() {
            Some('*') => {
                self.pos += 1;
                Ok(vec![Selector::Wildcard])
            }
            Some('[') => self.parse_bracket(),
            Some(c) if is_name_char(c) => Ok(vec![Selector::Name(self.parse_name())]),
            None => Err(self.error("incomplete property access (ends with '.')")),
            Some(c) => Err(self.error(format!("unexpected character '{}' after '.'", c))),
        }
    }

    fn parse_name(&mut self) -> String {
        let start = self.pos;
        while self.peek().is_some_and(is_name_char) {
            self.pos += 1;
        }
        self.chars[start..self.pos].iter().collect()
    }

    fn parse_bracket(&mut self) -> Result<Vec<Selector>, PathError> {
        self.expect('[')?;
        self.skip_whitespace();

        if self.peek() == Some('?') {
            self.pos += 1;
            let filter = self.nested(Self::parse_or)?;
            self.skip_whitespace();
            self.expect(']')?;
            return Ok(vec![Selector::Filter(filter)]);
        }

        let mut selectors = Vec::new();
        loop {
            self.skip_whitespace();
            let selector = match self.peek() {
                Some(quote @ ('\'' | '"')) => Selector::Name(self.parse_string(quote)?),
                Some('*') => {
                    self.pos += 1;
                    Selector::Wildcard
                }
                Some(c) if c == '-' || c == ':' || c.is_ascii_digit() => {
                    self.parse_index_or_slice()?
                }
                Some(']') => return Err(self.error("empty bracket selector")),
                Some(c) => return Err(self.error(format!("unexpected character '{}' in brackets", c))),
                None => return Err(self.error("unterminated bracket selector")),
            };
            selectors.push(selector);

            self.skip_whitespace();
            match self.peek() {
                Some(',') => self.pos += 1,
                Some(']') => {
                    self.pos += 1;
                    return Ok(selectors);
                }
                Some(c) => return Err(self.error(format!("expected ',' or ']', found '{}'", c))),
                None => return Err(self.error("unterminated bracket selector")),
            }
        }
    }

    fn parse_index_or_slice(&mut self) -> Result<Selector, PathError> {
        let start = self.parse_integer()?;
        self.skip_whitespace();
        if self.peek() != Some(':') {
            return start
                .map(Selector::Index)
                .ok_or_else(|| self.error("expected array index"));
        }

        self.pos += 1;
        self.skip_whitespace();
        let end = self.parse_integer()?;
        self.skip_whitespace();
        let step = if self.peek() == Some(':') {
            self.pos += 1;
            self.skip_whitespace();
            self.parse_integer()?
        } else {
            None
        };
        Ok(Selector::Slice { start, end, step })
    }

    fn parse_integer(&mut self) -> Result<Option<i64>, PathError> {
        let start = self.pos;
        if self.peek() == Some('-') {
            self.pos += 1;
        }
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.pos += 1;
        }
        if self.pos == start {
            return Ok(None);
        }
        let text: String = self.chars[start..self.pos].iter().collect();
        text.parse::<i64>()
            .map(Some)
            .map_err(|_| self.error(format!("invalid integer '{}'", text)))
    }

    fn parse_string(&mut self, quote: char) -> Result<String, PathError> {
        self.expect(quote)?;
        let mut value = String::new();
        loop {
            match self.peek() {
                None => return Err(self.error("unterminated string literal")),
                Some(c) if c == quote => {
                    self.pos += 1;
                    return Ok(value);
                }
                Some('\\') => {
                    self.pos += 1;
                    value.push(self.parse_escape()?);
                }
                Some(c) => {
                    self.pos += 1;
                    value.push(c);
                }
            }
        }
    }

    fn parse_escape(&mut self) -> Result<char, PathError> {
        let Some(c) = self.peek() else {
            return Err(self.error("unterminated escape sequence"));
        };
        self.pos += 1;
        let escaped = match c {
            'n' => '\n',
            't' => '\t',
            'r' => '\r',
            'b' => '\u{8}',
            'f' => '\u{c}',
            '/' | '\\' | '\'' | '"' => c,
            'u' => {
                let high = self.parse_hex4()?;
                if (0xD800..0xDC00).contains(&high) && self.starts_with("\\u") {
                    self.pos += 2;
                    let low = self.parse_hex4()?;
                    let combined = 0x10000 + ((high - 0xD800) << 10) + (low.wrapping_sub(0xDC00) & 0x3FF);
                    return char::from_u32(combined)
                        .ok_or_else(|| self.error("invalid surrogate pair"));
                }
                return char::from_u32(high).ok_or_else(|| self.error("invalid unicode escape"));
            }
            other => return Err(self.error(format!("invalid escape '\\{}'", other))),
        };
        Ok(escaped)
    }

    fn parse_hex4(&mut self) -> Result<u32, PathError> {
        let end = self.pos + 4;
        if end > self.chars.len() {
            return Err(self.error("truncated unicode escape"));
        }
        let text: String = self.chars[self.pos..end].iter().collect();
        let code = u32::from_str_radix(&text, 16)
            .map_err(|_| self.error(format!("invalid unicode escape '{}'", text)))?;
        self.pos = end;
        Ok(code)
    }

    // ---------------------------------------------------------------------
    // Filter expressions
    // ---------------------------------------------------------------------

    fn parse_or(&mut self) -> Result<FilterExpr, PathError> {
        let mut left = self.parse_and()?;
        loop {
            self.skip_whitespace();
            if !self.starts_with("||") {
                return Ok(left);
            }
            self.pos += 2;
            let right = self.parse_and()?;
            left = FilterExpr::Or(Box::new(left), Box::new(right));
        }
    }

    fn parse_and(&mut self) -> Result<FilterExpr, PathError> {
        let mut left = self.parse_unary()?;
        loop {
            self.skip_whitespace();
            if !self.starts_with("&&") {
                return Ok(left);
            }
            self.pos += 2;
            let right = self.parse_unary()?;
            left = FilterExpr::And(Box::new(left), Box::new(right));
        }
    }

    fn parse_unary(&mut self) -> Result<FilterExpr, PathError> {
        self.skip_whitespace();
        if self.peek() == Some('!') && self.peek_at(1) != Some('=') {
            self.pos += 1;
            return Ok(FilterExpr::Not(Box::new(self.nested(Self::parse_unary)?)));
        }
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> Result<FilterExpr, PathError> {
        self.skip_whitespace();
        if self.peek() == Some('(') {
            self.pos += 1;
            let inner = self.nested(Self::parse_or)?;
            self.skip_whitespace();
            self.expect(')')?;
            return Ok(inner);
        }

        let left = self.parse_operand()?;
        self.skip_whitespace();
        let Some(op) = self.parse_compare_op() else {
            return match left {
                Operand::Query(query) => Ok(FilterExpr::Exists(query)),
                Operand::Literal(_) => Err(self.error("expected comparison operator after literal")),
            };
        };
        let right = self.parse_operand()?;
        Ok(FilterExpr::Compare { left, op, right })
    }

    fn parse_compare_op(&mut self) -> Option<CompareOp> {
        let (op, width) = if self.starts_with("==") {
            (CompareOp::Eq, 2)
        } else if self.starts_with("!=") {
            (CompareOp::Ne, 2)
        } else if self.starts_with("<=") {
            (CompareOp::Le, 2)
        } else if self.starts_with(">=") {
            (CompareOp::Ge, 2)
        } else if self.starts_with("<") {
            (CompareOp::Lt, 1)
        } else if self.starts_with(">") {
            (CompareOp::Gt, 1)
        } else {
            return None;
        };
        self.pos += width;
        Some(op)
    }

    fn parse_operand(&mut self) -> Result<Operand, PathError> {
        self.skip_whitespace();
        match self.peek() {
            Some(root @ ('@' | '$')) => {
                self.pos += 1;
                let segments = self.parse_segments()?;
                Ok(Operand::Query(QueryPath {
                    absolute: root == '$',
                    segments,
                }))
            }
            Some(quote @ ('\'' | '"')) => Ok(Operand::Literal(Value::String(self.parse_string(quote)?))),
            Some(c) if c == '-' || c.is_ascii_digit() => Ok(Operand::Literal(self.parse_number()?)),
            Some(c) if c.is_ascii_alphabetic() => {
                let word = self.parse_name();
                match word.as_str() {
                    "true" => Ok(Operand::Literal(Value::Bool(true))),
                    "false" => Ok(Operand::Literal(Value::Bool(false))),
                    "null" => Ok(Operand::Literal(Value::Null)),
                    _ => Err(self.error(format!("unknown literal '{}'", word))),
                }
            }
            Some(c) => Err(self.error(format!("unexpected character '{}' in filter", c))),
            None => Err(self.error("unterminated filter expression")),
        }
    }

    fn parse_number(&mut self) -> Result<Value, PathError> {
        let start = self.pos;
        if self.peek() == Some('-') {
            self.pos += 1;
        }
        let mut fractional = false;
        while let Some(c) = self.peek() {
            match c {
                '0'..='9' => {}
                '.' | 'e' | 'E' => fractional = true,
                '+' | '-' if matches!(self.chars.get(self.pos - 1), Some('e' | 'E')) => {}
                _ => break,
            }
            self.pos += 1;
        }
        let text: String = self.chars[start..self.pos].iter().collect();

        let number = if fractional {
            text.parse::<f64>().ok().and_then(Number::from_f64)
        } else {
            text.parse::<i64>().ok().map(Number::from)
        };
        number
            .map(Value::Number)
            .ok_or_else(|| self.error(format!("invalid number literal '{}'", text)))
    }
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '-' || !c.is_ascii()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(expression: &str) -> Result<Vec<Segment>, PathError> {
        super::parse(expression).map(|parsed| parsed.segments)
    }

    fn name(n: &str) -> Selector {
        Selector::Name(n.to_string())
    }

    #[test]
    fn test_dotted_names() {
        let segments = parse("$.customer.name").unwrap();
        assert_eq!(
            segments,
            vec![Segment::Child(vec![name("customer")]), Segment::Child(vec![name("name")])]
        );
    }

    #[test]
    fn test_implicit_root() {
        assert_eq!(parse("customer.name").unwrap(), parse("$.customer.name").unwrap());
        assert_eq!(parse("[0]").unwrap(), parse("$[0]").unwrap());
    }

    #[test]
    fn test_brackets_union_and_slice() {
        let segments = parse("$['first name', \"last\"][1:-1:2][-3]").unwrap();
        assert_eq!(
            segments,
            vec![
                Segment::Child(vec![name("first name"), name("last")]),
                Segment::Child(vec![Selector::Slice {
                    start: Some(1),
                    end: Some(-1),
                    step: Some(2)
                }]),
                Segment::Child(vec![Selector::Index(-3)]),
            ]
        );
    }

    #[test]
    fn test_descendants_and_wildcards() {
        let segments = parse("$..links[*].rel").unwrap();
        assert_eq!(
            segments,
            vec![
                Segment::Descendant(vec![name("links")]),
                Segment::Child(vec![Selector::Wildcard]),
                Segment::Child(vec![name("rel")]),
            ]
        );
        assert_eq!(parse("$..*").unwrap(), vec![Segment::Descendant(vec![Selector::Wildcard])]);
    }

    #[test]
    fn test_jayway_and_rfc_filters_agree() {
        let jayway = parse("$.items[?(@.price < 10 && @.sku)]").unwrap();
        let rfc = parse("$.items[?@.price < 10 && @.sku]").unwrap();
        assert_eq!(jayway, rfc);

        let Segment::Child(selectors) = &jayway[1] else {
            panic!("expected child segment");
        };
        let Selector::Filter(FilterExpr::And(left, right)) = &selectors[0] else {
            panic!("expected conjunction, got {:?}", selectors[0]);
        };
        assert!(matches!(
            left.as_ref(),
            FilterExpr::Compare { op: CompareOp::Lt, right: Operand::Literal(Value::Number(_)), .. }
        ));
        assert!(matches!(right.as_ref(), FilterExpr::Exists(_)));
    }

    #[test]
    fn test_string_escapes() {
        let segments = parse(r#"$['it\'s', "tab\there", 'é']"#).unwrap();
        assert_eq!(
            segments,
            vec![Segment::Child(vec![name("it's"), name("tab\there"), name("é")])]
        );
    }

    #[test]
    fn test_syntax_errors() {
        assert_eq!(parse(""), Err(PathError::Empty));
        assert_eq!(parse("   "), Err(PathError::Empty));
        for broken in ["$.", "$..", "$[", "$[]", "$['a'", "$.a[?(@.b ==)]", "@.a", "$.a b", "$[1.5]"] {
            assert!(
                matches!(parse(broken), Err(PathError::Syntax { .. })),
                "{} should be rejected",
                broken
            );
        }
    }

    #[test]
    fn test_error_position_ignores_implicit_root() {
        let Err(PathError::Syntax { position, .. }) = parse("a.b!") else {
            panic!("expected syntax error");
        };
        assert_eq!(position, 3);
    }

    #[test]
    fn test_deep_nesting_is_a_syntax_error() {
        for expression in [
            format!("$.a[?{}@.b]", "!".repeat(200_000)),
            format!("$.a[?{}@.b{}]", "(".repeat(200_000), ")".repeat(200_000)),
            format!("$.a{}", "[?@.b".repeat(10_000)),
        ] {
            let Err(PathError::Syntax { message, .. }) = parse(&expression) else {
                panic!("expected syntax error");
            };
            assert!(message.contains("nested deeper than 128"), "{}", message);
        }
    }

    #[test]
    fn test_moderate_nesting_parses() {
        assert!(parse(&format!("$.a[?{}@.b]", "!".repeat(100))).is_ok());
        assert!(parse(&format!("$.a[?{}@.b{}]", "(".repeat(100), ")".repeat(100))).is_ok());
    }

    #[test]
    fn test_trailing_function() {
        let parsed = super::parse("$.items.length()").unwrap();
        assert_eq!(parsed.segments, vec![Segment::Child(vec![name("items")])]);
        assert_eq!(parsed.function, Some(PathFunction::Length));

        let parsed = super::parse("$.prices[*].amount.max( )").unwrap();
        assert_eq!(parsed.segments.len(), 3);
        assert_eq!(parsed.function, Some(PathFunction::Max));

        assert_eq!(super::parse("$.a.b").unwrap().function, None);
    }

    #[test]
    fn test_unsupported_function_calls() {
        for broken in ["$.items.size()", "$.items.concat('x')", "$.items[0]()", "$()"] {
            assert!(
                matches!(parse(broken), Err(PathError::Syntax { .. })),
                "{} should be rejected",
                broken
            );
        }
        let Err(PathError::Syntax { message, .. }) = parse("$.items.size()") else {
            panic!("expected syntax error");
        };
        assert_eq!(message, "unsupported function 'size()'");
    }
}
