use crate::value::{DimensionKind, ValueKind, ValueNode, CSS_WIDE_KEYWORDS};
use gosub_shared::errors::{CssError, CssResult};
use gosub_shared::span::Span;

/// Scanner that turns the text of a css value into value nodes.
///
/// Unlike a full css tokenizer, this one nests function arguments directly into the
/// function node and leaves blocks, at-rules and selectors alone.
pub struct Tokenizer<'src> {
    /// Value text
    source: &'src str,
    /// Byte offset of the current character
    position: usize,
}

/// Tokenizes a complete css value
pub fn tokenize(source: &str) -> CssResult<Vec<ValueNode>> {
    Tokenizer::new(source).consume_all()
}

impl<'src> Tokenizer<'src> {
    pub fn new(source: &'src str) -> Self {
        Self { source, position: 0 }
    }

    /// Consumes all values until the end of the source
    pub fn consume_all(&mut self) -> CssResult<Vec<ValueNode>> {
        let values = self.consume_values()?;

        if let Some(c) = self.current_char() {
            // Only an unbalanced ')' can stop a top level scan
            return Err(CssError::with_span(
                &format!("unexpected '{}'", c),
                Span::new(self.position, self.position + c.len_utf8()),
            ));
        }

        Ok(values)
    }

    /// Consumes values until eof or the first unbalanced ')'
    fn consume_values(&mut self) -> CssResult<Vec<ValueNode>> {
        let mut values = Vec::new();

        loop {
            match self.current_char() {
                None | Some(')') => return Ok(values),
                Some(_) => values.push(self.consume_value()?),
            }
        }
    }

    fn consume_value(&mut self) -> CssResult<ValueNode> {
        let start = self.position;
        let Some(c) = self.current_char() else {
            return Err(CssError::with_span("unexpected end of value", Span::empty_at(start)));
        };

        let kind = match c {
            c if c.is_whitespace() => {
                self.consume_whitespace();
                ValueKind::Whitespace
            }
            '/' if self.look_ahead(1) == Some('*') => ValueKind::Comment(self.consume_comment()?),
            '"' | '\'' => ValueKind::String(self.consume_string()?),
            '#' => self.consume_hash(),
            c if c.is_ascii_digit() => self.consume_numeric(),
            '.' if self.look_ahead(1).is_some_and(|c| c.is_ascii_digit()) => self.consume_numeric(),
            '+' | '-' if self.is_signed_decimal() => self.consume_numeric(),
            _ if self.starts_ident_seq() => return self.consume_ident_like(start),
            _ => {
                self.next_char();
                ValueKind::Literal(c)
            }
        };

        Ok(ValueNode::new(kind, Span::new(start, self.position)))
    }

    /// Consumes an identifier, a function call or an unquoted url
    fn consume_ident_like(&mut self, start: usize) -> CssResult<ValueNode> {
        let name = self.consume_ident();

        if self.current_char() != Some('(') {
            let kind = if CSS_WIDE_KEYWORDS.contains(&name.to_ascii_lowercase().as_str()) {
                ValueKind::CssWideKeyword(name)
            } else if name.starts_with("--") {
                ValueKind::DashedIdent(name)
            } else {
                ValueKind::Ident(name)
            };
            return Ok(ValueNode::new(kind, Span::new(start, self.position)));
        }

        // consume '('
        self.next_char();

        if name.eq_ignore_ascii_case("url") {
            let arguments_start = self.position;
            self.consume_whitespace();
            if !matches!(self.current_char(), Some('"' | '\'')) {
                return self.consume_url(start);
            }
            // url("...") is a regular function with a string argument
            self.position = arguments_start;
        }

        let arguments = self.consume_values()?;
        if self.current_char() != Some(')') {
            return Err(CssError::with_span(
                "unterminated function call",
                Span::new(start, self.position),
            ));
        }
        // consume ')'
        self.next_char();

        Ok(ValueNode::new(
            ValueKind::Function { name, arguments },
            Span::new(start, self.position),
        ))
    }

    /// Consumes the remainder of an unquoted `url(`
    fn consume_url(&mut self, start: usize) -> CssResult<ValueNode> {
        let mut url = String::new();

        loop {
            match self.next_char() {
                None => {
                    return Err(CssError::with_span("unterminated url", Span::new(start, self.position)));
                }
                Some(')') => break,
                Some('\\') => {
                    if let Some(c) = self.next_char() {
                        url.push(c);
                    }
                }
                Some(c) => url.push(c),
            }
        }

        Ok(ValueNode::new(
            ValueKind::Url(url.trim().to_string()),
            Span::new(start, self.position),
        ))
    }

    fn consume_comment(&mut self) -> CssResult<String> {
        let start = self.position;
        // consume '/*'
        self.position += 2;

        let rest = self.source.get(self.position..).unwrap_or_default();
        match rest.find("*/") {
            Some(len) => {
                let comment = rest[..len].to_string();
                self.position += len + 2;
                Ok(comment)
            }
            None => {
                self.position = self.source.len();
                Err(CssError::with_span("unterminated comment", Span::new(start, self.position)))
            }
        }
    }

    fn consume_string(&mut self) -> CssResult<String> {
        let start = self.position;
        let ending = self.next_char();
        let mut value = String::new();

        loop {
            match self.current_char() {
                None | Some('\n') => {
                    return Err(CssError::with_span("unterminated string", Span::new(start, self.position)));
                }
                c if c == ending => {
                    self.next_char();
                    return Ok(value);
                }
                Some('\\') => {
                    self.next_char();
                    match self.current_char() {
                        // escaped newline continues the string
                        Some('\n') => {
                            self.next_char();
                        }
                        Some(_) => value.push(self.consume_escaped()),
                        None => {}
                    }
                }
                Some(c) => {
                    value.push(c);
                    self.next_char();
                }
            }
        }
    }

    fn consume_hash(&mut self) -> ValueKind {
        // consume '#'
        self.next_char();
        let name = self.consume_ident();

        let is_hex = name.chars().all(|c| c.is_ascii_hexdigit());
        if is_hex && matches!(name.len(), 3 | 4 | 6 | 8) {
            ValueKind::Color(name)
        } else {
            ValueKind::Invalid(format!("#{}", name))
        }
    }

    /// Returns a number, percentage or dimension
    fn consume_numeric(&mut self) -> ValueKind {
        let (value, is_integer) = self.consume_number();

        if self.starts_ident_seq() {
            let unit = self.consume_ident();
            return ValueKind::Dimension {
                value: value as f32,
                kind: DimensionKind::from_unit(&unit),
                unit,
            };
        }

        if self.current_char() == Some('%') {
            // consume '%'
            self.next_char();
            return ValueKind::Percentage(value as f32);
        }

        if is_integer && value >= f64::from(i32::MIN) && value <= f64::from(i32::MAX) {
            return ValueKind::Integer(value as i32);
        }

        ValueKind::Number(value as f32)
    }

    /// Consumes a number and returns its value and whether it was written as an integer
    fn consume_number(&mut self) -> (f64, bool) {
        let mut value = String::new();
        let mut is_integer = true;

        if let Some(sign @ ('+' | '-')) = self.current_char() {
            value.push(sign);
            self.next_char();
        }

        value.push_str(&self.consume_digits());

        if self.current_char() == Some('.') && self.look_ahead(1).is_some_and(|c| c.is_ascii_digit()) {
            is_integer = false;
            value.push('.');
            self.next_char();
            value.push_str(&self.consume_digits());
        }

        if matches!(self.current_char(), Some('e' | 'E')) {
            let exponent = match (self.look_ahead(1), self.look_ahead(2)) {
                (Some(c), _) if c.is_ascii_digit() => true,
                (Some('+' | '-'), Some(c)) if c.is_ascii_digit() => true,
                _ => false,
            };
            if exponent {
                is_integer = false;
                value.push('e');
                self.next_char();
                if let Some(sign @ ('+' | '-')) = self.current_char() {
                    value.push(sign);
                    self.next_char();
                }
                value.push_str(&self.consume_digits());
            }
        }

        (value.parse().unwrap_or_default(), is_integer)
    }

    fn consume_ident(&mut self) -> String {
        let mut value = String::new();

        loop {
            match self.current_char() {
                Some('\\') if self.is_start_of_escape(0) => {
                    self.next_char();
                    value.push(self.consume_escaped());
                }
                Some(c) if is_ident_char(c) => {
                    value.push(c);
                    self.next_char();
                }
                _ => return value,
            }
        }
    }

    /// Consumes the character(s) after a '\'
    fn consume_escaped(&mut self) -> char {
        let mut hex = String::new();
        while hex.len() < 6 {
            match self.current_char() {
                Some(c) if c.is_ascii_hexdigit() => {
                    hex.push(c);
                    self.next_char();
                }
                _ => break,
            }
        }

        if hex.is_empty() {
            return self.next_char().unwrap_or(char::REPLACEMENT_CHARACTER);
        }

        // a single whitespace after a hex escape belongs to the escape
        if self.current_char().is_some_and(char::is_whitespace) {
            self.next_char();
        }

        u32::from_str_radix(&hex, 16)
            .ok()
            .and_then(char::from_u32)
            .filter(|c| *c != '\0')
            .unwrap_or(char::REPLACEMENT_CHARACTER)
    }

    fn consume_digits(&mut self) -> String {
        let mut digits = String::new();
        while let Some(c) = self.current_char().filter(char::is_ascii_digit) {
            digits.push(c);
            self.next_char();
        }
        digits
    }

    fn consume_whitespace(&mut self) {
        while self.current_char().is_some_and(char::is_whitespace) {
            self.next_char();
        }
    }

    fn is_start_of_escape(&self, start: usize) -> bool {
        self.look_ahead(start) == Some('\\') && !matches!(self.look_ahead(start + 1), Some('\n') | None)
    }

    /// Checks if the next three characters would start an ident sequence
    fn starts_ident_seq(&self) -> bool {
        match self.current_char() {
            Some('-') => match self.look_ahead(1) {
                Some('-') => true,
                Some(c) if is_ident_start(c) => true,
                _ => self.is_start_of_escape(1),
            },
            Some('\\') => self.is_start_of_escape(0),
            Some(c) => is_ident_start(c),
            None => false,
        }
    }

    /// e.g. +1, -1, +.1, -0.01
    fn is_signed_decimal(&self) -> bool {
        match (self.look_ahead(1), self.look_ahead(2)) {
            (Some(c), _) if c.is_ascii_digit() => true,
            (Some('.'), Some(c)) => c.is_ascii_digit(),
            _ => false,
        }
    }

    fn current_char(&self) -> Option<char> {
        self.look_ahead(0)
    }

    fn look_ahead(&self, offset: usize) -> Option<char> {
        self.source.get(self.position..)?.chars().nth(offset)
    }

    fn next_char(&mut self) -> Option<char> {
        let c = self.current_char()?;
        self.position += c.len_utf8();
        Some(c)
    }
}

/// [ident-start code point](https://www.w3.org/TR/css-syntax-3/#ident-start-code-point)
fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || !c.is_ascii() || c == '_'
}

/// [ident code point](https://www.w3.org/TR/css-syntax-3/#ident-code-point)
fn is_ident_char(c: char) -> bool {
    is_ident_start(c) || c.is_ascii_digit() || c == '-'
}
