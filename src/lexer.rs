//! Tokenizer for the simulated JavaScript subset
//!
//! A [`Cursor`] walks the source one char at a time and is `Copy`, so cloning
//! a [`Lexer`] gives an independent lookahead. Punctuators are matched longest-first
//! against a single table. Only the words the parser builds nodes from are
//! [`Keyword`]s; every other reserved word comes out as an identifier and the
//! parser classifies it when it skips unsupported statements.

use serde::Serialize;

use crate::value::JsString;

/// Source range with the 1-based position of its first character
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub line: u32,
    pub column: u32,
}

impl Span {
    pub fn new(start: usize, end: usize, line: u32, column: u32) -> Self {
        Self {
            start,
            end,
            line,
            column,
        }
    }
}

impl Default for Span {
    fn default() -> Self {
        Self::new(0, 0, 1, 1)
    }
}

/// Words the parser gives a meaning of their own
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    Var,
    Let,
    Const,
    Function,
    Return,
    Async,
    Await,
    New,
    Typeof,
    Void,
    Delete,
    In,
    Instanceof,
    True,
    False,
    Null,
}

const KEYWORDS: &[(&str, Keyword)] = &[
    ("var", Keyword::Var),
    ("let", Keyword::Let),
    ("const", Keyword::Const),
    ("function", Keyword::Function),
    ("return", Keyword::Return),
    ("async", Keyword::Async),
    ("await", Keyword::Await),
    ("new", Keyword::New),
    ("typeof", Keyword::Typeof),
    ("void", Keyword::Void),
    ("delete", Keyword::Delete),
    ("in", Keyword::In),
    ("instanceof", Keyword::Instanceof),
    ("true", Keyword::True),
    ("false", Keyword::False),
    ("null", Keyword::Null),
];

impl Keyword {
    pub fn from_word(word: &str) -> Option<Keyword> {
        KEYWORDS
            .iter()
            .find(|(text, _)| *text == word)
            .map(|(_, keyword)| *keyword)
    }

    pub fn as_str(self) -> &'static str {
        KEYWORDS
            .iter()
            .find(|(_, keyword)| *keyword == self)
            .map_or("", |(text, _)| text)
    }
}

/// Operators and punctuation, longest first so the first prefix match wins
const PUNCTUATORS: &[&str] = &[
    ">>>=", //
    "===", "!==", "**=", "<<=", ">>=", ">>>", "...", "&&=", "||=", "??=", //
    "=>", "==", "!=", "<=", ">=", "&&", "||", "??", "?.", "++", "--", "+=", "-=", "*=", "/=", "%=",
    "&=", "|=", "^=", "**", "<<", ">>", //
    "{", "}", "(", ")", "[", "]", ";", ",", ":", "?", ".", "=", "<", ">", "+", "-", "*", "/", "%",
    "&", "|", "^", "!", "~",
];

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Number(f64),
    /// String literal with escapes applied
    String(JsString),
    /// Raw text between the backticks, substitutions included
    Template(JsString),
    RegExp {
        pattern: JsString,
        flags: JsString,
    },
    Identifier(JsString),
    Keyword(Keyword),
    /// Operator or punctuation, as written
    Punct(&'static str),
    /// String, template or regexp literal missing its closing delimiter
    Unterminated(char),
    Invalid(char),
    Eof,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
    /// A line break separates this token from the previous one
    pub newline_before: bool,
}

impl Token {
    pub fn eof(pos: usize, line: u32, column: u32) -> Self {
        Self {
            kind: TokenKind::Eof,
            span: Span::new(pos, pos, line, column),
            newline_before: false,
        }
    }

    pub fn is_punct(&self, punct: &str) -> bool {
        matches!(self.kind, TokenKind::Punct(p) if p == punct)
    }

    pub fn is_keyword(&self, keyword: Keyword) -> bool {
        self.kind == TokenKind::Keyword(keyword)
    }
}

/// Position in the source, tracking line and column as it moves
#[derive(Debug, Clone, Copy)]
struct Cursor<'a> {
    source: &'a str,
    pos: usize,
    line: u32,
    column: u32,
}

impl<'a> Cursor<'a> {
    fn new(source: &'a str) -> Self {
        Self::at(source, Span::default())
    }

    fn at(source: &'a str, span: Span) -> Self {
        Self {
            source,
            pos: span.start,
            line: span.line,
            column: span.column,
        }
    }

    fn rest(&self) -> &'a str {
        self.source.get(self.pos..).unwrap_or("")
    }

    fn nth(&self, n: usize) -> Option<char> {
        self.rest().chars().nth(n)
    }

    fn first(&self) -> Option<char> {
        self.nth(0)
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.first()?;
        self.pos += ch.len_utf8();
        if is_line_terminator(ch) {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(ch)
    }

    fn eat(&mut self, expected: char) -> bool {
        let found = self.first() == Some(expected);
        if found {
            self.bump();
        }
        found
    }

    /// Consume chars while `pred` holds and return the consumed text
    fn eat_while(&mut self, pred: impl Fn(char) -> bool) -> &'a str {
        let start = *self;
        while self.first().is_some_and(&pred) {
            self.bump();
        }
        self.slice_from(start)
    }

    /// Skip `text`, which must be single-line ASCII and start the remaining input
    fn skip_ascii(&mut self, text: &str) {
        self.pos += text.len();
        self.column += text.len() as u32;
    }

    fn slice_from(&self, start: Cursor<'a>) -> &'a str {
        self.source.get(start.pos..self.pos).unwrap_or("")
    }

    fn span_from(&self, start: Cursor<'a>) -> Span {
        Span::new(start.pos, self.pos, start.line, start.column)
    }
}

#[derive(Debug, Clone)]
pub struct Lexer<'a> {
    cursor: Cursor<'a>,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            cursor: Cursor::new(source),
        }
    }

    /// Source text covered by a span
    pub fn slice(&self, span: Span) -> &'a str {
        self.cursor.source.get(span.start..span.end).unwrap_or("")
    }

    pub fn next_token(&mut self) -> Token {
        let newline_before = self.skip_trivia();
        let start = self.cursor;

        let kind = match self.cursor.first() {
            None => TokenKind::Eof,
            Some(ch) if is_id_start(ch) => self.word(),
            Some('0'..='9') => self.number(),
            Some('.') if matches!(self.cursor.nth(1), Some('0'..='9')) => self.number(),
            Some(quote @ ('"' | '\'')) => self.string(quote),
            Some('`') => self.template(),
            Some(_) => self.punct(),
        };

        Token {
            kind,
            span: self.cursor.span_from(start),
            newline_before,
        }
    }

    /// Scan `token` again as a regular expression literal. The parser calls
    /// this when `/` or `/=` appears where an operand is expected.
    pub fn rescan_as_regexp(&mut self, token: &Token) -> Token {
        self.cursor = Cursor::at(self.cursor.source, token.span);
        let start = self.cursor;
        self.cursor.bump();

        let mut in_class = false;
        let kind = loop {
            match self.cursor.bump() {
                None => break TokenKind::Unterminated('/'),
                Some(c) if is_line_terminator(c) => break TokenKind::Unterminated('/'),
                Some('\\') => {
                    self.cursor.bump();
                }
                Some('[') => in_class = true,
                Some(']') => in_class = false,
                Some('/') if !in_class => {
                    let body = self.cursor.slice_from(start);
                    let pattern = body
                        .strip_prefix('/')
                        .and_then(|b| b.strip_suffix('/'))
                        .unwrap_or("");
                    let flags = self.cursor.eat_while(|c| c.is_ascii_alphabetic());
                    break TokenKind::RegExp {
                        pattern: JsString::from(pattern),
                        flags: JsString::from(flags),
                    };
                }
                Some(_) => {}
            }
        };

        Token {
            kind,
            span: self.cursor.span_from(start),
            newline_before: token.newline_before,
        }
    }

    /// Skip whitespace and comments, reporting whether a line break was seen
    fn skip_trivia(&mut self) -> bool {
        let mut newline = false;
        loop {
            match (self.cursor.first(), self.cursor.nth(1)) {
                (Some(c), _) if is_line_terminator(c) => {
                    newline = true;
                    self.cursor.bump();
                }
                (Some(c), _) if c.is_whitespace() || c == '\u{FEFF}' => {
                    self.cursor.bump();
                }
                (Some('/'), Some('/')) => {
                    self.cursor.eat_while(|c| !is_line_terminator(c));
                }
                (Some('/'), Some('*')) => {
                    self.cursor.skip_ascii("/*");
                    loop {
                        match self.cursor.bump() {
                            None => break,
                            Some('*') if self.cursor.eat('/') => break,
                            Some(c) if is_line_terminator(c) => newline = true,
                            Some(_) => {}
                        }
                    }
                }
                _ => return newline,
            }
        }
    }

    fn word(&mut self) -> TokenKind {
        let word = self.cursor.eat_while(is_id_continue);
        match Keyword::from_word(word) {
            Some(keyword) => TokenKind::Keyword(keyword),
            None => TokenKind::Identifier(JsString::from(word)),
        }
    }

    fn punct(&mut self) -> TokenKind {
        let rest = self.cursor.rest();
        // `a?.5:b` is a conditional, not an optional chain
        let conditional_dot = rest
            .strip_prefix("?.")
            .and_then(|after| after.chars().next())
            .is_some_and(|c| c.is_ascii_digit());

        let found = PUNCTUATORS
            .iter()
            .copied()
            .find(|p| rest.starts_with(*p) && !(*p == "?." && conditional_dot));

        match found {
            Some(punct) => {
                self.cursor.skip_ascii(punct);
                TokenKind::Punct(punct)
            }
            None => TokenKind::Invalid(self.cursor.bump().unwrap_or('\0')),
        }
    }

    fn number(&mut self) -> TokenKind {
        let start = self.cursor;

        let radix = match (self.cursor.first(), self.cursor.nth(1)) {
            (Some('0'), Some('x' | 'X')) => Some(16),
            (Some('0'), Some('o' | 'O')) => Some(8),
            (Some('0'), Some('b' | 'B')) => Some(2),
            _ => None,
        };
        if let Some(radix) = radix {
            self.cursor.skip_ascii("0x");
            let digits: String = self
                .cursor
                .eat_while(|c| c.is_digit(radix) || c == '_')
                .chars()
                .filter(|c| *c != '_')
                .collect();
            return match u64::from_str_radix(&digits, radix) {
                Ok(value) => TokenKind::Number(value as f64),
                Err(_) => TokenKind::Invalid('0'),
            };
        }

        let is_digit = |c: char| c.is_ascii_digit() || c == '_';
        self.cursor.eat_while(is_digit);
        if self.cursor.first() == Some('.') && matches!(self.cursor.nth(1), Some('0'..='9')) {
            self.cursor.bump();
            self.cursor.eat_while(is_digit);
        }

        let exponent = match (self.cursor.first(), self.cursor.nth(1), self.cursor.nth(2)) {
            (Some('e' | 'E'), Some('0'..='9'), _) => 1,
            (Some('e' | 'E'), Some('+' | '-'), Some('0'..='9')) => 2,
            _ => 0,
        };
        if exponent > 0 {
            for _ in 0..exponent {
                self.cursor.bump();
            }
            self.cursor.eat_while(|c| c.is_ascii_digit());
        }

        let mut text: String = self.cursor.slice_from(start).chars().filter(|c| *c != '_').collect();
        if text.starts_with('.') {
            text.insert(0, '0');
        }
        match text.parse::<f64>() {
            Ok(value) => TokenKind::Number(value),
            Err(_) => TokenKind::Invalid(text.chars().next().unwrap_or('0')),
        }
    }

    fn string(&mut self, quote: char) -> TokenKind {
        self.cursor.bump();
        let mut value = String::new();

        loop {
            match self.cursor.bump() {
                Some(c) if c == quote => return TokenKind::String(JsString::from(value)),
                Some('\\') => {
                    if self.cursor.first().is_none() {
                        return TokenKind::Unterminated(quote);
                    }
                    if let Some(c) = self.escape() {
                        value.push(c);
                    }
                }
                Some(c) if is_line_terminator(c) => return TokenKind::Unterminated(quote),
                Some(c) => value.push(c),
                None => return TokenKind::Unterminated(quote),
            }
        }
    }

    /// Char produced by the escape after a backslash. A line continuation
    /// or a malformed hex escape produces nothing.
    fn escape(&mut self) -> Option<char> {
        let c = match self.cursor.bump()? {
            'n' => '\n',
            'r' => '\r',
            't' => '\t',
            'b' => '\u{8}',
            'f' => '\u{c}',
            'v' => '\u{b}',
            '0' => '\0',
            'x' => return self.hex_escape(2),
            'u' if self.cursor.eat('{') => {
                let digits = self.cursor.eat_while(|c| c.is_ascii_hexdigit());
                self.cursor.eat('}');
                return u32::from_str_radix(digits, 16).ok().and_then(char::from_u32);
            }
            'u' => return self.hex_escape(4),
            c if is_line_terminator(c) => return None,
            c => c,
        };
        Some(c)
    }

    fn hex_escape(&mut self, len: usize) -> Option<char> {
        let digits = self
            .cursor
            .rest()
            .get(..len)
            .filter(|digits| digits.chars().all(|c| c.is_ascii_hexdigit()))?;
        self.cursor.skip_ascii(digits);
        u32::from_str_radix(digits, 16).ok().and_then(char::from_u32)
    }

    /// Template literals stay raw. Braces inside `${ ... }` are counted so a
    /// nested object literal does not end the substitution early.
    fn template(&mut self) -> TokenKind {
        let start = self.cursor;
        self.cursor.bump();
        let mut depth = 0usize;

        loop {
            match self.cursor.bump() {
                None => return TokenKind::Unterminated('`'),
                Some('`') if depth == 0 => break,
                Some('\\') => {
                    self.cursor.bump();
                }
                Some('$') if depth == 0 && self.cursor.eat('{') => depth = 1,
                Some('{') if depth > 0 => depth += 1,
                Some('}') if depth > 0 => depth -= 1,
                Some(_) => {}
            }
        }

        let raw = self.cursor.slice_from(start);
        let body = raw
            .strip_prefix('`')
            .and_then(|r| r.strip_suffix('`'))
            .unwrap_or("");
        TokenKind::Template(JsString::from(body))
    }
}

fn is_line_terminator(ch: char) -> bool {
    matches!(ch, '\n' | '\u{2028}' | '\u{2029}')
}

fn is_id_start(ch: char) -> bool {
    ch.is_alphabetic() || ch == '_' || ch == '$'
}

fn is_id_continue(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_' || ch == '$'
}
