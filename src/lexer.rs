//! Lexer for ES5 source code
//!
//! Converts source text into a stream of tokens.

use std::iter::Peekable;
use std::str::CharIndices;

use crate::string_dict::StringDict;
use crate::value::JsString;

/// Source span information
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
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
        Self {
            start: 0,
            end: 0,
            line: 1,
            column: 1,
        }
    }
}

/// Token types for ES5
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Literals
    Number(f64),
    String(JsString),
    RegExp(String, String), // (pattern, flags)
    True,
    False,
    Null,

    Identifier(JsString),

    // Keywords
    Var,
    Let,
    Const,
    Function,
    Return,
    If,
    Else,
    For,
    While,
    Do,
    Break,
    Continue,
    Switch,
    Case,
    Default,
    Try,
    Catch,
    Finally,
    Throw,
    New,
    This,
    With,
    Typeof,
    Instanceof,
    In,
    Void,
    Delete,
    Debugger,

    // Operators
    Plus,       // +
    Minus,      // -
    Star,       // *
    Slash,      // /
    Percent,    // %
    PlusPlus,   // ++
    MinusMinus, // --
    Eq,         // =
    EqEq,       // ==
    EqEqEq,     // ===
    BangEq,     // !=
    BangEqEq,   // !==
    Lt,         // <
    LtEq,       // <=
    Gt,         // >
    GtEq,       // >=
    LtLt,       // <<
    GtGt,       // >>
    GtGtGt,     // >>>
    Amp,        // &
    AmpAmp,     // &&
    Pipe,       // |
    PipePipe,   // ||
    Caret,      // ^
    Tilde,      // ~
    Bang,       // !
    Question,   // ?

    // Assignment Operators
    PlusEq,   // +=
    MinusEq,  // -=
    StarEq,   // *=
    SlashEq,  // /=
    PercentEq, // %=
    AmpEq,    // &=
    PipeEq,   // |=
    CaretEq,  // ^=
    LtLtEq,   // <<=
    GtGtEq,   // >>=
    GtGtGtEq, // >>>=

    // Punctuation
    LParen,    // (
    RParen,    // )
    LBrace,    // {
    RBrace,    // }
    LBracket,  // [
    RBracket,  // ]
    Dot,       // .
    Comma,     // ,
    Colon,     // :
    Semicolon, // ;

    Eof,
    Invalid(char),
}

impl TokenKind {
    /// Source spelling of keyword tokens, used where keywords are valid
    /// property names (`a.default`, `{ if: 1 }`).
    pub fn keyword_text(&self) -> Option<&'static str> {
        Some(match self {
            TokenKind::True => "true",
            TokenKind::False => "false",
            TokenKind::Null => "null",
            TokenKind::Var => "var",
            TokenKind::Let => "let",
            TokenKind::Const => "const",
            TokenKind::Function => "function",
            TokenKind::Return => "return",
            TokenKind::If => "if",
            TokenKind::Else => "else",
            TokenKind::For => "for",
            TokenKind::While => "while",
            TokenKind::Do => "do",
            TokenKind::Break => "break",
            TokenKind::Continue => "continue",
            TokenKind::Switch => "switch",
            TokenKind::Case => "case",
            TokenKind::Default => "default",
            TokenKind::Try => "try",
            TokenKind::Catch => "catch",
            TokenKind::Finally => "finally",
            TokenKind::Throw => "throw",
            TokenKind::New => "new",
            TokenKind::This => "this",
            TokenKind::With => "with",
            TokenKind::Typeof => "typeof",
            TokenKind::Instanceof => "instanceof",
            TokenKind::In => "in",
            TokenKind::Void => "void",
            TokenKind::Delete => "delete",
            TokenKind::Debugger => "debugger",
            _ => return None,
        })
    }
}

/// A token with its source location
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }

    pub fn eof(pos: usize, line: u32, column: u32) -> Self {
        Self {
            kind: TokenKind::Eof,
            span: Span::new(pos, pos, line, column),
        }
    }
}

/// Lexer state checkpoint for backtracking
#[derive(Clone)]
pub struct LexerCheckpoint {
    current_pos: usize,
    line: u32,
    column: u32,
    start_pos: usize,
    start_line: u32,
    start_column: u32,
    saw_newline: bool,
}

/// Lexer for tokenizing ES5 source code
pub struct Lexer<'a> {
    source: &'a str,
    chars: Peekable<CharIndices<'a>>,
    /// Base offset added to char_indices positions (the iterator is rebuilt from mid-source on restore)
    chars_base_offset: usize,
    current_pos: usize,
    line: u32,
    column: u32,
    start_pos: usize,
    start_line: u32,
    start_column: u32,
    /// Tracks if we just saw a newline (for ASI)
    saw_newline: bool,
    string_dict: &'a mut StringDict,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str, string_dict: &'a mut StringDict) -> Self {
        Self {
            source,
            chars: source.char_indices().peekable(),
            chars_base_offset: 0,
            current_pos: 0,
            line: 1,
            column: 1,
            start_pos: 0,
            start_line: 1,
            start_column: 1,
            saw_newline: false,
            string_dict,
        }
    }

    /// Get mutable reference to the string dictionary for interning
    pub fn string_dict(&mut self) -> &mut StringDict {
        self.string_dict
    }

    /// Raw source text between two byte offsets
    pub fn source_slice(&self, start: usize, end: usize) -> &'a str {
        self.source.get(start..end).unwrap_or("")
    }

    /// Create a checkpoint of the current lexer state for backtracking
    pub fn checkpoint(&self) -> LexerCheckpoint {
        LexerCheckpoint {
            current_pos: self.current_pos,
            line: self.line,
            column: self.column,
            start_pos: self.start_pos,
            start_line: self.start_line,
            start_column: self.start_column,
            saw_newline: self.saw_newline,
        }
    }

    /// Restore the lexer state from a checkpoint
    pub fn restore(&mut self, checkpoint: LexerCheckpoint) {
        self.current_pos = checkpoint.current_pos;
        self.line = checkpoint.line;
        self.column = checkpoint.column;
        self.start_pos = checkpoint.start_pos;
        self.start_line = checkpoint.start_line;
        self.start_column = checkpoint.start_column;
        self.saw_newline = checkpoint.saw_newline;
        self.reset_chars(checkpoint.current_pos);
    }

    /// Reset the lexer to the start of `span` and scan a regexp literal there.
    /// Used when the parser decides a `/` or `/=` starts a regexp.
    pub fn rescan_as_regexp(&mut self, span: Span) -> Token {
        self.current_pos = span.start;
        self.line = span.line;
        self.column = span.column;
        self.start_pos = span.start;
        self.start_line = span.line;
        self.start_column = span.column;
        self.reset_chars(span.start);
        self.scan_regexp()
    }

    fn reset_chars(&mut self, pos: usize) {
        self.chars_base_offset = pos;
        self.chars = self.source.get(pos..).unwrap_or("").char_indices().peekable();
    }

    /// Get the next token from the source
    pub fn next_token(&mut self) -> Token {
        self.skip_whitespace_and_comments();

        self.start_pos = self.current_pos;
        self.start_line = self.line;
        self.start_column = self.column;

        let Some((_pos, ch)) = self.advance() else {
            return Token::eof(self.current_pos, self.line, self.column);
        };

        let kind = match ch {
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '{' => TokenKind::LBrace,
            '}' => TokenKind::RBrace,
            '[' => TokenKind::LBracket,
            ']' => TokenKind::RBracket,
            ',' => TokenKind::Comma,
            ';' => TokenKind::Semicolon,
            ':' => TokenKind::Colon,
            '~' => TokenKind::Tilde,
            '?' => TokenKind::Question,

            '.' => self.scan_dot(),
            '+' => self.scan_pair('+', TokenKind::PlusPlus, TokenKind::PlusEq, TokenKind::Plus),
            '-' => self.scan_pair(
                '-',
                TokenKind::MinusMinus,
                TokenKind::MinusEq,
                TokenKind::Minus,
            ),
            '*' => self.scan_assign(TokenKind::StarEq, TokenKind::Star),
            '/' => self.scan_assign(TokenKind::SlashEq, TokenKind::Slash),
            '%' => self.scan_assign(TokenKind::PercentEq, TokenKind::Percent),
            '^' => self.scan_assign(TokenKind::CaretEq, TokenKind::Caret),
            '&' => self.scan_pair('&', TokenKind::AmpAmp, TokenKind::AmpEq, TokenKind::Amp),
            '|' => self.scan_pair('|', TokenKind::PipePipe, TokenKind::PipeEq, TokenKind::Pipe),
            '=' => self.scan_equals(),
            '!' => self.scan_bang(),
            '<' => self.scan_less_than(),
            '>' => self.scan_greater_than(),

            '"' | '\'' => self.scan_string(ch),

            '0'..='9' => self.scan_number(ch),

            '\\' => self.scan_escaped_identifier(),
            c if is_id_start(c) => self.scan_identifier(c),

            c => TokenKind::Invalid(c),
        };

        Token::new(kind, self.make_span())
    }

    /// Check if there was a newline before the current token
    pub fn had_newline_before(&self) -> bool {
        self.saw_newline
    }

    fn advance(&mut self) -> Option<(usize, char)> {
        let result = self.chars.next();
        if let Some((pos, ch)) = result {
            self.current_pos = self.chars_base_offset + pos + ch.len_utf8();
            let crlf = ch == '\r' && self.chars.peek().map(|(_, c)| *c) == Some('\n');
            if is_line_terminator(ch) && !crlf {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
        result
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().map(|(_, ch)| *ch)
    }

    fn peek_next(&self) -> Option<char> {
        let slice = self.source.get(self.current_pos..)?;
        let mut iter = slice.chars();
        iter.next();
        iter.next()
    }

    fn match_char(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn make_span(&self) -> Span {
        Span::new(
            self.start_pos,
            self.current_pos,
            self.start_line,
            self.start_column,
        )
    }

    fn skip_whitespace_and_comments(&mut self) {
        self.saw_newline = false;

        loop {
            match self.peek() {
                Some(' ' | '\t' | '\u{000B}' | '\u{000C}' | '\u{00A0}' | '\u{FEFF}') => {
                    self.advance();
                }
                Some(c) if is_line_terminator(c) => {
                    self.saw_newline = true;
                    self.advance();
                }
                Some(c) if c.is_whitespace() => {
                    self.advance();
                }
                Some('/') => match self.peek_next() {
                    Some('/') => {
                        self.advance();
                        self.advance();
                        while let Some(ch) = self.peek() {
                            if is_line_terminator(ch) {
                                break;
                            }
                            self.advance();
                        }
                    }
                    Some('*') => {
                        self.advance();
                        self.advance();
                        loop {
                            match self.advance() {
                                Some((_, '*')) if self.peek() == Some('/') => {
                                    self.advance();
                                    break;
                                }
                                // A block comment spanning lines counts as a newline for ASI
                                Some((_, c)) if is_line_terminator(c) => {
                                    self.saw_newline = true;
                                }
                                Some(_) => {}
                                None => break,
                            }
                        }
                    }
                    _ => break,
                },
                _ => break,
            }
        }
    }

    fn scan_dot(&mut self) -> TokenKind {
        if matches!(self.peek(), Some('0'..='9')) {
            self.scan_number('.')
        } else {
            TokenKind::Dot
        }
    }

    /// `c`, `cc`, `c=`
    fn scan_pair(
        &mut self,
        c: char,
        doubled: TokenKind,
        assign: TokenKind,
        single: TokenKind,
    ) -> TokenKind {
        if self.match_char(c) {
            doubled
        } else if self.match_char('=') {
            assign
        } else {
            single
        }
    }

    fn scan_assign(&mut self, assign: TokenKind, single: TokenKind) -> TokenKind {
        if self.match_char('=') { assign } else { single }
    }

    /// Scan a regular expression literal.
    /// The leading `/` is at the current position (not yet consumed).
    pub fn scan_regexp(&mut self) -> Token {
        let start_pos = self.current_pos;
        let start_line = self.line;
        let start_column = self.column;

        self.advance();

        let mut pattern = String::new();
        let mut in_class = false;
        let mut terminated = false;

        loop {
            match self.advance() {
                Some((_, '/')) if !in_class => {
                    terminated = true;
                    break;
                }
                Some((_, '[')) => {
                    in_class = true;
                    pattern.push('[');
                }
                Some((_, ']')) => {
                    in_class = false;
                    pattern.push(']');
                }
                Some((_, '\\')) => {
                    pattern.push('\\');
                    if let Some((_, c)) = self.advance() {
                        pattern.push(c);
                    }
                }
                Some((_, c)) if is_line_terminator(c) => break,
                Some((_, c)) => pattern.push(c),
                None => break,
            }
        }

        let span = Span::new(start_pos, self.current_pos, start_line, start_column);
        if !terminated {
            return Token::new(TokenKind::Invalid('/'), span);
        }

        let mut flags = String::new();
        while let Some(ch) = self.peek() {
            if is_id_continue(ch) {
                flags.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        let span = Span::new(start_pos, self.current_pos, start_line, start_column);
        Token::new(TokenKind::RegExp(pattern, flags), span)
    }

    fn scan_equals(&mut self) -> TokenKind {
        if self.match_char('=') {
            if self.match_char('=') {
                TokenKind::EqEqEq
            } else {
                TokenKind::EqEq
            }
        } else {
            TokenKind::Eq
        }
    }

    fn scan_bang(&mut self) -> TokenKind {
        if self.match_char('=') {
            if self.match_char('=') {
                TokenKind::BangEqEq
            } else {
                TokenKind::BangEq
            }
        } else {
            TokenKind::Bang
        }
    }

    fn scan_less_than(&mut self) -> TokenKind {
        if self.match_char('<') {
            if self.match_char('=') {
                TokenKind::LtLtEq
            } else {
                TokenKind::LtLt
            }
        } else if self.match_char('=') {
            TokenKind::LtEq
        } else {
            TokenKind::Lt
        }
    }

    fn scan_greater_than(&mut self) -> TokenKind {
        if self.match_char('>') {
            if self.match_char('>') {
                if self.match_char('=') {
                    TokenKind::GtGtGtEq
                } else {
                    TokenKind::GtGtGt
                }
            } else if self.match_char('=') {
                TokenKind::GtGtEq
            } else {
                TokenKind::GtGt
            }
        } else if self.match_char('=') {
            TokenKind::GtEq
        } else {
            TokenKind::Gt
        }
    }

    fn scan_string(&mut self, quote: char) -> TokenKind {
        let mut value = String::new();

        loop {
            match self.advance() {
                Some((_, c)) if c == quote => break,
                Some((_, '\\')) => match self.advance() {
                    Some((_, 'n')) => value.push('\n'),
                    Some((_, 'r')) => value.push('\r'),
                    Some((_, 't')) => value.push('\t'),
                    Some((_, 'b')) => value.push('\x08'),
                    Some((_, 'f')) => value.push('\x0C'),
                    Some((_, 'v')) => value.push('\x0B'),
                    Some((_, c @ '0'..='7')) => {
                        // Legacy octal escape, up to three digits and at most \377
                        let mut code = c.to_digit(8).unwrap_or(0);
                        let max_digits = if c <= '3' { 2 } else { 1 };
                        for _ in 0..max_digits {
                            match self.peek().and_then(|d| d.to_digit(8)) {
                                Some(d) => {
                                    code = code * 8 + d;
                                    self.advance();
                                }
                                None => break,
                            }
                        }
                        if let Some(ch) = char::from_u32(code) {
                            value.push(ch);
                        }
                    }
                    Some((_, 'x')) => match self.scan_hex_escape(2).and_then(char::from_u32) {
                        Some(ch) => value.push(ch),
                        None => return TokenKind::Invalid('\\'),
                    },
                    Some((_, 'u')) => match self.scan_unicode_escape() {
                        Some(ch) => value.push(ch),
                        None => return TokenKind::Invalid('\\'),
                    },
                    Some((_, '\r')) => {
                        self.match_char('\n');
                    }
                    // Line continuation
                    Some((_, c)) if is_line_terminator(c) => {}
                    Some((_, c)) => value.push(c),
                    None => return TokenKind::Invalid(quote),
                },
                Some((_, c)) if is_line_terminator(c) => return TokenKind::Invalid(quote),
                Some((_, c)) => value.push(c),
                None => return TokenKind::Invalid(quote),
            }
        }

        TokenKind::String(self.string_dict.get_or_insert(&value))
    }

    fn scan_hex_escape(&mut self, count: usize) -> Option<u32> {
        let mut code = 0u32;
        for _ in 0..count {
            let digit = self.peek()?.to_digit(16)?;
            self.advance();
            code = code * 16 + digit;
        }
        Some(code)
    }

    /// `\uXXXX` after the `u`. Surrogate pairs written as two escapes are
    /// combined; lone surrogates become U+FFFD since Rust strings cannot hold them.
    fn scan_unicode_escape(&mut self) -> Option<char> {
        let high = self.scan_hex_escape(4)?;
        if (0xD800..0xDC00).contains(&high) {
            let checkpoint = self.checkpoint();
            if self.match_char('\\') && self.match_char('u') {
                if let Some(low) = self.scan_hex_escape(4) {
                    if (0xDC00..0xE000).contains(&low) {
                        let combined = 0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00);
                        return char::from_u32(combined);
                    }
                }
            }
            self.restore(checkpoint);
            return Some('\u{FFFD}');
        }
        Some(char::from_u32(high).unwrap_or('\u{FFFD}'))
    }

    fn scan_number(&mut self, first: char) -> TokenKind {
        let mut num_str = String::new();

        if first == '0' {
            match self.peek() {
                Some('x' | 'X') => {
                    self.advance();
                    let mut value = 0f64;
                    let mut any = false;
                    while let Some(d) = self.peek().and_then(|c| c.to_digit(16)) {
                        value = value * 16.0 + d as f64;
                        any = true;
                        self.advance();
                    }
                    if !any {
                        return TokenKind::Invalid('x');
                    }
                    return TokenKind::Number(value);
                }
                Some('0'..='7') => {
                    // Legacy octal literal (0777); falls back to decimal if an 8 or 9 shows up
                    let mut digits = String::new();
                    while let Some(c @ '0'..='9') = self.peek() {
                        digits.push(c);
                        self.advance();
                    }
                    if digits.chars().all(|c| c.is_digit(8)) {
                        let value = digits
                            .chars()
                            .filter_map(|c| c.to_digit(8))
                            .fold(0f64, |acc, d| acc * 8.0 + d as f64);
                        return TokenKind::Number(value);
                    }
                    num_str.push_str(&digits);
                }
                _ => num_str.push(first),
            }
        } else if first != '.' {
            num_str.push(first);
        }

        if first != '.' {
            while let Some(ch @ '0'..='9') = self.peek() {
                num_str.push(ch);
                self.advance();
            }
        }

        if first == '.' {
            num_str.push_str("0.");
            while let Some(ch @ '0'..='9') = self.peek() {
                num_str.push(ch);
                self.advance();
            }
        } else if self.peek() == Some('.') {
            // `1.5`, `1.e5` and `1.` are numbers; `1..toString()` leaves the second dot
            self.advance();
            num_str.push('.');
            while let Some(ch @ '0'..='9') = self.peek() {
                num_str.push(ch);
                self.advance();
            }
        }

        if matches!(self.peek(), Some('e' | 'E')) {
            let checkpoint = self.checkpoint();
            let mut exponent = String::from("e");
            self.advance();
            if let Some(sign @ ('+' | '-')) = self.peek() {
                exponent.push(sign);
                self.advance();
            }
            let mut any = false;
            while let Some(ch @ '0'..='9') = self.peek() {
                exponent.push(ch);
                any = true;
                self.advance();
            }
            if any {
                num_str.push_str(&exponent);
            } else {
                self.restore(checkpoint);
                return TokenKind::Invalid('e');
            }
        }

        if num_str.ends_with('.') {
            num_str.push('0');
        }

        // An identifier may not start immediately after a numeric literal
        if self.peek().is_some_and(is_id_start) {
            return TokenKind::Invalid(self.peek().unwrap_or('0'));
        }

        TokenKind::Number(num_str.parse().unwrap_or(f64::NAN))
    }

    fn scan_identifier(&mut self, first: char) -> TokenKind {
        let mut name = String::new();
        name.push(first);

        while let Some(ch) = self.peek() {
            if is_id_continue(ch) {
                name.push(ch);
                self.advance();
            } else if ch == '\\' {
                self.advance();
                match self.identifier_escape() {
                    Some(c) => name.push(c),
                    None => return TokenKind::Invalid('\\'),
                }
            } else {
                break;
            }
        }

        keyword_or_identifier(&name).unwrap_or_else(|| {
            TokenKind::Identifier(self.string_dict.get_or_insert(&name))
        })
    }

    /// Identifier starting with a `\uXXXX` escape. Escaped keywords stay identifiers.
    fn scan_escaped_identifier(&mut self) -> TokenKind {
        match self.identifier_escape() {
            Some(c) if is_id_start(c) => match self.scan_identifier(c) {
                TokenKind::Identifier(name) => TokenKind::Identifier(name),
                other => match other.keyword_text() {
                    Some(text) => TokenKind::Identifier(self.string_dict.get_or_insert(text)),
                    None => other,
                },
            },
            _ => TokenKind::Invalid('\\'),
        }
    }

    fn identifier_escape(&mut self) -> Option<char> {
        if !self.match_char('u') {
            return None;
        }
        self.scan_hex_escape(4).and_then(char::from_u32)
    }
}

fn keyword_or_identifier(name: &str) -> Option<TokenKind> {
    Some(match name {
        "true" => TokenKind::True,
        "false" => TokenKind::False,
        "null" => TokenKind::Null,
        "var" => TokenKind::Var,
        "let" => TokenKind::Let,
        "const" => TokenKind::Const,
        "function" => TokenKind::Function,
        "return" => TokenKind::Return,
        "if" => TokenKind::If,
        "else" => TokenKind::Else,
        "for" => TokenKind::For,
        "while" => TokenKind::While,
        "do" => TokenKind::Do,
        "break" => TokenKind::Break,
        "continue" => TokenKind::Continue,
        "switch" => TokenKind::Switch,
        "case" => TokenKind::Case,
        "default" => TokenKind::Default,
        "try" => TokenKind::Try,
        "catch" => TokenKind::Catch,
        "finally" => TokenKind::Finally,
        "throw" => TokenKind::Throw,
        "new" => TokenKind::New,
        "this" => TokenKind::This,
        "with" => TokenKind::With,
        "typeof" => TokenKind::Typeof,
        "instanceof" => TokenKind::Instanceof,
        "in" => TokenKind::In,
        "void" => TokenKind::Void,
        "delete" => TokenKind::Delete,
        "debugger" => TokenKind::Debugger,
        _ => return None,
    })
}

/// ECMAScript line terminators: LF, CR, LS (U+2028), PS (U+2029)
fn is_line_terminator(ch: char) -> bool {
    matches!(ch, '\n' | '\r' | '\u{2028}' | '\u{2029}')
}

/// Check if a character can start an identifier
fn is_id_start(ch: char) -> bool {
    ch == '_' || ch == '$' || unicode_xid::UnicodeXID::is_xid_start(ch)
}

/// Check if a character can continue an identifier
fn is_id_continue(ch: char) -> bool {
    ch == '_'
        || ch == '$'
        || ch == '\u{200C}'
        || ch == '\u{200D}'
        || unicode_xid::UnicodeXID::is_xid_continue(ch)
}
