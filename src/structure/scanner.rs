//! Declaration scanner for Swift source
//!
//! Not a Swift parser: it tokenizes just enough (words, literals, punctuation
//! and line breaks, with comments dropped) to recover the
//! declaration skeleton a structure request would report: type
//! declarations, functions and their bodies, and `let`/`var` declarations
//! with their setter accessibility and accessor bodies.
//!
//! Byte ranges follow the declaration introducer: a variable's range starts
//! at its `let`/`var` keyword and runs to the end of the declaration,
//! initializer included.

use super::{DeclarationKind, ParseError, StructureNode, StructureParser};
use crate::text::ByteRange;

/// The scanner as a [`StructureParser`]
#[derive(Debug, Default, Clone, Copy)]
pub struct DeclarationScanner;

impl DeclarationScanner {
    pub fn new() -> Self {
        Self
    }
}

impl StructureParser for DeclarationScanner {
    fn parse(&self, source: &str) -> Result<StructureNode, ParseError> {
        let (tokens, _) = tokenize(source)?;
        let mut scanner = Scanner {
            source,
            tokens,
            pos: 0,
        };
        let items = scanner.parse_items(Scope::File, None)?;
        Ok(StructureNode::new(None, Some(ByteRange::new(0, source.len()))).with_children(items))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TokenKind {
    Word,
    Literal,
    Punct(u8),
    Newline,
}

#[derive(Debug, Clone, Copy)]
struct Token {
    kind: TokenKind,
    start: usize,
    end: usize,
}

fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'$' || b >= 0x80
}

/// Byte ranges of the `//` comments in `source`, each running from the
/// slashes to the end of its line. Comment markers inside string literals
/// and block comments are not comments.
pub fn line_comments(source: &str) -> Result<Vec<ByteRange>, ParseError> {
    tokenize(source).map(|(_, comments)| comments)
}

/// Tokens, plus the line comments dropped along the way
fn tokenize(source: &str) -> Result<(Vec<Token>, Vec<ByteRange>), ParseError> {
    let bytes = source.as_bytes();
    let mut tokens = Vec::new();
    let mut comments = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        match b {
            b'\n' => {
                tokens.push(Token {
                    kind: TokenKind::Newline,
                    start: i,
                    end: i + 1,
                });
                i += 1;
            }
            b' ' | b'\t' | b'\r' => i += 1,
            b'/' if bytes.get(i + 1) == Some(&b'/') => {
                let start = i;
                while i < bytes.len() && bytes[i] != b'\n' {
                    i += 1;
                }
                comments.push(ByteRange::new(start, i - start));
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                i = skip_block_comment(bytes, i, &mut tokens)?;
            }
            b'"' | b'#' if b == b'"' || raw_string_hashes(bytes, i) > 0 => {
                let hashes = raw_string_hashes(bytes, i);
                let end = skip_string(bytes, i + hashes, hashes)?;
                tokens.push(Token {
                    kind: TokenKind::Literal,
                    start: i,
                    end,
                });
                i = end;
            }
            b if is_word_byte(b) => {
                let start = i;
                while i < bytes.len() && is_word_byte(bytes[i]) {
                    i += 1;
                }
                tokens.push(Token {
                    kind: TokenKind::Word,
                    start,
                    end: i,
                });
            }
            _ => {
                tokens.push(Token {
                    kind: TokenKind::Punct(b),
                    start: i,
                    end: i + 1,
                });
                i += 1;
            }
        }
    }

    Ok((tokens, comments))
}

/// Number of `#` opening a raw string at `i`, or 0
fn raw_string_hashes(bytes: &[u8], i: usize) -> usize {
    let hashes = bytes[i..].iter().take_while(|&&b| b == b'#').count();
    if bytes.get(i + hashes) == Some(&b'"') {
        hashes
    } else {
        0
    }
}

fn skip_block_comment(bytes: &[u8], start: usize, tokens: &mut Vec<Token>) -> Result<usize, ParseError> {
    let mut depth = 0;
    let mut i = start;
    let mut newline_at = None;

    while i < bytes.len() {
        if bytes[i..].starts_with(b"/*") {
            depth += 1;
            i += 2;
        } else if bytes[i..].starts_with(b"*/") {
            depth -= 1;
            i += 2;
            if depth == 0 {
                // A comment spanning lines still separates statements.
                if let Some(at) = newline_at {
                    tokens.push(Token {
                        kind: TokenKind::Newline,
                        start: at,
                        end: at + 1,
                    });
                }
                return Ok(i);
            }
        } else {
            if bytes[i] == b'\n' && newline_at.is_none() {
                newline_at = Some(i);
            }
            i += 1;
        }
    }

    Err(ParseError::Unterminated {
        what: "block comment",
        offset: start,
    })
}

/// Skip a string literal whose opening quote is at `quote`; returns the index
/// just past the closing delimiter (including trailing `#`s of raw strings).
fn skip_string(bytes: &[u8], quote: usize, hashes: usize) -> Result<usize, ParseError> {
    let multiline = bytes[quote..].starts_with(b"\"\"\"");
    let mut i = quote + if multiline { 3 } else { 1 };

    let closes_at = |i: usize| -> Option<usize> {
        let delimiter_len = if multiline { 3 } else { 1 };
        let quotes = &bytes[i..];
        if quotes.len() < delimiter_len + hashes {
            return None;
        }
        let is_quote_run = quotes[..delimiter_len].iter().all(|&b| b == b'"');
        let is_hash_run = quotes[delimiter_len..delimiter_len + hashes].iter().all(|&b| b == b'#');
        (is_quote_run && is_hash_run).then_some(i + delimiter_len + hashes)
    };

    while i < bytes.len() {
        match bytes[i] {
            b'\\' if hashes == 0 => {
                if bytes.get(i + 1) == Some(&b'(') {
                    i = skip_interpolation(bytes, i + 1)?;
                } else {
                    i += 2;
                }
            }
            b'\n' if !multiline => break,
            b'"' => {
                if let Some(after) = closes_at(i) {
                    return Ok(after);
                }
                i += 1;
            }
            _ => i += 1,
        }
    }

    Err(ParseError::Unterminated {
        what: "string literal",
        offset: quote,
    })
}

/// Skip `( ... )` of a string interpolation starting at the `(`
fn skip_interpolation(bytes: &[u8], open: usize) -> Result<usize, ParseError> {
    let mut depth = 0;
    let mut i = open;
    while i < bytes.len() {
        match bytes[i] {
            b'(' => {
                depth += 1;
                i += 1;
            }
            b')' => {
                depth -= 1;
                i += 1;
                if depth == 0 {
                    return Ok(i);
                }
            }
            b'"' => i = skip_string(bytes, i, 0)?,
            _ => i += 1,
        }
    }
    Err(ParseError::Unterminated {
        what: "string interpolation",
        offset: open,
    })
}

/// What kind of body the scanner is currently inside
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scope {
    File,
    Type,
    Code,
}

#[derive(Debug, Default)]
struct Modifiers {
    is_static: bool,
    is_class: bool,
    setter_accessibility: Option<String>,
}

const DECLARATION_MODIFIERS: &[&str] = &[
    "override",
    "final",
    "required",
    "convenience",
    "dynamic",
    "lazy",
    "weak",
    "unowned",
    "mutating",
    "nonmutating",
    "indirect",
    "optional",
    "nonisolated",
    "isolated",
    "prefix",
    "postfix",
    "infix",
    "distributed",
];

const ACCESS_LEVELS: &[&str] = &["private", "fileprivate", "internal", "package", "public", "open"];

/// Words after `class` that make it a modifier rather than a declaration
const CLASS_MODIFIER_FOLLOWERS: &[&str] = &[
    "func",
    "var",
    "let",
    "subscript",
    "override",
    "final",
    "required",
    "convenience",
    "dynamic",
    "static",
    "nonisolated",
    "private",
    "fileprivate",
    "internal",
    "package",
    "public",
    "open",
];

/// Words before `let`/`var` that make it a binding pattern, not a declaration
const BINDING_CONTEXTS: &[&str] = &["if", "guard", "while", "case", "for", "catch"];

struct Scanner<'a> {
    source: &'a str,
    tokens: Vec<Token>,
    pos: usize,
}

impl<'a> Scanner<'a> {
    fn text(&self, index: usize) -> &'a str {
        let token = self.tokens[index];
        &self.source[token.start..token.end]
    }

    fn is_punct(&self, index: usize, punct: u8) -> bool {
        self.tokens
            .get(index)
            .map_or(false, |t| t.kind == TokenKind::Punct(punct))
    }

    fn is_word(&self, index: usize) -> bool {
        self.tokens.get(index).map_or(false, |t| t.kind == TokenKind::Word)
    }

    fn next_significant(&self, index: usize) -> Option<usize> {
        (index..self.tokens.len()).find(|&i| self.tokens[i].kind != TokenKind::Newline)
    }

    fn prev_significant(&self, index: usize) -> Option<usize> {
        (0..index).rev().find(|&i| self.tokens[i].kind != TokenKind::Newline)
    }

    fn next_word_is(&self, index: usize, words: &[&str]) -> bool {
        self.next_significant(index)
            .filter(|&i| self.is_word(i))
            .map_or(false, |i| words.contains(&self.text(i)))
    }

    /// Parse declarations until the `}` matching `open`, or until the end of
    /// input when `open` is `None`. On return `pos` is past the closing `}`.
    fn parse_items(&mut self, scope: Scope, open: Option<Token>) -> Result<Vec<StructureNode>, ParseError> {
        let mut items = Vec::new();
        let mut modifiers = Modifiers::default();

        while self.pos < self.tokens.len() {
            let index = self.pos;
            let token = self.tokens[index];

            match token.kind {
                TokenKind::Newline => self.pos += 1,
                TokenKind::Punct(b'}') => {
                    if open.is_none() {
                        return Err(ParseError::Unbalanced {
                            delimiter: '}',
                            offset: token.start,
                        });
                    }
                    self.pos += 1;
                    return Ok(items);
                }
                TokenKind::Punct(b'{') => {
                    self.pos += 1;
                    let block_scope = if scope == Scope::Type { Scope::Type } else { Scope::Code };
                    items.extend(self.parse_items(block_scope, Some(token))?);
                    modifiers = Modifiers::default();
                }
                TokenKind::Punct(b';') => {
                    modifiers = Modifiers::default();
                    self.pos += 1;
                }
                TokenKind::Punct(b'@') => self.skip_attribute(),
                TokenKind::Punct(_) => self.pos += 1,
                TokenKind::Literal => {
                    modifiers = Modifiers::default();
                    self.pos += 1;
                }
                TokenKind::Word => {
                    let word = self.text(index);
                    match word {
                        "static" => {
                            modifiers.is_static = true;
                            self.pos += 1;
                        }
                        "class" if self.next_word_is(index + 1, CLASS_MODIFIER_FOLLOWERS) => {
                            modifiers.is_class = true;
                            self.pos += 1;
                        }
                        access if ACCESS_LEVELS.contains(&access) => {
                            self.pos += 1;
                            if self.skip_setter_suffix() {
                                modifiers.setter_accessibility =
                                    Some(format!("source.lang.swift.accessibility.{}", access));
                            }
                        }
                        "struct" | "class" | "enum" | "protocol" | "extension" | "actor"
                            if self.starts_type_declaration(index) =>
                        {
                            if let Some(node) = self.parse_type(index)? {
                                items.push(node);
                            }
                            modifiers = Modifiers::default();
                        }
                        "func" | "init" | "deinit" | "subscript" if self.starts_function(index) => {
                            items.push(self.parse_function(index, scope, &modifiers)?);
                            modifiers = Modifiers::default();
                        }
                        "let" | "var" => {
                            if self.is_binding_pattern(index) {
                                self.pos += 1;
                            } else {
                                items.push(self.parse_variable(index, scope, &modifiers)?);
                                modifiers = Modifiers::default();
                            }
                        }
                        modifier if DECLARATION_MODIFIERS.contains(&modifier) => {
                            self.pos += 1;
                            if self.is_punct(self.pos, b'(') {
                                self.pos = self.skip_group(self.pos);
                            }
                        }
                        _ => {
                            modifiers = Modifiers::default();
                            self.pos += 1;
                        }
                    }
                }
            }
        }

        match open {
            Some(token) => Err(ParseError::Unbalanced {
                delimiter: '{',
                offset: token.start,
            }),
            None => Ok(items),
        }
    }

    /// Skip `@name` and an argument list directly attached to it
    fn skip_attribute(&mut self) {
        self.pos += 1;
        if self.is_word(self.pos) {
            self.pos += 1;
            if self.is_punct(self.pos, b'(') {
                self.pos = self.skip_group(self.pos);
            }
        }
    }

    /// Index just past the group opened at `open`
    fn skip_group(&self, open: usize) -> usize {
        let mut depth = 0usize;
        for i in open..self.tokens.len() {
            match self.tokens[i].kind {
                TokenKind::Punct(b'(') | TokenKind::Punct(b'[') => depth += 1,
                TokenKind::Punct(b')') | TokenKind::Punct(b']') => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        return i + 1;
                    }
                }
                _ => {}
            }
        }
        self.tokens.len()
    }

    /// Consume `(set)` after an access level, if present
    fn skip_setter_suffix(&mut self) -> bool {
        let p = self.pos;
        let is_setter = self.is_punct(p, b'(')
            && self.is_word(p + 1)
            && self.text(p + 1) == "set"
            && self.is_punct(p + 2, b')');
        if is_setter {
            self.pos += 3;
        }
        is_setter
    }

    fn starts_type_declaration(&self, index: usize) -> bool {
        let after_member_or_constraint = self
            .prev_significant(index)
            .map_or(false, |p| self.is_punct(p, b'.') || self.is_punct(p, b':') || self.is_punct(p, b','));
        let named = self.next_significant(index + 1).map_or(false, |n| self.is_word(n));
        !after_member_or_constraint && named
    }

    fn starts_function(&self, index: usize) -> bool {
        let is_member_access = self
            .prev_significant(index)
            .map_or(false, |p| self.is_punct(p, b'.'));
        !is_member_access
    }

    fn is_binding_pattern(&self, index: usize) -> bool {
        match self.prev_significant(index) {
            Some(p) if self.is_word(p) => BINDING_CONTEXTS.contains(&self.text(p)),
            Some(p) => self.is_punct(p, b',') || self.is_punct(p, b'('),
            None => false,
        }
    }

    fn is_arrow_end(&self, index: usize) -> bool {
        self.is_punct(index, b'>') && index > 0 && self.is_punct(index - 1, b'-')
    }

    /// Whether a line break inside a declaration header continues the header
    fn header_continues(&self, newline: usize) -> bool {
        let previous_continues = self.prev_significant(newline).map_or(false, |p| {
            self.is_punct(p, b':') || self.is_punct(p, b',') || self.is_punct(p, b'&') || self.is_arrow_end(p)
        });
        let next_continues = self.next_significant(newline).map_or(false, |n| {
            self.is_punct(n, b'{')
                || self.is_punct(n, b':')
                || self.is_punct(n, b',')
                || self.is_punct(n, b'&')
                || self.is_punct(n, b'-')
                || (self.is_word(n) && ["where", "throws", "rethrows", "async"].contains(&self.text(n)))
        });
        previous_continues || next_continues
    }

    /// Find the `{` opening the body of the declaration whose header starts at
    /// `from`. Returns the brace index, or the index where the header ended.
    fn find_body_open(&self, from: usize) -> Result<usize, usize> {
        let mut depth = 0usize;
        for i in from..self.tokens.len() {
            match self.tokens[i].kind {
                TokenKind::Punct(b'{') if depth == 0 => return Ok(i),
                TokenKind::Punct(b'(') | TokenKind::Punct(b'[') | TokenKind::Punct(b'{') => depth += 1,
                TokenKind::Punct(b')') | TokenKind::Punct(b']') => depth = depth.saturating_sub(1),
                TokenKind::Punct(b'}') if depth == 0 => return Err(i),
                TokenKind::Punct(b'}') => depth -= 1,
                TokenKind::Punct(b';') if depth == 0 => return Err(i),
                TokenKind::Newline if depth == 0 && !self.header_continues(i) => return Err(i),
                _ => {}
            }
        }
        Err(self.tokens.len())
    }

    /// Byte end of the last significant token before `index`, not before `floor`
    fn end_before(&self, index: usize, floor: usize) -> usize {
        self.prev_significant(index)
            .filter(|&p| p >= floor)
            .map_or(self.tokens[floor].end, |p| self.tokens[p].end)
    }

    /// Parse a `{ ... }` body opened at `open`; returns children and the `}` token
    fn parse_body(&mut self, open: usize, scope: Scope) -> Result<(Vec<StructureNode>, Token), ParseError> {
        self.pos = open + 1;
        let children = self.parse_items(scope, Some(self.tokens[open]))?;
        Ok((children, self.tokens[self.pos - 1]))
    }

    fn parse_type(&mut self, keyword: usize) -> Result<Option<StructureNode>, ParseError> {
        let kind = match self.text(keyword) {
            "struct" => DeclarationKind::Struct,
            "class" => DeclarationKind::Class,
            "enum" => DeclarationKind::Enum,
            "protocol" => DeclarationKind::Protocol,
            "actor" => DeclarationKind::Actor,
            _ => DeclarationKind::Extension,
        };

        let open = match self.find_body_open(keyword + 1) {
            Ok(open) => open,
            Err(stop) => {
                // `import struct Module.Type` and friends
                self.pos = stop;
                return Ok(None);
            }
        };

        let start = self.tokens[keyword].start;
        let open_end = self.tokens[open].end;
        let (children, close) = self.parse_body(open, Scope::Type)?;

        Ok(Some(
            StructureNode::new(Some(kind), Some(ByteRange::new(start, close.end - start)))
                .with_body_length(close.start - open_end)
                .with_children(children),
        ))
    }

    fn parse_function(
        &mut self,
        keyword: usize,
        scope: Scope,
        modifiers: &Modifiers,
    ) -> Result<StructureNode, ParseError> {
        let kind = match (self.text(keyword), scope) {
            ("init", _) => DeclarationKind::FunctionConstructor,
            ("deinit", _) => DeclarationKind::FunctionDestructor,
            ("subscript", _) => DeclarationKind::FunctionSubscript,
            (_, Scope::Type) if modifiers.is_static => DeclarationKind::FunctionMethodStatic,
            (_, Scope::Type) if modifiers.is_class => DeclarationKind::FunctionMethodClass,
            (_, Scope::Type) => DeclarationKind::FunctionMethodInstance,
            _ => DeclarationKind::FunctionFree,
        };
        let start = self.tokens[keyword].start;

        match self.find_body_open(keyword + 1) {
            Ok(open) => {
                let open_end = self.tokens[open].end;
                let (children, close) = self.parse_body(open, Scope::Code)?;
                Ok(
                    StructureNode::new(Some(kind), Some(ByteRange::new(start, close.end - start)))
                        .with_body_length(close.start - open_end)
                        .with_children(children),
                )
            }
            Err(stop) => {
                let end = self.end_before(stop, keyword);
                self.pos = stop;
                Ok(StructureNode::new(Some(kind), Some(ByteRange::new(start, end - start))))
            }
        }
    }

    /// A lone `=` (not part of `==`, `<=`, `!=`, `>=`, `===`)
    fn is_assignment(&self, index: usize) -> bool {
        let at = self.tokens[index].start;
        let bytes = self.source.as_bytes();
        let before = at.checked_sub(1).map(|i| bytes[i]);
        let after = bytes.get(at + 1).copied();
        !matches!(before, Some(b'=' | b'!' | b'<' | b'>')) && after != Some(b'=')
    }

    /// A ternary `?` (whitespace before it) or the end of `??`; one glued to
    /// the previous token is a postfix optional (`Int?`, `foo()?`)
    fn is_ternary_mark(&self, index: usize) -> bool {
        let at = self.tokens[index].start;
        at.checked_sub(1)
            .map_or(false, |i| matches!(self.source.as_bytes()[i], b' ' | b'\t' | b'?'))
    }

    /// Whether a line break inside a variable declaration continues it
    fn variable_continues(&self, newline: usize, seen_assignment: bool) -> bool {
        const TRAILING: &[u8] = b"=,.:+-*/&|?<([";
        const LEADING: &[u8] = b".?+*/&|=";

        let previous_continues = self.prev_significant(newline).map_or(false, |p| match self.tokens[p].kind {
            TokenKind::Punct(b'?') => self.is_ternary_mark(p),
            TokenKind::Punct(b) => TRAILING.contains(&b),
            _ => false,
        });
        let next_continues = self.next_significant(newline).map_or(false, |n| match self.tokens[n].kind {
            TokenKind::Punct(b'{') => !seen_assignment,
            TokenKind::Punct(b) => LEADING.contains(&b),
            _ => false,
        });
        previous_continues || next_continues
    }

    fn parse_variable(
        &mut self,
        keyword: usize,
        scope: Scope,
        modifiers: &Modifiers,
    ) -> Result<StructureNode, ParseError> {
        let kind = match scope {
            Scope::File => DeclarationKind::VarGlobal,
            Scope::Code => DeclarationKind::VarLocal,
            Scope::Type if modifiers.is_static => DeclarationKind::VarStatic,
            Scope::Type if modifiers.is_class => DeclarationKind::VarClass,
            Scope::Type => DeclarationKind::VarInstance,
        };
        let start = self.tokens[keyword].start;
        let mut end = self.tokens[keyword].end;
        let mut body_length = None;
        let mut depth = 0usize;
        let mut seen_assignment = false;
        let mut i = keyword + 1;

        while i < self.tokens.len() {
            let token = self.tokens[i];
            match token.kind {
                TokenKind::Punct(b'{') if depth == 0 => {
                    let is_accessor_block =
                        !seen_assignment || self.next_word_is(i + 1, &["willSet", "didSet"]);
                    if is_accessor_block {
                        let (_, close) = self.parse_body(i, Scope::Code)?;
                        body_length = Some(close.start - token.end);
                        end = close.end;
                        i = self.pos;
                        break;
                    }
                    depth += 1;
                }
                TokenKind::Punct(b'(') | TokenKind::Punct(b'[') | TokenKind::Punct(b'{') => depth += 1,
                TokenKind::Punct(b')') | TokenKind::Punct(b']') | TokenKind::Punct(b'}') if depth == 0 => break,
                TokenKind::Punct(b')') | TokenKind::Punct(b']') | TokenKind::Punct(b'}') => depth -= 1,
                TokenKind::Punct(b';') if depth == 0 => break,
                TokenKind::Punct(b'=') if depth == 0 && self.is_assignment(i) => seen_assignment = true,
                TokenKind::Newline if depth == 0 && !self.variable_continues(i, seen_assignment) => break,
                _ => {}
            }
            if token.kind != TokenKind::Newline {
                end = token.end;
            }
            i += 1;
        }
        self.pos = i;

        let mut node = StructureNode::new(Some(kind), Some(ByteRange::new(start, end - start)));
        if let Some(length) = body_length {
            node = node.with_body_length(length);
        }
        if let Some(accessibility) = &modifiers.setter_accessibility {
            node = node.with_setter_accessibility(accessibility.clone());
        }
        Ok(node)
    }
}
