// Streaming tokenizer for path queries

use crate::error::PathError;

/// Operators allowed inside `?( ... )`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOperator {
    Equal,
    NotEqual,
    Less,
    LessEq,
    Greater,
    GreaterEq,
    Matches,
    In,
    Nin,
    SubsetOf,
    AnyOf,
    NoneOf,
    Size,
    Empty,
}

impl FilterOperator {
    pub fn symbol(&self) -> &'static str {
        match self {
            FilterOperator::Equal => "==",
            FilterOperator::NotEqual => "!=",
            FilterOperator::Less => "<",
            FilterOperator::LessEq => "<=",
            FilterOperator::Greater => ">",
            FilterOperator::GreaterEq => ">=",
            FilterOperator::Matches => "=~",
            FilterOperator::In => "in",
            FilterOperator::Nin => "nin",
            FilterOperator::SubsetOf => "subsetof",
            FilterOperator::AnyOf => "anyof",
            FilterOperator::NoneOf => "noneof",
            FilterOperator::Size => "size",
            FilterOperator::Empty => "empty",
        }
    }
}

const SYMBOL_OPERATORS: [(&str, FilterOperator); 7] = [
    ("==", FilterOperator::Equal),
    ("!=", FilterOperator::NotEqual),
    ("<=", FilterOperator::LessEq),
    (">=", FilterOperator::GreaterEq),
    ("=~", FilterOperator::Matches),
    ("<", FilterOperator::Less),
    (">", FilterOperator::Greater),
];

const WORD_OPERATORS: [(&str, FilterOperator); 7] = [
    ("subsetof", FilterOperator::SubsetOf),
    ("noneof", FilterOperator::NoneOf),
    ("anyof", FilterOperator::AnyOf),
    ("empty", FilterOperator::Empty),
    ("size", FilterOperator::Size),
    ("nin", FilterOperator::Nin),
    ("in", FilterOperator::In),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token {
    None,
    /// `$`
    Root,
    /// `@`
    Current,
    /// `.`
    Child,
    /// `..`
    DeepScan,
    PropertyName,
    /// `*`
    Wildcard,
    /// `[`
    StartFilter,
    /// `]`
    EndFilter,
    /// `'...'`
    String,
    Number,
    /// `:`
    Slice,
    /// `?(`
    StartExpression,
    /// `)`
    EndExpression,
    /// `/pattern/flags`
    Regex,
    /// `[` opening a literal list after an operator
    StartList,
    /// `]` closing a literal list
    EndList,
    Operator(FilterOperator),
}

/// Saved cursor and lexical mode
#[derive(Debug, Clone, Copy)]
pub struct Checkpoint {
    pos: usize,
    token: Token,
    segment: (usize, usize),
    in_filter: bool,
    in_expression: bool,
    in_expression_filter: bool,
    in_list: bool,
    done: bool,
}

/// Forward-only token cursor over a path string.
///
/// There is no syntax tree: callers re-run a stretch of the path by taking a
/// [`Checkpoint`] and resetting to it.
#[derive(Debug, Clone)]
pub struct PathReader<'a> {
    src: &'a str,
    buf: &'a [u8],
    pos: usize,
    token: Token,
    segment: (usize, usize),
    in_filter: bool,
    in_expression: bool,
    in_expression_filter: bool,
    in_list: bool,
    done: bool,
    embedded: bool,
}

impl<'a> PathReader<'a> {
    pub fn new(path: &'a str) -> Self {
        Self {
            src: path,
            buf: path.as_bytes(),
            pos: 0,
            token: Token::None,
            segment: (0, 0),
            in_filter: false,
            in_expression: false,
            in_expression_filter: false,
            in_list: false,
            done: false,
            embedded: false,
        }
    }

    /// Reader for a path embedded in surrounding text: an unexpected
    /// character after a complete path ends the path instead of failing.
    pub fn embedded(text: &'a str) -> Self {
        Self {
            embedded: true,
            ..Self::new(text)
        }
    }

    pub fn token(&self) -> Token {
        self.token
    }

    /// Byte offset of the next unread character
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Text of the current name, string, number or regex token
    pub fn text(&self) -> &'a str {
        &self.src[self.segment.0..self.segment.1]
    }

    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            pos: self.pos,
            token: self.token,
            segment: self.segment,
            in_filter: self.in_filter,
            in_expression: self.in_expression,
            in_expression_filter: self.in_expression_filter,
            in_list: self.in_list,
            done: self.done,
        }
    }

    pub fn reset(&mut self, checkpoint: Checkpoint) {
        self.pos = checkpoint.pos;
        self.token = checkpoint.token;
        self.segment = checkpoint.segment;
        self.in_filter = checkpoint.in_filter;
        self.in_expression = checkpoint.in_expression;
        self.in_expression_filter = checkpoint.in_expression_filter;
        self.in_list = checkpoint.in_list;
        self.done = checkpoint.done;
    }

    /// Advance one token. Returns `false` once the path is complete.
    pub fn read(&mut self) -> Result<bool, PathError> {
        if self.done {
            return Ok(false);
        }

        if self.in_filter || self.in_expression || self.in_list {
            self.skip_spaces();
        }

        if self.pos >= self.buf.len() {
            self.done = true;
            return self.finish();
        }

        let start = self.pos;
        if self.next_token()? {
            return Ok(true);
        }

        if self.embedded && self.is_terminal() {
            self.pos = start;
            self.done = true;
            return Ok(false);
        }

        Err(PathError::syntax(
            start,
            format!("unexpected character '{}'", self.char_at(start)),
        ))
    }

    /// Consume the whole path and return its length in bytes
    pub fn read_to_end(&mut self) -> Result<usize, PathError> {
        while self.read()? {}
        Ok(self.pos)
    }

    fn finish(&self) -> Result<bool, PathError> {
        if self.is_terminal() {
            return Ok(false);
        }
        if self.in_expression {
            return Err(PathError::Unterminated {
                construct: "Expression",
                position: self.pos,
            });
        }
        if self.in_filter || self.in_list {
            return Err(PathError::Unterminated {
                construct: "Filter",
                position: self.pos,
            });
        }
        Err(PathError::syntax(self.pos, "unexpected end of path"))
    }

    fn is_terminal(&self) -> bool {
        if self.in_filter || self.in_expression || self.in_list {
            return false;
        }
        matches!(
            self.token,
            Token::Root | Token::PropertyName | Token::Wildcard | Token::EndFilter
        )
    }

    fn in_bracket(&self) -> bool {
        if self.in_expression {
            self.in_expression_filter
        } else {
            self.in_filter
        }
    }

    fn next_token(&mut self) -> Result<bool, PathError> {
        let ch = self.buf[self.pos];
        match self.token {
            Token::None => Ok(self.read_root(ch)),
            Token::Root | Token::Current | Token::PropertyName | Token::EndFilter => {
                Ok(self.read_after_node(ch))
            }
            Token::Wildcard if self.in_bracket() => Ok(self.read_end_filter(ch)),
            Token::Wildcard => Ok(self.read_after_node(ch)),
            Token::Child | Token::DeepScan => Ok(self.read_member(ch)),
            Token::StartFilter => self.read_filter_start(ch),
            Token::String | Token::Number => self.read_after_literal(ch),
            Token::Slice => {
                if is_number_start(ch) {
                    self.read_number(false)
                } else {
                    Ok(self.read_end_filter(ch))
                }
            }
            Token::StartExpression => Ok(self.read_operand_path(ch)),
            Token::Operator(FilterOperator::Empty) => Ok(self.read_end_expression(ch)),
            Token::Operator(_) => self.read_operand(ch),
            Token::Regex | Token::EndList => Ok(self.read_end_expression(ch)),
            Token::StartList => {
                if ch == b']' {
                    self.in_list = false;
                    Ok(self.set(Token::EndList, 1))
                } else {
                    self.read_list_item(ch)
                }
            }
            Token::EndExpression => Ok(self.read_end_filter(ch)),
        }
    }

    fn read_root(&mut self, ch: u8) -> bool {
        ch == b'$' && self.set(Token::Root, 1)
    }

    /// After `$`, `@`, a name, `*` or `]`
    fn read_after_node(&mut self, ch: u8) -> bool {
        match ch {
            b'.' if self.peek(1) == Some(b'.') => self.set(Token::DeepScan, 2),
            b'.' => self.set(Token::Child, 1),
            b'[' => {
                if self.in_expression {
                    self.in_expression_filter = true;
                } else {
                    self.in_filter = true;
                }
                self.set(Token::StartFilter, 1)
            }
            _ if self.in_expression && !self.in_expression_filter => {
                self.read_end_expression(ch) || self.read_operator()
            }
            _ => false,
        }
    }

    /// After `.` or `..`
    fn read_member(&mut self, ch: u8) -> bool {
        if ch == b'*' {
            return self.set(Token::Wildcard, 1);
        }
        if !is_name_start(ch) {
            return false;
        }
        let start = self.pos;
        let mut end = start + 1;
        while end < self.buf.len() && is_name_char(self.buf[end]) {
            end += 1;
        }
        self.segment = (start, end);
        self.token = Token::PropertyName;
        self.pos = end;
        true
    }

    fn read_filter_start(&mut self, ch: u8) -> Result<bool, PathError> {
        match ch {
            b'\'' => self.read_string(),
            b':' => Ok(self.set(Token::Slice, 1)),
            b'*' => Ok(self.set(Token::Wildcard, 1)),
            b'?' if self.peek(1) == Some(b'(') => {
                if self.in_expression {
                    return Err(PathError::syntax(self.pos, "nested filter expression"));
                }
                self.in_expression = true;
                Ok(self.set(Token::StartExpression, 2))
            }
            _ if is_number_start(ch) => self.read_number(false),
            _ => Ok(false),
        }
    }

    /// After a string or number: list separators, slices and closers
    fn read_after_literal(&mut self, ch: u8) -> Result<bool, PathError> {
        if self.in_list {
            return match ch {
                b',' => {
                    self.pos += 1;
                    self.skip_spaces();
                    match self.buf.get(self.pos) {
                        Some(&c) => self.read_list_item(c),
                        None => Ok(false),
                    }
                }
                b']' => {
                    self.in_list = false;
                    Ok(self.set(Token::EndList, 1))
                }
                _ => Ok(false),
            };
        }

        if self.in_bracket() {
            return match ch {
                b',' => {
                    let kind = self.token;
                    self.pos += 1;
                    self.skip_spaces();
                    match (kind, self.buf.get(self.pos)) {
                        (Token::String, Some(b'\'')) => self.read_string(),
                        (Token::Number, Some(&c)) if is_number_start(c) => self.read_number(false),
                        _ => Ok(false),
                    }
                }
                b':' if self.token == Token::Number => Ok(self.set(Token::Slice, 1)),
                _ => Ok(self.read_end_filter(ch)),
            };
        }

        // Literal right-hand operand
        Ok(self.read_end_expression(ch))
    }

    fn read_list_item(&mut self, ch: u8) -> Result<bool, PathError> {
        match ch {
            b'\'' => self.read_string(),
            _ if is_number_start(ch) => self.read_number(true),
            _ => Ok(false),
        }
    }

    /// Start of an expression operand: `@` or `$`
    fn read_operand_path(&mut self, ch: u8) -> bool {
        match ch {
            b'@' => self.set(Token::Current, 1),
            b'$' => self.set(Token::Root, 1),
            _ => false,
        }
    }

    /// Right-hand side of an operator
    fn read_operand(&mut self, ch: u8) -> Result<bool, PathError> {
        match ch {
            b'@' | b'$' => Ok(self.read_operand_path(ch)),
            b'\'' => self.read_string(),
            b'/' => self.read_regex(),
            b'[' => {
                self.in_list = true;
                Ok(self.set(Token::StartList, 1))
            }
            _ if is_number_start(ch) => self.read_number(true),
            _ => Ok(false),
        }
    }

    fn read_end_filter(&mut self, ch: u8) -> bool {
        if ch != b']' {
            return false;
        }
        if self.in_expression {
            self.in_expression_filter = false;
        } else {
            self.in_filter = false;
        }
        self.set(Token::EndFilter, 1)
    }

    fn read_end_expression(&mut self, ch: u8) -> bool {
        if ch != b')' || !self.in_expression || self.in_expression_filter {
            return false;
        }
        self.in_expression = false;
        self.set(Token::EndExpression, 1)
    }

    fn read_operator(&mut self) -> bool {
        let rest = &self.src[self.pos..];
        for (symbol, op) in SYMBOL_OPERATORS {
            if rest.starts_with(symbol) {
                return self.set(Token::Operator(op), symbol.len());
            }
        }
        for (word, op) in WORD_OPERATORS {
            let boundary = rest
                .as_bytes()
                .get(word.len())
                .map_or(true, |&c| !is_name_char(c));
            if rest.starts_with(word) && boundary {
                return self.set(Token::Operator(op), word.len());
            }
        }
        false
    }

    fn read_string(&mut self) -> Result<bool, PathError> {
        let open = self.pos;
        let start = open + 1;
        match self.src[start..].find('\'') {
            Some(len) => {
                self.segment = (start, start + len);
                self.token = Token::String;
                self.pos = start + len + 1;
                Ok(true)
            }
            None => Err(PathError::Unterminated {
                construct: "String",
                position: open,
            }),
        }
    }

    /// `-?\d+`, or `-?\d+(\.\d+)?` when `fraction` is allowed
    fn read_number(&mut self, fraction: bool) -> Result<bool, PathError> {
        let start = self.pos;
        let mut end = start;
        if self.buf[end] == b'-' {
            end += 1;
        }
        let digits = end;
        while end < self.buf.len() && self.buf[end].is_ascii_digit() {
            end += 1;
        }
        if end == digits {
            return Err(PathError::syntax(start, "expected digits"));
        }
        if fraction && self.buf.get(end) == Some(&b'.') {
            let decimals = end + 1;
            end = decimals;
            while end < self.buf.len() && self.buf[end].is_ascii_digit() {
                end += 1;
            }
            if end == decimals {
                return Err(PathError::syntax(end, "expected digits after '.'"));
            }
        }
        self.segment = (start, end);
        self.token = Token::Number;
        self.pos = end;
        Ok(true)
    }

    /// `/pattern/flags`; `\/` does not close the pattern
    fn read_regex(&mut self) -> Result<bool, PathError> {
        let start = self.pos;
        let mut end = start + 1;
        while end < self.buf.len() {
            match self.buf[end] {
                b'\\' => end += 2,
                b'/' => {
                    end += 1;
                    while end < self.buf.len() && matches!(self.buf[end], b'g' | b'i' | b'm' | b's')
                    {
                        end += 1;
                    }
                    self.segment = (start, end);
                    self.token = Token::Regex;
                    self.pos = end;
                    return Ok(true);
                }
                _ => end += 1,
            }
        }
        Err(PathError::Unterminated {
            construct: "Regex",
            position: start,
        })
    }

    fn set(&mut self, token: Token, width: usize) -> bool {
        self.segment = (self.pos, self.pos + width);
        self.token = token;
        self.pos += width;
        true
    }

    fn peek(&self, offset: usize) -> Option<u8> {
        self.buf.get(self.pos + offset).copied()
    }

    fn skip_spaces(&mut self) {
        while self.pos < self.buf.len() && self.buf[self.pos] == b' ' {
            self.pos += 1;
        }
    }

    fn char_at(&self, pos: usize) -> char {
        self.src[pos..].chars().next().unwrap_or(' ')
    }
}

fn is_name_start(ch: u8) -> bool {
    ch.is_ascii_alphabetic() || ch == b'_' || ch >= 0x80
}

fn is_name_char(ch: u8) -> bool {
    ch.is_ascii_alphanumeric() || ch == b'_' || ch >= 0x80
}

fn is_number_start(ch: u8) -> bool {
    ch == b'-' || ch.is_ascii_digit()
}
