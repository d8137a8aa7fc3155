// Slot tokenizer: `text {ref:mod ? 'a' : 'b'} text`

use crate::domain::path;
use crate::error::SlotError;

/// Comparison operator in a slot condition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Equal,
    NotEqual,
    Less,
    LessEq,
    Greater,
    GreaterEq,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotToken<'a> {
    /// Literal text, with `{{` and `}}` already unescaped
    Text(&'a str),
    /// `{`
    Start,
    /// Parameter name, `$` path or `/` HTML path
    Reference(&'a str),
    /// `:F2`, `:urlEncode`
    Format(&'a str),
    /// `:/pattern/flags`
    Match(&'a str),
    /// `:[range]`, without the brackets
    Substring(&'a str),
    Operator(CompareOp),
    /// `?`
    Condition,
    /// Quoted text without the quotes
    Literal(&'a str),
    /// `:` between condition branches
    Else,
    /// `}`
    End,
}

#[derive(Debug, Clone, Copy)]
pub struct SlotCheckpoint<'a> {
    pos: usize,
    last: Option<SlotToken<'a>>,
}

/// Forward-only token cursor over slot text
#[derive(Debug, Clone)]
pub struct SlotLexer<'a> {
    src: &'a str,
    buf: &'a [u8],
    pos: usize,
    last: Option<SlotToken<'a>>,
}

impl<'a> SlotLexer<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            src: text,
            buf: text.as_bytes(),
            pos: 0,
            last: None,
        }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn checkpoint(&self) -> SlotCheckpoint<'a> {
        SlotCheckpoint {
            pos: self.pos,
            last: self.last,
        }
    }

    pub fn reset(&mut self, checkpoint: SlotCheckpoint<'a>) {
        self.pos = checkpoint.pos;
        self.last = checkpoint.last;
    }

    pub fn next_token(&mut self) -> Result<Option<SlotToken<'a>>, SlotError> {
        let token = match self.last {
            None | Some(SlotToken::Text(_)) | Some(SlotToken::End) => self.read_text()?,
            Some(SlotToken::Start) => Some(self.read_reference()?),
            Some(SlotToken::Reference(_))
            | Some(SlotToken::Format(_))
            | Some(SlotToken::Match(_))
            | Some(SlotToken::Substring(_)) => Some(self.read_modifier()?),
            Some(SlotToken::Operator(_)) => Some(self.read_literal()?),
            Some(SlotToken::Literal(_)) => Some(self.read_after_literal()?),
            Some(SlotToken::Condition) | Some(SlotToken::Else) => Some(self.read_literal()?),
        };
        if token.is_some() {
            self.last = token;
        }
        Ok(token)
    }

    fn read_text(&mut self) -> Result<Option<SlotToken<'a>>, SlotError> {
        if self.pos >= self.buf.len() {
            return Ok(None);
        }

        let start = self.pos;
        match self.buf[start] {
            b'{' if self.peek(1) == Some(b'{') => {
                self.pos += 2;
                return Ok(Some(SlotToken::Text(&self.src[start..start + 1])));
            }
            b'}' if self.peek(1) == Some(b'}') => {
                self.pos += 2;
                return Ok(Some(SlotToken::Text(&self.src[start..start + 1])));
            }
            b'{' => {
                // A brace that cannot open a slot stays literal
                let checkpoint = self.checkpoint();
                self.pos += 1;
                self.skip_spaces();
                if self.pos < self.buf.len() && is_reference_start(self.buf[self.pos]) {
                    self.pos = start + 1;
                    return Ok(Some(SlotToken::Start));
                }
                self.reset(checkpoint);
                self.pos += 1;
                return Ok(Some(SlotToken::Text(&self.src[start..start + 1])));
            }
            b'}' => {
                self.pos += 1;
                return Ok(Some(SlotToken::Text(&self.src[start..start + 1])));
            }
            _ => {}
        }

        let end = self.src[start..]
            .find(['{', '}'])
            .map_or(self.buf.len(), |offset| start + offset);
        self.pos = end;
        Ok(Some(SlotToken::Text(&self.src[start..end])))
    }

    fn read_reference(&mut self) -> Result<SlotToken<'a>, SlotError> {
        self.skip_spaces();
        let start = self.pos;
        let end = match self.buf.get(start) {
            Some(b'$') => start + path::embedded_len(&self.src[start..])?,
            Some(b'/') => self.html_path_end(start)?,
            Some(&ch) if is_name_start(ch) => {
                let mut end = start + 1;
                while end < self.buf.len() && is_name_char(self.buf[end]) {
                    end += 1;
                }
                end
            }
            _ => return Err(self.unexpected(start)),
        };
        self.pos = end;
        Ok(SlotToken::Reference(&self.src[start..end]))
    }

    /// An HTML path runs to a space, `}`, `:` or comparison character
    /// outside of `[...]` predicates
    fn html_path_end(&self, start: usize) -> Result<usize, SlotError> {
        let mut depth = 0usize;
        let mut quote: Option<u8> = None;
        let mut end = start;
        while end < self.buf.len() {
            let ch = self.buf[end];
            match quote {
                Some(q) if ch == q => quote = None,
                Some(_) => {}
                None => match ch {
                    b'\'' | b'"' if depth > 0 => quote = Some(ch),
                    b'[' => depth += 1,
                    b']' => depth = depth.saturating_sub(1),
                    b' ' | b'}' | b':' | b'<' | b'>' | b'=' | b'!' | b'?' if depth == 0 => break,
                    _ => {}
                },
            }
            end += 1;
        }
        if depth > 0 || quote.is_some() {
            return Err(SlotError::syntax(start, "unterminated predicate in HTML path"));
        }
        Ok(end)
    }

    /// After a reference or modifier: another modifier, a condition or `}`
    fn read_modifier(&mut self) -> Result<SlotToken<'a>, SlotError> {
        self.skip_spaces();
        let start = self.pos;
        let Some(&ch) = self.buf.get(start) else {
            return Err(self.unterminated());
        };

        match ch {
            b'}' => {
                self.pos += 1;
                Ok(SlotToken::End)
            }
            b'?' => {
                self.pos += 1;
                Ok(SlotToken::Condition)
            }
            b':' => match self.peek(1) {
                Some(b'/') => self.read_match(start + 1),
                Some(b'[') => self.read_substring(start + 2),
                _ => self.read_format(start + 1),
            },
            b'=' | b'!' | b'<' | b'>' => self.read_operator(start),
            _ => Err(self.unexpected(start)),
        }
    }

    fn read_format(&mut self, start: usize) -> Result<SlotToken<'a>, SlotError> {
        let end = self.src[start..]
            .find([' ', '}', ':', '=', '!', '<', '>', '?'])
            .map_or(self.buf.len(), |offset| start + offset);
        if end == start {
            return Err(SlotError::syntax(start, "empty format"));
        }
        self.pos = end;
        Ok(SlotToken::Format(&self.src[start..end]))
    }

    fn read_match(&mut self, start: usize) -> Result<SlotToken<'a>, SlotError> {
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
                    self.pos = end;
                    return Ok(SlotToken::Match(&self.src[start..end]));
                }
                _ => end += 1,
            }
        }
        Err(SlotError::syntax(start, "unterminated regex"))
    }

    fn read_substring(&mut self, start: usize) -> Result<SlotToken<'a>, SlotError> {
        match self.src[start..].find(']') {
            Some(offset) => {
                self.pos = start + offset + 1;
                Ok(SlotToken::Substring(&self.src[start..start + offset]))
            }
            None => Err(SlotError::syntax(start, "unterminated range")),
        }
    }

    fn read_operator(&mut self, start: usize) -> Result<SlotToken<'a>, SlotError> {
        let (op, width) = match (self.buf[start], self.peek(1)) {
            (b'=', Some(b'=')) => (CompareOp::Equal, 2),
            (b'!', Some(b'=')) => (CompareOp::NotEqual, 2),
            (b'<', Some(b'=')) => (CompareOp::LessEq, 2),
            (b'>', Some(b'=')) => (CompareOp::GreaterEq, 2),
            (b'<', _) => (CompareOp::Less, 1),
            (b'>', _) => (CompareOp::Greater, 1),
            _ => return Err(SlotError::syntax(start, "expected '==' or '!='")),
        };
        self.pos = start + width;
        Ok(SlotToken::Operator(op))
    }

    fn read_literal(&mut self) -> Result<SlotToken<'a>, SlotError> {
        self.skip_spaces();
        let start = self.pos;
        if self.buf.get(start) != Some(&b'\'') {
            return Err(match self.buf.get(start) {
                Some(_) => SlotError::syntax(start, "expected quoted text"),
                None => self.unterminated(),
            });
        }
        match self.src[start + 1..].find('\'') {
            Some(offset) => {
                self.pos = start + 1 + offset + 1;
                Ok(SlotToken::Literal(&self.src[start + 1..start + 1 + offset]))
            }
            None => Err(SlotError::syntax(start, "unterminated quoted text")),
        }
    }

    /// After quoted text: `?` after a comparand, `:` or `}` after a branch
    fn read_after_literal(&mut self) -> Result<SlotToken<'a>, SlotError> {
        self.skip_spaces();
        let start = self.pos;
        let Some(&ch) = self.buf.get(start) else {
            return Err(self.unterminated());
        };
        self.pos += 1;
        match ch {
            b'?' => Ok(SlotToken::Condition),
            b':' => Ok(SlotToken::Else),
            b'}' => Ok(SlotToken::End),
            _ => Err(self.unexpected(start)),
        }
    }

    fn peek(&self, offset: usize) -> Option<u8> {
        self.buf.get(self.pos + offset).copied()
    }

    fn skip_spaces(&mut self) {
        while self.pos < self.buf.len() && self.buf[self.pos].is_ascii_whitespace() {
            self.pos += 1;
        }
    }

    fn unexpected(&self, pos: usize) -> SlotError {
        let ch = self.src[pos..].chars().next().unwrap_or(' ');
        SlotError::syntax(pos, format!("unexpected character '{ch}' in slot"))
    }

    fn unterminated(&self) -> SlotError {
        SlotError::syntax(self.pos, "slot not terminated")
    }
}

fn is_reference_start(ch: u8) -> bool {
    ch == b'$' || ch == b'/' || is_name_start(ch)
}

fn is_name_start(ch: u8) -> bool {
    ch.is_ascii_alphabetic() || ch == b'_'
}

fn is_name_char(ch: u8) -> bool {
    ch.is_ascii_alphanumeric() || ch == b'_'
}
