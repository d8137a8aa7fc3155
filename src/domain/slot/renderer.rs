// Slot rendering straight off the token stream

use super::lexer::{CompareOp, SlotLexer, SlotToken};
use super::pipeline::PipelineRegistry;
use crate::domain::parameter::Parameter;
use crate::domain::path::value::compile_regex;
use crate::domain::value::parse_decimal;
use crate::error::{Error, PathError, Result, SlotError};

/// Renders slot text against a parameter context
pub struct SlotRenderer {
    registry: PipelineRegistry,
}

impl SlotRenderer {
    pub fn new() -> Self {
        Self {
            registry: PipelineRegistry::new(),
        }
    }

    pub fn with_registry(registry: PipelineRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &PipelineRegistry {
        &self.registry
    }

    /// Render `text`, replacing every slot with its resolved value.
    ///
    /// Unresolved references render as empty text. Malformed slot content
    /// fails the whole call.
    pub fn render(&self, text: &str, ctx: &dyn Parameter) -> Result<String> {
        let mut out = String::with_capacity(text.len());
        let mut lexer = SlotLexer::new(text);
        let mut current = String::new();

        while let Some(token) = lexer.next_token()? {
            match token {
                SlotToken::Text(t) => out.push_str(t),
                SlotToken::Start => current.clear(),
                SlotToken::Reference(key) => {
                    let value = ctx.resolve(key)?;
                    if value.is_undefined() {
                        tracing::trace!(key, "slot reference unresolved");
                    }
                    current = value.to_text();
                }
                SlotToken::Format(format) => current = self.registry.apply(format, &current),
                SlotToken::Match(pattern) => current = first_match(pattern, &current)?,
                SlotToken::Substring(range) => {
                    current = substring(&current, range, lexer.position())?
                }
                SlotToken::Condition => {
                    let truthy = !current.is_empty();
                    current = self.branch(&mut lexer, ctx, truthy)?;
                }
                SlotToken::Operator(op) => {
                    let comparand = match lexer.next_token()? {
                        Some(SlotToken::Literal(text)) => self.render(text, ctx)?,
                        _ => return Err(syntax(&lexer, "expected quoted comparand")),
                    };
                    if lexer.next_token()? != Some(SlotToken::Condition) {
                        return Err(syntax(&lexer, "expected '?' after comparison"));
                    }
                    let truthy = compare(&current, op, &comparand);
                    current = self.branch(&mut lexer, ctx, truthy)?;
                }
                SlotToken::End => out.push_str(&current),
                SlotToken::Literal(_) | SlotToken::Else => {
                    return Err(syntax(&lexer, "unexpected condition branch"))
                }
            }
        }

        Ok(out)
    }

    /// Read `'yes'` and an optional `: 'no'`, rendering only the chosen branch
    fn branch(&self, lexer: &mut SlotLexer<'_>, ctx: &dyn Parameter, truthy: bool) -> Result<String> {
        let yes = match lexer.next_token()? {
            Some(SlotToken::Literal(text)) => text,
            _ => return Err(syntax(lexer, "expected quoted branch")),
        };

        let checkpoint = lexer.checkpoint();
        let no = match lexer.next_token()? {
            Some(SlotToken::Else) => match lexer.next_token()? {
                Some(SlotToken::Literal(text)) => text,
                _ => return Err(syntax(lexer, "expected quoted branch after ':'")),
            },
            Some(SlotToken::End) => {
                lexer.reset(checkpoint);
                ""
            }
            _ => return Err(syntax(lexer, "expected ':' or '}'")),
        };

        self.render(if truthy { yes } else { no }, ctx)
    }
}

impl Default for SlotRenderer {
    fn default() -> Self {
        Self::new()
    }
}

fn syntax(lexer: &SlotLexer<'_>, message: &str) -> Error {
    SlotError::syntax(lexer.position(), message).into()
}

/// Numeric operators need both sides to be numbers; otherwise false
fn compare(left: &str, op: CompareOp, right: &str) -> bool {
    match op {
        CompareOp::Equal => left == right,
        CompareOp::NotEqual => left != right,
        _ => {
            let (Some(l), Some(r)) = (parse_decimal(left), parse_decimal(right)) else {
                return false;
            };
            match op {
                CompareOp::Less => l < r,
                CompareOp::LessEq => l <= r,
                CompareOp::Greater => l > r,
                CompareOp::GreaterEq => l >= r,
                CompareOp::Equal | CompareOp::NotEqual => false,
            }
        }
    }
}

fn first_match(pattern: &str, value: &str) -> std::result::Result<String, SlotError> {
    let regex = compile_regex(pattern).map_err(|err| match err {
        PathError::InvalidRegex { pattern, source } => SlotError::InvalidRegex { pattern, source },
        other => SlotError::Path(other),
    })?;
    Ok(regex
        .find(value)
        .map(|m| m.as_str().to_string())
        .unwrap_or_default())
}

/// `n`, `n..`, `..n`, `n..m` over characters; `^n` counts from the end.
/// Bounds are clamped and the end is exclusive.
pub fn substring(value: &str, range: &str, position: usize) -> std::result::Result<String, SlotError> {
    let range = range.trim();
    if range.is_empty() || range == ".." {
        return Ok(value.to_string());
    }

    let chars: Vec<char> = value.chars().collect();
    let len = chars.len() as i64;
    let bound = |text: &str| -> std::result::Result<i64, SlotError> {
        let text = text.trim();
        let (from_end, digits) = match text.strip_prefix('^') {
            Some(rest) => (true, rest.trim()),
            None => (false, text),
        };
        let invalid = || SlotError::syntax(position, format!("invalid range bound '{text}'"));
        let unsigned = digits.strip_prefix('-').unwrap_or(digits);
        if unsigned.is_empty()
            || !unsigned.bytes().all(|b| b.is_ascii_digit())
            || (from_end && unsigned.len() != digits.len())
        {
            return Err(invalid());
        }
        // out of range bounds saturate and get clamped below
        let n: i64 = digits.parse().unwrap_or(if unsigned.len() == digits.len() {
            i64::MAX
        } else {
            i64::MIN
        });
        Ok(if from_end { len.saturating_sub(n) } else { n })
    };

    match range.split_once("..") {
        Some((start, end)) => {
            let from = if start.trim().is_empty() { 0 } else { bound(start)? };
            let to = if end.trim().is_empty() { len } else { bound(end)? };
            let (from, to) = (from.clamp(0, len), to.clamp(0, len));
            if from >= to {
                return Ok(String::new());
            }
            Ok(chars[from as usize..to as usize].iter().collect())
        }
        None => {
            let index = bound(range)?;
            Ok(if (0..len).contains(&index) {
                chars[index as usize].to_string()
            } else {
                String::new()
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compare() {
        assert!(compare("10", CompareOp::Greater, "9"));
        assert!(!compare("abc", CompareOp::Greater, "1"));
        assert!(!compare("abc", CompareOp::LessEq, "abc"));
        assert!(compare("abc", CompareOp::Equal, "abc"));
        assert!(compare("1.0", CompareOp::NotEqual, "1"));
        assert!(compare("2.50", CompareOp::GreaterEq, "2.5"));
    }

    #[test]
    fn test_substring_forms() {
        assert_eq!(substring("hello", "1..3", 0).unwrap(), "el");
        assert_eq!(substring("hello", "2..", 0).unwrap(), "llo");
        assert_eq!(substring("hello", "..2", 0).unwrap(), "he");
        assert_eq!(substring("hello", "1", 0).unwrap(), "e");
        assert_eq!(substring("hello", "^2..", 0).unwrap(), "lo");
        assert_eq!(substring("hello", "..^1", 0).unwrap(), "hell");
        assert_eq!(substring("hello", "", 0).unwrap(), "hello");
    }

    #[test]
    fn test_substring_clamps() {
        assert_eq!(substring("héllo", "1..99", 0).unwrap(), "éllo");
        assert_eq!(substring("abc", "9", 0).unwrap(), "");
        assert_eq!(substring("abc", "2..1", 0).unwrap(), "");
        assert_eq!(substring("", "0..2", 0).unwrap(), "");
    }

    #[test]
    fn test_substring_rejects_garbage() {
        assert!(substring("abc", "a..b", 3).is_err());
        assert!(substring("abc", "1..2..3", 3).is_err());
        assert!(substring("abc", "^-2", 3).is_err());
        assert!(substring("abc", "^-9223372036854775808", 3).is_err());
        assert!(substring("abc", "^+1", 3).is_err());
        assert!(substring("abc", "^", 3).is_err());
    }

    #[test]
    fn test_substring_huge_bounds_clamp() {
        assert_eq!(substring("abc", "^99999999999999999999..", 0).unwrap(), "abc");
        assert_eq!(substring("abc", "1..99999999999999999999", 0).unwrap(), "bc");
        assert_eq!(substring("abc", "-99999999999999999999..2", 0).unwrap(), "ab");
        assert_eq!(substring("abc", "99999999999999999999", 0).unwrap(), "");
    }

    #[test]
    fn test_first_match() {
        assert_eq!(first_match("/\\d+/", "ep 12 of 30").unwrap(), "12");
        assert_eq!(first_match("/x/", "abc").unwrap(), "");
        assert_eq!(first_match("/ABC/i", "xabcx").unwrap(), "abc");
        assert!(matches!(
            first_match("/(/", "abc"),
            Err(SlotError::InvalidRegex { .. })
        ));
    }
}
