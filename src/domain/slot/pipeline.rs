// Format modifiers: named operations plus numeric format codes

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use std::collections::HashMap;

use crate::domain::value::parse_decimal;

/// A named transformation applied by `:name`
pub trait PipelineOperation: Send + Sync {
    fn name(&self) -> &'static str;
    fn apply(&self, value: &str) -> String;
}

/// RFC 3986 percent-encoding
pub struct UrlEncodeOp;

impl PipelineOperation for UrlEncodeOp {
    fn name(&self) -> &'static str {
        "urlEncode"
    }

    fn apply(&self, value: &str) -> String {
        urlencoding::encode(value).into_owned()
    }
}

/// Strip surrounding whitespace and control whitespace
pub struct TrimOp;

impl PipelineOperation for TrimOp {
    fn name(&self) -> &'static str {
        "Trim"
    }

    fn apply(&self, value: &str) -> String {
        value
            .trim_matches(|c| matches!(c, '\r' | '\n' | '\t' | '\x0c' | '\x0b' | ' '))
            .to_string()
    }
}

/// Numeric format code such as `F2`, `N0`, `X8` or `E3`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NumericFormat {
    code: char,
    precision: Option<u32>,
}

impl NumericFormat {
    /// Parse a format code. The leading letter picks the family and an
    /// optional run of digits gives the precision.
    pub fn parse(spec: &str) -> Option<Self> {
        let mut chars = spec.chars();
        let code = chars.next()?;
        if !"CcEeFfGgNnPpBbDdXxRr".contains(code) {
            return None;
        }
        let rest = chars.as_str();
        let precision = if rest.is_empty() {
            None
        } else if rest.len() <= 2 && rest.bytes().all(|b| b.is_ascii_digit()) {
            Some(rest.parse().ok()?)
        } else {
            return None;
        };
        Some(Self { code, precision })
    }

    /// Format `value`, or `None` when it is not a number of the right kind
    pub fn apply(&self, value: &str) -> Option<String> {
        match self.code.to_ascii_uppercase() {
            'F' => Some(fixed(parse_decimal(value)?, self.precision.unwrap_or(2))),
            'N' => Some(grouped(parse_decimal(value)?, self.precision.unwrap_or(2))),
            'C' => {
                let number = parse_decimal(value)?;
                let text = grouped(number.abs(), self.precision.unwrap_or(2));
                Some(if number.is_sign_negative() && !number.is_zero() {
                    format!("-¤{text}")
                } else {
                    format!("¤{text}")
                })
            }
            'P' => {
                let number = parse_decimal(value)?.checked_mul(Decimal::ONE_HUNDRED)?;
                Some(format!("{} %", grouped(number, self.precision.unwrap_or(2))))
            }
            'E' => scientific(
                parse_decimal(value)?,
                self.precision.unwrap_or(6),
                self.code == 'E',
            ),
            'G' => {
                let number = parse_decimal(value)?;
                let rounded = match self.precision {
                    Some(digits) if digits > 0 => number.round_sf(digits)?,
                    _ => number,
                };
                Some(rounded.normalize().to_string())
            }
            'D' => {
                let number = parse_integer(value)?;
                let digits = number.unsigned_abs().to_string();
                let sign = if number < 0 { "-" } else { "" };
                Some(format!(
                    "{sign}{digits:0>width$}",
                    width = self.precision.unwrap_or(0) as usize
                ))
            }
            'X' => {
                let number = parse_integer(value)?;
                let width = self.precision.unwrap_or(0) as usize;
                Some(if self.code == 'X' {
                    format!("{number:0width$X}")
                } else {
                    format!("{number:0width$x}")
                })
            }
            'B' => {
                let number = parse_integer(value)?;
                let width = self.precision.unwrap_or(0) as usize;
                Some(format!("{number:0width$b}"))
            }
            'R' => match value.trim().parse::<i128>() {
                Ok(big) => Some(big.to_string()),
                Err(_) => Some(parse_decimal(value)?.normalize().to_string()),
            },
            _ => None,
        }
    }
}

fn fixed(number: Decimal, decimals: u32) -> String {
    let rounded = number.round_dp_with_strategy(decimals, RoundingStrategy::MidpointAwayFromZero);
    format!("{:.*}", decimals as usize, rounded)
}

fn grouped(number: Decimal, decimals: u32) -> String {
    let text = fixed(number, decimals);
    let (sign, unsigned) = match text.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", text.as_str()),
    };
    let (integer, fraction) = match unsigned.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (unsigned, None),
    };

    let mut out = String::with_capacity(text.len() + integer.len() / 3);
    out.push_str(sign);
    for (i, ch) in integer.chars().enumerate() {
        if i > 0 && (integer.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if let Some(fraction) = fraction {
        out.push('.');
        out.push_str(fraction);
    }
    out
}

/// `1.234560E+003` style: three-digit signed exponent
fn scientific(number: Decimal, decimals: u32, upper: bool) -> Option<String> {
    let float = number.to_f64()?;
    let formatted = format!("{:.*e}", decimals as usize, float);
    let (mantissa, exponent) = formatted.split_once('e')?;
    let exponent: i32 = exponent.parse().ok()?;
    let sign = if exponent < 0 { '-' } else { '+' };
    let marker = if upper { 'E' } else { 'e' };
    Some(format!("{mantissa}{marker}{sign}{:03}", exponent.abs()))
}

fn parse_integer(value: &str) -> Option<i64> {
    let trimmed = value.trim();
    trimmed.parse::<i64>().ok().or_else(|| {
        let number = parse_decimal(trimmed)?;
        if number.fract().is_zero() {
            number.to_i64()
        } else {
            None
        }
    })
}

/// Registry for named operations
pub struct PipelineRegistry {
    operations: HashMap<&'static str, Box<dyn PipelineOperation>>,
}

impl PipelineRegistry {
    pub fn new() -> Self {
        let mut registry = Self {
            operations: HashMap::new(),
        };
        registry.register(Box::new(UrlEncodeOp));
        registry.register(Box::new(TrimOp));
        registry
    }

    pub fn register(&mut self, op: Box<dyn PipelineOperation>) {
        self.operations.insert(op.name(), op);
    }

    pub fn get(&self, name: &str) -> Option<&dyn PipelineOperation> {
        self.operations.get(name).map(|b| b.as_ref())
    }

    /// Apply a `:format` modifier.
    ///
    /// Named operations win, then numeric codes. Empty input stays empty,
    /// and values or formats that don't fit pass through unchanged.
    pub fn apply(&self, format: &str, value: &str) -> String {
        if let Some(op) = self.get(format) {
            return op.apply(value);
        }
        if value.is_empty() {
            return String::new();
        }
        match NumericFormat::parse(format) {
            Some(numeric) => numeric.apply(value).unwrap_or_else(|| {
                tracing::debug!(format, value, "value is not numeric, format skipped");
                value.to_string()
            }),
            None => {
                tracing::debug!(format, "unknown format, value unchanged");
                value.to_string()
            }
        }
    }
}

impl Default for PipelineRegistry {
    fn default() -> Self {
        Self::new()
    }
}
