//! Typed results produced by the grammars

use std::fmt;
use std::num::ParseIntError;

use thiserror::Error;

pub use super::lexer::Span;

/// Port direction of an HDL declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortDirection {
    Input,
    Output,
    Inout,
}

/// Inclusive `[msb:lsb]` bit range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitRange {
    pub msb: u64,
    pub lsb: u64,
}

impl BitRange {
    /// Number of bits covered, regardless of range orientation
    ///
    /// None when the width does not fit in 64 bits.
    pub fn width(&self) -> Option<u64> {
        self.msb.abs_diff(self.lsb).checked_add(1)
    }
}

/// Range part of a port declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PortRange {
    /// `[msb:lsb]` with integer literal bounds
    Bits(BitRange),
    /// Bounds that are not integer literals, e.g. `[ADDR_WIDTH-1:0]`
    Symbolic(Span),
}

/// A port declaration found in a stub, e.g. `input wire [7:0] a, b`
#[derive(Debug, Clone, PartialEq)]
pub struct PortDecl {
    pub direction: PortDirection,
    pub range: Option<PortRange>,
    pub names: Vec<String>,
    pub span: Span,
}

impl PortDecl {
    pub fn declares(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }
}

/// Shape of an extern's control address bus
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddrBus {
    /// `input [msb:lsb] <bus>`
    Ranged(BitRange),
    /// `input <bus>` without a range
    SingleBit,
    /// `input [<expr>] <bus>` with a range that is not literal; span of the range
    Symbolic(Span),
    /// No declaration: the extern has no control interface
    Absent,
}

impl AddrBus {
    /// Width of the bus in bits; 0 when absent, None when it cannot be computed
    pub fn width(&self) -> Option<u64> {
        match self {
            AddrBus::Ranged(range) => range.width(),
            AddrBus::SingleBit => Some(1),
            AddrBus::Symbolic(_) => None,
            AddrBus::Absent => Some(0),
        }
    }
}

/// A `#define NAME VALUE` directive with an integer value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Define {
    pub name: String,
    pub value: u64,
    pub span: Span,
}

/// Which tuple of an engine a field lookup searches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldDirection {
    Input,
    Output,
}

/// Record attributes that substitute directly as text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiteralKind {
    ExternName,
    ModuleName,
    PrefixName,
    AddrWidth,
}

impl LiteralKind {
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "extern_name" => Some(LiteralKind::ExternName),
            "module_name" => Some(LiteralKind::ModuleName),
            "prefix_name" => Some(LiteralKind::PrefixName),
            "addr_width" => Some(LiteralKind::AddrWidth),
            _ => None,
        }
    }

    pub fn keyword(&self) -> &'static str {
        match self {
            LiteralKind::ExternName => "extern_name",
            LiteralKind::ModuleName => "module_name",
            LiteralKind::PrefixName => "prefix_name",
            LiteralKind::AddrWidth => "addr_width",
        }
    }
}

/// A substitution command of the extern type catalog
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `input_width(field)` or `output_width(field)`
    FieldWidth {
        direction: FieldDirection,
        field: String,
    },
    /// `extern_name`, `module_name`, `prefix_name` or `addr_width`
    Literal(LiteralKind),
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::FieldWidth {
                direction: FieldDirection::Input,
                field,
            } => write!(f, "input_width({})", field),
            Command::FieldWidth {
                direction: FieldDirection::Output,
                field,
            } => write!(f, "output_width({})", field),
            Command::Literal(kind) => f.write_str(kind.keyword()),
        }
    }
}

/// Errors from [`parse_int_literal`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IntLiteralError {
    #[error("ambiguous integer literal '{0}': decimal values cannot start with 0")]
    LeadingZero(String),
    #[error("invalid integer literal '{literal}': {source}")]
    Invalid {
        literal: String,
        source: ParseIntError,
    },
}

/// Parse an integer literal, detecting the base from its prefix
///
/// `0x`, `0o` and `0b` select hex, octal and binary. Anything else is decimal,
/// where a leading zero is only allowed for zero itself. Underscores may
/// separate digits.
pub fn parse_int_literal(text: &str) -> Result<u64, IntLiteralError> {
    let text = text.trim();
    let lower = text.to_ascii_lowercase();
    let (digits, radix) = if let Some(rest) = lower.strip_prefix("0x") {
        (rest, 16)
    } else if let Some(rest) = lower.strip_prefix("0o") {
        (rest, 8)
    } else if let Some(rest) = lower.strip_prefix("0b") {
        (rest, 2)
    } else {
        (lower.as_str(), 10)
    };
    let digits: String = digits.chars().filter(|c| *c != '_').collect();
    if radix == 10 && digits.starts_with('0') && digits.bytes().any(|b| b != b'0') {
        return Err(IntLiteralError::LeadingZero(text.to_string()));
    }
    u64::from_str_radix(&digits, radix).map_err(|source| IntLiteralError::Invalid {
        literal: text.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_int_literal_bases() {
        assert_eq!(parse_int_literal("0x44020000"), Ok(0x4402_0000));
        assert_eq!(parse_int_literal("0X1f"), Ok(0x1f));
        assert_eq!(parse_int_literal("0o17"), Ok(0o17));
        assert_eq!(parse_int_literal("0b101"), Ok(5));
        assert_eq!(parse_int_literal("256"), Ok(256));
        assert_eq!(parse_int_literal("0"), Ok(0));
        assert_eq!(parse_int_literal("000"), Ok(0));
        assert_eq!(parse_int_literal("1_000"), Ok(1000));
    }

    #[test]
    fn test_int_literal_rejects_leading_zero_decimal() {
        assert_eq!(
            parse_int_literal("010"),
            Err(IntLiteralError::LeadingZero("010".to_string()))
        );
        assert!(parse_int_literal("0x").is_err());
        assert!(parse_int_literal("12ab").is_err());
    }

    #[test]
    fn test_bit_range_width() {
        assert_eq!(BitRange { msb: 7, lsb: 0 }.width(), Some(8));
        assert_eq!(BitRange { msb: 0, lsb: 3 }.width(), Some(4));
        assert_eq!(AddrBus::SingleBit.width(), Some(1));
        assert_eq!(AddrBus::Absent.width(), Some(0));
        assert_eq!(AddrBus::Symbolic(1..9).width(), None);
    }

    #[test]
    fn test_full_width_range_does_not_overflow() {
        let range = BitRange {
            msb: u64::MAX,
            lsb: 0,
        };
        assert_eq!(range.width(), None);
        assert_eq!(AddrBus::Ranged(range).width(), None);
        assert_eq!(
            BitRange {
                msb: u64::MAX - 1,
                lsb: 0
            }
            .width(),
            Some(u64::MAX)
        );
    }

    #[test]
    fn test_command_display() {
        let cmd = Command::FieldWidth {
            direction: FieldDirection::Output,
            field: "result".to_string(),
        };
        assert_eq!(cmd.to_string(), "output_width(result)");
        assert_eq!(Command::Literal(LiteralKind::AddrWidth).to_string(), "addr_width");
    }
}
