//! Property descriptors: name, XPath template, value type and default.

use std::fmt;

use crate::object::DefaultContext;
use crate::BuildError;

/// Placeholder substituted with an explicit or active 1-based index.
pub const INDEX_PLACEHOLDER: &str = "{index}";

/// Semantic type of a property and its XML encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    /// Free-form text.
    Str,
    /// Boolean written as `yes` / `no`.
    YesNo,
    /// Boolean written as `on` / `off`.
    OnOff,
    /// Integer, decimal or `0x` hexadecimal, stored as given.
    Int,
    /// One of a fixed list, matched case-insensitively.
    Enum(&'static [&'static str]),
    /// Boolean written as the presence of an element, e.g. `<readonly/>`.
    Flag,
}

impl ValueType {
    pub fn describe(&self) -> String {
        match self {
            ValueType::Str => "string".into(),
            ValueType::YesNo => "yes/no".into(),
            ValueType::OnOff => "on/off".into(),
            ValueType::Int => "integer".into(),
            ValueType::Enum(choices) => choices.join("|"),
            ValueType::Flag => "flag".into(),
        }
    }
}

/// XML encoding of a user value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Encoded {
    Text(String),
    Present,
    Absent,
}

pub type ComputeFn = for<'a> fn(&DefaultContext<'a>) -> Option<String>;

#[derive(Clone, Copy)]
pub enum DefaultSpec {
    None,
    Value(&'static str),
    /// Computed from other properties of the same object.
    Computed {
        depends_on: &'static [&'static str],
        compute: ComputeFn,
    },
}

impl fmt::Debug for DefaultSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefaultSpec::None => write!(f, "None"),
            DefaultSpec::Value(value) => f.debug_tuple("Value").field(value).finish(),
            DefaultSpec::Computed { depends_on, .. } => f
                .debug_struct("Computed")
                .field("depends_on", depends_on)
                .finish_non_exhaustive(),
        }
    }
}

/// Immutable description of one typed property.
#[derive(Debug, Clone, Copy)]
pub struct PropertySpec {
    pub name: &'static str,
    pub xpath: &'static str,
    pub value_type: ValueType,
    pub default: DefaultSpec,
}

impl PropertySpec {
    pub const fn new(name: &'static str, xpath: &'static str, value_type: ValueType) -> Self {
        Self {
            name,
            xpath,
            value_type,
            default: DefaultSpec::None,
        }
    }

    pub const fn text(name: &'static str, xpath: &'static str) -> Self {
        Self::new(name, xpath, ValueType::Str)
    }

    pub const fn int(name: &'static str, xpath: &'static str) -> Self {
        Self::new(name, xpath, ValueType::Int)
    }

    pub const fn yes_no(name: &'static str, xpath: &'static str) -> Self {
        Self::new(name, xpath, ValueType::YesNo)
    }

    pub const fn on_off(name: &'static str, xpath: &'static str) -> Self {
        Self::new(name, xpath, ValueType::OnOff)
    }

    pub const fn flag(name: &'static str, xpath: &'static str) -> Self {
        Self::new(name, xpath, ValueType::Flag)
    }

    pub const fn choice(
        name: &'static str,
        xpath: &'static str,
        choices: &'static [&'static str],
    ) -> Self {
        Self::new(name, xpath, ValueType::Enum(choices))
    }

    pub const fn default_value(self, value: &'static str) -> Self {
        Self {
            default: DefaultSpec::Value(value),
            ..self
        }
    }

    pub const fn default_with(
        self,
        depends_on: &'static [&'static str],
        compute: ComputeFn,
    ) -> Self {
        Self {
            default: DefaultSpec::Computed {
                depends_on,
                compute,
            },
            ..self
        }
    }

    pub fn is_indexed(&self) -> bool {
        self.xpath.contains(INDEX_PLACEHOLDER)
    }

    pub fn has_default(&self) -> bool {
        !matches!(self.default, DefaultSpec::None)
    }

    /// Concrete XPath for `index` (1-based, defaults to 1).
    pub fn xpath_for(&self, index: Option<usize>) -> String {
        if self.is_indexed() {
            self.xpath
                .replace(INDEX_PLACEHOLDER, &index.unwrap_or(1).to_string())
        } else {
            self.xpath.to_string()
        }
    }

    /// Convert user input into its XML encoding; `None` or empty unsets.
    pub fn encode(&self, value: Option<&str>) -> Result<Encoded, BuildError> {
        let Some(raw) = value.filter(|v| !v.trim().is_empty()) else {
            return Ok(Encoded::Absent);
        };
        let trimmed = raw.trim();
        let invalid = |reason: String| BuildError::InvalidPropertyValue {
            name: self.name.to_string(),
            value: raw.to_string(),
            reason,
        };
        match self.value_type {
            ValueType::Str => Ok(Encoded::Text(raw.to_string())),
            ValueType::YesNo | ValueType::OnOff => {
                let flag = parse_bool(trimmed)
                    .ok_or_else(|| invalid(format!("expected {}", self.value_type.describe())))?;
                let (on, off) = if self.value_type == ValueType::YesNo {
                    ("yes", "no")
                } else {
                    ("on", "off")
                };
                Ok(Encoded::Text(if flag { on } else { off }.to_string()))
            }
            ValueType::Flag => match parse_bool(trimmed) {
                Some(true) => Ok(Encoded::Present),
                Some(false) => Ok(Encoded::Absent),
                None => Err(invalid("expected a boolean".into())),
            },
            ValueType::Int => parse_int(trimmed)
                .map(|_| Encoded::Text(trimmed.to_string()))
                .ok_or_else(|| invalid("expected an integer".into())),
            ValueType::Enum(choices) => choices
                .iter()
                .find(|choice| choice.eq_ignore_ascii_case(trimmed))
                .map(|choice| Encoded::Text(choice.to_string()))
                .ok_or_else(|| invalid(format!("expected one of: {}", choices.join(", ")))),
        }
    }

    /// Encoded form as it reads back through `get`.
    pub fn normalize(&self, value: &str) -> Result<Option<String>, BuildError> {
        Ok(match self.encode(Some(value))? {
            Encoded::Text(text) => Some(text),
            Encoded::Present => Some("yes".to_string()),
            Encoded::Absent => None,
        })
    }
}

/// Accepts `y yes 1 true t on` and `n no 0 false f off`, case-insensitively.
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "y" | "yes" | "1" | "true" | "t" | "on" => Some(true),
        "n" | "no" | "0" | "false" | "f" | "off" => Some(false),
        _ => None,
    }
}

/// Decimal or `0x` hexadecimal, optionally negative.
pub fn parse_int(value: &str) -> Option<i64> {
    let value = value.trim();
    let (negative, digits) = match value.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, value),
    };
    let magnitude = match digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        Some(hex) => i64::from_str_radix(hex, 16).ok()?,
        None if digits.chars().all(|c| c.is_ascii_digit()) && !digits.is_empty() => {
            digits.parse().ok()?
        }
        None => return None,
    };
    Some(if negative { -magnitude } else { magnitude })
}
