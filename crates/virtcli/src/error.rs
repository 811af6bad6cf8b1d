use thiserror::Error;
use virt_xmlbuilder::suggest::format_suggestions;
use virt_xmlbuilder::{BuildError, XmlError};

/// Error type produced while parsing option strings and applying actions.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("unknown option --{0}")]
    UnknownOption(String),
    /// A key in an option string matched no declared suboption.
    #[error("unknown --{option} suboption '{key}'{}", format_suggestions(.suggestions))]
    UnknownSuboption {
        option: String,
        key: String,
        suggestions: Vec<String>,
    },
    /// A bare token that is neither positional nor a flag.
    #[error("--{option}: suboption '{key}' had no value set")]
    MissingValue { option: String, key: String },
    #[error("--{option}: {key} must be 'yes' or 'no', got '{value}'")]
    InvalidBool {
        option: String,
        key: String,
        value: String,
    },
    #[error("--{option}: instance number in '{key}' is too large")]
    InvalidIndex { option: String, key: String },
    #[error("--{option}: {key} cannot be used to select objects")]
    NotSelectable { option: String, key: String },
    #[error("invalid selector '{0}'")]
    InvalidSelector(String),
    #[error("selector '{selector}' doesn't make sense with --{option}, use an empty selector")]
    SelectorNotApplicable { option: String, selector: String },
    #[error("no --{option} objects match '{selector}' (found {count})")]
    NoMatchingDevice {
        option: String,
        selector: String,
        count: usize,
    },
    #[error("{count} --{option} objects found, pick one with a selector: {}", .candidates.join("; "))]
    AmbiguousDevice {
        option: String,
        count: usize,
        candidates: Vec<String>,
    },
    #[error("--{0} does not describe a device")]
    NotADevice(String),
    #[error("--{option} edits {expected} documents, got {found}")]
    WrongDocument {
        option: String,
        expected: String,
        found: String,
    },
    #[error("--{0} needs an option string")]
    MissingOptions(String),
    #[error(transparent)]
    Build(#[from] BuildError),
}

impl From<XmlError> for CliError {
    fn from(err: XmlError) -> Self {
        CliError::Build(BuildError::Xml(err))
    }
}
