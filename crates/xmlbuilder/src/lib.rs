//! Declarative XML object model: typed properties bound to XPaths.
//!
//! A [`Schema`] lists the properties and child collections of one object
//! kind. [`XmlBuilder`] binds a schema to a document, either freshly built
//! or parsed from text, and every `get`/`set` goes straight through the
//! document so content the schema does not know about survives edits.

pub mod capability;
pub mod collection;
pub mod coverage;
pub mod diff;
pub mod object;
pub mod property;
pub mod schema;
pub mod suggest;

use thiserror::Error;

pub use virt_xmlapi as xmlapi;
pub use virt_xmlapi::XmlError;

pub use capability::{Address, Alias, BootOrder, Capabilities, Capability};
pub use collection::CollectionMut;
pub use coverage::{Coverage, CoverageReport};
pub use diff::Change;
pub use object::{DefaultContext, Obj, ObjMut, ParseMode, XmlBuilder};
pub use property::{parse_bool, parse_int, DefaultSpec, Encoded, PropertySpec, ValueType};
pub use schema::{ChildSpec, Schema, SchemaBuilder};

use suggest::format_suggestions;

/// Error type produced by property access and object construction.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BuildError {
    /// The schema declares no property of that name.
    #[error("unknown property '{name}' for {kind}{}", format_suggestions(.suggestions))]
    UnknownProperty {
        kind: String,
        name: String,
        suggestions: Vec<String>,
    },
    /// The value cannot be encoded for the property's type.
    #[error("invalid value '{value}' for {name}: {reason}")]
    InvalidPropertyValue {
        name: String,
        value: String,
        reason: String,
    },
    /// Computed defaults depend on each other.
    #[error("default values of {kind} depend on each other: {}", .properties.join(", "))]
    DefaultCycle {
        kind: String,
        properties: Vec<String>,
    },
    #[error("{kind} has no child collection '{name}'")]
    UnknownChild { kind: String, name: String },
    #[error("{name} index {index} out of range (have {len})")]
    IndexOutOfRange {
        name: String,
        index: usize,
        len: usize,
    },
    /// An object of one kind was handed to a collection of another.
    #[error("expected a {expected} object, got {found}")]
    KindMismatch { expected: String, found: String },
    #[error(transparent)]
    Xml(#[from] XmlError),
}
