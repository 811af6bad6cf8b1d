//! virt-xml style editing of libvirt XML documents.
//!
//! Every command line option (`--disk`, `--boot`, `--pool`, ...) is a static
//! [`ParserSpec`]: the suboption names it accepts, the schema property each
//! one writes, and where the addressed objects live. [`Suboptions`] turns an
//! option string such as `path=/a.img,target.bus=sata` into ordered
//! assignments, and [`perform`] applies them to a bound
//! [`XmlBuilder`](virt_xmlbuilder::XmlBuilder) document.

pub mod action;
pub mod cmd_build;
pub mod cmd_device;
pub mod cmd_edit;
pub mod cmd_suboptions;
pub mod common;
pub mod diff;
pub mod domain_args;
pub mod error;
pub mod object_args;
pub mod parser;
pub mod selector;
pub mod suboption;

pub use action::{perform, Action, Outcome};
pub use error::CliError;
pub use parser::{parser_for, parsers, ArgFlags, ArgSpec, ClearScope, ParserSpec, ParserTarget};
pub use selector::Selector;
pub use suboption::{Assignment, Slot, Suboptions};
