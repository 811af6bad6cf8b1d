//! Aggregator for the libvirt XML binding crates.
//!
//! ```rust
//! use virtbind::virtinst::{guest, XmlBuilder};
//!
//! let vm = XmlBuilder::build(guest::guest());
//! assert!(vm.get_xml().unwrap().starts_with("<domain type=\"kvm\">"));
//! ```

pub use virt_xmlbuilder as xmlbuilder;
pub use virtcli;
pub use virtinst;
