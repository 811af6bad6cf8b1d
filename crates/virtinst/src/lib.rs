#![cfg_attr(docsrs, feature(doc_cfg))]
//! Schema catalog for libvirt domain, storage pool, network and snapshot
//! documents, built on [`virt_xmlbuilder`].
//!
//! ```rust
//! use virtinst::{guest, names, xmlbuilder::XmlBuilder};
//!
//! let mut vm = XmlBuilder::build(guest::guest());
//! vm.set("name", Some("demo")).unwrap();
//! vm.set("memory", Some("1048576")).unwrap();
//! let disks = vm.collection(names::DISKS).unwrap().add_new().unwrap();
//! assert_eq!(disks, 0);
//! assert!(vm.get_xml().unwrap().contains("<disk type=\"file\" device=\"disk\">"));
//! ```

/// Declare a lazily built `&'static Schema` accessor.
macro_rules! schema {
    ($(#[$meta:meta])* $vis:vis fn $name:ident() $body:block) => {
        $(#[$meta])*
        $vis fn $name() -> &'static Schema {
            static SCHEMA: OnceLock<Schema> = OnceLock::new();
            SCHEMA.get_or_init(|| $body)
        }
    };
}

pub mod devices;
pub mod guest;
pub mod names;
pub mod network;
pub mod pool;
pub mod snapshot;

pub use virt_xmlbuilder as xmlbuilder;
pub use virt_xmlbuilder::{BuildError, Coverage, Schema, XmlBuilder};

pub use guest::{find_device, reorder_boot_order};

/// Top-level document schemas, each with its own root element.
pub fn catalog() -> [&'static Schema; 4] {
    [
        guest::guest(),
        pool::pool(),
        network::network(),
        snapshot::snapshot(),
    ]
}

/// Look up a top-level schema by kind name.
pub fn schema_for(kind: &str) -> Option<&'static Schema> {
    catalog().into_iter().find(|schema| schema.kind() == kind)
}

/// Declare every property reachable from the top-level schemas.
pub fn declare_all(coverage: &Coverage) {
    for schema in catalog() {
        coverage.declare_schema(schema);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_kinds_are_unique() {
        let kinds: Vec<_> = catalog().iter().map(|schema| schema.kind()).collect();
        assert_eq!(kinds, vec!["guest", "pool", "network", "snapshot"]);
        assert!(schema_for("pool").is_some());
        assert!(schema_for("disk").is_none());
    }

    #[test]
    fn declare_all_walks_nested_collections() {
        let coverage = Coverage::new();
        declare_all(&coverage);
        let untouched = coverage.untouched_properties();
        assert!(untouched.iter().any(|key| key.starts_with("disk_host")));
        assert!(untouched.iter().any(|key| key.starts_with("dhcp_range")));
        assert!(untouched.iter().any(|key| key.starts_with("snapshot_disk")));
    }
}
