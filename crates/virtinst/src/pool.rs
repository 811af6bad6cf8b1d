//! `<pool>` storage pool definitions.

use std::sync::OnceLock;

use virt_xmlbuilder::{DefaultContext, PropertySpec, Schema};

use crate::names::*;

pub const POOL_TYPES: &[&str] = &[
    "dir", "fs", "netfs", "logical", "disk", "iscsi", "scsi", "mpath", "rbd", "sheepdog",
    "gluster", "zfs",
];

const DEFAULT_POOL_ROOT: &str = "/var/lib/libvirt/images";

/// Where libvirt expects the pool's volumes for local pool types.
fn target_path(ctx: &DefaultContext<'_>) -> Option<String> {
    let path = match ctx.get("type").as_deref()? {
        "dir" | "fs" | "netfs" => format!("{DEFAULT_POOL_ROOT}/{}", ctx.get("name")?),
        "logical" => format!("/dev/{}", ctx.get("name")?),
        "disk" => "/dev".to_string(),
        "iscsi" | "scsi" => "/dev/disk/by-path".to_string(),
        "mpath" => "/dev/mapper".to_string(),
        _ => return None,
    };
    Some(path)
}

schema! {
    pub fn pool() {
        Schema::builder(POOL, "pool")
            .property(PropertySpec::choice("type", "./@type", POOL_TYPES).default_value("dir"))
            .property(PropertySpec::text("name", "./name"))
            .property(PropertySpec::text("uuid", "./uuid"))
            .property(PropertySpec::int("capacity", "./capacity"))
            .property(PropertySpec::int("allocation", "./allocation"))
            .property(PropertySpec::int("available", "./available"))
            .child(HOSTS, "./source", pool_host)
            .property(PropertySpec::text("source_device", "./source/device/@path"))
            .property(PropertySpec::text("source_dir", "./source/dir/@path"))
            .property(PropertySpec::text("source_adapter", "./source/adapter/@name"))
            .property(PropertySpec::text("source_name", "./source/name"))
            .property(PropertySpec::text("source_format", "./source/format/@type"))
            .property(PropertySpec::text("auth_type", "./source/auth/@type"))
            .property(PropertySpec::text("auth_username", "./source/auth/@username"))
            .property(PropertySpec::text("target_path", "./target/path").default_with(&["type", "name"], target_path))
            .property(PropertySpec::text("permissions_mode", "./target/permissions/mode"))
            .property(PropertySpec::text("permissions_owner", "./target/permissions/owner"))
            .property(PropertySpec::text("permissions_group", "./target/permissions/group"))
            .property(PropertySpec::text("permissions_label", "./target/permissions/label"))
            .build()
    }
}

schema! {
    /// Remote `<host>` of a network-backed pool source.
    pub fn pool_host() {
        Schema::builder("pool_host", "host")
            .property(PropertySpec::text("name", "./@name"))
            .property(PropertySpec::int("port", "./@port"))
            .build()
    }
}

#[cfg(test)]
mod tests {
    use virt_xmlbuilder::XmlBuilder;

    use super::*;

    #[test]
    fn dir_pool_target_follows_name() {
        let mut pool = XmlBuilder::build(pool());
        pool.set("name", Some("images2")).unwrap();
        assert_eq!(
            pool.get_xml().unwrap(),
            "<pool type=\"dir\">\n  <name>images2</name>\n  <target>\n    <path>/var/lib/libvirt/images/images2</path>\n  </target>\n</pool>\n"
        );
    }

    #[test]
    fn network_pools_get_no_target() {
        let mut pool = XmlBuilder::build(pool());
        pool.set("type", Some("rbd")).unwrap();
        pool.set("name", Some("ceph")).unwrap();
        pool.set("source_name", Some("rbdpool")).unwrap();
        pool.collection(HOSTS).unwrap().add_new().unwrap();
        pool.collection(HOSTS)
            .unwrap()
            .get_mut(0)
            .unwrap()
            .set("name", Some("mon1.example.org"))
            .unwrap();
        assert_eq!(
            pool.get_xml().unwrap(),
            "<pool type=\"rbd\">\n  <name>ceph</name>\n  <source>\n    <host name=\"mon1.example.org\"/>\n    <name>rbdpool</name>\n  </source>\n</pool>\n"
        );
    }
}
