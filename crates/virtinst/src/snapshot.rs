//! `<domainsnapshot>` definitions.

use std::sync::OnceLock;

use virt_xmlbuilder::{PropertySpec, Schema};

use crate::names::*;

pub const SNAPSHOT_MODES: &[&str] = &["no", "internal", "external", "manual"];

schema! {
    pub fn snapshot() {
        Schema::builder(SNAPSHOT, "domainsnapshot")
            .property(PropertySpec::text("name", "./name"))
            .property(PropertySpec::text("description", "./description"))
            .property(PropertySpec::text("state", "./state"))
            .property(PropertySpec::int("creation_time", "./creationTime"))
            .property(PropertySpec::text("parent", "./parent/name"))
            .property(PropertySpec::choice("memory_snapshot", "./memory/@snapshot", SNAPSHOT_MODES))
            .property(PropertySpec::text("memory_file", "./memory/@file"))
            .child(SNAPSHOT_DISKS, "./disks", snapshot_disk)
            .build()
    }
}

schema! {
    /// Per-disk `<disk>` entry of a snapshot.
    pub fn snapshot_disk() {
        Schema::builder("snapshot_disk", "disk")
            .property(PropertySpec::text("name", "./@name"))
            .property(PropertySpec::choice("snapshot", "./@snapshot", SNAPSHOT_MODES))
            .property(PropertySpec::text("driver_type", "./driver/@type"))
            .property(PropertySpec::text("source_file", "./source/@file"))
            .build()
    }
}
