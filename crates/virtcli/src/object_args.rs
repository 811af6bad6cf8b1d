//! Suboption tables for standalone pool, network and snapshot documents.

use virtinst::names::{HOSTS, IPS, PORTGROUPS, RANGES, ROUTES, SNAPSHOT_DISKS};
use virtinst::{network, pool, snapshot};

use crate::parser::{ArgSpec, ClearScope, ParserSpec, ParserTarget};

const fn definition(
    option: &'static str,
    schema: fn() -> &'static virtinst::Schema,
    args: &'static [&'static [ArgSpec]],
) -> ParserSpec {
    ParserSpec {
        option,
        document: schema,
        object: schema,
        target: ParserTarget::Root,
        remove_first: &["name"],
        clear: ClearScope::Object,
        stub_none: false,
        args,
    }
}

const POOL_ARGS: &[ArgSpec] = &[
    ArgSpec::prop("type", "type"),
    ArgSpec::prop("name", "name"),
    ArgSpec::prop("uuid", "uuid"),
    ArgSpec::prop("capacity", "capacity"),
    ArgSpec::prop("allocation", "allocation"),
    ArgSpec::prop("available", "available"),
    ArgSpec::child("source.host[0-9]*.name", &[HOSTS], "name"),
    ArgSpec::child("source.host[0-9]*.port", &[HOSTS], "port"),
    ArgSpec::prop("source.device", "source_device").aliases(&["source_path"]),
    ArgSpec::prop("source.dir", "source_dir"),
    ArgSpec::prop("source.adapter", "source_adapter"),
    ArgSpec::prop("source.name", "source_name"),
    ArgSpec::prop("source.format", "source_format").aliases(&["format"]),
    ArgSpec::prop("source.auth.type", "auth_type"),
    ArgSpec::prop("source.auth.username", "auth_username"),
    ArgSpec::prop("target.path", "target_path").aliases(&["target_path"]),
    ArgSpec::prop("target.permissions.mode", "permissions_mode"),
    ArgSpec::prop("target.permissions.owner", "permissions_owner"),
    ArgSpec::prop("target.permissions.group", "permissions_group"),
    ArgSpec::prop("target.permissions.label", "permissions_label"),
];

/// `--pool`: storage pool definitions.
pub const POOL: ParserSpec = definition("pool", pool::pool, &[POOL_ARGS]);

const NETWORK_ARGS: &[ArgSpec] = &[
    ArgSpec::prop("name", "name"),
    ArgSpec::prop("uuid", "uuid"),
    ArgSpec::prop("ipv6", "ipv6"),
    ArgSpec::prop("forward.mode", "forward_mode").aliases(&["forward"]),
    ArgSpec::prop("forward.dev", "forward_dev"),
    ArgSpec::prop("bridge.name", "bridge_name").aliases(&["bridge"]),
    ArgSpec::prop("bridge.stp", "bridge_stp"),
    ArgSpec::prop("bridge.delay", "bridge_delay"),
    ArgSpec::prop("mtu.size", "mtu"),
    ArgSpec::prop("mac.address", "mac"),
    ArgSpec::prop("domain.name", "domain_name"),
    ArgSpec::prop("virtualport.type", "virtualport_type"),
    ArgSpec::child("ip[0-9]*.family", &[IPS], "family"),
    ArgSpec::child("ip[0-9]*.address", &[IPS], "address"),
    ArgSpec::child("ip[0-9]*.netmask", &[IPS], "netmask"),
    ArgSpec::child("ip[0-9]*.prefix", &[IPS], "prefix"),
    ArgSpec::child("ip[0-9]*.tftp", &[IPS], "tftp"),
    ArgSpec::child("ip[0-9]*.dhcp.range[0-9]*.start", &[IPS, RANGES], "start"),
    ArgSpec::child("ip[0-9]*.dhcp.range[0-9]*.end", &[IPS, RANGES], "end"),
    ArgSpec::child("ip[0-9]*.dhcp.host[0-9]*.mac", &[IPS, HOSTS], "mac"),
    ArgSpec::child("ip[0-9]*.dhcp.host[0-9]*.name", &[IPS, HOSTS], "name"),
    ArgSpec::child("ip[0-9]*.dhcp.host[0-9]*.ip", &[IPS, HOSTS], "ip"),
    ArgSpec::child("ip[0-9]*.dhcp.bootp.file", &[IPS], "bootp_file"),
    ArgSpec::child("ip[0-9]*.dhcp.bootp.server", &[IPS], "bootp_server"),
    ArgSpec::child("route[0-9]*.family", &[ROUTES], "family"),
    ArgSpec::child("route[0-9]*.address", &[ROUTES], "address"),
    ArgSpec::child("route[0-9]*.prefix", &[ROUTES], "prefix"),
    ArgSpec::child("route[0-9]*.gateway", &[ROUTES], "gateway"),
    ArgSpec::child("portgroup[0-9]*.name", &[PORTGROUPS], "name"),
    ArgSpec::child("portgroup[0-9]*.default", &[PORTGROUPS], "default"),
];

/// `--network-def`: virtual network definitions. Named apart from the
/// guest `--network` option.
pub const NETWORK_DEF: ParserSpec = definition("network-def", network::network, &[NETWORK_ARGS]);

const SNAPSHOT_ARGS: &[ArgSpec] = &[
    ArgSpec::prop("name", "name"),
    ArgSpec::prop("description", "description").can_comma(),
    ArgSpec::prop("state", "state"),
    ArgSpec::prop("creationTime", "creation_time"),
    ArgSpec::prop("parent.name", "parent").aliases(&["parent"]),
    ArgSpec::prop("memory.snapshot", "memory_snapshot").aliases(&["memory"]),
    ArgSpec::prop("memory.file", "memory_file"),
    ArgSpec::child("disk[0-9]*.name", &[SNAPSHOT_DISKS], "name"),
    ArgSpec::child("disk[0-9]*.snapshot", &[SNAPSHOT_DISKS], "snapshot"),
    ArgSpec::child("disk[0-9]*.driver.type", &[SNAPSHOT_DISKS], "driver_type"),
    ArgSpec::child("disk[0-9]*.source.file", &[SNAPSHOT_DISKS], "source_file"),
];

pub const SNAPSHOT: ParserSpec = definition("snapshot", snapshot::snapshot, &[SNAPSHOT_ARGS]);
