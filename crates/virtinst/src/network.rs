//! `<network>` virtual network definitions.

use std::sync::OnceLock;

use virt_xmlbuilder::{PropertySpec, Schema};

use crate::names::*;

pub const FORWARD_MODES: &[&str] = &[
    "nat", "route", "open", "bridge", "private", "vepa", "passthrough", "hostdev",
];

schema! {
    pub fn network() {
        Schema::builder(NETWORK, "network")
            .property(PropertySpec::yes_no("ipv6", "./@ipv6"))
            .property(PropertySpec::text("name", "./name"))
            .property(PropertySpec::text("uuid", "./uuid"))
            .property(PropertySpec::choice("forward_mode", "./forward/@mode", FORWARD_MODES))
            .property(PropertySpec::text("forward_dev", "./forward/@dev"))
            .property(PropertySpec::text("bridge_name", "./bridge/@name"))
            .property(PropertySpec::on_off("bridge_stp", "./bridge/@stp"))
            .property(PropertySpec::int("bridge_delay", "./bridge/@delay"))
            .property(PropertySpec::int("mtu", "./mtu/@size"))
            .property(PropertySpec::text("mac", "./mac/@address"))
            .property(PropertySpec::text("domain_name", "./domain/@name"))
            .property(PropertySpec::text("virtualport_type", "./virtualport/@type"))
            .child(IPS, ".", ip)
            .child(ROUTES, ".", route)
            .child(PORTGROUPS, ".", portgroup)
            .build()
    }
}

schema! {
    /// `<ip>` block with its DHCP configuration.
    pub fn ip() {
        Schema::builder("ip", "ip")
            .property(PropertySpec::choice("family", "./@family", &["ipv4", "ipv6"]))
            .property(PropertySpec::text("address", "./@address"))
            .property(PropertySpec::text("netmask", "./@netmask"))
            .property(PropertySpec::int("prefix", "./@prefix"))
            .property(PropertySpec::text("tftp", "./tftp/@root"))
            .child(RANGES, "./dhcp", dhcp_range)
            .child(HOSTS, "./dhcp", dhcp_host)
            .property(PropertySpec::text("bootp_file", "./dhcp/bootp/@file"))
            .property(PropertySpec::text("bootp_server", "./dhcp/bootp/@server"))
            .build()
    }
}

schema! {
    pub fn dhcp_range() {
        Schema::builder("dhcp_range", "range")
            .property(PropertySpec::text("start", "./@start"))
            .property(PropertySpec::text("end", "./@end"))
            .build()
    }
}

schema! {
    pub fn dhcp_host() {
        Schema::builder("dhcp_host", "host")
            .property(PropertySpec::text("mac", "./@mac"))
            .property(PropertySpec::text("name", "./@name"))
            .property(PropertySpec::text("ip", "./@ip"))
            .build()
    }
}

schema! {
    pub fn route() {
        Schema::builder("route", "route")
            .property(PropertySpec::choice("family", "./@family", &["ipv4", "ipv6"]))
            .property(PropertySpec::text("address", "./@address"))
            .property(PropertySpec::int("prefix", "./@prefix"))
            .property(PropertySpec::text("gateway", "./@gateway"))
            .build()
    }
}

schema! {
    pub fn portgroup() {
        Schema::builder("portgroup", "portgroup")
            .property(PropertySpec::text("name", "./@name"))
            .property(PropertySpec::yes_no("default", "./@default"))
            .build()
    }
}

#[cfg(test)]
mod tests {
    use virt_xmlbuilder::XmlBuilder;

    use super::*;

    const FIXTURE: &str = r#"<network>
  <name>default</name>
  <forward mode="nat"/>
  <bridge name="virbr0" stp="on" delay="0"/>
  <ip address="192.168.122.1" netmask="255.255.255.0">
    <dhcp>
      <range start="192.168.122.2" end="192.168.122.254"/>
    </dhcp>
  </ip>
</network>
"#;

    #[test]
    fn nested_dhcp_collections_bind() {
        let mut net = XmlBuilder::parse(network(), FIXTURE).expect("parse");
        let ip = net.root().child(IPS, 0).unwrap();
        assert_eq!(ip.get("address").unwrap().as_deref(), Some("192.168.122.1"));
        assert_eq!(ip.children(RANGES).unwrap().len(), 1);

        let host = net
            .root_mut()
            .into_child(IPS, 0, false)
            .unwrap()
            .into_child(HOSTS, 0, true)
            .unwrap();
        let mut host = host;
        host.set("mac", Some("52:54:00:00:00:10")).unwrap();
        host.set("ip", Some("192.168.122.10")).unwrap();
        let xml = net.get_xml().unwrap();
        assert!(xml.contains(
            "      <range start=\"192.168.122.2\" end=\"192.168.122.254\"/>\n      <host mac=\"52:54:00:00:00:10\" ip=\"192.168.122.10\"/>\n    </dhcp>"
        ), "{xml}");
    }
}
