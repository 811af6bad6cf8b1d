//! Property binding invariants over arbitrary values.

use std::sync::OnceLock;

use proptest::prelude::*;
use virt_xmlbuilder::{PropertySpec, Schema, XmlBuilder};

const MODELS: &[&str] = &["virtio", "e1000", "rtl8139"];

fn interface() -> &'static Schema {
    static SCHEMA: OnceLock<Schema> = OnceLock::new();
    SCHEMA.get_or_init(|| {
        Schema::builder("interface", "interface")
            .property(PropertySpec::text("type", "./@type"))
            .property(PropertySpec::text("mac", "./mac/@address"))
            .property(PropertySpec::text("source", "./source/@network"))
            .property(PropertySpec::choice("model", "./model/@type", MODELS))
            .property(PropertySpec::int("mtu", "./mtu/@size"))
            .property(PropertySpec::on_off("link_state", "./link/@state"))
            .property(PropertySpec::text("description", "./description"))
            .build()
    })
}

const BASE: &str = "<interface type=\"network\">\n  <source network=\"default\"/>\n  <!-- managed elsewhere -->\n  <vendor:tag xmlns:vendor=\"urn:v\"/>\n</interface>\n";

fn arb_assignment() -> impl Strategy<Value = (&'static str, String)> {
    prop_oneof![
        "[0-9a-f]{2}(:[0-9a-f]{2}){5}".prop_map(|v| ("mac", v)),
        "[a-z]{1,8}".prop_map(|v| ("source", v)),
        prop::sample::select(MODELS).prop_map(|v| ("model", v.to_string())),
        (1i64..9000).prop_map(|v| ("mtu", v.to_string())),
        prop::bool::ANY.prop_map(|v| ("link_state", if v { "yes" } else { "0" }.to_string())),
        "[a-zA-Z<>&' ]{1,12}"
            .prop_filter("text is trimmed", |s| s.trim() == s)
            .prop_map(|v| ("description", v)),
    ]
}

proptest! {
    #[test]
    fn set_then_get_reads_back_normalized_value((name, value) in arb_assignment()) {
        let mut iface = XmlBuilder::parse(interface(), BASE).expect("parse");
        iface.set(name, Some(&value)).expect("set");
        let spec = interface().property(name).expect("declared");
        let expected = spec.normalize(&value).expect("normalize");
        prop_assert_eq!(iface.get(name).expect("get"), expected);
    }

    #[test]
    fn set_then_unset_restores_original(assignments in prop::collection::vec(arb_assignment(), 1..5)) {
        let mut iface = XmlBuilder::parse(interface(), BASE).expect("parse");
        for (name, value) in &assignments {
            if *name != "source" {
                iface.set(name, Some(value)).expect("set");
            }
        }
        for (name, _) in &assignments {
            if *name != "source" {
                iface.set(name, None).expect("unset");
            }
        }
        prop_assert_eq!(iface.get_xml().expect("xml"), BASE);
    }

    #[test]
    fn serialization_is_a_fixed_point((name, value) in arb_assignment()) {
        let mut iface = XmlBuilder::parse(interface(), BASE).expect("parse");
        iface.set(name, Some(&value)).expect("set");
        let first = iface.get_xml().expect("xml");
        let reparsed = XmlBuilder::parse(interface(), &first).expect("reparse");
        prop_assert_eq!(reparsed.get_xml().expect("xml"), first);
        prop_assert!(reparsed.same_values(&iface));
        prop_assert!(reparsed.diff(&iface).is_empty());
    }
}

#[test]
fn new_elements_follow_declaration_order() {
    let mut iface = XmlBuilder::parse(interface(), BASE).expect("parse");
    iface.set("mtu", Some("1500")).unwrap();
    iface.set("mac", Some("52:54:00:12:34:56")).unwrap();
    iface.set("model", Some("VIRTIO")).unwrap();
    assert_eq!(
        iface.get_xml().unwrap(),
        "<interface type=\"network\">\n  <mac address=\"52:54:00:12:34:56\"/>\n  <source network=\"default\"/>\n  <model type=\"virtio\"/>\n  <mtu size=\"1500\"/>\n  <!-- managed elsewhere -->\n  <vendor:tag xmlns:vendor=\"urn:v\"/>\n</interface>\n"
    );
}
