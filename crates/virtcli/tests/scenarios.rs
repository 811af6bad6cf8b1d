use proptest::prelude::*;
use virtcli::{parser_for, perform, Action, CliError, Outcome, Selector};
use virtinst::devices::disk_path;
use virtinst::xmlbuilder::{BootOrder, XmlBuilder};
use virtinst::{guest, names};

const TWO_DISKS: &str = r#"<domain type="kvm">
  <name>scenario</name>
  <memory>1048576</memory>
  <devices>
    <disk type="file" device="disk">
      <source file="/var/lib/libvirt/images/a.img"/>
      <target dev="hda" bus="ide"/>
      <boot order="1"/>
    </disk>
    <disk type="file" device="disk">
      <source file="/var/lib/libvirt/images/b.img"/>
      <target dev="hdb" bus="ide"/>
      <boot order="2"/>
    </disk>
  </devices>
</domain>
"#;

const MIXED_SOURCES: &str = r#"<domain type="kvm">
  <name>sources</name>
  <devices>
    <disk type="block" device="disk">
      <source dev="/dev/sdb"/>
      <target dev="vdb" bus="virtio"/>
    </disk>
    <disk type="file" device="cdrom">
      <source file="/srv/iso/install.iso" startupPolicy="optional"/>
      <target dev="sda" bus="sata"/>
      <readonly/>
    </disk>
  </devices>
</domain>
"#;

fn load() -> XmlBuilder {
    XmlBuilder::parse(guest::guest(), TWO_DISKS).expect("fixture parses")
}

fn run(doc: &mut XmlBuilder, action: Action, option: &str, optstrs: &[&str]) -> Result<Vec<String>, CliError> {
    let options: Vec<String> = optstrs.iter().map(|s| s.to_string()).collect();
    match perform(&action, parser_for(option).expect("known option"), doc, &options)? {
        Outcome::Applied(objects) => Ok(objects),
        Outcome::Introspection(listing) => panic!("unexpected listing:\n{listing}"),
    }
}

fn boot_orders(doc: &XmlBuilder) -> Vec<Option<i64>> {
    doc.children(names::DISKS)
        .unwrap()
        .iter()
        .map(|disk| disk.get_int(BootOrder::ORDER).unwrap())
        .collect()
}

#[test]
fn selected_disk_gets_new_boot_order_only() {
    let mut doc = load();
    let edited = run(
        &mut doc,
        Action::Edit(Selector::parse(Some("target=hda")).unwrap()),
        "disk",
        &["boot_order=5"],
    )
    .unwrap();
    assert_eq!(edited.len(), 1);
    assert!(edited[0].contains("<boot order=\"5\"/>"), "{}", edited[0]);
    assert_eq!(boot_orders(&doc), vec![Some(5), Some(2)]);
}

#[test]
fn added_disk_carries_exactly_the_given_values() {
    let mut doc = load();
    let added = run(
        &mut doc,
        Action::AddDevice,
        "disk",
        &["path=/tmp/x.img,cache=writeback,boot_order=3"],
    )
    .unwrap();
    assert_eq!(added.len(), 1);

    let disks = doc.children(names::DISKS).unwrap();
    assert_eq!(disks.len(), 3);
    let new = disks[2];
    assert_eq!(new.position(), 3);
    assert_eq!(disk_path(new).unwrap().as_deref(), Some("/tmp/x.img"));
    assert_eq!(new.get("driver_cache").unwrap().as_deref(), Some("writeback"));
    assert_eq!(new.get_int(BootOrder::ORDER).unwrap(), Some(3));
    assert_eq!(new.get("target").unwrap(), None);
    assert_eq!(boot_orders(&doc), vec![Some(1), Some(2), Some(3)]);
}

#[test]
fn added_disk_takes_the_requested_boot_slot() {
    let mut doc = load();
    run(
        &mut doc,
        Action::AddDevice,
        "disk",
        &["path=/tmp/x.img,cache=writeback,boot_order=2"],
    )
    .unwrap();

    let disks = doc.children(names::DISKS).unwrap();
    assert_eq!(disks.len(), 3);
    let new = disks[2];
    assert_eq!(new.position(), 3);
    assert_eq!(disk_path(new).unwrap().as_deref(), Some("/tmp/x.img"));
    assert_eq!(new.get("driver_cache").unwrap().as_deref(), Some("writeback"));
    assert_eq!(new.get_int(BootOrder::ORDER).unwrap(), Some(2));
    assert_eq!(boot_orders(&doc), vec![Some(1), Some(3), Some(2)]);
}

#[test]
fn adding_a_colliding_boot_order_shifts_the_others() {
    let mut doc = load();
    run(&mut doc, Action::AddDevice, "disk", &["path=/tmp/x.img,boot_order=1"]).unwrap();
    assert_eq!(boot_orders(&doc), vec![Some(2), Some(3), Some(1)]);
}

#[test]
fn empty_path_removes_the_source_element() {
    let mut doc = load();
    run(
        &mut doc,
        Action::Edit(Selector::parse(Some("1")).unwrap()),
        "disk",
        &["path="],
    )
    .unwrap();
    let first = doc.children(names::DISKS).unwrap()[0].to_xml();
    assert!(!first.contains("<source"), "{first}");
    assert!(!first.contains("file=\"\""));
    assert!(doc.get_xml().unwrap().contains("/var/lib/libvirt/images/b.img"));
}

#[test]
fn empty_path_removes_block_and_policy_sources() {
    let mut doc = XmlBuilder::parse(guest::guest(), MIXED_SOURCES).unwrap();
    run(
        &mut doc,
        Action::Edit(Selector::parse(Some("target=vdb")).unwrap()),
        "disk",
        &["path="],
    )
    .unwrap();
    run(
        &mut doc,
        Action::Edit(Selector::parse(Some("target=sda")).unwrap()),
        "disk",
        &["path="],
    )
    .unwrap();
    let xml = doc.get_xml().unwrap();
    assert!(!xml.contains("<source"), "{xml}");
    assert!(!xml.contains("startupPolicy"), "{xml}");
    let disks = doc.children(names::DISKS).unwrap();
    assert_eq!(disks[0].get("type").unwrap().as_deref(), Some("block"));
    assert_eq!(disks[1].get("read_only").unwrap().as_deref(), Some("yes"));
}

#[test]
fn path_selects_and_rewrites_block_sources() {
    let mut doc = XmlBuilder::parse(guest::guest(), MIXED_SOURCES).unwrap();
    run(
        &mut doc,
        Action::Edit(Selector::parse(Some("path=/dev/sdb")).unwrap()),
        "disk",
        &["path=/dev/sdc"],
    )
    .unwrap();
    let first = doc.children(names::DISKS).unwrap()[0].to_xml();
    assert!(first.contains("<source dev=\"/dev/sdc\"/>"), "{first}");
    assert!(!first.contains("file="), "{first}");

    let err = run(
        &mut doc,
        Action::Edit(Selector::parse(Some("path=/dev/sdb")).unwrap()),
        "disk",
        &["cache=none"],
    )
    .unwrap_err();
    assert!(matches!(err, CliError::NoMatchingDevice { .. }), "{err:?}");
}

#[test]
fn typed_path_lands_in_the_matching_attribute() {
    let mut doc = load();
    run(&mut doc, Action::AddDevice, "disk", &["path=/dev/sdc,type=block,target=vdc"]).unwrap();
    run(&mut doc, Action::AddDevice, "disk", &["path=/srv/share,type=dir,target=vdd"]).unwrap();
    let disks = doc.children(names::DISKS).unwrap();
    assert!(disks[2].to_xml().contains("<source dev=\"/dev/sdc\"/>"), "{}", disks[2].to_xml());
    assert!(disks[3].to_xml().contains("<source dir=\"/srv/share\"/>"), "{}", disks[3].to_xml());
    assert_eq!(disk_path(disks[3]).unwrap().as_deref(), Some("/srv/share"));
}

#[test]
fn remove_device_takes_the_matching_disk() {
    let mut doc = load();
    let removed = run(&mut doc, Action::RemoveDevice, "disk", &["target=hdb"]).unwrap();
    assert_eq!(removed.len(), 1);
    assert!(removed[0].contains("<target dev=\"hdb\" bus=\"ide\"/>"), "{}", removed[0]);
    let left = doc.children(names::DISKS).unwrap();
    assert_eq!(left.len(), 1);
    assert_eq!(left[0].get("target").unwrap().as_deref(), Some("hda"));
}

#[test]
fn remove_all_empties_the_collection() {
    let mut doc = load();
    let removed = run(&mut doc, Action::RemoveDevice, "disk", &["all"]).unwrap();
    assert_eq!(removed.len(), 2);
    assert!(removed[0].contains("hda"));
    assert!(doc.children(names::DISKS).unwrap().is_empty());
    assert!(!doc.get_xml().unwrap().contains("<disk"));
}

#[test]
fn clearxml_resets_the_device_before_other_terms() {
    let mut doc = load();
    run(
        &mut doc,
        Action::Edit(Selector::parse(Some("target=hdb")).unwrap()),
        "disk",
        &["clearxml=yes,path=/new.img,target=vdb"],
    )
    .unwrap();
    let second = doc.children(names::DISKS).unwrap()[1];
    assert_eq!(disk_path(second).unwrap().as_deref(), Some("/new.img"));
    assert_eq!(second.get("target").unwrap().as_deref(), Some("vdb"));
    assert_eq!(second.get_int(BootOrder::ORDER).unwrap(), None);
}

#[test]
fn boot_block_clearxml_drops_the_os_block() {
    let mut doc = load();
    doc.set("os_machine", Some("q35")).unwrap();
    run(&mut doc, Action::Edit(Selector::Implicit), "boot", &["clearxml=yes"]).unwrap();
    assert_eq!(doc.get("os_machine").unwrap(), None);
    assert_eq!(doc.get("name").unwrap().as_deref(), Some("scenario"));

    let mut doc = load();
    run(&mut doc, Action::Edit(Selector::Implicit), "boot", &["menu=on,boot.dev=hd,boot1.dev=cdrom"]).unwrap();
    assert_eq!(doc.get("bootmenu_enable").unwrap().as_deref(), Some("yes"));
    assert_eq!(doc.get_at(guest::BOOT_DEV, 1).unwrap().as_deref(), Some("hd"));
    assert_eq!(doc.get_at(guest::BOOT_DEV, 2).unwrap().as_deref(), Some("cdrom"));
}

#[test]
fn editing_twice_changes_nothing_the_second_time() {
    let mut doc = load();
    let selector = Selector::parse(Some("target=hda")).unwrap();
    run(&mut doc, Action::Edit(selector.clone()), "disk", &["cache=none,io=native"]).unwrap();
    let once = doc.clone();
    run(&mut doc, Action::Edit(selector), "disk", &["cache=none,io=native"]).unwrap();
    assert!(once.diff(&doc).is_empty());
    assert_eq!(once.get_xml().unwrap(), doc.get_xml().unwrap());
}

#[test]
fn same_terms_on_two_parsed_copies_agree() {
    let mut left = load();
    let mut right = load();
    for doc in [&mut left, &mut right] {
        run(doc, Action::Edit(Selector::All), "disk", &["cache=none,source.startupPolicy=optional"]).unwrap();
        run(doc, Action::AddDevice, "disk", &["path=/tmp/x.img,boot_order=1"]).unwrap();
        run(doc, Action::Edit(Selector::Implicit), "boot", &["cmdline=console=ttyS0,console=tty0"]).unwrap();
    }
    assert_eq!(left.get_xml().unwrap(), right.get_xml().unwrap());
    assert!(left.diff(&right).is_empty(), "{:?}", left.diff(&right));
    assert!(!load().diff(&left).is_empty());
}

#[test]
fn diff_names_the_changed_property() {
    let original = load();
    let mut doc = original.clone();
    run(
        &mut doc,
        Action::Edit(Selector::parse(Some("2")).unwrap()),
        "disk",
        &["cache=writeback"],
    )
    .unwrap();
    let changes: Vec<String> = original.diff(&doc).iter().map(ToString::to_string).collect();
    assert_eq!(changes.len(), 1, "{changes:?}");
    assert!(changes[0].starts_with("./devices/disk[2]/driver"), "{changes:?}");
    assert!(changes[0].contains("cache=\"writeback\""), "{changes:?}");
}

#[test]
fn unknown_suboption_leaves_the_document_alone() {
    let mut doc = load();
    let before = doc.get_xml().unwrap();
    let err = run(
        &mut doc,
        Action::Edit(Selector::All),
        "disk",
        &["cache=none,bogus=1"],
    )
    .unwrap_err();
    assert!(matches!(err, CliError::UnknownSuboption { .. }), "{err:?}");
    assert_eq!(doc.get_xml().unwrap(), before);
}

#[test]
fn pool_definition_edits_the_root() {
    let mut doc = XmlBuilder::build(virtinst::pool::pool());
    run(&mut doc, Action::Edit(Selector::Implicit), "pool", &["images2,type=dir"]).unwrap();
    assert_eq!(doc.get("name").unwrap().as_deref(), Some("images2"));
    assert!(doc
        .get_xml()
        .unwrap()
        .contains("<path>/var/lib/libvirt/images/images2</path>"));
}

proptest! {
    #[test]
    fn free_boot_orders_land_untouched(order in 3i64..1000) {
        let mut doc = load();
        let path = format!("path=/tmp/p{order}.img,boot_order={order}");
        run(&mut doc, Action::AddDevice, "disk", &[path.as_str()]).unwrap();
        prop_assert_eq!(boot_orders(&doc), vec![Some(1), Some(2), Some(order)]);
    }

    #[test]
    fn repeated_cmdline_fragments_all_survive(
        fragments in prop::collection::vec(
            prop::sample::select(vec!["console=tty0", "console=ttyS0", "quiet", "a=1"]),
            1..6,
        )
    ) {
        let mut doc = load();
        let cmdline = fragments.join(",");
        let optstr = format!("cmdline={cmdline}");
        run(&mut doc, Action::Edit(Selector::Implicit), "boot", &[optstr.as_str()]).unwrap();
        prop_assert_eq!(doc.get("cmdline").unwrap(), Some(cmdline));
    }

    #[test]
    fn instance_numbers_never_panic(instance in any::<usize>()) {
        let mut doc = load();
        let optstr = format!("boot{instance}.dev=hd");
        match run(&mut doc, Action::Edit(Selector::Implicit), "boot", &[optstr.as_str()]) {
            Ok(_) => prop_assert!(instance < usize::MAX),
            Err(err) => prop_assert!(matches!(err, CliError::InvalidIndex { .. }), "{:?}", err),
        }

        let optstr = format!("seclabel{instance}.model=dac");
        let first = Action::Edit(Selector::Position(1));
        let result = run(&mut doc, first, "disk", &[optstr.as_str()]);
        prop_assert_eq!(result.is_ok(), instance == 0);
        let disks = doc.children(names::DISKS).unwrap();
        let seclabels = disks[0].children(names::SECLABELS).unwrap().len();
        prop_assert_eq!(seclabels, usize::from(instance == 0));
    }

    #[test]
    fn same_cache_edit_reproduces_on_both_copies(
        cache in prop::sample::select(virtinst::devices::DISK_CACHE_MODES.to_vec()),
        pick in 1i64..=2,
    ) {
        let mut left = load();
        let mut right = load();
        let optstr = format!("cache={cache}");
        for doc in [&mut left, &mut right] {
            run(doc, Action::Edit(Selector::Position(pick)), "disk", &[optstr.as_str()]).unwrap();
        }
        prop_assert_eq!(left.get_xml().unwrap(), right.get_xml().unwrap());
        prop_assert!(left.diff(&right).is_empty());
    }

    #[test]
    fn positions_address_the_same_disk_from_both_ends(pick in 1usize..=2) {
        let doc = load();
        let parser = parser_for("disk").unwrap();
        let forward = Selector::Position(pick as i64).resolve(parser, &doc).unwrap();
        let backward = Selector::Position(pick as i64 - 3).resolve(parser, &doc).unwrap();
        prop_assert_eq!(forward, backward);
    }
}
