//! The `<domain>` definition and guest-wide device operations.

use std::sync::OnceLock;

use tracing::debug;
use virt_xmlbuilder::{BootOrder, BuildError, DefaultContext, PropertySpec, Schema, XmlBuilder};

use crate::devices;
use crate::names::*;

pub const DOMAIN_TYPES: &[&str] = &["kvm", "qemu", "xen", "lxc", "test"];
pub const LIFECYCLE_ACTIONS: &[&str] = &["destroy", "restart", "preserve", "rename-restart"];
pub const CRASH_ACTIONS: &[&str] = &[
    "destroy",
    "restart",
    "preserve",
    "rename-restart",
    "coredump-destroy",
    "coredump-restart",
];
pub const BOOT_DEVICES: &[&str] = &["hd", "cdrom", "network", "fd"];
pub const CPU_MODES: &[&str] = &["custom", "host-model", "host-passthrough", "maximum"];
pub const CLOCK_OFFSETS: &[&str] = &["utc", "localtime", "timezone", "variable"];

/// Indexed property covering every legacy `<os><boot dev=..>` entry.
pub const BOOT_DEV: &str = "boot_dev";

fn current_memory(ctx: &DefaultContext<'_>) -> Option<String> {
    ctx.get("memory")
}

schema! {
    /// `<domain>`: the guest definition.
    pub fn guest() {
        Schema::builder(GUEST, "domain")
            .property(PropertySpec::choice("type", "./@type", DOMAIN_TYPES).default_value("kvm"))
            .property(PropertySpec::text("name", "./name"))
            .property(PropertySpec::text("uuid", "./uuid"))
            .property(PropertySpec::text("genid", "./genid"))
            .property(PropertySpec::text("title", "./title"))
            .property(PropertySpec::text("description", "./description"))
            .property(PropertySpec::int("max_memory", "./maxMemory"))
            .property(PropertySpec::int("max_memory_slots", "./maxMemory/@slots"))
            .property(PropertySpec::int("memory", "./memory"))
            .property(PropertySpec::int("current_memory", "./currentMemory").default_with(&["memory"], current_memory))
            .property(PropertySpec::flag("hugepages", "./memoryBacking/hugepages"))
            .property(PropertySpec::flag("nosharepages", "./memoryBacking/nosharepages"))
            .property(PropertySpec::text("memory_source_type", "./memoryBacking/source/@type"))
            .property(PropertySpec::choice("memory_access_mode", "./memoryBacking/access/@mode", &["shared", "private"]))
            .property(PropertySpec::int("vcpus", "./vcpu").default_value("1"))
            .property(PropertySpec::choice("vcpu_placement", "./vcpu/@placement", &["static", "auto"]))
            .property(PropertySpec::text("vcpu_cpuset", "./vcpu/@cpuset"))
            .property(PropertySpec::int("vcpu_current", "./vcpu/@current"))
            .property(PropertySpec::int("iothreads", "./iothreads"))
            .property(PropertySpec::choice("os_firmware", "./os/@firmware", &["bios", "efi"]))
            .property(PropertySpec::text("os_type", "./os/type").default_value("hvm"))
            .property(PropertySpec::text("os_arch", "./os/type/@arch"))
            .property(PropertySpec::text("os_machine", "./os/type/@machine"))
            .property(PropertySpec::text("loader", "./os/loader"))
            .property(PropertySpec::yes_no("loader_readonly", "./os/loader/@readonly"))
            .property(PropertySpec::choice("loader_type", "./os/loader/@type", &["rom", "pflash"]))
            .property(PropertySpec::yes_no("loader_secure", "./os/loader/@secure"))
            .property(PropertySpec::text("nvram", "./os/nvram"))
            .property(PropertySpec::text("kernel", "./os/kernel"))
            .property(PropertySpec::text("initrd", "./os/initrd"))
            .property(PropertySpec::text("cmdline", "./os/cmdline"))
            .property(PropertySpec::text("init", "./os/init"))
            .property(PropertySpec::choice(BOOT_DEV, "./os/boot[{index}]/@dev", BOOT_DEVICES))
            .property(PropertySpec::yes_no("bootmenu_enable", "./os/bootmenu/@enable"))
            .property(PropertySpec::int("bootmenu_timeout", "./os/bootmenu/@timeout"))
            .property(PropertySpec::yes_no("bios_useserial", "./os/bios/@useserial"))
            .property(PropertySpec::int("bios_reboot_timeout", "./os/bios/@rebootTimeout"))
            .property(PropertySpec::choice("smbios_mode", "./os/smbios/@mode", &["emulate", "host", "sysinfo"]))
            .property(PropertySpec::flag("acpi", "./features/acpi"))
            .property(PropertySpec::flag("apic", "./features/apic"))
            .property(PropertySpec::flag("pae", "./features/pae"))
            .property(PropertySpec::on_off("hyperv_relaxed", "./features/hyperv/relaxed/@state"))
            .property(PropertySpec::on_off("hyperv_vapic", "./features/hyperv/vapic/@state"))
            .property(PropertySpec::on_off("hyperv_spinlocks", "./features/hyperv/spinlocks/@state"))
            .property(PropertySpec::int("hyperv_spinlocks_retries", "./features/hyperv/spinlocks/@retries"))
            .property(PropertySpec::on_off("kvm_hidden", "./features/kvm/hidden/@state"))
            .property(PropertySpec::on_off("vmport", "./features/vmport/@state"))
            .property(PropertySpec::on_off("smm", "./features/smm/@state"))
            .property(PropertySpec::text("ioapic_driver", "./features/ioapic/@driver"))
            .property(PropertySpec::choice("cpu_mode", "./cpu/@mode", CPU_MODES))
            .property(PropertySpec::choice("cpu_match", "./cpu/@match", &["minimum", "exact", "strict"]))
            .property(PropertySpec::choice("cpu_check", "./cpu/@check", &["none", "partial", "full"]))
            .property(PropertySpec::text("cpu_model", "./cpu/model"))
            .property(PropertySpec::choice("cpu_model_fallback", "./cpu/model/@fallback", &["allow", "forbid"]))
            .property(PropertySpec::text("cpu_vendor", "./cpu/vendor"))
            .property(PropertySpec::int("topology_sockets", "./cpu/topology/@sockets"))
            .property(PropertySpec::int("topology_dies", "./cpu/topology/@dies"))
            .property(PropertySpec::int("topology_cores", "./cpu/topology/@cores"))
            .property(PropertySpec::int("topology_threads", "./cpu/topology/@threads"))
            .child(CPU_FEATURES, "./cpu", cpu_feature)
            .property(PropertySpec::choice("clock_offset", "./clock/@offset", CLOCK_OFFSETS).default_value("utc"))
            .property(PropertySpec::text("clock_timezone", "./clock/@timezone"))
            .child(TIMERS, "./clock", clock_timer)
            .property(PropertySpec::choice("on_poweroff", "./on_poweroff", LIFECYCLE_ACTIONS))
            .property(PropertySpec::choice("on_reboot", "./on_reboot", LIFECYCLE_ACTIONS))
            .property(PropertySpec::choice("on_crash", "./on_crash", CRASH_ACTIONS))
            .property(PropertySpec::choice("on_lockfailure", "./on_lockfailure", &["poweroff", "restart", "pause", "ignore"]))
            .property(PropertySpec::yes_no("suspend_to_mem", "./pm/suspend-to-mem/@enabled"))
            .property(PropertySpec::yes_no("suspend_to_disk", "./pm/suspend-to-disk/@enabled"))
            .property(PropertySpec::text("emulator", "./devices/emulator"))
            .child(DISKS, "./devices", devices::disk)
            .child(CONTROLLERS, "./devices", devices::controller)
            .child(FILESYSTEMS, "./devices", devices::filesystem)
            .child(INTERFACES, "./devices", devices::interface)
            .child(SERIALS, "./devices", devices::serial)
            .child(CONSOLES, "./devices", devices::console)
            .child(CHANNELS, "./devices", devices::channel)
            .child(INPUTS, "./devices", devices::input)
            .child(TPMS, "./devices", devices::tpm)
            .child(GRAPHICS_DEVICES, "./devices", devices::graphics)
            .child(SOUNDS, "./devices", devices::sound)
            .child(VIDEOS, "./devices", devices::video)
            .child(HOSTDEVS, "./devices", devices::hostdev)
            .child(WATCHDOGS, "./devices", devices::watchdog)
            .child(MEMBALLOONS, "./devices", devices::memballoon)
            .child(RNGS, "./devices", devices::rng)
            .property(PropertySpec::choice("seclabel_type", "./seclabel/@type", &["dynamic", "static", "none"]))
            .property(PropertySpec::text("seclabel_model", "./seclabel/@model"))
            .property(PropertySpec::yes_no("seclabel_relabel", "./seclabel/@relabel"))
            .property(PropertySpec::text("seclabel_label", "./seclabel/label"))
            .property(PropertySpec::text("seclabel_baselabel", "./seclabel/baselabel"))
            .property(PropertySpec::text("seclabel_imagelabel", "./seclabel/imagelabel"))
            .build()
    }
}

schema! {
    /// `<feature policy=.. name=..>` below `<cpu>`.
    pub fn cpu_feature() {
        Schema::builder("cpu_feature", "feature")
            .property(PropertySpec::choice(
                "policy",
                "./@policy",
                &["force", "require", "optional", "disable", "forbid"],
            ))
            .property(PropertySpec::text("name", "./@name"))
            .build()
    }
}

schema! {
    pub fn clock_timer() {
        Schema::builder("timer", "timer")
            .property(PropertySpec::text("name", "./@name"))
            .property(PropertySpec::yes_no("present", "./@present"))
            .property(PropertySpec::choice(
                "tickpolicy",
                "./@tickpolicy",
                &["delay", "catchup", "merge", "discard"],
            ))
            .build()
    }
}

/// Collection names of every guest device kind that carries `<boot order>`.
pub fn bootable_collections() -> impl Iterator<Item = &'static str> {
    guest()
        .children()
        .iter()
        .filter(|child| (child.schema)().has::<BootOrder>())
        .map(|child| child.name)
}

/// Give device `index` of `collection` boot order `order`.
///
/// Legacy `<os><boot dev=..>` entries are removed since libvirt rejects
/// mixing them with per-device orders. Other bootable devices are visited
/// in ascending order (ties keep document order); each one colliding with
/// the new order, or with an order just shifted onto it, moves up by one.
/// The walk stops at the first gap.
pub fn reorder_boot_order(
    guest: &mut XmlBuilder,
    collection: &str,
    index: usize,
    order: i64,
) -> Result<(), BuildError> {
    clear_legacy_boot(guest)?;

    let mut ranked: Vec<(i64, &'static str, usize)> = Vec::new();
    for name in bootable_collections() {
        for (idx, device) in guest.children(name)?.iter().enumerate() {
            if let Some(current) = device.get_int(BootOrder::ORDER)? {
                ranked.push((current, name, idx));
            }
        }
    }
    ranked.sort_by_key(|(current, _, _)| *current);

    guest
        .collection(collection)?
        .get_mut(index)?
        .set_int(BootOrder::ORDER, Some(order))?;
    debug!(collection, index, order, "set boot order");

    let mut next: Option<i64> = None;
    for (current, name, idx) in ranked {
        if name == collection && idx == index {
            continue;
        }
        if current == order || Some(current) == next {
            let shifted = current + 1;
            guest
                .collection(name)?
                .get_mut(idx)?
                .set_int(BootOrder::ORDER, Some(shifted))?;
            debug!(collection = name, index = idx, order = shifted, "shifted boot order");
            next = Some(shifted);
            continue;
        }
        if next.is_some() {
            break;
        }
    }
    Ok(())
}

fn clear_legacy_boot(guest: &mut XmlBuilder) -> Result<(), BuildError> {
    let root = guest.document().root();
    while guest.document().exists(root, "./os/boot")? {
        guest.root_mut().clear_subtree("./os/boot", false)?;
    }
    Ok(())
}

/// Index of the first device in `collection` whose populated values equal
/// those of `device`.
pub fn find_device(
    guest: &XmlBuilder,
    collection: &str,
    device: &XmlBuilder,
) -> Result<Option<usize>, BuildError> {
    let wanted = device.root();
    Ok(guest
        .children(collection)?
        .iter()
        .position(|candidate| candidate.same_values(&wanted)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"<domain type="kvm">
  <name>boot-test</name>
  <memory>1048576</memory>
  <os>
    <type arch="x86_64">hvm</type>
    <boot dev="hd"/>
    <boot dev="cdrom"/>
  </os>
  <devices>
    <disk type="file" device="disk">
      <source file="/a.img"/>
      <target dev="hda" bus="ide"/>
      <boot order="1"/>
    </disk>
    <disk type="file" device="disk">
      <source file="/b.img"/>
      <target dev="hdb" bus="ide"/>
      <boot order="2"/>
    </disk>
    <disk type="file" device="cdrom">
      <target dev="hdc" bus="ide"/>
      <boot order="3"/>
    </disk>
    <interface type="network">
      <source network="default"/>
      <boot order="5"/>
    </interface>
  </devices>
</domain>
"#;

    fn orders(guest: &XmlBuilder) -> Vec<Option<i64>> {
        let mut out = Vec::new();
        for name in [DISKS, INTERFACES] {
            for device in guest.children(name).unwrap() {
                out.push(device.get_int(BootOrder::ORDER).unwrap());
            }
        }
        out
    }

    #[test]
    fn new_order_shifts_colliding_chain_until_gap() {
        let mut guest = XmlBuilder::parse(guest(), FIXTURE).expect("parse");
        reorder_boot_order(&mut guest, DISKS, 2, 1).expect("reorder");
        assert_eq!(orders(&guest), vec![Some(2), Some(3), Some(1), Some(5)]);
        let xml = guest.get_xml().unwrap();
        assert!(!xml.contains("<boot dev="), "legacy boot entries are removed");
        assert!(xml.contains("<type arch=\"x86_64\">hvm</type>"));
    }

    #[test]
    fn free_order_touches_nothing_else() {
        let mut guest = XmlBuilder::parse(guest(), FIXTURE).expect("parse");
        reorder_boot_order(&mut guest, DISKS, 0, 4).expect("reorder");
        assert_eq!(orders(&guest), vec![Some(4), Some(2), Some(3), Some(5)]);
    }

    #[test]
    fn tied_orders_all_move_past_new_order() {
        let xml = FIXTURE.replace("<boot order=\"3\"/>", "<boot order=\"2\"/>");
        let mut guest = XmlBuilder::parse(guest(), &xml).expect("parse");
        reorder_boot_order(&mut guest, INTERFACES, 0, 2).expect("reorder");
        assert_eq!(orders(&guest), vec![Some(1), Some(3), Some(3), Some(2)]);
    }

    #[test]
    fn bootable_kinds_carry_boot_order() {
        let names: Vec<_> = bootable_collections().collect();
        assert_eq!(names, vec![DISKS, FILESYSTEMS, INTERFACES, HOSTDEVS]);
    }

    #[test]
    fn find_device_compares_values() {
        let guest = XmlBuilder::parse(guest(), FIXTURE).expect("parse");
        let wanted = XmlBuilder::parse(
            devices::disk(),
            "<disk type=\"file\" device=\"cdrom\"><target dev=\"hdc\" bus=\"ide\"/><boot order=\"3\"/></disk>",
        )
        .expect("parse disk");
        assert_eq!(find_device(&guest, DISKS, &wanted).unwrap(), Some(2));
        let other = XmlBuilder::parse(devices::disk(), "<disk device=\"floppy\"/>").unwrap();
        assert_eq!(find_device(&guest, DISKS, &other).unwrap(), None);
    }

    #[test]
    fn fresh_guest_defaults() {
        let mut guest = XmlBuilder::build(guest());
        guest.set("name", Some("fresh")).unwrap();
        guest.set("memory", Some("2097152")).unwrap();
        assert_eq!(
            guest.get_xml().unwrap(),
            "<domain type=\"kvm\">\n  <name>fresh</name>\n  <memory>2097152</memory>\n  <currentMemory>2097152</currentMemory>\n  <vcpu>1</vcpu>\n  <os>\n    <type>hvm</type>\n  </os>\n  <clock offset=\"utc\"/>\n</domain>\n"
        );
    }
}
