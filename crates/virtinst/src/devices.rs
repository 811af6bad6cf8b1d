//! Device schemas found below `<domain><devices>`.

use std::sync::OnceLock;

use virt_xmlbuilder::{
    Address, Alias, BootOrder, BuildError, DefaultContext, Obj, ObjMut, PropertySpec, Schema,
};

use crate::names::*;

pub const DISK_DEVICES: &[&str] = &["disk", "cdrom", "floppy", "lun"];
pub const DISK_BUSES: &[&str] = &["ide", "scsi", "virtio", "xen", "usb", "sata", "sd", "fdc"];
pub const DISK_CACHE_MODES: &[&str] = &[
    "default",
    "none",
    "writethrough",
    "writeback",
    "directsync",
    "unsafe",
];
pub const DISK_IO_MODES: &[&str] = &["native", "threads", "io_uring"];
pub const DISK_DISCARD_MODES: &[&str] = &["ignore", "unmap"];
pub const DISK_ERROR_POLICIES: &[&str] = &["stop", "report", "ignore", "enospace"];

fn disk_type(ctx: &DefaultContext<'_>) -> Option<String> {
    let kind = if ctx.get("source_protocol").is_some() {
        "network"
    } else if ctx.get("source_dev").is_some() {
        "block"
    } else if ctx.get("source_dir").is_some() {
        "dir"
    } else if ctx.get("source_volume").is_some() {
        "volume"
    } else {
        "file"
    };
    Some(kind.to_string())
}

fn disk_bus(ctx: &DefaultContext<'_>) -> Option<String> {
    let bus = match ctx.get("device").as_deref() {
        Some("floppy") => "fdc",
        Some("cdrom") => "sata",
        Some("lun") => "scsi",
        _ => "virtio",
    };
    Some(bus.to_string())
}

schema! {
    /// `<disk>`: storage attached to the guest.
    pub fn disk() {
        Schema::builder(DISK, "disk")
            .property(PropertySpec::text("type", "./@type").default_with(
                &["source_protocol", "source_dev", "source_dir", "source_volume"],
                disk_type,
            ))
            .property(PropertySpec::choice("device", "./@device", DISK_DEVICES).default_value("disk"))
            .property(PropertySpec::text("driver_name", "./driver/@name"))
            .property(PropertySpec::text("driver_type", "./driver/@type"))
            .property(PropertySpec::choice("driver_cache", "./driver/@cache", DISK_CACHE_MODES))
            .property(PropertySpec::choice("driver_io", "./driver/@io", DISK_IO_MODES))
            .property(PropertySpec::choice("driver_discard", "./driver/@discard", DISK_DISCARD_MODES))
            .property(PropertySpec::choice(
                "error_policy",
                "./driver/@error_policy",
                DISK_ERROR_POLICIES,
            ))
            .property(PropertySpec::text("source_file", "./source/@file"))
            .property(PropertySpec::text("source_dev", "./source/@dev"))
            .property(PropertySpec::text("source_dir", "./source/@dir"))
            .property(PropertySpec::text("source_pool", "./source/@pool"))
            .property(PropertySpec::text("source_volume", "./source/@volume"))
            .property(PropertySpec::text("source_protocol", "./source/@protocol"))
            .property(PropertySpec::text("source_name", "./source/@name"))
            .property(PropertySpec::text("startup_policy", "./source/@startupPolicy"))
            .child(HOSTS, "./source", disk_host)
            .child(SECLABELS, "./source", seclabel)
            .property(PropertySpec::text("target", "./target/@dev"))
            .property(PropertySpec::choice("bus", "./target/@bus", DISK_BUSES).default_with(&["device"], disk_bus))
            .property(PropertySpec::on_off("removable", "./target/@removable"))
            .property(PropertySpec::int("iotune_total_bytes_sec", "./iotune/total_bytes_sec"))
            .property(PropertySpec::int("iotune_total_iops_sec", "./iotune/total_iops_sec"))
            .capability::<BootOrder>()
            .capability::<Alias>()
            .capability::<Address>()
            .property(PropertySpec::flag("read_only", "./readonly"))
            .property(PropertySpec::flag("shareable", "./shareable"))
            .property(PropertySpec::flag("transient", "./transient"))
            .property(PropertySpec::text("serial", "./serial"))
            .property(PropertySpec::text("wwn", "./wwn"))
            .build()
    }
}

/// Source properties that name the medium itself.
const DISK_MEDIA: &[&str] = &[
    "source_file",
    "source_dev",
    "source_dir",
    "source_volume",
    "source_pool",
    "source_protocol",
    "source_name",
];

/// Local path a disk reads from, whichever of `file`, `dev` or `dir`
/// holds it.
pub fn disk_path(disk: Obj<'_>) -> Result<Option<String>, BuildError> {
    for name in ["source_file", "source_dev", "source_dir"] {
        if let Some(path) = disk.get(name)? {
            return Ok(Some(path));
        }
    }
    Ok(None)
}

/// Point `disk` at `path`, in the attribute its `type` calls for. Other
/// media and network hosts are dropped. `None` removes `<source>` with
/// everything below it.
pub fn set_disk_path(disk: &mut ObjMut<'_>, path: Option<&str>) -> Result<(), BuildError> {
    let Some(path) = path else {
        return disk.clear_subtree("./source", false);
    };
    for name in DISK_MEDIA {
        disk.set(name, None)?;
    }
    let mut hosts = disk.collection(HOSTS)?;
    while !hosts.is_empty() {
        hosts.remove(0)?;
    }
    let property = match disk.get("type")?.as_deref() {
        Some("block") => "source_dev",
        Some("dir") => "source_dir",
        _ => "source_file",
    };
    disk.set(property, Some(path))
}

schema! {
    /// `<host>` below a network disk source.
    pub fn disk_host() {
        Schema::builder("disk_host", "host")
            .property(PropertySpec::text("name", "./@name"))
            .property(PropertySpec::int("port", "./@port"))
            .property(PropertySpec::choice("transport", "./@transport", &["tcp", "unix", "rdma"]))
            .property(PropertySpec::text("socket", "./@socket"))
            .build()
    }
}

schema! {
    /// `<seclabel>` overriding the guest label for one source.
    pub fn seclabel() {
        Schema::builder("seclabel", "seclabel")
            .property(PropertySpec::text("model", "./@model"))
            .property(PropertySpec::yes_no("relabel", "./@relabel"))
            .property(PropertySpec::text("label", "./label"))
            .build()
    }
}

pub const INTERFACE_TYPES: &[&str] = &[
    "network",
    "bridge",
    "direct",
    "user",
    "ethernet",
    "hostdev",
    "vhostuser",
];

fn interface_source(ctx: &DefaultContext<'_>) -> Option<String> {
    (ctx.get("type").as_deref() == Some("network")).then(|| "default".to_string())
}

schema! {
    /// `<interface>`: a guest NIC.
    pub fn interface() {
        Schema::builder(INTERFACE, "interface")
            .property(PropertySpec::choice("type", "./@type", INTERFACE_TYPES).default_value("network"))
            .property(PropertySpec::yes_no("trust_guest_rx_filters", "./@trustGuestRxFilters"))
            .property(PropertySpec::text("mac", "./mac/@address"))
            .property(PropertySpec::text("source_network", "./source/@network").default_with(&["type"], interface_source))
            .property(PropertySpec::text("source_bridge", "./source/@bridge"))
            .property(PropertySpec::text("source_dev", "./source/@dev"))
            .property(PropertySpec::text("source_mode", "./source/@mode"))
            .property(PropertySpec::text("portgroup", "./source/@portgroup"))
            .property(PropertySpec::text("virtualport_type", "./virtualport/@type"))
            .property(PropertySpec::text("target_dev", "./target/@dev"))
            .property(PropertySpec::text("model", "./model/@type").default_value("virtio"))
            .property(PropertySpec::text("driver_name", "./driver/@name"))
            .property(PropertySpec::int("driver_queues", "./driver/@queues"))
            .property(PropertySpec::text("filterref", "./filterref/@filter"))
            .property(PropertySpec::choice("link_state", "./link/@state", &["up", "down"]))
            .property(PropertySpec::int("mtu", "./mtu/@size"))
            .capability::<BootOrder>()
            .capability::<Alias>()
            .capability::<Address>()
            .build()
    }
}

pub const CONTROLLER_TYPES: &[&str] = &[
    "ide",
    "fdc",
    "scsi",
    "sata",
    "usb",
    "pci",
    "virtio-serial",
    "ccid",
    "xenbus",
];

schema! {
    pub fn controller() {
        Schema::builder(CONTROLLER, "controller")
            .property(PropertySpec::choice("type", "./@type", CONTROLLER_TYPES))
            .property(PropertySpec::int("index", "./@index"))
            .property(PropertySpec::text("model", "./@model"))
            .property(PropertySpec::int("ports", "./@ports"))
            .property(PropertySpec::int("vectors", "./@vectors"))
            .property(PropertySpec::int("master_startport", "./master/@startport"))
            .property(PropertySpec::int("driver_queues", "./driver/@queues"))
            .capability::<Alias>()
            .capability::<Address>()
            .build()
    }
}

pub const GRAPHICS_TYPES: &[&str] = &["vnc", "spice", "sdl", "egl-headless", "dbus"];

schema! {
    pub fn graphics() {
        Schema::builder(GRAPHICS, "graphics")
            .property(PropertySpec::choice("type", "./@type", GRAPHICS_TYPES).default_value("vnc"))
            .property(PropertySpec::int("port", "./@port"))
            .property(PropertySpec::int("tls_port", "./@tlsPort"))
            .property(PropertySpec::yes_no("autoport", "./@autoport"))
            .property(PropertySpec::text("listen", "./@listen"))
            .property(PropertySpec::text("passwd", "./@passwd"))
            .property(PropertySpec::text("keymap", "./@keymap"))
            .child(LISTENS, ".", graphics_listen)
            .property(PropertySpec::text("image_compression", "./image/@compression"))
            .property(PropertySpec::text("mouse_mode", "./mouse/@mode"))
            .property(PropertySpec::yes_no("clipboard_copypaste", "./clipboard/@copypaste"))
            .property(PropertySpec::yes_no("filetransfer_enable", "./filetransfer/@enable"))
            .property(PropertySpec::yes_no("gl_enable", "./gl/@enable"))
            .property(PropertySpec::text("gl_rendernode", "./gl/@rendernode"))
            .build()
    }
}

schema! {
    /// `<listen>` entry of a graphics device.
    pub fn graphics_listen() {
        Schema::builder("graphics_listen", "listen")
            .property(PropertySpec::choice(
                "type",
                "./@type",
                &["address", "network", "socket", "none"],
            ))
            .property(PropertySpec::text("address", "./@address"))
            .property(PropertySpec::text("network", "./@network"))
            .property(PropertySpec::text("socket", "./@socket"))
            .build()
    }
}

pub const VIDEO_MODELS: &[&str] = &[
    "cirrus", "vga", "qxl", "virtio", "vmvga", "bochs", "ramfb", "none",
];

schema! {
    pub fn video() {
        Schema::builder(VIDEO, "video")
            .property(PropertySpec::choice("model", "./model/@type", VIDEO_MODELS).default_value("virtio"))
            .property(PropertySpec::int("vram", "./model/@vram"))
            .property(PropertySpec::int("ram", "./model/@ram"))
            .property(PropertySpec::int("vgamem", "./model/@vgamem"))
            .property(PropertySpec::int("heads", "./model/@heads"))
            .property(PropertySpec::yes_no("accel3d", "./model/acceleration/@accel3d"))
            .capability::<Alias>()
            .capability::<Address>()
            .build()
    }
}

fn input_bus(ctx: &DefaultContext<'_>) -> Option<String> {
    let bus = match ctx.get("type").as_deref() {
        Some("mouse") => "ps2",
        Some("evdev") | Some("passthrough") => "virtio",
        _ => "usb",
    };
    Some(bus.to_string())
}

schema! {
    pub fn input() {
        Schema::builder(INPUT, "input")
            .property(PropertySpec::choice(
                "type",
                "./@type",
                &["mouse", "tablet", "keyboard", "passthrough", "evdev"],
            ).default_value("tablet"))
            .property(PropertySpec::choice("bus", "./@bus", &["ps2", "usb", "xen", "virtio"]).default_with(&["type"], input_bus))
            .property(PropertySpec::text("source_evdev", "./source/@evdev"))
            .capability::<Alias>()
            .capability::<Address>()
            .build()
    }
}

/// Properties shared by serial, console and channel devices.
pub const CHAR_PROPERTIES: &[PropertySpec] = &[
    PropertySpec::text("type", "./@type").default_value("pty"),
    PropertySpec::text("source_path", "./source/@path"),
    PropertySpec::choice("source_mode", "./source/@mode", &["bind", "connect"]),
    PropertySpec::text("source_host", "./source/@host"),
    PropertySpec::text("source_service", "./source/@service"),
    PropertySpec::text("protocol", "./protocol/@type"),
    PropertySpec::text("log_file", "./log/@file"),
    PropertySpec::on_off("log_append", "./log/@append"),
    PropertySpec::text("target_type", "./target/@type"),
    PropertySpec::int("target_port", "./target/@port"),
    PropertySpec::text("target_name", "./target/@name"),
    PropertySpec::text("target_address", "./target/@address"),
    PropertySpec::text("target_model", "./target/model/@name"),
];

schema! {
    pub fn serial() {
        Schema::builder(SERIAL, "serial")
            .properties(CHAR_PROPERTIES)
            .capability::<Alias>()
            .capability::<Address>()
            .build()
    }
}

schema! {
    pub fn console() {
        Schema::builder(CONSOLE, "console")
            .properties(CHAR_PROPERTIES)
            .capability::<Alias>()
            .capability::<Address>()
            .build()
    }
}

schema! {
    pub fn channel() {
        Schema::builder(CHANNEL, "channel")
            .properties(CHAR_PROPERTIES)
            .capability::<Alias>()
            .capability::<Address>()
            .build()
    }
}

pub const SOUND_MODELS: &[&str] = &[
    "sb16", "es1370", "pcspk", "ac97", "ich6", "ich7", "ich9", "usb",
];

schema! {
    pub fn sound() {
        Schema::builder(SOUND, "sound")
            .property(PropertySpec::choice("model", "./@model", SOUND_MODELS).default_value("ich9"))
            .child(CODECS, ".", sound_codec)
            .property(PropertySpec::int("audio_id", "./audio/@id"))
            .capability::<Alias>()
            .capability::<Address>()
            .build()
    }
}

schema! {
    pub fn sound_codec() {
        Schema::builder("sound_codec", "codec")
            .property(PropertySpec::choice("type", "./@type", &["duplex", "micro", "output"]))
            .build()
    }
}

pub const WATCHDOG_ACTIONS: &[&str] = &[
    "reset",
    "shutdown",
    "poweroff",
    "pause",
    "none",
    "dump",
    "inject-nmi",
];

schema! {
    pub fn watchdog() {
        Schema::builder(WATCHDOG, "watchdog")
            .property(PropertySpec::choice(
                "model",
                "./@model",
                &["i6300esb", "ib700", "diag288", "itco"],
            ).default_value("i6300esb"))
            .property(PropertySpec::choice("action", "./@action", WATCHDOG_ACTIONS).default_value("reset"))
            .capability::<Alias>()
            .capability::<Address>()
            .build()
    }
}

schema! {
    /// `<hostdev>`: a host device passed through to the guest.
    pub fn hostdev() {
        Schema::builder(HOSTDEV, "hostdev")
            .property(PropertySpec::text("mode", "./@mode").default_value("subsystem"))
            .property(PropertySpec::choice("type", "./@type", &["usb", "pci", "scsi", "mdev"]))
            .property(PropertySpec::yes_no("managed", "./@managed").default_value("yes"))
            .property(PropertySpec::text("vendor", "./source/vendor/@id"))
            .property(PropertySpec::text("product", "./source/product/@id"))
            .property(PropertySpec::text("source_address_domain", "./source/address/@domain"))
            .property(PropertySpec::text("source_address_bus", "./source/address/@bus"))
            .property(PropertySpec::text("source_address_slot", "./source/address/@slot"))
            .property(PropertySpec::text("source_address_function", "./source/address/@function"))
            .property(PropertySpec::text("source_address_device", "./source/address/@device"))
            .property(PropertySpec::text("driver_name", "./driver/@name"))
            .property(PropertySpec::on_off("rom_bar", "./rom/@bar"))
            .property(PropertySpec::text("rom_file", "./rom/@file"))
            .capability::<BootOrder>()
            .capability::<Alias>()
            .capability::<Address>()
            .build()
    }
}

fn rng_device(ctx: &DefaultContext<'_>) -> Option<String> {
    (ctx.get("backend_model").as_deref() == Some("random")).then(|| "/dev/urandom".to_string())
}

schema! {
    pub fn rng() {
        Schema::builder(RNG, "rng")
            .property(PropertySpec::text("model", "./@model").default_value("virtio"))
            .property(PropertySpec::int("rate_bytes", "./rate/@bytes"))
            .property(PropertySpec::int("rate_period", "./rate/@period"))
            .property(PropertySpec::choice("backend_model", "./backend/@model", &["random", "egd", "builtin"]).default_value("random"))
            .property(PropertySpec::text("backend_type", "./backend/@type"))
            .property(PropertySpec::text("device", "./backend").default_with(&["backend_model"], rng_device))
            .capability::<Alias>()
            .capability::<Address>()
            .build()
    }
}

schema! {
    pub fn memballoon() {
        Schema::builder(MEMBALLOON, "memballoon")
            .property(PropertySpec::choice(
                "model",
                "./@model",
                &["virtio", "xen", "none", "virtio-transitional", "virtio-non-transitional"],
            ).default_value("virtio"))
            .property(PropertySpec::on_off("autodeflate", "./@autodeflate"))
            .property(PropertySpec::on_off("free_page_reporting", "./@freePageReporting"))
            .property(PropertySpec::int("stats_period", "./stats/@period"))
            .capability::<Alias>()
            .capability::<Address>()
            .build()
    }
}

schema! {
    pub fn filesystem() {
        Schema::builder(FILESYSTEM, "filesystem")
            .property(PropertySpec::text("type", "./@type").default_value("mount"))
            .property(PropertySpec::choice(
                "accessmode",
                "./@accessmode",
                &["passthrough", "mapped", "squash"],
            ))
            .property(PropertySpec::text("model", "./@model"))
            .property(PropertySpec::text("multidevs", "./@multidevs"))
            .property(PropertySpec::text("driver_type", "./driver/@type"))
            .property(PropertySpec::text("driver_format", "./driver/@format"))
            .property(PropertySpec::text("binary_path", "./binary/@path"))
            .property(PropertySpec::text("source_dir", "./source/@dir"))
            .property(PropertySpec::text("target_dir", "./target/@dir"))
            .property(PropertySpec::flag("readonly", "./readonly"))
            .capability::<BootOrder>()
            .capability::<Alias>()
            .capability::<Address>()
            .build()
    }
}

schema! {
    pub fn tpm() {
        Schema::builder(TPM, "tpm")
            .property(PropertySpec::choice(
                "model",
                "./@model",
                &["tpm-tis", "tpm-crb", "tpm-spapr", "spapr-tpm-proxy"],
            ).default_value("tpm-crb"))
            .property(PropertySpec::choice(
                "backend_type",
                "./backend/@type",
                &["passthrough", "emulator", "external"],
            ).default_value("emulator"))
            .property(PropertySpec::text("backend_version", "./backend/@version"))
            .property(PropertySpec::yes_no("backend_persistent_state", "./backend/@persistent_state"))
            .property(PropertySpec::text("backend_device_path", "./backend/device/@path"))
            .capability::<Alias>()
            .capability::<Address>()
            .build()
    }
}

#[cfg(test)]
mod tests {
    use virt_xmlbuilder::XmlBuilder;

    use super::*;

    #[test]
    fn new_disk_gets_type_and_bus_defaults() {
        let mut disk = XmlBuilder::build(disk());
        disk.set("source_file", Some("/var/lib/libvirt/images/a.qcow2")).unwrap();
        disk.set("driver_type", Some("qcow2")).unwrap();
        disk.set("target", Some("vda")).unwrap();
        assert_eq!(
            disk.get_xml().unwrap(),
            "<disk type=\"file\" device=\"disk\">\n  <driver type=\"qcow2\"/>\n  <source file=\"/var/lib/libvirt/images/a.qcow2\"/>\n  <target dev=\"vda\" bus=\"virtio\"/>\n</disk>\n"
        );
    }

    #[test]
    fn block_source_selects_block_type() {
        let mut disk = XmlBuilder::build(disk());
        disk.set("source_dev", Some("/dev/sdb")).unwrap();
        disk.set("device", Some("lun")).unwrap();
        disk.apply_defaults().unwrap();
        assert_eq!(disk.get("type").unwrap().as_deref(), Some("block"));
        assert_eq!(disk.get("bus").unwrap().as_deref(), Some("scsi"));
    }

    #[test]
    fn disk_path_follows_the_disk_type() {
        let xml = "<disk type=\"block\" device=\"disk\">\n  <source dev=\"/dev/sdb\"/>\n  <target dev=\"sdb\"/>\n</disk>\n";
        let mut block = XmlBuilder::parse(disk(), xml).unwrap();
        assert_eq!(disk_path(block.root()).unwrap().as_deref(), Some("/dev/sdb"));
        set_disk_path(&mut block.root_mut(), Some("/dev/sdc")).unwrap();
        assert_eq!(
            block.get_xml().unwrap(),
            xml.replace("sdb\"/>\n  <target", "sdc\"/>\n  <target")
        );

        let mut network = XmlBuilder::build_without_defaults(disk());
        network.set("source_protocol", Some("rbd")).unwrap();
        network.set("source_name", Some("pool/image")).unwrap();
        network.collection(HOSTS).unwrap().add_new().unwrap();
        set_disk_path(&mut network.root_mut(), Some("/var/lib/a.img")).unwrap();
        assert_eq!(network.get_xml().unwrap(), "<disk>\n  <source file=\"/var/lib/a.img\"/>\n</disk>\n");
        assert!(network.children(HOSTS).unwrap().is_empty());
    }

    #[test]
    fn unset_disk_path_drops_the_whole_source() {
        let xml = "<disk type=\"file\" device=\"cdrom\">\n  <source file=\"/iso/x.iso\" startupPolicy=\"optional\">\n    <seclabel model=\"dac\"/>\n  </source>\n  <target dev=\"sda\"/>\n</disk>\n";
        let mut disk = XmlBuilder::parse(disk(), xml).unwrap();
        set_disk_path(&mut disk.root_mut(), None).unwrap();
        assert_eq!(
            disk.get_xml().unwrap(),
            "<disk type=\"file\" device=\"cdrom\">\n  <target dev=\"sda\"/>\n</disk>\n"
        );
        assert!(disk.children(SECLABELS).unwrap().is_empty());
        assert_eq!(disk_path(disk.root()).unwrap(), None);
    }

    #[test]
    fn disk_elements_follow_libvirt_order() {
        let mut disk = XmlBuilder::build_without_defaults(disk());
        disk.set("read_only", Some("yes")).unwrap();
        disk.set("address_type", Some("drive")).unwrap();
        disk.set("boot_order", Some("1")).unwrap();
        disk.set("target", Some("hdc")).unwrap();
        disk.set("source_file", Some("/iso/x.iso")).unwrap();
        assert_eq!(
            disk.get_xml().unwrap(),
            "<disk>\n  <source file=\"/iso/x.iso\"/>\n  <target dev=\"hdc\"/>\n  <boot order=\"1\"/>\n  <address type=\"drive\"/>\n  <readonly/>\n</disk>\n"
        );
    }

    #[test]
    fn network_interface_defaults_to_default_network() {
        let iface = XmlBuilder::build(interface());
        assert_eq!(
            iface.get_xml().unwrap(),
            "<interface type=\"network\">\n  <source network=\"default\"/>\n  <model type=\"virtio\"/>\n</interface>\n"
        );
        let mut bridged = XmlBuilder::build(interface());
        bridged.set("type", Some("bridge")).unwrap();
        bridged.set("source_bridge", Some("br0")).unwrap();
        assert!(!bridged.get_xml().unwrap().contains("network="));
    }

    #[test]
    fn rng_backend_device_defaults_for_random() {
        let rng = XmlBuilder::build(rng());
        assert_eq!(
            rng.get_xml().unwrap(),
            "<rng model=\"virtio\">\n  <backend model=\"random\">/dev/urandom</backend>\n</rng>\n"
        );
    }

    #[test]
    fn char_devices_share_properties() {
        for schema in [serial(), console(), channel()] {
            assert!(schema.property("source_path").is_some(), "{}", schema.kind());
            assert!(schema.property("target_port").is_some(), "{}", schema.kind());
        }
    }
}
