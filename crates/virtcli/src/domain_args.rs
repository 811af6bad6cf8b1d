//! Suboption tables for options that edit `<domain>` documents.

use virtinst::guest::{self, BOOT_DEV};
use virtinst::names::{
    CHANNELS, CODECS, CONSOLES, CONTROLLERS, CPU_FEATURES, DISKS, FILESYSTEMS, GRAPHICS_DEVICES,
    HOSTDEVS, HOSTS, INPUTS, INTERFACES, LISTENS, MEMBALLOONS, RNGS, SECLABELS, SERIALS, SOUNDS,
    TIMERS, TPMS, VIDEOS, WATCHDOGS,
};
use virtinst::{devices, xmlbuilder::BootOrder};

use crate::parser::{ArgSpec, ClearScope, ParserSpec, ParserTarget};

const ADDRESS: &[ArgSpec] = &[
    ArgSpec::prop("address.type", "address_type").shared(),
    ArgSpec::prop("address.domain", "address_domain").shared(),
    ArgSpec::prop("address.bus", "address_bus").shared(),
    ArgSpec::prop("address.slot", "address_slot").shared(),
    ArgSpec::prop("address.function", "address_function").shared(),
    ArgSpec::prop("address.multifunction", "address_multifunction").shared(),
    ArgSpec::prop("address.controller", "address_controller").shared(),
    ArgSpec::prop("address.target", "address_target").shared(),
    ArgSpec::prop("address.unit", "address_unit").shared(),
    ArgSpec::prop("address.port", "address_port").shared(),
];

const ALIAS: &[ArgSpec] = &[ArgSpec::prop("alias.name", "alias_name").shared()];

const DEVICE_BOOT: &[ArgSpec] = &[
    ArgSpec::boot_order("boot.order")
        .aliases(&["boot_order"])
        .shared(),
    ArgSpec::prop("boot.loadparm", BootOrder::LOADPARM).shared(),
];

const CHAR: &[ArgSpec] = &[
    ArgSpec::prop("type", "type").shared(),
    ArgSpec::prop("source.path", "source_path")
        .aliases(&["path"])
        .shared(),
    ArgSpec::prop("source.mode", "source_mode")
        .aliases(&["mode"])
        .shared(),
    ArgSpec::prop("source.host", "source_host")
        .aliases(&["host"])
        .shared(),
    ArgSpec::prop("source.service", "source_service").shared(),
    ArgSpec::prop("protocol.type", "protocol")
        .aliases(&["protocol"])
        .shared(),
    ArgSpec::prop("log.file", "log_file").shared(),
    ArgSpec::prop("log.append", "log_append").shared(),
    ArgSpec::prop("target.type", "target_type").shared(),
    ArgSpec::prop("target.port", "target_port").shared(),
    ArgSpec::prop("target.name", "target_name")
        .aliases(&["name"])
        .shared(),
    ArgSpec::prop("target.address", "target_address").shared(),
    ArgSpec::prop("target.model.name", "target_model").shared(),
];

const fn device(
    option: &'static str,
    collection: &'static str,
    object: fn() -> &'static virtinst::Schema,
    remove_first: &'static [&'static str],
    args: &'static [&'static [ArgSpec]],
) -> ParserSpec {
    ParserSpec {
        option,
        document: guest::guest,
        object,
        target: ParserTarget::Collection(collection),
        remove_first,
        clear: ClearScope::Object,
        stub_none: false,
        args,
    }
}

const fn guest_block(
    option: &'static str,
    clear: ClearScope,
    remove_first: &'static [&'static str],
    args: &'static [&'static [ArgSpec]],
) -> ParserSpec {
    ParserSpec {
        option,
        document: guest::guest,
        object: guest::guest,
        target: ParserTarget::Root,
        remove_first,
        clear,
        stub_none: false,
        args,
    }
}

const DISK_ARGS: &[ArgSpec] = &[
    ArgSpec::prop("device", "device"),
    ArgSpec::prop("type", "type"),
    ArgSpec::disk_path("path"),
    ArgSpec::prop("target.dev", "target").aliases(&["target"]),
    ArgSpec::prop("target.bus", "bus").aliases(&["bus"]),
    ArgSpec::prop("target.removable", "removable").aliases(&["removable"]),
    ArgSpec::prop("driver.name", "driver_name").aliases(&["driver_name"]),
    ArgSpec::prop("driver.type", "driver_type").aliases(&["driver_type", "format"]),
    ArgSpec::prop("driver.cache", "driver_cache").aliases(&["cache"]),
    ArgSpec::prop("driver.io", "driver_io").aliases(&["io"]),
    ArgSpec::prop("driver.discard", "driver_discard").aliases(&["discard"]),
    ArgSpec::prop("driver.error_policy", "error_policy").aliases(&["error_policy"]),
    ArgSpec::prop("source.file", "source_file"),
    ArgSpec::prop("source.dev", "source_dev"),
    ArgSpec::prop("source.dir", "source_dir"),
    ArgSpec::prop("source.pool", "source_pool").aliases(&["pool"]),
    ArgSpec::prop("source.volume", "source_volume").aliases(&["vol"]),
    ArgSpec::prop("source.protocol", "source_protocol"),
    ArgSpec::prop("source.name", "source_name"),
    ArgSpec::prop("source.startupPolicy", "startup_policy").aliases(&["startup_policy"]),
    ArgSpec::child("source.host[0-9]*.name", &[HOSTS], "name"),
    ArgSpec::child("source.host[0-9]*.port", &[HOSTS], "port"),
    ArgSpec::child("source.host[0-9]*.transport", &[HOSTS], "transport"),
    ArgSpec::child("source.host[0-9]*.socket", &[HOSTS], "socket"),
    ArgSpec::child("seclabel[0-9]*.model", &[SECLABELS], "model")
        .aliases(&["source.seclabel[0-9]*.model"]),
    ArgSpec::child("seclabel[0-9]*.relabel", &[SECLABELS], "relabel")
        .aliases(&["source.seclabel[0-9]*.relabel"]),
    ArgSpec::child("seclabel[0-9]*.label", &[SECLABELS], "label")
        .aliases(&["source.seclabel[0-9]*.label"])
        .can_comma(),
    ArgSpec::prop("iotune.total_bytes_sec", "iotune_total_bytes_sec").aliases(&["total_bytes_sec"]),
    ArgSpec::prop("iotune.total_iops_sec", "iotune_total_iops_sec").aliases(&["total_iops_sec"]),
    ArgSpec::prop("readonly", "read_only").flag(),
    ArgSpec::prop("shareable", "shareable").flag(),
    ArgSpec::prop("transient", "transient").flag(),
    ArgSpec::prop("serial", "serial"),
    ArgSpec::prop("wwn", "wwn"),
];

/// `--disk`
pub const DISK: ParserSpec = device(
    "disk",
    DISKS,
    devices::disk,
    &["path"],
    &[DISK_ARGS, DEVICE_BOOT, ALIAS, ADDRESS],
);

const NETWORK_ARGS: &[ArgSpec] = &[
    ArgSpec::prop("type", "type"),
    ArgSpec::prop("trustGuestRxFilters", "trust_guest_rx_filters"),
    ArgSpec::prop("mac.address", "mac").aliases(&["mac"]),
    ArgSpec::prop("source.network", "source_network").aliases(&["network"]),
    ArgSpec::prop("source.bridge", "source_bridge").aliases(&["bridge"]),
    ArgSpec::prop("source.file", "source_file"),
    ArgSpec::prop("source.dev", "source_dev"),
    ArgSpec::prop("source.mode", "source_mode"),
    ArgSpec::prop("source.portgroup", "portgroup").aliases(&["portgroup"]),
    ArgSpec::prop("virtualport.type", "virtualport_type"),
    ArgSpec::prop("target.dev", "target_dev"),
    ArgSpec::prop("model.type", "model").aliases(&["model"]),
    ArgSpec::prop("driver.name", "driver_name"),
    ArgSpec::prop("driver.queues", "driver_queues"),
    ArgSpec::prop("filterref.filter", "filterref").aliases(&["filterref"]),
    ArgSpec::prop("link.state", "link_state").aliases(&["link_state"]),
    ArgSpec::prop("mtu.size", "mtu"),
];

/// `--network`: guest interfaces.
pub const NETWORK: ParserSpec = device(
    "network",
    INTERFACES,
    devices::interface,
    &["type"],
    &[NETWORK_ARGS, DEVICE_BOOT, ALIAS, ADDRESS],
);

const CONTROLLER_ARGS: &[ArgSpec] = &[
    ArgSpec::prop("type", "type"),
    ArgSpec::prop("index", "index"),
    ArgSpec::prop("model", "model"),
    ArgSpec::prop("ports", "ports"),
    ArgSpec::prop("vectors", "vectors"),
    ArgSpec::prop("master.startport", "master_startport"),
    ArgSpec::prop("driver.queues", "driver_queues"),
];

pub const CONTROLLER: ParserSpec = device(
    "controller",
    CONTROLLERS,
    devices::controller,
    &["type"],
    &[CONTROLLER_ARGS, ALIAS, ADDRESS],
);

const GRAPHICS_ARGS: &[ArgSpec] = &[
    ArgSpec::prop("type", "type"),
    ArgSpec::prop("port", "port"),
    ArgSpec::prop("tlsPort", "tls_port").aliases(&["tlsport"]),
    ArgSpec::prop("autoport", "autoport"),
    ArgSpec::prop("listen", "listen"),
    ArgSpec::prop("passwd", "passwd").aliases(&["password"]),
    ArgSpec::prop("keymap", "keymap"),
    ArgSpec::child("listens[0-9]*.type", &[LISTENS], "type"),
    ArgSpec::child("listens[0-9]*.address", &[LISTENS], "address"),
    ArgSpec::child("listens[0-9]*.network", &[LISTENS], "network"),
    ArgSpec::child("listens[0-9]*.socket", &[LISTENS], "socket"),
    ArgSpec::prop("image.compression", "image_compression").aliases(&["image_compression"]),
    ArgSpec::prop("mouse.mode", "mouse_mode"),
    ArgSpec::prop("clipboard.copypaste", "clipboard_copypaste"),
    ArgSpec::prop("filetransfer.enable", "filetransfer_enable"),
    ArgSpec::prop("gl.enable", "gl_enable"),
    ArgSpec::prop("gl.rendernode", "gl_rendernode").aliases(&["rendernode"]),
];

pub const GRAPHICS: ParserSpec = device(
    "graphics",
    GRAPHICS_DEVICES,
    devices::graphics,
    &["type"],
    &[GRAPHICS_ARGS],
);

const VIDEO_ARGS: &[ArgSpec] = &[
    ArgSpec::prop("model.type", "model").aliases(&["model"]),
    ArgSpec::prop("model.vram", "vram").aliases(&["vram"]),
    ArgSpec::prop("model.ram", "ram").aliases(&["ram"]),
    ArgSpec::prop("model.vgamem", "vgamem").aliases(&["vgamem"]),
    ArgSpec::prop("model.heads", "heads").aliases(&["heads"]),
    ArgSpec::prop("model.acceleration.accel3d", "accel3d").aliases(&["accel3d"]),
];

pub const VIDEO: ParserSpec = device(
    "video",
    VIDEOS,
    devices::video,
    &["model"],
    &[VIDEO_ARGS, ALIAS, ADDRESS],
);

const INPUT_ARGS: &[ArgSpec] = &[
    ArgSpec::prop("type", "type"),
    ArgSpec::prop("bus", "bus"),
    ArgSpec::prop("source.evdev", "source_evdev"),
];

pub const INPUT: ParserSpec = device(
    "input",
    INPUTS,
    devices::input,
    &["type"],
    &[INPUT_ARGS, ALIAS, ADDRESS],
);

pub const SERIAL: ParserSpec = device(
    "serial",
    SERIALS,
    devices::serial,
    &["type"],
    &[CHAR, ALIAS, ADDRESS],
);

pub const CONSOLE: ParserSpec = device(
    "console",
    CONSOLES,
    devices::console,
    &["type"],
    &[CHAR, ALIAS, ADDRESS],
);

pub const CHANNEL: ParserSpec = device(
    "channel",
    CHANNELS,
    devices::channel,
    &["type"],
    &[CHAR, ALIAS, ADDRESS],
);

const SOUND_ARGS: &[ArgSpec] = &[
    ArgSpec::prop("model", "model"),
    ArgSpec::child("codec[0-9]*.type", &[CODECS], "type"),
    ArgSpec::prop("audio.id", "audio_id"),
];

pub const SOUND: ParserSpec = device(
    "sound",
    SOUNDS,
    devices::sound,
    &["model"],
    &[SOUND_ARGS, ALIAS, ADDRESS],
);

const WATCHDOG_ARGS: &[ArgSpec] = &[
    ArgSpec::prop("model", "model"),
    ArgSpec::prop("action", "action"),
];

pub const WATCHDOG: ParserSpec = device(
    "watchdog",
    WATCHDOGS,
    devices::watchdog,
    &["model", "action"],
    &[WATCHDOG_ARGS, ALIAS, ADDRESS],
);

const HOSTDEV_ARGS: &[ArgSpec] = &[
    ArgSpec::prop("mode", "mode"),
    ArgSpec::prop("type", "type"),
    ArgSpec::prop("managed", "managed"),
    ArgSpec::prop("source.vendor.id", "vendor").aliases(&["vendor"]),
    ArgSpec::prop("source.product.id", "product").aliases(&["product"]),
    ArgSpec::prop("source.address.domain", "source_address_domain"),
    ArgSpec::prop("source.address.bus", "source_address_bus"),
    ArgSpec::prop("source.address.slot", "source_address_slot"),
    ArgSpec::prop("source.address.function", "source_address_function"),
    ArgSpec::prop("source.address.device", "source_address_device"),
    ArgSpec::prop("driver.name", "driver_name"),
    ArgSpec::prop("rom.bar", "rom_bar"),
    ArgSpec::prop("rom.file", "rom_file"),
];

/// `--hostdev`: host devices passed through to the guest.
pub const HOSTDEV: ParserSpec = device(
    "hostdev",
    HOSTDEVS,
    devices::hostdev,
    &["type"],
    &[HOSTDEV_ARGS, DEVICE_BOOT, ALIAS, ADDRESS],
);

const RNG_ARGS: &[ArgSpec] = &[
    ArgSpec::prop("model", "model"),
    ArgSpec::prop("rate.bytes", "rate_bytes"),
    ArgSpec::prop("rate.period", "rate_period"),
    ArgSpec::prop("backend.model", "backend_model").aliases(&["backend_model"]),
    ArgSpec::prop("backend.type", "backend_type").aliases(&["backend_type"]),
    ArgSpec::prop("backend", "device").aliases(&["device"]),
];

/// `--rng`; `--rng none` is accepted and does nothing.
pub const RNG: ParserSpec = ParserSpec {
    stub_none: true,
    ..device(
        "rng",
        RNGS,
        devices::rng,
        &["backend_model"],
        &[RNG_ARGS, ALIAS, ADDRESS],
    )
};

const MEMBALLOON_ARGS: &[ArgSpec] = &[
    ArgSpec::prop("model", "model"),
    ArgSpec::prop("autodeflate", "autodeflate"),
    ArgSpec::prop("freePageReporting", "free_page_reporting"),
    ArgSpec::prop("stats.period", "stats_period"),
];

pub const MEMBALLOON: ParserSpec = device(
    "memballoon",
    MEMBALLOONS,
    devices::memballoon,
    &["model"],
    &[MEMBALLOON_ARGS, ALIAS, ADDRESS],
);

const FILESYSTEM_ARGS: &[ArgSpec] = &[
    ArgSpec::prop("type", "type"),
    ArgSpec::prop("accessmode", "accessmode").aliases(&["mode"]),
    ArgSpec::prop("model", "model"),
    ArgSpec::prop("multidevs", "multidevs"),
    ArgSpec::prop("driver.type", "driver_type"),
    ArgSpec::prop("driver.format", "driver_format"),
    ArgSpec::prop("binary.path", "binary_path"),
    ArgSpec::prop("source.dir", "source_dir").aliases(&["source"]),
    ArgSpec::prop("target.dir", "target_dir").aliases(&["target"]),
    ArgSpec::prop("readonly", "readonly").flag(),
];

pub const FILESYSTEM: ParserSpec = device(
    "filesystem",
    FILESYSTEMS,
    devices::filesystem,
    &["source", "target"],
    &[FILESYSTEM_ARGS, DEVICE_BOOT, ALIAS, ADDRESS],
);

const TPM_ARGS: &[ArgSpec] = &[
    ArgSpec::prop("model", "model"),
    ArgSpec::prop("backend.type", "backend_type").aliases(&["type"]),
    ArgSpec::prop("backend.version", "backend_version"),
    ArgSpec::prop("backend.persistent_state", "backend_persistent_state"),
    ArgSpec::prop("backend.device.path", "backend_device_path").aliases(&["path"]),
];

pub const TPM: ParserSpec = device(
    "tpm",
    TPMS,
    devices::tpm,
    &["backend.type"],
    &[TPM_ARGS, ALIAS, ADDRESS],
);

const METADATA_ARGS: &[ArgSpec] = &[
    ArgSpec::prop("name", "name"),
    ArgSpec::prop("title", "title").can_comma(),
    ArgSpec::prop("description", "description").can_comma(),
    ArgSpec::prop("uuid", "uuid"),
    ArgSpec::prop("genid", "genid"),
];

/// `--metadata`: name, title and the other identity fields.
pub const METADATA: ParserSpec = guest_block("metadata", ClearScope::None, &[], &[METADATA_ARGS]);

const MEMORY_ARGS: &[ArgSpec] = &[
    ArgSpec::prop("memory", "memory"),
    ArgSpec::prop("currentMemory", "current_memory").aliases(&["current_memory"]),
    ArgSpec::prop("maxMemory", "max_memory").aliases(&["maxmemory"]),
    ArgSpec::prop("maxMemory.slots", "max_memory_slots"),
    ArgSpec::prop("hugepages", "hugepages").flag(),
    ArgSpec::prop("nosharepages", "nosharepages").flag(),
    ArgSpec::prop("source.type", "memory_source_type"),
    ArgSpec::prop("access.mode", "memory_access_mode"),
];

pub const MEMORY: ParserSpec = guest_block("memory", ClearScope::None, &["memory"], &[MEMORY_ARGS]);

const VCPUS_ARGS: &[ArgSpec] = &[
    ArgSpec::prop("vcpu", "vcpus").aliases(&["vcpus", "maxvcpus"]),
    ArgSpec::prop("vcpu.current", "vcpu_current").aliases(&["current"]),
    ArgSpec::prop("vcpu.placement", "vcpu_placement").aliases(&["placement"]),
    ArgSpec::prop("vcpu.cpuset", "vcpu_cpuset")
        .aliases(&["cpuset"])
        .can_comma(),
    ArgSpec::prop("iothreads", "iothreads"),
    ArgSpec::prop("sockets", "topology_sockets"),
    ArgSpec::prop("cores", "topology_cores"),
    ArgSpec::prop("threads", "topology_threads"),
];

pub const VCPUS: ParserSpec = guest_block("vcpus", ClearScope::None, &["vcpu"], &[VCPUS_ARGS]);

const CPU_ARGS: &[ArgSpec] = &[
    ArgSpec::prop("model", "cpu_model"),
    ArgSpec::prop("model.fallback", "cpu_model_fallback"),
    ArgSpec::prop("mode", "cpu_mode"),
    ArgSpec::prop("match", "cpu_match"),
    ArgSpec::prop("check", "cpu_check"),
    ArgSpec::prop("vendor", "cpu_vendor"),
    ArgSpec::prop("topology.sockets", "topology_sockets"),
    ArgSpec::prop("topology.dies", "topology_dies"),
    ArgSpec::prop("topology.cores", "topology_cores"),
    ArgSpec::prop("topology.threads", "topology_threads"),
    ArgSpec::child("feature[0-9]*.policy", &[CPU_FEATURES], "policy"),
    ArgSpec::child("feature[0-9]*.name", &[CPU_FEATURES], "name"),
];

/// `--cpu`; `clearxml` drops the whole `<cpu>` block.
pub const CPU: ParserSpec = guest_block("cpu", ClearScope::Subtree("./cpu"), &["model"], &[CPU_ARGS]);

const BOOT_ARGS: &[ArgSpec] = &[
    ArgSpec::indexed("boot[0-9]*.dev", BOOT_DEV),
    ArgSpec::prop("firmware", "os_firmware"),
    ArgSpec::prop("os.type", "os_type").aliases(&["os_type"]),
    ArgSpec::prop("os.arch", "os_arch").aliases(&["arch"]),
    ArgSpec::prop("os.machine", "os_machine").aliases(&["machine"]),
    ArgSpec::prop("loader", "loader"),
    ArgSpec::prop("loader.readonly", "loader_readonly").aliases(&["loader_ro"]),
    ArgSpec::prop("loader.type", "loader_type").aliases(&["loader_type"]),
    ArgSpec::prop("loader.secure", "loader_secure").aliases(&["loader_secure"]),
    ArgSpec::prop("nvram", "nvram"),
    ArgSpec::prop("kernel", "kernel").can_comma(),
    ArgSpec::prop("initrd", "initrd").can_comma(),
    ArgSpec::prop("cmdline", "cmdline")
        .aliases(&["kernel_args", "extra_args"])
        .can_comma(),
    ArgSpec::prop("init", "init"),
    ArgSpec::prop("bootmenu.enable", "bootmenu_enable").aliases(&["menu"]),
    ArgSpec::prop("bootmenu.timeout", "bootmenu_timeout"),
    ArgSpec::prop("bios.useserial", "bios_useserial").aliases(&["useserial"]),
    ArgSpec::prop("bios.rebootTimeout", "bios_reboot_timeout").aliases(&["rebootTimeout"]),
    ArgSpec::prop("smbios.mode", "smbios_mode").aliases(&["smbios_mode"]),
    ArgSpec::prop("emulator", "emulator"),
    ArgSpec::prop("domain_type", "type"),
];

/// `--boot`: the `<os>` block plus emulator and hypervisor type.
pub const BOOT: ParserSpec = guest_block("boot", ClearScope::Subtree("./os"), &[], &[BOOT_ARGS]);

const FEATURES_ARGS: &[ArgSpec] = &[
    ArgSpec::prop("acpi", "acpi").flag(),
    ArgSpec::prop("apic", "apic").flag(),
    ArgSpec::prop("pae", "pae").flag(),
    ArgSpec::prop("hyperv.relaxed.state", "hyperv_relaxed").aliases(&["hyperv_relaxed"]),
    ArgSpec::prop("hyperv.vapic.state", "hyperv_vapic").aliases(&["hyperv_vapic"]),
    ArgSpec::prop("hyperv.spinlocks.state", "hyperv_spinlocks").aliases(&["hyperv_spinlocks"]),
    ArgSpec::prop("hyperv.spinlocks.retries", "hyperv_spinlocks_retries")
        .aliases(&["hyperv_spinlocks_retries"]),
    ArgSpec::prop("kvm.hidden.state", "kvm_hidden").aliases(&["kvm_hidden"]),
    ArgSpec::prop("vmport.state", "vmport").aliases(&["vmport"]),
    ArgSpec::prop("smm.state", "smm").aliases(&["smm"]),
    ArgSpec::prop("ioapic.driver", "ioapic_driver").aliases(&["ioapic"]),
];

pub const FEATURES: ParserSpec =
    guest_block("features", ClearScope::Subtree("./features"), &[], &[FEATURES_ARGS]);

const CLOCK_ARGS: &[ArgSpec] = &[
    ArgSpec::prop("offset", "clock_offset"),
    ArgSpec::prop("timezone", "clock_timezone"),
    ArgSpec::child("timer[0-9]*.name", &[TIMERS], "name"),
    ArgSpec::child("timer[0-9]*.present", &[TIMERS], "present"),
    ArgSpec::child("timer[0-9]*.tickpolicy", &[TIMERS], "tickpolicy"),
];

pub const CLOCK: ParserSpec = guest_block("clock", ClearScope::Subtree("./clock"), &[], &[CLOCK_ARGS]);

const EVENTS_ARGS: &[ArgSpec] = &[
    ArgSpec::prop("on_poweroff", "on_poweroff"),
    ArgSpec::prop("on_reboot", "on_reboot"),
    ArgSpec::prop("on_crash", "on_crash"),
    ArgSpec::prop("on_lockfailure", "on_lockfailure"),
];

/// `--events`: lifecycle actions.
pub const EVENTS: ParserSpec = guest_block("events", ClearScope::None, &[], &[EVENTS_ARGS]);

const PM_ARGS: &[ArgSpec] = &[
    ArgSpec::prop("suspend_to_mem.enabled", "suspend_to_mem").aliases(&["suspend_to_mem"]),
    ArgSpec::prop("suspend_to_disk.enabled", "suspend_to_disk").aliases(&["suspend_to_disk"]),
];

pub const PM: ParserSpec = guest_block("pm", ClearScope::Subtree("./pm"), &[], &[PM_ARGS]);

const SECLABEL_ARGS: &[ArgSpec] = &[
    ArgSpec::prop("type", "seclabel_type"),
    ArgSpec::prop("model", "seclabel_model"),
    ArgSpec::prop("relabel", "seclabel_relabel"),
    ArgSpec::prop("label", "seclabel_label").can_comma(),
    ArgSpec::prop("baselabel", "seclabel_baselabel").can_comma(),
    ArgSpec::prop("imagelabel", "seclabel_imagelabel"),
];

pub const SECLABEL: ParserSpec =
    guest_block("seclabel", ClearScope::Subtree("./seclabel"), &[], &[SECLABEL_ARGS]);
