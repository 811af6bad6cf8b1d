//! Object kinds and collection names shared by the schemas and the CLI.

/// Guest definition kind (`<domain>`).
pub const GUEST: &str = "guest";
/// Storage pool kind (`<pool>`).
pub const POOL: &str = "pool";
/// Virtual network kind (`<network>`).
pub const NETWORK: &str = "network";
/// Domain snapshot kind (`<domainsnapshot>`).
pub const SNAPSHOT: &str = "snapshot";

pub const DISK: &str = "disk";
pub const INTERFACE: &str = "interface";
pub const CONTROLLER: &str = "controller";
pub const GRAPHICS: &str = "graphics";
pub const VIDEO: &str = "video";
pub const INPUT: &str = "input";
pub const SERIAL: &str = "serial";
pub const CONSOLE: &str = "console";
pub const CHANNEL: &str = "channel";
pub const SOUND: &str = "sound";
pub const WATCHDOG: &str = "watchdog";
pub const HOSTDEV: &str = "hostdev";
pub const RNG: &str = "rng";
pub const MEMBALLOON: &str = "memballoon";
pub const FILESYSTEM: &str = "filesystem";
pub const TPM: &str = "tpm";

/// Guest collection holding `<disk>` devices.
pub const DISKS: &str = "disks";
/// Guest collection holding `<interface>` devices.
pub const INTERFACES: &str = "interfaces";
pub const CONTROLLERS: &str = "controllers";
pub const GRAPHICS_DEVICES: &str = "graphics";
pub const VIDEOS: &str = "videos";
pub const INPUTS: &str = "inputs";
pub const SERIALS: &str = "serials";
pub const CONSOLES: &str = "consoles";
pub const CHANNELS: &str = "channels";
pub const SOUNDS: &str = "sounds";
pub const WATCHDOGS: &str = "watchdogs";
pub const HOSTDEVS: &str = "hostdevs";
pub const RNGS: &str = "rngs";
pub const MEMBALLOONS: &str = "memballoons";
pub const FILESYSTEMS: &str = "filesystems";
pub const TPMS: &str = "tpms";

/// Nested collections below devices and definitions.
pub const SECLABELS: &str = "seclabels";
pub const HOSTS: &str = "hosts";
pub const LISTENS: &str = "listens";
pub const CODECS: &str = "codecs";
pub const CPU_FEATURES: &str = "features";
pub const TIMERS: &str = "timers";
pub const IPS: &str = "ips";
pub const RANGES: &str = "ranges";
pub const ROUTES: &str = "routes";
pub const PORTGROUPS: &str = "portgroups";
pub const SNAPSHOT_DISKS: &str = "disks";
