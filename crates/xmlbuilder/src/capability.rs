//! Property groups shared by several device kinds.

use bitflags::bitflags;

use crate::property::PropertySpec;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Capabilities: u8 {
        const BOOT_ORDER = 1 << 0;
        const ADDRESS = 1 << 1;
        const ALIAS = 1 << 2;
    }
}

/// A reusable block of properties attached to a schema.
pub trait Capability {
    const FLAG: Capabilities;

    fn properties() -> &'static [PropertySpec];
}

/// `<boot order=.. loadparm=..>`.
pub struct BootOrder;

impl BootOrder {
    pub const ORDER: &'static str = "boot_order";
    pub const LOADPARM: &'static str = "boot_loadparm";
}

impl Capability for BootOrder {
    const FLAG: Capabilities = Capabilities::BOOT_ORDER;

    fn properties() -> &'static [PropertySpec] {
        const PROPS: &[PropertySpec] = &[
            PropertySpec::int(BootOrder::ORDER, "./boot/@order"),
            PropertySpec::text(BootOrder::LOADPARM, "./boot/@loadparm"),
        ];
        PROPS
    }
}

/// Guest-visible bus address (`<address type=.. bus=.. slot=..>`).
pub struct Address;

impl Capability for Address {
    const FLAG: Capabilities = Capabilities::ADDRESS;

    fn properties() -> &'static [PropertySpec] {
        const PROPS: &[PropertySpec] = &[
            PropertySpec::choice(
                "address_type",
                "./address/@type",
                &[
                    "pci", "drive", "virtio-serial", "ccid", "usb", "spapr-vio", "ccw",
                    "isa", "virtio-mmio", "unassigned",
                ],
            ),
            PropertySpec::int("address_domain", "./address/@domain"),
            PropertySpec::int("address_bus", "./address/@bus"),
            PropertySpec::int("address_slot", "./address/@slot"),
            PropertySpec::int("address_function", "./address/@function"),
            PropertySpec::on_off("address_multifunction", "./address/@multifunction"),
            PropertySpec::int("address_controller", "./address/@controller"),
            PropertySpec::int("address_target", "./address/@target"),
            PropertySpec::int("address_unit", "./address/@unit"),
            PropertySpec::text("address_port", "./address/@port"),
        ];
        PROPS
    }
}

/// User alias (`<alias name=..>`).
pub struct Alias;

impl Capability for Alias {
    const FLAG: Capabilities = Capabilities::ALIAS;

    fn properties() -> &'static [PropertySpec] {
        const PROPS: &[PropertySpec] = &[PropertySpec::text("alias_name", "./alias/@name")];
        PROPS
    }
}
