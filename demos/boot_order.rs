use virtinst::xmlbuilder::BootOrder;
use virtinst::{guest, names, reorder_boot_order, XmlBuilder};

const GUEST: &str = r#"<domain type="kvm">
  <name>boot</name>
  <devices>
    <disk type="file" device="disk">
      <source file="/a.img"/>
      <target dev="vda" bus="virtio"/>
      <boot order="1"/>
    </disk>
    <disk type="file" device="cdrom">
      <target dev="sda" bus="sata"/>
      <boot order="2"/>
    </disk>
    <interface type="network">
      <source network="default"/>
      <boot order="3"/>
    </interface>
  </devices>
</domain>
"#;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();
    let mut vm = XmlBuilder::parse(guest::guest(), GUEST)?;

    // Network boot first; every device behind it moves down one slot.
    reorder_boot_order(&mut vm, names::INTERFACES, 0, 1)?;

    for collection in guest::bootable_collections() {
        for (index, device) in vm.children(collection)?.iter().enumerate() {
            if let Some(order) = device.get_int(BootOrder::ORDER)? {
                println!("{collection}[{index}] boot order {order}");
            }
        }
    }
    Ok(())
}
