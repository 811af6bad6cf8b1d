use virtcli::{perform, Action, Outcome, Selector};
use virtinst::devices::disk_path;
use virtinst::{guest, names, XmlBuilder};

const GUEST: &str = r#"<domain type="kvm">
  <name>demo</name>
  <memory>1048576</memory>
  <devices>
    <disk type="file" device="disk">
      <source file="/var/lib/libvirt/images/demo.qcow2"/>
      <target dev="vda" bus="virtio"/>
    </disk>
    <disk type="file" device="cdrom">
      <source file="/srv/iso/install.iso"/>
      <target dev="sda" bus="sata"/>
    </disk>
  </devices>
</domain>
"#;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();
    let mut vm = XmlBuilder::parse(guest::guest(), GUEST)?;
    let parser = virtcli::parser_for("disk").ok_or("no --disk parser")?;

    // Eject the install media and switch the system disk to writeback.
    let edits = [
        (Selector::parse(Some("device=cdrom"))?, "path="),
        (Selector::parse(Some("target=vda"))?, "cache=writeback,discard=unmap"),
    ];
    for (selector, optstr) in edits {
        match perform(&Action::Edit(selector), parser, &mut vm, &[optstr.to_string()])? {
            Outcome::Applied(objects) => {
                for object in objects {
                    print!("{object}");
                }
            }
            Outcome::Introspection(listing) => print!("{listing}"),
        }
    }

    println!("{} disks:", vm.children(names::DISKS)?.len());
    for disk in vm.children(names::DISKS)? {
        println!(
            "  {} -> {}",
            disk.get("target")?.unwrap_or_default(),
            disk_path(disk)?.unwrap_or_else(|| "(empty)".into())
        );
    }
    Ok(())
}
