use virtinst::{pool, XmlBuilder};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();
    let name = std::env::args().nth(1).unwrap_or_else(|| "images2".to_string());

    let mut storage = XmlBuilder::build(pool::pool());
    storage.set("name", Some(name.as_str()))?;
    print!("{}", storage.get_xml()?);

    // A logical pool derives its target from the volume group name.
    storage.set("type", Some("logical"))?;
    storage.set("source_name", Some(name.as_str()))?;
    print!("{}", storage.get_xml()?);
    Ok(())
}
