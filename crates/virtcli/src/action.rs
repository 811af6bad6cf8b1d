//! Edit, add, remove and build actions driven by parsed option strings.

use std::sync::Arc;

use tracing::{debug, info};
use virt_xmlbuilder::{Coverage, XmlBuilder};

use crate::error::CliError;
use crate::parser::{ClearScope, ParserSpec, ParserTarget};
use crate::selector::Selector;
use crate::suboption::{wants_help, Slot, Suboptions};

/// What to do with the objects an option describes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Change the selected existing objects.
    Edit(Selector),
    AddDevice,
    /// Remove the devices selected by the last option string.
    RemoveDevice,
    /// Build standalone XML for the option, ignoring the input document.
    BuildXml,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// A `?`/`help` request: the sorted suboption listing.
    Introspection(String),
    /// XML of every object edited, added, removed or built.
    Applied(Vec<String>),
}

/// Run `action` for `parser` against `doc`.
///
/// `options` holds one option string per occurrence of the option. For
/// [`Action::BuildXml`] the caller passes a freshly built document.
pub fn perform(
    action: &Action,
    parser: &'static ParserSpec,
    doc: &mut XmlBuilder,
    options: &[String],
) -> Result<Outcome, CliError> {
    if options.is_empty() {
        return Err(CliError::MissingOptions(parser.option.to_string()));
    }
    let expected = (parser.document)();
    if doc.kind() != expected.kind() {
        return Err(CliError::WrongDocument {
            option: parser.option.to_string(),
            expected: expected.kind().to_string(),
            found: doc.kind().to_string(),
        });
    }
    if options.iter().any(|optstr| wants_help(optstr)) {
        return Ok(Outcome::Introspection(parser.introspect()));
    }

    let coverage = doc.coverage().cloned();
    let xml = match action {
        Action::Edit(selector) => edit(selector, parser, doc, options, coverage)?,
        Action::AddDevice => add(parser, doc, options, coverage)?,
        Action::RemoveDevice => remove(parser, doc, options)?,
        Action::BuildXml => build(parser, doc, options, coverage)?,
    };
    info!(option = parser.option, objects = xml.len(), "action complete");
    Ok(Outcome::Applied(xml))
}

fn parse_all(
    parser: &'static ParserSpec,
    options: &[String],
    coverage: Option<Arc<Coverage>>,
) -> Result<Vec<Suboptions>, CliError> {
    let mut parsed = Vec::with_capacity(options.len());
    for optstr in options {
        let suboptions = Suboptions::parse(parser, optstr, coverage.as_deref())?;
        if suboptions.is_noop() {
            debug!(option = parser.option, optstr = %optstr, "skipping no-op option string");
            continue;
        }
        parsed.push(suboptions);
    }
    Ok(parsed)
}

fn collection_of(parser: &ParserSpec) -> Result<&'static str, CliError> {
    match parser.target {
        ParserTarget::Collection(name) => Ok(name),
        ParserTarget::Root => Err(CliError::NotADevice(parser.option.to_string())),
    }
}

fn slot_for(parser: &ParserSpec, index: usize) -> Slot {
    match parser.target {
        ParserTarget::Collection(collection) => Slot::Item { collection, index },
        ParserTarget::Root => Slot::Root,
    }
}

fn object_xml(doc: &XmlBuilder, slot: Slot) -> Result<String, CliError> {
    match slot {
        Slot::Root => Ok(doc.get_xml()?),
        Slot::Item { collection, index } => {
            let items = doc.children(collection)?;
            Ok(items
                .get(index)
                .map(|item| item.to_xml())
                .unwrap_or_default())
        }
    }
}

fn edit(
    selector: &Selector,
    parser: &'static ParserSpec,
    doc: &mut XmlBuilder,
    options: &[String],
    coverage: Option<Arc<Coverage>>,
) -> Result<Vec<String>, CliError> {
    if parser.target == ParserTarget::Root
        && !matches!(
            selector,
            Selector::Implicit | Selector::All | Selector::Position(1)
        )
    {
        return Err(CliError::SelectorNotApplicable {
            option: parser.option.to_string(),
            selector: selector.to_string(),
        });
    }
    let targets = selector.resolve(parser, doc)?;
    let parsed = parse_all(parser, options, coverage)?;
    let mut out = Vec::with_capacity(targets.len());
    for index in targets {
        let slot = slot_for(parser, index);
        for suboptions in &parsed {
            suboptions.apply(doc, slot)?;
        }
        debug!(option = parser.option, index, "edited object");
        out.push(object_xml(doc, slot)?);
    }
    Ok(out)
}

fn add(
    parser: &'static ParserSpec,
    doc: &mut XmlBuilder,
    options: &[String],
    coverage: Option<Arc<Coverage>>,
) -> Result<Vec<String>, CliError> {
    let collection = collection_of(parser)?;
    let mut added = Vec::new();
    for suboptions in parse_all(parser, options, coverage)? {
        let index = doc.collection(collection)?.add_new()?;
        suboptions.apply(doc, Slot::Item { collection, index })?;
        doc.apply_defaults()?;
        debug!(option = parser.option, index, "added device");
        added.push(index);
    }
    added
        .into_iter()
        .map(|index| object_xml(doc, Slot::Item { collection, index }))
        .collect()
}

fn remove(
    parser: &'static ParserSpec,
    doc: &mut XmlBuilder,
    options: &[String],
) -> Result<Vec<String>, CliError> {
    let collection = collection_of(parser)?;
    let selector = Selector::parse(options.last().map(String::as_str))?;
    let mut targets = selector.resolve(parser, doc)?;
    targets.sort_unstable_by(|a, b| b.cmp(a));
    let mut removed = Vec::with_capacity(targets.len());
    for index in targets {
        let device = doc.collection(collection)?.remove(index)?;
        debug!(option = parser.option, index, "removed device");
        removed.push(device.get_xml()?);
    }
    removed.reverse();
    Ok(removed)
}

fn build(
    parser: &'static ParserSpec,
    doc: &mut XmlBuilder,
    options: &[String],
    coverage: Option<Arc<Coverage>>,
) -> Result<Vec<String>, CliError> {
    if let ParserTarget::Collection(_) = parser.target {
        return add(parser, doc, options, coverage);
    }
    for suboptions in parse_all(parser, options, coverage)? {
        suboptions.apply(doc, Slot::Root)?;
    }
    doc.apply_defaults()?;
    let xml = match parser.clear {
        ClearScope::Subtree(xpath) => {
            let document = doc.document();
            document
                .find(document.root(), xpath)?
                .map(|node| document.serialize_node(node))
                .unwrap_or_default()
        }
        ClearScope::None | ClearScope::Object => doc.get_xml()?,
    };
    Ok(vec![xml])
}

#[cfg(test)]
mod tests {
    use virtinst::{guest, pool};

    use super::*;
    use crate::parser::parser_for;

    fn opts(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn help_lists_suboptions() {
        let mut vm = XmlBuilder::build(guest::guest());
        let outcome = perform(
            &Action::AddDevice,
            parser_for("disk").unwrap(),
            &mut vm,
            &opts(&["path=/a,bus=?"]),
        )
        .unwrap();
        match outcome {
            Outcome::Introspection(listing) => assert!(listing.starts_with("clearxml\n")),
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert!(vm.children("disks").unwrap().is_empty());
    }

    #[test]
    fn wrong_document_kind_is_rejected() {
        let mut storage = XmlBuilder::build(pool::pool());
        let err = perform(
            &Action::AddDevice,
            parser_for("disk").unwrap(),
            &mut storage,
            &opts(&["/a.img"]),
        )
        .unwrap_err();
        assert!(matches!(err, CliError::WrongDocument { .. }));
    }

    #[test]
    fn root_options_are_not_devices() {
        let mut vm = XmlBuilder::build(guest::guest());
        let err = perform(
            &Action::AddDevice,
            parser_for("memory").unwrap(),
            &mut vm,
            &opts(&["1024"]),
        )
        .unwrap_err();
        assert!(matches!(err, CliError::NotADevice(_)));

        let err = perform(
            &Action::Edit(Selector::Position(2)),
            parser_for("memory").unwrap(),
            &mut vm,
            &opts(&["1024"]),
        )
        .unwrap_err();
        assert!(matches!(err, CliError::SelectorNotApplicable { .. }));
    }

    #[test]
    fn build_xml_serializes_the_option_block() {
        let mut vm = XmlBuilder::build(guest::guest());
        let outcome = perform(
            &Action::BuildXml,
            parser_for("cpu").unwrap(),
            &mut vm,
            &opts(&["host-passthrough-ish,mode=host-passthrough"]),
        )
        .unwrap();
        assert_eq!(
            outcome,
            Outcome::Applied(vec![
                "<cpu mode=\"host-passthrough\">\n  <model>host-passthrough-ish</model>\n</cpu>\n"
                    .to_string()
            ])
        );
    }

    #[test]
    fn build_xml_for_a_device_applies_defaults() {
        let mut vm = XmlBuilder::build(guest::guest());
        let outcome = perform(
            &Action::BuildXml,
            parser_for("disk").unwrap(),
            &mut vm,
            &opts(&["/var/lib/libvirt/images/new.qcow2,target=vdb"]),
        )
        .unwrap();
        assert_eq!(
            outcome,
            Outcome::Applied(vec![
                "<disk type=\"file\" device=\"disk\">\n  <source file=\"/var/lib/libvirt/images/new.qcow2\"/>\n  <target dev=\"vdb\" bus=\"virtio\"/>\n</disk>\n"
                    .to_string()
            ])
        );
    }

    #[test]
    fn missing_option_strings_are_reported() {
        let mut vm = XmlBuilder::build(guest::guest());
        let err = perform(&Action::AddDevice, parser_for("disk").unwrap(), &mut vm, &[]).unwrap_err();
        assert!(matches!(err, CliError::MissingOptions(_)));
    }
}
