//! Option strings: `key=value,...` terms resolved against a [`ParserSpec`]
//! and applied to, or matched against, bound objects.

use indexmap::IndexMap;
use tracing::{debug, trace};
use virt_xmlbuilder::suggest::suggestions;
use virt_xmlbuilder::{
    parse_bool, parse_int, BootOrder, BuildError, Coverage, Obj, ObjMut, XmlBuilder,
};

use crate::error::CliError;
use crate::parser::{ArgFlags, ArgSpec, ClearScope, ParserSpec, Target};

/// Split on commas into `(key, value)` terms; empty terms are dropped.
pub fn split_terms(optstr: &str) -> Vec<(String, Option<String>)> {
    optstr
        .split(',')
        .filter(|term| !term.is_empty())
        .map(|term| match term.split_once('=') {
            Some((key, value)) => (key.to_string(), Some(value.to_string())),
            None => (term.to_string(), None),
        })
        .collect()
}

/// `?`, `help` or any `key=?` asks for the suboption listing.
pub fn wants_help(optstr: &str) -> bool {
    split_terms(optstr).iter().any(|(key, value)| match value {
        Some(value) => value == "?",
        None => key == "?" || key == "help",
    })
}

/// Where an option's object lives in the document being edited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Root,
    Item {
        collection: &'static str,
        index: usize,
    },
}

/// One resolved `key=value` term.
#[derive(Debug, Clone)]
pub struct Assignment {
    /// Key as typed, after positional names were filled in.
    pub key: String,
    /// `None` unsets the property.
    pub value: Option<String>,
    pub(crate) arg: &'static ArgSpec,
    pub(crate) indices: Vec<usize>,
}

impl Assignment {
    fn index(&self, level: usize) -> usize {
        self.indices.get(level).copied().unwrap_or_default()
    }

    /// 1-based instance addressed by an indexed property key.
    fn instance(&self, option: &str) -> Result<usize, CliError> {
        self.index(0)
            .checked_add(1)
            .ok_or_else(|| CliError::InvalidIndex {
                option: option.to_string(),
                key: self.key.clone(),
            })
    }
}

/// A parsed option string, ready to apply.
#[derive(Debug, Clone)]
pub struct Suboptions {
    parser: &'static ParserSpec,
    raw: String,
    assignments: Vec<Assignment>,
}

impl Suboptions {
    /// Resolve every term of `optstr`, marking matched names in `coverage`.
    pub fn parse(
        parser: &'static ParserSpec,
        optstr: &str,
        coverage: Option<&Coverage>,
    ) -> Result<Self, CliError> {
        let mut parsed = Suboptions {
            parser,
            raw: optstr.to_string(),
            assignments: Vec::new(),
        };
        if parser.stub_none && optstr == "none" {
            debug!(option = parser.option, "option string is a no-op");
            return Ok(parsed);
        }

        let mut terms = split_terms(optstr);
        for (term, name) in terms.iter_mut().zip(parser.remove_first) {
            if term.1.is_some() {
                break;
            }
            let value = std::mem::replace(&mut term.0, name.to_string());
            term.1 = Some(value);
        }

        let mut merged: IndexMap<String, Option<String>> = IndexMap::new();
        for (key, value) in glue_commas(parser, terms) {
            merged.insert(key, value);
        }

        let mut unknown = Vec::new();
        let mut resolved: Vec<(usize, Assignment)> = Vec::new();
        for (key, value) in merged {
            let Some((position, arg, indices)) = parser.lookup(&key, coverage) else {
                unknown.push(key);
                continue;
            };
            let value = match value {
                Some(value) if value.is_empty() => None,
                Some(value) => Some(value),
                None if arg.flags.contains(ArgFlags::FLAG) => Some("on".to_string()),
                None => {
                    return Err(CliError::MissingValue {
                        option: parser.option.to_string(),
                        key,
                    })
                }
            };
            trace!(option = parser.option, key = %key, ?value, "resolved suboption");
            resolved.push((
                position,
                Assignment {
                    key,
                    value,
                    arg,
                    indices,
                },
            ));
        }

        if let Some(key) = unknown.into_iter().next() {
            let names = parser.plain_names();
            return Err(CliError::UnknownSuboption {
                option: parser.option.to_string(),
                suggestions: suggestions(&key, names.iter().map(String::as_str)),
                key,
            });
        }

        resolved.sort_by_key(|(position, _)| *position);
        parsed.assignments = resolved.into_iter().map(|(_, assignment)| assignment).collect();
        Ok(parsed)
    }

    pub fn parser(&self) -> &'static ParserSpec {
        self.parser
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn assignments(&self) -> &[Assignment] {
        &self.assignments
    }

    pub fn is_noop(&self) -> bool {
        self.assignments.is_empty()
    }

    /// Write every assignment to the object at `slot`, in declaration order.
    pub fn apply(&self, doc: &mut XmlBuilder, slot: Slot) -> Result<(), CliError> {
        for assignment in &self.assignments {
            debug!(
                option = self.parser.option,
                key = %assignment.key,
                value = ?assignment.value,
                "apply suboption"
            );
            self.apply_one(doc, slot, assignment)?;
        }
        Ok(())
    }

    fn apply_one(
        &self,
        doc: &mut XmlBuilder,
        slot: Slot,
        assignment: &Assignment,
    ) -> Result<(), CliError> {
        let value = assignment.value.as_deref();
        match assignment.arg.target {
            Target::Property(name) => object_mut(doc, slot)?.set(name, value)?,
            Target::Child { path, property } => {
                let mut object = object_mut(doc, slot)?;
                for (level, name) in path.iter().enumerate() {
                    object = object.into_child(name, assignment.index(level), true)?;
                }
                object.set(property, value)?;
            }
            Target::Indexed(name) => {
                let instance = assignment.instance(self.parser.option)?;
                object_mut(doc, slot)?.set_at(name, instance, value)?
            }
            Target::DiskPath => {
                virtinst::devices::set_disk_path(&mut object_mut(doc, slot)?, value)?
            }
            Target::BootOrder => match (slot, value) {
                (Slot::Item { collection, index }, Some(raw)) => {
                    let order = parse_int(raw).ok_or_else(|| BuildError::InvalidPropertyValue {
                        name: BootOrder::ORDER.to_string(),
                        value: raw.to_string(),
                        reason: "expected an integer".into(),
                    })?;
                    virtinst::reorder_boot_order(doc, collection, index, order)?;
                }
                _ => object_mut(doc, slot)?.set(BootOrder::ORDER, value)?,
            },
            Target::ClearXml => {
                if !self.bool_value(assignment)? {
                    return Ok(());
                }
                let mut object = object_mut(doc, slot)?;
                match self.parser.clear {
                    ClearScope::None => {}
                    ClearScope::Object => object.clear(),
                    ClearScope::Subtree(xpath) => {
                        object.clear_subtree(xpath, self.raw.contains(','))?
                    }
                }
            }
        }
        Ok(())
    }

    fn bool_value(&self, assignment: &Assignment) -> Result<bool, CliError> {
        let raw = assignment.value.as_deref().unwrap_or_default();
        parse_bool(raw).ok_or_else(|| CliError::InvalidBool {
            option: self.parser.option.to_string(),
            key: assignment.key.clone(),
            value: raw.to_string(),
        })
    }

    /// Whether every assignment already holds on `object`.
    pub fn matches(&self, object: Obj<'_>) -> Result<bool, CliError> {
        for assignment in &self.assignments {
            if !self.matches_one(object, assignment)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn matches_one(&self, object: Obj<'_>, assignment: &Assignment) -> Result<bool, CliError> {
        let (target, name) = match assignment.arg.target {
            Target::Property(name) => (object, name),
            Target::BootOrder => (object, BootOrder::ORDER),
            Target::DiskPath => {
                return Ok(virtinst::devices::disk_path(object)? == assignment.value);
            }
            Target::Indexed(name) => {
                let wanted = normalized(object, name, assignment)?;
                let instance = assignment.instance(self.parser.option)?;
                return Ok(object.get_at(name, instance)? == wanted);
            }
            Target::Child { path, property } => {
                let mut current = object;
                for (level, child) in path.iter().enumerate() {
                    current = match current.child(child, assignment.index(level)) {
                        Ok(item) => item,
                        Err(BuildError::IndexOutOfRange { .. }) => return Ok(false),
                        Err(err) => return Err(err.into()),
                    };
                }
                (current, property)
            }
            Target::ClearXml => {
                return Err(CliError::NotSelectable {
                    option: self.parser.option.to_string(),
                    key: assignment.key.clone(),
                })
            }
        };
        let wanted = normalized(target, name, assignment)?;
        Ok(target.get(name)? == wanted)
    }
}

fn normalized(
    object: Obj<'_>,
    name: &str,
    assignment: &Assignment,
) -> Result<Option<String>, BuildError> {
    match &assignment.value {
        Some(value) => object.schema().lookup(name)?.normalize(value),
        None => Ok(None),
    }
}

fn object_mut(doc: &mut XmlBuilder, slot: Slot) -> Result<ObjMut<'_>, BuildError> {
    match slot {
        Slot::Root => Ok(doc.root_mut()),
        Slot::Item { collection, index } => doc.collection(collection)?.into_item(index),
    }
}

/// Fold terms that follow a comma-accepting key, and are not keys
/// themselves, back into its value.
fn glue_commas(
    parser: &ParserSpec,
    terms: Vec<(String, Option<String>)>,
) -> Vec<(String, Option<String>)> {
    let mut out: Vec<(String, Option<String>)> = Vec::with_capacity(terms.len());
    let mut open: Option<usize> = None;
    for (key, value) in terms {
        match parser.lookup(&key, None) {
            Some((_, arg, _)) => {
                open = arg
                    .flags
                    .contains(ArgFlags::CAN_COMMA)
                    .then_some(out.len());
                out.push((key, value));
            }
            None => match open {
                Some(at) => {
                    let mut tail = format!(",{key}");
                    if let Some(value) = value.filter(|value| !value.is_empty()) {
                        tail.push('=');
                        tail.push_str(&value);
                    }
                    out[at].1.get_or_insert_with(String::new).push_str(&tail);
                }
                None => out.push((key, value)),
            },
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use virtinst::guest;

    use super::*;
    use crate::parser::parser_for;

    fn parse(option: &str, optstr: &str) -> Result<Suboptions, CliError> {
        Suboptions::parse(parser_for(option).expect("known option"), optstr, None)
    }

    fn pairs(parsed: &Suboptions) -> Vec<(&str, Option<&str>)> {
        parsed
            .assignments()
            .iter()
            .map(|a| (a.key.as_str(), a.value.as_deref()))
            .collect()
    }

    #[test]
    fn splits_on_commas() {
        assert_eq!(
            split_terms("a=1,,b,c=x=y"),
            vec![
                ("a".to_string(), Some("1".to_string())),
                ("b".to_string(), None),
                ("c".to_string(), Some("x=y".to_string())),
            ]
        );
        assert!(split_terms("").is_empty());
    }

    #[test]
    fn leading_bare_tokens_take_positional_names() {
        let parsed = parse("disk", "/tmp/a.img,bus=sata").unwrap();
        assert_eq!(pairs(&parsed), vec![("path", Some("/tmp/a.img")), ("bus", Some("sata"))]);
        let parsed = parse("watchdog", "ib700,poweroff").unwrap();
        assert_eq!(pairs(&parsed), vec![("model", Some("ib700")), ("action", Some("poweroff"))]);
    }

    #[test]
    fn duplicate_keys_keep_the_last_value() {
        let parsed = parse("disk", "bus=ide,target=hda,bus=sata").unwrap();
        assert_eq!(pairs(&parsed), vec![("target", Some("hda")), ("bus", Some("sata"))]);
    }

    #[test]
    fn assignments_follow_declaration_order() {
        let parsed = parse("disk", "address.type=pci,clearxml=yes,target=vdb,path=/a").unwrap();
        let keys: Vec<_> = parsed.assignments().iter().map(|a| a.key.as_str()).collect();
        assert_eq!(keys, vec!["clearxml", "path", "target", "address.type"]);
    }

    #[test]
    fn comma_values_absorb_unknown_terms() {
        let parsed = parse("boot", "cmdline=console=ttyS0,quiet,splash=1,menu=on").unwrap();
        assert_eq!(
            pairs(&parsed),
            vec![("cmdline", Some("console=ttyS0,quiet,splash=1")), ("menu", Some("on"))]
        );
        let parsed = parse("metadata", "title=a,b,c=,name=x").unwrap();
        assert_eq!(pairs(&parsed), vec![("name", Some("x")), ("title", Some("a,b,c"))]);
    }

    #[test]
    fn repeated_fragments_stay_in_comma_values() {
        let parsed = parse("boot", "cmdline=console=ttyS0,console=tty0,console=hvc0").unwrap();
        assert_eq!(
            pairs(&parsed),
            vec![("cmdline", Some("console=ttyS0,console=tty0,console=hvc0"))]
        );
        let parsed = parse("metadata", "title=a,b,b").unwrap();
        assert_eq!(pairs(&parsed), vec![("title", Some("a,b,b"))]);
        let parsed = parse("metadata", "title=a,b,title=c,c").unwrap();
        assert_eq!(pairs(&parsed), vec![("title", Some("c,c"))]);
    }

    #[test]
    fn instance_numbers_are_bounded() {
        let mut vm = XmlBuilder::build_without_defaults(guest::guest());
        let err = parse("boot", "boot18446744073709551615.dev=hd")
            .unwrap()
            .apply(&mut vm, Slot::Root)
            .unwrap_err();
        assert!(matches!(err, CliError::InvalidIndex { .. }), "{err:?}");

        let index = vm.collection("disks").unwrap().add_new().unwrap();
        let slot = Slot::Item {
            collection: "disks",
            index,
        };
        let err = parse("disk", "seclabel999999999.model=dac")
            .unwrap()
            .apply(&mut vm, slot)
            .unwrap_err();
        assert!(
            matches!(err, CliError::Build(BuildError::IndexOutOfRange { .. })),
            "{err:?}"
        );
        let disk = vm.children("disks").unwrap()[0];
        assert!(disk.children("seclabels").unwrap().is_empty());
    }

    #[test]
    fn bare_tokens_need_a_flag() {
        let parsed = parse("disk", "/a.img,readonly").unwrap();
        assert_eq!(pairs(&parsed)[1], ("readonly", Some("on")));
        match parse("disk", "/a.img,serial").unwrap_err() {
            CliError::MissingValue { option, key } => {
                assert_eq!(option, "disk");
                assert_eq!(key, "serial");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn empty_value_unsets() {
        let parsed = parse("disk", "path=").unwrap();
        assert_eq!(pairs(&parsed), vec![("path", None)]);
    }

    #[test]
    fn unknown_keys_come_with_suggestions() {
        match parse("disk", "targte=vda").unwrap_err() {
            CliError::UnknownSuboption { key, suggestions, .. } => {
                assert_eq!(key, "targte");
                assert!(suggestions.contains(&"target".to_string()), "{suggestions:?}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn none_is_a_noop_where_supported() {
        assert!(parse("rng", "none").unwrap().is_noop());
        assert!(parse("disk", "none").is_ok_and(|parsed| !parsed.is_noop()));
    }

    #[test]
    fn help_requests() {
        assert!(wants_help("?"));
        assert!(wants_help("help"));
        assert!(wants_help("path=/a,bus=?"));
        assert!(!wants_help("path=/a"));
    }

    #[test]
    fn coverage_marks_matched_names() {
        let coverage = Coverage::new();
        let disk = parser_for("disk").unwrap();
        disk.declare(&coverage);
        Suboptions::parse(disk, "/a.img,cache=none", Some(&coverage)).unwrap();
        let unseen = coverage.unseen_suboptions();
        assert!(!unseen.contains(&"--disk path".to_string()));
        assert!(!unseen.contains(&"--disk cache".to_string()));
        assert!(unseen.contains(&"--disk driver.cache".to_string()));
        assert!(unseen.contains(&"shared address.type".to_string()));
    }

    #[test]
    fn applies_nested_children_and_matches_them() {
        let mut vm = XmlBuilder::build_without_defaults(guest::guest());
        let index = vm.collection("disks").unwrap().add_new().unwrap();
        let slot = Slot::Item {
            collection: "disks",
            index,
        };
        parse(
            "disk",
            "source.protocol=rbd,source.host.name=mon1,source.host1.name=mon2,source.host.port=6789",
        )
            .unwrap()
            .apply(&mut vm, slot)
            .unwrap();
        let disk = vm.children("disks").unwrap()[0];
        assert_eq!(disk.children("hosts").unwrap().len(), 2);
        assert!(parse("disk", "source.host1.name=mon2").unwrap().matches(disk).unwrap());
        assert!(!parse("disk", "source.host2.name=mon2").unwrap().matches(disk).unwrap());
        assert!(parse("disk", "source.protocol=rbd").unwrap().matches(disk).unwrap());
        assert!(matches!(
            parse("disk", "clearxml=yes").unwrap().matches(disk).unwrap_err(),
            CliError::NotSelectable { .. }
        ));
    }

    #[test]
    fn clearxml_needs_a_boolean() {
        let mut vm = XmlBuilder::build_without_defaults(guest::guest());
        let err = parse("cpu", "clearxml=maybe")
            .unwrap()
            .apply(&mut vm, Slot::Root)
            .unwrap_err();
        assert!(matches!(err, CliError::InvalidBool { .. }));
    }
}
