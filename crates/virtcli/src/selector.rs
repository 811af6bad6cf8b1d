//! Picking the objects an edit or removal applies to.

use std::fmt;

use tracing::debug;
use virt_xmlbuilder::{Obj, XmlBuilder};

use crate::error::CliError;
use crate::parser::{ParserSpec, ParserTarget};
use crate::suboption::Suboptions;

/// Which existing objects an action addresses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    /// No selector given: exactly one candidate must exist.
    Implicit,
    /// 1-based position; negative values count from the end.
    Position(i64),
    All,
    /// An option string every selected object must already satisfy.
    Match(String),
}

impl Selector {
    pub fn parse(raw: Option<&str>) -> Result<Self, CliError> {
        let Some(raw) = raw.map(str::trim) else {
            return Ok(Selector::Implicit);
        };
        if raw.is_empty() {
            return Ok(Selector::Implicit);
        }
        if raw == "all" {
            return Ok(Selector::All);
        }
        match raw.parse::<i64>() {
            Ok(0) => Err(CliError::InvalidSelector(raw.to_string())),
            Ok(position) => Ok(Selector::Position(position)),
            Err(_) => Ok(Selector::Match(raw.to_string())),
        }
    }

    /// Indices (0-based) of the objects of `parser` selected in `doc`.
    pub fn resolve(&self, parser: &'static ParserSpec, doc: &XmlBuilder) -> Result<Vec<usize>, CliError> {
        let candidates = candidates(parser, doc)?;
        let count = candidates.len();
        let not_found = || CliError::NoMatchingDevice {
            option: parser.option.to_string(),
            selector: self.to_string(),
            count,
        };
        let selected = match self {
            Selector::Implicit => match count {
                0 => return Err(not_found()),
                1 => vec![0],
                _ => {
                    return Err(CliError::AmbiguousDevice {
                        option: parser.option.to_string(),
                        count,
                        candidates: candidates.iter().map(describe).collect(),
                    })
                }
            },
            Selector::All => (0..count).collect(),
            Selector::Position(position) => {
                let index = if *position > 0 {
                    usize::try_from(*position - 1).ok()
                } else {
                    usize::try_from(-*position)
                        .ok()
                        .and_then(|back| count.checked_sub(back))
                };
                match index.filter(|index| *index < count) {
                    Some(index) => vec![index],
                    None => return Err(not_found()),
                }
            }
            Selector::Match(optstr) => {
                let coverage = doc.coverage().map(|coverage| coverage.as_ref());
                let wanted = Suboptions::parse(parser, optstr, coverage)?;
                let mut selected = Vec::new();
                for (index, candidate) in candidates.iter().enumerate() {
                    if wanted.matches(*candidate)? {
                        selected.push(index);
                    }
                }
                if selected.is_empty() {
                    return Err(not_found());
                }
                selected
            }
        };
        debug!(option = parser.option, selector = %self, ?selected, "resolved selector");
        Ok(selected)
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::Implicit => Ok(()),
            Selector::Position(position) => write!(f, "{position}"),
            Selector::All => write!(f, "all"),
            Selector::Match(optstr) => write!(f, "{optstr}"),
        }
    }
}

fn candidates<'a>(parser: &ParserSpec, doc: &'a XmlBuilder) -> Result<Vec<Obj<'a>>, CliError> {
    Ok(match parser.target {
        ParserTarget::Collection(name) => doc.children(name)?,
        ParserTarget::Root => vec![doc.root()],
    })
}

fn describe(object: &Obj<'_>) -> String {
    let values: Vec<String> = object
        .values()
        .into_iter()
        .map(|(name, value)| format!("{name}={value}"))
        .collect();
    format!("{}: {}", object.position(), values.join(","))
}

#[cfg(test)]
mod tests {
    use virtinst::guest;

    use super::*;
    use crate::parser::parser_for;

    const GUEST: &str = r#"<domain type="kvm">
  <name>sel</name>
  <devices>
    <disk type="file" device="disk">
      <source file="/a.img"/>
      <target dev="vda" bus="virtio"/>
    </disk>
    <disk type="file" device="cdrom">
      <source file="/b.iso"/>
      <target dev="sda" bus="sata"/>
    </disk>
    <disk type="file" device="cdrom">
      <target dev="sdb" bus="sata"/>
    </disk>
  </devices>
</domain>
"#;

    fn resolve(selector: Option<&str>, option: &str) -> Result<Vec<usize>, CliError> {
        let doc = XmlBuilder::parse(guest::guest(), GUEST).unwrap();
        Selector::parse(selector)?.resolve(parser_for(option).unwrap(), &doc)
    }

    #[test]
    fn parses_selector_forms() {
        assert_eq!(Selector::parse(None).unwrap(), Selector::Implicit);
        assert_eq!(Selector::parse(Some("")).unwrap(), Selector::Implicit);
        assert_eq!(Selector::parse(Some("all")).unwrap(), Selector::All);
        assert_eq!(Selector::parse(Some("-1")).unwrap(), Selector::Position(-1));
        assert_eq!(
            Selector::parse(Some("target=vda")).unwrap(),
            Selector::Match("target=vda".into())
        );
        assert!(matches!(
            Selector::parse(Some("0")).unwrap_err(),
            CliError::InvalidSelector(_)
        ));
    }

    #[test]
    fn positions_count_from_either_end() {
        assert_eq!(resolve(Some("1"), "disk").unwrap(), vec![0]);
        assert_eq!(resolve(Some("-1"), "disk").unwrap(), vec![2]);
        assert_eq!(resolve(Some("-3"), "disk").unwrap(), vec![0]);
        assert!(matches!(
            resolve(Some("4"), "disk").unwrap_err(),
            CliError::NoMatchingDevice { count: 3, .. }
        ));
        assert!(resolve(Some("-4"), "disk").is_err());
    }

    #[test]
    fn match_selects_every_satisfying_object() {
        assert_eq!(resolve(Some("device=cdrom"), "disk").unwrap(), vec![1, 2]);
        assert_eq!(resolve(Some("target=vda"), "disk").unwrap(), vec![0]);
        assert_eq!(resolve(Some("/b.iso"), "disk").unwrap(), vec![1]);
        assert!(matches!(
            resolve(Some("target=vdz"), "disk").unwrap_err(),
            CliError::NoMatchingDevice { .. }
        ));
    }

    #[test]
    fn implicit_selector_needs_a_single_candidate() {
        match resolve(None, "disk").unwrap_err() {
            CliError::AmbiguousDevice { count, candidates, .. } => {
                assert_eq!(count, 3);
                assert!(candidates[0].starts_with("1: "), "{candidates:?}");
                assert!(candidates[0].contains("target=vda"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(matches!(
            resolve(None, "network").unwrap_err(),
            CliError::NoMatchingDevice { count: 0, .. }
        ));
        assert_eq!(resolve(Some("all"), "network").unwrap(), Vec::<usize>::new());
        assert_eq!(resolve(None, "memory").unwrap(), vec![0]);
    }
}
