//! The small XPath subset used to address properties.
//!
//! Supported forms: `.`, `..`, `name`, `prefix:name`, `name[N]` (1-based),
//! `name[@attr='value']` and a trailing `@attr`.

use std::fmt;

use crate::XmlError;

/// Filter applied to the element candidates of one step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// 1-based position among same-named siblings.
    Position(usize),
    /// First sibling carrying `name="value"`.
    AttrEquals { name: String, value: String },
}

/// One path step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Parent,
    Element {
        name: String,
        predicate: Option<Predicate>,
    },
}

/// Parsed location path, relative to a context element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XPath {
    steps: Vec<Step>,
    attribute: Option<String>,
}

impl XPath {
    pub fn parse(text: &str) -> Result<Self, XmlError> {
        let invalid = || XmlError::InvalidXPath(text.to_string());
        let trimmed = text.trim();
        if trimmed.is_empty() || trimmed.starts_with('/') {
            return Err(invalid());
        }
        let mut steps = Vec::new();
        let mut attribute = None;
        let segments: Vec<&str> = trimmed.split('/').collect();
        let last = segments.len() - 1;
        for (pos, segment) in segments.iter().enumerate() {
            if attribute.is_some() {
                return Err(invalid());
            }
            match *segment {
                "." => {}
                ".." => steps.push(Step::Parent),
                "" => return Err(invalid()),
                seg if seg.starts_with('@') => {
                    let name = &seg[1..];
                    if pos != last || !is_name(name) {
                        return Err(invalid());
                    }
                    attribute = Some(name.to_string());
                }
                seg => steps.push(parse_element_step(seg).ok_or_else(invalid)?),
            }
        }
        Ok(Self { steps, attribute })
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Name of the trailing attribute, if the path addresses one.
    pub fn attribute(&self) -> Option<&str> {
        self.attribute.as_deref()
    }

    /// Path of the one element `step`.
    pub fn single(step: &Step) -> XPath {
        XPath {
            steps: vec![step.clone()],
            attribute: None,
        }
    }

    /// Same path with the trailing attribute dropped.
    pub fn element_path(&self) -> XPath {
        XPath {
            steps: self.steps.clone(),
            attribute: None,
        }
    }
}

impl fmt::Display for XPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, ".")?;
        for step in &self.steps {
            match step {
                Step::Parent => write!(f, "/..")?,
                Step::Element { name, predicate } => {
                    write!(f, "/{name}")?;
                    match predicate {
                        Some(Predicate::Position(n)) => write!(f, "[{n}]")?,
                        Some(Predicate::AttrEquals { name, value }) => {
                            let quote = if value.contains('\'') { '"' } else { '\'' };
                            write!(f, "[@{name}={quote}{value}{quote}]")?
                        }
                        None => {}
                    }
                }
            }
        }
        if let Some(attr) = &self.attribute {
            write!(f, "/@{attr}")?;
        }
        Ok(())
    }
}

fn parse_element_step(segment: &str) -> Option<Step> {
    let (name, predicate) = match segment.find('[') {
        None => (segment, None),
        Some(open) => {
            let inner = segment[open + 1..].strip_suffix(']')?;
            (&segment[..open], Some(parse_predicate(inner)?))
        }
    };
    if !is_name(name) {
        return None;
    }
    Some(Step::Element {
        name: name.to_string(),
        predicate,
    })
}

fn parse_predicate(inner: &str) -> Option<Predicate> {
    if let Some(rest) = inner.strip_prefix('@') {
        let (name, quoted) = rest.split_once('=')?;
        let quote = quoted.chars().next()?;
        if quote != '\'' && quote != '"' {
            return None;
        }
        let value = quoted[1..].strip_suffix(quote)?;
        if !is_name(name) || value.contains(quote) {
            return None;
        }
        return Some(Predicate::AttrEquals {
            name: name.to_string(),
            value: value.to_string(),
        });
    }
    match inner.parse::<usize>() {
        Ok(n) if n > 0 => Some(Predicate::Position(n)),
        _ => None,
    }
}

fn is_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' => {}
        _ => return false,
    }
    let mut colons = 0;
    for c in chars {
        if c == ':' {
            colons += 1;
        } else if !(c.is_alphanumeric() || matches!(c, '_' | '-' | '.')) {
            return false;
        }
    }
    colons <= 1 && !name.ends_with(':')
}
