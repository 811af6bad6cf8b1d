//! Value-level differences between two bound documents.

use std::fmt;

#[cfg(feature = "serde")]
use serde::Serialize;
use virt_xmlapi::{Document, NodeId};

/// One changed attribute, text value or whole element.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Change {
    pub xpath: String,
    pub old: Option<String>,
    pub new: Option<String>,
}

impl fmt::Display for Change {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} -> {}",
            self.xpath,
            self.old.as_deref().unwrap_or("-"),
            self.new.as_deref().unwrap_or("-")
        )
    }
}

/// Walk `a` and `b` in parallel. Elements pair up by name and position;
/// an element present on one side only is reported whole.
pub fn diff_nodes(a_doc: &Document, a: NodeId, b_doc: &Document, b: NodeId) -> Vec<Change> {
    let mut changes = Vec::new();
    walk(a_doc, a, b_doc, b, ".", &mut changes);
    changes
}

fn walk(
    a_doc: &Document,
    a: NodeId,
    b_doc: &Document,
    b: NodeId,
    path: &str,
    out: &mut Vec<Change>,
) {
    let mut names: Vec<&str> = a_doc.attributes(a).iter().map(|(k, _)| k.as_str()).collect();
    for (key, _) in b_doc.attributes(b) {
        if !names.contains(&key.as_str()) {
            names.push(key);
        }
    }
    for name in names {
        let old = a_doc.attribute(a, name);
        let new = b_doc.attribute(b, name);
        if old != new {
            out.push(Change {
                xpath: format!("{path}/@{name}"),
                old: old.map(str::to_string),
                new: new.map(str::to_string),
            });
        }
    }

    let (old, new) = (a_doc.text(a), b_doc.text(b));
    if old != new {
        out.push(Change {
            xpath: path.to_string(),
            old,
            new,
        });
    }

    let mut element_names: Vec<String> = Vec::new();
    for child in a_doc.element_children(a) {
        push_unique(&mut element_names, a_doc.name(child));
    }
    for child in b_doc.element_children(b) {
        push_unique(&mut element_names, b_doc.name(child));
    }
    for name in &element_names {
        let ours = named_children(a_doc, a, name);
        let theirs = named_children(b_doc, b, name);
        let total = ours.len().max(theirs.len());
        for idx in 0..total {
            let sub = if total > 1 {
                format!("{path}/{name}[{}]", idx + 1)
            } else {
                format!("{path}/{name}")
            };
            match (ours.get(idx), theirs.get(idx)) {
                (Some(&x), Some(&y)) => walk(a_doc, x, b_doc, y, &sub, out),
                (Some(&x), None) => out.push(Change {
                    xpath: sub,
                    old: Some(a_doc.serialize_node(x).trim_end().to_string()),
                    new: None,
                }),
                (None, Some(&y)) => out.push(Change {
                    xpath: sub,
                    old: None,
                    new: Some(b_doc.serialize_node(y).trim_end().to_string()),
                }),
                (None, None) => {}
            }
        }
    }
}

fn push_unique(names: &mut Vec<String>, name: Option<&str>) {
    if let Some(name) = name {
        if !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
    }
}

fn named_children(doc: &Document, node: NodeId, name: &str) -> Vec<NodeId> {
    doc.element_children(node)
        .filter(|&child| doc.name(child) == Some(name))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn changes(a: &str, b: &str) -> Vec<String> {
        let a = Document::parse(a).expect("parse a");
        let b = Document::parse(b).expect("parse b");
        diff_nodes(&a, a.root(), &b, b.root())
            .iter()
            .map(ToString::to_string)
            .collect()
    }

    #[test]
    fn identical_documents_have_no_changes() {
        let xml = "<domain><name>x</name><devices><disk/><disk/></devices></domain>";
        assert!(changes(xml, xml).is_empty());
    }

    #[test]
    fn attribute_text_and_element_changes() {
        let before = "<domain type=\"kvm\"><name>a</name><devices><disk device=\"disk\"/></devices></domain>";
        let after = "<domain type=\"qemu\"><name>b</name><devices><disk device=\"disk\"/><disk device=\"cdrom\"/></devices></domain>";
        assert_eq!(
            changes(before, after),
            vec![
                "./@type: kvm -> qemu".to_string(),
                "./name: a -> b".to_string(),
                "./devices/disk[2]: - -> <disk device=\"cdrom\"/>".to_string(),
            ]
        );
    }
}
