use quick_xml::escape::{escape, partial_escape};

use crate::{Document, NodeId, NodeKind};

const INDENT: &str = "  ";

impl Document {
    /// Serialize the whole document with 2-space indentation and a trailing newline.
    pub fn serialize(&self) -> String {
        let mut out = String::new();
        for &misc in &self.prolog {
            self.write_inline(&mut out, misc);
            out.push('\n');
        }
        self.write_block(&mut out, self.root, 0);
        for &misc in &self.epilog {
            self.write_inline(&mut out, misc);
            out.push('\n');
        }
        out
    }

    /// Serialize one subtree as if it were a document root.
    pub fn serialize_node(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.write_block(&mut out, node, 0);
        out
    }

    fn write_block(&self, out: &mut String, node: NodeId, depth: usize) {
        for _ in 0..depth {
            out.push_str(INDENT);
        }
        let children = self.children(node);
        let NodeKind::Element { name, .. } = self.kind(node) else {
            self.write_inline(out, node);
            out.push('\n');
            return;
        };
        let has_text = children
            .iter()
            .any(|&child| matches!(self.kind(child), NodeKind::Text(_) | NodeKind::CData(_)));
        if children.is_empty() || has_text {
            self.write_inline(out, node);
            out.push('\n');
            return;
        }
        self.write_open_tag(out, node);
        out.push_str(">\n");
        for &child in children {
            self.write_block(out, child, depth + 1);
        }
        for _ in 0..depth {
            out.push_str(INDENT);
        }
        out.push_str("</");
        out.push_str(name);
        out.push_str(">\n");
    }

    fn write_inline(&self, out: &mut String, node: NodeId) {
        match self.kind(node) {
            NodeKind::Element { name, .. } => {
                self.write_open_tag(out, node);
                let children = self.children(node);
                if children.is_empty() {
                    out.push_str("/>");
                    return;
                }
                out.push('>');
                for &child in children {
                    self.write_inline(out, child);
                }
                out.push_str("</");
                out.push_str(name);
                out.push('>');
            }
            NodeKind::Text(text) => out.push_str(&partial_escape(text)),
            NodeKind::CData(text) => {
                out.push_str("<![CDATA[");
                out.push_str(text);
                out.push_str("]]>");
            }
            NodeKind::Comment(text) => {
                out.push_str("<!--");
                out.push_str(text);
                out.push_str("-->");
            }
            NodeKind::ProcessingInstruction(text) | NodeKind::Declaration(text) => {
                out.push_str("<?");
                out.push_str(text);
                out.push_str("?>");
            }
            NodeKind::DocType(text) => {
                out.push_str("<!DOCTYPE ");
                out.push_str(text);
                out.push('>');
            }
        }
    }

    fn write_open_tag(&self, out: &mut String, node: NodeId) {
        if let NodeKind::Element { name, attributes } = self.kind(node) {
            out.push('<');
            out.push_str(name);
            for (key, value) in attributes {
                out.push(' ');
                out.push_str(key);
                out.push_str("=\"");
                out.push_str(&escape(value));
                out.push('"');
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::Document;

    #[test]
    fn layout_is_normalized_to_two_spaces() {
        let doc = Document::parse(
            "<?xml version=\"1.0\"?>\n<domain>\n\t<name>a &amp; b</name><os><type arch=\"x86_64\">hvm</type></os></domain>",
        )
        .expect("parse");
        assert_eq!(
            doc.serialize(),
            "<?xml version=\"1.0\"?>\n<domain>\n  <name>a &amp; b</name>\n  <os>\n    <type arch=\"x86_64\">hvm</type>\n  </os>\n</domain>\n"
        );
    }

    #[test]
    fn mixed_content_is_written_inline() {
        let text = "<description>line <b>bold</b> tail</description>\n";
        let doc = Document::parse(text).expect("parse");
        assert_eq!(doc.serialize(), text);
    }

    #[test]
    fn attribute_values_are_escaped() {
        let mut doc = Document::new("seclabel");
        let root = doc.root();
        doc.set_attribute(root, "label", "a\"<b>&'c");
        let again = Document::parse(&doc.serialize()).expect("reparse");
        assert_eq!(again.attribute(again.root(), "label"), Some("a\"<b>&'c"));
    }
}
