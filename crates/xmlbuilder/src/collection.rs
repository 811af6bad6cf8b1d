//! Ordered child objects of one kind, stored at `prefix[1..N]`.

use tracing::debug;
use virt_xmlapi::Document;

use crate::object::{Bound, Context, Obj, ObjMut, XmlBuilder};
use crate::schema::{ChildSpec, Schema};
use crate::BuildError;

/// Mutable handle on one child collection of a bound object.
pub struct CollectionMut<'a> {
    doc: &'a mut Document,
    owner: &'a mut Bound,
    slot: usize,
    ctx: &'a Context,
}

impl<'a> CollectionMut<'a> {
    pub(crate) fn new(
        doc: &'a mut Document,
        owner: &'a mut Bound,
        slot: usize,
        ctx: &'a Context,
    ) -> Self {
        Self {
            doc,
            owner,
            slot,
            ctx,
        }
    }

    pub fn spec(&self) -> &'static ChildSpec {
        let schema: &'static Schema = self.owner.schema;
        &schema.children()[self.slot]
    }

    pub fn item_schema(&self) -> &'static Schema {
        (self.spec().schema)()
    }

    pub fn len(&self) -> usize {
        self.items().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items().is_empty()
    }

    fn items(&self) -> &Vec<Bound> {
        &self.owner.collections[self.slot]
    }

    fn out_of_range(&self, index: usize) -> BuildError {
        BuildError::IndexOutOfRange {
            name: self.spec().name.to_string(),
            index,
            len: self.len(),
        }
    }

    pub fn get(&self, index: usize) -> Result<Obj<'_>, BuildError> {
        let bound = self
            .items()
            .get(index)
            .ok_or_else(|| self.out_of_range(index))?;
        Ok(Obj {
            doc: &*self.doc,
            bound,
            ctx: self.ctx,
        })
    }

    pub fn get_mut(&mut self, index: usize) -> Result<ObjMut<'_>, BuildError> {
        if index >= self.len() {
            return Err(self.out_of_range(index));
        }
        Ok(ObjMut {
            doc: &mut *self.doc,
            bound: &mut self.owner.collections[self.slot][index],
            ctx: self.ctx,
        })
    }

    pub fn into_item(self, index: usize) -> Result<ObjMut<'a>, BuildError> {
        if index >= self.len() {
            return Err(self.out_of_range(index));
        }
        let owner = self.owner;
        Ok(ObjMut {
            doc: self.doc,
            bound: &mut owner.collections[self.slot][index],
            ctx: self.ctx,
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = Obj<'_>> {
        let (doc, ctx) = (&*self.doc, self.ctx);
        self.items().iter().map(move |bound| Obj { doc, bound, ctx })
    }

    /// 1-based positions in collection order.
    pub fn positions(&self) -> Vec<usize> {
        self.items().iter().map(|item| item.position).collect()
    }

    /// Index of the first item matching `predicate`.
    pub fn find(&self, mut predicate: impl FnMut(&Obj<'_>) -> bool) -> Option<usize> {
        self.iter().position(|obj| predicate(&obj))
    }

    /// Create an empty item in place; its defaults stay pending.
    pub fn add_new(&mut self) -> Result<usize, BuildError> {
        let schema = self.item_schema();
        let node = self.doc.new_element(schema.root_name());
        let mut bound = Bound::empty(schema, node, 0);
        bound.defaults_pending = true;
        self.place(bound, None)
    }

    /// Move a standalone object to the end of the collection.
    pub fn append(&mut self, object: XmlBuilder) -> Result<usize, BuildError> {
        self.adopt(object, None)
    }

    /// Move a standalone object in front of item `index`.
    pub fn insert(&mut self, index: usize, object: XmlBuilder) -> Result<usize, BuildError> {
        if index > self.len() {
            return Err(self.out_of_range(index));
        }
        self.adopt(object, Some(index))
    }

    fn adopt(&mut self, object: XmlBuilder, at: Option<usize>) -> Result<usize, BuildError> {
        let schema = self.item_schema();
        if object.kind() != schema.kind() {
            return Err(BuildError::KindMismatch {
                expected: schema.kind().to_string(),
                found: object.kind().to_string(),
            });
        }
        let node = self.doc.import_subtree(&object.doc, object.root.node);
        let index = self.place(Bound::empty(schema, node, 0), at)?;
        // Child collections are bound once the subtree sits in the document.
        let fresh = Bound::attach(schema, &*self.doc, node, index + 1)?;
        let item = &mut self.owner.collections[self.slot][index];
        item.collections = fresh.collections;
        item.copy_flags_from(&object.root);
        Ok(index)
    }

    fn place(&mut self, bound: Bound, at: Option<usize>) -> Result<usize, BuildError> {
        let spec = self.spec();
        let owner_schema: &'static Schema = self.owner.schema;
        let node = bound.node;
        let reference = at
            .and_then(|index| self.items().get(index))
            .map(|item| item.node);
        match reference {
            Some(reference) => self.doc.insert_before(reference, node),
            None => {
                let container = self.doc.ensure(self.owner.node, spec.parent_xpath, owner_schema)?;
                self.doc
                    .insert_ordered(container, node, spec.parent_xpath, owner_schema);
            }
        }
        let items = &mut self.owner.collections[self.slot];
        let index = at.unwrap_or(items.len()).min(items.len());
        items.insert(index, bound);
        debug!(collection = spec.name, index, "insert child object");
        self.reindex();
        Ok(index)
    }

    /// Detach item `index`; the returned object keeps its data.
    pub fn remove(&mut self, index: usize) -> Result<XmlBuilder, BuildError> {
        if index >= self.len() {
            return Err(self.out_of_range(index));
        }
        let bound = self.owner.collections[self.slot].remove(index);
        let doc = self.doc.extract(bound.node);
        self.doc.detach(bound.node);
        self.reindex();
        debug!(collection = self.spec().name, index, "remove child object");
        let mut root = Bound::attach(bound.schema, &doc, doc.root(), 1)?;
        root.copy_flags_from(&bound);
        Ok(XmlBuilder {
            doc,
            root,
            ctx: self.ctx.clone(),
        })
    }

    /// Renumber positions 1..N following the current item order.
    pub fn reindex(&mut self) {
        for (idx, item) in self.owner.collections[self.slot].iter_mut().enumerate() {
            item.position = idx + 1;
        }
    }

    /// Stable sort by `key`; elements move into the same sibling slots.
    pub fn sort_by_key<K: Ord>(&mut self, mut key: impl FnMut(Obj<'_>) -> K) {
        let keys: Vec<K> = self.iter().map(&mut key).collect();
        let mut order: Vec<usize> = (0..keys.len()).collect();
        order.sort_by(|&a, &b| keys[a].cmp(&keys[b]));
        if order.iter().enumerate().all(|(pos, &idx)| pos == idx) {
            return;
        }

        let items = std::mem::take(&mut self.owner.collections[self.slot]);
        let slots: Vec<_> = items.iter().map(|item| item.node).collect();
        let mut taken: Vec<Option<Bound>> = items.into_iter().map(Some).collect();
        let sorted: Vec<Bound> = order
            .iter()
            .filter_map(|&idx| taken[idx].take())
            .collect();
        let replacement: Vec<_> = sorted.iter().map(|item| item.node).collect();
        self.doc.reorder_children(&slots, &replacement);
        self.owner.collections[self.slot] = sorted;
        self.reindex();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::OnceLock;

    use super::*;
    use crate::property::PropertySpec;

    fn disk() -> &'static Schema {
        static SCHEMA: OnceLock<Schema> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            Schema::builder("disk", "disk")
                .property(PropertySpec::text("target", "./target/@dev"))
                .property(PropertySpec::int("boot_order", "./boot/@order"))
                .build()
        })
    }

    fn interface() -> &'static Schema {
        static SCHEMA: OnceLock<Schema> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            Schema::builder("interface", "interface")
                .property(PropertySpec::text("mac", "./mac/@address"))
                .build()
        })
    }

    fn domain() -> &'static Schema {
        static SCHEMA: OnceLock<Schema> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            Schema::builder("domain", "domain")
                .property(PropertySpec::text("name", "./name"))
                .property(PropertySpec::text("emulator", "./devices/emulator"))
                .child("disks", "./devices", disk)
                .child("interfaces", "./devices", interface)
                .build()
        })
    }

    const GUEST: &str = "<domain>
  <name>g</name>
  <devices>
    <disk><target dev=\"vda\"/><boot order=\"2\"/></disk>
    <disk><target dev=\"vdb\"/></disk>
    <interface><mac address=\"52:54:00:00:00:01\"/></interface>
    <disk><target dev=\"vdc\"/><boot order=\"1\"/></disk>
  </devices>
</domain>
";

    fn targets(guest: &XmlBuilder) -> Vec<String> {
        guest
            .children("disks")
            .unwrap()
            .iter()
            .map(|disk| disk.get("target").unwrap().unwrap_or_default())
            .collect()
    }

    #[test]
    fn parse_binds_items_in_document_order() {
        let guest = XmlBuilder::parse(domain(), GUEST).expect("parse");
        assert_eq!(targets(&guest), vec!["vda", "vdb", "vdc"]);
        let positions: Vec<usize> = guest
            .children("disks")
            .unwrap()
            .iter()
            .map(|disk| disk.position())
            .collect();
        assert_eq!(positions, vec![1, 2, 3]);
    }

    #[test]
    fn append_lands_after_last_sibling_of_same_kind() {
        let mut guest = XmlBuilder::parse(domain(), GUEST).expect("parse");
        let mut disk = XmlBuilder::build(disk());
        disk.set("target", Some("vdd")).unwrap();
        let index = guest.collection("disks").unwrap().append(disk).expect("append");
        assert_eq!(index, 3);
        let xml = guest.get_xml().unwrap();
        let vdc = xml.find("vdc").expect("vdc");
        let vdd = xml.find("vdd").expect("vdd");
        assert!(vdc < vdd);
        assert!(vdd < xml.find("</devices>").expect("end"));
    }

    #[test]
    fn remove_preserves_survivor_order_and_returns_data() {
        let mut guest = XmlBuilder::parse(domain(), GUEST).expect("parse");
        let removed = guest.collection("disks").unwrap().remove(1).expect("remove");
        assert_eq!(removed.get("target").unwrap().as_deref(), Some("vdb"));
        assert_eq!(removed.get_xml().unwrap(), "<disk>\n  <target dev=\"vdb\"/>\n</disk>\n");
        assert_eq!(targets(&guest), vec!["vda", "vdc"]);
        assert_eq!(guest.children("disks").unwrap()[1].position(), 2);
    }

    #[test]
    fn stable_sort_moves_elements_into_same_slots() {
        let mut guest = XmlBuilder::parse(domain(), GUEST).expect("parse");
        guest
            .collection("disks")
            .unwrap()
            .sort_by_key(|disk| disk.get_int("boot_order").ok().flatten().unwrap_or(i64::MAX));
        assert_eq!(targets(&guest), vec!["vdc", "vda", "vdb"]);
        let xml = guest.get_xml().unwrap();
        let nic = xml.find("<interface>").expect("interface");
        assert!(xml.find("vdc").expect("vdc") < xml.find("vda").expect("vda"));
        assert!(xml.find("vda").unwrap() < nic, "vda takes the second disk slot");
        assert!(nic < xml.find("vdb").expect("vdb"), "vdb takes the slot after the interface");
    }

    #[test]
    fn into_child_appends_only_at_the_end() {
        let mut guest = XmlBuilder::parse(domain(), GUEST).expect("parse");
        match guest.root_mut().into_child("disks", 999_999_999, true) {
            Err(BuildError::IndexOutOfRange { index, len, .. }) => {
                assert_eq!((index, len), (999_999_999, 3));
            }
            other => panic!("unexpected result: {:?}", other.map(|_| ())),
        }
        assert!(guest.root_mut().into_child("disks", 3, false).is_err());
        assert_eq!(guest.children("disks").unwrap().len(), 3);

        let mut fourth = guest.root_mut().into_child("disks", 3, true).expect("append");
        fourth.set("target", Some("vdd")).unwrap();
        assert_eq!(targets(&guest), vec!["vda", "vdb", "vdc", "vdd"]);
        guest
            .root_mut()
            .into_child("disks", 0, true)
            .expect("existing")
            .set("target", Some("sda"))
            .unwrap();
        assert_eq!(targets(&guest), vec!["sda", "vdb", "vdc", "vdd"]);
    }

    #[test]
    fn kind_mismatch_is_rejected() {
        let mut guest = XmlBuilder::parse(domain(), GUEST).expect("parse");
        let nic = XmlBuilder::build(interface());
        assert!(matches!(
            guest.collection("disks").unwrap().append(nic),
            Err(BuildError::KindMismatch { .. })
        ));
    }

    #[test]
    fn first_item_creates_container_in_declared_order() {
        let mut guest = XmlBuilder::build_without_defaults(domain());
        guest.set("name", Some("fresh")).unwrap();
        let mut nic = XmlBuilder::build(interface());
        nic.set("mac", Some("52:54:00:aa:bb:cc")).unwrap();
        guest.collection("interfaces").unwrap().append(nic).unwrap();
        guest.collection("disks").unwrap().add_new().unwrap();
        assert_eq!(
            guest.get_xml().unwrap(),
            "<domain>\n  <name>fresh</name>\n  <devices>\n    <disk/>\n    <interface>\n      <mac address=\"52:54:00:aa:bb:cc\"/>\n    </interface>\n  </devices>\n</domain>\n"
        );
    }
}
