//! Bound objects: a document node interpreted through a [`Schema`].

use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use tracing::{debug, warn};
use virt_xmlapi::{Document, NodeId, XmlError};

use crate::capability::Capability;
use crate::collection::CollectionMut;
use crate::coverage::Coverage;
use crate::diff::{diff_nodes, Change};
use crate::property::{parse_bool, parse_int, DefaultSpec, Encoded, PropertySpec, ValueType};
use crate::schema::Schema;
use crate::BuildError;

/// How unknown names and malformed values are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParseMode {
    #[default]
    Strict,
    /// Log with `warn!` and carry on.
    Lenient,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct Context {
    pub(crate) mode: ParseMode,
    pub(crate) coverage: Option<Arc<Coverage>>,
}

impl Context {
    fn touch(&self, kind: &str, name: &str) {
        if let Some(coverage) = &self.coverage {
            coverage.touch_property(kind, name);
        }
    }

    /// Strict mode propagates `err`; lenient mode logs it and yields `None`.
    fn tolerate<T>(&self, err: BuildError) -> Result<Option<T>, BuildError> {
        match self.mode {
            ParseMode::Strict => Err(err),
            ParseMode::Lenient => {
                warn!(error = %err, "ignored in lenient mode");
                Ok(None)
            }
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Bound {
    pub(crate) schema: &'static Schema,
    pub(crate) node: NodeId,
    pub(crate) position: usize,
    /// One item list per entry of `schema.children()`.
    pub(crate) collections: Vec<Vec<Bound>>,
    pub(crate) explicit: BTreeSet<&'static str>,
    pub(crate) defaults_pending: bool,
}

impl Bound {
    pub(crate) fn empty(schema: &'static Schema, node: NodeId, position: usize) -> Self {
        Bound {
            schema,
            node,
            position,
            collections: vec![Vec::new(); schema.children().len()],
            explicit: BTreeSet::new(),
            defaults_pending: false,
        }
    }

    /// Bind `node` and every child collection found below it.
    pub(crate) fn attach(
        schema: &'static Schema,
        doc: &Document,
        node: NodeId,
        position: usize,
    ) -> Result<Self, XmlError> {
        let mut bound = Bound::empty(schema, node, position);
        for (slot, spec) in schema.children().iter().enumerate() {
            let child_schema = (spec.schema)();
            for (idx, child) in doc.find_all(node, &spec.element_xpath())?.into_iter().enumerate() {
                bound.collections[slot].push(Bound::attach(child_schema, doc, child, idx + 1)?);
            }
        }
        Ok(bound)
    }

    /// Carry explicit-set markers and pending defaults over from a twin tree.
    pub(crate) fn copy_flags_from(&mut self, other: &Bound) {
        self.explicit = other.explicit.clone();
        self.defaults_pending = other.defaults_pending;
        for (ours, theirs) in self.collections.iter_mut().zip(&other.collections) {
            for (a, b) in ours.iter_mut().zip(theirs) {
                a.copy_flags_from(b);
            }
        }
    }

    fn any_pending(&self) -> bool {
        self.defaults_pending
            || self
                .collections
                .iter()
                .flatten()
                .any(|child| child.any_pending())
    }

    fn apply_defaults(&mut self, doc: &mut Document) -> Result<(), BuildError> {
        if self.defaults_pending {
            self.evaluate_defaults(doc)?;
            self.defaults_pending = false;
        }
        for child in self.collections.iter_mut().flatten() {
            child.apply_defaults(doc)?;
        }
        Ok(())
    }

    fn evaluate_defaults(&mut self, doc: &mut Document) -> Result<(), BuildError> {
        let mut pending: Vec<&'static PropertySpec> = Vec::new();
        for spec in self.schema.properties() {
            if !spec.has_default() || spec.is_indexed() || self.explicit.contains(spec.name) {
                continue;
            }
            if read_value(doc, self, spec, None)?.is_none() {
                pending.push(spec);
            }
        }
        let mut waiting: HashSet<&'static str> = pending.iter().map(|spec| spec.name).collect();

        while !pending.is_empty() {
            let mut deferred = Vec::new();
            let mut progressed = false;
            for spec in pending {
                let value = match spec.default {
                    DefaultSpec::None => None,
                    DefaultSpec::Value(value) => Some(value.to_string()),
                    DefaultSpec::Computed {
                        depends_on,
                        compute,
                    } => {
                        for dep in depends_on {
                            self.schema.lookup(dep)?;
                        }
                        if depends_on.iter().any(|dep| waiting.contains(dep)) {
                            deferred.push(spec);
                            continue;
                        }
                        compute(&DefaultContext {
                            doc: &*doc,
                            bound: &*self,
                        })
                    }
                };
                waiting.remove(spec.name);
                progressed = true;
                if let Some(value) = value {
                    debug!(kind = self.schema.kind(), property = spec.name, value = %value, "apply default");
                    let encoded = spec.encode(Some(&value))?;
                    write_value(doc, self, spec, None, encoded)?;
                }
            }
            if !progressed {
                return Err(BuildError::DefaultCycle {
                    kind: self.schema.kind().to_string(),
                    properties: deferred.iter().map(|spec| spec.name.to_string()).collect(),
                });
            }
            pending = deferred;
        }
        Ok(())
    }
}

/// Read access to sibling properties while a computed default is evaluated.
pub struct DefaultContext<'a> {
    doc: &'a Document,
    bound: &'a Bound,
}

impl DefaultContext<'_> {
    pub fn kind(&self) -> &'static str {
        self.bound.schema.kind()
    }

    pub fn get(&self, name: &str) -> Option<String> {
        let spec = self.bound.schema.property(name)?;
        read_value(self.doc, self.bound, spec, None).ok().flatten()
    }
}

pub(crate) fn read_value(
    doc: &Document,
    bound: &Bound,
    spec: &PropertySpec,
    index: Option<usize>,
) -> Result<Option<String>, XmlError> {
    let xpath = spec.xpath_for(index);
    if spec.value_type == ValueType::Flag {
        return Ok(doc.exists(bound.node, &xpath)?.then(|| "yes".to_string()));
    }
    doc.get(bound.node, &xpath)
}

fn write_value(
    doc: &mut Document,
    bound: &Bound,
    spec: &PropertySpec,
    index: Option<usize>,
    encoded: Encoded,
) -> Result<(), XmlError> {
    let xpath = spec.xpath_for(index);
    match encoded {
        Encoded::Text(value) => {
            debug!(kind = bound.schema.kind(), property = spec.name, xpath = %xpath, value = %value, "write property");
            doc.set_ordered(bound.node, &xpath, &value, bound.schema)
        }
        Encoded::Present => {
            debug!(kind = bound.schema.kind(), property = spec.name, xpath = %xpath, "write flag element");
            doc.ensure(bound.node, &xpath, bound.schema).map(|_| ())
        }
        Encoded::Absent => {
            debug!(kind = bound.schema.kind(), property = spec.name, xpath = %xpath, "remove property");
            doc.delete(bound.node, &xpath).map(|_| ())
        }
    }
}

/// Top-level bound object owning its document and every nested object.
#[derive(Debug, Clone)]
pub struct XmlBuilder {
    pub(crate) doc: Document,
    pub(crate) root: Bound,
    pub(crate) ctx: Context,
}

impl XmlBuilder {
    /// New empty object whose defaults are applied before first serialization.
    pub fn build(schema: &'static Schema) -> Self {
        let mut builder = Self::build_without_defaults(schema);
        builder.root.defaults_pending = true;
        builder
    }

    pub fn build_without_defaults(schema: &'static Schema) -> Self {
        let doc = Document::new(schema.root_name());
        let root = Bound::empty(schema, doc.root(), 1);
        debug!(kind = schema.kind(), "build new object");
        XmlBuilder {
            doc,
            root,
            ctx: Context::default(),
        }
    }

    /// Bind existing XML; unknown content is kept as-is.
    pub fn parse(schema: &'static Schema, xml: &str) -> Result<Self, BuildError> {
        let doc = Document::parse(xml)?;
        doc.validate_root(schema.root_name())?;
        let root = Bound::attach(schema, &doc, doc.root(), 1)?;
        debug!(kind = schema.kind(), "parsed object");
        Ok(XmlBuilder {
            doc,
            root,
            ctx: Context::default(),
        })
    }

    pub fn with_mode(mut self, mode: ParseMode) -> Self {
        self.ctx.mode = mode;
        self
    }

    pub fn with_coverage(mut self, coverage: Arc<Coverage>) -> Self {
        self.ctx.coverage = Some(coverage);
        self
    }

    pub fn mode(&self) -> ParseMode {
        self.ctx.mode
    }

    pub fn coverage(&self) -> Option<&Arc<Coverage>> {
        self.ctx.coverage.as_ref()
    }

    pub fn schema(&self) -> &'static Schema {
        self.root.schema
    }

    pub fn kind(&self) -> &'static str {
        self.root.schema.kind()
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    pub fn root(&self) -> Obj<'_> {
        Obj {
            doc: &self.doc,
            bound: &self.root,
            ctx: &self.ctx,
        }
    }

    pub fn root_mut(&mut self) -> ObjMut<'_> {
        ObjMut {
            doc: &mut self.doc,
            bound: &mut self.root,
            ctx: &self.ctx,
        }
    }

    pub fn get(&self, name: &str) -> Result<Option<String>, BuildError> {
        self.root().get(name)
    }

    pub fn get_at(&self, name: &str, index: usize) -> Result<Option<String>, BuildError> {
        self.root().get_at(name, index)
    }

    pub fn get_bool(&self, name: &str) -> Result<Option<bool>, BuildError> {
        self.root().get_bool(name)
    }

    pub fn get_int(&self, name: &str) -> Result<Option<i64>, BuildError> {
        self.root().get_int(name)
    }

    pub fn set(&mut self, name: &str, value: Option<&str>) -> Result<(), BuildError> {
        self.root_mut().set(name, value)
    }

    pub fn set_at(
        &mut self,
        name: &str,
        index: usize,
        value: Option<&str>,
    ) -> Result<(), BuildError> {
        self.root_mut().set_at(name, index, value)
    }

    pub fn set_bool(&mut self, name: &str, value: Option<bool>) -> Result<(), BuildError> {
        self.root_mut().set_bool(name, value)
    }

    pub fn set_int(&mut self, name: &str, value: Option<i64>) -> Result<(), BuildError> {
        self.root_mut().set_int(name, value)
    }

    pub fn clear(&mut self) {
        self.root_mut().clear();
    }

    pub fn collection(&mut self, name: &str) -> Result<CollectionMut<'_>, BuildError> {
        self.root_mut().into_collection(name)
    }

    pub fn children(&self, name: &str) -> Result<Vec<Obj<'_>>, BuildError> {
        self.root().children(name)
    }

    /// Materialize pending defaults on this object and every child.
    pub fn apply_defaults(&mut self) -> Result<(), BuildError> {
        self.root.apply_defaults(&mut self.doc)
    }

    /// Serialized XML; pending defaults are applied to a copy.
    pub fn get_xml(&self) -> Result<String, BuildError> {
        if self.root.any_pending() {
            let mut copy = self.clone();
            copy.apply_defaults()?;
            return Ok(copy.doc.serialize());
        }
        Ok(self.doc.serialize())
    }

    /// Ordered attribute/text/element differences from `self` to `other`.
    pub fn diff(&self, other: &XmlBuilder) -> Vec<Change> {
        diff_nodes(&self.doc, self.root.node, &other.doc, other.root.node)
    }

    pub fn same_values(&self, other: &XmlBuilder) -> bool {
        self.root().same_values(&other.root())
    }

    pub fn into_document(self) -> Document {
        self.doc
    }
}

/// Shared view of one bound object.
#[derive(Clone, Copy)]
pub struct Obj<'a> {
    pub(crate) doc: &'a Document,
    pub(crate) bound: &'a Bound,
    pub(crate) ctx: &'a Context,
}

impl<'a> Obj<'a> {
    pub fn kind(&self) -> &'static str {
        self.bound.schema.kind()
    }

    pub fn schema(&self) -> &'static Schema {
        self.bound.schema
    }

    pub fn node(&self) -> NodeId {
        self.bound.node
    }

    /// 1-based position within the owning collection.
    pub fn position(&self) -> usize {
        self.bound.position
    }

    pub fn has<C: Capability>(&self) -> bool {
        self.bound.schema.has::<C>()
    }

    fn lookup(&self, name: &str) -> Result<Option<&'static PropertySpec>, BuildError> {
        match self.bound.schema.lookup(name) {
            Ok(spec) => Ok(Some(spec)),
            Err(err) => self.ctx.tolerate(err),
        }
    }

    pub fn get(&self, name: &str) -> Result<Option<String>, BuildError> {
        self.read(name, None)
    }

    /// Read an indexed property at a 1-based `index`.
    pub fn get_at(&self, name: &str, index: usize) -> Result<Option<String>, BuildError> {
        self.read(name, Some(index))
    }

    fn read(&self, name: &str, index: Option<usize>) -> Result<Option<String>, BuildError> {
        let Some(spec) = self.lookup(name)? else {
            return Ok(None);
        };
        self.ctx.touch(self.kind(), spec.name);
        let index = index.or_else(|| spec.is_indexed().then_some(self.bound.position));
        Ok(read_value(self.doc, self.bound, spec, index)?)
    }

    pub fn get_bool(&self, name: &str) -> Result<Option<bool>, BuildError> {
        if let Some(spec) = self.bound.schema.property(name) {
            if spec.value_type == ValueType::Flag {
                self.ctx.touch(self.kind(), spec.name);
                return Ok(Some(read_value(self.doc, self.bound, spec, None)?.is_some()));
            }
        }
        let Some(raw) = self.get(name)? else {
            return Ok(None);
        };
        match parse_bool(&raw) {
            Some(value) => Ok(Some(value)),
            None => self.ctx.tolerate(BuildError::InvalidPropertyValue {
                name: name.to_string(),
                value: raw,
                reason: "expected a boolean".into(),
            }),
        }
    }

    pub fn get_int(&self, name: &str) -> Result<Option<i64>, BuildError> {
        let Some(raw) = self.get(name)? else {
            return Ok(None);
        };
        match parse_int(&raw) {
            Some(value) => Ok(Some(value)),
            None => self.ctx.tolerate(BuildError::InvalidPropertyValue {
                name: name.to_string(),
                value: raw,
                reason: "expected an integer".into(),
            }),
        }
    }

    /// Every populated, non-indexed property value in declaration order.
    pub fn values(&self) -> Vec<(&'static str, String)> {
        self.bound
            .schema
            .properties()
            .filter(|spec| !spec.is_indexed())
            .filter_map(|spec| {
                read_value(self.doc, self.bound, spec, None)
                    .ok()
                    .flatten()
                    .map(|value| (spec.name, value))
            })
            .collect()
    }

    /// Equality over populated values, recursing into child collections.
    pub fn same_values(&self, other: &Obj<'_>) -> bool {
        if self.kind() != other.kind() || self.values() != other.values() {
            return false;
        }
        self.bound
            .collections
            .iter()
            .zip(&other.bound.collections)
            .all(|(ours, theirs)| {
                ours.len() == theirs.len()
                    && ours.iter().zip(theirs).all(|(a, b)| {
                        let a = Obj {
                            doc: self.doc,
                            bound: a,
                            ctx: self.ctx,
                        };
                        let b = Obj {
                            doc: other.doc,
                            bound: b,
                            ctx: other.ctx,
                        };
                        a.same_values(&b)
                    })
            })
    }

    pub fn children(&self, name: &str) -> Result<Vec<Obj<'a>>, BuildError> {
        let (slot, _) = self.bound.schema.child(name)?;
        let (doc, ctx) = (self.doc, self.ctx);
        Ok(self.bound.collections[slot]
            .iter()
            .map(|bound| Obj { doc, bound, ctx })
            .collect())
    }

    pub fn child(&self, name: &str, index: usize) -> Result<Obj<'a>, BuildError> {
        let items = self.children(name)?;
        let len = items.len();
        items
            .into_iter()
            .nth(index)
            .ok_or_else(|| BuildError::IndexOutOfRange {
                name: name.to_string(),
                index,
                len,
            })
    }

    pub fn to_xml(&self) -> String {
        self.doc.serialize_node(self.bound.node)
    }
}

/// Mutable view of one bound object.
pub struct ObjMut<'a> {
    pub(crate) doc: &'a mut Document,
    pub(crate) bound: &'a mut Bound,
    pub(crate) ctx: &'a Context,
}

impl<'a> ObjMut<'a> {
    pub fn as_obj(&self) -> Obj<'_> {
        Obj {
            doc: &*self.doc,
            bound: &*self.bound,
            ctx: self.ctx,
        }
    }

    pub fn kind(&self) -> &'static str {
        self.bound.schema.kind()
    }

    pub fn get(&self, name: &str) -> Result<Option<String>, BuildError> {
        self.as_obj().get(name)
    }

    pub fn set(&mut self, name: &str, value: Option<&str>) -> Result<(), BuildError> {
        self.write(name, None, value)
    }

    /// Write an indexed property at a 1-based `index`.
    pub fn set_at(
        &mut self,
        name: &str,
        index: usize,
        value: Option<&str>,
    ) -> Result<(), BuildError> {
        self.write(name, Some(index), value)
    }

    pub fn set_bool(&mut self, name: &str, value: Option<bool>) -> Result<(), BuildError> {
        self.set(name, value.map(|v| if v { "yes" } else { "no" }))
    }

    pub fn set_int(&mut self, name: &str, value: Option<i64>) -> Result<(), BuildError> {
        let text = value.map(|v| v.to_string());
        self.set(name, text.as_deref())
    }

    fn write(
        &mut self,
        name: &str,
        index: Option<usize>,
        value: Option<&str>,
    ) -> Result<(), BuildError> {
        let spec = match self.bound.schema.lookup(name) {
            Ok(spec) => spec,
            Err(err) => return self.ctx.tolerate::<()>(err).map(|_| ()),
        };
        self.ctx.touch(self.kind(), spec.name);
        let encoded = match spec.encode(value) {
            Ok(encoded) => encoded,
            Err(err) => return self.ctx.tolerate::<()>(err).map(|_| ()),
        };
        let index = index.or_else(|| spec.is_indexed().then_some(self.bound.position));
        write_value(self.doc, self.bound, spec, index, encoded)?;
        self.bound.explicit.insert(spec.name);
        Ok(())
    }

    /// Remove every attribute and descendant of this object's element.
    pub fn clear(&mut self) {
        debug!(kind = self.kind(), "clear object");
        self.doc.clear(self.bound.node);
        for items in &mut self.bound.collections {
            items.clear();
        }
        self.bound.explicit.clear();
    }

    /// Clear the element at `xpath`, or remove it unless `leave_stub`.
    pub fn clear_subtree(&mut self, xpath: &str, leave_stub: bool) -> Result<(), BuildError> {
        if leave_stub {
            if let Some(node) = self.doc.find(self.bound.node, xpath)? {
                self.doc.clear(node);
            }
        } else {
            self.doc.delete(self.bound.node, xpath)?;
        }
        self.rebind()
    }

    /// Re-read child collections after raw document edits.
    pub fn rebind(&mut self) -> Result<(), BuildError> {
        let fresh = Bound::attach(self.bound.schema, &*self.doc, self.bound.node, self.bound.position)?;
        self.bound.collections = fresh.collections;
        Ok(())
    }

    pub fn collection(&mut self, name: &str) -> Result<CollectionMut<'_>, BuildError> {
        let slot = self.bound.schema.child(name)?.0;
        Ok(CollectionMut::new(self.doc, self.bound, slot, self.ctx))
    }

    pub fn into_collection(self, name: &str) -> Result<CollectionMut<'a>, BuildError> {
        let slot = self.bound.schema.child(name)?.0;
        Ok(CollectionMut::new(self.doc, self.bound, slot, self.ctx))
    }

    /// Descend into item `index` (0-based) of collection `name`. With
    /// `create`, an index one past the end appends a new item; anything
    /// further out is [`BuildError::IndexOutOfRange`].
    pub fn into_child(self, name: &str, index: usize, create: bool) -> Result<ObjMut<'a>, BuildError> {
        let mut collection = self.into_collection(name)?;
        if create && collection.len() == index {
            collection.add_new()?;
        }
        collection.into_item(index)
    }
}
