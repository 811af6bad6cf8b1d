//! Per-kind registry of property descriptors and child collections.

use indexmap::IndexMap;
use virt_xmlapi::SiblingOrder;

use crate::capability::{Capabilities, Capability};
use crate::property::PropertySpec;
use crate::suggest::suggestions;
use crate::BuildError;

/// Repeating child objects stored at `parent_xpath/<root_name>`.
#[derive(Debug, Clone, Copy)]
pub struct ChildSpec {
    pub name: &'static str,
    /// `.` or a plain `./a/b` path relative to the owner.
    pub parent_xpath: &'static str,
    pub schema: fn() -> &'static Schema,
}

impl ChildSpec {
    pub fn element_xpath(&self) -> String {
        format!("{}/{}", self.parent_xpath, (self.schema)().root_name())
    }
}

#[derive(Debug)]
pub struct Schema {
    kind: &'static str,
    root_name: &'static str,
    properties: IndexMap<&'static str, PropertySpec>,
    children: Vec<ChildSpec>,
    capabilities: Capabilities,
    order: IndexMap<String, Vec<String>>,
}

impl Schema {
    pub fn builder(kind: &'static str, root_name: &'static str) -> SchemaBuilder {
        SchemaBuilder {
            kind,
            root_name,
            properties: IndexMap::new(),
            children: Vec::new(),
            capabilities: Capabilities::empty(),
            order: IndexMap::new(),
        }
    }

    pub fn kind(&self) -> &'static str {
        self.kind
    }

    pub fn root_name(&self) -> &'static str {
        self.root_name
    }

    pub fn property(&self, name: &str) -> Option<&PropertySpec> {
        self.properties.get(name)
    }

    /// Like [`Schema::property`], failing with suggestions for unknown names.
    pub fn lookup(&self, name: &str) -> Result<&PropertySpec, BuildError> {
        self.properties
            .get(name)
            .ok_or_else(|| BuildError::UnknownProperty {
                kind: self.kind.to_string(),
                name: name.to_string(),
                suggestions: suggestions(name, self.properties.keys().copied()),
            })
    }

    /// Properties in declaration order.
    pub fn properties(&self) -> impl Iterator<Item = &PropertySpec> {
        self.properties.values()
    }

    pub fn children(&self) -> &[ChildSpec] {
        &self.children
    }

    pub fn child(&self, name: &str) -> Result<(usize, &ChildSpec), BuildError> {
        self.children
            .iter()
            .enumerate()
            .find(|(_, spec)| spec.name == name)
            .ok_or_else(|| BuildError::UnknownChild {
                kind: self.kind.to_string(),
                name: name.to_string(),
            })
    }

    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    pub fn has<C: Capability>(&self) -> bool {
        self.capabilities.contains(C::FLAG)
    }
}

/// New elements and attributes follow the order in which the schema first
/// mentions them.
impl SiblingOrder for Schema {
    fn rank(&self, parent_path: &str, name: &str) -> Option<usize> {
        self.order
            .get(parent_path)
            .and_then(|names| names.iter().position(|n| n == name))
    }
}

pub struct SchemaBuilder {
    kind: &'static str,
    root_name: &'static str,
    properties: IndexMap<&'static str, PropertySpec>,
    children: Vec<ChildSpec>,
    capabilities: Capabilities,
    order: IndexMap<String, Vec<String>>,
}

impl SchemaBuilder {
    pub fn property(mut self, spec: PropertySpec) -> Self {
        record_order(&mut self.order, spec.xpath);
        self.properties.insert(spec.name, spec);
        self
    }

    pub fn properties(self, specs: &[PropertySpec]) -> Self {
        specs.iter().fold(self, |builder, spec| builder.property(*spec))
    }

    pub fn capability<C: Capability>(mut self) -> Self {
        self.capabilities |= C::FLAG;
        self.properties(C::properties())
    }

    pub fn child(
        mut self,
        name: &'static str,
        parent_xpath: &'static str,
        schema: fn() -> &'static Schema,
    ) -> Self {
        let child = ChildSpec {
            name,
            parent_xpath,
            schema,
        };
        record_order(&mut self.order, &child.element_xpath());
        self.children.push(child);
        self
    }

    pub fn build(self) -> Schema {
        Schema {
            kind: self.kind,
            root_name: self.root_name,
            properties: self.properties,
            children: self.children,
            capabilities: self.capabilities,
            order: self.order,
        }
    }
}

fn record_order(order: &mut IndexMap<String, Vec<String>>, xpath: &str) {
    let mut parent = String::from(".");
    for segment in xpath.split('/') {
        if segment.is_empty() || segment == "." {
            continue;
        }
        if segment == ".." {
            return;
        }
        let name = segment.split('[').next().unwrap_or(segment);
        let names = order.entry(parent.clone()).or_default();
        if !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
        if name.starts_with('@') {
            return;
        }
        parent.push('/');
        parent.push_str(name);
    }
}
