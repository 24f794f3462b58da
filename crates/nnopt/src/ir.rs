//! Backend-agnostic graph description consumed by the optimizer.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Domain string used by standard ONNX operators.
pub const ONNX_DOMAIN: &str = "";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Identity of a tensor (graph edge). Also the key of the quantization table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EdgeId(pub u32);

impl EdgeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Operator identity: domain, type name and opset version.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OpType {
    pub domain: String,
    pub name: String,
    pub version: u64,
}

impl OpType {
    pub fn onnx(name: impl Into<String>, version: u64) -> Self {
        Self {
            domain: ONNX_DOMAIN.to_string(),
            name: name.into(),
            version,
        }
    }
}

impl fmt::Display for OpType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.domain.is_empty() {
            write!(f, "{}-{}", self.name, self.version)
        } else {
            write!(f, "{}:{}-{}", self.domain, self.name, self.version)
        }
    }
}

/// One operator instance. Immutable once added to a [`Graph`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub id: NodeId,
    pub name: String,
    pub op_type: OpType,
    pub inputs: Vec<EdgeId>,
    pub outputs: Vec<EdgeId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttrValue {
    Int(i64),
    Ints(Vec<i64>),
    Float(f32),
    Floats(Vec<f32>),
    Str(String),
}

impl AttrValue {
    fn kind(&self) -> &'static str {
        match self {
            AttrValue::Int(_) => "int",
            AttrValue::Ints(_) => "ints",
            AttrValue::Float(_) => "float",
            AttrValue::Floats(_) => "floats",
            AttrValue::Str(_) => "string",
        }
    }
}

/// Attribute list of a node, as parsed from the model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Attributes {
    values: BTreeMap<String, AttrValue>,
}

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: AttrValue) -> Self {
        self.values.insert(name.into(), value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&AttrValue> {
        self.values.get(name)
    }

    /// Reads an integer attribute. `Ok(None)` when absent, `Err` when present with another kind.
    pub fn int(&self, name: &str) -> Result<Option<i64>, String> {
        match self.values.get(name) {
            None => Ok(None),
            Some(AttrValue::Int(value)) => Ok(Some(*value)),
            Some(other) => Err(format!(
                "attribute '{name}' must be an int, found {}",
                other.kind()
            )),
        }
    }

    pub fn int_or(&self, name: &str, default: i64) -> Result<i64, String> {
        Ok(self.int(name)?.unwrap_or(default))
    }
}

/// Nodes in topological order plus their attribute lists.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    nodes: Vec<Arc<Node>>,
    attributes: HashMap<NodeId, Attributes>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(
        &mut self,
        name: impl Into<String>,
        op_type: OpType,
        inputs: Vec<EdgeId>,
        outputs: Vec<EdgeId>,
        attributes: Attributes,
    ) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Arc::new(Node {
            id,
            name: name.into(),
            op_type,
            inputs,
            outputs,
        }));
        self.attributes.insert(id, attributes);
        id
    }

    pub fn nodes(&self) -> &[Arc<Node>] {
        &self.nodes
    }

    pub fn node(&self, id: NodeId) -> Option<&Arc<Node>> {
        self.nodes.get(id.0 as usize)
    }

    pub fn attributes(&self, id: NodeId) -> Option<&Attributes> {
        self.attributes.get(&id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int_attribute_kind_mismatch_is_reported() {
        let attrs = Attributes::new()
            .with("axis", AttrValue::Int(-1))
            .with("mode", AttrValue::Str("fast".to_string()));
        assert_eq!(attrs.int("axis"), Ok(Some(-1)));
        assert_eq!(attrs.int("missing"), Ok(None));
        assert_eq!(attrs.int_or("missing", 3), Ok(3));
        let err = attrs.int("mode").expect_err("string is not an int");
        assert!(err.contains("found string"), "{err}");
    }

    #[test]
    fn op_type_display_omits_default_domain() {
        assert_eq!(OpType::onnx("TopK", 11).to_string(), "TopK-11");
        let custom = OpType {
            domain: "pmx".to_string(),
            name: "Shape".to_string(),
            version: 1,
        };
        assert_eq!(custom.to_string(), "pmx:Shape-1");
    }
}
