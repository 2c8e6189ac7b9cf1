use crate::quantity::Quantity;
use crate::types::QualifiedName;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SliceError {
    #[error("failed to read resource slice file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse resource slice JSON: {0}")]
    ParseJson(#[from] serde_json::Error),
    #[error("failed to parse resource slice TOML: {0}")]
    ParseToml(#[from] toml::de::Error),
    #[error("failed to render resource slice TOML: {0}")]
    SerializeToml(#[from] toml::ser::Error),
    #[error("unsupported document format: '{0}', expected 'json' or 'toml'")]
    UnsupportedFormat(String),
}

pub type AttributeMap = BTreeMap<QualifiedName, DeviceAttribute>;
pub type CapacityMap = BTreeMap<QualifiedName, DeviceCapacity>;
pub type CounterMap = BTreeMap<String, Counter>;

fn is_false(b: &bool) -> bool {
    !*b
}

fn is_zero(n: &i64) -> bool {
    *n == 0
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ResourceSlice {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default)]
    pub metadata: ObjectMeta,
    pub spec: ResourceSliceSpec,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ObjectMeta {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generate_name: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_version: Option<String>,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub generation: i64,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ResourceSliceSpec {
    #[serde(default)]
    pub driver: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pool: Option<ResourcePool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_selector: Option<NodeSelector>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub all_nodes: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub devices: Vec<Device>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub shared_counters: Vec<CounterSet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mixins: Option<ResourceSliceMixins>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ResourcePool {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub generation: i64,
    #[serde(default)]
    pub resource_slice_count: i64,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NodeSelector {
    #[serde(default)]
    pub node_selector_terms: Vec<NodeSelectorTerm>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NodeSelectorTerm {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub match_expressions: Vec<NodeSelectorRequirement>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub match_fields: Vec<NodeSelectorRequirement>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NodeSelectorRequirement {
    pub key: String,
    pub operator: NodeSelectorOperator,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<String>,
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
pub enum NodeSelectorOperator {
    In,
    NotIn,
    Exists,
    DoesNotExist,
    Gt,
    Lt,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Device {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub basic: Option<BasicDevice>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub composite: Option<CompositeDevice>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct BasicDevice {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<AttributeMap>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capacity: Option<CapacityMap>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub includes: Vec<MixinRef>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub consumes_counters: Vec<DeviceCounterConsumption>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CompositeDevice {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<AttributeMap>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capacity: Option<CapacityMap>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub includes: Vec<MixinRef>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub consumes_counters: Vec<DeviceCounterConsumption>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub consumes_capacity_from: Vec<DeviceRef>,
}

/// Scalar attribute value. Exactly one field must be set.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct DeviceAttribute {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub int: Option<i64>,
    #[serde(rename = "bool", default, skip_serializing_if = "Option::is_none")]
    pub boolean: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub string: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl DeviceAttribute {
    pub fn int(v: i64) -> Self {
        Self {
            int: Some(v),
            ..Self::default()
        }
    }

    pub fn boolean(v: bool) -> Self {
        Self {
            boolean: Some(v),
            ..Self::default()
        }
    }

    pub fn string(v: impl Into<String>) -> Self {
        Self {
            string: Some(v.into()),
            ..Self::default()
        }
    }

    pub fn version(v: impl Into<String>) -> Self {
        Self {
            version: Some(v.into()),
            ..Self::default()
        }
    }

    /// Number of value fields that are set.
    pub fn value_count(&self) -> usize {
        usize::from(self.int.is_some())
            + usize::from(self.boolean.is_some())
            + usize::from(self.string.is_some())
            + usize::from(self.version.is_some())
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct DeviceCapacity {
    pub value: Quantity,
}

impl DeviceCapacity {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: Quantity::new(value),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Counter {
    pub value: Quantity,
}

impl Counter {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: Quantity::new(value),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CounterSet {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub counters: Option<CounterMap>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub includes: Vec<MixinRef>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct DeviceCounterConsumption {
    pub counter_set: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub counters: Option<CounterMap>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub includes: Vec<MixinRef>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ResourceSliceMixins {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub device: Vec<DeviceMixin>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub counter_set: Vec<CounterSetMixin>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub device_counter_consumption: Vec<DeviceCounterConsumptionMixin>,
}

impl ResourceSliceMixins {
    /// Mixins of every kind.
    pub fn len(&self) -> usize {
        self.device.len() + self.counter_set.len() + self.device_counter_consumption.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct DeviceMixin {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<AttributeMap>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capacity: Option<CapacityMap>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CounterSetMixin {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub counters: Option<CounterMap>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct DeviceCounterConsumptionMixin {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub counters: Option<CounterMap>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct MixinRef {
    pub name: String,
}

impl MixinRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct DeviceRef {
    pub name: String,
}

impl DeviceRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Which of the mutually exclusive node-selection fields are populated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeSelection<'a> {
    Unset,
    NodeName(&'a str),
    NodeSelector(&'a NodeSelector),
    AllNodes,
    /// More than one field is set; carries how many.
    Multiple(usize),
}

impl ResourceSliceSpec {
    /// An empty `nodeName` counts as unset.
    pub fn node_selection(&self) -> NodeSelection<'_> {
        let node_name = self.node_name.as_deref().filter(|n| !n.is_empty());
        let set = usize::from(node_name.is_some())
            + usize::from(self.node_selector.is_some())
            + usize::from(self.all_nodes);
        match (set, node_name, &self.node_selector) {
            (0, _, _) => NodeSelection::Unset,
            (1, Some(name), _) => NodeSelection::NodeName(name),
            (1, None, Some(selector)) => NodeSelection::NodeSelector(selector),
            (1, None, None) => NodeSelection::AllNodes,
            (n, _, _) => NodeSelection::Multiple(n),
        }
    }

    /// Devices plus every declared mixin.
    pub fn devices_and_mixins(&self) -> usize {
        self.devices.len() + self.mixins.as_ref().map_or(0, ResourceSliceMixins::len)
    }
}

/// Which content kind a device carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceContent<'a> {
    Unset,
    Basic(&'a BasicDevice),
    Composite(&'a CompositeDevice),
    /// Both kinds are set.
    Ambiguous,
}

/// Kind-independent view over a basic or composite device body.
#[derive(Debug, Clone, Copy)]
pub struct DeviceBody<'a> {
    /// Field name of the kind, `basic` or `composite`.
    pub kind: &'static str,
    pub attributes: Option<&'a AttributeMap>,
    pub capacity: Option<&'a CapacityMap>,
    pub includes: &'a [MixinRef],
    pub consumes_counters: &'a [DeviceCounterConsumption],
    pub consumes_capacity_from: &'a [DeviceRef],
}

impl BasicDevice {
    pub fn body(&self) -> DeviceBody<'_> {
        DeviceBody {
            kind: "basic",
            attributes: self.attributes.as_ref(),
            capacity: self.capacity.as_ref(),
            includes: &self.includes,
            consumes_counters: &self.consumes_counters,
            consumes_capacity_from: &[],
        }
    }
}

impl CompositeDevice {
    pub fn body(&self) -> DeviceBody<'_> {
        DeviceBody {
            kind: "composite",
            attributes: self.attributes.as_ref(),
            capacity: self.capacity.as_ref(),
            includes: &self.includes,
            consumes_counters: &self.consumes_counters,
            consumes_capacity_from: &self.consumes_capacity_from,
        }
    }
}

impl Device {
    pub fn basic(name: impl Into<String>, body: BasicDevice) -> Self {
        Self {
            name: name.into(),
            basic: Some(body),
            composite: None,
        }
    }

    pub fn composite(name: impl Into<String>, body: CompositeDevice) -> Self {
        Self {
            name: name.into(),
            basic: None,
            composite: Some(body),
        }
    }

    pub fn content(&self) -> DeviceContent<'_> {
        match (&self.basic, &self.composite) {
            (None, None) => DeviceContent::Unset,
            (Some(basic), None) => DeviceContent::Basic(basic),
            (None, Some(composite)) => DeviceContent::Composite(composite),
            (Some(_), Some(_)) => DeviceContent::Ambiguous,
        }
    }

    /// The body that resolution uses. Composite takes precedence when both are set.
    pub fn body(&self) -> Option<DeviceBody<'_>> {
        self.composite
            .as_ref()
            .map(CompositeDevice::body)
            .or_else(|| self.basic.as_ref().map(BasicDevice::body))
    }

    /// Every populated body, basic first.
    pub fn bodies(&self) -> impl Iterator<Item = DeviceBody<'_>> {
        self.basic
            .as_ref()
            .map(BasicDevice::body)
            .into_iter()
            .chain(self.composite.as_ref().map(CompositeDevice::body))
    }
}

/// Serialization used for reading and writing slice documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DocumentFormat {
    #[default]
    Json,
    Toml,
}

impl DocumentFormat {
    /// `.toml` files are TOML; everything else is JSON.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => Self::Toml,
            _ => Self::Json,
        }
    }

    pub fn parse(name: &str) -> Result<Self, SliceError> {
        match name.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "toml" => Ok(Self::Toml),
            other => Err(SliceError::UnsupportedFormat(other.to_owned())),
        }
    }
}

pub fn parse_slice_str(input: &str, format: DocumentFormat) -> Result<ResourceSlice, SliceError> {
    match format {
        DocumentFormat::Json => Ok(serde_json::from_str(input)?),
        DocumentFormat::Toml => Ok(toml::from_str(input)?),
    }
}

pub fn parse_slice_file(path: impl AsRef<Path>) -> Result<ResourceSlice, SliceError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)?;
    parse_slice_str(&content, DocumentFormat::from_path(path))
}

/// Render any document type in the requested format.
pub fn render<T: Serialize>(value: &T, format: DocumentFormat) -> Result<String, SliceError> {
    match format {
        DocumentFormat::Json => Ok(serde_json::to_string_pretty(value)?),
        DocumentFormat::Toml => Ok(toml::to_string_pretty(value)?),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SLICE_JSON: &str = r#"{
  "apiVersion": "resource.example.com/v1",
  "kind": "ResourceSlice",
  "metadata": { "name": "worker-gpus" },
  "spec": {
    "driver": "gpu.example.com",
    "pool": { "name": "worker", "resourceSliceCount": 1 },
    "nodeName": "worker",
    "devices": [
      {
        "name": "gpu-0",
        "composite": {
          "includes": [{ "name": "a100" }],
          "attributes": { "index": { "int": 0 } },
          "consumesCapacityFrom": [{ "name": "gpu-1" }]
        }
      },
      {
        "name": "gpu-1",
        "basic": { "capacity": { "memory": { "value": "40Gi" } } }
      }
    ],
    "mixins": {
      "device": [
        { "name": "a100", "attributes": { "model": { "string": "a100" } } }
      ]
    }
  }
}"#;

    #[test]
    fn parses_full_json_document() {
        let slice = parse_slice_str(SLICE_JSON, DocumentFormat::Json).unwrap();
        assert_eq!(slice.metadata.name, "worker-gpus");
        assert_eq!(slice.spec.driver, "gpu.example.com");
        assert_eq!(slice.spec.devices.len(), 2);
        assert_eq!(slice.spec.devices_and_mixins(), 3);

        let gpu0 = &slice.spec.devices[0];
        assert!(matches!(gpu0.content(), DeviceContent::Composite(_)));
        let body = gpu0.body().unwrap();
        assert_eq!(body.kind, "composite");
        assert_eq!(body.includes, &[MixinRef::new("a100")]);
        assert_eq!(body.consumes_capacity_from, &[DeviceRef::new("gpu-1")]);

        let gpu1 = &slice.spec.devices[1];
        let capacity = gpu1.basic.as_ref().unwrap().capacity.as_ref().unwrap();
        assert_eq!(capacity["memory"].value.as_str(), "40Gi");
    }

    #[test]
    fn parses_toml_document() {
        let input = r#"
[metadata]
name = "node-a"

[spec]
driver = "nic.example.com"
allNodes = true

[spec.pool]
name = "pool-a"
resourceSliceCount = 1

[[spec.devices]]
name = "nic-0"

[spec.devices.basic.attributes.speed]
int = 100
"#;
        let slice = parse_slice_str(input, DocumentFormat::Toml).unwrap();
        assert_eq!(slice.spec.node_selection(), NodeSelection::AllNodes);
        let attrs = slice.spec.devices[0]
            .basic
            .as_ref()
            .unwrap()
            .attributes
            .as_ref()
            .unwrap();
        assert_eq!(attrs["speed"], DeviceAttribute::int(100));
    }

    #[test]
    fn rejects_unknown_fields() {
        let input = r#"{ "spec": { "driver": "a", "bogus": true } }"#;
        assert!(parse_slice_str(input, DocumentFormat::Json).is_err());
    }

    #[test]
    fn absent_and_empty_maps_stay_distinct() {
        let input = r#"{ "spec": { "devices": [
            { "name": "a", "basic": {} },
            { "name": "b", "basic": { "attributes": {} } }
        ] } }"#;
        let slice = parse_slice_str(input, DocumentFormat::Json).unwrap();
        assert_eq!(slice.spec.devices[0].basic.as_ref().unwrap().attributes, None);
        assert_eq!(
            slice.spec.devices[1].basic.as_ref().unwrap().attributes,
            Some(BTreeMap::new())
        );
        let out = render(&slice, DocumentFormat::Json).unwrap();
        let back = parse_slice_str(&out, DocumentFormat::Json).unwrap();
        assert_eq!(back, slice);
    }

    #[test]
    fn node_selection_variants() {
        let mut spec = ResourceSliceSpec::default();
        assert_eq!(spec.node_selection(), NodeSelection::Unset);

        spec.node_name = Some(String::new());
        assert_eq!(spec.node_selection(), NodeSelection::Unset);

        spec.node_name = Some("worker".to_owned());
        assert_eq!(spec.node_selection(), NodeSelection::NodeName("worker"));

        spec.all_nodes = true;
        assert_eq!(spec.node_selection(), NodeSelection::Multiple(2));

        spec.node_selector = Some(NodeSelector::default());
        assert_eq!(spec.node_selection(), NodeSelection::Multiple(3));

        spec.node_name = None;
        spec.all_nodes = false;
        assert!(matches!(
            spec.node_selection(),
            NodeSelection::NodeSelector(_)
        ));
    }

    #[test]
    fn device_content_variants() {
        let mut device = Device {
            name: "d".to_owned(),
            ..Device::default()
        };
        assert_eq!(device.content(), DeviceContent::Unset);
        assert!(device.body().is_none());

        device.basic = Some(BasicDevice::default());
        assert!(matches!(device.content(), DeviceContent::Basic(_)));

        device.composite = Some(CompositeDevice::default());
        assert_eq!(device.content(), DeviceContent::Ambiguous);
        assert_eq!(device.body().unwrap().kind, "composite");
        let kinds: Vec<_> = device.bodies().map(|b| b.kind).collect();
        assert_eq!(kinds, vec!["basic", "composite"]);
    }

    #[test]
    fn attribute_value_count() {
        assert_eq!(DeviceAttribute::default().value_count(), 0);
        assert_eq!(DeviceAttribute::string("x").value_count(), 1);
        let both = DeviceAttribute {
            string: Some("x".to_owned()),
            version: Some("1.2.3".to_owned()),
            ..DeviceAttribute::default()
        };
        assert_eq!(both.value_count(), 2);
        assert_eq!(
            serde_json::to_string(&DeviceAttribute::boolean(true)).unwrap(),
            r#"{"bool":true}"#
        );
    }

    #[test]
    fn format_from_path_and_name() {
        assert_eq!(
            DocumentFormat::from_path(Path::new("slice.toml")),
            DocumentFormat::Toml
        );
        assert_eq!(
            DocumentFormat::from_path(Path::new("slice.json")),
            DocumentFormat::Json
        );
        assert_eq!(
            DocumentFormat::from_path(Path::new("slice")),
            DocumentFormat::Json
        );
        assert_eq!(DocumentFormat::parse("TOML").unwrap(), DocumentFormat::Toml);
        assert!(DocumentFormat::parse("yaml").is_err());
    }

    #[test]
    fn parses_file_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("slice.json");
        fs::write(&path, SLICE_JSON).unwrap();
        let slice = parse_slice_file(&path).unwrap();
        assert_eq!(slice.spec.devices.len(), 2);

        let missing = parse_slice_file(dir.path().join("missing.json"));
        assert!(matches!(missing, Err(SliceError::Io(_))));
    }
}
