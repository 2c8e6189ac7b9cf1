//! Flattened resource slices: every mixin reference merged in, no mixins left.

use crate::slice::{AttributeMap, CapacityMap, CounterMap, NodeSelector, ObjectMeta, ResourcePool};
use crate::types::{ShortDigest, SliceDigest};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ResolvedSlice {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default)]
    pub metadata: ObjectMeta,
    pub spec: ResolvedSliceSpec,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ResolvedSliceSpec {
    #[serde(default)]
    pub driver: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pool: Option<ResourcePool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_selector: Option<NodeSelector>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub all_nodes: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub devices: Vec<ResolvedDevice>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub shared_counters: Vec<ResolvedCounterSet>,
}

/// A device after merging. `content` is `None` for a device with no known kind.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ResolvedDevice {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<ResolvedDeviceContent>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ResolvedDeviceContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<AttributeMap>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capacity: Option<CapacityMap>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub consumes_capacity_from: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub consumes_counters: Vec<ResolvedCounterConsumption>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ResolvedCounterSet {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub counters: Option<CounterMap>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ResolvedCounterConsumption {
    pub counter_set: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub counters: Option<CounterMap>,
}

impl ResolvedSlice {
    /// Compact JSON with ordered maps; identical content renders identically.
    pub fn canonical_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Content digest of the canonical form.
    ///
    /// Two slices that flatten to the same devices and counter sets share a
    /// digest, whether or not they used mixins to get there.
    pub fn digest(&self) -> Result<SliceDigest, serde_json::Error> {
        let canonical = self.canonical_json()?;
        let hex = blake3::hash(canonical.as_bytes()).to_hex().to_string();
        Ok(SliceDigest::new(hex))
    }
}

impl SliceDigest {
    pub fn short(&self) -> ShortDigest {
        ShortDigest::new(&self.as_str()[..12.min(self.len())])
    }
}
