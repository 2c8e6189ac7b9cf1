//! Create and update validation for resource slices.
//!
//! Every check appends to one ordered [`ErrorList`]. The only short-circuits
//! are structural: an absent pool skips the pool field checks, and a device
//! with no content skips the body checks.

use crate::cycles::{cycle_errors, find_cycles};
use crate::graph::ReferenceGraph;
use crate::meta::{validate_immutable_field, BasicMetaValidator, MetaValidator};
use crate::mixin::MixinTable;
use devslice_schema::limits::{
    DEVICE_ATTRIBUTE_MAX_VALUE_LENGTH, MAX_ATTRIBUTES_AND_CAPACITIES_PER_DEVICE,
    MAX_CONSUMES_CAPACITY_FROM, MAX_COUNTERS_PER_COUNTER_SET, MAX_COUNTER_CONSUMPTIONS_PER_DEVICE,
    MAX_DEVICES_AND_MIXINS, MAX_MIXIN_REFERENCES, MAX_SHARED_COUNTERS,
};
use devslice_schema::names::{
    is_semver, validate_c_identifier, validate_dns_label, validate_dns_subdomain,
    validate_driver_name, validate_label_key, validate_label_value, validate_pool_name,
    validate_qualified_name,
};
use devslice_schema::quantity::QUANTITY_FORMAT_MESSAGE;
use devslice_schema::{
    AttributeMap, CapacityMap, CounterMap, DeviceAttribute, DeviceBody, DeviceContent,
    DeviceCounterConsumption, ErrorList, FieldError, FieldPath, MixinRef, NodeSelection,
    NodeSelector, NodeSelectorOperator, NodeSelectorRequirement, Quantity, ResourcePool,
    ResourceSlice, ResourceSliceMixins, ResourceSliceSpec,
};
use std::collections::BTreeSet;
use tracing::debug;

const NODE_SELECTION_REQUIRED: &str =
    "exactly one of `nodeName`, `nodeSelector`, or `allNodes` is required";
const DEVICE_KIND_REQUIRED: &str = "exactly one of `basic`, or `composite` is required";
const EXACTLY_ONE_VALUE: &str = "exactly one value must be specified";
const UNKNOWN_MIXIN: &str = "must be the name of a mixin in the resource slice";
const UNKNOWN_DEVICE: &str = "must be the name of a device in the resource slice";
const UNKNOWN_COUNTER_SET: &str = "must be the name of a counter set in the resource slice";

/// Validates slices against naming rules, structural limits, references and
/// the capacity reference graph. Metadata is delegated to a [`MetaValidator`].
pub struct SliceValidator<'m> {
    meta: &'m dyn MetaValidator,
}

impl<'m> SliceValidator<'m> {
    pub fn new(meta: &'m dyn MetaValidator) -> Self {
        Self { meta }
    }

    pub fn validate_create(&self, slice: &ResourceSlice) -> ErrorList {
        let mut errs = self
            .meta
            .validate_create(&slice.metadata, &FieldPath::root("metadata"));
        errs.extend(validate_spec(&slice.spec, &FieldPath::root("spec")));
        debug!(
            "validated slice '{}' for create: {} error(s)",
            slice.metadata.name,
            errs.len()
        );
        errs
    }

    /// Create-time checks on `new`, plus immutability of driver, pool name and
    /// node selection relative to `old`.
    pub fn validate_update(&self, new: &ResourceSlice, old: &ResourceSlice) -> ErrorList {
        let mut errs = self.meta.validate_update(
            &new.metadata,
            &old.metadata,
            &FieldPath::root("metadata"),
        );
        let spec_path = FieldPath::root("spec");
        errs.extend(validate_spec(&new.spec, &spec_path));
        errs.extend(validate_spec_update(&new.spec, &old.spec, &spec_path));
        debug!(
            "validated slice '{}' for update: {} error(s)",
            new.metadata.name,
            errs.len()
        );
        errs
    }
}

/// Validate a new slice with the default metadata rules.
pub fn validate_create(slice: &ResourceSlice) -> ErrorList {
    SliceValidator::new(&BasicMetaValidator).validate_create(slice)
}

/// Validate an update with the default metadata rules.
pub fn validate_update(new: &ResourceSlice, old: &ResourceSlice) -> ErrorList {
    SliceValidator::new(&BasicMetaValidator).validate_update(new, old)
}

fn validate_spec_update(
    new: &ResourceSliceSpec,
    old: &ResourceSliceSpec,
    path: &FieldPath,
) -> ErrorList {
    let mut errs = validate_immutable_field(&new.driver, &old.driver, &path.child("driver"));
    errs.extend(validate_immutable_field(
        &new.pool.as_ref().map(|p| p.name.as_str()),
        &old.pool.as_ref().map(|p| p.name.as_str()),
        &path.child("pool").child("name"),
    ));
    errs.extend(validate_immutable_field(
        &new.node_name.as_deref().filter(|n| !n.is_empty()),
        &old.node_name.as_deref().filter(|n| !n.is_empty()),
        &path.child("nodeName"),
    ));
    errs.extend(validate_immutable_field(
        &new.node_selector,
        &old.node_selector,
        &path.child("nodeSelector"),
    ));
    errs.extend(validate_immutable_field(
        &new.all_nodes,
        &old.all_nodes,
        &path.child("allNodes"),
    ));
    errs
}

fn validate_spec(spec: &ResourceSliceSpec, path: &FieldPath) -> ErrorList {
    let mut checker = SpecChecker::new(spec);

    match &spec.pool {
        Some(pool) => checker.pool(pool, &path.child("pool")),
        None => checker.push(FieldError::required(&path.child("pool"), "")),
    }

    checker.node_selection(spec, path);

    checker.extend(validate_driver_name(&spec.driver, &path.child("driver")));

    let total = spec.devices_and_mixins();
    if total > MAX_DEVICES_AND_MIXINS {
        checker.push(FieldError::invalid(
            path,
            total,
            format!("the total number of devices and mixins must not exceed {MAX_DEVICES_AND_MIXINS}"),
        ));
    }

    checker.devices(spec, &path.child("devices"));
    checker.shared_counters(spec, &path.child("sharedCounters"));
    if let Some(mixins) = &spec.mixins {
        checker.mixins(mixins, &path.child("mixins"));
    }

    let graph = ReferenceGraph::build(&spec.devices);
    let cycles = find_cycles(&graph);
    if !cycles.is_empty() {
        debug!("found {} capacity reference cycle(s)", cycles.len());
    }
    checker.extend(cycle_errors(&cycles, &path.child("devices")));

    checker.errs
}

/// Accumulates errors while walking one spec, with name lookups for references.
struct SpecChecker<'a> {
    table: MixinTable<'a>,
    device_names: BTreeSet<&'a str>,
    counter_set_names: BTreeSet<&'a str>,
    errs: ErrorList,
}

impl<'a> SpecChecker<'a> {
    fn new(spec: &'a ResourceSliceSpec) -> Self {
        Self {
            table: MixinTable::new(spec.mixins.as_ref()),
            device_names: spec.devices.iter().map(|d| d.name.as_str()).collect(),
            counter_set_names: spec
                .shared_counters
                .iter()
                .map(|s| s.name.as_str())
                .collect(),
            errs: ErrorList::new(),
        }
    }

    fn push(&mut self, err: FieldError) {
        self.errs.push(err);
    }

    fn extend(&mut self, errs: ErrorList) {
        self.errs.extend(errs);
    }

    fn pool(&mut self, pool: &ResourcePool, path: &FieldPath) {
        self.extend(validate_pool_name(&pool.name, &path.child("name")));
        if pool.resource_slice_count <= 0 {
            self.push(FieldError::invalid(
                &path.child("resourceSliceCount"),
                pool.resource_slice_count,
                "must be greater than zero",
            ));
        }
        if pool.generation < 0 {
            self.push(FieldError::invalid(
                &path.child("generation"),
                pool.generation,
                "must be greater than or equal to zero",
            ));
        }
    }

    fn node_selection(&mut self, spec: &ResourceSliceSpec, path: &FieldPath) {
        if let Some(name) = spec.node_name.as_deref().filter(|n| !n.is_empty()) {
            self.extend(validate_dns_subdomain(name, &path.child("nodeName")));
        }
        if let Some(selector) = &spec.node_selector {
            self.node_selector(selector, &path.child("nodeSelector"));
        }
        match spec.node_selection() {
            NodeSelection::Unset => self.push(FieldError::required(path, NODE_SELECTION_REQUIRED)),
            NodeSelection::Multiple(_) => self.push(FieldError::invalid(
                path,
                serde_json::Value::Null,
                NODE_SELECTION_REQUIRED,
            )),
            NodeSelection::NodeName(_)
            | NodeSelection::NodeSelector(_)
            | NodeSelection::AllNodes => {}
        }
    }

    fn node_selector(&mut self, selector: &NodeSelector, path: &FieldPath) {
        let terms_path = path.child("nodeSelectorTerms");
        let terms = &selector.node_selector_terms;
        if terms.is_empty() {
            self.push(FieldError::required(
                &terms_path,
                "must have at least one node selector term",
            ));
        }
        for (i, term) in terms.iter().enumerate() {
            let term_path = terms_path.index(i);
            for (j, req) in term.match_expressions.iter().enumerate() {
                self.match_expression(req, &term_path.child("matchExpressions").index(j));
            }
            for (j, req) in term.match_fields.iter().enumerate() {
                self.match_field(req, &term_path.child("matchFields").index(j));
            }
        }
        if terms.len() != 1 {
            self.push(FieldError::invalid(
                &terms_path,
                serde_json::to_value(terms).unwrap_or_default(),
                "must have exactly one node selector term",
            ));
        }
    }

    fn match_expression(&mut self, req: &NodeSelectorRequirement, path: &FieldPath) {
        self.extend(validate_label_key(&req.key, &path.child("key")));
        let values_path = path.child("values");
        match req.operator {
            NodeSelectorOperator::In | NodeSelectorOperator::NotIn => {
                if req.values.is_empty() {
                    self.push(FieldError::required(
                        &values_path,
                        "must be specified when `operator` is 'In' or 'NotIn'",
                    ));
                }
            }
            NodeSelectorOperator::Exists | NodeSelectorOperator::DoesNotExist => {
                if !req.values.is_empty() {
                    self.push(FieldError::forbidden(
                        &values_path,
                        "may not be specified when `operator` is 'Exists' or 'DoesNotExist'",
                    ));
                }
            }
            NodeSelectorOperator::Gt | NodeSelectorOperator::Lt => {
                if req.values.len() != 1 {
                    self.push(FieldError::required(
                        &values_path,
                        "must be specified single value when `operator` is 'Lt' or 'Gt'",
                    ));
                }
            }
        }
        for (k, value) in req.values.iter().enumerate() {
            self.extend(validate_label_value(value, &values_path.index(k)));
        }
    }

    fn match_field(&mut self, req: &NodeSelectorRequirement, path: &FieldPath) {
        if req.key != "metadata.name" {
            self.push(FieldError::invalid(
                &path.child("key"),
                req.key.as_str(),
                "not a valid field selector key",
            ));
        }
        if !matches!(
            req.operator,
            NodeSelectorOperator::In | NodeSelectorOperator::NotIn
        ) {
            self.push(FieldError::invalid(
                &path.child("operator"),
                serde_json::to_value(req.operator).unwrap_or_default(),
                "not a valid selector operator",
            ));
        }
        let values_path = path.child("values");
        if req.values.len() != 1 {
            self.push(FieldError::required(
                &values_path,
                "must be only one value when `operator` is 'In' or 'NotIn' for node field selector",
            ));
        }
        for (k, value) in req.values.iter().enumerate() {
            self.extend(validate_dns_subdomain(value, &values_path.index(k)));
        }
    }

    fn devices(&mut self, spec: &ResourceSliceSpec, path: &FieldPath) {
        let mut seen = BTreeSet::new();
        for (i, device) in spec.devices.iter().enumerate() {
            let device_path = path.index(i);
            let name_path = device_path.child("name");
            self.extend(validate_dns_label(&device.name, &name_path));
            if !seen.insert(device.name.as_str()) {
                self.push(FieldError::duplicate(&name_path, device.name.as_str()));
            }

            match device.content() {
                DeviceContent::Unset => {
                    self.push(FieldError::required(&device_path, DEVICE_KIND_REQUIRED));
                }
                DeviceContent::Ambiguous => self.push(FieldError::invalid(
                    &device_path,
                    serde_json::Value::Null,
                    DEVICE_KIND_REQUIRED,
                )),
                DeviceContent::Basic(_) | DeviceContent::Composite(_) => {}
            }

            for body in device.bodies() {
                self.device_body(&body, &device_path.child(body.kind));
            }
        }
    }

    fn device_body(&mut self, body: &DeviceBody<'_>, path: &FieldPath) {
        self.attributes_and_capacity(body.attributes, body.capacity, path);

        let table = &self.table;
        let known: Vec<bool> = body
            .includes
            .iter()
            .map(|r| table.device_mixin(&r.name).is_some())
            .collect();
        self.includes(body.includes, &known, &path.child("includes"));

        let consumes_path = path.child("consumesCounters");
        if body.consumes_counters.len() > MAX_COUNTER_CONSUMPTIONS_PER_DEVICE {
            self.push(FieldError::too_many(
                &consumes_path,
                body.consumes_counters.len(),
                MAX_COUNTER_CONSUMPTIONS_PER_DEVICE,
            ));
        }
        for (j, consumption) in body.consumes_counters.iter().enumerate() {
            self.counter_consumption(consumption, &consumes_path.index(j));
        }

        let from_path = path.child("consumesCapacityFrom");
        if body.consumes_capacity_from.len() > MAX_CONSUMES_CAPACITY_FROM {
            self.push(FieldError::too_many(
                &from_path,
                body.consumes_capacity_from.len(),
                MAX_CONSUMES_CAPACITY_FROM,
            ));
        }
        for (j, reference) in body.consumes_capacity_from.iter().enumerate() {
            let ref_path = from_path.index(j);
            self.extend(validate_dns_label(&reference.name, &ref_path.child("name")));
            if !self.device_names.contains(reference.name.as_str()) {
                self.push(FieldError::invalid(
                    &ref_path,
                    reference.name.as_str(),
                    UNKNOWN_DEVICE,
                ));
            }
        }
    }

    /// Shared by device bodies and device mixins.
    fn attributes_and_capacity(
        &mut self,
        attributes: Option<&AttributeMap>,
        capacity: Option<&CapacityMap>,
        path: &FieldPath,
    ) {
        let attributes_path = path.child("attributes");
        for (key, attribute) in attributes.into_iter().flatten() {
            let attr_path = attributes_path.key(key.as_str());
            self.extend(validate_qualified_name(key, &attr_path));
            self.attribute(attribute, &attr_path);
        }

        let capacity_path = path.child("capacity");
        for (key, cap) in capacity.into_iter().flatten() {
            let cap_path = capacity_path.key(key.as_str());
            self.extend(validate_qualified_name(key, &cap_path));
            self.quantity(&cap.value, &cap_path.child("value"));
        }

        let count = attributes.map_or(0, AttributeMap::len) + capacity.map_or(0, CapacityMap::len);
        if count > MAX_ATTRIBUTES_AND_CAPACITIES_PER_DEVICE {
            self.push(FieldError::invalid(
                path,
                count,
                format!(
                    "the total number of attributes and capacities must not exceed {MAX_ATTRIBUTES_AND_CAPACITIES_PER_DEVICE}"
                ),
            ));
        }
    }

    fn attribute(&mut self, attribute: &DeviceAttribute, path: &FieldPath) {
        match attribute.value_count() {
            0 => self.push(FieldError::required(path, EXACTLY_ONE_VALUE)),
            1 => {}
            _ => self.push(FieldError::invalid(
                path,
                serde_json::to_value(attribute).unwrap_or_default(),
                EXACTLY_ONE_VALUE,
            )),
        }

        if let Some(s) = &attribute.string {
            if s.len() > DEVICE_ATTRIBUTE_MAX_VALUE_LENGTH {
                self.push(FieldError::too_long(
                    &path.child("string"),
                    s.as_str(),
                    DEVICE_ATTRIBUTE_MAX_VALUE_LENGTH,
                ));
            }
        }
        if let Some(v) = &attribute.version {
            let version_path = path.child("version");
            if !is_semver(v) {
                self.push(FieldError::invalid(
                    &version_path,
                    v.as_str(),
                    "must be a string compatible with semver.org spec 2.0.0",
                ));
            }
            if v.len() > DEVICE_ATTRIBUTE_MAX_VALUE_LENGTH {
                self.push(FieldError::too_long(
                    &version_path,
                    v.as_str(),
                    DEVICE_ATTRIBUTE_MAX_VALUE_LENGTH,
                ));
            }
        }
    }

    fn quantity(&mut self, quantity: &Quantity, path: &FieldPath) {
        match quantity.parse() {
            Err(_) => self.push(FieldError::invalid(
                path,
                quantity.as_str(),
                QUANTITY_FORMAT_MESSAGE,
            )),
            Ok(parsed) if parsed.is_negative() => self.push(FieldError::invalid(
                path,
                quantity.as_str(),
                "must be greater than or equal to 0",
            )),
            Ok(_) => {}
        }
    }

    fn counters(&mut self, counters: Option<&CounterMap>, path: &FieldPath) {
        let Some(counters) = counters else {
            return;
        };
        if counters.len() > MAX_COUNTERS_PER_COUNTER_SET {
            self.push(FieldError::too_many(
                path,
                counters.len(),
                MAX_COUNTERS_PER_COUNTER_SET,
            ));
        }
        for (name, counter) in counters {
            let counter_path = path.key(name.as_str());
            self.extend(validate_c_identifier(name, &counter_path));
            self.quantity(&counter.value, &counter_path.child("value"));
        }
    }

    /// `known[j]` says whether `includes[j]` names a mixin of the right kind.
    fn includes(&mut self, includes: &[MixinRef], known: &[bool], path: &FieldPath) {
        if includes.len() > MAX_MIXIN_REFERENCES {
            self.push(FieldError::too_many(
                path,
                includes.len(),
                MAX_MIXIN_REFERENCES,
            ));
        }
        for (j, (reference, &found)) in includes.iter().zip(known).enumerate() {
            let ref_path = path.index(j);
            self.extend(validate_dns_label(&reference.name, &ref_path.child("name")));
            if !found {
                self.push(FieldError::invalid(
                    &ref_path,
                    reference.name.as_str(),
                    UNKNOWN_MIXIN,
                ));
            }
        }
    }

    fn counter_consumption(&mut self, consumption: &DeviceCounterConsumption, path: &FieldPath) {
        let set_path = path.child("counterSet");
        self.extend(validate_dns_label(&consumption.counter_set, &set_path));
        if !self
            .counter_set_names
            .contains(consumption.counter_set.as_str())
        {
            self.push(FieldError::invalid(
                &set_path,
                consumption.counter_set.as_str(),
                UNKNOWN_COUNTER_SET,
            ));
        }
        self.counters(consumption.counters.as_ref(), &path.child("counters"));

        let table = &self.table;
        let known: Vec<bool> = consumption
            .includes
            .iter()
            .map(|r| table.counter_consumption_mixin(&r.name).is_some())
            .collect();
        self.includes(&consumption.includes, &known, &path.child("includes"));
    }

    fn shared_counters(&mut self, spec: &ResourceSliceSpec, path: &FieldPath) {
        if spec.shared_counters.len() > MAX_SHARED_COUNTERS {
            self.push(FieldError::too_many(
                path,
                spec.shared_counters.len(),
                MAX_SHARED_COUNTERS,
            ));
        }
        let mut seen = BTreeSet::new();
        for (i, set) in spec.shared_counters.iter().enumerate() {
            let set_path = path.index(i);
            let name_path = set_path.child("name");
            self.extend(validate_dns_label(&set.name, &name_path));
            if !seen.insert(set.name.as_str()) {
                self.push(FieldError::duplicate(&name_path, set.name.as_str()));
            }
            self.counters(set.counters.as_ref(), &set_path.child("counters"));

            let table = &self.table;
            let known: Vec<bool> = set
                .includes
                .iter()
                .map(|r| table.counter_set_mixin(&r.name).is_some())
                .collect();
            self.includes(&set.includes, &known, &set_path.child("includes"));
        }
    }

    /// Mixin names are unique across every mixin kind.
    fn mixins(&mut self, mixins: &ResourceSliceMixins, path: &FieldPath) {
        let mut seen = BTreeSet::new();
        let mut check_name = |checker: &mut Self, name: &str, name_path: FieldPath| {
            checker.extend(validate_dns_label(name, &name_path));
            if !seen.insert(name.to_owned()) {
                checker.push(FieldError::duplicate(&name_path, name));
            }
        };

        for (i, mixin) in mixins.device.iter().enumerate() {
            let mixin_path = path.child("device").index(i);
            check_name(self, &mixin.name, mixin_path.child("name"));
            self.attributes_and_capacity(
                mixin.attributes.as_ref(),
                mixin.capacity.as_ref(),
                &mixin_path,
            );
        }
        for (i, mixin) in mixins.counter_set.iter().enumerate() {
            let mixin_path = path.child("counterSet").index(i);
            check_name(self, &mixin.name, mixin_path.child("name"));
            self.counters(mixin.counters.as_ref(), &mixin_path.child("counters"));
        }
        for (i, mixin) in mixins.device_counter_consumption.iter().enumerate() {
            let mixin_path = path.child("deviceCounterConsumption").index(i);
            check_name(self, &mixin.name, mixin_path.child("name"));
            self.counters(mixin.counters.as_ref(), &mixin_path.child("counters"));
        }
    }
}
