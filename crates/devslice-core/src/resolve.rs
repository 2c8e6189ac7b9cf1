//! Flattening a slice into its mixin-free form.

use crate::cycles::{cycle_errors, find_cycles};
use crate::graph::ReferenceGraph;
use crate::mixin::MixinTable;
use crate::CoreError;
use devslice_schema::{
    ErrorList, FieldPath, ResolvedSlice, ResolvedSliceSpec, ResourceSlice, ResourceSliceMixins,
    ValidationError,
};
use tracing::{debug, info};

/// Expand every `includes` list and drop the mixins.
///
/// Unknown mixin references are skipped and no validation is performed; the
/// input is left untouched.
pub fn resolve(slice: &ResourceSlice) -> ResolvedSlice {
    let spec = &slice.spec;
    let table = MixinTable::new(spec.mixins.as_ref());

    let devices = spec
        .devices
        .iter()
        .map(|d| table.resolve_device(d))
        .collect::<Vec<_>>();
    let shared_counters = spec
        .shared_counters
        .iter()
        .map(|s| table.resolve_counter_set(s))
        .collect::<Vec<_>>();

    debug!(
        "resolved {} device(s), {} counter set(s), dropped {} mixin(s)",
        devices.len(),
        shared_counters.len(),
        spec.mixins.as_ref().map_or(0, ResourceSliceMixins::len)
    );

    ResolvedSlice {
        api_version: slice.api_version.clone(),
        kind: slice.kind.clone(),
        metadata: slice.metadata.clone(),
        spec: ResolvedSliceSpec {
            driver: spec.driver.clone(),
            pool: spec.pool.clone(),
            node_name: spec.node_name.clone(),
            node_selector: spec.node_selector.clone(),
            all_nodes: spec.all_nodes,
            devices,
            shared_counters,
        },
    }
}

/// Cycle check on an already resolved slice.
pub fn verify_resolved(resolved: &ResolvedSlice) -> ErrorList {
    let graph = ReferenceGraph::build(&resolved.spec.devices);
    cycle_errors(&find_cycles(&graph), &FieldPath::new(["spec", "devices"]))
}

/// [`resolve`], rejecting results whose capacity references form a cycle.
pub fn resolve_checked(slice: &ResourceSlice) -> Result<ResolvedSlice, CoreError> {
    let resolved = resolve(slice);
    let errs = verify_resolved(&resolved);
    if !errs.is_empty() {
        return Err(ValidationError(errs).into());
    }
    info!(
        "resolved slice '{}' with {} device(s)",
        resolved.metadata.name,
        resolved.spec.devices.len()
    );
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use devslice_schema::{
        AttributeMap, BasicDevice, CompositeDevice, Counter, CounterMap, CounterSet,
        CounterSetMixin, Device, DeviceAttribute, DeviceCounterConsumption,
        DeviceCounterConsumptionMixin, DeviceMixin, DeviceRef, MixinRef, QualifiedName,
        ResourceSliceSpec,
    };

    fn attrs(pairs: &[(&str, &str)]) -> AttributeMap {
        pairs
            .iter()
            .map(|(k, v)| (QualifiedName::new(*k), DeviceAttribute::string(*v)))
            .collect()
    }

    fn counters(pairs: &[(&str, &str)]) -> CounterMap {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), Counter::new(*v)))
            .collect()
    }

    fn slice_with(devices: Vec<Device>, mixins: ResourceSliceMixins) -> ResourceSlice {
        ResourceSlice {
            spec: ResourceSliceSpec {
                driver: "gpu.example.com".to_owned(),
                all_nodes: true,
                devices,
                mixins: Some(mixins),
                ..ResourceSliceSpec::default()
            },
            ..ResourceSlice::default()
        }
    }

    #[test]
    fn resolves_devices_and_counter_sets() {
        let mut s = slice_with(
            vec![Device::basic(
                "gpu-0",
                BasicDevice {
                    attributes: Some(attrs(&[("model", "a100")])),
                    includes: vec![MixinRef::new("common")],
                    consumes_counters: vec![DeviceCounterConsumption {
                        counter_set: "gpu-0-counters".to_owned(),
                        counters: None,
                        includes: vec![MixinRef::new("half")],
                    }],
                    ..BasicDevice::default()
                },
            )],
            ResourceSliceMixins {
                device: vec![DeviceMixin {
                    name: "common".to_owned(),
                    attributes: Some(attrs(&[("vendor", "acme"), ("model", "generic")])),
                    capacity: None,
                }],
                counter_set: vec![CounterSetMixin {
                    name: "mem".to_owned(),
                    counters: Some(counters(&[("memory", "80Gi")])),
                }],
                device_counter_consumption: vec![DeviceCounterConsumptionMixin {
                    name: "half".to_owned(),
                    counters: Some(counters(&[("memory", "40Gi")])),
                }],
            },
        );
        s.spec.shared_counters = vec![CounterSet {
            name: "gpu-0-counters".to_owned(),
            counters: None,
            includes: vec![MixinRef::new("mem")],
        }];

        let resolved = resolve(&s);
        let content = resolved.spec.devices[0].content.as_ref().unwrap();
        assert_eq!(
            content.attributes.as_ref().unwrap(),
            &attrs(&[("model", "a100"), ("vendor", "acme")])
        );
        assert_eq!(
            content.consumes_counters[0].counters.as_ref().unwrap(),
            &counters(&[("memory", "40Gi")])
        );
        assert_eq!(
            resolved.spec.shared_counters[0].counters.as_ref().unwrap(),
            &counters(&[("memory", "80Gi")])
        );
        assert_eq!(resolved.spec.driver, "gpu.example.com");
        assert!(resolved.spec.all_nodes);
    }

    #[test]
    fn rendered_output_has_no_mixins_or_includes() {
        let s = slice_with(
            vec![Device::basic(
                "gpu-0",
                BasicDevice {
                    includes: vec![MixinRef::new("common")],
                    ..BasicDevice::default()
                },
            )],
            ResourceSliceMixins {
                device: vec![DeviceMixin {
                    name: "common".to_owned(),
                    attributes: Some(attrs(&[("vendor", "acme")])),
                    capacity: None,
                }],
                ..ResourceSliceMixins::default()
            },
        );
        let json = resolve(&s).canonical_json().unwrap();
        assert!(!json.contains("mixins"));
        assert!(!json.contains("includes"));
        assert!(json.contains("acme"));
    }

    #[test]
    fn resolution_is_deterministic() {
        let s = slice_with(
            vec![Device::basic("gpu-0", BasicDevice::default())],
            ResourceSliceMixins::default(),
        );
        assert_eq!(resolve(&s).digest().unwrap(), resolve(&s).digest().unwrap());
    }

    #[test]
    fn checked_resolution_rejects_cycles() {
        let s = slice_with(
            vec![
                Device::composite(
                    "a",
                    CompositeDevice {
                        consumes_capacity_from: vec![DeviceRef::new("b")],
                        ..CompositeDevice::default()
                    },
                ),
                Device::composite(
                    "b",
                    CompositeDevice {
                        consumes_capacity_from: vec![DeviceRef::new("a")],
                        ..CompositeDevice::default()
                    },
                ),
            ],
            ResourceSliceMixins::default(),
        );
        match resolve_checked(&s) {
            Err(CoreError::Invalid(err)) => {
                assert_eq!(err.errors().len(), 1);
                assert!(err.errors()[0].detail.ends_with("a -> b -> a"));
            }
            other => panic!("expected a cycle error, got {other:?}"),
        }
    }

    #[test]
    fn checked_resolution_passes_acyclic() {
        let s = slice_with(
            vec![
                Device::composite("a", CompositeDevice::default()),
                Device::composite(
                    "b",
                    CompositeDevice {
                        consumes_capacity_from: vec![DeviceRef::new("a")],
                        ..CompositeDevice::default()
                    },
                ),
            ],
            ResourceSliceMixins::default(),
        );
        let resolved = resolve_checked(&s).unwrap();
        assert_eq!(
            resolved.spec.devices[1]
                .content
                .as_ref()
                .unwrap()
                .consumes_capacity_from,
            vec!["a".to_owned()]
        );
    }
}
