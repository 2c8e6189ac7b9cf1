use devslice_core::{
    find_cycles, resolve, resolve_checked, validate_create, validate_update, Config, CoreError,
    FeatureGates, ReferenceGraph, SliceStrategy,
};
use devslice_schema::{
    parse_slice_file, render, CompositeDevice, Device, DeviceRef, DocumentFormat, ErrorKind,
    ResourceSlice,
};
use std::fs;
use std::path::{Path, PathBuf};

fn write_doc(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

fn load(content: &str) -> ResourceSlice {
    let dir = tempfile::tempdir().unwrap();
    parse_slice_file(write_doc(dir.path(), "slice.json", content)).unwrap()
}

const GPU_SLICE: &str = r#"{
  "apiVersion": "resource.k8s.io/v1",
  "kind": "ResourceSlice",
  "metadata": { "name": "worker-gpu" },
  "spec": {
    "driver": "gpu.example.com",
    "pool": { "name": "worker", "generation": 1, "resourceSliceCount": 1 },
    "nodeName": "worker",
    "sharedCounters": [
      { "name": "gpu-0-counters", "counters": { "memory": { "value": "80Gi" } } }
    ],
    "mixins": {
      "device": [
        { "name": "a100", "attributes": { "model": { "string": "a100" }, "vendor": { "string": "acme" } } },
        { "name": "mig", "attributes": { "model": { "string": "a100-mig" }, "partitioned": { "bool": true } } }
      ]
    },
    "devices": [
      { "name": "gpu-0", "composite": {
          "includes": [{ "name": "a100" }],
          "capacity": { "memory": { "value": "80Gi" } },
          "consumesCounters": [
            { "counterSet": "gpu-0-counters", "counters": { "memory": { "value": "80Gi" } } }
          ] } },
      { "name": "gpu-0-mig-0", "composite": {
          "includes": [{ "name": "a100" }, { "name": "mig" }],
          "attributes": { "slice": { "int": 0 } },
          "consumesCapacityFrom": [{ "name": "gpu-0" }] } }
    ]
  }
}"#;

#[test]
fn gpu_document_validates_and_resolves() {
    let slice = load(GPU_SLICE);
    assert!(validate_create(&slice).is_empty());

    let resolved = resolve_checked(&slice).unwrap();
    let mig = resolved.spec.devices[1].content.as_ref().unwrap();
    let attrs = mig.attributes.as_ref().unwrap();
    // Later includes override earlier ones; own fields extend the union.
    assert_eq!(attrs["model"].string.as_deref(), Some("a100-mig"));
    assert_eq!(attrs["vendor"].string.as_deref(), Some("acme"));
    assert_eq!(attrs["partitioned"].boolean, Some(true));
    assert_eq!(attrs["slice"].int, Some(0));
    assert_eq!(mig.consumes_capacity_from, vec!["gpu-0".to_owned()]);
}

#[test]
fn own_attribute_overrides_every_mixin() {
    let mut slice = load(GPU_SLICE);
    let composite = slice.spec.devices[1].composite.as_mut().unwrap();
    composite
        .attributes
        .as_mut()
        .unwrap()
        .insert("model".into(), devslice_schema::DeviceAttribute::string("custom"));
    let resolved = resolve(&slice);
    let attrs = resolved.spec.devices[1]
        .content
        .as_ref()
        .unwrap()
        .attributes
        .clone()
        .unwrap();
    assert_eq!(attrs["model"].string.as_deref(), Some("custom"));
}

#[test]
fn toml_and_json_documents_agree() {
    let slice = load(GPU_SLICE);
    let toml_text = render(&slice, DocumentFormat::Toml).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let from_toml = parse_slice_file(write_doc(dir.path(), "slice.toml", &toml_text)).unwrap();
    assert_eq!(from_toml, slice);
    assert_eq!(
        resolve(&from_toml).digest().unwrap(),
        resolve(&slice).digest().unwrap()
    );
}

#[test]
fn mixin_free_resolution_preserves_devices() {
    let slice = load(
        r#"{
          "metadata": { "name": "plain" },
          "spec": {
            "driver": "nic.example.com",
            "pool": { "name": "pool", "resourceSliceCount": 1 },
            "allNodes": true,
            "devices": [
              { "name": "nic-0", "basic": { "attributes": { "speed": { "int": 100 } } } },
              { "name": "nic-1", "basic": {} }
            ]
          }
        }"#,
    );
    let resolved = resolve(&slice);
    let first = resolved.spec.devices[0].content.as_ref().unwrap();
    assert_eq!(
        first.attributes.as_ref(),
        slice.spec.devices[0].basic.as_ref().unwrap().attributes.as_ref()
    );
    let second = resolved.spec.devices[1].content.as_ref().unwrap();
    assert!(second.attributes.is_none());
    assert!(second.capacity.is_none());
}

fn ring(names: &[&str]) -> String {
    let devices: Vec<String> = names
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let next = names[(i + 1) % names.len()];
            format!(
                r#"{{ "name": "{name}", "composite": {{ "consumesCapacityFrom": [{{ "name": "{next}" }}] }} }}"#
            )
        })
        .collect();
    devices.join(",")
}

fn ring_slice(devices: &str) -> ResourceSlice {
    load(&format!(
        r#"{{
          "metadata": {{ "name": "ring" }},
          "spec": {{
            "driver": "gpu.example.com",
            "pool": {{ "name": "pool", "resourceSliceCount": 1 }},
            "allNodes": true,
            "devices": [{devices}]
          }}
        }}"#
    ))
}

#[test]
fn single_three_cycle() {
    let slice = ring_slice(&ring(&["a", "b", "c"]));
    let errs = validate_create(&slice);
    assert_eq!(errs.len(), 1);
    assert_eq!(errs[0].field.to_string(), "spec.devices");
    assert!(errs[0].detail.ends_with("Found cycle: a -> b -> c -> a"));
}

#[test]
fn two_disjoint_cycles() {
    let devices = format!("{},{}", ring(&["a", "b", "c"]), ring(&["x", "y", "z"]));
    let slice = ring_slice(&devices);
    let cycles = find_cycles(&ReferenceGraph::build(&slice.spec.devices));
    assert_eq!(cycles.len(), 2);
    for cycle in &cycles {
        let first_group = cycle.contains("a") || cycle.contains("b") || cycle.contains("c");
        let second_group = cycle.contains("x") || cycle.contains("y") || cycle.contains("z");
        assert!(first_group != second_group, "cycle mixes groups: {cycle}");
    }
    assert_eq!(validate_create(&slice).len(), 2);
}

#[test]
fn self_loop_detected_and_blocks_checked_resolve() {
    let slice = ring_slice(&ring(&["solo"]));
    let errs = validate_create(&slice);
    assert_eq!(errs.len(), 1);
    assert!(errs[0].detail.ends_with("solo -> solo"));
    assert!(matches!(resolve_checked(&slice), Err(CoreError::Invalid(_))));
}

fn basic_devices(count: usize) -> ResourceSlice {
    let devices: Vec<String> = (0..count)
        .map(|i| format!(r#"{{ "name": "dev-{i}", "basic": {{}} }}"#))
        .collect();
    ring_slice(&devices.join(","))
}

#[test]
fn device_ceiling() {
    assert!(validate_create(&basic_devices(128)).is_empty());

    let errs = validate_create(&basic_devices(129));
    assert_eq!(errs.len(), 1);
    assert_eq!(errs[0].kind, ErrorKind::Invalid);
    assert_eq!(errs[0].field.to_string(), "spec");
    assert_eq!(errs[0].value, serde_json::Value::from(129));
}

/// `dev-0` consumes from `dev-1`, and so on; the last device closes the ring
/// back to `dev-0` when `closed` is set.
fn long_chain(count: usize, closed: bool) -> ResourceSlice {
    let mut slice = ring_slice("");
    slice.spec.devices = (0..count)
        .map(|i| {
            let next = if i + 1 < count {
                Some(i + 1)
            } else if closed {
                Some(0)
            } else {
                None
            };
            Device::composite(
                format!("dev-{i}"),
                CompositeDevice {
                    consumes_capacity_from: next
                        .map(|n| DeviceRef::new(format!("dev-{n}")))
                        .into_iter()
                        .collect(),
                    ..CompositeDevice::default()
                },
            )
        })
        .collect();
    slice
}

#[test]
fn long_reference_chain_returns_errors() {
    let slice = long_chain(20_000, false);
    let errs = validate_create(&slice);
    assert!(errs
        .iter()
        .any(|e| e.field.to_string() == "spec" && e.value == serde_json::Value::from(20_000)));
    assert!(errs.iter().all(|e| !e.detail.contains("Found cycle")));
    assert!(resolve_checked(&slice).is_ok());
}

#[test]
fn long_reference_ring_is_one_cycle() {
    let slice = long_chain(20_000, true);
    let cycles = find_cycles(&ReferenceGraph::build(&slice.spec.devices));
    assert_eq!(cycles.len(), 1);
    assert_eq!(cycles[0].len(), 20_000);
    assert_eq!(cycles[0].nodes()[0], "dev-0");
    assert!(matches!(resolve_checked(&slice), Err(CoreError::Invalid(_))));
}

#[test]
fn node_selection_exactly_one() {
    let mut slice = basic_devices(1);
    assert!(validate_create(&slice).is_empty());

    slice.spec.node_name = Some("worker".to_owned());
    let errs = validate_create(&slice);
    assert_eq!(errs.len(), 1);
    assert_eq!(errs[0].value, serde_json::Value::Null);

    slice.spec.node_name = None;
    slice.spec.all_nodes = false;
    let errs = validate_create(&slice);
    assert_eq!(errs.len(), 1);
    assert_eq!(errs[0].kind, ErrorKind::Required);
}

#[test]
fn each_changed_immutable_field_reports_once() {
    let old = load(GPU_SLICE);

    let mut new = old.clone();
    new.spec.driver = "other.example.com".to_owned();
    let errs = validate_update(&new, &old);
    assert_eq!(errs.len(), 1);
    assert_eq!(errs[0].field.to_string(), "spec.driver");

    new.spec.pool.as_mut().unwrap().name = "other".to_owned();
    let fields: Vec<String> = validate_update(&new, &old)
        .iter()
        .map(|e| e.field.to_string())
        .collect();
    assert_eq!(fields, vec!["spec.driver", "spec.pool.name"]);
}

#[test]
fn downgraded_server_keeps_existing_partitionable_fields() {
    let enabled = SliceStrategy::with_gates(FeatureGates::all_enabled());
    let stored = enabled.create(load(GPU_SLICE)).unwrap();

    let disabled = SliceStrategy::with_gates(FeatureGates::default());
    let mut next = stored.clone();
    next.spec.pool.as_mut().unwrap().generation = 2;
    let updated = disabled.update(next, &stored).unwrap();
    assert!(updated.spec.mixins.is_some());
    assert_eq!(updated.metadata.generation, stored.metadata.generation + 1);

    let rejected = disabled.create(load(GPU_SLICE)).unwrap_err();
    assert!(rejected
        .errors()
        .iter()
        .all(|e| e.kind == ErrorKind::Required));
}

#[test]
fn config_drives_strategy() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_doc(
        dir.path(),
        "config.json",
        r#"{ "featureGates": { "partitionableDevices": true } }"#,
    );
    let config = Config::load(&path).unwrap();
    let strategy = SliceStrategy::with_gates(config.feature_gates);
    let admitted = strategy.create(load(GPU_SLICE)).unwrap();
    assert_eq!(admitted.spec.devices.len(), 2);
    assert!(admitted.spec.devices[1].composite.is_some());
}
