use criterion::{criterion_group, criterion_main, Criterion};
use devslice_core::{find_cycles, resolve, validate_create, ReferenceGraph};
use devslice_schema::{
    AttributeMap, CompositeDevice, Device, DeviceAttribute, DeviceMixin, DeviceRef, MixinRef,
    ObjectMeta, QualifiedName, ResourcePool, ResourceSlice, ResourceSliceMixins, ResourceSliceSpec,
};
use std::hint::black_box;

fn attributes(prefix: &str, count: usize) -> AttributeMap {
    (0..count)
        .map(|i| {
            (
                QualifiedName::new(format!("gpu.example.com/{prefix}_{i}")),
                DeviceAttribute::string(format!("value-{i}")),
            )
        })
        .collect()
}

/// 64 devices and 64 mixins, every device at the attribute ceiling and
/// drawing capacity from its predecessor.
fn max_slice() -> ResourceSlice {
    let mixins = (0..64)
        .map(|i| DeviceMixin {
            name: format!("mixin-{i}"),
            attributes: Some(attributes("shared", 16)),
            capacity: None,
        })
        .collect();
    let devices = (0..64)
        .map(|i| {
            Device::composite(
                format!("device-{i}"),
                CompositeDevice {
                    attributes: Some(attributes("own", 32)),
                    includes: vec![MixinRef::new(format!("mixin-{i}"))],
                    consumes_capacity_from: if i == 0 {
                        Vec::new()
                    } else {
                        vec![DeviceRef::new(format!("device-{}", i - 1))]
                    },
                    ..CompositeDevice::default()
                },
            )
        })
        .collect();

    ResourceSlice {
        metadata: ObjectMeta {
            name: "bench".to_owned(),
            ..ObjectMeta::default()
        },
        spec: ResourceSliceSpec {
            driver: "gpu.example.com".to_owned(),
            pool: Some(ResourcePool {
                name: "pool".to_owned(),
                generation: 0,
                resource_slice_count: 1,
            }),
            all_nodes: true,
            devices,
            mixins: Some(ResourceSliceMixins {
                device: mixins,
                ..ResourceSliceMixins::default()
            }),
            ..ResourceSliceSpec::default()
        },
        ..ResourceSlice::default()
    }
}

fn bench_validate(c: &mut Criterion) {
    let slice = max_slice();
    assert!(validate_create(&slice).is_empty());
    c.bench_function("validate_create_max_slice", |b| {
        b.iter(|| validate_create(black_box(&slice)));
    });
}

fn bench_resolve(c: &mut Criterion) {
    let slice = max_slice();
    c.bench_function("resolve_max_slice", |b| {
        b.iter(|| resolve(black_box(&slice)));
    });
}

fn bench_cycles(c: &mut Criterion) {
    let mut slice = max_slice();
    if let Some(first) = slice.spec.devices[0].composite.as_mut() {
        first.consumes_capacity_from = vec![DeviceRef::new("device-63")];
    }
    c.bench_function("find_cycles_64_ring", |b| {
        b.iter(|| find_cycles(&ReferenceGraph::build(black_box(&slice.spec.devices))));
    });
}

criterion_group!(benches, bench_validate, bench_resolve, bench_cycles);
criterion_main!(benches);
