//! Layering of mixin-provided fields under entity-provided fields.
//!
//! For an entity with includes `[m1, .., mk]` and own map `F` the result is
//! `F` over `mk` over .. over `m1` over `{}`. Unknown mixins are skipped here;
//! validation reports them.

use devslice_schema::{
    CounterSet, CounterSetMixin, Device, DeviceCounterConsumption, DeviceCounterConsumptionMixin,
    DeviceMixin, MixinRef, ResolvedCounterConsumption, ResolvedCounterSet, ResolvedDevice,
    ResolvedDeviceContent, ResourceSliceMixins,
};
use std::collections::BTreeMap;
use tracing::debug;

/// Name-indexed view of a slice's mixins. The first declaration of a name wins.
#[derive(Debug, Default)]
pub struct MixinTable<'a> {
    device: BTreeMap<&'a str, &'a DeviceMixin>,
    counter_set: BTreeMap<&'a str, &'a CounterSetMixin>,
    counter_consumption: BTreeMap<&'a str, &'a DeviceCounterConsumptionMixin>,
}

fn index_by_name<'a, T>(
    items: &'a [T],
    name: impl Fn(&'a T) -> &'a str,
) -> BTreeMap<&'a str, &'a T> {
    let mut map = BTreeMap::new();
    for item in items {
        map.entry(name(item)).or_insert(item);
    }
    map
}

impl<'a> MixinTable<'a> {
    pub fn new(mixins: Option<&'a ResourceSliceMixins>) -> Self {
        let Some(mixins) = mixins else {
            return Self::default();
        };
        Self {
            device: index_by_name(&mixins.device, |m| m.name.as_str()),
            counter_set: index_by_name(&mixins.counter_set, |m| m.name.as_str()),
            counter_consumption: index_by_name(&mixins.device_counter_consumption, |m| {
                m.name.as_str()
            }),
        }
    }

    pub fn device_mixin(&self, name: &str) -> Option<&'a DeviceMixin> {
        self.device.get(name).copied()
    }

    pub fn counter_set_mixin(&self, name: &str) -> Option<&'a CounterSetMixin> {
        self.counter_set.get(name).copied()
    }

    pub fn counter_consumption_mixin(&self, name: &str) -> Option<&'a DeviceCounterConsumptionMixin> {
        self.counter_consumption.get(name).copied()
    }

    /// Flatten a device. A device with neither kind resolves without content;
    /// one with both kinds resolves its composite body.
    pub fn resolve_device(&self, device: &Device) -> ResolvedDevice {
        let Some(body) = device.body() else {
            debug!("device {}: no content, nothing to merge", device.name);
            return ResolvedDevice {
                name: device.name.clone(),
                content: None,
            };
        };

        let mixins = lookup_all(body.includes, &device.name, |n| self.device_mixin(n));
        let attributes = layer(
            body.attributes,
            mixins.iter().map(|m| m.attributes.as_ref()),
        );
        let capacity = layer(body.capacity, mixins.iter().map(|m| m.capacity.as_ref()));

        ResolvedDevice {
            name: device.name.clone(),
            content: Some(ResolvedDeviceContent {
                attributes,
                capacity,
                consumes_capacity_from: body
                    .consumes_capacity_from
                    .iter()
                    .map(|r| r.name.clone())
                    .collect(),
                consumes_counters: body
                    .consumes_counters
                    .iter()
                    .map(|c| self.resolve_counter_consumption(c))
                    .collect(),
            }),
        }
    }

    pub fn resolve_counter_set(&self, set: &CounterSet) -> ResolvedCounterSet {
        let mixins = lookup_all(&set.includes, &set.name, |n| self.counter_set_mixin(n));
        ResolvedCounterSet {
            name: set.name.clone(),
            counters: layer(
                set.counters.as_ref(),
                mixins.iter().map(|m| m.counters.as_ref()),
            ),
        }
    }

    pub fn resolve_counter_consumption(
        &self,
        consumption: &DeviceCounterConsumption,
    ) -> ResolvedCounterConsumption {
        let mixins = lookup_all(&consumption.includes, &consumption.counter_set, |n| {
            self.counter_consumption_mixin(n)
        });
        ResolvedCounterConsumption {
            counter_set: consumption.counter_set.clone(),
            counters: layer(
                consumption.counters.as_ref(),
                mixins.iter().map(|m| m.counters.as_ref()),
            ),
        }
    }
}

/// Resolve includes in document order, dropping names the table lacks.
fn lookup_all<'a, T>(
    includes: &[MixinRef],
    owner: &str,
    lookup: impl Fn(&str) -> Option<&'a T>,
) -> Vec<&'a T> {
    includes
        .iter()
        .filter_map(|r| {
            let found = lookup(&r.name);
            if found.is_none() {
                debug!("{owner}: skipping unknown mixin '{}'", r.name);
            }
            found
        })
        .collect()
}

/// Merge mixin maps in order, then the entity's own map on top.
///
/// A present but empty own map replaces everything the mixins provide. An
/// absent own map with nothing to merge stays absent.
fn layer<'m, K, V>(
    own: Option<&'m BTreeMap<K, V>>,
    mixins: impl Iterator<Item = Option<&'m BTreeMap<K, V>>>,
) -> Option<BTreeMap<K, V>>
where
    K: Ord + Clone + 'm,
    V: Clone + 'm,
{
    if own.is_some_and(BTreeMap::is_empty) {
        return Some(BTreeMap::new());
    }
    let mut merged = BTreeMap::new();
    for map in mixins.flatten().chain(own) {
        for (key, value) in map {
            merged.insert(key.clone(), value.clone());
        }
    }
    if merged.is_empty() {
        own.cloned()
    } else {
        Some(merged)
    }
}
