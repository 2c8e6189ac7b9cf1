//! Admission preparation and the partitionable-devices feature gate.
//!
//! With the gate off, new slices lose every partitionable field before
//! validation. Updates only lose them when the stored slice was not already
//! using them, so existing objects keep round-tripping after a downgrade.

use crate::meta::{BasicMetaValidator, MetaValidator};
use crate::validation::SliceValidator;
use devslice_schema::{ResourceSlice, ValidationError};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct FeatureGates {
    /// Mixins, shared counters, composite devices, and counter consumption.
    pub partitionable_devices: bool,
}

impl FeatureGates {
    pub fn all_enabled() -> Self {
        Self {
            partitionable_devices: true,
        }
    }
}

/// Whether any field guarded by the partitionable-devices gate is populated.
pub fn uses_partitionable_devices(slice: &ResourceSlice) -> bool {
    let spec = &slice.spec;
    spec.mixins.is_some()
        || !spec.shared_counters.is_empty()
        || spec.devices.iter().any(|d| {
            d.composite.is_some()
                || d.basic
                    .as_ref()
                    .is_some_and(|b| !b.includes.is_empty() || !b.consumes_counters.is_empty())
        })
}

fn drop_partitionable_fields(slice: &mut ResourceSlice) {
    if !uses_partitionable_devices(slice) {
        return;
    }
    debug!(
        "partitionable devices disabled: dropping gated fields from '{}'",
        slice.metadata.name
    );
    let spec = &mut slice.spec;
    spec.mixins = None;
    spec.shared_counters.clear();
    for device in &mut spec.devices {
        device.composite = None;
        if let Some(basic) = &mut device.basic {
            basic.includes.clear();
            basic.consumes_counters.clear();
        }
    }
}

/// Reset the generation and drop gated fields when the gate is off.
pub fn prepare_for_create(slice: &mut ResourceSlice, gates: FeatureGates) {
    slice.metadata.generation = 1;
    if !gates.partitionable_devices {
        drop_partitionable_fields(slice);
    }
}

/// Carry the stored generation forward, bumping it when the spec changed.
pub fn prepare_for_update(new: &mut ResourceSlice, old: &ResourceSlice, gates: FeatureGates) {
    new.metadata.generation = old.metadata.generation;
    if !gates.partitionable_devices && !uses_partitionable_devices(old) {
        drop_partitionable_fields(new);
    }
    if new.spec != old.spec {
        new.metadata.generation += 1;
    }
}

/// Prepare, then validate.
pub struct SliceStrategy<'m> {
    gates: FeatureGates,
    validator: SliceValidator<'m>,
}

impl SliceStrategy<'static> {
    /// Strategy with the default metadata rules.
    pub fn with_gates(gates: FeatureGates) -> Self {
        Self::new(gates, &BasicMetaValidator)
    }
}

impl<'m> SliceStrategy<'m> {
    pub fn new(gates: FeatureGates, meta: &'m dyn MetaValidator) -> Self {
        Self {
            gates,
            validator: SliceValidator::new(meta),
        }
    }

    pub fn create(&self, mut slice: ResourceSlice) -> Result<ResourceSlice, ValidationError> {
        prepare_for_create(&mut slice, self.gates);
        let errs = self.validator.validate_create(&slice);
        if !errs.is_empty() {
            return Err(ValidationError(errs));
        }
        info!("admitted slice '{}'", slice.metadata.name);
        Ok(slice)
    }

    pub fn update(
        &self,
        mut new: ResourceSlice,
        old: &ResourceSlice,
    ) -> Result<ResourceSlice, ValidationError> {
        prepare_for_update(&mut new, old, self.gates);
        let errs = self.validator.validate_update(&new, old);
        if !errs.is_empty() {
            return Err(ValidationError(errs));
        }
        info!(
            "admitted update of slice '{}' at generation {}",
            new.metadata.name, new.metadata.generation
        );
        Ok(new)
    }
}
