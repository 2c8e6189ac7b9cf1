//! Resource slice document model, name rules, field errors, and quantities for devslice.
//!
//! This crate defines the schema layer: the slice document (`ResourceSlice`)
//! and its flattened form (`ResolvedSlice`), JSON/TOML parsing, structured
//! field errors (`FieldError`, `FieldPath`), identifier syntax rules, resource
//! quantities, and the structural limits enforced during validation.

pub mod field;
pub mod limits;
pub mod names;
pub mod quantity;
pub mod resolved;
pub mod slice;
pub mod types;

pub use field::{ErrorKind, ErrorList, FieldError, FieldPath, PathSegment, ValidationError};
pub use quantity::{parse_quantity, ParsedQuantity, Quantity, QuantityError};
pub use resolved::{
    ResolvedCounterConsumption, ResolvedCounterSet, ResolvedDevice, ResolvedDeviceContent,
    ResolvedSlice, ResolvedSliceSpec,
};
pub use slice::{
    parse_slice_file, parse_slice_str, render, AttributeMap, BasicDevice, CapacityMap,
    CompositeDevice, Counter, CounterMap, CounterSet, CounterSetMixin, Device, DeviceAttribute,
    DeviceBody, DeviceCapacity, DeviceContent, DeviceCounterConsumption,
    DeviceCounterConsumptionMixin, DeviceMixin, DeviceRef, DocumentFormat, MixinRef,
    NodeSelection, NodeSelector, NodeSelectorOperator, NodeSelectorRequirement, NodeSelectorTerm,
    ObjectMeta, ResourcePool, ResourceSlice, ResourceSliceMixins, ResourceSliceSpec, SliceError,
};
pub use types::{QualifiedName, ShortDigest, SliceDigest};
