//! Structural ceilings enforced by slice validation.

/// Devices plus every kind of mixin in one slice.
pub const MAX_DEVICES_AND_MIXINS: usize = 128;

/// Attributes plus capacities on one device or device mixin.
pub const MAX_ATTRIBUTES_AND_CAPACITIES_PER_DEVICE: usize = 32;

/// Entries in any `includes` list.
pub const MAX_MIXIN_REFERENCES: usize = 8;

/// Entries in a composite device's `consumesCapacityFrom`.
pub const MAX_CONSUMES_CAPACITY_FROM: usize = 1;

/// Counter sets in `sharedCounters`.
pub const MAX_SHARED_COUNTERS: usize = 8;

pub const MAX_COUNTERS_PER_COUNTER_SET: usize = 32;

pub const MAX_COUNTER_CONSUMPTIONS_PER_DEVICE: usize = 8;

pub const POOL_NAME_MAX_LENGTH: usize = 253;

pub const DRIVER_NAME_MAX_LENGTH: usize = 253;

/// Domain prefix of a qualified attribute or capacity name.
pub const DEVICE_MAX_DOMAIN_LENGTH: usize = 63;

/// Identifier part of a qualified attribute or capacity name.
pub const DEVICE_MAX_ID_LENGTH: usize = 32;

/// String and version attribute values.
pub const DEVICE_ATTRIBUTE_MAX_VALUE_LENGTH: usize = 64;

/// Total serialized size of all annotation keys and values.
pub const TOTAL_ANNOTATION_SIZE_LIMIT: usize = 256 * 1024;
