//! Shared primitive types used across the generator and the report.

/// Opaque message identifier (UUID text form).
pub type MessageId = String;

/// Reference-table key (customer, aggregator or error code).
pub type RefId = String;

/// Country display name, as used in the destination pool.
pub type Country = String;

/// Run seed.
pub type Seed = u64;
