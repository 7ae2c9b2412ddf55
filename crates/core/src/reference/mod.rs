//! Yearly sequential references such as `0042/2025/DTNDB`.
//!
//! Only regular operations get a real reference; every other type stores
//! [`UNASSIGNED_REFERENCE`]. The next number is derived from the last
//! reference created in the same year, raised to a configured floor for
//! years whose numbering started on paper.

pub mod policy;

pub use policy::{ReferenceFloor, ReferenceKind, ReferencePolicy, UNASSIGNED_REFERENCE, parse_sequence};
