//! Analytics schema - descriptors and columnar row encoding.
//!
//! This crate is the pure, I/O-free half of the analytics pipeline:
//!
//! - [`field`] declares the logical shape of a destination table as a tree
//!   of [`SchemaField`] descriptors (scalars, structs, ranges, lists).
//! - [`wire`] resolves a descriptor tree into a physical Arrow schema,
//!   dropping unresolvable fields instead of failing the pipeline.
//! - [`encode`] serializes one row of typed cell values into an Arrow IPC
//!   stream (schema + single-row batch) ready for network transmission.
//!
//! ```text
//! [SchemaField tree] --resolve--> [Arrow Schema] --+--> [encode_row] --> bytes
//!                                                  |
//!                                      [CellValue row]
//! ```
//!
//! Resolution and encoding are deterministic functions of their inputs;
//! nothing here suspends or touches the network.

pub mod encode;
pub mod field;
pub mod wire;

pub use encode::{encode_row, CellValue, EncodeError};
pub use field::{event_table_schema, FieldKind, SchemaField};
pub use wire::{resolve_field, resolve_schema};
