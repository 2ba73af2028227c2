//! Declarative table-schema descriptors.
//!
//! A [`SchemaField`] describes one column of the destination table: its
//! logical kind, whether it repeats, and whether a value is required.
//! Descriptors are pure data; resolution to physical Arrow types lives in
//! [`crate::wire`].

/// Logical column kind, possibly nested.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    Bool,
    Bytes,
    Date,
    /// Civil datetime, no timezone.
    DateTime,
    Float64,
    Int64,
    /// Geography in WKT form, carried as a tagged string.
    Geography,
    /// JSON document, carried as a tagged string.
    Json,
    /// Fixed-point decimal with the given precision and scale.
    Numeric { precision: u8, scale: i8 },
    String,
    Time,
    /// Instant in time, UTC.
    Timestamp,
    /// Nested record. Resolves all-or-nothing: one bad child drops the
    /// whole struct column.
    Struct(Vec<SchemaField>),
    /// A `{start, end}` pair of a scalar element kind.
    Range(Box<FieldKind>),
    /// Explicit list of an element field.
    List(Box<SchemaField>),
}

impl FieldKind {
    /// Fixed-point decimal shorthand.
    pub fn numeric(precision: u8, scale: i8) -> Self {
        FieldKind::Numeric { precision, scale }
    }
}

/// One column descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaField {
    pub name: String,
    pub kind: FieldKind,
    /// Repeated fields resolve to a list of the element type and are
    /// non-nullable on the wire.
    pub repeated: bool,
    /// Required fields are non-nullable on the wire.
    pub required: bool,
}

impl SchemaField {
    /// A nullable, non-repeated field.
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            repeated: false,
            required: false,
        }
    }

    /// Mark the field as repeated.
    pub fn repeated(mut self) -> Self {
        self.repeated = true;
        self
    }

    /// Mark the field as required (non-nullable).
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

/// The fixed deployment schema for agent lifecycle events.
///
/// Eight columns; all nullable strings except `timestamp` and `event_type`.
pub fn event_table_schema() -> Vec<SchemaField> {
    vec![
        SchemaField::new("timestamp", FieldKind::Timestamp).required(),
        SchemaField::new("event_type", FieldKind::String).required(),
        SchemaField::new("agent", FieldKind::String),
        SchemaField::new("session_id", FieldKind::String),
        SchemaField::new("invocation_id", FieldKind::String),
        SchemaField::new("user_id", FieldKind::String),
        SchemaField::new("content", FieldKind::String),
        SchemaField::new("error_message", FieldKind::String),
    ]
}
