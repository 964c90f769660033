//! # Document model
//!
//! A [`Document`] is the opaque structured record the rest of the crate
//! passes around. It is a thin, `Clone`-cheap wrapper over a
//! `serde_json::Map<String, serde_json::Value>` (a JSON object) that knows
//! how to read and stamp the reserved `_rev` field described in the data
//! model. The core never interprets any other field.

use serde_json::{Map, Value};

/// Name of the reserved revision field every stored document carries.
pub const REV_FIELD: &str = "_rev";

/// A structured document: a JSON object plus the reserved `_rev` counter.
///
/// `Document` is deliberately just a `Map<String, Value>` under the hood —
/// callers build documents from ordinary JSON object literals and the
/// engine stamps/reads `_rev` at its boundaries, per the data model's
/// "documents are cloned on every boundary crossing" invariant.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Document {
    fields: Map<String, Value>,
}

impl Document {
    /// Build a document from a JSON object. Any existing `_rev` field is
    /// kept as-is; callers that want a fresh document should not set one.
    pub fn new(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    /// Build a document from an arbitrary [`Value`], requiring it to be a
    /// JSON object (documents are always objects — see §3 of the spec).
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(fields) => Some(Self { fields }),
            _ => None,
        }
    }

    /// The current revision counter, or `None` if the document has never
    /// been stamped (e.g. a caller-constructed document prior to its first
    /// `setItem`).
    pub fn rev(&self) -> Option<u64> {
        match self.fields.get(REV_FIELD) {
            Some(Value::Number(n)) => n.as_u64(),
            _ => None,
        }
    }

    /// Return a clone of this document with `_rev` stamped to `rev`.
    pub fn with_rev(&self, rev: u64) -> Self {
        let mut fields = self.fields.clone();
        fields.insert(REV_FIELD.to_string(), Value::from(rev));
        Self { fields }
    }

    /// Borrow the document as a JSON object.
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Consume the document, returning the underlying JSON object.
    pub fn into_fields(self) -> Map<String, Value> {
        self.fields
    }

    /// Borrow the document as a [`Value`] (always `Value::Object`).
    pub fn as_value(&self) -> Value {
        Value::Object(self.fields.clone())
    }

    /// Look up an arbitrary field by name (used by views; the core itself
    /// never reads application fields).
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }
}

impl From<Map<String, Value>> for Document {
    fn from(fields: Map<String, Value>) -> Self {
        Self { fields }
    }
}

/// Composes a primary key for the typed-key variant of the engine:
/// `"<type>__<id>"` with a literal double-underscore separator. Both
/// `type_name` and `id` must be non-empty; the engine itself stays
/// primary-key-only and treats the result as an opaque string.
pub struct TypedKey;

impl TypedKey {
    /// Compose `"<type>__<id>"`. Returns `None` if either part is empty.
    pub fn new(type_name: &str, id: &str) -> Option<String> {
        if type_name.is_empty() || id.is_empty() {
            return None;
        }
        Some(format!("{type_name}__{id}"))
    }
}
