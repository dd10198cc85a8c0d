//! Nested-collection reconciliation (checklist lines, photo evidence).
//!
//! An [`EditSession`] holds the sub-records of a parent record while the
//! user edits them in memory. At save time [`reconcile`] turns the session
//! into the ordered [`Command`] list that the remote write protocol accepts
//! for a one-to-many field in a single request.
//!
//! Updates are emitted for every surviving persisted item, changed or not.
//! The remote `write` overwrites idempotently, so no field diffing is done.

use serde::ser::{Serialize, SerializeTuple, Serializer};
use serde_json::Value;

use crate::types::{is_persisted_id, FieldMap, RecordId};

// ---------------------------------------------------------------------------
// Wire opcodes
// ---------------------------------------------------------------------------

/// Create a new record and link it to the parent.
pub const OP_CREATE: u8 = 0;
/// Update an already linked record.
pub const OP_UPDATE: u8 = 1;
/// Unlink and delete a linked record.
pub const OP_DELETE: u8 = 2;
/// Replace the whole many-to-many set.
pub const OP_REPLACE: u8 = 6;

// ---------------------------------------------------------------------------
// SubRecord
// ---------------------------------------------------------------------------

/// A single nested line item of a parent record.
///
/// `id` is present only for records read from the remote system. Records
/// added during the current editing session have no id until saved.
#[derive(Debug, Clone, PartialEq)]
pub struct SubRecord {
    pub id: Option<RecordId>,
    pub fields: FieldMap,
}

impl SubRecord {
    /// A record created locally that has never been persisted.
    pub fn new(fields: FieldMap) -> Self {
        Self { id: None, fields }
    }

    /// A record read from the remote system.
    pub fn persisted(id: RecordId, fields: FieldMap) -> Self {
        debug_assert!(is_persisted_id(id), "remote ids are positive, got {id}");
        Self {
            id: Some(id),
            fields,
        }
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn set_field(&mut self, name: &str, value: impl Into<Value>) {
        self.fields.insert(name.to_string(), value.into());
    }
}

// ---------------------------------------------------------------------------
// Command
// ---------------------------------------------------------------------------

/// One instruction for a nested one-to-many write.
///
/// Serializes to the remote 3-tuple form: `[0, 0, fields]`,
/// `[1, id, fields]` or `[2, id, false]`.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Create(FieldMap),
    Update(RecordId, FieldMap),
    Delete(RecordId),
}

impl Serialize for Command {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut tuple = serializer.serialize_tuple(3)?;
        match self {
            Command::Create(fields) => {
                tuple.serialize_element(&OP_CREATE)?;
                tuple.serialize_element(&0)?;
                tuple.serialize_element(fields)?;
            }
            Command::Update(id, fields) => {
                tuple.serialize_element(&OP_UPDATE)?;
                tuple.serialize_element(id)?;
                tuple.serialize_element(fields)?;
            }
            Command::Delete(id) => {
                tuple.serialize_element(&OP_DELETE)?;
                tuple.serialize_element(id)?;
                tuple.serialize_element(&false)?;
            }
        }
        tuple.end()
    }
}

/// Replacement of an entire many-to-many set, serialized as `[6, 0, ids]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplaceSet(pub Vec<RecordId>);

impl Serialize for ReplaceSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut tuple = serializer.serialize_tuple(3)?;
        tuple.serialize_element(&OP_REPLACE)?;
        tuple.serialize_element(&0)?;
        tuple.serialize_element(&self.0)?;
        tuple.end()
    }
}

impl ReplaceSet {
    /// The full field value: a one-element command list.
    pub fn to_field_value(&self) -> Value {
        Value::Array(vec![serde_json::json!(self)])
    }
}

// ---------------------------------------------------------------------------
// reconcile
// ---------------------------------------------------------------------------

/// Convert the editing state of a nested collection into write commands.
///
/// Surviving items come first in list order (`Create` for local items,
/// `Update` for persisted ones), followed by one `Delete` per removed id in
/// removal order. Empty input yields an empty list.
///
/// Callers must not pass an id in both `items` and `deleted_ids`.
pub fn reconcile(items: &[SubRecord], deleted_ids: &[RecordId]) -> Vec<Command> {
    debug_assert!(
        deleted_ids
            .iter()
            .all(|d| !items.iter().any(|i| i.id == Some(*d))),
        "an id cannot be both kept and deleted"
    );

    let mut commands = Vec::with_capacity(items.len() + deleted_ids.len());

    for item in items {
        let command = match item.id {
            Some(id) => Command::Update(id, item.fields.clone()),
            None => Command::Create(item.fields.clone()),
        };
        commands.push(command);
    }

    commands.extend(deleted_ids.iter().map(|id| Command::Delete(*id)));
    commands
}

/// Encode a command list as a field value, or `None` when it is empty.
///
/// An absent field leaves the remote collection unchanged while an empty
/// list may clear it, so empty command lists must be omitted from payloads.
pub fn commands_field_value(commands: &[Command]) -> Option<Value> {
    if commands.is_empty() {
        return None;
    }
    Some(serde_json::json!(commands))
}

// ---------------------------------------------------------------------------
// EditSession
// ---------------------------------------------------------------------------

/// In-memory editing state of one nested collection.
///
/// Removing a persisted item records its id for deletion; removing a local
/// item simply drops it. Mutation goes through this type only, which keeps
/// `deleted_ids` disjoint from the ids in `items`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EditSession {
    items: Vec<SubRecord>,
    deleted_ids: Vec<RecordId>,
}

impl EditSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a session from records read at load time.
    pub fn from_remote(items: Vec<SubRecord>) -> Self {
        Self {
            items,
            deleted_ids: Vec::new(),
        }
    }

    pub fn items(&self) -> &[SubRecord] {
        &self.items
    }

    pub fn deleted_ids(&self) -> &[RecordId] {
        &self.deleted_ids
    }

    /// Append a new local item and return its index.
    pub fn push(&mut self, fields: FieldMap) -> usize {
        self.items.push(SubRecord::new(fields));
        self.items.len() - 1
    }

    /// Set one field of the item at `index`. Returns `false` when out of range.
    pub fn set_field(&mut self, index: usize, name: &str, value: impl Into<Value>) -> bool {
        match self.items.get_mut(index) {
            Some(item) => {
                item.set_field(name, value);
                true
            }
            None => false,
        }
    }

    /// Remove the item at `index`.
    pub fn remove(&mut self, index: usize) -> Option<SubRecord> {
        if index >= self.items.len() {
            return None;
        }
        let item = self.items.remove(index);
        if let Some(id) = item.id {
            self.deleted_ids.push(id);
        }
        Some(item)
    }

    /// Remove the persisted item with the given id.
    pub fn remove_by_id(&mut self, id: RecordId) -> Option<SubRecord> {
        let index = self.items.iter().position(|i| i.id == Some(id))?;
        self.remove(index)
    }

    /// Commands for the current state. Does not consume the session.
    pub fn commands(&self) -> Vec<Command> {
        reconcile(&self.items, &self.deleted_ids)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
