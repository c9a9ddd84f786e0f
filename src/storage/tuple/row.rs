use crate::common::{Error, Result};
use crate::storage::page::RecordId;
use crate::types::{Field, Schema};
use itertools::Itertools;

/// Tombstone byte values (spec §3 invariant 4): any byte other than `LIVE`
/// at slot offset 0 means the slot is free for reuse.
pub const TOMBSTONE_LIVE: u8 = b'+';
pub const TOMBSTONE_DEAD: u8 = b'-';

/// A schema-typed tuple: an ordered list of [`Field`] values plus the RID it
/// was read from, if any (spec §3 "Record"). This is the in-memory
/// counterpart of a slotted-page record; [`Record::pack`]/[`Record::unpack`]
/// are the only places the fixed tombstone-plus-attributes wire layout is
/// produced or consumed, generalizing the teacher's `Row::serialize`/
/// `Row::deserialize` from a variable-length offset-map layout down to
/// spec's fixed-width packing.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    values: Vec<Field>,
    rid: Option<RecordId>,
}

impl From<Vec<Field>> for Record {
    fn from(values: Vec<Field>) -> Self {
        Record { values, rid: None }
    }
}

impl Record {
    pub fn new(values: Vec<Field>) -> Self {
        Record { values, rid: None }
    }

    pub fn rid(&self) -> Option<RecordId> {
        self.rid
    }

    pub fn set_rid(&mut self, rid: RecordId) {
        self.rid = Some(rid);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Field> {
        self.values.iter()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// `getAttr`.
    pub fn get_attr(&self, index: usize) -> Result<&Field> {
        self.values.get(index).ok_or(Error::InvalidArgument(
            "attribute index out of range".into(),
        ))
    }

    /// `setAttr`.
    pub fn set_attr(&mut self, index: usize, value: Field) -> Result<()> {
        let slot = self
            .values
            .get_mut(index)
            .ok_or(Error::InvalidArgument("attribute index out of range".into()))?;
        if slot.get_type() != value.get_type() {
            return Err(Error::InvalidArgument(format!(
                "attribute {index} type mismatch"
            )));
        }
        *slot = value;
        Ok(())
    }

    pub fn to_display_string(&self) -> String {
        self.values.iter().map(|f| f.to_string()).join(", ")
    }

    /// Packs byte 0 as the live tombstone followed by each attribute in
    /// schema order at its fixed width (spec §4.2 attribute packing).
    pub fn pack_into(&self, schema: &Schema, buf: &mut Vec<u8>) -> Result<()> {
        if self.values.len() != schema.num_attributes() {
            return Err(Error::InvalidArgument(format!(
                "record has {} values, schema expects {}",
                self.values.len(),
                schema.num_attributes()
            )));
        }
        buf.push(TOMBSTONE_LIVE);
        for (attr, value) in schema.attributes().iter().zip(self.values.iter()) {
            if attr.data_type != value.get_type() {
                return Err(Error::InvalidArgument(format!(
                    "attribute {} type mismatch",
                    attr.name
                )));
            }
            value.pack(attr.width(), buf)?;
        }
        Ok(())
    }

    /// Unpacks the payload bytes (i.e. everything after the tombstone byte)
    /// of a slot into a `Record` with no RID set; the caller (the table)
    /// fills in the RID once the slot's (page, slot index) is known.
    pub fn unpack(schema: &Schema, payload: &[u8]) -> Result<Self> {
        let mut values = Vec::with_capacity(schema.num_attributes());
        let mut offset = 0;
        for attr in schema.attributes() {
            let width = attr.width();
            values.push(Field::unpack(attr.data_type, width, &payload[offset..offset + width])?);
            offset += width;
        }
        Ok(Record { values, rid: None })
    }
}
