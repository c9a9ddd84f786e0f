pub mod field;

pub use field::Field;

use crate::common::{Error, Result};

/// The four attribute types a table column or B+-tree key may hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum DataType {
    Int = 0,
    Float = 1,
    Bool = 2,
    String = 3,
}

impl DataType {
    pub fn from_i32(v: i32) -> Result<Self> {
        Ok(match v {
            0 => DataType::Int,
            1 => DataType::Float,
            2 => DataType::Bool,
            3 => DataType::String,
            other => {
                return Err(Error::InvalidArgument(format!(
                    "unknown data type tag {other}"
                )))
            }
        })
    }

    pub fn as_i32(self) -> i32 {
        self as i32
    }
}

/// One column of a [`Schema`]: a name, a type, and (for `String` only) a
/// fixed on-disk width.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Attribute {
    pub name: String,
    pub data_type: DataType,
    /// Byte width on disk. INT=4, FLOAT=4, BOOL=1, STRING=declared length.
    pub type_length: usize,
}

impl Attribute {
    pub fn new_int(name: impl Into<String>) -> Self {
        Attribute {
            name: name.into(),
            data_type: DataType::Int,
            type_length: 4,
        }
    }

    pub fn new_float(name: impl Into<String>) -> Self {
        Attribute {
            name: name.into(),
            data_type: DataType::Float,
            type_length: 4,
        }
    }

    pub fn new_bool(name: impl Into<String>) -> Self {
        Attribute {
            name: name.into(),
            data_type: DataType::Bool,
            type_length: 1,
        }
    }

    pub fn new_string(name: impl Into<String>, len: usize) -> Self {
        Attribute {
            name: name.into(),
            data_type: DataType::String,
            type_length: len,
        }
    }

    /// Byte width this attribute occupies in a packed record.
    pub fn width(&self) -> usize {
        match self.data_type {
            DataType::Int => 4,
            DataType::Float => 4,
            DataType::Bool => 1,
            DataType::String => self.type_length,
        }
    }
}

/// An ordered list of attributes plus the subset that forms the primary key,
/// as described in spec §3 "Schema". Record size is a deterministic function
/// of the schema: one tombstone byte plus the sum of attribute widths.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Schema {
    attributes: Vec<Attribute>,
    key_attrs: Vec<usize>,
}

impl Schema {
    /// Takes ownership of `attributes` and `key_attrs`, mirroring the
    /// record manager's `createSchema` contract (spec §4.2).
    pub fn new(attributes: Vec<Attribute>, key_attrs: Vec<usize>) -> Result<Self> {
        if attributes.is_empty() {
            return Err(Error::InvalidArgument("schema has no attributes".into()));
        }
        for &k in &key_attrs {
            if k >= attributes.len() {
                return Err(Error::InvalidArgument(format!(
                    "key attribute index {k} out of range"
                )));
            }
        }
        Ok(Schema {
            attributes,
            key_attrs,
        })
    }

    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    pub fn num_attributes(&self) -> usize {
        self.attributes.len()
    }

    pub fn key_attrs(&self) -> &[usize] {
        &self.key_attrs
    }

    pub fn key_size(&self) -> usize {
        self.key_attrs.len()
    }

    pub fn attribute(&self, index: usize) -> Result<&Attribute> {
        self.attributes.get(index).ok_or(Error::InvalidArgument(
            "attribute index out of range".into(),
        ))
    }

    pub fn attribute_index(&self, name: &str) -> Option<usize> {
        self.attributes.iter().position(|a| a.name == name)
    }

    /// `getRecordSize`: one tombstone byte plus the sum of per-attribute
    /// widths, as a pure function of the schema (spec §4.2).
    pub fn record_size(&self) -> usize {
        1 + self.attributes.iter().map(Attribute::width).sum::<usize>()
    }

    /// Byte offset (from the start of the payload, i.e. after the tombstone
    /// byte) at which attribute `index` begins.
    pub fn attribute_offset(&self, index: usize) -> usize {
        self.attributes[..index].iter().map(Attribute::width).sum()
    }
}
