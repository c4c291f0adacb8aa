use crate::errors::{self, Result};

/// Type of a single fixed-area field. `String` and `Map` fields store a
/// 4-byte relative offset into the variable area; the other three are
/// stored in place at their native width.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldType {
    Int,
    Long,
    Double,
    String,
    Map,
}

impl FieldType {
    /// Width of this field's slot in the fixed area. `Long`/`Double` take a
    /// full 8-byte word; everything else — including the offset pointer
    /// used by `String`/`Map` — is 4 bytes.
    fn fixed_width(self) -> usize {
        match self {
            FieldType::Long | FieldType::Double => 8,
            FieldType::Int | FieldType::String | FieldType::Map => 4,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldDef {
    pub name: String,
    pub field_type: FieldType,
}

impl FieldDef {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
        }
    }
}

/// Describes the fixed/variable layout of a record and which fields
/// participate in the rolling hash.
#[derive(Clone, Debug)]
pub struct RecordSchema {
    pub fields: Vec<FieldDef>,
    /// Index of the first field treated as a partition (shard) key for the
    /// purpose of `recHash` accumulation (§4.5 rolling hash contract).
    pub first_part_field: usize,
    /// Up to 4096 well-known map keys, interned as a 2-byte `0xF000 | idx`
    /// tag instead of a length-prefixed string.
    pub predefined_keys: Vec<String>,
    field_offsets: Vec<usize>,
    fixed_area_len: usize,
}

const MAX_PREDEFINED_KEYS: usize = 4096;

impl RecordSchema {
    pub fn new(
        fields: Vec<FieldDef>,
        first_part_field: usize,
        predefined_keys: Vec<String>,
    ) -> Result<Self> {
        if predefined_keys.len() > MAX_PREDEFINED_KEYS {
            return errors::TooManyPredefinedKeysSnafu {
                count: predefined_keys.len(),
            }
            .fail();
        }
        let mut field_offsets = Vec::with_capacity(fields.len());
        let mut offset = 0usize;
        for field in &fields {
            field_offsets.push(offset);
            offset += field.field_type.fixed_width();
        }
        Ok(Self {
            fields,
            first_part_field,
            predefined_keys,
            field_offsets,
            fixed_area_len: offset,
        })
    }

    /// Offset of field `i`'s slot relative to the record start (i.e. after
    /// the 4-byte record-length word).
    pub fn field_offset(&self, field_no: usize) -> usize {
        4 + self.field_offsets[field_no]
    }

    pub fn fixed_area_len(&self) -> usize {
        self.fixed_area_len
    }

    /// Index of `key` in the predefined-key table, if registered.
    pub fn predefined_index(&self, key: &str) -> Option<usize> {
        self.predefined_keys.iter().position(|k| k == key)
    }
}

/// `0xF000 | idx` tag for a predefined map key. The `0xF000` prefix can
/// never collide with a valid UTF-8 length prefix because lengths are
/// capped well below `0xF000` (61440 for keys, 65536 only for values which
/// are never tagged).
pub fn predefined_tag(index: usize) -> u16 {
    debug_assert!(index < MAX_PREDEFINED_KEYS);
    0xF000 | (index as u16)
}
