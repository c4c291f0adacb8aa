// Minimal reader for the layout `RecordBuilder` produces. Exists mainly to
// exercise the builder↔reader round-trip law in tests; a production reader
// would be zero-copy over mmap'd containers, which this already is in the
// sense that every accessor borrows from the input slice.

use crate::schema::{FieldType, RecordSchema};

/// A map key as encoded on the wire: either a predefined-table index or an
/// inline UTF-8 string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MapKey {
    Predefined(u16),
    Named(String),
}

/// A parsed view over one record's bytes. Borrows from the container.
pub struct RecordView<'a> {
    schema: &'a RecordSchema,
    /// The record's bytes, starting at its own length word.
    bytes: &'a [u8],
}

fn read_u16(bytes: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes(bytes[offset..offset + 2].try_into().unwrap())
}

fn read_u32(bytes: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes(bytes[offset..offset + 4].try_into().unwrap())
}

fn read_i32(bytes: &[u8], offset: usize) -> i32 {
    read_u32(bytes, offset) as i32
}

fn read_i64(bytes: &[u8], offset: usize) -> i64 {
    i64::from_le_bytes(bytes[offset..offset + 8].try_into().unwrap())
}

fn read_f64(bytes: &[u8], offset: usize) -> f64 {
    f64::from_le_bytes(bytes[offset..offset + 8].try_into().unwrap())
}

impl<'a> RecordView<'a> {
    pub fn record_len(&self) -> u32 {
        read_u32(self.bytes, 0)
    }

    /// Total byte span of this record including its own length word,
    /// word-aligned.
    pub fn total_len(&self) -> usize {
        4 + self.record_len() as usize
    }

    pub fn hash(&self) -> i32 {
        read_i32(self.bytes, self.total_len() - 4)
    }

    pub fn get_int(&self, field_no: usize) -> i32 {
        debug_assert_eq!(self.schema.fields[field_no].field_type, FieldType::Int);
        read_i32(self.bytes, self.schema.field_offset(field_no))
    }

    pub fn get_long(&self, field_no: usize) -> i64 {
        debug_assert_eq!(self.schema.fields[field_no].field_type, FieldType::Long);
        read_i64(self.bytes, self.schema.field_offset(field_no))
    }

    pub fn get_double(&self, field_no: usize) -> f64 {
        debug_assert_eq!(self.schema.fields[field_no].field_type, FieldType::Double);
        read_f64(self.bytes, self.schema.field_offset(field_no))
    }

    pub fn get_string(&self, field_no: usize) -> &'a [u8] {
        debug_assert_eq!(self.schema.fields[field_no].field_type, FieldType::String);
        let rel = read_i32(self.bytes, self.schema.field_offset(field_no)) as usize;
        let len = read_u16(self.bytes, rel) as usize;
        &self.bytes[rel + 2..rel + 2 + len]
    }

    /// Parses a map field into its (key, value) pairs, in on-wire order
    /// (ascending key order, if the map was written via
    /// `add_sorted_pairs_as_map`).
    pub fn get_map(&self, field_no: usize) -> Vec<(MapKey, &'a [u8])> {
        debug_assert_eq!(self.schema.fields[field_no].field_type, FieldType::Map);
        let rel = read_i32(self.bytes, self.schema.field_offset(field_no)) as usize;
        let body_len = read_u32(self.bytes, rel) as usize;
        let body_start = rel + 4;
        let body_end = body_start + body_len;
        let mut out = Vec::new();
        let mut pos = body_start;
        while pos < body_end {
            let tag_or_len = read_u16(self.bytes, pos);
            let key = if tag_or_len & 0xF000 == 0xF000 {
                let idx = tag_or_len & 0x0FFF;
                pos += 2;
                MapKey::Predefined(idx)
            } else {
                let klen = tag_or_len as usize;
                let k = String::from_utf8_lossy(&self.bytes[pos + 2..pos + 2 + klen]).into_owned();
                pos += 2 + klen;
                MapKey::Named(k)
            };
            let vlen = read_u16(self.bytes, pos) as usize;
            let value = &self.bytes[pos + 2..pos + 2 + vlen];
            pos += 2 + vlen;
            out.push((key, value));
        }
        out
    }
}

/// Walks the written prefix of a container (header included) and returns a
/// view per record, in write order.
pub fn read_records<'a>(schema: &'a RecordSchema, container_bytes: &'a [u8]) -> Vec<RecordView<'a>> {
    const HEADER_LEN: usize = 8;
    let written = u32::from_le_bytes(container_bytes[0..4].try_into().unwrap()) as usize;
    let mut out = Vec::new();
    let mut pos = HEADER_LEN;
    let end = HEADER_LEN + written;
    while pos < end {
        let record_bytes = &container_bytes[pos..];
        let view = RecordView {
            schema,
            bytes: record_bytes,
        };
        let total = view.total_len();
        out.push(view);
        pos += total;
    }
    out
}
