use std::sync::Arc;

use snafu::ensure;

use crate::{
    errors::{self, Result},
    hash::{combine_hash, hash32},
    memory::{Container, MemoryFactory, HEADER_LEN},
    schema::{FieldType, RecordSchema},
};

/// Arena-backed, append-only encoder for records matching one `RecordSchema`.
///
/// **Not thread-safe.** Each instance must be owned by exactly one producer;
/// callers that need concurrency should use one builder per thread/task
/// rather than share one under a lock (§5).
pub struct RecordBuilder {
    schema: Arc<RecordSchema>,
    factory: Arc<dyn MemoryFactory>,
    containers: Vec<Container>,
    cur_container: usize,
    /// Offset, within the current container, of the record-length word of
    /// the record being written (or the next one, if none is in progress).
    cur_record_offset: usize,
    /// Next-write cursor within the current container.
    cur_rec_end_offset: usize,
    max_offset: usize,
    field_no: usize,
    in_record: bool,
    map_header_offset: Option<usize>,
    rec_hash: i32,
}

impl RecordBuilder {
    pub fn new(schema: Arc<RecordSchema>, factory: Arc<dyn MemoryFactory>) -> Self {
        let first = factory.allocate();
        let max_offset = first.capacity();
        Self {
            schema,
            factory,
            containers: vec![first],
            cur_container: 0,
            cur_record_offset: HEADER_LEN,
            cur_rec_end_offset: HEADER_LEN,
            max_offset,
            field_no: 0,
            in_record: false,
            map_header_offset: None,
            rec_hash: 0,
        }
    }

    pub fn schema(&self) -> &RecordSchema {
        &self.schema
    }

    pub fn all_containers(&self) -> &[Container] {
        &self.containers
    }

    pub fn current_container(&self) -> &Container {
        &self.containers[self.cur_container]
    }

    fn container_mut(&mut self) -> &mut Container {
        &mut self.containers[self.cur_container]
    }

    /// Begins a new record. The fixed area is reserved up front so that
    /// `add*` calls can write field slots in place.
    pub fn start_new_record(&mut self) -> Result<()> {
        ensure!(!self.in_record, errors::RecordAlreadyStartedSnafu);
        let fixed_len = self.schema.fixed_area_len();
        self.ensure_capacity(4 + fixed_len)?;
        self.cur_record_offset = self.cur_rec_end_offset;
        // reserve the length word
        self.write_u32(self.cur_rec_end_offset, 0);
        self.cur_rec_end_offset += 4;
        // reserve + zero the fixed area
        let start = self.cur_rec_end_offset;
        self.container_mut().as_mut_slice()[start..start + fixed_len].fill(0);
        self.cur_rec_end_offset += fixed_len;
        self.rec_hash = 7;
        self.field_no = 0;
        self.in_record = true;
        Ok(())
    }

    fn check_field_type(&self, expected: FieldType) -> Result<()> {
        ensure!(self.in_record, errors::NoActiveRecordSnafu);
        let got = self
            .schema
            .fields
            .get(self.field_no)
            .ok_or(())
            .map_err(|_| errors::Error::FieldOrderViolation {
                field_no: self.field_no,
                expected: self.schema.fields.len(),
            })?;
        if got.field_type != expected {
            return errors::UnsupportedColumnTypeSnafu {
                field_no: self.field_no,
            }
            .fail();
        }
        Ok(())
    }

    pub fn add_int(&mut self, value: i32) -> Result<()> {
        self.check_field_type(FieldType::Int)?;
        let offset = self.cur_record_offset + self.schema.field_offset(self.field_no);
        self.write_i32(offset, value);
        self.field_no += 1;
        Ok(())
    }

    pub fn add_long(&mut self, value: i64) -> Result<()> {
        self.check_field_type(FieldType::Long)?;
        let offset = self.cur_record_offset + self.schema.field_offset(self.field_no);
        self.write_i64(offset, value);
        self.field_no += 1;
        Ok(())
    }

    pub fn add_double(&mut self, value: f64) -> Result<()> {
        self.check_field_type(FieldType::Double)?;
        let offset = self.cur_record_offset + self.schema.field_offset(self.field_no);
        self.write_f64(offset, value);
        self.field_no += 1;
        Ok(())
    }

    pub fn add_string(&mut self, bytes: &[u8]) -> Result<()> {
        self.check_field_type(FieldType::String)?;
        ensure!(
            bytes.len() < 65536,
            errors::StringTooLongSnafu { len: bytes.len() }
        );
        self.ensure_capacity(2 + bytes.len())?;
        let rel_offset = self.cur_rec_end_offset - self.cur_record_offset;
        self.write_var_bytes(bytes);
        let field_slot = self.cur_record_offset + self.schema.field_offset(self.field_no);
        self.write_i32(field_slot, rel_offset as i32);
        if self.field_no >= self.schema.first_part_field {
            self.rec_hash = combine_hash(self.rec_hash, hash32(bytes));
        }
        self.field_no += 1;
        Ok(())
    }

    /// Begins a map field. The map's 2-byte-length-or-tag/value pairs are
    /// appended via `add_map_key_value` in caller-supplied order (no
    /// reordering is performed here — see §3.3's sorted-key invariant,
    /// which is the caller's responsibility unless `add_sorted_pairs_as_map`
    /// is used).
    pub fn start_map(&mut self) -> Result<()> {
        self.check_field_type(FieldType::Map)?;
        ensure!(self.map_header_offset.is_none(), errors::AlreadyInMapSnafu);
        self.ensure_capacity(4)?;
        let rel_offset = self.cur_rec_end_offset - self.cur_record_offset;
        let header_offset = self.cur_rec_end_offset;
        self.write_u32(header_offset, 0); // length placeholder
        self.cur_rec_end_offset += 4;
        let field_slot = self.cur_record_offset + self.schema.field_offset(self.field_no);
        self.write_i32(field_slot, rel_offset as i32);
        self.map_header_offset = Some(header_offset);
        Ok(())
    }

    pub fn add_map_key_value(&mut self, key: &str, value: &str) -> Result<()> {
        ensure!(self.map_header_offset.is_some(), errors::NotInMapSnafu);
        let key_bytes = key.as_bytes();
        let value_bytes = value.as_bytes();
        ensure!(
            key_bytes.len() < 61440,
            errors::MapKeyTooLongSnafu { len: key_bytes.len() }
        );
        ensure!(
            value_bytes.len() < 65536,
            errors::MapValueTooLongSnafu { len: value_bytes.len() }
        );
        let predefined = self.schema.predefined_index(key);
        let key_wire_len = match predefined {
            Some(_) => 2,
            None => 2 + key_bytes.len(),
        };
        self.ensure_capacity(key_wire_len + 2 + value_bytes.len())?;
        match predefined {
            Some(idx) => {
                let tag = crate::schema::predefined_tag(idx);
                let off = self.cur_rec_end_offset;
                self.write_u16(off, tag);
                self.cur_rec_end_offset += 2;
            }
            None => self.write_var_bytes(key_bytes),
        }
        self.write_var_bytes(value_bytes);
        Ok(())
    }

    pub fn end_map(&mut self) -> Result<()> {
        let header_offset = self.map_header_offset.take().ok_or(())
            .map_err(|_| errors::Error::NotInMap)?;
        let body_len = (self.cur_rec_end_offset - header_offset - 4) as u32;
        self.write_u32(header_offset, body_len);
        self.field_no += 1;
        Ok(())
    }

    /// Convenience: writes `pairs` (already sorted by key, as produced by
    /// `hash::sort_and_compute_hashes`) as a map, folding `hashes[i]` into
    /// the rolling hash for each pair. Passing unsorted `pairs` is
    /// undefined behavior per §4.5 — callers must sort first.
    pub fn add_sorted_pairs_as_map(&mut self, pairs: &[(String, String)], hashes: &[i32]) -> Result<()> {
        self.start_map()?;
        for ((k, v), h) in pairs.iter().zip(hashes) {
            self.add_map_key_value(k, v)?;
            self.rec_hash = combine_hash(self.rec_hash, *h);
        }
        self.end_map()
    }

    /// Finalizes the current record: writes the rolling hash, word-aligns
    /// the cursor, and updates the container header length. Returns the
    /// record's start offset within its (now current) container.
    pub fn end_record(&mut self, write_hash: bool) -> Result<usize> {
        ensure!(self.in_record, errors::NoActiveRecordSnafu);
        ensure!(
            self.field_no == self.schema.fields.len(),
            errors::RecordIncompleteSnafu {
                got: self.field_no,
                expected: self.schema.fields.len(),
            }
        );
        self.ensure_capacity(4 + 3)?; // hash word + worst-case alignment pad
        let hash_offset = self.cur_rec_end_offset;
        self.write_i32(hash_offset, if write_hash { self.rec_hash } else { 0 });
        self.cur_rec_end_offset += 4;
        while self.cur_rec_end_offset % 4 != 0 {
            self.write_u8(self.cur_rec_end_offset, 0);
            self.cur_rec_end_offset += 1;
        }
        let record_len = (self.cur_rec_end_offset - self.cur_record_offset - 4) as u32;
        self.write_u32(self.cur_record_offset, record_len);
        let record_start = self.cur_record_offset;
        let new_header_len = (self.cur_rec_end_offset - HEADER_LEN) as u32;
        self.container_mut().set_len(new_header_len);
        self.in_record = false;
        self.field_no = 0;
        self.map_header_offset = None;
        Ok(record_start)
    }

    /// Snapshot of all owned bytes: full containers verbatim, the current
    /// one trimmed to its written prefix. If `reset`, the builder drops its
    /// ownership and is left empty (as if freshly constructed).
    pub fn optimal_container_bytes(&mut self, reset: bool) -> Vec<Vec<u8>> {
        let mut out = Vec::with_capacity(self.containers.len());
        for (i, c) in self.containers.iter().enumerate() {
            if i == self.cur_container {
                out.push(c.trimmed_array().to_vec());
            } else {
                out.push(c.array().to_vec());
            }
        }
        if reset {
            let first = self.factory.allocate();
            self.max_offset = first.capacity();
            self.containers = vec![first];
            self.cur_container = 0;
            self.cur_record_offset = HEADER_LEN;
            self.cur_rec_end_offset = HEADER_LEN;
            self.field_no = 0;
            self.in_record = false;
            self.map_header_offset = None;
            self.rec_hash = 0;
        }
        out
    }

    // -- container overflow -------------------------------------------------

    fn ensure_capacity(&mut self, additional: usize) -> Result<()> {
        if self.cur_rec_end_offset + additional <= self.max_offset {
            return Ok(());
        }
        let container_size = self.factory.container_size();
        let record_bytes_so_far = if self.in_record {
            self.cur_rec_end_offset - self.cur_record_offset
        } else {
            0
        };
        let needed = record_bytes_so_far + additional;
        if needed + HEADER_LEN > container_size {
            return errors::RecordTooLargeSnafu {
                size: needed,
                container_size,
            }
            .fail();
        }
        let fresh = self.factory.allocate();
        self.containers.push(fresh);
        let old_idx = self.cur_container;
        let new_idx = self.containers.len() - 1;

        // Copy the in-flight record's bytes to the start of the new
        // container's record area. All intra-record references are
        // relative to the record start, so the raw copy needs no patching.
        // When no record is in progress (e.g. `start_new_record` growing
        // into a full container) there is nothing to carry over.
        let old_bytes = if self.in_record {
            let old = &self.containers[old_idx];
            old.as_slice()[self.cur_record_offset..self.cur_rec_end_offset].to_vec()
        } else {
            Vec::new()
        };
        {
            let new_container = &mut self.containers[new_idx];
            new_container.as_mut_slice()[HEADER_LEN..HEADER_LEN + old_bytes.len()]
                .copy_from_slice(&old_bytes);
        }

        self.cur_container = new_idx;
        self.cur_record_offset = HEADER_LEN;
        self.cur_rec_end_offset = HEADER_LEN + old_bytes.len();
        self.max_offset = self.containers[new_idx].capacity();
        Ok(())
    }

    // -- raw byte helpers -----------------------------------------------------

    fn write_u8(&mut self, offset: usize, value: u8) {
        self.container_mut().as_mut_slice()[offset] = value;
    }

    fn write_u16(&mut self, offset: usize, value: u16) {
        self.container_mut().as_mut_slice()[offset..offset + 2]
            .copy_from_slice(&value.to_le_bytes());
    }

    fn write_u32(&mut self, offset: usize, value: u32) {
        self.container_mut().as_mut_slice()[offset..offset + 4]
            .copy_from_slice(&value.to_le_bytes());
    }

    fn write_i32(&mut self, offset: usize, value: i32) {
        self.write_u32(offset, value as u32);
    }

    fn write_i64(&mut self, offset: usize, value: i64) {
        self.container_mut().as_mut_slice()[offset..offset + 8]
            .copy_from_slice(&value.to_le_bytes());
    }

    fn write_f64(&mut self, offset: usize, value: f64) {
        self.container_mut().as_mut_slice()[offset..offset + 8]
            .copy_from_slice(&value.to_le_bytes());
    }

    fn write_var_bytes(&mut self, bytes: &[u8]) {
        let len_offset = self.cur_rec_end_offset;
        self.write_u16(len_offset, bytes.len() as u16);
        let data_offset = len_offset + 2;
        self.container_mut().as_mut_slice()[data_offset..data_offset + bytes.len()]
            .copy_from_slice(bytes);
        self.cur_rec_end_offset = data_offset + bytes.len();
    }
}
