//! Posting records and their binary layout.
//!
//! A record is a run of varints:
//!
//! ```text
//! delta_doc_id
//! [frequency]                     STORE_FREQS
//! [field attribution]             STORE_FIELD_FLAGS
//! [n, n delta positions]          STORE_TERM_OFFSETS
//! [n, n delta byte offsets]       STORE_BYTE_OFFSETS
//! ```
//!
//! Document ids are delta-encoded against the previous record of the same
//! list, so records can only be read front to back.

use std::io::{Read, Write};

use crate::error::{QuiverError, Result};
use crate::index::doc_table::DocId;
use crate::schema::field::FieldId;
use crate::schema::spec::{FieldEncoding, IndexFlags};
use crate::util::varint;

/// Upper bound on entries preallocated for a decoded offset list.
const MAX_PREALLOC: usize = 64;

/// Which parts a posting record carries, and how field identity is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostingLayout {
    flags: IndexFlags,
    encoding: FieldEncoding,
}

impl PostingLayout {
    /// Layout for the given index flags; only the storage bits are kept.
    pub fn new(flags: IndexFlags, encoding: FieldEncoding) -> Self {
        PostingLayout {
            flags: flags
                & (IndexFlags::STORE_FREQS
                    | IndexFlags::STORE_FIELD_FLAGS
                    | IndexFlags::STORE_TERM_OFFSETS
                    | IndexFlags::STORE_BYTE_OFFSETS),
            encoding,
        }
    }

    /// Records made of the document id alone.
    pub fn doc_ids_only() -> Self {
        PostingLayout {
            flags: IndexFlags::empty(),
            encoding: FieldEncoding::Compact,
        }
    }

    pub fn flags(&self) -> IndexFlags {
        self.flags
    }

    pub fn encoding(&self) -> FieldEncoding {
        self.encoding
    }

    pub fn stores_freqs(&self) -> bool {
        self.flags.contains(IndexFlags::STORE_FREQS)
    }

    pub fn stores_field(&self) -> bool {
        self.flags.contains(IndexFlags::STORE_FIELD_FLAGS)
    }

    pub fn stores_positions(&self) -> bool {
        self.flags.contains(IndexFlags::STORE_TERM_OFFSETS)
    }

    pub fn stores_byte_offsets(&self) -> bool {
        self.flags.contains(IndexFlags::STORE_BYTE_OFFSETS)
    }
}

/// One occurrence record: a term (or tag value) in one field of one
/// document.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Posting {
    /// Document ID.
    pub doc_id: DocId,
    /// Occurrences of the term in the field.
    pub frequency: u32,
    /// The field the occurrences came from.
    pub field: Option<FieldId>,
    /// Token positions, ascending.
    pub positions: Vec<u32>,
    /// Byte offsets of each occurrence, ascending.
    pub byte_offsets: Vec<u32>,
}

impl Posting {
    /// A bare posting for `doc_id`.
    pub fn new(doc_id: DocId) -> Self {
        Posting {
            doc_id,
            frequency: 1,
            ..Default::default()
        }
    }

    /// Attribute the posting to `field`.
    pub fn with_field(mut self, field: FieldId) -> Self {
        self.field = Some(field);
        self
    }

    /// Record one occurrence at `position`, starting at `byte_offset`.
    pub fn add_occurrence(&mut self, position: u32, byte_offset: u32) {
        self.positions.push(position);
        self.byte_offsets.push(byte_offset);
        self.frequency = self.positions.len() as u32;
    }

    /// Append the record to `writer`, delta-encoded against `prev_doc_id`.
    /// Returns the number of bytes written.
    pub fn encode<W: Write>(
        &self,
        writer: &mut W,
        prev_doc_id: DocId,
        layout: &PostingLayout,
    ) -> Result<usize> {
        if self.doc_id <= prev_doc_id {
            return Err(QuiverError::index(format!(
                "Posting for document {} cannot follow document {prev_doc_id}",
                self.doc_id
            )));
        }

        let mut written = varint::write_u64(writer, self.doc_id - prev_doc_id)?;
        if layout.stores_freqs() {
            written += varint::write_u32(writer, self.frequency)?;
        }
        if layout.stores_field() {
            let field = self
                .field
                .ok_or_else(|| QuiverError::index("Posting has no field attribution"))?;
            written += varint::write_u64(writer, layout.encoding().encode(field)?)?;
        }
        if layout.stores_positions() {
            written += write_deltas(writer, &self.positions)?;
        }
        if layout.stores_byte_offsets() {
            written += write_deltas(writer, &self.byte_offsets)?;
        }
        Ok(written)
    }

    /// Read one record from `reader`.
    ///
    /// Any truncated or inconsistent record is a decode error; nothing is
    /// guessed.
    pub fn decode<R: Read>(
        reader: &mut R,
        prev_doc_id: DocId,
        layout: &PostingLayout,
    ) -> Result<Self> {
        let delta = varint::read_u64(reader)?;
        if delta == 0 {
            return Err(QuiverError::decode(format!(
                "Zero document delta after document {prev_doc_id}"
            )));
        }
        let doc_id = prev_doc_id
            .checked_add(delta)
            .ok_or_else(|| QuiverError::decode("Document id overflow"))?;

        let mut posting = Posting::new(doc_id);
        if layout.stores_freqs() {
            posting.frequency = varint::read_u32(reader)?;
        }
        if layout.stores_field() {
            let stored = varint::read_u64(reader)?;
            posting.field = Some(layout.encoding().decode(stored)?);
        }
        if layout.stores_positions() {
            posting.positions = read_deltas(reader)?;
            if !layout.stores_freqs() {
                posting.frequency = posting.positions.len() as u32;
            }
        }
        if layout.stores_byte_offsets() {
            posting.byte_offsets = read_deltas(reader)?;
        }
        Ok(posting)
    }
}

fn write_deltas<W: Write>(writer: &mut W, values: &[u32]) -> Result<usize> {
    let mut written = varint::write_u64(writer, values.len() as u64)?;
    let mut prev = 0u32;
    for &value in values {
        let delta = value.checked_sub(prev).ok_or_else(|| {
            QuiverError::index(format!("Offsets must ascend, {value} follows {prev}"))
        })?;
        written += varint::write_u32(writer, delta)?;
        prev = value;
    }
    Ok(written)
}

fn read_deltas<R: Read>(reader: &mut R) -> Result<Vec<u32>> {
    let count = varint::read_u64(reader)?;
    let count = usize::try_from(count)
        .map_err(|_| QuiverError::decode(format!("Offset count {count} out of range")))?;

    let mut values = Vec::with_capacity(count.min(MAX_PREALLOC));
    let mut prev = 0u32;
    for _ in 0..count {
        let delta = varint::read_u32(reader)?;
        prev = prev
            .checked_add(delta)
            .ok_or_else(|| QuiverError::decode("Offset overflow"))?;
        values.push(prev);
    }
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn full_layout(encoding: FieldEncoding) -> PostingLayout {
        PostingLayout::new(IndexFlags::DEFAULT, encoding)
    }

    fn sample(doc_id: DocId, field: FieldId) -> Posting {
        let mut posting = Posting::new(doc_id).with_field(field);
        posting.add_occurrence(1, 5);
        posting.add_occurrence(4, 21);
        posting
    }

    #[test]
    fn test_full_record() {
        let layout = full_layout(FieldEncoding::Compact);
        let mut bytes = Vec::new();
        let first = sample(3, 2);
        let second = sample(10, 2);
        first.encode(&mut bytes, 0, &layout).unwrap();
        second.encode(&mut bytes, 3, &layout).unwrap();

        let mut cursor = Cursor::new(bytes);
        let decoded = Posting::decode(&mut cursor, 0, &layout).unwrap();
        assert_eq!(decoded, first);
        assert_eq!(decoded.frequency, 2);
        let decoded = Posting::decode(&mut cursor, 3, &layout).unwrap();
        assert_eq!(decoded.doc_id, 10);
        assert_eq!(decoded.positions, vec![1, 4]);
        assert_eq!(decoded.byte_offsets, vec![5, 21]);
    }

    #[test]
    fn test_doc_ids_only_layout() {
        let layout = PostingLayout::doc_ids_only();
        let mut bytes = Vec::new();
        let written = sample(200, 7).encode(&mut bytes, 0, &layout).unwrap();
        assert_eq!(written, 2);

        let decoded = Posting::decode(&mut Cursor::new(bytes), 0, &layout).unwrap();
        assert_eq!(decoded, Posting::new(200));
    }

    #[test]
    fn test_encoding_changes_field_bytes() {
        let compact = full_layout(FieldEncoding::Compact);
        let wide = full_layout(FieldEncoding::Wide);

        let mut bytes = Vec::new();
        sample(1, 3).encode(&mut bytes, 0, &compact).unwrap();

        // Reading compact bytes as wide names field 8 instead of field 3.
        let misread = Posting::decode(&mut Cursor::new(bytes.clone()), 0, &wide).unwrap();
        assert_eq!(misread.field, Some(8));
        let read = Posting::decode(&mut Cursor::new(bytes), 0, &compact).unwrap();
        assert_eq!(read.field, Some(3));
    }

    #[test]
    fn test_rejects_out_of_order_documents() {
        let layout = PostingLayout::doc_ids_only();
        let mut bytes = Vec::new();
        assert!(Posting::new(5).encode(&mut bytes, 5, &layout).is_err());
        assert!(bytes.is_empty());
    }

    #[test]
    fn test_truncated_record_fails() {
        let layout = full_layout(FieldEncoding::Compact);
        let mut bytes = Vec::new();
        sample(1, 0).encode(&mut bytes, 0, &layout).unwrap();
        bytes.truncate(bytes.len() - 1);

        let result = Posting::decode(&mut Cursor::new(bytes), 0, &layout);
        assert!(matches!(result, Err(QuiverError::Decode(_))));
    }

    #[test]
    fn test_zero_delta_is_corrupt() {
        let layout = PostingLayout::doc_ids_only();
        let result = Posting::decode(&mut Cursor::new(vec![0u8]), 4, &layout);
        assert!(matches!(result, Err(QuiverError::Decode(_))));
    }
}
