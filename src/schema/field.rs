//! Field declarations.

use std::fmt;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::error::{QuiverError, Result};

/// Dense field identity, assigned in declaration order starting at 0.
pub type FieldId = u16;

/// One bit per field, valid for field ids below [`FIELD_MASK_BITS`].
pub type FieldMask = u64;

/// Width of [`FieldMask`]; the compact field encoding cannot address
/// fields past it.
pub const FIELD_MASK_BITS: usize = FieldMask::BITS as usize;

/// Default separator between tag values.
pub const DEFAULT_TAG_SEPARATOR: char = ',';

/// The kind of values a field holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldType {
    /// Tokenized full text.
    Text,
    /// Floating point numbers, queried by range.
    Numeric,
    /// Literal, untokenized values split on a separator.
    Tag,
    /// Longitude/latitude points, queried by radius.
    Geo,
}

impl FieldType {
    /// Upper-case type name.
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Text => "TEXT",
            FieldType::Numeric => "NUMERIC",
            FieldType::Tag => "TAG",
            FieldType::Geo => "GEO",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

bitflags! {
    /// Per-field behavior switches.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct FieldOptions: u8 {
        /// Keep the value in the per-document sorting table.
        const SORTABLE = 0x01;
        /// Do not stem tokens of this field.
        const NOSTEM = 0x02;
        /// Do not index values of this field.
        const NOINDEX = 0x04;
        /// Match query terms by phonetic key as well as literally.
        const PHONETIC = 0x08;
    }
}

/// A declared field of an index.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    name: String,
    field_type: FieldType,
    id: FieldId,
    options: FieldOptions,
    weight: f64,
    tag_separator: char,
    sort_slot: Option<usize>,
}

impl FieldSpec {
    /// Create a field with default options.
    pub fn new<S: Into<String>>(name: S, field_type: FieldType, id: FieldId) -> Self {
        FieldSpec {
            name: name.into(),
            field_type,
            id,
            options: FieldOptions::empty(),
            weight: 1.0,
            tag_separator: DEFAULT_TAG_SEPARATOR,
            sort_slot: None,
        }
    }

    /// Field name as declared.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Case-insensitive name comparison.
    pub fn name_matches(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }

    pub fn field_type(&self) -> FieldType {
        self.field_type
    }

    pub fn id(&self) -> FieldId {
        self.id
    }

    pub fn options(&self) -> FieldOptions {
        self.options
    }

    /// Text weight, 1.0 unless changed.
    pub fn weight(&self) -> f64 {
        self.weight
    }

    pub fn tag_separator(&self) -> char {
        self.tag_separator
    }

    /// Slot in the per-document sorting table, if sortable.
    pub fn sort_slot(&self) -> Option<usize> {
        self.sort_slot
    }

    /// The field's bit in a [`FieldMask`], if its id fits one.
    pub fn bit(&self) -> Option<FieldMask> {
        (usize::from(self.id) < FIELD_MASK_BITS).then(|| 1 << self.id)
    }

    pub fn is_text(&self) -> bool {
        self.field_type == FieldType::Text
    }

    pub fn is_sortable(&self) -> bool {
        self.options.contains(FieldOptions::SORTABLE)
    }

    pub fn is_phonetic(&self) -> bool {
        self.options.contains(FieldOptions::PHONETIC)
    }

    pub fn is_indexed(&self) -> bool {
        !self.options.contains(FieldOptions::NOINDEX)
    }

    /// A text field that takes part in full-text matching.
    pub fn is_searchable_text(&self) -> bool {
        self.is_text() && self.is_indexed()
    }

    /// Replace the option set.
    ///
    /// Phonetic and no-stem apply to text fields only.
    pub(crate) fn set_options(&mut self, options: FieldOptions) -> Result<()> {
        let text_only = FieldOptions::PHONETIC | FieldOptions::NOSTEM;
        if !self.is_text() && options.intersects(text_only) {
            return Err(QuiverError::field(format!(
                "Options {options:?} only apply to TEXT fields, '{}' is {}",
                self.name, self.field_type
            )));
        }
        self.options = options;
        Ok(())
    }

    pub(crate) fn set_weight(&mut self, weight: f64) -> Result<()> {
        if !self.is_text() {
            return Err(QuiverError::field(format!(
                "Weight only applies to TEXT fields, '{}' is {}",
                self.name, self.field_type
            )));
        }
        if !(weight.is_finite() && weight > 0.0) {
            return Err(QuiverError::field(format!("Invalid weight {weight}")));
        }
        self.weight = weight;
        Ok(())
    }

    pub(crate) fn set_tag_separator(&mut self, separator: char) -> Result<()> {
        if self.field_type != FieldType::Tag {
            return Err(QuiverError::field(format!(
                "Separator only applies to TAG fields, '{}' is {}",
                self.name, self.field_type
            )));
        }
        if separator.is_alphanumeric() || separator.is_whitespace() {
            return Err(QuiverError::field(format!(
                "Invalid tag separator {separator:?}"
            )));
        }
        self.tag_separator = separator;
        Ok(())
    }

    pub(crate) fn set_sort_slot(&mut self, slot: usize) {
        self.sort_slot = Some(slot);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let field = FieldSpec::new("Title", FieldType::Text, 3);
        assert!(field.name_matches("title"));
        assert_eq!(field.weight(), 1.0);
        assert_eq!(field.tag_separator(), ',');
        assert_eq!(field.bit(), Some(0b1000));
        assert!(field.is_searchable_text());
        assert!(!field.is_sortable());
    }

    #[test]
    fn test_bit_out_of_mask() {
        let field = FieldSpec::new("wide", FieldType::Text, 64);
        assert_eq!(field.bit(), None);
    }

    #[test]
    fn test_text_only_options() {
        let mut tag = FieldSpec::new("tags", FieldType::Tag, 0);
        assert!(tag.set_options(FieldOptions::PHONETIC).is_err());
        assert!(tag.set_options(FieldOptions::SORTABLE).is_ok());
        assert!(tag.set_weight(2.0).is_err());
        assert!(tag.set_tag_separator(';').is_ok());
        assert!(tag.set_tag_separator('a').is_err());

        let mut text = FieldSpec::new("body", FieldType::Text, 1);
        assert!(text.set_options(FieldOptions::PHONETIC | FieldOptions::NOSTEM).is_ok());
        assert!(text.is_phonetic());
        assert!(text.set_weight(0.0).is_err());
        assert!(text.set_tag_separator(';').is_err());
    }
}
