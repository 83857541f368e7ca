// Entry tree: the user-visible output of a template run
//
// Entries are built by a one-time fold over the allocation ledger after
// interpretation completes. They are plain data, independent of the
// interpreter that produced them.

use crate::eval::stream::Endianness;
use crate::eval::value::{Cell, ValueKind};

/// An annotated, named span of the byte stream.
#[derive(Debug, Clone)]
pub struct Entry {
    pub name: String,
    pub type_name: String,
    pub offset: u64,
    pub size: u64,
    pub endian: Endianness,
    pub fg_color: Option<u32>,
    pub bg_color: Option<u32>,
    pub value: EntryValue,
    pub children: Vec<Entry>,
}

/// Snapshot of a value at fold time.
#[derive(Debug, Clone, PartialEq)]
pub enum EntryValue {
    Null,
    Bool(bool),
    Signed(i64),
    Unsigned(u64),
    Float(f64),
    Str(String),
    Enum { value: i64, variant: Option<String> },
    Struct,
    Union,
    Array,
}

/// Build one entry from a ledger cell, recursing into composite fields and
/// array elements.
pub fn build_entry(name: &str, cell: &Cell) -> Entry {
    let value = cell.borrow();
    let offset = value.origin.offset().unwrap_or(0);

    let (snapshot, children) = match &value.kind {
        ValueKind::Null => (EntryValue::Null, Vec::new()),
        ValueKind::Bool(b) => (EntryValue::Bool(*b), Vec::new()),
        ValueKind::Signed { value, .. } => (EntryValue::Signed(*value), Vec::new()),
        ValueKind::Unsigned { value, .. } => (EntryValue::Unsigned(*value), Vec::new()),
        ValueKind::Float { value, .. } => (EntryValue::Float(*value), Vec::new()),
        ValueKind::Str(s) => (EntryValue::Str(s.to_display_string()), Vec::new()),
        ValueKind::Enum { value, variant, .. } => (
            EntryValue::Enum {
                value: *value,
                variant: variant.clone(),
            },
            Vec::new(),
        ),
        ValueKind::Array { items } => {
            let children = items
                .iter()
                .enumerate()
                .map(|(i, item)| build_entry(&format!("[{}]", i), item))
                .collect();
            (EntryValue::Array, children)
        }
        ValueKind::Composite { fields, is_union } => {
            let children = fields
                .iter()
                .map(|(field_name, field)| build_entry(field_name, field))
                .collect();
            let snapshot = if *is_union {
                EntryValue::Union
            } else {
                EntryValue::Struct
            };
            (snapshot, children)
        }
    };

    Entry {
        name: name.to_string(),
        type_name: value.type_name.clone(),
        offset,
        size: value.size,
        endian: value.endian,
        fg_color: value.fg_color,
        bg_color: value.bg_color,
        value: snapshot,
        children,
    }
}

/// Fold the whole ledger into the entry forest, in declaration order.
pub fn build_forest(ledger: &[(String, Cell)]) -> Vec<Entry> {
    ledger
        .iter()
        .map(|(name, cell)| build_entry(name, cell))
        .collect()
}
