//! TD: the tag sets dictionary.

use noodles_sam::alignment::{
    record::data::field::{Tag, Type},
    record_buf::data::field::Value as ValueBuf,
};

use crate::container::block;

/// The tag dictionary (TD): each entry is the ordered set of tag keys used
/// by one or more records. Records store only their entry index (TL).
pub(crate) type TagSets = Vec<Vec<Key>>;

/// Returns the keys of a record's data fields, in order.
pub(crate) fn keys_for_data(data: &[(Tag, ValueBuf)]) -> Vec<Key> {
    data.iter()
        .map(|(tag, value)| Key::new(*tag, value.ty()))
        .collect()
}

/// Returns the TL index of the tag set matching the keys of `data`.
pub(crate) fn find(tag_sets: &TagSets, data: &[(Tag, ValueBuf)]) -> Option<usize> {
    let keys = keys_for_data(data);
    tag_sets.iter().position(|set| *set == keys)
}

/// A tag dictionary key: the 2-byte tag plus its SAM type.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Key {
    tag: Tag,
    ty: Type,
}

impl Key {
    /// Creates a tag dictionary key.
    pub fn new(tag: Tag, ty: Type) -> Self {
        Self { tag, ty }
    }

    /// Returns the tag.
    pub fn tag(self) -> Tag {
        self.tag
    }

    /// Returns the SAM field type.
    pub fn ty(self) -> Type {
        self.ty
    }

    /// Returns the serialized form: tag bytes followed by the type byte.
    pub(crate) fn bytes(self) -> [u8; 3] {
        let buf: &[u8; 2] = self.tag.as_ref();
        [buf[0], buf[1], ty_to_u8(self.ty)]
    }
}

impl From<Key> for block::ContentId {
    fn from(key: Key) -> Self {
        let [l, r, ty] = key.bytes();
        (i32::from(l) << 16) | (i32::from(r) << 8) | i32::from(ty)
    }
}

fn ty_to_u8(ty: Type) -> u8 {
    match ty {
        Type::Character => b'A',
        Type::Int8 => b'c',
        Type::UInt8 => b'C',
        Type::Int16 => b's',
        Type::UInt16 => b'S',
        Type::Int32 => b'i',
        Type::UInt32 => b'I',
        Type::Float => b'f',
        Type::String => b'Z',
        Type::Hex => b'H',
        Type::Array => b'B',
    }
}
