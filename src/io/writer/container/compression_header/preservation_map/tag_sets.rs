use std::io::{self, Write};

use crate::{
    container::compression_header::preservation_map::{TagSets, tag_sets},
    file_definition::Version,
    io::writer::{Record, collections::write_array},
};

/// Builds the tag dictionary: one entry per distinct ordered tag-key set,
/// in order of first appearance.
pub(super) fn build_tag_sets(records: &[Record]) -> TagSets {
    let mut tag_sets = TagSets::new();

    for record in records {
        let keys = tag_sets::keys_for_data(&record.data);

        if !tag_sets.contains(&keys) {
            tag_sets.push(keys);
        }
    }

    tag_sets
}

/// Writes the dictionary: each entry is its keys' 3-byte serializations
/// followed by a NUL terminator.
pub(super) fn write_tag_sets<W>(
    writer: &mut W,
    tag_sets: &TagSets,
    version: Version,
) -> io::Result<()>
where
    W: Write,
{
    const NUL: u8 = 0x00;

    let mut buf = Vec::new();

    for keys in tag_sets {
        for key in keys {
            buf.extend_from_slice(&key.bytes());
        }

        buf.push(NUL);
    }

    write_array(writer, version, &buf)
}

#[cfg(test)]
mod tests {
    use noodles_sam::alignment::{
        record::data::field::Tag, record_buf::data::field::Value as ValueBuf,
    };

    use super::*;

    #[test]
    fn test_build_tag_sets() {
        let mut with_tags = Record::default();
        with_tags.data = vec![
            (Tag::ALIGNMENT_SCORE, ValueBuf::from(13i32)),
            (Tag::from([b'C', b'O']), ValueBuf::from("hello")),
        ];

        let without_tags = Record::default();
        let with_tags_again = with_tags.clone();

        let records = [with_tags, without_tags, with_tags_again];
        let tag_sets = build_tag_sets(&records);

        assert_eq!(tag_sets.len(), 2);
        assert_eq!(tag_sets[0].len(), 2);
        assert!(tag_sets[1].is_empty());

        // Records with identical ordered key sets share an entry.
        assert_eq!(tag_sets::find(&tag_sets, &records[2].data), Some(0));
        assert_eq!(tag_sets::find(&tag_sets, &records[1].data), Some(1));
    }

    #[test]
    fn test_write_tag_sets() -> io::Result<()> {
        let mut record = Record::default();
        record.data = vec![(Tag::ALIGNMENT_SCORE, ValueBuf::from(13i32))];

        let tag_sets = build_tag_sets(&[record, Record::default()]);

        let mut buf = Vec::new();
        write_tag_sets(&mut buf, &tag_sets, Version::default())?;

        // Int32(13) shrinks happen upstream; the value was stored as i32
        // here, so the type byte is 'i'.
        let expected = [
            0x06, // array length
            b'A', b'S', b'i', 0x00, // { AS:i }
            0x00, // { }
        ];

        assert_eq!(buf, expected);

        Ok(())
    }
}
