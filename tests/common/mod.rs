use crampack as cram;
use noodles_fasta::{
    self as fasta,
    record::{Definition, Sequence},
};
use noodles_sam as sam;

/// Builds an in-memory reference repository with synthetic sequences.
///
/// - sq0: 1000 bp (starts with G, then repeating CCTAAG)
/// - sq1: 200 bp (repeating CCTAAG)
pub fn make_reference_repository() -> fasta::Repository {
    fn make_sequence(prefix: &[u8], repeat: &[u8], total_len: usize) -> Vec<u8> {
        let mut seq = Vec::with_capacity(total_len);
        seq.extend_from_slice(prefix);
        while seq.len() < total_len {
            let remaining = total_len - seq.len();
            let chunk = &repeat[..remaining.min(repeat.len())];
            seq.extend_from_slice(chunk);
        }
        seq
    }

    let records = vec![
        fasta::Record::new(
            Definition::new("sq0", None),
            Sequence::from(make_sequence(b"G", b"CCTAAG", 1000)),
        ),
        fasta::Record::new(
            Definition::new("sq1", None),
            Sequence::from(make_sequence(b"", b"CCTAAG", 200)),
        ),
    ];

    fasta::Repository::new(records)
}

/// SAM header for tests using only sq0.
pub const SINGLE_REFERENCE_HEADER: &str = "@SQ\tSN:sq0\tLN:1000\n";

/// SAM header for tests spanning both references.
pub const TWO_REFERENCE_HEADER: &str = "@SQ\tSN:sq0\tLN:1000\n@SQ\tSN:sq1\tLN:200\n";

pub fn parse_sam(sam_text: &str) -> (sam::Header, Vec<sam::Record>) {
    let mut reader = sam::io::Reader::new(std::io::BufReader::new(sam_text.as_bytes()));
    let header = reader.read_header().unwrap();
    let records: Vec<_> = reader.records().map(|r| r.unwrap()).collect();
    (header, records)
}

/// Returns all CRAM versions supported for writing.
pub fn all_versions() -> Vec<(cram::file_definition::Version, &'static str)> {
    vec![
        (cram::file_definition::Version::new(2, 1), "CRAM 2.1"),
        (cram::file_definition::Version::new(3, 0), "CRAM 3.0"),
        (cram::file_definition::Version::new(4, 0), "CRAM 4.0"),
    ]
}

/// Writes CRAM data to an in-memory buffer.
pub fn write_cram(
    header: &sam::Header,
    records: &[sam::Record],
    repository: &fasta::Repository,
    builder: cram::io::writer::Builder,
) -> Vec<u8> {
    let mut writer = builder
        .set_reference_sequence_repository(repository.clone())
        .build_from_writer(Vec::new());

    writer.write_header(header).unwrap();

    for record in records {
        writer.write_alignment_record(header, record).unwrap();
    }

    writer.try_finish(header).unwrap();

    writer.into_inner()
}
