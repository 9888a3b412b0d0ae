bitflags::bitflags! {
    /// CRAM record flags (CF).
    ///
    /// The low four bits are defined by the format and are written to the CF
    /// data series. The remaining bits are writer bookkeeping and are masked
    /// out on the wire (see [`Flags::wire_bits`]).
    #[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
    pub struct Flags: u8 {
        /// Quality scores are stored verbatim in the QS data series.
        const QUALITY_SCORES_ARE_STORED_AS_ARRAY = 0x01;
        /// The mate is not resolvable within this slice.
        const IS_DETACHED = 0x02;
        /// The mate is a downstream record in the same slice.
        const MATE_IS_DOWNSTREAM = 0x04;
        /// The record has no sequence.
        const SEQUENCE_IS_MISSING = 0x08;

        /// The read name is elided (template complete in slice).
        const DISCARD_NAME = 0x10;
        /// Mate field statistics were accumulated for this record.
        const STATS_ADDED = 0x20;
    }
}

impl Flags {
    const WIRE_MASK: u8 = 0x0f;

    /// Returns the format-defined bits written to the CF data series.
    pub fn wire_bits(self) -> u8 {
        self.bits() & Self::WIRE_MASK
    }

    /// Returns whether quality scores are stored verbatim.
    pub fn quality_scores_are_stored_as_array(self) -> bool {
        self.contains(Self::QUALITY_SCORES_ARE_STORED_AS_ARRAY)
    }

    /// Returns whether the record is detached from its mate.
    pub fn is_detached(self) -> bool {
        self.contains(Self::IS_DETACHED)
    }

    /// Returns whether the mate is downstream in the same slice.
    pub fn mate_is_downstream(self) -> bool {
        self.contains(Self::MATE_IS_DOWNSTREAM)
    }

    /// Returns whether the record has no sequence.
    pub fn sequence_is_missing(self) -> bool {
        self.contains(Self::SEQUENCE_IS_MISSING)
    }

    /// Returns whether the read name is discarded.
    pub fn name_is_discarded(self) -> bool {
        self.contains(Self::DISCARD_NAME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_bits() {
        let flags = Flags::IS_DETACHED | Flags::STATS_ADDED | Flags::DISCARD_NAME;
        assert_eq!(flags.wire_bits(), 0x02);

        let flags = Flags::QUALITY_SCORES_ARE_STORED_AS_ARRAY | Flags::MATE_IS_DOWNSTREAM;
        assert_eq!(flags.wire_bits(), 0x05);
    }
}
