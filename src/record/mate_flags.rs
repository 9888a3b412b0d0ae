bitflags::bitflags! {
    /// CRAM record next mate flags (MF).
    #[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
    pub struct MateFlags: u8 {
        /// The mate is on the negative strand.
        const IS_ON_NEGATIVE_STRAND = 0x01;
        /// The mate is unmapped.
        const IS_UNMAPPED = 0x02;
    }
}

impl MateFlags {
    /// Returns whether the mate is on the negative strand.
    pub fn is_on_negative_strand(self) -> bool {
        self.contains(Self::IS_ON_NEGATIVE_STRAND)
    }

    /// Returns whether the mate is unmapped.
    pub fn is_unmapped(self) -> bool {
        self.contains(Self::IS_UNMAPPED)
    }
}
