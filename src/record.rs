//! CRAM record flags.

mod flags;
mod mate_flags;

pub use self::{flags::Flags, mate_flags::MateFlags};
