pub(crate) mod codec;
pub(crate) mod kind;

pub(crate) use self::kind::Kind;

use std::io;

use crate::io::{BitWriter, writer::container::slice::records::ExternalDataWriters};

/// An encoding wraps a codec for a single data series.
///
/// Codecs either emit bits into the shared core data block or bytes into the
/// external block they were initialized with.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct Encoding<C>(C);

impl<C> Encoding<C> {
    pub fn new(codec: C) -> Self {
        Self(codec)
    }

    pub fn get(&self) -> &C {
        &self.0
    }

    pub fn encode<'en>(
        &self,
        core_data_writer: &mut BitWriter,
        external_data_writers: &mut ExternalDataWriters,
        value: C::Value,
    ) -> io::Result<()>
    where
        C: Encode<'en>,
    {
        self.0.encode(core_data_writer, external_data_writers, value)
    }
}

pub(crate) trait Encode<'en> {
    type Value;

    fn encode(
        &self,
        core_data_writer: &mut BitWriter,
        external_data_writers: &mut ExternalDataWriters,
        value: Self::Value,
    ) -> io::Result<()>;
}
