//! Per-block compression overrides.

use std::collections::HashMap;

use crate::{
    codecs::Encoder,
    container::{block, compression_header::data_series_encodings::DataSeries},
};

/// A map of block content IDs to compressors.
///
/// By default the writer picks a compression method per block by trying the
/// candidates of the block's method set and keeping the smallest result.
/// This map lets a caller pin a specific compressor (or `None` for raw)
/// for the core data block, a data series block, or a tag value block.
#[derive(Clone, Debug)]
pub struct BlockContentEncoderMap {
    core_data_encoder: Option<Option<Encoder>>,
    data_series_encoders: HashMap<block::ContentId, Option<Encoder>>,
    tag_values_encoders: HashMap<block::ContentId, Option<Encoder>>,
}

impl BlockContentEncoderMap {
    /// Creates a builder.
    ///
    /// # Examples
    ///
    /// ```
    /// use crampack::container::BlockContentEncoderMap;
    /// let builder = BlockContentEncoderMap::builder();
    /// ```
    pub fn builder() -> Builder {
        Builder::default()
    }

    /// Returns the override for the core data block, if any.
    pub(crate) fn core_data_encoder(&self) -> Option<Option<&Encoder>> {
        self.core_data_encoder.as_ref().map(|e| e.as_ref())
    }

    /// Returns the override for a data series block, if any.
    pub(crate) fn get_data_series_encoder(
        &self,
        block_content_id: block::ContentId,
    ) -> Option<Option<&Encoder>> {
        self.data_series_encoders
            .get(&block_content_id)
            .map(|e| e.as_ref())
    }

    /// Returns the override for a tag values block, if any.
    pub(crate) fn get_tag_values_encoder(
        &self,
        block_content_id: block::ContentId,
    ) -> Option<Option<&Encoder>> {
        self.tag_values_encoders
            .get(&block_content_id)
            .map(|e| e.as_ref())
    }
}

impl Default for BlockContentEncoderMap {
    fn default() -> Self {
        Self {
            core_data_encoder: None,
            data_series_encoders: HashMap::new(),
            tag_values_encoders: HashMap::new(),
        }
    }
}

/// A block content-encoder map builder.
#[derive(Default)]
pub struct Builder {
    core_data_encoder: Option<Option<Encoder>>,
    data_series_encoders: HashMap<block::ContentId, Option<Encoder>>,
    tag_values_encoders: HashMap<block::ContentId, Option<Encoder>>,
}

impl Builder {
    /// Pins the compressor for the core data block.
    pub fn set_core_data_encoder(mut self, encoder: Option<Encoder>) -> Self {
        self.core_data_encoder = Some(encoder);
        self
    }

    /// Pins the compressor for a data series block.
    pub fn set_data_series_encoder(
        mut self,
        data_series: DataSeries,
        encoder: Option<Encoder>,
    ) -> Self {
        let block_content_id = block::ContentId::from(data_series);
        self.data_series_encoders.insert(block_content_id, encoder);
        self
    }

    /// Pins the compressor for a tag values block.
    pub fn set_tag_values_encoder(
        mut self,
        block_content_id: block::ContentId,
        encoder: Option<Encoder>,
    ) -> Self {
        self.tag_values_encoders.insert(block_content_id, encoder);
        self
    }

    /// Builds the map.
    pub fn build(self) -> BlockContentEncoderMap {
        BlockContentEncoderMap {
            core_data_encoder: self.core_data_encoder,
            data_series_encoders: self.data_series_encoders,
            tag_values_encoders: self.tag_values_encoders,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides() {
        use flate2::Compression;

        let map = BlockContentEncoderMap::builder()
            .set_core_data_encoder(None)
            .set_data_series_encoder(
                DataSeries::QualityScores,
                Some(Encoder::Gzip(Compression::new(1))),
            )
            .build();

        assert!(matches!(map.core_data_encoder(), Some(None)));

        let id = block::ContentId::from(DataSeries::QualityScores);
        assert!(matches!(
            map.get_data_series_encoder(id),
            Some(Some(Encoder::Gzip(_)))
        ));

        assert!(map.get_data_series_encoder(1).is_none());
        assert!(map.get_tag_values_encoder(0x584943).is_none());
    }
}
