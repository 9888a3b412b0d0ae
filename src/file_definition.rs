//! CRAM file definition.

pub mod version;

pub use self::version::Version;

/// A CRAM file definition.
///
/// The file definition holds the format version of the file and a 20-byte
/// file ID.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct FileDefinition {
    version: Version,
    file_id: [u8; 20],
}

impl FileDefinition {
    /// Creates a file definition.
    ///
    /// # Examples
    ///
    /// ```
    /// use crampack::{FileDefinition, file_definition::Version};
    /// let file_definition = FileDefinition::new(Version::new(3, 0), Default::default());
    /// ```
    pub fn new(version: Version, file_id: [u8; 20]) -> Self {
        Self { version, file_id }
    }

    /// Returns the format version.
    pub fn version(&self) -> Version {
        self.version
    }

    /// Returns the file ID.
    pub fn file_id(&self) -> &[u8; 20] {
        &self.file_id
    }
}

impl From<Version> for FileDefinition {
    fn from(version: Version) -> Self {
        Self {
            version,
            ..Default::default()
        }
    }
}
