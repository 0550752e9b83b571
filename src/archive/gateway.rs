use crate::archive::item::Item;
use crate::archive::upstream::{
    BookReaderData, BookReaderRequest, FullTextLocator, FullTextResponse, ImageInfo, SearchPage,
    SearchQuery, TimeWindow,
};
use thiserror::Error;

/// Error types for document building operations
#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Upstream failure: {0}")]
    UpstreamFailure(String),

    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),

    #[error("Malformed source document: {0}")]
    MalformedSource(String),

    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

impl ArchiveError {
    /// Process exit status for the command line boundary.
    pub fn exit_code(&self) -> i32 {
        match self {
            ArchiveError::NotFound(_) => 2,
            ArchiveError::InvalidIdentifier(_) => 3,
            _ => 1,
        }
    }
}

pub type Result<T> = std::result::Result<T, ArchiveError>;

/// Trait defining everything the document builders need from the archive
pub trait MetadataGateway {
    /// Fetch an item's metadata and file listing.
    ///
    /// # Arguments
    /// * `identifier` - The bare item identifier (no leaf or subdocument suffix)
    ///
    /// # Returns
    /// * `Result<Item>` - The item, or `NotFound` when the archive has no such item
    fn item(&self, identifier: &str) -> Result<Item>;

    /// Run an advanced search.
    fn search(&self, query: &SearchQuery) -> Result<SearchPage>;

    /// Fetch the BookReader page stack of a text item.
    ///
    /// # Returns
    /// * `Result<Option<BookReaderData>>` - `None` when the item has no page stack
    fn book_reader_data(&self, request: &BookReaderRequest) -> Result<Option<BookReaderData>>;

    /// Download the raw bytes of an OCR XML file of an item.
    fn ocr_xml(&self, identifier: &str, filename: &str) -> Result<Vec<u8>>;

    /// Query the full-text search service of an item.
    fn full_text_search(&self, locator: &FullTextLocator, query: &str) -> Result<FullTextResponse>;

    /// Fetch the SubRip text of one time window of a subtitle file.
    fn subtitle_window(&self, identifier: &str, filename: &str, window: TimeWindow)
    -> Result<String>;

    /// Fetch the `info.json` of an image service.
    ///
    /// # Arguments
    /// * `service_url` - The image service base URL, without `/info.json`
    fn image_info(&self, service_url: &str) -> Result<ImageInfo>;
}
