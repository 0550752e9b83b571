//! In-memory [`MetadataGateway`] for unit tests.
use crate::archive::gateway::{ArchiveError, MetadataGateway, Result};
use crate::archive::item::{Item, MetadataResponse};
use crate::archive::upstream::{
    BookReaderData, BookReaderRequest, FullTextLocator, FullTextResponse, ImageInfo, SearchPage,
    SearchQuery, TimeWindow,
};
use serde_json::Value;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};

pub struct FakeGateway {
    items: HashMap<String, Item>,
    search_pages: HashMap<u32, SearchPage>,
    book_data: HashMap<String, BookReaderData>,
    ocr: HashMap<(String, String), Vec<u8>>,
    full_text: HashMap<String, FullTextResponse>,
    subtitles: HashMap<u64, String>,
    images: HashMap<String, ImageInfo>,
    default_image: ImageInfo,
    broken_images: HashSet<String>,
    pub searches: RefCell<Vec<SearchQuery>>,
    pub full_text_urls: RefCell<Vec<String>>,
}

impl Default for FakeGateway {
    fn default() -> Self {
        Self {
            items: HashMap::new(),
            search_pages: HashMap::new(),
            book_data: HashMap::new(),
            ocr: HashMap::new(),
            full_text: HashMap::new(),
            subtitles: HashMap::new(),
            images: HashMap::new(),
            default_image: ImageInfo {
                width: 1200,
                height: 1800,
            },
            broken_images: HashSet::new(),
            searches: RefCell::new(Vec::new()),
            full_text_urls: RefCell::new(Vec::new()),
        }
    }
}

impl FakeGateway {
    /// Register an item from a `/metadata/{identifier}` shaped JSON value.
    pub fn with_item(mut self, identifier: &str, response: Value) -> Self {
        let response: MetadataResponse =
            serde_json::from_value(response).expect("fixture must decode");
        if let Some(item) = Item::from_response(identifier, response) {
            self.items.insert(identifier.to_string(), item);
        }
        self
    }

    pub fn with_search_page(mut self, page: u32, result: SearchPage) -> Self {
        self.search_pages.insert(page, result);
        self
    }

    pub fn with_book_data(mut self, identifier: &str, data: BookReaderData) -> Self {
        self.book_data.insert(identifier.to_string(), data);
        self
    }

    pub fn with_ocr(mut self, identifier: &str, filename: &str, xml: &str) -> Self {
        self.ocr.insert(
            (identifier.to_string(), filename.to_string()),
            xml.as_bytes().to_vec(),
        );
        self
    }

    pub fn with_full_text(mut self, identifier: &str, response: Value) -> Self {
        let response = serde_json::from_value(response).expect("fixture must decode");
        self.full_text.insert(identifier.to_string(), response);
        self
    }

    /// Register the SubRip text served for the window starting at `start`.
    pub fn with_subtitle_window(mut self, start: u64, srt: &str) -> Self {
        self.subtitles.insert(start, srt.to_string());
        self
    }

    pub fn with_image(mut self, service_url: &str, width: u32, height: u32) -> Self {
        self.images
            .insert(service_url.to_string(), ImageInfo { width, height });
        self
    }

    pub fn with_broken_image(mut self, service_url: &str) -> Self {
        self.broken_images.insert(service_url.to_string());
        self
    }
}

impl MetadataGateway for FakeGateway {
    fn item(&self, identifier: &str) -> Result<Item> {
        self.items
            .get(identifier)
            .cloned()
            .ok_or_else(|| ArchiveError::NotFound(format!("No such item: {}", identifier)))
    }

    fn search(&self, query: &SearchQuery) -> Result<SearchPage> {
        self.searches.borrow_mut().push(query.clone());
        Ok(self
            .search_pages
            .get(&query.page)
            .cloned()
            .unwrap_or(SearchPage {
                num_found: 0,
                docs: Vec::new(),
            }))
    }

    fn book_reader_data(&self, request: &BookReaderRequest) -> Result<Option<BookReaderData>> {
        Ok(self.book_data.get(&request.identifier).cloned())
    }

    fn ocr_xml(&self, identifier: &str, filename: &str) -> Result<Vec<u8>> {
        self.ocr
            .get(&(identifier.to_string(), filename.to_string()))
            .cloned()
            .ok_or_else(|| ArchiveError::UpstreamFailure(format!("404 for {}", filename)))
    }

    fn full_text_search(&self, locator: &FullTextLocator, query: &str) -> Result<FullTextResponse> {
        self.full_text_urls.borrow_mut().push(locator.url(query));
        self.full_text
            .get(&locator.item_id)
            .cloned()
            .ok_or_else(|| ArchiveError::UpstreamFailure("full text unavailable".to_string()))
    }

    fn subtitle_window(
        &self,
        _identifier: &str,
        _filename: &str,
        window: TimeWindow,
    ) -> Result<String> {
        Ok(self.subtitles.get(&window.start).cloned().unwrap_or_default())
    }

    fn image_info(&self, service_url: &str) -> Result<ImageInfo> {
        if self.broken_images.contains(service_url) {
            return Err(ArchiveError::UpstreamFailure(format!(
                "500 Internal Server Error for {}/info.json",
                service_url
            )));
        }
        Ok(self
            .images
            .get(service_url)
            .copied()
            .unwrap_or(self.default_image))
    }
}
