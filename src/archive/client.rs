//! Blocking HTTP implementation of [`MetadataGateway`] against the live archive.
use crate::archive::gateway::{ArchiveError, MetadataGateway, Result};
use crate::archive::item::{Item, MetadataResponse};
use crate::archive::upstream::{
    AdvancedSearchResponse, BookReaderData, BookReaderRequest, FullTextLocator, FullTextResponse,
    ImageInfo, SearchPage, SearchQuery, TimeWindow,
};
use crate::config::ArchiveSettings;
use log::{debug, info, warn};
use reqwest::blocking::{Client, Response};
use std::time::Duration;
use url::Url;

/// Gateway to archive.org's metadata, search, download and image endpoints
pub struct ArchiveClient {
    settings: ArchiveSettings,
    client: Client,
}

impl ArchiveClient {
    /// Create a new archive client
    ///
    /// # Arguments
    /// * `settings` - Archive connection settings
    /// * `user_agent` - User agent sent with every request
    ///
    /// # Returns
    /// * `Result<Self>` - New client instance or error
    pub fn new(settings: ArchiveSettings, user_agent: &str) -> Result<Self> {
        let client = Client::builder()
            .user_agent(user_agent)
            .danger_accept_invalid_certs(!settings.verify_ssl)
            .timeout(Duration::from_secs_f64(settings.timeout))
            .build()?;

        Ok(Self { settings, client })
    }

    fn base_url(&self) -> Result<Url> {
        Url::parse(&self.settings.base_url).map_err(|e| {
            ArchiveError::InvalidConfiguration(format!(
                "Invalid archive URL '{}': {}",
                self.settings.base_url, e
            ))
        })
    }

    /// Build `{base}/{segments...}`, percent-encoding each segment.
    fn make_url<'a>(&self, segments: impl IntoIterator<Item = &'a str>) -> Result<Url> {
        let mut url = self.base_url()?;
        url.path_segments_mut()
            .map_err(|_| {
                ArchiveError::InvalidConfiguration(format!(
                    "Archive URL '{}' cannot be a base",
                    self.settings.base_url
                ))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Construct the download URL of a file, keeping sub-directories of the file name
    fn make_download_url(&self, identifier: &str, filename: &str) -> Result<Url> {
        self.make_url(
            ["download", identifier]
                .into_iter()
                .chain(filename.split('/')),
        )
    }

    /// Send a GET request and fail on non-success statuses
    fn get(&self, url: Url) -> Result<Response> {
        debug!("GET {}", url);
        Ok(self.client.get(url).send()?.error_for_status()?)
    }
}

impl MetadataGateway for ArchiveClient {
    fn item(&self, identifier: &str) -> Result<Item> {
        let url = self.make_url(["metadata", identifier])?;
        info!("Fetching metadata from {}", url);

        let response: MetadataResponse = self.get(url)?.json()?;
        Item::from_response(identifier, response)
            .ok_or_else(|| ArchiveError::NotFound(format!("No such item: {}", identifier)))
    }

    fn search(&self, query: &SearchQuery) -> Result<SearchPage> {
        let mut url = self.make_url(["advancedsearch.php"])?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("q", &query.query);
            for field in &query.fields {
                pairs.append_pair("fl[]", field);
            }
            pairs
                .append_pair("rows", &query.rows.to_string())
                .append_pair("page", &query.page.to_string())
                .append_pair("output", "json");
        }
        info!("Searching {}", url);

        let response: AdvancedSearchResponse = self.get(url)?.json()?;
        Ok(response.response)
    }

    fn book_reader_data(&self, request: &BookReaderRequest) -> Result<Option<BookReaderData>> {
        let url = request.url()?;
        info!("Fetching page stack from {}", url);

        let response = self.client.get(url).send()?;
        if !response.status().is_success() {
            warn!(
                "Page stack of {} unavailable ({})",
                request.identifier,
                response.status()
            );
            return Ok(None);
        }

        BookReaderData::from_jsia(&response.text()?)
    }

    fn ocr_xml(&self, identifier: &str, filename: &str) -> Result<Vec<u8>> {
        let url = self.make_download_url(identifier, filename)?;
        info!("Downloading OCR from {}", url);

        Ok(self.get(url)?.bytes()?.to_vec())
    }

    fn full_text_search(&self, locator: &FullTextLocator, query: &str) -> Result<FullTextResponse> {
        let url = Url::parse(&locator.url(query)).map_err(|e| {
            ArchiveError::MalformedSource(format!("Invalid full-text search URL: {}", e))
        })?;
        info!("Querying full text at {}", url);

        let body = self.get(url)?.text()?;
        serde_json::from_str(&body).map_err(|e| {
            ArchiveError::UpstreamFailure(format!("Unreadable full-text response: {}", e))
        })
    }

    fn subtitle_window(
        &self,
        identifier: &str,
        filename: &str,
        window: TimeWindow,
    ) -> Result<String> {
        let mut url = self.make_download_url(identifier, filename)?;
        url.set_query(Some(&format!("t={}/{}", window.start, window.end)));
        debug!("Fetching subtitle window {}..{}", window.start, window.end);

        Ok(self.get(url)?.text()?)
    }

    fn image_info(&self, service_url: &str) -> Result<ImageInfo> {
        let url = Url::parse(&format!("{}/info.json", service_url)).map_err(|e| {
            ArchiveError::MalformedSource(format!("Invalid image service '{}': {}", service_url, e))
        })?;

        Ok(self.get(url)?.json()?)
    }
}
