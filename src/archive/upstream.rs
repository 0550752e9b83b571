//! Requests and responses exchanged with the archive's auxiliary services:
//! advanced search, the BookReader page stack, full-text search, subtitle
//! windows and the image server.
use crate::archive::gateway::{ArchiveError, Result};
use crate::archive::lenient;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde::Deserialize;
use serde_json::Value;
use url::Url;

/// Length of one subtitle or stream window in seconds
pub const SEGMENT_SECONDS: u64 = 60;

const QUERY_VALUE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// A scoped advanced-search request.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchQuery {
    pub query: String,
    pub fields: Vec<String>,
    pub rows: u32,
    /// 1-indexed result page
    pub page: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchDoc {
    pub identifier: String,

    #[serde(default)]
    pub mediatype: Option<String>,

    #[serde(default)]
    pub title: Option<Value>,

    #[serde(default)]
    pub description: Option<Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchPage {
    #[serde(rename = "numFound")]
    pub num_found: u64,

    #[serde(default)]
    pub docs: Vec<SearchDoc>,
}

#[derive(Debug, Deserialize)]
pub struct AdvancedSearchResponse {
    pub response: SearchPage,
}

/// Parameters of a BookReader page-stack lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct BookReaderRequest {
    pub identifier: String,
    pub server: String,
    pub item_path: String,
    pub sub_prefix: String,
}

impl BookReaderRequest {
    pub fn url(&self) -> Result<Url> {
        let mut url = Url::parse(&format!(
            "https://{}/BookReader/BookReaderJSIA.php",
            self.server
        ))
        .map_err(|e| ArchiveError::MalformedSource(format!("Invalid storage node: {}", e)))?;

        url.query_pairs_mut()
            .append_pair("id", &self.identifier)
            .append_pair("itemPath", &self.item_path)
            .append_pair("server", &self.server)
            .append_pair("format", "jsonp")
            .append_pair("subPrefix", &self.sub_prefix);
        Ok(url)
    }
}

/// One page image of a book stack
#[derive(Debug, Clone, PartialEq)]
pub struct BookPage {
    pub uri: String,
    pub leaf_num: Option<i64>,
    pub page_num: Option<String>,
    pub width: u32,
    pub height: u32,
}

impl BookPage {
    /// The container-internal file named by the `file` query parameter of the page URI.
    pub fn file_name(&self) -> Option<String> {
        let url = Url::parse(&self.uri)
            .or_else(|_| Url::parse("https://archive.org/").and_then(|base| base.join(&self.uri)))
            .ok()?;
        url.query_pairs()
            .find(|(key, _)| key == "file")
            .map(|(_, value)| value.into_owned())
    }

    pub fn label(&self) -> String {
        match (&self.page_num, self.leaf_num) {
            (Some(num), _) if !num.is_empty() => num.clone(),
            (_, Some(leaf)) => leaf.to_string(),
            _ => String::new(),
        }
    }
}

/// The page stack of a paginated text item.
#[derive(Debug, Clone, PartialEq)]
pub struct BookReaderData {
    /// Storage path of the page image container, e.g. `/29/items/goody/goody_jp2.zip`
    pub zip_path: String,
    pub pages: Vec<BookPage>,
    /// Reader default such as `mode/1up` or `mode/2up`
    pub display_mode: Option<String>,
    /// `lr` or `rl`
    pub page_progression: Option<String>,
    pub title: Option<String>,
    pub preview_image: Option<String>,
}

#[derive(Debug, Deserialize)]
struct JsiaResponse {
    #[serde(default)]
    data: Option<JsiaData>,

    #[serde(default)]
    error: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct JsiaData {
    #[serde(rename = "brOptions")]
    br_options: BrOptions,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BrOptions {
    #[serde(default)]
    zip: String,

    #[serde(default)]
    data: Vec<Vec<JsiaPage>>,

    #[serde(default)]
    defaults: Option<String>,

    #[serde(default)]
    page_progression: Option<String>,

    #[serde(default)]
    book_title: Option<String>,

    #[serde(default)]
    thumbnail: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JsiaPage {
    uri: String,

    #[serde(default, deserialize_with = "lenient::opt_i64")]
    leaf_num: Option<i64>,

    #[serde(default, deserialize_with = "lenient::opt_first_string")]
    page_num: Option<String>,

    #[serde(default, deserialize_with = "lenient::opt_u32")]
    width: Option<u32>,

    #[serde(default, deserialize_with = "lenient::opt_u32")]
    height: Option<u32>,
}

impl BookReaderData {
    /// Decode a BookReaderJSIA payload. An `error` payload means the item
    /// has no page stack and yields `None`.
    pub fn from_jsia(body: &str) -> Result<Option<Self>> {
        let response: JsiaResponse = serde_json::from_str(body).map_err(|e| {
            ArchiveError::MalformedSource(format!("Failed to parse BookReader data: {}", e))
        })?;

        if response.error.is_some() {
            return Ok(None);
        }
        let Some(data) = response.data else {
            return Ok(None);
        };

        let options = data.br_options;
        let pages = options
            .data
            .into_iter()
            .flatten()
            .map(|page| BookPage {
                uri: page.uri,
                leaf_num: page.leaf_num,
                page_num: page.page_num,
                width: page.width.unwrap_or_default(),
                height: page.height.unwrap_or_default(),
            })
            .collect();

        Ok(Some(Self {
            zip_path: options.zip,
            pages,
            display_mode: options.defaults,
            page_progression: options.page_progression,
            title: options.book_title,
            preview_image: options.thumbnail,
        }))
    }

    /// The container path relative to the image server root: the last two
    /// segments of the storage path (`goody/goody_jp2.zip`).
    pub fn container_path(&self) -> String {
        let segments: Vec<&str> = self.zip_path.split('/').collect();
        let start = segments.len().saturating_sub(2);
        segments[start..].join("/")
    }
}

/// Where the full-text search service for an item lives.
#[derive(Debug, Clone, PartialEq)]
pub struct FullTextLocator {
    pub server: String,
    pub item_id: String,
    pub doc: String,
    pub path: String,
}

impl FullTextLocator {
    pub fn url(&self, query: &str) -> String {
        format!(
            "https://{}/fulltext/inside.php?item_id={}&doc={}&path={}&q={}",
            self.server,
            self.item_id,
            self.doc,
            self.path,
            utf8_percent_encode(query, QUERY_VALUE)
        )
    }
}

/// A coordinate box of a full-text hit, in page-image pixels.
#[derive(Debug, Clone, Deserialize)]
pub struct TextBox {
    #[serde(deserialize_with = "lenient::i64_field")]
    pub l: i64,

    #[serde(deserialize_with = "lenient::i64_field")]
    pub t: i64,

    #[serde(default, deserialize_with = "lenient::opt_i64")]
    pub r: Option<i64>,

    #[serde(deserialize_with = "lenient::i64_field")]
    pub b: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MatchParagraph {
    /// 1-based page (leaf) number
    #[serde(deserialize_with = "lenient::i64_field")]
    pub page: i64,

    #[serde(default, deserialize_with = "lenient::opt_i64")]
    pub r: Option<i64>,

    #[serde(default)]
    pub boxes: Vec<TextBox>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FullTextMatch {
    /// Matched paragraph text with hits wrapped in `<IA_FTS_MATCH>` tags
    #[serde(default)]
    pub text: String,

    #[serde(default)]
    pub par: Vec<MatchParagraph>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FullTextResponse {
    #[serde(default)]
    pub matches: Vec<FullTextMatch>,

    #[serde(default)]
    pub leaf0_missing: Option<bool>,
}

/// Dimensions reported by an image service `info.json`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct ImageInfo {
    pub width: u32,
    pub height: u32,
}

/// A `[start, end)` slice of a time-based resource in whole seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: u64,
    pub end: u64,
}

impl TimeWindow {
    /// Cut `duration` into consecutive windows of [`SEGMENT_SECONDS`]. There are
    /// `floor(duration / 60)` windows and the last one ends at `floor(duration)`.
    pub fn split(duration: f64) -> Vec<TimeWindow> {
        if !duration.is_finite() || duration <= 0.0 {
            return Vec::new();
        }
        let count = (duration / SEGMENT_SECONDS as f64).floor() as u64;
        (0..count)
            .map(|i| {
                let start = i * SEGMENT_SECONDS;
                let end = if i + 1 == count {
                    duration.floor() as u64
                } else {
                    (i + 1) * SEGMENT_SECONDS
                };
                TimeWindow { start, end }
            })
            .collect()
    }

    pub fn duration(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }
}
