use crate::archive::lenient::{self, values_of};
use serde::Deserialize;
use serde_json::{Map, Value};

/// The archive's `mediatype` metadata field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaType {
    Image,
    Texts,
    Audio,
    Etree,
    Movies,
    Collection,
    Unknown(String),
}

impl MediaType {
    pub fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "image" => Self::Image,
            "texts" => Self::Texts,
            "audio" => Self::Audio,
            "etree" => Self::Etree,
            "movies" => Self::Movies,
            "collection" => Self::Collection,
            other => Self::Unknown(other.to_string()),
        }
    }
}

/// Whether a file was uploaded or generated by the archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileSource {
    Original,
    Derivative,
    Metadata,
    #[default]
    #[serde(other)]
    Other,
}

/// A single entry of an item's file listing
#[derive(Debug, Clone, Deserialize)]
pub struct File {
    pub name: String,

    /// Free-text format label, e.g. "VBR MP3" or "Djvu XML"
    #[serde(default)]
    pub format: String,

    #[serde(default)]
    pub source: FileSource,

    /// Name of the original this derivative was generated from
    #[serde(default, deserialize_with = "lenient::opt_first_string")]
    pub original: Option<String>,

    /// Length in seconds for time-based media
    #[serde(default, deserialize_with = "lenient::opt_seconds")]
    pub length: Option<f64>,

    #[serde(default, deserialize_with = "lenient::opt_u32")]
    pub height: Option<u32>,

    #[serde(default, deserialize_with = "lenient::opt_u32")]
    pub width: Option<u32>,
}

impl File {
    pub fn is_original(&self) -> bool {
        self.source == FileSource::Original
    }

    /// File name without its final extension.
    pub fn stem(&self) -> &str {
        self.name
            .rsplit_once('.')
            .map_or(self.name.as_str(), |(stem, _)| stem)
    }
}

/// A user review attached to an item.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Review {
    #[serde(default, rename = "reviewtitle")]
    pub title: String,

    #[serde(default, rename = "reviewbody")]
    pub body: String,

    #[serde(default)]
    pub reviewer: String,

    #[serde(default, rename = "reviewdate")]
    pub date: String,
}

/// Raw shape of `/metadata/{identifier}`. Unknown identifiers come back as `{}`.
#[derive(Debug, Default, Deserialize)]
pub struct MetadataResponse {
    #[serde(default)]
    pub metadata: Option<Map<String, Value>>,

    #[serde(default)]
    pub files: Vec<File>,

    #[serde(default)]
    pub server: Option<String>,

    #[serde(default)]
    pub dir: Option<String>,

    #[serde(default)]
    pub reviews: Vec<Review>,
}

/// An archive item: its metadata fields and file listing.
#[derive(Debug, Clone)]
pub struct Item {
    pub identifier: String,
    pub mediatype: MediaType,
    /// Metadata fields in upstream order
    pub metadata: Map<String, Value>,
    pub files: Vec<File>,
    /// Storage node serving the item, e.g. `ia601302.us.archive.org`
    pub server: Option<String>,
    /// Path of the item on its storage node
    pub dir: Option<String>,
    pub reviews: Vec<Review>,
}

impl Item {
    /// Build an item from a metadata response. Returns `None` when the
    /// response does not describe a stored item.
    pub fn from_response(identifier: &str, response: MetadataResponse) -> Option<Self> {
        let metadata = response.metadata?;
        response.dir.as_ref()?;

        let mediatype = metadata
            .get("mediatype")
            .and_then(Value::as_str)
            .map(MediaType::parse)
            .unwrap_or_else(|| MediaType::Unknown(String::new()));

        Some(Self {
            identifier: identifier.to_string(),
            mediatype,
            metadata,
            files: response.files,
            server: response.server,
            dir: response.dir,
            reviews: response.reviews,
        })
    }

    pub fn field(&self, key: &str) -> Option<&Value> {
        self.metadata.get(key)
    }

    pub fn field_values(&self, key: &str) -> Vec<String> {
        self.field(key).map(values_of).unwrap_or_default()
    }

    /// The item title, falling back to the identifier.
    pub fn title(&self) -> String {
        let titles = self.field_values("title");
        if titles.is_empty() {
            self.identifier.clone()
        } else {
            titles.join(". ")
        }
    }

    /// Parent collections listed in the `collection` field.
    pub fn collections(&self) -> Vec<String> {
        self.field_values("collection")
    }

    pub fn is_access_restricted(&self) -> bool {
        match self.field("access-restricted-item") {
            Some(Value::Bool(flag)) => *flag,
            Some(Value::String(s)) => matches!(s.trim().to_lowercase().as_str(), "true" | "1" | "yes"),
            _ => false,
        }
    }

    pub fn find_file(&self, predicate: impl Fn(&File) -> bool) -> Option<&File> {
        self.files.iter().find(|f| predicate(f))
    }

    /// Name of the first file with the given format label.
    pub fn file_with_format(&self, format: &str) -> Option<&File> {
        self.find_file(|f| f.format == format)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn item(value: Value) -> Option<Item> {
        let response: MetadataResponse = serde_json::from_value(value).unwrap();
        Item::from_response("sample", response)
    }

    #[test]
    fn test_unknown_identifier_is_absent() {
        assert!(item(json!({})).is_none());
        assert!(item(json!({"metadata": {"mediatype": "texts"}})).is_none());
    }

    #[test]
    fn test_item_from_response() {
        let item = item(json!({
            "server": "ia800.us.archive.org",
            "dir": "/1/items/sample",
            "metadata": {
                "identifier": "sample",
                "mediatype": "Movies",
                "title": ["Part one", "Part two"],
                "collection": "opensource_movies",
                "access-restricted-item": "true"
            },
            "files": [
                {"name": "sample.mp4", "source": "original", "format": "MPEG4",
                 "length": "780.89", "height": "480", "width": "640"},
                {"name": "sample.ogv", "source": "derivative", "format": "Ogg Video",
                 "original": "sample.mp4"},
                {"name": "sample_meta.xml", "source": "metadata", "format": "Metadata"},
                {"name": "odd.bin", "source": "checksums"}
            ]
        }))
        .unwrap();

        assert_eq!(item.mediatype, MediaType::Movies);
        assert_eq!(item.title(), "Part one. Part two");
        assert_eq!(item.collections(), vec!["opensource_movies"]);
        assert!(item.is_access_restricted());

        let mp4 = &item.files[0];
        assert!(mp4.is_original());
        assert_eq!(mp4.length, Some(780.89));
        assert_eq!(mp4.height, Some(480));
        assert_eq!(mp4.width, Some(640));
        assert_eq!(mp4.stem(), "sample");
        assert_eq!(item.files[1].original.as_deref(), Some("sample.mp4"));
        assert_eq!(item.files[2].source, FileSource::Metadata);
        assert_eq!(item.files[3].source, FileSource::Other);
    }

    #[test]
    fn test_media_type_parse() {
        assert_eq!(MediaType::parse("image"), MediaType::Image);
        assert_eq!(MediaType::parse("ETREE"), MediaType::Etree);
        assert_eq!(
            MediaType::parse("software"),
            MediaType::Unknown("software".to_string())
        );
    }
}
