//! Maps archive identifiers to the paths the image server understands.
//!
//! Images inside page-image containers are addressed by a synthetic nested
//! path: `{identifier}/{container}/{container dir}/{leaf file}`.
use crate::archive::gateway::{ArchiveError, Result};
use crate::archive::item::{File, Item, MediaType};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

/// Extensions the image server can render
pub const IMAGE_EXTENSIONS: [&str; 8] = ["jpg", "jpeg", "png", "gif", "tif", "jp2", "pdf", "tiff"];

/// Characters kept verbatim in a fully encoded image id
pub const IMAGE_ID: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~')
    .remove(b'(')
    .remove(b')');

/// Characters kept verbatim in a thumbnail file name
pub const THUMBNAIL_NAME: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~')
    .remove(b'/');

static IDENTIFIER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z0-9_.\-]+)(?::([A-Za-z0-9_.\-]+))?(?:\$([0-9]+))?$").unwrap()
});

/// A requested `identifier[:subdocument][$leaf]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemRef {
    pub identifier: String,
    pub subdocument: Option<String>,
    pub leaf: Option<u32>,
}

impl ItemRef {
    /// Parse and validate a raw identifier.
    ///
    /// # Returns
    /// * `Result<Self>` - The reference, or `InvalidIdentifier` when the syntax is not allowed
    pub fn parse(raw: &str) -> Result<Self> {
        let captures = IDENTIFIER_RE
            .captures(raw.trim())
            .ok_or_else(|| ArchiveError::InvalidIdentifier(raw.to_string()))?;

        let leaf = captures
            .get(3)
            .map(|m| m.as_str().parse::<u32>())
            .transpose()
            .map_err(|_| ArchiveError::InvalidIdentifier(raw.to_string()))?;

        Ok(Self {
            identifier: captures[1].to_string(),
            subdocument: captures.get(2).map(|m| m.as_str().to_string()),
            leaf,
        })
    }

    pub fn with_leaf(&self, leaf: u32) -> Self {
        Self {
            leaf: Some(leaf),
            ..self.clone()
        }
    }
}

impl fmt::Display for ItemRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.identifier)?;
        if let Some(document) = &self.subdocument {
            write!(f, ":{}", document)?;
        }
        if let Some(leaf) = self.leaf {
            write!(f, "${}", leaf)?;
        }
        Ok(())
    }
}

/// A resolved image location, kept as path segments until it is rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePath {
    segments: Vec<String>,
}

impl ImagePath {
    pub fn new(segments: Vec<String>) -> Self {
        Self { segments }
    }

    /// Split a `/` separated path into segments.
    pub fn from_path(path: &str) -> Self {
        Self::new(path.split('/').map(str::to_string).collect())
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// The image server identifier with `%2f` between segments, e.g.
    /// `goody%2fgoody_jp2.zip%2fgoody_jp2%2fgoody_0001.jp2`.
    pub fn service_id(&self) -> String {
        self.segments
            .iter()
            .map(|segment| segment.replace('/', "%2f").replace(' ', "%20"))
            .collect::<Vec<_>>()
            .join("%2f")
    }

    /// The image server identifier with every reserved character percent-encoded.
    pub fn encoded(&self) -> String {
        utf8_percent_encode(&self.segments.join("/"), IMAGE_ID).to_string()
    }
}

pub fn has_image_extension(name: &str) -> bool {
    let name = name.to_lowercase();
    IMAGE_EXTENSIONS
        .iter()
        .any(|ext| name.ends_with(&format!(".{}", ext)))
}

/// First original file the image server can render, skipping thumbnails.
pub fn primary_image(item: &Item) -> Option<&File> {
    item.find_file(|f| has_image_extension(&f.name) && f.is_original() && !f.name.contains("thumb"))
}

/// Locate one leaf of the page-image container of a text item.
///
/// Containers are tried in order: `{name}_jp2.zip` (case-insensitive, `name`
/// being the subdocument or identifier), any `_jp2.zip`, any `_jp2.tar`, any
/// `_tif.zip`.
pub fn container_leaf(item: &Item, item_ref: &ItemRef, leaf: u32) -> Option<ImagePath> {
    let name = item_ref
        .subdocument
        .as_deref()
        .unwrap_or(&item_ref.identifier);
    let exact = format!("{}_jp2.zip", name.to_lowercase());

    let (container, suffix, extension) = item
        .find_file(|f| f.name.to_lowercase() == exact)
        .map(|f| (f, "_jp2.zip", ".jp2"))
        .or_else(|| {
            item.find_file(|f| f.name.ends_with("_jp2.zip"))
                .map(|f| (f, "_jp2.zip", ".jp2"))
        })
        .or_else(|| {
            item.find_file(|f| f.name.ends_with("_jp2.tar"))
                .map(|f| (f, "_jp2.tar", ".jp2"))
        })
        .or_else(|| {
            item.find_file(|f| f.name.ends_with("_tif.zip"))
                .map(|f| (f, "_tif.zip", ".tif"))
        })?;

    let file_name = &container.name;
    let base = &file_name[..file_name.len() - suffix.len()];
    let dir = &file_name[..file_name.len() - 4];

    Some(ImagePath::new(vec![
        item_ref.identifier.clone(),
        file_name.clone(),
        dir.to_string(),
        format!("{}_{:04}{}", base, leaf, extension),
    ]))
}

/// Resolve a reference to an image path.
///
/// # Arguments
/// * `item` - Metadata of the referenced item
/// * `item_ref` - The requested identifier, optionally with a leaf
///
/// # Returns
/// * `Option<ImagePath>` - `None` when no candidate file exists
pub fn resolve(item: &Item, item_ref: &ItemRef) -> Option<ImagePath> {
    match (&item.mediatype, item_ref.leaf) {
        (MediaType::Image, _) => primary_image(item).map(|f| {
            ImagePath::new(vec![item_ref.identifier.clone(), f.name.clone()])
        }),
        (MediaType::Texts, Some(leaf)) => container_leaf(item, item_ref, leaf),
        _ => None,
    }
}

/// Image to show when an item is rendered as one picture: the primary image,
/// else the requested (or first) leaf of the page-image container.
pub fn single_image(item: &Item, item_ref: &ItemRef) -> Option<ImagePath> {
    primary_image(item)
        .map(|f| ImagePath::new(vec![item_ref.identifier.clone(), f.name.clone()]))
        .or_else(|| container_leaf(item, item_ref, item_ref.leaf.unwrap_or(0)))
}

/// Like [`resolve`], but absence is an error.
pub fn resolve_required(item: &Item, item_ref: &ItemRef) -> Result<ImagePath> {
    resolve(item, item_ref)
        .ok_or_else(|| ArchiveError::NotFound(format!("No image found for {}", item_ref)))
}

/// Image server URL for a resolved path: `info.json` unless an image
/// request such as `full/max/0/default.jpg` is given. Version 2 ids use the
/// legacy `%2f` separators.
pub fn image_request_url(
    image_server: &str,
    version: u8,
    path: &ImagePath,
    request: Option<&str>,
) -> String {
    let id = match version {
        2 => path.service_id(),
        _ => path.encoded(),
    };
    format!(
        "{}/{}/{}/{}",
        image_server,
        version,
        id,
        request.unwrap_or("info.json")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::item::MetadataResponse;
    use serde_json::{Value, json};

    fn item(identifier: &str, mediatype: &str, files: Value) -> Item {
        let response: MetadataResponse = serde_json::from_value(json!({
            "dir": format!("/1/items/{}", identifier),
            "server": "ia800.us.archive.org",
            "metadata": {"identifier": identifier, "mediatype": mediatype},
            "files": files
        }))
        .unwrap();
        Item::from_response(identifier, response).unwrap()
    }

    #[test]
    fn test_parse_item_ref() {
        let plain = ItemRef::parse("kaled_jalil").unwrap();
        assert_eq!(plain.identifier, "kaled_jalil");
        assert_eq!(plain.leaf, None);
        assert_eq!(plain.subdocument, None);

        let leaf = ItemRef::parse("jewishinterpreta00morg$267").unwrap();
        assert_eq!(leaf.leaf, Some(267));
        assert_eq!(leaf.to_string(), "jewishinterpreta00morg$267");

        let sub = ItemRef::parse("bulkitem:volume2$3").unwrap();
        assert_eq!(sub.subdocument.as_deref(), Some("volume2"));
        assert_eq!(sub.leaf, Some(3));
        assert_eq!(sub.to_string(), "bulkitem:volume2$3");
    }

    #[test]
    fn test_parse_rejects_bad_identifiers() {
        for raw in ["", "a/b", "a$b", "a b", "a:b:c", "../etc", "a$1$2"] {
            assert!(
                matches!(ItemRef::parse(raw), Err(ArchiveError::InvalidIdentifier(_))),
                "{} should be rejected",
                raw
            );
        }
    }

    #[test]
    fn test_resolve_image() {
        let item = item(
            "img-8664_202009",
            "image",
            json!([
                {"name": "IMG_8664_thumb.jpg", "source": "original", "format": "JPEG Thumb"},
                {"name": "IMG 8664.jpg", "source": "original", "format": "JPEG"},
                {"name": "IMG_8664.png", "source": "derivative", "format": "PNG"}
            ]),
        );
        let path = resolve(&item, &ItemRef::parse("img-8664_202009").unwrap()).unwrap();
        assert_eq!(path.service_id(), "img-8664_202009%2fIMG%208664.jpg");
        assert_eq!(path.encoded(), "img-8664_202009%2FIMG%208664.jpg");
    }

    #[test]
    fn test_resolve_leaf_exact_container() {
        let item = item(
            "jewishinterpreta00morg",
            "texts",
            json!([
                {"name": "other_jp2.zip", "source": "derivative"},
                {"name": "JewishInterpreta00morg_jp2.zip", "source": "derivative"}
            ]),
        );
        let path = resolve(&item, &ItemRef::parse("jewishinterpreta00morg$267").unwrap()).unwrap();
        assert_eq!(
            path.service_id(),
            "jewishinterpreta00morg%2fJewishInterpreta00morg_jp2.zip%2fJewishInterpreta00morg_jp2%2fJewishInterpreta00morg_0267.jp2"
        );
    }

    #[test]
    fn test_resolve_leaf_fallback_chain() {
        let any_zip = item(
            "fbf_3chords_1_",
            "texts",
            json!([
                {"name": "3chords(1)_jp2.tar", "source": "derivative"},
                {"name": "3chords(1)_jp2.zip", "source": "derivative"}
            ]),
        );
        let item_ref = ItemRef::parse("fbf_3chords_1_$0").unwrap();
        assert_eq!(
            resolve(&any_zip, &item_ref).unwrap().service_id(),
            "fbf_3chords_1_%2f3chords(1)_jp2.zip%2f3chords(1)_jp2%2f3chords(1)_0000.jp2"
        );

        let tar = item("t", "texts", json!([{"name": "t_jp2.tar", "source": "derivative"}]));
        let path = resolve(&tar, &ItemRef::parse("t$12").unwrap()).unwrap();
        assert_eq!(path.segments()[3], "t_0012.jp2");

        let tif = item("t", "texts", json!([{"name": "scan_tif.zip", "source": "derivative"}]));
        let path = resolve(&tif, &ItemRef::parse("t$5").unwrap()).unwrap();
        assert_eq!(path.service_id(), "t%2fscan_tif.zip%2fscan_tif%2fscan_0005.tif");
    }

    #[test]
    fn test_subdocument_selects_container() {
        let item = item(
            "bulkitem",
            "texts",
            json!([
                {"name": "volume1_jp2.zip", "source": "derivative"},
                {"name": "volume2_jp2.zip", "source": "derivative"}
            ]),
        );
        let path = resolve(&item, &ItemRef::parse("bulkitem:volume2$1").unwrap()).unwrap();
        assert_eq!(path.segments()[1], "volume2_jp2.zip");
    }

    #[test]
    fn test_unresolvable() {
        let texts = item("t", "texts", json!([{"name": "t.pdf", "source": "original"}]));
        assert!(resolve(&texts, &ItemRef::parse("t$1").unwrap()).is_none());
        assert!(resolve(&texts, &ItemRef::parse("t").unwrap()).is_none());
        assert!(matches!(
            resolve_required(&texts, &ItemRef::parse("t$1").unwrap()),
            Err(ArchiveError::NotFound(_))
        ));

        let audio = item("a", "audio", json!([{"name": "a.jpg", "source": "original"}]));
        assert!(resolve(&audio, &ItemRef::parse("a").unwrap()).is_none());
    }

    #[test]
    fn test_single_image_falls_back_to_first_leaf() {
        let item = item(
            "0-._20211206",
            "texts",
            json!([{"name": "دراسات_jp2.zip", "source": "derivative"}]),
        );
        let path = single_image(&item, &ItemRef::parse("0-._20211206").unwrap()).unwrap();
        assert_eq!(path.segments()[3], "دراسات_0000.jp2");
        assert!(path.encoded().starts_with("0-._20211206%2F%D8%AF"));
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let item = item(
            "goody",
            "texts",
            json!([{"name": "goody_jp2.zip", "source": "derivative"}]),
        );
        let item_ref = ItemRef::parse("goody$7").unwrap();
        let first = resolve(&item, &item_ref).unwrap().service_id();
        let second = resolve(&item, &item_ref).unwrap().service_id();
        assert_eq!(first, second);
    }

    #[test]
    fn test_image_request_url() {
        let path = ImagePath::from_path("goody/goody_jp2.zip/goody_jp2/goody_0007.jp2");
        assert_eq!(
            image_request_url("https://iiif.archive.org/image/iiif", 2, &path, None),
            "https://iiif.archive.org/image/iiif/2/goody%2fgoody_jp2.zip%2fgoody_jp2%2fgoody_0007.jp2/info.json"
        );
        assert_eq!(
            image_request_url("https://iiif.archive.org/image/iiif", 3, &path, Some("full/max/0/default.jpg")),
            "https://iiif.archive.org/image/iiif/3/goody%2Fgoody_jp2.zip%2Fgoody_jp2%2Fgoody_0007.jp2/full/max/0/default.jpg"
        );
    }
}
