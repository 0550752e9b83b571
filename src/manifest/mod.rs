//! IIIF manifests of archive items.
//!
//! A v3 manifest is built by picking one [`Strategy`] from the item's media
//! type and what the archive knows about it, then decorating the result with
//! the descriptive properties every manifest shares.
pub mod av;
pub mod common;
pub mod image;
pub mod texts;
pub mod v2;

use crate::annotations::comments_page_id;
use crate::archive::gateway::{MetadataGateway, Result};
use crate::archive::item::MediaType;
use crate::derivatives::multi_file_format;
use crate::iiif::v3::{AnnotationPage, Manifest};
use crate::options::BuildOptions;
use crate::resolver::ItemRef;
use log::{info, warn};

/// Result of asking for the manifest of an identifier.
#[derive(Debug, Clone, PartialEq)]
pub enum BuildOutcome {
    Manifest(Box<Manifest>),
    /// The identifier names a collection; ask for its collection instead
    IsCollection,
}

/// How the canvases of a manifest are produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Strategy {
    IsCollection,
    BookStack,
    SingleImage,
    MultiImage(String),
    Audio,
    Video,
    RestrictedVideo,
    Unsupported,
}

/// Pick the build strategy of an item.
///
/// # Arguments
/// * `mediatype` - The item's media type
/// * `has_book_data` - Whether the item has a BookReader page stack
/// * `multi_file_format` - Image format shared by several originals, if any
/// * `restricted` - Whether the item is flagged access-restricted
pub fn select_strategy(
    mediatype: &MediaType,
    has_book_data: bool,
    multi_file_format: Option<&str>,
    restricted: bool,
) -> Strategy {
    match (mediatype, has_book_data, multi_file_format, restricted) {
        (MediaType::Collection, ..) => Strategy::IsCollection,
        (MediaType::Texts, true, ..) => Strategy::BookStack,
        (MediaType::Texts, false, ..) => Strategy::SingleImage,
        (MediaType::Image, _, Some(format), _) => Strategy::MultiImage(format.to_string()),
        (MediaType::Image, _, None, _) => Strategy::SingleImage,
        (MediaType::Audio | MediaType::Etree, ..) => Strategy::Audio,
        (MediaType::Movies, .., true) => Strategy::RestrictedVideo,
        (MediaType::Movies, .., false) => Strategy::Video,
        (MediaType::Unknown(_), ..) => Strategy::Unsupported,
    }
}

/// Build the v3 manifest of an item.
///
/// # Arguments
/// * `gateway` - Source of item metadata and auxiliary services
/// * `item_ref` - The requested identifier
/// * `options` - Where the documents are published
///
/// # Returns
/// * `Result<BuildOutcome>` - The manifest, or `IsCollection` for collections
pub fn build_manifest(
    gateway: &dyn MetadataGateway,
    item_ref: &ItemRef,
    options: &BuildOptions,
) -> Result<BuildOutcome> {
    let item = gateway.item(&item_ref.identifier)?;
    if item.mediatype == MediaType::Collection {
        info!("{} is a collection", item.identifier);
        return Ok(BuildOutcome::IsCollection);
    }

    let book_data = match item.mediatype {
        MediaType::Texts => texts::fetch_book_data(gateway, &item)?,
        _ => None,
    };
    let strategy = select_strategy(
        &item.mediatype,
        book_data.is_some(),
        multi_file_format(&item.files),
        item.is_access_restricted(),
    );
    info!("Building manifest for {} as {:?}", item.identifier, strategy);

    let mut manifest = Manifest::new(
        options.manifest_id(&item.identifier),
        common::item_label(&item, options),
    );
    common::decorate(&mut manifest, &item, options);

    match (&strategy, &book_data) {
        (Strategy::BookStack, Some(data)) => {
            texts::build_book_stack(&mut manifest, &item, data, options)
        }
        (Strategy::SingleImage, _) | (Strategy::BookStack, None) => {
            image::build_single_image(&mut manifest, gateway, &item, item_ref, options)?
        }
        (Strategy::MultiImage(format), _) => {
            image::build_multi_image(&mut manifest, gateway, &item, format, options)
        }
        (Strategy::Audio, _) => av::build_audio(&mut manifest, &item, options),
        (Strategy::Video, _) => av::build_video(&mut manifest, &item, options),
        (Strategy::RestrictedVideo, _) => {
            av::build_restricted_video(&mut manifest, &item, options)?
        }
        (Strategy::Unsupported, _) => {
            warn!(
                "Unknown mediatype {:?} for {}, returning an empty manifest",
                item.mediatype, item.identifier
            );
        }
        (Strategy::IsCollection, _) => return Ok(BuildOutcome::IsCollection),
    }

    if item.mediatype == MediaType::Texts {
        texts::attach_ocr(&mut manifest, &item, options);
    }
    if !item.reviews.is_empty() {
        manifest
            .annotations
            .push(AnnotationPage::reference(comments_page_id(options, &item.identifier)));
    }

    Ok(BuildOutcome::Manifest(Box::new(manifest)))
}
