//! IIIF Presentation 2.1 manifests for viewers that predate v3.
use crate::archive::gateway::{ArchiveError, MetadataGateway, Result};
use crate::archive::item::{Item, MediaType};
use crate::iiif::v2::{self, Canvas, Manifest, MetadataPair, Sequence, Thumbnail};
use crate::manifest::texts::fetch_book_data;
use crate::options::BuildOptions;
use crate::resolver::{ItemRef, resolve_required, single_image};
use log::{debug, info};

/// Canvas id prefix kept from the previous IIIF service
pub const LEGACY_PREFIX: &str = "https://iiif.archivelab.org/iiif";

/// Fields copied into the v2 metadata list, in this order
const METADATA_FIELDS: [&str; 7] = [
    "title",
    "volume",
    "publisher",
    "subject",
    "date",
    "contributor",
    "creator",
];

fn joined(item: &Item, field: &str) -> String {
    item.field_values(field).join(". ")
}

/// A canvas showing the item's single best image, sized from the image server.
fn single_image_canvas(
    gateway: &dyn MetadataGateway,
    item: &Item,
    item_ref: &ItemRef,
    options: &BuildOptions,
) -> Result<Canvas> {
    let image = single_image(item, item_ref)
        .ok_or_else(|| ArchiveError::NotFound(format!("No image found for {}", item_ref)))?;
    let service = format!("{}/2/{}", options.image_server, image.encoded());
    let info = gateway.image_info(&service)?;

    let mut canvas = Canvas::with_image(
        format!("{}/{}/canvas", LEGACY_PREFIX, item.identifier),
        item.title(),
        &service,
        info.width,
        info.height,
    );
    let description = joined(item, "description");
    if !description.is_empty() {
        canvas.description = Some(description);
    }
    Ok(canvas)
}

/// Build the v2 manifest of an item.
///
/// # Arguments
/// * `item_ref` - The requested identifier; a leaf limits a text item to that page
///
/// # Returns
/// * `Result<Manifest>` - `UnsupportedMediaType` for collections
pub fn build_manifest_v2(
    gateway: &dyn MetadataGateway,
    item_ref: &ItemRef,
    options: &BuildOptions,
) -> Result<Manifest> {
    let item = gateway.item(&item_ref.identifier)?;
    if item.mediatype == MediaType::Collection {
        return Err(ArchiveError::UnsupportedMediaType(format!(
            "{} is a collection",
            item.identifier
        )));
    }
    info!("Building v2 manifest for {}", item_ref);

    let metadata = METADATA_FIELDS
        .iter()
        .filter_map(|&field| {
            let value = joined(&item, field);
            (!value.is_empty()).then(|| MetadataPair {
                label: field.to_string(),
                value,
            })
        })
        .collect();

    let mut manifest = Manifest {
        context: v2::CONTEXT,
        id: format!("{}2/{}/manifest.json", options.domain, item.identifier),
        kind: "sc:Manifest",
        label: item.field("title").map(|_| item.title()),
        description: joined(&item, "description"),
        metadata,
        related: item
            .field("identifier-access")
            .and_then(|v| v.as_str())
            .map(str::to_string),
        thumbnail: None,
        attribution: "The Internet Archive",
        logo: format!("{}/images/glogo.png", options.archive_url),
        viewing_hint: "paged",
        see_also: format!("{}/metadata/{}", options.archive_url, item.identifier),
        sequences: Vec::new(),
    };

    let canvases = match item.mediatype {
        MediaType::Texts => match fetch_book_data(gateway, &item)? {
            Some(data) => {
                manifest.label = data.title.clone().or(manifest.label);
                manifest.thumbnail = data.preview_image.clone().map(|id| Thumbnail { id });

                let leaves: Vec<usize> = match item_ref.leaf {
                    Some(leaf) => vec![leaf as usize],
                    None => (0..data.pages.len()).collect(),
                };
                leaves
                    .into_iter()
                    .map(|n| -> Result<Canvas> {
                        let page = data.pages.get(n).ok_or_else(|| {
                            ArchiveError::NotFound(format!("{} has no page {}", item.identifier, n))
                        })?;
                        let image = resolve_required(&item, &item_ref.with_leaf(n as u32))?;
                        Ok(Canvas::with_image(
                            format!("{}/{}${}/canvas", LEGACY_PREFIX, item.identifier, n),
                            page.label(),
                            &format!("{}/2/{}", options.image_server, image.service_id()),
                            page.width,
                            page.height,
                        ))
                    })
                    .collect::<Result<Vec<_>>>()?
            }
            None => vec![single_image_canvas(gateway, &item, item_ref, options)?],
        },
        _ => vec![single_image_canvas(gateway, &item, item_ref, options)?],
    };
    debug!("Built {} v2 canvases for {}", canvases.len(), item.identifier);

    manifest.sequences.push(Sequence {
        id: format!("{}{}/canvas/default", options.domain, item.identifier),
        kind: "sc:Sequence",
        label: "default",
        canvases,
    });
    Ok(manifest)
}
