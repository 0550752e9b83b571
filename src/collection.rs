//! Paginated v3 collections of the items inside an archive collection.
use crate::archive::gateway::{ArchiveError, MetadataGateway, Result};
use crate::archive::lenient::values_of;
use crate::archive::upstream::SearchQuery;
use crate::iiif::v3::{Collection, LanguageMap, RefKind, Reference};
use crate::manifest::common::{descriptive, item_label};
use crate::options::BuildOptions;
use log::{debug, info};

/// Largest page the search API serves
pub const MAX_ROWS: u32 = 1_000;

/// Results beyond this many cannot be paged through
pub const MAX_RESULTS: u64 = 10_000;

const SEARCH_FIELDS: [&str; 4] = ["identifier", "mediatype", "title", "description"];

fn page_id(options: &BuildOptions, identifier: &str, page: u32) -> String {
    match page {
        1 => options.collection_id(identifier),
        n => format!("{}{}/{}/collection.json", options.domain, identifier, n),
    }
}

/// Build one page of a collection.
///
/// # Arguments
/// * `identifier` - The parent collection identifier
/// * `page` - 1-indexed page
/// * `rows` - Children per page, capped at [`MAX_ROWS`]
///
/// # Returns
/// * `Result<Collection>` - `NotFound` when the page has no children
pub fn build_collection(
    gateway: &dyn MetadataGateway,
    identifier: &str,
    page: u32,
    rows: u32,
    options: &BuildOptions,
) -> Result<Collection> {
    let item = gateway.item(identifier)?;
    let page = page.max(1);
    let rows = rows.clamp(1, MAX_ROWS);

    let query = SearchQuery {
        query: format!("collection:{}", identifier),
        fields: SEARCH_FIELDS.iter().map(|f| f.to_string()).collect(),
        rows,
        page,
    };
    info!("Searching children of {} (page {}, {} rows)", identifier, page, rows);
    let results = gateway.search(&query)?;

    if results.docs.is_empty() {
        return Err(ArchiveError::NotFound(format!(
            "No items found in collection {} on page {}",
            identifier, page
        )));
    }
    let total = results.num_found.min(MAX_RESULTS);
    let pages = total.div_ceil(rows as u64);
    debug!("{} has {} results over {} pages", identifier, total, pages);

    let mut collection = Collection::new(page_id(options, identifier, page), item_label(&item, options));
    collection.descriptive = descriptive(&item, options);

    for doc in &results.docs {
        let (kind, id) = match doc.mediatype.as_deref() {
            Some("collection") => (RefKind::Collection, options.collection_id(&doc.identifier)),
            _ => (RefKind::Manifest, options.manifest_id(&doc.identifier)),
        };
        let titles = doc.title.as_ref().map(values_of).unwrap_or_default();
        let label = if titles.is_empty() {
            options.label(doc.identifier.as_str())
        } else {
            LanguageMap::values(&options.label_language, titles)
        };

        let mut child = Reference::labelled(kind, id, label);
        child.summary = doc
            .description
            .as_ref()
            .map(|d| LanguageMap::values(&options.label_language, values_of(d)));
        collection.items.push(child);
    }

    let next = page.saturating_add(1);
    if u64::from(next) <= pages {
        collection.items.push(Reference::labelled(
            RefKind::Collection,
            page_id(options, identifier, next),
            LanguageMap::en(format!("Page {} of {}", next, pages)),
        ));
    }

    Ok(collection)
}
