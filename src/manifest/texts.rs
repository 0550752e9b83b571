//! Paginated text items rendered from their BookReader page stack.
use crate::annotations::ocr_page_id;
use crate::archive::gateway::{MetadataGateway, Result};
use crate::archive::item::{File, Item};
use crate::archive::upstream::{BookReaderData, BookReaderRequest};
use crate::iiif::v3::{
    Annotation, AnnotationPage, Behavior, Body, Canvas, ImageBody, ImageService, Manifest,
    Motivation, SearchService, ViewingDirection,
};
use crate::options::BuildOptions;
use crate::resolver::ImagePath;
use log::{debug, warn};

pub const DJVU_FORMAT: &str = "Djvu XML";

/// The DjVu XML file holding the item's OCR, if any.
pub fn djvu_file(item: &Item) -> Option<&File> {
    item.file_with_format(DJVU_FORMAT)
}

/// The BookReader lookup for an item. The sub-prefix comes from the
/// `_scandata.xml` file name when there is one.
pub fn book_reader_request(item: &Item) -> Option<BookReaderRequest> {
    let server = item.server.clone()?;
    let item_path = item.dir.clone()?;
    let sub_prefix = item
        .files
        .iter()
        .rev()
        .find_map(|f| f.name.strip_suffix("_scandata.xml"))
        .unwrap_or(&item.identifier)
        .to_string();

    Some(BookReaderRequest {
        identifier: item.identifier.clone(),
        server,
        item_path,
        sub_prefix,
    })
}

/// Fetch the page stack of a text item, `None` when it has none.
pub fn fetch_book_data(
    gateway: &dyn MetadataGateway,
    item: &Item,
) -> Result<Option<BookReaderData>> {
    let Some(request) = book_reader_request(item) else {
        warn!("{} has no storage node, skipping the page stack", item.identifier);
        return Ok(None);
    };
    gateway.book_reader_data(&request)
}

/// One canvas per page of the stack, with paging behaviour and reading direction.
pub fn build_book_stack(
    manifest: &mut Manifest,
    item: &Item,
    data: &BookReaderData,
    options: &BuildOptions,
) {
    let uri = format!("{}{}", options.domain, item.identifier);
    let container = data.container_path();

    for (n, page) in data.pages.iter().enumerate() {
        let Some(file_name) = page.file_name() else {
            warn!("Page {} of {} has no image file, skipping", n, item.identifier);
            continue;
        };
        let image = ImagePath::from_path(&format!("{}/{}", container, file_name));
        let service = format!("{}/3/{}", options.image_server, image.encoded());

        let mut canvas = Canvas::new(
            format!("{}/{}${}/canvas", options.uri_prefix, item.identifier, n),
            options.label(page.leaf_num.map_or_else(|| page.label(), |leaf| leaf.to_string())),
        );
        canvas.height = Some(page.height);
        canvas.width = Some(page.width);

        let body = Body::Image(ImageBody {
            id: format!("{}/full/max/0/default.jpg", service),
            format: "image/jpeg".to_string(),
            height: None,
            width: None,
            service: vec![ImageService::v3(service)],
        });
        canvas.items.push(AnnotationPage::new(
            format!("{}/annotationPage/{}", uri, n),
            vec![Annotation::new(
                format!("{}/annotation/{}", uri, n),
                Motivation::Painting,
                body,
                canvas.id.as_str(),
            )],
        ));
        manifest.items.push(canvas);
    }
    debug!("Built {} canvases for {}", manifest.items.len(), item.identifier);

    manifest.behavior = vec![match data.display_mode.as_deref() {
        Some("mode/1up") => Behavior::Individuals,
        _ => Behavior::Paged,
    }];
    manifest.viewing_direction = match data.page_progression.as_deref() {
        Some("lr") => Some(ViewingDirection::LeftToRight),
        Some("rl") => Some(ViewingDirection::RightToLeft),
        _ => None,
    };
}

/// The page-stack leaf a canvas was built from, read back from its `$n` id.
fn canvas_leaf(canvas_id: &str, item: &Item, options: &BuildOptions) -> Option<u32> {
    canvas_id
        .strip_prefix(&format!("{}/{}$", options.uri_prefix, item.identifier))?
        .strip_suffix("/canvas")?
        .parse()
        .ok()
}

/// Reference the OCR page of every canvas and advertise the search service.
///
/// Leaf canvases point at the OCR page of their own leaf, so pages skipped in
/// the stack do not shift later references. Other canvases are numbered by
/// position.
pub fn attach_ocr(manifest: &mut Manifest, item: &Item, options: &BuildOptions) {
    let Some(djvu) = djvu_file(item) else {
        return;
    };

    for (n, canvas) in manifest.items.iter_mut().enumerate() {
        let leaf = canvas_leaf(&canvas.id, item, options).unwrap_or(n as u32);
        canvas.annotations.push(AnnotationPage::reference(ocr_page_id(
            options,
            3,
            &item.identifier,
            &djvu.name,
            leaf.saturating_add(1),
        )));
    }
    manifest.service.push(SearchService::new(format!(
        "{}search/{}",
        options.domain, item.identifier
    )));
}
