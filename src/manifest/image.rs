//! Canvases painted from the image server, one image per canvas.
use crate::archive::gateway::{ArchiveError, MetadataGateway, Result};
use crate::archive::item::Item;
use crate::iiif::v3::{
    Annotation, AnnotationPage, Body, Canvas, ImageBody, ImageService, LanguageMap, Manifest,
    Motivation,
};
use crate::options::BuildOptions;
use crate::resolver::{ImagePath, ItemRef, single_image};
use log::{info, warn};

const PLACEHOLDER_WIDTH: u32 = 1200;
const PLACEHOLDER_HEIGHT: u32 = 1800;

/// Ids of one image canvas and its painting annotation.
struct CanvasIds {
    canvas: String,
    page: String,
    annotation: String,
}

/// Probe an image service and build a canvas painted with it.
fn image_canvas(
    gateway: &dyn MetadataGateway,
    service: &str,
    ids: CanvasIds,
    label: LanguageMap,
) -> Result<Canvas> {
    let info = gateway.image_info(service)?;

    let mut canvas = Canvas::new(ids.canvas, label);
    canvas.height = Some(info.height);
    canvas.width = Some(info.width);

    let body = Body::Image(ImageBody {
        id: format!("{}/full/max/0/default.jpg", service),
        format: "image/jpeg".to_string(),
        height: Some(info.height),
        width: Some(info.width),
        service: vec![ImageService::v3(service)],
    });
    canvas.items.push(AnnotationPage::new(
        ids.page,
        vec![Annotation::new(
            ids.annotation,
            Motivation::Painting,
            body,
            canvas.id.as_str(),
        )],
    ));
    Ok(canvas)
}

/// A single canvas showing the item's best image.
///
/// # Returns
/// * `Result<()>` - `NotFound` when the item has no renderable image,
///   or the image server error when the probe fails
pub fn build_single_image(
    manifest: &mut Manifest,
    gateway: &dyn MetadataGateway,
    item: &Item,
    item_ref: &ItemRef,
    options: &BuildOptions,
) -> Result<()> {
    let image = single_image(item, item_ref).ok_or_else(|| {
        ArchiveError::NotFound(format!("No image found for {}", item_ref))
    })?;
    let service = service_url(options, &image);
    let uri = format!("{}{}", options.domain, item.identifier);

    info!("Building single image canvas from {}", service);
    let canvas = image_canvas(
        gateway,
        &service,
        CanvasIds {
            canvas: format!("{}/{}/canvas", options.uri_prefix, item.identifier),
            page: format!("{}/annotationPage/1", uri),
            annotation: format!("{}/annotation/1", uri),
        },
        options.label("1"),
    )?;
    manifest.items.push(canvas);
    Ok(())
}

/// One canvas per original file of `format`, in listing order. A failing
/// image probe yields a placeholder canvas describing the failure.
pub fn build_multi_image(
    manifest: &mut Manifest,
    gateway: &dyn MetadataGateway,
    item: &Item,
    format: &str,
    options: &BuildOptions,
) {
    let uri = format!("{}{}", options.domain, item.identifier);
    let files = item
        .files
        .iter()
        .filter(|f| f.is_original() && f.format == format);

    for (i, file) in files.enumerate() {
        let n = i + 1;
        let image = ImagePath::new(vec![item.identifier.clone(), file.name.clone()]);
        let service = service_url(options, &image);
        let canvas_id = format!("{}/{}${}/canvas", options.uri_prefix, item.identifier, n);

        let ids = CanvasIds {
            canvas: canvas_id.clone(),
            page: format!("{}/annotationPage/{}", uri, n),
            annotation: format!("{}/annotation/{}", uri, n),
        };
        let canvas = match image_canvas(gateway, &service, ids, options.label(file.name.as_str())) {
            Ok(canvas) => canvas,
            Err(e) => {
                warn!("Failed to get {}: {}", service, e);
                let mut placeholder = Canvas::new(
                    canvas_id,
                    options.label(format!("Failed to load {} from Image Server", file.name)),
                );
                placeholder.summary = Some(options.label(format!("Got {}", e)));
                placeholder.height = Some(PLACEHOLDER_HEIGHT);
                placeholder.width = Some(PLACEHOLDER_WIDTH);
                placeholder
            }
        };
        manifest.items.push(canvas);
    }
}

fn service_url(options: &BuildOptions, image: &ImagePath) -> String {
    format!("{}/3/{}", options.image_server, image.encoded())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::fake::FakeGateway;
    use serde_json::json;

    fn gateway() -> FakeGateway {
        FakeGateway::default().with_item(
            "img-8664_202009",
            json!({
                "dir": "/1/items/img-8664_202009",
                "server": "ia800.us.archive.org",
                "metadata": {"identifier": "img-8664_202009", "mediatype": "image"},
                "files": [
                    {"name": "IMG_8664_thumb.jpg", "source": "original", "format": "JPEG"},
                    {"name": "IMG_8664.jpg", "source": "original", "format": "JPEG"},
                    {"name": "IMG_8665.jpg", "source": "original", "format": "JPEG"}
                ]
            }),
        )
    }

    #[test]
    fn test_single_image() {
        let gateway = gateway().with_image(
            "https://iiif.archive.org/image/iiif/3/img-8664_202009%2FIMG_8664.jpg",
            4032,
            3024,
        );
        let item = gateway.item("img-8664_202009").unwrap();
        let options = BuildOptions::default();
        let mut manifest = Manifest::new(options.manifest_id(&item.identifier), options.label("x"));
        let item_ref = ItemRef::parse("img-8664_202009").unwrap();
        build_single_image(&mut manifest, &gateway, &item, &item_ref, &options).unwrap();

        let value = serde_json::to_value(&manifest).unwrap();
        let canvas = &value["items"][0];
        assert_eq!(canvas["id"], "https://iiif.archive.org/iiif/img-8664_202009/canvas");
        assert_eq!(canvas["label"], json!({"none": ["1"]}));
        assert_eq!(canvas["width"], 4032);
        assert_eq!(canvas["height"], 3024);
        assert_eq!(
            canvas["items"][0]["id"],
            "https://iiif.archive.org/iiif/img-8664_202009/annotationPage/1"
        );
        assert_eq!(
            canvas["items"][0]["items"][0]["body"]["service"][0]["id"],
            "https://iiif.archive.org/image/iiif/3/img-8664_202009%2FIMG_8664.jpg"
        );
    }

    #[test]
    fn test_single_image_probe_failure_propagates() {
        let gateway = gateway()
            .with_broken_image("https://iiif.archive.org/image/iiif/3/img-8664_202009%2FIMG_8664.jpg");
        let item = gateway.item("img-8664_202009").unwrap();
        let options = BuildOptions::default();
        let mut manifest = Manifest::new(options.manifest_id(&item.identifier), options.label("x"));
        let item_ref = ItemRef::parse("img-8664_202009").unwrap();
        let result = build_single_image(&mut manifest, &gateway, &item, &item_ref, &options);
        assert!(matches!(result, Err(ArchiveError::UpstreamFailure(_))));
    }

    #[test]
    fn test_multi_image_with_placeholder() {
        let gateway = gateway()
            .with_broken_image("https://iiif.archive.org/image/iiif/3/img-8664_202009%2FIMG_8665.jpg");
        let item = gateway.item("img-8664_202009").unwrap();
        let options = BuildOptions::default();
        let mut manifest = Manifest::new(options.manifest_id(&item.identifier), options.label("x"));
        build_multi_image(&mut manifest, &gateway, &item, "JPEG", &options);

        assert_eq!(manifest.items.len(), 3);
        let ids: Vec<&str> = manifest.items.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(
            ids,
            vec![
                "https://iiif.archive.org/iiif/img-8664_202009$1/canvas",
                "https://iiif.archive.org/iiif/img-8664_202009$2/canvas",
                "https://iiif.archive.org/iiif/img-8664_202009$3/canvas",
            ]
        );
        assert_eq!(manifest.items[1].items[0].id, "https://iiif.archive.org/iiif/img-8664_202009/annotationPage/2");

        let failed = &manifest.items[2];
        assert_eq!(
            failed.label,
            options.label("Failed to load IMG_8665.jpg from Image Server")
        );
        assert!(failed.summary.is_some());
        assert_eq!(failed.width, Some(1200));
        assert_eq!(failed.height, Some(1800));
        assert!(failed.items.is_empty());
    }
}
