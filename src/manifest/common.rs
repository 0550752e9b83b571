//! Descriptive boilerplate shared by every v3 manifest and collection.
use crate::archive::item::Item;
use crate::derivatives::{LinkField, is_thumbnail, link_kind};
use crate::iiif::v3::{
    Agent, Body, Descriptive, ExternalLink, ImageBody, ImageService, LanguageMap, Manifest,
    MetadataEntry, RefKind, Reference,
};
use crate::options::BuildOptions;
use crate::resolver::THUMBNAIL_NAME;
use percent_encoding::utf8_percent_encode;

/// Administrative fields never shown in the metadata list
const EXCLUDED_FIELDS: [&str; 19] = [
    "avg_rating",
    "backup_location",
    "btih",
    "description",
    "downloads",
    "imagecount",
    "indexflag",
    "item_size",
    "licenseurl",
    "curation",
    "noindex",
    "num_reviews",
    "oai_updatedate",
    "publicdate",
    "publisher",
    "reviewdate",
    "scanningcentre",
    "stripped_tags",
    "uploader",
];

/// Width requested from the image server for thumbnails
const THUMBNAIL_WIDTH: u32 = 192;

/// Label of a manifest or collection: every title value, else the identifier.
pub fn item_label(item: &Item, options: &BuildOptions) -> LanguageMap {
    let titles = item.field_values("title");
    if titles.is_empty() {
        options.label(item.identifier.as_str())
    } else {
        LanguageMap::values(&options.label_language, titles)
    }
}

fn provider(options: &BuildOptions) -> Agent {
    Agent::new(
        options.archive_url.as_str(),
        LanguageMap::en("The Internet Archive"),
        vec![ExternalLink {
            id: options.archive_url.clone(),
            kind: "Text".to_string(),
            label: LanguageMap::en("Internet Archive Homepage"),
            format: "text/html".to_string(),
        }],
        vec![Body::Image(ImageBody {
            id: format!("{}/images/glogo.png", options.archive_url),
            format: "image/png".to_string(),
            height: Some(79),
            width: Some(79),
            service: Vec::new(),
        })],
    )
}

/// Provider, homepage, rights, summary, metadata and parent collections of an item.
pub fn descriptive(item: &Item, options: &BuildOptions) -> Descriptive {
    let rights = item
        .field("licenseurl")
        .and_then(|v| v.as_str())
        .map(|url| url.replacen("https", "http", 1));

    let summary = item
        .field("description")
        .map(|_| LanguageMap::values(&options.label_language, item.field_values("description")));

    let metadata = item
        .metadata
        .iter()
        .filter(|(key, _)| !EXCLUDED_FIELDS.contains(&key.as_str()))
        .map(|(key, _)| MetadataEntry {
            label: options.label(key.as_str()),
            value: LanguageMap::values(&options.label_language, item.field_values(key)),
        })
        .collect();

    let part_of = item
        .collections()
        .into_iter()
        .map(|parent| Reference::new(RefKind::Collection, options.collection_id(&parent)))
        .collect();

    Descriptive {
        summary,
        metadata,
        rights,
        provider: vec![provider(options)],
        homepage: vec![ExternalLink {
            id: format!("{}/details/{}", options.archive_url, item.identifier),
            kind: "Text".to_string(),
            label: LanguageMap::en("Item Page on Internet Archive"),
            format: "text/html".to_string(),
        }],
        part_of,
    }
}

/// Files linked from the manifest, split into `seeAlso` and `rendering`.
pub fn links(item: &Item, options: &BuildOptions) -> (Vec<ExternalLink>, Vec<ExternalLink>) {
    let mut see_also = vec![ExternalLink {
        id: format!("{}/metadata/{}", options.archive_url, item.identifier),
        kind: "Metadata".to_string(),
        label: LanguageMap::en("Item Metadata"),
        format: "application/json".to_string(),
    }];
    let mut rendering = Vec::new();

    for file in &item.files {
        let Some(link) = link_kind(&file.format) else {
            continue;
        };
        let entry = ExternalLink {
            id: options.download_url(&item.identifier, &file.name),
            kind: link.kind.to_string(),
            label: LanguageMap::en(file.format.as_str()),
            format: link.format.to_string(),
        };
        match link.field {
            LinkField::SeeAlso => see_also.push(entry),
            LinkField::Rendering => rendering.push(entry),
        }
    }

    (see_also, rendering)
}

/// Thumbnail images served through the v2 image API.
pub fn thumbnails(item: &Item, options: &BuildOptions) -> Vec<Body> {
    item.files
        .iter()
        .filter(|f| is_thumbnail(f))
        .map(|file| {
            let base = file.name.rsplit('/').next().unwrap_or(&file.name);
            let service = format!(
                "{}/2/{}%2f{}",
                options.image_server,
                item.identifier.trim(),
                utf8_percent_encode(base, THUMBNAIL_NAME)
            );
            Body::Image(ImageBody {
                id: format!("{}/full/{},/0/default.jpg", service, THUMBNAIL_WIDTH),
                format: "image/jpeg".to_string(),
                height: None,
                width: None,
                service: vec![ImageService::v2(service)],
            })
        })
        .collect()
}

/// Attach the shared descriptive properties and links to a manifest.
pub fn decorate(manifest: &mut Manifest, item: &Item, options: &BuildOptions) {
    let (see_also, rendering) = links(item, options);
    manifest.descriptive = descriptive(item, options);
    manifest.see_also = see_also;
    manifest.rendering = rendering;
    manifest.thumbnail = thumbnails(item, options);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::item::MetadataResponse;
    use serde_json::json;

    fn sample_item() -> Item {
        let response: MetadataResponse = serde_json::from_value(json!({
            "dir": "/1/items/goody",
            "server": "ia800.us.archive.org",
            "metadata": {
                "identifier": "goody",
                "mediatype": "texts",
                "title": "Goody Two-Shoes",
                "description": ["First line", "Second line"],
                "licenseurl": "https://creativecommons.org/publicdomain/mark/1.0/",
                "collection": ["americana", "cdl"],
                "uploader": "someone@example.org",
                "imagecount": 132
            },
            "files": [
                {"name": "goody.pdf", "source": "derivative", "format": "Text PDF"},
                {"name": "goody_marc.xml", "source": "original", "format": "MARC"},
                {"name": "__ia_thumb.jpg", "source": "original", "format": "Item Tile"},
                {"name": "goody_djvu.xml", "source": "derivative", "format": "Djvu XML"}
            ]
        }))
        .unwrap();
        Item::from_response("goody", response).unwrap()
    }

    #[test]
    fn test_descriptive() {
        let options = BuildOptions::default();
        let descriptive = descriptive(&sample_item(), &options);
        let value = serde_json::to_value(&descriptive).unwrap();

        assert_eq!(value["rights"], "http://creativecommons.org/publicdomain/mark/1.0/");
        assert_eq!(value["summary"], json!({"none": ["First line", "Second line"]}));
        assert_eq!(value["provider"][0]["label"], json!({"en": ["The Internet Archive"]}));
        assert_eq!(value["provider"][0]["logo"][0]["type"], "Image");
        assert_eq!(value["homepage"][0]["id"], "https://archive.org/details/goody");
        assert_eq!(
            value["partOf"],
            json!([
                {"id": "https://iiif.archive.org/iiif/americana/collection.json", "type": "Collection"},
                {"id": "https://iiif.archive.org/iiif/cdl/collection.json", "type": "Collection"}
            ])
        );

        let labels: Vec<&str> = descriptive
            .metadata
            .iter()
            .map(|entry| entry.label.get("none").unwrap()[0].as_str())
            .collect();
        assert_eq!(labels, vec!["identifier", "mediatype", "title", "collection"]);
        assert_eq!(
            serde_json::to_value(&descriptive.metadata[3].value).unwrap(),
            json!({"none": ["americana", "cdl"]})
        );
    }

    #[test]
    fn test_links() {
        let (see_also, rendering) = links(&sample_item(), &BuildOptions::default());

        assert_eq!(see_also[0].id, "https://archive.org/metadata/goody");
        assert_eq!(see_also[0].kind, "Metadata");
        assert_eq!(see_also[1].id, "https://archive.org/download/goody/goody_marc.xml");
        assert_eq!(see_also.len(), 2);

        let formats: Vec<&str> = rendering.iter().map(|r| r.format.as_str()).collect();
        assert_eq!(formats, vec!["application/pdf", "application/xml"]);
        assert_eq!(rendering[0].label, LanguageMap::en("Text PDF"));
    }

    #[test]
    fn test_thumbnails() {
        let thumbnails = thumbnails(&sample_item(), &BuildOptions::default());
        assert_eq!(thumbnails.len(), 1);
        let value = serde_json::to_value(&thumbnails[0]).unwrap();
        assert_eq!(
            value["id"],
            "https://iiif.archive.org/image/iiif/2/goody%2f__ia_thumb.jpg/full/192,/0/default.jpg"
        );
        assert_eq!(value["service"][0]["type"], "ImageService2");
    }
}
