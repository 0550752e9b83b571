//! Full-text search hits mapped onto canvas regions as a v2 annotation list.
use crate::archive::gateway::{ArchiveError, MetadataGateway, Result};
use crate::archive::item::Item;
use crate::archive::upstream::{FullTextLocator, FullTextMatch, FullTextResponse};
use crate::iiif::v2::{AnnotationList, TextAnnotation};
use crate::options::BuildOptions;
use log::{debug, info, warn};
use scraper::{Html, Selector};
use url::form_urlencoded;

/// Match texts at least this long are not parsed for highlighted spans
pub const LARGE_MATCH_CHARS: usize = 10_000;

const DJVU_SUFFIX: &str = "_djvu.xml";

/// Locate the full-text service of an item. The document name is the part
/// of the first DjVu XML file name before its first underscore.
pub fn full_text_locator(item: &Item) -> Result<FullTextLocator> {
    let doc = item
        .files
        .iter()
        .find(|f| f.name.contains(DJVU_SUFFIX))
        .and_then(|f| f.name.split('_').next())
        .ok_or_else(|| ArchiveError::NotFound(format!("{} has no OCR text", item.identifier)))?;

    let (Some(server), Some(path)) = (&item.server, &item.dir) else {
        return Err(ArchiveError::NotFound(format!(
            "{} has no storage node",
            item.identifier
        )));
    };

    Ok(FullTextLocator {
        server: server.clone(),
        item_id: item.identifier.clone(),
        doc: doc.to_string(),
        path: path.clone(),
    })
}

/// The literal text of every `<IA_FTS_MATCH>` span in a match.
fn highlighted_spans(text: &str) -> Result<Vec<String>> {
    let fragment = Html::parse_fragment(text);
    let selector = Selector::parse("ia_fts_match")
        .map_err(|e| ArchiveError::MalformedSource(format!("Invalid selector: {:?}", e)))?;

    Ok(fragment
        .select(&selector)
        .map(|element| element.text().collect::<String>())
        .collect())
}

/// One string per box of the match's first paragraph.
fn box_texts(hit: &FullTextMatch, boxes: usize, query: &str) -> Result<Vec<String>> {
    if hit.text.chars().count() >= LARGE_MATCH_CHARS {
        return Ok(vec![query.to_string(); boxes]);
    }
    let mut spans = highlighted_spans(&hit.text)?;
    if spans.len() < boxes {
        spans.resize(boxes, query.to_string());
    }
    Ok(spans)
}

fn annotations(
    response: &FullTextResponse,
    identifier: &str,
    query: &str,
    options: &BuildOptions,
) -> Result<Vec<TextAnnotation>> {
    let prefix = &options.uri_prefix;
    let manifest_id = format!("{}/{}/manifest.json", prefix, identifier);
    let mut resources = Vec::new();

    for hit in &response.matches {
        let Some(paragraph) = hit.par.first() else {
            warn!("Search match without a paragraph in {}", identifier);
            continue;
        };
        let texts = box_texts(hit, paragraph.boxes.len(), query)?;
        let page = match response.leaf0_missing {
            Some(false) => paragraph.page,
            _ => paragraph.page - 1,
        };

        for (text_box, chars) in paragraph.boxes.iter().zip(texts) {
            let right = text_box.r.or(paragraph.r).ok_or_else(|| {
                ArchiveError::MalformedSource(format!(
                    "Search box on page {} of {} has no right edge",
                    paragraph.page, identifier
                ))
            })?;
            let (x, y) = (text_box.l, text_box.t);
            let on = format!(
                "{}/{}${}/canvas#xywh={},{},{},{}",
                prefix,
                identifier,
                page,
                x,
                y,
                right - x,
                text_box.b - y
            );
            let id = format!("{}/{}/annotation/anno{}", prefix, identifier, resources.len() + 1);
            resources.push(TextAnnotation::new(id, chars, on, manifest_id.clone()));
        }
    }
    Ok(resources)
}

/// Search an item's text and return one annotation per highlighted box.
///
/// # Arguments
/// * `identifier` - The item to search
/// * `query` - Free text, passed to the full-text service unchanged
///
/// # Returns
/// * `Result<AnnotationList>` - `NotFound` when the item has no OCR text
pub fn build_search(
    gateway: &dyn MetadataGateway,
    identifier: &str,
    query: &str,
    options: &BuildOptions,
) -> Result<AnnotationList> {
    let item = gateway.item(identifier)?;
    let locator = full_text_locator(&item)?;
    info!("Searching text of {} for '{}'", identifier, query);

    let response = gateway.full_text_search(&locator, query)?;
    debug!("{} matches for '{}' in {}", response.matches.len(), query, identifier);

    let encoded: String = form_urlencoded::byte_serialize(query.as_bytes()).collect();
    let mut list = AnnotationList::new(format!(
        "{}/search/{}?q={}",
        options.uri_prefix, identifier, encoded
    ));
    list.resources = annotations(&response, identifier, query, options)?;
    Ok(list)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::fake::FakeGateway;
    use serde_json::{Value, json};

    const IDENTIFIER: &str = "journalofexpedit00ford";

    fn journal(full_text: Value) -> FakeGateway {
        FakeGateway::default()
            .with_item(
                IDENTIFIER,
                json!({
                    "server": "ia601302.us.archive.org",
                    "dir": "/31/items/journalofexpedit00ford",
                    "metadata": {"mediatype": "texts", "title": "Journal of an expedition"},
                    "files": [
                        {"name": "journalofexpedit00ford.pdf", "source": "derivative", "format": "Text PDF"},
                        {"name": "journalofexpedit00ford_djvu.xml", "source": "derivative", "format": "Djvu XML"}
                    ]
                }),
            )
            .with_full_text(IDENTIFIER, full_text)
    }

    fn brunswick() -> Value {
        json!({
            "matches": [
                {
                    "text": "the schooner <IA_FTS_MATCH>Brunswick</IA_FTS_MATCH> lay at anchor",
                    "par": [{
                        "page": 6, "r": 2200,
                        "boxes": [{"l": 1338, "t": 2851, "r": 1675, "b": 2895}]
                    }]
                },
                {
                    "text": "sailed from New <IA_FTS_MATCH>Brunswick</IA_FTS_MATCH>",
                    "par": [{
                        "page": "41", "r": "2100",
                        "boxes": [{"l": "700", "t": "412", "b": "455"}]
                    }]
                }
            ]
        })
    }

    #[test]
    fn test_brunswick() {
        let gateway = journal(brunswick());
        let list = build_search(&gateway, IDENTIFIER, "Brunswick", &BuildOptions::default()).unwrap();

        assert_eq!(list.resources.len(), 2);
        assert!(list.resources.iter().all(|r| r.resource.chars == "Brunswick"));
        assert_eq!(
            list.resources[0].on,
            "https://iiif.archive.org/iiif/journalofexpedit00ford$5/canvas#xywh=1338,2851,337,44"
        );
        assert_eq!(
            list.resources[1].on,
            "https://iiif.archive.org/iiif/journalofexpedit00ford$40/canvas#xywh=700,412,1400,43"
        );
        assert_eq!(
            list.resources[1].id,
            "https://iiif.archive.org/iiif/journalofexpedit00ford/annotation/anno2"
        );
        assert_eq!(
            list.resources[0].within.id,
            "https://iiif.archive.org/iiif/journalofexpedit00ford/manifest.json"
        );
        assert_eq!(
            gateway.full_text_urls.borrow()[0],
            "https://ia601302.us.archive.org/fulltext/inside.php?item_id=journalofexpedit00ford&doc=journalofexpedit00ford&path=/31/items/journalofexpedit00ford&q=Brunswick"
        );

        let value = serde_json::to_value(&list).unwrap();
        assert_eq!(value["@type"], "sc:AnnotationList");
        assert_eq!(value["@id"], "https://iiif.archive.org/iiif/search/journalofexpedit00ford?q=Brunswick");
        assert_eq!(value["resources"][0]["resource"]["@type"], "cnt:ContentAsText");
    }

    #[test]
    fn test_missing_spans_are_padded_with_query() {
        let gateway = journal(json!({
            "matches": [
                {
                    "text": "not <IA_FTS_MATCH>much</IA_FTS_MATCH> further",
                    "par": [{"page": 7, "boxes": [{"l": 271, "t": 682, "r": 425, "b": 723}]}]
                },
                {
                    "text": "how <IA_FTS_MATCH>much</IA_FTS_MATCH> of the coast",
                    "par": [{
                        "page": 7, "r": 1507,
                        "boxes": [
                            {"l": 1479, "t": 1451, "r": 1638, "b": 1493},
                            {"l": 1336, "t": 1520, "b": 1562}
                        ]
                    }]
                }
            ]
        }));
        let list = build_search(&gateway, IDENTIFIER, "much", &BuildOptions::default()).unwrap();
        let hits: Vec<(&str, &str)> = list
            .resources
            .iter()
            .map(|r| (r.resource.chars.as_str(), r.on.rsplit('#').next().unwrap()))
            .collect();

        assert_eq!(
            hits,
            vec![
                ("much", "xywh=271,682,154,41"),
                ("much", "xywh=1479,1451,159,42"),
                ("much", "xywh=1336,1520,171,42"),
            ]
        );
        assert!(list.resources[0].on.contains("journalofexpedit00ford$6/canvas"));
    }

    #[test]
    fn test_spans_keep_their_order() {
        let gateway = journal(json!({
            "matches": [{
                "text": "it gave me <IA_FTS_MATCH>pleasure</IA_FTS_MATCH> <IA_FTS_MATCH>to</IA_FTS_MATCH> <IA_FTS_MATCH>observe</IA_FTS_MATCH>",
                "par": [{
                    "page": 12,
                    "boxes": [
                        {"l": 10, "t": 10, "r": 90, "b": 30},
                        {"l": 95, "t": 10, "r": 120, "b": 30},
                        {"l": 125, "t": 10, "r": 210, "b": 30}
                    ]
                }]
            }],
            "leaf0_missing": false
        }));
        let list = build_search(&gateway, IDENTIFIER, "pleasure to observe", &BuildOptions::default()).unwrap();
        let chars: Vec<&str> = list.resources.iter().map(|r| r.resource.chars.as_str()).collect();

        assert_eq!(chars, vec!["pleasure", "to", "observe"]);
        assert!(list.resources[0].on.contains("$12/canvas"));
        assert!(list.id.ends_with("?q=pleasure+to+observe"));
    }

    #[test]
    fn test_large_match_uses_query() {
        let text = format!("<IA_FTS_MATCH>ship</IA_FTS_MATCH>{}", "x".repeat(LARGE_MATCH_CHARS));
        let gateway = journal(json!({
            "matches": [{
                "text": text,
                "par": [{"page": 2, "boxes": [
                    {"l": 1, "t": 1, "r": 5, "b": 5},
                    {"l": 6, "t": 1, "r": 9, "b": 5}
                ]}]
            }]
        }));
        let list = build_search(&gateway, IDENTIFIER, "Ship", &BuildOptions::default()).unwrap();
        assert_eq!(list.resources.len(), 2);
        assert!(list.resources.iter().all(|r| r.resource.chars == "Ship"));
    }

    #[test]
    fn test_box_without_right_edge() {
        let gateway = journal(json!({
            "matches": [{"text": "x", "par": [{"page": 2, "boxes": [{"l": 1, "t": 1, "b": 5}]}]}]
        }));
        let result = build_search(&gateway, IDENTIFIER, "x", &BuildOptions::default());
        assert!(matches!(result, Err(ArchiveError::MalformedSource(_))));
    }

    #[test]
    fn test_item_without_ocr() {
        let gateway = FakeGateway::default().with_item(
            "img-8664_202009",
            json!({
                "server": "ia800.us.archive.org",
                "dir": "/1/items/img-8664_202009",
                "metadata": {"mediatype": "image"},
                "files": [{"name": "IMG_8664.jpg", "source": "original"}]
            }),
        );
        let result = build_search(&gateway, "img-8664_202009", "x", &BuildOptions::default());
        assert!(matches!(result, Err(ArchiveError::NotFound(_))));
    }
}
