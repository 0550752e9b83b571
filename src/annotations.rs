//! Annotation pages: positioned OCR words of one page, and item reviews.
use crate::archive::gateway::{ArchiveError, MetadataGateway, Result};
use crate::iiif::v3::{Annotation, AnnotationPage, Body, Motivation, TextualBody};
use crate::options::BuildOptions;
use crate::resolver::IMAGE_ID;
use log::{debug, info};
use percent_encoding::utf8_percent_encode;
use quick_xml::Reader;
use quick_xml::escape::escape;
use quick_xml::events::Event;

/// One OCR word and its box as `l,b,r,t`
#[derive(Debug, Clone, PartialEq)]
struct Word {
    coords: String,
    text: String,
}

/// Id of the OCR annotation page for one page of a DjVu XML file.
pub fn ocr_page_id(
    options: &BuildOptions,
    version: u8,
    identifier: &str,
    file: &str,
    page: u32,
) -> String {
    format!(
        "{}{}/annotations/{}/{}/{}.json",
        options.domain,
        version,
        identifier,
        utf8_percent_encode(file, IMAGE_ID),
        page
    )
}

pub fn comments_page_id(options: &BuildOptions, identifier: &str) -> String {
    format!("{}3/annotations/{}/comments.json", options.domain, identifier)
}

/// Build the annotation page of OCR words for one page.
///
/// # Arguments
/// * `identifier` - Item identifier
/// * `file` - Name of the DjVu XML file inside the item
/// * `page` - 1-based page number, the nth `OBJECT` of the document
/// * `version` - Presentation API version segment of the page id
///
/// # Returns
/// * `Result<AnnotationPage>` - `UpstreamFailure` when the file cannot be fetched,
///   `MalformedSource` when it cannot be parsed or has no such page
pub fn build_ocr_page(
    gateway: &dyn MetadataGateway,
    identifier: &str,
    file: &str,
    page: u32,
    version: u8,
    options: &BuildOptions,
) -> Result<AnnotationPage> {
    if page == 0 {
        return Err(ArchiveError::MalformedSource(
            "Page numbers start at 1".to_string(),
        ));
    }

    info!("Fetching OCR page {} of {} from {}", page, file, identifier);
    let xml = gateway.ocr_xml(identifier, file).map_err(|e| match e {
        ArchiveError::NotFound(_) | ArchiveError::HttpError(_) => {
            ArchiveError::UpstreamFailure(format!("Failed to retrieve {}: {}", file, e))
        }
        other => other,
    })?;
    let xml = std::str::from_utf8(&xml)
        .map_err(|e| ArchiveError::MalformedSource(format!("{} is not UTF-8: {}", file, e)))?;

    let words = page_words(xml, page)?;
    debug!("Found {} words on page {}", words.len(), page);

    let index = page - 1;
    let items = words
        .into_iter()
        .enumerate()
        .map(|(k, word)| -> Result<Annotation> {
            let fragment = xywh(&word.coords)?;
            Ok(Annotation::new(
                format!("{}/{}/canvas/{}/anno/{}", options.uri_prefix, identifier, index, k + 1),
                Motivation::Supplementing,
                Body::TextualBody(TextualBody {
                    format: "text/plain".to_string(),
                    value: word.text,
                }),
                format!("{}/{}${}/canvas#{}", options.uri_prefix, identifier, index, fragment),
            ))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(AnnotationPage::new(ocr_page_id(options, version, identifier, file, page), items).document())
}

/// Convert `l,b,r,t` into a `xywh=x,y,w,h` fragment.
fn xywh(coords: &str) -> Result<String> {
    let values = coords
        .split(',')
        .map(|v| v.trim().parse::<i64>())
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|_| ArchiveError::MalformedSource(format!("Invalid coords: {}", coords)))?;

    let [left, bottom, right, top] = values[..] else {
        return Err(ArchiveError::MalformedSource(format!(
            "Expected four coords, got: {}",
            coords
        )));
    };
    Ok(format!("xywh={},{},{},{}", left, top, right - left, bottom - top))
}

/// Collect the `WORD` elements of the nth `OBJECT`.
fn page_words(xml: &str, page: u32) -> Result<Vec<Word>> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(false);

    let mut objects = 0;
    let mut in_page = false;
    let mut found = false;
    let mut current: Option<Word> = None;
    let mut words = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.name().as_ref() {
                b"OBJECT" => {
                    objects += 1;
                    if objects == page {
                        in_page = true;
                        found = true;
                    }
                }
                b"WORD" if in_page => current = Some(word_start(&e)),
                _ => {}
            },
            Ok(Event::Empty(e)) => match e.name().as_ref() {
                b"OBJECT" => {
                    objects += 1;
                    found |= objects == page;
                }
                b"WORD" if in_page => words.push(word_start(&e)),
                _ => {}
            },
            Ok(Event::Text(e)) => {
                if let Some(word) = current.as_mut() {
                    word.text.push_str(&String::from_utf8_lossy(e.as_ref()));
                }
            }
            Ok(Event::GeneralRef(e)) => {
                if let Some(word) = current.as_mut() {
                    let entity = String::from_utf8_lossy(e.as_ref());
                    if let Some(resolved) = resolve_entity(&entity) {
                        word.text.push_str(&resolved);
                    }
                }
            }
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"WORD" => {
                    if let Some(word) = current.take() {
                        words.push(word);
                    }
                }
                b"OBJECT" if in_page => break,
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(ArchiveError::MalformedSource(format!(
                    "Failed to parse OCR XML at position {}: {}",
                    reader.error_position(),
                    e
                )));
            }
            _ => {}
        }
    }

    if !found {
        return Err(ArchiveError::MalformedSource(format!(
            "Page {} not found, document has {} pages",
            page, objects
        )));
    }
    Ok(words)
}

fn word_start(e: &quick_xml::events::BytesStart) -> Word {
    let coords = e
        .attributes()
        .flatten()
        .find(|attr| attr.key.as_ref() == b"coords")
        .map(|attr| String::from_utf8_lossy(&attr.value).into_owned())
        .unwrap_or_default();
    Word {
        coords,
        text: String::new(),
    }
}

fn resolve_entity(entity: &str) -> Option<String> {
    match entity {
        "apos" => return Some("'".to_string()),
        "quot" => return Some("\"".to_string()),
        "lt" => return Some("<".to_string()),
        "gt" => return Some(">".to_string()),
        "amp" => return Some("&".to_string()),
        _ => {}
    }

    if let Some(hex) = entity.strip_prefix("#x") {
        if let Ok(code) = u32::from_str_radix(hex, 16)
            && let Some(c) = char::from_u32(code)
        {
            return Some(c.to_string());
        }
    } else if let Some(dec) = entity.strip_prefix('#')
        && let Ok(code) = dec.parse::<u32>()
        && let Some(c) = char::from_u32(code)
    {
        return Some(c.to_string());
    }

    None
}

/// Build the page of review comments of an item, each targeting the v3 manifest.
pub fn build_comments_page(
    gateway: &dyn MetadataGateway,
    identifier: &str,
    options: &BuildOptions,
) -> Result<AnnotationPage> {
    let item = gateway.item(identifier)?;
    let page_id = comments_page_id(options, identifier);
    let target = options.manifest_id(identifier);

    let items = item
        .reviews
        .iter()
        .enumerate()
        .map(|(k, review)| {
            let mut html = format!("<h3>{}</h3>", escape(review.title.as_str()));
            html.push_str(&format!("<p>{}</p>", escape(review.body.as_str())));
            if !review.reviewer.is_empty() {
                html.push_str(&format!(
                    "<p>Reviewer: {} {}</p>",
                    escape(review.reviewer.as_str()),
                    escape(review.date.as_str())
                ));
            }
            Annotation::new(
                format!("{}3/annotations/{}/comments/{}", options.domain, identifier, k + 1),
                Motivation::Commenting,
                Body::TextualBody(TextualBody {
                    format: "text/html".to_string(),
                    value: html,
                }),
                target.as_str(),
            )
        })
        .collect();

    Ok(AnnotationPage::new(page_id, items).document())
}
