//! IIIF Presentation API 2.1 document model, used by v2 manifests and search results.
//! Based on: https://iiif.io/api/presentation/2.1/
use serde::Serialize;

pub const CONTEXT: &str = "http://iiif.io/api/presentation/2/context.json";
pub const IMAGE_CONTEXT: &str = "http://iiif.io/api/image/2/context.json";
pub const IMAGE_PROFILE: &str = "https://iiif.io/api/image/2/profiles/level2.json";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetadataPair {
    pub label: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageService {
    #[serde(rename = "@context")]
    pub context: &'static str,

    #[serde(rename = "@id")]
    pub id: String,

    pub profile: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageResource {
    #[serde(rename = "@id")]
    pub id: String,

    #[serde(rename = "@type")]
    pub kind: &'static str,

    pub format: &'static str,
    pub width: u32,
    pub height: u32,
    pub service: ImageService,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageAnnotation {
    #[serde(rename = "@id")]
    pub id: String,

    #[serde(rename = "@type")]
    pub kind: &'static str,

    pub motivation: &'static str,
    pub on: String,
    pub resource: ImageResource,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Canvas {
    #[serde(rename = "@id")]
    pub id: String,

    #[serde(rename = "@type")]
    pub kind: &'static str,

    pub label: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    pub width: u32,
    pub height: u32,
    pub images: Vec<ImageAnnotation>,
}

impl Canvas {
    /// A canvas painted with a single image from an image service.
    ///
    /// # Arguments
    /// * `id` - Canvas id
    /// * `label` - Human readable label
    /// * `service_id` - Image service base URL
    /// * `width`, `height` - Image dimensions
    pub fn with_image(
        id: impl Into<String>,
        label: impl Into<String>,
        service_id: &str,
        width: u32,
        height: u32,
    ) -> Self {
        let id = id.into();
        Self {
            images: vec![ImageAnnotation {
                id: format!("{}/annotation", service_id),
                kind: "oa:Annotation",
                motivation: "sc:painting",
                on: id.clone(),
                resource: ImageResource {
                    id: format!("{}/full/full/0/default.jpg", service_id),
                    kind: "dctypes:Image",
                    format: "image/jpeg",
                    width,
                    height,
                    service: ImageService {
                        context: IMAGE_CONTEXT,
                        id: service_id.to_string(),
                        profile: IMAGE_PROFILE,
                    },
                },
            }],
            id,
            kind: "sc:Canvas",
            label: label.into(),
            description: None,
            width,
            height,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sequence {
    #[serde(rename = "@id")]
    pub id: String,

    #[serde(rename = "@type")]
    pub kind: &'static str,

    pub label: &'static str,
    pub canvases: Vec<Canvas>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Thumbnail {
    #[serde(rename = "@id")]
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    #[serde(rename = "@context")]
    pub context: &'static str,

    #[serde(rename = "@id")]
    pub id: String,

    #[serde(rename = "@type")]
    pub kind: &'static str,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    pub description: String,
    pub metadata: Vec<MetadataPair>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub related: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<Thumbnail>,

    pub attribution: &'static str,
    pub logo: String,
    pub viewing_hint: &'static str,
    pub see_also: String,
    pub sequences: Vec<Sequence>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContentAsText {
    #[serde(rename = "@type")]
    pub kind: &'static str,

    pub chars: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Within {
    #[serde(rename = "@id")]
    pub id: String,

    #[serde(rename = "type")]
    pub kind: &'static str,
}

/// One positioned search hit
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextAnnotation {
    #[serde(rename = "@id")]
    pub id: String,

    #[serde(rename = "@type")]
    pub kind: &'static str,

    pub motivation: &'static str,
    pub resource: ContentAsText,
    pub on: String,
    pub within: Within,
}

impl TextAnnotation {
    pub fn new(id: String, chars: String, on: String, manifest_id: String) -> Self {
        Self {
            id,
            kind: "oa:Annotation",
            motivation: "sc:painting",
            resource: ContentAsText {
                kind: "cnt:ContentAsText",
                chars,
            },
            on,
            within: Within {
                id: manifest_id,
                kind: "sc:Manifest",
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnnotationList {
    #[serde(rename = "@context")]
    pub context: &'static str,

    #[serde(rename = "@id")]
    pub id: String,

    #[serde(rename = "@type")]
    pub kind: &'static str,

    pub resources: Vec<TextAnnotation>,
}

impl AnnotationList {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            context: CONTEXT,
            id: id.into(),
            kind: "sc:AnnotationList",
            resources: Vec::new(),
        }
    }
}
