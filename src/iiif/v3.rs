//! IIIF Presentation API 3.0 document model.
//! Based on: https://iiif.io/api/presentation/3.0/
use serde::Serialize;
use std::collections::BTreeMap;

pub const CONTEXT: &str = "http://iiif.io/api/presentation/3/context.json";

/// Language-keyed strings, e.g. `{"en": ["Track List"]}`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct LanguageMap(BTreeMap<String, Vec<String>>);

impl LanguageMap {
    pub fn new(language: &str, value: impl Into<String>) -> Self {
        Self::values(language, vec![value.into()])
    }

    pub fn values(language: &str, values: Vec<String>) -> Self {
        let mut map = BTreeMap::new();
        map.insert(language.to_string(), values);
        Self(map)
    }

    pub fn en(value: impl Into<String>) -> Self {
        Self::new("en", value)
    }

    pub fn get(&self, language: &str) -> Option<&[String]> {
        self.0.get(language).map(Vec::as_slice)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Behavior {
    Paged,
    Individuals,
    AutoAdvance,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ViewingDirection {
    LeftToRight,
    RightToLeft,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Motivation {
    Painting,
    Supplementing,
    Commenting,
}

/// Kinds of resource a [`Reference`] can point at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RefKind {
    Manifest,
    Collection,
    Canvas,
    AnnotationPage,
}

/// A pointer to a resource described elsewhere.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reference {
    pub id: String,

    #[serde(rename = "type")]
    pub kind: RefKind,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<LanguageMap>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<LanguageMap>,
}

impl Reference {
    pub fn new(kind: RefKind, id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            label: None,
            summary: None,
        }
    }

    pub fn labelled(kind: RefKind, id: impl Into<String>, label: LanguageMap) -> Self {
        Self {
            label: Some(label),
            ..Self::new(kind, id)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageService {
    pub id: String,

    #[serde(rename = "type")]
    pub kind: &'static str,

    pub profile: &'static str,
}

impl ImageService {
    pub fn v2(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: "ImageService2",
            profile: "level2",
        }
    }

    pub fn v3(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: "ImageService3",
            profile: "level2",
        }
    }
}

/// Content search service advertised on a manifest
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchService {
    #[serde(rename = "@id")]
    pub id: String,

    #[serde(rename = "@type")]
    pub kind: &'static str,

    pub profile: &'static str,
}

impl SearchService {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: "SearchService1",
            profile: "http://iiif.io/api/search/1/search",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageBody {
    pub id: String,
    pub format: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub service: Vec<ImageService>,
}

/// A time-based rendition (Sound or Video).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AvBody {
    pub id: String,
    pub format: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<LanguageMap>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
}

/// An external text resource such as a WebVTT file
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextBody {
    pub id: String,
    pub format: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<LanguageMap>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

/// Embedded text
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextualBody {
    pub format: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Choice {
    pub items: Vec<Body>,
}

/// Every body an annotation can carry, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum Body {
    Image(ImageBody),
    Sound(AvBody),
    Video(AvBody),
    Text(TextBody),
    TextualBody(TextualBody),
    Choice(Choice),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Annotation {
    pub id: String,

    #[serde(rename = "type")]
    kind: &'static str,

    pub motivation: Motivation,
    pub body: Body,
    pub target: String,
}

impl Annotation {
    pub fn new(
        id: impl Into<String>,
        motivation: Motivation,
        body: Body,
        target: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            kind: "Annotation",
            motivation,
            body,
            target: target.into(),
        }
    }
}

/// An annotation page, either embedded (`items` present) or referenced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnnotationPage {
    #[serde(rename = "@context", skip_serializing_if = "Option::is_none")]
    pub context: Option<&'static str>,

    pub id: String,

    #[serde(rename = "type")]
    kind: &'static str,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<Annotation>>,
}

impl AnnotationPage {
    pub fn new(id: impl Into<String>, items: Vec<Annotation>) -> Self {
        Self {
            context: None,
            id: id.into(),
            kind: "AnnotationPage",
            items: Some(items),
        }
    }

    pub fn reference(id: impl Into<String>) -> Self {
        Self {
            items: None,
            ..Self::new(id, Vec::new())
        }
    }

    /// Mark the page as a standalone JSON-LD document
    pub fn document(mut self) -> Self {
        self.context = Some(CONTEXT);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Canvas {
    pub id: String,

    #[serde(rename = "type")]
    kind: &'static str,

    pub label: LanguageMap,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<LanguageMap>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<AnnotationPage>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub annotations: Vec<AnnotationPage>,
}

impl Canvas {
    pub fn new(id: impl Into<String>, label: LanguageMap) -> Self {
        Self {
            id: id.into(),
            kind: "Canvas",
            label,
            summary: None,
            height: None,
            width: None,
            duration: None,
            items: Vec::new(),
            annotations: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Range {
    pub id: String,

    #[serde(rename = "type")]
    kind: &'static str,

    pub label: LanguageMap,
    pub items: Vec<Reference>,
}

impl Range {
    pub fn new(id: impl Into<String>, label: LanguageMap, items: Vec<Reference>) -> Self {
        Self {
            id: id.into(),
            kind: "Range",
            label,
            items,
        }
    }
}

/// A link to a web page or a downloadable file
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExternalLink {
    pub id: String,

    #[serde(rename = "type")]
    pub kind: String,

    pub label: LanguageMap,
    pub format: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Agent {
    pub id: String,

    #[serde(rename = "type")]
    kind: &'static str,

    pub label: LanguageMap,
    pub homepage: Vec<ExternalLink>,
    pub logo: Vec<Body>,
}

impl Agent {
    pub fn new(
        id: impl Into<String>,
        label: LanguageMap,
        homepage: Vec<ExternalLink>,
        logo: Vec<Body>,
    ) -> Self {
        Self {
            id: id.into(),
            kind: "Agent",
            label,
            homepage,
            logo,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetadataEntry {
    pub label: LanguageMap,
    pub value: LanguageMap,
}

/// Descriptive properties shared by manifests and collections.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Descriptive {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<LanguageMap>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub metadata: Vec<MetadataEntry>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub rights: Option<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub provider: Vec<Agent>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub homepage: Vec<ExternalLink>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub part_of: Vec<Reference>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    #[serde(rename = "@context")]
    context: &'static str,

    pub id: String,

    #[serde(rename = "type")]
    kind: &'static str,

    pub label: LanguageMap,

    #[serde(flatten)]
    pub descriptive: Descriptive,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub see_also: Vec<ExternalLink>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub rendering: Vec<ExternalLink>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub thumbnail: Vec<Body>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub behavior: Vec<Behavior>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub viewing_direction: Option<ViewingDirection>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub service: Vec<SearchService>,

    pub items: Vec<Canvas>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub structures: Vec<Range>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub annotations: Vec<AnnotationPage>,
}

impl Manifest {
    pub fn new(id: impl Into<String>, label: LanguageMap) -> Self {
        Self {
            context: CONTEXT,
            id: id.into(),
            kind: "Manifest",
            label,
            descriptive: Descriptive::default(),
            see_also: Vec::new(),
            rendering: Vec::new(),
            thumbnail: Vec::new(),
            behavior: Vec::new(),
            viewing_direction: None,
            service: Vec::new(),
            items: Vec::new(),
            structures: Vec::new(),
            annotations: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Collection {
    #[serde(rename = "@context")]
    context: &'static str,

    pub id: String,

    #[serde(rename = "type")]
    kind: &'static str,

    pub label: LanguageMap,

    #[serde(flatten)]
    pub descriptive: Descriptive,

    pub items: Vec<Reference>,
}

impl Collection {
    pub fn new(id: impl Into<String>, label: LanguageMap) -> Self {
        Self {
            context: CONTEXT,
            id: id.into(),
            kind: "Collection",
            label,
            descriptive: Descriptive::default(),
            items: Vec::new(),
        }
    }
}
