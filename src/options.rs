use crate::config::AppSettings;
use crate::iiif::v3::LanguageMap;

/// Everything a document builder needs to know about where it is published.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildOptions {
    /// Document id prefix, always `https://.../iiif/`
    pub domain: String,

    /// Archive root for download, details and metadata links
    pub archive_url: String,

    /// Image API server root, without the version segment
    pub image_server: String,

    /// Canvas id prefix
    pub uri_prefix: String,

    /// Language key for labels taken verbatim from metadata
    pub label_language: String,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self::from_settings(&AppSettings::default(), None)
    }
}

impl BuildOptions {
    /// Derive build options from settings, optionally publishing under another domain.
    pub fn from_settings(settings: &AppSettings, domain: Option<&str>) -> Self {
        let domain = domain.unwrap_or(&settings.presentation.domain);
        Self {
            domain: purify_domain(domain),
            archive_url: settings.archive.base_url.trim_end_matches('/').to_string(),
            image_server: settings
                .archive
                .image_server_url
                .trim_end_matches('/')
                .to_string(),
            uri_prefix: settings
                .presentation
                .uri_prefix
                .trim_end_matches('/')
                .to_string(),
            label_language: settings.presentation.label_language.clone(),
        }
    }

    /// Label in the configured default language
    pub fn label(&self, value: impl Into<String>) -> LanguageMap {
        LanguageMap::new(&self.label_language, value)
    }

    pub fn download_url(&self, identifier: &str, filename: &str) -> String {
        format!(
            "{}/download/{}/{}",
            self.archive_url,
            identifier,
            filename.replace(' ', "%20")
        )
    }

    pub fn manifest_id(&self, identifier: &str) -> String {
        format!("{}{}/manifest.json", self.domain, identifier)
    }

    pub fn collection_id(&self, identifier: &str) -> String {
        format!("{}{}/collection.json", self.domain, identifier)
    }
}

/// Normalise a caller supplied base URL: upgrade `http://` to `https://`
/// and make it end with `iiif/`.
pub fn purify_domain(domain: &str) -> String {
    let mut domain = match domain.strip_prefix("http://") {
        Some(rest) => format!("https://{}", rest),
        None => domain.to_string(),
    };
    if domain.ends_with("/iiif/") {
        return domain;
    }
    if !domain.ends_with('/') {
        domain.push('/');
    }
    domain.push_str("iiif/");
    domain
}
