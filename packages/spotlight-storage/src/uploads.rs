//! Masthead upload locations
//!
//! Exhibits and browse categories can carry a custom masthead image. This
//! module decides where uploaded files are stored and which fallback asset
//! is served when none was uploaded.

use serde::{Deserialize, Serialize};

/// Where uploaded files are kept
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadStorage {
    /// Local filesystem under the public directory
    #[default]
    File,
    /// Remote object storage
    Fog,
}

/// Masthead image uploader for exhibits and browse categories
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MastheadUploader {
    pub storage: UploadStorage,
    asset_root: String,
}

impl MastheadUploader {
    pub fn new(storage: UploadStorage, asset_root: impl Into<String>) -> Self {
        Self {
            storage,
            asset_root: asset_root.into(),
        }
    }

    /// Directory an upload is stored under, relative to the storage root
    ///
    /// `model` is the owning model's type name (`"Spotlight::Search"`),
    /// `mounted_as` the attribute the upload is attached to.
    pub fn store_dir(&self, model: &str, mounted_as: &str, id: i64) -> String {
        format!("uploads/{}/{}/{}", underscore(model), mounted_as, id)
    }

    /// Asset URL used when nothing has been uploaded
    pub fn default_url(&self, version: Option<&str>) -> String {
        let file = match version {
            Some(version) => format!("{}_default.png", version),
            None => "default.png".to_string(),
        };
        format!("{}/fallback/{}", self.asset_root.trim_end_matches('/'), file)
    }
}

impl Default for MastheadUploader {
    fn default() -> Self {
        Self::new(UploadStorage::File, "/assets")
    }
}

/// `Spotlight::BrowseCategory` -> `spotlight/browse_category`
///
/// An uppercase run keeps together except for its last letter when a
/// lowercase letter follows: `HTTPServer` -> `http_server`.
fn underscore(type_name: &str) -> String {
    let mut out = String::with_capacity(type_name.len() + 4);
    for segment in type_name.split("::") {
        if !out.is_empty() {
            out.push('/');
        }
        let chars: Vec<char> = segment.chars().collect();
        for (i, &c) in chars.iter().enumerate() {
            if c.is_uppercase() && i > 0 {
                let prev = chars[i - 1];
                let next_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
                if prev.is_lowercase()
                    || prev.is_ascii_digit()
                    || (prev.is_uppercase() && next_lower)
                {
                    out.push('_');
                }
            }
            out.extend(c.to_lowercase());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_dir_underscores_namespaced_model() {
        let uploader = MastheadUploader::default();
        assert_eq!(
            uploader.store_dir("Spotlight::Search", "featured_image", 12),
            "uploads/spotlight/search/featured_image/12"
        );
        assert_eq!(
            uploader.store_dir("Spotlight::BrowseCategory", "masthead", 3),
            "uploads/spotlight/browse_category/masthead/3"
        );
    }

    #[test]
    fn test_underscore_splits_acronyms() {
        assert_eq!(underscore("Spotlight::HTTPServer"), "spotlight/http_server");
        assert_eq!(underscore("Spotlight::IIIFManifest"), "spotlight/iiif_manifest");
        assert_eq!(underscore("Spotlight::Page2Section"), "spotlight/page2_section");
        assert_eq!(underscore("Spotlight::SolrURL"), "spotlight/solr_url");
    }

    #[test]
    fn test_default_url_with_and_without_version() {
        let uploader = MastheadUploader::new(UploadStorage::File, "/assets/");
        assert_eq!(uploader.default_url(None), "/assets/fallback/default.png");
        assert_eq!(
            uploader.default_url(Some("thumb")),
            "/assets/fallback/thumb_default.png"
        );
    }
}
