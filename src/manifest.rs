//! Asset Manifest
//!
//! Literal, hand-maintained lists of same-origin paths pre-cached on install.

use std::path::Path;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Result, WorkerError};

/// Served when an HTML page is unavailable from both network and cache.
pub const OFFLINE_FALLBACK: &str = "/404.html";

/// App shell: pages, shared stylesheet and script, web app manifest.
pub const CORE_ASSETS: &[&str] = &[
    "/",
    "/index.html",
    "/about.html",
    "/gallery.html",
    "/story.html",
    "/faq.html",
    "/resources.html",
    "/disclaimer.html",
    OFFLINE_FALLBACK,
    "/css/common.css",
    "/js/common.js",
    "/manifest.json",
];

/// Icons, help screenshots and gallery images.
pub const IMAGE_ASSETS: &[&str] = &[
    "/images/favicon.png",
    "/images/icon-192.png",
    "/images/icon-512.png",
    "/images/favicon.webp",
    "/images/help/student_id.webp",
    "/images/profiles/1.webp",
    "/images/profiles/2.webp",
    "/images/profiles/3.webp",
    "/images/profiles/4.webp",
    "/images/profiles/5.webp",
    "/images/profiles/6.webp",
    "/images/gallery/1.webp",
    "/images/gallery/2.webp",
    "/images/gallery/3.webp",
    "/images/gallery/4.webp",
    "/images/gallery/5.webp",
    "/images/gallery/6.webp",
    "/images/gallery/7.webp",
    "/images/gallery/8.webp",
    "/images/gallery/9.webp",
    "/images/gallery/10.webp",
    "/images/gallery/11.webp",
    "/images/gallery/12.webp",
    "/images/gallery/13.webp",
    "/images/gallery/14.webp",
];

// == Asset Manifest ==
/// Every entry is required at install time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetManifest {
    pub core: Vec<String>,
    #[serde(default)]
    pub images: Vec<String>,
}

impl AssetManifest {
    pub fn new(core: Vec<String>, images: Vec<String>) -> Self {
        Self { core, images }
    }

    /// Reads a manifest from a JSON file of the form
    /// `{"core": [...], "images": [...]}`.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| WorkerError::Config(format!("cannot read {}: {}", path.display(), e)))?;
        serde_json::from_str(&text)
            .map_err(|e| WorkerError::Config(format!("invalid manifest {}: {}", path.display(), e)))
    }

    /// All entries, core first, in declaration order.
    pub fn entries(&self) -> impl Iterator<Item = &str> {
        self.core
            .iter()
            .chain(self.images.iter())
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.core.len() + self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.core.is_empty() && self.images.is_empty()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.entries().any(|entry| entry == path)
    }

    /// Resolves every entry against `origin`.
    ///
    /// Fails if an entry points at another origin or if the offline fallback
    /// page is missing from the core list.
    pub fn resolve(&self, origin: &Url) -> Result<Vec<(String, Url)>> {
        if !self.core.iter().any(|p| p == OFFLINE_FALLBACK) {
            return Err(WorkerError::Config(format!(
                "core manifest must include {}",
                OFFLINE_FALLBACK
            )));
        }

        self.entries()
            .map(|path| {
                let url = origin.join(path).map_err(|e| {
                    WorkerError::Config(format!("invalid manifest entry '{}': {}", path, e))
                })?;
                if url.origin() != origin.origin() {
                    return Err(WorkerError::Config(format!(
                        "manifest entry '{}' is not same-origin",
                        path
                    )));
                }
                Ok((path.to_string(), url))
            })
            .collect()
    }
}

impl Default for AssetManifest {
    fn default() -> Self {
        Self::new(
            CORE_ASSETS.iter().map(|s| s.to_string()).collect(),
            IMAGE_ASSETS.iter().map(|s| s.to_string()).collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn origin() -> Url {
        Url::parse("https://tingyuun.example").unwrap()
    }

    #[test]
    fn test_default_manifest() {
        let manifest = AssetManifest::default();
        assert_eq!(manifest.len(), CORE_ASSETS.len() + IMAGE_ASSETS.len());
        assert!(manifest.contains(OFFLINE_FALLBACK));
        assert!(manifest.contains("/css/common.css"));
        assert_eq!(manifest.entries().next(), Some("/"));
    }

    #[test]
    fn test_resolve_default_manifest() {
        let resolved = AssetManifest::default().resolve(&origin()).unwrap();
        assert_eq!(resolved.len(), AssetManifest::default().len());
        assert_eq!(resolved[0].1.as_str(), "https://tingyuun.example/");
        assert!(resolved
            .iter()
            .all(|(_, url)| url.origin() == origin().origin()));
    }

    #[test]
    fn test_resolve_rejects_cross_origin_entry() {
        let manifest = AssetManifest::new(
            vec![OFFLINE_FALLBACK.to_string(), "https://cdn.example/x.js".to_string()],
            vec![],
        );
        assert!(matches!(
            manifest.resolve(&origin()),
            Err(WorkerError::Config(_))
        ));
    }

    #[test]
    fn test_resolve_requires_offline_fallback() {
        let manifest = AssetManifest::new(vec!["/index.html".to_string()], vec![]);
        assert!(matches!(
            manifest.resolve(&origin()),
            Err(WorkerError::Config(_))
        ));
    }

    #[test]
    fn test_deserialize_manifest() {
        let json = r#"{"core": ["/", "/404.html"], "images": ["/images/a.png"]}"#;
        let manifest: AssetManifest = serde_json::from_str(json).unwrap();
        assert_eq!(manifest.len(), 3);

        let json = r#"{"core": ["/404.html"]}"#;
        let manifest: AssetManifest = serde_json::from_str(json).unwrap();
        assert!(manifest.images.is_empty());
    }

    #[test]
    fn test_from_missing_file() {
        let result = AssetManifest::from_file(Path::new("/nonexistent/manifest.json"));
        assert!(matches!(result, Err(WorkerError::Config(_))));
    }
}
