//! Request Router
//!
//! Classifies intercepted requests by URL shape and picks the caching policy.
//! Rules are evaluated in order and the first match wins:
//!
//! 1. other origin → not intercepted
//! 2. `.css` / `.js` / `.json` → cache-first
//! 3. `.html` or `/` → network-first
//! 4. `.png` / `.jpg` / `.jpeg` / `.webp` / `.gif` / `.svg` / `.ico` → stale-while-revalidate
//! 5. anything else → network only

use std::fmt;

use serde::Serialize;
use url::{Origin, Url};

const STATIC_EXTENSIONS: &[&str] = &[".css", ".js", ".json"];
const IMAGE_EXTENSIONS: &[&str] = &[".png", ".jpg", ".jpeg", ".webp", ".gif", ".svg", ".ico"];

// == Request Class ==
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RequestClass {
    StaticAsset,
    HtmlPage,
    Image,
    Other,
}

impl RequestClass {
    /// Classifies a URL path. Total: every path gets exactly one class.
    pub fn of_path(path: &str) -> Self {
        if STATIC_EXTENSIONS.iter().any(|ext| path.ends_with(ext)) {
            RequestClass::StaticAsset
        } else if is_html_page(path) {
            RequestClass::HtmlPage
        } else if IMAGE_EXTENSIONS.iter().any(|ext| path.ends_with(ext)) {
            RequestClass::Image
        } else {
            RequestClass::Other
        }
    }

    pub fn policy(self) -> Policy {
        match self {
            RequestClass::StaticAsset => Policy::CacheFirst,
            RequestClass::HtmlPage => Policy::NetworkFirst,
            RequestClass::Image => Policy::StaleWhileRevalidate,
            RequestClass::Other => Policy::NetworkOnly,
        }
    }
}

/// `.html` paths and the site root.
pub fn is_html_page(path: &str) -> bool {
    path.ends_with(".html") || path == "/"
}

// == Policy ==
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Policy {
    CacheFirst,
    NetworkFirst,
    StaleWhileRevalidate,
    /// Forward to the network, never read or write the cache
    NetworkOnly,
}

impl fmt::Display for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Policy::CacheFirst => "cache-first",
            Policy::NetworkFirst => "network-first",
            Policy::StaleWhileRevalidate => "stale-while-revalidate",
            Policy::NetworkOnly => "network-only",
        };
        f.write_str(name)
    }
}

// == Route ==
/// Outcome of routing one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Cross-origin: left to the host's default handling.
    Bypass,
    Handle(RequestClass, Policy),
}

// == Request Router ==
#[derive(Debug, Clone)]
pub struct RequestRouter {
    origin: Origin,
}

impl RequestRouter {
    pub fn new(origin: &Url) -> Self {
        Self {
            origin: origin.origin(),
        }
    }

    pub fn route(&self, url: &Url) -> Route {
        if url.origin() != self.origin {
            return Route::Bypass;
        }
        let class = RequestClass::of_path(url.path());
        Route::Handle(class, class.policy())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn router() -> RequestRouter {
        RequestRouter::new(&Url::parse("https://tingyuun.example").unwrap())
    }

    fn route(url: &str) -> Route {
        router().route(&Url::parse(url).unwrap())
    }

    #[test]
    fn test_static_assets_are_cache_first() {
        for path in ["/css/common.css", "/js/common.js", "/manifest.json"] {
            assert_eq!(RequestClass::of_path(path), RequestClass::StaticAsset, "{}", path);
        }
        assert_eq!(
            route("https://tingyuun.example/js/common.js"),
            Route::Handle(RequestClass::StaticAsset, Policy::CacheFirst)
        );
    }

    #[test]
    fn test_html_pages_are_network_first() {
        for path in ["/", "/index.html", "/about.html", "/404.html"] {
            assert_eq!(RequestClass::of_path(path), RequestClass::HtmlPage, "{}", path);
        }
        assert_eq!(
            route("https://tingyuun.example/"),
            Route::Handle(RequestClass::HtmlPage, Policy::NetworkFirst)
        );
    }

    #[test]
    fn test_images_are_stale_while_revalidate() {
        for path in [
            "/images/favicon.png",
            "/a.jpg",
            "/a.jpeg",
            "/images/profiles/1.webp",
            "/a.gif",
            "/logo.svg",
            "/favicon.ico",
        ] {
            assert_eq!(RequestClass::of_path(path), RequestClass::Image, "{}", path);
        }
        assert_eq!(
            route("https://tingyuun.example/images/icon-192.png"),
            Route::Handle(RequestClass::Image, Policy::StaleWhileRevalidate)
        );
    }

    #[test]
    fn test_other_paths_pass_through() {
        for path in ["/api/data", "/docs/", "/font.woff2", "/about", "/a.PNG", "/file.htm"] {
            assert_eq!(RequestClass::of_path(path), RequestClass::Other, "{}", path);
        }
        assert_eq!(
            route("https://tingyuun.example/feed.xml"),
            Route::Handle(RequestClass::Other, Policy::NetworkOnly)
        );
    }

    #[test]
    fn test_query_does_not_affect_classification() {
        assert_eq!(
            route("https://tingyuun.example/css/common.css?v=3"),
            Route::Handle(RequestClass::StaticAsset, Policy::CacheFirst)
        );
    }

    #[test]
    fn test_cross_origin_is_bypassed() {
        assert_eq!(route("https://other.example/x.js"), Route::Bypass);
        assert_eq!(route("http://tingyuun.example/index.html"), Route::Bypass);
        assert_eq!(route("https://tingyuun.example:8443/index.html"), Route::Bypass);
    }

    #[test]
    fn test_policy_display() {
        assert_eq!(Policy::StaleWhileRevalidate.to_string(), "stale-while-revalidate");
        assert_eq!(Policy::NetworkOnly.to_string(), "network-only");
    }

    proptest! {
        // Every path maps to exactly one class, and that class agrees with
        // whichever extension rule matches first.
        #[test]
        fn prop_classification_is_total_and_first_match(
            stem in "/[a-z0-9/_-]{0,24}",
            ext in prop::sample::select(vec![
                "", ".css", ".js", ".json", ".html", ".png", ".jpg", ".jpeg",
                ".webp", ".gif", ".svg", ".ico", ".txt", ".woff2",
            ]),
        ) {
            let path = format!("{}{}", stem, ext);
            let class = RequestClass::of_path(&path);

            let expected = if STATIC_EXTENSIONS.iter().any(|e| path.ends_with(e)) {
                RequestClass::StaticAsset
            } else if path.ends_with(".html") || path == "/" {
                RequestClass::HtmlPage
            } else if IMAGE_EXTENSIONS.iter().any(|e| path.ends_with(e)) {
                RequestClass::Image
            } else {
                RequestClass::Other
            };
            prop_assert_eq!(class, expected);
        }

        #[test]
        fn prop_foreign_origins_never_handled(host in "[a-z]{1,12}", path in "/[a-z0-9./]{0,20}") {
            prop_assume!(host != "tingyuun");
            let url = Url::parse(&format!("https://{}.example{}", host, path)).unwrap();
            prop_assert_eq!(router().route(&url), Route::Bypass);
        }
    }
}
