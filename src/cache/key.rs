//! Request Key Module
//!
//! Request descriptors used as generation keys.

use std::fmt;

use axum::http::Method;
use url::Url;

use crate::fetch::FetchRequest;

// == Request Key ==
/// Method plus URL, fragment removed. Query strings are significant.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestKey {
    method: Method,
    url: String,
}

impl RequestKey {
    pub fn new(method: Method, url: &Url) -> Self {
        let mut url = url.clone();
        url.set_fragment(None);
        Self {
            method,
            url: url.into(),
        }
    }

    pub fn get(url: &Url) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn from_request(request: &FetchRequest) -> Self {
        Self::new(request.method.clone(), &request.url)
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Only GET requests can be written to a generation.
    pub fn is_storable(&self) -> bool {
        self.method == Method::GET
    }
}

impl fmt::Display for RequestKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.url)
    }
}
