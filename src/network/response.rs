//! Simulated responses for loads that supply their own content

use std::collections::HashMap;
use url::Url;

/// A response the engine treats as if it came from the network
#[derive(Debug, Clone, PartialEq)]
pub struct SimulatedResponse {
    url: Url,
    status: u16,
    mime_type: String,
    headers: HashMap<String, String>,
}

impl SimulatedResponse {
    /// Create a new 200 response
    pub fn new(url: Url, mime_type: impl Into<String>) -> Self {
        Self {
            url,
            status: 200,
            mime_type: mime_type.into(),
            headers: HashMap::new(),
        }
    }

    /// Create an HTML response
    pub fn html(url: Url) -> Self {
        Self::new(url, "text/html")
    }

    /// Set the status code
    pub fn status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    /// Add a header
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into().to_ascii_lowercase(), value.into());
        self
    }

    /// Get the response URL
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Get the status code
    pub fn status_code(&self) -> u16 {
        self.status
    }

    /// Check if the response was successful (2xx)
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Get the MIME type
    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// Get a specific header
    pub fn header_value(&self, key: &str) -> Option<&str> {
        self.headers
            .get(&key.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Get response headers
    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_html_response() {
        let url = Url::parse("https://example.com").unwrap();
        let response = SimulatedResponse::html(url).header("Content-Length", "12");
        assert!(response.is_success());
        assert_eq!(response.mime_type(), "text/html");
        assert_eq!(response.header_value("content-length"), Some("12"));
    }

    #[test]
    fn test_status() {
        let url = Url::parse("https://example.com").unwrap();
        let response = SimulatedResponse::new(url, "text/plain").status(404);
        assert!(!response.is_success());
        assert_eq!(response.status_code(), 404);
    }
}
