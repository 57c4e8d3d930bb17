//! SonarQube Web API client
//!
//! Uses ureq (sync HTTP). One attempt per call: transport errors,
//! non-2xx statuses and unparseable bodies all come back as `None`.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

/// Per-request timeout
pub const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Anything that can answer a GET on an API path with parsed JSON.
///
/// The paginator and typed fetchers only depend on this, so tests can
/// feed canned pages without a server.
pub trait JsonSource: Sync {
    fn get_json(&self, path: &str) -> Option<Value>;
}

/// Authenticated client bound to one server.
pub struct SonarClient {
    base_url: String,
    auth_header: String,
    agent: ureq::Agent,
}

fn make_agent() -> ureq::Agent {
    ureq::config::Config::builder()
        .http_status_as_error(false) // status codes handled below
        .timeout_global(Some(Duration::from_secs(REQUEST_TIMEOUT_SECS)))
        .build()
        .new_agent()
}

/// `Basic base64("<token>:")`, the token as login with an empty password.
pub fn basic_auth_header(token: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{}:", token)))
}

impl SonarClient {
    pub fn new(base_url: impl Into<String>, token: &str) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            auth_header: basic_auth_header(token),
            agent: make_agent(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl JsonSource for SonarClient {
    fn get_json(&self, path: &str) -> Option<Value> {
        let url = self.url(path);
        debug!("GET {}", url);

        let response = match self
            .agent
            .get(&url)
            .header("Authorization", &self.auth_header)
            .header("Accept", "application/json")
            .call()
        {
            Ok(response) => response,
            Err(e) => {
                warn!("Request to {} failed: {}", path, e);
                return None;
            }
        };

        let status = response.status().as_u16();
        if !(200..300).contains(&status) {
            warn!("{} returned HTTP {}", path, status);
            return None;
        }

        match response.into_body().read_json::<Value>() {
            Ok(body) => Some(body),
            Err(e) => {
                warn!("Failed to parse JSON from {}: {}", path, e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread::JoinHandle;

    /// Answer one request with `status` and `body`. The handle yields the
    /// raw request head.
    fn serve_once(status: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let handle = std::thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut head = Vec::new();
            let mut buf = [0u8; 1024];
            while !head.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = stream.read(&mut buf).unwrap();
                if n == 0 {
                    break;
                }
                head.extend_from_slice(&buf[..n]);
            }
            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            stream.write_all(response.as_bytes()).unwrap();
            String::from_utf8_lossy(&head).to_string()
        });
        (base, handle)
    }

    #[test]
    fn test_json_response_is_parsed() {
        let (base, server) = serve_once("200 OK", r#"{"status":"UP"}"#);
        let client = SonarClient::new(base, "squ_abc");
        let body = client.get_json("/api/system/status").unwrap();
        assert_eq!(body["status"], "UP");

        let request = server.join().unwrap();
        assert!(request.starts_with("GET /api/system/status "));
        assert!(request
            .to_ascii_lowercase()
            .contains("authorization: basic c3f1x2fiyzo="));
    }

    #[test]
    fn test_error_status_is_none() {
        let (base, server) = serve_once("401 Unauthorized", r#"{"errors":[{"msg":"Unauthorized"}]}"#);
        let client = SonarClient::new(base, "bad");
        assert!(client.get_json("/api/system/status").is_none());
        server.join().unwrap();
    }

    #[test]
    fn test_non_json_body_is_none() {
        let (base, server) = serve_once("200 OK", "nope!");
        let client = SonarClient::new(base, "t");
        assert!(client.get_json("/api/system/status").is_none());
        server.join().unwrap();
    }

    #[test]
    fn test_basic_auth_uses_empty_password() {
        // base64("squ_abc:")
        assert_eq!(basic_auth_header("squ_abc"), "Basic c3F1X2FiYzo=");
    }

    #[test]
    fn test_trailing_slash_is_trimmed() {
        let client = SonarClient::new("http://localhost:9000/", "t");
        assert_eq!(client.base_url(), "http://localhost:9000");
        assert_eq!(
            client.url("/api/system/status"),
            "http://localhost:9000/api/system/status"
        );
    }

    #[test]
    fn test_unreachable_server_is_none() {
        // Port 9 (discard) on localhost is closed on CI machines
        let client = SonarClient::new("http://127.0.0.1:9", "t");
        assert!(client.get_json("/api/system/status").is_none());
    }
}
