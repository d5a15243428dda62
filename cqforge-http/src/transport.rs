//! Authenticated GET and multipart POST against the content API.
//!
//! Purely mechanical: status codes are returned to the caller uninterpreted
//! and nothing is retried.

use std::time::Duration;

use base64::{engine::general_purpose::STANDARD, Engine};

use cqforge_core::Credentials;

use crate::error::TransportError;
use crate::multipart::MultipartBody;

/// Status code and body of a completed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// `true` when the status code's decimal text starts with `20`.
    pub fn is_success(&self) -> bool {
        self.status.to_string().starts_with("20")
    }
}

/// The two requests reconciliation needs.
///
/// `deadline` bounds a single call; `None` leaves the transport's defaults in place.
pub trait Transport {
    fn get(
        &self,
        path: &str,
        auth: &Credentials,
        deadline: Option<Duration>,
    ) -> Result<HttpResponse, TransportError>;

    fn multipart_post(
        &self,
        path: &str,
        auth: &Credentials,
        form: &[(String, String)],
        deadline: Option<Duration>,
    ) -> Result<HttpResponse, TransportError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn get(
        &self,
        path: &str,
        auth: &Credentials,
        deadline: Option<Duration>,
    ) -> Result<HttpResponse, TransportError> {
        (**self).get(path, auth, deadline)
    }

    fn multipart_post(
        &self,
        path: &str,
        auth: &Credentials,
        form: &[(String, String)],
        deadline: Option<Duration>,
    ) -> Result<HttpResponse, TransportError> {
        (**self).multipart_post(path, auth, form, deadline)
    }
}

/// `Authorization` header value for HTTP basic auth.
pub fn basic_auth_header(auth: &Credentials) -> String {
    let token = STANDARD.encode(format!("{}:{}", auth.username, auth.password));
    format!("Basic {token}")
}

// ---------------------------------------------------------------------------
// ureq implementation
// ---------------------------------------------------------------------------

/// Blocking transport for one instance, rooted at its base URL.
#[derive(Debug, Clone)]
pub struct UreqTransport {
    base_url: String,
    agent: ureq::Agent,
}

impl UreqTransport {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            agent: ureq::AgentBuilder::new().build(),
        }
    }

    /// Absolute URL for a content path.
    pub fn url_for(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    fn request(
        &self,
        method: &str,
        url: &str,
        auth: &Credentials,
        deadline: Option<Duration>,
    ) -> ureq::Request {
        let mut req = self
            .agent
            .request(method, url)
            .set("Authorization", &basic_auth_header(auth));
        if let Some(deadline) = deadline {
            req = req.timeout(deadline);
        }
        req
    }
}

impl Transport for UreqTransport {
    fn get(
        &self,
        path: &str,
        auth: &Credentials,
        deadline: Option<Duration>,
    ) -> Result<HttpResponse, TransportError> {
        let url = self.url_for(path);
        let result = self.request("GET", &url, auth, deadline).call();
        let resp = into_response(&url, result)?;
        tracing::debug!(%url, status = resp.status, "GET");
        Ok(resp)
    }

    fn multipart_post(
        &self,
        path: &str,
        auth: &Credentials,
        form: &[(String, String)],
        deadline: Option<Duration>,
    ) -> Result<HttpResponse, TransportError> {
        let url = self.url_for(path);
        let body = MultipartBody::encode(form);
        let result = self
            .request("POST", &url, auth, deadline)
            .set("Content-Type", &body.content_type())
            .send_bytes(&body.bytes);
        let resp = into_response(&url, result)?;
        tracing::debug!(%url, status = resp.status, fields = form.len(), "POST");
        Ok(resp)
    }
}

fn into_response(
    url: &str,
    result: Result<ureq::Response, ureq::Error>,
) -> Result<HttpResponse, TransportError> {
    let resp = match result {
        Ok(resp) => resp,
        // 4xx/5xx are still answers; the caller decides what they mean.
        Err(ureq::Error::Status(_, resp)) => resp,
        Err(ureq::Error::Transport(t)) => {
            return Err(TransportError::Request {
                url: url.to_owned(),
                source: Box::new(t),
            })
        }
    };
    let status = resp.status();
    let body = resp.into_string().map_err(|e| TransportError::Body {
        url: url.to_owned(),
        source: e,
    })?;
    Ok(HttpResponse { status, body })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_for_joins_with_single_slash() {
        let t = UreqTransport::new("http://localhost:4502/");
        assert_eq!(t.url_for("/content/site.json"), "http://localhost:4502/content/site.json");
        assert_eq!(t.url_for("content"), "http://localhost:4502/content");
    }

    #[test]
    fn basic_auth_header_encodes_credentials() {
        let header = basic_auth_header(&Credentials::new("admin", "admin"));
        assert_eq!(header, "Basic YWRtaW46YWRtaW4=");
    }

    #[test]
    fn success_means_status_starts_with_20() {
        assert!(HttpResponse::new(200, "").is_success());
        assert!(HttpResponse::new(201, "").is_success());
        assert!(HttpResponse::new(204, "").is_success());
        assert!(!HttpResponse::new(302, "").is_success());
        assert!(!HttpResponse::new(404, "").is_success());
        assert!(!HttpResponse::new(500, "").is_success());
    }
}
