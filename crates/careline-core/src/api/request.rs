//! Request descriptors accepted by the pipeline.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
    Patch,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
            Method::Patch => "PATCH",
        }
    }

    /// Retrieval-only methods never carry a body.
    pub fn allows_body(&self) -> bool {
        !matches!(self, Method::Get)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Method::Get),
            "POST" => Ok(Method::Post),
            "PUT" => Ok(Method::Put),
            "DELETE" => Ok(Method::Delete),
            "PATCH" => Ok(Method::Patch),
            other => Err(format!("Unsupported HTTP method: {}", other)),
        }
    }
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
            Method::Patch => reqwest::Method::PATCH,
        }
    }
}

/// Request body, either a JSON value or an already serialized string.
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Json(Value),
    Raw(String),
}

impl Body {
    /// Wire form of the body.
    pub fn to_wire(&self) -> String {
        match self {
            Body::Json(value) => value.to_string(),
            Body::Raw(raw) => raw.clone(),
        }
    }
}

impl From<Value> for Body {
    fn from(value: Value) -> Self {
        Body::Json(value)
    }
}

impl From<String> for Body {
    fn from(raw: String) -> Self {
        Body::Raw(raw)
    }
}

impl From<&str> for Body {
    fn from(raw: &str) -> Self {
        Body::Raw(raw.to_string())
    }
}

/// A single logical call. Built once, then handed to
/// [`ApiClient::send`](super::ApiClient::send) by value.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestDescriptor {
    method: Method,
    url: String,
    body: Option<Body>,
    headers: Vec<(String, String)>,
    suppress_notification: bool,
    anonymous: bool,
}

impl RequestDescriptor {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            body: None,
            headers: Vec::new(),
            suppress_notification: false,
            anonymous: false,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::Get, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::Post, url)
    }

    pub fn put(url: impl Into<String>) -> Self {
        Self::new(Method::Put, url)
    }

    pub fn delete(url: impl Into<String>) -> Self {
        Self::new(Method::Delete, url)
    }

    pub fn patch(url: impl Into<String>) -> Self {
        Self::new(Method::Patch, url)
    }

    pub fn body(mut self, body: impl Into<Body>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Serialize `value` as the JSON body.
    pub fn json<B: Serialize>(mut self, value: &B) -> serde_json::Result<Self> {
        self.body = Some(Body::Json(serde_json::to_value(value)?));
        Ok(self)
    }

    /// Add a header. Caller headers override the pipeline defaults.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn suppress_notification(mut self, suppress: bool) -> Self {
        self.suppress_notification = suppress;
        self
    }

    /// Send without the stored credential. The call then never reads or
    /// clears the session, whatever its outcome.
    pub fn anonymous(mut self) -> Self {
        self.anonymous = true;
        self
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Body as sent on the wire; `None` for retrieval-only methods.
    pub fn wire_body(&self) -> Option<String> {
        if !self.method.allows_body() {
            return None;
        }
        self.body.as_ref().map(Body::to_wire)
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    pub fn is_suppressed(&self) -> bool {
        self.suppress_notification
    }

    pub fn is_anonymous(&self) -> bool {
        self.anonymous
    }
}
