//! The (url, method, extra) triple that names a configured upstream.
//!
//! An [`Identifier`] is the registry key's source value: once an upstream is
//! registered its identifier never changes, and the identifier's canonical
//! JSON serialisation (keys sorted, no whitespace) *is* the registry key.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the nine standard HTTP methods, or the `ANY` wildcard used by
/// identifiers to match every method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Method {
    Get,
    Head,
    Post,
    Put,
    Delete,
    Connect,
    Options,
    Trace,
    Patch,
    /// Wildcard: matches any request method. Never appears on an outbound
    /// request, only on a registered identifier.
    Any,
}

impl Method {
    /// All nine standard methods a request may actually use, excluding `Any`.
    pub const STANDARD: [Method; 9] = [
        Method::Get,
        Method::Head,
        Method::Post,
        Method::Put,
        Method::Delete,
        Method::Connect,
        Method::Options,
        Method::Trace,
        Method::Patch,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Head => "HEAD",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
            Method::Connect => "CONNECT",
            Method::Options => "OPTIONS",
            Method::Trace => "TRACE",
            Method::Patch => "PATCH",
            Method::Any => "ANY",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string does not name one of the nine standard
/// methods or the `ANY` sentinel.
#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown HTTP method: {0}")]
pub struct UnknownMethod(pub String);

impl std::str::FromStr for Method {
    type Err = UnknownMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Method::Get),
            "HEAD" => Ok(Method::Head),
            "POST" => Ok(Method::Post),
            "PUT" => Ok(Method::Put),
            "DELETE" => Ok(Method::Delete),
            "CONNECT" => Ok(Method::Connect),
            "OPTIONS" => Ok(Method::Options),
            "TRACE" => Ok(Method::Trace),
            "PATCH" => Ok(Method::Patch),
            "ANY" => Ok(Method::Any),
            other => Err(UnknownMethod(other.to_string())),
        }
    }
}

/// Custom serde impls so `Method` round-trips through JSON as its bare
/// uppercase name (`"GET"`, `"ANY"`, ...) rather than an internally tagged enum.
impl Serialize for Method {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

struct MethodVisitor;

impl<'de> serde::de::Visitor<'de> for MethodVisitor {
    type Value = Method;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("one of the nine standard HTTP methods, or ANY")
    }

    fn visit_str<E>(self, v: &str) -> Result<Method, E>
    where
        E: serde::de::Error,
    {
        v.parse().map_err(|UnknownMethod(m)| {
            E::custom(format!("unknown HTTP method: {m}"))
        })
    }
}

impl<'de> Deserialize<'de> for Method {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        deserializer.deserialize_str(MethodVisitor)
    }
}

fn default_method() -> Method {
    Method::Any
}

fn default_extra() -> String {
    String::new()
}

/// The (url, method, extra) triple that names a configured upstream.
///
/// `url` must be an absolute http(s) URL; `method` defaults to the `ANY`
/// wildcard; `extra` defaults to the empty string. Identifiers are immutable
/// once registered — there is no update operation, only register.
/// `deny_unknown_fields` enforces §4.1's "the triple contains any additional
/// keys" validation failure directly at deserialization time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Identifier {
    pub url: String,
    #[serde(default = "default_method")]
    pub method: Method,
    #[serde(default = "default_extra")]
    pub extra: String,
}

/// Why an [`Identifier`] failed validation.
#[derive(Debug, Clone, thiserror::Error)]
pub enum IdentifierError {
    #[error("identifier url is not an absolute http(s) url: {0}")]
    InvalidUrl(String),
    #[error(transparent)]
    UnknownMethod(#[from] UnknownMethod),
}

impl Identifier {
    /// Validates the url is an absolute http(s) URL. Method validity is
    /// already enforced by deserialization (an unknown method fails to parse
    /// before an `Identifier` value can exist).
    pub fn validate(&self) -> Result<(), IdentifierError> {
        match reqwest::Url::parse(&self.url) {
            Ok(parsed) if parsed.scheme() == "http" || parsed.scheme() == "https" => Ok(()),
            _ => Err(IdentifierError::InvalidUrl(self.url.clone())),
        }
    }

    /// The registry key: canonical JSON with sorted keys and no insignificant
    /// whitespace. `serde_json::Map` is BTreeMap-backed without the
    /// `preserve_order` feature, so `serde_json::to_string` already emits keys
    /// in sorted order — this is not an accident of the default and must not
    /// be disturbed by enabling that feature.
    pub fn canonical_key(&self) -> String {
        serde_json::to_string(self).expect("Identifier always serializes")
    }
}
