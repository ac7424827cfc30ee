//! # Routes and Route Keys
//!
//! A [`Route`] names one remote operation by HTTP method and path. The
//! [`RouteKey`] derived from it is the cache key of the descriptor registry.
//!
//! ## Invariant
//!
//! Key derivation is deterministic and normalizes only the method
//! (lower-cased); the path is kept byte-for-byte, so `/Users` and `/users`
//! are distinct routes.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// HTTP methods a route may declare.
///
/// Serializes upper-case; deserializes through [`FromStr`], so any case is
/// accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE", try_from = "String")]
pub enum HttpMethod {
    Get,
    Head,
    Options,
    Delete,
    Post,
    Put,
    Patch,
}

impl HttpMethod {
    /// Canonical upper-case spelling, as sent on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Head => "HEAD",
            Self::Options => "OPTIONS",
            Self::Delete => "DELETE",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
        }
    }

    /// Read-style methods carry their arguments in the query string rather
    /// than in a request body.
    pub fn is_read_style(self) -> bool {
        matches!(self, Self::Get | Self::Head | Self::Delete | Self::Options)
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = RouteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "GET" => Ok(Self::Get),
            "HEAD" => Ok(Self::Head),
            "OPTIONS" => Ok(Self::Options),
            "DELETE" => Ok(Self::Delete),
            "POST" => Ok(Self::Post),
            "PUT" => Ok(Self::Put),
            "PATCH" => Ok(Self::Patch),
            _ => Err(RouteError::UnknownMethod(s.to_string())),
        }
    }
}

impl TryFrom<String> for HttpMethod {
    type Error = RouteError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// Errors from route parsing and key derivation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RouteError {
    /// The method is not one of the supported HTTP methods.
    #[error("unknown HTTP method: {0:?}")]
    UnknownMethod(String),

    /// The path is empty or not absolute.
    #[error("route path must start with '/': {0:?}")]
    InvalidPath(String),

    /// A `"METHOD /path"` string could not be split.
    #[error("malformed route {0:?}; expected \"METHOD /path\"")]
    Malformed(String),
}

/// A declared remote operation: method plus path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Route {
    pub method: HttpMethod,
    pub path: String,
}

impl Route {
    /// Create a route. The path is validated when the key is derived.
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Put, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Patch, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Delete, path)
    }

    /// Derive the registry key for this route.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError::InvalidPath`] if the path is empty or relative.
    pub fn key(&self) -> Result<RouteKey, RouteError> {
        RouteKey::new(self.method, &self.path)
    }
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.method, self.path)
    }
}

impl FromStr for Route {
    type Err = RouteError;

    /// Parse `"GET /users"` (method case-insensitive).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split_whitespace();
        let (Some(method), Some(path), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(RouteError::Malformed(s.to_string()));
        };
        let route = Route::new(method.parse()?, path);
        route.key()?;
        Ok(route)
    }
}

/// Normalized identifier of a registered route: `<method-lowercase>_<path>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RouteKey(String);

impl RouteKey {
    /// Derive a key from a method and path.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError::InvalidPath`] if `path` does not start with `/`.
    pub fn new(method: HttpMethod, path: &str) -> Result<Self, RouteError> {
        if !path.starts_with('/') {
            return Err(RouteError::InvalidPath(path.to_string()));
        }
        Ok(Self(format!(
            "{}_{}",
            method.as_str().to_ascii_lowercase(),
            path
        )))
    }

    /// Returns the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RouteKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
