//! # Route Manifest
//!
//! A YAML file declaring the routes a host calls, each with its line-schema
//! text inline:
//!
//! ```yaml
//! routes:
//!   - name: list-users
//!     method: GET
//!     path: /users
//!     description: List users by id
//!     input_schema: |
//!       fullname=id,type=int,required,default=1
//!     output_schema: |
//!       fullname=name,required
//! ```

use std::path::Path;

use anyhow::{bail, Context, Result};
use linecall_client::{CallError, Registry, RouteSource};
use linecall_core::{HttpMethod, Route};
use serde::{Deserialize, Serialize};

/// A parsed route manifest.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    #[serde(default)]
    pub routes: Vec<RouteSpec>,
}

/// One manifest entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RouteSpec {
    pub name: String,
    pub method: HttpMethod,
    pub path: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub input_schema: String,
    #[serde(default)]
    pub output_schema: String,
}

impl RouteSource for RouteSpec {
    fn route(&self) -> Route {
        Route::new(self.method, self.path.clone())
    }

    fn input_schema(&self) -> &str {
        &self.input_schema
    }

    fn output_schema(&self) -> &str {
        &self.output_schema
    }

    fn name(&self) -> Option<&str> {
        Some(&self.name)
    }

    fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

impl Manifest {
    /// Read and parse a manifest file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read manifest: {}", path.display()))?;
        Self::from_yaml(&text).with_context(|| format!("invalid manifest: {}", path.display()))
    }

    /// Parse manifest text. Route names must be unique.
    pub fn from_yaml(text: &str) -> Result<Self> {
        let manifest: Self = serde_yaml::from_str(text)?;
        let mut names: Vec<&str> = manifest.routes.iter().map(|r| r.name.as_str()).collect();
        names.sort_unstable();
        if let Some(dup) = names.windows(2).find(|w| w[0] == w[1]) {
            bail!("duplicate route name: {}", dup[0]);
        }
        Ok(manifest)
    }

    pub fn find(&self, name: &str) -> Option<&RouteSpec> {
        self.routes.iter().find(|r| r.name == name)
    }

    /// Compile and register every route. Stops at the first failure.
    pub fn register_all(&self, registry: &Registry) -> Result<usize, CallError> {
        for spec in &self.routes {
            registry.register(spec)?;
        }
        Ok(self.routes.len())
    }
}
