//! # Routes Subcommand
//!
//! `linecall routes <manifest>` compiles every route in a manifest and lists
//! the published descriptors sorted by route key.

use std::fmt::Write as _;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use linecall_client::Registry;

use crate::manifest::Manifest;

/// Arguments for `linecall routes`.
#[derive(Args, Debug)]
pub struct RoutesArgs {
    /// Route manifest (YAML).
    pub manifest: PathBuf,

    /// Print descriptors as JSON instead of a table.
    #[arg(long)]
    pub json: bool,
}

pub fn run_routes(args: &RoutesArgs) -> Result<u8> {
    let manifest = Manifest::load(&args.manifest)?;
    let registry = Registry::default();
    let count = manifest
        .register_all(&registry)
        .with_context(|| format!("failed to register routes from {}", args.manifest.display()))?;
    tracing::info!(count, "routes registered");

    if args.json {
        println!("{}", serde_json::to_string_pretty(&describe(&registry))?);
    } else {
        print!("{}", render_table(&registry));
    }
    Ok(0)
}

/// One line per route: key, route, name, schemas present, description.
pub fn render_table(registry: &Registry) -> String {
    let mut out = String::new();
    for d in registry.routes() {
        let schemas = match (d.input_schema().is_some(), d.output_schema().is_some()) {
            (true, true) => "in+out",
            (true, false) => "in",
            (false, true) => "out",
            (false, false) => "-",
        };
        let _ = writeln!(
            out,
            "{}\t{}\t{}\t{}\t{}",
            d.key(),
            d.route(),
            d.name().unwrap_or("-"),
            schemas,
            d.description().unwrap_or(""),
        );
    }
    out
}

/// Descriptor summaries as JSON.
pub fn describe(registry: &Registry) -> serde_json::Value {
    registry
        .routes()
        .iter()
        .map(|d| {
            serde_json::json!({
                "key": d.key().as_str(),
                "method": d.route().method,
                "path": d.route().path,
                "name": d.name(),
                "description": d.description(),
                "input_format_path": d.outbound_path().map(ToString::to_string),
                "output_format_path": d.inbound_path().map(ToString::to_string),
                "defaults": d.defaults(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const MANIFEST: &str = r#"
routes:
  - name: list-users
    method: GET
    path: /users
    description: List users
    input_schema: "fullname=id,type=int,default=1"
  - name: create-order
    method: POST
    path: /orders
    output_schema: "fullname=id,type=int,required"
  - name: ping
    method: HEAD
    path: /ping
"#;

    fn registry() -> Registry {
        let registry = Registry::default();
        Manifest::from_yaml(MANIFEST)
            .unwrap()
            .register_all(&registry)
            .unwrap();
        registry
    }

    #[test]
    fn table_is_sorted_by_key() {
        let table = render_table(&registry());
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("get_/users\tGET /users\tlist-users\tin\tList users"));
        assert!(lines[1].starts_with("head_/ping\tHEAD /ping\tping\t-"));
        assert!(lines[2].starts_with("post_/orders\tPOST /orders\tcreate-order\tout"));
    }

    #[test]
    fn json_summary_exposes_compiled_artifacts() {
        let summary = describe(&registry());
        let users = &summary[0];
        assert_eq!(users["key"], "get_/users");
        assert_eq!(users["method"], "GET");
        assert_eq!(users["input_format_path"], "id:string");
        assert_eq!(users["defaults"], serde_json::json!({"id": 1}));
        assert_eq!(summary[2]["output_format_path"], "id:int");
    }

    #[test]
    fn run_routes_loads_the_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("routes.yaml");
        std::fs::write(&path, MANIFEST).unwrap();
        let args = RoutesArgs {
            manifest: path,
            json: true,
        };
        assert_eq!(run_routes(&args).unwrap(), 0);
    }
}
