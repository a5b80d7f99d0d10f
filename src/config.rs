// Runtime configuration: an optional JSON file, then environment overrides.
use crate::error::Result;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// DuckDB database file attached under `catalog`.
    pub warehouse_path: PathBuf,
    /// Name the warehouse is attached as. Every query is re-qualified to it.
    pub catalog: String,
    /// Attach the catalog read-only. Audit events are then reported as failed.
    pub read_only: bool,
    pub output_dir: PathBuf,
    pub header_image: Option<PathBuf>,
    pub footer_image: Option<PathBuf>,
    pub umbral: Vec<f64>,
    /// Offset applied to audit timestamps. Bogotá does not observe DST.
    pub utc_offset_hours: i32,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            warehouse_path: PathBuf::from("documentos_colombia.duckdb"),
            catalog: "DOCUMENTOS_COLOMBIA".to_string(),
            read_only: false,
            output_dir: PathBuf::from("output"),
            header_image: None,
            footer_image: None,
            umbral: vec![10000.0],
            utc_offset_hours: -5,
        }
    }
}

impl Config {
    pub fn load(path: Option<&Path>) -> Result<Config> {
        let mut cfg = match path {
            Some(p) => {
                let s = std::fs::read_to_string(p)?;
                serde_json::from_str(&s)?
            }
            None => Config::default(),
        };
        cfg.apply_env(|k| std::env::var(k).ok());
        Ok(cfg)
    }

    /// Apply `TRES_EJES_*` overrides read through `get`.
    pub fn apply_env<F>(&mut self, get: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = get("TRES_EJES_WAREHOUSE") {
            self.warehouse_path = PathBuf::from(v);
        }
        if let Some(v) = get("TRES_EJES_CATALOG") {
            self.catalog = v;
        }
        if let Some(v) = get("TRES_EJES_OUTPUT_DIR") {
            self.output_dir = PathBuf::from(v);
        }
        if let Some(v) = get("TRES_EJES_HEADER_IMAGE") {
            self.header_image = Some(PathBuf::from(v));
        }
        if let Some(v) = get("TRES_EJES_FOOTER_IMAGE") {
            self.footer_image = Some(PathBuf::from(v));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_production_settings() {
        let cfg = Config::default();
        assert_eq!(cfg.catalog, "DOCUMENTOS_COLOMBIA");
        assert_eq!(cfg.umbral, vec![10000.0]);
        assert_eq!(cfg.utc_offset_hours, -5);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg: Config = serde_json::from_str(r#"{"output_dir": "/tmp/out"}"#).unwrap();
        assert_eq!(cfg.output_dir, PathBuf::from("/tmp/out"));
        assert_eq!(cfg.catalog, "DOCUMENTOS_COLOMBIA");
    }

    #[test]
    fn env_overrides_file_values() {
        let mut cfg = Config::default();
        cfg.apply_env(|k| match k {
            "TRES_EJES_WAREHOUSE" => Some("/data/dw.duckdb".to_string()),
            "TRES_EJES_HEADER_IMAGE" => Some("logo.png".to_string()),
            _ => None,
        });
        assert_eq!(cfg.warehouse_path, PathBuf::from("/data/dw.duckdb"));
        assert_eq!(cfg.header_image, Some(PathBuf::from("logo.png")));
        assert!(cfg.footer_image.is_none());
    }
}
