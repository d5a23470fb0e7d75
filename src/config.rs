//! Options for building a tiled reprojection graph.
//!
//! Options can be built in code or loaded from JSON:
//!
//! ```json
//! { "resampling": "bilinear", "chunks": [512, 512], "dst_nodata": -9999.0 }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ConfigError;
use crate::resample::ResamplingMethod;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReprojectOptions {
    pub resampling: ResamplingMethod,
    /// Output tile size (rows, cols). Defaults to the source's row/col chunk size.
    pub chunks: Option<(usize, usize)>,
    /// Overrides the nodata marker of the source.
    pub src_nodata: Option<f64>,
    /// Output nodata; defaults to `src_nodata`.
    pub dst_nodata: Option<f64>,
    /// Index of the row axis; the column axis follows it.
    pub axis: usize,
    /// Prefix of the output layer name.
    #[serde(default = "default_name")]
    pub name: String,
}

fn default_name() -> String {
    "reproject".to_string()
}

impl Default for ReprojectOptions {
    fn default() -> Self {
        Self {
            resampling: ResamplingMethod::Nearest,
            chunks: None,
            src_nodata: None,
            dst_nodata: None,
            axis: 0,
            name: default_name(),
        }
    }
}

impl ReprojectOptions {
    pub fn with_resampling(mut self, resampling: ResamplingMethod) -> Self {
        self.resampling = resampling;
        self
    }

    pub fn with_chunks(mut self, chunks: (usize, usize)) -> Self {
        self.chunks = Some(chunks);
        self
    }

    pub fn with_src_nodata(mut self, nodata: f64) -> Self {
        self.src_nodata = Some(nodata);
        self
    }

    pub fn with_dst_nodata(mut self, nodata: f64) -> Self {
        self.dst_nodata = Some(nodata);
        self
    }

    pub fn with_axis(mut self, axis: usize) -> Self {
        self.axis = axis;
        self
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    /// Destination nodata after defaulting to the source marker.
    pub fn effective_dst_nodata(&self) -> Option<f64> {
        self.dst_nodata.or(self.src_nodata)
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        debug!(path = %path.display(), "loading reprojection options");
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let opts = ReprojectOptions::default();
        assert_eq!(opts.resampling, ResamplingMethod::Nearest);
        assert_eq!(opts.chunks, None);
        assert_eq!(opts.axis, 0);
        assert_eq!(opts.name, "reproject");
        assert_eq!(opts.effective_dst_nodata(), None);
    }

    #[test]
    fn test_builders() {
        let opts = ReprojectOptions::default()
            .with_resampling(ResamplingMethod::Average)
            .with_chunks((256, 128))
            .with_src_nodata(-1.0)
            .with_axis(1)
            .with_name("warp");
        assert_eq!(opts.chunks, Some((256, 128)));
        assert_eq!(opts.effective_dst_nodata(), Some(-1.0));
        assert_eq!(opts.with_dst_nodata(0.0).effective_dst_nodata(), Some(0.0));
    }

    #[test]
    fn test_from_json_partial() {
        let opts =
            ReprojectOptions::from_json(r#"{"resampling": "med", "chunks": [64, 32]}"#).unwrap();
        assert_eq!(opts.resampling, ResamplingMethod::Median);
        assert_eq!(opts.chunks, Some((64, 32)));
        assert_eq!(opts.name, "reproject");
    }

    #[test]
    fn test_from_json_rejects_unknown_method() {
        let err = ReprojectOptions::from_json(r#"{"resampling": "lanczos"}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_from_path() {
        let path = std::env::temp_dir().join(format!(
            "reproject-options-{}.json",
            std::process::id()
        ));
        std::fs::write(&path, r#"{"axis": 2, "dst_nodata": -9999.0}"#).unwrap();
        let opts = ReprojectOptions::from_path(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(opts.axis, 2);
        assert_eq!(opts.dst_nodata, Some(-9999.0));

        let missing = ReprojectOptions::from_path(path.with_extension("missing"));
        assert!(matches!(missing, Err(ConfigError::Io(_))));
    }
}
