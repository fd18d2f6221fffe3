//! Plot plan export
//!
//! A plan is written as pretty JSON next to the figure it describes, e.g.
//! `output/plots/basic_histogram-GHG.svg.json`, for the renderer to pick up.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::GstResult;

/// Figure file type written by the renderer
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Png,
    Pdf,
    #[default]
    Svg,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Png => "png",
            ExportFormat::Pdf => "pdf",
            ExportFormat::Svg => "svg",
        }
    }
}

/// Anything that describes a figure to be rendered
pub trait PlotPlan: Serialize {
    /// File name of the rendered figure, including extension
    fn file_name(&self) -> &str;
}

/// Directory that figures are written to under an output folder
pub fn plots_dir(output_folder: &Path) -> PathBuf {
    output_folder.join("plots")
}

/// Write a plan as JSON into `dir`, creating it if needed
pub fn export_plan<P: PlotPlan>(plan: &P, dir: &Path) -> GstResult<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join(format!("{}.json", plan.file_name()));
    fs::write(&path, serde_json::to_string_pretty(plan)?)?;
    tracing::info!("Wrote plot plan to {}", path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Dummy {
        file_name: String,
        edges: Vec<f64>,
    }

    impl PlotPlan for Dummy {
        fn file_name(&self) -> &str {
            &self.file_name
        }
    }

    #[test]
    fn test_export_format_from_config() {
        #[derive(Deserialize)]
        struct Wrapper {
            file_type: ExportFormat,
        }
        let w: Wrapper = serde_json::from_str(r#"{"file_type": "pdf"}"#).unwrap();
        assert_eq!(w.file_type.extension(), "pdf");
        assert_eq!(ExportFormat::default(), ExportFormat::Svg);
    }

    #[test]
    fn test_export_plan_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let target = plots_dir(dir.path());
        let plan = Dummy {
            file_name: "basic_histogram-GHG.svg".to_string(),
            edges: vec![-1.0, 0.0, 1.0],
        };

        let path = export_plan(&plan, &target).unwrap();
        assert_eq!(path, target.join("basic_histogram-GHG.svg.json"));

        let written: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(written["edges"][1], 0.0);
    }
}
