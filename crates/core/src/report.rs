use std::path::Path;

use tokio::fs;

use crate::{
    error::{Result, TubescopeError},
    types::AnalysisResult,
};

pub use crate::paths::report_path;

/// Load a report from a saved file
pub async fn load_report(path: &Path) -> Result<AnalysisResult> {
    let json_content = fs::read_to_string(path).await?;
    let report: AnalysisResult = serde_json::from_str(&json_content)?;
    Ok(report)
}

/// Save a report as pretty JSON, creating parent directories as needed
pub async fn save_report(report: &AnalysisResult, path: &Path) -> Result<()> {
    let pretty_json = serde_json::to_string_pretty(report)?;

    let write = async {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(path, &pretty_json).await
    };

    write.await.map_err(|source| TubescopeError::ReportWrite {
        path: path.to_path_buf(),
        source,
    })
}
