//! Project document load and save (JSON)

use std::fs;
use std::path::Path;

use tracing::info;

use crate::error::{RabError, Result};
use crate::project::Project;

/// Parse and validate a project document
///
/// Derived prices in the document are discarded and recomputed. Any shape
/// or value error rejects the whole document.
pub fn parse(text: &str) -> Result<Project> {
    let mut project: Project =
        serde_json::from_str(text).map_err(|e| RabError::malformed(e.to_string()))?;
    project.validate()?;
    project.recompute();
    Ok(project)
}

/// Load a project document from disk
pub fn load(path: &Path) -> Result<Project> {
    let text = fs::read_to_string(path).map_err(|e| RabError::io(path, e))?;
    let project = parse(&text)?;
    info!(
        path = %path.display(),
        resources = project.catalog.len(),
        recipes = project.library.len(),
        divisions = project.budget.divisions.len(),
        "project loaded"
    );
    Ok(project)
}

/// Serialize a project with freshly derived prices
pub fn to_json(project: &mut Project) -> Result<String> {
    project.recompute();
    Ok(serde_json::to_string_pretty(project)?)
}

/// Write a project document
///
/// The document goes to a sibling temp file first and is renamed over the
/// target, so an interrupted save leaves the previous file intact.
pub fn save(path: &Path, project: &mut Project) -> Result<()> {
    let json = to_json(project)?;

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = Path::new(&tmp);

    fs::write(tmp, json).map_err(|e| RabError::io(tmp, e))?;
    fs::rename(tmp, path).map_err(|e| RabError::io(path, e))?;

    info!(path = %path.display(), "project saved");
    Ok(())
}
