use super::copy::copy_if_newer;
use super::error::{BuildError, BuildWarning};
use super::manifest::AgentEntry;
use super::BuildState;
use crate::config::{PackLayout, AGENTS_DIR, BUNDLED_AGENT_INDEX_NAME};
use crate::shared::ids::{AgentName, ModuleName};
use crate::shared::sandbox::confine;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// One row of the agent index. Extra columns are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AgentIndexRow {
    pub name: String,
    #[serde(rename = "displayName", default)]
    pub display_name: String,
    pub module: String,
    pub path: String,
}

/// Parses the agent index into `(row number, row)` pairs. Row numbers are
/// 1-based over data rows; rows that do not fit [`AgentIndexRow`] carry the
/// decode error so the caller can warn and move on.
pub fn read_agent_index(
    path: &Path,
) -> Result<Vec<(usize, Result<AgentIndexRow, String>)>, BuildError> {
    if !path.is_file() {
        return Err(BuildError::AgentIndexMissing {
            path: path.display().to_string(),
        });
    }
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_path(path)
        .map_err(|source| BuildError::AgentIndex {
            path: path.display().to_string(),
            source,
        })?;

    let mut rows = Vec::new();
    for (index, record) in reader.deserialize::<AgentIndexRow>().enumerate() {
        rows.push((index + 1, record.map_err(|err| err.to_string())));
    }
    Ok(rows)
}

pub(crate) fn copy_agents(
    layout: &PackLayout,
    force: bool,
    state: &mut BuildState,
) -> Result<(), BuildError> {
    let rows = read_agent_index(&layout.agent_index)?;
    tracing::info!(
        path = %layout.agent_index.display(),
        rows = rows.len(),
        "read agent index"
    );

    let agents_root = layout.store_root.join(AGENTS_DIR);
    let bundled_index = agents_root.join(BUNDLED_AGENT_INDEX_NAME);
    state.record_copy(copy_if_newer(&layout.agent_index, &bundled_index, force)?);

    let mut seen = HashSet::new();
    let mut embedded_paths = HashSet::new();
    for (row_number, row) in rows {
        let row = match row {
            Ok(row) => row,
            Err(reason) => {
                state.warn(BuildWarning::InvalidAgentRow {
                    row: row_number,
                    reason,
                });
                continue;
            }
        };
        let (entry, source) = match agent_entry_for_row(layout, &row) {
            Ok(Some(found)) => found,
            Ok(None) => {
                state.warn(BuildWarning::MissingAgentSource {
                    agent: row.name.trim().to_ascii_lowercase(),
                    path: layout.source_root.join(&row.path).display().to_string(),
                });
                continue;
            }
            Err(reason) => {
                state.warn(BuildWarning::InvalidAgentRow {
                    row: row_number,
                    reason,
                });
                continue;
            }
        };
        if seen.contains(&entry.name) {
            state.warn(BuildWarning::DuplicateAgent {
                name: entry.name.to_string(),
            });
            continue;
        }
        if !embedded_paths.insert(entry.embedded_path.clone()) {
            state.warn(BuildWarning::EmbeddedPathCollision {
                agent: entry.name.to_string(),
                embedded_path: entry.embedded_path.clone(),
            });
            continue;
        }
        seen.insert(entry.name.clone());

        let target = layout.store_root.join(&entry.embedded_path);
        state.record_copy(copy_if_newer(&source, &target, force)?);
        state.agents.push(entry);
    }

    tracing::info!(agents = state.agents.len(), "bundled agents");
    Ok(())
}

/// `Ok(None)` means the row is well formed but its source file is absent.
fn agent_entry_for_row(
    layout: &PackLayout,
    row: &AgentIndexRow,
) -> Result<Option<(AgentEntry, PathBuf)>, String> {
    let name = AgentName::parse(&row.name)?;
    let module = ModuleName::parse(&row.module).map_err(|err| format!("agent `{name}`: {err}"))?;
    let source = confine(&layout.source_root, Path::new(&row.path))
        .map_err(|err| format!("agent `{name}`: {err}"))?;
    let file_name = source
        .file_name()
        .and_then(|v| v.to_str())
        .ok_or_else(|| format!("agent `{name}` path has no file name"))?
        .to_string();
    if !source.is_file() {
        return Ok(None);
    }

    let display_name = if row.display_name.is_empty() {
        row.name.clone()
    } else {
        row.display_name.clone()
    };
    let entry = AgentEntry {
        embedded_path: format!("{AGENTS_DIR}/{module}/{file_name}"),
        name,
        display_name,
        module,
    };
    Ok(Some((entry, source)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn index_rows_tolerate_extra_columns_quotes_and_blank_lines() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("agents.csv");
        fs::write(
            &path,
            "name,displayName,title,module,path\n\
             pm, John ,\"Product Manager, lead\",bmm,bmad/bmm/agents/pm.md\n\
             \n\
             analyst,Mary,Analyst,bmm,bmad/bmm/agents/analyst.md\n",
        )
        .expect("write");

        let rows = read_agent_index(&path).expect("read");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].0, 2);
        let first = rows[0].1.as_ref().expect("row");
        assert_eq!(first.name, "pm");
        assert_eq!(first.display_name, "John");
        assert_eq!(first.path, "bmad/bmm/agents/pm.md");
    }

    #[test]
    fn missing_index_is_fatal() {
        let dir = tempdir().expect("tempdir");
        let err = read_agent_index(&dir.path().join("nope.csv")).expect_err("missing");
        assert!(matches!(err, BuildError::AgentIndexMissing { .. }));
    }
}
