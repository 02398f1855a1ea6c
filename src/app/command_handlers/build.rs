use super::load_config;
use crate::bundle::{build_bundle, BuildOptions};
use crate::shared::clock::SystemClock;
use std::path::Path;

pub fn cmd_build(source_root: &Path, clean: bool, force: bool) -> Result<String, String> {
    let config = load_config(source_root)?;
    let layout = config.layout(source_root).map_err(|err| err.to_string())?;
    let report = build_bundle(&config, &layout, BuildOptions { clean, force }, &SystemClock)
        .map_err(|err| err.to_string())?;
    let mut lines = report.summary_lines();
    lines.push(format!("manifest: {}", report.manifest_path.display()));
    Ok(lines.join("\n"))
}
