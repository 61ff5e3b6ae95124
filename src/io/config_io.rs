use std::fs;
use std::path::Path;

use crate::io::workspace_io::WorkspaceError;
use crate::model::config::Backend;

/// Template written by `chore init`. `{backend}` is substituted.
pub const CONFIG_TEMPLATE: &str = r##"# chore workspace configuration

[store]
# "local": items live in a key file inside .chore/, read once at startup.
# "remote": items live in a shared realtime database document; every
#           process pointed at it sees changes pushed as they happen.
backend = "{backend}"

[local]
key = "todo-items-v1"

[remote]
# Relative to .chore/ unless absolute. Point several workspaces at the
# same file to share one list.
database = "realtime.json"
collection = "todos"

# --- UI Customization ---
# [ui.colors]
# background = "#0C001B"
# text = "#B0AAFF"
# text_bright = "#FFFFFF"
# highlight = "#FB4196"
# dim = "#7D78BF"
# green = "#44FF88"
"##;

/// Render the init template for a backend
pub fn render_config(backend: Backend) -> String {
    CONFIG_TEMPLATE.replace("{backend}", &backend.to_string())
}

/// Read config.toml as a toml_edit document for format-preserving edits.
pub fn read_config_doc(chore_dir: &Path) -> Result<toml_edit::DocumentMut, WorkspaceError> {
    let config_path = chore_dir.join("config.toml");
    let config_text = fs::read_to_string(&config_path).map_err(|e| WorkspaceError::ReadError {
        path: config_path.clone(),
        source: e,
    })?;
    Ok(config_text.parse::<toml_edit::DocumentMut>()?)
}

/// Write the config document back to disk, preserving formatting.
pub fn write_config_doc(chore_dir: &Path, doc: &toml_edit::DocumentMut) -> Result<(), WorkspaceError> {
    let config_path = chore_dir.join("config.toml");
    crate::io::recovery::atomic_write(&config_path, doc.to_string().as_bytes())
        .map_err(|e| WorkspaceError::ReadError {
            path: config_path,
            source: e,
        })
}

/// Set `[store] backend` in the config document
pub fn set_backend(doc: &mut toml_edit::DocumentMut, backend: Backend) {
    if !doc.contains_key("store") {
        doc["store"] = toml_edit::Item::Table(toml_edit::Table::new());
    }
    doc["store"]["backend"] = toml_edit::value(backend.to_string());
}
