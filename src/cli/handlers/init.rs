use std::path::Path;

use crate::cli::commands::InitArgs;
use crate::io::config_io::render_config;
use crate::io::workspace_io::{self, CHORE_DIR};
use crate::model::config::Backend;

use super::Context;

pub fn cmd_init(args: InitArgs, ctx: &Context) -> Result<(), Box<dyn std::error::Error>> {
    let root = ctx.start_dir()?;
    let backend = ctx.backend.unwrap_or_default();

    if let Some(parent) = parent_workspace(&root) {
        eprintln!(
            "Note: parent workspace found at {}/",
            parent.join(CHORE_DIR).display()
        );
        eprintln!("Creating new workspace in ./{}/", CHORE_DIR);
    }

    let workspace = workspace_io::init_workspace(&root, &render_config(backend), args.force)?;

    if ctx.json {
        let out = serde_json::json!({
            "root": workspace.root.display().to_string(),
            "backend": backend.to_string(),
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!("Initialized chore workspace in {}", workspace.chore_dir.display());
        println!("  backend: {}", backend);
        if backend == Backend::Remote {
            println!("  database: {}", workspace.database_path().display());
        }
    }
    Ok(())
}

fn parent_workspace(root: &Path) -> Option<std::path::PathBuf> {
    let parent = root.parent()?;
    workspace_io::discover_workspace(parent).ok()
}
