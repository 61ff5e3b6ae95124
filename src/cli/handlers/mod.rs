mod init;
pub use init::cmd_init;

use std::collections::HashSet;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use crate::cli::commands::*;
use crate::cli::output::*;
use crate::controller::Controller;
use crate::io::config_io;
use crate::io::recovery::{read_recovery_entries, recovery_log_path};
use crate::io::workspace_io;
use crate::model::config::Backend;
use crate::model::item::Item;
use crate::model::workspace::Workspace;
use crate::ops::item_ops;
use crate::store;

type CmdResult = Result<(), Box<dyn std::error::Error>>;

/// Flags shared by every command
pub struct Context {
    pub json: bool,
    pub workspace_dir: Option<PathBuf>,
    pub backend: Option<Backend>,
}

impl Context {
    pub fn from_cli(cli: &Cli) -> Self {
        Context {
            json: cli.json,
            workspace_dir: cli.workspace_dir.as_ref().map(PathBuf::from),
            backend: cli.backend,
        }
    }

    /// Directory given with -C (resolved), or the current directory
    pub fn start_dir(&self) -> Result<PathBuf, Box<dyn std::error::Error>> {
        match &self.workspace_dir {
            Some(dir) => Ok(std::fs::canonicalize(dir)
                .map_err(|e| format!("cannot resolve -C path '{}': {}", dir.display(), e))?),
            None => Ok(std::env::current_dir()?),
        }
    }

    pub fn load_workspace(&self) -> Result<Workspace, Box<dyn std::error::Error>> {
        let root = workspace_io::discover_workspace(&self.start_dir()?)?;
        Ok(workspace_io::load_workspace(&root)?)
    }

    /// Command-line override, else the configured backend
    pub fn backend_for(&self, workspace: &Workspace) -> Backend {
        self.backend.unwrap_or(workspace.config.store.backend)
    }

    /// Open the store and wait for its first snapshot
    fn open_controller(&self) -> Result<Controller, Box<dyn std::error::Error>> {
        let workspace = self.load_workspace()?;
        let store = store::open(&workspace, self.backend_for(&workspace))?;
        let mut controller = Controller::new(store);
        controller.pump();
        Ok(controller)
    }
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub fn dispatch(cli: Cli) -> CmdResult {
    let ctx = Context::from_cli(&cli);

    match cli.command {
        None => {
            let workspace = ctx.load_workspace()?;
            let backend = ctx.backend_for(&workspace);
            crate::tui::run(&workspace, backend)
        }
        Some(cmd) => match cmd {
            Commands::Init(args) => cmd_init(args, &ctx),
            Commands::List(args) => cmd_list(args, &ctx),
            Commands::Add(args) => cmd_add(args, &ctx),
            Commands::Done(args) => cmd_set_completed(args, true, &ctx),
            Commands::Undone(args) => cmd_set_completed(args, false, &ctx),
            Commands::Edit(args) => cmd_edit(args, &ctx),
            Commands::Rm(args) => cmd_rm(args, &ctx),
            Commands::ClearCompleted => cmd_clear_completed(&ctx),
            Commands::ClearAll(args) => cmd_clear_all(args, &ctx),
            Commands::Backend(args) => cmd_backend(args, &ctx),
            Commands::Recovery(args) => cmd_recovery(args, &ctx),
        },
    }
}

// ---------------------------------------------------------------------------
// Read commands
// ---------------------------------------------------------------------------

fn cmd_list(args: ListArgs, ctx: &Context) -> CmdResult {
    let mut controller = ctx.open_controller()?;
    controller.set_filter(args.filter);
    let view = controller.view();

    if ctx.json {
        let out = list_to_json(controller.items(), &view);
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        for line in format_listing(controller.items(), &view) {
            println!("{}", line);
        }
    }
    Ok(())
}

fn cmd_recovery(args: RecoveryCmd, ctx: &Context) -> CmdResult {
    let workspace = ctx.load_workspace()?;

    if let Some(RecoveryAction::Path) = args.action {
        let path = recovery_log_path(&workspace.chore_dir);
        println!("{}", path.display());
        return Ok(());
    }

    let entries = read_recovery_entries(&workspace.chore_dir, Some(args.limit.unwrap_or(10)));
    if ctx.json {
        let out: Vec<serde_json::Value> = entries.iter().map(|e| e.to_json()).collect();
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else if entries.is_empty() {
        println!("No recovery entries.");
    } else {
        for entry in &entries {
            print!("{}", entry.to_markdown());
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Write commands
// ---------------------------------------------------------------------------

/// Print one item, as JSON or as a listing line
fn print_item(prefix: &str, item: &Item, ctx: &Context) -> CmdResult {
    if ctx.json {
        println!("{}", serde_json::to_string_pretty(&item_to_json(item))?);
    } else {
        println!("{}{}", prefix, format_item_line(item, item.id.chars().count()));
    }
    Ok(())
}

/// Resolve an id argument against the current list
fn resolve(controller: &Controller, query: &str) -> Result<String, item_ops::ResolveError> {
    item_ops::resolve_id(controller.items(), query).map(str::to_string)
}

fn cmd_add(args: AddArgs, ctx: &Context) -> CmdResult {
    let raw = args.title.join(" ");
    let mut controller = ctx.open_controller()?;
    let existing: HashSet<String> = controller.items().iter().map(|i| i.id.clone()).collect();
    if !controller.submit(&raw) {
        return Err("title is empty".into());
    }
    controller.pump();

    // Titles may repeat, so only an id that was not there before counts
    let title = item_ops::sanitize(&raw);
    let added = controller
        .items()
        .iter()
        .filter(|i| !existing.contains(&i.id) && i.title == title)
        .max_by_key(|i| i.created_at);
    match added {
        Some(item) => print_item("added: ", item, ctx),
        // The write was logged to the recovery log instead of landing
        None => Err("item could not be saved (see `chore recovery`)".into()),
    }
}

fn cmd_set_completed(args: IdArgs, completed: bool, ctx: &Context) -> CmdResult {
    let mut controller = ctx.open_controller()?;
    let id = resolve(&controller, &args.id)?;
    controller.toggle_complete(&id, completed);
    controller.pump();
    match controller.find(&id) {
        Some(item) => print_item("", item, ctx),
        None => Err(format!("item {} disappeared", id).into()),
    }
}

fn cmd_edit(args: EditArgs, ctx: &Context) -> CmdResult {
    let mut controller = ctx.open_controller()?;
    let id = resolve(&controller, &args.id)?;
    if !controller.commit_edit(&id, &args.title.join(" ")) {
        return Err("title is empty".into());
    }
    controller.pump();
    match controller.find(&id) {
        Some(item) => print_item("", item, ctx),
        None => Err(format!("item {} disappeared", id).into()),
    }
}

fn cmd_rm(args: RmArgs, ctx: &Context) -> CmdResult {
    let mut controller = ctx.open_controller()?;
    // Resolve everything first so a bad id deletes nothing
    let mut ids: Vec<String> = Vec::with_capacity(args.ids.len());
    for query in &args.ids {
        let id = resolve(&controller, query)?;
        if !ids.contains(&id) {
            ids.push(id);
        }
    }
    for id in &ids {
        controller.remove(id);
    }
    controller.pump();
    print_removed(ids.len(), ctx)
}

fn cmd_clear_completed(ctx: &Context) -> CmdResult {
    let mut controller = ctx.open_controller()?;
    let removed = controller.clear_completed();
    controller.pump();
    print_removed(removed, ctx)
}

fn cmd_clear_all(args: ClearAllArgs, ctx: &Context) -> CmdResult {
    let mut controller = ctx.open_controller()?;
    if controller.clear_all_is_noop() {
        return print_removed(0, ctx);
    }
    let mut count = 0;
    let cleared = controller.clear_all(|n| {
        count = n;
        args.yes || prompt_yes_no(&format!("Delete all {} item{}?", n, plural(n)))
    });
    if !cleared {
        return Err("cancelled".into());
    }
    controller.pump();
    print_removed(count, ctx)
}

fn cmd_backend(args: BackendArgs, ctx: &Context) -> CmdResult {
    let workspace = ctx.load_workspace()?;
    let mut doc = config_io::read_config_doc(&workspace.chore_dir)?;
    config_io::set_backend(&mut doc, args.backend);
    config_io::write_config_doc(&workspace.chore_dir, &doc)?;

    if ctx.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({ "backend": args.backend }))?
        );
    } else {
        println!("backend: {}", args.backend);
    }
    Ok(())
}

fn print_removed(removed: usize, ctx: &Context) -> CmdResult {
    if ctx.json {
        println!("{}", serde_json::to_string_pretty(&ClearedJson { removed })?);
    } else {
        println!("removed {} item{}", removed, plural(removed));
    }
    Ok(())
}

fn plural(n: usize) -> &'static str {
    if n == 1 { "" } else { "s" }
}

/// Ask on stderr, read one line from stdin. Anything but y/yes is a no.
fn prompt_yes_no(question: &str) -> bool {
    eprint!("{} [y/N] ", question);
    let _ = io::stderr().flush();
    let mut answer = String::new();
    if io::stdin().lock().read_line(&mut answer).is_err() {
        return false;
    }
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}
