mod init;
pub use init::cmd_init;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Local;

use crate::ai::http::HttpAssistant;
use crate::cli::commands::*;
use crate::cli::output::*;
use crate::io::config_io;
use crate::io::kv::FileStore;
use crate::model::config::Config;
use crate::model::task::{Task, TaskDraft, TaskPatch};
use crate::ops::adjust::{apply_assignments, prepare_adjustment, request_assignments};
use crate::ops::export::{export_file_name, format_checklist};
use crate::ops::generate::generate_tasks;
use crate::ops::task_ops::{UpdateOutcome, categories};
use crate::store::TaskStore;
use crate::util::clock::SystemClock;

type HandlerResult = Result<(), Box<dyn std::error::Error>>;

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub fn dispatch(cli: Cli) -> HandlerResult {
    let json = cli.json;
    let data_dir = config_io::resolve_data_dir(cli.data_dir.as_deref());

    // Init only writes config; it must not load or sweep the task lists
    let command = match cli.command {
        Commands::Init(args) => return cmd_init(args, &data_dir),
        command => command,
    };

    let config = config_io::read_config(&data_dir)?;
    let mut store = open_store(&data_dir, &config);

    let result = match command {
        Commands::Init(_) => unreachable!("init is handled before the store opens"),
        Commands::Generate(args) => cmd_generate(&mut store, &config, args, json),
        Commands::Add(args) => cmd_add(&mut store, args, json),
        Commands::List => cmd_list(&store, json),
        Commands::Completed => cmd_completed(&store, json),
        Commands::Done(args) => cmd_done(&mut store, args),
        Commands::Reopen(args) => cmd_reopen(&mut store, args),
        Commands::Title(args) => cmd_title(&mut store, args),
        Commands::Mv(args) => cmd_mv(&mut store, args),
        Commands::Rm(args) => cmd_rm(&mut store, args),
        Commands::RenameCategory(args) => cmd_rename_category(&mut store, args),
        Commands::Adjust(args) => cmd_adjust(&mut store, &config, args, json),
        Commands::Export(args) => cmd_export(&store, args),
    };

    // A failed write leaves the in-memory change applied; surface it anyway
    if let Some(e) = store.take_save_error() {
        result?;
        return Err(e.into());
    }
    result
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Open the file-backed store, printing the retention notice if the sweep
/// dropped anything.
fn open_store(data_dir: &Path, config: &Config) -> TaskStore {
    let storage = Box::new(FileStore::new(data_dir));
    let (store, report) = TaskStore::open(storage, Arc::new(SystemClock), &config.retention);
    if let Some(notice) = report.notice {
        eprintln!("{}", notice);
    }
    for key in &report.unreadable {
        eprintln!("warning: could not read {}; changes will not be saved", key);
    }
    store
}

/// Resolve a full id or unique id prefix against both collections
fn resolve_id(store: &TaskStore, query: &str) -> Result<String, Box<dyn std::error::Error>> {
    // Every id starts with the empty string
    if query.trim().is_empty() {
        return Err(format!("task not found: '{}'", query).into());
    }
    let all = || store.active().iter().chain(store.completed().iter());
    if let Some(task) = all().find(|t| t.id == query) {
        return Ok(task.id.clone());
    }
    let matches: Vec<&Task> = all().filter(|t| t.id.starts_with(query)).collect();
    match matches.as_slice() {
        [] => Err(format!("task not found: {}", query).into()),
        [task] => Ok(task.id.clone()),
        _ => Err(format!("ambiguous task id '{}' matches {} tasks", query, matches.len()).into()),
    }
}

fn resolve_task<'a>(store: &'a TaskStore, query: &str) -> Result<&'a Task, Box<dyn std::error::Error>> {
    let id = resolve_id(store, query)?;
    store
        .find(&id)
        .ok_or_else(|| format!("task not found: {}", query).into())
}

fn runtime() -> std::io::Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
}

fn print_json<T: serde::Serialize>(value: &T) -> HandlerResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_lines(lines: Vec<String>) {
    for line in lines {
        println!("{}", line);
    }
}

// ---------------------------------------------------------------------------
// Read commands
// ---------------------------------------------------------------------------

fn cmd_list(store: &TaskStore, json: bool) -> HandlerResult {
    if json {
        return print_json(&grouped_to_json(store.active()));
    }
    print_lines(format_grouped_listing(store.active()));
    Ok(())
}

fn cmd_completed(store: &TaskStore, json: bool) -> HandlerResult {
    if json {
        let mut tasks: Vec<&Task> = store.completed().iter().collect();
        tasks.sort_by_key(|t| std::cmp::Reverse(t.completed_at.unwrap_or(0)));
        let out: Vec<TaskJson> = tasks.into_iter().map(task_to_json).collect();
        return print_json(&out);
    }
    print_lines(format_completed_listing(store.completed()));
    Ok(())
}

fn cmd_export(store: &TaskStore, args: ExportArgs) -> HandlerResult {
    let text = format_checklist(store.active());
    let Some(output) = args.output else {
        println!("{}", text);
        return Ok(());
    };
    let mut path = PathBuf::from(output);
    if path.is_dir() {
        path.push(export_file_name(Local::now().date_naive()));
    }
    fs::write(&path, format!("{}\n", text))?;
    println!("Exported to {}", path.display());
    Ok(())
}

// ---------------------------------------------------------------------------
// Write commands
// ---------------------------------------------------------------------------

fn cmd_add(store: &mut TaskStore, args: AddArgs, json: bool) -> HandlerResult {
    let mut draft = TaskDraft::new(args.title, args.category);
    if let Some(priority) = args.priority {
        draft = draft.with_priority(priority);
    }
    let id = store.add(draft).ok_or("task title cannot be empty")?;
    if json {
        return print_json(&AddedJson { id });
    }
    if let Some(task) = store.find(&id) {
        println!("Added [{}] {}", task.display_category(), format_task_line(task).trim_start());
    }
    Ok(())
}

fn cmd_done(store: &mut TaskStore, args: IdArgs) -> HandlerResult {
    let task = resolve_task(store, &args.id)?;
    if task.completed {
        return Err(format!("task {} is already completed", short_id(&task.id)).into());
    }
    let (id, title) = (task.id.clone(), task.title.clone());
    store.update(&id, &TaskPatch::completed(true));
    println!("Completed: {}", title);
    Ok(())
}

fn cmd_reopen(store: &mut TaskStore, args: IdArgs) -> HandlerResult {
    let task = resolve_task(store, &args.id)?;
    if !task.completed {
        return Err(format!("task {} is not completed", short_id(&task.id)).into());
    }
    let (id, title) = (task.id.clone(), task.title.clone());
    store.update(&id, &TaskPatch::completed(false));
    println!("Reopened: {}", title);
    Ok(())
}

fn cmd_title(store: &mut TaskStore, args: TitleArgs) -> HandlerResult {
    if args.title.trim().is_empty() {
        return Err("task title cannot be empty".into());
    }
    let id = resolve_id(store, &args.id)?;
    match store.edit_title(&id, &args.title) {
        UpdateOutcome::NotFound => Err(format!("task not found: {}", args.id).into()),
        _ => {
            println!("Renamed {}", short_id(&id));
            Ok(())
        }
    }
}

fn cmd_mv(store: &mut TaskStore, args: MvArgs) -> HandlerResult {
    let task = resolve_task(store, &args.id)?;
    if task.completed {
        return Err(format!("task {} is completed; reopen it first", short_id(&task.id)).into());
    }
    let id = task.id.clone();

    let before = match args.before.as_deref() {
        Some(query) => {
            let target = resolve_task(store, query)?;
            if target.completed {
                return Err(format!("task {} is completed", short_id(&target.id)).into());
            }
            Some((target.id.clone(), target.category.clone()))
        }
        None => None,
    };

    let category = match (args.category, &before) {
        (Some(category), _) => category,
        (None, Some((_, category))) => category.clone(),
        (None, None) => return Err("mv needs --before <id> or --category <name>".into()),
    };

    store.reorder(&id, before.as_ref().map(|(target, _)| target.as_str()), &category);
    if let Some(task) = store.find(&id) {
        println!("Moved [{}] {}", task.display_category(), format_task_line(task).trim_start());
    }
    Ok(())
}

fn cmd_rm(store: &mut TaskStore, args: IdArgs) -> HandlerResult {
    let id = resolve_id(store, &args.id)?;
    store.remove(&id);
    println!("Removed {}", short_id(&id));
    Ok(())
}

fn cmd_rename_category(store: &mut TaskStore, args: RenameCategoryArgs) -> HandlerResult {
    if args.new.trim().is_empty() {
        return Err("new category name cannot be empty".into());
    }
    let count = store.rename_category(&args.old, args.new.trim());
    if count == 0 {
        let known = categories(store.active()).join(", ");
        return Err(format!("no active tasks in category '{}' (categories: {})", args.old, known).into());
    }
    println!(
        "Renamed '{}' to '{}' on {} task{}",
        args.old,
        args.new.trim(),
        count,
        if count == 1 { "" } else { "s" }
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// AI commands
// ---------------------------------------------------------------------------

fn cmd_generate(store: &mut TaskStore, config: &Config, args: GenerateArgs, json: bool) -> HandlerResult {
    let description = args.description.join(" ");
    if description.trim().is_empty() {
        return Err("description is empty: describe your project or goal".into());
    }
    let assistant = HttpAssistant::from_config(&config.ai)?;
    let tasks = runtime()?.block_on(generate_tasks(&assistant, &description, &config.ai.retry))?;
    store.set_all(tasks);

    if json {
        return print_json(&grouped_to_json(store.active()));
    }
    print_lines(format_grouped_listing(store.active()));
    Ok(())
}

fn cmd_adjust(store: &mut TaskStore, config: &Config, args: AdjustArgs, json: bool) -> HandlerResult {
    let instructions = args.instructions.join(" ");
    // Validate before touching the network or the API key
    let request = prepare_adjustment(store.active(), &instructions)?;

    let assistant = HttpAssistant::from_config(&config.ai)?;
    let assignments = runtime()?.block_on(request_assignments(&assistant, &request))?;
    let outcome = apply_assignments(store, &assignments);

    if json {
        return print_json(&AdjustJson {
            returned: outcome.returned,
            changed: outcome.changed,
        });
    }
    println!(
        "Re-categorized {} of {} task{}",
        outcome.changed,
        store.active().len(),
        if store.active().len() == 1 { "" } else { "s" }
    );
    print_lines(format_grouped_listing(store.active()));
    Ok(())
}
