use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "tw", about = concat!("taskwise v", env!("CARGO_PKG_VERSION"), " - describe a goal, get a ranked task list"), version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Use a different data directory (default: $TASKWISE_DIR or ~/.local/share/taskwise)
    #[arg(short = 'D', long = "data-dir", global = true)]
    pub data_dir: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a default config.toml into the data directory
    Init(InitArgs),
    /// Generate a new task list from a description (replaces active tasks)
    Generate(GenerateArgs),
    /// Add a task
    Add(AddArgs),
    /// List active tasks grouped by category
    List,
    /// List completed tasks, newest first
    Completed,
    /// Mark a task complete
    Done(IdArgs),
    /// Move a completed task back to the active list
    Reopen(IdArgs),
    /// Change a task's title
    Title(TitleArgs),
    /// Move a task before another task or to the end of a category
    Mv(MvArgs),
    /// Delete a task permanently
    Rm(IdArgs),
    /// Rename a category on every active task in it
    RenameCategory(RenameCategoryArgs),
    /// Re-categorize tasks with natural-language instructions
    Adjust(AdjustArgs),
    /// Export active tasks as a markdown checklist
    Export(ExportArgs),
}

#[derive(Args)]
pub struct InitArgs {
    /// Overwrite an existing config.toml
    #[arg(long)]
    pub force: bool,
}

#[derive(Args)]
pub struct GenerateArgs {
    /// Description of the project or goal
    #[arg(required = true, num_args = 1..)]
    pub description: Vec<String>,
}

#[derive(Args)]
pub struct AddArgs {
    /// Task title
    pub title: String,
    /// Category (default: Uncategorized)
    #[arg(short, long, default_value = "")]
    pub category: String,
    /// Rank within the category (default: first)
    #[arg(short, long)]
    pub priority: Option<u32>,
}

#[derive(Args)]
pub struct IdArgs {
    /// Task ID (any unique prefix)
    pub id: String,
}

#[derive(Args)]
pub struct TitleArgs {
    /// Task ID (any unique prefix)
    pub id: String,
    /// New title
    pub title: String,
}

#[derive(Args)]
pub struct MvArgs {
    /// Task ID to move (any unique prefix)
    pub id: String,
    /// Insert immediately before this task
    #[arg(long)]
    pub before: Option<String>,
    /// Target category (default: the category of --before)
    #[arg(long)]
    pub category: Option<String>,
}

#[derive(Args)]
pub struct RenameCategoryArgs {
    /// Current category name
    pub old: String,
    /// New category name
    pub new: String,
}

#[derive(Args)]
pub struct AdjustArgs {
    /// Instructions, e.g. "merge research into planning"
    #[arg(required = true, num_args = 1..)]
    pub instructions: Vec<String>,
}

#[derive(Args)]
pub struct ExportArgs {
    /// Write to this file (or into this directory with the default name)
    #[arg(short, long)]
    pub output: Option<String>,
}
