#![forbid(unsafe_code)]

mod cmd;
mod output;

use clap::{CommandFactory, Parser, Subcommand};
use output::OutputMode;
use std::env;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "tagquest: answer map-data quests and queue the resulting edits",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long)]
    verbose: bool,

    /// Emit JSON output instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    /// Derive the output mode from flags.
    const fn output_mode(&self) -> OutputMode {
        if self.json {
            OutputMode::Json
        } else {
            OutputMode::Human
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        next_help_heading = "Setup",
        about = "Initialize a tagquest project",
        long_about = "Create .tagquest/ with a config template and an empty quest database.",
        after_help = "EXAMPLES:\n    # Initialize a project in the current directory\n    tq init\n\n    # Recreate the config template\n    tq init --force"
    )]
    Init(cmd::init::InitArgs),

    #[command(
        next_help_heading = "Setup",
        about = "Import quests and cached elements",
        long_about = "Load elements, OSM quests and note quests from a JSON file. Imported quests start out new.",
        after_help = "EXAMPLES:\n    # Import a quest batch\n    tq import --file quests.json\n\n    # Emit machine-readable output\n    tq import --file quests.json --json"
    )]
    Import(cmd::import::ImportArgs),

    #[command(
        next_help_heading = "Read",
        about = "List quests",
        long_about = "List quests with optional status and group filters.",
        after_help = "EXAMPLES:\n    # List everything\n    tq list\n\n    # Only open OSM quests\n    tq list --status new --group osm\n\n    # Emit machine-readable output\n    tq list --json"
    )]
    List(cmd::list::ListArgs),

    #[command(
        next_help_heading = "Read",
        about = "Show one quest",
        long_about = "Show a quest with its cached element and any pending tag changes.",
        after_help = "EXAMPLES:\n    # Show an OSM quest\n    tq show osm 42\n\n    # Show a note quest as JSON\n    tq show note 9 --json"
    )]
    Show(cmd::show::ShowArgs),

    #[command(
        next_help_heading = "Read",
        about = "List queued side records",
        long_about = "List notes, deletions, splits and reverts waiting for upload.",
        after_help = "EXAMPLES:\n    # List all records\n    tq records\n\n    # Only notes\n    tq records --kind create_note"
    )]
    Records(cmd::records::RecordsArgs),

    #[command(
        next_help_heading = "Answer",
        about = "Answer an OSM quest",
        long_about = "Apply an answer to an OSM quest. The value is JSON in the shape the quest type expects.",
        after_help = "EXAMPLES:\n    # Answer a parking type quest\n    tq answer 42 --value surface\n\n    # Record where the answer came from\n    tq answer 42 --value underground --source imagery"
    )]
    Answer(cmd::answer::AnswerArgs),

    #[command(
        next_help_heading = "Answer",
        about = "Comment on a note quest",
        long_about = "Answer a note quest with a comment and optional images.",
        after_help = "EXAMPLES:\n    # Comment on a note\n    tq comment 9 --text \"The shop closed\"\n\n    # Attach a photo\n    tq comment 9 --text \"See photo\" --image shop.jpg"
    )]
    Comment(cmd::comment::CommentArgs),

    #[command(
        next_help_heading = "Answer",
        about = "Hide a quest",
        long_about = "Dismiss a quest without answering it.",
        after_help = "EXAMPLES:\n    # Hide an OSM quest\n    tq hide osm 42\n\n    # Hide a note quest\n    tq hide note 9"
    )]
    Hide(cmd::hide::HideArgs),

    #[command(
        next_help_heading = "Answer",
        about = "Undo an OSM quest",
        long_about = "Return an answered, hidden or uploaded OSM quest to new.",
        after_help = "EXAMPLES:\n    # Undo the last answer\n    tq undo 42"
    )]
    Undo(cmd::undo::UndoArgs),

    #[command(
        next_help_heading = "Edit",
        about = "Record that an element no longer exists",
        long_about = "Queue a deletion of the quest's element and drop every quest on it.",
        after_help = "EXAMPLES:\n    # The bench is gone\n    tq delete-element 42"
    )]
    DeleteElement(cmd::delete_element::DeleteElementArgs),

    #[command(
        next_help_heading = "Edit",
        about = "Record that a way must be split",
        long_about = "Queue a split of the quest's way and drop every quest on it.",
        after_help = "EXAMPLES:\n    # Split at a vertex\n    tq split 42 --at 52.5201,13.4049\n\n    # Split a quarter of the way along a segment\n    tq split 42 --at 52.52,13.40:52.53,13.41@0.25"
    )]
    Split(cmd::split::SplitArgs),

    #[command(
        next_help_heading = "Edit",
        about = "Replace an element's tags",
        long_about = "Replace the tags of the quest's element, keeping building and address keys.",
        after_help = "EXAMPLES:\n    # The bakery became a butcher\n    tq replace 42 --tag shop=butcher --tag name=Meyer"
    )]
    Replace(cmd::replace::ReplaceArgs),

    #[command(
        next_help_heading = "Edit",
        about = "Leave a note for other mappers",
        long_about = "Create a note at a position, or about a quest that cannot be answered on site.",
        after_help = "EXAMPLES:\n    # A free note\n    tq note --text \"Entrance moved\" --at 52.52,13.40\n\n    # A note about a quest\n    tq note --text \"Gate locked\" --quest 42 --title \"Parking type\""
    )]
    Note(cmd::note::NoteArgs),

    #[command(
        next_help_heading = "Setup",
        about = "Generate shell completions",
        long_about = "Generate a shell completion script for tq.",
        after_help = "EXAMPLES:\n    # Bash\n    tq completions bash > ~/.local/share/bash-completion/completions/tq"
    )]
    Completions(cmd::completions::CompletionsArgs),
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("TAGQUEST_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if env::var("DEBUG").is_ok() {
            "tq=debug,tagquest_core=debug,info"
        } else {
            "tagquest_core=info,warn"
        })
    });
    let format = env::var("TAGQUEST_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);
    match format.as_str() {
        "json" => registry
            .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
            .init(),
        _ => registry
            .with(fmt::layer().compact().with_writer(std::io::stderr))
            .init(),
    }
}

fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    if cli.verbose {
        info!("Verbose mode enabled");
    }

    let project_root = env::current_dir()?;
    let output = cli.output_mode();

    match cli.command {
        Commands::Init(ref args) => cmd::init::run_init(args, &project_root),
        Commands::Import(ref args) => cmd::import::run_import(args, output, &project_root),
        Commands::List(ref args) => cmd::list::run_list(args, output, &project_root),
        Commands::Show(ref args) => cmd::show::run_show(args, output, &project_root),
        Commands::Records(ref args) => cmd::records::run_records(args, output, &project_root),
        Commands::Answer(ref args) => cmd::answer::run_answer(args, output, &project_root),
        Commands::Comment(ref args) => cmd::comment::run_comment(args, output, &project_root),
        Commands::Hide(ref args) => cmd::hide::run_hide(args, output, &project_root),
        Commands::Undo(ref args) => cmd::undo::run_undo(args, output, &project_root),
        Commands::DeleteElement(ref args) => {
            cmd::delete_element::run_delete_element(args, output, &project_root)
        }
        Commands::Split(ref args) => cmd::split::run_split(args, output, &project_root),
        Commands::Replace(ref args) => cmd::replace::run_replace(args, output, &project_root),
        Commands::Note(ref args) => cmd::note::run_note(args, output, &project_root),
        Commands::Completions(ref args) => {
            cmd::completions::run_completions(args.shell, &mut Cli::command())
        }
    }
}
