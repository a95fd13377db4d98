#![forbid(unsafe_code)]
//! Ruleforge Command Line Interface

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use console::style;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ruleforge::commands::{
    execute_compose, execute_generate, execute_merge, execute_render, execute_tags,
    execute_targets, ComposeCommandOptions, GenerateOptions, MergeOptions, RenderOptions,
    Selection, TagsOptions, TargetsOptions,
};
use ruleforge::registry::{Category, OverridePolicy, Tier};
use ruleforge::render::Skeleton;

#[derive(Parser)]
#[command(name = "ruleforge")]
#[command(about = "Compose tagged rule fragments into instruction files for AI coding assistants")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Tag, tier and template source selection
#[derive(Args, Debug, Clone)]
struct SelectionArgs {
    /// Project directory (holds .ruleforge.json and receives output)
    #[arg(short = 'C', long = "project", default_value = ".")]
    project_dir: PathBuf,

    /// Active tags, comma separated or repeated (UNIVERSAL is implied)
    #[arg(short, long, value_delimiter = ',')]
    tags: Vec<String>,

    /// Maximum tier: core, recommended or optional
    #[arg(long)]
    tier: Option<Tier>,

    /// Fragment ids to force in
    #[arg(long, value_delimiter = ',')]
    include: Vec<String>,

    /// Fragment ids to leave out
    #[arg(long, value_delimiter = ',')]
    exclude: Vec<String>,

    /// Which copy wins when sources share a fragment id
    #[arg(long, value_parser = parse_policy)]
    policy: Option<OverridePolicy>,

    /// Replace the built-in template directory
    #[arg(long, env = "RULEFORGE_TEMPLATES")]
    templates: Option<PathBuf>,

    /// Additional template directory (repeatable, loaded in order)
    #[arg(long = "extra-dir")]
    extra_dirs: Vec<PathBuf>,

    /// Maximum fragments per category
    #[arg(long)]
    max_per_category: Option<usize>,
}

impl From<SelectionArgs> for Selection {
    fn from(args: SelectionArgs) -> Self {
        Selection {
            project_dir: args.project_dir,
            tags: args.tags,
            tier: args.tier,
            include: args.include,
            exclude: args.exclude,
            policy: args.policy,
            templates: args.templates,
            extra_dirs: args.extra_dirs,
            max_per_category: args.max_per_category,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Compose, render and write instruction files
    Generate {
        #[command(flatten)]
        selection: SelectionArgs,

        /// Output targets (claude-code, cursor, copilot, windsurf, cline, gemini, agents)
        #[arg(long = "target", value_delimiter = ',')]
        targets: Vec<String>,

        /// Overwrite existing files
        #[arg(short, long)]
        force: bool,

        /// Merge with existing files, keeping custom sections
        #[arg(short, long, conflicts_with = "force")]
        merge: bool,

        /// Show a diff instead of writing
        #[arg(long)]
        dry_run: bool,

        /// Skip STATUS.md and docs/ skeletons
        #[arg(long)]
        no_skeletons: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the fragments selected for a tag set
    Compose {
        #[command(flatten)]
        selection: SelectionArgs,

        /// Print the rendered document for this target
        #[arg(long)]
        render: Option<String>,

        /// Only this category (instructions, nfr, references, structure, hooks, skills, mcp)
        #[arg(long, value_parser = parse_category)]
        category: Option<Category>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List loaded tags and their fragment counts
    Tags {
        #[command(flatten)]
        selection: SelectionArgs,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List supported output targets
    Targets {
        /// Project directory to check for existing assistant files
        #[arg(short = 'C', long = "project", default_value = ".")]
        project_dir: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Render a template file or skeleton document
    Render {
        /// Template file
        file: Option<PathBuf>,

        /// Render a built-in skeleton (status-tracker, requirements, tech-spec)
        #[arg(long, value_parser = parse_skeleton, conflicts_with = "file")]
        skeleton: Option<Skeleton>,

        /// Project directory (config and detection)
        #[arg(short = 'C', long = "project", default_value = ".")]
        project_dir: PathBuf,

        /// Project name
        #[arg(long)]
        name: Option<String>,

        /// Project language
        #[arg(long)]
        language: Option<String>,

        #[arg(long)]
        framework: Option<String>,

        #[arg(long)]
        domain: Option<String>,

        /// Active tags
        #[arg(short, long, value_delimiter = ',')]
        tags: Vec<String>,

        /// Project handles sensitive data
        #[arg(long)]
        sensitive: bool,

        /// Extra variables as key=value (repeatable)
        #[arg(long = "var")]
        vars: Vec<String>,

        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Merge a generated file into an existing one, keeping custom sections
    Merge {
        /// Existing file
        existing: PathBuf,

        /// Freshly generated file
        generated: PathBuf,

        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn parse_policy(value: &str) -> Result<OverridePolicy, String> {
    match value {
        "first-wins" | "first" => Ok(OverridePolicy::FirstWins),
        "last-wins" | "last" => Ok(OverridePolicy::LastWins),
        other => Err(format!("unknown policy '{}' (first-wins, last-wins)", other)),
    }
}

fn parse_category(value: &str) -> Result<Category, String> {
    Category::all()
        .iter()
        .copied()
        .find(|c| c.file_stem() == value || c.label().eq_ignore_ascii_case(value))
        .ok_or_else(|| format!("unknown category '{}'", value))
}

fn parse_skeleton(value: &str) -> Result<Skeleton, String> {
    match value {
        "status-tracker" | "status" => Ok(Skeleton::StatusTracker),
        "requirements" => Ok(Skeleton::Requirements),
        "tech-spec" => Ok(Skeleton::TechSpec),
        other => Err(format!("unknown skeleton '{}'", other)),
    }
}

/// Log to stderr so stdout stays clean for rendered output and JSON
fn init_tracing(verbose: bool) {
    let default = if verbose { "ruleforge=debug" } else { "ruleforge=warn" };
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| default.into()),
    );
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli.command) {
        eprintln!("{} {:#}", style("✗").red(), e);
        std::process::exit(1);
    }
}

fn run(command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Generate {
            selection,
            targets,
            force,
            merge,
            dry_run,
            no_skeletons,
            json,
        } => {
            let options = GenerateOptions {
                selection: selection.into(),
                targets,
                force,
                merge,
                dry_run,
                json,
                no_skeletons,
            };
            execute_generate(options)
        }

        Commands::Compose {
            selection,
            render,
            category,
            json,
        } => {
            let options = ComposeCommandOptions {
                selection: selection.into(),
                json,
                render,
                category,
            };
            execute_compose(options)
        }

        Commands::Tags { selection, json } => execute_tags(TagsOptions {
            selection: selection.into(),
            json,
        }),

        Commands::Targets { project_dir, json } => {
            execute_targets(TargetsOptions { project_dir, json })
        }

        Commands::Render {
            file,
            skeleton,
            project_dir,
            name,
            language,
            framework,
            domain,
            tags,
            sensitive,
            vars,
            output,
        } => {
            let options = RenderOptions {
                file,
                skeleton,
                project_dir,
                name,
                language,
                framework,
                domain,
                tags,
                sensitive,
                vars,
                output,
            };
            execute_render(options)
        }

        Commands::Merge {
            existing,
            generated,
            output,
        } => execute_merge(MergeOptions {
            existing,
            generated,
            output,
        }),
    }
}
