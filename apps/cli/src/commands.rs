//! CLI command definitions, routing, and tracing setup.

use std::path::PathBuf;

use apidoc_core::edit::{load_patch, submit_edit};
use apidoc_core::site::{BuildOptions, BuildResult, ProgressReporter, build_site};
use apidoc_graph::{
    EntityGraph, NameResolver, Resolution, enumerate_index_routes, enumerate_routes,
};
use apidoc_markup::{NoLinks, render_markdown};
use apidoc_shared::{ApiDocError, AppConfig, init_config, load_config, load_config_from};
use apidoc_store::{DocumentStore, EditTarget, FileDocumentStore, Store};
use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// apidoc: browsable documentation for a C++ API.
#[derive(Parser)]
#[command(
    name = "apidoc",
    version,
    about = "Render browsable documentation for a C++ API from its JSON documentation tree.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Read the document from a local JSON file instead of the configured store.
    #[arg(long, env = "APIDOC_DOCUMENT", global = true)]
    pub document: Option<PathBuf>,

    /// Config file (defaults to ~/.apidoc/apidoc.toml).
    #[arg(long, env = "APIDOC_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Build the static documentation site.
    Build {
        /// Output directory (defaults to [site].output_dir).
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// List every page route in document order.
    Routes {
        /// Print routes as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Resolve a scoped name such as `vec2::length` or `std::vector`.
    Resolve {
        /// Name to resolve.
        name: String,
    },
    /// Render documentation markup as Markdown.
    Markup {
        /// Markup text.
        #[arg(allow_hyphen_values = true)]
        text: String,

        /// Print the parsed node tree as JSON instead.
        #[arg(long)]
        json: bool,

        /// Do not fetch the document; leave every reference unlinked.
        #[arg(long)]
        no_links: bool,
    },
    /// Post a partial update to the document store.
    Post {
        #[command(subcommand)]
        target: PostTarget,
    },
    /// Manage configuration.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// What a `post` updates.
#[derive(Subcommand)]
pub(crate) enum PostTarget {
    /// Update a project.
    Project {
        project: String,

        /// JSON file with the fields to change.
        #[arg(long)]
        data: PathBuf,
    },
    /// Update a header.
    Header {
        project: String,
        header: String,

        /// JSON file with the fields to change.
        #[arg(long)]
        data: PathBuf,
    },
    /// Update a top-level entity.
    Entity {
        project: String,
        header: String,
        entity: String,

        /// JSON file with the fields to change.
        #[arg(long)]
        data: PathBuf,
    },
}

impl PostTarget {
    fn split(self) -> (EditTarget, PathBuf) {
        match self {
            Self::Project { project, data } => (EditTarget::Project { project }, data),
            Self::Header {
                project,
                header,
                data,
            } => (EditTarget::Header { project, header }, data),
            Self::Entity {
                project,
                header,
                entity,
                data,
            } => (
                EditTarget::Entity {
                    project,
                    header,
                    entity,
                },
                data,
            ),
        }
    }
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Crates whose events are shown at the selected verbosity.
const LOG_TARGETS: &[&str] = &[
    "apidoc",
    "apidoc_core",
    "apidoc_graph",
    "apidoc_markup",
    "apidoc_store",
    "apidoc_shared",
];

/// Initialize tracing based on CLI flags. Logs go to stderr.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = LOG_TARGETS
        .iter()
        .map(|target| format!("{target}={level}"))
        .collect::<Vec<_>>()
        .join(",");

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let ctx = Context {
        document: cli.document,
        config: cli.config,
    };

    match cli.command {
        Command::Build { out } => cmd_build(&ctx, out).await,
        Command::Routes { json } => cmd_routes(&ctx, json).await,
        Command::Resolve { name } => cmd_resolve(&ctx, &name).await,
        Command::Markup {
            text,
            json,
            no_links,
        } => cmd_markup(&ctx, &text, json, no_links).await,
        Command::Post { target } => cmd_post(&ctx, target).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show(&ctx).await,
        },
    }
}

/// Global options every command may need.
struct Context {
    document: Option<PathBuf>,
    config: Option<PathBuf>,
}

impl Context {
    fn load_config(&self) -> Result<AppConfig> {
        let config = match &self.config {
            Some(path) => load_config_from(path)?,
            None => load_config()?,
        };
        Ok(config)
    }

    /// `--document` wins over the configured store.
    fn open_store(&self, config: &AppConfig) -> Result<Store> {
        let store = match &self.document {
            Some(path) => Store::File(FileDocumentStore::new(path)),
            None => Store::from_config(&config.store)?,
        };
        Ok(store)
    }

    async fn fetch_graph(&self, config: &AppConfig) -> Result<EntityGraph> {
        let store = self.open_store(config)?;
        let document = store.fetch_document().await?;
        Ok(EntityGraph::load(document))
    }
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_build(ctx: &Context, out: Option<PathBuf>) -> Result<()> {
    let config = ctx.load_config()?;
    let store = ctx.open_store(&config)?;

    let mut options = BuildOptions::from_config(&config);
    if let Some(out) = out {
        options.output_dir = out;
    }

    info!(output = %options.output_dir.display(), "building site");

    let reporter = CliProgress::new();
    let result = match build_site(&store, &options, &reporter).await {
        Ok(result) => result,
        Err(e) => {
            reporter.spinner.finish_and_clear();
            return Err(e.into());
        }
    };

    let manifest = &result.manifest;
    println!();
    println!("  Site built successfully!");
    println!("  Build:      {}", manifest.build_id);
    println!("  Pages:      {}", manifest.page_count);
    println!("  Entities:   {}", manifest.entity_count);
    println!("  Unresolved: {}", manifest.unresolved_references);
    println!("  Path:       {}", result.output_dir.display());
    println!("  Time:       {:.1}s", result.elapsed.as_secs_f64());
    println!();

    Ok(())
}

async fn cmd_routes(ctx: &Context, json: bool) -> Result<()> {
    let config = ctx.load_config()?;
    let graph = ctx.fetch_graph(&config).await?;
    let mode = config.routes.encoding();

    let index_routes = enumerate_index_routes(&graph, mode);
    let routes = enumerate_routes(&graph, mode);

    if json {
        let value = serde_json::json!({
            "index_routes": index_routes,
            "routes": routes,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    for route in &index_routes {
        println!("{}", route.path());
    }
    for route in &routes {
        println!("{}", route.path());
    }
    Ok(())
}

async fn cmd_resolve(ctx: &Context, name: &str) -> Result<()> {
    let config = ctx.load_config()?;
    let graph = ctx.fetch_graph(&config).await?;
    let resolver = NameResolver::from_config(&graph, &config.links);

    match resolver.resolve(name) {
        Resolution::Path(path) => println!("{path}"),
        Resolution::External(url) => println!("{url}"),
        Resolution::Unresolved => println!("unresolved: {name}"),
    }
    Ok(())
}

async fn cmd_markup(ctx: &Context, text: &str, json: bool, no_links: bool) -> Result<()> {
    // shells pass `\n` literally
    let text = text.replace("\\n", "\n");
    let nodes = apidoc_markup::parse(&text);

    if json {
        println!("{}", serde_json::to_string_pretty(&nodes)?);
        return Ok(());
    }

    if no_links {
        println!("{}", render_markdown(&nodes, &NoLinks));
        return Ok(());
    }

    let config = ctx.load_config()?;
    let graph = ctx.fetch_graph(&config).await?;
    let resolver = NameResolver::from_config(&graph, &config.links);
    println!("{}", render_markdown(&nodes, &resolver));
    Ok(())
}

async fn cmd_post(ctx: &Context, target: PostTarget) -> Result<()> {
    let (target, data) = target.split();
    let config = ctx.load_config()?;
    let store = ctx.open_store(&config)?;
    let patch = load_patch(&data)?;

    match submit_edit(&store, &target, &patch).await {
        Ok(()) => {
            println!("Saved {target}");
            Ok(())
        }
        Err(e @ ApiDocError::Post(_)) => Err(eyre!(
            "{e}\nYour changes are still in {}; nothing was lost.",
            data.display()
        )),
        Err(e) => Err(e.into()),
    }
}

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show(ctx: &Context) -> Result<()> {
    let config = ctx.load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]);
        spinner.set_style(style);
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn page_written(&self, path: &str, current: usize, total: usize) {
        self.spinner
            .set_message(format!("Writing [{current}/{total}] {path}"));
    }

    fn done(&self, _result: &BuildResult) {
        self.spinner.finish_and_clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_with_output_dir() {
        let cli = Cli::try_parse_from(["apidoc", "build", "--out", "public"]).unwrap();
        match cli.command {
            Command::Build { out } => assert_eq!(out, Some(PathBuf::from("public"))),
            _ => panic!("expected build command"),
        }
    }

    #[test]
    fn document_flag_is_global() {
        let cli =
            Cli::try_parse_from(["apidoc", "resolve", "vec2::length", "--document", "doc.json"])
                .unwrap();
        assert_eq!(cli.document, Some(PathBuf::from("doc.json")));
        match cli.command {
            Command::Resolve { name } => assert_eq!(name, "vec2::length"),
            _ => panic!("expected resolve command"),
        }
    }

    #[test]
    fn post_entity_requires_data() {
        assert!(Cli::try_parse_from(["apidoc", "post", "entity", "Core", "math.h", "vec2"]).is_err());

        let cli = Cli::try_parse_from([
            "apidoc", "post", "entity", "Core", "math.h", "vec2", "--data", "patch.json",
        ])
        .unwrap();
        let Command::Post { target } = cli.command else {
            panic!("expected post command");
        };
        let (target, data) = target.split();
        assert_eq!(target.to_string(), "entity Core/math.h/vec2");
        assert_eq!(data, PathBuf::from("patch.json"));
    }

    #[test]
    fn markup_flags() {
        let cli = Cli::try_parse_from(["apidoc", "markup", "- a", "--json"]).unwrap();
        match cli.command {
            Command::Markup {
                text,
                json,
                no_links,
            } => {
                assert_eq!(text, "- a");
                assert!(json);
                assert!(!no_links);
            }
            _ => panic!("expected markup command"),
        }
    }

    #[test]
    fn verbosity_counts() {
        let cli = Cli::try_parse_from(["apidoc", "-vv", "routes"]).unwrap();
        assert_eq!(cli.verbose, 2);
    }
}
