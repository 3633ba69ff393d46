//! CLI binary for moddeps: scan a mods folder and draw its dependency graph.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use moddeps_core::config::{CONFIG_FILE, ModdepsConfig};
use moddeps_core::export::{self, ExportFormat};
use moddeps_core::package::{ModKind, PackageDescriptor};
use moddeps_scan::ScanOptions;
use moddeps_scan::paths::{normalize_user_path, resolve_mods_dir};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "moddeps", about = "Draw mod dependency graphs as DGML")]
struct Cli {
    /// Config file (defaults to ./moddeps.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Where to find the mods.
#[derive(Args)]
#[group(required = true, multiple = false)]
struct ModsSource {
    /// Mods folder to scan
    #[arg(long)]
    mods: Option<String>,

    /// Game folder containing a Mods folder
    #[arg(long)]
    game: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan the mods folder and write the dependency graph
    Graph {
        #[command(flatten)]
        source: ModsSource,

        /// Output file (defaults to mod-dependencies.dgml)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format: dgml, dot, mermaid, json
        #[arg(short, long)]
        format: Option<String>,

        /// Draw content packs grouped inside their owner (overrides the config)
        #[arg(long, overrides_with = "no_group_content_packs")]
        group_content_packs: bool,

        /// Draw content packs as depending on their owner instead of grouped inside it
        #[arg(long, overrides_with = "group_content_packs")]
        no_group_content_packs: bool,

        /// Open the generated file in its default application
        #[arg(long)]
        open: bool,
    },

    /// List every folder in the mods folder with its classification
    Scan {
        #[command(flatten)]
        source: ModsSource,
    },
}

fn load_config(cli: &Cli) -> Result<ModdepsConfig> {
    match &cli.config {
        Some(path) => ModdepsConfig::load_file(path),
        None => {
            let cwd = std::env::current_dir().context("failed to get current directory")?;
            ModdepsConfig::load(&cwd)
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli)
        .with_context(|| format!("failed to load configuration ({})", CONFIG_FILE))?;

    match cli.command {
        Commands::Graph {
            source,
            output,
            format,
            group_content_packs,
            no_group_content_packs,
            open,
        } => {
            let group = resolve_grouping(
                config.graph.group_content_packs,
                group_content_packs,
                no_group_content_packs,
            );
            cmd_graph(&config, &source, output, format.as_deref(), group, open)
        }
        Commands::Scan { source } => cmd_scan(&config, &source),
    }
}

fn resolve_source(source: &ModsSource) -> Result<PathBuf> {
    if let Some(mods) = &source.mods {
        return Ok(normalize_user_path(mods));
    }
    let game = source
        .game
        .as_deref()
        .context("either --mods or --game is required")?;
    Ok(resolve_mods_dir(&normalize_user_path(game))?)
}

fn scan(config: &ModdepsConfig, source: &ModsSource) -> Result<Vec<PackageDescriptor>> {
    let mods_dir = resolve_source(source)?;
    eprintln!("Scanning {}", mods_dir.display());
    let options = ScanOptions {
        exclude: config.scan.exclude.clone(),
    };
    moddeps_scan::scan_mods_folder(&mods_dir, &options)
        .with_context(|| format!("failed to scan {}", mods_dir.display()))
}

fn cmd_graph(
    config: &ModdepsConfig,
    source: &ModsSource,
    output: Option<PathBuf>,
    format: Option<&str>,
    group_content_packs: bool,
    open: bool,
) -> Result<()> {
    let export_format = match format {
        Some(f) => f.parse::<ExportFormat>().map_err(|e| anyhow::anyhow!(e))?,
        None => config.graph.export_format()?,
    };
    let output = output.unwrap_or_else(|| default_output(&config.graph.output, export_format));

    let mods = moddeps_scan::renderable(scan(config, source)?);
    let graph = moddeps_core::build(&mods, group_content_packs);

    let rendered = export::export(&graph, export_format)?;
    std::fs::write(&output, rendered)
        .with_context(|| format!("failed to write graph to {}", output.display()))?;

    let file_path = std::path::absolute(&output).unwrap_or(output);
    let stats = graph.stats();
    eprintln!();
    eprintln!("Generated at {}.", file_path.display());
    eprintln!("  Mods: {}", stats.nodes);
    eprintln!("  Content packs: {}", stats.content_packs);
    eprintln!("  Dependency links: {}", stats.dependency_edges);
    eprintln!("  Containment links: {}", stats.containment_edges);
    if !graph.duplicate_ids.is_empty() {
        eprintln!("  Duplicate mod ids: {}", graph.duplicate_ids.join(", "));
    }

    if open {
        open_in_default_app(&file_path)?;
    }
    Ok(())
}

/// The last of `--group-content-packs` / `--no-group-content-packs` wins;
/// with neither, the config decides.
fn resolve_grouping(configured: bool, group: bool, no_group: bool) -> bool {
    if group {
        true
    } else if no_group {
        false
    } else {
        configured
    }
}

/// Swap the configured file's extension for the format's when it was left
/// at the DGML default.
fn default_output(configured: &Path, format: ExportFormat) -> PathBuf {
    if configured.extension().is_some_and(|e| e == "dgml") {
        configured.with_extension(format.extension())
    } else {
        configured.to_path_buf()
    }
}

fn cmd_scan(config: &ModdepsConfig, source: &ModsSource) -> Result<()> {
    let found = scan(config, source)?;
    if found.is_empty() {
        eprintln!("No mod folders found.");
        return Ok(());
    }

    for descriptor in &found {
        let id = descriptor.identity.as_deref().unwrap_or("-");
        match &descriptor.error {
            Some(reason) => println!(
                "{:<12} {} ({}): {}",
                descriptor.kind, descriptor.display_name, id, reason
            ),
            None => println!("{:<12} {} ({})", descriptor.kind, descriptor.display_name, id),
        }
    }

    let count = |kind: ModKind| found.iter().filter(|d| d.kind == kind).count();
    println!(
        "\nSummary: {} valid, {} content packs, {} ignored, {} invalid, {} unknown",
        count(ModKind::Valid),
        count(ModKind::ContentPack),
        count(ModKind::Ignored),
        count(ModKind::Invalid),
        count(ModKind::Unknown)
    );
    Ok(())
}

/// Launch the platform's default opener without waiting for it.
fn open_in_default_app(path: &Path) -> Result<()> {
    let mut command = if cfg!(target_os = "windows") {
        let mut c = std::process::Command::new("cmd");
        c.args(["/C", "start", ""]);
        c
    } else if cfg!(target_os = "macos") {
        std::process::Command::new("open")
    } else {
        std::process::Command::new("xdg-open")
    };
    command
        .arg(path)
        .spawn()
        .with_context(|| format!("failed to open {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_output_follows_format() {
        let configured = Path::new("mod-dependencies.dgml");
        assert_eq!(
            default_output(configured, ExportFormat::Dot),
            PathBuf::from("mod-dependencies.dot")
        );
        assert_eq!(
            default_output(configured, ExportFormat::Dgml),
            PathBuf::from("mod-dependencies.dgml")
        );
        assert_eq!(
            default_output(Path::new("graph.txt"), ExportFormat::Json),
            PathBuf::from("graph.txt")
        );
    }

    #[test]
    fn test_cli_requires_a_source() {
        assert!(Cli::try_parse_from(["moddeps", "graph"]).is_err());
        assert!(
            Cli::try_parse_from(["moddeps", "graph", "--mods", "a", "--game", "b"]).is_err()
        );
        assert!(Cli::try_parse_from(["moddeps", "scan", "--game", "b"]).is_ok());
    }

    #[test]
    fn test_cli_graph_flags() {
        let cli = Cli::try_parse_from([
            "moddeps",
            "graph",
            "--mods",
            "/games/Mods",
            "-f",
            "dot",
            "--no-group-content-packs",
        ])
        .unwrap();
        match cli.command {
            Commands::Graph {
                source,
                format,
                no_group_content_packs,
                open,
                ..
            } => {
                assert_eq!(source.mods.as_deref(), Some("/games/Mods"));
                assert_eq!(format.as_deref(), Some("dot"));
                assert!(no_group_content_packs);
                assert!(!open);
            }
            Commands::Scan { .. } => panic!("expected graph command"),
        }
    }

    fn grouping(args: &[&str], configured: bool) -> bool {
        let mut argv = vec!["moddeps", "graph", "--mods", "m"];
        argv.extend_from_slice(args);
        match Cli::try_parse_from(argv).unwrap().command {
            Commands::Graph {
                group_content_packs,
                no_group_content_packs,
                ..
            } => resolve_grouping(configured, group_content_packs, no_group_content_packs),
            Commands::Scan { .. } => panic!("expected graph command"),
        }
    }

    #[test]
    fn test_grouping_flag_overrides_config() {
        assert!(grouping(&["--group-content-packs"], false));
        assert!(!grouping(&["--no-group-content-packs"], true));
        assert!(grouping(&[], true));
        assert!(!grouping(&[], false));
        // last flag wins
        assert!(grouping(&["--no-group-content-packs", "--group-content-packs"], false));
        assert!(!grouping(&["--group-content-packs", "--no-group-content-packs"], true));
    }
}
