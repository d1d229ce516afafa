use anyhow::{Context, Result};
use clap::Parser;
use playlist_bridge::migrate::BackupMode;
use playlist_bridge::model::PlaylistNode;
use playlist_bridge::validation::validate_collection;
use playlist_bridge::{Collection, Format, MigrationConfig, MigrationPipeline};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "playlist-bridge")]
#[command(about = "Migrate playlists between Traktor and Rekordbox collections", long_about = None)]
struct Args {
    /// Source collection (collection.nml or rekordbox.xml)
    #[arg(short = 's', long)]
    source: String,

    /// Destination collection, modified in place
    #[arg(short = 'd', long, required_unless_present_any = ["list", "validate"])]
    destination: Option<String>,

    /// Source format (detected from the extension if omitted)
    #[arg(long, value_enum)]
    source_format: Option<Format>,

    /// Destination format (detected from the extension if omitted)
    #[arg(long, value_enum)]
    destination_format: Option<Format>,

    /// Migrate only specific playlists or folders (can be specified multiple times)
    #[arg(long = "playlist")]
    playlists_filter: Vec<String>,

    /// Put migrated playlists in this folder at the destination root
    #[arg(long)]
    folder: Option<String>,

    /// Also migrate Traktor's _LOOPS and _RECORDINGS playlists
    #[arg(long)]
    include_system: bool,

    /// Match tracks by file location only
    #[arg(long)]
    no_title_artist_fallback: bool,

    /// Name the backup <file>.<timestamp>.bak instead of <file>.bak
    #[arg(long)]
    timestamped_backup: bool,

    /// Translate and merge without writing the destination
    #[arg(long)]
    dry_run: bool,

    /// Print the source playlist tree and exit
    #[arg(long)]
    list: bool,

    /// Only validate the source collection
    #[arg(long)]
    validate: bool,

    /// Verbose logging
    #[arg(short = 'v', long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    // Expand ~ in paths
    let source = expand(&args.source);
    let source_format = match args.source_format {
        Some(format) => format,
        None => Format::detect(&source)?,
    };

    if args.list {
        let collection = Collection::open(&source, source_format)?;
        print_tree(collection.library().playlists(), 0);
        return Ok(());
    }

    if args.validate {
        log::info!("Validation mode - checking {:?}...", source);
        validate_collection(&source, source_format)?;
        log::info!("✅ Validation passed!");
        return Ok(());
    }

    let destination = args
        .destination
        .as_deref()
        .map(expand)
        .context("--destination is required for a migration")?;

    let mut config = MigrationConfig::new(source, destination)
        .with_formats(Some(source_format), args.destination_format)
        .with_system_playlists(args.include_system)
        .with_title_artist_fallback(!args.no_title_artist_fallback)
        .with_dry_run(args.dry_run);

    // Apply playlist filter if specified
    if !args.playlists_filter.is_empty() {
        config = config.with_playlists(args.playlists_filter);
    }
    if let Some(folder) = args.folder {
        config = config.with_folder(folder);
    }
    if args.timestamped_backup {
        config = config.with_backup(BackupMode::Timestamped);
    }

    let report = MigrationPipeline::new(config)?.run()?;

    log::info!(
        "Migrated {} playlist(s) with {} entries: {}",
        report.playlist_count,
        report.entry_count,
        report.nodes.join(", ")
    );
    match report.backup {
        Some(backup) => log::info!("Backup written to: {:?}", backup),
        None => log::info!("Dry run: nothing written"),
    }

    Ok(())
}

fn expand(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).as_ref())
}

fn print_tree(nodes: &[PlaylistNode], depth: usize) {
    for node in nodes {
        let indent = "  ".repeat(depth);
        match node {
            PlaylistNode::Folder(folder) => {
                println!("{}{}/", indent, folder.name);
                print_tree(&folder.children, depth + 1);
            }
            PlaylistNode::Playlist(playlist) => {
                println!("{}{} ({} tracks)", indent, playlist.name, playlist.len());
            }
        }
    }
}
