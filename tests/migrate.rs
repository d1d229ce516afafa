use playlist_bridge::migrate::{merge_playlists, BackupMode};
use playlist_bridge::model::{Playlist, PlaylistNode};
use playlist_bridge::{Collection, Format, MigrationConfig, MigrationError, MigrationPipeline};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Copy the fixture collections into a scratch directory
fn setup() -> (TempDir, PathBuf, PathBuf) {
    let dir = TempDir::new().unwrap();
    let fixtures = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures");

    let traktor = dir.path().join("collection.nml");
    let rekordbox = dir.path().join("rekordbox.xml");
    fs::copy(fixtures.join("collection.nml"), &traktor).unwrap();
    fs::copy(fixtures.join("rekordbox.xml"), &rekordbox).unwrap();

    (dir, traktor, rekordbox)
}

fn find<'a>(nodes: &'a [PlaylistNode], name: &str) -> &'a PlaylistNode {
    nodes
        .iter()
        .find(|n| n.name() == name)
        .unwrap_or_else(|| panic!("node '{}' not found", name))
}

fn keys(node: &PlaylistNode) -> Vec<&str> {
    match node {
        PlaylistNode::Playlist(p) => p.entries.iter().map(|e| e.track_id.as_str()).collect(),
        PlaylistNode::Folder(_) => panic!("expected a playlist"),
    }
}

fn migration_error(err: &anyhow::Error) -> &MigrationError {
    err.downcast_ref::<MigrationError>()
        .unwrap_or_else(|| panic!("expected a migration error, got {:#}", err))
}

#[test]
fn test_unchanged_collections_round_trip() {
    let (_dir, traktor, rekordbox) = setup();

    for (path, format) in [(traktor, Format::Traktor), (rekordbox, Format::Rekordbox)] {
        let original = fs::read(&path).unwrap();
        let collection = Collection::open(&path, format).unwrap();
        let written = merge_playlists(&collection, Vec::new(), None).unwrap();
        assert_eq!(written, original, "{:?} changed on round trip", path);
    }
}

#[test]
fn test_migrate_playlist_to_rekordbox() {
    let (_dir, traktor, rekordbox) = setup();

    let config = MigrationConfig::new(traktor, rekordbox.clone())
        .with_playlists(vec!["Summer2023".to_string()]);
    let report = MigrationPipeline::new(config).unwrap().run().unwrap();

    assert_eq!(report.nodes, vec!["Summer2023"]);
    assert_eq!(report.entry_count, 2);

    let migrated = Collection::open(&rekordbox, Format::Rekordbox).unwrap();
    let playlists = migrated.library().playlists();
    assert_eq!(
        playlists.iter().map(|n| n.name()).collect::<Vec<_>>(),
        vec!["Warmup", "Archive", "Summer2023"]
    );
    // A.mp3 and B.mp3, in source order
    assert_eq!(keys(find(playlists, "Summer2023")), vec!["101", "102"]);

    let contents = fs::read_to_string(&rekordbox).unwrap();
    assert!(contents.contains(r#"<NODE Type="0" Name="ROOT" Count="3">"#));
}

#[test]
fn test_folder_nesting_is_preserved() {
    let (_dir, traktor, rekordbox) = setup();

    // Disco lives in the Crates folder; migrate the folder without Ambient
    let source = fs::read_to_string(&traktor)
        .unwrap()
        .replace("KEY=\"C:/:Music/:Ambient/:E.mp3\"", "KEY=\"C:/:Music/:B.mp3\"");
    fs::write(&traktor, source).unwrap();

    let config = MigrationConfig::new(traktor, rekordbox.clone())
        .with_playlists(vec!["Crates".to_string()]);
    let report = MigrationPipeline::new(config).unwrap().run().unwrap();
    assert_eq!(report.playlist_count, 2);

    let migrated = Collection::open(&rekordbox, Format::Rekordbox).unwrap();
    match find(migrated.library().playlists(), "Crates") {
        PlaylistNode::Folder(folder) => {
            assert_eq!(folder.children.len(), 2);
            assert_eq!(keys(&folder.children[0]), vec!["103", "101"]);
            assert_eq!(keys(&folder.children[1]), vec!["102"]);
        }
        other => panic!("expected a folder, got {:?}", other),
    }
}

#[test]
fn test_missing_track_leaves_destination_untouched() {
    let (_dir, traktor, rekordbox) = setup();
    let original = fs::read(&rekordbox).unwrap();

    let config = MigrationConfig::new(traktor, rekordbox.clone())
        .with_playlists(vec!["Ambient".to_string()]);
    let err = MigrationPipeline::new(config).unwrap().run().unwrap_err();

    match migration_error(&err) {
        MigrationError::Lookup { playlist, track } => {
            assert_eq!(playlist, "Ambient");
            assert!(track.contains("Echo"));
        }
        other => panic!("expected a lookup error, got {:?}", other),
    }
    assert_eq!(fs::read(&rekordbox).unwrap(), original);
    assert!(!rekordbox.with_file_name("rekordbox.xml.bak").exists());
}

#[test]
fn test_migrating_everything_stops_at_first_missing_track() {
    let (_dir, traktor, rekordbox) = setup();
    let original = fs::read(&rekordbox).unwrap();

    let config = MigrationConfig::new(traktor, rekordbox.clone());
    let err = MigrationPipeline::new(config).unwrap().run().unwrap_err();

    assert!(matches!(migration_error(&err), MigrationError::Lookup { .. }));
    assert_eq!(fs::read(&rekordbox).unwrap(), original);
}

#[test]
fn test_second_migration_is_a_name_collision() {
    let (_dir, traktor, rekordbox) = setup();
    let config = MigrationConfig::new(traktor, rekordbox.clone())
        .with_playlists(vec!["Summer2023".to_string()]);

    MigrationPipeline::new(config.clone()).unwrap().run().unwrap();
    let after_first = fs::read(&rekordbox).unwrap();

    let err = MigrationPipeline::new(config).unwrap().run().unwrap_err();
    match migration_error(&err) {
        MigrationError::NameCollision { name, parent } => {
            assert_eq!(name, "Summer2023");
            assert_eq!(parent, "ROOT");
        }
        other => panic!("expected a name collision, got {:?}", other),
    }
    assert_eq!(fs::read(&rekordbox).unwrap(), after_first);
}

#[test]
fn test_name_used_in_nested_folder_collides() {
    let (_dir, _traktor, rekordbox) = setup();
    let collection = Collection::open(&rekordbox, Format::Rekordbox).unwrap();

    let mut playlist = Playlist::new("Disco Night".to_string());
    playlist.add_track("101".to_string());
    let err = merge_playlists(&collection, vec![PlaylistNode::Playlist(playlist)], None).unwrap_err();

    match migration_error(&err) {
        MigrationError::NameCollision { name, parent } => {
            assert_eq!(name, "Disco Night");
            assert_eq!(parent, "Archive");
        }
        other => panic!("expected a name collision, got {:?}", other),
    }
}

#[test]
fn test_pipeline_rejects_name_from_nested_folder() {
    let (_dir, traktor, rekordbox) = setup();
    let original = fs::read(&rekordbox).unwrap();
    let renamed = fs::read_to_string(&traktor)
        .unwrap()
        .replace(r#"NAME="Summer2023""#, r#"NAME="Disco Night""#);
    fs::write(&traktor, renamed).unwrap();

    let config = MigrationConfig::new(traktor, rekordbox.clone())
        .with_playlists(vec!["Disco Night".to_string()]);
    let err = MigrationPipeline::new(config).unwrap().run().unwrap_err();

    assert!(matches!(migration_error(&err), MigrationError::NameCollision { .. }));
    assert_eq!(fs::read(&rekordbox).unwrap(), original);
}

#[test]
fn test_external_mac_volume_matches_by_location() {
    let (_dir, traktor, rekordbox) = setup();

    let traktor_source = fs::read_to_string(&traktor)
        .unwrap()
        .replace(
            r#"FILE="A.mp3" VOLUME="C:" VOLUMEID="32a20fa3""#,
            r#"FILE="A.mp3" VOLUME="MyUSB" VOLUMEID="MyUSB""#,
        )
        .replace(r#"KEY="C:/:Music/:A.mp3""#, r#"KEY="MyUSB/:Music/:A.mp3""#);
    fs::write(&traktor, traktor_source).unwrap();
    let rekordbox_source = fs::read_to_string(&rekordbox)
        .unwrap()
        .replace("file://localhost/C:/Music/A.mp3", "file://localhost/Volumes/MyUSB/Music/A.mp3");
    fs::write(&rekordbox, rekordbox_source).unwrap();

    let config = MigrationConfig::new(traktor, rekordbox.clone())
        .with_playlists(vec!["Summer2023".to_string()])
        .with_title_artist_fallback(false);
    MigrationPipeline::new(config).unwrap().run().unwrap();

    let migrated = Collection::open(&rekordbox, Format::Rekordbox).unwrap();
    assert_eq!(keys(find(migrated.library().playlists(), "Summer2023")), vec!["101", "102"]);
}

#[test]
fn test_backup_matches_original() {
    let (_dir, traktor, rekordbox) = setup();
    let original = fs::read(&rekordbox).unwrap();

    let config = MigrationConfig::new(traktor, rekordbox.clone())
        .with_playlists(vec!["Summer2023".to_string()]);
    let report = MigrationPipeline::new(config).unwrap().run().unwrap();

    let backup = report.backup.unwrap();
    assert_eq!(backup, rekordbox.with_file_name("rekordbox.xml.bak"));
    assert_eq!(fs::read(&backup).unwrap(), original);
    assert_ne!(fs::read(&rekordbox).unwrap(), original);
}

#[test]
fn test_timestamped_backup() {
    let (_dir, traktor, rekordbox) = setup();

    let config = MigrationConfig::new(traktor, rekordbox)
        .with_playlists(vec!["Summer2023".to_string()])
        .with_backup(BackupMode::Timestamped);
    let report = MigrationPipeline::new(config).unwrap().run().unwrap();

    let name = report.backup.unwrap().file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.starts_with("rekordbox.xml."));
    assert!(name.ends_with(".bak"));
    assert_ne!(name, "rekordbox.xml.bak");
}

#[test]
fn test_migrate_folder_to_traktor() {
    let (_dir, traktor, rekordbox) = setup();

    let config = MigrationConfig::new(rekordbox, traktor.clone())
        .with_playlists(vec!["Archive".to_string()]);
    MigrationPipeline::new(config).unwrap().run().unwrap();

    let contents = fs::read_to_string(&traktor).unwrap();
    assert!(contents.contains(r#"<NODE TYPE="FOLDER" NAME="$ROOT"><SUBNODES COUNT="6">"#));

    // New nodes go before Traktor's own playlists
    let archive = contents.find(r#"NAME="Archive""#).unwrap();
    let loops = contents.find(r#"NAME="_LOOPS""#).unwrap();
    assert!(archive < loops);

    let migrated = Collection::open(&traktor, Format::Traktor).unwrap();
    match find(migrated.library().playlists(), "Archive") {
        PlaylistNode::Folder(folder) => {
            assert_eq!(
                keys(find(&folder.children, "Disco Night")),
                vec!["C:/:Music/:Disco/:Charlie & Co.mp3"]
            );
        }
        other => panic!("expected a folder, got {:?}", other),
    }
}

#[test]
fn test_migrate_into_dedicated_folder() {
    let (_dir, traktor, rekordbox) = setup();

    let config = MigrationConfig::new(traktor, rekordbox.clone())
        .with_playlists(vec!["Summer2023".to_string()])
        .with_folder("From Traktor".to_string());
    MigrationPipeline::new(config).unwrap().run().unwrap();

    let migrated = Collection::open(&rekordbox, Format::Rekordbox).unwrap();
    match find(migrated.library().playlists(), "From Traktor") {
        PlaylistNode::Folder(folder) => {
            assert_eq!(keys(find(&folder.children, "Summer2023")), vec!["101", "102"]);
        }
        other => panic!("expected a folder, got {:?}", other),
    }
}

#[test]
fn test_system_playlists_are_skipped() {
    let (_dir, traktor, rekordbox) = setup();
    let original = fs::read(&rekordbox).unwrap();

    let config = MigrationConfig::new(traktor, rekordbox.clone())
        .with_playlists(vec!["_LOOPS".to_string()]);
    assert!(MigrationPipeline::new(config).unwrap().run().is_err());
    assert_eq!(fs::read(&rekordbox).unwrap(), original);
}

#[test]
fn test_dry_run_writes_nothing() {
    let (_dir, traktor, rekordbox) = setup();
    let original = fs::read(&rekordbox).unwrap();

    let config = MigrationConfig::new(traktor, rekordbox.clone())
        .with_playlists(vec!["Summer2023".to_string()])
        .with_dry_run(true);
    let report = MigrationPipeline::new(config).unwrap().run().unwrap();

    assert_eq!(report.entry_count, 2);
    assert!(report.backup.is_none());
    assert_eq!(fs::read(&rekordbox).unwrap(), original);
    assert!(!rekordbox.with_file_name("rekordbox.xml.bak").exists());
}
