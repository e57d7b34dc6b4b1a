//! End-to-end integration tests across the workspace
//!
//! These tests exercise the complete flow: config resolution -> sync settings
//! -> engine, plus the scheduler driving real engines.

use std::sync::Arc;
use std::time::Duration;

use keeper_core::manifest::ManifestStore;
use keeper_core::{
    ConfigResolver, SchedulerSettings, StateFileWatcher, SyncEngine, SyncResult, SyncScheduler, SyncSettings,
    Trigger,
};
use keeper_fs::AccessQueue;
use keeper_test_utils::TestLibrary;
use pretty_assertions::assert_eq;
use serde_json::json;
use tokio::runtime::Handle;

fn engine_for(library: &TestLibrary) -> Arc<SyncEngine> {
    Arc::new(SyncEngine::new(SyncSettings::new(library.mods_dir(), library.state_file())))
}

async fn wait_for(library: &TestLibrary, relative: &str, expected: &str) -> bool {
    for _ in 0..50 {
        tokio::time::sleep(Duration::from_millis(100)).await;
        if library.read(relative).contains(expected) {
            return true;
        }
    }
    false
}

#[test]
fn test_local_config_drives_section_marker_and_prefix() {
    let library = TestLibrary::new();
    std::fs::write(
        library.root().join("status-keeper.toml"),
        r#"
library_root = "Mods"
reserved_section = "Persist"
variant_marker = "_alt"
disabled_prefix = "OFF_"
"#,
    )
    .unwrap();
    library.add_mod("Characters", "CharacterA", None);
    library.write(
        "Characters/CharacterA/Body.ini",
        "[Persist]\n$glow = 0\n\n[Constants]\n$other = 0\n",
    );
    library.write("Characters/CharacterA/Body_alt.ini", "[Persist]\n$glow = 0\n");
    library.add_mod("Characters", "OFF_Hidden", None);
    library.write("Characters/OFF_Hidden/Hidden.ini", "[Persist]\n$glow = 0\n");
    library.write_state(
        "$\\CharacterA\\Body.ini\\glow = 2\n$\\CharacterA\\Body.ini\\other = 5\n$\\OFF_Hidden\\Hidden.ini\\glow = 2\n",
    );

    let resolver = ConfigResolver::with_global_config_dir(library.root(), library.root().join("global"));
    let config = resolver.resolve().unwrap();
    let settings = config.sync_settings(library.root()).unwrap();
    assert_eq!(settings.state_file, library.state_file());

    let result = SyncEngine::new(settings).sync().unwrap();

    assert_eq!(
        result,
        SyncResult {
            updated_variables: 1,
            updated_files: 1,
            propagated_variants: 1,
        }
    );
    assert_eq!(
        library.read("Characters/CharacterA/Body.ini"),
        "[Persist]\n$glow = 2\n\n[Constants]\n$other = 0\n"
    );
    assert_eq!(library.read("Characters/CharacterA/Body_alt.ini"), "[Persist]\n$glow = 2\n");
    assert_eq!(library.read("Characters/OFF_Hidden/Hidden.ini"), "[Persist]\n$glow = 0\n");
}

#[test]
fn test_migrated_manifest_keeps_foreign_fields_in_order() {
    let library = TestLibrary::new();
    library.add_mod(
        "Weapons",
        "Glow",
        Some(json!({
            "name": "Glow",
            "author": "someone",
            "syncMethod": "namespace",
            "namespaces": [{"namespace": "Weapons\\Glow", "iniFiles": ["Glow.ini"]}],
            "preview": {"image": "preview.png", "tags": ["fx", "weapon"]}
        })),
    );
    library.write("Weapons/Glow/Glow.ini", "[Constants]\n$intensity = 1\n");
    library.write_state("$\\Glow\\Glow.ini\\intensity = 4\n");

    engine_for(&library).sync().unwrap();

    let manifest = library.read_manifest("Weapons", "Glow");
    let keys: Vec<&str> = manifest.as_object().unwrap().keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["name", "author", "preview"]);
    assert_eq!(manifest["preview"], json!({"image": "preview.png", "tags": ["fx", "weapon"]}));
    library.assert_file_contains("Weapons/Glow/Glow.ini", "$intensity = 4");
}

#[test]
fn test_concurrent_engines_share_the_access_queue() {
    let library = TestLibrary::new();
    library.add_mod("Characters", "Multi", Some(json!({"name": "Multi"})));
    library.write("Characters/Multi/Body.ini", "namespace = Multi\\Body\n[Constants]\n$fx = 0\n");
    library.write("Characters/Multi/Hair.ini", "namespace = Multi\\Body\n[Constants]\n$fx = 0\n");
    library.write_state("$\\Multi\\Body\\fx = 7\n");

    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let settings = SyncSettings::new(library.mods_dir(), library.state_file());
                scope.spawn(move || {
                    SyncEngine::with_store(settings, ManifestStore::new(AccessQueue::global())).sync()
                })
            })
            .collect();
        for handle in handles {
            assert!(handle.join().unwrap().is_ok());
        }
    });

    assert_eq!(library.read_manifest("Characters", "Multi")["syncMethod"], json!("namespace"));
    library.assert_file_contains("Characters/Multi/Body.ini", "$fx = 7");
    library.assert_file_contains("Characters/Multi/Hair.ini", "$fx = 7");

    let again = engine_for(&library).sync().unwrap();
    assert!(again.is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_scheduler_follows_library_switch() {
    let first = TestLibrary::new();
    first.add_mod("Characters", "CharacterA", None);
    first.write("Characters/CharacterA/ModFile.ini", "[Constants]\n$fx = 0\n");
    first.write_state("; empty\n");
    let second = TestLibrary::new();
    second.add_mod("Characters", "CharacterB", None);
    second.write("Characters/CharacterB/ModFile.ini", "[Constants]\n$fx = 0\n");
    second.write_state("; empty\n");

    let settings = SchedulerSettings {
        debounce: Duration::from_millis(50),
        poll_interval: Duration::from_secs(60),
    };
    let mut scheduler = SyncScheduler::for_engine(engine_for(&first), settings, Handle::current());
    scheduler.start().unwrap();

    let second_engine = engine_for(&second);
    scheduler
        .restart_for(second_engine.clone(), Box::new(StateFileWatcher::new(second.state_file())))
        .unwrap();

    first.write_state("$\\CharacterA\\ModFile.ini\\fx = 1\n");
    second.write_state("$\\CharacterB\\ModFile.ini\\fx = 2\n");

    assert!(wait_for(&second, "Characters/CharacterB/ModFile.ini", "$fx = 2").await);
    scheduler.stop();

    assert_eq!(first.read("Characters/CharacterA/ModFile.ini"), "[Constants]\n$fx = 0\n");
    assert_eq!(second_engine.last_sync().map(|l| l.trigger), Some(Trigger::FileChange));
}
