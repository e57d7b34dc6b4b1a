//! Acceptance scenarios for persistent variable sync
//!
//! Each module walks one user-visible scenario end to end against a
//! temporary mod library.

use keeper_core::{SyncEngine, SyncResult, SyncSettings};
use keeper_test_utils::TestLibrary;
use pretty_assertions::assert_eq;
use serde_json::json;

fn sync(library: &TestLibrary) -> SyncResult {
    SyncEngine::new(SyncSettings::new(library.mods_dir(), library.state_file()))
        .sync()
        .unwrap()
}

fn counts(result: SyncResult) -> (usize, usize, usize) {
    (result.updated_variables, result.updated_files, result.propagated_variants)
}

// =============================================================================
// Scenario 1: direct address updates one value
// =============================================================================

mod direct_update {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_single_value_lands_in_reserved_section() {
        let library = TestLibrary::new();
        library.add_mod("Characters", "CharacterA", None);
        library.write(
            "Characters/CharacterA/ModFile.ini",
            "; mod config\n[Constants]\nglobal persist $toggle_fx = 0\n\n[TextureOverrideA]\n$toggle_fx = 0\n",
        );
        library.write_state("[Constants]\n$\\mods\\CharacterA\\ModFile.ini\\toggle_fx = 1\n");

        assert_eq!(counts(sync(&library)), (1, 1, 0));
        assert_eq!(
            library.read("Characters/CharacterA/ModFile.ini"),
            "; mod config\n[Constants]\nglobal persist $toggle_fx = 1\n\n[TextureOverrideA]\n$toggle_fx = 0\n"
        );
    }
}

// =============================================================================
// Scenario 2: one namespace line fans out to every declaring file
// =============================================================================

mod namespace_fan_out {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_weapons_glow_updates_both_files() {
        let library = TestLibrary::new();
        library.add_mod(
            "Weapons",
            "Glow",
            Some(json!({
                "syncMethod": "namespace",
                "namespaces": [{"namespace": "Weapons\\Glow", "iniFiles": ["Glow.ini", "Extra/GlowAlt.ini"]}]
            })),
        );
        library.write("Weapons/Glow/Glow.ini", "namespace = Weapons\\Glow\n[Constants]\n$intensity = 1\n");
        library.write(
            "Weapons/Glow/Extra/GlowAlt.ini",
            "namespace = Weapons\\Glow\n[Constants]\n$intensity = 1\n",
        );
        library.write_state("$\\weapons\\glow\\intensity = 3\n");

        assert_eq!(counts(sync(&library)), (2, 2, 0));
        library.assert_file_contains("Weapons/Glow/Glow.ini", "$intensity = 3");
        library.assert_file_contains("Weapons/Glow/Extra/GlowAlt.ini", "$intensity = 3");
    }
}

// =============================================================================
// Scenario 3: a stale namespace manifest falls back to classic addressing
// =============================================================================

mod stale_manifest {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_manifest_is_migrated_and_direct_line_applies() {
        let library = TestLibrary::new();
        library.add_mod(
            "Weapons",
            "Glow",
            Some(json!({
                "name": "Glow",
                "syncMethod": "namespace",
                "namespaces": [{"namespace": "Weapons\\Glow", "iniFiles": ["Glow.ini"]}]
            })),
        );
        library.write("Weapons/Glow/Glow.ini", "[Constants]\n$intensity = 1\n");
        library.write_state("$\\Weapons\\Glow\\intensity = 5\n$\\Glow\\Glow.ini\\intensity = 2\n");

        assert_eq!(counts(sync(&library)), (1, 1, 0));
        assert_eq!(library.read_manifest("Weapons", "Glow"), json!({"name": "Glow"}));
        library.assert_file_contains("Weapons/Glow/Glow.ini", "$intensity = 2");
    }
}

// =============================================================================
// Scenario 4: disabled mods are never touched
// =============================================================================

mod disabled_mod {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case::by_flag("Glow", Some(json!({"statusKeeperSync": false})))]
    #[case::by_folder("DISABLED_Glow", None)]
    fn test_nothing_changes_on_disk(#[case] folder: &str, #[case] manifest: Option<serde_json::Value>) {
        let library = TestLibrary::new();
        library.add_mod("Weapons", folder, manifest);
        library.write(&format!("Weapons/{folder}/Glow.ini"), "[Constants]\n$intensity = 1\n");
        library.write(&format!("Weapons/{folder}/Glow_LOD1.ini"), "[Constants]\n$intensity = 1\n");
        library.write_state(&format!("$\\{folder}\\Glow.ini\\intensity = 9\n"));
        let before = library.snapshot();

        assert!(sync(&library).is_empty());
        assert_eq!(library.snapshot(), before);
    }
}

// =============================================================================
// Scenario 5: a variant without the reserved section gains one
// =============================================================================

mod variant_propagation {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case::lf("\n")]
    #[case::crlf("\r\n")]
    fn test_variant_gains_appended_constants(#[case] eol: &str) {
        let library = TestLibrary::new();
        library.add_mod("Characters", "CharacterA", None);
        library.write("Characters/CharacterA/Body.ini", "[Constants]\n$fx = 0\n");
        library.write(
            "Characters/CharacterA/Body_LOD1.ini",
            &format!("[TextureOverrideBody]{eol}hash = 1234abcd{eol}"),
        );
        library.write_state("$\\CharacterA\\Body.ini\\fx = 1\n");

        assert_eq!(counts(sync(&library)), (1, 1, 1));
        assert_eq!(
            library.read("Characters/CharacterA/Body_LOD1.ini"),
            format!("[TextureOverrideBody]{eol}hash = 1234abcd{eol}{eol}[Constants]{eol}    $fx = 1{eol}")
        );
        assert!(sync(&library).is_empty());
    }
}
