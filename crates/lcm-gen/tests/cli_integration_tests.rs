//! Integration tests for the lcm-gen command line.
//!
//! Runs the built binary against model files in a temporary directory.

#![allow(non_snake_case)]

use lcm_core::{FingerprintEngine, Schema, TypeName};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

const POSE: &str = r#"{ "structs": [
  { "name": "robot.sensors.pose_t",
    "comment": "Position and heading",
    "members": [
      { "name": "position", "type": "double", "dims": [3] },
      { "name": "heading", "type": "float" } ] },
  { "name": "robot.path_t",
    "members": [
      { "name": "num_poses", "type": "int32_t" },
      { "name": "poses", "type": "robot.sensors.pose_t", "dims": ["num_poses"] } ],
    "constants": [ { "name": "MAX_POSES", "type": "int32_t", "value": 128 } ] } ] }"#;

/// Helper to write the pose model into a fresh directory.
fn model_dir() -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let model = dir.path().join("types").join("pose.json");
    fs::create_dir_all(model.parent().unwrap()).unwrap();
    fs::write(&model, POSE).unwrap();
    (dir, model)
}

fn lcm_gen(cwd: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_lcm-gen"))
        .current_dir(cwd)
        .env_remove("LCM_GEN_LOG")
        .args(args)
        .output()
        .unwrap()
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

// =============================================================================
// Generate
// =============================================================================

mod generate {
    use super::*;

    #[test]
    fn generate___rust_tree___lays_out_package_modules() {
        let (dir, _) = model_dir();

        let output = lcm_gen(dir.path(), &["generate", "types", "--rust", "--rust-path", "out"]);

        assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
        let out = dir.path().join("out");
        assert!(out.join("robot/sensors/pose.rs").is_file());
        let sensors = fs::read_to_string(out.join("robot/sensors/mod.rs")).unwrap();
        assert!(sensors.contains("pub mod pose;\npub use self::pose::Pose;"));
        let robot = fs::read_to_string(out.join("robot/mod.rs")).unwrap();
        assert!(robot.contains("pub mod sensors;"));
        assert!(robot.contains("pub use self::path::Path;"));
        assert!(stdout(&output).contains("✓ Wrote"));
    }

    #[test]
    fn generate___java___writes_classes() {
        let (dir, model) = model_dir();

        let output = lcm_gen(
            dir.path(),
            &["generate", model.to_str().unwrap(), "--java", "--java-path", "java"],
        );

        assert!(output.status.success());
        let class = fs::read_to_string(dir.path().join("java/robot/Path.java")).unwrap();
        assert!(class.contains("public robot.sensors.Pose[] poses;"));
        assert!(!dir.path().join("src/lcmtypes").exists());
    }

    #[test]
    fn generate___config_file___supplies_defaults() {
        let (dir, _) = model_dir();
        fs::write(
            dir.path().join("lcm-gen.toml"),
            "[rust]\noutput = \"generated\"\nlayout = \"single\"\n",
        )
        .unwrap();

        let output = lcm_gen(dir.path(), &["generate", "types", "--rust"]);

        assert!(output.status.success());
        assert!(dir.path().join("generated/lcmtypes.rs").is_file());
    }

    #[test]
    fn generate___cargo_flag___prints_rerun_lines() {
        let (dir, _) = model_dir();

        let output = lcm_gen(dir.path(), &["generate", "types", "--rust", "--cargo"]);

        assert!(output.status.success());
        assert!(stdout(&output).contains("cargo:rerun-if-changed="));
    }

    #[test]
    fn generate___no_language___fails() {
        let (dir, _) = model_dir();

        let output = lcm_gen(dir.path(), &["generate", "types"]);

        assert!(!output.status.success());
        assert!(String::from_utf8_lossy(&output.stderr).contains("--rust"));
    }

    #[test]
    fn generate___invalid_model___names_offending_member() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("bad.json"),
            r#"{ "structs": [ { "name": "a_t", "members": [
                { "name": "values", "type": "double", "dims": ["count"] } ] } ] }"#,
        )
        .unwrap();

        let output = lcm_gen(dir.path(), &["generate", "bad.json", "--rust"]);

        assert!(!output.status.success());
        let stderr = String::from_utf8_lossy(&output.stderr);
        assert!(stderr.contains("values"), "{stderr}");
    }
}

// =============================================================================
// Fingerprint and check
// =============================================================================

mod inspect {
    use super::*;

    #[test]
    fn fingerprint___prints_engine_values() {
        let (dir, model) = model_dir();
        let schema = Schema::load([&model]).unwrap();
        let expected = FingerprintEngine::new(&schema)
            .fingerprint(&TypeName::parse("robot.path_t").unwrap())
            .unwrap();

        let output = lcm_gen(dir.path(), &["fingerprint", "types"]);

        assert!(output.status.success());
        assert!(stdout(&output).contains(&format!("robot.path_t {expected:#018x}")));
        assert_eq!(stdout(&output).lines().count(), 2);
    }

    #[test]
    fn check___valid_model___reports_counts() {
        let (dir, _) = model_dir();

        let output = lcm_gen(dir.path(), &["check", "types"]);

        assert!(output.status.success());
        let out = stdout(&output);
        assert!(out.contains("✓ Structs: 2"));
        assert!(out.contains("✓ Packages: 2"));
    }

    #[test]
    fn check___missing_file___fails() {
        let dir = tempfile::tempdir().unwrap();

        let output = lcm_gen(dir.path(), &["check", "missing.json"]);

        assert!(!output.status.success());
        assert!(String::from_utf8_lossy(&output.stderr).contains("missing.json"));
    }
}
