//! Integration tests for CLI commands

use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

/// Helper to run crdgen command
fn crdgen(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_crdgen"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute crdgen")
}

/// Get a fixture path
fn fixture(name: &str) -> String {
    format!("{}/../../fixtures/{}", env!("CARGO_MANIFEST_DIR"), name)
}

fn load_yaml(path: &Path) -> serde_yaml::Value {
    let content = fs::read_to_string(path).unwrap_or_else(|e| panic!("{}: {}", path.display(), e));
    serde_yaml::from_str(&content).unwrap()
}

fn type_names(descriptor: &serde_yaml::Value) -> Vec<String> {
    descriptor["types"]
        .as_sequence()
        .map(|types| {
            types
                .iter()
                .filter_map(|t| t["name"].as_str().map(String::from))
                .collect()
        })
        .unwrap_or_default()
}

mod generate_command {
    use super::*;

    #[test]
    fn test_generate_writes_descriptor_per_kind() {
        let out = TempDir::new().unwrap();
        let output = crdgen(&[
            "generate",
            "--input",
            &fixture("crds/atlas.yaml"),
            "--output",
            out.path().to_str().unwrap(),
        ]);
        assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

        let group = load_yaml(&out.path().join("group.yaml"));
        assert_eq!(group["kind"].as_str(), Some("Group"));
        assert_eq!(group["group"].as_str(), Some("atlas.generated.mongodb.com"));
        assert_eq!(group["root"]["name"].as_str(), Some("Group"));
        assert_eq!(
            type_names(&group),
            vec![
                "GroupSpec",
                "V20231115",
                "Entry",
                "Tags",
                "Parameters",
                "GroupStatus",
                "GroupStatusV20231115",
            ]
        );

        // Tags was already emitted with Group
        let team = load_yaml(&out.path().join("team.yaml"));
        assert_eq!(type_names(&team), vec!["TeamSpec"]);

        let index = load_yaml(&out.path().join("groupversion_info.yaml"));
        assert_eq!(index["version"].as_str(), Some("v1"));
        assert_eq!(index["kinds"].as_sequence().map(|k| k.len()), Some(2));

        let stdout = String::from_utf8_lossy(&output.stdout);
        assert!(stdout.contains("atlas.generated.mongodb.com/v1/groups"));
    }

    #[test]
    fn test_generate_with_config_file() {
        let out = TempDir::new().unwrap();
        let output = crdgen(&[
            "generate",
            "--config",
            &fixture("crdgen.yaml"),
            "--input",
            &fixture("crds/atlas.yaml"),
            "--output",
            out.path().to_str().unwrap(),
        ]);
        assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

        assert!(!out.path().join("team.yaml").exists());
        let group = load_yaml(&out.path().join("group.yaml"));
        let names = type_names(&group);
        assert!(names.contains(&"GroupEntry".to_string()), "{:?}", names);
        assert!(names.contains(&"V20231115Parameters".to_string()), "{:?}", names);
    }

    #[test]
    fn test_generate_refuses_overwrite() {
        let out = TempDir::new().unwrap();
        let args = [
            "generate",
            "--input",
            &fixture("crds/atlas.yaml"),
            "--output",
            out.path().to_str().unwrap(),
        ];
        assert!(crdgen(&args).status.success());

        let second = crdgen(&args);
        assert!(!second.status.success());
        let stderr = String::from_utf8_lossy(&second.stderr);
        assert!(stderr.contains("--force"), "stderr: {}", stderr);

        let mut forced = args.to_vec();
        forced.push("--force");
        assert!(crdgen(&forced).status.success());
    }

    #[test]
    fn test_generate_to_stdout() {
        let output = crdgen(&["generate", "--input", &fixture("crds/atlas.yaml"), "--stdout"]);
        assert!(output.status.success());
        let stdout = String::from_utf8_lossy(&output.stdout);
        assert!(stdout.starts_with("---\n"));
        assert!(stdout.contains("kind: Group"));
        assert!(stdout.contains("kind: Team"));
    }

    #[test]
    fn test_generate_aborts_on_bad_crd() {
        let out = TempDir::new().unwrap();
        let output = crdgen(&[
            "generate",
            "--input",
            &fixture("crds/broken.yaml"),
            "--output",
            out.path().to_str().unwrap(),
        ]);
        assert!(!output.status.success());
        let stderr = String::from_utf8_lossy(&output.stderr);
        assert!(stderr.contains("Port"), "stderr: {}", stderr);
        assert!(!out.path().join("widget.yaml").exists());
    }

    #[test]
    fn test_generate_skip_policy_continues() {
        let out = TempDir::new().unwrap();
        let output = crdgen(&[
            "generate",
            "--input",
            &fixture("crds/broken.yaml"),
            "--output",
            out.path().to_str().unwrap(),
            "--error-policy",
            "skip",
        ]);
        assert_eq!(output.status.code(), Some(2));
        assert!(out.path().join("widget.yaml").exists());
        assert!(!out.path().join("port.yaml").exists());
        let stdout = String::from_utf8_lossy(&output.stdout);
        assert!(stdout.contains("Port"), "stdout: {}", stdout);
    }

    #[test]
    fn test_generate_all_skipped_fails() {
        let out = TempDir::new().unwrap();
        let output = crdgen(&[
            "generate",
            "--input",
            &fixture("crds/atlas.yaml"),
            "--output",
            out.path().to_str().unwrap(),
            "--skip",
            "Group",
            "--skip",
            "Team",
        ]);
        assert!(!output.status.success());
        let stderr = String::from_utf8_lossy(&output.stderr);
        assert!(stderr.contains("generated"), "stderr: {}", stderr);
    }

    #[test]
    fn test_generate_without_input() {
        let output = crdgen(&["generate", "--stdout"]);
        assert!(!output.status.success());
        let stderr = String::from_utf8_lossy(&output.stderr);
        assert!(stderr.contains("input"), "stderr: {}", stderr);
    }

    #[test]
    fn test_generate_unknown_version() {
        let output = crdgen(&[
            "generate",
            "--input",
            &fixture("crds/atlas.yaml"),
            "--stdout",
            "--crd-version",
            "v9",
        ]);
        assert!(!output.status.success());
        let stderr = String::from_utf8_lossy(&output.stderr);
        assert!(stderr.contains("v9"), "stderr: {}", stderr);
    }
}

mod check_command {
    use super::*;

    #[test]
    fn test_check_lists_types() {
        let output = crdgen(&["check", "--input", &fixture("crds/atlas.yaml")]);
        assert!(output.status.success());
        let stdout = String::from_utf8_lossy(&output.stdout);
        assert!(stdout.contains("GroupStatusV20231115"));
        assert!(stdout.contains("2 generated, 0 skipped, 0 failed"));
    }

    #[test]
    fn test_check_json_report() {
        let output = crdgen(&[
            "check",
            "--input",
            &fixture("crds/atlas.yaml"),
            "--skip",
            "Team",
            "--json",
        ]);
        assert!(output.status.success());
        let report: serde_json::Value =
            serde_json::from_slice(&output.stdout).expect("Output should be valid JSON");
        assert_eq!(report["generated"][0], "atlas.generated.mongodb.com/v1/groups");
        assert_eq!(report["skipped"][0], "Team");
        assert_eq!(report["failed"].as_array().map(Vec::len), Some(0));
    }

    #[test]
    fn test_check_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let output = Command::new(env!("CARGO_BIN_EXE_crdgen"))
            .current_dir(dir.path())
            .args(["check", "--input", &fixture("crds/atlas.yaml")])
            .output()
            .unwrap();
        assert!(output.status.success());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
