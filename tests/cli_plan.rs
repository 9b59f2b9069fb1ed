//! E2E tests for `devloop plan`
//!
//! `plan` is the debugging view of the two startup stages that have no
//! side effects: plugin/theme resolution and watch-target planning.

use std::fs;
use std::path::Path;
use std::process::Command;

use tempfile::tempdir;

fn run_plan(dir: &Path, extra: &[&str]) -> serde_json::Value {
    let mut args = vec!["--json", "plan"];
    args.extend_from_slice(extra);

    let output = Command::new(env!("CARGO_BIN_EXE_devloop"))
        .args(&args)
        .current_dir(dir)
        .output()
        .expect("failed to run devloop");

    assert!(
        output.status.success(),
        "plan failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    let line = stdout
        .lines()
        .find(|l| l.starts_with('{'))
        .expect("no JSON line in plan output");
    serde_json::from_str(line).expect("plan output is not valid JSON")
}

fn write_theme(modules_dir: &Path, theme: &str, manifest: &str) {
    let dir = modules_dir.join(theme);
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("theme.json"), manifest).unwrap();
}

#[test]
fn plan_core_emits_six_targets_with_first_party_patterns() {
    let temp = tempdir().unwrap();
    fs::write(
        temp.path().join("devloop.toml"),
        "[watch]\ndebounce_ms = 500\n",
    )
    .unwrap();

    let plan = run_plan(temp.path(), &["--core"]);

    assert_eq!(plan["event"], "plan");
    assert_eq!(plan["plugins"].as_array().unwrap().len(), 0);

    let targets = plan["targets"].as_array().unwrap();
    assert_eq!(targets.len(), 6);

    let names: Vec<&str> = targets
        .iter()
        .map(|t| t["name"].as_str().unwrap())
        .collect();
    assert_eq!(
        names,
        vec![
            "client-style",
            "acp-style",
            "client-js",
            "templates",
            "languages",
            "server"
        ]
    );

    for target in targets {
        assert_eq!(target["debounce_ms"], 500);
        assert!(!target["patterns"].as_array().unwrap().is_empty());
    }

    let server = &targets[5];
    let patterns: Vec<&str> = server["patterns"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p.as_str().unwrap())
        .collect();
    assert!(patterns.contains(&"src/**/*.js"));
    assert!(patterns.contains(&"!src/upgrades/**"));
}

#[test]
fn plan_resolves_theme_chain_and_appends_composer() {
    let temp = tempdir().unwrap();
    let root = temp.path();
    fs::write(root.join("devloop.toml"), "").unwrap();
    fs::create_dir_all(root.join("data")).unwrap();
    fs::write(
        root.join("data/active_plugins.json"),
        r#"["nodebb-theme-foo"]"#,
    )
    .unwrap();

    let modules = root.join("node_modules");
    write_theme(&modules, "nodebb-theme-foo", r#"{"baseTheme": "nodebb-theme-bar"}"#);
    write_theme(&modules, "nodebb-theme-bar", r#"{"name": "bar"}"#);

    let plan = run_plan(root, &[]);
    let plugins: Vec<&str> = plan["plugins"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p.as_str().unwrap())
        .collect();
    assert_eq!(
        plugins,
        vec![
            "nodebb-theme-foo",
            "nodebb-theme-bar",
            "nodebb-plugin-composer-default"
        ]
    );

    // plugin trees show up in the asset-class targets
    let targets = plan["targets"].as_array().unwrap();
    let styles = &targets[0];
    let patterns: Vec<&str> = styles["patterns"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p.as_str().unwrap())
        .collect();
    assert!(patterns.contains(&"node_modules/nodebb-theme-bar/scss/**/*.scss"));
}

#[test]
fn plan_with_malformed_state_fails() {
    let temp = tempdir().unwrap();
    let root = temp.path();
    fs::write(root.join("devloop.toml"), "").unwrap();
    fs::create_dir_all(root.join("data")).unwrap();
    fs::write(root.join("data/active_plugins.json"), "{nope").unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_devloop"))
        .args(["plan"])
        .current_dir(root)
        .output()
        .expect("failed to run devloop");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("plugin state"));
}
