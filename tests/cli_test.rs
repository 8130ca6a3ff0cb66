//! Integration tests for the riskcast binary
//!
//! Each test gets an isolated config dir, data dir and a tiny heart model
//! trained on the spot. Config lookup relies on XDG_CONFIG_HOME, so these
//! run on Linux only.

#![cfg(target_os = "linux")]

use gbdt::config::Config;
use gbdt::decision_tree::Data;
use gbdt::gradient_boost::GBDT;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

const HEART_FEATURES: usize = 16;

fn train_heart_model(path: &Path) {
    let mut cfg = Config::new();
    cfg.set_feature_size(HEART_FEATURES);
    cfg.set_max_depth(3);
    cfg.set_iterations(10);
    cfg.set_shrinkage(0.3);
    cfg.set_loss("LogLikelyhood");
    cfg.set_debug(false);
    cfg.set_min_leaf_size(1);

    let mut data: Vec<Data> = (0..40)
        .map(|i| {
            let age = 20.0 + i as f32 * 1.5;
            let mut row = vec![0.0_f32; HEART_FEATURES];
            row[0] = age;
            row[1] = 25.0;
            let label = if age > 50.0 { 1.0 } else { -1.0 };
            Data::new_training_data(row, 1.0, label, None)
        })
        .collect();

    let mut gbdt = GBDT::new(&cfg);
    gbdt.fit(&mut data);
    gbdt.save_model(path.to_str().unwrap())
        .expect("Failed to save model");
}

/// Temp workspace with config, model and a heart questionnaire
fn create_test_workspace() -> TempDir {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let root = temp_dir.path();

    let models = root.join("models");
    std::fs::create_dir_all(&models).unwrap();
    train_heart_model(&models.join("heart.json"));

    let config_dir = root.join("config").join("riskcast");
    std::fs::create_dir_all(&config_dir).unwrap();
    std::fs::write(
        config_dir.join("config.toml"),
        format!(
            "[models]\ndir = \"{}\"\nheart_file = \"heart.json\"\nformat = \"native\"\n",
            models.display()
        ),
    )
    .unwrap();

    std::fs::write(
        root.join("heart.toml"),
        r#"
age = 62
height_ft = 5
height_in = 9
weight = 190
unit = "lb"
sex = "male"
pa_any = 2
pa_index = 2
stress_days = 3
smoker = true
hypertension = true
"#,
    )
    .unwrap();

    temp_dir
}

fn riskcast(workspace: &TempDir, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_riskcast"))
        .args(args)
        .current_dir(workspace.path())
        .env("XDG_CONFIG_HOME", workspace.path().join("config"))
        .env("RISKCAST_DATA_DIR", workspace.path().join("data"))
        .env_remove("RISKCAST_MODEL_DIR")
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to run riskcast")
}

fn stdout_json(output: &Output) -> serde_json::Value {
    assert!(
        output.status.success(),
        "riskcast failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("stdout is not JSON")
}

#[test]
fn test_predict_json_output() {
    let ws = create_test_workspace();
    let json = stdout_json(&riskcast(
        &ws,
        &["predict", "heart", "-i", "heart.toml", "-f", "json"],
    ));

    assert_eq!(json["model"], "heart");
    assert!(json["category"].is_string());
    assert_eq!(json["result"]["type"], "heart");
    assert_eq!(json["result"]["probabilities"].as_array().unwrap().len(), 2);

    let points = json["projection"]["points"].as_array().unwrap();
    let labels: Vec<_> = points.iter().map(|p| p["label"].as_str().unwrap()).collect();
    assert_eq!(labels, ["Current", "Age 67", "Age 72"]);
    assert!(points.iter().all(|p| p["risk_percent"].is_number()));

    assert!(!json["advice"].as_array().unwrap().is_empty());
}

#[test]
fn test_predict_stores_result_until_cleared() {
    let ws = create_test_workspace();
    let output = riskcast(&ws, &["predict", "heart", "-i", "heart.toml", "--no-project"]);
    assert!(output.status.success());
    assert!(ws.path().join("data").join("heart_risk.json").exists());

    let stored = stdout_json(&riskcast(&ws, &["show", "heart", "-f", "json"]));
    assert_eq!(stored["inputs"]["PA_ANY"], 0.0);
    assert_eq!(stored["inputs"]["SMOKING_IDX"], 1.0);

    let advice = stdout_json(&riskcast(&ws, &["advice", "heart", "-f", "json"]));
    assert!(advice["advice"]
        .as_array()
        .unwrap()
        .iter()
        .any(|tip| tip.as_str().unwrap().contains("smoking")));

    assert!(riskcast(&ws, &["clear", "heart"]).status.success());
    let stored = stdout_json(&riskcast(&ws, &["show", "heart", "-f", "json"]));
    assert!(stored.is_null());
}

#[test]
fn test_no_save_leaves_store_empty() {
    let ws = create_test_workspace();
    let output = riskcast(
        &ws,
        &["predict", "heart", "-i", "heart.toml", "--no-save", "-f", "json"],
    );
    assert!(output.status.success());
    assert!(!ws.path().join("data").join("heart_risk.json").exists());
}

#[test]
fn test_missing_model_fails_cleanly() {
    let ws = create_test_workspace();
    std::fs::write(
        ws.path().join("glucose.json"),
        r#"{"age": 40, "height_ft": 5, "height_in": 6, "weight": 70, "sex": "female", "smoking_level": 0}"#,
    )
    .unwrap();

    let output = riskcast(&ws, &["predict", "glucose", "-i", "glucose.json"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("model file not found"), "stderr: {stderr}");
}

#[test]
fn test_project_without_stored_result() {
    let ws = create_test_workspace();
    let output = riskcast(&ws, &["project", "heart"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("No stored heart result"));
}

#[test]
fn test_invalid_questionnaire_names_the_field() {
    let ws = create_test_workspace();
    std::fs::write(ws.path().join("bad.toml"), "age = 40\nsex = \"male\"\n").unwrap();
    let output = riskcast(&ws, &["predict", "heart", "-i", "bad.toml"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("HEIGHT_FT"));
}
