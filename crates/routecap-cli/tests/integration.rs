#![allow(deprecated)]
use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn routecap(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("routecap").unwrap();
    cmd.current_dir(dir.path())
        .env("ROUTECAP_ROOT", dir.path())
        .env_remove("ROUTECAP_ROLLBACK_CHECKPOINT")
        .env_remove("ROUTECAP_RESTART_FROM_ROUTE")
        .env_remove("ROUTECAP_SKIP_ROUTES");
    cmd
}

const ROUTE_1: &str = "
portal: [100, 50]
next_portal: [200, 60]
steps:
  - [teleport]
  - [record_start]
  - [glide, 4]
  - [record_stop]
  - [record_start]
  - [run, 2]
";

const ROUTE_2: &str = "
portal: [200, 60]
steps:
  - [record_start]
  - [glide, 3]
";

fn init_project(dir: &TempDir) {
    let routes = dir.path().join("routes");
    std::fs::create_dir_all(&routes).unwrap();
    std::fs::write(routes.join("1.yaml"), ROUTE_1).unwrap();
    std::fs::write(routes.join("2.yaml"), ROUTE_2).unwrap();
    std::fs::write(
        dir.path().join("routecap.yaml"),
        "device: oppofindx\nuse_env_offsets: false\nportal:\n  source: {width: 2848, height: 1276}\n  destination: {width: 2772, height: 1272}\n  port_width: 1272\n",
    )
    .unwrap();
}

fn counter_json(dir: &TempDir) -> serde_json::Value {
    let text = std::fs::read_to_string(dir.path().join("recordings/_action_counts.json")).unwrap();
    serde_json::from_str(&text).unwrap()
}

// ---------------------------------------------------------------------------
// routecap points
// ---------------------------------------------------------------------------

#[test]
fn points_at_base_resolution_are_unscaled() {
    let dir = TempDir::new().unwrap();
    let out = routecap(&dir)
        .args(["points", "--json", "--profile", "huaweipura"])
        .output()
        .unwrap();
    assert!(out.status.success());
    let v: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(v["points"]["JUMP"], serde_json::json!([2510, 830]));
    assert_eq!(v["target"]["width"], 2772);
}

#[test]
fn points_table_lists_catalog() {
    let dir = TempDir::new().unwrap();
    routecap(&dir)
        .args(["points", "--profile", "huaweimate"])
        .assert()
        .success()
        .stdout(predicate::str::contains("MOVE_START"))
        .stdout(predicate::str::contains("ADJUST_GAME_TIME_P4"));
}

#[test]
fn env_offsets_shift_points() {
    let dir = TempDir::new().unwrap();
    let out = routecap(&dir)
        .args(["points", "--json", "--profile", "huaweipura"])
        .env("MOVE_X_OFFSET", "7")
        .env("GLOBAL_Y_OFFSET", "-3")
        .output()
        .unwrap();
    let v: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(v["points"]["MOVE_START"], serde_json::json!([530, 797]));
}

#[test]
fn unknown_profile_fails() {
    let dir = TempDir::new().unwrap();
    routecap(&dir)
        .args(["points", "--profile", "nokia3310"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown device profile"));
}

// ---------------------------------------------------------------------------
// routecap portal
// ---------------------------------------------------------------------------

#[test]
fn portal_fixture() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    let out = routecap(&dir)
        .args(["portal", "100", "50", "--json"])
        .output()
        .unwrap();
    assert!(out.status.success());
    let v: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(v["output"], serde_json::json!([50, 1174]));
}

#[test]
fn portal_rejects_non_integer_resolution_env() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    routecap(&dir)
        .args(["portal", "100", "50"])
        .env("ROUTECAP_SRC_W", "wide")
        .assert()
        .failure()
        .stderr(predicate::str::contains("ROUTECAP_SRC_W"));
}

// ---------------------------------------------------------------------------
// routecap plan / counters
// ---------------------------------------------------------------------------

#[test]
fn plan_chains_counters_across_routes() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    let out = routecap(&dir).args(["plan", "--json"]).output().unwrap();
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    let v: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();

    assert_eq!(v[0]["route"], 1);
    assert_eq!(v[0]["slots"][0]["action"], "glide");
    assert_eq!(v[0]["slots"][0]["index"], 1);
    assert_eq!(v[0]["slots"][1]["action"], "run");
    assert_eq!(v[1]["slots"][0]["index"], 2);
    assert_eq!(v[1]["end_counts"]["glide"], 2);
    // Nothing is written.
    assert!(!dir.path().join("recordings/_action_counts.json").exists());
}

#[test]
fn plan_with_checkpoint_starts_at_checkpoint_route() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    let out = routecap(&dir)
        .args(["plan", "--json"])
        .env("ROUTECAP_ROLLBACK_CHECKPOINT", "2:1")
        .output()
        .unwrap();
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    let v: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();

    let plans = v.as_array().unwrap();
    assert_eq!(plans.len(), 1);
    assert_eq!(plans[0]["route"], 2);
    assert_eq!(plans[0]["slots"][0]["index"], 2);
    assert!(!dir.path().join("recordings/_action_counts.json").exists());
}

#[test]
fn plan_unknown_route_fails() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    routecap(&dir)
        .args(["plan", "--route", "9"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown route: 9"));
}

#[test]
fn counters_empty_then_rolled_back() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    routecap(&dir)
        .arg("counters")
        .assert()
        .success()
        .stdout(predicate::str::contains("No counters recorded"));

    routecap(&dir)
        .args(["rollback", "2:1", "--only"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Rolled back natlan"));

    let counts = counter_json(&dir);
    assert_eq!(counts["natlan"]["glide"], 1);
    assert_eq!(counts["natlan"]["run"], 1);

    routecap(&dir)
        .arg("counters")
        .assert()
        .success()
        .stdout(predicate::str::contains("natlan"))
        .stdout(predicate::str::contains("glide"));
}

#[test]
fn rollback_replaces_other_profiles() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    std::fs::create_dir_all(dir.path().join("recordings")).unwrap();
    std::fs::write(
        dir.path().join("recordings/_action_counts.json"),
        r#"{"mondstadt": {"glide": 9}, "natlan": {"glide": 50}}"#,
    )
    .unwrap();

    routecap(&dir)
        .args(["rollback", "1:2", "--only", "--json"])
        .assert()
        .success();

    let counts = counter_json(&dir);
    assert!(counts.get("mondstadt").is_none());
    assert_eq!(counts["natlan"]["glide"], 1);
    assert_eq!(counts["natlan"]["run"], 0);
}

#[test]
fn rollback_rejects_malformed_checkpoint() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    routecap(&dir)
        .args(["rollback", "7-17", "--only"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid checkpoint"));
}

#[test]
fn rollback_to_unknown_route_fails() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    routecap(&dir)
        .args(["rollback", "5:1", "--only"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found in active route list"));
}

#[test]
fn debug_routes_rejects_inverted_range() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    routecap(&dir)
        .args(["debug-routes", "--start", "3", "--end", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("is after end"));
}
