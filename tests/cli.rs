use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::tempdir;

// Nothing listens on the discard port, so the API is unreachable.
const UNREACHABLE_API: &str = "http://127.0.0.1:9/api";

fn write_config(dir: &Path, api_url: &str, farm_id: Option<u64>) -> PathBuf {
    let path = dir.join("config.yaml");
    let mut contents = format!(
        "api_url: {api_url}\napi_token: test-token\npreferences:\n  retry_delay_secs: 0\n  request_timeout_secs: 5\n"
    );
    if let Some(farm) = farm_id {
        contents.push_str(&format!("farm_id: {farm}\n"));
    }
    fs::write(&path, contents).expect("failed to write config");
    path
}

fn write_record_file(dir: &Path) -> PathBuf {
    let path = dir.join("record.yaml");
    fs::write(
        &path,
        "crop_name: Tomato\nvariety: Roma\nbatch_code: TOM-05\ntransplant_date: 2025-04-01\ncurrent_stage: flowering\n",
    )
    .expect("failed to write record file");
    path
}

fn cropsync() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("cropsync"));
    for var in [
        "CROPSYNC_CONFIG",
        "CROPSYNC_API_URL",
        "CROPSYNC_FARM_ID",
        "CROPSYNC_FORMAT",
        "CROPSYNC_NO_CACHE",
        "CROPSYNC_DEBUG",
    ] {
        cmd.env_remove(var);
    }
    cmd
}

#[test]
fn version_prints_package_version() {
    cropsync()
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn status_uses_custom_config_path() -> Result<(), Box<dyn std::error::Error>> {
    let temp = tempdir()?;
    let config_path = write_config(temp.path(), UNREACHABLE_API, Some(3));

    let assert = cropsync()
        .arg("status")
        .arg("--config")
        .arg(&config_path)
        .assert()
        .success();

    let stdout = String::from_utf8_lossy(&assert.get_output().stdout);
    assert!(stdout.contains("Default farm: 3"));
    assert!(stdout.contains("API token configured"));
    assert!(stdout.contains("API unreachable"));
    assert!(stdout.contains(&config_path.to_string_lossy().to_string()));

    Ok(())
}

#[test]
fn status_without_config_file_uses_defaults() -> Result<(), Box<dyn std::error::Error>> {
    let temp = tempdir()?;
    let missing = temp.path().join("does-not-exist.yaml");

    cropsync()
        .arg("status")
        .arg("--config")
        .arg(&missing)
        .arg("--api-url")
        .arg(UNREACHABLE_API)
        .assert()
        .success()
        .stdout(predicate::str::contains("Config file not found"))
        .stdout(predicate::str::contains("No default farm set"));

    Ok(())
}

#[test]
fn status_json_reports_farm_override() -> Result<(), Box<dyn std::error::Error>> {
    let temp = tempdir()?;
    let config_path = write_config(temp.path(), UNREACHABLE_API, Some(3));

    cropsync()
        .args(["status", "--format", "json", "--farm", "8", "--config"])
        .arg(&config_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"farm_id\": 8"))
        .stdout(predicate::str::contains("\"connectivity\": \"offline\""));

    Ok(())
}

#[test]
fn malformed_config_shows_parse_error() -> Result<(), Box<dyn std::error::Error>> {
    let temp = tempdir()?;
    let config_path = temp.path().join("config.yaml");
    fs::write(&config_path, "farm_id: [not, a, number]\n")?;

    cropsync()
        .arg("records")
        .arg("list")
        .arg("--config")
        .arg(&config_path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to parse configuration"));

    Ok(())
}

#[test]
fn records_list_offline_without_cache_fails() -> Result<(), Box<dyn std::error::Error>> {
    let temp = tempdir()?;
    let config_path = write_config(temp.path(), UNREACHABLE_API, Some(3));

    cropsync()
        .args(["records", "list", "--config"])
        .arg(&config_path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("No cached data"));

    Ok(())
}

#[test]
fn offline_update_is_reported_unsynced() -> Result<(), Box<dyn std::error::Error>> {
    let temp = tempdir()?;
    let config_path = write_config(temp.path(), UNREACHABLE_API, Some(3));
    let record = write_record_file(temp.path());

    cropsync()
        .args(["records", "update", "5", "--file"])
        .arg(&record)
        .arg("--config")
        .arg(&config_path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("will sync when back online"))
        .stderr(predicate::str::contains("could not be synced"));

    Ok(())
}

#[test]
fn create_without_farm_is_rejected() -> Result<(), Box<dyn std::error::Error>> {
    let temp = tempdir()?;
    let config_path = write_config(temp.path(), UNREACHABLE_API, None);
    let record = write_record_file(temp.path());

    cropsync()
        .args(["records", "create", "--file"])
        .arg(&record)
        .arg("--config")
        .arg(&config_path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("No farm selected"));

    Ok(())
}

#[test]
fn analytics_offline_reports_missing_data() -> Result<(), Box<dyn std::error::Error>> {
    let temp = tempdir()?;
    let config_path = write_config(temp.path(), UNREACHABLE_API, Some(3));

    cropsync()
        .args(["analytics", "--format", "json", "--config"])
        .arg(&config_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"quality\": \"error\""));

    Ok(())
}

// ============================================================================
// HTTP-backed tests
// ============================================================================

const RECORDS_BODY: &str = r#"[
    {
        "id": 5,
        "farm": 3,
        "farm_name": "North Field",
        "crop_name": "Tomato",
        "variety": "Roma",
        "batch_code": "TOM-05",
        "current_stage": "flowering",
        "transplant_date": "2025-04-01",
        "health_status": "critical",
        "issues_reported": "blight",
        "expected_yield": "200.00",
        "actual_yield": null,
        "growth_duration_days": 40
    },
    {
        "id": 6,
        "farm": 3,
        "crop_name": "Kale",
        "variety": "Lacinato",
        "batch_code": "KAL-06",
        "current_stage": "harvest",
        "transplant_date": "2025-02-01",
        "health_status": "healthy",
        "expected_yield": "50.00",
        "actual_yield": "45.00",
        "growth_duration_days": 90
    }
]"#;

#[cfg_attr(not(feature = "http-tests"), ignore)]
#[test]
fn records_list_outputs_json_with_meta() -> Result<(), Box<dyn std::error::Error>> {
    let mut server = mockito::Server::new();
    let api_url = format!("{}/api", server.url());

    let _list = server
        .mock("GET", "/api/farms/3/crop-stages/")
        .match_header("authorization", "Bearer test-token")
        .with_status(200)
        .with_body(RECORDS_BODY)
        .create();

    let temp = tempdir()?;
    let config_path = write_config(temp.path(), &api_url, Some(3));

    let assert = cropsync()
        .args(["records", "list", "--format", "json", "--config"])
        .arg(&config_path)
        .assert()
        .success();

    let stdout = String::from_utf8_lossy(&assert.get_output().stdout);
    assert!(stdout.contains("TOM-05"));
    assert!(stdout.contains("KAL-06"));
    assert!(stdout.contains("\"meta\""));
    assert!(!stdout.contains("stale_since"));

    Ok(())
}

#[cfg_attr(not(feature = "http-tests"), ignore)]
#[test]
fn analytics_aggregates_api_records() -> Result<(), Box<dyn std::error::Error>> {
    let mut server = mockito::Server::new();
    let api_url = format!("{}/api", server.url());

    let _list = server
        .mock("GET", "/api/farms/3/crop-stages/")
        .match_query(mockito::Matcher::Any)
        .with_status(200)
        .with_body(RECORDS_BODY)
        .create();

    let temp = tempdir()?;
    let config_path = write_config(temp.path(), &api_url, Some(3));

    cropsync()
        .args(["analytics", "--format", "json", "--config"])
        .arg(&config_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"total_count\": 2"))
        .stdout(predicate::str::contains("\"average_growth_days\": 65.0"))
        .stdout(predicate::str::contains("\"yield_efficiency_percent\": 90.0"))
        .stdout(predicate::str::contains("\"quality\": \"good\""));

    Ok(())
}

#[cfg_attr(not(feature = "http-tests"), ignore)]
#[test]
fn alerts_hide_dismissed_ids() -> Result<(), Box<dyn std::error::Error>> {
    let mut server = mockito::Server::new();
    let api_url = format!("{}/api", server.url());

    let _list = server
        .mock("GET", "/api/farms/3/crop-stages/")
        .with_status(200)
        .with_body(RECORDS_BODY)
        .expect(2)
        .create();

    let temp = tempdir()?;
    let config_path = write_config(temp.path(), &api_url, Some(3));

    cropsync()
        .args(["alerts", "--format", "table", "--config"])
        .arg(&config_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("health_critical:5"));

    cropsync()
        .args(["alerts", "--dismiss", "health_critical:5", "--format", "table", "--config"])
        .arg(&config_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("health_critical:5").not());

    Ok(())
}

#[cfg_attr(not(feature = "http-tests"), ignore)]
#[test]
fn update_sends_put_to_farm_route() -> Result<(), Box<dyn std::error::Error>> {
    let mut server = mockito::Server::new();
    let api_url = format!("{}/api", server.url());

    let update = server
        .mock("PUT", "/api/farms/3/crop-stages/5/")
        .match_body(mockito::Matcher::PartialJsonString(
            r#"{"batch_code": "TOM-05", "current_stage": "flowering"}"#.to_string(),
        ))
        .with_status(200)
        .with_body(
            r#"{"id": 5, "farm": 3, "crop_name": "Tomato", "variety": "Roma",
                "batch_code": "TOM-05", "current_stage": "flowering",
                "transplant_date": "2025-04-01", "health_status": "healthy"}"#,
        )
        .create();

    let temp = tempdir()?;
    let config_path = write_config(temp.path(), &api_url, Some(3));
    let record = write_record_file(temp.path());

    cropsync()
        .args(["records", "update", "5", "--format", "json", "--file"])
        .arg(&record)
        .arg("--config")
        .arg(&config_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"updated\""));

    update.assert();
    Ok(())
}

#[cfg_attr(not(feature = "http-tests"), ignore)]
#[test]
fn rejected_update_is_not_retried() -> Result<(), Box<dyn std::error::Error>> {
    let mut server = mockito::Server::new();
    let api_url = format!("{}/api", server.url());

    let update = server
        .mock("PUT", "/api/farms/3/crop-stages/5/")
        .with_status(400)
        .with_body(r#"{"batch_code": ["This field must be unique."]}"#)
        .expect(1)
        .create();

    let temp = tempdir()?;
    let config_path = write_config(temp.path(), &api_url, Some(3));
    let record = write_record_file(temp.path());

    cropsync()
        .args(["records", "update", "5", "--file"])
        .arg(&record)
        .arg("--config")
        .arg(&config_path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Bad request"));

    update.assert();
    Ok(())
}

#[cfg_attr(not(feature = "http-tests"), ignore)]
#[test]
fn failing_update_gives_up_after_max_attempts() -> Result<(), Box<dyn std::error::Error>> {
    let mut server = mockito::Server::new();
    let api_url = format!("{}/api", server.url());

    // First attempt plus three queued replays
    let update = server
        .mock("PUT", "/api/farms/3/crop-stages/5/")
        .with_status(503)
        .expect(4)
        .create();

    let temp = tempdir()?;
    let config_path = write_config(temp.path(), &api_url, Some(3));
    let record = write_record_file(temp.path());

    cropsync()
        .args(["records", "update", "5", "--file"])
        .arg(&record)
        .arg("--config")
        .arg(&config_path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("queued for retry"))
        .stderr(predicate::str::contains("Gave up on update"));

    update.assert();
    Ok(())
}
