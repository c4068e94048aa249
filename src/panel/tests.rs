use super::*;
use crate::release::ReleaseClient;
use httpmock::prelude::*;
use serde_json::json;
use tempfile::TempDir;

fn stager_for(
    server: &MockServer,
    app_dir: &std::path::Path,
    state_dir: &std::path::Path,
) -> PanelStager {
    let client = ReleaseClient::new(None).unwrap().with_api_base(server.base_url());
    PanelStager::new(client, "clawdeck/clawdeck", app_dir, state_dir)
}

async fn mock_latest<'a>(server: &'a MockServer, tag: &str) -> httpmock::Mock<'a> {
    let tarball_url = server.url(format!("/tarballs/{tag}"));
    let tag = tag.to_string();
    server
        .mock_async(move |when, then| {
            when.method(GET).path("/repos/clawdeck/clawdeck/releases/latest");
            then.status(200).json_body(json!({
                "tag_name": tag,
                "tarball_url": tarball_url,
                "published_at": "2026-03-01T00:00:00Z"
            }));
        })
        .await
}

async fn mock_tarball<'a>(server: &'a MockServer, tag: &str) -> httpmock::Mock<'a> {
    let path = format!("/tarballs/{tag}");
    server
        .mock_async(move |when, then| {
            when.method(GET).path(path);
            then.status(200).body(&b"not really a tarball"[..]);
        })
        .await
}

#[tokio::test]
async fn check_reports_update_when_versions_differ() {
    let server = MockServer::start_async().await;
    mock_latest(&server, "v2026.3.0").await;

    let app = TempDir::new().unwrap();
    let state = TempDir::new().unwrap();
    std::fs::write(
        app.path().join("package.json"),
        br#"{"name":"clawdeck","version":"2026.1.0"}"#,
    )
    .unwrap();

    let status = stager_for(&server, app.path(), state.path()).check().await;
    assert!(status.ok);
    assert_eq!(status.current_tag, "v2026.1.0");
    assert_eq!(status.latest_tag, "v2026.3.0");
    assert!(status.update_available);
    assert!(status.warning.is_none());
}

#[tokio::test]
async fn check_with_unknown_current_version_assumes_update_available() {
    let server = MockServer::start_async().await;
    mock_latest(&server, "v2026.3.0").await;

    let app = TempDir::new().unwrap();
    let state = TempDir::new().unwrap();

    let status = stager_for(&server, app.path(), state.path()).check().await;
    assert_eq!(status.current_tag, "");
    assert!(status.update_available);
}

#[tokio::test]
async fn check_degrades_release_errors_to_warning() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/repos/clawdeck/clawdeck/releases/latest");
            then.status(500).body("backend exploded");
        })
        .await;

    let app = TempDir::new().unwrap();
    let state = TempDir::new().unwrap();

    let status = stager_for(&server, app.path(), state.path()).check().await;
    assert!(status.ok, "check must not fail on release errors");
    assert!(!status.update_available);
    assert!(status.warning.unwrap().contains("release check failed"));
}

#[tokio::test]
async fn stage_downloads_and_writes_the_pending_marker() {
    let server = MockServer::start_async().await;
    mock_latest(&server, "v2026.3.0").await;
    mock_tarball(&server, "v2026.3.0").await;

    let app = TempDir::new().unwrap();
    let state = TempDir::new().unwrap();

    let result = stager_for(&server, app.path(), state.path()).stage(None).await;
    assert!(result.ok, "stage failed: {}", result.message);
    assert!(result.requires_restart, "stage must demand a separate apply");
    assert!(!result.requires_reconnect, "stage never restarts anything");
    assert_eq!(result.target_version.as_deref(), Some("v2026.3.0"));

    let pending = read_valid_pending_update(state.path()).expect("marker must exist");
    assert_eq!(pending.tag, "v2026.3.0");
    assert!(pending.tarball_path.ends_with("panel-v2026.3.0.tar.gz"));
    assert!(pending.tarball_path.exists());
}

#[tokio::test]
async fn stage_failure_is_a_structured_result() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path_matches(Regex::new(".*").unwrap());
            then.status(404);
        })
        .await;

    let app = TempDir::new().unwrap();
    let state = TempDir::new().unwrap();

    let result = stager_for(&server, app.path(), state.path()).stage(Some("2026.9.9")).await;
    assert!(!result.ok);
    assert!(result.message.contains("staging failed"));
    assert!(read_valid_pending_update(state.path()).is_none());
}

#[cfg(target_os = "linux")]
#[tokio::test]
async fn apply_without_anything_staged_demands_a_stage_first() {
    let server = MockServer::start_async().await;
    let app = TempDir::new().unwrap();
    let state = TempDir::new().unwrap();

    let applier = PanelApplier::new(
        stager_for(&server, app.path(), state.path()),
        "clawdeck.service",
    );
    let result = applier.apply(None).await;
    assert!(!result.ok);
    assert!(result.message.contains("no staged update"));
}

#[cfg(target_os = "linux")]
#[tokio::test]
async fn stage_then_apply_launches_without_restaging() {
    let server = MockServer::start_async().await;
    let latest = mock_latest(&server, "v2026.3.0").await;
    mock_tarball(&server, "v2026.3.0").await;

    let app = TempDir::new().unwrap();
    let state = TempDir::new().unwrap();

    let staged = stager_for(&server, app.path(), state.path()).stage(None).await;
    assert!(staged.ok, "stage failed: {}", staged.message);
    let hits_after_stage = latest.hits_async().await;

    let applier = PanelApplier::new(
        stager_for(&server, app.path(), state.path()),
        "clawdeck.service",
    );
    let result = applier.apply(None).await;
    assert!(result.ok, "apply failed: {}", result.message);
    assert!(result.requires_reconnect);
    assert_eq!(result.reconnect_after_ms, Some(12_000));
    let log_path = result.log_path.expect("apply must report its log path");
    assert!(log_path.starts_with(state.path()));

    // No further metadata fetches happened during apply.
    assert_eq!(latest.hits_async().await, hits_after_stage);
}

#[cfg(target_os = "linux")]
#[tokio::test]
async fn apply_auto_stages_when_a_tag_is_supplied() {
    let server = MockServer::start_async().await;
    let tarball_url = server.url("/tarballs/v2026.4.0");
    server
        .mock_async(move |when, then| {
            when.method(GET).path("/repos/clawdeck/clawdeck/releases/tags/v2026.4.0");
            then.status(200).json_body(json!({
                "tag_name": "v2026.4.0",
                "tarball_url": tarball_url
            }));
        })
        .await;
    mock_tarball(&server, "v2026.4.0").await;

    let app = TempDir::new().unwrap();
    let state = TempDir::new().unwrap();

    let applier = PanelApplier::new(
        stager_for(&server, app.path(), state.path()),
        "clawdeck.service",
    );
    let result = applier.apply(Some("v2026.4.0")).await;
    assert!(result.ok, "apply failed: {}", result.message);
    assert_eq!(result.target_version.as_deref(), Some("v2026.4.0"));
    assert!(result.requires_reconnect);
}

#[cfg(not(target_os = "linux"))]
#[tokio::test]
async fn apply_is_refused_off_linux() {
    let server = MockServer::start_async().await;
    let app = TempDir::new().unwrap();
    let state = TempDir::new().unwrap();

    let applier = PanelApplier::new(
        stager_for(&server, app.path(), state.path()),
        "clawdeck.service",
    );
    let result = applier.apply(Some("v1.0.0")).await;
    assert!(!result.ok);
    assert!(result.message.contains("Linux-only"));
}
