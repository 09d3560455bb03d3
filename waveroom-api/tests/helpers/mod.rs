//! Shared helpers for waveroom-api integration tests
#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use std::path::PathBuf;
use tempfile::TempDir;
use tower::util::ServiceExt; // for `oneshot`
use waveroom_api::{build_router, AppState};
use waveroom_common::config::DataFolder;

/// A router wired to a throwaway database and uploads directory
pub struct TestApp {
    pub router: Router,
    pub uploads_dir: PathBuf,
    _tmp: TempDir,
}

pub async fn setup_app() -> TestApp {
    let tmp = TempDir::new().expect("create temp dir");
    let folder = DataFolder::new(tmp.path().to_path_buf());
    folder.ensure_layout().expect("create data folder layout");

    let pool = waveroom_common::db::init_database(&folder.database_path())
        .await
        .expect("initialize database");
    let secret = waveroom_common::auth::load_signing_secret(&pool)
        .await
        .expect("initialize signing secret");

    let state = AppState::new(pool, folder.uploads_dir(), secret);
    TestApp {
        router: build_router(state),
        uploads_dir: folder.uploads_dir(),
        _tmp: tmp,
    }
}

/// Send a request with an optional bearer token and JSON body
pub async fn send_json(
    app: &TestApp,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    let request = match body {
        Some(value) => builder
            .header("content-type", "application/json")
            .body(Body::from(value.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

/// Send a request and return the raw response for header inspection
pub async fn send_raw(
    app: &TestApp,
    method: &str,
    uri: &str,
    token: Option<&str>,
) -> axum::response::Response {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    app.router
        .clone()
        .oneshot(builder.body(Body::empty()).unwrap())
        .await
        .unwrap()
}

/// Register a user and return (token, user_id)
pub async fn register_user(app: &TestApp, username: &str) -> (String, String) {
    let (status, body) = send_json(
        app,
        "POST",
        "/api/auth/register",
        None,
        Some(json!({
            "username": username,
            "email": format!("{}@waveroom.test", username),
            "password": "Secret123!",
            "display_name": format!("{} display", username),
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "register failed: {}", body);
    (
        body["token"].as_str().unwrap().to_string(),
        body["user"]["id"].as_str().unwrap().to_string(),
    )
}

/// Create a project and return its id
pub async fn create_project(app: &TestApp, token: &str, name: &str, is_public: bool) -> String {
    let (status, body) = send_json(
        app,
        "POST",
        "/api/projects",
        Some(token),
        Some(json!({ "name": name, "is_public": is_public })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "create project failed: {}", body);
    body["id"].as_str().unwrap().to_string()
}

/// Add a track to a project and return the track id
pub async fn add_track(app: &TestApp, token: &str, project_id: &str, name: &str) -> String {
    let (status, body) = send_json(
        app,
        "POST",
        &format!("/api/projects/{}/tracks", project_id),
        Some(token),
        Some(json!({ "name": name, "instrument": "vocals" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "create track failed: {}", body);
    body["id"].as_str().unwrap().to_string()
}

pub const MULTIPART_BOUNDARY: &str = "waveroom-test-boundary-4f9a";

/// Build a multipart/form-data body with optional file part
pub fn multipart_body(
    file: Option<(&str, Option<&str>, &[u8])>,
    fields: &[(&str, &str)],
) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                MULTIPART_BOUNDARY, name, value
            )
            .as_bytes(),
        );
    }
    if let Some((filename, content_type, data)) = file {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\n",
                MULTIPART_BOUNDARY, filename
            )
            .as_bytes(),
        );
        if let Some(ct) = content_type {
            body.extend_from_slice(format!("Content-Type: {}\r\n", ct).as_bytes());
        }
        body.extend_from_slice(b"\r\n");
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", MULTIPART_BOUNDARY).as_bytes());
    body
}

/// Send a multipart upload to /api/audio/upload
pub async fn send_upload(
    app: &TestApp,
    token: Option<&str>,
    file: Option<(&str, Option<&str>, &[u8])>,
    fields: &[(&str, &str)],
) -> (StatusCode, Value) {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/api/audio/upload")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", MULTIPART_BOUNDARY),
        );
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    let request = builder.body(Body::from(multipart_body(file, fields))).unwrap();

    let response = app.router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

/// Generate a small PCM WAV file in memory
pub fn wav_fixture(samples: usize) -> Vec<u8> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 44_100,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut cursor = std::io::Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec).expect("wav writer");
        for i in 0..samples {
            writer.write_sample((i as i16).wrapping_mul(3)).unwrap();
        }
        writer.finalize().unwrap();
    }
    cursor.into_inner()
}

/// Names of files currently in the uploads directory
pub fn uploaded_files(app: &TestApp) -> Vec<String> {
    std::fs::read_dir(&app.uploads_dir)
        .map(|entries| {
            entries
                .filter_map(|e| e.ok())
                .map(|e| e.file_name().to_string_lossy().into_owned())
                .collect()
        })
        .unwrap_or_default()
}
