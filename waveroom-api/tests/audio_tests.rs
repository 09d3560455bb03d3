//! Integration tests for the audio upload/serve/delete pipeline
//!
//! Covers the upload contract end to end: content-type gate, size
//! ceiling, membership authorization, track lookup, persistence,
//! clip linkage, retrieval round-trip, and idempotent deletion.

mod helpers;

use axum::http::StatusCode;
use helpers::*;
use serde_json::json;

/// Full happy path: upload, verify clip linkage, fetch the bytes back
#[tokio::test]
async fn test_upload_round_trip() {
    let app = setup_app().await;
    let (token, _) = register_user(&app, "uploader").await;
    let project_id = create_project(&app, &token, "Roundtrip", false).await;
    let track_id = add_track(&app, &token, &project_id, "Vocals").await;

    let wav = wav_fixture(1000);
    let (status, body) = send_upload(
        &app,
        Some(&token),
        Some(("take1.wav", Some("audio/wav"), &wav)),
        &[("project_id", &project_id), ("track_id", &track_id)],
    )
    .await;

    assert_eq!(status, StatusCode::OK, "upload failed: {}", body);
    let file_id = body["file_id"].as_str().unwrap();
    let clip = &body["clip"];
    assert!(clip["id"].is_string());
    assert_eq!(clip["name"], "take1.wav");
    assert_eq!(clip["track_id"], track_id);
    assert_eq!(clip["file_size"].as_i64().unwrap(), wav.len() as i64);
    assert_eq!(clip["duration"], 0.0);
    assert_eq!(clip["start_time"], 0.0);
    assert_eq!(
        clip["file_url"].as_str().unwrap(),
        format!("/api/audio/file/{}", file_id)
    );
    assert!(file_id.ends_with(".wav"));

    // Artifact is on disk with the full content
    let on_disk = std::fs::read(app.uploads_dir.join(file_id)).unwrap();
    assert_eq!(on_disk.len(), wav.len());

    // Serving returns exactly the uploaded bytes with an audio type
    let response = send_raw(&app, "GET", &format!("/api/audio/file/{}", file_id), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response
        .headers()
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(content_type.starts_with("audio/"));
    let disposition = response
        .headers()
        .get("content-disposition")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.contains(file_id));
    let served = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(served.as_ref(), wav.as_slice());

    // The clip appears when the project is re-fetched
    let (status, project) = send_json(
        &app,
        "GET",
        &format!("/api/projects/{}", project_id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let clips = project["tracks"][0]["clips"].as_array().unwrap();
    assert_eq!(clips.len(), 1);
    assert_eq!(
        clips[0]["file_url"].as_str().unwrap(),
        format!("/api/audio/file/{}", file_id)
    );
}

/// Non-audio declared type: 400, no disk write, no document update
#[tokio::test]
async fn test_rejects_non_audio_content_type() {
    let app = setup_app().await;
    let (token, _) = register_user(&app, "texter").await;
    let project_id = create_project(&app, &token, "TypeGate", false).await;
    let track_id = add_track(&app, &token, &project_id, "Track").await;

    let (status, _) = send_upload(
        &app,
        Some(&token),
        Some(("notes.txt", Some("text/plain"), b"not audio")),
        &[("project_id", &project_id), ("track_id", &track_id)],
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(uploaded_files(&app).is_empty());

    let (_, project) = send_json(
        &app,
        "GET",
        &format!("/api/projects/{}", project_id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(project["tracks"][0]["clips"].as_array().unwrap().len(), 0);
}

/// A file part with no Content-Type header at all is also rejected
#[tokio::test]
async fn test_rejects_missing_content_type() {
    let app = setup_app().await;
    let (token, _) = register_user(&app, "noct").await;
    let project_id = create_project(&app, &token, "NoCT", false).await;
    let track_id = add_track(&app, &token, &project_id, "Track").await;

    let (status, _) = send_upload(
        &app,
        Some(&token),
        Some(("mystery.bin", None, b"????")),
        &[("project_id", &project_id), ("track_id", &track_id)],
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(uploaded_files(&app).is_empty());
}

/// Streamed size above the 50 MiB ceiling: 413 and nothing on disk
#[tokio::test]
async fn test_rejects_oversized_upload() {
    let app = setup_app().await;
    let (token, _) = register_user(&app, "bigfile").await;
    let project_id = create_project(&app, &token, "TooBig", false).await;
    let track_id = add_track(&app, &token, &project_id, "Track").await;

    let oversized = vec![0u8; waveroom_api::api::audio::MAX_UPLOAD_BYTES + 1];
    let (status, _) = send_upload(
        &app,
        Some(&token),
        Some(("huge.wav", Some("audio/wav"), &oversized)),
        &[("project_id", &project_id), ("track_id", &track_id)],
    )
    .await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert!(uploaded_files(&app).is_empty());
}

/// Unknown project id: 404 before any disk write
#[tokio::test]
async fn test_rejects_unknown_project() {
    let app = setup_app().await;
    let (token, _) = register_user(&app, "ghostproj").await;

    let wav = wav_fixture(100);
    let (status, _) = send_upload(
        &app,
        Some(&token),
        Some(("take.wav", Some("audio/wav"), &wav)),
        &[("project_id", "no-such-project"), ("track_id", "whatever")],
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(uploaded_files(&app).is_empty());
}

/// Track id missing from an authorized project: 404, no disk write
#[tokio::test]
async fn test_rejects_unknown_track() {
    let app = setup_app().await;
    let (token, _) = register_user(&app, "ghosttrack").await;
    let project_id = create_project(&app, &token, "NoTrack", false).await;

    let wav = wav_fixture(100);
    let (status, _) = send_upload(
        &app,
        Some(&token),
        Some(("take.wav", Some("audio/wav"), &wav)),
        &[("project_id", &project_id), ("track_id", "no-such-track")],
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(uploaded_files(&app).is_empty());
}

/// A caller who is neither owner nor collaborator gets 403; becoming
/// a collaborator lifts the refusal
#[tokio::test]
async fn test_membership_gates_upload() {
    let app = setup_app().await;
    let (owner_token, _) = register_user(&app, "owner").await;
    let (guest_token, _) = register_user(&app, "guest").await;
    let project_id = create_project(&app, &owner_token, "Members", false).await;
    let track_id = add_track(&app, &owner_token, &project_id, "Track").await;

    let wav = wav_fixture(100);
    let (status, _) = send_upload(
        &app,
        Some(&guest_token),
        Some(("take.wav", Some("audio/wav"), &wav)),
        &[("project_id", &project_id), ("track_id", &track_id)],
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(uploaded_files(&app).is_empty());

    let (status, _) = send_json(
        &app,
        "POST",
        &format!("/api/projects/{}/collaborators", project_id),
        Some(&owner_token),
        Some(json!({ "username": "guest" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send_upload(
        &app,
        Some(&guest_token),
        Some(("take.wav", Some("audio/wav"), &wav)),
        &[("project_id", &project_id), ("track_id", &track_id)],
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

/// Missing form fields are client errors
#[tokio::test]
async fn test_rejects_missing_fields() {
    let app = setup_app().await;
    let (token, _) = register_user(&app, "fields").await;
    let project_id = create_project(&app, &token, "Fields", false).await;
    let track_id = add_track(&app, &token, &project_id, "Track").await;

    let wav = wav_fixture(50);

    // No file part
    let (status, _) = send_upload(
        &app,
        Some(&token),
        None,
        &[("project_id", &project_id), ("track_id", &track_id)],
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // No project_id
    let (status, _) = send_upload(
        &app,
        Some(&token),
        Some(("take.wav", Some("audio/wav"), &wav)),
        &[("track_id", &track_id)],
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // No track_id
    let (status, _) = send_upload(
        &app,
        Some(&token),
        Some(("take.wav", Some("audio/wav"), &wav)),
        &[("project_id", &project_id)],
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

/// Upload and delete both require a bearer token; serving does not
#[tokio::test]
async fn test_authentication_requirements() {
    let app = setup_app().await;

    let wav = wav_fixture(50);
    let (status, _) = send_upload(
        &app,
        None,
        Some(("take.wav", Some("audio/wav"), &wav)),
        &[("project_id", "p"), ("track_id", "t")],
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send_json(&app, "DELETE", "/api/audio/file/x.wav", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Reads are public; an unknown id is simply absent
    let (status, _) = send_json(&app, "GET", "/api/audio/file/unknown.wav", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

/// Deleting removes the artifact, detaches the clip, and stays 200 on
/// repeat calls
#[tokio::test]
async fn test_delete_detaches_and_is_idempotent() {
    let app = setup_app().await;
    let (token, _) = register_user(&app, "deleter").await;
    let project_id = create_project(&app, &token, "Deletion", false).await;
    let track_id = add_track(&app, &token, &project_id, "Track").await;

    let wav = wav_fixture(500);
    let (status, body) = send_upload(
        &app,
        Some(&token),
        Some(("gone.wav", Some("audio/wav"), &wav)),
        &[("project_id", &project_id), ("track_id", &track_id)],
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let file_id = body["file_id"].as_str().unwrap().to_string();

    let (status, body) = send_json(
        &app,
        "DELETE",
        &format!("/api/audio/file/{}", file_id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["message"].is_string());

    // Retrieval now fails
    let (status, _) = send_json(
        &app,
        "GET",
        &format!("/api/audio/file/{}", file_id),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // The clip no longer appears on the project
    let (_, project) = send_json(
        &app,
        "GET",
        &format!("/api/projects/{}", project_id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(project["tracks"][0]["clips"].as_array().unwrap().len(), 0);

    // Deleting again still succeeds
    let (status, _) = send_json(
        &app,
        "DELETE",
        &format!("/api/audio/file/{}", file_id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

/// Path-traversal shaped identifiers are treated as absent
#[tokio::test]
async fn test_serve_rejects_traversal_ids() {
    let app = setup_app().await;
    // Encoded "../" segments never reach the filesystem
    let (status, _) = send_json(
        &app,
        "GET",
        "/api/audio/file/..%2F..%2Fetc%2Fpasswd",
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

/// Filenames without an extension fall back to the default; the
/// declared type still gates
#[tokio::test]
async fn test_extension_defaulting() {
    let app = setup_app().await;
    let (token, _) = register_user(&app, "extless").await;
    let project_id = create_project(&app, &token, "Extless", false).await;
    let track_id = add_track(&app, &token, &project_id, "Track").await;

    let wav = wav_fixture(100);
    let (status, body) = send_upload(
        &app,
        Some(&token),
        Some(("rawtake", Some("audio/wav"), &wav)),
        &[("project_id", &project_id), ("track_id", &track_id)],
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["file_id"].as_str().unwrap().ends_with(".wav"));
}

/// Two uploads to the same track append two clips in order
#[tokio::test]
async fn test_sequential_uploads_append() {
    let app = setup_app().await;
    let (token, _) = register_user(&app, "stacker").await;
    let project_id = create_project(&app, &token, "Stack", false).await;
    let track_id = add_track(&app, &token, &project_id, "Track").await;

    let wav = wav_fixture(100);
    for name in ["first.wav", "second.wav"] {
        let (status, _) = send_upload(
            &app,
            Some(&token),
            Some((name, Some("audio/wav"), &wav)),
            &[("project_id", &project_id), ("track_id", &track_id)],
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (_, project) = send_json(
        &app,
        "GET",
        &format!("/api/projects/{}", project_id),
        Some(&token),
        None,
    )
    .await;
    let clips = project["tracks"][0]["clips"].as_array().unwrap();
    assert_eq!(clips.len(), 2);
    assert_eq!(clips[0]["name"], "first.wav");
    assert_eq!(clips[1]["name"], "second.wav");
}
