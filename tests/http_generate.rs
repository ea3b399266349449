use std::sync::Arc;

use axum::{
    body::{Body, to_bytes},
    http::{
        Request, StatusCode,
        header::{CONTENT_DISPOSITION, CONTENT_TYPE},
    },
};
use countdown::{
    GeneratorConfig,
    http::{ApiServer, ServiceState},
};
use tower::ServiceExt as _;

mod support;

#[tokio::test]
async fn generate_returns_video_attachment() {
    if !support::ffmpeg_tools_available() {
        eprintln!("skipping: ffmpeg/ffprobe not found");
        return;
    }
    let Some(font) = support::system_font() else {
        eprintln!("skipping: no system font found");
        return;
    };
    let dir = support::scratch_dir("http_generate");
    let generator = GeneratorConfig {
        output_dir: dir.clone(),
        ..GeneratorConfig::default()
    };
    let server = ApiServer::new(ServiceState::new(generator, Arc::new(font), 1));

    let resp = server
        .router()
        .oneshot(
            Request::post("/generate")
                .header(CONTENT_TYPE, "application/json")
                .body(Body::from(
                    r#"{"duration": 2, "width": 320, "height": 240, "format": "mkv"}"#,
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers()
            .get(CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok()),
        Some("attachment; filename=\"time_2.mkv\"")
    );
    assert_eq!(
        resp.headers().get(CONTENT_TYPE).and_then(|v| v.to_str().ok()),
        Some("video/x-matroska")
    );

    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    assert_eq!(std::fs::read_dir(&dir).unwrap().count(), 0);

    let received = dir.join("received.mkv");
    std::fs::write(&received, &bytes).unwrap();
    let probed = support::probe_video(&received);
    assert_eq!(probed.frames, 48);
    assert_eq!((probed.width, probed.height), (320, 240));
}

#[tokio::test]
async fn repeated_requests_leave_no_files_behind() {
    if !support::ffmpeg_tools_available() {
        eprintln!("skipping: ffmpeg/ffprobe not found");
        return;
    }
    let Some(font) = support::system_font() else {
        eprintln!("skipping: no system font found");
        return;
    };
    let dir = support::scratch_dir("http_repeated");
    let server = ApiServer::new(ServiceState::new(
        GeneratorConfig {
            output_dir: dir.clone(),
            ..GeneratorConfig::default()
        },
        Arc::new(font),
        1,
    ));

    for _ in 0..3 {
        let resp = server
            .router()
            .oneshot(
                Request::post("/generate")
                    .header(CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"duration": 1, "width": 32, "height": 16}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        assert!(!bytes.is_empty());
    }

    assert_eq!(std::fs::read_dir(&dir).unwrap().count(), 0);
}

#[tokio::test]
async fn missing_parameter_is_reported_before_rendering() {
    let Some(font) = support::system_font() else {
        eprintln!("skipping: no system font found");
        return;
    };
    let dir = support::scratch_dir("http_missing");
    let server = ApiServer::new(ServiceState::new(
        GeneratorConfig {
            output_dir: dir.clone(),
            ..GeneratorConfig::default()
        },
        Arc::new(font),
        1,
    ));

    let resp = server
        .router()
        .oneshot(
            Request::post("/generate")
                .header(CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"duration": 2, "width": 320}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(
        body,
        serde_json::json!({ "error": "Please provide duration, width, and height" })
    );
    assert_eq!(std::fs::read_dir(&dir).unwrap().count(), 0);
}
