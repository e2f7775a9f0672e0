//! Mock Mux for video host tests.
//!
//! Serves asset metadata, one WebVTT caption track and a thumbnail on an
//! ephemeral port. Asset ids drive the responses:
//! - `asset-ok`: public + signed playback ids, English and Spanish captions
//! - `asset-no-playback`: ready but without playback ids
//! - anything else: 404

use std::net::TcpListener;

use actix_web::{App, HttpRequest, HttpResponse, HttpServer, get, web};
use serde_json::json;

/// `Basic base64("test-token-id:test-token-secret")`
const EXPECTED_AUTH: &str = "Basic dGVzdC10b2tlbi1pZDp0ZXN0LXRva2VuLXNlY3JldA==";

pub const CAPTIONS: &str = "WEBVTT

00:00:00.000 --> 00:00:02.500
Welcome to the course.

00:00:02.500 --> 00:00:05.000
Today we look at contracts.
";

/// Smallest thing that sniffs as a JPEG.
pub const THUMBNAIL: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10];

#[get("/video/v1/assets/{id}")]
async fn asset(req: HttpRequest, path: web::Path<String>) -> HttpResponse {
    let authorized = req
        .headers()
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == EXPECTED_AUTH);
    if !authorized {
        return HttpResponse::Unauthorized().finish();
    }

    match path.as_str() {
        "asset-ok" => HttpResponse::Ok().json(json!({
            "data": {
                "id": "asset-ok",
                "status": "ready",
                "duration": 312.4,
                "playback_ids": [
                    { "id": "signed-playback", "policy": "signed" },
                    { "id": "public-playback", "policy": "public" }
                ],
                "tracks": [
                    { "id": "video-track", "type": "video" },
                    { "id": "track-es", "type": "text", "status": "ready", "language_code": "es" },
                    { "id": "track-en", "type": "text", "status": "ready", "language_code": "en-US" }
                ]
            }
        })),
        "asset-no-playback" => HttpResponse::Ok().json(json!({
            "data": { "id": "asset-no-playback", "status": "ready", "playback_ids": [], "tracks": [] }
        })),
        _ => HttpResponse::NotFound().finish(),
    }
}

#[get("/stream/{playback_id}/text/{file}")]
async fn captions(path: web::Path<(String, String)>) -> HttpResponse {
    let (playback_id, file) = path.into_inner();
    if playback_id == "public-playback" && file == "track-en.vtt" {
        HttpResponse::Ok().content_type("text/vtt").body(CAPTIONS)
    } else {
        HttpResponse::NotFound().finish()
    }
}

#[get("/image/{playback_id}/thumbnail.jpg")]
async fn thumbnail(path: web::Path<String>) -> HttpResponse {
    if path.as_str() == "public-playback" {
        HttpResponse::Ok().content_type("image/jpeg").body(THUMBNAIL)
    } else {
        HttpResponse::NotFound().finish()
    }
}

pub struct MockMux {
    pub base_url: String,
}

impl MockMux {
    /// Start the mock on an ephemeral port.
    pub fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("failed to bind");
        let port = listener.local_addr().unwrap().port();

        let server = HttpServer::new(|| {
            App::new()
                .service(asset)
                .service(captions)
                .service(thumbnail)
        })
        .workers(1)
        .listen(listener)
        .expect("failed to listen")
        .disable_signals()
        .run();

        // Lives until the test runtime shuts down
        tokio::spawn(server);

        MockMux {
            base_url: format!("http://127.0.0.1:{}", port),
        }
    }
}
