use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use http_body_util::BodyExt;

use classroom_pulse::config::Config;

pub fn create_test_app() -> Router {
    classroom_pulse::create_app(&Config::default())
}

pub fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub fn delete(uri: &str) -> Request<Body> {
    Request::builder()
        .method("DELETE")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

pub fn student(id: &str, yaw: f64, ear: f64) -> serde_json::Value {
    serde_json::json!({
        "student_id": id,
        "face_bbox": [100, 80, 60, 60],
        "landmarks": [],
        "head_pose": { "pitch": 0.0, "yaw": yaw, "roll": 0.0 },
        "eye_aspect_ratio": ear,
        "mouth_aspect_ratio": 0.1,
        "local_timestamp": 1_760_000_000.0
    })
}

pub fn batch(classroom_id: &str, students: Vec<serde_json::Value>) -> serde_json::Value {
    serde_json::json!({
        "classroom_id": classroom_id,
        "course_id": "math_101",
        "timestamp": "2026-10-16T09:00:00Z",
        "students": students
    })
}
