//! End-to-end tests over the router.
//!
//! These drive the full validator pipeline and handlers with realistic
//! signed requests, checking status codes, result codes, and the target
//! lifecycle against a short processing delay.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::{Duration as ChronoDuration, Utc};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use mirage_core::{authorization_header, rfc_1123_date, Database, DatabaseConfig};
use mirage_server::{router, AppState, Config};

const HIGH_CONTRAST_PNG: &[u8] = include_bytes!("fixtures/high_contrast.png");
const RGB_GRADIENT_PNG: &[u8] = include_bytes!("fixtures/rgb_gradient.png");
const TINY_PNG: &[u8] = include_bytes!("fixtures/tiny.png");
const RGBA_PNG: &[u8] = include_bytes!("fixtures/rgba.png");

const SERVER_ACCESS: &str = "server-access";
const SERVER_SECRET: &str = "server-secret";
const CLIENT_ACCESS: &str = "client-access";
const CLIENT_SECRET: &str = "client-secret";

const PROCESSING_MS: i64 = 150;

fn app() -> Router {
    app_with_active(true)
}

fn app_with_active(active: bool) -> Router {
    let state = AppState::new(Config::default());
    state.register_database(Database::new(DatabaseConfig {
        name: "test-database".to_owned(),
        server_access_key: SERVER_ACCESS.to_owned(),
        server_secret_key: SERVER_SECRET.to_owned(),
        client_access_key: CLIENT_ACCESS.to_owned(),
        client_secret_key: CLIENT_SECRET.to_owned(),
        active,
        processing_delay: ChronoDuration::milliseconds(PROCESSING_MS),
    }));
    router(state)
}

fn signed_at(
    access: &str,
    secret: &str,
    method: &str,
    path: &str,
    body: Vec<u8>,
    content_type: &str,
    date: &str,
) -> Request<Body> {
    let auth = authorization_header(access, secret, method, &body, content_type, date, path);
    let mut builder = Request::builder()
        .method(method)
        .uri(path)
        .header(header::AUTHORIZATION, auth)
        .header(header::DATE, date);
    if !content_type.is_empty() {
        builder = builder.header(header::CONTENT_TYPE, content_type);
    }
    builder.body(Body::from(body)).unwrap()
}

fn signed(method: &str, path: &str, body: Vec<u8>, content_type: &str) -> Request<Body> {
    let date = rfc_1123_date(Utc::now());
    signed_at(SERVER_ACCESS, SERVER_SECRET, method, path, body, content_type, &date)
}

fn add_body(name: &str, image: &[u8]) -> Vec<u8> {
    json!({"name": name, "width": 1.0, "image": BASE64.encode(image)})
        .to_string()
        .into_bytes()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = serde_json::from_slice(&bytes).unwrap();
    (status, body)
}

async fn add_target(app: &Router, name: &str, image: &[u8]) -> String {
    let (status, body) = send(
        app,
        signed("POST", "/targets", add_body(name, image), "application/json"),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["result_code"], "TargetCreated");
    body["target_id"].as_str().unwrap().to_owned()
}

async fn get_target(app: &Router, target_id: &str) -> (StatusCode, Value) {
    send(app, signed("GET", &format!("/targets/{target_id}"), Vec::new(), "")).await
}

async fn wait_processed() {
    tokio::time::sleep(std::time::Duration::from_millis(400)).await;
}

fn assert_hex_id(value: &Value) {
    let id = value.as_str().unwrap();
    assert_eq!(id.len(), 32);
    assert!(id.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
}

#[tokio::test]
async fn add_target_returns_created_with_hex_id() {
    let app = app();
    let (status, body) = send(
        &app,
        signed("POST", "/targets", add_body("alpha", HIGH_CONTRAST_PNG), "application/json"),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["result_code"], "TargetCreated");
    assert_hex_id(&body["target_id"]);
    assert_hex_id(&body["transaction_id"]);
}

#[tokio::test]
async fn responses_carry_the_vendor_header_set() {
    let app = app();
    let request = signed("GET", "/targets", Vec::new(), "");
    let response = app.clone().oneshot(request).await.unwrap();

    let headers = response.headers();
    assert_eq!(headers.get(header::CONTENT_TYPE).unwrap(), "application/json");
    assert_eq!(headers.get(header::CONNECTION).unwrap(), "keep-alive");
    assert_eq!(headers.get(header::SERVER).unwrap(), "nginx");
    assert!(headers.contains_key(header::DATE));

    let declared: usize = headers
        .get(header::CONTENT_LENGTH)
        .unwrap()
        .to_str()
        .unwrap()
        .parse()
        .unwrap();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(declared, bytes.len());
}

#[tokio::test]
async fn target_processes_then_succeeds() {
    let app = app();
    let target_id = add_target(&app, "alpha", HIGH_CONTRAST_PNG).await;

    let (status, body) = get_target(&app, &target_id).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "processing");
    assert_eq!(body["target_record"]["tracking_rating"], -1);
    assert_eq!(body["target_record"]["reco_rating"], "");

    wait_processed().await;

    let (status, body) = get_target(&app, &target_id).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
    assert_eq!(body["target_record"]["name"], "alpha");
    assert_eq!(body["target_record"]["width"], 1.0);
    assert_eq!(body["target_record"]["active_flag"], true);
    assert_eq!(body["target_record"]["tracking_rating"], 3);
}

#[tokio::test]
async fn low_contrast_target_fails_processing() {
    let app = app();
    let target_id = add_target(&app, "flat", TINY_PNG).await;
    wait_processed().await;

    let (status, body) = get_target(&app, &target_id).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "failed");
    assert_eq!(body["target_record"]["tracking_rating"], 0);
}

#[tokio::test]
async fn duplicate_name_is_rejected() {
    let app = app();
    add_target(&app, "alpha", HIGH_CONTRAST_PNG).await;

    let (status, body) = send(
        &app,
        signed("POST", "/targets", add_body("alpha", RGB_GRADIENT_PNG), "application/json"),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["result_code"], "TargetNameExist");
}

#[tokio::test]
async fn missing_authorization_is_an_authentication_failure() {
    let app = app();
    let request = Request::builder()
        .method("GET")
        .uri("/targets")
        .header(header::DATE, rfc_1123_date(Utc::now()))
        .body(Body::empty())
        .unwrap();

    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["result_code"], "AuthenticationFailure");
}

#[tokio::test]
async fn wrong_secret_key_fails() {
    let app = app();
    let date = rfc_1123_date(Utc::now());
    let request = signed_at(
        SERVER_ACCESS,
        "not-the-secret",
        "GET",
        "/targets",
        Vec::new(),
        "",
        &date,
    );

    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["result_code"], "Fail");
}

#[tokio::test]
async fn unknown_access_key_fails() {
    let app = app();
    let date = rfc_1123_date(Utc::now());
    let request = signed_at(
        "nobody",
        SERVER_SECRET,
        "GET",
        "/targets",
        Vec::new(),
        "",
        &date,
    );

    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["result_code"], "Fail");
}

#[tokio::test]
async fn skewed_date_is_rejected() {
    let app = app();
    let date = rfc_1123_date(Utc::now() - ChronoDuration::minutes(10));
    let request = signed_at(SERVER_ACCESS, SERVER_SECRET, "GET", "/targets", Vec::new(), "", &date);

    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["result_code"], "RequestTimeTooSkewed");
}

#[tokio::test]
async fn malformed_date_fails() {
    let app = app();
    let request = signed_at(
        SERVER_ACCESS,
        SERVER_SECRET,
        "GET",
        "/targets",
        Vec::new(),
        "",
        "not a date",
    );

    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["result_code"], "Fail");
}

#[tokio::test]
async fn unknown_target_is_resolved_before_body_validation() {
    let app = app();
    let missing = "0123456789abcdef0123456789abcdef";

    // A broken body would otherwise fail with 400; the unknown id wins.
    let body = b"this is not json".to_vec();
    let request = signed("PUT", &format!("/targets/{missing}"), body, "application/json");
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["result_code"], "UnknownTarget");
}

#[tokio::test]
async fn invalid_widths_fail() {
    let app = app();
    for width in [json!(-1.0), json!(0), json!("wide")] {
        let body = json!({"name": "w", "width": width, "image": BASE64.encode(HIGH_CONTRAST_PNG)})
            .to_string()
            .into_bytes();
        let (status, body) = send(&app, signed("POST", "/targets", body, "application/json")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["result_code"], "Fail");
    }
}

#[tokio::test]
async fn invalid_width_on_update_fails_and_leaves_the_target_unchanged() {
    let app = app();
    let target_id = add_target(&app, "alpha", HIGH_CONTRAST_PNG).await;
    wait_processed().await;

    let path = format!("/targets/{target_id}");
    for width in [json!(-1.0), json!(0), json!("10"), json!(null)] {
        let body = json!({"width": width}).to_string().into_bytes();
        let (status, response) = send(&app, signed("PUT", &path, body, "application/json")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(response["result_code"], "Fail");
    }

    let (_, response) = get_target(&app, &target_id).await;
    assert_eq!(response["status"], "success");
    assert_eq!(response["target_record"]["width"], 1.0);
}

#[tokio::test]
async fn disallowed_key_fails() {
    let app = app();
    let body = json!({
        "name": "alpha",
        "width": 1.0,
        "image": BASE64.encode(HIGH_CONTRAST_PNG),
        "extra": true,
    })
    .to_string()
    .into_bytes();

    let (status, body) = send(&app, signed("POST", "/targets", body, "application/json")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["result_code"], "Fail");
}

#[tokio::test]
async fn wrong_color_mode_is_a_bad_image() {
    let app = app();
    let (status, body) = send(
        &app,
        signed("POST", "/targets", add_body("rgba", RGBA_PNG), "application/json"),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["result_code"], "BadImage");
}

#[tokio::test]
async fn undecodable_base64_image_fails_unprocessable() {
    let app = app();
    let body = json!({"name": "alpha", "width": 1.0, "image": "not&base64!"})
        .to_string()
        .into_bytes();

    let (status, body) = send(&app, signed("POST", "/targets", body, "application/json")).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["result_code"], "Fail");
}

#[tokio::test]
async fn delete_waits_out_the_processing_window() {
    let app = app();
    let target_id = add_target(&app, "alpha", HIGH_CONTRAST_PNG).await;
    let path = format!("/targets/{target_id}");

    let (status, body) = send(&app, signed("DELETE", &path, Vec::new(), "")).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["result_code"], "TargetStatusProcessing");

    wait_processed().await;

    let (status, body) = send(&app, signed("DELETE", &path, Vec::new(), "")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result_code"], "Success");

    let (status, body) = get_target(&app, &target_id).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["result_code"], "UnknownTarget");
}

#[tokio::test]
async fn update_restarts_processing() {
    let app = app();
    let target_id = add_target(&app, "alpha", HIGH_CONTRAST_PNG).await;
    let path = format!("/targets/{target_id}");

    // Updates are rejected until the first processing cycle resolves.
    let body = json!({"width": 2.0}).to_string().into_bytes();
    let (status, response) = send(&app, signed("PUT", &path, body, "application/json")).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(response["result_code"], "TargetStatusNotSuccess");

    wait_processed().await;

    let body = json!({"width": 2.0}).to_string().into_bytes();
    let (status, response) = send(&app, signed("PUT", &path, body, "application/json")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["result_code"], "Success");

    let (_, response) = get_target(&app, &target_id).await;
    assert_eq!(response["status"], "processing");
    assert_eq!(response["target_record"]["width"], 2.0);
}

#[tokio::test]
async fn update_rejects_a_name_collision_but_keeps_own_name() {
    let app = app();
    let first = add_target(&app, "alpha", HIGH_CONTRAST_PNG).await;
    add_target(&app, "beta", RGB_GRADIENT_PNG).await;
    wait_processed().await;

    let path = format!("/targets/{first}");
    let body = json!({"name": "beta"}).to_string().into_bytes();
    let (status, response) = send(&app, signed("PUT", &path, body, "application/json")).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(response["result_code"], "TargetNameExist");

    // Re-submitting the target's current name is not a collision.
    let body = json!({"name": "alpha"}).to_string().into_bytes();
    let (status, _) = send(&app, signed("PUT", &path, body, "application/json")).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn update_rejects_null_active_flag() {
    let app = app();
    let target_id = add_target(&app, "alpha", HIGH_CONTRAST_PNG).await;
    wait_processed().await;

    let path = format!("/targets/{target_id}");
    let body = json!({"active_flag": null}).to_string().into_bytes();
    let (status, response) = send(&app, signed("PUT", &path, body, "application/json")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(response["result_code"], "Fail");
}

#[tokio::test]
async fn list_targets_returns_ids_in_creation_order() {
    let app = app();
    let first = add_target(&app, "alpha", HIGH_CONTRAST_PNG).await;
    let second = add_target(&app, "beta", RGB_GRADIENT_PNG).await;

    let (status, body) = send(&app, signed("GET", "/targets", Vec::new(), "")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result_code"], "Success");
    assert_eq!(body["results"], json!([first, second]));
}

#[tokio::test]
async fn summary_with_a_body_is_an_authentication_failure() {
    let app = app();
    let body = json!({"anything": 1}).to_string().into_bytes();
    let (status, response) = send(&app, signed("GET", "/summary", body, "application/json")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(response["result_code"], "AuthenticationFailure");
}

#[tokio::test]
async fn database_summary_reports_counts_and_usage() {
    let app = app();
    add_target(&app, "good", HIGH_CONTRAST_PNG).await;
    add_target(&app, "flat", TINY_PNG).await;
    wait_processed().await;

    let (status, body) = send(&app, signed("GET", "/summary", Vec::new(), "")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result_code"], "Success");
    assert_eq!(body["name"], "test-database");
    assert_eq!(body["active_images"], 1);
    assert_eq!(body["inactive_images"], 0);
    assert_eq!(body["failed_images"], 1);
    assert_eq!(body["processing_images"], 0);
    assert_eq!(body["request_usage"], 2);
    assert_eq!(body["target_quota"], 1000);
    assert_eq!(body["request_quota"], 100000);
    assert_eq!(body["reco_threshold"], 1000);
    assert_eq!(body["total_recos"], 0);
}

#[tokio::test]
async fn target_summary_reports_the_upload_date() {
    let app = app();
    let target_id = add_target(&app, "alpha", HIGH_CONTRAST_PNG).await;
    wait_processed().await;

    let (status, body) = send(
        &app,
        signed("GET", &format!("/summary/{target_id}"), Vec::new(), ""),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
    assert_eq!(body["database_name"], "test-database");
    assert_eq!(body["target_name"], "alpha");
    assert_eq!(body["upload_date"], Utc::now().format("%Y-%m-%d").to_string());
    assert_eq!(body["active_flag"], true);
    assert_eq!(body["tracking_rating"], 3);
    assert_eq!(body["current_month_recos"], 0);
}

#[tokio::test]
async fn duplicates_lists_processed_targets_with_matching_content() {
    let app = app();
    let first = add_target(&app, "alpha", HIGH_CONTRAST_PNG).await;
    let second = add_target(&app, "alpha-copy", HIGH_CONTRAST_PNG).await;
    add_target(&app, "other", RGB_GRADIENT_PNG).await;
    wait_processed().await;

    let (status, body) = send(
        &app,
        signed("GET", &format!("/duplicates/{first}"), Vec::new(), ""),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["similar_targets"], json!([second]));
}

#[tokio::test]
async fn inactive_project_rejects_mutations() {
    let app = app_with_active(false);
    let (status, body) = send(
        &app,
        signed("POST", "/targets", add_body("alpha", HIGH_CONTRAST_PNG), "application/json"),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["result_code"], "ProjectInactive");
}

// ---------------------------------------------------------------------------
// Query API
// ---------------------------------------------------------------------------

const QUERY_BOUNDARY: &str = "MirageFormBoundary1b1a73899c68";

fn query_multipart(image: Option<&[u8]>, fields: &[(&str, &str)]) -> Vec<u8> {
    let mut body = Vec::new();
    if let Some(image) = image {
        body.extend_from_slice(format!("--{QUERY_BOUNDARY}\r\n").as_bytes());
        body.extend_from_slice(
            b"Content-Disposition: form-data; name=\"image\"; filename=\"image.png\"\r\n",
        );
        body.extend_from_slice(b"Content-Type: image/png\r\n\r\n");
        body.extend_from_slice(image);
        body.extend_from_slice(b"\r\n");
    }
    for (name, value) in fields {
        body.extend_from_slice(format!("--{QUERY_BOUNDARY}\r\n").as_bytes());
        body.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
        );
        body.extend_from_slice(value.as_bytes());
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{QUERY_BOUNDARY}--\r\n").as_bytes());
    body
}

fn query_request(image: Option<&[u8]>, fields: &[(&str, &str)]) -> Request<Body> {
    let body = query_multipart(image, fields);
    let date = rfc_1123_date(Utc::now());
    // The signature covers the bare media type without the boundary.
    let auth = authorization_header(
        CLIENT_ACCESS,
        CLIENT_SECRET,
        "POST",
        &body,
        "multipart/form-data",
        &date,
        "/v1/query",
    );
    Request::builder()
        .method("POST")
        .uri("/v1/query")
        .header(header::AUTHORIZATION, auth)
        .header(header::DATE, date)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={QUERY_BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn query_recognizes_a_processed_target() {
    let app = app();
    let target_id = add_target(&app, "alpha", HIGH_CONTRAST_PNG).await;
    wait_processed().await;

    let (status, body) = send(&app, query_request(Some(HIGH_CONTRAST_PNG), &[])).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result_code"], "Success");
    assert_hex_id(&body["query_id"]);
    assert!(body.get("transaction_id").is_none());

    let results = body["results"].as_array().unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["target_id"], target_id);
    // Default include_target_data is "top": the first result carries data.
    assert_eq!(results[0]["target_data"]["name"], "alpha");
    assert!(results[0]["target_data"]["target_timestamp"].is_i64());
}

#[tokio::test]
async fn query_excludes_processing_and_unmatched_targets() {
    let app = app();
    add_target(&app, "alpha", HIGH_CONTRAST_PNG).await;

    // Still processing: nothing matches yet.
    let (status, body) = send(&app, query_request(Some(HIGH_CONTRAST_PNG), &[])).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["results"], json!([]));

    wait_processed().await;

    // Different image content never matches.
    let (_, body) = send(&app, query_request(Some(RGB_GRADIENT_PNG), &[])).await;
    assert_eq!(body["results"], json!([]));
}

#[tokio::test]
async fn query_include_target_data_none_omits_data() {
    let app = app();
    add_target(&app, "alpha", HIGH_CONTRAST_PNG).await;
    wait_processed().await;

    let (_, body) = send(
        &app,
        query_request(Some(HIGH_CONTRAST_PNG), &[("include_target_data", "none")]),
    )
    .await;
    let results = body["results"].as_array().unwrap();
    assert_eq!(results.len(), 1);
    assert!(results[0].get("target_data").is_none());
}

#[tokio::test]
async fn query_rejects_out_of_range_max_num_results() {
    let app = app();
    let (status, body) = send(
        &app,
        query_request(Some(HIGH_CONTRAST_PNG), &[("max_num_results", "51")]),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["result_code"], "Fail");
    assert_hex_id(&body["query_id"]);
}

#[tokio::test]
async fn query_without_an_image_field_fails() {
    let app = app();
    let (status, body) = send(&app, query_request(None, &[])).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["result_code"], "Fail");
}

#[tokio::test]
async fn query_with_an_undecodable_image_is_a_bad_image() {
    let app = app();
    let (status, body) = send(&app, query_request(Some(b"not an image"), &[])).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["result_code"], "BadImage");
}

#[tokio::test]
async fn query_rejects_server_credentials() {
    let app = app();
    let body = query_multipart(Some(HIGH_CONTRAST_PNG), &[]);
    let date = rfc_1123_date(Utc::now());
    let auth = authorization_header(
        SERVER_ACCESS,
        SERVER_SECRET,
        "POST",
        &body,
        "multipart/form-data",
        &date,
        "/v1/query",
    );
    let request = Request::builder()
        .method("POST")
        .uri("/v1/query")
        .header(header::AUTHORIZATION, auth)
        .header(header::DATE, date)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={QUERY_BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap();

    let (status, response) = send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(response["result_code"], "Fail");
}

#[tokio::test]
async fn query_tolerates_more_clock_skew_than_the_target_api() {
    let app = app();
    add_target(&app, "alpha", HIGH_CONTRAST_PNG).await;
    wait_processed().await;

    let body = query_multipart(Some(HIGH_CONTRAST_PNG), &[]);
    let date = rfc_1123_date(Utc::now() - ChronoDuration::minutes(30));
    let auth = authorization_header(
        CLIENT_ACCESS,
        CLIENT_SECRET,
        "POST",
        &body,
        "multipart/form-data",
        &date,
        "/v1/query",
    );
    let request = Request::builder()
        .method("POST")
        .uri("/v1/query")
        .header(header::AUTHORIZATION, auth)
        .header(header::DATE, date)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={QUERY_BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap();

    let (status, response) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["result_code"], "Success");
}
