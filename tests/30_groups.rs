mod common;

use anyhow::Result;
use axum::http::StatusCode;
use serde_json::json;

use common::TestApp;

#[tokio::test]
async fn create_group_with_profession() -> Result<()> {
    let app = TestApp::new().await?;
    app.seed_profession("Программист").await?;

    let (status, body) = app
        .post(
            "/api/groups/create",
            json!({
                "group_name": "python411",
                "start_date": "2024-09-01T00:00:00Z",
                "end_date": "2025-06-30T00:00:00Z",
                "profession": "Программист"
            }),
        )
        .await?;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["group_name"], "python411");
    assert_eq!(body["profession"], "Программист");
    assert_eq!(body["start_date"], "2024-09-01T00:00:00Z");
    assert_eq!(body["end_date"], "2025-06-30T00:00:00Z");
    Ok(())
}

#[tokio::test]
async fn start_date_defaults_to_now() -> Result<()> {
    let app = TestApp::new().await?;

    let (status, body) = app
        .post("/api/groups/create", json!({ "group_name": "python411" }))
        .await?;

    assert_eq!(status, StatusCode::CREATED);
    assert!(body["start_date"].is_string());
    assert_eq!(body["end_date"], json!(null));
    Ok(())
}

#[tokio::test]
async fn duplicate_group_name_conflicts() -> Result<()> {
    let app = TestApp::new().await?;
    app.seed_group("python411").await?;

    let (status, body) = app
        .post("/api/groups/create", json!({ "group_name": "python411" }))
        .await?;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Группа с таким названием уже существует");
    assert_eq!(app.count("student_groups").await?, 1);
    Ok(())
}

#[tokio::test]
async fn end_before_start_fails_validation() -> Result<()> {
    let app = TestApp::new().await?;

    let (status, body) = app
        .post(
            "/api/groups/create",
            json!({
                "group_name": "python411",
                "start_date": "2024-09-01T00:00:00Z",
                "end_date": "2024-01-01T00:00:00Z"
            }),
        )
        .await?;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["field_errors"]["end_date"].is_string());
    Ok(())
}

#[tokio::test]
async fn past_end_date_without_start_fails_validation() -> Result<()> {
    let app = TestApp::new().await?;

    let (status, body) = app
        .post(
            "/api/groups/create",
            json!({ "group_name": "python411", "end_date": "2000-01-01T00:00:00Z" }),
        )
        .await?;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert_eq!(body["field_errors"]["end_date"], "Дата окончания раньше даты начала");
    assert_eq!(app.count("student_groups").await?, 0);
    Ok(())
}

#[tokio::test]
async fn update_end_date_is_checked_against_stored_start() -> Result<()> {
    let app = TestApp::new().await?;
    let id = app.seed_group("python411").await?;
    let uri = format!("/api/group/{}/update", id);

    let (status, body) = app
        .put(&uri, json!({ "group_name": "python412", "end_date": "2020-01-01T00:00:00Z" }))
        .await?;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["field_errors"]["end_date"].is_string());

    let (_, stored) = app.get(&format!("/api/group/{}", id)).await?;
    assert_eq!(stored["group_name"], "python411");
    assert_eq!(stored["end_date"], json!(null));

    let (status, body) = app
        .put(&uri, json!({ "group_name": "python411", "end_date": "2025-06-30T00:00:00Z" }))
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["start_date"], "2024-09-01T00:00:00Z");
    assert_eq!(body["end_date"], "2025-06-30T00:00:00Z");
    Ok(())
}

#[tokio::test]
async fn unknown_profession_is_not_found() -> Result<()> {
    let app = TestApp::new().await?;

    let (status, body) = app
        .post(
            "/api/groups/create",
            json!({ "group_name": "python411", "profession": "Астронавт" }),
        )
        .await?;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Профессия не найдена");
    assert_eq!(app.count("student_groups").await?, 0);
    Ok(())
}

#[tokio::test]
async fn update_without_start_date_keeps_it() -> Result<()> {
    let app = TestApp::new().await?;
    let id = app.seed_group("python411").await?;

    let (status, body) = app
        .put(&format!("/api/group/{}/update", id), json!({ "group_name": "python412" }))
        .await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["group_name"], "python412");
    assert_eq!(body["start_date"], "2024-09-01T00:00:00Z");
    Ok(())
}

#[tokio::test]
async fn deleting_group_detaches_its_students() -> Result<()> {
    let app = TestApp::new().await?;
    let group_id = app.seed_group("python411").await?;
    let student_id = app.seed_student("Ivan", "Ivanov", Some("python411")).await?;

    let (status, body) = app.delete(&format!("/api/group/{}/delete", group_id)).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Группа успешно удалена");

    let (status, student) = app.get(&format!("/api/student/{}", student_id)).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(student["group"], json!(null));
    Ok(())
}

#[tokio::test]
async fn list_filters_by_profession_and_sorts() -> Result<()> {
    let app = TestApp::new().await?;
    app.seed_profession("Программист").await?;
    app.post(
        "/api/groups/create",
        json!({ "group_name": "rust512", "profession": "Программист" }),
    )
    .await?;
    app.post(
        "/api/groups/create",
        json!({ "group_name": "python411", "profession": "Программист" }),
    )
    .await?;
    app.seed_group("design101").await?;

    // "Программист", percent-encoded.
    let filter = "%D0%9F%D1%80%D0%BE%D0%B3%D1%80%D0%B0%D0%BC%D0%BC%D0%B8%D1%81%D1%82";
    let (status, body) = app
        .get(&format!("/api/groups?filter={}&param=group_name", filter))
        .await?;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = body["groups"]
        .as_array()
        .unwrap()
        .iter()
        .map(|g| g["group_name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["python411", "rust512"]);
    Ok(())
}
