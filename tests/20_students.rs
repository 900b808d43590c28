mod common;

use anyhow::Result;
use axum::http::{Method, StatusCode};
use serde_json::json;

use common::{Credential, TestApp};

#[tokio::test]
async fn create_student_in_existing_group() -> Result<()> {
    let app = TestApp::new().await?;
    app.seed_group("python411").await?;

    let (status, body) = app
        .post(
            "/api/students/create",
            json!({ "first_name": "Ivan", "last_name": "Ivanov", "age": 20, "group": "python411" }),
        )
        .await?;

    assert_eq!(status, StatusCode::CREATED);
    let id = body["id"].as_i64().unwrap();
    assert_eq!(
        body,
        json!({
            "id": id,
            "name": "Ivan Ivanov",
            "group": "python411",
            "age": 20,
            "middle_name": null
        })
    );

    let (status, fetched) = app.get(&format!("/api/student/{}", id)).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, body);
    Ok(())
}

#[tokio::test]
async fn missing_student_is_not_found() -> Result<()> {
    let app = TestApp::new().await?;

    let (status, body) = app.get("/api/student/9999").await?;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Студент не найден");
    assert_eq!(body["code"], "NOT_FOUND");
    Ok(())
}

#[tokio::test]
async fn non_numeric_id_is_json_bad_request() -> Result<()> {
    let app = TestApp::new().await?;

    let (status, body) = app.get("/api/student/abc").await?;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "BAD_REQUEST");
    assert!(body["error"].is_string());

    let (status, body) = app
        .put("/api/student/abc/update", json!({ "first_name": "Ivan", "last_name": "Ivanov" }))
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "BAD_REQUEST");
    Ok(())
}

#[tokio::test]
async fn unknown_group_rejects_create_without_insert() -> Result<()> {
    let app = TestApp::new().await?;
    app.seed_student("Petr", "Petrov", None).await?;
    let before = app.count("students").await?;

    let (status, body) = app
        .post(
            "/api/students/create",
            json!({ "first_name": "Ivan", "last_name": "Ivanov", "group": "nowhere" }),
        )
        .await?;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Группа не найдена");
    assert_eq!(app.count("students").await?, before);
    Ok(())
}

#[tokio::test]
async fn invalid_fields_are_reported_per_field() -> Result<()> {
    let app = TestApp::new().await?;

    let (status, body) = app
        .post(
            "/api/students/create",
            json!({ "first_name": "Iv", "last_name": "Ivanov", "age": 0 }),
        )
        .await?;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert_eq!(body["error"], "Ошибка валидации");
    assert!(body["field_errors"]["first_name"].is_string());
    assert!(body["field_errors"]["age"].is_string());
    assert!(body["field_errors"].get("last_name").is_none());
    assert_eq!(app.count("students").await?, 0);
    Ok(())
}

#[tokio::test]
async fn malformed_bodies_are_bad_requests() -> Result<()> {
    let app = TestApp::new().await?;

    let (status, body) = app
        .call(Method::POST, "/api/students/create", &Credential::admin_key(), None)
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Нет данных для обработки запроса");

    let (status, body) = app.post("/api/students/create", json!({ "first_name": "Ivan" })).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_JSON");

    let (status, body) = app
        .post(
            "/api/students/create",
            json!({ "first_name": "Ivan", "last_name": "Ivanov", "age": "twenty" }),
        )
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_JSON");
    assert_eq!(app.count("students").await?, 0);
    Ok(())
}

#[tokio::test]
async fn update_replaces_every_field() -> Result<()> {
    let app = TestApp::new().await?;
    app.seed_group("python411").await?;
    app.seed_group("rust512").await?;
    let id = app.seed_student("Ivan", "Ivanov", Some("python411")).await?;

    let (status, body) = app
        .put(
            &format!("/api/student/{}/update", id),
            json!({
                "first_name": "Sergey",
                "last_name": "Sergeev",
                "middle_name": "Petrovich",
                "age": 22,
                "group": "rust512"
            }),
        )
        .await?;
    assert_eq!(status, StatusCode::OK);
    let expected = json!({
        "id": id,
        "name": "Sergey Sergeev",
        "group": "rust512",
        "age": 22,
        "middle_name": "Petrovich"
    });
    assert_eq!(body, expected);

    let (_, fetched) = app.get(&format!("/api/student/{}", id)).await?;
    assert_eq!(fetched, expected);

    // Omitted optional fields are cleared.
    let (status, body) = app
        .put(
            &format!("/api/student/{}/update", id),
            json!({ "first_name": "Sergey", "last_name": "Sergeev" }),
        )
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["group"], json!(null));
    assert_eq!(body["age"], json!(null));
    assert_eq!(body["middle_name"], json!(null));
    Ok(())
}

#[tokio::test]
async fn update_of_missing_student_is_not_found() -> Result<()> {
    let app = TestApp::new().await?;

    let (status, body) = app
        .put(
            "/api/student/42/update",
            json!({ "first_name": "Ivan", "last_name": "Ivanov" }),
        )
        .await?;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Студент не найден");
    Ok(())
}

#[tokio::test]
async fn update_to_unknown_group_leaves_row_untouched() -> Result<()> {
    let app = TestApp::new().await?;
    app.seed_group("python411").await?;
    let id = app.seed_student("Ivan", "Ivanov", Some("python411")).await?;

    let (status, _) = app
        .put(
            &format!("/api/student/{}/update", id),
            json!({ "first_name": "Sergey", "last_name": "Sergeev", "group": "nowhere" }),
        )
        .await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, fetched) = app.get(&format!("/api/student/{}", id)).await?;
    assert_eq!(fetched["name"], "Ivan Ivanov");
    assert_eq!(fetched["group"], "python411");
    Ok(())
}

#[tokio::test]
async fn delete_then_read_is_not_found() -> Result<()> {
    let app = TestApp::new().await?;
    let id = app.seed_student("Ivan", "Ivanov", None).await?;

    let (status, body) = app.delete(&format!("/api/student/{}/delete", id)).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Студент успешно удален");

    let (status, _) = app.get(&format!("/api/student/{}", id)).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.delete(&format!("/api/student/{}/delete", id)).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn list_sorts_by_whitelisted_fields() -> Result<()> {
    let app = TestApp::new().await?;
    app.seed("students", json!({ "first_name": "Anna", "last_name": "Bykova", "age": 30 }))
        .await?;
    app.seed("students", json!({ "first_name": "Oleg", "last_name": "Abramov", "age": 19 }))
        .await?;
    app.seed("students", json!({ "first_name": "Ivan", "last_name": "Vasin", "age": 25 }))
        .await?;

    let (status, body) = app.get("/api/students?param=last_name").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    let names: Vec<&str> = body["students"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Oleg Abramov", "Anna Bykova", "Ivan Vasin"]);

    let (_, body) = app.get("/api/students?param=age&order=DESC").await?;
    let ages: Vec<i64> = body["students"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["age"].as_i64().unwrap())
        .collect();
    assert_eq!(ages, vec![30, 25, 19]);

    // Anything other than desc sorts ascending.
    let (_, body) = app.get("/api/students?param=age&order=sideways").await?;
    assert_eq!(body["students"][0]["age"], 19);
    Ok(())
}

#[tokio::test]
async fn list_sorts_by_group_name() -> Result<()> {
    let app = TestApp::new().await?;
    app.seed_group("alpha111").await?;
    app.seed_group("beta222").await?;
    app.seed_student("Ivan", "Ivanov", Some("beta222")).await?;
    app.seed_student("Petr", "Petrov", Some("alpha111")).await?;
    app.seed_student("Oleg", "Olegov", None).await?;

    let (status, body) = app.get("/api/students?param=group").await?;
    assert_eq!(status, StatusCode::OK);
    let groups: Vec<Option<&str>> = body["students"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["group"].as_str())
        .collect();
    // SQLite orders NULL first when ascending.
    assert_eq!(groups, vec![None, Some("alpha111"), Some("beta222")]);

    let (_, body) = app.get("/api/students?param=group&order=desc").await?;
    assert_eq!(body["students"][0]["group"], "beta222");
    assert_eq!(body["students"][2]["group"], json!(null));
    Ok(())
}

#[tokio::test]
async fn unknown_sort_field_is_client_error() -> Result<()> {
    let app = TestApp::new().await?;

    let (status, body) = app.get("/api/students?param=password").await?;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Некорректный параметр сортировки");
    Ok(())
}

#[tokio::test]
async fn list_filters_by_group_name() -> Result<()> {
    let app = TestApp::new().await?;
    app.seed_group("python411").await?;
    app.seed_group("rust512").await?;
    app.seed_student("Ivan", "Ivanov", Some("python411")).await?;
    app.seed_student("Petr", "Petrov", Some("rust512")).await?;
    app.seed_student("Oleg", "Olegov", None).await?;

    let (status, body) = app.get("/api/students?filter=rust512").await?;
    assert_eq!(status, StatusCode::OK);
    let students = body["students"].as_array().unwrap();
    assert_eq!(students.len(), 1);
    assert_eq!(students[0]["name"], "Petr Petrov");

    let (status, body) = app.get("/api/students?filter=nowhere").await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Группа не найдена");
    Ok(())
}

#[tokio::test]
async fn non_ascii_text_is_not_escaped() -> Result<()> {
    let app = TestApp::new().await?;

    let response = {
        use axum::body::Body;
        use axum::http::Request;
        use tower::ServiceExt;

        let request = Request::builder()
            .uri("/api/student/1")
            .header("x-api-key", common::ADMIN_KEY)
            .body(Body::empty())?;
        app.router.clone().oneshot(request).await?
    };
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
    let text = String::from_utf8(bytes.to_vec())?;

    assert!(text.contains("Студент не найден"));
    Ok(())
}
