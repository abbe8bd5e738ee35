mod common;

use axum::http::{Method, StatusCode};
use serde_json::json;

use common::TestApp;

#[tokio::test]
async fn test_create_get_and_list() {
    let app = TestApp::new().await;
    let token = app.normal_token().await;

    let (status, created) = app
        .json(
            Method::POST,
            "/clients",
            Some(&token),
            json!({ "name": "Ana Souza", "email": "ana@shop.test", "cpf": "529.982.247-25" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["name"], "Ana Souza");
    assert!(created.get("cpf").is_none());

    let id = created["id"].as_i64().unwrap();
    let stored = app.state.db.clients().get(id).await.unwrap();
    assert_eq!(stored.cpf, "52998224725");

    let (status, fetched) = app.get(&format!("/clients/{id}"), &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["email"], "ana@shop.test");

    app.create_client(&token, "bruno@shop.test", "11144477735").await;

    let (status, list) = app.get("/clients?name=SOUZA", &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list["clients"].as_array().unwrap().len(), 1);

    let (_, page) = app.get("/clients?limit=1&skip=1", &token).await;
    let page = page["clients"].as_array().unwrap();
    assert_eq!(page.len(), 1);
    assert_eq!(page[0]["email"], "bruno@shop.test");
}

#[tokio::test]
async fn test_invalid_cpf_rejected() {
    let app = TestApp::new().await;
    let token = app.normal_token().await;

    for cpf in ["111.111.111-11", "1234567890", "123456789012"] {
        let (status, body) = app
            .json(
                Method::POST,
                "/clients",
                Some(&token),
                json!({ "name": "Ana", "email": "ana@shop.test", "cpf": cpf }),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{cpf}");
        assert_eq!(body["detail"], "Invalid CPF");
    }
}

#[tokio::test]
async fn test_duplicates_rejected() {
    let app = TestApp::new().await;
    let token = app.normal_token().await;
    app.create_client(&token, "ana@shop.test", "52998224725").await;

    let (status, body) = app
        .json(
            Method::POST,
            "/clients",
            Some(&token),
            json!({ "name": "Other", "email": "ana@shop.test", "cpf": "11144477735" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "Email already exists");

    let (status, body) = app
        .json(
            Method::POST,
            "/clients",
            Some(&token),
            json!({ "name": "Other", "email": "other@shop.test", "cpf": "529.982.247-25" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "CPF already exists");
}

#[tokio::test]
async fn test_update_checks_other_records_only() {
    let app = TestApp::new().await;
    let token = app.normal_token().await;
    let ana = app.create_client(&token, "ana@shop.test", "52998224725").await;
    app.create_client(&token, "bruno@shop.test", "11144477735").await;

    // Same values on itself are fine
    let (status, body) = app
        .json(
            Method::PUT,
            &format!("/clients/{ana}"),
            Some(&token),
            json!({ "name": "Ana Maria", "email": "ana@shop.test", "cpf": "52998224725" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Ana Maria");

    let (status, body) = app
        .json(
            Method::PUT,
            &format!("/clients/{ana}"),
            Some(&token),
            json!({ "name": "Ana", "email": "bruno@shop.test", "cpf": "52998224725" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "Email already registered by another client");

    let (status, body) = app
        .json(
            Method::PUT,
            "/clients/999",
            Some(&token),
            json!({ "name": "Ana", "email": "x@shop.test", "cpf": "52998224725" }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "Client not found");
}

#[tokio::test]
async fn test_delete_requires_admin() {
    let app = TestApp::new().await;
    let staff = app.normal_token().await;
    let admin = app.admin_token().await;
    let id = app.create_client(&staff, "ana@shop.test", "52998224725").await;

    let (status, body) = app.delete(&format!("/clients/{id}"), &staff).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["detail"], "Not enough permission");
    assert!(app.state.db.clients().get(id).await.is_ok());

    // Forbidden comes before the existence check
    let (status, _) = app.delete("/clients/999", &staff).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app.delete(&format!("/clients/{id}"), &admin).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app.get(&format!("/clients/{id}"), &admin).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.delete(&format!("/clients/{id}"), &admin).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
