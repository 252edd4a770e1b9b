//! API integration tests against a running server and database
//!
//! Run with: cargo test --test integration -- --ignored

use std::time::{SystemTime, UNIX_EPOCH};

use reqwest::{Client, StatusCode};
use serde_json::{json, Value};

const BASE_URL: &str = "http://localhost:8080";

fn api(path: &str) -> String {
    format!("{}/api{}", BASE_URL, path)
}

/// Unique suffix so repeated runs don't collide on unique columns
fn unique() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos() as u64
        % 10_000_000_000
}

fn isbn() -> String {
    format!("978{:010}", unique())
}

/// Register a fresh user and return (email, token)
async fn register_and_login(client: &Client) -> (String, String) {
    let email = format!("user{}@example.com", unique());
    let response = client
        .post(api("/auth/register"))
        .json(&json!({
            "name": "Test User",
            "email": email,
            "password": "secret",
            "role": "LIBRARIAN"
        }))
        .send()
        .await
        .expect("Failed to send register request");
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = client
        .post(api("/auth/login"))
        .json(&json!({ "email": email, "password": "secret" }))
        .send()
        .await
        .expect("Failed to send login request");
    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse login response");
    let token = body["token"].as_str().expect("No token in response").to_string();
    (email, token)
}

async fn post(client: &Client, token: &str, path: &str, body: Value) -> (StatusCode, Value) {
    let response = client
        .post(api(path))
        .bearer_auth(token)
        .json(&body)
        .send()
        .await
        .expect("Failed to send request");
    let status = response.status();
    (status, response.json().await.unwrap_or(Value::Null))
}

async fn get(client: &Client, path: &str) -> Value {
    client
        .get(api(path))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response")
}

async fn put(client: &Client, token: &str, path: &str, body: Value) -> (StatusCode, Value) {
    let response = client
        .put(api(path))
        .bearer_auth(token)
        .json(&body)
        .send()
        .await
        .expect("Failed to send request");
    let status = response.status();
    (status, response.json().await.unwrap_or(Value::Null))
}

async fn delete(client: &Client, token: &str, path: &str) -> StatusCode {
    client
        .delete(api(path))
        .bearer_auth(token)
        .send()
        .await
        .expect("Failed to send request")
        .status()
}

/// Look up the id of a registered user by email
async fn user_id(client: &Client, token: &str, email: &str) -> Value {
    let users: Value = client
        .get(api(&format!("/usuarios/buscar/email?email={}", email)))
        .bearer_auth(token)
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    users[0]["id"].clone()
}

/// Create an author, a category and a book with the given copy count
async fn create_book(client: &Client, token: &str, copies: i32) -> Value {
    let (_, author) = post(client, token, "/autores", json!({ "name": "Machado de Assis" })).await;
    let (_, category) = post(
        client,
        token,
        "/categorias",
        json!({ "name": format!("Romance {}", unique()) }),
    )
    .await;
    let (status, book) = post(
        client,
        token,
        "/livros",
        json!({
            "title": "Dom Casmurro",
            "isbn": isbn(),
            "total_copies": copies,
            "available_copies": copies,
            "author_id": author["id"],
            "category_id": category["id"]
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    book
}

#[tokio::test]
#[ignore]
async fn test_health_check() {
    let client = Client::new();
    let response = client
        .get(format!("{}/health", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
#[ignore]
async fn test_login_invalid_credentials() {
    let client = Client::new();
    let (email, _) = register_and_login(&client).await;

    let response = client
        .post(api("/auth/login"))
        .json(&json!({ "email": email, "password": "wrong" }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = client
        .post(api("/auth/login"))
        .json(&json!({ "email": "nobody@example.com", "password": "wrong" }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore]
async fn test_duplicate_email_is_rejected() {
    let client = Client::new();
    let (email, _) = register_and_login(&client).await;

    let response = client
        .post(api("/auth/register"))
        .json(&json!({
            "name": "Other",
            "email": email.to_uppercase(),
            "password": "secret",
            "role": "USER"
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore]
async fn test_books_are_public_for_reads_only() {
    let client = Client::new();

    let response = client
        .get(api("/livros"))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    let response = client
        .post(api("/livros"))
        .json(&json!({ "title": "x" }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore]
async fn test_duplicate_isbn_and_category_name() {
    let client = Client::new();
    let (_, token) = register_and_login(&client).await;
    let book = create_book(&client, &token, 1).await;

    let (status, body) = post(
        &client,
        &token,
        "/livros",
        json!({
            "title": "Another",
            "isbn": book["isbn"],
            "total_copies": 1,
            "available_copies": 1,
            "author_id": book["author_id"],
            "category_id": book["category_id"]
        }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Duplicate");

    let category = get(&client, &format!("/categorias/{}", book["category_id"])).await;
    let name = category["name"].as_str().unwrap().to_lowercase();
    let (status, _) = post(&client, &token, "/categorias", json!({ "name": name })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore]
async fn test_loan_lifecycle() {
    let client = Client::new();
    let (email, token) = register_and_login(&client).await;
    let book = create_book(&client, &token, 1).await;
    let book_path = format!("/livros/{}", book["id"]);

    let users: Value = client
        .get(api(&format!("/usuarios/buscar/email?email={}", email)))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    let user_id = users[0]["id"].clone();

    // Checkout takes the only copy
    let (status, loan) = post(
        &client,
        &token,
        "/emprestimos",
        json!({ "user_id": user_id, "book_id": book["id"] }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(loan["status"], "ACTIVE");
    assert!(loan["actual_return_date"].is_null());
    assert_eq!(get(&client, &book_path).await["available_copies"], 0);

    // No copy left for a second loan
    let (status, body) = post(
        &client,
        &token,
        "/emprestimos",
        json!({ "user_id": user_id, "book_id": book["id"] }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "BookNotAvailable");
    assert_eq!(get(&client, &book_path).await["available_copies"], 0);

    // Return puts it back
    let response = client
        .put(api(&format!("/emprestimos/{}/devolver", loan["id"])))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());
    let returned: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(returned["status"], "RETURNED");
    assert!(returned["actual_return_date"].is_string());
    assert_eq!(get(&client, &book_path).await["available_copies"], 1);

    // Returning twice fails
    let response = client
        .put(api(&format!("/emprestimos/{}/devolver", loan["id"])))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore]
async fn test_deleting_active_loan_restores_copy() {
    let client = Client::new();
    let (email, token) = register_and_login(&client).await;
    let book = create_book(&client, &token, 2).await;
    let book_path = format!("/livros/{}", book["id"]);

    let users: Value = client
        .get(api(&format!("/usuarios/buscar/email?email={}", email)))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");

    let (_, loan) = post(
        &client,
        &token,
        "/emprestimos",
        json!({ "user_id": users[0]["id"], "book_id": book["id"] }),
    )
    .await;
    assert_eq!(get(&client, &book_path).await["available_copies"], 1);

    let response = client
        .delete(api(&format!("/emprestimos/{}", loan["id"])))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_eq!(get(&client, &book_path).await["available_copies"], 2);
}

#[tokio::test]
#[ignore]
async fn test_created_author_reads_back_unchanged() {
    let client = Client::new();
    let (_, token) = register_and_login(&client).await;

    let (status, created) = post(
        &client,
        &token,
        "/autores",
        json!({ "name": "Clarice Lispector", "biography": "Born in Chechelnyk" }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(created["id"].as_i64().unwrap() > 0);
    assert!(created["created_at"].is_string());
    assert!(created["updated_at"].is_string());

    let fetched = get(&client, &format!("/autores/{}", created["id"])).await;
    assert_eq!(fetched, created);
}

#[tokio::test]
#[ignore]
async fn test_free_form_isbn_is_kept_and_spelling_variants_collide() {
    let client = Client::new();
    let (_, token) = register_and_login(&client).await;
    let book = create_book(&client, &token, 1).await;

    let free_form = format!("ISBN-{}", unique());
    let (status, other) = post(
        &client,
        &token,
        "/livros",
        json!({
            "title": "Memorias Postumas",
            "isbn": free_form,
            "total_copies": 1,
            "available_copies": 1,
            "author_id": book["author_id"],
            "category_id": book["category_id"]
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(get(&client, &format!("/livros/{}", other["id"])).await["isbn"], free_form);

    let plain = book["isbn"].as_str().unwrap();
    let hyphenated = format!("{}-{}-{}", &plain[..3], &plain[3..5], &plain[5..]);
    let (status, body) = post(
        &client,
        &token,
        "/livros",
        json!({
            "title": "Dom Casmurro (reprint)",
            "isbn": hyphenated,
            "total_copies": 1,
            "available_copies": 1,
            "author_id": book["author_id"],
            "category_id": book["category_id"]
        }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 6);
}

#[tokio::test]
#[ignore]
async fn test_category_rename_to_existing_name_conflicts() {
    let client = Client::new();
    let (_, token) = register_and_login(&client).await;

    let first = format!("Poesia {}", unique());
    let (_, _) = post(&client, &token, "/categorias", json!({ "name": first })).await;
    let (status, second) = post(
        &client,
        &token,
        "/categorias",
        json!({ "name": format!("Conto {}", unique()) }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = put(
        &client,
        &token,
        &format!("/categorias/{}", second["id"]),
        json!({ "name": first.to_uppercase() }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Duplicate");

    // Keeping its own name is not a conflict
    let (status, _) = put(
        &client,
        &token,
        &format!("/categorias/{}", second["id"]),
        json!({ "name": second["name"] }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
#[ignore]
async fn test_loan_for_unknown_user_or_book_is_not_found() {
    let client = Client::new();
    let (email, token) = register_and_login(&client).await;
    let book = create_book(&client, &token, 1).await;
    let user = user_id(&client, &token, &email).await;

    let (status, body) = post(
        &client,
        &token,
        "/emprestimos",
        json!({ "user_id": i64::MAX, "book_id": book["id"] }),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], 4);

    let (status, body) = post(
        &client,
        &token,
        "/emprestimos",
        json!({ "user_id": user, "book_id": i64::MAX }),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], 4);

    assert_eq!(
        get(&client, &format!("/livros/{}", book["id"])).await["available_copies"],
        1
    );
}

#[tokio::test]
#[ignore]
async fn test_status_update_to_returned_restores_copy() {
    let client = Client::new();
    let (email, token) = register_and_login(&client).await;
    let book = create_book(&client, &token, 1).await;
    let book_path = format!("/livros/{}", book["id"]);
    let user = user_id(&client, &token, &email).await;

    let (_, loan) = post(
        &client,
        &token,
        "/emprestimos",
        json!({ "user_id": user, "book_id": book["id"] }),
    )
    .await;
    assert_eq!(get(&client, &book_path).await["available_copies"], 0);
    let loan_path = format!("/emprestimos/{}", loan["id"]);

    let (status, updated) = put(&client, &token, &loan_path, json!({ "status": "returned" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["status"], "RETURNED");
    assert!(updated["actual_return_date"].is_string());
    assert_eq!(get(&client, &book_path).await["available_copies"], 1);

    let (status, body) = put(&client, &token, &loan_path, json!({ "status": "ACTIVE" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "BadValue");
    assert_eq!(get(&client, &book_path).await["available_copies"], 1);
}

#[tokio::test]
#[ignore]
async fn test_deleting_user_restores_copies_of_active_loans() {
    let client = Client::new();
    let (_, token) = register_and_login(&client).await;
    let (borrower_email, _) = register_and_login(&client).await;
    let borrower = user_id(&client, &token, &borrower_email).await;
    let book = create_book(&client, &token, 3).await;
    let book_path = format!("/livros/{}", book["id"]);

    let mut loans = Vec::new();
    for _ in 0..2 {
        let (status, loan) = post(
            &client,
            &token,
            "/emprestimos",
            json!({ "user_id": borrower, "book_id": book["id"] }),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        loans.push(loan);
    }
    let (status, _) = put(
        &client,
        &token,
        &format!("/emprestimos/{}/devolver", loans[0]["id"]),
        json!({}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(get(&client, &book_path).await["available_copies"], 2);

    // Only the loan still active gives a copy back
    let user_path = format!("/usuarios/{}", borrower);
    assert_eq!(delete(&client, &token, &user_path).await, StatusCode::NO_CONTENT);
    assert_eq!(get(&client, &book_path).await["available_copies"], 3);

    assert_eq!(delete(&client, &token, &user_path).await, StatusCode::NOT_FOUND);
    assert_eq!(get(&client, &book_path).await["available_copies"], 3);
}
