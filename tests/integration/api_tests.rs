//! API integration tests against a running server
//!
//! Expects an administrator created with
//! `campushive-cli create-admin -u admin -e admin@example.edu -p admin-password`.

use reqwest::{Client, StatusCode};
use serde_json::{json, Value};

const BASE_URL: &str = "http://localhost:8080/api/v1";

fn admin_password() -> String {
    std::env::var("CAMPUSHIVE_ADMIN_PASSWORD").unwrap_or_else(|_| "admin-password".to_string())
}

fn unique(prefix: &str) -> String {
    format!("{}{}", prefix, uuid::Uuid::new_v4().simple())
}

/// Client holding the session cookie of a fresh login
async fn login_client(username: &str, password: &str) -> Client {
    let client = Client::builder()
        .cookie_store(true)
        .build()
        .expect("Failed to build client");

    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({ "username": username, "password": password }))
        .send()
        .await
        .expect("Failed to send login request");
    assert_eq!(response.status(), StatusCode::OK, "login as {}", username);

    client
}

async fn admin_client() -> Client {
    login_client("admin", &admin_password()).await
}

/// Create a user with the given role and return (id, username)
async fn create_user(admin: &Client, role: &str) -> (i64, String) {
    let username = unique(role);
    let response = admin
        .post(format!("{}/users", BASE_URL))
        .json(&json!({
            "username": username,
            "email": format!("{}@example.edu", username),
            "password": "password123",
            "first_name": "Test",
            "last_name": role,
            "role": role
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::CREATED);

    let body: Value = response.json().await.expect("Failed to parse response");
    (body["id"].as_i64().expect("No id"), username)
}

#[tokio::test]
#[ignore] // Run with: cargo test -- --ignored
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
async fn test_signup_login_and_logout() {
    let client = Client::builder().cookie_store(true).build().unwrap();
    let username = unique("student");

    let response = client
        .post(format!("{}/auth/signup", BASE_URL))
        .json(&json!({
            "username": username,
            "email": format!("{}@example.edu", username),
            "password": "password123"
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::CREATED);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["user"]["role"], "student");
    assert!(body["user"].get("password").is_none());

    let me: Value = client
        .get(format!("{}/auth/me", BASE_URL))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(me["user"]["username"], username.as_str());

    let response = client
        .post(format!("{}/auth/logout", BASE_URL))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = client.get(format!("{}/auth/me", BASE_URL)).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore]
async fn test_login_invalid_credentials() {
    let client = Client::new();

    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({ "username": "admin", "password": "wrong-password" }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore]
async fn test_students_cannot_manage_users() {
    let admin = admin_client().await;
    let (_, username) = create_user(&admin, "student").await;
    let student = login_client(&username, "password123").await;

    let response = student.get(format!("{}/users", BASE_URL)).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
#[ignore]
async fn test_course_enrollment_and_grading() {
    let admin = admin_client().await;
    let (_, teacher_name) = create_user(&admin, "teacher").await;
    let (student_id, student_name) = create_user(&admin, "student").await;
    let teacher = login_client(&teacher_name, "password123").await;
    let student = login_client(&student_name, "password123").await;

    let code = unique("C").chars().take(12).collect::<String>();
    let response = teacher
        .post(format!("{}/courses", BASE_URL))
        .json(&json!({ "code": code, "title": "Databases", "credits": 3 }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let course: Value = response.json().await.unwrap();
    let course_id = course["id"].as_i64().unwrap();

    let response = student
        .post(format!("{}/courses/{}/enroll", BASE_URL, course_id))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let enrollment: Value = response.json().await.unwrap();
    assert_eq!(enrollment["student_id"].as_i64(), Some(student_id));

    // Enrolling twice is a conflict
    let response = student
        .post(format!("{}/courses/{}/enroll", BASE_URL, course_id))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = teacher
        .put(format!("{}/courses/{}/grades", BASE_URL, course_id))
        .json(&json!({ "grades": [{ "enrollment_id": enrollment["id"], "grade": "A" }] }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let roster: Value = response.json().await.unwrap();
    assert_eq!(roster[0]["grade"], "A");
}

/// Create equipment with `quantity` units and return its id
async fn create_equipment(admin: &Client, quantity: i32) -> i64 {
    let response = admin
        .post(format!("{}/equipment", BASE_URL))
        .json(&json!({
            "name": "Oscilloscope",
            "identifier": unique("OSC-"),
            "quantity_total": quantity
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let equipment: Value = response.json().await.unwrap();
    equipment["id"].as_i64().expect("No id")
}

/// (status, quantity_available) of an equipment record
async fn equipment_state(client: &Client, id: i64) -> (String, i64) {
    let detail: Value = client
        .get(format!("{}/equipment/{}", BASE_URL, id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    (
        detail["equipment"]["status"].as_str().unwrap_or_default().to_string(),
        detail["equipment"]["quantity_available"].as_i64().unwrap_or(-1),
    )
}

async fn update_repair(admin: &Client, id: &Value, body: Value) -> Value {
    let response = admin
        .put(format!("{}/repair-requests/{}", BASE_URL, id))
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    response.json().await.unwrap()
}

#[tokio::test]
#[ignore]
async fn test_borrow_and_return_equipment() {
    let admin = admin_client().await;
    let (_, student_name) = create_user(&admin, "student").await;
    let student = login_client(&student_name, "password123").await;

    let response = admin
        .post(format!("{}/equipment", BASE_URL))
        .json(&json!({
            "name": "Projector",
            "identifier": unique("PRJ-"),
            "quantity_total": 1
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let equipment: Value = response.json().await.unwrap();
    let equipment_id = equipment["id"].as_i64().unwrap();

    let response = student
        .post(format!("{}/equipment/{}/borrow", BASE_URL, equipment_id))
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let borrowing: Value = response.json().await.unwrap();

    // The only unit is out
    let response = student
        .post(format!("{}/equipment/{}/borrow", BASE_URL, equipment_id))
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let detail: Value = admin
        .get(format!("{}/equipment/{}", BASE_URL, equipment_id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(detail["equipment"]["status"], "borrowed");
    assert_eq!(detail["equipment"]["quantity_available"], 0);

    let response = student
        .post(format!("{}/borrowings/{}/return", BASE_URL, borrowing["id"]))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let detail: Value = admin
        .get(format!("{}/equipment/{}", BASE_URL, equipment_id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(detail["equipment"]["status"], "available");
    assert_eq!(detail["equipment"]["quantity_available"], 1);
}

#[tokio::test]
#[ignore]
async fn test_return_keeps_borrowed_while_other_loans_outstanding() {
    let admin = admin_client().await;
    let (_, student_name) = create_user(&admin, "student").await;
    let student = login_client(&student_name, "password123").await;
    let equipment_id = create_equipment(&admin, 2).await;

    let mut borrowings = Vec::new();
    for _ in 0..2 {
        let response = student
            .post(format!("{}/equipment/{}/borrow", BASE_URL, equipment_id))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let borrowing: Value = response.json().await.unwrap();
        borrowings.push(borrowing["id"].clone());
    }
    assert_eq!(equipment_state(&admin, equipment_id).await, ("borrowed".to_string(), 0));

    let response = student
        .post(format!("{}/borrowings/{}/return", BASE_URL, borrowings[0]))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(equipment_state(&admin, equipment_id).await, ("borrowed".to_string(), 1));

    // Returning twice is a conflict
    let response = student
        .post(format!("{}/borrowings/{}/return", BASE_URL, borrowings[0]))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = student
        .post(format!("{}/borrowings/{}/return", BASE_URL, borrowings[1]))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(equipment_state(&admin, equipment_id).await, ("available".to_string(), 2));
}

#[tokio::test]
#[ignore]
async fn test_repair_request_lifecycle() {
    let admin = admin_client().await;
    let (_, student_name) = create_user(&admin, "student").await;
    let student = login_client(&student_name, "password123").await;
    let equipment_id = create_equipment(&admin, 1).await;

    let mut repairs = Vec::new();
    for description in ["Screen flickers", "Power button stuck"] {
        let response = student
            .post(format!("{}/equipment/{}/report-issue", BASE_URL, equipment_id))
            .json(&json!({ "description": description }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let repair: Value = response.json().await.unwrap();
        assert_eq!(repair["status"], "pending");
        repairs.push(repair["id"].clone());
    }
    assert_eq!(equipment_state(&admin, equipment_id).await.0, "under_repair");

    // Out of service while a request is open
    let response = student
        .post(format!("{}/equipment/{}/borrow", BASE_URL, equipment_id))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // One of two open requests resolved
    let first = update_repair(&admin, &repairs[0], json!({ "status": "resolved" })).await;
    assert!(first["resolved_at"].is_string());
    assert_eq!(equipment_state(&admin, equipment_id).await.0, "under_repair");

    // The last one closed
    update_repair(
        &admin,
        &repairs[1],
        json!({ "status": "closed", "resolution_notes": "Replaced the switch" }),
    )
    .await;
    assert_eq!(equipment_state(&admin, equipment_id).await.0, "available");

    // Reopening clears the resolution time
    let reopened = update_repair(&admin, &repairs[0], json!({ "status": "in_progress" })).await;
    assert_eq!(reopened["status"], "in_progress");
    assert!(reopened["resolved_at"].is_null());
    assert_eq!(equipment_state(&admin, equipment_id).await.0, "under_repair");

    // Students cannot manage repair requests
    let response = student
        .put(format!("{}/repair-requests/{}", BASE_URL, repairs[0]))
        .json(&json!({ "status": "resolved" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
#[ignore]
async fn test_booking_period_is_validated() {
    let admin = admin_client().await;

    let response = admin
        .post(format!("{}/venues", BASE_URL))
        .json(&json!({ "name": unique("Hall "), "capacity": 120, "has_projector": true }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let venue: Value = response.json().await.unwrap();

    let response = admin
        .post(format!("{}/bookings", BASE_URL))
        .json(&json!({
            "venue_id": venue["id"],
            "start_time": "2030-05-01T12:00:00Z",
            "end_time": "2030-05-01T10:00:00Z",
            "booked_by_name": "Drama club"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = admin
        .post(format!("{}/bookings", BASE_URL))
        .json(&json!({
            "venue_id": venue["id"],
            "start_time": "2030-05-01T10:00:00Z",
            "end_time": "2030-05-01T12:00:00Z",
            "booked_by_name": "Drama club"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let booking: Value = response.json().await.unwrap();
    assert_eq!(
        booking["booking_period_display"],
        "2030-05-01 10:00 - 2030-05-01 12:00"
    );
}

#[tokio::test]
#[ignore]
async fn test_unauthorized_access() {
    let client = Client::new();

    let response = client
        .get(format!("{}/equipment", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
