//! End-to-end tests of the HTTP surface against an in-memory database.

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use booking_system::{auth::TokenKeys, db, router, schema, AppState};
use chrono::Duration;
use diesel::prelude::*;
use serde_json::{json, Value};
use tower::ServiceExt;

struct TestApp {
    app: Router,
    state: AppState,
}

impl TestApp {
    /// SQLite gives every `:memory:` connection its own database, so the
    /// pool is capped at one connection.
    async fn new() -> Self {
        Self::with_database(":memory:", 1).await
    }

    async fn with_database(database_url: &str, max_size: usize) -> Self {
        let pool = db::build_pool(database_url, max_size).expect("pool");
        db::run_migrations(&pool).await.expect("migrations");
        let state = AppState::new(pool, TokenKeys::new(b"test-signing-key", Duration::hours(1)));
        Self {
            app: router(state.clone()),
            state,
        }
    }

    async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Value,
    ) -> (StatusCode, Value) {
        let mut request = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            request = request.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = request.body(Body::from(body.to_string())).unwrap();

        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, token, body).await
    }

    /// Registers an account with `role` and returns its id and a fresh token.
    async fn account(&self, email: &str, role: &str) -> (i64, String) {
        let (status, body) = self
            .post(
                "/register",
                None,
                json!({
                    "name": "Test User",
                    "email": email,
                    "password": "correct horse",
                    "phone_number": "0800",
                    "role": role
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        let id = body["id"].as_i64().unwrap();

        let (status, body) = self
            .post(
                "/login",
                None,
                json!({ "email": email, "password": "correct horse" }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        (id, body["token"].as_str().unwrap().to_owned())
    }

    /// Adds a property with rooms at the given nightly prices; returns room ids.
    async fn rooms(&self, token: &str, prices: &[f64]) -> Vec<i64> {
        let (status, body) = self
            .post(
                "/add_property",
                Some(token),
                json!({
                    "name": "Lagoon Hotel",
                    "address": "Jl. Danau 3",
                    "description": "by the water",
                    "contact_number": "0361"
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        let property_id = body["id"].as_i64().unwrap();

        let mut ids = Vec::new();
        for (index, price) in prices.iter().enumerate() {
            let (status, body) = self
                .post(
                    "/add_room",
                    Some(token),
                    json!({
                        "property_id": property_id,
                        "room_name": format!("R{index}"),
                        "room_type": "deluxe",
                        "price_per_night": price,
                        "status": "available"
                    }),
                )
                .await;
            assert_eq!(status, StatusCode::CREATED, "{body}");
            ids.push(body["id"].as_i64().unwrap());
        }
        ids
    }

    async fn count_rows(&self) -> (i64, i64) {
        self.state
            .with_conn(|conn| {
                let bookings: i64 = schema::bookings::table.count().get_result(conn)?;
                let payments: i64 = schema::payments::table.count().get_result(conn)?;
                Ok((bookings, payments))
            })
            .await
            .unwrap()
    }
}

#[tokio::test]
async fn registration_stores_a_hash_instead_of_the_password() {
    let app = TestApp::new().await;
    app.account("ayu@example.com", "customer").await;

    let stored: String = app
        .state
        .with_conn(|conn| {
            Ok(schema::users::table
                .filter(schema::users::email.eq("ayu@example.com"))
                .select(schema::users::password_hash)
                .first::<String>(conn)?)
        })
        .await
        .unwrap();
    assert_ne!(stored, "correct horse");
    assert!(stored.starts_with("$argon2"));
}

#[tokio::test]
async fn registration_requires_name_email_and_password() {
    let app = TestApp::new().await;
    let complete = json!({
        "name": "Ayu",
        "email": "ayu@example.com",
        "password": "pw",
        "role": "customer"
    });

    for field in ["name", "email", "password"] {
        let mut body = complete.clone();
        body[field] = json!("");
        let (status, body) = app.post("/register", None, body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{field}");
        assert_eq!(body["error"], "name, email and password are required");
    }

    let users: i64 = app
        .state
        .with_conn(|conn| Ok(schema::users::table.count().get_result(conn)?))
        .await
        .unwrap();
    assert_eq!(users, 0);
}

#[tokio::test]
async fn duplicate_email_is_a_storage_error() {
    let app = TestApp::new().await;
    app.account("ayu@example.com", "customer").await;

    let (status, body) = app
        .post(
            "/register",
            None,
            json!({
                "name": "Again",
                "email": "ayu@example.com",
                "password": "x",
                "role": "customer"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"]
        .as_str()
        .unwrap()
        .starts_with("Error registering user"));
}

#[tokio::test]
async fn unknown_role_is_a_bad_request() {
    let app = TestApp::new().await;
    let (status, body) = app
        .post(
            "/register",
            None,
            json!({ "name": "Root", "email": "root@example.com", "password": "x", "role": "root" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid request body");
}

#[tokio::test]
async fn login_failures_are_indistinguishable() {
    let app = TestApp::new().await;
    app.account("ayu@example.com", "customer").await;

    let (wrong_password, first) = app
        .post(
            "/login",
            None,
            json!({ "email": "ayu@example.com", "password": "nope" }),
        )
        .await;
    let (unknown_email, second) = app
        .post(
            "/login",
            None,
            json!({ "email": "ghost@example.com", "password": "nope" }),
        )
        .await;

    assert_eq!(wrong_password, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_email, StatusCode::UNAUTHORIZED);
    assert_eq!(first, second);
    assert_eq!(first["error"], "Invalid email or password");
}

#[tokio::test]
async fn login_greets_the_user_by_role() {
    let app = TestApp::new().await;
    app.account("staff@example.com", "staff").await;

    let (_, body) = app
        .post(
            "/login",
            None,
            json!({ "email": "staff@example.com", "password": "correct horse" }),
        )
        .await;
    assert_eq!(
        body["message"],
        "Login successful. Welcome, Test User (Role: staff)"
    );
}

#[tokio::test]
async fn tokens_are_admitted_only_on_routes_allowing_the_role() {
    let app = TestApp::new().await;
    let (_, admin) = app.account("admin@example.com", "admin").await;
    let (_, customer) = app.account("guest@example.com", "customer").await;

    let property = json!({ "name": "P", "address": "A" });
    let (status, _) = app.post("/add_property", Some(&admin), property.clone()).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, body) = app.post("/add_property", Some(&customer), property).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Forbidden: Insufficient role");

    let (status, _) = app.post("/search_rooms", Some(&customer), json!({})).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app.post("/search_rooms", Some(&admin), json!({})).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn gate_echoes_the_caller_email() {
    let app = TestApp::new().await;
    let (_, customer) = app.account("guest@example.com", "customer").await;

    let request = Request::builder()
        .method(Method::POST)
        .uri("/search_rooms")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::AUTHORIZATION, format!("Bearer {customer}"))
        .body(Body::from("{}"))
        .unwrap();
    let response = app.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.headers()["x-user-email"], "guest@example.com");
}

#[tokio::test]
async fn missing_or_bad_tokens_are_unauthorized() {
    let app = TestApp::new().await;

    let (status, body) = app.post("/booking", None, json!({})).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Unauthorized: Missing token");

    let (status, _) = app.post("/booking", Some("not-a-jwt"), json!({})).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let forged = TokenKeys::new(b"someone-else", Duration::hours(1))
        .issue("guest@example.com")
        .unwrap();
    let (status, _) = app.post("/search_rooms", Some(&forged), json!({})).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn token_for_a_deleted_account_is_unauthorized() {
    let app = TestApp::new().await;
    let (_, customer) = app.account("gone@example.com", "customer").await;
    app.state
        .with_conn(|conn| {
            diesel::delete(schema::users::table).execute(conn)?;
            Ok(())
        })
        .await
        .unwrap();

    let (status, body) = app.post("/search_rooms", Some(&customer), json!({})).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "user not found");
}

#[tokio::test]
async fn wrong_method_is_rejected() {
    let app = TestApp::new().await;
    let (status, body) = app.send(Method::GET, "/register", None, json!({})).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body["error"], "Invalid request method");
}

#[tokio::test]
async fn search_rejects_an_inverted_price_range() {
    let app = TestApp::new().await;
    let (_, customer) = app.account("guest@example.com", "customer").await;

    let (status, _) = app
        .post(
            "/search_rooms",
            Some(&customer),
            json!({ "min_price": 500.0, "max_price": 100.0 }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn search_reports_no_matches_with_a_message() {
    let app = TestApp::new().await;
    let (_, admin) = app.account("admin@example.com", "admin").await;
    let (_, customer) = app.account("guest@example.com", "customer").await;
    app.rooms(&admin, &[120.0]).await;

    let (status, body) = app
        .post("/search_rooms", Some(&customer), json!({ "room_type": "penthouse" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "message": "No rooms found" }));

    let (status, body) = app
        .post("/search_rooms", Some(&customer), json!({ "property_name": "lagoon" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["property_name"], "Lagoon Hotel");
}

#[tokio::test]
async fn add_room_rejects_bad_property_ids_and_negative_prices() {
    let app = TestApp::new().await;
    let (_, staff) = app.account("staff@example.com", "staff").await;
    let (_, body) = app
        .post("/add_property", Some(&staff), json!({ "name": "P", "address": "A" }))
        .await;
    let existing = body["id"].as_i64().unwrap();

    for (property_id, price) in [(0, 80.0), (-4, 80.0), (existing, -0.5)] {
        let (status, body) = app
            .post(
                "/add_room",
                Some(&staff),
                json!({
                    "property_id": property_id,
                    "room_name": "R1",
                    "room_type": "single",
                    "price_per_night": price
                }),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{property_id} {price}: {body}");
    }

    let rooms: i64 = app
        .state
        .with_conn(|conn| Ok(schema::rooms::table.count().get_result(conn)?))
        .await
        .unwrap();
    assert_eq!(rooms, 0);
}

#[tokio::test]
async fn add_room_without_a_status_stores_available() {
    let app = TestApp::new().await;
    let (_, staff) = app.account("staff@example.com", "staff").await;
    let (_, body) = app
        .post("/add_property", Some(&staff), json!({ "name": "P", "address": "A" }))
        .await;
    let property_id = body["id"].as_i64().unwrap();

    let (status, body) = app
        .post(
            "/add_room",
            Some(&staff),
            json!({
                "property_id": property_id,
                "room_name": "R1",
                "room_type": "single",
                "price_per_night": 80.0
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let room_id = body["id"].as_i64().unwrap() as i32;

    let stored: String = app
        .state
        .with_conn(move |conn| {
            Ok(schema::rooms::table
                .find(room_id)
                .select(schema::rooms::status)
                .first::<String>(conn)?)
        })
        .await
        .unwrap();
    assert_eq!(stored, "available");
}

#[tokio::test]
async fn room_status_updates_and_unknown_rooms() {
    let app = TestApp::new().await;
    let (_, staff) = app.account("staff@example.com", "staff").await;
    let rooms = app.rooms(&staff, &[90.0]).await;

    let (status, _) = app
        .send(
            Method::PUT,
            "/update_room_status",
            Some(&staff),
            json!({ "room_id": rooms[0], "status": "under_maintenance" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .send(
            Method::PUT,
            "/update_room_status",
            Some(&staff),
            json!({ "room_id": 999, "status": "booked" }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .post(
            "/update_room_status",
            Some(&staff),
            json!({ "room_id": rooms[0], "status": "booked" }),
        )
        .await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn booking_prices_every_line_and_records_payments() {
    let app = TestApp::new().await;
    let (_, admin) = app.account("admin@example.com", "admin").await;
    let (customer_id, customer) = app.account("guest@example.com", "customer").await;
    let rooms = app.rooms(&admin, &[100.0, 50.0]).await;

    let (status, body) = app
        .post(
            "/booking",
            Some(&customer),
            json!({
                "customer_id": customer_id,
                "check_in_date": "2024-08-10",
                "check_out_date": "2024-08-13",
                "booking_details": [
                    { "room_id": rooms[0], "quantity": 2 },
                    { "room_id": rooms[1], "quantity": 1 }
                ],
                "payment_details": { "payment_method": "bank_transfer", "total_amount": 750.0 }
            }),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["total_price"], 750.0);
    assert_eq!(body["booking_ids"].as_array().unwrap().len(), 2);
    assert_eq!(app.count_rows().await, (2, 2));
}

#[tokio::test]
async fn booking_an_unknown_room_writes_nothing() {
    let app = TestApp::new().await;
    let (_, admin) = app.account("admin@example.com", "admin").await;
    let (customer_id, customer) = app.account("guest@example.com", "customer").await;
    let rooms = app.rooms(&admin, &[100.0]).await;

    let (status, body) = app
        .post(
            "/booking",
            Some(&customer),
            json!({
                "customer_id": customer_id,
                "check_in_date": "2024-08-10",
                "check_out_date": "2024-08-11",
                "booking_details": [
                    { "room_id": rooms[0], "quantity": 1 },
                    { "room_id": 4242, "quantity": 1 }
                ],
                "payment_details": { "payment_method": "cash", "total_amount": 100.0 }
            }),
        )
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Room with id 4242 not found");
    assert_eq!(app.count_rows().await, (0, 0));
}

#[tokio::test]
async fn booking_with_reversed_dates_is_a_bad_request() {
    let app = TestApp::new().await;
    let (_, admin) = app.account("admin@example.com", "admin").await;
    let (customer_id, customer) = app.account("guest@example.com", "customer").await;
    let rooms = app.rooms(&admin, &[100.0]).await;

    let (status, _) = app
        .post(
            "/booking",
            Some(&customer),
            json!({
                "customer_id": customer_id,
                "check_in_date": "2024-08-11",
                "check_out_date": "2024-08-10",
                "booking_details": [{ "room_id": rooms[0], "quantity": 1 }],
                "payment_details": { "payment_method": "cash", "total_amount": 100.0 }
            }),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(app.count_rows().await, (0, 0));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn concurrent_writes_against_a_file_database_all_succeed() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bookings.db");
    let app = TestApp::with_database(path.to_str().unwrap(), 8).await;
    let (_, admin) = app.account("admin@example.com", "admin").await;
    let (customer_id, customer) = app.account("guest@example.com", "customer").await;
    let rooms = app.rooms(&admin, &[100.0]).await;
    let app = std::sync::Arc::new(app);

    let mut tasks = Vec::new();
    for n in 0..32 {
        let app = app.clone();
        let customer = customer.clone();
        let room_id = rooms[0];
        tasks.push(tokio::spawn(async move {
            let (registered, _) = app
                .post(
                    "/register",
                    None,
                    json!({
                        "name": "Guest",
                        "email": format!("guest{n}@example.com"),
                        "password": "pw",
                        "role": "customer"
                    }),
                )
                .await;
            let (booked, _) = app
                .post(
                    "/booking",
                    Some(&customer),
                    json!({
                        "customer_id": customer_id,
                        "check_in_date": "2024-08-10",
                        "check_out_date": "2024-08-11",
                        "booking_details": [{ "room_id": room_id, "quantity": 1 }],
                        "payment_details": { "payment_method": "cash", "total_amount": 100.0 }
                    }),
                )
                .await;
            (registered, booked)
        }));
    }

    for task in tasks {
        let (registered, booked) = task.await.unwrap();
        assert_eq!(registered, StatusCode::CREATED);
        assert_eq!(booked, StatusCode::CREATED);
    }
    assert_eq!(app.count_rows().await, (32, 32));
}
