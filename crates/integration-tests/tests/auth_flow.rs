//! Signup, login and Google sign-in over HTTP.

#![allow(clippy::unwrap_used)]

use pattupavadai_core::Email;
use pattupavadai_integration_tests::{GOOGLE_TOKEN_PREFIX, TestApp, TestOptions};
use pattupavadai_storefront::db::AccountStore;
use reqwest::StatusCode;
use serde_json::json;

#[tokio::test]
async fn test_signup_then_login_rotates_token() {
    let app = TestApp::spawn().await;

    let signup = app.signup("priya@example.com", "kolam-2026").await;
    let user = &signup["user"];
    assert_eq!(user["email"], "priya@example.com");
    assert_eq!(user["auth_provider"], "local");
    assert!(user.get("is_admin").is_none());
    assert!(user.get("password").is_none());
    assert_eq!(user["token"].as_str().unwrap().len(), 64);

    let (status, login) = app
        .post_json(
            "/auth/login",
            &json!({"email": "priya@example.com", "password": "kolam-2026"}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(login["user"]["shipping_address"], "12 Temple St, Madurai");
    assert_ne!(login["user"]["token"], user["token"]);

    let stored = app
        .accounts
        .find_by_email(&Email::parse("priya@example.com").unwrap())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(json!(stored.token), login["user"]["token"]);
}

#[tokio::test]
async fn test_duplicate_signup_is_rejected() {
    let app = TestApp::spawn().await;
    app.signup("priya@example.com", "first").await;

    let (status, body) = app
        .post_json(
            "/auth/signup",
            &json!({
                "email": "priya@example.com",
                "name": "Someone Else",
                "shipping_address": "Chennai",
                "contact_details": "-",
                "password": "second",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"detail": "Email already registered"}));
    assert_eq!(app.accounts.len(), 1);
}

#[tokio::test]
async fn test_login_failures_share_one_message() {
    let app = TestApp::spawn().await;
    app.signup("priya@example.com", "kolam-2026").await;

    for body in [
        json!({"email": "priya@example.com", "password": "wrong"}),
        json!({"email": "nobody@example.com", "password": "kolam-2026"}),
        json!({"email": "not-an-email", "password": "kolam-2026"}),
    ] {
        let (status, detail) = app.post_json("/auth/login", &body).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{body}");
        assert_eq!(detail, json!({"detail": "Invalid credentials"}));
    }
}

#[tokio::test]
async fn test_signup_validation() {
    let app = TestApp::spawn().await;

    let (status, _) = app
        .post_json(
            "/auth/signup",
            &json!({
                "email": "no-at-sign",
                "name": "Priya",
                "shipping_address": "Madurai",
                "contact_details": "+91",
                "password": "pw",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app
        .post_json("/auth/signup", &json!({"email": "priya@example.com"}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].as_str().is_some());
    assert!(app.accounts.is_empty());
}

#[tokio::test]
async fn test_administrator_login_is_not_persisted() {
    let app = TestApp::spawn_with(TestOptions {
        admin: Some(("owner@example.com".into(), "saree-loom-42".into())),
        ..TestOptions::default()
    })
    .await;

    let (status, body) = app
        .post_json(
            "/auth/login",
            &json!({"email": "owner@example.com", "password": "saree-loom-42"}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["is_admin"], true);
    assert!(app.accounts.is_empty());

    let (status, _) = app
        .post_json(
            "/auth/login",
            &json!({"email": "owner@example.com", "password": "guess"}),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_google_login_creates_then_reuses_account() {
    let app = TestApp::spawn().await;
    let token = format!("{GOOGLE_TOKEN_PREFIX}meena@example.com");

    let (status, first) = app.post_json("/auth/google", &json!({"token": token})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["user"]["auth_provider"], "google");
    assert_eq!(first["user"]["email"], "meena@example.com");
    assert!(first["user"]["picture"].is_string());

    let (status, second) = app
        .post_json("/auth/google", &json!({"credential": token}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(app.accounts.len(), 1);
    assert_ne!(first["user"]["token"], second["user"]["token"]);

    // Google accounts have no password to log in with
    let (status, _) = app
        .post_json(
            "/auth/login",
            &json!({"email": "meena@example.com", "password": ""}),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_google_login_rejects_bad_token() {
    let app = TestApp::spawn().await;

    let (status, body) = app
        .post_json("/auth/google", &json!({"token": "forged"}))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({"detail": "Invalid Google token"}));
    assert!(app.accounts.is_empty());
}
