// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Auth cookie attribute tests.
//!
//! These tests verify the login nonce cookie and that cookie removal
//! attributes on logout match the creation attributes for localhost and
//! production-style frontends.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    response::Response,
};
use tower::ServiceExt;

mod common;

fn set_cookie_headers(response: &Response) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|value| value.to_str().unwrap().to_string())
        .collect()
}

fn find_cookie(headers: &[String], name: &str) -> String {
    headers
        .iter()
        .find(|value| value.starts_with(&format!("{name}=")))
        .cloned()
        .unwrap_or_else(|| panic!("missing Set-Cookie header for {name}: {headers:?}"))
}

fn logout_request(method: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri("/auth/logout")
        .header(header::COOKIE, "ga_session=test")
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn test_login_redirects_to_google_with_nonce_cookie() {
    let (app, _) = common::create_test_app_with_frontend_url("http://localhost:3000");

    let response = app
        .oneshot(
            Request::builder()
                .uri("/auth/login")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FOUND);

    let location = common::location(&response);
    assert!(location.starts_with("https://accounts.google.com/o/oauth2/v2/auth?"));
    assert!(location.contains("access_type=offline"));
    assert!(location.contains("prompt=consent"));
    assert!(location.contains("analytics.readonly"));
    assert!(location.contains("state="));
    assert!(location.contains(&urlencoding::encode(
        "http://localhost:8080/auth/callback"
    ).into_owned()));

    let set_cookies = set_cookie_headers(&response);
    let nonce_cookie = find_cookie(&set_cookies, "ga_oauth_nonce");
    assert!(nonce_cookie.contains("Path=/auth"));
    assert!(nonce_cookie.contains("HttpOnly"));
    assert!(nonce_cookie.contains("SameSite=Lax"));
    assert!(nonce_cookie.contains("Max-Age=600"));
    assert!(!nonce_cookie.contains("Secure"));
}

#[tokio::test]
async fn test_logout_cookie_removal_localhost_attributes() {
    let (app, _) = common::create_test_app_with_frontend_url("http://localhost:3000");

    let response = app.oneshot(logout_request("POST")).await.unwrap();

    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let set_cookies = set_cookie_headers(&response);
    let session_cookie = find_cookie(&set_cookies, "ga_session");

    assert!(session_cookie.contains("Path=/"));
    assert!(session_cookie.contains("HttpOnly"));
    assert!(session_cookie.contains("SameSite=Lax"));
    assert!(session_cookie.contains("Max-Age=0"));
    assert!(!session_cookie.contains("Secure"));
    assert!(!session_cookie.contains("Domain="));
}

#[tokio::test]
async fn test_logout_cookie_removal_production_attributes() {
    let (app, _) = common::create_test_app_with_frontend_url("https://ga.example.com");

    let response = app.oneshot(logout_request("POST")).await.unwrap();

    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let set_cookies = set_cookie_headers(&response);
    let session_cookie = find_cookie(&set_cookies, "ga_session");

    assert!(session_cookie.contains("Path=/"));
    assert!(session_cookie.contains("HttpOnly"));
    assert!(session_cookie.contains("Max-Age=0"));
    assert!(session_cookie.contains("Secure"));
}

#[tokio::test]
async fn test_logout_navigation_redirects_to_login() {
    let (app, _) = common::create_test_app_with_frontend_url("http://localhost:3000");

    let response = app.oneshot(logout_request("GET")).await.unwrap();

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(common::location(&response), "http://localhost:3000/login");

    let set_cookies = set_cookie_headers(&response);
    let session_cookie = find_cookie(&set_cookies, "ga_session");
    assert!(session_cookie.contains("Max-Age=0"));
}
