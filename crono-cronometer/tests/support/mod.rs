//! Mock Cronometer endpoints shared by the integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use crono_cronometer::CronometerClient;
use crono_fetch::{FetchContext, StaticCredentials};
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const USERNAME: &str = "me@example.com";
pub const PASSWORD: &str = "hunter2";
pub const ANTICSRF: &str = "csrf-token-1";
pub const USER_ID: i64 = -31337;
pub const TOKEN: &str = "0123456789abcdef0123456789abcdef";

pub const LOGIN_PAGE: &str = r#"<html><body><form method="post" action="/login">
<input type="hidden" name="anticsrf" value="csrf-token-1">
<input name="username"><input type="password" name="password">
</form></body></html>"#;

/// Client pointed at the mock server with stored credentials.
pub fn client(server: &MockServer) -> CronometerClient {
    client_with(
        server,
        StaticCredentials::username_password(USERNAME, PASSWORD),
        CancellationToken::new(),
    )
}

pub fn client_with(
    server: &MockServer,
    credentials: StaticCredentials,
    cancel: CancellationToken,
) -> CronometerClient {
    let ctx = FetchContext::builder()
        .credentials(Arc::new(credentials))
        .base_url(server.uri())
        .cancel_token(cancel)
        .build()
        .expect("fetch context");
    CronometerClient::new(ctx)
}

/// Step 1: login page with CSRF input and session cookies.
pub async fn mount_login_page(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/login/"))
        .respond_with(
            ResponseTemplate::new(200)
                .append_header("set-cookie", "JSESSIONID=s1; Path=/; HttpOnly")
                .append_header("set-cookie", "anticsrf=c1; Path=/")
                .set_body_string(LOGIN_PAGE),
        )
        .mount(server)
        .await;
}

/// Step 2: accepted login, redirect with `sesnonce`.
pub async fn mount_login_ok(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(
            ResponseTemplate::new(302)
                .insert_header("location", "/")
                .append_header("set-cookie", "sesnonce=n1; Path=/"),
        )
        .mount(server)
        .await;
}

/// Step 3: `authenticate` returning the account id and rotating the nonce.
pub async fn mount_authenticate_ok(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/cronometer/app"))
        .and(body_string_contains("|authenticate|"))
        .respond_with(
            ResponseTemplate::new(200)
                .append_header("set-cookie", "sesnonce=n2; Path=/")
                .set_body_string(format!("//OK[{USER_ID},1,[],0,7]")),
        )
        .mount(server)
        .await;
}

/// `generateAuthorizationToken` returning [`TOKEN`].
pub async fn mount_token_ok(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/cronometer/app"))
        .and(body_string_contains("|generateAuthorizationToken|"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(format!("//OK[1,[\"{TOKEN}\"],0,7]")),
        )
        .mount(server)
        .await;
}

/// All three handshake steps, succeeding.
pub async fn mount_handshake(server: &MockServer) {
    mount_login_page(server).await;
    mount_login_ok(server).await;
    mount_authenticate_ok(server).await;
}
