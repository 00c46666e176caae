//! Export tests against a mock Cronometer.

mod support;

use std::time::{Duration, Instant};

use chrono::NaiveDate;
use crono_core::{DateRange, ExportKind, ExportRecords, FieldValue};
use crono_cronometer::AuthorizationToken;
use crono_fetch::{keys, ErrorKind, StaticCredentials};
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{any, body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use support::*;

const BIOMETRICS_CSV: &str = "Day,Time,Metric,Unit,Amount\r\n\
                              2026-02-11,08:00 AM,Weight,lbs,212.5\r\n\
                              2026-02-09,09:00 AM,Blood Pressure,mmHg,\"120/80\"\r\n";

fn range(start: (i32, u32, u32), end: (i32, u32, u32)) -> DateRange {
    let day = |(y, m, d): (i32, u32, u32)| NaiveDate::from_ymd_opt(y, m, d).unwrap();
    DateRange::new(day(start), day(end)).unwrap()
}

#[tokio::test]
async fn test_export_data_full_flow() {
    let server = MockServer::start().await;
    mount_handshake(&server).await;

    Mock::given(method("POST"))
        .and(path("/cronometer/app"))
        .and(body_string_contains("|generateAuthorizationToken|"))
        .and(body_string_contains("|n2|1|2|3|4|4|5|6|6|7|8|-31337|3600|7|2|"))
        .and(header("cookie", "JSESSIONID=s1; anticsrf=c1; sesnonce=n2"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(format!("//OK[1,[\"{TOKEN}\"],0,7]")),
        )
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/export"))
        .and(query_param("nonce", TOKEN))
        .and(query_param("generate", "biometrics"))
        .and(query_param("start", "2026-02-09"))
        .and(query_param("end", "2026-02-11"))
        .and(header("cookie", "JSESSIONID=s1; anticsrf=c1; sesnonce=n2"))
        .respond_with(ResponseTemplate::new(200).set_body_string(BIOMETRICS_CSV))
        .expect(1)
        .mount(&server)
        .await;

    let raw = client(&server)
        .export_data(ExportKind::Biometrics, &range((2026, 2, 9), (2026, 2, 11)))
        .await
        .unwrap();

    assert_eq!(raw, BIOMETRICS_CSV);
}

#[tokio::test]
async fn test_export_records_nutrition_category() {
    let server = MockServer::start().await;
    mount_handshake(&server).await;
    mount_token_ok(&server).await;
    Mock::given(method("GET"))
        .and(path("/export"))
        .and(query_param("generate", "dailySummary"))
        .and(query_param("start", "2026-02-11"))
        .and(query_param("end", "2026-02-11"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            "Date,Energy (kcal),Protein (g),Carbs (g),Fat (g),Fiber (g)\n\
             2026-02-11,1847,168,142,58,31",
        ))
        .mount(&server)
        .await;

    let day = range((2026, 2, 11), (2026, 2, 11));
    let records = client(&server)
        .export_records(ExportKind::Nutrition, &day)
        .await
        .unwrap();

    let ExportRecords::Nutrition(rows) = records else {
        panic!("expected nutrition records");
    };
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].calories, 1847.0);
    assert_eq!(rows[0].extra.get("Fiber (g)"), Some(&FieldValue::Number(31.0)));
}

#[tokio::test]
async fn test_export_records_biometrics_parsed() {
    let server = MockServer::start().await;
    mount_handshake(&server).await;
    mount_token_ok(&server).await;
    Mock::given(method("GET"))
        .and(path("/export"))
        .respond_with(ResponseTemplate::new(200).set_body_string(BIOMETRICS_CSV))
        .mount(&server)
        .await;

    let records = client(&server)
        .export_records(ExportKind::Biometrics, &range((2026, 2, 9), (2026, 2, 11)))
        .await
        .unwrap();

    assert_eq!(records.kind(), ExportKind::Biometrics);
    assert_eq!(records.dates(), vec!["2026-02-11", "2026-02-09"]);
    let json = serde_json::to_value(&records).unwrap();
    assert_eq!(json[1]["amount"], serde_json::json!("120/80"));
    assert_eq!(json[0]["amount"], serde_json::json!(212.5));
}

#[tokio::test]
async fn test_export_follows_redirect_to_file() {
    let server = MockServer::start().await;
    mount_handshake(&server).await;
    mount_token_ok(&server).await;
    Mock::given(method("GET"))
        .and(path("/export"))
        .and(query_param("generate", "biometrics"))
        .respond_with(ResponseTemplate::new(302).insert_header("location", "/export-file"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/export-file"))
        .respond_with(ResponseTemplate::new(200).set_body_string(BIOMETRICS_CSV))
        .expect(1)
        .mount(&server)
        .await;

    let raw = client(&server)
        .export_data(ExportKind::Biometrics, &range((2026, 2, 11), (2026, 2, 11)))
        .await
        .unwrap();

    assert_eq!(raw, BIOMETRICS_CSV);
}

#[tokio::test]
async fn test_export_non_success_status() {
    let server = MockServer::start().await;
    mount_handshake(&server).await;
    mount_token_ok(&server).await;
    Mock::given(method("GET"))
        .and(path("/export"))
        .respond_with(ResponseTemplate::new(403).set_body_string("Forbidden"))
        .mount(&server)
        .await;

    let err = client(&server)
        .export_data(ExportKind::Exercises, &range((2026, 2, 1), (2026, 2, 7)))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Export);
    assert!(matches!(err, crono_fetch::FetchError::Export { status: 403 }));
}

#[tokio::test]
async fn test_token_missing_from_response() {
    let server = MockServer::start().await;
    mount_handshake(&server).await;
    Mock::given(method("POST"))
        .and(path("/cronometer/app"))
        .and(body_string_contains("|generateAuthorizationToken|"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("//EX[1,[\"java.lang.SecurityException\"],0,7]"),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/export"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let err = client(&server)
        .export_data(ExportKind::Nutrition, &range((2026, 2, 1), (2026, 2, 1)))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Protocol);
}

#[tokio::test]
async fn test_token_rotates_session_nonce() {
    let server = MockServer::start().await;
    mount_handshake(&server).await;
    Mock::given(method("POST"))
        .and(path("/cronometer/app"))
        .and(body_string_contains("|generateAuthorizationToken|"))
        .respond_with(
            ResponseTemplate::new(200)
                .append_header("set-cookie", "sesnonce=n3; Path=/")
                .set_body_string(format!("//OK[\"{TOKEN}\",0,7]")),
        )
        .mount(&server)
        .await;

    let client = client(&server);
    let mut session = client.login(USERNAME, PASSWORD).await.unwrap();
    let token = client.generate_authorization_token(&mut session).await.unwrap();

    assert_eq!(token, AuthorizationToken::new(TOKEN));
    assert_eq!(session.nonce(), "n3");
    assert_eq!(session.cookies().get("sesnonce"), Some("n3"));
}

#[tokio::test]
async fn test_missing_credentials_makes_no_requests() {
    let server = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let only_username = StaticCredentials::new().with(keys::USERNAME, USERNAME);
    let client = client_with(&server, only_username, CancellationToken::new());

    let err = client
        .export_data(ExportKind::Nutrition, &range((2026, 2, 1), (2026, 2, 1)))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::MissingCredentials);
    assert!(err.to_string().contains("cronometer-password"));
}

#[tokio::test]
async fn test_cancelled_before_start() {
    let server = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let cancel = CancellationToken::new();
    cancel.cancel();
    let client = client_with(
        &server,
        StaticCredentials::username_password(USERNAME, PASSWORD),
        cancel,
    );

    let err = client
        .export_records(ExportKind::Biometrics, &range((2026, 2, 1), (2026, 2, 1)))
        .await
        .unwrap_err();

    assert!(err.is_cancelled());
    assert_eq!(err.kind(), ErrorKind::Cancelled);
}

#[tokio::test]
async fn test_cancel_aborts_in_flight_request() {
    let server = MockServer::start().await;
    mount_handshake(&server).await;
    mount_token_ok(&server).await;
    Mock::given(method("GET"))
        .and(path("/export"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(BIOMETRICS_CSV)
                .set_delay(Duration::from_secs(10)),
        )
        .mount(&server)
        .await;

    let cancel = CancellationToken::new();
    let client = client_with(
        &server,
        StaticCredentials::username_password(USERNAME, PASSWORD),
        cancel.clone(),
    );

    let canceller = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(200)).await;
        cancel.cancel();
    });

    let started = Instant::now();
    let err = client
        .export_data(ExportKind::Biometrics, &range((2026, 2, 1), (2026, 2, 1)))
        .await
        .unwrap_err();
    canceller.await.unwrap();

    assert!(err.is_cancelled());
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn test_request_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/login/"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;

    let ctx = crono_fetch::FetchContext::builder()
        .credentials(std::sync::Arc::new(StaticCredentials::username_password(USERNAME, PASSWORD)))
        .base_url(server.uri())
        .timeout(Duration::from_millis(200))
        .build()
        .unwrap();
    let client = crono_cronometer::CronometerClient::new(ctx);

    let err = client.login(USERNAME, PASSWORD).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Timeout);
    assert!(err.is_transient());
}
