use serde_json::{json, Value};
use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;
use std::thread;
use wildeer_admin::models::UserUpdates;
use wildeer_admin::{AdminClient, AdminError, ClientConfig, UserQuery};
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// The client is blocking, so every call runs off the async runtime.
async fn blocking<T, F>(f: F) -> T
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .expect("blocking task panicked")
}

fn client(uri: &str) -> AdminClient {
    let config = ClientConfig {
        app_url: "https://app.example.com".into(),
        ..ClientConfig::with_api_url(uri)
    };
    let mut client = AdminClient::new(&config).expect("client");
    client.set_token("test-id-token").expect("token");
    client
}

fn ok() -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({"success": true}))
}

/// update_user sends exactly one PUT with the identifying pair plus the updates
#[tokio::test(flavor = "multi_thread")]
async fn update_user_puts_merged_body_once() {
    let mock_server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path("/admin/users"))
        .and(body_json(json!({
            "userId": "U1",
            "appName": "rainforestapi",
            "userEmail": "new@email.com",
            "overageRateCentsPerThousand": null
        })))
        .respond_with(ok())
        .expect(1)
        .mount(&mock_server)
        .await;

    let uri = mock_server.uri();
    let result = blocking(move || {
        let mut updates = UserUpdates::new();
        updates.insert("userEmail".into(), json!("new@email.com"));
        updates.insert("overageRateCentsPerThousand".into(), Value::Null);
        client(&uri).update_user("U1", "rainforestapi", &updates)
    })
    .await;

    assert_eq!(result.unwrap(), json!({"success": true}));
}

#[tokio::test(flavor = "multi_thread")]
async fn block_user_sends_admin_blocked_flag() {
    let mock_server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path("/admin/users"))
        .and(body_json(json!({
            "userId": "U1",
            "appName": "serpwow",
            "isAdminBlocked": true
        })))
        .respond_with(ok())
        .expect(1)
        .mount(&mock_server)
        .await;

    let uri = mock_server.uri();
    let result = blocking(move || client(&uri).block_user("U1", "serpwow")).await;
    assert!(result.is_ok(), "{:?}", result);
}

#[tokio::test(flavor = "multi_thread")]
async fn overage_helpers_send_fixed_fields() {
    let mock_server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path("/admin/users"))
        .and(body_json(json!({
            "userId": "U2",
            "appName": "valueserp",
            "overageEnabled": true,
            "overageRateMultiplier": 2
        })))
        .respond_with(ok())
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/admin/users"))
        .and(body_json(json!({
            "userId": "U2",
            "appName": "valueserp",
            "hasPaymentProblem": false
        })))
        .respond_with(ok())
        .expect(1)
        .mount(&mock_server)
        .await;

    let uri = mock_server.uri();
    let (overage, payment) = blocking(move || {
        let client = client(&uri);
        (
            client.enable_overage("U2", "valueserp", 2),
            client.set_payment_problem("U2", "valueserp", false),
        )
    })
    .await;
    assert!(overage.is_ok(), "{:?}", overage);
    assert!(payment.is_ok(), "{:?}", payment);
}

#[tokio::test(flavor = "multi_thread")]
async fn list_users_query_string_is_comma_joined_and_sorted() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/admin/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "info": {"total_count": 0, "total_pages": 0, "current_page": 1},
            "data": []
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let uri = mock_server.uri();
    let result = blocking(move || {
        let query = UserQuery {
            page: 1,
            page_size: 25,
            app_names: Some(vec!["serpwow".into(), "valueserp".into()]),
            ..UserQuery::default()
        };
        client(&uri).list_users(&query)
    })
    .await;
    assert_eq!(result.unwrap()["info"]["current_page"], json!(1));

    let requests = mock_server.received_requests().await.unwrap();
    let query = requests[0].url.query().unwrap_or_default().to_string();
    assert!(
        query.contains("app_names=serpwow,valueserp&page=1&page_size=25"),
        "unexpected query: {}",
        query
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn search_users_passes_term_unmodified() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/admin/users"))
        .and(query_param("search_term", "old@email.com"))
        .and(query_param(
            "app_names",
            "asindataapi,backyardapi,bigboxapi,bluecartapi,countdownapi,\
             rainforestapi,redcircleapi,scaleserp,serpwow,valueserp",
        ))
        .and(query_param("sort_by", "date"))
        .and(query_param("sort_direction", "descend"))
        .and(query_param("type", "all"))
        .respond_with(ok())
        .expect(1)
        .mount(&mock_server)
        .await;

    let uri = mock_server.uri();
    let result = blocking(move || client(&uri).search_users("old@email.com", 1, 25)).await;
    assert!(result.is_ok(), "{:?}", result);
}

#[tokio::test(flavor = "multi_thread")]
async fn session_headers_are_sent() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/admin/plans"))
        .and(header("authorization", "test-id-token"))
        .and(header("app_name", "wildeerllp"))
        .and(header("origin", "https://app.example.com"))
        .and(header("referer", "https://app.example.com/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": [{"planName": "Starter", "planMonthlyCost": 15}]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let uri = mock_server.uri();
    let plans = blocking(move || client(&uri).get_plans()).await.unwrap();
    assert_eq!(plans["data"][0]["planName"], json!("Starter"));
}

#[tokio::test(flavor = "multi_thread")]
async fn ban_checks_hit_their_own_paths() {
    let mock_server = MockServer::start().await;

    for (route, key, value) in [
        ("/isemaildomainbanned", "email", "a@spam.example"),
        ("/isemailblocked", "email", "a@spam.example"),
        ("/isapikeybanned", "api_key", "KEY123"),
        ("/isipbanned", "ip", "10.0.0.1"),
    ] {
        Mock::given(method("GET"))
            .and(path(route))
            .and(query_param(key, value))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"banned": false})))
            .expect(1)
            .mount(&mock_server)
            .await;
    }

    let uri = mock_server.uri();
    let results = blocking(move || {
        let client = client(&uri);
        vec![
            client.is_email_domain_banned("a@spam.example"),
            client.is_email_blocked("a@spam.example"),
            client.is_api_key_banned("KEY123"),
            client.is_ip_banned("10.0.0.1"),
        ]
    })
    .await;

    for result in results {
        assert_eq!(result.unwrap(), json!({"banned": false}));
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn usage_flags_and_current_user_are_plain_gets() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/admin/user/usage"))
        .and(query_param("user_id", "U9"))
        .respond_with(ok())
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/admin/feature-flags"))
        .respond_with(ok())
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/user"))
        .respond_with(ok())
        .expect(1)
        .mount(&mock_server)
        .await;

    let uri = mock_server.uri();
    let results = blocking(move || {
        let client = client(&uri);
        vec![
            client.get_user_usage("U9"),
            client.get_feature_flags(),
            client.current_user(),
        ]
    })
    .await;
    assert!(results.iter().all(|r| r.is_ok()), "{:?}", results);
}

/// A non-2xx answer surfaces as an Http error and is not retried
#[tokio::test(flavor = "multi_thread")]
async fn error_status_is_surfaced_without_retry() {
    let mock_server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path("/admin/users"))
        .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let uri = mock_server.uri();
    let err = blocking(move || client(&uri).unblock_user("U1", "serpwow"))
        .await
        .unwrap_err();

    match err {
        AdminError::Http { status, body, .. } => {
            assert_eq!(status.as_u16(), 403);
            assert_eq!(body, "forbidden");
        }
        other => panic!("expected Http error, got {:?}", other),
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn server_error_is_not_retried_either() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/admin/plans"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&mock_server)
        .await;

    let uri = mock_server.uri();
    let err = blocking(move || client(&uri).get_plans()).await.unwrap_err();
    assert_eq!(err.status().map(|s| s.as_u16()), Some(503));
}

#[tokio::test(flavor = "multi_thread")]
async fn non_json_success_is_a_decode_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/user"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>login</html>"))
        .mount(&mock_server)
        .await;

    let uri = mock_server.uri();
    let err = blocking(move || client(&uri).current_user()).await.unwrap_err();
    assert!(matches!(err, AdminError::Decode { .. }), "{:?}", err);
}

#[tokio::test(flavor = "multi_thread")]
async fn post_sends_json_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/admin/notes"))
        .and(body_json(json!({"note": "hi"})))
        .respond_with(ok())
        .expect(1)
        .mount(&mock_server)
        .await;

    let uri = mock_server.uri();
    let result = blocking(move || client(&uri).post("/admin/notes", &json!({"note": "hi"}))).await;
    assert!(result.is_ok(), "{:?}", result);
}

/// A 502 whose body is cut short still reports the status
#[test]
fn truncated_error_body_keeps_status() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let uri = format!("http://{}", listener.local_addr().unwrap());

    let server = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let mut reader = BufReader::new(stream.try_clone().unwrap());
        let mut line = String::new();
        while reader.read_line(&mut line).unwrap() > 0 && line != "\r\n" {
            line.clear();
        }
        stream
            .write_all(b"HTTP/1.1 502 Bad Gateway\r\nContent-Length: 100\r\n\r\nshort")
            .unwrap();
        // Closing here leaves the declared body incomplete.
    });

    let err = client(&uri).get_plans().unwrap_err();
    server.join().unwrap();

    assert!(matches!(err, AdminError::Http { .. }), "{:?}", err);
    assert_eq!(err.status().map(|s| s.as_u16()), Some(502));
}
