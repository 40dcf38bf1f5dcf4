//! HttpTransport against a throwaway local HTTP server.
//!
//! Each server thread answers a fixed number of connections with canned
//! responses routed by request path, then exits.

use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::TcpListener;
use std::thread;
use std::time::Duration;
use whiskydash_core::data::{
    build_dataset, BuildOptions, FetchError, FetchOutcome, HttpTransport, NoProgress, Transport,
    WhiskyHunterClient,
};

struct Reply {
    status: &'static str,
    body: String,
}

fn reply(status: &'static str, body: &str) -> Reply {
    Reply {
        status,
        body: body.to_string(),
    }
}

/// Serve `connections` requests, routed by path. Returns the base URL.
fn serve(routes: Vec<(&'static str, Reply)>, connections: usize) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let routes: HashMap<&'static str, Reply> = routes.into_iter().collect();

    thread::spawn(move || {
        for _ in 0..connections {
            let Ok((mut stream, _)) = listener.accept() else {
                return;
            };
            let mut buf = [0u8; 8192];
            let n = stream.read(&mut buf).unwrap_or(0);
            let request = String::from_utf8_lossy(&buf[..n]);
            let path = request
                .lines()
                .next()
                .and_then(|line| line.split_whitespace().nth(1))
                .unwrap_or("/")
                .to_string();

            let (status, body) = match routes.get(path.as_str()) {
                Some(r) => (r.status, r.body.as_str()),
                None => ("404 Not Found", ""),
            };
            let response = format!(
                "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            let _ = stream.write_all(response.as_bytes());
            let _ = stream.flush();
        }
    });

    format!("http://{addr}/api")
}

fn transport() -> HttpTransport {
    HttpTransport::new(Duration::from_secs(5), "whiskydash-tests").unwrap()
}

#[test]
fn ok_response_is_parsed() {
    let base = serve(
        vec![("/api/distilleries_info/", reply("200 OK", r#"[{"slug":"ardbeg"}]"#))],
        1,
    );

    let value = transport()
        .get_json(&format!("{base}/distilleries_info/"))
        .unwrap();
    assert_eq!(value[0]["slug"], "ardbeg");
}

#[test]
fn server_error_is_http_status() {
    let base = serve(
        vec![(
            "/api/distilleries_info/",
            reply("500 Internal Server Error", r#"{"detail":"boom"}"#),
        )],
        1,
    );

    match transport().get_json(&format!("{base}/distilleries_info/")) {
        Err(FetchError::HttpStatus { status, .. }) => assert_eq!(status, 500),
        other => panic!("expected HttpStatus, got: {other:?}"),
    }
}

#[test]
fn directory_500_degrades_to_empty_table() {
    let base = serve(
        vec![(
            "/api/distilleries_info/",
            reply("500 Internal Server Error", ""),
        )],
        1,
    );
    let client = WhiskyHunterClient::new(transport(), base);

    let outcome = client.fetch_directory();
    assert!(outcome.is_failed());
    assert!(outcome.into_table().is_empty());
}

#[test]
fn blank_body_is_empty_series() {
    let base = serve(
        vec![("/api/distillery_data/brora/", reply("200 OK", ""))],
        1,
    );
    let client = WhiskyHunterClient::new(transport(), base);

    assert_eq!(client.fetch_series("brora"), FetchOutcome::Empty);
}

#[test]
fn connection_refused_is_network_error() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    match transport().get_json(&format!("http://{addr}/api/distilleries_info/")) {
        Err(FetchError::NetworkUnreachable(_)) | Err(FetchError::Timeout { .. }) => {}
        other => panic!("expected a transport error, got: {other:?}"),
    }
}

#[test]
fn end_to_end_build_over_http() {
    let directory = r#"[
        {"name":"Springbank","slug":"springbank","country":"Scotland","whiskybase_rating":"88.9","whiskybase_votes":"9000","whiskybase_whiskies":"3000"},
        {"name":"Glen Nowhere","slug":"glen-nowhere","country":"Scotland","whiskybase_rating":null},
        {"name":"Yamazaki","slug":"yamazaki","country":"Japan","whiskybase_rating":"86.1"}
    ]"#;
    let springbank = r#"[
        {"dt":"2024-01-31","winning_bid_mean":"410.5","trading_volume":"120000","lots_count":"300"},
        {"dt":"2024-02-29","winning_bid_mean":"398.0","trading_volume":"99000","lots_count":"280"}
    ]"#;

    let base = serve(
        vec![
            ("/api/distilleries_info/", reply("200 OK", directory)),
            ("/api/distillery_data/springbank/", reply("200 OK", springbank)),
            ("/api/distillery_data/yamazaki/", reply("200 OK", "[]")),
        ],
        3,
    );
    let client = WhiskyHunterClient::new(transport(), base);
    let options = BuildOptions {
        top_n: 2,
        request_delay: Duration::from_millis(5),
    };

    let build = match build_dataset(&client, &options, &NoProgress) {
        FetchOutcome::Data(build) => build,
        other => panic!("expected data, got {}", other.kind()),
    };

    assert_eq!(build.report.selected, vec!["springbank", "yamazaki"]);
    assert_eq!(build.report.empty, vec!["yamazaki"]);
    assert_eq!(build.dataset.len(), 2);
    assert_eq!(build.dataset.slugs(), vec!["springbank"]);
    assert_eq!(build.dataset.rows()[0].winning_bid_mean, Some(410.5));
    assert_eq!(build.dataset.rows()[1].lots_count, Some(280));
}
