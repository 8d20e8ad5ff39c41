//! Full round trips against the live mock server.
//!
//! # Design
//! Starts the mock YOURLS server on a random port, then drives every client
//! operation through the ureq transport over real HTTP, with both verbs and
//! all three response formats. The server records every parameter set it
//! receives, so authentication can be checked on the wire.

use std::net::SocketAddr;

use mock_server::{Auth, Db, Store};
use yourls_core::hooks::{self, PageContext};
use yourls_core::{ApiError, ResponseFormat, Settings, ShortenerClient, StatsFilter};

/// Start the mock server on a background thread and return its address.
fn start_server(auth: Auth) -> (SocketAddr, Db) {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    let db = mock_server::db(
        Store::new(auth, &format!("http://{addr}"))
            .with_link("pop", "http://e.x/popular", "Popular", 40)
            .with_link("meh", "http://e.x/meh", "Meh", 2),
    );
    let server_db = db.clone();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run(listener, server_db).await
        })
        .unwrap();
    });

    (addr, db)
}

fn sent_params(db: &Db) -> Vec<Vec<(String, String)>> {
    db.blocking_read().requests.clone()
}

fn has(params: &[(String, String)], key: &str) -> bool {
    params.iter().any(|(k, _)| k == key)
}

#[test]
fn signature_lifecycle_over_get() {
    let (addr, db) = start_server(Auth::signature("s3cret"));
    let settings = Settings::new(&format!("http://{addr}/")).with_signature("s3cret");
    let client = ShortenerClient::new(&settings).unwrap();

    // Step 1: shorten in each format.
    let simple = client.shorten("http://e.x/one", "One", Some("one"), None).unwrap();
    assert_eq!(simple.url(), Some(format!("http://{addr}/one").as_str()));

    let json = client
        .shorten("http://e.x/two", "Two", Some("two"), Some(ResponseFormat::Json))
        .unwrap();
    assert_eq!(json.url(), Some(format!("http://{addr}/two").as_str()));
    assert_eq!(json.get("status"), Some("success"));

    let xml = client
        .shorten("http://e.x/three", "Three & more", None, Some(ResponseFormat::Xml))
        .unwrap();
    assert_eq!(xml.url(), Some(format!("http://{addr}/1").as_str()));
    assert_eq!(xml.get("title"), Some("Three & more"));

    // Step 2: expand by keyword and by full url.
    let long = client.expand("one", None).unwrap();
    assert_eq!(long.url(), Some("http://e.x/one"));

    let expanded = client.expand(&format!("http://{addr}/two"), Some(ResponseFormat::Json)).unwrap();
    assert_eq!(expanded.get("longurl"), Some("http://e.x/two"));

    // Step 3: url-stats resolves the nested link record.
    let link = client.url_stats("pop", Some(ResponseFormat::Xml)).unwrap();
    assert_eq!(link.url(), Some(format!("http://{addr}/pop").as_str()));
    assert_eq!(link.get("message"), Some("success"));

    // Step 4: stats, top link first.
    let top = client.stats(None, Some(1), Some(ResponseFormat::Json)).unwrap();
    assert_eq!(top.url(), Some(format!("http://{addr}/pop").as_str()));

    // Step 5: duplicate keyword is reported with the server's status.
    let err = client
        .shorten("http://e.x/again", "Again", Some("one"), Some(ResponseFormat::Json))
        .unwrap_err();
    assert!(matches!(err, ApiError::Http { status: 400, .. }));

    // Every request carried the signature and nothing else.
    let sent = sent_params(&db);
    assert_eq!(sent.len(), 8);
    for params in &sent {
        assert!(has(params, "signature"));
        assert!(!has(params, "username"));
        assert!(!has(params, "password"));
    }

    // stats without a limit leaves the key out on the wire.
    client.stats(Some(StatsFilter::Last), None, Some(ResponseFormat::Json)).unwrap();
    let last = sent_params(&db).pop().unwrap();
    assert!(!has(&last, "limit"));
    assert!(last.contains(&("filter".to_string(), "last".to_string())));
}

#[test]
fn password_pair_over_post() {
    let (addr, db) = start_server(Auth::password("admin", "hunter2"));
    let settings = Settings::new(&format!("http://{addr}"))
        .with_password("admin", "hunter2")
        .with_method("post")
        .with_format("json");
    let client = ShortenerClient::new(&settings).unwrap();

    let result = client.shorten("http://e.x/post", "Posted", Some("posted"), None).unwrap();
    assert_eq!(result.url(), Some(format!("http://{addr}/posted").as_str()));

    let expanded = client.expand("posted", Some(ResponseFormat::Simple)).unwrap();
    assert_eq!(expanded.url(), Some("http://e.x/post"));

    for params in sent_params(&db) {
        assert!(has(&params, "username"));
        assert!(has(&params, "password"));
        assert!(!has(&params, "signature"));
    }
}

#[test]
fn wrong_signature_is_rejected_by_server() {
    let (addr, _db) = start_server(Auth::signature("s3cret"));
    let settings = Settings::new(&format!("http://{addr}")).with_signature("wrong");
    let client = ShortenerClient::new(&settings).unwrap();

    let err = client.expand("pop", Some(ResponseFormat::Json)).unwrap_err();
    assert!(matches!(err, ApiError::Http { status: 403, .. }));
}

#[test]
fn missing_auth_never_reaches_the_server() {
    let (addr, db) = start_server(Auth::signature("s3cret"));
    let settings = Settings::new(&format!("http://{addr}")).with_password("admin", "");
    let client = ShortenerClient::new(&settings).unwrap();

    assert!(client.shorten("http://e.x/a", "A", None, None).unwrap_err().is_configuration());
    assert!(client.expand("pop", None).unwrap_err().is_configuration());
    assert!(client.url_stats("pop", None).unwrap_err().is_configuration());
    assert!(client.stats(None, None, None).unwrap_err().is_configuration());
    assert!(sent_params(&db).is_empty());
}

#[test]
fn unreachable_server_is_a_transport_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let settings = Settings::new(&format!("http://{addr}")).with_signature("s3cret");
    let client = ShortenerClient::new(&settings).unwrap();
    let err = client.expand("pop", None).unwrap_err();
    assert!(matches!(err, ApiError::Transport(_)));
}

#[test]
fn silent_server_times_out_as_a_transport_error() {
    // Connections queue in the backlog but are never accepted or answered.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    let settings = Settings {
        timeout_secs: Some(1),
        ..Settings::new(&format!("http://{addr}")).with_signature("s3cret")
    };
    let client = ShortenerClient::new(&settings).unwrap();
    assert_eq!(client.config().timeout, Some(std::time::Duration::from_secs(1)));

    let started = std::time::Instant::now();
    let err = client.expand("pop", None).unwrap_err();
    assert!(matches!(err, ApiError::Transport(_)), "{err}");
    assert!(started.elapsed() < std::time::Duration::from_secs(10));
    drop(listener);
}

#[test]
fn host_hooks_shorten_the_current_page() {
    let (addr, _db) = start_server(Auth::signature("s3cret"));
    let client = hooks::setup(&Settings::new(&format!("http://{addr}")).with_signature("s3cret")).unwrap();

    let page = PageContext {
        shorten: true,
        title: Some("Post 42".to_string()),
        server_name: "example.com".to_string(),
        path: "/posts/42".to_string(),
    };
    let result = hooks::before_output(&client, &page).unwrap().unwrap();

    let long = client.expand(result.url().unwrap(), None).unwrap();
    assert_eq!(long.url(), Some("http://example.com/posts/42"));
}
