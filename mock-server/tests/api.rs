use axum::http::{self, Request, StatusCode};
use http_body_util::BodyExt;
use mock_server::{app, db, Auth, Db, Store};
use tower::ServiceExt;

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes: bytes::Bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn store() -> Store {
    Store::new(Auth::signature("sig"), "http://sho.rt")
        .with_link("pop", "http://e.x/popular", "Popular", 40)
        .with_link("meh", "http://e.x/meh", "Meh", 2)
        .with_link("new", "http://e.x/new", "New", 7)
}

fn get(query: &str) -> Request<String> {
    Request::builder()
        .uri(format!("/yourls-api.php?{query}"))
        .body(String::new())
        .unwrap()
}

fn post_form(body: &str) -> Request<String> {
    Request::builder()
        .method("POST")
        .uri("/yourls-api.php")
        .header(http::header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(body.to_string())
        .unwrap()
}

// --- auth ---

#[tokio::test]
async fn unauthenticated_call_returns_403() {
    let resp = app(db(store()))
        .oneshot(get("action=expand&shorturl=pop&format=json"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    let json = body_json(resp).await;
    assert_eq!(json["errorCode"], 403);
    assert_eq!(json["message"], "Please log in");
}

#[tokio::test]
async fn password_pair_is_accepted() {
    let state = db(Store::new(Auth::password("admin", "secret"), "http://sho.rt").with_link("a", "http://e.x/a", "A", 0));
    let resp = app(state)
        .oneshot(get("action=expand&shorturl=a&format=simple&username=admin&password=secret"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_text(resp).await, "http://e.x/a");
}

// --- shorturl ---

#[tokio::test]
async fn shorten_via_post_form() {
    let state: Db = db(store());
    let resp = app(state.clone())
        .oneshot(post_form(
            "action=shorturl&url=http%3A%2F%2Fe.x%2Flong&title=Long&keyword=lng&format=json&signature=sig",
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp).await;
    assert_eq!(json["shorturl"], "http://sho.rt/lng");
    assert_eq!(json["status"], "success");
    assert_eq!(json["url"]["url"], "http://e.x/long");

    let store = state.read().await;
    assert_eq!(store.links.len(), 4);
    assert_eq!(store.requests.len(), 1);
}

#[tokio::test]
async fn shorten_generates_keyword() {
    let resp = app(db(store()))
        .oneshot(get("action=shorturl&url=http%3A%2F%2Fe.x%2Fx&title=X&format=simple&signature=sig"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_text(resp).await, "http://sho.rt/1");
}

#[tokio::test]
async fn shorten_duplicate_keyword_returns_400() {
    let resp = app(db(store()))
        .oneshot(get("action=shorturl&url=http%3A%2F%2Fe.x%2Fx&title=X&keyword=pop&format=json&signature=sig"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let json = body_json(resp).await;
    assert_eq!(json["errorCode"], 400);
}

#[tokio::test]
async fn shorten_xml_shape() {
    let resp = app(db(store()))
        .oneshot(get("action=shorturl&url=http%3A%2F%2Fe.x%2Fx&title=X&keyword=x&format=xml&signature=sig"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_text(resp).await;
    assert!(body.starts_with("<?xml"));
    assert!(body.contains("<shorturl>http://sho.rt/x</shorturl>"));
}

// --- expand / url-stats ---

#[tokio::test]
async fn expand_unknown_returns_404() {
    let resp = app(db(store()))
        .oneshot(get("action=expand&shorturl=nope&format=json&signature=sig"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn url_stats_nests_link() {
    let resp = app(db(store()))
        .oneshot(get("action=url-stats&shorturl=http%3A%2F%2Fsho.rt%2Fnew&format=json&signature=sig"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp).await;
    assert_eq!(json["link"]["shorturl"], "http://sho.rt/new");
    assert_eq!(json["link"]["clicks"], 7);
}

// --- stats ---

#[tokio::test]
async fn stats_top_with_limit() {
    let resp = app(db(store()))
        .oneshot(get("action=stats&filter=top&limit=2&format=json&signature=sig"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp).await;
    assert_eq!(json["links"]["link_1"]["keyword"], "pop");
    assert_eq!(json["links"]["link_2"]["keyword"], "new");
    assert!(json["links"].get("link_3").is_none());
    assert_eq!(json["stats"]["total_links"], 3);
    assert_eq!(json["stats"]["total_clicks"], 49);
}

#[tokio::test]
async fn stats_last_is_most_recent_first() {
    let resp = app(db(store()))
        .oneshot(get("action=stats&filter=last&format=json&signature=sig"))
        .await
        .unwrap();

    let json = body_json(resp).await;
    assert_eq!(json["links"]["link_1"]["keyword"], "new");
}

#[tokio::test]
async fn stats_rand_picks_distinct_links() {
    let resp = app(db(store()))
        .oneshot(get("action=stats&filter=rand&limit=2&format=json&signature=sig"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp).await;
    let first = json["links"]["link_1"]["keyword"].as_str().unwrap().to_string();
    let second = json["links"]["link_2"]["keyword"].as_str().unwrap().to_string();
    assert_ne!(first, second);
    for keyword in [&first, &second] {
        assert!(["pop", "meh", "new"].contains(&keyword.as_str()), "{keyword}");
    }
    assert!(json["links"].get("link_3").is_none());
}

#[tokio::test]
async fn unknown_action_returns_400() {
    let resp = app(db(store()))
        .oneshot(get("action=delete&format=json&signature=sig"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}
