use std::sync::Arc;

use axum::{
    extract::{Form, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use rand::seq::SliceRandom;
use serde_json::{Map, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::{debug, info};

pub const API_PATH: &str = "/yourls-api.php";

pub type Params = Vec<(String, String)>;

/// Credentials the mock accepts. Either mode, or both, may be set.
#[derive(Clone, Debug, Default)]
pub struct Auth {
    pub signature: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl Auth {
    pub fn signature(signature: &str) -> Self {
        Self {
            signature: Some(signature.to_string()),
            ..Self::default()
        }
    }

    pub fn password(username: &str, password: &str) -> Self {
        Self {
            username: Some(username.to_string()),
            password: Some(password.to_string()),
            ..Self::default()
        }
    }

    fn accepts(&self, params: &Params) -> bool {
        let sent = |key: &str| param(params, key);
        if let (Some(expected), Some(got)) = (&self.signature, sent("signature")) {
            if expected == got {
                return true;
            }
        }
        matches!(
            (&self.username, &self.password, sent("username"), sent("password")),
            (Some(u), Some(p), Some(su), Some(sp)) if u == su && p == sp
        )
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Link {
    pub keyword: String,
    pub url: String,
    pub title: String,
    pub clicks: u64,
}

/// In-memory YOURLS installation.
#[derive(Debug)]
pub struct Store {
    pub auth: Auth,
    pub base_url: String,
    /// Links in creation order.
    pub links: Vec<Link>,
    /// Every parameter set received, authenticated or not.
    pub requests: Vec<Params>,
    next_id: u64,
}

impl Store {
    pub fn new(auth: Auth, base_url: &str) -> Self {
        Self {
            auth,
            base_url: base_url.trim_end_matches('/').to_string(),
            links: Vec::new(),
            requests: Vec::new(),
            next_id: 1,
        }
    }

    pub fn with_link(mut self, keyword: &str, url: &str, title: &str, clicks: u64) -> Self {
        self.links.push(Link {
            keyword: keyword.to_string(),
            url: url.to_string(),
            title: title.to_string(),
            clicks,
        });
        self
    }

    fn shorturl(&self, keyword: &str) -> String {
        format!("{}/{keyword}", self.base_url)
    }

    fn find(&self, shorturl: &str) -> Option<&Link> {
        let keyword = shorturl.trim_end_matches('/').rsplit('/').next().unwrap_or(shorturl);
        self.links.iter().find(|l| l.keyword == keyword)
    }

    fn next_keyword(&mut self) -> String {
        loop {
            let keyword = base36(self.next_id);
            self.next_id += 1;
            if !self.links.iter().any(|l| l.keyword == keyword) {
                return keyword;
            }
        }
    }
}

pub type Db = Arc<RwLock<Store>>;

pub fn db(store: Store) -> Db {
    Arc::new(RwLock::new(store))
}

pub fn app(db: Db) -> Router {
    Router::new()
        .route(API_PATH, get(api_get).post(api_post))
        .with_state(db)
}

pub async fn run(listener: TcpListener, db: Db) -> Result<(), std::io::Error> {
    axum::serve(listener, app(db)).await
}

async fn api_get(State(db): State<Db>, Query(params): Query<Params>) -> Response {
    handle(db, params).await
}

async fn api_post(State(db): State<Db>, Form(params): Form<Params>) -> Response {
    handle(db, params).await
}

async fn handle(db: Db, params: Params) -> Response {
    let mut store = db.write().await;
    store.requests.push(params.clone());

    let format = Format::from_param(param(&params, "format"));
    let action = param(&params, "action").unwrap_or_default();
    debug!(action, ?format, "API call");

    if !store.auth.accepts(&params) {
        info!(action, "rejected unauthenticated call");
        return Reply::error(StatusCode::FORBIDDEN, "Please log in").render(format);
    }

    let reply = match action {
        "shorturl" => shorten(&mut store, &params),
        "expand" => expand(&store, &params),
        "url-stats" => url_stats(&store, &params),
        "stats" => stats(&store, &params),
        _ => Reply::error(StatusCode::BAD_REQUEST, "Unknown or missing \"action\" parameter"),
    };
    reply.render(format)
}

fn param<'a>(params: &'a Params, key: &str) -> Option<&'a str> {
    params.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
}

fn base36(mut n: u64) -> String {
    const DIGITS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    let mut out = Vec::new();
    loop {
        out.push(DIGITS[(n % 36) as usize]);
        n /= 36;
        if n == 0 {
            break;
        }
    }
    out.reverse();
    String::from_utf8_lossy(&out).into_owned()
}

// ---------------------------------------------------------------------------
// Actions
// ---------------------------------------------------------------------------

fn shorten(store: &mut Store, params: &Params) -> Reply {
    let Some(url) = param(params, "url").filter(|u| !u.is_empty()) else {
        return Reply::error(StatusCode::BAD_REQUEST, "Missing or malformed URL");
    };
    let title = param(params, "title").unwrap_or_default().to_string();
    let keyword = match param(params, "keyword").filter(|k| !k.is_empty()) {
        Some(keyword) if store.links.iter().any(|l| l.keyword == keyword) => {
            return Reply::error(
                StatusCode::BAD_REQUEST,
                &format!("Short URL {keyword} already exists in database or is reserved"),
            );
        }
        Some(keyword) => keyword.to_string(),
        None => store.next_keyword(),
    };

    let link = Link {
        keyword: keyword.clone(),
        url: url.to_string(),
        title: title.clone(),
        clicks: 0,
    };
    let shorturl = store.shorturl(&keyword);
    info!(%keyword, %url, "link added");
    store.links.push(link.clone());

    Reply::ok(&shorturl)
        .field("url", link_fields(&link, None))
        .field("status", Field::text("success"))
        .field("message", Field::text(&format!("{url} added to database")))
        .field("title", Field::text(&title))
        .field("shorturl", Field::text(&shorturl))
        .field("statusCode", Field::Number(200))
}

fn expand(store: &Store, params: &Params) -> Reply {
    let Some(link) = param(params, "shorturl").and_then(|s| store.find(s)) else {
        return Reply::error(StatusCode::NOT_FOUND, "Error: short URL not found");
    };
    Reply::ok(&link.url)
        .field("keyword", Field::text(&link.keyword))
        .field("shorturl", Field::text(&store.shorturl(&link.keyword)))
        .field("longurl", Field::text(&link.url))
        .field("title", Field::text(&link.title))
        .field("message", Field::text("success"))
        .field("statusCode", Field::Number(200))
}

fn url_stats(store: &Store, params: &Params) -> Reply {
    let Some(link) = param(params, "shorturl").and_then(|s| store.find(s)) else {
        return Reply::error(StatusCode::NOT_FOUND, "Error: short URL not found");
    };
    let shorturl = store.shorturl(&link.keyword);
    Reply::ok(&shorturl)
        .field("statusCode", Field::Number(200))
        .field("message", Field::text("success"))
        .field("link", link_fields(link, Some(&shorturl)))
}

fn stats(store: &Store, params: &Params) -> Reply {
    let filter = param(params, "filter").unwrap_or("top");
    let limit = param(params, "limit").and_then(|l| l.parse::<usize>().ok()).unwrap_or(10);

    let mut links: Vec<&Link> = store.links.iter().collect();
    match filter {
        "top" => links.sort_by(|a, b| b.clicks.cmp(&a.clicks)),
        "bottom" => links.sort_by(|a, b| a.clicks.cmp(&b.clicks)),
        "last" => links.reverse(),
        "rand" => links.shuffle(&mut rand::rng()),
        _ => {}
    }
    links.truncate(limit);

    let listed = links
        .iter()
        .enumerate()
        .map(|(i, link)| {
            let shorturl = store.shorturl(&link.keyword);
            (format!("link_{}", i + 1), link_fields(link, Some(&shorturl)))
        })
        .collect();
    let totals = Field::Group(vec![
        ("total_links".to_string(), Field::Number(store.links.len() as u64)),
        (
            "total_clicks".to_string(),
            Field::Number(store.links.iter().map(|l| l.clicks).sum()),
        ),
    ]);

    Reply::ok("need either XML or JSON format for stats")
        .field("links", Field::Group(listed))
        .field("stats", totals)
        .field("statusCode", Field::Number(200))
        .field("message", Field::text("success"))
}

fn link_fields(link: &Link, shorturl: Option<&str>) -> Field {
    let mut fields = Vec::new();
    if let Some(shorturl) = shorturl {
        fields.push(("shorturl".to_string(), Field::text(shorturl)));
    }
    fields.push(("keyword".to_string(), Field::text(&link.keyword)));
    fields.push(("url".to_string(), Field::text(&link.url)));
    fields.push(("title".to_string(), Field::text(&link.title)));
    fields.push(("clicks".to_string(), Field::Number(link.clicks)));
    Field::Group(fields)
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Format {
    Json,
    Xml,
    Simple,
}

impl Format {
    /// YOURLS answers in xml unless told otherwise.
    fn from_param(value: Option<&str>) -> Self {
        match value {
            Some("json") => Format::Json,
            Some("simple") => Format::Simple,
            _ => Format::Xml,
        }
    }
}

#[derive(Clone, Debug)]
enum Field {
    Text(String),
    Number(u64),
    Group(Vec<(String, Field)>),
}

impl Field {
    fn text(s: &str) -> Self {
        Field::Text(s.to_string())
    }

    fn to_json(&self) -> Value {
        match self {
            Field::Text(s) => Value::String(s.clone()),
            Field::Number(n) => Value::from(*n),
            Field::Group(fields) => Value::Object(
                fields.iter().map(|(k, v)| (k.clone(), v.to_json())).collect::<Map<_, _>>(),
            ),
        }
    }

    fn write_xml(&self, name: &str, out: &mut String) {
        out.push_str(&format!("<{name}>"));
        match self {
            Field::Text(s) => out.push_str(&xml_escape(s)),
            Field::Number(n) => out.push_str(&n.to_string()),
            Field::Group(fields) => {
                for (k, v) in fields {
                    v.write_xml(k, out);
                }
            }
        }
        out.push_str(&format!("</{name}>"));
    }
}

fn xml_escape(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

struct Reply {
    status: StatusCode,
    fields: Vec<(String, Field)>,
    simple: String,
}

impl Reply {
    fn ok(simple: &str) -> Self {
        Self {
            status: StatusCode::OK,
            fields: Vec::new(),
            simple: simple.to_string(),
        }
    }

    fn error(status: StatusCode, message: &str) -> Self {
        Self {
            status,
            fields: vec![
                ("errorCode".to_string(), Field::Number(u64::from(status.as_u16()))),
                ("message".to_string(), Field::text(message)),
            ],
            simple: message.to_string(),
        }
    }

    fn field(mut self, name: &str, value: Field) -> Self {
        self.fields.push((name.to_string(), value));
        self
    }

    fn render(self, format: Format) -> Response {
        match format {
            Format::Json => {
                let body = Field::Group(self.fields).to_json().to_string();
                (self.status, [(header::CONTENT_TYPE, "application/json")], body).into_response()
            }
            Format::Xml => {
                let mut body = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
                Field::Group(self.fields).write_xml("result", &mut body);
                (self.status, [(header::CONTENT_TYPE, "application/xml")], body).into_response()
            }
            Format::Simple => {
                (self.status, [(header::CONTENT_TYPE, "text/plain")], self.simple).into_response()
            }
        }
    }
}
