use axum::{
    Router,
    extract::State,
    http::{HeaderMap, StatusCode, Uri, header},
    response::{IntoResponse, Response},
};
use clap::{Arg, Command};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use humm::{Bootstrap, Request, sample};

mod cookie;

#[derive(Clone)]
pub struct AppState {
    pub bootstrap: Arc<Bootstrap>,
    pub base_path: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let matches = Command::new("humm-web")
        .version(humm::VERSION)
        .about("Serve a Humm installation over HTTP")
        .arg(
            Arg::new("root")
                .long("root")
                .short('r')
                .help("Installation root holding the Humm directory")
                .default_value("www"),
        )
        .arg(
            Arg::new("bind")
                .long("bind")
                .short('b')
                .help("Address to listen on")
                .default_value("127.0.0.1:3000"),
        )
        .arg(
            Arg::new("base-path")
                .long("base-path")
                .help("URL path the installation is mounted under")
                .default_value("/"),
        )
        .get_matches();

    let root = matches
        .get_one::<String>("root")
        .map(PathBuf::from)
        .unwrap_or_default();
    let bind = matches
        .get_one::<String>("bind")
        .cloned()
        .unwrap_or_default();
    let base_path = matches
        .get_one::<String>("base-path")
        .cloned()
        .unwrap_or_default();

    let mut bootstrap = Bootstrap::new(root.clone());
    sample::register(&mut bootstrap);

    info!("🐝 Starting Humm web server for {}", root.display());

    let app = app(bootstrap, &root, base_path);

    let listener = tokio::net::TcpListener::bind(&bind).await?;
    info!("🚀 Server running at http://{}", bind);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Router serving `root/static` as files and everything else through Humm
pub fn app(bootstrap: Bootstrap, root: &Path, base_path: String) -> Router {
    let state = AppState {
        bootstrap: Arc::new(bootstrap),
        base_path,
    };

    Router::new()
        .nest_service("/static", ServeDir::new(root.join("static")))
        .fallback(render)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn render(State(state): State<AppState>, headers: HeaderMap, uri: Uri) -> Response {
    let host = headers
        .get(header::HOST)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(':').next())
        .unwrap_or("localhost")
        .to_string();
    let session = cookie::session_from_header(
        headers
            .get(header::COOKIE)
            .and_then(|value| value.to_str().ok()),
    );
    let uri = uri
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| "/".to_string());

    let request = Request::new(uri)
        .with_host(host)
        .with_base_path(state.base_path.clone())
        .with_session(Box::new(session));

    // Rendering reads files and runs plugin code
    let bootstrap = state.bootstrap.clone();
    let response = match tokio::task::spawn_blocking(move || bootstrap.handle(request)).await {
        Ok(response) => response,
        Err(e) => {
            error!("❌ Request handler failed: {}", e);
            return (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response();
        }
    };

    let status = StatusCode::from_u16(response.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (
        status,
        [
            (header::CONTENT_TYPE, "text/html; charset=utf-8".to_string()),
            (
                header::SET_COOKIE,
                cookie::set_cookie_header(&response.session.values()),
            ),
        ],
        response.body,
    )
        .into_response()
}
