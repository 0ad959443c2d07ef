use std::io::{self, Write};
use std::path::PathBuf;
use std::process;

use clap::{Arg, Command};
use humm::{Bootstrap, JsonFileSession, Request, SessionStore, sample};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let matches = Command::new("humm")
        .version(humm::VERSION)
        .about("Render one Humm request and print the result")
        .arg(
            Arg::new("uri")
                .help("Request URI, with query string (default: /)")
                .default_value("/")
                .index(1),
        )
        .arg(
            Arg::new("root")
                .long("root")
                .short('r')
                .help("Installation root holding the Humm directory")
                .default_value("www"),
        )
        .arg(
            Arg::new("host")
                .long("host")
                .help("Host name used to pick the site")
                .default_value("localhost"),
        )
        .arg(
            Arg::new("base-path")
                .long("base-path")
                .help("URL path the installation is mounted under")
                .default_value("/"),
        )
        .arg(
            Arg::new("session")
                .long("session")
                .short('s')
                .help("JSON file keeping session values between runs"),
        )
        .get_matches();

    // Arguments with defaults are always present
    let uri = matches.get_one::<String>("uri").cloned().unwrap_or_default();
    let root = matches
        .get_one::<String>("root")
        .map(PathBuf::from)
        .unwrap_or_default();
    let host = matches.get_one::<String>("host").cloned().unwrap_or_default();
    let base_path = matches
        .get_one::<String>("base-path")
        .cloned()
        .unwrap_or_default();

    let mut request = Request::new(uri)
        .with_host(host)
        .with_base_path(base_path);

    let session_file = matches.get_one::<String>("session").map(PathBuf::from);
    if let Some(path) = &session_file {
        match JsonFileSession::open(path) {
            Ok(session) => request = request.with_session(Box::new(session)),
            Err(e) => {
                error!("❌ {}", e);
                process::exit(1);
            }
        }
    }

    let mut bootstrap = Bootstrap::new(root);
    sample::register(&mut bootstrap);

    let response = bootstrap.handle(request);
    info!(status = response.status, view = %response.view, "✅ Rendered");

    if let Some(path) = session_file {
        let values = response.session.values();
        let saved = JsonFileSession::open(&path).and_then(|mut session| {
            for (key, value) in &values {
                session.set(key, value);
            }
            session.save()
        });
        if let Err(e) = saved {
            error!("❌ Could not save the session: {}", e);
        }
    }

    let mut stdout = io::stdout().lock();
    if let Err(e) = stdout.write_all(&response.body).and_then(|_| stdout.flush()) {
        error!("❌ {}", e);
        process::exit(1);
    }

    process::exit(if response.status >= 500 { 1 } else { 0 });
}
