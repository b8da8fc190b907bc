//! Development server
//!
//! Serves the build output as static files, except for the blog page, which
//! is assembled on every request by running the content loader against the
//! output directory.

use anyhow::Result;
use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use notify_debouncer_mini::{new_debouncer, notify::RecursiveMode};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::content::Capabilities;
use crate::loader::DirSource;
use crate::page;
use crate::{Site, CONFIG_FILE};

/// Server state
struct ServerState {
    site: Site,
    capabilities: Capabilities,
}

/// Build the router serving `site`
pub fn router(site: Site, capabilities: Capabilities) -> Router {
    let blog_route = format!("/{}", site.config.blog_page.trim_start_matches('/'));
    let static_files = ServeDir::new(&site.output_dir).append_index_html_on_directories(true);

    let state = Arc::new(ServerState { site, capabilities });

    Router::new()
        .route(&blog_route, get(blog_handler))
        .fallback_service(static_files)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the development server
pub async fn start(
    site: &Site,
    capabilities: Capabilities,
    ip: &str,
    port: u16,
    watch: bool,
) -> Result<()> {
    // Parse address - handle "localhost" specially
    let bind_ip = if ip == "localhost" { "127.0.0.1" } else { ip };
    let addr: SocketAddr = format!("{}:{}", bind_ip, port).parse()?;

    println!("Server running at http://{}:{}/", ip, port);
    println!("Blog page: http://{}:{}/{}", ip, port, site.config.blog_page);
    if watch {
        println!("Watching for changes...");
    }
    println!("Press Ctrl+C to stop.");

    if watch {
        let site_clone = site.clone();
        tokio::task::spawn_blocking(move || {
            if let Err(e) = watch_and_rebuild(site_clone) {
                tracing::error!("File watcher error: {}", e);
            }
        });
    }

    let app = router(site.clone(), capabilities);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Rebuild the site whenever its sources or configuration change
fn watch_and_rebuild(mut site: Site) -> Result<()> {
    let (tx, rx) = std::sync::mpsc::channel();

    // Create debouncer to avoid multiple rapid rebuilds
    let mut debouncer = new_debouncer(Duration::from_millis(500), tx)?;

    if site.content_dir.exists() {
        debouncer
            .watcher()
            .watch(&site.content_dir, RecursiveMode::Recursive)?;
        tracing::debug!("Watching: {:?}", site.content_dir);
    }

    let config_path = site.base_dir.join(CONFIG_FILE);
    let mut watched: Vec<PathBuf> = site
        .config
        .static_files
        .iter()
        .map(|file| site.base_dir.join(file))
        .collect();
    watched.push(config_path);

    for path in watched.iter().filter(|p| p.exists()) {
        debouncer.watcher().watch(path, RecursiveMode::NonRecursive)?;
        tracing::debug!("Watching: {:?}", path);
    }

    loop {
        match rx.recv() {
            Ok(Ok(events)) => {
                let relevant = events.iter().any(|e| {
                    let path_str = e.path.to_string_lossy();
                    !path_str.contains(".git")
                        && !path_str.contains(".DS_Store")
                        && !path_str.ends_with('~')
                });
                if !relevant {
                    continue;
                }

                for event in &events {
                    tracing::info!("File changed: {}", event.path.display());
                }

                if events.iter().any(|e| is_config_file(&site, &e.path)) {
                    match reload(&site) {
                        Ok(reloaded) => {
                            if reloaded.content_dir != site.content_dir
                                && reloaded.content_dir.exists()
                            {
                                debouncer
                                    .watcher()
                                    .watch(&reloaded.content_dir, RecursiveMode::Recursive)?;
                            }
                            site = reloaded;
                            tracing::info!(
                                "Configuration reloaded; restart the server to change the served directory or blog page"
                            );
                        }
                        Err(e) => {
                            tracing::error!("Failed to reload configuration: {:#}", e);
                            continue;
                        }
                    }
                }

                match site.build() {
                    Ok(_) => tracing::info!("Rebuilt successfully"),
                    Err(e) => tracing::error!("Build failed: {:#}", e),
                }
            }
            Ok(Err(e)) => {
                tracing::error!("Watch error: {:?}", e);
            }
            Err(e) => {
                tracing::error!("Channel error: {:?}", e);
                break;
            }
        }
    }

    Ok(())
}

/// Whether `path` is the configuration file of `site`
fn is_config_file(site: &Site, path: &Path) -> bool {
    path.file_name().is_some_and(|name| name == CONFIG_FILE)
        && path
            .parent()
            .is_some_and(|dir| same_dir(dir, &site.base_dir))
}

fn same_dir(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

/// Re-read the configuration, keeping render switches given on the command line
fn reload(site: &Site) -> Result<Site> {
    let mut reloaded = Site::new(&site.base_dir)?;
    reloaded.config.render = site.config.render.clone();
    Ok(reloaded)
}

/// Assemble the blog page from the current build output
async fn blog_handler(State(state): State<Arc<ServerState>>) -> Response {
    let source = DirSource::new(&state.site.output_dir);
    match page::render_site(&state.site, &source, &state.capabilities).await {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            tracing::error!("Failed to render blog page: {:#}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to render blog page").into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    async fn serve(site: Site, capabilities: Capabilities) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router(site, capabilities))
                .await
                .unwrap();
        });
        format!("http://{}", addr)
    }

    fn built_site() -> (tempfile::TempDir, Site) {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("content/blog")).unwrap();
        fs::write(
            dir.path().join("content/blog/first-post.md"),
            "---\ntitle: \"First Post\"\n---\n\nAn article describing the waste management process.\n\n<script>alert(1)</script>",
        )
        .unwrap();
        fs::write(dir.path().join("style.css"), "body { color: red; }").unwrap();

        let site = Site::new(dir.path()).unwrap();
        site.build().unwrap();
        (dir, site)
    }

    #[tokio::test]
    async fn test_blog_page_rendered_per_request() {
        let (_dir, site) = built_site();
        let caps = site.capabilities();
        let origin = serve(site, caps).await;

        let body = reqwest::get(format!("{}/blog.html", origin))
            .await
            .unwrap()
            .text()
            .await
            .unwrap();

        assert!(body.contains(r#"<article id="first-post"><h2>First Post</h2>"#));
        assert!(body
            .to_lowercase()
            .contains("article describing the waste management process"));
        assert!(!body.contains("alert(1)"));
    }

    #[tokio::test]
    async fn test_static_files_and_manifest_served() {
        let (_dir, site) = built_site();
        let caps = site.capabilities();
        let origin = serve(site, caps).await;

        let css = reqwest::get(format!("{}/style.css", origin))
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        assert_eq!(css, "body { color: red; }");

        let manifest = reqwest::get(format!("{}/blog.json", origin))
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        assert!(manifest.contains("content/blog/first-post.md"));

        let missing = reqwest::get(format!("{}/nope.html", origin)).await.unwrap();
        assert_eq!(missing.status(), reqwest::StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_config_change_detected_and_reloaded() {
        let (dir, mut site) = built_site();
        site.config.render.sanitizer = false;

        assert!(is_config_file(&site, &dir.path().join(CONFIG_FILE)));
        assert!(!is_config_file(&site, &site.content_dir.join(CONFIG_FILE)));
        assert!(!is_config_file(&site, &dir.path().join("style.css")));

        fs::write(dir.path().join(CONFIG_FILE), "output_dir: public\n").unwrap();
        let reloaded = reload(&site).unwrap();
        assert_eq!(reloaded.output_dir, dir.path().join("public"));
        assert!(!reloaded.config.render.sanitizer);

        fs::write(dir.path().join(CONFIG_FILE), "output_dir: [unclosed\n").unwrap();
        assert!(reload(&site).is_err());
    }

    #[tokio::test]
    async fn test_http_source_against_server() {
        use crate::loader::HttpSource;

        let (_dir, site) = built_site();
        let caps = site.capabilities();
        let origin = serve(site.clone(), caps.clone()).await;

        let source = HttpSource::new(&origin).unwrap();
        let html = page::render_site(&site, &source, &caps).await.unwrap();
        assert!(html.contains(r##"<a href="#first-post">First Post</a>"##));
        assert!(html.contains("waste management process"));
    }
}
