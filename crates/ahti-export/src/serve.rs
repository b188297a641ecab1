//! Static file server for local previews
//!
//! Serves the export directory over HTTP/1 so browser-based map tools on other origins can
//! fetch the GeoJSON files. Every response carries `Access-Control-Allow-Origin: *`.
//! Uses hyper http1 with TokioIo, one task per connection.

use bytes::Bytes;
use http_body_util::Full;
use hyper::header::{self, HeaderMap, HeaderValue};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::io::ErrorKind;
use std::net::SocketAddr;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, error, info};

const ALLOWED_METHODS: &str = "GET, HEAD, OPTIONS";
const ALLOWED_HEADERS: &str = "Content-Type";

/// Errors that stop the server
#[derive(Debug, thiserror::Error)]
pub enum ServeError {
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        source: std::io::Error,
    },

    #[error("Serve root {0} is not a directory")]
    NotADirectory(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Serve `root` on `addr` until Ctrl-C
pub async fn run(addr: SocketAddr, root: PathBuf) -> Result<(), ServeError> {
    let root = tokio::fs::canonicalize(&root).await?;
    if !root.is_dir() {
        return Err(ServeError::NotADirectory(root));
    }

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| ServeError::Bind { addr, source })?;
    info!(
        "Serving {} with CORS enabled on port {}...",
        root.display(),
        addr.port()
    );

    let root: Arc<Path> = Arc::from(root);
    loop {
        tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    let root = Arc::clone(&root);
                    tokio::spawn(async move {
                        let io = TokioIo::new(stream);

                        let service = service_fn(move |req| {
                            let root = Arc::clone(&root);
                            async move { handle_request(&root, req).await }
                        });

                        if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                            debug!("Error serving connection from {}: {:?}", peer, err);
                        }
                    });
                }
                Err(e) => {
                    error!("Error accepting connection: {:?}", e);
                }
            },
            _ = tokio::signal::ctrl_c() => {
                info!("Shutting down preview server");
                return Ok(());
            }
        }
    }
}

/// Answer one request against the files under `root`
pub async fn handle_request<B>(
    root: &Path,
    req: Request<B>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let path = req.uri().path().to_string();
    let mut response = match *req.method() {
        Method::OPTIONS => empty(StatusCode::NO_CONTENT),
        Method::GET => serve_path(root, &path, false).await,
        Method::HEAD => serve_path(root, &path, true).await,
        _ => {
            let mut response = text(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed");
            response
                .headers_mut()
                .insert(header::ALLOW, HeaderValue::from_static(ALLOWED_METHODS));
            response
        }
    };

    add_cors_headers(response.headers_mut());
    debug!("{} {} -> {}", req.method(), path, response.status());
    Ok(response)
}

fn add_cors_headers(headers: &mut HeaderMap) {
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(ALLOWED_METHODS),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(ALLOWED_HEADERS),
    );
}

/// Map a request path onto the file system, `None` if it would leave `root`
pub fn resolve_path(root: &Path, uri_path: &str) -> Option<PathBuf> {
    let decoded = urlencoding::decode(uri_path).ok()?;
    let mut resolved = root.to_path_buf();
    for component in Path::new(decoded.trim_start_matches('/')).components() {
        match component {
            Component::Normal(part) => resolved.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    Some(resolved)
}

async fn serve_path(root: &Path, uri_path: &str, head_only: bool) -> Response<Full<Bytes>> {
    let Some(path) = resolve_path(root, uri_path) else {
        return text(StatusCode::FORBIDDEN, "Forbidden");
    };

    let metadata = match tokio::fs::metadata(&path).await {
        Ok(metadata) => metadata,
        Err(e) => return io_error_response(&e),
    };

    if metadata.is_dir() {
        if !uri_path.ends_with('/') {
            return redirect(&format!("{uri_path}/"));
        }
        let index = path.join("index.html");
        if index.is_file() {
            return serve_file(&index, head_only).await;
        }
        return match directory_listing(&path, uri_path).await {
            Ok(html) => with_body(StatusCode::OK, "text/html; charset=utf-8", html, head_only),
            Err(e) => io_error_response(&e),
        };
    }

    serve_file(&path, head_only).await
}

async fn serve_file(path: &Path, head_only: bool) -> Response<Full<Bytes>> {
    match tokio::fs::read(path).await {
        Ok(contents) => {
            let mime = mime_guess::from_path(path).first_or_octet_stream();
            with_body(StatusCode::OK, mime.as_ref(), contents, head_only)
        }
        Err(e) => io_error_response(&e),
    }
}

async fn directory_listing(dir: &Path, uri_path: &str) -> std::io::Result<String> {
    let mut names = Vec::new();
    let mut entries = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let mut name = entry.file_name().to_string_lossy().into_owned();
        if entry.file_type().await?.is_dir() {
            name.push('/');
        }
        names.push(name);
    }
    names.sort();

    let title = format!("Directory listing for {}", html_escape(uri_path));
    let mut html = format!("<!DOCTYPE html>\n<html>\n<head><title>{title}</title></head>\n<body>\n<h1>{title}</h1>\n<hr>\n<ul>\n");
    for name in names {
        let href = urlencoding::encode(&name).replace("%2F", "/");
        html.push_str(&format!(
            "<li><a href=\"{href}\">{}</a></li>\n",
            html_escape(&name)
        ));
    }
    html.push_str("</ul>\n<hr>\n</body>\n</html>\n");
    Ok(html)
}

fn html_escape(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn io_error_response(e: &std::io::Error) -> Response<Full<Bytes>> {
    match e.kind() {
        ErrorKind::NotFound => text(StatusCode::NOT_FOUND, "File not found"),
        ErrorKind::PermissionDenied => text(StatusCode::FORBIDDEN, "Forbidden"),
        _ => {
            error!("Failed to read file: {e}");
            text(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
        }
    }
}

fn with_body(
    status: StatusCode,
    content_type: &str,
    body: impl Into<Bytes>,
    head_only: bool,
) -> Response<Full<Bytes>> {
    let body: Bytes = body.into();
    let length = body.len();
    let mut response = if head_only {
        Response::new(Full::new(Bytes::new()))
    } else {
        Response::new(Full::new(body))
    };
    *response.status_mut() = status;

    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_str(content_type)
            .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream")),
    );
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(length));
    response
}

fn text(status: StatusCode, message: &'static str) -> Response<Full<Bytes>> {
    with_body(status, "text/plain; charset=utf-8", message, false)
}

fn empty(status: StatusCode) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::new()));
    *response.status_mut() = status;
    response
}

fn redirect(location: &str) -> Response<Full<Bytes>> {
    let mut response = empty(StatusCode::MOVED_PERMANENTLY);
    if let Ok(value) = HeaderValue::from_str(location) {
        response.headers_mut().insert(header::LOCATION, value);
    }
    response
}
