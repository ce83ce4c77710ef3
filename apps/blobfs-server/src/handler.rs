//! HTTP static file service over a [`BlobFileSystem`].
//!
//! Requests are answered the way a conventional static file server does:
//!
//! 1. Only `GET` and `HEAD` are allowed
//! 2. Directory paths without a trailing slash are redirected to add one
//! 3. Directories serve their `index.html` when present, otherwise a listing
//! 4. Files honour a single `Range` header by seeking the handle

use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;

use blobfs_core::{BlobFile, BlobFileSystem, BlobFsError, FileInfo, Whence};
use blobfs_store::checksums::quoted_etag;
use bytes::Bytes;
use http::header::{
    ACCEPT_RANGES, ALLOW, CONTENT_LENGTH, CONTENT_RANGE, CONTENT_TYPE, ETAG, LAST_MODIFIED,
    LOCATION, RANGE,
};
use http::{HeaderMap, HeaderValue, Method, Request, Response, StatusCode};
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::service::Service;
use percent_encoding::percent_decode_str;
use tracing::{debug, error, info};

use crate::listing;
use crate::range::parse_range_header;

const INDEX_PAGE: &str = "index.html";
const HTML_CONTENT_TYPE: &str = "text/html; charset=utf-8";

/// Response type produced by [`FileServer`].
pub type FileResponse = Response<Full<Bytes>>;

/// hyper service serving files and directory listings from a bucket.
#[derive(Debug, Clone)]
pub struct FileServer {
    fs: BlobFileSystem,
}

impl FileServer {
    /// Serve `fs`.
    #[must_use]
    pub fn new(fs: BlobFileSystem) -> Self {
        Self { fs }
    }
}

impl Service<Request<Incoming>> for FileServer {
    type Response = FileResponse;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn call(&self, req: Request<Incoming>) -> Self::Future {
        let fs = self.fs.clone();
        Box::pin(async move {
            let (parts, _body) = req.into_parts();
            let response = respond(&fs, &parts.method, parts.uri.path(), &parts.headers).await;
            info!(
                method = %parts.method,
                path = %parts.uri.path(),
                status = response.status().as_u16(),
                "served request"
            );
            Ok(response)
        })
    }
}

/// Answer one request.
pub async fn respond(
    fs: &BlobFileSystem,
    method: &Method,
    raw_path: &str,
    headers: &HeaderMap,
) -> FileResponse {
    if method != Method::GET && method != Method::HEAD {
        let mut response = text_response(StatusCode::METHOD_NOT_ALLOWED, "405 method not allowed");
        response
            .headers_mut()
            .insert(ALLOW, HeaderValue::from_static("GET, HEAD"));
        return response;
    }

    let Some(path) = clean_path(raw_path) else {
        return text_response(StatusCode::BAD_REQUEST, "400 bad request");
    };
    debug!(%method, path = %path, "handling request");

    // "/x/index.html" is canonically served as "/x/".
    if let Some(dir) = path.strip_suffix(INDEX_PAGE) {
        if dir.ends_with('/') {
            return redirect(dir);
        }
    }

    let mut file = fs.open(&path);
    let info = match file.stat().await {
        Ok(info) => info,
        Err(e) => return error_response(&path, &e),
    };

    let is_root = path == "/";
    if info.is_dir() {
        if !is_root && !path.ends_with('/') {
            return redirect(&format!("{path}/"));
        }
        let dir = if is_root { String::new() } else { path.clone() };
        return serve_directory(fs, file, &dir, method).await;
    }

    serve_file(file, &info, method, headers).await
}

async fn serve_directory(
    fs: &BlobFileSystem,
    mut dir: BlobFile,
    path: &str,
    method: &Method,
) -> FileResponse {
    let index_path = format!("{path}{INDEX_PAGE}");
    let mut index = fs.open(&index_path);
    if let Ok(info) = index.stat().await {
        if !info.is_dir() {
            return serve_file(index, &info, method, &HeaderMap::new()).await;
        }
    }

    let listing = match dir.readdir(0).await {
        Ok(listing) => listing,
        Err(e) => return error_response(path, &e),
    };
    let body = listing::render(&listing.entries);

    let mut response = body_response(StatusCode::OK, method, Bytes::from(body));
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(HTML_CONTENT_TYPE));
    response
}

async fn serve_file(
    mut file: BlobFile,
    info: &FileInfo,
    method: &Method,
    headers: &HeaderMap,
) -> FileResponse {
    let size = info.size();
    let range = headers
        .get(RANGE)
        .and_then(|v| v.to_str().ok())
        .map(|v| parse_range_header(v, size));

    let (status, start, len) = match range {
        None => (StatusCode::OK, 0, size),
        Some(Ok((start, end))) => (StatusCode::PARTIAL_CONTENT, start, end - start + 1),
        Some(Err(e)) => {
            debug!(name = %file.name(), size, error = %e, "rejecting range");
            let mut response = text_response(StatusCode::RANGE_NOT_SATISFIABLE, "416 range not satisfiable");
            insert_header(&mut response, CONTENT_RANGE, &format!("bytes */{size}"));
            return response;
        }
    };

    let body = if method == Method::HEAD {
        Bytes::new()
    } else {
        match read_range(&mut file, start, len).await {
            Ok(data) => data,
            Err(e) => return error_response(file.name(), &e),
        }
    };

    let mut response = body_response(status, method, body);
    insert_header(&mut response, CONTENT_LENGTH, &len.to_string());
    insert_header(&mut response, CONTENT_TYPE, &content_type(info));
    response
        .headers_mut()
        .insert(ACCEPT_RANGES, HeaderValue::from_static("bytes"));
    if let Some(mod_time) = info.mod_time() {
        let formatted = mod_time.format("%a, %d %b %Y %H:%M:%S GMT").to_string();
        insert_header(&mut response, LAST_MODIFIED, &formatted);
    }
    if let Some(md5) = info.attributes().and_then(|a| a.md5.as_deref()) {
        insert_header(&mut response, ETAG, &quoted_etag(md5));
    }
    if status == StatusCode::PARTIAL_CONTENT {
        let end = start + len - 1;
        insert_header(&mut response, CONTENT_RANGE, &format!("bytes {start}-{end}/{size}"));
    }

    if file.close().is_err() {
        debug!("close after serving failed");
    }
    response
}

/// Read `len` bytes starting at `start`, or fewer if the blob ends first.
async fn read_range(file: &mut BlobFile, start: u64, len: u64) -> Result<Bytes, BlobFsError> {
    let start = i64::try_from(start).unwrap_or(i64::MAX);
    file.seek(start, Whence::Start).await?;

    let mut data = Vec::with_capacity(usize::try_from(len).unwrap_or(0).min(1 << 20));
    let mut chunk = vec![0u8; 64 * 1024];
    let mut remaining = len;
    while remaining > 0 {
        let want = usize::try_from(remaining).map_or(chunk.len(), |r| r.min(chunk.len()));
        let n = file.read(&mut chunk[..want]).await?;
        if n == 0 {
            break;
        }
        data.extend_from_slice(&chunk[..n]);
        remaining -= n as u64;
    }
    Ok(Bytes::from(data))
}

fn content_type(info: &FileInfo) -> String {
    info.attributes()
        .and_then(|a| a.content_type.clone())
        .unwrap_or_else(|| {
            mime_guess::from_path(info.name())
                .first_or_octet_stream()
                .to_string()
        })
}

/// Percent-decode the request path and normalize it to an absolute path
/// without `.` segments. `..` segments are rejected.
fn clean_path(raw: &str) -> Option<String> {
    let decoded = percent_decode_str(raw).decode_utf8().ok()?;
    let trailing = decoded.ends_with('/');

    let mut segments = Vec::new();
    for segment in decoded.split('/') {
        match segment {
            "" | "." => {}
            ".." => return None,
            s => segments.push(s),
        }
    }

    let mut path = format!("/{}", segments.join("/"));
    if trailing && !segments.is_empty() {
        path.push('/');
    }
    Some(path)
}

fn error_response(path: &str, err: &BlobFsError) -> FileResponse {
    if err.is_not_exist() {
        return text_response(StatusCode::NOT_FOUND, "404 page not found");
    }
    match err {
        BlobFsError::Timeout { .. } => {
            error!(path, error = %err, "request timed out");
            text_response(StatusCode::GATEWAY_TIMEOUT, "504 gateway timeout")
        }
        _ => {
            error!(path, error = %err, "failed to serve path");
            text_response(StatusCode::INTERNAL_SERVER_ERROR, "500 internal server error")
        }
    }
}

fn redirect(location: &str) -> FileResponse {
    let mut response = body_response(StatusCode::MOVED_PERMANENTLY, &Method::GET, Bytes::new());
    insert_header(&mut response, LOCATION, location);
    response
}

fn text_response(status: StatusCode, message: &'static str) -> FileResponse {
    let mut response = body_response(status, &Method::GET, Bytes::from(format!("{message}\n")));
    response.headers_mut().insert(
        CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    response
}

fn body_response(status: StatusCode, method: &Method, body: Bytes) -> FileResponse {
    let body = if method == Method::HEAD { Bytes::new() } else { body };
    let mut response = Response::new(Full::new(body));
    *response.status_mut() = status;
    response
}

fn insert_header(response: &mut FileResponse, name: http::HeaderName, value: &str) {
    if let Ok(value) = HeaderValue::from_str(value) {
        response.headers_mut().insert(name, value);
    }
}
