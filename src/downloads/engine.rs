//! Existence-checked, streamed download transfer.
//!
//! The engine does no rate accounting: download routes are wrapped by the
//! download limiter before a request ever gets here.

use std::io;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::{
    body::{Body, Bytes},
    extract::Extension,
    http::{HeaderValue, Method, StatusCode, header},
    response::{IntoResponse, Response},
};
use futures_util::Stream;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use tokio::fs::File;
use tokio_util::io::ReaderStream;

use crate::downloads::catalog::DownloadEntry;
use crate::observability::metrics;

pub const NOT_FOUND_MESSAGE: &str = "File not found.";
pub const FAILED_MESSAGE: &str = "Download failed.";

/// RFC 5987 `attr-char`: everything outside it is percent-encoded.
const ATTR_CHARS: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'!')
    .remove(b'#')
    .remove(b'$')
    .remove(b'&')
    .remove(b'+')
    .remove(b'-')
    .remove(b'.')
    .remove(b'^')
    .remove(b'_')
    .remove(b'`')
    .remove(b'|')
    .remove(b'~');

/// Handler bound to every download route.
pub async fn serve_download(
    method: Method,
    Extension(entry): Extension<Arc<DownloadEntry>>,
) -> Response {
    transfer(&entry, method == Method::HEAD).await
}

/// Check the asset still exists, then stream it as an attachment.
pub async fn transfer(entry: &DownloadEntry, head_only: bool) -> Response {
    let len = match tokio::fs::metadata(entry.source()).await {
        Ok(meta) if meta.is_file() => meta.len(),
        Ok(_) => return missing(entry),
        Err(e) if e.kind() == io::ErrorKind::NotFound => return missing(entry),
        Err(e) => return failed(entry, &e),
    };

    if head_only {
        return attachment(entry, len, Body::empty());
    }

    let file = match File::open(entry.source()).await {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return missing(entry),
        Err(e) => return failed(entry, &e),
    };

    tracing::info!(
        token = %entry.token(),
        file = %entry.display_name(),
        bytes = len,
        "Download started"
    );
    let body = Body::from_stream(Transfer::new(entry, len, ReaderStream::new(file)));
    attachment(entry, len, body)
}

fn missing(entry: &DownloadEntry) -> Response {
    tracing::warn!(
        token = %entry.token(),
        path = %entry.source().display(),
        "Download asset missing"
    );
    metrics::record_download(entry.token(), "missing");
    (StatusCode::NOT_FOUND, NOT_FOUND_MESSAGE).into_response()
}

/// Nothing has been committed yet, so a clean 500 is still possible.
fn failed(entry: &DownloadEntry, error: &io::Error) -> Response {
    tracing::error!(
        token = %entry.token(),
        path = %entry.source().display(),
        error = %error,
        "Download failed before transfer"
    );
    metrics::record_download(entry.token(), "failed");
    (StatusCode::INTERNAL_SERVER_ERROR, FAILED_MESSAGE).into_response()
}

/// Build the attachment response around `body`.
pub fn attachment(entry: &DownloadEntry, len: u64, body: Body) -> Response {
    let mut response = Response::new(body);
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/octet-stream"),
    );
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(len));
    headers.insert(
        header::CONTENT_DISPOSITION,
        content_disposition(entry.display_name()),
    );
    response
}

/// `attachment; filename="..."`, with an RFC 5987 `filename*` when the
/// name is not plain ASCII.
pub fn content_disposition(name: &str) -> HeaderValue {
    let plain = |c: char| (c.is_ascii_graphic() || c == ' ') && c != '"' && c != '\\';

    let value = if name.chars().all(plain) {
        format!("attachment; filename=\"{name}\"")
    } else {
        let fallback: String = name.chars().map(|c| if plain(c) { c } else { '_' }).collect();
        format!(
            "attachment; filename=\"{fallback}\"; filename*=UTF-8''{}",
            utf8_percent_encode(name, ATTR_CHARS)
        )
    };

    HeaderValue::from_str(&value).unwrap_or_else(|_| HeaderValue::from_static("attachment"))
}

/// Body stream that logs how the transfer ended.
///
/// A read error surfaces to hyper, which aborts the connection; the
/// status line and headers have already gone out, so no second response
/// is attempted. hyper stops polling once `Content-Length` bytes are
/// out, so reaching `expected` counts as completion; dropping short of
/// it means the client went away.
pub struct Transfer<S> {
    inner: S,
    token: String,
    expected: u64,
    sent: u64,
    state: TransferState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TransferState {
    Streaming,
    Completed,
    Failed,
}

impl<S> Transfer<S> {
    pub fn new(entry: &DownloadEntry, expected: u64, inner: S) -> Self {
        Self {
            inner,
            token: entry.token().to_string(),
            expected,
            sent: 0,
            state: TransferState::Streaming,
        }
    }

    fn complete(&mut self) {
        self.state = TransferState::Completed;
        tracing::info!(token = %self.token, bytes_sent = self.sent, "Download completed");
        metrics::record_download(&self.token, "completed");
    }
}

impl<S> Stream for Transfer<S>
where
    S: Stream<Item = io::Result<Bytes>> + Unpin,
{
    type Item = io::Result<Bytes>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = &mut *self;
        if this.state != TransferState::Streaming {
            return Poll::Ready(None);
        }

        match Pin::new(&mut this.inner).poll_next(cx) {
            Poll::Ready(Some(Ok(chunk))) => {
                this.sent += chunk.len() as u64;
                if this.sent >= this.expected {
                    this.complete();
                }
                Poll::Ready(Some(Ok(chunk)))
            }
            Poll::Ready(Some(Err(e))) => {
                this.state = TransferState::Failed;
                tracing::error!(
                    token = %this.token,
                    bytes_sent = this.sent,
                    error = %e,
                    "Download interrupted"
                );
                metrics::record_download(&this.token, "interrupted");
                Poll::Ready(Some(Err(e)))
            }
            Poll::Ready(None) => {
                this.complete();
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

impl<S> Drop for Transfer<S> {
    fn drop(&mut self) {
        if self.state != TransferState::Streaming {
            return;
        }
        if self.sent >= self.expected {
            self.complete();
        } else {
            tracing::warn!(
                token = %self.token,
                bytes_sent = self.sent,
                "Client disconnected during download"
            );
            metrics::record_download(&self.token, "aborted");
        }
    }
}
