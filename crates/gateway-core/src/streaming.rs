//! Streaming support.
//!
//! [`TextStream`] is the single lazy sequence handed to callers no matter
//! which candidate served the request or whether the backend streamed.

use crate::backend::{BackendModel, StreamEvent};
use crate::error::{GatewayError, GatewayResult};
use bytes::Bytes;
use futures::stream::{BoxStream, Stream};
use pin_project_lite::pin_project;
use std::fmt;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

pin_project! {
    /// A one-shot stream of text chunks.
    ///
    /// The stream is consumed by value and cannot be restarted. Dropping it
    /// drops the underlying response body.
    pub struct TextStream {
        #[pin]
        inner: BoxStream<'static, GatewayResult<String>>,
        done: bool,
    }
}

impl TextStream {
    /// Wrap an arbitrary chunk stream.
    pub fn new<S>(stream: S) -> Self
    where
        S: Stream<Item = GatewayResult<String>> + Send + 'static,
    {
        Self {
            inner: Box::pin(stream),
            done: false,
        }
    }

    /// A stream that yields exactly one chunk and ends.
    pub fn once(text: impl Into<String>) -> Self {
        Self::new(futures::stream::once(futures::future::ready(Ok(text.into()))))
    }

    /// Parse a server-sent event body, decoding each event with `backend`.
    pub fn from_sse<S>(stream: S, backend: Arc<dyn BackendModel>) -> Self
    where
        S: Stream<Item = GatewayResult<Bytes>> + Send + 'static,
    {
        Self::new(parse_sse_stream(stream, backend))
    }

    /// Collect all content from the stream.
    pub async fn collect_text(mut self) -> GatewayResult<String> {
        use futures::StreamExt;

        let mut content = String::new();
        while let Some(chunk) = self.next().await {
            content.push_str(&chunk?);
        }
        Ok(content)
    }

    /// Check if the stream is done.
    pub fn is_done(&self) -> bool {
        self.done
    }
}

impl Stream for TextStream {
    type Item = GatewayResult<String>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.project();

        if *this.done {
            return Poll::Ready(None);
        }

        match this.inner.poll_next(cx) {
            Poll::Ready(Some(Ok(chunk))) => Poll::Ready(Some(Ok(chunk))),
            Poll::Ready(Some(Err(e))) => {
                *this.done = true;
                Poll::Ready(Some(Err(e)))
            }
            Poll::Ready(None) => {
                *this.done = true;
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

impl fmt::Debug for TextStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextStream").field("done", &self.done).finish()
    }
}

/// Parse an SSE byte stream into text deltas.
fn parse_sse_stream<S>(
    stream: S,
    backend: Arc<dyn BackendModel>,
) -> impl Stream<Item = GatewayResult<String>>
where
    S: Stream<Item = GatewayResult<Bytes>> + Send + 'static,
{
    async_stream::try_stream! {
        use futures::StreamExt;

        let mut stream = Box::pin(stream);
        let mut buffer: Vec<u8> = Vec::new();

        while let Some(result) = stream.next().await {
            buffer.extend_from_slice(&result?);

            while let Some((event_end, separator)) = find_event_end(&buffer) {
                let raw: Vec<u8> = buffer.drain(..event_end + separator).collect();
                let event = std::str::from_utf8(&raw[..event_end])
                    .map_err(|e| GatewayError::streaming(format!("Invalid UTF-8: {e}")))?;

                if let Some(data) = event_data(event) {
                    match decode(backend.as_ref(), &data)? {
                        StreamEvent::Delta(text) => yield text,
                        StreamEvent::Done => return,
                        StreamEvent::Skip => {}
                    }
                }
            }
        }

        // Trailing event without a blank line terminator
        let rest = std::str::from_utf8(&buffer)
            .map_err(|e| GatewayError::streaming(format!("Invalid UTF-8: {e}")))?;
        if let Some(data) = event_data(rest) {
            match decode(backend.as_ref(), &data)? {
                StreamEvent::Delta(text) => yield text,
                StreamEvent::Done => return,
                StreamEvent::Skip => {}
            }
        }
    }
}

/// Position and separator length of the first complete event.
fn find_event_end(buffer: &[u8]) -> Option<(usize, usize)> {
    let lf = buffer.windows(2).position(|w| w == b"\n\n").map(|i| (i, 2));
    let crlf = buffer.windows(4).position(|w| w == b"\r\n\r\n").map(|i| (i, 4));
    match (lf, crlf) {
        (Some(a), Some(b)) => Some(if a.0 <= b.0 { a } else { b }),
        (a, b) => a.or(b),
    }
}

/// Payload of one event: its `data:` lines joined with `\n`.
fn event_data(event: &str) -> Option<String> {
    let lines: Vec<&str> = event
        .lines()
        .filter_map(|line| {
            line.strip_prefix("data:")
                .map(|data| data.strip_prefix(' ').unwrap_or(data))
        })
        .collect();
    if lines.is_empty() {
        None
    } else {
        Some(lines.join("\n"))
    }
}

fn decode(backend: &dyn BackendModel, data: &str) -> GatewayResult<StreamEvent> {
    if data.trim() == "[DONE]" {
        return Ok(StreamEvent::Done);
    }
    backend.decode_stream_event(data).map_err(|e| match e {
        GatewayError::Streaming { .. } => e,
        other => GatewayError::streaming(other.to_string()),
    })
}
