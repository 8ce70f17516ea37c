// Server-sent event framing of the UI message stream

use bytes::Bytes;
use futures_util::stream::{self, Stream, StreamExt};
use std::convert::Infallible;
use warp::http::header::{HeaderValue, CACHE_CONTROL, CONNECTION, CONTENT_TYPE};
use warp::hyper::Body;
use warp::reply::Response;

use crate::chat::UiChunk;

/// Header telling the web client which stream protocol the body speaks
pub const UI_STREAM_HEADER: &str = "x-vercel-ai-ui-message-stream";

pub const DONE_FRAME: &str = "data: [DONE]\n\n";

/// Frame one chunk as an SSE `data:` event
pub fn frame(chunk: &UiChunk) -> Bytes {
    match serde_json::to_string(chunk) {
        Ok(json) => Bytes::from(format!("data: {}\n\n", json)),
        Err(e) => {
            // Chunks hold only strings and JSON values
            tracing::error!(error = %e, "failed to serialize stream chunk");
            Bytes::new()
        }
    }
}

/// Stream `chunks` as the response body, followed by the `[DONE]` marker
pub fn ui_stream_reply<S>(chunks: S) -> Response
where
    S: Stream<Item = UiChunk> + Send + 'static,
{
    let body = chunks
        .map(|chunk| frame(&chunk))
        .chain(stream::once(async { Bytes::from_static(DONE_FRAME.as_bytes()) }))
        .map(Ok::<_, Infallible>);

    let mut response = Response::new(Body::wrap_stream(body));
    let headers = response.headers_mut();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/event-stream"));
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));
    headers.insert(UI_STREAM_HEADER, HeaderValue::from_static("v1"));
    response
}

/// Split an SSE body back into its JSON payloads, `[DONE]` excluded
pub fn parse_frames(body: &str) -> Vec<serde_json::Value> {
    body.split("\n\n")
        .filter_map(|event| event.strip_prefix("data: "))
        .filter(|data| *data != "[DONE]")
        .filter_map(|data| serde_json::from_str(data).ok())
        .collect()
}
