//! In-process buffer of live chat streams
//!
//! Every chunk of a registered stream is kept until the stream finishes, so a
//! client that reconnects can replay what it missed and then follow along.

use std::collections::HashMap;
use std::sync::Mutex;

use futures::stream::{self, BoxStream, StreamExt};
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use uuid::Uuid;

use super::ui::UiChunk;

struct BufferedStream {
    chunks: Vec<UiChunk>,
    /// Dropping a sender ends that follower's stream
    followers: Vec<mpsc::UnboundedSender<UiChunk>>,
}

#[derive(Default)]
pub struct StreamRegistry {
    streams: Mutex<HashMap<Uuid, BufferedStream>>,
}

impl StreamRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&self, stream_id: Uuid) {
        let mut streams = self.streams.lock().unwrap_or_else(|e| e.into_inner());
        streams.insert(
            stream_id,
            BufferedStream {
                chunks: Vec::new(),
                followers: Vec::new(),
            },
        );
    }

    /// Append a chunk and hand it to current followers
    ///
    /// Followers are unbounded, so a slow reader delays but never loses chunks.
    pub fn push(&self, stream_id: Uuid, chunk: UiChunk) {
        let mut streams = self.streams.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(buffered) = streams.get_mut(&stream_id) {
            buffered
                .followers
                .retain(|follower| follower.send(chunk.clone()).is_ok());
            buffered.chunks.push(chunk);
        }
    }

    /// End the stream and forget its buffer
    pub fn finish(&self, stream_id: Uuid) {
        let mut streams = self.streams.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(buffered) = streams.remove(&stream_id) {
            tracing::debug!(
                %stream_id,
                followers = buffered.followers.len(),
                "resumable stream finished"
            );
        }
    }

    pub fn is_live(&self, stream_id: Uuid) -> bool {
        let streams = self.streams.lock().unwrap_or_else(|e| e.into_inner());
        streams.contains_key(&stream_id)
    }

    /// Replay a live stream from its first chunk and follow it to the end
    ///
    /// Returns `None` when the stream already finished or was never created.
    pub fn resume(&self, stream_id: Uuid) -> Option<BoxStream<'static, UiChunk>> {
        let mut streams = self.streams.lock().unwrap_or_else(|e| e.into_inner());
        let buffered = streams.get_mut(&stream_id)?;

        // Snapshot and subscribe under one lock so no chunk is missed or doubled
        let replay = buffered.chunks.clone();
        let (tx, rx) = mpsc::unbounded_channel();
        buffered.followers.push(tx);
        drop(streams);

        let live = UnboundedReceiverStream::new(rx);
        Some(stream::iter(replay).chain(live).boxed())
    }
}
