//! Split `<think>` sections of model text into reasoning deltas

use async_stream::stream;
use async_trait::async_trait;
use futures::StreamExt;

use crate::llm::core::{
    error::LlmError,
    provider::{EventStream, LlmProvider},
    types::{ContentDelta, GenerateRequest, StreamEvent},
};

/// A run of text classified as answer or reasoning
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Text(String),
    Reasoning(String),
}

impl Segment {
    fn into_event(self, index: usize) -> StreamEvent {
        let delta = match self {
            Segment::Text(text) => ContentDelta::TextDelta { text },
            Segment::Reasoning(text) => ContentDelta::ReasoningDelta { text },
        };
        StreamEvent::ContentDelta { index, delta }
    }
}

/// Incremental tag splitter
///
/// Tags may be cut anywhere across chunks. Text that could still be the
/// start of a tag is held back until the next chunk (or `flush`) decides it.
#[derive(Debug)]
pub struct ReasoningExtractor {
    open_tag: String,
    close_tag: String,
    in_reasoning: bool,
    buffer: String,
}

impl ReasoningExtractor {
    pub fn new(tag_name: &str) -> Self {
        Self {
            open_tag: format!("<{}>", tag_name),
            close_tag: format!("</{}>", tag_name),
            in_reasoning: false,
            buffer: String::new(),
        }
    }

    pub fn push(&mut self, chunk: &str) -> Vec<Segment> {
        self.buffer.push_str(chunk);
        let mut segments = Vec::new();

        loop {
            let tag = if self.in_reasoning {
                &self.close_tag
            } else {
                &self.open_tag
            };

            if let Some(pos) = self.buffer.find(tag.as_str()) {
                let tag_len = tag.len();
                let before: String = self.buffer.drain(..pos).collect();
                self.buffer.drain(..tag_len);
                if let Some(segment) = self.segment(before) {
                    segments.push(segment);
                }
                self.in_reasoning = !self.in_reasoning;
                continue;
            }

            let keep = partial_tag_len(&self.buffer, tag);
            let ready = self.buffer.len() - keep;
            if ready > 0 {
                let text: String = self.buffer.drain(..ready).collect();
                if let Some(segment) = self.segment(text) {
                    segments.push(segment);
                }
            }
            break;
        }

        segments
    }

    /// Release any held-back text
    pub fn flush(&mut self) -> Option<Segment> {
        let text = std::mem::take(&mut self.buffer);
        self.segment(text)
    }

    fn segment(&self, text: String) -> Option<Segment> {
        if text.is_empty() {
            return None;
        }
        Some(if self.in_reasoning {
            Segment::Reasoning(text)
        } else {
            Segment::Text(text)
        })
    }
}

/// Length of the longest suffix of `buffer` that is a proper prefix of `tag`
fn partial_tag_len(buffer: &str, tag: &str) -> usize {
    (1..tag.len())
        .rev()
        .find(|&k| buffer.ends_with(&tag[..k]))
        .unwrap_or(0)
}

/// Provider wrapper applying [`ReasoningExtractor`] to every text delta
pub struct ExtractReasoning {
    inner: Box<dyn LlmProvider>,
    tag_name: String,
}

impl ExtractReasoning {
    pub fn new(inner: Box<dyn LlmProvider>, tag_name: impl Into<String>) -> Self {
        Self {
            inner,
            tag_name: tag_name.into(),
        }
    }
}

#[async_trait]
impl LlmProvider for ExtractReasoning {
    async fn stream_generate(&self, request: GenerateRequest) -> Result<EventStream, LlmError> {
        let mut upstream = self.inner.stream_generate(request).await?;
        let mut extractor = ReasoningExtractor::new(&self.tag_name);

        let events = stream! {
            let mut last_index = 0;

            while let Some(item) = upstream.next().await {
                match item {
                    Ok(StreamEvent::ContentDelta {
                        index,
                        delta: ContentDelta::TextDelta { text },
                    }) => {
                        last_index = index;
                        for segment in extractor.push(&text) {
                            yield Ok(segment.into_event(index));
                        }
                    }
                    Ok(event) => {
                        if let Some(segment) = extractor.flush() {
                            yield Ok(segment.into_event(last_index));
                        }
                        yield Ok(event);
                    }
                    Err(e) => yield Err(e),
                }
            }

            if let Some(segment) = extractor.flush() {
                yield Ok(segment.into_event(last_index));
            }
        };

        Ok(Box::pin(events))
    }
}
