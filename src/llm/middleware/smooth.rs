//! Re-chunk streamed text on word boundaries

use async_stream::stream;
use async_trait::async_trait;
use futures::StreamExt;
use regex::Regex;
use std::sync::LazyLock;
use std::time::Duration;

use crate::llm::core::{
    error::LlmError,
    provider::{EventStream, LlmProvider},
    types::{ContentDelta, GenerateRequest, StreamEvent},
};

static WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\S+\s+").expect("word pattern is valid"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DeltaKind {
    Text,
    Reasoning,
}

fn delta_event(kind: DeltaKind, index: usize, text: String) -> StreamEvent {
    let delta = match kind {
        DeltaKind::Text => ContentDelta::TextDelta { text },
        DeltaKind::Reasoning => ContentDelta::ReasoningDelta { text },
    };
    StreamEvent::ContentDelta { index, delta }
}

/// Take every complete word (with its trailing whitespace) off the front of `buffer`
pub fn split_words(buffer: &mut String) -> Vec<String> {
    let mut words = Vec::new();
    while let Some(m) = WORD.find(buffer) {
        let end = m.end();
        words.push(buffer.drain(..end).collect());
    }
    words
}

/// Provider wrapper emitting text and reasoning one word at a time
///
/// A trailing partial word is held until more text arrives or any other
/// event passes through, at which point it is released as-is.
pub struct SmoothWords {
    inner: Box<dyn LlmProvider>,
    delay: Duration,
}

impl SmoothWords {
    pub fn new(inner: Box<dyn LlmProvider>, delay: Duration) -> Self {
        Self { inner, delay }
    }
}

#[async_trait]
impl LlmProvider for SmoothWords {
    async fn stream_generate(&self, request: GenerateRequest) -> Result<EventStream, LlmError> {
        let mut upstream = self.inner.stream_generate(request).await?;
        let delay = self.delay;

        let events = stream! {
            let mut buffer = String::new();
            let mut current: Option<(DeltaKind, usize)> = None;

            while let Some(item) = upstream.next().await {
                let (kind, index, text) = match item {
                    Ok(StreamEvent::ContentDelta { index, delta: ContentDelta::TextDelta { text } }) => {
                        (DeltaKind::Text, index, text)
                    }
                    Ok(StreamEvent::ContentDelta { index, delta: ContentDelta::ReasoningDelta { text } }) => {
                        (DeltaKind::Reasoning, index, text)
                    }
                    other => {
                        if let Some((kind, index)) = current.take() {
                            if !buffer.is_empty() {
                                yield Ok(delta_event(kind, index, std::mem::take(&mut buffer)));
                            }
                        }
                        yield other;
                        continue;
                    }
                };

                if current.is_some_and(|c| c != (kind, index)) {
                    if let Some((prev_kind, prev_index)) = current {
                        if !buffer.is_empty() {
                            yield Ok(delta_event(prev_kind, prev_index, std::mem::take(&mut buffer)));
                        }
                    }
                }
                current = Some((kind, index));

                buffer.push_str(&text);
                for word in split_words(&mut buffer) {
                    yield Ok(delta_event(kind, index, word));
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                }
            }

            if let Some((kind, index)) = current {
                if !buffer.is_empty() {
                    yield Ok(delta_event(kind, index, buffer));
                }
            }
        };

        Ok(Box::pin(events))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{FinishReason, UsageMetadata};

    struct Scripted(Vec<StreamEvent>);

    #[async_trait]
    impl LlmProvider for Scripted {
        async fn stream_generate(&self, _request: GenerateRequest) -> Result<EventStream, LlmError> {
            Ok(Box::pin(futures::stream::iter(
                self.0.clone().into_iter().map(Ok),
            )))
        }
    }

    fn text(t: &str) -> StreamEvent {
        StreamEvent::ContentDelta {
            index: 0,
            delta: ContentDelta::TextDelta { text: t.to_string() },
        }
    }

    fn request() -> GenerateRequest {
        GenerateRequest {
            messages: vec![],
            tools: None,
            config: Default::default(),
            system: None,
        }
    }

    fn texts(events: &[StreamEvent]) -> Vec<String> {
        events
            .iter()
            .filter_map(|e| match e {
                StreamEvent::ContentDelta {
                    delta: ContentDelta::TextDelta { text },
                    ..
                } => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_split_words() {
        let mut buffer = String::from("Hello big  world");
        assert_eq!(split_words(&mut buffer), vec!["Hello ", "big  "]);
        assert_eq!(buffer, "world");
    }

    #[test]
    fn test_split_words_keeps_leading_whitespace() {
        let mut buffer = String::from(" lead\nnext");
        assert_eq!(split_words(&mut buffer), vec![" lead\n"]);
        assert_eq!(buffer, "next");
    }

    #[tokio::test]
    async fn test_rechunks_on_word_boundaries() {
        let provider = SmoothWords::new(
            Box::new(Scripted(vec![
                text("The qui"),
                text("ck brown fox"),
                StreamEvent::MessageEnd {
                    finish_reason: FinishReason::Stop,
                    usage: UsageMetadata::new(0, 0),
                },
            ])),
            Duration::ZERO,
        );

        let events: Vec<StreamEvent> = provider
            .stream_generate(request())
            .await
            .unwrap()
            .map(|e| e.unwrap())
            .collect()
            .await;

        assert_eq!(texts(&events), vec!["The ", "quick ", "brown ", "fox"]);
        assert!(matches!(events.last(), Some(StreamEvent::MessageEnd { .. })));
    }

    #[tokio::test]
    async fn test_remainder_flushed_at_stream_end() {
        let provider = SmoothWords::new(Box::new(Scripted(vec![text("one two")])), Duration::ZERO);

        let events: Vec<StreamEvent> = provider
            .stream_generate(request())
            .await
            .unwrap()
            .map(|e| e.unwrap())
            .collect()
            .await;

        assert_eq!(texts(&events), vec!["one ", "two"]);
    }

    #[tokio::test]
    async fn test_kind_switch_flushes() {
        let provider = SmoothWords::new(
            Box::new(Scripted(vec![
                StreamEvent::ContentDelta {
                    index: 0,
                    delta: ContentDelta::ReasoningDelta {
                        text: "hmm".to_string(),
                    },
                },
                text("yes"),
            ])),
            Duration::ZERO,
        );

        let events: Vec<StreamEvent> = provider
            .stream_generate(request())
            .await
            .unwrap()
            .map(|e| e.unwrap())
            .collect()
            .await;

        assert_eq!(events.len(), 2);
        assert!(matches!(
            &events[0],
            StreamEvent::ContentDelta { delta: ContentDelta::ReasoningDelta { text }, .. } if text == "hmm"
        ));
        assert_eq!(texts(&events), vec!["yes"]);
    }
}
