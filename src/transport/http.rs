//! HTTP transport against an [`AgentServer`](crate::server::AgentServer)

use std::fmt::Display;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::{stream, Stream, StreamExt};
use tracing::debug;

use super::{endpoint, BoxEventStream, SendMode, SendRequest, Transport};
use crate::card::{AgentCard, AGENT_CARD_PATH};
use crate::error::CourierError;
use crate::protocol::{Event, Message};

pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// `connect_timeout` bounds connection setup only; streams may run long
    pub fn new(connect_timeout: Duration) -> Result<Self, CourierError> {
        let client = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .user_agent(concat!("courier/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn fetch_card(&self, address: &str) -> Result<AgentCard, CourierError> {
        let url = endpoint(address, AGENT_CARD_PATH);
        debug!(url = %url, "Fetching agent card");
        let card = self.client.get(&url).send().await?.error_for_status()?.json().await?;
        Ok(card)
    }

    async fn open_stream(&self, card: &AgentCard, message: Message) -> Result<BoxEventStream, CourierError> {
        let url = endpoint(&card.url, "message");
        debug!(url = %url, agent = %card.name, "Opening task stream");
        let response = self
            .client
            .post(&url)
            .json(&SendRequest {
                message,
                mode: SendMode::Streaming,
            })
            .send()
            .await?
            .error_for_status()?;

        Ok(Box::pin(ndjson_events(Box::pin(response.bytes_stream()))))
    }
}

struct LineReader<S> {
    body: S,
    buffer: Vec<u8>,
    exhausted: bool,
}

fn parse_line(line: &[u8]) -> Option<Result<Event, CourierError>> {
    let text = String::from_utf8_lossy(line);
    let text = text.trim();
    (!text.is_empty()).then(|| serde_json::from_str(text).map_err(CourierError::from))
}

/// Decode newline-delimited JSON events from a chunked byte stream.
///
/// Chunk boundaries need not align with lines. A body error ends the stream
/// after being yielded once.
pub fn ndjson_events<S, B, E>(body: S) -> impl Stream<Item = Result<Event, CourierError>> + Send
where
    S: Stream<Item = Result<B, E>> + Send + Unpin + 'static,
    B: AsRef<[u8]> + Send,
    E: Display + Send,
{
    let reader = LineReader {
        body,
        buffer: Vec::new(),
        exhausted: false,
    };

    stream::unfold(reader, |mut reader| async move {
        loop {
            if let Some(newline) = reader.buffer.iter().position(|b| *b == b'\n') {
                let line: Vec<u8> = reader.buffer.drain(..=newline).collect();
                match parse_line(&line) {
                    Some(item) => return Some((item, reader)),
                    None => continue,
                }
            }

            if reader.exhausted {
                let rest = std::mem::take(&mut reader.buffer);
                return parse_line(&rest).map(|item| (item, reader));
            }

            match reader.body.next().await {
                Some(Ok(chunk)) => reader.buffer.extend_from_slice(chunk.as_ref()),
                Some(Err(e)) => {
                    reader.exhausted = true;
                    reader.buffer.clear();
                    return Some((Err(CourierError::Transport(e.to_string())), reader));
                }
                None => reader.exhausted = true,
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{ContextId, TaskId};

    fn ok_chunks(chunks: Vec<String>) -> impl Stream<Item = Result<Vec<u8>, String>> + Send + Unpin {
        stream::iter(chunks.into_iter().map(|c| Ok(c.into_bytes())))
    }

    fn agent_line(text: &str) -> String {
        let message = Message::agent_text(text).for_task(TaskId::from("t"), ContextId::from("c"));
        serde_json::to_string(&Event::Message(message)).unwrap()
    }

    #[tokio::test]
    async fn test_lines_split_across_chunks() {
        let first = agent_line("one");
        let second = agent_line("two");
        let body = format!("{first}\n\n{second}");
        let (a, b) = body.split_at(first.len() / 2);

        let events: Vec<_> = ndjson_events(ok_chunks(vec![a.to_string(), b.to_string()]))
            .collect()
            .await;
        assert_eq!(events.len(), 2);
        let texts: Vec<String> = events
            .into_iter()
            .map(|e| e.unwrap().as_agent_message().unwrap().joined_text())
            .collect();
        assert_eq!(texts, vec!["one", "two"]);
    }

    #[tokio::test]
    async fn test_malformed_line_is_transport_error() {
        let events: Vec<_> = ndjson_events(ok_chunks(vec!["{not json}\n".to_string()])).collect().await;
        assert!(matches!(events.as_slice(), [Err(CourierError::Transport(_))]));
    }

    #[tokio::test]
    async fn test_body_error_ends_stream() {
        let body = stream::iter(vec![
            Err::<&'static [u8], _>("connection reset".to_string()),
            Ok(b"ignored\n".as_slice()),
        ]);
        let events: Vec<_> = ndjson_events(body).collect().await;
        assert_eq!(events.len(), 1);
        assert!(events[0].is_err());
    }
}
