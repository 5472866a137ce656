//! Invocation event streams
//!
//! Decodes the platform's newline-delimited JSON event stream for a
//! long-running invocation and reduces it to a terminal snapshot.

use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use futures::{Stream, StreamExt};
use tracing::{debug, warn};
use wharf_core::{Error, Result};

use crate::types::{Invocation, InvocationEvent, InvocationStatus};

type ByteChunks = Pin<Box<dyn Stream<Item = reqwest::Result<Bytes>> + Send>>;

/// Finite, non-restartable stream of [`InvocationEvent`]s decoded from a
/// platform response body.
pub struct InvocationEventStream {
    chunks: ByteChunks,
    buf: Vec<u8>,
    exhausted: bool,
}

impl InvocationEventStream {
    pub(crate) fn new<S>(chunks: S) -> Self
    where
        S: Stream<Item = reqwest::Result<Bytes>> + Send + 'static,
    {
        Self {
            chunks: Box::pin(chunks),
            buf: Vec::new(),
            exhausted: false,
        }
    }

    /// Pop the next complete line out of the buffer, skipping blanks.
    fn take_line(&mut self) -> Option<String> {
        while let Some(pos) = self.buf.iter().position(|&b| b == b'\n') {
            let raw: Vec<u8> = self.buf.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&raw).trim().to_string();
            if !line.is_empty() {
                return Some(line);
            }
        }
        None
    }

    /// Whatever remains after the body ends without a trailing newline.
    fn take_tail(&mut self) -> Option<String> {
        if self.buf.is_empty() {
            return None;
        }
        let line = String::from_utf8_lossy(&self.buf).trim().to_string();
        self.buf.clear();
        if line.is_empty() {
            None
        } else {
            Some(line)
        }
    }
}

fn decode_event(line: &str) -> Result<InvocationEvent> {
    serde_json::from_str(line)
        .map_err(|e| Error::upstream(format!("undecodable invocation event: {e}")))
}

impl Stream for InvocationEventStream {
    type Item = Result<InvocationEvent>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        loop {
            if let Some(line) = this.take_line() {
                return Poll::Ready(Some(decode_event(&line)));
            }
            if this.exhausted {
                return match this.take_tail() {
                    Some(line) => Poll::Ready(Some(decode_event(&line))),
                    None => Poll::Ready(None),
                };
            }
            match this.chunks.as_mut().poll_next(cx) {
                Poll::Ready(Some(Ok(chunk))) => this.buf.extend_from_slice(&chunk),
                Poll::Ready(Some(Err(e))) => {
                    this.exhausted = true;
                    return Poll::Ready(Some(Err(Error::upstream(format!(
                        "invocation event stream failed: {e}"
                    )))));
                }
                Poll::Ready(None) => this.exhausted = true,
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

/// Reduce an invocation's event stream to its final snapshot.
///
/// An `error` event short-circuits: the error payload is attached to the
/// tracked invocation and returned at once. Each `invocation_state` event
/// replaces the snapshot; the fold stops on the first terminal status. If
/// the stream ends without ever reaching a terminal status, the last seen
/// snapshot is returned as-is; callers may therefore observe a `running`
/// status on an invocation the stream stopped reporting on.
pub async fn follow_invocation<S>(initial: Invocation, mut events: S) -> Result<Invocation>
where
    S: Stream<Item = Result<InvocationEvent>> + Unpin,
{
    let mut snapshot = initial;
    while let Some(event) = events.next().await {
        match event? {
            InvocationEvent::Error { error } => {
                warn!(invocation = %snapshot.id, "Invocation stream reported an error");
                snapshot.status = InvocationStatus::Failed;
                snapshot.error = Some(error);
                return Ok(snapshot);
            }
            InvocationEvent::InvocationState { invocation } => {
                snapshot = invocation;
                if snapshot.status.is_terminal() {
                    return Ok(snapshot);
                }
            }
        }
    }
    debug!(
        invocation = %snapshot.id,
        status = ?snapshot.status,
        "Invocation stream ended before a terminal status"
    );
    Ok(snapshot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;
    use serde_json::json;

    fn inv(id: &str, status: InvocationStatus) -> Invocation {
        Invocation {
            id: id.to_string(),
            status,
            result: None,
            error: None,
        }
    }

    fn state(id: &str, status: InvocationStatus) -> Result<InvocationEvent> {
        Ok(InvocationEvent::InvocationState {
            invocation: inv(id, status),
        })
    }

    #[tokio::test]
    async fn stops_at_first_terminal_state() {
        // A poisoned event after the terminal one proves consumption stops.
        let events = stream::iter(vec![
            state("inv-1", InvocationStatus::Running),
            state("inv-1", InvocationStatus::Succeeded),
            Err(Error::upstream("must not be polled")),
        ]);
        let result = follow_invocation(inv("inv-1", InvocationStatus::Queued), events)
            .await
            .unwrap();
        assert_eq!(result.status, InvocationStatus::Succeeded);
    }

    #[tokio::test]
    async fn error_event_short_circuits_with_original_id() {
        let events = stream::iter(vec![
            state("inv-2", InvocationStatus::Running),
            Ok(InvocationEvent::Error {
                error: json!({"message": "worker crashed"}),
            }),
            state("inv-2", InvocationStatus::Succeeded),
        ]);
        let result = follow_invocation(inv("inv-2", InvocationStatus::Queued), events)
            .await
            .unwrap();
        assert_eq!(result.id, "inv-2");
        assert_eq!(result.status, InvocationStatus::Failed);
        assert!(result.error.is_some());
    }

    #[tokio::test]
    async fn exhausted_stream_returns_last_snapshot() {
        let events = stream::iter(vec![
            state("inv-3", InvocationStatus::Running),
        ]);
        let result = follow_invocation(inv("inv-3", InvocationStatus::Queued), events)
            .await
            .unwrap();
        assert_eq!(result.status, InvocationStatus::Running);
    }

    #[tokio::test]
    async fn empty_stream_returns_initial_snapshot() {
        let events = stream::iter(Vec::<Result<InvocationEvent>>::new());
        let result = follow_invocation(inv("inv-4", InvocationStatus::Queued), events)
            .await
            .unwrap();
        assert_eq!(result.status, InvocationStatus::Queued);
    }

    #[tokio::test]
    async fn event_stream_splits_lines_across_chunks() {
        let chunks: Vec<reqwest::Result<Bytes>> = vec![
            Ok(Bytes::from_static(
                b"{\"type\":\"invocation_state\",\"invocation\":{\"id\":\"i\",\"sta",
            )),
            Ok(Bytes::from_static(b"tus\":\"running\"}}\n")),
            Ok(Bytes::from_static(
                b"{\"type\":\"invocation_state\",\"invocation\":{\"id\":\"i\",\"status\":\"succeeded\"}}",
            )),
        ];
        let mut events = InvocationEventStream::new(stream::iter(chunks));
        let first = events.next().await.unwrap().unwrap();
        assert!(matches!(
            first,
            InvocationEvent::InvocationState { ref invocation }
                if invocation.status == InvocationStatus::Running
        ));
        // Tail line without a trailing newline still decodes.
        let second = events.next().await.unwrap().unwrap();
        assert!(matches!(
            second,
            InvocationEvent::InvocationState { ref invocation }
                if invocation.status == InvocationStatus::Succeeded
        ));
        assert!(events.next().await.is_none());
    }
}
