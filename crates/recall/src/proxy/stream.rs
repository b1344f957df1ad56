//! Streaming relay
//!
//! Re-chunks the upstream body into bounded pieces while relaying it to the
//! client. Chunks are only pulled from upstream when the client polls for
//! the next one, so a slow reader slows the upstream read and a disconnect
//! (which drops the stream) releases the upstream connection.

use bytes::Bytes;
use futures::stream::Stream;
use std::pin::Pin;
use std::task::{Context, Poll};

/// Largest chunk handed to the client
pub const RELAY_CHUNK_SIZE: usize = 1024;

/// A stream wrapper that splits chunks larger than `chunk_size`.
///
/// Chunks are never merged, so an upstream that sends N chunks of at most
/// `chunk_size` bytes produces exactly N chunks, in order. Empty chunks are
/// skipped.
pub struct ChunkedStream<S> {
    inner: S,
    pending: Bytes,
    chunk_size: usize,
}

impl<S> ChunkedStream<S> {
    pub fn new(inner: S, chunk_size: usize) -> Self {
        Self {
            inner,
            pending: Bytes::new(),
            chunk_size: chunk_size.max(1),
        }
    }
}

impl<S> Stream for ChunkedStream<S>
where
    S: Stream<Item = Result<Bytes, std::io::Error>> + Unpin,
{
    type Item = Result<Bytes, std::io::Error>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = &mut *self;

        loop {
            if !this.pending.is_empty() {
                let take = this.pending.len().min(this.chunk_size);
                return Poll::Ready(Some(Ok(this.pending.split_to(take))));
            }

            match Pin::new(&mut this.inner).poll_next(cx) {
                Poll::Ready(Some(Ok(bytes))) => {
                    this.pending = bytes;
                }
                Poll::Ready(Some(Err(e))) => {
                    tracing::warn!(
                        error_type = "upstream",
                        error_message = %e,
                        "Upstream stream failed mid-response, terminating relay"
                    );
                    return Poll::Ready(Some(Err(e)));
                }
                Poll::Ready(None) => return Poll::Ready(None),
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}
