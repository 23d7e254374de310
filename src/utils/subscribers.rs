//! Fan-out of coordinator output to any number of consumer streams

use futures::StreamExt;
use futures::stream::{self, BoxStream};
use tokio::sync::mpsc::{UnboundedSender, unbounded_channel};

/// Unbounded subscriber list; closed receivers are pruned on publish
pub struct Subscribers<T> {
    senders: Vec<UnboundedSender<T>>,
    closed: bool,
}

impl<T: Clone + Send + 'static> Subscribers<T> {
    pub fn new() -> Self {
        Self {
            senders: Vec::new(),
            closed: false,
        }
    }

    /// Open a new stream that sees every item published from now on
    ///
    /// After `close` the returned stream is already finished.
    pub fn subscribe(&mut self) -> BoxStream<'static, T> {
        let (tx, mut rx) = unbounded_channel();
        if !self.closed {
            self.senders.push(tx);
        }
        stream::poll_fn(move |cx| rx.poll_recv(cx)).boxed()
    }

    pub fn publish(&mut self, item: T) {
        self.senders.retain(|tx| tx.send(item.clone()).is_ok());
    }

    /// Drop every sender so all streams end
    pub fn close(&mut self) {
        self.senders.clear();
        self.closed = true;
    }

    pub fn len(&self) -> usize {
        self.senders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.senders.is_empty()
    }
}

impl<T: Clone + Send + 'static> Default for Subscribers<T> {
    fn default() -> Self {
        Self::new()
    }
}
