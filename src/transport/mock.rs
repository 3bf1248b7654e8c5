//! Scripted in-memory transport.
//!
//! `MockTransport` answers each exchange from a queue of canned replies and
//! records every request frame, so protocol behaviour can be checked without
//! hardware. With [`MockTransport::echoing`] it instead answers like a
//! well-behaved laser that acknowledges every Set.

use std::collections::VecDeque;
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use super::Transport;
use crate::error::{LaserError, LaserResult};

#[derive(Debug)]
enum Reply {
    Data(Vec<u8>),
    Timeout,
    Fail(io::ErrorKind),
}

/// Transport that replays scripted responses.
#[derive(Debug, Default)]
pub struct MockTransport {
    replies: VecDeque<Reply>,
    sent: Vec<Vec<u8>>,
    echo: bool,
    closed: bool,
    closes: Arc<AtomicUsize>,
}

impl MockTransport {
    /// Mock with an empty reply queue; unscripted exchanges time out.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mock that echoes Set frames once its reply queue is empty.
    ///
    /// `"<TOKEN> <value>\r"` is answered with `"<TOKEN>: <value>\r"` and a bare
    /// `"<TOKEN>\r"` with itself.
    pub fn echoing() -> Self {
        Self {
            echo: true,
            ..Self::default()
        }
    }

    /// Queue a reply.
    pub fn with_reply(mut self, reply: impl AsRef<[u8]>) -> Self {
        self.push_reply(reply);
        self
    }

    /// Queue a timeout.
    pub fn with_timeout(mut self) -> Self {
        self.replies.push_back(Reply::Timeout);
        self
    }

    /// Queue an I/O failure of the given kind.
    pub fn with_failure(mut self, kind: io::ErrorKind) -> Self {
        self.replies.push_back(Reply::Fail(kind));
        self
    }

    /// Queue a reply on an existing mock.
    pub fn push_reply(&mut self, reply: impl AsRef<[u8]>) {
        self.replies.push_back(Reply::Data(reply.as_ref().to_vec()));
    }

    /// Every request frame received so far, as text.
    pub fn sent_frames(&self) -> Vec<String> {
        self.sent
            .iter()
            .map(|f| String::from_utf8_lossy(f).into_owned())
            .collect()
    }

    /// Shared counter of `close` calls that reached the mock while open.
    pub fn close_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.closes)
    }

    fn echo_of(request: &[u8]) -> Vec<u8> {
        let text = String::from_utf8_lossy(request);
        let body = text.trim_end_matches('\r');
        match body.split_once(' ') {
            Some((token, value)) => format!("{token}: {value}\r").into_bytes(),
            None => format!("{body}\r").into_bytes(),
        }
    }
}

impl Transport for MockTransport {
    fn exchange(&mut self, request: &[u8]) -> LaserResult<Vec<u8>> {
        if self.closed {
            return Err(LaserError::Closed);
        }
        self.sent.push(request.to_vec());

        match self.replies.pop_front() {
            Some(Reply::Data(data)) => Ok(data),
            Some(Reply::Timeout) => Err(LaserError::Timeout),
            Some(Reply::Fail(kind)) => Err(io::Error::new(kind, "scripted failure").into()),
            None if self.echo => Ok(Self::echo_of(request)),
            None => Err(LaserError::Timeout),
        }
    }

    fn close(&mut self) -> LaserResult<()> {
        if !self.closed {
            self.closed = true;
            self.closes.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }

    fn describe(&self) -> String {
        "mock".to_string()
    }
}
