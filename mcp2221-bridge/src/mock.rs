//! Scripted transport for unit tests.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Duration;

use crate::constants::PACKET_SIZE;
use crate::transport::{Transport, TransportError};

type SentLog = Rc<RefCell<Vec<[u8; PACKET_SIZE]>>>;

/// Replays queued responses in order and records every report sent.
///
/// Receiving with an empty queue times out.
#[derive(Debug, Default)]
pub(crate) struct MockTransport {
    responses: RefCell<VecDeque<Result<[u8; PACKET_SIZE], TransportError>>>,
    sent: SentLog,
    latency: Cell<Duration>,
}

impl MockTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&self, response: [u8; PACKET_SIZE]) {
        self.responses.borrow_mut().push_back(Ok(response));
    }

    pub(crate) fn push_error(&self, error: TransportError) {
        self.responses.borrow_mut().push_back(Err(error));
    }

    pub(crate) fn sent(&self) -> Vec<[u8; PACKET_SIZE]> {
        self.sent.borrow().clone()
    }

    /// Shared handle to the sent log, which outlives the transport.
    pub(crate) fn clone_log(&self) -> SentLog {
        Rc::clone(&self.sent)
    }

    /// Sleep for `latency` before answering each receive.
    pub(crate) fn set_latency(&self, latency: Duration) {
        self.latency.set(latency);
    }

    pub(crate) fn remaining(&self) -> usize {
        self.responses.borrow().len()
    }
}

impl Transport for MockTransport {
    fn send_report(&self, report: &[u8; PACKET_SIZE]) -> Result<(), TransportError> {
        self.sent.borrow_mut().push(*report);
        Ok(())
    }

    fn receive_report(&self, _timeout: Duration) -> Result<[u8; PACKET_SIZE], TransportError> {
        let latency = self.latency.get();
        if !latency.is_zero() {
            std::thread::sleep(latency);
        }
        self.responses
            .borrow_mut()
            .pop_front()
            .unwrap_or(Err(TransportError::Timeout))
    }
}

/// Response echoing `code`, with the given bytes set and everything else zero.
pub(crate) fn response(code: u8, bytes: &[(usize, u8)]) -> [u8; PACKET_SIZE] {
    let mut buf = [0u8; PACKET_SIZE];
    buf[0] = code;
    for &(index, value) in bytes {
        buf[index] = value;
    }
    buf
}

/// Status/Set Parameters response with the given engine state.
///
/// Both lines are reported high unless overridden through `bytes`.
pub(crate) fn status(state: u8, bytes: &[(usize, u8)]) -> [u8; PACKET_SIZE] {
    let mut buf = response(0x10, &[(8, state), (22, 0x01), (23, 0x01)]);
    for &(index, value) in bytes {
        buf[index] = value;
    }
    buf
}
