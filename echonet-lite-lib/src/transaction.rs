use crate::error::EchonetError;
use tracing::{debug, warn};

/// Mints TIDs for one meter session and pairs responses with the single
/// outstanding request.
#[derive(Debug, Clone, Default)]
pub struct TransactionTracker {
    next_id: u16,
    outstanding: Option<u16>,
}

impl TransactionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the next transaction ID and mark it outstanding.
    ///
    /// Fails while a previous request is still waiting for its response.
    pub fn next_transaction_id(&mut self) -> Result<u16, EchonetError> {
        if let Some(pending) = self.outstanding {
            return Err(EchonetError::RequestPending(pending));
        }
        self.next_id = self.next_id.wrapping_add(1);
        self.outstanding = Some(self.next_id);
        debug!("Issued transaction id {}", self.next_id);
        Ok(self.next_id)
    }

    pub fn is_expected(response_id: u16, last_issued_id: u16) -> bool {
        response_id == last_issued_id
    }

    /// Accept a response for the outstanding request.
    ///
    /// On mismatch the request stays outstanding so the caller can keep
    /// waiting, retry or [`abandon`](Self::abandon) it.
    pub fn complete(&mut self, response_id: u16) -> Result<(), EchonetError> {
        let expected = self.outstanding.ok_or(EchonetError::NoRequestPending)?;
        if !Self::is_expected(response_id, expected) {
            warn!("Rejected response tid={} while waiting for {}", response_id, expected);
            return Err(EchonetError::TransactionMismatch {
                expected,
                response: response_id,
            });
        }
        self.outstanding = None;
        Ok(())
    }

    /// Give up on the outstanding request, e.g. after a transport timeout.
    pub fn abandon(&mut self) -> Option<u16> {
        let dropped = self.outstanding.take();
        if let Some(id) = dropped {
            debug!("Abandoned transaction id {}", id);
        }
        dropped
    }

    pub fn outstanding(&self) -> Option<u16> {
        self.outstanding
    }

    /// The most recently issued id, 0 before the first request.
    pub fn last_issued(&self) -> u16 {
        self.next_id
    }
}
