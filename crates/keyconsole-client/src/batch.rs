//! Aggregated results of multi-key operations
//!
//! A batch is a set of independent requests. Constituents that succeed stay
//! applied when others fail; nothing is rolled back.

use crate::error::ClientError;
use keyconsole_core::KeyId;

/// Overall result of a batch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchStatus {
    /// Nothing was attempted
    Empty,
    /// Every constituent succeeded
    Succeeded,
    /// Some constituents failed
    Partial,
    /// Every constituent failed
    Failed,
}

/// Per-key results of a batch
#[derive(Debug)]
pub struct BatchOutcome<T> {
    /// Keys whose request succeeded, with the response
    pub succeeded: Vec<(KeyId, T)>,
    /// Keys whose request failed, with the error
    pub failed: Vec<(KeyId, ClientError)>,
}

impl<T> Default for BatchOutcome<T> {
    fn default() -> Self {
        Self {
            succeeded: Vec::new(),
            failed: Vec::new(),
        }
    }
}

impl<T> FromIterator<(KeyId, Result<T, ClientError>)> for BatchOutcome<T> {
    fn from_iter<I: IntoIterator<Item = (KeyId, Result<T, ClientError>)>>(iter: I) -> Self {
        let mut outcome = Self::default();
        for (id, result) in iter {
            match result {
                Ok(value) => outcome.succeeded.push((id, value)),
                Err(err) => outcome.failed.push((id, err)),
            }
        }
        outcome
    }
}

impl<T> BatchOutcome<T> {
    /// Classify the batch
    pub fn status(&self) -> BatchStatus {
        match (self.succeeded.is_empty(), self.failed.is_empty()) {
            (true, true) => BatchStatus::Empty,
            (false, true) => BatchStatus::Succeeded,
            (true, false) => BatchStatus::Failed,
            (false, false) => BatchStatus::Partial,
        }
    }

    /// Number of constituents attempted
    pub fn len(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    /// Whether nothing was attempted
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether at least one constituent changed server state
    pub fn any_succeeded(&self) -> bool {
        !self.succeeded.is_empty()
    }

    /// Ids of keys whose request failed
    pub fn failed_ids(&self) -> Vec<KeyId> {
        self.failed.iter().map(|(id, _)| *id).collect()
    }

    /// Ids of keys whose request succeeded
    pub fn succeeded_ids(&self) -> Vec<KeyId> {
        self.succeeded.iter().map(|(id, _)| *id).collect()
    }

    /// First failure message, used for the notification body
    pub fn first_error(&self) -> Option<&ClientError> {
        self.failed.first().map(|(_, err)| err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use uuid::Uuid;

    fn outcome(ok: usize, failed: usize) -> BatchOutcome<()> {
        let ok = (0..ok).map(|_| (Uuid::new_v4(), Ok(())));
        let failed = (0..failed).map(|_| (Uuid::new_v4(), Err(ClientError::http(404, "API key not found"))));
        ok.chain(failed).collect()
    }

    #[test]
    fn test_status_classification() {
        assert_eq!(outcome(0, 0).status(), BatchStatus::Empty);
        assert_eq!(outcome(3, 0).status(), BatchStatus::Succeeded);
        assert_eq!(outcome(2, 1).status(), BatchStatus::Partial);
        assert_eq!(outcome(0, 2).status(), BatchStatus::Failed);
    }

    #[test]
    fn test_failed_ids_preserve_input_order() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let c = Uuid::new_v4();
        let batch: BatchOutcome<u8> = vec![
            (a, Err(ClientError::http(500, "boom"))),
            (b, Ok(1)),
            (c, Err(ClientError::MissingToken)),
        ]
        .into_iter()
        .collect();

        assert_eq!(batch.failed_ids(), vec![a, c]);
        assert_eq!(batch.succeeded_ids(), vec![b]);
        assert_eq!(batch.len(), 3);
        assert!(batch.any_succeeded());
        assert_eq!(batch.first_error().map(ToString::to_string).as_deref(), Some("boom"));
    }
}
