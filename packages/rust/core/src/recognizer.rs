//! Recognition capability consumed by assistant dialogs, plus a
//! fixed-response double for dialog tests.

use std::collections::HashMap;
use std::future::Future;

use botskills_shared::Result;

/// One incoming conversation turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub text: String,
}

impl Turn {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// Maps a turn to a typed intent result.
pub trait Recognizer<T>: Send + Sync {
    fn recognize(&self, turn: &Turn) -> impl Future<Output = Result<T>> + Send;
}

/// Returns pre-registered results keyed by exact turn text, else a default.
#[derive(Debug, Clone)]
pub struct MockRecognizer<T> {
    utterances: HashMap<String, T>,
    default: T,
}

impl<T: Clone> MockRecognizer<T> {
    pub fn new(default: T) -> Self {
        Self {
            utterances: HashMap::new(),
            default,
        }
    }

    /// Register text → result pairs. A repeated text replaces the earlier result.
    pub fn register_utterances<I>(&mut self, utterances: I)
    where
        I: IntoIterator<Item = (String, T)>,
    {
        self.utterances.extend(utterances);
    }
}

impl<T: Clone + Send + Sync> Recognizer<T> for MockRecognizer<T> {
    async fn recognize(&self, turn: &Turn) -> Result<T> {
        Ok(self
            .utterances
            .get(&turn.text)
            .unwrap_or(&self.default)
            .clone())
    }
}
