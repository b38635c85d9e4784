use crate::{
    adapters::ErasedPoisonError,
    config::CardSettings,
    ports::card::{CardAllocatorPort, Error},
};
use std::{
    collections::BTreeSet,
    sync::{Arc, Mutex, PoisonError},
};

/// Card allocator keeping its counter in process memory
///
/// Allocation, claims and releases all go through the same mutex, so a number is never handed
/// out twice nor handed out after it was claimed.
#[derive(Clone, Debug)]
pub struct MemoryCardAllocator {
    state: Arc<Mutex<CardState>>,
}

#[derive(Debug)]
struct CardState {
    /// Lowest number that may still be free
    next: u64,
    /// Numbers in use, whether allocated here or claimed from outside
    used: BTreeSet<u64>,
}

impl MemoryCardAllocator {
    pub fn new(settings: &CardSettings) -> Self {
        Self {
            state: Arc::new(Mutex::new(CardState {
                next: settings.first_number,
                used: BTreeSet::new(),
            })),
        }
    }
}

impl Default for MemoryCardAllocator {
    fn default() -> Self {
        Self::new(&CardSettings::default())
    }
}

#[async_trait::async_trait]
impl CardAllocatorPort for MemoryCardAllocator {
    async fn allocate_new(&self) -> Result<String, Error> {
        let mut state = self.state.lock()?;

        let mut candidate = state.next;
        while state.used.contains(&candidate) {
            candidate = candidate.checked_add(1).ok_or(Error::Exhausted)?;
        }
        state.used.insert(candidate);
        state.next = candidate.saturating_add(1);

        Ok(candidate.to_string())
    }

    async fn mark_used(&self, card_no: u64) -> Result<bool, Error> {
        Ok(self.state.lock()?.used.insert(card_no))
    }

    async fn release(&self, card_no: u64) -> Result<(), Error> {
        let mut state = self.state.lock()?;
        if state.used.remove(&card_no) && card_no < state.next {
            state.next = card_no;
        }
        Ok(())
    }
}

impl<T> From<PoisonError<T>> for Error {
    fn from(err: PoisonError<T>) -> Self {
        Self::Adapter(Box::new(ErasedPoisonError::from(err)))
    }
}
