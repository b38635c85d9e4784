#[mockall::automock]
#[async_trait::async_trait]
pub trait CardAllocatorPort {
    /// Hand out a card number that is not in use
    async fn allocate_new(&self) -> Result<String, Error>;
    /// Exclude an externally supplied card number from future allocations
    ///
    /// Returns `true` if the number was not claimed before this call.
    async fn mark_used(&self, card_no: u64) -> Result<bool, Error>;
    /// Give back a number whose owning record was never persisted
    async fn release(&self, card_no: u64) -> Result<(), Error>;
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Every representable card number is taken
    #[error("no card numbers left to allocate")]
    Exhausted,

    /// Concrete adapter errors
    #[error("adapter error: {0:?}")]
    Adapter(Box<dyn std::error::Error + Send + Sync>),
}
