use std::borrow::Cow;

use uuid::Uuid;

use crate::domain::Member;

/// Key used to look up a single member
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MemberFilter {
    Id(Uuid),
    Phone(String),
    CardNo(String),
}

#[mockall::automock]
#[async_trait::async_trait]
pub trait MemberStorePort {
    /// Fetch the first member matching the filter, if any
    async fn find_one(&self, filter: MemberFilter) -> Result<Option<Member>, Error>;
    /// Persist a new member
    ///
    /// This must only return `Ok` once the record is durable.
    async fn insert(&self, member: Member) -> Result<(), Error>;
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The write did not take effect
    ///
    /// For example, the identifier is already taken by another record.
    #[error("write rejected: {0}")]
    Rejected(Cow<'static, str>),

    /// The card number already belongs to another record
    #[error("card number {0} is already in use")]
    CardNoTaken(String),

    /// Concrete adapter errors
    ///
    /// This could represent any errors from a concrete adapter that is not part of the domain
    /// model, such as connectivity, configuration, or permission errors.
    #[error("adapter error: {0:?}")]
    Adapter(Box<dyn std::error::Error + Send + Sync>),
}
