use uuid::Uuid;

use crate::domain::Member;

/// Builds the referral tree
///
/// Called from the dispatch worker, never from the caller creating the member.
#[mockall::automock]
#[async_trait::async_trait]
pub trait HierarchyPort {
    async fn on_member_created(&self, member: Member) -> Result<(), Error>;
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The referrer has not been placed in the tree yet
    #[error("referrer {referrer} of member {member} is not part of the hierarchy")]
    UnknownReferrer { member: Uuid, referrer: Uuid },

    /// Concrete adapter errors
    #[error("adapter error: {0:?}")]
    Adapter(Box<dyn std::error::Error + Send + Sync>),
}
