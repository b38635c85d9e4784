use crate::{
    adapters::ErasedPoisonError,
    domain::Member,
    ports::store::{Error, MemberFilter, MemberStorePort},
};
use std::sync::{Arc, Mutex, PoisonError};

/// Member store backed by a vector
///
/// Records are kept in insertion order, so "first match" is the oldest matching record.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    members: Arc<Mutex<Vec<Member>>>,
}

#[async_trait::async_trait]
impl MemberStorePort for MemoryStore {
    async fn find_one(&self, filter: MemberFilter) -> Result<Option<Member>, Error> {
        let member = self
            .members
            .lock()?
            .iter()
            .find(|member| matches_filter(member, &filter))
            .cloned();

        Ok(member)
    }

    async fn insert(&self, member: Member) -> Result<(), Error> {
        let mut members = self.members.lock()?;

        // Both the identifier and the card number are unique keys
        if members.iter().any(|existing| existing.id == member.id) {
            return Err(Error::Rejected(
                format!("member {} already exists", member.id).into(),
            ));
        }
        if let Some(card_no) = &member.card_no {
            if members
                .iter()
                .any(|existing| existing.card_no.as_ref() == Some(card_no))
            {
                return Err(Error::CardNoTaken(card_no.clone()));
            }
        }

        members.push(member);
        Ok(())
    }
}

fn matches_filter(member: &Member, filter: &MemberFilter) -> bool {
    match filter {
        MemberFilter::Id(id) => member.id == *id,
        MemberFilter::Phone(phone) => member.phone.as_ref() == Some(phone),
        MemberFilter::CardNo(card_no) => member.card_no.as_ref() == Some(card_no),
    }
}

impl<T> From<PoisonError<T>> for Error {
    fn from(err: PoisonError<T>) -> Self {
        Self::Adapter(Box::new(ErasedPoisonError::from(err)))
    }
}
