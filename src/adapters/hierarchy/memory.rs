use crate::{
    adapters::ErasedPoisonError,
    domain::Member,
    ports::hierarchy::{Error, HierarchyPort},
};
use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError},
};
use uuid::Uuid;

/// Genealogy kept in process memory
///
/// Only records parent links. Each member must arrive after its referrer.
#[derive(Clone, Debug, Default)]
pub struct MemoryGenealogy {
    parents: Arc<Mutex<HashMap<Uuid, Option<Uuid>>>>,
}

impl MemoryGenealogy {
    /// Whether the member has been placed in the tree
    pub fn contains(&self, member_id: Uuid) -> Result<bool, Error> {
        Ok(self.parents.lock()?.contains_key(&member_id))
    }

    /// Referrer of a placed member, `None` for roots and unknown members
    pub fn parent_of(&self, member_id: Uuid) -> Result<Option<Uuid>, Error> {
        Ok(self.parents.lock()?.get(&member_id).copied().flatten())
    }

    /// Chain of referrers from the direct referrer up to the root
    pub fn ancestors(&self, member_id: Uuid) -> Result<Vec<Uuid>, Error> {
        let parents = self.parents.lock()?;

        let mut ancestors = Vec::new();
        let mut current = member_id;
        while let Some(Some(parent)) = parents.get(&current) {
            // Stop on cycles
            if ancestors.contains(parent) {
                break;
            }
            ancestors.push(*parent);
            current = *parent;
        }

        Ok(ancestors)
    }
}

#[async_trait::async_trait]
impl HierarchyPort for MemoryGenealogy {
    async fn on_member_created(&self, member: Member) -> Result<(), Error> {
        let mut parents = self.parents.lock()?;

        if let Some(referrer) = member.reference {
            if !parents.contains_key(&referrer) {
                return Err(Error::UnknownReferrer {
                    member: member.id,
                    referrer,
                });
            }
        }
        parents.insert(member.id, member.reference);

        Ok(())
    }
}

impl<T> From<PoisonError<T>> for Error {
    fn from(err: PoisonError<T>) -> Self {
        Self::Adapter(Box::new(ErasedPoisonError::from(err)))
    }
}
