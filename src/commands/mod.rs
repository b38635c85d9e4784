use std::{borrow::Cow, fmt, sync::Arc};

use crate::{
    config::Settings,
    dispatch::HierarchyDispatcher,
    ports::{card::CardAllocatorPort, hierarchy::HierarchyPort, store::MemberStorePort},
};

pub mod create_member;
pub mod find_member;
pub mod find_or_create;

pub struct DomainLogic<S, C> {
    store: Arc<S>,
    cards: Arc<C>,
    hierarchy: HierarchyDispatcher,
}

impl<S, C> DomainLogic<S, C>
where
    S: MemberStorePort,
    C: CardAllocatorPort,
{
    pub fn new(store: Arc<S>, cards: Arc<C>, hierarchy: HierarchyDispatcher) -> Self {
        Self {
            store,
            cards,
            hierarchy,
        }
    }

    /// Wire the domain logic to a hierarchy builder, spawning the dispatch worker
    ///
    /// Must be called from within a Tokio runtime.
    pub fn with_settings<H>(
        store: Arc<S>,
        cards: Arc<C>,
        hierarchy: Arc<H>,
        settings: &Settings,
    ) -> Self
    where
        H: HierarchyPort + Send + Sync + 'static,
    {
        let hierarchy = HierarchyDispatcher::spawn(hierarchy, settings.hierarchy.on_shutdown);
        Self::new(store, cards, hierarchy)
    }

    /// Dispatch queue feeding the hierarchy builder
    pub fn hierarchy(&self) -> &HierarchyDispatcher {
        &self.hierarchy
    }
}

impl<S, C> Clone for DomainLogic<S, C> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            cards: self.cards.clone(),
            hierarchy: self.hierarchy.clone(),
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Neither a phone number nor a card number was given
    #[error("invalid input: {0}")]
    InvalidInput(Cow<'static, str>),
    #[error("invalid phone number: {0:?}")]
    InvalidPhone(String),
    #[error("no member with {0}")]
    NotFound(Cow<'static, str>),
    /// The store did not persist the new member
    #[error("failed to create member: {0}")]
    CreateFailed(Cow<'static, str>),

    #[error("store port error: {0:?}")]
    Store(#[from] crate::ports::store::Error),
    #[error("card allocator port error: {0:?}")]
    Card(#[from] crate::ports::card::Error),
}

impl Error {
    pub fn code(&self) -> ResultCode {
        match self {
            Error::InvalidInput(_) => ResultCode::Invalid,
            Error::InvalidPhone(_) => ResultCode::InvalidPhone,
            Error::NotFound(_) => ResultCode::NotFound,
            Error::CreateFailed(_) => ResultCode::CreateFailed,
            Error::Store(_) | Error::Card(_) => ResultCode::StoreFailure,
        }
    }
}

/// Status codes reported to callers of the registry
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResultCode {
    Found,
    Invalid,
    InvalidPhone,
    NotFound,
    StoreFailure,
    CreateFailed,
}

impl ResultCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResultCode::Found => "200",
            ResultCode::Invalid => "412",
            ResultCode::InvalidPhone => "4121",
            ResultCode::NotFound => "404",
            ResultCode::StoreFailure => "500",
            ResultCode::CreateFailed => "501",
        }
    }
}

impl fmt::Display for ResultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<T> From<&Result<T, Error>> for ResultCode {
    fn from(res: &Result<T, Error>) -> Self {
        match res {
            Ok(_) => ResultCode::Found,
            Err(err) => err.code(),
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::{
        adapters::{
            card::memory::MemoryCardAllocator, hierarchy::memory::MemoryGenealogy,
            store::memory::MemoryStore,
        },
        domain::Member,
    };
    use chrono::Utc;
    use uuid::Uuid;

    /// Domain logic over in-memory adapters, with handles on every adapter
    pub struct Harness {
        pub domain: DomainLogic<MemoryStore, MemoryCardAllocator>,
        pub store: MemoryStore,
        pub cards: MemoryCardAllocator,
        pub genealogy: Arc<MemoryGenealogy>,
    }

    impl Harness {
        pub fn new() -> Self {
            let store = MemoryStore::default();
            let cards = MemoryCardAllocator::default();
            let genealogy = Arc::new(MemoryGenealogy::default());
            let domain = DomainLogic::with_settings(
                Arc::new(store.clone()),
                Arc::new(cards.clone()),
                genealogy.clone(),
                &Settings::default(),
            );

            Self {
                domain,
                store,
                cards,
                genealogy,
            }
        }
    }

    /// Dispatcher feeding a throwaway genealogy
    pub fn dispatcher() -> HierarchyDispatcher {
        HierarchyDispatcher::spawn(
            Arc::new(MemoryGenealogy::default()),
            Settings::default().hierarchy.on_shutdown,
        )
    }

    pub fn member(phone: Option<&str>, card_no: Option<&str>) -> Member {
        Member {
            id: Uuid::new_v4(),
            card_no: card_no.map(ToString::to_string),
            phone: phone.map(ToString::to_string),
            level: None,
            name: None,
            reference: None,
            create_time: Utc::now(),
        }
    }
}
