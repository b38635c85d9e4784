use std::{
    future::Future,
    pin::Pin,
    task::{Context, Poll},
};

use tower::Service;
use tracing::debug;

use crate::{
    domain::Member,
    ports::{card::CardAllocatorPort, store::MemberStorePort},
};

use super::{create_member::CreateMemberRequest, DomainLogic, Error};

/// Look up a member by phone or card number, creating it when missing
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FindOrCreateRequest {
    pub phone: String,
    pub card_no: String,
    /// Phone number or card number of the referrer, only used on creation
    pub reference: String,
    pub level: String,
    pub name: String,
    /// Create the member if no existing one matches
    pub create: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FindOrCreateResponse {
    Found(Member),
    Created(Member),
}

impl FindOrCreateResponse {
    pub fn member(&self) -> &Member {
        match self {
            FindOrCreateResponse::Found(member) | FindOrCreateResponse::Created(member) => member,
        }
    }

    pub fn into_member(self) -> Member {
        match self {
            FindOrCreateResponse::Found(member) | FindOrCreateResponse::Created(member) => member,
        }
    }
}

impl<S, C> DomainLogic<S, C>
where
    S: MemberStorePort,
    C: CardAllocatorPort,
{
    pub async fn find_or_create(
        &self,
        req: FindOrCreateRequest,
    ) -> Result<FindOrCreateResponse, Error> {
        let found = self
            .find_by_phone_or_card_no(&req.phone, &req.card_no)
            .await;

        match found {
            Ok(member) => Ok(FindOrCreateResponse::Found(member)),
            Err(Error::NotFound(key)) if req.create => {
                debug!(%key, "no member found, creating one");
                let member = self
                    .create_member(CreateMemberRequest {
                        phone: req.phone,
                        card_no: req.card_no,
                        reference: req.reference,
                        level: req.level,
                        name: req.name,
                    })
                    .await?;
                Ok(FindOrCreateResponse::Created(member))
            }
            Err(err) => Err(err),
        }
    }
}

impl<S, C> Service<FindOrCreateRequest> for DomainLogic<S, C>
where
    S: MemberStorePort + 'static,
    C: CardAllocatorPort + 'static,
{
    type Response = FindOrCreateResponse;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: FindOrCreateRequest) -> Self::Future {
        let domain = self.clone();
        Box::pin(async move { domain.find_or_create(req).await })
    }
}
