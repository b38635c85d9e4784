use std::{
    future::Future,
    pin::Pin,
    task::{Context, Poll},
};

use tower::Service;
use tracing::debug;
use uuid::Uuid;

use crate::{
    domain::{is_valid_phone, Member},
    ports::{
        card::CardAllocatorPort,
        store::{MemberFilter, MemberStorePort},
    },
};

use super::{DomainLogic, Error};

/// Ways to look up a single member
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FindMemberRequest {
    ById(Uuid),
    ByPhone(String),
    ByCardNo(String),
    /// Phone number if given, card number otherwise
    ByPhoneOrCardNo { phone: String, card_no: String },
    /// Referrer token holding either a phone number or a card number
    ByReference(String),
}

impl<S, C> DomainLogic<S, C>
where
    S: MemberStorePort,
    C: CardAllocatorPort,
{
    pub async fn find_by_id(&self, id: Uuid) -> Result<Member, Error> {
        self.store
            .find_one(MemberFilter::Id(id))
            .await?
            .ok_or_else(|| Error::NotFound(format!("id {id}").into()))
    }

    /// Look up a member by phone number
    ///
    /// The phone number must be well-formed. If the store holds several members with the same
    /// phone number, the first one is returned.
    pub async fn find_by_phone(&self, phone: &str) -> Result<Member, Error> {
        if !is_valid_phone(phone) {
            return Err(Error::InvalidPhone(phone.to_string()));
        }

        self.store
            .find_one(MemberFilter::Phone(phone.to_string()))
            .await?
            .ok_or_else(|| Error::NotFound(format!("phone {phone}").into()))
    }

    /// Look up a member by card number, whatever its format
    pub async fn find_by_card_no(&self, card_no: &str) -> Result<Member, Error> {
        self.store
            .find_one(MemberFilter::CardNo(card_no.to_string()))
            .await?
            .ok_or_else(|| Error::NotFound(format!("card number {card_no}").into()))
    }

    /// Look up a member by phone number, or by card number when no phone number is given
    ///
    /// The card number is ignored as soon as a phone number is present, even if the phone
    /// lookup fails.
    pub async fn find_by_phone_or_card_no(
        &self,
        phone: &str,
        card_no: &str,
    ) -> Result<Member, Error> {
        match (phone.is_empty(), card_no.is_empty()) {
            (true, true) => Err(Error::InvalidInput(
                "a phone number or a card number is required".into(),
            )),
            (false, _) => self.find_by_phone(phone).await,
            (true, false) => self.find_by_card_no(card_no).await,
        }
    }

    /// Resolve a referrer from a token holding either a phone number or a card number
    ///
    /// Well-formed phone numbers are looked up as phone numbers, anything else as a card
    /// number.
    pub async fn resolve_reference(&self, token: &str) -> Result<Member, Error> {
        if token.is_empty() {
            return Err(Error::InvalidInput(
                "a referrer phone number or card number is required".into(),
            ));
        }

        if is_valid_phone(token) {
            debug!(token, "resolving referrer by phone number");
            self.find_by_phone(token).await
        } else {
            debug!(token, "resolving referrer by card number");
            self.find_by_card_no(token).await
        }
    }
}

impl<S, C> Service<FindMemberRequest> for DomainLogic<S, C>
where
    S: MemberStorePort + 'static,
    C: CardAllocatorPort + 'static,
{
    type Response = Member;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: FindMemberRequest) -> Self::Future {
        let domain = self.clone();
        Box::pin(async move {
            match req {
                FindMemberRequest::ById(id) => domain.find_by_id(id).await,
                FindMemberRequest::ByPhone(phone) => domain.find_by_phone(&phone).await,
                FindMemberRequest::ByCardNo(card_no) => domain.find_by_card_no(&card_no).await,
                FindMemberRequest::ByPhoneOrCardNo { phone, card_no } => {
                    domain.find_by_phone_or_card_no(&phone, &card_no).await
                }
                FindMemberRequest::ByReference(token) => domain.resolve_reference(&token).await,
            }
        })
    }
}
