use std::{
    future::Future,
    pin::Pin,
    task::{Context, Poll},
};

use chrono::Utc;
use tower::Service;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    domain::{non_empty, Member},
    ports::{
        card::CardAllocatorPort,
        store::{self, MemberStorePort},
    },
};

use super::{DomainLogic, Error};

/// Fields of a new member
///
/// Empty strings stand for absent values.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CreateMemberRequest {
    pub phone: String,
    /// Card number to use, allocated by the registry when empty or not numeric
    pub card_no: String,
    /// Phone number or card number of the referrer
    pub reference: String,
    pub level: String,
    pub name: String,
}

/// Card number picked for a new member
#[derive(Debug)]
struct CardClaim {
    card_no: String,
    /// Number to give back if the member is never persisted
    release: Option<u64>,
}

impl<S, C> DomainLogic<S, C>
where
    S: MemberStorePort,
    C: CardAllocatorPort,
{
    /// Create and persist a new member, then queue it for hierarchy construction
    ///
    /// An unresolvable referrer does not fail the creation: the member is stored without one.
    /// The phone number is stored as given, without format validation. This returns as soon as
    /// the member is persisted, without waiting for the hierarchy builder.
    pub async fn create_member(&self, req: CreateMemberRequest) -> Result<Member, Error> {
        let reference = self.referrer_id(&req.reference).await;
        let id = Uuid::new_v4();
        let claim = self.claim_card(&req.card_no).await?;

        let member = Member {
            id,
            card_no: Some(claim.card_no),
            phone: non_empty(&req.phone),
            level: non_empty(&req.level),
            name: non_empty(&req.name),
            reference,
            create_time: Utc::now(),
        };

        if let Err(err) = self.store.insert(member.clone()).await {
            match (&err, claim.release) {
                // Someone already holds this number, so it stays claimed
                (store::Error::CardNoTaken(card_no), _) => {
                    warn!(%card_no, "card number already held by another member");
                }
                (_, Some(card_no)) => {
                    if let Err(release_err) = self.cards.release(card_no).await {
                        warn!(card_no, error = %release_err, "failed to release card number");
                    }
                }
                (_, None) => {}
            }
            return Err(match err {
                store::Error::Rejected(reason) => Error::CreateFailed(reason),
                store::Error::CardNoTaken(card_no) => {
                    Error::CreateFailed(format!("card number {card_no} is already in use").into())
                }
                err => Error::Store(err),
            });
        }

        info!(%member, "member created");
        self.hierarchy.dispatch(member.clone());

        Ok(member)
    }

    /// Identifier of the referrer, if the token resolves to a member
    async fn referrer_id(&self, token: &str) -> Option<Uuid> {
        if token.is_empty() {
            return None;
        }

        match self.resolve_reference(token).await {
            Ok(referrer) => Some(referrer.id),
            Err(err) => {
                warn!(reference = token, error = %err, "could not resolve referrer");
                None
            }
        }
    }

    async fn claim_card(&self, card_no: &str) -> Result<CardClaim, Error> {
        if let Some(number) = parse_card_no(card_no) {
            let newly_claimed = self.cards.mark_used(number).await?;
            return Ok(CardClaim {
                card_no: card_no.to_string(),
                // Never release a number some other member may be holding
                release: newly_claimed.then_some(number),
            });
        }

        let card_no = self.cards.allocate_new().await?;
        let release = card_no.parse().ok();
        Ok(CardClaim { card_no, release })
    }
}

/// Numeric value of a supplied card number
///
/// Only plain ASCII digits count. Signs, whitespace and out-of-range values do not.
fn parse_card_no(card_no: &str) -> Option<u64> {
    if card_no.is_empty() || !card_no.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    card_no.parse().ok()
}

impl<S, C> Service<CreateMemberRequest> for DomainLogic<S, C>
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

    fn call(&mut self, req: CreateMemberRequest) -> Self::Future {
        let domain = self.clone();
        Box::pin(async move { domain.create_member(req).await })
    }
}
