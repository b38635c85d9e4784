//! Membership registry
//!
//! Resolves members by phone number or card number, allocates card numbers for new members and
//! hands freshly created members over to the referral hierarchy builder without waiting on it.

pub mod adapters;
pub mod commands;
pub mod config;
pub mod dispatch;
pub mod domain;
pub mod ports;
