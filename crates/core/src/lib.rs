//! `invoicemint-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives shared by the company and
//! invoicing modules (no storage or presentation concerns).

pub mod clock;
pub mod coerce;
pub mod entity;
pub mod error;
pub mod id;

pub use clock::{Clock, FixedClock, SystemClock};
pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::{CompanyId, InvoiceId, ItemId};
