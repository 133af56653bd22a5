//! Postgres storage layer with sqlx.
//!
//! Implements the core [`tarweej_core::traits::ProspectStore`] and
//! [`tarweej_core::traits::CampaignStore`] seams over a connection pool.

pub mod models;
pub mod repositories;

pub use models::*;
pub use repositories::*;
