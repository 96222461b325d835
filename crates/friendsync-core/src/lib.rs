//! Core types, trait definitions and the overdue-reminder pipeline for
//! FriendSync.
//!
//! This crate has no HTTP or database dependencies.
//! Storage backends implement [`store::ContactStore`]; the
//! [`service::FriendService`] runs the coarse filter, recency
//! calculation, pagination, statistics and bulk reset against any of them.

// `ContactStore` spells out `Send` futures explicitly; the lint is advisory.
#![allow(async_fn_in_trait)]

pub mod config;
pub mod error;
pub mod friend;
pub mod meeting;
pub mod paginate;
pub mod recency;
pub mod retry;
pub mod service;
pub mod stats;
pub mod store;

pub use error::{Error, ErrorKind, Result, ServiceError, StoreError};
