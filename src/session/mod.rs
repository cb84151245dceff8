//! Client-side session: persisted tokens, observable auth state, startup
//! hydration, role gates and the authentication calls.

pub mod auth;
pub mod auth_provider;
pub mod auth_store;
pub mod guard;
pub mod navigator;
pub mod storage;
pub mod token_store;
pub mod user;
