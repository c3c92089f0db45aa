//! API interaction module
//!
//! # Module Structure
//!
//! - [`auth`] - Token exchange and the `AuthToken` request header
//! - [`client`] - `ClientSdk`, the fetch entry point
//! - [`http`] - HTTP utilities for REST API calls
//!
//! # Example
//!
//! ```ignore
//! use cortex_sdk::{ClientSdk, Credentials};
//!
//! async fn example() -> cortex_sdk::Result<()> {
//!     let client = ClientSdk::new()?;
//!     let token = client
//!         .auth("https://api.example.com/oauth2/tokens", &Credentials::public("mobee"))
//!         .await?;
//!     let profile: serde_json::Value = client
//!         .get("https://api.example.com/profiles/mobee/default", &token)
//!         .await?;
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod client;
pub mod http;
