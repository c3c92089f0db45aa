//! REST client helper for zoom-capable APIs
//!
//! Fetches a resource either by plain serde decoding or by asking the server to
//! zoom into linked resources (`?zoom=a:b`) and reading each declared field of
//! the result type from a JSONPath expression.
//!
//! ```ignore
//! use cortex_sdk::{zoom_resource, ClientSdk, AuthToken};
//!
//! zoom_resource! {
//!     #[zoom("customer", "items")]
//!     #[derive(Debug)]
//!     pub struct OrderSummary {
//!         #[json("$.customer.name")]
//!         pub name: String,
//!         #[json("$.total")]
//!         pub total: String,
//!     }
//! }
//!
//! async fn example(client: &ClientSdk, token: &AuthToken) -> cortex_sdk::Result<()> {
//!     let order: OrderSummary = client.get("https://api.example.com/orders/42", token).await?;
//!     println!("{} owes {}", order.name, order.total);
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod jsonpath;
pub mod sdk;
pub mod zoom;

pub use error::{Error, Result};
pub use sdk::auth::{AuthToken, Credentials, HeaderScheme, Role};
pub use sdk::client::ClientSdk;
pub use zoom::{FieldMap, Resource, ResultSpec};
