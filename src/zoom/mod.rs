//! Zoom and response mapping
//!
//! # Architecture
//!
//! - [`descriptor`] - `Resource` trait and `ResultSpec` describing how a type is fetched
//! - [`request`] - Builds `?zoom=a:b` URLs
//! - [`mapper`] - Fills a result object from a zoomed document
//! - [`mapping`] - YAML mapping files for result shapes defined at runtime
//! - `macros` - `zoom_resource!` / `direct_resource!`
//!
//! # Example
//!
//! ```
//! use cortex_sdk::zoom::{mapper, request, ResultSpec};
//! use serde_json::json;
//!
//! #[derive(Default)]
//! struct Order {
//!     name: String,
//! }
//!
//! let spec = ResultSpec::zoom(["customer"])
//!     .with_default()
//!     .bind("name", "$.customer.name", |o: &mut Order, v| o.name = v)
//!     .build()
//!     .unwrap();
//!
//! let url = request::build_zoom_url("https://api.example.com/orders/42", spec.zoom_steps()).unwrap();
//! assert_eq!(url.as_str(), "https://api.example.com/orders/42?zoom=customer");
//!
//! let order = mapper::map(&spec, &json!({"customer": {"name": "Alice"}})).unwrap();
//! assert_eq!(order.name, "Alice");
//! ```

pub mod descriptor;
mod macros;
pub mod mapper;
pub mod mapping;
pub mod request;

pub use descriptor::{FieldBinding, FieldMap, Resource, ResultSpec, ResultSpecBuilder};
pub use mapping::{check_mappings, MappingError, MappingFile};
