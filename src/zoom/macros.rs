//! Declarative result types
//!
//! `zoom_resource!` declares a struct of text fields together with its zoom
//! steps and per-field paths, and implements [`Resource`](crate::Resource) for it.
//! Fields without `#[json(...)]` still compile but make `describe` fail, so the
//! mistake is reported before any request is sent.
//!
//! ```
//! use cortex_sdk::{zoom_resource, Resource};
//!
//! zoom_resource! {
//!     #[zoom("customer", "items")]
//!     #[derive(Debug, Clone, PartialEq)]
//!     pub struct OrderSummary {
//!         #[json("$.customer.name")]
//!         pub name: String,
//!         #[json("$.total")]
//!         pub total: String,
//!     }
//! }
//!
//! let spec = OrderSummary::describe().unwrap();
//! assert_eq!(spec.zoom_steps(), ["customer", "items"]);
//! ```

/// Declare a zoomed result type; see the module docs
#[macro_export]
macro_rules! zoom_resource {
    (
        #[zoom($($step:literal),+ $(,)?)]
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[json($path:literal)])?
                $field_vis:vis $field:ident : String
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Default)]
        $vis struct $name {
            $($field_vis $field: String,)*
        }

        impl $crate::Resource for $name {
            fn describe() -> $crate::Result<$crate::ResultSpec<Self>> {
                let builder = $crate::ResultSpec::<Self>::zoom([$($step),+]).with_default();
                $(
                    let builder = $crate::__zoom_field!(builder, $name, $field $(, $path)?);
                )*
                builder.build()
            }
        }
    };
}

/// Implement [`Resource`](crate::Resource) for serde types fetched without zoom
#[macro_export]
macro_rules! direct_resource {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl $crate::Resource for $ty {
                fn describe() -> $crate::Result<$crate::ResultSpec<Self>> {
                    Ok($crate::ResultSpec::direct())
                }
            }
        )+
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __zoom_field {
    ($builder:ident, $name:ident, $field:ident) => {
        $builder.declare(stringify!($field))
    };
    ($builder:ident, $name:ident, $field:ident, $path:literal) => {
        $builder
            .declare(stringify!($field))
            .bind(stringify!($field), $path, |target: &mut $name, value: String| {
                target.$field = value
            })
    };
}
