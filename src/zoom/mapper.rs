//! Field mapping from a zoomed response into a result object

use super::descriptor::{Construction, ResultSpec};
use crate::error::{Error, Result};
use serde_json::Value;

/// Build a `T` from `document` by reading every binding in `spec`
///
/// The object is only returned once every field has been set; on the first
/// failing path it is dropped and the error names the field.
pub fn map<T>(spec: &ResultSpec<T>, document: &Value) -> Result<T> {
    let mut target = instantiate(spec)?;

    for binding in spec.bindings() {
        let value = binding
            .path()
            .read(document)
            .map_err(|source| Error::Extraction {
                field: binding.field().to_string(),
                expression: binding.path().expression().to_string(),
                source,
            })?;
        tracing::trace!("{} <- {}", binding.field(), binding.path());
        binding.assign(&mut target, to_text(&value));
    }

    Ok(target)
}

fn instantiate<T>(spec: &ResultSpec<T>) -> Result<T> {
    let type_name = spec.type_name();
    match spec.construction() {
        Construction::Factory(factory) => {
            factory().map_err(|reason| Error::Instantiation { type_name, reason })
        }
        Construction::Decode(_) => Err(Error::Instantiation {
            type_name,
            reason: "direct result types are decoded, not mapped".to_string(),
        }),
        Construction::Missing => Err(Error::Instantiation {
            type_name,
            reason: "no factory registered".to_string(),
        }),
    }
}

/// Text form of a matched value
///
/// Strings are taken as-is, numbers and booleans use their JSON text, `null`
/// becomes `"null"` and containers become compact JSON.
pub fn to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Default, PartialEq)]
    struct OrderSummary {
        name: String,
        total: String,
    }

    fn order_spec() -> ResultSpec<OrderSummary> {
        ResultSpec::zoom(["customer", "items"])
            .with_default()
            .bind("name", "$.customer.name", |o: &mut OrderSummary, v| o.name = v)
            .bind("total", "$.total", |o: &mut OrderSummary, v| o.total = v)
            .build()
            .unwrap()
    }

    #[test]
    fn test_maps_orders_example() {
        let doc = json!({"customer": {"name": "Alice"}, "total": 19.99});
        let order = map(&order_spec(), &doc).unwrap();
        assert_eq!(
            order,
            OrderSummary {
                name: "Alice".to_string(),
                total: "19.99".to_string()
            }
        );
    }

    #[test]
    fn test_missing_path_names_the_field() {
        let doc = json!({"customer": {"name": "Alice"}});
        let err = map(&order_spec(), &doc).unwrap_err();
        match err {
            Error::Extraction { field, expression, .. } => {
                assert_eq!(field, "total");
                assert_eq!(expression, "$.total");
            }
            other => panic!("expected extraction error, got {:?}", other),
        }
    }

    #[test]
    fn test_text_coercion() {
        assert_eq!(to_text(&json!("Alice")), "Alice");
        assert_eq!(to_text(&json!(42)), "42");
        assert_eq!(to_text(&json!(-7)), "-7");
        assert_eq!(to_text(&json!(19.99)), "19.99");
        assert_eq!(to_text(&json!(true)), "true");
        assert_eq!(to_text(&json!(false)), "false");
        assert_eq!(to_text(&Value::Null), "null");
        assert_eq!(to_text(&json!({"a": [1, "b"]})), r#"{"a":[1,"b"]}"#);
    }

    #[test]
    fn test_indefinite_binding_maps_json_array_text() {
        let spec = ResultSpec::zoom(["lineitems"])
            .with_default()
            .bind("name", "$.items[*].sku", |o: &mut OrderSummary, v| o.name = v)
            .build()
            .unwrap();
        let doc = json!({"items": [{"sku": "a"}, {"sku": "b"}]});
        assert_eq!(map(&spec, &doc).unwrap().name, r#"["a","b"]"#);
    }

    #[test]
    fn test_missing_factory_is_an_instantiation_error() {
        let spec = ResultSpec::zoom(["customer"])
            .bind("name", "$.customer.name", |o: &mut OrderSummary, v| o.name = v)
            .build()
            .unwrap();
        let err = map(&spec, &json!({"customer": {"name": "Alice"}})).unwrap_err();
        assert!(matches!(err, Error::Instantiation { .. }));
    }

    #[test]
    fn test_failing_factory_reason_is_kept() {
        let spec = ResultSpec::zoom(["customer"])
            .try_factory(|| Err::<OrderSummary, _>("read-only profile"))
            .bind("name", "$.customer.name", |o: &mut OrderSummary, v| o.name = v)
            .build()
            .unwrap();
        match map(&spec, &json!({"customer": {"name": "Alice"}})) {
            Err(Error::Instantiation { reason, .. }) => assert_eq!(reason, "read-only profile"),
            other => panic!("expected instantiation error, got {:?}", other),
        }
    }
}
