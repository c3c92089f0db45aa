//! Zoom URL construction

use crate::error::{Error, Result};
use url::Url;

/// Query parameter that carries the expansion steps
pub const ZOOM_PARAM: &str = "zoom";

/// Separator between steps inside the `zoom` value
pub const ZOOM_DELIMITER: char = ':';

/// `zoom` parameter value: steps percent-encoded and joined in the given order
pub fn zoom_value<S: AsRef<str>>(steps: &[S]) -> String {
    steps
        .iter()
        .map(|step| urlencoding::encode(step.as_ref()))
        .collect::<Vec<_>>()
        .join(ZOOM_DELIMITER.to_string().as_str())
}

/// Parse `base` and append the zoom parameter (see [`with_zoom`])
pub fn build_zoom_url<S: AsRef<str>>(base: &str, steps: &[S]) -> Result<Url> {
    let url = Url::parse(base).map_err(|source| Error::InvalidUrl {
        url: base.to_string(),
        source,
    })?;
    Ok(with_zoom(&url, steps))
}

/// Copy of `base` with a single `zoom` parameter holding `steps`
///
/// Other query parameters are kept as written. An existing `zoom` parameter is
/// replaced, never merged. Without steps the URL is returned unchanged.
pub fn with_zoom<S: AsRef<str>>(base: &Url, steps: &[S]) -> Url {
    let mut url = base.clone();
    if steps.is_empty() {
        return url;
    }

    let mut replaced = false;
    let mut pairs = Vec::new();
    for pair in base.query().unwrap_or_default().split('&').filter(|p| !p.is_empty()) {
        if is_zoom_pair(pair) {
            replaced = true;
        } else {
            pairs.push(pair.to_string());
        }
    }
    if replaced {
        tracing::debug!("Replacing existing zoom parameter on {}", base);
    }

    pairs.push(format!("{}={}", ZOOM_PARAM, zoom_value(steps)));
    url.set_query(Some(&pairs.join("&")));
    url
}

fn is_zoom_pair(pair: &str) -> bool {
    let key = pair.split('=').next().unwrap_or(pair);
    urlencoding::decode(key).is_ok_and(|key| key == ZOOM_PARAM)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_orders_example() {
        let url = build_zoom_url("https://api.example.com/orders/42", &["customer", "items"]).unwrap();
        assert_eq!(url.as_str(), "https://api.example.com/orders/42?zoom=customer:items");
    }

    #[test]
    fn test_order_is_preserved_and_not_deduplicated() {
        let url = build_zoom_url("https://api.example.com/carts/default", &["lineitems", "element", "element"]).unwrap();
        assert_eq!(url.query(), Some("zoom=lineitems:element:element"));
    }

    #[test]
    fn test_existing_parameters_are_kept() {
        let url = build_zoom_url("https://api.example.com/items?format=json&lang=en", &["price"]).unwrap();
        assert_eq!(url.query(), Some("format=json&lang=en&zoom=price"));
    }

    #[test]
    fn test_existing_zoom_is_overwritten() {
        let url = build_zoom_url("https://api.example.com/items?zoom=old:path&a=1", &["availability"]).unwrap();
        assert_eq!(url.query(), Some("a=1&zoom=availability"));

        let zooms: Vec<_> = url.query_pairs().filter(|(k, _)| k == ZOOM_PARAM).collect();
        assert_eq!(zooms.len(), 1);
    }

    #[test]
    fn test_fragment_survives() {
        let url = build_zoom_url("https://api.example.com/items#top", &["price"]).unwrap();
        assert_eq!(url.as_str(), "https://api.example.com/items?zoom=price#top");
    }

    #[test]
    fn test_steps_are_percent_encoded() {
        assert_eq!(zoom_value(&["a b", "c&d"]), "a%20b:c%26d");
    }

    #[test]
    fn test_no_steps_leaves_url_alone() {
        let url = build_zoom_url("https://api.example.com/items?a=1", &[] as &[&str]).unwrap();
        assert_eq!(url.as_str(), "https://api.example.com/items?a=1");
    }

    #[test]
    fn test_relative_base_is_rejected() {
        let err = build_zoom_url("/orders/42", &["customer"]).unwrap_err();
        assert!(matches!(err, Error::InvalidUrl { .. }));
    }
}
