//! Segment evaluation against a parsed JSON document
//!
//! Nodes are collected in document order. Selectors that do not apply to a
//! node's type (a name on an array, an index on an object) select nothing.

use super::ast::{CompareOp, FilterExpr, Operand, PathFunction, QueryPath, Segment, Selector};
use serde_json::{Number, Value};

/// Apply `segments` starting from `current`; `root` backs `$` inside filters
pub(crate) fn select<'v>(segments: &[Segment], current: &'v Value, root: &'v Value) -> Vec<&'v Value> {
    let mut nodes = vec![current];
    for segment in segments {
        let mut next = Vec::new();
        for node in nodes {
            match segment {
                Segment::Child(selectors) => apply(selectors, node, root, &mut next),
                Segment::Descendant(selectors) => descend(selectors, node, root, &mut next),
            }
        }
        if next.is_empty() {
            return next;
        }
        nodes = next;
    }
    nodes
}

fn descend<'v>(selectors: &[Selector], node: &'v Value, root: &'v Value, out: &mut Vec<&'v Value>) {
    apply(selectors, node, root, out);
    match node {
        Value::Object(map) => {
            for child in map.values() {
                descend(selectors, child, root, out);
            }
        }
        Value::Array(items) => {
            for child in items {
                descend(selectors, child, root, out);
            }
        }
        _ => {}
    }
}

fn apply<'v>(selectors: &[Selector], node: &'v Value, root: &'v Value, out: &mut Vec<&'v Value>) {
    for selector in selectors {
        match selector {
            Selector::Name(name) => {
                if let Some(child) = node.as_object().and_then(|map| map.get(name)) {
                    out.push(child);
                }
            }
            Selector::Wildcard => out.extend(children(node)),
            Selector::Index(index) => {
                if let Value::Array(items) = node {
                    if let Some(i) = normalize_index(*index, items.len()) {
                        out.push(&items[i]);
                    }
                }
            }
            Selector::Slice { start, end, step } => {
                if let Value::Array(items) = node {
                    out.extend(
                        slice_indices(*start, *end, *step, items.len())
                            .into_iter()
                            .map(|i| &items[i]),
                    );
                }
            }
            Selector::Filter(expr) => {
                out.extend(children(node).filter(|child| test(expr, child, root)));
            }
        }
    }
}

fn children(node: &Value) -> Box<dyn Iterator<Item = &Value> + '_> {
    match node {
        Value::Object(map) => Box::new(map.values()),
        Value::Array(items) => Box::new(items.iter()),
        _ => Box::new(std::iter::empty()),
    }
}

fn normalize_index(index: i64, len: usize) -> Option<usize> {
    if index >= 0 {
        let i = usize::try_from(index).ok()?;
        (i < len).then_some(i)
    } else {
        let back = usize::try_from(index.unsigned_abs()).ok()?;
        (back <= len).then(|| len - back)
    }
}

/// Array positions selected by a slice, per RFC 9535 section 2.3.4.2
fn slice_indices(start: Option<i64>, end: Option<i64>, step: Option<i64>, len: usize) -> Vec<usize> {
    let step = step.unwrap_or(1);
    if step == 0 || len == 0 {
        return Vec::new();
    }

    let len = len as i64;
    let normalize = |i: i64| if i >= 0 { i } else { len + i };
    let mut indices = Vec::new();

    if step > 0 {
        let lower = start.map(normalize).unwrap_or(0).clamp(0, len);
        let upper = end.map(normalize).unwrap_or(len).clamp(0, len);
        let mut i = lower;
        while i < upper {
            indices.push(i as usize);
            let Some(next) = i.checked_add(step) else { break };
            i = next;
        }
    } else {
        let upper = start.map(normalize).unwrap_or(len - 1).clamp(-1, len - 1);
        let lower = end.map(normalize).unwrap_or(-1).clamp(-1, len - 1);
        let mut i = upper;
        while lower < i {
            indices.push(i as usize);
            let Some(next) = i.checked_add(step) else { break };
            i = next;
        }
    }
    indices
}

/// Apply a trailing function to the value a path read
pub(crate) fn call(function: PathFunction, value: Value) -> Result<Value, String> {
    let type_error = |value: &Value| {
        format!("{}() cannot be applied to {}", function.name(), type_of(value))
    };

    match function {
        PathFunction::Length => match &value {
            Value::Array(items) => Ok(Value::from(items.len())),
            Value::Object(map) => Ok(Value::from(map.len())),
            Value::String(s) => Ok(Value::from(s.chars().count())),
            other => Err(type_error(other)),
        },
        PathFunction::Keys => match value {
            Value::Object(map) => Ok(Value::Array(map.into_iter().map(|(k, _)| Value::String(k)).collect())),
            other => Err(type_error(&other)),
        },
        PathFunction::First | PathFunction::Last => match value {
            Value::Array(items) => {
                let item = if function == PathFunction::First {
                    items.into_iter().next()
                } else {
                    items.into_iter().last()
                };
                item.ok_or_else(|| format!("{}() of an empty array", function.name()))
            }
            other => Err(type_error(&other)),
        },
        PathFunction::Min
        | PathFunction::Max
        | PathFunction::Avg
        | PathFunction::Sum
        | PathFunction::Stddev => {
            let Value::Array(items) = &value else {
                return Err(type_error(&value));
            };
            let numbers: Vec<f64> = items.iter().filter_map(Value::as_f64).collect();
            if numbers.is_empty() {
                return Err(format!("{}() found no numbers to aggregate", function.name()));
            }
            let count = numbers.len() as f64;
            let sum: f64 = numbers.iter().sum();
            let result = match function {
                PathFunction::Min => numbers.iter().copied().fold(f64::INFINITY, f64::min),
                PathFunction::Max => numbers.iter().copied().fold(f64::NEG_INFINITY, f64::max),
                PathFunction::Sum => sum,
                PathFunction::Avg => sum / count,
                _ => {
                    let mean = sum / count;
                    let squares: f64 = numbers.iter().map(|n| n * n).sum();
                    (squares / count - mean * mean).max(0.0).sqrt()
                }
            };
            Number::from_f64(result)
                .map(Value::Number)
                .ok_or_else(|| format!("{}() result is not a finite number", function.name()))
        }
    }
}

fn type_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn test(expr: &FilterExpr, node: &Value, root: &Value) -> bool {
    match expr {
        FilterExpr::Or(left, right) => test(left, node, root) || test(right, node, root),
        FilterExpr::And(left, right) => test(left, node, root) && test(right, node, root),
        FilterExpr::Not(inner) => !test(inner, node, root),
        FilterExpr::Exists(query) => !query_nodes(query, node, root).is_empty(),
        FilterExpr::Compare { left, op, right } => {
            let left = resolve(left, node, root);
            let right = resolve(right, node, root);
            compare(left, *op, right)
        }
    }
}

fn query_nodes<'v>(query: &QueryPath, node: &'v Value, root: &'v Value) -> Vec<&'v Value> {
    let start = if query.absolute { root } else { node };
    select(&query.segments, start, root)
}

/// Comparable value of an operand; queries that do not select exactly one node are absent
fn resolve<'v>(operand: &'v Operand, node: &'v Value, root: &'v Value) -> Option<&'v Value> {
    match operand {
        Operand::Literal(value) => Some(value),
        Operand::Query(query) => match query_nodes(query, node, root).as_slice() {
            [single] => Some(*single),
            _ => None,
        },
    }
}

fn compare(left: Option<&Value>, op: CompareOp, right: Option<&Value>) -> bool {
    match op {
        CompareOp::Eq => equal(left, right),
        CompareOp::Ne => !equal(left, right),
        CompareOp::Lt => less(left, right),
        CompareOp::Le => less(left, right) || equal(left, right),
        CompareOp::Gt => less(right, left),
        CompareOp::Ge => less(right, left) || equal(left, right),
    }
}

fn equal(left: Option<&Value>, right: Option<&Value>) -> bool {
    match (left, right) {
        (None, None) => true,
        (Some(a), Some(b)) => values_equal(a, b),
        _ => false,
    }
}

fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| values_equal(x, y))
        }
        (Value::Object(xs), Value::Object(ys)) => {
            xs.len() == ys.len()
                && xs
                    .iter()
                    .all(|(key, x)| ys.get(key).is_some_and(|y| values_equal(x, y)))
        }
        _ => a == b,
    }
}

fn less(left: Option<&Value>, right: Option<&Value>) -> bool {
    match (left, right) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => match (x.as_f64(), y.as_f64()) {
            (Some(x), Some(y)) => x < y,
            _ => false,
        },
        (Some(Value::String(x)), Some(Value::String(y))) => x < y,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jsonpath::parser::parse;
    use serde_json::json;

    fn query(expression: &str, document: &Value) -> Vec<Value> {
        let segments = parse(expression).unwrap().segments;
        select(&segments, document, document).into_iter().cloned().collect()
    }

    fn store() -> Value {
        json!({
            "store": {
                "book": [
                    {"category": "reference", "author": "Nigel Rees", "price": 8.95},
                    {"category": "fiction", "author": "Evelyn Waugh", "price": 12.99},
                    {"category": "fiction", "author": "Herman Melville", "isbn": "0-553-21311-3", "price": 8.99},
                    {"category": "fiction", "author": "J. R. R. Tolkien", "isbn": "0-395-19395-8", "price": 22.99}
                ],
                "bicycle": {"color": "red", "price": 19.95}
            },
            "expensive": 10
        })
    }

    #[test]
    fn test_child_and_index() {
        let doc = store();
        assert_eq!(query("$.store.bicycle.color", &doc), vec![json!("red")]);
        assert_eq!(query("$.store.book[0].author", &doc), vec![json!("Nigel Rees")]);
        assert_eq!(query("$.store.book[-1].author", &doc), vec![json!("J. R. R. Tolkien")]);
        assert!(query("$.store.book[4]", &doc).is_empty());
        assert!(query("$.store.missing.deeper", &doc).is_empty());
    }

    #[test]
    fn test_wildcard_and_descendants() {
        let doc = store();
        assert_eq!(query("$.store.book[*].author", &doc).len(), 4);
        assert_eq!(
            query("$..price", &doc),
            vec![json!(8.95), json!(12.99), json!(8.99), json!(22.99), json!(19.95)]
        );
    }

    #[test]
    fn test_slices() {
        let doc = json!([0, 1, 2, 3, 4, 5]);
        assert_eq!(query("$[1:3]", &doc), vec![json!(1), json!(2)]);
        assert_eq!(query("$[-2:]", &doc), vec![json!(4), json!(5)]);
        assert_eq!(query("$[::2]", &doc), vec![json!(0), json!(2), json!(4)]);
        assert_eq!(query("$[::-1]", &doc).len(), 6);
        assert_eq!(query("$[::-1]", &doc)[0], json!(5));
        assert!(query("$[::0]", &doc).is_empty());
        assert!(query("$[10:20]", &doc).is_empty());
    }

    #[test]
    fn test_filters() {
        let doc = store();
        assert_eq!(
            query("$.store.book[?(@.price < 10)].author", &doc),
            vec![json!("Nigel Rees"), json!("Herman Melville")]
        );
        assert_eq!(query("$.store.book[?(@.isbn)].author", &doc).len(), 2);
        assert_eq!(
            query("$.store.book[?(@.price > $.expensive && @.category == 'fiction')].author", &doc),
            vec![json!("Evelyn Waugh"), json!("J. R. R. Tolkien")]
        );
        assert_eq!(query("$.store.book[?(!@.isbn)]", &doc).len(), 2);
        assert_eq!(
            query("$.store.book[?@.author == \"Nigel Rees\" || @.price >= 22.99].price", &doc),
            vec![json!(8.95), json!(22.99)]
        );
    }

    #[test]
    fn test_integer_and_float_compare_equal() {
        let doc = json!([{"qty": 1}, {"qty": 1.0}, {"qty": "1"}]);
        assert_eq!(query("$[?(@.qty == 1)]", &doc).len(), 2);
    }

    #[test]
    fn test_missing_members_compare() {
        let doc = json!([{"a": 1}, {"b": 2}]);
        assert_eq!(query("$[?(@.a != 1)]", &doc), vec![json!({"b": 2})]);
        assert!(query("$[?(@.a < 5)].b", &doc).is_empty());
    }

    #[test]
    fn test_slice_indices_negative_step_bounds() {
        assert_eq!(slice_indices(Some(4), Some(1), Some(-1), 6), vec![4, 3, 2]);
        assert_eq!(slice_indices(None, None, Some(-2), 5), vec![4, 2, 0]);
        assert!(slice_indices(None, None, None, 0).is_empty());
    }

    #[test]
    fn test_slice_with_huge_step_does_not_overflow() {
        let doc = json!([0, 1, 2, 3]);
        assert_eq!(query("$[1:3:9223372036854775807]", &doc), vec![json!(1)]);
        assert_eq!(query("$[2::-9223372036854775808]", &doc), vec![json!(2)]);
        assert_eq!(slice_indices(Some(i64::MAX), None, Some(i64::MAX), 4), Vec::<usize>::new());
    }

    #[test]
    fn test_functions() {
        let prices = json!([3, 1.5, "n/a", 4.5]);
        assert_eq!(call(PathFunction::Length, prices.clone()), Ok(json!(4)));
        assert_eq!(call(PathFunction::Min, prices.clone()), Ok(json!(1.5)));
        assert_eq!(call(PathFunction::Max, prices.clone()), Ok(json!(4.5)));
        assert_eq!(call(PathFunction::Sum, prices.clone()), Ok(json!(9.0)));
        assert_eq!(call(PathFunction::Avg, prices.clone()), Ok(json!(3.0)));
        assert_eq!(call(PathFunction::Stddev, json!([2, 4, 4, 4, 5, 5, 7, 9])), Ok(json!(2.0)));
        assert_eq!(call(PathFunction::First, prices.clone()), Ok(json!(3)));
        assert_eq!(call(PathFunction::Last, prices), Ok(json!(4.5)));

        let object = json!({"b": 1, "a": 2});
        assert_eq!(call(PathFunction::Keys, object.clone()), Ok(json!(["b", "a"])));
        assert_eq!(call(PathFunction::Length, object), Ok(json!(2)));
        assert_eq!(call(PathFunction::Length, json!("héllo")), Ok(json!(5)));
    }

    #[test]
    fn test_function_errors() {
        assert_eq!(
            call(PathFunction::Keys, json!([1])),
            Err("keys() cannot be applied to an array".to_string())
        );
        assert!(call(PathFunction::Sum, json!(["a"])).is_err());
        assert!(call(PathFunction::First, json!([])).is_err());
        assert!(call(PathFunction::Length, json!(null)).is_err());
    }
}
