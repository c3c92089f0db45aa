//! Result descriptors
//!
//! A [`ResultSpec`] tells the client how to produce a `T` from a response:
//! either decode the body directly with serde, or zoom into linked resources
//! and fill each declared field from a path expression.

use crate::error::{Error, Result};
use crate::jsonpath::JsonPath;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::fmt;

/// A type the client knows how to fetch
///
/// Implemented by hand for builder-described types, by [`zoom_resource!`](crate::zoom_resource)
/// for zoomed types and by [`direct_resource!`](crate::direct_resource) for plain serde types.
pub trait Resource: Sized {
    fn describe() -> Result<ResultSpec<Self>>;
}

impl Resource for serde_json::Value {
    fn describe() -> Result<ResultSpec<Self>> {
        Ok(ResultSpec::direct())
    }
}

type Setter<T> = Box<dyn Fn(&mut T, String) + Send + Sync>;
type Factory<T> = Box<dyn Fn() -> std::result::Result<T, String> + Send + Sync>;
type Decoder<T> = fn(&str) -> serde_json::Result<T>;

/// One declared output field and the path its text is read from
pub struct FieldBinding<T> {
    field: String,
    path: JsonPath,
    setter: Setter<T>,
}

impl<T> FieldBinding<T> {
    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn path(&self) -> &JsonPath {
        &self.path
    }

    pub(crate) fn assign(&self, target: &mut T, value: String) {
        (self.setter)(target, value)
    }
}

impl<T> fmt::Debug for FieldBinding<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldBinding")
            .field("field", &self.field)
            .field("path", &self.path.expression())
            .finish()
    }
}

pub(crate) enum Construction<T> {
    Decode(Decoder<T>),
    Factory(Factory<T>),
    Missing,
}

/// How a result type is fetched
pub struct ResultSpec<T> {
    type_name: &'static str,
    zoom_steps: Vec<String>,
    bindings: Vec<FieldBinding<T>>,
    construction: Construction<T>,
}

impl<T> ResultSpec<T> {
    /// Fetch without zoom and decode the body with serde
    pub fn direct() -> Self
    where
        T: DeserializeOwned,
    {
        Self {
            type_name: std::any::type_name::<T>(),
            zoom_steps: Vec::new(),
            bindings: Vec::new(),
            construction: Construction::Decode(|body: &str| serde_json::from_str::<T>(body)),
        }
    }

    /// Start describing a zoomed result with its ordered expansion steps
    pub fn zoom<I, S>(steps: I) -> ResultSpecBuilder<T>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ResultSpecBuilder {
            type_name: std::any::type_name::<T>(),
            zoom_steps: steps.into_iter().map(Into::into).collect(),
            declared: Vec::new(),
            bindings: Vec::new(),
            factory: None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn zoom_steps(&self) -> &[String] {
        &self.zoom_steps
    }

    pub fn is_zoomed(&self) -> bool {
        !self.zoom_steps.is_empty()
    }

    pub fn bindings(&self) -> &[FieldBinding<T>] {
        &self.bindings
    }

    pub(crate) fn construction(&self) -> &Construction<T> {
        &self.construction
    }
}

impl<T> fmt::Debug for ResultSpec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResultSpec")
            .field("type_name", &self.type_name)
            .field("zoom_steps", &self.zoom_steps)
            .field("bindings", &self.bindings)
            .finish()
    }
}

/// Collects steps, declared fields and bindings; [`build`](Self::build) validates them
pub struct ResultSpecBuilder<T> {
    type_name: &'static str,
    zoom_steps: Vec<String>,
    declared: Vec<String>,
    bindings: Vec<(String, String, Setter<T>)>,
    factory: Option<Factory<T>>,
}

impl<T: 'static> ResultSpecBuilder<T> {
    /// Declare an output field. Once any field is declared, every declared field
    /// needs a binding and every binding needs a declaration.
    pub fn declare(mut self, field: impl Into<String>) -> Self {
        self.declared.push(field.into());
        self
    }

    /// Bind `field` to `expression`; `setter` receives the matched value as text
    pub fn bind<F>(mut self, field: impl Into<String>, expression: impl Into<String>, setter: F) -> Self
    where
        F: Fn(&mut T, String) + Send + Sync + 'static,
    {
        self.bindings
            .push((field.into(), expression.into(), Box::new(setter)));
        self
    }

    pub fn factory<F>(mut self, factory: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        self.factory = Some(Box::new(move || Ok(factory())));
        self
    }

    /// Factory that may refuse to construct; the error becomes `Error::Instantiation`
    pub fn try_factory<F, E>(mut self, factory: F) -> Self
    where
        F: Fn() -> std::result::Result<T, E> + Send + Sync + 'static,
        E: fmt::Display,
    {
        self.factory = Some(Box::new(move || factory().map_err(|e| e.to_string())));
        self
    }

    pub fn with_default(self) -> Self
    where
        T: Default,
    {
        self.factory(T::default)
    }

    pub fn build(self) -> Result<ResultSpec<T>> {
        let type_name = self.type_name;
        let fail = |reason: String| Err(Error::configuration(type_name, reason));

        if self.zoom_steps.is_empty() {
            return fail("zoom requires at least one expansion step".to_string());
        }
        for (position, step) in self.zoom_steps.iter().enumerate() {
            if step.trim().is_empty() {
                return fail(format!("zoom step {} is empty", position));
            }
            if step.contains(super::request::ZOOM_DELIMITER) {
                return fail(format!(
                    "zoom step '{}' contains the '{}' delimiter",
                    step,
                    super::request::ZOOM_DELIMITER
                ));
            }
        }

        if self.bindings.is_empty() {
            return fail("zoomed result declares no field bindings".to_string());
        }

        let mut bound = HashSet::new();
        for (field, _, _) in &self.bindings {
            if !bound.insert(field.as_str()) {
                return fail(format!("field '{}' is bound more than once", field));
            }
        }

        if !self.declared.is_empty() {
            let mut declared = HashSet::new();
            for field in &self.declared {
                if !declared.insert(field.as_str()) {
                    return fail(format!("field '{}' is declared more than once", field));
                }
                if !bound.contains(field.as_str()) {
                    return fail(format!("field '{}' has no path binding", field));
                }
            }
            if let Some((extra, _, _)) = self
                .bindings
                .iter()
                .find(|(field, _, _)| !declared.contains(field.as_str()))
            {
                return fail(format!("binding for undeclared field '{}'", extra));
            }
        }

        let mut bindings = Vec::with_capacity(self.bindings.len());
        for (field, expression, setter) in self.bindings {
            if expression.trim().is_empty() {
                return fail(format!("field '{}' has an empty path expression", field));
            }
            let path = match JsonPath::compile(&expression) {
                Ok(path) => path,
                Err(e) => return fail(format!("field '{}' has an invalid path expression: {}", field, e)),
            };
            bindings.push(FieldBinding { field, path, setter });
        }

        tracing::trace!(
            "Described {} with zoom {:?} and {} bindings",
            type_name,
            self.zoom_steps,
            bindings.len()
        );

        Ok(ResultSpec {
            type_name,
            zoom_steps: self.zoom_steps,
            bindings,
            construction: match self.factory {
                Some(factory) => Construction::Factory(factory),
                None => Construction::Missing,
            },
        })
    }
}

/// Field text keyed by binding name, for result shapes only known at runtime
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldMap(BTreeMap<String, String>);

impl FieldMap {
    /// Spec that zooms with `steps` and stores each binding under its field name
    pub fn spec<I, S, B, F, P>(steps: I, bindings: B) -> Result<ResultSpec<FieldMap>>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        B: IntoIterator<Item = (F, P)>,
        F: Into<String>,
        P: Into<String>,
    {
        let mut builder = ResultSpec::zoom(steps).with_default();
        for (field, expression) in bindings {
            let field = field.into();
            let key = field.clone();
            builder = builder.bind(field, expression, move |map: &mut FieldMap, value| {
                map.0.insert(key.clone(), value);
            });
        }
        builder.build()
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn into_inner(self) -> BTreeMap<String, String> {
        self.0
    }
}
