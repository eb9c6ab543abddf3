//! Editable-field schema for variant attributes.
//!
//! A [`FieldSpec`] describes one user-editable value of a variant: how to
//! show it and how to fold a changed value back into a complete attribute
//! dictionary. [`EditableField`] binds a spec to an element's current
//! attributes and is what an editing panel works with.

use std::fmt;

use railmap_core::attrs::Attrs;

use crate::error::RailmapError;

type ReadFn = Box<dyn Fn(&Attrs) -> String>;
type ValidateFn = Box<dyn Fn(&str) -> bool>;
type WriteFn = Box<dyn Fn(&str, Attrs) -> Attrs>;

/// How a field is presented for editing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    /// Free text input.
    Input,
    /// One of a fixed set of values.
    Select(Vec<String>),
}

/// Schema entry for one editable attribute.
pub struct FieldSpec {
    key: String,
    label: String,
    kind: FieldKind,
    read: ReadFn,
    validate: ValidateFn,
    write: WriteFn,
}

impl fmt::Debug for FieldSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldSpec")
            .field("key", &self.key)
            .field("label", &self.label)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

impl FieldSpec {
    /// Creates a field from explicit read and write handlers.
    pub fn new(
        key: &str,
        label: &str,
        kind: FieldKind,
        read: impl Fn(&Attrs) -> String + 'static,
        write: impl Fn(&str, Attrs) -> Attrs + 'static,
    ) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            kind,
            read: Box::new(read),
            validate: Box::new(|_| true),
            write: Box::new(write),
        }
    }

    /// A free-text field stored as a text attribute under `key`.
    pub fn text(key: &str, label: &str) -> Self {
        let read_key = key.to_string();
        let write_key = key.to_string();
        Self::new(
            key,
            label,
            FieldKind::Input,
            move |attrs| attrs.text(&read_key).unwrap_or_default().to_string(),
            move |value, attrs| attrs.with(&write_key, value),
        )
    }

    /// A numeric field stored as a number attribute under `key`.
    ///
    /// Candidates must parse as a finite number.
    pub fn number(key: &str, label: &str) -> Self {
        let read_key = key.to_string();
        let write_key = key.to_string();
        Self::new(
            key,
            label,
            FieldKind::Input,
            move |attrs| {
                attrs
                    .number(&read_key)
                    .map(|n| n.to_string())
                    .unwrap_or_default()
            },
            move |value, attrs| match parse_number(value) {
                Some(n) => attrs.with(&write_key, n),
                None => attrs,
            },
        )
        .with_validator(|value| parse_number(value).is_some())
    }

    /// A select field stored as a text attribute under `key`.
    pub fn select(key: &str, label: &str, options: &[&str]) -> Self {
        let read_key = key.to_string();
        let write_key = key.to_string();
        Self::new(
            key,
            label,
            FieldKind::Select(options.iter().map(|o| o.to_string()).collect()),
            move |attrs| attrs.text(&read_key).unwrap_or_default().to_string(),
            move |value, attrs| attrs.with(&write_key, value),
        )
    }

    /// A text field editing the `index`-th entry of the list attribute `key`.
    pub fn list_item(key: &str, index: usize, label: &str) -> Self {
        let read_key = key.to_string();
        let write_key = key.to_string();
        Self::new(
            &format!("{key}[{index}]"),
            label,
            FieldKind::Input,
            move |attrs| {
                attrs
                    .list_text(&read_key, index)
                    .unwrap_or_default()
                    .to_string()
            },
            move |value, mut attrs| {
                attrs.set_list_text(&write_key, index, value);
                attrs
            },
        )
    }

    /// Replaces the candidate validator.
    pub fn with_validator(mut self, validate: impl Fn(&str) -> bool + 'static) -> Self {
        self.validate = Box::new(validate);
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn kind(&self) -> &FieldKind {
        &self.kind
    }

    fn accepts(&self, candidate: &str) -> bool {
        match &self.kind {
            FieldKind::Select(options) => options.iter().any(|o| o == candidate),
            FieldKind::Input => (self.validate)(candidate),
        }
    }
}

fn parse_number(value: &str) -> Option<f64> {
    value.trim().parse::<f64>().ok().filter(|n| n.is_finite())
}

/// A field bound to the complete attributes of one element.
#[derive(Debug)]
pub struct EditableField<'a> {
    spec: &'a FieldSpec,
    current: Attrs,
}

impl<'a> EditableField<'a> {
    /// Binds `spec` to `current`, which must already be completed from the
    /// descriptor defaults.
    pub(crate) fn new(spec: &'a FieldSpec, current: Attrs) -> Self {
        Self { spec, current }
    }

    pub fn spec(&self) -> &FieldSpec {
        self.spec
    }

    /// The value shown in the editor for the current attributes.
    pub fn display_value(&self) -> String {
        (self.spec.read)(&self.current)
    }

    pub fn validate(&self, candidate: &str) -> bool {
        self.spec.accepts(candidate)
    }

    /// Produces the complete new attributes for `candidate`.
    ///
    /// # Errors
    ///
    /// Returns [`RailmapError::Validation`] when the candidate is rejected.
    pub fn commit(&self, candidate: &str) -> Result<Attrs, RailmapError> {
        if !self.validate(candidate) {
            return Err(RailmapError::Validation {
                field: self.spec.key.clone(),
                value: candidate.to_string(),
            });
        }
        Ok((self.spec.write)(candidate, self.current.clone()))
    }
}
