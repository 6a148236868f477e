//! Record introspection and attribute resolution.
//!
//! The [`Record`] trait is the only thing the filter engine knows about the
//! values it filters. It is usually derived with `#[derive(Record)]`, but
//! can be written by hand.
//!
//! Records may embed a "base" record (see [`Record::base`]). Resolution
//! looks at the record's own attributes first and then walks the base chain,
//! so attributes declared on a shared base struct are queryable on every
//! type that embeds it.

use tracing::warn;

use crate::error::{AccessError, FilterError, Result};
use crate::value::{DomainType, Value};

/// A value whose named attributes can be queried.
///
/// # Manual Implementation
///
/// ```
/// use rsql_filter::{AccessError, AttributeValue, DomainType, Record, Value};
///
/// struct Task {
///     name: String,
///     priority: Option<i32>,
/// }
///
/// impl Record for Task {
///     fn type_name(&self) -> &'static str {
///         "Task"
///     }
///
///     fn attribute_names(&self) -> &'static [&'static str] {
///         &["name", "priority"]
///     }
///
///     fn attribute_type(&self, name: &str) -> Option<DomainType> {
///         match name {
///             "name" => Some(DomainType::Text),
///             "priority" => Some(DomainType::Int32),
///             _ => None,
///         }
///     }
///
///     fn read_attribute(&self, name: &str) -> Result<Value<'_>, AccessError> {
///         match name {
///             "name" => Ok(self.name.to_value()),
///             "priority" => Ok(self.priority.to_value()),
///             _ => Err(AccessError::Unavailable),
///         }
///     }
/// }
/// ```
pub trait Record {
    /// Name of the record type, used in error messages.
    fn type_name(&self) -> &'static str;

    /// Attributes declared directly on this type, excluding the base chain.
    fn attribute_names(&self) -> &'static [&'static str];

    /// Declared domain type of an attribute on this type, or `None` if this
    /// type does not declare it. Must not consult the base chain.
    fn attribute_type(&self, name: &str) -> Option<DomainType>;

    /// Reads an attribute declared on this type.
    ///
    /// Only called for names where [`attribute_type`](Record::attribute_type)
    /// returned `Some`.
    fn read_attribute(&self, name: &str) -> std::result::Result<Value<'_>, AccessError>;

    /// The embedded base record, if this type extends another.
    fn base(&self) -> Option<&dyn Record> {
        None
    }
}

impl<R: Record + ?Sized> Record for &R {
    fn type_name(&self) -> &'static str {
        (**self).type_name()
    }

    fn attribute_names(&self) -> &'static [&'static str] {
        (**self).attribute_names()
    }

    fn attribute_type(&self, name: &str) -> Option<DomainType> {
        (**self).attribute_type(name)
    }

    fn read_attribute(&self, name: &str) -> std::result::Result<Value<'_>, AccessError> {
        (**self).read_attribute(name)
    }

    fn base(&self) -> Option<&dyn Record> {
        (**self).base()
    }
}

impl<R: Record + ?Sized> Record for Box<R> {
    fn type_name(&self) -> &'static str {
        (**self).type_name()
    }

    fn attribute_names(&self) -> &'static [&'static str] {
        (**self).attribute_names()
    }

    fn attribute_type(&self, name: &str) -> Option<DomainType> {
        (**self).attribute_type(name)
    }

    fn read_attribute(&self, name: &str) -> std::result::Result<Value<'_>, AccessError> {
        (**self).read_attribute(name)
    }

    fn base(&self) -> Option<&dyn Record> {
        (**self).base()
    }
}

/// An attribute located on a record: its declared type and current value.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved<'a> {
    pub domain: DomainType,
    pub value: Value<'a>,
}

/// Finds the record, own or base, that declares `name`.
fn locate<'a>(record: &'a dyn Record, name: &str) -> Option<(&'a dyn Record, DomainType)> {
    let mut current = Some(record);
    while let Some(r) = current {
        if let Some(domain) = r.attribute_type(name) {
            return Some((r, domain));
        }
        current = r.base();
    }
    None
}

/// Reports the declared domain type of `name` without reading it.
///
/// Fails with [`FilterError::UnknownAttribute`] if no record in the chain
/// declares the attribute.
pub fn describe(record: &dyn Record, name: &str) -> Result<DomainType> {
    match locate(record, name) {
        Some((_, domain)) => Ok(domain),
        None => Err(unknown(record, name)),
    }
}

/// Resolves `name` on `record`, walking the base chain.
///
/// Fails with [`FilterError::UnknownAttribute`] when the chain does not
/// declare the attribute, and with [`FilterError::AttributeAccess`] when the
/// declaring record cannot read it.
pub fn resolve<'a>(record: &'a dyn Record, name: &str) -> Result<Resolved<'a>> {
    let (owner, domain) = locate(record, name).ok_or_else(|| unknown(record, name))?;
    match owner.read_attribute(name) {
        Ok(value) => Ok(Resolved { domain, value }),
        Err(source) => {
            warn!(
                attribute = name,
                type_name = owner.type_name(),
                error = %source,
                "attribute reader failed"
            );
            Err(FilterError::AttributeAccess {
                attribute: name.to_string(),
                type_name: owner.type_name(),
                source,
            })
        }
    }
}

/// Lists every attribute visible on `record`, own attributes first.
pub fn visible_attributes(record: &dyn Record) -> Vec<&'static str> {
    let mut names = Vec::new();
    let mut current = Some(record);
    while let Some(r) = current {
        for name in r.attribute_names() {
            if !names.contains(name) {
                names.push(*name);
            }
        }
        current = r.base();
    }
    names
}

fn unknown(record: &dyn Record, name: &str) -> FilterError {
    warn!(
        attribute = name,
        type_name = record.type_name(),
        "attribute is not valid for record type"
    );
    FilterError::UnknownAttribute {
        attribute: name.to_string(),
        type_name: record.type_name(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::AttributeValue;

    struct Base {
        name: Option<String>,
        count: i32,
    }

    impl Record for Base {
        fn type_name(&self) -> &'static str {
            "Base"
        }

        fn attribute_names(&self) -> &'static [&'static str] {
            &["name", "count"]
        }

        fn attribute_type(&self, name: &str) -> Option<DomainType> {
            match name {
                "name" => Some(DomainType::Text),
                "count" => Some(DomainType::Int32),
                _ => None,
            }
        }

        fn read_attribute(&self, name: &str) -> std::result::Result<Value<'_>, AccessError> {
            match name {
                "name" => Ok(self.name.to_value()),
                "count" => Ok(self.count.to_value()),
                _ => Err(AccessError::Unavailable),
            }
        }
    }

    struct Extended {
        base: Base,
        secret: String,
    }

    impl Record for Extended {
        fn type_name(&self) -> &'static str {
            "Extended"
        }

        fn attribute_names(&self) -> &'static [&'static str] {
            &["secret", "count"]
        }

        fn attribute_type(&self, name: &str) -> Option<DomainType> {
            match name {
                "secret" => Some(DomainType::Text),
                // Shadows the base attribute with a different type.
                "count" => Some(DomainType::Int64),
                _ => None,
            }
        }

        fn read_attribute(&self, name: &str) -> std::result::Result<Value<'_>, AccessError> {
            match name {
                "secret" => Err(AccessError::Failed(format!(
                    "{} bytes hidden",
                    self.secret.len()
                ))),
                "count" => Ok(Value::Int64(i64::from(self.base.count) * 10)),
                _ => Err(AccessError::Unavailable),
            }
        }

        fn base(&self) -> Option<&dyn Record> {
            Some(&self.base)
        }
    }

    fn extended() -> Extended {
        Extended {
            base: Base {
                name: Some("alpha".into()),
                count: 2,
            },
            secret: "abc".into(),
        }
    }

    #[test]
    fn resolves_own_attribute() {
        let base = Base {
            name: None,
            count: 7,
        };
        let resolved = resolve(&base, "count").unwrap();
        assert_eq!(resolved.domain, DomainType::Int32);
        assert_eq!(resolved.value, Value::Int32(7));

        let resolved = resolve(&base, "name").unwrap();
        assert_eq!(resolved.value, Value::Null);
    }

    #[test]
    fn resolves_through_base_chain() {
        let record = extended();
        let resolved = resolve(&record, "name").unwrap();
        assert_eq!(resolved.domain, DomainType::Text);
        assert_eq!(resolved.value, Value::Text("alpha"));
    }

    #[test]
    fn own_attribute_shadows_base() {
        let record = extended();
        let resolved = resolve(&record, "count").unwrap();
        assert_eq!(resolved.domain, DomainType::Int64);
        assert_eq!(resolved.value, Value::Int64(20));
    }

    #[test]
    fn unknown_attribute() {
        let record = extended();
        let err = resolve(&record, "missing").unwrap_err();
        assert_eq!(
            err,
            FilterError::UnknownAttribute {
                attribute: "missing".into(),
                type_name: "Extended",
            }
        );
        assert!(describe(&record, "missing").is_err());
    }

    #[test]
    fn reader_failure_is_access_error() {
        let record = extended();
        let err = resolve(&record, "secret").unwrap_err();
        assert_eq!(err.status(), 500);
        assert!(matches!(
            err,
            FilterError::AttributeAccess {
                type_name: "Extended",
                ..
            }
        ));
    }

    #[test]
    fn describe_does_not_read() {
        let record = extended();
        assert_eq!(describe(&record, "secret").unwrap(), DomainType::Text);
        assert_eq!(describe(&record, "name").unwrap(), DomainType::Text);
    }

    #[test]
    fn boxed_records_resolve() {
        let records: Vec<Box<dyn Record>> = vec![
            Box::new(extended()),
            Box::new(Base {
                name: Some("beta".into()),
                count: 1,
            }),
        ];
        let names: Vec<Value<'_>> = records
            .iter()
            .map(|r| resolve(r, "name").unwrap().value)
            .collect();
        assert_eq!(names, vec![Value::Text("alpha"), Value::Text("beta")]);
    }

    #[test]
    fn visible_attributes_dedupes_shadowed_names() {
        let record = extended();
        assert_eq!(visible_attributes(&record), vec!["secret", "count", "name"]);
    }
}
