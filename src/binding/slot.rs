//! Writable views over bindable struct fields.
//!
//! `#[derive(Bind)]` picks a [`Layout`] for every parameter field from its
//! declared type and hands the binder a boxed [`Target`]. The binder only
//! sees the shape of the field and a way to assign raw values to it.

use std::any::type_name;
use std::marker::PhantomData;

use super::coerce::{CoerceError, FromParam, ParamSchema};

/// Cardinality of a parameter field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Scalar,
    /// Growable sequence such as `Vec<T>`.
    Slice,
    /// Fixed-size array holding exactly this many elements.
    Array(usize),
}

impl Shape {
    #[must_use]
    pub fn is_sequence(self) -> bool {
        !matches!(self, Shape::Scalar)
    }
}

/// A field the binder can write raw parameter values into.
pub trait Target {
    fn type_name(&self) -> &'static str;

    fn shape(&self) -> Shape;

    /// Schema of a single element.
    fn schema(&self) -> ParamSchema;

    /// Convert `values` and store them in the field.
    ///
    /// Scalars read the first value. Sequences convert every value in order.
    fn assign(&mut self, values: &[String]) -> Result<(), CoerceError>;
}

/// How a Rust type maps onto parameter values.
pub trait Layout<T> {
    fn shape() -> Shape;
    fn schema() -> ParamSchema;
    fn parse(values: &[String]) -> Result<T, CoerceError>;
}

/// Single value, parsed with [`FromParam`].
pub struct Scalar;
/// `Vec<T>` of [`FromParam`] elements.
pub struct Sequence;
/// `[T; N]` of [`FromParam`] elements.
pub struct FixedArray;

impl<T: FromParam> Layout<T> for Scalar {
    fn shape() -> Shape {
        Shape::Scalar
    }

    fn schema() -> ParamSchema {
        T::SCHEMA
    }

    fn parse(values: &[String]) -> Result<T, CoerceError> {
        T::from_param(values.first().map(String::as_str).unwrap_or_default())
    }
}

impl<T: FromParam> Layout<Vec<T>> for Sequence {
    fn shape() -> Shape {
        Shape::Slice
    }

    fn schema() -> ParamSchema {
        T::SCHEMA
    }

    fn parse(values: &[String]) -> Result<Vec<T>, CoerceError> {
        values.iter().map(|raw| T::from_param(raw)).collect()
    }
}

impl<T: FromParam, const N: usize> Layout<[T; N]> for FixedArray {
    fn shape() -> Shape {
        Shape::Array(N)
    }

    fn schema() -> ParamSchema {
        T::SCHEMA
    }

    fn parse(values: &[String]) -> Result<[T; N], CoerceError> {
        let parsed = <Sequence as Layout<Vec<T>>>::parse(values)?;
        <[T; N]>::try_from(parsed).map_err(|rest: Vec<T>| CoerceError::Count {
            expected: N,
            got: rest.len(),
        })
    }
}

struct Direct<'a, T, K> {
    value: &'a mut T,
    layout: PhantomData<fn() -> K>,
}

impl<T, K: Layout<T>> Target for Direct<'_, T, K> {
    fn type_name(&self) -> &'static str {
        type_name::<T>()
    }

    fn shape(&self) -> Shape {
        K::shape()
    }

    fn schema(&self) -> ParamSchema {
        K::schema()
    }

    fn assign(&mut self, values: &[String]) -> Result<(), CoerceError> {
        *self.value = K::parse(values)?;
        Ok(())
    }
}

/// `Option<T>` field, allocated on first write.
struct Optional<'a, T, K> {
    value: &'a mut Option<T>,
    layout: PhantomData<fn() -> K>,
}

impl<T, K: Layout<T>> Target for Optional<'_, T, K> {
    fn type_name(&self) -> &'static str {
        type_name::<T>()
    }

    fn shape(&self) -> Shape {
        K::shape()
    }

    fn schema(&self) -> ParamSchema {
        K::schema()
    }

    fn assign(&mut self, values: &[String]) -> Result<(), CoerceError> {
        *self.value = Some(K::parse(values)?);
        Ok(())
    }
}

struct Rejecting {
    type_name: &'static str,
    error: fn(&'static str) -> CoerceError,
}

impl Target for Rejecting {
    fn type_name(&self) -> &'static str {
        self.type_name
    }

    fn shape(&self) -> Shape {
        Shape::Scalar
    }

    fn schema(&self) -> ParamSchema {
        ParamSchema::STRING
    }

    fn assign(&mut self, _values: &[String]) -> Result<(), CoerceError> {
        Err((self.error)(self.type_name))
    }
}

/// Slot writing straight into `value`.
pub fn slot<'a, T: 'a, K: Layout<T> + 'a>(value: &'a mut T) -> Box<dyn Target + 'a> {
    Box::new(Direct::<T, K> {
        value,
        layout: PhantomData,
    })
}

/// Slot for an `Option<T>` field; a successful write stores `Some`.
pub fn optional_slot<'a, T: 'a, K: Layout<T> + 'a>(
    value: &'a mut Option<T>,
) -> Box<dyn Target + 'a> {
    Box::new(Optional::<T, K> {
        value,
        layout: PhantomData,
    })
}

/// Slot for a field with no parameter representation (maps, tuples, ...).
#[must_use]
pub fn unsupported_slot(type_name: &'static str) -> Box<dyn Target> {
    Box::new(Rejecting {
        type_name,
        error: |type_name| CoerceError::UnsupportedType { type_name },
    })
}

/// Slot for a borrowed field that cannot own a parsed value.
#[must_use]
pub fn unaddressable_slot(type_name: &'static str) -> Box<dyn Target> {
    Box::new(Rejecting {
        type_name,
        error: |type_name| CoerceError::Unaddressable { type_name },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::bind_string_value;

    fn values(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_scalar_slot() {
        let mut port = 0u16;
        let mut target = slot::<_, Scalar>(&mut port);
        assert_eq!(target.shape(), Shape::Scalar);
        assert_eq!(target.schema().ty, "integer");
        bind_string_value("8080", target.as_mut()).unwrap();
        drop(target);
        assert_eq!(port, 8080);
    }

    #[test]
    fn test_sequence_slot_replaces_contents() {
        let mut ids = vec![9u32];
        slot::<_, Sequence>(&mut ids)
            .assign(&values(&["1", "2", "3"]))
            .unwrap();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_fixed_array_slot() {
        let mut pair = [0i32; 2];
        let mut target = slot::<_, FixedArray>(&mut pair);
        assert_eq!(target.shape(), Shape::Array(2));
        assert_eq!(
            target.assign(&values(&["1"])),
            Err(CoerceError::Count {
                expected: 2,
                got: 1
            })
        );
        target.assign(&values(&["4", "-5"])).unwrap();
        drop(target);
        assert_eq!(pair, [4, -5]);
    }

    #[test]
    fn test_optional_slot_allocates() {
        let mut limit: Option<u8> = None;
        optional_slot::<_, Scalar>(&mut limit)
            .assign(&values(&["7"]))
            .unwrap();
        assert_eq!(limit, Some(7));

        let mut bad: Option<u8> = None;
        assert!(optional_slot::<_, Scalar>(&mut bad)
            .assign(&values(&["700"]))
            .is_err());
        assert_eq!(bad, None);
    }

    #[test]
    fn test_rejecting_slots() {
        let err = unsupported_slot("HashMap<String,String>")
            .assign(&values(&["a"]))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "unsupported parameter type: HashMap<String,String>"
        );
        let err = unaddressable_slot("&str")
            .assign(&values(&["a"]))
            .unwrap_err();
        assert!(matches!(err, CoerceError::Unaddressable { .. }));
    }
}
