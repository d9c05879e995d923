//! Field-path resolution over nested structural values.
//!
//! Configuration decoding addresses nested fields by index path: `[0, 2, 1]`
//! means "field 0 of the root, then field 2 of that, then field 1". Pointer
//! fields are dereferenced between steps. A nil pointer on the path is either
//! allocated with the zero value of its pointee (so the final field can be
//! written through the root) or, when allocation is disabled, the walk yields a
//! detached zero value of the final field that cannot be written back.
//!
//! Everything here is pure: the only state touched is the `Value` passed in.

use serde::{Deserialize, Serialize};

/// Discriminant shared by [`Shape`] and [`Value`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Kind {
    Bool,
    Int,
    Float,
    String,
    Struct,
    Pointer,
}

/// Type description of a value, used to build zero values on allocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Shape {
    Bool,
    Int,
    Float,
    String,
    /// Ordered named fields.
    Struct(Vec<FieldShape>),
    /// Nullable reference to a value of the inner shape.
    Pointer(Box<Shape>),
}

/// A named field inside a [`Shape::Struct`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldShape {
    pub name: String,
    pub shape: Shape,
}

impl Shape {
    /// Builds a struct shape from `(name, shape)` pairs, preserving order.
    pub fn struct_of<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = (S, Shape)>,
        S: Into<String>,
    {
        Shape::Struct(
            fields
                .into_iter()
                .map(|(name, shape)| FieldShape {
                    name: name.into(),
                    shape,
                })
                .collect(),
        )
    }

    /// Builds a pointer shape to `inner`.
    #[must_use]
    pub fn pointer(inner: Shape) -> Self {
        Shape::Pointer(Box::new(inner))
    }

    #[must_use]
    pub fn kind(&self) -> Kind {
        match self {
            Shape::Bool => Kind::Bool,
            Shape::Int => Kind::Int,
            Shape::Float => Kind::Float,
            Shape::String => Kind::String,
            Shape::Struct(_) => Kind::Struct,
            Shape::Pointer(_) => Kind::Pointer,
        }
    }

    /// Returns the zero value for this shape. Pointers are nil.
    #[must_use]
    pub fn zero(&self) -> Value {
        match self {
            Shape::Bool => Value::Bool(false),
            Shape::Int => Value::Int(0),
            Shape::Float => Value::Float(0.0),
            Shape::String => Value::String(String::new()),
            Shape::Struct(fields) => Value::Struct(
                fields
                    .iter()
                    .map(|f| Field {
                        name: f.name.clone(),
                        value: f.shape.zero(),
                    })
                    .collect(),
            ),
            Shape::Pointer(inner) => Value::Pointer {
                pointee: inner.as_ref().clone(),
                target: None,
            },
        }
    }
}

/// A dynamically shaped value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Struct(Vec<Field>),
    /// `target` is `None` for a nil pointer; `pointee` describes what an
    /// allocation would produce.
    Pointer {
        pointee: Shape,
        target: Option<Box<Value>>,
    },
}

/// A named field inside a [`Value::Struct`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub value: Value,
}

impl Value {
    #[must_use]
    pub fn kind(&self) -> Kind {
        match self {
            Value::Bool(_) => Kind::Bool,
            Value::Int(_) => Kind::Int,
            Value::Float(_) => Kind::Float,
            Value::String(_) => Kind::String,
            Value::Struct(_) => Kind::Struct,
            Value::Pointer { .. } => Kind::Pointer,
        }
    }

    /// Returns `true` for a pointer with no target.
    #[must_use]
    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Pointer { target: None, .. })
    }

    /// Read-only lookup along an index path, following non-nil pointers.
    ///
    /// Returns `None` on a nil pointer, an out-of-range index, or a non-struct step.
    #[must_use]
    pub fn get_path(&self, path: &[usize]) -> Option<&Value> {
        let mut current = self;
        for &index in path {
            if let Value::Pointer { target, .. } = current {
                current = target.as_deref()?;
            }
            match current {
                Value::Struct(fields) => current = &fields.get(index)?.value,
                _ => return None,
            }
        }
        Some(current)
    }
}

/// Errors returned by [`field_walk`] and [`Walked::set`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WalkError {
    #[error("step {step}: field index {index} out of range for struct with {len} fields")]
    IndexOutOfRange { step: usize, index: usize, len: usize },
    #[error("step {step}: cannot index into {kind:?}")]
    NotAStruct { step: usize, kind: Kind },
    #[error("value is not settable")]
    NotSettable,
    #[error("cannot assign {found:?} to field of kind {expected:?}")]
    KindMismatch { expected: Kind, found: Kind },
}

/// Result of a walk: either a live slot inside the root or a detached copy.
#[derive(Debug)]
pub enum Walked<'a> {
    /// The field inside the walked value; writes are visible through the root.
    Settable(&'a mut Value),
    /// A zero value of the field's shape, produced because a nil pointer on
    /// the path was not allocated. Writes are impossible.
    Detached(Value),
}

impl Walked<'_> {
    #[must_use]
    pub fn is_settable(&self) -> bool {
        matches!(self, Walked::Settable(_))
    }

    #[must_use]
    pub fn kind(&self) -> Kind {
        self.value().kind()
    }

    #[must_use]
    pub fn value(&self) -> &Value {
        match self {
            Walked::Settable(v) => &**v,
            Walked::Detached(v) => v,
        }
    }

    /// Writes `value` into the walked field.
    ///
    /// # Errors
    ///
    /// `NotSettable` for a detached result, `KindMismatch` if `value` has a
    /// different kind than the field.
    pub fn set(&mut self, value: Value) -> Result<(), WalkError> {
        match self {
            Walked::Detached(_) => Err(WalkError::NotSettable),
            Walked::Settable(slot) => {
                if slot.kind() != value.kind() {
                    return Err(WalkError::KindMismatch {
                        expected: slot.kind(),
                        found: value.kind(),
                    });
                }
                **slot = value;
                Ok(())
            }
        }
    }
}

/// Resolves the field at `path` inside `root`.
///
/// Before each step a pointer is dereferenced. A nil pointer is replaced by a
/// freshly allocated zero value of its pointee when `allocate` is set;
/// otherwise the walk stops and returns [`Walked::Detached`] holding the zero
/// value of the final field. The final field itself is never dereferenced.
///
/// # Errors
///
/// `IndexOutOfRange` when an index exceeds the struct's field count,
/// `NotAStruct` when a step lands on a scalar.
pub fn field_walk<'a>(
    root: &'a mut Value,
    path: &[usize],
    allocate: bool,
) -> Result<Walked<'a>, WalkError> {
    let mut current = root;
    for (step, &index) in path.iter().enumerate() {
        current = match current {
            Value::Pointer { pointee, target } => {
                if target.is_none() {
                    if !allocate {
                        return detached_zero(pointee, &path[step..], step).map(Walked::Detached);
                    }
                    tracing::trace!(step, "allocating nil pointer during field walk");
                }
                &mut **target.get_or_insert_with(|| Box::new(pointee.zero()))
            }
            other => other,
        };

        current = match current {
            Value::Struct(fields) => {
                let len = fields.len();
                &mut fields
                    .get_mut(index)
                    .ok_or(WalkError::IndexOutOfRange { step, index, len })?
                    .value
            }
            other => {
                return Err(WalkError::NotAStruct {
                    step,
                    kind: other.kind(),
                })
            }
        };
    }
    Ok(Walked::Settable(current))
}

fn detached_zero(start: &Shape, path: &[usize], first_step: usize) -> Result<Value, WalkError> {
    let mut shape = start;
    for (offset, &index) in path.iter().enumerate() {
        let step = first_step + offset;
        if offset > 0 {
            if let Shape::Pointer(inner) = shape {
                shape = inner;
            }
        }
        shape = match shape {
            Shape::Struct(fields) => {
                &fields
                    .get(index)
                    .ok_or(WalkError::IndexOutOfRange {
                        step,
                        index,
                        len: fields.len(),
                    })?
                    .shape
            }
            other => {
                return Err(WalkError::NotAStruct {
                    step,
                    kind: other.kind(),
                })
            }
        };
    }
    Ok(shape.zero())
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    /// `Field1.Field2.Field3.Value` with every intermediate level a plain struct.
    fn nested_plain() -> Shape {
        Shape::struct_of([(
            "Field1",
            Shape::struct_of([(
                "Field2",
                Shape::struct_of([("Field3", Shape::struct_of([("Value", Shape::String)]))]),
            )]),
        )])
    }

    /// Same layout as `nested_plain` but every intermediate level behind a pointer.
    fn nested_pointers() -> Shape {
        Shape::struct_of([(
            "Field1",
            Shape::pointer(Shape::struct_of([(
                "Field2",
                Shape::pointer(Shape::struct_of([(
                    "Field3",
                    Shape::pointer(Shape::struct_of([("Value", Shape::String)])),
                )])),
            )])),
        )])
    }

    #[test]
    fn deeply_nested_access() {
        let mut root = nested_plain().zero();
        let walked = field_walk(&mut root, &[0, 0, 0, 0], true).unwrap();
        assert!(walked.is_settable());
        assert_eq!(walked.kind(), Kind::String);
    }

    #[test]
    fn deeply_nested_allocate() {
        let mut root = nested_pointers().zero();
        let mut walked = field_walk(&mut root, &[0, 0, 0, 0], true).unwrap();
        assert!(walked.is_settable());
        assert_eq!(walked.kind(), Kind::String);

        walked.set(Value::String("Hello, world!".to_string())).unwrap();
        assert_eq!(
            root.get_path(&[0, 0, 0, 0]),
            Some(&Value::String("Hello, world!".to_string()))
        );
    }

    #[test]
    fn deeply_nested_no_allocate() {
        let mut root = nested_pointers().zero();
        let mut walked = field_walk(&mut root, &[0, 0, 0, 0], false).unwrap();
        assert!(!walked.is_settable());
        assert_eq!(walked.kind(), Kind::String);
        assert_eq!(
            walked.set(Value::String("x".to_string())),
            Err(WalkError::NotSettable)
        );
        // Nothing was allocated.
        assert!(root.get_path(&[0]).is_some_and(Value::is_nil));
    }

    #[test]
    fn final_pointer_field_is_not_dereferenced() {
        let mut root = nested_pointers().zero();
        let walked = field_walk(&mut root, &[0], true).unwrap();
        assert_eq!(walked.kind(), Kind::Pointer);
        assert!(walked.value().is_nil());
    }

    #[test]
    fn existing_pointer_target_is_reused() {
        let mut root = nested_pointers().zero();
        field_walk(&mut root, &[0, 0, 0, 0], true)
            .unwrap()
            .set(Value::String("first".to_string()))
            .unwrap();
        // A second walk, even without allocation, reaches the same slot.
        let walked = field_walk(&mut root, &[0, 0, 0, 0], false).unwrap();
        assert!(walked.is_settable());
        assert_eq!(walked.value(), &Value::String("first".to_string()));
    }

    #[test]
    fn index_out_of_range_reports_step() {
        let mut root = nested_plain().zero();
        let err = field_walk(&mut root, &[0, 3], true).unwrap_err();
        assert_eq!(
            err,
            WalkError::IndexOutOfRange {
                step: 1,
                index: 3,
                len: 1
            }
        );
    }

    #[test]
    fn indexing_into_scalar_fails() {
        let mut root = nested_plain().zero();
        let err = field_walk(&mut root, &[0, 0, 0, 0, 0], true).unwrap_err();
        assert_eq!(
            err,
            WalkError::NotAStruct {
                step: 4,
                kind: Kind::String
            }
        );
    }

    #[test]
    fn detached_walk_still_validates_path() {
        let mut root = nested_pointers().zero();
        let err = field_walk(&mut root, &[0, 0, 5], false).unwrap_err();
        assert!(matches!(err, WalkError::IndexOutOfRange { step: 2, index: 5, .. }));
    }

    #[test]
    fn set_rejects_kind_mismatch() {
        let mut root = nested_plain().zero();
        let mut walked = field_walk(&mut root, &[0, 0, 0, 0], true).unwrap();
        assert_eq!(
            walked.set(Value::Int(7)),
            Err(WalkError::KindMismatch {
                expected: Kind::String,
                found: Kind::Int
            })
        );
    }

    #[test]
    fn empty_path_returns_root() {
        let mut root = Value::Int(3);
        let walked = field_walk(&mut root, &[], false).unwrap();
        assert!(walked.is_settable());
        assert_eq!(walked.value(), &Value::Int(3));
    }

    /// Builds a chain of `depth` pointer-wrapped single-field structs ending in an int.
    fn pointer_chain(depth: usize) -> Shape {
        let mut shape = Shape::struct_of([("leaf", Shape::Int)]);
        for _ in 0..depth {
            shape = Shape::struct_of([("next", Shape::pointer(shape))]);
        }
        shape
    }

    proptest! {
        #[test]
        fn allocating_walk_always_reaches_a_writable_leaf(
            depth in 0usize..12,
            leaf in any::<i64>(),
        ) {
            let mut root = pointer_chain(depth).zero();
            let path = vec![0; depth + 1];

            let mut walked = field_walk(&mut root, &path, true).unwrap();
            prop_assert!(walked.is_settable());
            walked.set(Value::Int(leaf)).unwrap();

            prop_assert_eq!(root.get_path(&path), Some(&Value::Int(leaf)));
        }

        #[test]
        fn non_allocating_walk_never_mutates(depth in 1usize..12) {
            let mut root = pointer_chain(depth).zero();
            let before = root.clone();
            let path = vec![0; depth + 1];

            let walked = field_walk(&mut root, &path, false).unwrap();
            prop_assert!(!walked.is_settable());
            prop_assert_eq!(walked.kind(), Kind::Int);
            prop_assert_eq!(root, before);
        }
    }
}
