//! Named argument values passed to sinks.
//!
//! A value is an Arrow array; a scalar is simply an array of length 1.

use std::sync::Arc;

use arrow::array::{ArrayRef, BooleanArray, Float64Array, Int32Array, Int64Array, StringArray};

/// Conversion of Rust values into the Arrow array a sink argument carries.
pub trait IntoValue {
    fn into_value(self) -> ArrayRef;
}

impl IntoValue for ArrayRef {
    fn into_value(self) -> ArrayRef {
        self
    }
}

macro_rules! impl_into_value {
    ($native:ty, $array:ty) => {
        impl IntoValue for $native {
            fn into_value(self) -> ArrayRef {
                Arc::new(<$array>::from(vec![self]))
            }
        }

        impl IntoValue for Option<$native> {
            fn into_value(self) -> ArrayRef {
                Arc::new(<$array>::from(vec![self]))
            }
        }

        impl IntoValue for Vec<$native> {
            fn into_value(self) -> ArrayRef {
                Arc::new(<$array>::from(self))
            }
        }

        impl IntoValue for Vec<Option<$native>> {
            fn into_value(self) -> ArrayRef {
                Arc::new(<$array>::from(self))
            }
        }
    };
}

impl_into_value!(i32, Int32Array);
impl_into_value!(i64, Int64Array);
impl_into_value!(f64, Float64Array);
impl_into_value!(bool, BooleanArray);
impl_into_value!(String, StringArray);

impl IntoValue for &str {
    fn into_value(self) -> ArrayRef {
        Arc::new(StringArray::from(vec![self]))
    }
}

impl IntoValue for Vec<&str> {
    fn into_value(self) -> ArrayRef {
        Arc::new(StringArray::from(self))
    }
}

/// One argument of a sink call: an optional name and its value.
#[derive(Debug, Clone)]
pub struct Arg {
    pub name: Option<String>,
    pub value: ArrayRef,
}

/// The ordered arguments of one sink call, or the extra columns of a sink.
///
/// An empty `Args` is the "finish" call that retrieves a sink's result.
#[derive(Debug, Clone, Default)]
pub struct Args {
    items: Vec<Arg>,
}

impl Args {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a named argument.
    pub fn named(mut self, name: impl Into<String>, value: impl IntoValue) -> Self {
        self.items.push(Arg {
            name: Some(name.into()),
            value: value.into_value(),
        });
        self
    }

    /// Append an unnamed argument.
    pub fn positional(mut self, value: impl IntoValue) -> Self {
        self.items.push(Arg {
            name: None,
            value: value.into_value(),
        });
        self
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Arg> {
        self.items.iter()
    }
}

impl FromIterator<Arg> for Args {
    fn from_iter<I: IntoIterator<Item = Arg>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for Args {
    type Item = Arg;
    type IntoIter = std::vec::IntoIter<Arg>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a> IntoIterator for &'a Args {
    type Item = &'a Arg;
    type IntoIter = std::slice::Iter<'a, Arg>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// Build an [`Args`] list.
///
/// `name = expr` items become named arguments and bare `expr` items become
/// positional ones:
///
/// ```
/// use itersink_core::args;
///
/// let call = args![a = 1, b = vec![1.5, 2.5]];
/// assert_eq!(call.len(), 2);
///
/// let line = args![1, 2, 3];
/// assert!(line.iter().all(|arg| arg.name.is_none()));
/// ```
#[macro_export]
macro_rules! args {
    (@push $acc:ident;) => {};
    (@push $acc:ident; $name:ident = $value:expr $(, $($rest:tt)*)?) => {
        $acc = $acc.named(stringify!($name), $value);
        $( $crate::args!(@push $acc; $($rest)*); )?
    };
    (@push $acc:ident; $value:expr $(, $($rest:tt)*)?) => {
        $acc = $acc.positional($value);
        $( $crate::args!(@push $acc; $($rest)*); )?
    };
    ($($items:tt)*) => {{
        #[allow(unused_mut)]
        let mut acc = $crate::Args::new();
        $crate::args!(@push acc; $($items)*);
        acc
    }};
}
