//! Typed output buffers produced by store reads and field decode.

use crate::store::ElementType;

/// An owned, contiguous buffer of decoded values of a single element type.
///
/// Buffers are created once per distinct output shape and refilled in place
/// across iteration steps, so the backing allocation is reused rather than
/// reallocated for every variant.
#[derive(Debug, Clone, PartialEq)]
pub enum ValueBuffer {
    Ints(Vec<i32>),
    Doubles(Vec<f64>),
    Strings(Vec<String>),
}

impl ValueBuffer {
    /// Creates a buffer of the given element type holding `len` default values.
    pub fn zeroed(element_type: ElementType, len: usize) -> ValueBuffer {
        match element_type {
            ElementType::Integer => ValueBuffer::Ints(vec![0; len]),
            ElementType::Float => ValueBuffer::Doubles(vec![0.0; len]),
            ElementType::String => ValueBuffer::Strings(vec![String::new(); len]),
        }
    }

    /// Returns the element type held by this buffer.
    pub fn element_type(&self) -> ElementType {
        match self {
            ValueBuffer::Ints(_) => ElementType::Integer,
            ValueBuffer::Doubles(_) => ElementType::Float,
            ValueBuffer::Strings(_) => ElementType::String,
        }
    }

    /// Returns the number of values in the buffer.
    #[inline]
    pub fn len(&self) -> usize {
        match self {
            ValueBuffer::Ints(v) => v.len(),
            ValueBuffer::Doubles(v) => v.len(),
            ValueBuffer::Strings(v) => v.len(),
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Clears the buffer, switching it to the integer variant if needed, and
    /// returns the cleared backing vector. Capacity is retained when the
    /// variant is unchanged.
    pub fn reset_ints(&mut self) -> &mut Vec<i32> {
        if !matches!(self, ValueBuffer::Ints(_)) {
            *self = ValueBuffer::Ints(Vec::new());
        }
        match self {
            ValueBuffer::Ints(v) => {
                v.clear();
                v
            }
            _ => unreachable!(),
        }
    }

    /// Clears the buffer, switching it to the float variant if needed, and
    /// returns the cleared backing vector.
    pub fn reset_doubles(&mut self) -> &mut Vec<f64> {
        if !matches!(self, ValueBuffer::Doubles(_)) {
            *self = ValueBuffer::Doubles(Vec::new());
        }
        match self {
            ValueBuffer::Doubles(v) => {
                v.clear();
                v
            }
            _ => unreachable!(),
        }
    }

    /// Clears the buffer, switching it to the string variant if needed, and
    /// returns the cleared backing vector.
    pub fn reset_strings(&mut self) -> &mut Vec<String> {
        if !matches!(self, ValueBuffer::Strings(_)) {
            *self = ValueBuffer::Strings(Vec::new());
        }
        match self {
            ValueBuffer::Strings(v) => {
                v.clear();
                v
            }
            _ => unreachable!(),
        }
    }

    /// Returns the integer values, if this is an integer buffer.
    #[inline]
    pub fn as_ints(&self) -> Option<&[i32]> {
        match self {
            ValueBuffer::Ints(v) => Some(v),
            _ => None,
        }
    }

    /// Returns the float values, if this is a float buffer.
    #[inline]
    pub fn as_doubles(&self) -> Option<&[f64]> {
        match self {
            ValueBuffer::Doubles(v) => Some(v),
            _ => None,
        }
    }

    /// Returns the string values, if this is a string buffer.
    #[inline]
    pub fn as_strings(&self) -> Option<&[String]> {
        match self {
            ValueBuffer::Strings(v) => Some(v),
            _ => None,
        }
    }
}

impl Default for ValueBuffer {
    fn default() -> ValueBuffer {
        ValueBuffer::Ints(Vec::new())
    }
}
