use std::fmt::{Debug, Formatter};

use itertools::Itertools;

use crate::dtype::{decode_values, encode_values, DType, DValue, Element, TypeTag};
use crate::result::{WeightError, WeightResult};

/// A single named tensor, stored as raw little-endian bytes together with its type tag and shape.
///
/// The data length always equals `element_count * element_size`.
#[derive(Clone, Eq, PartialEq)]
pub struct WeightRecord {
    name: String,
    tag: TypeTag,
    element_size: usize,
    shape: Vec<usize>,
    data: Vec<u8>,
}

impl WeightRecord {
    /// Build a record from raw parts.
    ///
    /// Panics if the data length does not match the shape and element size.
    pub fn from_raw(name: impl Into<String>, tag: TypeTag, element_size: usize, shape: Vec<usize>, data: Vec<u8>) -> Self {
        let name = name.into();
        assert!(element_size > 0, "Element size of '{}' must be nonzero", name);

        let count: usize = shape.iter().product();
        assert_eq!(
            count * element_size,
            data.len(),
            "Record '{}' with shape {:?} and element size {} needs {} bytes, got {}",
            name,
            shape,
            element_size,
            count * element_size,
            data.len()
        );

        WeightRecord {
            name,
            tag,
            element_size,
            shape,
            data,
        }
    }

    pub fn from_values<T: Element>(name: impl Into<String>, shape: Vec<usize>, values: &[T]) -> Self {
        let dtype = T::DTYPE;
        WeightRecord::from_raw(name, dtype.tag(), dtype.size_bytes(), shape, encode_values(values))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tag(&self) -> TypeTag {
        self.tag
    }

    /// The known type for this record, `None` if the tag is outside of [DType].
    pub fn dtype(&self) -> Option<DType> {
        DType::from_tag(self.tag)
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn element_count(&self) -> usize {
        self.shape.iter().product()
    }

    pub fn element_size(&self) -> usize {
        self.element_size
    }

    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    pub(crate) fn bytes_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub(crate) fn set_shape(&mut self, shape: Vec<usize>) {
        assert_eq!(shape.iter().product::<usize>(), self.element_count());
        self.shape = shape;
    }

    /// The same data under a different name.
    pub fn renamed(self, name: impl Into<String>) -> Self {
        WeightRecord { name: name.into(), ..self }
    }

    /// The same data with a different shape of equal element count.
    pub fn reshaped(self, shape: Vec<usize>) -> Self {
        let count: usize = shape.iter().product();
        assert_eq!(
            count,
            self.element_count(),
            "Cannot reshape '{}' from {:?} to {:?}",
            self.name,
            self.shape,
            shape
        );
        WeightRecord { shape, ..self }
    }

    /// Decode the values as `T`, checking the type tag first.
    pub fn to_vec<T: Element>(&self) -> WeightResult<Vec<T>> {
        self.check_type::<T>()?;
        Ok(decode_values(&self.data))
    }

    /// Decode the range `start..start+len` of elements as `T`.
    pub fn slice_to_vec<T: Element>(&self, start: usize, len: usize) -> WeightResult<Vec<T>> {
        self.check_type::<T>()?;
        assert!(
            start.checked_add(len).map_or(false, |end| end <= self.element_count()),
            "Slice of {} elements at {} out of bounds for '{}' with {} elements",
            len,
            start,
            self.name,
            self.element_count()
        );
        let size = self.element_size;
        Ok(decode_values(&self.data[start * size..(start + len) * size]))
    }

    /// Borrow the whole record as a [WeightView].
    pub fn view(&self) -> WeightView<'_> {
        WeightView {
            tag: self.tag,
            count: self.element_count(),
            bytes: &self.data,
        }
    }

    /// Borrow elements `start..start+len` as a [WeightView].
    pub fn view_range(&self, start: usize, len: usize) -> WeightView<'_> {
        assert!(
            start.checked_add(len).map_or(false, |end| end <= self.element_count()),
            "Range of {} elements at {} out of bounds for '{}' with {} elements",
            len,
            start,
            self.name,
            self.element_count()
        );
        let size = self.element_size;
        WeightView {
            tag: self.tag,
            count: len,
            bytes: &self.data[start * size..(start + len) * size],
        }
    }

    pub fn values(&self) -> Option<impl Iterator<Item = DValue> + '_> {
        self.dtype()?.iter_bytes(&self.data)
    }

    fn check_type<T: Element>(&self) -> WeightResult<()> {
        if self.tag != T::DTYPE.tag() {
            return Err(WeightError::TypeMismatch {
                name: self.name.clone(),
                expected: T::DTYPE,
                actual: self.tag,
            });
        }
        Ok(())
    }
}

/// A borrowed window of elements, as handed to an external network builder:
/// a type tag, an element count and the raw bytes.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct WeightView<'a> {
    pub tag: TypeTag,
    pub count: usize,
    pub bytes: &'a [u8],
}

impl WeightView<'_> {
    /// Decode the values as `T`, or `None` if the tag does not match.
    pub fn to_vec<T: Element>(&self) -> Option<Vec<T>> {
        if self.tag != T::DTYPE.tag() {
            return None;
        }
        Some(decode_values(self.bytes))
    }
}

impl Debug for WeightRecord {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let ty = match self.dtype() {
            Some(dtype) => dtype.to_string(),
            None => format!("tag{}", self.tag),
        };
        write!(
            f,
            "WeightRecord {{ name: {:?}, type: {}, shape: ({}), bytes: {} }}",
            self.name,
            ty,
            self.shape.iter().join(","),
            self.data.len()
        )
    }
}
