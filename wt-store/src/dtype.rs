use std::fmt::{Display, Formatter};

use byteorder::{ByteOrder, LittleEndian};
use half::f16;

/// The raw element type code as it appears in a container file.
///
/// Kept as a plain integer so unknown codes can pass through the loader untouched.
pub type TypeTag = u32;

/// The scalar types shared with the inference SDK, in tag order.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum DType {
    F32,
    F16,
    I8,
    I32,
    Bool,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum DValue {
    F32(f32),
    F16(f16),
    I8(i8),
    I32(i32),
    Bool(bool),
}

impl DType {
    pub const ALL: [DType; 5] = [DType::F32, DType::F16, DType::I8, DType::I32, DType::Bool];

    pub fn from_tag(tag: TypeTag) -> Option<DType> {
        match tag {
            0 => Some(DType::F32),
            1 => Some(DType::F16),
            2 => Some(DType::I8),
            3 => Some(DType::I32),
            4 => Some(DType::Bool),
            _ => None,
        }
    }

    pub fn tag(self) -> TypeTag {
        match self {
            DType::F32 => 0,
            DType::F16 => 1,
            DType::I8 => 2,
            DType::I32 => 3,
            DType::Bool => 4,
        }
    }

    pub fn size_bytes(self) -> usize {
        match self {
            DType::F32 => 4,
            DType::F16 => 2,
            DType::I8 => 1,
            DType::I32 => 4,
            DType::Bool => 1,
        }
    }

    /// Decode `bytes` as a sequence of little-endian values of this type.
    ///
    /// Returns `None` if the length is not a multiple of the element size.
    pub fn iter_bytes(self, bytes: &[u8]) -> Option<impl Iterator<Item = DValue> + '_> {
        let size = self.size_bytes();
        if bytes.len() % size != 0 {
            return None;
        }

        Some(bytes.chunks_exact(size).map(move |x| match self {
            DType::F32 => DValue::F32(f32::read_le(x)),
            DType::F16 => DValue::F16(f16::read_le(x)),
            DType::I8 => DValue::I8(i8::read_le(x)),
            DType::I32 => DValue::I32(i32::read_le(x)),
            DType::Bool => DValue::Bool(x[0] != 0),
        }))
    }
}

impl Display for DType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            DType::F32 => "f32",
            DType::F16 => "f16",
            DType::I8 => "i8",
            DType::I32 => "i32",
            DType::Bool => "bool",
        };
        write!(f, "{}", s)
    }
}

impl Display for DValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match *self {
            DValue::F32(x) => write!(f, "{}", x),
            DValue::F16(x) => write!(f, "{}", x),
            DValue::I8(x) => write!(f, "{}", x),
            DValue::I32(x) => write!(f, "{}", x),
            DValue::Bool(x) => write!(f, "{}", x),
        }
    }
}

/// A scalar that can be viewed out of a raw weight buffer.
///
/// Values are always stored little-endian, independent of the host.
pub trait Element: Copy {
    const DTYPE: DType;

    /// Decode from exactly `DTYPE.size_bytes()` bytes.
    fn read_le(bytes: &[u8]) -> Self;

    /// Encode into exactly `DTYPE.size_bytes()` bytes.
    fn write_le(self, bytes: &mut [u8]);
}

macro_rules! impl_element {
    ($ty:ty, $dtype:expr, |$b:ident| $read:expr, |$x:ident, $o:ident| $write:expr) => {
        impl Element for $ty {
            const DTYPE: DType = $dtype;

            fn read_le($b: &[u8]) -> Self {
                $read
            }

            fn write_le(self, $o: &mut [u8]) {
                let $x = self;
                $write
            }
        }
    };
}

impl_element!(f32, DType::F32, |b| LittleEndian::read_f32(b), |x, o| LittleEndian::write_f32(o, x));
impl_element!(
    f16,
    DType::F16,
    |b| f16::from_bits(LittleEndian::read_u16(b)),
    |x, o| LittleEndian::write_u16(o, x.to_bits())
);
impl_element!(i8, DType::I8, |b| b[0] as i8, |x, o| o[0] = x as u8);
impl_element!(i32, DType::I32, |b| LittleEndian::read_i32(b), |x, o| LittleEndian::write_i32(o, x));
impl_element!(u8, DType::Bool, |b| b[0], |x, o| o[0] = x);

/// Encode a slice of values into a fresh little-endian byte buffer.
pub fn encode_values<T: Element>(values: &[T]) -> Vec<u8> {
    let size = T::DTYPE.size_bytes();
    let mut bytes = vec![0; values.len() * size];
    for (&x, chunk) in values.iter().zip(bytes.chunks_exact_mut(size)) {
        x.write_le(chunk);
    }
    bytes
}

/// Decode a little-endian byte buffer into values.
///
/// Panics if the length is not a multiple of the element size.
pub fn decode_values<T: Element>(bytes: &[u8]) -> Vec<T> {
    let size = T::DTYPE.size_bytes();
    assert_eq!(
        bytes.len() % size,
        0,
        "Byte length {} is not a multiple of the {} element size {}",
        bytes.len(),
        T::DTYPE,
        size
    );
    bytes.chunks_exact(size).map(T::read_le).collect()
}
