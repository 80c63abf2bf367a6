//! Typed vertex and index buffers.
//!
//! A [`BufferAttribute`] is a flat typed array interpreted as `count` elements
//! of `size` components each. Element `i` component `c` lives at
//! `i * (stride + size) + offset + c`, so interleaved layouts can share one
//! backing array.

use serde::{Deserialize, Serialize};

/// Accessor component type, using the GL enum values the model document stores.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u32)]
pub enum ComponentType {
    Byte = 5120,
    UnsignedByte = 5121,
    Short = 5122,
    UnsignedShort = 5123,
    Int = 5124,
    UnsignedInt = 5125,
    Float = 5126,
}

impl ComponentType {
    pub fn code(self) -> u32 {
        self as u32
    }

    pub fn from_code(code: u32) -> Option<Self> {
        Some(match code {
            5120 => Self::Byte,
            5121 => Self::UnsignedByte,
            5122 => Self::Short,
            5123 => Self::UnsignedShort,
            5124 => Self::Int,
            5125 => Self::UnsignedInt,
            5126 => Self::Float,
            _ => return None,
        })
    }

    /// Bytes per component.
    pub fn size(self) -> usize {
        match self {
            Self::Byte | Self::UnsignedByte => 1,
            Self::Short | Self::UnsignedShort => 2,
            Self::Int | Self::UnsignedInt | Self::Float => 4,
        }
    }
}

/// Backing storage of an attribute.
#[derive(Clone, Debug, PartialEq)]
pub enum BufferData {
    F32(Vec<f32>),
    U8(Vec<u8>),
    U16(Vec<u16>),
    U32(Vec<u32>),
    I8(Vec<i8>),
    I16(Vec<i16>),
    I32(Vec<i32>),
}

macro_rules! for_each_variant {
    ($data:expr, $v:ident => $body:expr) => {
        match $data {
            BufferData::F32($v) => $body,
            BufferData::U8($v) => $body,
            BufferData::U16($v) => $body,
            BufferData::U32($v) => $body,
            BufferData::I8($v) => $body,
            BufferData::I16($v) => $body,
            BufferData::I32($v) => $body,
        }
    };
}

impl BufferData {
    pub fn len(&self) -> usize {
        for_each_variant!(self, v => v.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn component_type(&self) -> ComponentType {
        match self {
            BufferData::F32(_) => ComponentType::Float,
            BufferData::U8(_) => ComponentType::UnsignedByte,
            BufferData::U16(_) => ComponentType::UnsignedShort,
            BufferData::U32(_) => ComponentType::UnsignedInt,
            BufferData::I8(_) => ComponentType::Byte,
            BufferData::I16(_) => ComponentType::Short,
            BufferData::I32(_) => ComponentType::Int,
        }
    }

    /// Zero-filled storage of the given type.
    pub fn zeroed(component_type: ComponentType, len: usize) -> Self {
        match component_type {
            ComponentType::Float => BufferData::F32(vec![0.0; len]),
            ComponentType::UnsignedByte => BufferData::U8(vec![0; len]),
            ComponentType::UnsignedShort => BufferData::U16(vec![0; len]),
            ComponentType::UnsignedInt => BufferData::U32(vec![0; len]),
            ComponentType::Byte => BufferData::I8(vec![0; len]),
            ComponentType::Short => BufferData::I16(vec![0; len]),
            ComponentType::Int => BufferData::I32(vec![0; len]),
        }
    }

    /// Reads `len` little-endian components. Returns `None` when `bytes` is too short.
    pub fn from_le_bytes(component_type: ComponentType, bytes: &[u8], len: usize) -> Option<Self> {
        let needed = len.checked_mul(component_type.size())?;
        let bytes = bytes.get(..needed)?;
        macro_rules! decode {
            ($t:ty, $n:expr) => {
                bytes
                    .chunks_exact($n)
                    .map(|c| {
                        let mut raw = [0u8; $n];
                        raw.copy_from_slice(c);
                        <$t>::from_le_bytes(raw)
                    })
                    .collect()
            };
        }
        Some(match component_type {
            ComponentType::Float => BufferData::F32(decode!(f32, 4)),
            ComponentType::UnsignedByte => BufferData::U8(bytes.to_vec()),
            ComponentType::UnsignedShort => BufferData::U16(decode!(u16, 2)),
            ComponentType::UnsignedInt => BufferData::U32(decode!(u32, 4)),
            ComponentType::Byte => BufferData::I8(decode!(i8, 1)),
            ComponentType::Short => BufferData::I16(decode!(i16, 2)),
            ComponentType::Int => BufferData::I32(decode!(i32, 4)),
        })
    }

    pub fn to_le_bytes(&self) -> Vec<u8> {
        for_each_variant!(self, v => v.iter().flat_map(|x| x.to_le_bytes()).collect())
    }

    pub fn get_f32(&self, i: usize) -> Option<f32> {
        for_each_variant!(self, v => v.get(i).map(|x| *x as f32))
    }

    /// Stores `value` at `i`, casting to the backing type. Out of range writes are dropped.
    pub fn set_f32(&mut self, i: usize, value: f32) {
        for_each_variant!(self, v => {
            if let Some(slot) = v.get_mut(i) {
                *slot = value as _;
            }
        })
    }

    pub fn iter_f32(&self) -> Box<dyn Iterator<Item = f32> + '_> {
        for_each_variant!(self, v => Box::new(v.iter().map(|x| *x as f32)) as Box<dyn Iterator<Item = f32> + '_>)
    }

    /// Every value widened to `u32`; used for index lists.
    pub fn to_u32_vec(&self) -> Vec<u32> {
        for_each_variant!(self, v => v.iter().map(|x| *x as u32).collect())
    }
}

/// One named vertex attribute or index list.
#[derive(Clone, Debug, PartialEq)]
pub struct BufferAttribute {
    data: BufferData,
    size: usize,
    component_type: ComponentType,
    normalize: bool,
    stride: usize,
    offset: usize,
}

impl BufferAttribute {
    pub fn new(data: BufferData, size: usize) -> Self {
        let component_type = data.component_type();
        Self {
            data,
            size: size.max(1),
            component_type,
            normalize: false,
            stride: 0,
            offset: 0,
        }
    }

    pub fn from_f32(values: Vec<f32>, size: usize) -> Self {
        Self::new(BufferData::F32(values), size)
    }

    pub fn from_u16(values: Vec<u16>, size: usize) -> Self {
        Self::new(BufferData::U16(values), size)
    }

    pub fn with_normalize(mut self, normalize: bool) -> Self {
        self.normalize = normalize;
        self
    }

    pub fn with_layout(mut self, stride: usize, offset: usize) -> Self {
        self.stride = stride;
        self.offset = offset;
        self
    }

    pub fn data(&self) -> &BufferData {
        &self.data
    }

    pub fn set_data(&mut self, data: BufferData) {
        self.component_type = data.component_type();
        self.data = data;
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Component type of the backing data.
    pub fn dtype(&self) -> ComponentType {
        self.component_type
    }

    pub fn normalize(&self) -> bool {
        self.normalize
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Number of elements (`len / size`).
    pub fn count(&self) -> usize {
        self.data.len() / self.size
    }

    /// Number of components in the backing array.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    fn base(&self, index: usize) -> usize {
        index * (self.stride + self.size) + self.offset
    }

    /// Writes up to `size` components of element `index`.
    pub fn set(&mut self, index: usize, values: &[f32]) {
        let base = self.base(index);
        for (i, value) in values.iter().take(self.size).enumerate() {
            self.data.set_f32(base + i, *value);
        }
    }

    /// Reads element `index`; missing components read as zero.
    pub fn get(&self, index: usize) -> Vec<f32> {
        let base = self.base(index);
        (0..self.size)
            .map(|i| self.data.get_f32(base + i).unwrap_or(0.0))
            .collect()
    }

    /// Per-component minimum and maximum over all elements.
    pub fn min_max(&self) -> (Vec<f32>, Vec<f32>) {
        let mut min = vec![f32::INFINITY; self.size];
        let mut max = vec![f32::NEG_INFINITY; self.size];
        for i in 0..self.count() {
            for (c, value) in self.get(i).into_iter().enumerate() {
                min[c] = min[c].min(value);
                max[c] = max[c].max(value);
            }
        }
        (min, max)
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.data.to_le_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interleaved_addressing() {
        // two vec2 elements, one padding component between them, offset 1
        let mut attr = BufferAttribute::from_f32(vec![0.0; 7], 2).with_layout(1, 1);
        attr.set(0, &[1.0, 2.0]);
        attr.set(1, &[3.0, 4.0]);
        assert_eq!(
            attr.data(),
            &BufferData::F32(vec![0.0, 1.0, 2.0, 0.0, 3.0, 4.0, 0.0])
        );
        assert_eq!(attr.get(1), vec![3.0, 4.0]);
    }

    #[test]
    fn byte_decoding_respects_length() {
        let bytes = [1u8, 0, 2, 0, 3];
        assert_eq!(
            BufferData::from_le_bytes(ComponentType::UnsignedShort, &bytes, 2),
            Some(BufferData::U16(vec![1, 2]))
        );
        assert_eq!(
            BufferData::from_le_bytes(ComponentType::UnsignedShort, &bytes, 3),
            None
        );
    }
}
