/// A physical native representation of a Parquet fixed-sized type.
pub trait NativeType: Sized + Copy + std::fmt::Debug + Send + Sync + 'static {
    type Bytes: AsRef<[u8]>;

    fn to_le_bytes(&self) -> Self::Bytes;

    fn to_be_bytes(&self) -> Self::Bytes;

    fn from_le_bytes(bytes: Self::Bytes) -> Self;

    fn from_be_bytes(bytes: Self::Bytes) -> Self;
}

macro_rules! native {
    ($type:ty) => {
        impl NativeType for $type {
            type Bytes = [u8; std::mem::size_of::<Self>()];
            #[inline]
            fn to_le_bytes(&self) -> Self::Bytes {
                Self::to_le_bytes(*self)
            }

            #[inline]
            fn to_be_bytes(&self) -> Self::Bytes {
                Self::to_be_bytes(*self)
            }

            #[inline]
            fn from_le_bytes(bytes: Self::Bytes) -> Self {
                Self::from_le_bytes(bytes)
            }

            #[inline]
            fn from_be_bytes(bytes: Self::Bytes) -> Self {
                Self::from_be_bytes(bytes)
            }
        }
    };
}

native!(i32);
native!(i64);
native!(u32);
native!(u64);
native!(f32);
native!(f64);

/// Decodes Parquet's legacy `INT96` physical type: a little-endian 12-byte
/// block read as `(u64 low, i32 high)` and combined as `(high << 32) | low`
/// (spec section 4.5, `PLAIN` decoding).
///
/// `INT96` pre-dates logical `TIMESTAMP` and is preserved as-is by the
/// logical converter (spec section 4.7) rather than reinterpreted.
#[inline]
pub fn int96_to_i64(bytes: [u8; 12]) -> i64 {
    let low = u64::from_le_bytes(bytes[0..8].try_into().unwrap());
    let high = i32::from_le_bytes(bytes[8..12].try_into().unwrap());
    ((high as i64) << 32) | (low as i64 & 0xFFFF_FFFF)
}
