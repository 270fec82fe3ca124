//! Sample element trait for raw raster values

use num_traits::{NumCast, ToPrimitive};
use std::fmt::Debug;

/// Trait for types a raw raster sample can be stored as.
///
/// Loaders may hand over integer or float frames; everything is widened to
/// `f64` before cleaning, with NaN as the missing sentinel.
pub trait RasterElement:
    Copy + Clone + Debug + PartialOrd + PartialEq + NumCast + Send + Sync + 'static
{
    /// Widen to `f64`. Values that cannot be represented become NaN.
    fn to_sample(self) -> f64 {
        ToPrimitive::to_f64(&self).unwrap_or(f64::NAN)
    }
}

macro_rules! impl_raster_element {
    ($($t:ty),+) => {
        $(impl RasterElement for $t {})+
    };
}

impl_raster_element!(i8, i16, i32, i64, u8, u16, u32, u64, f32, f64);
