//! Time sample arrays.
//!
//! A [`TimeSampleArray`] holds values authored at a sorted list of shutter
//! offsets. Resampling finds the bracketing pair with a floor-index binary
//! search and blends them with [`Interpolate`]; queries outside the
//! authored range hold the first or last sample.

use half::f16;
use smallvec::SmallVec;

use crate::core::{Array, Time, Value};
use crate::util::{DMat4, DVec2, DVec3, DVec4, Quat, Quath, Vec2, Vec3, Vec4};

// ============================================================================
// Interpolate
// ============================================================================

/// Blend between two samples. The default holds the left sample.
pub trait Interpolate: Clone {
    fn lerp(&self, _other: &Self, _alpha: f32) -> Self {
        self.clone()
    }
}

macro_rules! impl_linear {
    ($($ty:ty => $scalar:ty),*) => {
        $(
            impl Interpolate for $ty {
                #[inline]
                fn lerp(&self, other: &Self, alpha: f32) -> Self {
                    *self + (*other - *self) * (alpha as $scalar)
                }
            }
        )*
    };
}

impl_linear!(
    f32 => f32,
    f64 => f64,
    Vec2 => f32,
    Vec3 => f32,
    Vec4 => f32,
    DVec2 => f64,
    DVec3 => f64,
    DVec4 => f64
);

macro_rules! impl_held {
    ($($ty:ty),*) => {
        $( impl Interpolate for $ty {} )*
    };
}

impl_held!(
    bool,
    i32,
    i64,
    crate::util::Token,
    String,
    crate::util::Path,
    crate::core::Locator,
    crate::util::IVec2,
    crate::util::IVec3,
    crate::util::IVec4,
    std::sync::Arc<crate::core::Dictionary>
);

impl Interpolate for f16 {
    fn lerp(&self, other: &Self, alpha: f32) -> Self {
        let (a, b) = (self.to_f32(), other.to_f32());
        f16::from_f32(a + (b - a) * alpha)
    }
}

impl Interpolate for DMat4 {
    fn lerp(&self, other: &Self, alpha: f32) -> Self {
        *self + (*other - *self) * f64::from(alpha)
    }
}

impl Interpolate for Quat {
    fn lerp(&self, other: &Self, alpha: f32) -> Self {
        self.slerp(*other, alpha)
    }
}

impl Interpolate for Quath {
    fn lerp(&self, other: &Self, alpha: f32) -> Self {
        Quath::from_quat(self.to_quat().slerp(other.to_quat(), alpha))
    }
}

impl<T: Interpolate> Interpolate for Array<T> {
    /// Element-wise when sizes match, otherwise held.
    fn lerp(&self, other: &Self, alpha: f32) -> Self {
        if self.len() != other.len() {
            return self.clone();
        }
        self.iter()
            .zip(other.iter())
            .map(|(a, b)| a.lerp(b, alpha))
            .collect()
    }
}

impl Interpolate for Value {
    fn lerp(&self, other: &Self, alpha: f32) -> Self {
        use Value as V;
        match (self, other) {
            (V::Float(a), V::Float(b)) => V::Float(Interpolate::lerp(a, b, alpha)),
            (V::Double(a), V::Double(b)) => V::Double(Interpolate::lerp(a, b, alpha)),
            (V::Half(a), V::Half(b)) => V::Half(Interpolate::lerp(a, b, alpha)),
            (V::Vec2f(a), V::Vec2f(b)) => V::Vec2f(Interpolate::lerp(a, b, alpha)),
            (V::Vec3f(a), V::Vec3f(b)) => V::Vec3f(Interpolate::lerp(a, b, alpha)),
            (V::Vec4f(a), V::Vec4f(b)) => V::Vec4f(Interpolate::lerp(a, b, alpha)),
            (V::Vec2d(a), V::Vec2d(b)) => V::Vec2d(Interpolate::lerp(a, b, alpha)),
            (V::Vec3d(a), V::Vec3d(b)) => V::Vec3d(Interpolate::lerp(a, b, alpha)),
            (V::Vec4d(a), V::Vec4d(b)) => V::Vec4d(Interpolate::lerp(a, b, alpha)),
            (V::Matrix4d(a), V::Matrix4d(b)) => V::Matrix4d(Interpolate::lerp(a, b, alpha)),
            (V::Quatf(a), V::Quatf(b)) => V::Quatf(Interpolate::lerp(a, b, alpha)),
            (V::Quath(a), V::Quath(b)) => V::Quath(Interpolate::lerp(a, b, alpha)),
            (V::FloatArray(a), V::FloatArray(b)) => V::FloatArray(Interpolate::lerp(a, b, alpha)),
            (V::DoubleArray(a), V::DoubleArray(b)) => V::DoubleArray(Interpolate::lerp(a, b, alpha)),
            (V::Vec2fArray(a), V::Vec2fArray(b)) => V::Vec2fArray(Interpolate::lerp(a, b, alpha)),
            (V::Vec3fArray(a), V::Vec3fArray(b)) => V::Vec3fArray(Interpolate::lerp(a, b, alpha)),
            (V::Vec4fArray(a), V::Vec4fArray(b)) => V::Vec4fArray(Interpolate::lerp(a, b, alpha)),
            (V::Vec3dArray(a), V::Vec3dArray(b)) => V::Vec3dArray(Interpolate::lerp(a, b, alpha)),
            (V::Vec4dArray(a), V::Vec4dArray(b)) => V::Vec4dArray(Interpolate::lerp(a, b, alpha)),
            (V::QuatfArray(a), V::QuatfArray(b)) => V::QuatfArray(Interpolate::lerp(a, b, alpha)),
            (V::QuathArray(a), V::QuathArray(b)) => V::QuathArray(Interpolate::lerp(a, b, alpha)),
            (V::Matrix4dArray(a), V::Matrix4dArray(b)) => V::Matrix4dArray(Interpolate::lerp(a, b, alpha)),
            _ => self.clone(),
        }
    }
}

// ============================================================================
// TimeSampleArray
// ============================================================================

/// Values sampled at sorted shutter offsets.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TimeSampleArray<T> {
    times: SmallVec<[Time; 1]>,
    values: SmallVec<[T; 1]>,
}

impl<T: Default + Interpolate> TimeSampleArray<T> {
    /// Create an empty array.
    pub fn new() -> Self {
        Self {
            times: SmallVec::new(),
            values: SmallVec::new(),
        }
    }

    /// Create from `(time, value)` pairs. Pairs are sorted by time.
    pub fn from_pairs<I: IntoIterator<Item = (Time, T)>>(pairs: I) -> Self {
        let mut pairs: Vec<(Time, T)> = pairs.into_iter().collect();
        pairs.sort_by(|a, b| a.0.total_cmp(&b.0));
        let mut array = Self::new();
        for (time, value) in pairs {
            array.times.push(time);
            array.values.push(value);
        }
        array
    }

    /// Create from parallel vectors; extra entries of the longer one are
    /// dropped. Times are expected to be sorted.
    pub fn from_parts(times: Vec<Time>, values: Vec<T>) -> Self {
        let count = times.len().min(values.len());
        Self {
            times: times.into_iter().take(count).collect(),
            values: values.into_iter().take(count).collect(),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.times.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    #[inline]
    pub fn times(&self) -> &[Time] {
        &self.times
    }

    #[inline]
    pub fn values(&self) -> &[T] {
        &self.values
    }

    /// Largest index whose time is <= `time`, clamped to 0.
    pub fn floor_index(&self, time: Time) -> usize {
        let mut lo = 0;
        let mut hi = self.times.len();
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            if self.times[mid] <= time {
                lo = mid + 1;
            } else {
                hi = mid;
            }
        }
        lo.saturating_sub(1)
    }

    /// Value at `time`.
    ///
    /// Default value when empty. Holds the end samples outside the
    /// authored range, interpolates between bracketing samples inside it.
    pub fn resample(&self, time: Time) -> T {
        let n = self.times.len();
        if n == 0 {
            return T::default();
        }
        if time <= self.times[0] {
            return self.values[0].clone();
        }
        if time >= self.times[n - 1] {
            return self.values[n - 1].clone();
        }
        let i = self.floor_index(time);
        let (t0, t1) = (self.times[i], self.times[i + 1]);
        if time == t0 || t1 <= t0 {
            return self.values[i].clone();
        }
        let alpha = (time - t0) / (t1 - t0);
        self.values[i].lerp(&self.values[i + 1], alpha)
    }

    /// Sample times contributing to `[start, end]`.
    ///
    /// `None` when at most one sample is authored. The result includes the
    /// last sample before `start` and the first sample at or after `end`.
    pub fn contributing_sample_times(&self, start: Time, end: Time) -> Option<Vec<Time>> {
        contributing_times(&self.times, start, end)
    }
}

/// Sample times from a sorted list that bracket `[start, end]`.
pub fn contributing_times(times: &[Time], start: Time, end: Time) -> Option<Vec<Time>> {
    if times.len() <= 1 {
        return None;
    }
    let mut result = Vec::new();
    for &time in times {
        if time < start {
            result.clear();
        }
        result.push(time);
        if time >= end {
            break;
        }
    }
    Some(result)
}

// ============================================================================
// IndexedTimeSampleArray
// ============================================================================

/// Time samples of an indexed primvar: values plus per-sample indices.
#[derive(Clone, Debug, Default)]
pub struct IndexedTimeSampleArray<T> {
    samples: TimeSampleArray<T>,
    indices: SmallVec<[Array<i32>; 1]>,
}

impl<T: Default + Interpolate> IndexedTimeSampleArray<T> {
    /// Create from parallel vectors of times, values and indices.
    pub fn from_parts(times: Vec<Time>, values: Vec<T>, indices: Vec<Array<i32>>) -> Self {
        let count = times.len().min(values.len()).min(indices.len());
        Self {
            samples: TimeSampleArray::from_parts(
                times.into_iter().take(count).collect(),
                values.into_iter().take(count).collect(),
            ),
            indices: indices.into_iter().take(count).collect(),
        }
    }

    #[inline]
    pub fn samples(&self) -> &TimeSampleArray<T> {
        &self.samples
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Values and indices at `time`.
    ///
    /// Values interpolate only when the bracketing samples share the same
    /// indices; the left sample's indices are returned.
    pub fn resample_indexed(&self, time: Time) -> (T, Array<i32>) {
        let times = self.samples.times();
        let values = self.samples.values();
        let n = times.len();
        if n == 0 {
            return (T::default(), Array::default());
        }
        if time <= times[0] {
            return (values[0].clone(), self.indices[0].clone());
        }
        if time >= times[n - 1] {
            return (values[n - 1].clone(), self.indices[n - 1].clone());
        }
        let i = self.samples.floor_index(time);
        let (t0, t1) = (times[i], times[i + 1]);
        if time == t0 || t1 <= t0 || self.indices[i] != self.indices[i + 1] {
            return (values[i].clone(), self.indices[i].clone());
        }
        let alpha = (time - t0) / (t1 - t0);
        (values[i].lerp(&values[i + 1], alpha), self.indices[i].clone())
    }

    pub fn contributing_sample_times(&self, start: Time, end: Time) -> Option<Vec<Time>> {
        self.samples.contributing_sample_times(start, end)
    }
}
