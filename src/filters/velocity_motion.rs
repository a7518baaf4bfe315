//! Velocity motion resolving filter.
//!
//! Points, instance translations and instance rotations that carry
//! velocities are extrapolated from the most recent authored sample to any
//! shutter offset:
//!
//! - positions: `p + s*v + 0.5*s^2*a`
//! - rotations: `q` rotated around `w` by `s*|w|` degrees
//!
//! where `s` is the offset from the left-bracketing sample in seconds. Instance
//! scales are frozen at that sample. The prim's `velocityMotionMode` picks
//! between full motion, motion without accelerations, freezing everything
//! (`disable`) and leaving the data alone (`ignore`).
//!
//! Debug logging for every decision is on the `scene_index::velocity_motion`
//! target.

use std::marker::PhantomData;
use std::sync::{Arc, LazyLock};

use crate::core::{
    sampled_at, Array, ContainerDataSource, ContainerHandle, DataSourceHandle, LocatorSet,
    OverlayContainer, SampledDataSource, SampledHandle, Time, TypedSampledDataSource, Value,
    ValueType,
};
use crate::scene::tokens::{
    dependencies, prim_type, primvar_locator, primvar_value_locator, primvars, velocity_motion,
    POINTS_LOCATOR,
};
use crate::scene::{
    time_codes_per_second_dependency, AddedPrimEntry, DirtiedPrimEntry, FilteringSceneIndex,
    ObserverList, Prim, RemovedPrimEntry, SceneGlobalsSchema, SceneIndex, SceneIndexHandle,
    SceneIndexObserver,
};
use crate::util::{axis_angle_degrees, Path, Quat, Quath, Token, Vec3};

const LOG_TARGET: &str = "scene_index::velocity_motion";

/// Nonlinear sample count when the prim authors none.
const DEFAULT_NONLINEAR_SAMPLE_COUNT: i32 = 3;

// ============================================================================
// Mode
// ============================================================================

/// Per-prim velocity motion mode, read from `velocityMotionMode`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum VelocityMotionMode {
    /// Velocities and accelerations both apply
    #[default]
    Enable,
    /// Freeze at the left-bracketing sample
    Disable,
    /// Velocities apply, accelerations are ignored
    NoAcceleration,
    /// Leave authored data untouched
    Ignore,
}

impl VelocityMotionMode {
    /// Parse a mode token.
    pub fn from_token(token: &Token) -> Option<Self> {
        match token.as_str() {
            "enable" => Some(Self::Enable),
            "disable" => Some(Self::Disable),
            "noAcceleration" => Some(Self::NoAcceleration),
            "ignore" => Some(Self::Ignore),
            _ => None,
        }
    }

    pub fn token(self) -> Token {
        match self {
            Self::Enable => velocity_motion::ENABLE,
            Self::Disable => velocity_motion::DISABLE,
            Self::NoAcceleration => velocity_motion::NO_ACCELERATION,
            Self::Ignore => velocity_motion::IGNORE,
        }
    }
}

/// Check if prims of type `ty` may carry velocity motion.
pub fn prim_type_supports_velocity_motion(ty: &Token) -> bool {
    [
        prim_type::POINTS,
        prim_type::BASIS_CURVES,
        prim_type::NURBS_CURVES,
        prim_type::NURBS_PATCH,
        prim_type::TET_MESH,
        prim_type::MESH,
        prim_type::INSTANCER,
    ]
    .contains(ty)
}

fn primvar_affected_by_velocity(name: &Token) -> bool {
    [
        primvars::POINTS,
        primvars::INSTANCE_TRANSLATIONS,
        primvars::INSTANCE_ROTATIONS,
        primvars::INSTANCE_SCALES,
    ]
    .contains(name)
}

/// Left-bracketing sample time of `source` for the current frame. Constant
/// sources bracket at `fallback`.
fn bracket_time(source: &SampledHandle, fallback: Time) -> Time {
    source
        .contributing_sample_times(0.0, 0.0)
        .and_then(|times| times.first().copied())
        .unwrap_or(fallback)
}

fn rotate_all<Q: Copy>(
    rotations: &[Q],
    velocities: &[Vec3],
    scaled_time: f32,
    to_quat: impl Fn(Q) -> Quat,
    from_quat: impl Fn(Quat) -> Q,
) -> Array<Q> {
    rotations
        .iter()
        .zip(velocities)
        .map(|(&q, &w)| {
            let delta = axis_angle_degrees(w, scaled_time * w.length());
            from_quat(delta * to_quat(q))
        })
        .collect()
}

// ============================================================================
// Velocity helper
// ============================================================================

/// What the wrapped primvar data sources need to know about their prim.
struct PrimContext {
    prim_path: Path,
    prim_source: ContainerHandle,
    input: SceneIndexHandle,
}

/// Inputs of valid velocity motion for the current frame.
struct Motion {
    source_value: Value,
    velocities: Array<Vec3>,
    sample_time: Time,
}

struct VelocityHelper {
    name: Token,
    source: SampledHandle,
    prim: Arc<PrimContext>,
}

impl VelocityHelper {
    fn is_rotations(&self) -> bool {
        self.name == primvars::INSTANCE_ROTATIONS
    }

    fn is_scales(&self) -> bool {
        self.name == primvars::INSTANCE_SCALES
    }

    fn mode(&self) -> VelocityMotionMode {
        let Some(ds) = self
            .prim
            .prim_source
            .get(&velocity_motion::VELOCITY_MOTION_MODE)
            .and_then(DataSourceHandle::into_sampled)
        else {
            return VelocityMotionMode::default();
        };
        let Some(token) = ds.value(0.0).get::<Token>() else {
            return VelocityMotionMode::default();
        };
        VelocityMotionMode::from_token(&token).unwrap_or_else(|| {
            tracing::debug!(
                target: LOG_TARGET,
                prim = %self.prim.prim_path,
                primvar = %self.name,
                mode = %token,
                "unrecognized velocity motion mode, assuming enable"
            );
            VelocityMotionMode::Enable
        })
    }

    fn nonlinear_sample_count(&self) -> i32 {
        sampled_at(
            &self.prim.prim_source,
            &primvar_value_locator(&primvars::NONLINEAR_SAMPLE_COUNT),
        )
        .and_then(|ds| ds.value(0.0).get::<i32>())
        .unwrap_or(DEFAULT_NONLINEAR_SAMPLE_COUNT)
    }

    fn time_codes_per_second(&self) -> f64 {
        SceneGlobalsSchema::from_scene_index(self.prim.input.as_ref())
            .time_codes_per_second_or_default()
    }

    /// Accelerations bracketing at `sample_time`; empty when absent,
    /// mistyped or authored at a different time.
    fn accelerations(&self, sample_time: Time) -> Array<Vec3> {
        let Some(ds) = sampled_at(
            &self.prim.prim_source,
            &primvar_value_locator(&primvars::ACCELERATIONS),
        ) else {
            return Array::default();
        };
        let time = bracket_time(&ds, sample_time);
        if time != sample_time {
            return Array::default();
        }
        ds.value(time).get::<Array<Vec3>>().unwrap_or_default()
    }

    /// Check the conditions for velocity motion at the current frame.
    fn valid_motion(&self) -> Option<Motion> {
        let velocities_name = if self.is_rotations() {
            primvars::ANGULAR_VELOCITIES
        } else {
            primvars::VELOCITIES
        };
        let debug = |reason: &str| {
            tracing::debug!(
                target: LOG_TARGET,
                prim = %self.prim.prim_path,
                primvar = %self.name,
                "{}",
                reason
            );
        };

        let Some(velocities_ds) = sampled_at(
            &self.prim.prim_source,
            &primvar_value_locator(&velocities_name),
        ) else {
            debug("no velocities");
            return None;
        };

        // Source and velocities must share the left-bracketing sample.
        let source_time = bracket_time(&self.source, 0.0);
        let velocities_time = bracket_time(&velocities_ds, 0.0);
        if source_time != velocities_time {
            tracing::debug!(
                target: LOG_TARGET,
                prim = %self.prim.prim_path,
                primvar = %self.name,
                source_time,
                velocities_time,
                "time sample ordinality mismatch"
            );
            return None;
        }
        let sample_time = source_time;

        let Some(velocities) = velocities_ds.value(sample_time).get::<Array<Vec3>>() else {
            debug("velocities wrong type");
            return None;
        };
        let source_value = self.source.value(sample_time);
        if source_value.array_size() > velocities.len() {
            debug("fewer velocities than source");
            return None;
        }
        if self.is_rotations() {
            if !matches!(source_value, Value::QuatfArray(_) | Value::QuathArray(_)) {
                debug("source rotations wrong type");
                return None;
            }
        } else if !matches!(source_value, Value::Vec3fArray(_)) {
            debug("source positions/scales wrong type");
            return None;
        }

        debug("valid velocity-based motion");
        Some(Motion {
            source_value,
            velocities,
            sample_time,
        })
    }

    fn contributing_sample_times(&self, start: Time, end: Time) -> Option<Vec<Time>> {
        let mode = self.mode();
        if mode == VelocityMotionMode::Ignore {
            return self.source.contributing_sample_times(start, end);
        }
        let Some(motion) = self.valid_motion() else {
            return self.source.contributing_sample_times(start, end);
        };
        if mode == VelocityMotionMode::Disable || self.is_scales() {
            tracing::debug!(
                target: LOG_TARGET,
                prim = %self.prim.prim_path,
                primvar = %self.name,
                ?mode,
                "frozen"
            );
            return None;
        }

        let mut times = vec![start, end];
        let nonlinear = self.is_rotations()
            || (mode == VelocityMotionMode::Enable
                && self.accelerations(motion.sample_time).len()
                    >= motion.source_value.array_size());
        if nonlinear {
            let n = self.nonlinear_sample_count().max(3) - 1;
            for k in 1..n {
                let t = start + k as f32 / n as f32 * (end - start);
                times.insert(times.len() - 1, t);
            }
        }
        tracing::debug!(
            target: LOG_TARGET,
            prim = %self.prim.prim_path,
            primvar = %self.name,
            ?times,
            "sample times"
        );
        Some(times)
    }

    fn value(&self, shutter_offset: Time) -> Value {
        let mode = self.mode();
        if mode == VelocityMotionMode::Ignore {
            return self.source.value(shutter_offset);
        }
        let Some(motion) = self.valid_motion() else {
            return self.source.value(shutter_offset);
        };
        if mode == VelocityMotionMode::Disable || self.is_scales() {
            return self.source.value(motion.sample_time);
        }

        let scaled_time =
            (shutter_offset - motion.sample_time) / self.time_codes_per_second() as f32;
        let velocities = &motion.velocities;

        match motion.source_value {
            Value::QuatfArray(rotations) => Value::QuatfArray(rotate_all(
                &rotations,
                velocities,
                scaled_time,
                |q| q,
                |q| q,
            )),
            Value::QuathArray(rotations) => Value::QuathArray(rotate_all(
                &rotations,
                velocities,
                scaled_time,
                Quath::to_quat,
                Quath::from_quat,
            )),
            Value::Vec3fArray(positions) => {
                let accelerations = if mode == VelocityMotionMode::NoAcceleration {
                    Array::default()
                } else {
                    self.accelerations(motion.sample_time)
                };
                let result: Array<Vec3> = if accelerations.len() >= positions.len() {
                    let half_sq = 0.5 * scaled_time * scaled_time;
                    positions
                        .iter()
                        .zip(velocities.iter())
                        .zip(accelerations.iter())
                        .map(|((&p, &v), &a)| p + scaled_time * v + half_sq * a)
                        .collect()
                } else {
                    positions
                        .iter()
                        .zip(velocities.iter())
                        .map(|(&p, &v)| p + scaled_time * v)
                        .collect()
                };
                Value::Vec3fArray(result)
            }
            other => {
                crate::coding_error!(
                    "unexpected {} for velocity motion on <{}>.{}",
                    other.type_name(),
                    self.prim.prim_path,
                    self.name
                );
                Value::Empty
            }
        }
    }
}

// ============================================================================
// Data sources
// ============================================================================

/// `primvarValue` with velocity motion applied, typed after the source.
struct VelocityValue<T> {
    helper: VelocityHelper,
    _type: PhantomData<fn() -> T>,
}

impl<T: ValueType> VelocityValue<T> {
    fn new(helper: VelocityHelper) -> Self {
        Self {
            helper,
            _type: PhantomData,
        }
    }
}

impl<T: ValueType> SampledDataSource for VelocityValue<T> {
    fn value(&self, shutter_offset: Time) -> Value {
        self.helper.value(shutter_offset)
    }

    fn contributing_sample_times(&self, start: Time, end: Time) -> Option<Vec<Time>> {
        self.helper.contributing_sample_times(start, end)
    }
}

impl<T: ValueType> TypedSampledDataSource<T> for VelocityValue<T> {}

/// Wrap `source`, keeping the value type it reports at offset 0.
fn velocity_value(helper: VelocityHelper) -> DataSourceHandle {
    match helper.source.value(0.0) {
        Value::Vec3fArray(_) => {
            DataSourceHandle::typed::<Array<Vec3>, _>(VelocityValue::<Array<Vec3>>::new(helper))
        }
        Value::QuatfArray(_) => {
            DataSourceHandle::typed::<Array<Quat>, _>(VelocityValue::<Array<Quat>>::new(helper))
        }
        Value::QuathArray(_) => {
            DataSourceHandle::typed::<Array<Quath>, _>(VelocityValue::<Array<Quath>>::new(helper))
        }
        _ => DataSourceHandle::sampled(VelocityValue::<Value>::new(helper)),
    }
}

/// One affected primvar; only `primvarValue` is replaced.
struct PrimvarContainer {
    name: Token,
    source: ContainerHandle,
    prim: Arc<PrimContext>,
}

impl ContainerDataSource for PrimvarContainer {
    fn names(&self) -> Vec<Token> {
        self.source.names()
    }

    fn get(&self, name: &Token) -> Option<DataSourceHandle> {
        let ds = self.source.get(name)?;
        if *name != primvars::PRIMVAR_VALUE {
            return Some(ds);
        }
        match ds {
            DataSourceHandle::Sampled(source) => Some(velocity_value(VelocityHelper {
                name: self.name.clone(),
                source,
                prim: self.prim.clone(),
            })),
            other => Some(other),
        }
    }
}

struct PrimvarsContainer {
    source: ContainerHandle,
    prim: Arc<PrimContext>,
}

impl ContainerDataSource for PrimvarsContainer {
    fn names(&self) -> Vec<Token> {
        self.source.names()
    }

    fn get(&self, name: &Token) -> Option<DataSourceHandle> {
        let ds = self.source.get(name)?;
        if !primvar_affected_by_velocity(name) {
            return Some(ds);
        }
        match ds {
            DataSourceHandle::Container(source) => {
                Some(DataSourceHandle::container(PrimvarContainer {
                    name: name.clone(),
                    source,
                    prim: self.prim.clone(),
                }))
            }
            other => Some(other),
        }
    }
}

/// Prim container adding the frame rate dependency and wrapping primvars.
struct PrimContainer {
    prim: Arc<PrimContext>,
}

impl ContainerDataSource for PrimContainer {
    fn names(&self) -> Vec<Token> {
        let mut names = self.prim.prim_source.names();
        if !names.contains(&dependencies::DEPENDENCIES) {
            names.push(dependencies::DEPENDENCIES);
        }
        names
    }

    fn get(&self, name: &Token) -> Option<DataSourceHandle> {
        let ds = self.prim.prim_source.get(name);
        match name.as_str() {
            "__dependencies" => {
                let declared = ds.and_then(DataSourceHandle::into_container);
                let merged =
                    OverlayContainer::overlay_or(Some(time_codes_per_second_dependency()), declared);
                merged.map(DataSourceHandle::from)
            }
            "primvars" => match ds? {
                DataSourceHandle::Container(source) => {
                    Some(DataSourceHandle::container(PrimvarsContainer {
                        source,
                        prim: self.prim.clone(),
                    }))
                }
                other => Some(other),
            },
            _ => ds,
        }
    }
}

// ============================================================================
// VelocityMotionResolvingSceneIndex
// ============================================================================

static POSITIONS_LOCATORS: LazyLock<LocatorSet> = LazyLock::new(|| {
    [
        POINTS_LOCATOR.clone(),
        primvar_locator(&primvars::INSTANCE_TRANSLATIONS),
        primvar_locator(&primvars::INSTANCE_SCALES),
    ]
    .into_iter()
    .collect()
});

static ROTATIONS_LOCATORS: LazyLock<LocatorSet> = LazyLock::new(|| {
    [
        primvar_locator(&primvars::INSTANCE_ROTATIONS),
        primvar_locator(&primvars::INSTANCE_SCALES),
    ]
    .into_iter()
    .collect()
});

static POSITIONS_AFFECTING_LOCATORS: LazyLock<LocatorSet> = LazyLock::new(|| {
    [
        primvar_locator(&primvars::VELOCITIES),
        primvar_locator(&primvars::ACCELERATIONS),
        primvar_locator(&primvars::NONLINEAR_SAMPLE_COUNT),
        velocity_motion::VELOCITY_MOTION_MODE.into(),
    ]
    .into_iter()
    .collect()
});

static ROTATIONS_AFFECTING_LOCATORS: LazyLock<LocatorSet> = LazyLock::new(|| {
    [
        primvar_locator(&primvars::ANGULAR_VELOCITIES),
        primvar_locator(&primvars::NONLINEAR_SAMPLE_COUNT),
        velocity_motion::VELOCITY_MOTION_MODE.into(),
    ]
    .into_iter()
    .collect()
});

/// Filter resolving velocity-based motion of points and instances.
pub struct VelocityMotionResolvingSceneIndex {
    input: SceneIndexHandle,
    observers: ObserverList,
}

impl VelocityMotionResolvingSceneIndex {
    /// Create a new filter over `input`.
    pub fn new(input: SceneIndexHandle) -> Self {
        Self {
            input,
            observers: ObserverList::new(),
        }
    }

    /// Create a new filter; no input arguments are recognized.
    pub fn from_input_args(input: SceneIndexHandle, _args: Option<&ContainerHandle>) -> Self {
        Self::new(input)
    }
}

impl SceneIndex for VelocityMotionResolvingSceneIndex {
    fn prim(&self, path: &Path) -> Prim {
        let prim = self.input.prim(path);
        if !prim_type_supports_velocity_motion(&prim.prim_type) {
            return prim;
        }
        let Some(prim_source) = prim.data_source else {
            return Prim::new(prim.prim_type, None);
        };
        let container = PrimContainer {
            prim: Arc::new(PrimContext {
                prim_path: path.clone(),
                prim_source,
                input: self.input.clone(),
            }),
        };
        Prim::new(prim.prim_type, Some(Arc::new(container)))
    }

    fn child_prim_paths(&self, path: &Path) -> Vec<Path> {
        self.input.child_prim_paths(path)
    }

    fn observers(&self) -> &ObserverList {
        &self.observers
    }
}

impl SceneIndexObserver for VelocityMotionResolvingSceneIndex {
    fn prims_added(&self, _sender: &dyn SceneIndex, entries: &[AddedPrimEntry]) {
        self.observers.send_added(self, entries);
    }

    fn prims_removed(&self, _sender: &dyn SceneIndex, entries: &[RemovedPrimEntry]) {
        self.observers.send_removed(self, entries);
    }

    // Scale freezing depends on whether motion is valid, so anything that
    // dirties positions or rotations dirties scales too.
    fn prims_dirtied(&self, _sender: &dyn SceneIndex, entries: &[DirtiedPrimEntry]) {
        let widened: Vec<DirtiedPrimEntry> = entries
            .iter()
            .map(|entry| {
                let mut entry = entry.clone();
                if entry.dirty_locators.intersects(&POSITIONS_AFFECTING_LOCATORS) {
                    entry.dirty_locators.insert_set(&POSITIONS_LOCATORS);
                }
                if entry.dirty_locators.intersects(&ROTATIONS_AFFECTING_LOCATORS) {
                    entry.dirty_locators.insert_set(&ROTATIONS_LOCATORS);
                }
                entry
            })
            .collect();
        self.observers.send_dirtied(self, &widened);
    }
}

impl FilteringSceneIndex for VelocityMotionResolvingSceneIndex {
    fn input_scene_index(&self) -> &SceneIndexHandle {
        &self.input
    }
}
