use std::f64::consts::{PI, TAU};

use super::core::{Point3, Vec3};
use super::tessellation::{GridOptions, ParamGrid, segments_for_length};

/// Maps `value` into `[start, end)` so that the closing parameter of a periodic
/// domain evaluates exactly like the opening one.
fn wrap_param(value: f64, start: f64, end: f64) -> f64 {
    let span = end - start;
    if !span.is_finite() || span == 0.0 {
        return start;
    }
    let mut t = (value - start) % span;
    if t < 0.0 {
        t += span;
    }
    start + t
}

/// Failure reported by an evaluation capability for a single `(u, v)` sample.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvaluationError {
    #[error("expected 3 coordinates, got {count}")]
    WrongArity { count: usize },
    #[error("non-finite coordinate in ({x}, {y}, {z})")]
    NonFinite { x: f64, y: f64, z: f64 },
    #[error("{0}")]
    Failed(String),
}

impl EvaluationError {
    /// `true` for malformed results, as opposed to an evaluator that gave up.
    #[must_use]
    pub const fn is_invalid_result(&self) -> bool {
        matches!(self, Self::WrongArity { .. } | Self::NonFinite { .. })
    }
}

/// Evaluation capability: the surface's `(u, v) -> (x, y, z)` map.
///
/// Implementations must be pure functions of `(u, v)`; the mesher relies on exact
/// repeatability both for its grid cache and for seam detection.
pub trait SurfaceEvaluator {
    fn evaluate(&self, u: f64, v: f64) -> Result<Point3, EvaluationError>;
}

/// Grid capability: chooses the `(u, v)` samples for a target edge length `ds`.
///
/// The first and last value of each returned sequence are the parametric
/// boundaries that seam detection compares.
pub trait GridPolicy {
    fn grid(&self, ds: f64) -> ParamGrid;
}

// ---------------------------------------------------------------------------
// Adapters
// ---------------------------------------------------------------------------

/// Wraps an infallible closure as an evaluator.
#[derive(Clone)]
pub struct FnEvaluator<F>(pub F);

impl<F> SurfaceEvaluator for FnEvaluator<F>
where
    F: Fn(f64, f64) -> Point3,
{
    fn evaluate(&self, u: f64, v: f64) -> Result<Point3, EvaluationError> {
        Ok((self.0)(u, v))
    }
}

/// Wraps a closure returning raw coordinates (for example values handed over from a
/// scripting layer). Anything other than exactly three finite numbers is rejected.
#[derive(Clone)]
pub struct CoordinateFn<F>(pub F);

impl<F, R> SurfaceEvaluator for CoordinateFn<F>
where
    F: Fn(f64, f64) -> R,
    R: AsRef<[f64]>,
{
    fn evaluate(&self, u: f64, v: f64) -> Result<Point3, EvaluationError> {
        let raw = (self.0)(u, v);
        match *raw.as_ref() {
            [x, y, z] if x.is_finite() && y.is_finite() && z.is_finite() => Ok(Point3::new(x, y, z)),
            [x, y, z] => Err(EvaluationError::NonFinite { x, y, z }),
            ref other => Err(EvaluationError::WrongArity { count: other.len() }),
        }
    }
}

/// Grid policy that ignores `ds` and always returns the same samples.
#[derive(Debug, Clone, PartialEq)]
pub struct FixedGrid(pub ParamGrid);

impl GridPolicy for FixedGrid {
    fn grid(&self, _ds: f64) -> ParamGrid {
        self.0.clone()
    }
}

// ---------------------------------------------------------------------------
// Built-in surfaces
// ---------------------------------------------------------------------------

/// Flat parallelogram spanned by `u_axis` and `v_axis` over `[0, 1]²`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaneSurface {
    pub origin: Point3,
    pub u_axis: Vec3,
    pub v_axis: Vec3,
    pub grid_options: GridOptions,
}

impl PlaneSurface {
    #[must_use]
    pub fn new(origin: Point3, u_axis: Vec3, v_axis: Vec3) -> Self {
        Self {
            origin,
            u_axis,
            v_axis,
            grid_options: GridOptions::default(),
        }
    }
}

impl SurfaceEvaluator for PlaneSurface {
    fn evaluate(&self, u: f64, v: f64) -> Result<Point3, EvaluationError> {
        Ok(self
            .origin
            .add_vec(self.u_axis.mul_scalar(u))
            .add_vec(self.v_axis.mul_scalar(v)))
    }
}

impl GridPolicy for PlaneSurface {
    fn grid(&self, ds: f64) -> ParamGrid {
        let o = self.grid_options;
        ParamGrid::uniform(
            (0.0, 1.0),
            segments_for_length(self.u_axis.length(), ds, o.min_u_count, o.max_u_count),
            (0.0, 1.0),
            segments_for_length(self.v_axis.length(), ds, o.min_v_count, o.max_v_count),
        )
    }
}

/// A band swept around a circle of `radius` while its cross-section turns.
///
/// `u ∈ [-1, 1]` runs across the band (total width `width`), `v ∈ [0, 2π]` runs
/// around the loop. Over one loop the cross-section turns by `twists · π`, so
/// `twists = 1.0` gives a Möbius band. The `u` boundaries are the two free edges of
/// the band and never glue to each other.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TwistedRibbon {
    pub radius: f64,
    pub width: f64,
    pub twists: f64,
    pub grid_options: GridOptions,
}

impl TwistedRibbon {
    pub fn new(radius: f64, width: f64, twists: f64) -> Result<Self, String> {
        if !radius.is_finite() || radius <= 0.0 {
            return Err("ribbon radius must be finite and > 0".to_string());
        }
        if !width.is_finite() || width <= 0.0 {
            return Err("ribbon width must be finite and > 0".to_string());
        }
        if !twists.is_finite() {
            return Err("ribbon twist count must be finite".to_string());
        }
        Ok(Self {
            radius,
            width,
            twists,
            grid_options: GridOptions::default(),
        })
    }
}

impl SurfaceEvaluator for TwistedRibbon {
    fn evaluate(&self, u: f64, v: f64) -> Result<Point3, EvaluationError> {
        let radial = Vec3::new(v.cos(), v.sin(), 0.0);
        let phase = 0.5 * self.twists * v;
        let across = radial
            .mul_scalar(phase.cos())
            .add(Vec3::Z.mul_scalar(phase.sin()))
            .mul_scalar(0.5 * self.width * u);
        Ok(Point3::ORIGIN
            .add_vec(radial.mul_scalar(self.radius))
            .add_vec(across))
    }
}

impl GridPolicy for TwistedRibbon {
    fn grid(&self, ds: f64) -> ParamGrid {
        let o = self.grid_options;
        ParamGrid::uniform(
            (-1.0, 1.0),
            segments_for_length(self.width, ds, o.min_u_count, o.max_u_count),
            (0.0, TAU),
            segments_for_length(TAU * (self.radius + 0.5 * self.width), ds, o.min_v_count, o.max_v_count),
        )
    }
}

/// Sphere with `u ∈ [0, 1]` running pole to pole and `v ∈ [0, 1]` around the axis.
///
/// Both poles evaluate to a single exact point and `v = 1` wraps onto `v = 0`, so a
/// full-domain grid pinches its first and last rows and glues its columns.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SphereSurface {
    pub center: Point3,
    pub radius: f64,
    pub grid_options: GridOptions,
}

impl SphereSurface {
    pub fn new(center: Point3, radius: f64) -> Result<Self, String> {
        if !radius.is_finite() || radius <= 0.0 {
            return Err("sphere radius must be finite and > 0".to_string());
        }
        Ok(Self {
            center,
            radius,
            grid_options: GridOptions::default(),
        })
    }
}

impl SurfaceEvaluator for SphereSurface {
    fn evaluate(&self, u: f64, v: f64) -> Result<Point3, EvaluationError> {
        if u <= 0.0 {
            return Ok(self.center.add_vec(Vec3::Z.mul_scalar(self.radius)));
        }
        if u >= 1.0 {
            return Ok(self.center.add_vec(Vec3::Z.mul_scalar(-self.radius)));
        }

        let theta = TAU * wrap_param(v, 0.0, 1.0);
        let phi = PI * u;
        let dir = Vec3::new(phi.sin() * theta.cos(), phi.sin() * theta.sin(), phi.cos());
        Ok(self.center.add_vec(dir.mul_scalar(self.radius)))
    }
}

impl GridPolicy for SphereSurface {
    fn grid(&self, ds: f64) -> ParamGrid {
        let o = self.grid_options;
        ParamGrid::uniform(
            (0.0, 1.0),
            segments_for_length(PI * self.radius, ds, o.min_u_count, o.max_u_count),
            (0.0, 1.0),
            segments_for_length(TAU * self.radius, ds, o.min_v_count, o.max_v_count),
        )
    }
}

/// Torus around the Z axis, periodic in both parameters over `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TorusSurface {
    pub center: Point3,
    pub major_radius: f64,
    pub minor_radius: f64,
    pub grid_options: GridOptions,
}

impl TorusSurface {
    pub fn new(center: Point3, major_radius: f64, minor_radius: f64) -> Result<Self, String> {
        if !major_radius.is_finite() || major_radius <= 0.0 {
            return Err("torus major radius must be finite and > 0".to_string());
        }
        if !minor_radius.is_finite() || minor_radius <= 0.0 {
            return Err("torus minor radius must be finite and > 0".to_string());
        }
        Ok(Self {
            center,
            major_radius,
            minor_radius,
            grid_options: GridOptions::default(),
        })
    }
}

impl SurfaceEvaluator for TorusSurface {
    fn evaluate(&self, u: f64, v: f64) -> Result<Point3, EvaluationError> {
        let theta = TAU * wrap_param(u, 0.0, 1.0);
        let phi = TAU * wrap_param(v, 0.0, 1.0);
        let ring = self.major_radius + self.minor_radius * phi.cos();
        Ok(self.center.add_vec(Vec3::new(
            ring * theta.cos(),
            ring * theta.sin(),
            self.minor_radius * phi.sin(),
        )))
    }
}

impl GridPolicy for TorusSurface {
    fn grid(&self, ds: f64) -> ParamGrid {
        let o = self.grid_options;
        ParamGrid::uniform(
            (0.0, 1.0),
            segments_for_length(
                TAU * (self.major_radius + self.minor_radius),
                ds,
                o.min_u_count,
                o.max_u_count,
            ),
            (0.0, 1.0),
            segments_for_length(TAU * self.minor_radius, ds, o.min_v_count, o.max_v_count),
        )
    }
}
