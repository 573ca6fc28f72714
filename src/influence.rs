//! Influence matrix construction.
//!
//! For every pair (control point i, horseshoe element j) the matrix holds
//! the velocity induced at i by unit circulation on j, from the closed-form
//! Biot-Savart law for straight finite filaments plus the two semi-infinite
//! trailing legs. When a surface boundary is active, the contribution of
//! element j's mirrored image (with the boundary-condition sign) is folded
//! into the same entry, so the solver never sees image degrees of freedom.
//!
//! The matrix depends on geometry, freestream direction, and the
//! surface-effect configuration only; it is independent of circulation and
//! is built once per solve.

use log::warn;
use ndarray::{Array1, Array2};
use rayon::prelude::*;

use crate::conditions::Freestream;
use crate::error::GeometryError;
use crate::geometry::SceneGeometry;
use crate::surface_effect::{FreeSurfaceConfig, wave_downwash};
use crate::vector::Vec3;

/// Distance below which a control point is considered coincident with a
/// vortex node.
const COINCIDENCE_THRESHOLD: f64 = 1e-8;

/// Denominators with magnitude below this are treated as an impinging
/// filament: the contribution is cut to zero instead of blowing up.
const IMPINGEMENT_THRESHOLD: f64 = 1e-10;

/// Segments shorter than this contribute nothing (zero-offset joints).
const MIN_SEGMENT_LENGTH_SQ: f64 = 1e-20;

const FOUR_PI: f64 = 4.0 * std::f64::consts::PI;

/// One horseshoe element: bound segment, joint segments, trailing legs.
#[derive(Debug, Clone, Copy)]
struct Element {
    node_0: Vec3,
    node_1: Vec3,
    joint_0: Vec3,
    joint_1: Vec3,
    /// Unit direction of the semi-infinite trailing legs.
    trailing: Vec3,
}

impl Element {
    fn reflected(&self, config: &FreeSurfaceConfig) -> Self {
        Self {
            node_0: config.reflect_point(&self.node_0),
            node_1: config.reflect_point(&self.node_1),
            joint_0: config.reflect_point(&self.joint_0),
            joint_1: config.reflect_point(&self.joint_1),
            trailing: config.reflect_direction(&self.trailing),
        }
    }
}

/// Dense matrix of induced-velocity influence coefficients.
#[derive(Debug, Clone)]
pub struct InfluenceMatrix {
    entries: Array2<Vec3>,
}

impl InfluenceMatrix {
    /// Builds the influence matrix for the given scene.
    ///
    /// Geometry errors (degenerate segments, coincident points) abort the
    /// build; near-singular contributions below the impingement threshold
    /// are cut to zero and reported through a single warning.
    pub fn build(
        geometry: &SceneGeometry,
        freestream: &Freestream,
        config: &FreeSurfaceConfig,
    ) -> Result<Self, GeometryError> {
        geometry.validate()?;

        let trailing = freestream.direction();
        let elements: Vec<Element> = geometry
            .sections()
            .map(|section| Element {
                node_0: section.node_0,
                node_1: section.node_1,
                joint_0: section.joint_0,
                joint_1: section.joint_1,
                trailing,
            })
            .collect();
        let images: Option<Vec<Element>> = config
            .enabled
            .then(|| elements.iter().map(|e| e.reflected(config)).collect());
        let image_sign = config.image_sign();

        let control_points: Vec<Vec3> = geometry.sections().map(|s| s.control_point).collect();
        let n = control_points.len();

        // Rows are independent; build them in parallel.
        let rows: Result<Vec<(Vec<Vec3>, usize)>, GeometryError> = (0..n)
            .into_par_iter()
            .map(|i| {
                let cp = control_points[i];
                let mut row = Vec::with_capacity(n);
                let mut cutoffs = 0;
                for (j, element) in elements.iter().enumerate() {
                    let mut v = horseshoe_velocity(
                        &cp,
                        element,
                        i == j,
                        Some((i, j)),
                        &mut cutoffs,
                    )?;
                    if let Some(images) = &images {
                        // The image element is geometry on the far side of the
                        // plane; impingement cutoffs apply but coincidence is
                        // not a caller geometry error.
                        let vi = horseshoe_velocity(&cp, &images[j], false, None, &mut cutoffs)?;
                        v = v.add(&vi.mul(image_sign));
                    }
                    row.push(v.mul(1.0 / FOUR_PI));
                }
                Ok((row, cutoffs))
            })
            .collect();
        let rows = rows?;

        let cutoffs: usize = rows.iter().map(|(_, c)| c).sum();
        if cutoffs > 0 {
            warn!(
                "{cutoffs} vortex filament contribution(s) impinged on a control point and were cut to zero"
            );
        }

        let flat: Vec<Vec3> = rows.into_iter().flat_map(|(row, _)| row).collect();
        let mut entries = Array2::from_shape_vec((n, n), flat)
            .expect("row construction yields n*n entries");

        if config.wave_corrections && config.submergence > 0.0 {
            let speed = freestream.speed();
            for (i, cp) in control_points.iter().enumerate() {
                let w = wave_downwash(cp.y, config.submergence, speed, freestream.gravity);
                let entry = &mut entries[[i, i]];
                *entry = entry.add(&Vec3::new(0.0, 0.0, w / FOUR_PI));
            }
        }

        Ok(Self { entries })
    }

    /// Number of control points (the matrix is square).
    pub fn len(&self) -> usize {
        self.entries.nrows()
    }

    /// Whether the matrix is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.nrows() == 0
    }

    /// Velocity induced at control point `i` by unit circulation on
    /// element `j`, image contribution included.
    #[inline(always)]
    pub fn entry(&self, i: usize, j: usize) -> Vec3 {
        self.entries[[i, j]]
    }

    /// Total induced velocity at control point `i` for the given
    /// circulation vector.
    pub fn induced_velocity(&self, i: usize, circulation: &Array1<f64>) -> Vec3 {
        let mut v = Vec3::zero();
        for (j, gamma) in circulation.iter().enumerate() {
            v = v.add(&self.entries[[i, j]].mul(*gamma));
        }
        v
    }
}

/// Velocity induced at `cp` by the full horseshoe of `element` carrying unit
/// circulation. `skip_bound` drops the bound-segment self term, which is
/// identically zero for a control point on its own bound segment.
///
/// `real_pair` carries (control point, element) indices for real elements so
/// coincidence can be reported against the scene; `None` marks an image
/// element, whose near-singular terms are cut off instead.
fn horseshoe_velocity(
    cp: &Vec3,
    element: &Element,
    skip_bound: bool,
    real_pair: Option<(usize, usize)>,
    cutoffs: &mut usize,
) -> Result<Vec3, GeometryError> {
    let r_j0 = cp.sub(&element.joint_0);
    let r_n0 = cp.sub(&element.node_0);
    let r_n1 = cp.sub(&element.node_1);
    let r_j1 = cp.sub(&element.joint_1);

    if let Some((control_point, elem)) = real_pair {
        let coincident = r_n0.magnitude() < COINCIDENCE_THRESHOLD
            || r_n1.magnitude() < COINCIDENCE_THRESHOLD
            || r_j0.magnitude() < COINCIDENCE_THRESHOLD
            || r_j1.magnitude() < COINCIDENCE_THRESHOLD;
        if coincident {
            return Err(GeometryError::CoincidentPoint {
                control_point,
                element: elem,
            });
        }
    }

    let mut v = Vec3::zero();

    // Inbound semi-infinite leg, from far downstream to joint_0.
    v = v.add(&semi_infinite_leg(&element.trailing, &r_j0, -1.0, cutoffs));

    // Joint segments connect the trailing legs to the bound vortex.
    v = v.add(&finite_segment(&element.joint_0, &element.node_0, &r_j0, &r_n0, cutoffs));

    if !skip_bound {
        v = v.add(&finite_segment(&element.node_0, &element.node_1, &r_n0, &r_n1, cutoffs));
    }

    v = v.add(&finite_segment(&element.node_1, &element.joint_1, &r_n1, &r_j1, cutoffs));

    // Outbound semi-infinite leg, from joint_1 to far downstream.
    v = v.add(&semi_infinite_leg(&element.trailing, &r_j1, 1.0, cutoffs));

    Ok(v)
}

/// Closed-form induced velocity of a straight finite filament from `a` to
/// `b`, with `r_a = cp - a`, `r_b = cp - b` precomputed.
#[inline(always)]
fn finite_segment(a: &Vec3, b: &Vec3, r_a: &Vec3, r_b: &Vec3, cutoffs: &mut usize) -> Vec3 {
    if b.sub(a).magnitude_sq() < MIN_SEGMENT_LENGTH_SQ {
        return Vec3::zero();
    }
    let mag_a = r_a.magnitude();
    let mag_b = r_b.magnitude();
    let mag_ab = mag_a * mag_b;
    let denom = mag_ab * (mag_ab + r_a.dot(r_b));
    if denom.abs() < IMPINGEMENT_THRESHOLD {
        *cutoffs += 1;
        return Vec3::zero();
    }
    r_a.cross(r_b).mul((mag_a + mag_b) / denom)
}

/// Induced velocity of a semi-infinite filament through the point at
/// `cp - r` along unit direction `u`; `sign` selects the leg orientation.
#[inline(always)]
fn semi_infinite_leg(u: &Vec3, r: &Vec3, sign: f64, cutoffs: &mut usize) -> Vec3 {
    let mag = r.magnitude();
    let denom = mag * (mag - u.dot(r));
    if denom.abs() < IMPINGEMENT_THRESHOLD {
        *cutoffs += 1;
        return Vec3::zero();
    }
    u.cross(r).mul(sign / denom)
}
