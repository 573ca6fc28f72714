//! Discretized lifting-surface geometry.
//!
//! The solver consumes finalized geometry: every lifting surface is an
//! ordered sequence of spanwise horseshoe elements, each carrying its control
//! point, bound-vortex endpoints, trailing-leg joints, local chord and strip
//! area, and the local section unit vectors. Geometry is immutable once a
//! scene is assembled.
//!
//! [`WingBuilder`] produces simple straight, tapered, and elliptic planforms
//! with cosine clustering for tests, benches, and sweeps; real applications
//! supply their own discretization.

use serde::{Deserialize, Serialize};

use crate::error::GeometryError;
use crate::vector::Vec3;

/// Minimum admissible bound-segment length (m).
const MIN_SEGMENT_LENGTH: f64 = 1e-10;

/// One spanwise horseshoe element of a lifting surface.
///
/// The bound vortex runs from `node_0` to `node_1` along the lifting line.
/// The trailing legs leave the element at `joint_0`/`joint_1`, aft of the
/// nodes, and continue to infinity along the freestream. The control point
/// sits on the lifting line between the nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    /// Airfoil section identifier, resolved by the airfoil database.
    pub airfoil: String,
    /// Control point position.
    pub control_point: Vec3,
    /// Inboard bound-vortex endpoint.
    pub node_0: Vec3,
    /// Outboard bound-vortex endpoint.
    pub node_1: Vec3,
    /// Trailing-leg joint aft of `node_0`.
    pub joint_0: Vec3,
    /// Trailing-leg joint aft of `node_1`.
    pub joint_1: Vec3,
    /// Local chord length (m).
    pub chord: f64,
    /// Strip planform area dS (m²).
    pub area: f64,
    /// Chordwise unit vector, leading edge toward trailing edge.
    pub u_axial: Vec3,
    /// Section normal unit vector.
    pub u_normal: Vec3,
    /// Spanwise unit vector.
    pub u_span: Vec3,
}

impl Section {
    /// Bound-vortex spatial vector dl.
    pub fn bound_vector(&self) -> Vec3 {
        self.node_1.sub(&self.node_0)
    }
}

/// A named lifting surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Surface {
    /// Surface name, used in results and error reports.
    pub name: String,
    /// Spanwise sections, ordered root-to-tip or left-to-right.
    pub sections: Vec<Section>,
}

/// All lifting surfaces of a scene plus reference quantities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneGeometry {
    /// Lifting surfaces in the scene.
    pub surfaces: Vec<Surface>,
    /// Reference area for force coefficients (m²).
    pub reference_area: f64,
}

impl SceneGeometry {
    /// Assembles a scene; the reference area defaults to the total planform
    /// area of all strips.
    pub fn new(surfaces: Vec<Surface>) -> Self {
        let reference_area = surfaces
            .iter()
            .flat_map(|s| s.sections.iter())
            .map(|sec| sec.area)
            .sum();
        Self {
            surfaces,
            reference_area,
        }
    }

    /// Overrides the reference area.
    pub fn with_reference_area(mut self, area: f64) -> Self {
        self.reference_area = area;
        self
    }

    /// Total number of control points across all surfaces.
    pub fn section_count(&self) -> usize {
        self.surfaces.iter().map(|s| s.sections.len()).sum()
    }

    /// Iterates all sections in global index order.
    pub fn sections(&self) -> impl Iterator<Item = &Section> {
        self.surfaces.iter().flat_map(|s| s.sections.iter())
    }

    /// Maps a global section index back to (surface name, local index).
    pub fn locate(&self, index: usize) -> (&str, usize) {
        let mut offset = index;
        for surface in &self.surfaces {
            if offset < surface.sections.len() {
                return (&surface.name, offset);
            }
            offset -= surface.sections.len();
        }
        panic!("section index {index} out of range");
    }

    /// Checks for degenerate geometry before any expensive computation.
    pub fn validate(&self) -> Result<(), GeometryError> {
        if self.surfaces.is_empty() {
            return Err(GeometryError::EmptyScene);
        }
        for surface in &self.surfaces {
            if surface.sections.is_empty() {
                return Err(GeometryError::EmptySurface {
                    surface: surface.name.clone(),
                });
            }
            for (i, section) in surface.sections.iter().enumerate() {
                if section.bound_vector().magnitude() < MIN_SEGMENT_LENGTH {
                    return Err(GeometryError::DegenerateSegment {
                        surface: surface.name.clone(),
                        section: i,
                    });
                }
                let chord_ok = section.chord.is_finite() && section.chord > 0.0;
                let area_ok = section.area.is_finite() && section.area > 0.0;
                if !chord_ok || !area_ok {
                    return Err(GeometryError::BadSection {
                        surface: surface.name.clone(),
                        section: i,
                        chord: section.chord,
                        area: section.area,
                    });
                }
            }
        }
        Ok(())
    }
}

/// Spanwise chord distribution for [`WingBuilder`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Taper {
    /// Linear taper from root chord to `tip_ratio * root_chord`.
    Linear {
        /// Tip-to-root chord ratio, 1.0 for a rectangular wing.
        tip_ratio: f64,
    },
    /// Elliptic chord distribution, zero chord at the tips.
    Elliptic,
}

/// Builder for simple single-panel wings with cosine clustering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WingBuilder {
    /// Surface name.
    pub name: String,
    /// Airfoil section identifier applied to every section.
    pub airfoil: String,
    /// Full span (m).
    pub span: f64,
    /// Root chord (m).
    pub root_chord: f64,
    /// Chord distribution.
    pub taper: Taper,
    /// Number of spanwise sections over the full span.
    pub sections: usize,
    /// Mounting incidence at the root (rad, positive nose up).
    pub incidence: f64,
    /// Linear washout from root to tip (rad, positive reduces tip incidence).
    pub washout: f64,
    /// Position of the quarter-chord root point in the scene frame.
    pub position: Vec3,
    /// Trailing-leg joint offset aft of the nodes, as a fraction of the
    /// local chord.
    pub joint_offset: f64,
}

impl WingBuilder {
    /// Rectangular wing defaults; adjust fields as needed.
    pub fn new(name: impl Into<String>, span: f64, root_chord: f64) -> Self {
        Self {
            name: name.into(),
            airfoil: "default".to_string(),
            span,
            root_chord,
            taper: Taper::Linear { tip_ratio: 1.0 },
            sections: 40,
            incidence: 0.0,
            washout: 0.0,
            position: Vec3::zero(),
            joint_offset: 0.25,
        }
    }

    fn chord_at(&self, y: f64) -> f64 {
        let frac = (2.0 * y.abs() / self.span).min(1.0);
        match self.taper {
            Taper::Linear { tip_ratio } => self.root_chord * (1.0 - (1.0 - tip_ratio) * frac),
            Taper::Elliptic => self.root_chord * (1.0 - frac * frac).max(0.0).sqrt(),
        }
    }

    fn twist_at(&self, y: f64) -> f64 {
        self.incidence - self.washout * (2.0 * y.abs() / self.span)
    }

    /// Discretizes the planform into a [`Surface`].
    ///
    /// Nodes follow cosine clustering over the full span, concentrating
    /// resolution at the tips where the circulation gradient is steepest.
    /// Control points sit at the angular midpoints of their strips.
    pub fn build(&self) -> Surface {
        let n = self.sections.max(1);
        let half_span = 0.5 * self.span;

        // Node positions on the quarter-chord line.
        let node_theta: Vec<f64> = (0..=n)
            .map(|k| k as f64 * std::f64::consts::PI / n as f64)
            .collect();
        let node_y: Vec<f64> = node_theta.iter().map(|t| -half_span * t.cos()).collect();

        let mut sections = Vec::with_capacity(n);
        for k in 0..n {
            let theta_cp = 0.5 * (node_theta[k] + node_theta[k + 1]);
            let y_cp = -half_span * theta_cp.cos();

            let chord = self.chord_at(y_cp);
            let twist = self.twist_at(y_cp);
            let (sin_t, cos_t) = twist.sin_cos();
            let u_axial = Vec3::new(cos_t, 0.0, -sin_t);
            let u_normal = Vec3::new(sin_t, 0.0, cos_t);
            let u_span = Vec3::new(0.0, 1.0, 0.0);

            let node_0 = self.position.add(&Vec3::new(0.0, node_y[k], 0.0));
            let node_1 = self.position.add(&Vec3::new(0.0, node_y[k + 1], 0.0));
            let control_point = self.position.add(&Vec3::new(0.0, y_cp, 0.0));

            // Joints sit aft of the nodes along the local chord direction.
            let joint_0 = node_0.add(&u_axial.mul(self.joint_offset * self.chord_at(node_y[k])));
            let joint_1 =
                node_1.add(&u_axial.mul(self.joint_offset * self.chord_at(node_y[k + 1])));

            let area = chord * (node_y[k + 1] - node_y[k]).abs();

            sections.push(Section {
                airfoil: self.airfoil.clone(),
                control_point,
                node_0,
                node_1,
                joint_0,
                joint_1,
                chord,
                area,
                u_axial,
                u_normal,
                u_span,
            });
        }

        Surface {
            name: self.name.clone(),
            sections,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn rectangular(n: usize) -> Surface {
        WingBuilder {
            sections: n,
            ..WingBuilder::new("wing", 2.0, 0.2)
        }
        .build()
    }

    #[test]
    fn test_builder_section_count() {
        let wing = rectangular(20);
        assert_eq!(wing.sections.len(), 20);
    }

    #[test]
    fn test_nodes_cover_span() {
        let wing = rectangular(16);
        let first = wing.sections.first().unwrap();
        let last = wing.sections.last().unwrap();
        assert_relative_eq!(first.node_0.y, -1.0, epsilon = 1e-12);
        assert_relative_eq!(last.node_1.y, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_cosine_clustering_tightens_tips() {
        let wing = rectangular(20);
        let tip_strip = wing.sections[0].bound_vector().magnitude();
        let mid_strip = wing.sections[10].bound_vector().magnitude();
        assert!(tip_strip < mid_strip);
    }

    #[test]
    fn test_total_area_matches_planform() {
        let wing = rectangular(200);
        let scene = SceneGeometry::new(vec![wing]);
        // 2 m span x 0.2 m chord
        assert_relative_eq!(scene.reference_area, 0.4, epsilon = 1e-3);
    }

    #[test]
    fn test_elliptic_chord_shrinks_outboard() {
        let wing = WingBuilder {
            taper: Taper::Elliptic,
            sections: 20,
            ..WingBuilder::new("wing", 2.0, 0.2)
        }
        .build();
        assert!(wing.sections[0].chord < wing.sections[10].chord);
    }

    #[test]
    fn test_incidence_rotates_section_frame() {
        let wing = WingBuilder {
            incidence: 0.1,
            sections: 4,
            ..WingBuilder::new("wing", 2.0, 0.2)
        }
        .build();
        let sec = &wing.sections[2];
        // Freestream along +x sees alpha = incidence.
        let v = Vec3::new(1.0, 0.0, 0.0);
        let alpha = (v.dot(&sec.u_normal)).atan2(v.dot(&sec.u_axial));
        assert_relative_eq!(alpha, 0.1, epsilon = 1e-12);
    }

    #[test]
    fn test_validate_rejects_bad_chord() {
        let mut wing = rectangular(4);
        wing.sections[1].chord = 0.0;
        let scene = SceneGeometry::new(vec![wing]);
        assert!(matches!(
            scene.validate(),
            Err(GeometryError::BadSection { section: 1, .. })
        ));
    }

    #[test]
    fn test_validate_rejects_degenerate_segment() {
        let mut wing = rectangular(4);
        wing.sections[2].node_1 = wing.sections[2].node_0;
        let scene = SceneGeometry::new(vec![wing]);
        assert!(matches!(
            scene.validate(),
            Err(GeometryError::DegenerateSegment { section: 2, .. })
        ));
    }

    #[test]
    fn test_validate_rejects_empty_scene() {
        let scene = SceneGeometry::new(vec![]);
        assert_eq!(scene.validate(), Err(GeometryError::EmptyScene));
    }

    #[test]
    fn test_locate_maps_global_indices() {
        let a = rectangular(3);
        let mut b = rectangular(2);
        b.name = "tail".to_string();
        let scene = SceneGeometry::new(vec![a, b]);
        assert_eq!(scene.locate(0), ("wing", 0));
        assert_eq!(scene.locate(3), ("tail", 0));
        assert_eq!(scene.locate(4), ("tail", 1));
    }
}
