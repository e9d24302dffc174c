//! Frustum culling of patch bounding boxes.
//!
//! The camera is not owned by the engine: callers build a [`FrameView`] each
//! frame from whatever camera they manage and pass it to
//! [`crate::Terrain::update`].

use glam::{Mat4, Vec3, Vec4};

/// Plane indices into the frustum planes array.
const LEFT: usize = 0;
const RIGHT: usize = 1;
const BOTTOM: usize = 2;
const TOP: usize = 3;
const NEAR: usize = 4;
const FAR: usize = 5;

/// An axis-aligned bounding box in world space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    /// Minimum corner of the bounding box.
    pub min: Vec3,
    /// Maximum corner of the bounding box.
    pub max: Vec3,
}

impl Aabb {
    /// Create a new AABB from min and max corners.
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Create an AABB from its center and half-extents.
    pub fn from_center_half_extents(center: Vec3, half: Vec3) -> Self {
        Self {
            min: center - half,
            max: center + half,
        }
    }

    /// Smallest AABB enclosing every point, or `None` for an empty set.
    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Option<Self> {
        let mut points = points.into_iter();
        let first = points.next()?;
        let (min, max) = points.fold((first, first), |(min, max), p| (min.min(p), max.max(p)));
        Some(Self { min, max })
    }

    /// Returns the center point of the AABB.
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Returns the half-extents (half-size along each axis).
    pub fn extents(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }
}

/// A view frustum defined by six inward-pointing planes.
#[derive(Clone, Debug, PartialEq)]
pub struct Frustum {
    /// Six planes: left, right, bottom, top, near, far.
    /// Each `Vec4(a, b, c, d)` where `(a,b,c)` is the normalized inward
    /// normal and `d` is the signed distance term.
    planes: [Vec4; 6],
}

impl Frustum {
    /// Extract frustum planes from a reverse-Z view-projection matrix
    /// using the Gribb-Hartmann method.
    ///
    /// With reverse-Z the near plane maps to depth 1 and the far plane to
    /// depth 0, so the clip-space depth test is `0 <= z <= w`.
    pub fn from_view_projection(vp: &Mat4) -> Self {
        let rows = [vp.row(0), vp.row(1), vp.row(2), vp.row(3)];

        let mut planes = [Vec4::ZERO; 6];
        planes[LEFT] = rows[3] + rows[0];
        planes[RIGHT] = rows[3] - rows[0];
        planes[BOTTOM] = rows[3] + rows[1];
        planes[TOP] = rows[3] - rows[1];
        planes[NEAR] = rows[3] - rows[2];
        planes[FAR] = rows[2];

        Self::from_planes(planes)
    }

    /// Build a frustum from six planes, normalizing each so that `(a,b,c)`
    /// is a unit vector. Planes with a zero normal are kept as-is.
    pub fn from_planes(mut planes: [Vec4; 6]) -> Self {
        for plane in &mut planes {
            let len = plane.truncate().length();
            if len > 0.0 {
                *plane /= len;
            }
        }
        Self { planes }
    }

    /// The six normalized planes.
    pub fn planes(&self) -> &[Vec4; 6] {
        &self.planes
    }

    /// Test whether an AABB is at least partially inside the frustum.
    ///
    /// Uses the p-vertex method: for each plane, take the corner of the AABB
    /// furthest along the plane normal. If that corner is behind the plane,
    /// the entire AABB is outside. Boxes near frustum corners may be kept
    /// although invisible; visible boxes are never rejected.
    pub fn is_visible(&self, aabb: &Aabb) -> bool {
        self.planes.iter().all(|plane| {
            let normal = plane.truncate();
            let p = Vec3::select(normal.cmpge(Vec3::ZERO), aabb.max, aabb.min);
            normal.dot(p) + plane.w >= 0.0
        })
    }
}

/// Per-frame camera input: world position plus view frustum.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameView {
    /// Camera position in world space.
    pub position: Vec3,
    /// Current view frustum.
    pub frustum: Frustum,
}

impl FrameView {
    /// Pair a camera position with an already-built frustum.
    pub fn new(position: Vec3, frustum: Frustum) -> Self {
        Self { position, frustum }
    }

    /// Build a view for a perspective camera at `eye` looking at `target`.
    ///
    /// Uses a right-handed reverse-Z projection; `near` and `far` are the
    /// usual positive clip distances.
    pub fn looking_at(
        eye: Vec3,
        target: Vec3,
        up: Vec3,
        fov_y_radians: f32,
        aspect: f32,
        near: f32,
        far: f32,
    ) -> Self {
        let view = Mat4::look_at_rh(eye, target, up);
        let proj = Mat4::perspective_rh(fov_y_radians, aspect, far, near);
        Self {
            position: eye,
            frustum: Frustum::from_view_projection(&(proj * view)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_camera_vp() -> Mat4 {
        let view = Mat4::look_to_rh(Vec3::ZERO, Vec3::NEG_Z, Vec3::Y);
        let proj = Mat4::perspective_rh(
            std::f32::consts::FRAC_PI_4,
            16.0 / 9.0,
            1000.0, // reverse-Z: far as near param
            0.1,    // reverse-Z: near as far param
        );
        proj * view
    }

    #[test]
    fn test_object_in_front_visible() {
        let frustum = Frustum::from_view_projection(&default_camera_vp());
        let aabb = Aabb::new(Vec3::new(-1.0, -1.0, -5.0), Vec3::new(1.0, 1.0, -3.0));
        assert!(frustum.is_visible(&aabb));
    }

    #[test]
    fn test_object_behind_camera_not_visible() {
        let frustum = Frustum::from_view_projection(&default_camera_vp());
        let aabb = Aabb::new(Vec3::new(-1.0, -1.0, 5.0), Vec3::new(1.0, 1.0, 10.0));
        assert!(!frustum.is_visible(&aabb));
    }

    #[test]
    fn test_object_partially_in_frustum_is_visible() {
        let frustum = Frustum::from_view_projection(&default_camera_vp());
        let aabb = Aabb::new(Vec3::new(-100.0, -1.0, -10.0), Vec3::new(1.0, 1.0, -5.0));
        assert!(frustum.is_visible(&aabb));
    }

    #[test]
    fn test_all_six_planes_tested() {
        let frustum = Frustum::from_view_projection(&default_camera_vp());

        let rejected = [
            Aabb::new(Vec3::splat(10.0), Vec3::splat(20.0)),
            Aabb::new(Vec3::new(-1000.0, 0.0, -5.0), Vec3::new(-999.0, 1.0, -4.0)),
            Aabb::new(Vec3::new(999.0, 0.0, -5.0), Vec3::new(1000.0, 1.0, -4.0)),
            Aabb::new(Vec3::new(0.0, 999.0, -5.0), Vec3::new(1.0, 1000.0, -4.0)),
            Aabb::new(Vec3::new(0.0, -1000.0, -5.0), Vec3::new(1.0, -999.0, -4.0)),
            Aabb::new(Vec3::new(0.0, 0.0, -2000.0), Vec3::new(1.0, 1.0, -1500.0)),
            Aabb::new(Vec3::new(-0.01, -0.01, -0.05), Vec3::new(0.01, 0.01, -0.02)),
        ];
        for aabb in &rejected {
            assert!(!frustum.is_visible(aabb), "{aabb:?} should be culled");
        }
    }

    #[test]
    fn test_frustum_planes_are_normalized() {
        let frustum = Frustum::from_view_projection(&default_camera_vp());
        for plane in frustum.planes() {
            let normal_len = plane.truncate().length();
            assert!(
                (normal_len - 1.0).abs() < 1e-4,
                "plane normal not normalized: {normal_len}"
            );
        }
    }

    #[test]
    fn test_looking_down_sees_ground_below() {
        let view = FrameView::looking_at(
            Vec3::new(0.0, 100.0, 0.0),
            Vec3::ZERO,
            Vec3::Z,
            std::f32::consts::FRAC_PI_2,
            1.0,
            0.1,
            1000.0,
        );
        let ground = Aabb::from_center_half_extents(Vec3::ZERO, Vec3::splat(16.0));
        assert!(view.frustum.is_visible(&ground));

        let above = Aabb::from_center_half_extents(Vec3::new(0.0, 200.0, 0.0), Vec3::splat(16.0));
        assert!(!view.frustum.is_visible(&above));
    }

    #[test]
    fn test_aabb_center_and_extents() {
        let aabb = Aabb::new(Vec3::new(-2.0, -3.0, -4.0), Vec3::new(2.0, 3.0, 4.0));
        assert_eq!(aabb.center(), Vec3::ZERO);
        assert_eq!(aabb.extents(), Vec3::new(2.0, 3.0, 4.0));
    }

    #[test]
    fn test_aabb_from_points() {
        assert_eq!(Aabb::from_points(std::iter::empty()), None);
        let aabb = Aabb::from_points([
            Vec3::new(1.0, 5.0, -2.0),
            Vec3::new(-3.0, 0.0, 4.0),
            Vec3::new(0.0, 2.0, 0.0),
        ])
        .unwrap();
        assert_eq!(aabb.min, Vec3::new(-3.0, 0.0, -2.0));
        assert_eq!(aabb.max, Vec3::new(1.0, 5.0, 4.0));
    }
}
