//! Source-to-target axis conversion and axis-aligned bounds.
//!
//! Extracted level data is Z-up and left-handed. The engine is Y-up and
//! right-handed. The conversion `(x, y, z) -> (x, -z, -y)` is an axis
//! permutation with sign flips, so it preserves vector length and is its own
//! inverse. Normals go through the same function and are not renormalized.

use cgmath::{InnerSpace, Vector3};

/// Convert a source-space vector (position or normal) to target space.
#[inline]
pub fn to_target(v: [f32; 3]) -> [f32; 3] {
    [v[0], -v[2], -v[1]]
}

#[inline]
pub fn to_target_vec(v: Vector3<f32>) -> Vector3<f32> {
    to_target(v.into()).into()
}

/// Axis-aligned bounding box in target space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
    pub min: Vector3<f32>,
    pub max: Vector3<f32>,
}

impl Default for Bounds {
    fn default() -> Self {
        Self::empty()
    }
}

impl Bounds {
    /// Inverted box that any included point replaces.
    pub fn empty() -> Self {
        Self {
            min: Vector3::new(f32::MAX, f32::MAX, f32::MAX),
            max: Vector3::new(f32::MIN, f32::MIN, f32::MIN),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    pub fn include(&mut self, p: [f32; 3]) {
        self.min.x = self.min.x.min(p[0]);
        self.min.y = self.min.y.min(p[1]);
        self.min.z = self.min.z.min(p[2]);
        self.max.x = self.max.x.max(p[0]);
        self.max.y = self.max.y.max(p[1]);
        self.max.z = self.max.z.max(p[2]);
    }

    pub fn union(&self, other: &Bounds) -> Bounds {
        if other.is_empty() {
            return *self;
        }
        let mut out = *self;
        out.include(other.min.into());
        out.include(other.max.into());
        out
    }

    /// Center of the box, or the origin for an empty box.
    pub fn center(&self) -> Vector3<f32> {
        if self.is_empty() {
            return Vector3::new(0.0, 0.0, 0.0);
        }
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vector3<f32> {
        if self.is_empty() {
            return Vector3::new(0.0, 0.0, 0.0);
        }
        self.max - self.min
    }

    pub fn longest_extent(&self) -> f32 {
        let size = self.size();
        size.x.max(size.y).max(size.z)
    }

    /// A camera position that frames the whole box: raised above the center
    /// and pulled back along +Z by roughly the largest extent.
    pub fn framing_eye(&self) -> Vector3<f32> {
        let span = self.longest_extent().max(1.0);
        let offset = Vector3::new(0.0, 0.35, 1.0).normalize() * span;
        self.center() + offset
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::Rng;

    #[test]
    fn z_up_to_y_up() {
        assert_eq!(to_target([1.0, 2.0, 3.0]), [1.0, -3.0, -2.0]);
        assert_eq!(to_target([0.0, 0.0, 1.0]), [0.0, -1.0, 0.0]);
        assert_eq!(to_target([0.0, 0.0, 0.0]), [0.0, 0.0, 0.0]);
    }

    #[test]
    fn transform_is_self_inverse() {
        let mut rng = rand::thread_rng();
        for _ in 0..256 {
            let v = [
                rng.gen_range(-1000.0f32..1000.0),
                rng.gen_range(-1000.0f32..1000.0),
                rng.gen_range(-1000.0f32..1000.0),
            ];
            assert_eq!(to_target(to_target(v)), v);
        }
    }

    #[test]
    fn transform_preserves_unit_normals() {
        let mut rng = rand::thread_rng();
        for _ in 0..64 {
            let n = Vector3::new(
                rng.gen_range(-1.0f32..1.0),
                rng.gen_range(-1.0f32..1.0),
                rng.gen_range(0.1f32..1.0),
            )
            .normalize();
            assert_relative_eq!(to_target_vec(n).magnitude(), 1.0, epsilon = 1e-5);
        }
    }

    #[test]
    fn bounds_track_min_max() {
        let mut bounds = Bounds::empty();
        assert!(bounds.is_empty());
        bounds.include([1.0, -2.0, 3.0]);
        bounds.include([-1.0, 4.0, 0.0]);
        assert!(!bounds.is_empty());
        assert_eq!(bounds.min, Vector3::new(-1.0, -2.0, 0.0));
        assert_eq!(bounds.max, Vector3::new(1.0, 4.0, 3.0));
        assert_eq!(bounds.center(), Vector3::new(0.0, 1.0, 1.5));
        assert_eq!(bounds.longest_extent(), 6.0);
    }

    #[test]
    fn empty_bounds_center_on_origin() {
        let bounds = Bounds::empty();
        assert_eq!(bounds.center(), Vector3::new(0.0, 0.0, 0.0));
        assert_eq!(bounds.longest_extent(), 0.0);
        assert_eq!(bounds.union(&Bounds::empty()), bounds);
    }

    #[test]
    fn framing_eye_sits_above_and_behind() {
        let mut bounds = Bounds::empty();
        bounds.include([-10.0, 0.0, -10.0]);
        bounds.include([10.0, 5.0, 10.0]);
        let eye = bounds.framing_eye();
        assert!(eye.y > bounds.center().y);
        assert!(eye.z > bounds.center().z);
    }
}
