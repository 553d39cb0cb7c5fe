// Copyright 2017 Matthew Plant. This file is part of TUMBLE.
//
// TUMBLE is free software: you can redistribute it and/or modify
// it under the terms of the GNU Lesser General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// TUMBLE is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Lesser General Public License for more details.
//
// You should have received a copy of the GNU Lesser General Public License
// along with TUMBLE. If not, see <http://www.gnu.org/licenses/>.

use cgmath::{EuclideanSpace, InnerSpace, Point3, Vector3};
use serde::{Deserialize, Serialize};

/// Maximum tolerence for error, i.e. what we consider the x86 floating
/// point epsilon.
pub const COLLISION_EPSILON: f32 = 0.000001;

/// Rays whose direction is this close to perpendicular to a face normal are
/// considered parallel to the face.
pub const PARALLEL_EPSILON: f32 = 0.0001;

/// Default maximum distance considered by ray casts.
pub const DEFAULT_MAX_RANGE: f32 = 10000.0;

/// Planes are a normal vector and a distance.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Plane {
    pub n: Vector3<f32>,
    pub d: f32,
}

impl Plane {
    /// Construct a plane passing through `p` facing `n`. The normal is
    /// normalized.
    pub fn from_point_normal(p: Point3<f32>, n: Vector3<f32>) -> Self {
        let n = n.normalize();
        Plane {
            n,
            d: n.dot(p.to_vec()),
        }
    }

    /// Distance of q above the plane. Negative values are behind it.
    pub fn signed_distance(&self, q: Point3<f32>) -> f32 {
        self.n.dot(q.to_vec()) - self.d
    }

    /// Returns closest point on plane to q
    pub fn closest_point(&self, q: Point3<f32>) -> Point3<f32> {
        q + -self.n * self.signed_distance(q)
    }
}

impl From<(Point3<f32>, Vector3<f32>)> for Plane {
    fn from(pn: (Point3<f32>, Vector3<f32>)) -> Self {
        Plane::from_point_normal(pn.0, pn.1)
    }
}

/// Rays are a point and a direction with infinite distance.
/// The direction is always normalized, so the parameter along the ray is a
/// distance. The fields are only reachable through `Ray::new`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Ray {
    p: Point3<f32>,
    d: Vector3<f32>,
}

impl Ray {
    pub fn new(p: Point3<f32>, d: Vector3<f32>) -> Self {
        Ray { p, d: d.normalize() }
    }

    pub fn origin(&self) -> Point3<f32> {
        self.p
    }

    /// Unit direction.
    pub fn dir(&self) -> Vector3<f32> {
        self.d
    }

    /// Point at distance t along the ray.
    pub fn at(&self, t: f32) -> Point3<f32> {
        self.p + self.d * t
    }
}

/// The result of a successful ray cast. All values are in world space.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RayHit {
    /// The point of intersection.
    pub p: Point3<f32>,
    /// Outward surface normal at the point of intersection.
    pub n: Vector3<f32>,
    /// Distance from the ray origin to the point of intersection.
    pub t: f32,
}

impl RayHit {
    /// Keep whichever of the two hits is closer to the ray origin.
    pub fn closest(best: Option<RayHit>, hit: RayHit) -> Option<RayHit> {
        match best {
            Some(best) if best.t <= hit.t => Some(best),
            _ => Some(hit),
        }
    }
}
