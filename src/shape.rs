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

use std::f32;
use std::ops::{Add, AddAssign, Sub, SubAssign};

use cgmath::prelude::*;
use cgmath::{Matrix3, Matrix4, Point3, Vector3};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::geom::*;
use crate::mass::ShapeSample;
use crate::physics::RigidBody;

/// The geometry of a shape, minus mass and placement.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ShapeKind {
    Sphere { r: f32 },
    Box { half_extent: Vector3<f32> },
}

/// A convex primitive attached to a rigid body.
///
/// The transform takes shape-local coordinates to body-local coordinates and
/// is assumed to be rigid (rotation and translation only). Once the owning
/// body is initialized the body-local origin is the center of mass.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Shape {
    pub mass: f32,
    pub transform: Matrix4<f32>,
    kind: ShapeKind,
}

impl Shape {
    pub fn sphere(r: f32, mass: f32, transform: Matrix4<f32>) -> Self {
        Shape {
            mass,
            transform,
            kind: ShapeKind::Sphere { r },
        }
    }

    pub fn cuboid(half_extent: Vector3<f32>, mass: f32, transform: Matrix4<f32>) -> Self {
        Shape {
            mass,
            transform,
            kind: ShapeKind::Box { half_extent },
        }
    }

    pub fn kind(&self) -> ShapeKind {
        self.kind
    }

    /// Center of the shape in body-local space.
    pub fn center(&self) -> Point3<f32> {
        self.transform.transform_point(Point3::origin())
    }

    pub fn volume(&self) -> f32 {
        match self.kind {
            ShapeKind::Sphere { r } => r * r * r * 4.0 / 3.0 * f32::consts::PI,
            ShapeKind::Box { half_extent: h } => h.x * h.y * h.z * 8.0,
        }
    }

    /// Splits the volume of the shape into point masses of roughly
    /// `target_volume` each and appends them to `samples` in body-local
    /// space. At least one sample is always produced.
    pub fn generate_samples<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        target_volume: f32,
        samples: &mut Vec<ShapeSample>,
    ) {
        let n = (self.volume() / target_volume).round().max(1.0) as usize;
        let mass = self.mass / n as f32;
        samples.reserve(n);
        for _ in 0..n {
            let pos = match self.kind {
                ShapeKind::Sphere { r } => random_in_unit_sphere(rng) * r,
                ShapeKind::Box { half_extent: h } => Vector3::new(
                    random_symmetric(rng, h.x),
                    random_symmetric(rng, h.y),
                    random_symmetric(rng, h.z),
                ),
            };
            samples.push(ShapeSample {
                mass,
                position: self.transform.transform_point(Point3::from_vec(pos)),
            });
        }
    }

    /// Casts a world space ray against the shape placed at
    /// `rb_transform * self.transform`.
    ///
    /// Spheres report the near intersection, or the far one when the ray
    /// starts inside. Boxes are tested face by face and the closest face hit
    /// is returned; a ray starting inside a box hits the face it exits
    /// through.
    pub fn ray_cast(&self, rb_transform: &Matrix4<f32>, ray: &Ray, max_range: f32) -> Option<RayHit> {
        let m = *rb_transform * self.transform;
        match self.kind {
            ShapeKind::Sphere { r } => {
                let c = m.transform_point(Point3::origin());
                let tc = (c - ray.origin()).dot(ray.dir());
                let dist2 = (ray.at(tc) - c).magnitude2();
                if dist2 >= r * r {
                    return None;
                }
                let delta = (r * r - dist2).sqrt();
                let t = if tc - delta >= 0.0 { tc - delta } else { tc + delta };
                if t < 0.0 || t > max_range {
                    return None;
                }
                let p = ray.at(t);
                Some(RayHit {
                    p,
                    n: (p - c).normalize(),
                    t,
                })
            }
            ShapeKind::Box { half_extent: h } => {
                let rot = linear_part(&m);
                let mut best = None;
                for &s in [-1.0f32, 1.0].iter() {
                    for d in 0..3 {
                        let (d0, d1) = ((d + 1) % 3, (d + 2) % 3);
                        let n = rot * unit_axis(d) * s;
                        let denom = n.dot(ray.dir());
                        if denom.abs() < PARALLEL_EPSILON {
                            continue;
                        }
                        let c = m.transform_point(Point3::from_vec(unit_axis(d) * h[d] * s));
                        let t = (c - ray.origin()).dot(n) / denom;
                        if t < 0.0 || t > max_range {
                            continue;
                        }
                        let p = ray.at(t);
                        let on_face = p - c;
                        if on_face.dot(rot * unit_axis(d0)).abs() < h[d0]
                            && on_face.dot(rot * unit_axis(d1)).abs() < h[d1]
                        {
                            best = RayHit::closest(best, RayHit { p, n, t });
                        }
                    }
                }
                best
            }
        }
    }

    /// Resolves penetration of this shape into a static plane.
    ///
    /// Spheres are tested at their center. Boxes test each of their eight
    /// corners and every penetrating corner is resolved on its own, so a
    /// resting face receives up to four impulses per call.
    pub fn check_plane_collision(&self, body: &mut RigidBody, plane: &Plane) {
        // Corners are placed with the pose at entry, even though resolving a
        // corner moves the body.
        let m = body.transform() * self.transform;
        match self.kind {
            ShapeKind::Sphere { r } => {
                let c = m.transform_point(Point3::origin());
                let dis = plane.signed_distance(c);
                if dis < r {
                    body.compute_collision(c + -plane.n * dis, plane.n);
                    body.linear_position += plane.n * (r - dis);
                }
            }
            ShapeKind::Box { half_extent: h } => {
                for &dx in [-1.0f32, 1.0].iter() {
                    for &dy in [-1.0f32, 1.0].iter() {
                        for &dz in [-1.0f32, 1.0].iter() {
                            let corner = Point3::new(h.x * dx, h.y * dy, h.z * dz);
                            let p = m.transform_point(corner);
                            let dis = plane.signed_distance(p);
                            if dis < 0.0 {
                                body.compute_collision(p, plane.n);
                                body.linear_position += plane.n * -dis;
                            }
                        }
                    }
                }
            }
        }
    }

    /// The transform of a unit primitive (unit sphere or the cube spanning
    /// [-1, 1]) to this shape in world space.
    pub fn model_matrix(&self, rb_transform: &Matrix4<f32>) -> Matrix4<f32> {
        let scale = match self.kind {
            ShapeKind::Sphere { r } => Matrix4::from_scale(r),
            ShapeKind::Box { half_extent: h } => Matrix4::from_nonuniform_scale(h.x, h.y, h.z),
        };
        *rb_transform * self.transform * scale
    }
}

impl Add<Vector3<f32>> for Shape {
    type Output = Self;

    fn add(self, v: Vector3<f32>) -> Self {
        Shape {
            transform: Matrix4::from_translation(v) * self.transform,
            ..self
        }
    }
}

impl Sub<Vector3<f32>> for Shape {
    type Output = Self;

    fn sub(self, v: Vector3<f32>) -> Self {
        self + -v
    }
}

impl AddAssign<Vector3<f32>> for Shape {
    fn add_assign(&mut self, v: Vector3<f32>) {
        self.transform = Matrix4::from_translation(v) * self.transform;
    }
}

impl SubAssign<Vector3<f32>> for Shape {
    fn sub_assign(&mut self, v: Vector3<f32>) {
        *self += -v
    }
}

/// A type that has a moment of inertia.
pub trait Inertia {
    /// The inertia tensor about the center of the object for a mass of m.
    fn tensor(&self, m: f32) -> Matrix3<f32>;
}

impl Inertia for ShapeKind {
    fn tensor(&self, m: f32) -> Matrix3<f32> {
        match self {
            &ShapeKind::Sphere { r } => {
                let i = 0.4 * m * r * r;
                Matrix3::new(i, 0.0, 0.0, 0.0, i, 0.0, 0.0, 0.0, i)
            }
            &ShapeKind::Box { half_extent: h } => {
                // m / 12 * (w^2 + d^2) with full widths w = 2 * h
                let (x2, y2, z2) = (h.x * h.x, h.y * h.y, h.z * h.z);
                let k = m / 3.0;
                Matrix3::new(k * (y2 + z2), 0.0, 0.0,
                             0.0, k * (x2 + z2), 0.0,
                             0.0, 0.0, k * (x2 + y2))
            }
        }
    }
}

impl Inertia for Shape {
    /// The tensor about the shape's center, oriented in body-local space.
    fn tensor(&self, m: f32) -> Matrix3<f32> {
        let rot = linear_part(&self.transform);
        rot * self.kind.tensor(m) * rot.transpose()
    }
}

/// The upper left 3x3 block of a homogeneous transform.
pub(crate) fn linear_part(m: &Matrix4<f32>) -> Matrix3<f32> {
    Matrix3::from_cols(m.x.truncate(), m.y.truncate(), m.z.truncate())
}

fn unit_axis(i: usize) -> Vector3<f32> {
    let mut v = Vector3::zero();
    v[i] = 1.0;
    v
}

/// Uniform float in [-e, e].
fn random_symmetric<R: Rng + ?Sized>(rng: &mut R, e: f32) -> f32 {
    if e > 0.0 {
        rng.gen_range(-e..=e)
    } else {
        0.0
    }
}

/// Uniform point in the unit ball, by rejection.
fn random_in_unit_sphere<R: Rng + ?Sized>(rng: &mut R) -> Vector3<f32> {
    loop {
        let v = Vector3::new(
            random_symmetric(rng, 1.0),
            random_symmetric(rng, 1.0),
            random_symmetric(rng, 1.0),
        );
        if v.magnitude2() <= 1.0 {
            return v;
        }
    }
}
