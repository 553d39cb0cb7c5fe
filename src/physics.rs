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

use cgmath::prelude::*;
use cgmath::{Matrix3, Matrix4, Point3, Vector3};
use log::{debug, info, warn};
use rand::Rng;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::error::*;
use crate::geom::*;
use crate::mass::*;
use crate::preset::*;
use crate::shape::*;

/// Angular velocities above this magnitude (rad/s) are clamped.
pub const MAX_ANGULAR_VELOCITY: f32 = 100.0;

/// Default anchor of the pendulum constraint.
pub const DEFAULT_PENDULUM_POSITION: Point3<f32> = Point3 { x: 0.0, y: 10.0, z: 0.0 };

/// Tuning constants of a rigid body.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BodyParams {
    /// Fraction of linear momentum lost per second.
    pub linear_damping: f32,
    /// Fraction of angular momentum lost per second.
    pub angular_damping: f32,
    /// Restitution is a measure of how much kinetic energy is retained in a
    /// collision. 100% of kinetic energy retention corresponds to a coefficient
    /// of one.
    pub restitution: f32,
    /// Stored for callers but not applied by plane collisions.
    pub friction: f32,
    /// Acceleration along the y axis.
    pub gravity: f32,
}

impl Default for BodyParams {
    fn default() -> Self {
        BodyParams {
            linear_damping: 0.1,
            angular_damping: 0.1,
            restitution: 0.5,
            friction: 0.5,
            gravity: -9.81,
        }
    }
}

/// A rigid body whose mass properties have not been computed yet.
///
/// Shapes are collected here and `calculate_mass_and_inertia` consumes the
/// builder to produce a `RigidBody` whose local origin is its center of
/// mass. There is no other way to obtain a `RigidBody`.
#[derive(Clone, Debug)]
pub struct RigidBodyBuilder {
    shapes: Vec<Shape>,
    position: Point3<f32>,
    preset: Option<Preset>,
    pendulum_position: Point3<f32>,
    params: BodyParams,
    mass_model: MassModel,
}

impl Default for RigidBodyBuilder {
    fn default() -> Self {
        RigidBodyBuilder::new()
    }
}

impl RigidBodyBuilder {
    pub fn new() -> Self {
        RigidBodyBuilder {
            shapes: Vec::new(),
            position: Point3::origin(),
            preset: None,
            pendulum_position: DEFAULT_PENDULUM_POSITION,
            params: BodyParams::default(),
            mass_model: MassModel::default(),
        }
    }

    /// Replace the shapes and initial position with those of a preset.
    pub fn load_preset(mut self, preset: Preset) -> Self {
        self.shapes = preset.shapes();
        self.position = preset.initial_position();
        self.preset = Some(preset);
        self
    }

    pub fn shape(mut self, shape: Shape) -> Self {
        self.shapes.push(shape);
        self
    }

    pub fn position(mut self, position: Point3<f32>) -> Self {
        self.position = position;
        self
    }

    pub fn params(mut self, params: BodyParams) -> Self {
        self.params = params;
        self
    }

    /// Anchor for the point constraint applied to pendulum presets.
    pub fn pendulum_anchor(mut self, anchor: Point3<f32>) -> Self {
        self.pendulum_position = anchor;
        self
    }

    pub fn mass_model(mut self, model: MassModel) -> Self {
        self.mass_model = model;
        self
    }

    pub fn shapes(&self) -> &[Shape] {
        &self.shapes
    }

    /// Derive mass and inertia from the shapes, then move the shapes so that
    /// the body-local origin is the center of mass and shift the body's
    /// position by the same amount.
    pub fn calculate_mass_and_inertia<R: Rng + ?Sized>(self, rng: &mut R) -> BodyResult<RigidBody> {
        let (props, samples) = MassProperties::compute(&self.shapes, self.mass_model, rng)?;
        let inv_inertia = props.inertia.invert().ok_or(BodyError::SingularInertia)?;
        info!("Calculated mass and inertia via {} samples.", samples);
        info!(" - Mass is {}", props.mass);
        info!(" - Center of Gravity is {:?}", props.center);
        info!(" - Inertia is");
        for i in 0..3 {
            info!("    {:?}", props.inertia.row(i));
        }
        let cog = props.center.to_vec();
        let shapes = self.shapes.into_iter().map(|shape| shape - cog).collect();
        Ok(RigidBody {
            preset: self.preset,
            shapes,
            pendulum_position: self.pendulum_position,
            mass: props.mass,
            inertia: props.inertia,
            inv_inertia,
            linear_position: self.position + cog,
            angular_position: Matrix3::identity(),
            linear_momentum: Vector3::zero(),
            angular_momentum: Vector3::zero(),
            linear_forces: Vector3::zero(),
            angular_forces: Vector3::zero(),
            params: self.params,
        })
    }
}

/// A physical body that has a mass, a volume, and experiences linear and
/// rotational movement.
///
/// State is kept as momentum rather than velocity. Positions and forces
/// passed to the body are in world coordinates unless stated otherwise.
///
/// Each simulation tick is expected to call, in order: `clear_forces`, any
/// number of `add_force`, `update`, then `check_plane_collision` once per
/// static plane.
#[derive(Clone, Debug)]
pub struct RigidBody {
    preset: Option<Preset>,
    shapes: SmallVec<[Shape; 8]>,
    pendulum_position: Point3<f32>,
    mass: f32,
    inertia: Matrix3<f32>,
    inv_inertia: Matrix3<f32>,
    /// Center of mass in world space.
    pub linear_position: Point3<f32>,
    /// Rotation from body-local to world space. Orthonormal after every
    /// update.
    pub angular_position: Matrix3<f32>,
    pub linear_momentum: Vector3<f32>,
    /// Angular momentum in world space.
    pub angular_momentum: Vector3<f32>,
    linear_forces: Vector3<f32>,
    angular_forces: Vector3<f32>,
    pub params: BodyParams,
}

impl RigidBody {
    /// Build and initialize a body from a preset in one step.
    ///
    /// The body is sampled with the default `MassModel` and a pendulum is
    /// anchored at `DEFAULT_PENDULUM_POSITION`. Use `RigidBodyBuilder` to
    /// change either.
    pub fn load_preset<R: Rng + ?Sized>(preset: Preset, params: BodyParams, rng: &mut R) -> BodyResult<Self> {
        RigidBodyBuilder::new()
            .load_preset(preset)
            .params(params)
            .calculate_mass_and_inertia(rng)
    }

    pub fn preset(&self) -> Option<Preset> {
        self.preset
    }

    pub fn shapes(&self) -> &[Shape] {
        &self.shapes
    }

    pub fn pendulum_position(&self) -> Point3<f32> {
        self.pendulum_position
    }

    pub fn mass(&self) -> f32 {
        self.mass
    }

    /// Inertia tensor about the center of mass in body-local space.
    pub fn inertia(&self) -> Matrix3<f32> {
        self.inertia
    }

    pub fn linear_forces(&self) -> Vector3<f32> {
        self.linear_forces
    }

    pub fn angular_forces(&self) -> Vector3<f32> {
        self.angular_forces
    }

    /// Body-local to world transform.
    pub fn transform(&self) -> Matrix4<f32> {
        Matrix4::from_translation(self.linear_position.to_vec()) * Matrix4::from(self.angular_position)
    }

    pub fn linear_velocity(&self) -> Vector3<f32> {
        self.linear_momentum / self.mass
    }

    pub fn angular_velocity(&self) -> Vector3<f32> {
        self.inv_inertia_world() * self.angular_momentum
    }

    /// World velocity of the body at a world position.
    pub fn velocity_in_point(&self, world_pos: Point3<f32>) -> Vector3<f32> {
        self.linear_velocity() + self.angular_velocity().cross(world_pos - self.linear_position)
    }

    pub fn point_local_to_global(&self, local_pos: Point3<f32>) -> Point3<f32> {
        self.linear_position + self.angular_position * local_pos.to_vec()
    }

    pub fn point_global_to_local(&self, world_pos: Point3<f32>) -> Point3<f32> {
        Point3::from_vec(self.angular_position.transpose() * (world_pos - self.linear_position))
    }

    pub fn direction_local_to_global(&self, local_dir: Vector3<f32>) -> Vector3<f32> {
        self.angular_position * local_dir
    }

    pub fn direction_global_to_local(&self, world_dir: Vector3<f32>) -> Vector3<f32> {
        self.angular_position.transpose() * world_dir
    }

    /// The inverse inertia tensor rotated into world space.
    pub fn inv_inertia_world(&self) -> Matrix3<f32> {
        self.angular_position * self.inv_inertia * self.angular_position.transpose()
    }

    /// Casts a world space ray against every shape and returns the hit
    /// closest to the ray origin.
    pub fn ray_cast(&self, ray: &Ray, max_range: f32) -> Option<RayHit> {
        let transform = self.transform();
        self.shapes.iter().fold(None, |best, shape| {
            match shape.ray_cast(&transform, ray, max_range) {
                Some(hit) => RayHit::closest(best, hit),
                None => best,
            }
        })
    }

    /// Model matrices of every shape for drawing unit primitives.
    pub fn draw_list<'a>(&'a self) -> impl Iterator<Item = (ShapeKind, Matrix4<f32>)> + 'a {
        let transform = self.transform();
        self.shapes
            .iter()
            .map(move |shape| (shape.kind(), shape.model_matrix(&transform)))
    }

    /// Reset the force and torque accumulators and apply gravity.
    pub fn clear_forces(&mut self) {
        self.linear_forces = Vector3::new(0.0, self.params.gravity, 0.0) * self.mass;
        self.angular_forces = Vector3::zero();
    }

    /// Accumulate a world space force acting at a world position.
    pub fn add_force(&mut self, force: Vector3<f32>, world_pos: Point3<f32>) {
        self.linear_forces += force;
        self.angular_forces += (world_pos - self.linear_position).cross(force);
    }

    /// Instantly change momentum by a world space impulse acting at a world
    /// position.
    pub fn apply_impulse(&mut self, impulse: Vector3<f32>, world_pos: Point3<f32>) {
        self.linear_momentum += impulse;
        self.angular_momentum += (world_pos - self.linear_position).cross(impulse);
    }

    /// Advance the body by `dt` seconds under the accumulated forces.
    ///
    /// The order of the steps is significant: momentum, then position, then
    /// re-orthonormalization, then damping, then the pendulum constraint.
    pub fn update(&mut self, dt: f32) {
        let pendulum_distance = (self.linear_position - self.pendulum_position).magnitude();

        let mut omega = self.angular_velocity();
        if omega.magnitude() > MAX_ANGULAR_VELOCITY {
            omega = omega.normalize() * MAX_ANGULAR_VELOCITY;
            warn!("Angular velocity too high, clamping to {} rad/s", MAX_ANGULAR_VELOCITY);
        }

        self.linear_momentum += self.linear_forces * dt;
        self.linear_position += self.linear_velocity() * dt;

        self.angular_momentum += self.angular_forces * dt;
        // First order step of dR/dt = [omega]x R, column by column.
        let r = &mut self.angular_position;
        r.x += omega.cross(r.x) * dt;
        r.y += omega.cross(r.y) * dt;
        r.z += omega.cross(r.z) * dt;
        orthonormalize(r);

        self.linear_momentum *= (1.0 - self.params.linear_damping).powf(dt);
        self.angular_momentum *= (1.0 - self.params.angular_damping).powf(dt);

        if self.preset == Some(Preset::Pendulum) {
            let arm = self.linear_position - self.pendulum_position;
            // The direction is undefined with the body on the anchor.
            if arm.magnitude2() > COLLISION_EPSILON {
                let dir = arm.normalize();
                self.linear_momentum -= dir * dir.dot(self.linear_momentum);
                self.linear_position = self.pendulum_position + dir * pendulum_distance;
            }
        }
    }

    /// Resolve every shape against a static plane.
    pub fn check_plane_collision(&mut self, plane: &Plane) {
        for i in 0..self.shapes.len() {
            let shape = self.shapes[i];
            shape.check_plane_collision(self, plane);
        }
    }

    /// Apply the collision impulse for a contact at `world_pos` against an
    /// immovable object with surface normal `other_normal`. Does not correct
    /// position and does not apply friction.
    pub fn compute_collision(&mut self, world_pos: Point3<f32>, other_normal: Vector3<f32>) {
        let rel_pos = world_pos - self.linear_position;
        let v_normal = other_normal.dot(self.velocity_in_point(world_pos));
        if v_normal > 0.0 {
            // Already separating
            return;
        }
        // The other object has infinite mass and inertia, so only our terms
        // remain in the denominator.
        let angular = other_normal.dot((self.inv_inertia_world() * rel_pos.cross(other_normal)).cross(rel_pos));
        let j = -(1.0 + self.params.restitution) * v_normal / (1.0 / self.mass + angular);
        debug!("Contact at {:?} resolved with impulse {}", world_pos, j);
        self.apply_impulse(other_normal * j, world_pos);
    }

    /// Translate every shape in body-local space.
    pub fn move_shapes(&mut self, offset: Vector3<f32>) {
        for shape in self.shapes.iter_mut() {
            *shape += offset;
        }
    }
}

/// Gram-Schmidt on the columns in order x, y, z.
fn orthonormalize(r: &mut Matrix3<f32>) {
    r.x = r.x.normalize();
    r.y -= r.x * r.x.dot(r.y);
    r.y = r.y.normalize();
    r.z -= r.x * r.x.dot(r.z);
    r.z -= r.y * r.y.dot(r.z);
    r.z = r.z.normalize();
}

#[cfg(test)]
mod tests {
    mod physics {
        use approx::{assert_abs_diff_eq, assert_relative_eq};
        use cgmath::prelude::*;
        use cgmath::{Deg, Matrix3, Matrix4, Point3, Vector3};
        use rand::rngs::StdRng;
        use rand::SeedableRng;

        use crate::geom::*;
        use crate::physics::*;

        fn weightless() -> BodyParams {
            BodyParams {
                linear_damping: 0.0,
                angular_damping: 0.0,
                gravity: 0.0,
                ..BodyParams::default()
            }
        }

        fn ball(r: f32, mass: f32, params: BodyParams) -> RigidBody {
            RigidBodyBuilder::new()
                .shape(Shape::sphere(r, mass, Matrix4::identity()))
                .mass_model(MassModel::Analytic)
                .params(params)
                .calculate_mass_and_inertia(&mut StdRng::seed_from_u64(0))
                .unwrap()
        }

        fn assert_orthonormal(r: &Matrix3<f32>) {
            assert_abs_diff_eq!(r.x.magnitude(), 1.0, epsilon = 1e-5);
            assert_abs_diff_eq!(r.y.magnitude(), 1.0, epsilon = 1e-5);
            assert_abs_diff_eq!(r.z.magnitude(), 1.0, epsilon = 1e-5);
            assert_abs_diff_eq!(r.x.dot(r.y), 0.0, epsilon = 1e-5);
            assert_abs_diff_eq!(r.x.dot(r.z), 0.0, epsilon = 1e-5);
            assert_abs_diff_eq!(r.y.dot(r.z), 0.0, epsilon = 1e-5);
        }

        #[test]
        fn test_builder_errors() {
            let mut rng = StdRng::seed_from_u64(0);
            assert_eq!(RigidBodyBuilder::new().calculate_mass_and_inertia(&mut rng).unwrap_err(),
                       BodyError::Empty);
            let massless = RigidBodyBuilder::new()
                .shape(Shape::sphere(1.0, 0.0, Matrix4::identity()));
            assert_eq!(massless.calculate_mass_and_inertia(&mut rng).unwrap_err(),
                       BodyError::NonPositiveMass { mass: 0.0 });
            // A single sample has no rotational inertia.
            let point = RigidBodyBuilder::new()
                .shape(Shape::sphere(0.01, 1.0, Matrix4::identity()));
            assert_eq!(point.calculate_mass_and_inertia(&mut rng).unwrap_err(),
                       BodyError::SingularInertia);
        }

        #[test]
        fn test_recentering() {
            let mut rng = StdRng::seed_from_u64(42);
            let body = RigidBodyBuilder::new()
                .shape(Shape::sphere(0.5, 1.0, Matrix4::from_translation(Vector3::new(2.0, 0.0, 0.0))))
                .shape(Shape::cuboid(Vector3::new(0.5, 0.5, 0.5), 3.0, Matrix4::identity()))
                .position(Point3::new(0.0, 1.0, 0.0))
                .calculate_mass_and_inertia(&mut rng)
                .unwrap();
            let sum: f32 = body.shapes().iter().map(|s| s.mass).sum();
            assert_relative_eq!(body.mass(), sum, epsilon = 0.01);
            // Mass weighted mean of the recentered shapes is the origin.
            let mut weighted = Vector3::zero();
            for shape in body.shapes() {
                weighted += shape.center().to_vec() * shape.mass;
            }
            assert_abs_diff_eq!(weighted / sum, Vector3::zero(), epsilon = 0.03);
            assert_abs_diff_eq!(body.linear_position, Point3::new(0.5, 1.0, 0.0), epsilon = 0.03);
            // The shapes did not move in world space.
            assert_abs_diff_eq!(body.point_local_to_global(body.shapes()[0].center()),
                                Point3::new(2.0, 1.0, 0.0), epsilon = 1e-5);
        }

        #[test]
        fn test_transforms() {
            let mut body = ball(1.0, 1.0, weightless());
            body.linear_position = Point3::new(1.0, 2.0, 3.0);
            body.angular_position = Matrix3::from_angle_z(Deg(90.0));
            let local = Point3::new(1.0, 0.0, 0.0);
            let world = body.point_local_to_global(local);
            assert_relative_eq!(world, Point3::new(1.0, 3.0, 3.0), epsilon = 1e-6);
            assert_relative_eq!(body.point_global_to_local(world), local, epsilon = 1e-6);
            assert_relative_eq!(body.transform().transform_point(local), world, epsilon = 1e-6);
            let dir = body.direction_local_to_global(Vector3::unit_y());
            assert_relative_eq!(dir, Vector3::new(-1.0, 0.0, 0.0), epsilon = 1e-6);
            assert_relative_eq!(body.direction_global_to_local(dir), Vector3::unit_y(), epsilon = 1e-6);
        }

        #[test]
        fn test_inv_inertia_world() {
            let body = RigidBodyBuilder::new()
                .shape(Shape::cuboid(Vector3::new(1.0, 0.5, 0.25), 12.0, Matrix4::identity()))
                .mass_model(MassModel::Analytic)
                .calculate_mass_and_inertia(&mut StdRng::seed_from_u64(0))
                .unwrap();
            let mut turned = body.clone();
            turned.angular_position = Matrix3::from_angle_z(Deg(90.0));
            let i = body.inv_inertia_world();
            let j = turned.inv_inertia_world();
            assert_relative_eq!(i.x.x, j.y.y, epsilon = 1e-5);
            assert_relative_eq!(i.y.y, j.x.x, epsilon = 1e-5);
            assert_relative_eq!(i * body.inertia(), Matrix3::identity(), epsilon = 1e-5);
        }

        #[test]
        fn test_forces() {
            let mut body = ball(1.0, 2.0, BodyParams::default());
            body.clear_forces();
            assert_relative_eq!(body.linear_forces(), Vector3::new(0.0, -9.81 * 2.0, 0.0));
            assert_eq!(body.angular_forces(), Vector3::zero());
            let at = body.linear_position + Vector3::new(1.0, 0.0, 0.0);
            body.add_force(Vector3::new(0.0, 1.0, 0.0), at);
            assert_relative_eq!(body.linear_forces(), Vector3::new(0.0, 1.0 - 9.81 * 2.0, 0.0));
            assert_relative_eq!(body.angular_forces(), Vector3::new(0.0, 0.0, 1.0));
            body.clear_forces();
            assert_eq!(body.angular_forces(), Vector3::zero());
        }

        #[test]
        fn test_impulse() {
            let mut body = ball(1.0, 1.0, weightless());
            let angular = body.angular_momentum;
            let center = body.linear_position;
            body.apply_impulse(Vector3::new(0.0, 1.0, 0.0), center);
            assert_eq!(body.linear_momentum, Vector3::new(0.0, 1.0, 0.0));
            assert_eq!(body.angular_momentum, angular);

            // Off center impulses spin the body.
            body.apply_impulse(Vector3::new(0.0, 0.0, 1.0), center + Vector3::new(1.0, 0.0, 0.0));
            assert_eq!(body.linear_momentum, Vector3::new(0.0, 1.0, 1.0));
            assert_eq!(body.angular_momentum, Vector3::new(0.0, -1.0, 0.0));
            let expected = body.inv_inertia_world() * Vector3::new(0.0, -1.0, 0.0);
            assert_relative_eq!(body.angular_velocity(), expected);
            let p = center + Vector3::new(1.0, 0.0, 0.0);
            assert_relative_eq!(body.velocity_in_point(p),
                                body.linear_velocity() + expected.cross(Vector3::new(1.0, 0.0, 0.0)));
        }

        #[test]
        fn test_free_fall() {
            let params = BodyParams { gravity: -9.81, ..weightless() };
            let mut body = ball(0.5, 1.0, params);
            let dt = 0.001;
            let steps = 1000;
            for _ in 0..steps {
                body.clear_forces();
                body.update(dt);
            }
            let t = dt * steps as f32;
            // Semi-implicit Euler overshoots by g * t * dt / 2.
            assert_abs_diff_eq!(body.linear_position.y, -0.5 * 9.81 * t * t, epsilon = 0.02);
            assert_abs_diff_eq!(body.linear_velocity().y, -9.81 * t, epsilon = 5e-3);
            assert_eq!(body.linear_position.x, 0.0);
        }

        #[test]
        fn test_orthonormal_rotation() {
            let mut body = RigidBodyBuilder::new()
                .shape(Shape::cuboid(Vector3::new(1.0, 0.5, 0.25), 1.0, Matrix4::identity()))
                .mass_model(MassModel::Analytic)
                .params(weightless())
                .calculate_mass_and_inertia(&mut StdRng::seed_from_u64(0))
                .unwrap();
            body.apply_impulse(Vector3::new(0.0, 0.3, 0.2), body.linear_position + Vector3::new(1.0, 0.0, 0.2));
            for _ in 0..500 {
                body.clear_forces();
                body.update(1.0 / 60.0);
                assert_orthonormal(&body.angular_position);
            }
        }

        #[test]
        fn test_angular_velocity_clamp() {
            let mut body = ball(1.0, 1.0, weightless());
            body.angular_momentum = Vector3::new(0.0, 1000.0, 0.0);
            let x = body.angular_position.x;
            body.clear_forces();
            body.update(0.001);
            // Rotated by at most MAX_ANGULAR_VELOCITY * dt radians.
            let angle = x.dot(body.angular_position.x).acos();
            assert_abs_diff_eq!(angle, MAX_ANGULAR_VELOCITY * 0.001, epsilon = 1e-3);
            // Momentum itself is not touched by the clamp.
            assert_eq!(body.angular_momentum, Vector3::new(0.0, 1000.0, 0.0));
            assert_orthonormal(&body.angular_position);
        }

        #[test]
        fn test_damping() {
            let params = BodyParams {
                linear_damping: 0.5,
                angular_damping: 0.5,
                gravity: 0.0,
                ..BodyParams::default()
            };
            let mut body = ball(1.0, 1.0, params);
            body.linear_momentum = Vector3::new(1.0, 2.0, 0.0);
            body.angular_momentum = Vector3::new(0.0, 0.0, 1.0);
            let mut linear = body.linear_momentum.magnitude();
            let mut angular = body.angular_momentum.magnitude();
            for _ in 0..100 {
                body.clear_forces();
                body.update(0.01);
                assert!(body.linear_momentum.magnitude() <= linear);
                assert!(body.angular_momentum.magnitude() <= angular);
                linear = body.linear_momentum.magnitude();
                angular = body.angular_momentum.magnitude();
            }
            // Half the momentum is lost over one second regardless of step size.
            assert_relative_eq!(linear, 0.5 * 5.0f32.sqrt(), epsilon = 1e-4);
            assert_relative_eq!(angular, 0.5, epsilon = 1e-4);
        }

        #[test]
        fn test_sphere_settles_on_plane() {
            let mut body = ball(0.5, 1.0, BodyParams::default());
            body.linear_position = Point3::new(0.0, 3.0, 0.0);
            let ground = Plane::from_point_normal(Point3::origin(), Vector3::unit_y());
            for _ in 0..600 {
                body.clear_forces();
                body.update(1.0 / 60.0);
                body.check_plane_collision(&ground);
                assert!(body.linear_position.y >= 0.5 - 1e-4);
            }
            assert_abs_diff_eq!(body.linear_position.y, 0.5, epsilon = 0.01);
            assert_abs_diff_eq!(body.linear_velocity().y, 0.0, epsilon = 0.2);
        }

        fn cube(h: f32, params: BodyParams) -> RigidBody {
            RigidBodyBuilder::new()
                .shape(Shape::cuboid(Vector3::new(h, h, h), 1.0, Matrix4::identity()))
                .mass_model(MassModel::Analytic)
                .params(params)
                .calculate_mass_and_inertia(&mut StdRng::seed_from_u64(0))
                .unwrap()
        }

        fn corner_heights(body: &RigidBody, h: f32) -> Vec<f32> {
            let mut heights = Vec::new();
            for &dx in [-h, h].iter() {
                for &dy in [-h, h].iter() {
                    for &dz in [-h, h].iter() {
                        heights.push(body.point_local_to_global(Point3::new(dx, dy, dz)).y);
                    }
                }
            }
            heights
        }

        fn lowest(heights: &[f32]) -> f32 {
            heights.iter().cloned().fold(f32::INFINITY, f32::min)
        }

        #[test]
        fn test_box_single_corner_contact() {
            let mut body = cube(0.5, weightless());
            body.angular_position = Matrix3::from_angle_x(Deg(20.0)) * Matrix3::from_angle_z(Deg(30.0));
            let depth = 0.01;
            body.linear_position = Point3::new(0.0, 0.0, 0.0);
            let below = lowest(&corner_heights(&body, 0.5));
            body.linear_position = Point3::new(0.0, -below - depth, 0.0);
            let heights = corner_heights(&body, 0.5);
            assert_eq!(heights.iter().filter(|&&y| y < 0.0).count(), 1);
            assert_relative_eq!(lowest(&heights), -depth, epsilon = 1e-5);

            body.linear_momentum = Vector3::new(0.0, -1.0, 0.0);
            let before = body.linear_position;
            let ground = Plane::from_point_normal(Point3::origin(), Vector3::unit_y());
            body.check_plane_collision(&ground);

            // Lifted by exactly the penetration depth along the normal.
            assert_relative_eq!(body.linear_position.y - before.y, depth, epsilon = 1e-5);
            assert_eq!(body.linear_position.x, before.x);
            assert_eq!(body.linear_position.z, before.z);
            assert_abs_diff_eq!(lowest(&corner_heights(&body, 0.5)), 0.0, epsilon = 1e-5);
            // The off-center corner impulse spins the box.
            assert!(body.angular_momentum.magnitude() > 1e-3);
            assert!(body.linear_momentum.y > -1.0);
        }

        #[test]
        fn test_box_settles_on_plane() {
            let mut body = cube(0.5, BodyParams::default());
            body.linear_position = Point3::new(0.0, 3.0, 0.0);
            let ground = Plane::from_point_normal(Point3::origin(), Vector3::unit_y());
            for _ in 0..1200 {
                body.clear_forces();
                body.update(1.0 / 60.0);
                body.check_plane_collision(&ground);
                assert!(lowest(&corner_heights(&body, 0.5)) >= -1e-4);
            }
            assert_abs_diff_eq!(body.linear_position.y, 0.5, epsilon = 0.01);
            assert!(body.direction_local_to_global(Vector3::unit_y()).y > 0.95);
        }

        #[test]
        fn test_collision_restitution() {
            let params = BodyParams { restitution: 0.5, ..weightless() };
            let mut body = ball(1.0, 2.0, params);
            body.linear_momentum = Vector3::new(1.0, -4.0, 0.0);
            let contact = body.linear_position + Vector3::new(0.0, -1.0, 0.0);
            body.compute_collision(contact, Vector3::unit_y());
            // Contact under the center: no torque, normal velocity reversed and
            // halved, tangential velocity untouched.
            assert_relative_eq!(body.linear_momentum, Vector3::new(1.0, 2.0, 0.0), epsilon = 1e-5);
            assert_abs_diff_eq!(body.angular_momentum, Vector3::zero(), epsilon = 1e-6);

            // Separating contacts are ignored.
            body.compute_collision(contact, Vector3::unit_y());
            assert_relative_eq!(body.linear_momentum, Vector3::new(1.0, 2.0, 0.0), epsilon = 1e-5);
        }

        #[test]
        fn test_off_center_collision() {
            let params = BodyParams { restitution: 1.0, ..weightless() };
            let mut body = RigidBodyBuilder::new()
                .shape(Shape::cuboid(Vector3::new(1.0, 0.5, 0.5), 1.0, Matrix4::identity()))
                .mass_model(MassModel::Analytic)
                .params(params)
                .calculate_mass_and_inertia(&mut StdRng::seed_from_u64(0))
                .unwrap();
            body.linear_momentum = Vector3::new(0.0, -1.0, 0.0);
            let corner = body.linear_position + Vector3::new(1.0, -0.5, 0.5);
            body.compute_collision(corner, Vector3::unit_y());
            // An elastic hit leaves the contact point moving away at the
            // incoming speed.
            assert_relative_eq!(body.velocity_in_point(corner).y, 1.0, epsilon = 1e-4);
            assert!(body.angular_momentum.magnitude() > 0.0);
        }

        #[test]
        fn test_ray_cast_compound() {
            let body = RigidBodyBuilder::new()
                .shape(Shape::sphere(1.0, 1.0, Matrix4::from_translation(Vector3::new(0.0, 0.0, -3.0))))
                .shape(Shape::sphere(1.0, 1.0, Matrix4::from_translation(Vector3::new(0.0, 0.0, 3.0))))
                .mass_model(MassModel::Analytic)
                .calculate_mass_and_inertia(&mut StdRng::seed_from_u64(0))
                .unwrap();
            let ray = Ray::new(Point3::new(0.0, 0.0, 10.0), Vector3::new(0.0, 0.0, -1.0));
            let hit = body.ray_cast(&ray, DEFAULT_MAX_RANGE).unwrap();
            assert_relative_eq!(hit.p, Point3::new(0.0, 0.0, 4.0), epsilon = 1e-5);
            assert_relative_eq!(hit.n, Vector3::unit_z(), epsilon = 1e-5);
            let back = Ray::new(Point3::new(0.0, 0.0, -10.0), Vector3::new(0.0, 0.0, 1.0));
            let hit = body.ray_cast(&back, DEFAULT_MAX_RANGE).unwrap();
            assert_relative_eq!(hit.p, Point3::new(0.0, 0.0, -4.0), epsilon = 1e-5);
            assert!(body.ray_cast(&ray, 5.0).is_none());
        }

        #[test]
        fn test_draw_list() {
            let mut body = ball(2.0, 1.0, weightless());
            body.linear_position = Point3::new(0.0, 5.0, 0.0);
            let list: Vec<_> = body.draw_list().collect();
            assert_eq!(list.len(), 1);
            assert_eq!(list[0].0, ShapeKind::Sphere { r: 2.0 });
            assert_relative_eq!(list[0].1.transform_point(Point3::new(1.0, 0.0, 0.0)),
                                Point3::new(2.0, 5.0, 0.0), epsilon = 1e-6);
        }

        #[test]
        fn test_move_shapes() {
            let mut body = ball(1.0, 1.0, weightless());
            body.move_shapes(Vector3::new(0.0, 1.0, 0.0));
            assert_relative_eq!(body.shapes()[0].center(), Point3::new(0.0, 1.0, 0.0));
        }

        #[test]
        fn test_pendulum_keeps_distance() {
            let mut rng = StdRng::seed_from_u64(3);
            let mut body = RigidBodyBuilder::new()
                .load_preset(Preset::Pendulum)
                .mass_model(MassModel::Analytic)
                .calculate_mass_and_inertia(&mut rng)
                .unwrap();
            let anchor = body.pendulum_position();
            let length = (body.linear_position - anchor).magnitude();
            body.apply_impulse(Vector3::new(20.0, 0.0, 0.0), body.linear_position);
            let mut swing = 0.0f32;
            for _ in 0..300 {
                body.clear_forces();
                body.update(1.0 / 60.0);
                assert_relative_eq!((body.linear_position - anchor).magnitude(), length, epsilon = 1e-3);
                // No momentum along the arm survives the constraint.
                let arm = (body.linear_position - anchor).normalize();
                assert_abs_diff_eq!(arm.dot(body.linear_momentum), 0.0, epsilon = 1e-3);
                swing = swing.max(body.linear_position.x.abs());
            }
            assert!(swing > 0.5);
        }
    }
}
