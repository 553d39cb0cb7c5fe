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

//! A small rigid body dynamics library for interactive 3D demos.
//!
//! # Overview
//!
//! A `RigidBody` is a set of spheres and boxes sharing one pose. Bodies are
//! put together with a `RigidBodyBuilder`, which estimates mass, center of
//! mass and inertia tensor by splitting every shape into point samples and
//! then moves the shapes so that the body-local origin is the center of mass.
//!
//! Every simulation tick follows the same sequence:
//!
//! - `clear_forces`: resets the accumulators and applies gravity.
//! - `add_force`: any number of world space forces at world positions.
//! - `update`: integrates momentum and pose with explicit Euler, clamps the
//!   angular velocity, re-orthonormalizes the rotation, applies damping and
//!   the pendulum constraint if the body is a pendulum.
//! - `check_plane_collision`: once per static plane.
//!
//! Impulses (`apply_impulse`) and ray casts (`ray_cast`) may be issued at any
//! point between ticks. `Scene` wraps one body, a ground plane and an
//! optional thruster into exactly this loop.

pub extern crate cgmath;

mod error;
pub use error::*;

mod geom;
pub use geom::*;

mod mass;
pub use mass::*;

mod physics;
pub use physics::*;

mod preset;
pub use preset::*;

mod scene;
pub use scene::*;

mod shape;
pub use shape::*;
