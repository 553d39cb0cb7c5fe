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

use std::fmt;

use cgmath::{Deg, Matrix4, Point3, SquareMatrix, Vector3};
use serde::{Deserialize, Serialize};

use crate::shape::*;

/// Canned rigid body configurations.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Preset {
    /// A single box hanging from a point constraint.
    Pendulum,
    /// A bottom heavy figure made of spheres and boxes that rights itself.
    RolyPolyToy,
}

impl Preset {
    pub const ALL: [Preset; 2] = [Preset::Pendulum, Preset::RolyPolyToy];

    /// World position of the body-local origin before recentering.
    pub fn initial_position(self) -> Point3<f32> {
        match self {
            Preset::Pendulum => Point3::new(0.0, 3.0, 0.0),
            Preset::RolyPolyToy => Point3::new(0.0, 2.0, 0.0),
        }
    }

    /// The shapes of the preset in body-local space.
    pub fn shapes(self) -> Vec<Shape> {
        match self {
            Preset::Pendulum => vec![
                Shape::cuboid(Vector3::new(3.0, 1.5, 1.0), 10.0, Matrix4::identity()),
            ],
            Preset::RolyPolyToy => {
                let at = |x: f32, y: f32, z: f32| Matrix4::from_translation(Vector3::new(x, y, z));
                let arm = Vector3::new(0.3, 0.7, 0.3);
                vec![
                    // head
                    Shape::sphere(2.0, 3.0, Matrix4::identity()),
                    // ballast
                    Shape::sphere(0.3, 15.0, at(0.0, -1.5, 0.0)),
                    Shape::sphere(1.3, 2.0, at(0.0, 2.5, 0.0)),
                    // eyes
                    Shape::sphere(0.3, 0.1, at(-0.5, 3.0, 1.0)),
                    Shape::sphere(0.3, 0.1, at(0.5, 3.0, 1.0)),
                    // arms
                    Shape::cuboid(arm, 1.0, at(-1.5, 2.0, 0.0) * Matrix4::from_angle_z(Deg(45.0))),
                    Shape::cuboid(arm, 1.0, at(1.5, 2.0, 0.0) * Matrix4::from_angle_z(Deg(-45.0))),
                ]
            }
        }
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Preset::Pendulum => write!(f, "Pendulum"),
            Preset::RolyPolyToy => write!(f, "Roly-Poly Toy"),
        }
    }
}
