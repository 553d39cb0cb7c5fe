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
use cgmath::{Matrix3, Point3, Vector3};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::*;
use crate::shape::*;

/// Volume each sample stands in for when estimating mass properties.
pub const DEFAULT_SAMPLE_VOLUME: f32 = 0.001;

/// A point mass standing in for a small piece of a shape's volume.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ShapeSample {
    pub mass: f32,
    /// Position in body-local space.
    pub position: Point3<f32>,
}

/// How the mass properties of a set of shapes are derived.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum MassModel {
    /// Monte-Carlo estimate from point samples of roughly `target_volume`
    /// each. Overlapping shapes add up their masses.
    Sampled { target_volume: f32 },
    /// Exact tensors per shape combined with the parallel axis theorem.
    Analytic,
}

impl Default for MassModel {
    fn default() -> Self {
        MassModel::Sampled {
            target_volume: DEFAULT_SAMPLE_VOLUME,
        }
    }
}

/// Total mass, center of gravity, and inertia tensor about the center of
/// gravity of a set of shapes.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct MassProperties {
    pub mass: f32,
    pub center: Point3<f32>,
    pub inertia: Matrix3<f32>,
}

impl MassProperties {
    /// Derive the mass properties of `shapes` with the given model.
    pub fn compute<R: Rng + ?Sized>(
        shapes: &[Shape],
        model: MassModel,
        rng: &mut R,
    ) -> BodyResult<(Self, usize)> {
        if shapes.is_empty() {
            return Err(BodyError::Empty);
        }
        match model {
            MassModel::Sampled { target_volume } => {
                if !(target_volume > 0.0) {
                    return Err(BodyError::InvalidSampleVolume { volume: target_volume });
                }
                let mut samples = Vec::new();
                for shape in shapes.iter() {
                    shape.generate_samples(rng, target_volume, &mut samples);
                }
                let props = MassProperties::from_samples(&samples)?;
                Ok((props, samples.len()))
            }
            MassModel::Analytic => {
                let props = MassProperties::from_shapes_analytic(shapes)?;
                Ok((props, shapes.len()))
            }
        }
    }

    /// Accumulate mass, center of gravity, and the point mass inertia
    /// tensor of every sample about the center of gravity.
    pub fn from_samples(samples: &[ShapeSample]) -> BodyResult<Self> {
        if samples.is_empty() {
            return Err(BodyError::Empty);
        }
        let mut mass = 0.0;
        let mut weighted = Vector3::zero();
        for s in samples.iter() {
            mass += s.mass;
            weighted += s.position.to_vec() * s.mass;
        }
        check_mass(mass)?;
        let center = Point3::from_vec(weighted / mass);
        let inertia = samples.iter().fold(Matrix3::zero(), |sum, s| {
            sum + point_tensor(s.mass, s.position - center)
        });
        Ok(MassProperties {
            mass,
            center,
            inertia,
        })
    }

    /// Exact mass properties assuming every shape has uniform density and
    /// no two shapes overlap.
    pub fn from_shapes_analytic(shapes: &[Shape]) -> BodyResult<Self> {
        if shapes.is_empty() {
            return Err(BodyError::Empty);
        }
        let mut mass = 0.0;
        let mut weighted = Vector3::zero();
        for shape in shapes.iter() {
            mass += shape.mass;
            weighted += shape.center().to_vec() * shape.mass;
        }
        check_mass(mass)?;
        let center = Point3::from_vec(weighted / mass);
        let inertia = shapes.iter().fold(Matrix3::zero(), |sum, shape| {
            sum + shape.tensor(shape.mass) + point_tensor(shape.mass, shape.center() - center)
        });
        Ok(MassProperties {
            mass,
            center,
            inertia,
        })
    }
}

fn check_mass(mass: f32) -> BodyResult<()> {
    if mass > 0.0 && mass.is_finite() {
        Ok(())
    } else {
        Err(BodyError::NonPositiveMass { mass })
    }
}

/// Inertia tensor of a point mass m at displacement r from the reference
/// point.
pub fn point_tensor(m: f32, r: Vector3<f32>) -> Matrix3<f32> {
    let (xx, yy, zz) = (r.x * r.x, r.y * r.y, r.z * r.z);
    let (xy, xz, yz) = (r.x * r.y, r.x * r.z, r.y * r.z);
    // Symmetric, so column order does not matter.
    Matrix3::new(yy + zz, -xy, -xz,
                 -xy, xx + zz, -yz,
                 -xz, -yz, xx + yy) * m
}
