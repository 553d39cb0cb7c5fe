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
use cgmath::{Point3, Vector3};
use log::info;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::*;
use crate::geom::*;
use crate::mass::*;
use crate::physics::*;
use crate::preset::*;

/// Settings of a single-body scene with a static ground plane.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub preset: Preset,
    pub body: BodyParams,
    pub mass_model: MassModel,
    /// Magnitude of the impulse applied by a click.
    pub impulse_strength: f32,
    /// Magnitude of the constant thruster force.
    pub thruster_strength: f32,
    /// Pin the center of mass in place after every tick, leaving only
    /// rotation free.
    pub fix_center_of_mass: bool,
    pub fixed_center: Point3<f32>,
    pub ground_position: Point3<f32>,
    pub ground_normal: Vector3<f32>,
}

impl Default for SceneConfig {
    fn default() -> Self {
        SceneConfig {
            preset: Preset::RolyPolyToy,
            body: BodyParams::default(),
            mass_model: MassModel::default(),
            impulse_strength: 10.0,
            thruster_strength: 10.0,
            fix_center_of_mass: false,
            fixed_center: Point3::new(0.0, 3.0, 0.0),
            ground_position: Point3::origin(),
            ground_normal: Vector3::unit_y(),
        }
    }
}

/// A constant force attached to the body. Stored in body-local space so
/// that it turns with the body.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Thruster {
    pub local_pos: Point3<f32>,
    /// Surface normal at the attachment point. The thruster pushes against
    /// it.
    pub local_dir: Vector3<f32>,
}

/// What a click on the body does.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ClickMode {
    Impulse,
    Thruster,
}

/// Drives one rigid body through the per-tick sequence against a ground
/// plane.
pub struct Scene<R: Rng> {
    config: SceneConfig,
    body: RigidBody,
    ground: Plane,
    thruster: Option<Thruster>,
    rng: R,
}

impl<R: Rng> Scene<R> {
    pub fn new(config: SceneConfig, mut rng: R) -> BodyResult<Self> {
        let n = config.ground_normal;
        if !(n.magnitude2() > COLLISION_EPSILON && n.magnitude2().is_finite()) {
            return Err(BodyError::InvalidPlaneNormal { normal: n.into() });
        }
        let body = build_body(&config, config.preset, &mut rng)?;
        Ok(Scene {
            config,
            body,
            ground: Plane::from_point_normal(config.ground_position, n),
            thruster: None,
            rng,
        })
    }

    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    pub fn body(&self) -> &RigidBody {
        &self.body
    }

    pub fn body_mut(&mut self) -> &mut RigidBody {
        &mut self.body
    }

    pub fn ground(&self) -> &Plane {
        &self.ground
    }

    pub fn thruster(&self) -> Option<Thruster> {
        self.thruster
    }

    /// Replace the body with a freshly initialized preset and drop any
    /// thruster. On error the current body is kept.
    pub fn load_preset(&mut self, preset: Preset) -> BodyResult<()> {
        self.body = build_body(&self.config, preset, &mut self.rng)?;
        self.config.preset = preset;
        self.thruster = None;
        Ok(())
    }

    /// Advance the scene by `dt` seconds.
    pub fn tick(&mut self, dt: f32) {
        self.body.clear_forces();
        if let Some(thruster) = self.thruster {
            let world_pos = self.body.point_local_to_global(thruster.local_pos);
            let world_dir = self.body.direction_local_to_global(thruster.local_dir);
            self.body.add_force(-world_dir * self.config.thruster_strength, world_pos);
        }
        self.body.update(dt);
        self.body.check_plane_collision(&self.ground);
        if self.config.fix_center_of_mass {
            self.body.linear_momentum = Vector3::zero();
            self.body.linear_position = self.config.fixed_center;
        }
    }

    /// Pick the body with a world space ray.
    ///
    /// In `Impulse` mode a hit pushes the body along the ray. In `Thruster`
    /// mode a hit attaches the thruster at the hit point and a miss removes
    /// it.
    pub fn click(&mut self, ray: &Ray, mode: ClickMode) -> Option<RayHit> {
        let hit = self.body.ray_cast(ray, DEFAULT_MAX_RANGE);
        match (mode, hit) {
            (ClickMode::Impulse, Some(hit)) => {
                self.body.apply_impulse(ray.dir() * self.config.impulse_strength, hit.p);
            }
            (ClickMode::Thruster, Some(hit)) => {
                self.thruster = Some(Thruster {
                    local_pos: self.body.point_global_to_local(hit.p),
                    local_dir: self.body.direction_global_to_local(hit.n),
                });
            }
            (ClickMode::Thruster, None) => {
                self.thruster = None;
            }
            (ClickMode::Impulse, None) => (),
        }
        hit
    }
}

fn build_body<R: Rng + ?Sized>(config: &SceneConfig, preset: Preset, rng: &mut R) -> BodyResult<RigidBody> {
    info!("Loading preset {}", preset);
    RigidBodyBuilder::new()
        .load_preset(preset)
        .params(config.body)
        .mass_model(config.mass_model)
        .calculate_mass_and_inertia(rng)
}
