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

use thiserror::Error;

/// Errors that can occur while turning a set of shapes into a rigid body or
/// setting up a scene around it.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BodyError {
    /// The body has no shapes, or sampling produced nothing.
    #[error("rigid body has no shapes")]
    Empty,

    /// The shapes add up to no usable mass.
    #[error("rigid body mass must be positive, got {mass}")]
    NonPositiveMass {
        /// Total mass found.
        mass: f32,
    },

    /// The inertia tensor cannot be inverted, e.g. all mass sits in a
    /// single point.
    #[error("inertia tensor is singular")]
    SingularInertia,

    /// The target volume per sample must be positive.
    #[error("sample volume must be positive, got {volume}")]
    InvalidSampleVolume {
        /// Requested volume per sample.
        volume: f32,
    },

    /// A plane normal has no usable direction.
    #[error("plane normal must be finite and non-zero, got {normal:?}")]
    InvalidPlaneNormal {
        normal: [f32; 3],
    },
}

/// Result type for rigid body and scene construction.
pub type BodyResult<T> = Result<T, BodyError>;
