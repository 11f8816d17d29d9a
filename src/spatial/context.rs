/* Persistence-driven synthesis of branching point trees.
Copyright (C) 2026  tmdtree contributors

This program is free software: you can redistribute it and/or modify
it under the terms of the GNU General Public License as published by
the Free Software Foundation, either version 3 of the License, or
(at your option) any later version.

This program is distributed in the hope that it will be useful,
but WITHOUT ANY WARRANTY; without even the implied warranty of
MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
GNU General Public License for more details.

You should have received a copy of the GNU General Public License
along with this program.  If not, see <https://www.gnu.org/licenses/>.
*/

//! Shared state of space colonization growth
use super::point_cloud::PointCloud;
use crate::coords::Point;
use crate::error::{GrowthError, Result};
use crate::util_funcs::logit;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

/// Attraction strength as a function of the relative distance to a target.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Field {
    /// `slope * logit(x) + intercept`
    Logit { slope: f64, intercept: f64 },
}

impl Default for Field {
    fn default() -> Self {
        Self::Logit {
            slope: 1.0,
            intercept: 0.0,
        }
    }
}

impl Field {
    pub fn eval(&self, x: f64) -> f64 {
        match *self {
            Self::Logit { slope, intercept } => slope * logit(x) + intercept,
        }
    }
}

/// Endfoot targets, deactivated once an endfoot has been sent to them.
#[derive(Clone, Debug, Default)]
pub struct EndfeetTargets {
    points: Vec<Point>,
    active: Vec<bool>,
}

impl EndfeetTargets {
    pub fn new(points: Vec<Point>) -> Self {
        Self {
            active: vec![true; points.len()],
            points,
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn point(&self, id: usize) -> Result<Point> {
        self.points.get(id).copied().ok_or(GrowthError::UnknownTarget(id))
    }

    pub fn is_active(&self, id: usize) -> Result<bool> {
        self.active.get(id).copied().ok_or(GrowthError::UnknownTarget(id))
    }

    pub fn deactivate(&mut self, id: usize) -> Result<()> {
        let a = self.active.get_mut(id).ok_or(GrowthError::UnknownTarget(id))?;
        *a = false;
        Ok(())
    }

    pub fn active_count(&self) -> usize {
        self.active.iter().filter(|a| **a).count()
    }
}

/// Called with a candidate point and the segment length, returns true if growth there collides.
#[derive(Clone)]
pub struct CollisionHandle(Arc<dyn Fn(Point, f64) -> bool + Send + Sync>);

impl CollisionHandle {
    pub fn new(f: impl Fn(Point, f64) -> bool + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }
}

impl std::fmt::Debug for CollisionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("CollisionHandle(..)")
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SeedParameters {
    pub point_cloud: Vec<Point>,
    pub kill_distance_factor: f64,
    pub influence_distance_factor: f64,
    /// grid cell size of the point cloud, derived from the cloud extent when absent
    #[serde(default)]
    pub cell_size: Option<f64>,
}

/// Serializable part of the context.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ContextParameters {
    pub space_colonization: SeedParameters,
    #[serde(default)]
    pub endfeet_targets: Option<Vec<Point>>,
    #[serde(default)]
    pub field: Field,
}

impl ContextParameters {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Space shared by all spatially grown trees of one cell.
#[derive(Clone, Debug)]
pub struct SpaceColonizationContext {
    pub point_cloud: PointCloud,
    /// every point grown so far
    pub morphology_points: Vec<Point>,
    pub endfeet_targets: Option<EndfeetTargets>,
    pub field: Field,
    kill_distance_factor: f64,
    influence_distance_factor: f64,
    collision_handle: Option<CollisionHandle>,
}

impl SpaceColonizationContext {
    pub fn new(params: ContextParameters, collision_handle: Option<CollisionHandle>) -> Self {
        let seeds = params.space_colonization;
        let point_cloud = match seeds.cell_size {
            Some(size) => PointCloud::with_cell_size(seeds.point_cloud, size),
            None => PointCloud::new(seeds.point_cloud),
        };
        if params.endfeet_targets.is_none() {
            info!("no endfeet targets provided");
        }
        if collision_handle.is_none() {
            info!("no collision handle provided");
        }
        Self {
            point_cloud,
            morphology_points: vec![],
            endfeet_targets: params.endfeet_targets.map(EndfeetTargets::new),
            field: params.field,
            kill_distance_factor: seeds.kill_distance_factor,
            influence_distance_factor: seeds.influence_distance_factor,
            collision_handle,
        }
    }

    #[inline]
    pub fn kill_distance(&self, segment_length: f64) -> f64 {
        self.kill_distance_factor * segment_length
    }

    #[inline]
    pub fn influence_distance(&self, segment_length: f64) -> f64 {
        self.influence_distance_factor * segment_length
    }

    pub fn collides(&self, point: Point, segment_length: f64) -> bool {
        self.collision_handle
            .as_ref()
            .is_some_and(|h| (h.0)(point, segment_length))
    }

    pub fn target_point(&self, id: usize) -> Result<Point> {
        self.endfeet_targets
            .as_ref()
            .ok_or(GrowthError::UnknownTarget(id))?
            .point(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_and_build() {
        let params = ContextParameters::from_json(
            r#"{
                "space_colonization": {
                    "point_cloud": [[0, 0, 0], [1, 1, 1]],
                    "kill_distance_factor": 2.0,
                    "influence_distance_factor": 10.0
                },
                "endfeet_targets": [[5, 0, 0]],
                "field": {"type": "logit", "slope": 2.0, "intercept": 0.5}
            }"#,
        )
        .unwrap();
        let ctx = SpaceColonizationContext::new(
            params,
            Some(CollisionHandle::new(|p, _| p[2] < 0.0)),
        );
        assert_eq!(ctx.point_cloud.len(), 2);
        assert_eq!(ctx.kill_distance(0.5), 1.0);
        assert_eq!(ctx.influence_distance(0.5), 5.0);
        assert!(ctx.collides([0.0, 0.0, -1.0], 1.0));
        assert!(!ctx.collides([0.0, 0.0, 1.0], 1.0));
        assert_eq!(ctx.target_point(0).unwrap(), [5.0, 0.0, 0.0]);
        assert!(matches!(ctx.target_point(1), Err(GrowthError::UnknownTarget(1))));
        assert_eq!(ctx.field.eval(0.5), 0.5);
    }

    #[test]
    fn targets() {
        let mut t = EndfeetTargets::new(vec![[1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]);
        assert_eq!(t.active_count(), 2);
        t.deactivate(1).unwrap();
        assert!(!t.is_active(1).unwrap());
        assert!(t.is_active(0).unwrap());
        assert!(t.deactivate(2).is_err());
        assert_eq!(t.len(), 2);
    }
}
