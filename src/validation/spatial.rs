//! Spatial containment collaborator.
//!
//! Regions are addressed by identifier; coordinates use the horizontal
//! `(x, z)` plane.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised by a spatial collaborator.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SpatialError {
    #[error("unknown region: '{0}'")]
    UnknownRegion(String),

    #[error("spatial backend error: {0}")]
    Backend(String),
}

/// Answers point-in-region and region-in-region questions.
#[async_trait]
pub trait SpatialContainment: Send + Sync {
    /// Is `(x, z)` inside the region? Boundary points count only when
    /// `allow_boundary` is set.
    async fn point_in_region(
        &self,
        region_id: &str,
        x: f64,
        z: f64,
        allow_boundary: bool,
    ) -> Result<bool, SpatialError>;

    /// Does the child region lie inside the parent? With `require_full`
    /// unset, any overlap is enough.
    async fn region_contained(
        &self,
        parent_region_id: &str,
        child_region_id: &str,
        require_full: bool,
    ) -> Result<bool, SpatialError>;
}

/// Axis-aligned rectangular region on the `(x, z)` plane.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Region {
    pub id: String,
    pub min_x: f64,
    pub min_z: f64,
    pub max_x: f64,
    pub max_z: f64,
}

impl Region {
    /// Build a region from two opposite corners in any order.
    pub fn new(id: impl Into<String>, a: (f64, f64), b: (f64, f64)) -> Self {
        Self {
            id: id.into(),
            min_x: a.0.min(b.0),
            min_z: a.1.min(b.1),
            max_x: a.0.max(b.0),
            max_z: a.1.max(b.1),
        }
    }

    pub fn contains_point(&self, x: f64, z: f64, allow_boundary: bool) -> bool {
        if allow_boundary {
            self.min_x <= x && x <= self.max_x && self.min_z <= z && z <= self.max_z
        } else {
            self.min_x < x && x < self.max_x && self.min_z < z && z < self.max_z
        }
    }

    pub fn contains_region(&self, other: &Region) -> bool {
        self.min_x <= other.min_x
            && other.max_x <= self.max_x
            && self.min_z <= other.min_z
            && other.max_z <= self.max_z
    }

    pub fn overlaps(&self, other: &Region) -> bool {
        self.min_x <= other.max_x
            && other.min_x <= self.max_x
            && self.min_z <= other.max_z
            && other.min_z <= self.max_z
    }
}

/// Spatial collaborator over rectangles held in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRegions {
    regions: HashMap<String, Region>,
}

impl InMemoryRegions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_region(mut self, region: Region) -> Self {
        self.insert(region);
        self
    }

    pub fn insert(&mut self, region: Region) {
        self.regions.insert(region.id.clone(), region);
    }

    pub fn region(&self, id: &str) -> Result<&Region, SpatialError> {
        self.regions
            .get(id)
            .ok_or_else(|| SpatialError::UnknownRegion(id.to_string()))
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}

impl FromIterator<Region> for InMemoryRegions {
    fn from_iter<I: IntoIterator<Item = Region>>(iter: I) -> Self {
        let mut regions = Self::new();
        for region in iter {
            regions.insert(region);
        }
        regions
    }
}

#[async_trait]
impl SpatialContainment for InMemoryRegions {
    async fn point_in_region(
        &self,
        region_id: &str,
        x: f64,
        z: f64,
        allow_boundary: bool,
    ) -> Result<bool, SpatialError> {
        Ok(self.region(region_id)?.contains_point(x, z, allow_boundary))
    }

    async fn region_contained(
        &self,
        parent_region_id: &str,
        child_region_id: &str,
        require_full: bool,
    ) -> Result<bool, SpatialError> {
        let parent = self.region(parent_region_id)?;
        let child = self.region(child_region_id)?;
        Ok(if require_full {
            parent.contains_region(child)
        } else {
            parent.overlaps(child)
        })
    }
}
