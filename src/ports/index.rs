//! R-tree index over port coordinates.
//!
//! Built once per run. Queries prune candidate ports with a degree-space
//! envelope around the track, then decide with the exact geodesic buffer test.

#[cfg(feature = "parallel")]
use rayon::prelude::*;
use rstar::{RTree, RTreeObject, AABB};

use crate::geo_utils::{buffer_contains, distance, expand_bounds, line_distance};
use crate::{Bounds, GeoPoint, Port};

/// A port position with its index into the port list.
#[derive(Debug, Clone, Copy)]
pub struct IndexedPort {
    pub idx: usize,
    pub lat: f64,
    pub lng: f64,
}

impl RTreeObject for IndexedPort {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point([self.lng, self.lat])
    }
}

/// Read-only spatial index over a fixed port list.
///
/// Shared by reference across workers; nothing in it is mutated after
/// construction.
#[derive(Debug)]
pub struct PortIndex {
    ports: Vec<Port>,
    tree: RTree<IndexedPort>,
}

impl PortIndex {
    /// Build the index, bulk-loading the R-tree.
    pub fn new(ports: Vec<Port>) -> Self {
        let indexed: Vec<IndexedPort> = ports
            .iter()
            .enumerate()
            .map(|(idx, p)| IndexedPort {
                idx,
                lat: p.latitude,
                lng: p.longitude,
            })
            .collect();

        Self {
            tree: RTree::bulk_load(indexed),
            ports,
        }
    }

    pub fn ports(&self) -> &[Port] {
        &self.ports
    }

    pub fn len(&self) -> usize {
        self.ports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ports.is_empty()
    }

    /// Ports that may lie within `radius_m` of the given bounds.
    ///
    /// A superset of the true answer; callers confirm with an exact test.
    pub fn candidates(&self, bounds: &Bounds, radius_m: f64) -> impl Iterator<Item = &Port> + '_ {
        self.tree
            .locate_in_envelope(&search_envelope(bounds, radius_m))
            .filter_map(move |entry| self.ports.get(entry.idx))
    }

    /// True when `line` passes within `radius_m` of at least one port.
    ///
    /// Stops at the first matching port.
    pub fn any_within(&self, line: &[GeoPoint], radius_m: f64) -> bool {
        let Some(bounds) = Bounds::from_points(line) else {
            return false;
        };
        self.candidates(&bounds, radius_m)
            .any(|port| buffer_contains(line, &port.position(), radius_m))
    }

    /// Closest port within `radius_m` of `line`, with its distance in meters.
    ///
    /// Ties keep the port listed first.
    pub fn nearest_within(&self, line: &[GeoPoint], radius_m: f64) -> Option<(&Port, f64)> {
        let bounds = Bounds::from_points(line)?;
        let mut best: Option<(&Port, f64)> = None;

        let mut candidates: Vec<usize> = self
            .tree
            .locate_in_envelope(&search_envelope(&bounds, radius_m))
            .map(|entry| entry.idx)
            .collect();
        candidates.sort_unstable();

        for port in candidates.into_iter().filter_map(|idx| self.ports.get(idx)) {
            let Some(dist) = line_distance(line, &port.position()) else {
                continue;
            };
            if dist > radius_m {
                continue;
            }
            match best {
                Some((_, best_dist)) if best_dist <= dist => {}
                _ => best = Some((port, dist)),
            }
        }

        best
    }

    /// Number of `positions` within `radius_m` of at least one port
    /// (boundary inclusive).
    pub fn count_within(&self, positions: &[GeoPoint], radius_m: f64) -> usize {
        let near = |p: &&GeoPoint| self.any_within(std::slice::from_ref(*p), radius_m);

        #[cfg(feature = "parallel")]
        let count = positions.par_iter().filter(near).count();

        #[cfg(not(feature = "parallel"))]
        let count = positions.iter().filter(near).count();

        count
    }

    /// Positions within `radius_m` of each port, indexed like [`PortIndex::ports`].
    ///
    /// A position near several ports counts once for each of them.
    pub fn counts_per_port(&self, positions: &[GeoPoint], radius_m: f64) -> Vec<usize> {
        let mut counts = vec![0; self.ports.len()];

        for position in positions {
            let bounds = Bounds {
                min_lat: position.latitude,
                max_lat: position.latitude,
                min_lng: position.longitude,
                max_lng: position.longitude,
            };
            for entry in self.tree.locate_in_envelope(&search_envelope(&bounds, radius_m)) {
                let Some(port) = self.ports.get(entry.idx) else {
                    continue;
                };
                if distance(position, &port.position()) <= radius_m {
                    counts[entry.idx] += 1;
                }
            }
        }

        counts
    }
}

fn search_envelope(bounds: &Bounds, radius_m: f64) -> AABB<[f64; 2]> {
    let search = expand_bounds(bounds, radius_m);
    AABB::from_corners(
        [search.min_lng, search.min_lat],
        [search.max_lng, search.max_lat],
    )
}
