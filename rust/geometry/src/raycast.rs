// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Vertical surface sampling
//!
//! Drops rays straight down (-Y) onto a set of mesh nodes. Because the ray is
//! vertical, intersection reduces to a point-in-triangle test in the XZ plane
//! followed by barycentric interpolation of the height.

use nalgebra::{Point3, Vector3};
use smallvec::SmallVec;
use solarplan_core::MeshNode;

/// Triangles whose XZ projection is smaller than this are vertical walls
const MIN_PROJECTED_AREA: f64 = 1e-12;

/// A surface point found under a probe
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceHit {
    /// World-space hit point
    pub point: Point3<f64>,
    /// Unit face normal, oriented towards +Y (towards the ray origin)
    pub normal: Vector3<f64>,
}

#[derive(Debug, Clone)]
struct WorldTriangle {
    v: [Point3<f64>; 3],
    min_x: f64,
    max_x: f64,
    min_z: f64,
    max_z: f64,
}

impl WorldTriangle {
    fn new(v: [Point3<f64>; 3]) -> Self {
        Self {
            min_x: v[0].x.min(v[1].x).min(v[2].x),
            max_x: v[0].x.max(v[1].x).max(v[2].x),
            min_z: v[0].z.min(v[1].z).min(v[2].z),
            max_z: v[0].z.max(v[1].z).max(v[2].z),
            v,
        }
    }

    fn hit(&self, x: f64, z: f64) -> Option<SurfaceHit> {
        if x < self.min_x || x > self.max_x || z < self.min_z || z > self.max_z {
            return None;
        }
        let [a, b, c] = self.v;

        // Signed doubled area of the XZ projection
        let det = (b.x - a.x) * (c.z - a.z) - (c.x - a.x) * (b.z - a.z);
        if det.abs() < MIN_PROJECTED_AREA {
            return None;
        }
        let w1 = ((x - a.x) * (c.z - a.z) - (c.x - a.x) * (z - a.z)) / det;
        let w2 = ((b.x - a.x) * (z - a.z) - (x - a.x) * (b.z - a.z)) / det;
        let w0 = 1.0 - w1 - w2;
        const EDGE_EPS: f64 = -1e-9;
        if w0 < EDGE_EPS || w1 < EDGE_EPS || w2 < EDGE_EPS {
            return None;
        }

        let y = w0 * a.y + w1 * b.y + w2 * c.y;
        let mut normal = (b - a).cross(&(c - a)).try_normalize(1e-12)?;
        if normal.y < 0.0 {
            normal = -normal;
        }
        Some(SurfaceHit {
            point: Point3::new(x, y, z),
            normal,
        })
    }
}

/// World-space triangle soup of one or more mesh nodes, ready for probing
#[derive(Debug, Clone, Default)]
pub struct SurfaceSampler {
    triangles: Vec<WorldTriangle>,
}

impl SurfaceSampler {
    /// Collect the triangles of `nodes` in world space
    pub fn new<'a, I>(nodes: I) -> Self
    where
        I: IntoIterator<Item = &'a MeshNode>,
    {
        let mut triangles = Vec::new();
        for node in nodes {
            for [i0, i1, i2] in node.mesh.triangles() {
                triangles.push(WorldTriangle::new([
                    node.world_position(i0),
                    node.world_position(i1),
                    node.world_position(i2),
                ]));
            }
        }
        Self { triangles }
    }

    /// True when there is nothing to hit
    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    /// All hits under (x, z), highest first
    pub fn hits_at(&self, x: f64, z: f64) -> SmallVec<[SurfaceHit; 4]> {
        let mut hits: SmallVec<[SurfaceHit; 4]> =
            self.triangles.iter().filter_map(|t| t.hit(x, z)).collect();
        hits.sort_by(|a, b| b.point.y.total_cmp(&a.point.y));
        hits
    }

    /// Topmost surface under (x, z)
    pub fn probe(&self, x: f64, z: f64) -> Option<SurfaceHit> {
        self.hits_at(x, z).into_iter().next()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use solarplan_core::Mesh;

    /// Unit square at height `y`, wound clockwise seen from above so the
    /// geometric normal points down; hits must still report +Y.
    fn square(y: f64) -> MeshNode {
        let mut mesh = Mesh::new();
        for (x, z) in [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)] {
            mesh.add_vertex(Point3::new(x, y, z), Vector3::y());
        }
        mesh.add_triangle(0, 1, 2);
        mesh.add_triangle(0, 2, 3);
        MeshNode::new("square", mesh)
    }

    fn ramp() -> MeshNode {
        // Rises from y=0 at z=0 to y=1 at z=1
        let mut mesh = Mesh::new();
        for (x, y, z) in [(0.0, 0.0, 0.0), (1.0, 0.0, 0.0), (1.0, 1.0, 1.0), (0.0, 1.0, 1.0)] {
            mesh.add_vertex(Point3::new(x, y, z), Vector3::y());
        }
        mesh.add_triangle(0, 2, 1);
        mesh.add_triangle(0, 3, 2);
        MeshNode::new("ramp", mesh)
    }

    #[test]
    fn test_probe_flat_square() {
        let sampler = SurfaceSampler::new(&[square(2.0)]);
        let hit = sampler.probe(0.25, 0.75).expect("should hit");
        assert_relative_eq!(hit.point.y, 2.0);
        assert_relative_eq!(hit.normal, Vector3::y(), epsilon = 1e-12);
    }

    #[test]
    fn test_probe_misses_outside() {
        let sampler = SurfaceSampler::new(&[square(2.0)]);
        assert!(sampler.probe(1.5, 0.5).is_none());
    }

    #[test]
    fn test_highest_surface_wins() {
        let sampler = SurfaceSampler::new(&[square(1.0), square(3.0)]);
        let hits = sampler.hits_at(0.5, 0.5);
        assert!(hits.len() >= 2);
        assert_relative_eq!(hits[0].point.y, 3.0);
    }

    #[test]
    fn test_sloped_surface_interpolates_height() {
        let sampler = SurfaceSampler::new(&[ramp()]);
        let hit = sampler.probe(0.5, 0.25).unwrap();
        assert_relative_eq!(hit.point.y, 0.25, epsilon = 1e-12);
        let expected = Vector3::new(0.0, 1.0, -1.0).normalize();
        assert_relative_eq!(hit.normal, expected, epsilon = 1e-12);
    }

    #[test]
    fn test_vertical_faces_are_ignored() {
        let mut mesh = Mesh::new();
        for (x, y) in [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0)] {
            mesh.add_vertex(Point3::new(x, y, 0.0), Vector3::z());
        }
        mesh.add_triangle(0, 1, 2);
        let sampler = SurfaceSampler::new(&[MeshNode::new("wall", mesh)]);
        assert!(!sampler.is_empty());
        assert!(sampler.probe(0.5, 0.0).is_none());
    }
}
