// Copyright © 2018 Cormac O'Brien
//
// Permission is hereby granted, free of charge, to any person obtaining a copy of this software
// and associated documentation files (the "Software"), to deal in the Software without
// restriction, including without limitation the rights to use, copy, modify, merge, publish,
// distribute, sublicense, and/or sell copies of the Software, and to permit persons to whom the
// Software is furnished to do so, subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in all copies or
// substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR IMPLIED, INCLUDING
// BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND
// NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM,
// DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
// OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

//! Interior generation from triangle soups.
//!
//! A [`DifBuilder`] collects textured triangles, then [`DifBuilder::build`] turns them into a
//! [`Dif`] holding one interior:
//!
//! 1. every triangle becomes a polygon with its own splitting plane;
//! 2. the polygons are partitioned into a BSP tree (see [`bsp`]);
//! 3. the leaves are flattened, front first, into the surface list, so that each leaf owns a
//!    contiguous run of surfaces;
//! 4. the tree itself, fixed-size batches of surfaces as convex hulls, a single zone and the
//!    coordinate bins are derived from that list.
//!
//! Planes, points and hull emit strings are shared across the whole interior: geometrically
//! identical values are written once and referred to by index.

pub mod bsp;
mod export;
mod hull;
pub mod texgen;

use crate::{
    common::math::Hyperplane,
    dif::{error::DifError, Dif, VehicleCollision},
};

use self::{
    bsp::{BspTree, Polygon},
    export::InteriorExporter,
};

use cgmath::{InnerSpace, Vector2, Vector3};

/// Number of polygons grouped into each convex hull.
pub const DEFAULT_HULL_BATCH_SIZE: usize = 8;

/// Tree depth past which fast splitting gives way to scored splitting.
pub const DEFAULT_FAST_DEPTH_LIMIT: usize = 48;

/// How the BSP builder chooses splitting planes.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum SplitMode {
    /// Try every unused polygon's plane and keep the one that best balances the tree.
    Quality,

    /// Split through the middle of the bounding box without scoring. Much cheaper on large
    /// meshes, but the tree is worse.
    Fast,
}

#[derive(Clone, Debug, PartialEq)]
pub struct BuildConfig {
    /// Reverse the winding and normal of every triangle.
    pub flip_normals: bool,
    pub split_mode: SplitMode,
    /// Depth after which `SplitMode::Fast` falls back to `SplitMode::Quality`.
    pub fast_depth_limit: usize,
    pub hull_batch_size: usize,
    /// Uniform scale applied to every vertex position.
    pub scale: f32,
}

impl Default for BuildConfig {
    fn default() -> Self {
        BuildConfig {
            flip_normals: false,
            split_mode: SplitMode::Quality,
            fast_depth_limit: DEFAULT_FAST_DEPTH_LIMIT,
            hull_batch_size: DEFAULT_HULL_BATCH_SIZE,
            scale: 1.0,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Vertex {
    pub position: Vector3<f32>,
    pub normal: Vector3<f32>,
    pub uv: Vector2<f32>,
}

impl Vertex {
    pub fn new(position: Vector3<f32>, normal: Vector3<f32>, uv: Vector2<f32>) -> Vertex {
        Vertex {
            position,
            normal,
            uv,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Triangle {
    pub vertices: [Vertex; 3],
}

impl Triangle {
    pub fn new(a: Vertex, b: Vertex, c: Vertex) -> Triangle {
        Triangle {
            vertices: [a, b, c],
        }
    }

    /// The winding-derived normal, facing the side the triangle is wound clockwise from.
    ///
    /// Zero for triangles without area.
    pub fn face_normal(&self) -> Vector3<f32> {
        let [a, b, c] = [
            self.vertices[0].position,
            self.vertices[1].position,
            self.vertices[2].position,
        ];
        let n = (a - b).cross(c - b);
        if n.magnitude2() == 0.0 {
            n
        } else {
            n.normalize()
        }
    }
}

/// Collects triangles and their materials for a build.
#[derive(Clone, Debug, Default)]
pub struct DifBuilder {
    materials: Vec<String>,
    triangles: Vec<(Triangle, u32)>,
}

impl DifBuilder {
    pub fn new() -> DifBuilder {
        DifBuilder::default()
    }

    /// Adds a triangle drawn with the named material and returns the material's index.
    ///
    /// Materials are numbered in the order they are first seen.
    pub fn add_triangle<S>(&mut self, triangle: Triangle, material: S) -> u32
    where
        S: AsRef<str>,
    {
        let material = material.as_ref();
        let index = match self.materials.iter().position(|m| m == material) {
            Some(i) => i,
            None => {
                self.materials.push(material.to_owned());
                self.materials.len() - 1
            }
        };

        self.triangles.push((triangle, index as u32));
        index as u32
    }

    pub fn materials(&self) -> &[String] {
        &self.materials
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// The triangles added so far, with their material names.
    pub fn triangles<'a>(&'a self) -> impl Iterator<Item = (&'a Triangle, &'a str)> + 'a {
        self.triangles
            .iter()
            .map(move |(t, m)| (t, self.materials[*m as usize].as_str()))
    }

    /// Runs the full pipeline and returns a container with a single interior.
    ///
    /// Triangles without area are dropped with a warning, since they have no plane. The only
    /// failures are index tables outgrowing the width of their on-disk fields.
    pub fn build(&self, config: &BuildConfig) -> Result<Dif, DifError> {
        let polygons = self.polygons(config);
        debug!(
            "building interior from {} of {} triangles, {} materials",
            polygons.len(),
            self.triangles.len(),
            self.materials.len()
        );

        let tree = BspTree::build(&polygons, config);
        let order = tree.gather();

        let mut exporter = InteriorExporter::new(&polygons, &self.materials);
        exporter.export_surfaces(&order)?;
        exporter.export_bsp(&tree)?;
        exporter.export_hulls(&order, config.hull_batch_size)?;
        exporter.export_zone()?;
        exporter.export_bounds();
        exporter.export_coord_bins()?;
        let interior = exporter.finish();

        debug!(
            "interior: {} surfaces, {} planes, {} points, {} nodes, {} hulls",
            interior.surfaces.len(),
            interior.planes.len(),
            interior.points.len(),
            interior.bsp_nodes.len(),
            interior.convex_hulls.len()
        );

        Ok(Dif {
            interiors: vec![interior],
            vehicle_collision: Some(VehicleCollision::default()),
            ..Default::default()
        })
    }

    fn polygons(&self, config: &BuildConfig) -> Vec<Polygon> {
        let mut out = Vec::with_capacity(self.triangles.len());

        for (i, (triangle, material)) in self.triangles.iter().enumerate() {
            let mut tri = *triangle;
            for v in tri.vertices.iter_mut() {
                v.position *= config.scale;
            }

            let face_normal = tri.face_normal();
            if face_normal.magnitude2() == 0.0 {
                warn!("dropping triangle {} with no area", i);
                continue;
            }

            let mut normal = tri.vertices[0].normal;
            if normal.magnitude2() == 0.0 {
                warn!("triangle {} has no normal, using its face normal", i);
                normal = face_normal;
            } else {
                normal = normal.normalize();
            }

            if config.flip_normals {
                tri.vertices.reverse();
                normal = -normal;
            }

            let v = &tri.vertices;
            out.push(Polygon {
                points: [v[0].position, v[1].position, v[2].position],
                uvs: [v[0].uv, v[1].uv, v[2].uv],
                material: *material,
                plane: Hyperplane::through_point(normal, v[0].position),
            });
        }

        out
    }
}

#[cfg(test)]
pub(crate) mod test {
    use super::*;

    use std::collections::HashSet;

    use crate::dif::{
        interior::{BspIndex, SurfaceFlags},
        io::Writable,
        version::Version,
    };

    use cgmath::Zero;

    /// Twelve triangles forming the unit cube, wound clockwise seen from outside.
    pub(crate) fn cube() -> Vec<Triangle> {
        let corner = |i: usize| {
            Vector3::new(
                (i & 1) as f32,
                ((i >> 1) & 1) as f32,
                ((i >> 2) & 1) as f32,
            )
        };

        // counter-clockwise from outside, reversed below
        let faces: [([usize; 4], Vector3<f32>); 6] = [
            ([0, 2, 3, 1], -Vector3::unit_z()),
            ([4, 5, 7, 6], Vector3::unit_z()),
            ([0, 1, 5, 4], -Vector3::unit_y()),
            ([2, 6, 7, 3], Vector3::unit_y()),
            ([0, 4, 6, 2], -Vector3::unit_x()),
            ([1, 3, 7, 5], Vector3::unit_x()),
        ];

        let uvs = [
            Vector2::new(0.0, 0.0),
            Vector2::new(1.0, 0.0),
            Vector2::new(1.0, 1.0),
            Vector2::new(0.0, 1.0),
        ];

        let mut out = Vec::new();
        for (quad, normal) in faces.iter() {
            for tri in [[0, 1, 2], [0, 2, 3]].iter() {
                let v = |k: usize| Vertex::new(corner(quad[tri[k]]), *normal, uvs[tri[k]]);
                out.push(Triangle::new(v(2), v(1), v(0)));
            }
        }
        out
    }

    fn cube_builder() -> DifBuilder {
        let mut builder = DifBuilder::new();
        for tri in cube() {
            builder.add_triangle(tri, "default");
        }
        builder
    }

    #[test]
    fn test_materials_first_seen_order() {
        let mut builder = DifBuilder::new();
        let tris = cube();
        assert_eq!(builder.add_triangle(tris[0], "stone"), 0);
        assert_eq!(builder.add_triangle(tris[1], "grass"), 1);
        assert_eq!(builder.add_triangle(tris[2], "stone"), 0);
        assert_eq!(builder.materials(), &["stone".to_owned(), "grass".to_owned()]);
        assert_eq!(builder.triangle_count(), 3);
    }

    #[test]
    fn test_cube_face_normals_point_outward() {
        for tri in cube() {
            assert_eq!(tri.face_normal(), tri.vertices[0].normal);
        }
    }

    #[test]
    fn test_minimal_cube() {
        let dif = cube_builder().build(&BuildConfig::default()).unwrap();
        assert_eq!(dif.interiors.len(), 1);

        let it = &dif.interiors[0];
        assert_eq!(it.planes.len(), 6);
        assert_eq!(it.normals.len(), 6);
        assert_eq!(it.points.len(), 8);
        assert_eq!(it.point_visibility, vec![0xFF; 8]);
        assert_eq!(it.material_names, vec!["default".to_owned()]);
        assert_eq!(it.surfaces.len(), 12);
        assert_eq!(it.tex_gen_eqs.len(), 12);
        assert_eq!(it.normal_lmap_indices, vec![0; 12]);

        for s in it.surfaces.iter() {
            assert_eq!(s.flags(), SurfaceFlags::OUTSIDE_VISIBLE);
            assert_eq!(s.fan_mask, 15);
            assert_eq!(s.winding_count, 3);
        }

        assert!(!it.convex_hulls.is_empty());
        let mut covered = HashSet::new();
        for hull in it.convex_hulls.iter() {
            let start = hull.surface_start as usize;
            for &s in &it.hull_surface_indices[start..start + hull.surface_count as usize] {
                covered.insert(s);
            }
        }
        assert_eq!(covered.len(), 12);

        assert_eq!(it.zones.len(), 1);
        assert_eq!(it.zones[0].surface_count, 12);
        assert_eq!(it.zone_surfaces, (0..12).collect::<Vec<u16>>());
        assert_eq!(it.min_pixels, 250);
        assert_eq!(it.bounding_box.min, Vector3::zero());
        assert_eq!(it.bounding_box.max, Vector3::new(1.0, 1.0, 1.0));
        assert_eq!(it.bounding_sphere.origin, Vector3::new(0.5, 0.5, 0.5));
    }

    #[test]
    fn test_cube_surface_planes_face_outward() {
        let dif = cube_builder().build(&BuildConfig::default()).unwrap();
        let it = &dif.interiors[0];
        let center = Vector3::new(0.5, 0.5, 0.5);
        for surface in it.surfaces.iter() {
            let plane = it.surface_plane(surface).unwrap();
            let centroid = surface
                .winding()
                .map(|i| it.points[it.indices[i] as usize])
                .fold(Vector3::zero(), |acc, p| acc + p)
                / 3.0;
            assert!(plane.distance(center) < 0.0);
            assert!(plane.distance(centroid).abs() < 1e-6);
        }
    }

    #[test]
    fn test_cube_leaves_cover_every_surface_once() {
        let dif = cube_builder().build(&BuildConfig::default()).unwrap();
        let it = &dif.interiors[0];

        let mut seen = vec![0; it.surfaces.len()];
        for leaf in it.bsp_solid_leaves.iter() {
            let start = leaf.surface_index as usize;
            for &s in &it.solid_leaf_surfaces[start..start + leaf.surface_count as usize] {
                seen[s as usize] += 1;
            }
        }
        assert_eq!(seen, vec![1; 12]);

        for node in it.bsp_nodes.iter() {
            for child in [node.front, node.back].iter() {
                if child.leaf {
                    assert!(child.solid);
                    assert!((child.index as usize) < it.bsp_solid_leaves.len());
                } else {
                    assert!((child.index as usize) < it.bsp_nodes.len());
                }
            }
            assert_ne!(node.front, BspIndex::empty_leaf(0));
        }
    }

    #[test]
    fn test_flip_reverses_surfaces() {
        let config = BuildConfig {
            flip_normals: true,
            ..Default::default()
        };
        let dif = cube_builder().build(&config).unwrap();
        let it = &dif.interiors[0];
        let center = Vector3::new(0.5, 0.5, 0.5);
        for surface in it.surfaces.iter() {
            let plane = it.surface_plane(surface).unwrap();
            assert!(plane.distance(center) > 0.0);
        }
    }

    #[test]
    fn test_scale_applies_to_positions() {
        let config = BuildConfig {
            scale: 2.0,
            ..Default::default()
        };
        let dif = cube_builder().build(&config).unwrap();
        assert_eq!(
            dif.interiors[0].bounding_box.max,
            Vector3::new(2.0, 2.0, 2.0)
        );
    }

    #[test]
    fn test_degenerate_triangle_dropped() {
        let mut builder = cube_builder();
        let p = Vertex::new(Vector3::zero(), Vector3::zero(), Vector2::zero());
        builder.add_triangle(Triangle::new(p, p, p), "default");
        let dif = builder.build(&BuildConfig::default()).unwrap();
        assert_eq!(dif.interiors[0].surfaces.len(), 12);
    }

    #[test]
    fn test_missing_normals_use_face_normal() {
        let mut builder = DifBuilder::new();
        for mut tri in cube() {
            for v in tri.vertices.iter_mut() {
                v.normal = Vector3::zero();
            }
            builder.add_triangle(tri, "default");
        }
        let dif = builder.build(&BuildConfig::default()).unwrap();
        assert_eq!(dif.interiors[0].planes.len(), 6);
    }

    #[test]
    fn test_fast_build_round_trips() {
        let config = BuildConfig {
            split_mode: SplitMode::Fast,
            ..Default::default()
        };
        let dif = cube_builder().build(&config).unwrap();

        let version = Version::default();
        let mut first = Vec::new();
        dif.write(&mut first, &version).unwrap();

        let (back, read_version) = Dif::from_reader(&mut std::io::Cursor::new(&first)).unwrap();
        let mut second = Vec::new();
        back.write(&mut second, &read_version).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_build_carries_empty_vehicle_collision() {
        let dif = cube_builder().build(&BuildConfig::default()).unwrap();
        assert_eq!(dif.vehicle_collision, Some(VehicleCollision::default()));

        let (back, _) = Dif::from_reader(&mut std::io::Cursor::new(dif_bytes(&dif))).unwrap();
        assert_eq!(back.vehicle_collision, Some(VehicleCollision::default()));
    }

    fn dif_bytes(dif: &Dif) -> Vec<u8> {
        let mut out = Vec::new();
        dif.write(&mut out, &Version::default()).unwrap();
        out
    }
}
