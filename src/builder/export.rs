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

//! Flattening of a partitioned polygon set into interior tables.

use std::collections::HashMap;

use crate::{
    builder::{
        bsp::{BspTree, BspTreeNode, NodeId, Polygon, PolygonId},
        hull::{self, HullPolygon},
        texgen,
    },
    dif::{
        error::DifError,
        interior::{
            BspIndex, BspNode, BspSolidLeaf, ConvexHull, CoordBin, Interior, Plane, Surface,
            SurfaceFlags, Zone, COORD_BIN_DIM,
        },
        io::{check_index, narrow},
        types::{BoxF, ColorI, SphereF},
    },
};

use cgmath::{InnerSpace, Vector3};

const DEFAULT_MIN_PIXELS: u32 = 250;

/// Fan mask of a single triangle.
const TRIANGLE_FAN_MASK: u32 = 0b1111;

/// Dedup key of a float: its bit pattern, with both zeroes mapped to the same key.
fn key(v: f32) -> u32 {
    (v + 0.0).to_bits()
}

/// Writes polygons into a fresh interior, sharing planes, points, materials and emit strings.
///
/// The export steps are called in order: surfaces first, since the later steps refer to the
/// surface and plane of each polygon.
pub(crate) struct InteriorExporter<'a> {
    polygons: &'a [Polygon],
    materials: &'a [String],
    interior: Interior,

    planes: HashMap<[u32; 4], u16>,
    points: HashMap<[u32; 3], u32>,
    textures: HashMap<u32, u16>,
    emit_strings: HashMap<Vec<u8>, u32>,

    // per polygon, filled by export_surfaces
    surface_of: Vec<u32>,
    plane_of: Vec<u16>,
}

impl<'a> InteriorExporter<'a> {
    pub fn new(polygons: &'a [Polygon], materials: &'a [String]) -> InteriorExporter<'a> {
        InteriorExporter {
            polygons,
            materials,
            interior: Interior {
                min_pixels: DEFAULT_MIN_PIXELS,
                base_ambient_color: ColorI::new(1, 1, 1, 1),
                alarm_ambient_color: ColorI::new(1, 1, 1, 1),
                ..Default::default()
            },
            planes: HashMap::new(),
            points: HashMap::new(),
            textures: HashMap::new(),
            emit_strings: HashMap::new(),
            surface_of: vec![0; polygons.len()],
            plane_of: vec![0; polygons.len()],
        }
    }

    /// Returns the index of the plane `normal · p + d = 0`, adding it if it is new.
    fn export_plane(&mut self, normal: Vector3<f32>, d: f32) -> Result<u16, DifError> {
        let k = [key(normal.x), key(normal.y), key(normal.z), key(d)];
        if let Some(&index) = self.planes.get(&k) {
            return Ok(index);
        }

        let it = &mut self.interior;
        let normal_index = narrow(it.normals.len() as u64, "normal index")?;
        let index = narrow(it.planes.len() as u64, "plane index")?;
        it.normals.push(normal);
        it.normal2s.push(normal);
        it.planes.push(Plane {
            normal_index,
            plane_distance: d,
        });

        self.planes.insert(k, index);
        Ok(index)
    }

    /// The plane a surface is drawn on is derived from its winding, not from the vertex normals
    /// used while partitioning.
    fn export_surface_plane(&mut self, polygon: &Polygon) -> Result<u16, DifError> {
        let [a, b, c] = polygon.points;
        let normal = (a - b).cross(c - b).normalize();
        self.export_plane(normal, -b.dot(normal))
    }

    fn export_point(&mut self, p: Vector3<f32>) -> Result<u32, DifError> {
        let k = [key(p.x), key(p.y), key(p.z)];
        if let Some(&index) = self.points.get(&k) {
            return Ok(index);
        }

        let it = &mut self.interior;
        let index = narrow(it.points.len() as u64, "point index")?;
        it.points.push(p);
        it.point_visibility.push(0xFF);

        self.points.insert(k, index);
        Ok(index)
    }

    fn export_texture(&mut self, material: u32) -> Result<u16, DifError> {
        if let Some(&index) = self.textures.get(&material) {
            return Ok(index);
        }

        check_index(material, self.materials.len(), "material")?;
        let it = &mut self.interior;
        let index = narrow(it.material_names.len() as u64, "material index")?;
        it.material_names
            .push(self.materials[material as usize].clone());

        self.textures.insert(material, index);
        Ok(index)
    }

    fn export_emit_string(&mut self, s: Vec<u8>) -> Result<u32, DifError> {
        if let Some(&offset) = self.emit_strings.get(&s) {
            return Ok(offset);
        }

        let chars = &mut self.interior.convex_hull_emit_string_characters;
        let offset = narrow(chars.len() as u64, "emit string offset")?;
        chars.extend_from_slice(&s);

        self.emit_strings.insert(s, offset);
        Ok(offset)
    }

    /// Writes one surface per polygon, in the given order.
    pub fn export_surfaces(&mut self, order: &[PolygonId]) -> Result<(), DifError> {
        let polygons = self.polygons;
        for &id in order.iter() {
            let polygon = &polygons[id];
            let plane_index = self.export_surface_plane(polygon)?;
            let texture_index = self.export_texture(polygon.material)?;

            let winding_start = narrow(self.interior.indices.len() as u64, "winding start")?;
            for p in polygon.points.iter() {
                let index = self.export_point(*p)?;
                self.interior.indices.push(index);
            }

            let it = &mut self.interior;
            let tex_gen_index = narrow(it.tex_gen_eqs.len() as u64, "texgen index")?;
            it.tex_gen_eqs
                .push(texgen::tex_gen_from_points(&polygon.points, &polygon.uvs));

            let mut surface = Surface {
                winding_start,
                winding_count: 3,
                plane_index,
                plane_flipped: false,
                texture_index,
                tex_gen_index,
                fan_mask: TRIANGLE_FAN_MASK,
                ..Default::default()
            };
            surface.set_flags(SurfaceFlags::OUTSIDE_VISIBLE);

            self.surface_of[id] = narrow(it.surfaces.len() as u64, "surface index")?;
            self.plane_of[id] = plane_index;
            it.surfaces.push(surface);
            it.normal_lmap_indices.push(0);
            it.alarm_lmap_indices.push(0);
        }

        trace!(
            "exported {} surfaces: {} planes, {} points, {} materials",
            self.interior.surfaces.len(),
            self.interior.planes.len(),
            self.interior.points.len(),
            self.interior.material_names.len()
        );
        Ok(())
    }

    /// Writes the tree in pre-order. Every leaf becomes a solid leaf, even an empty one.
    pub fn export_bsp(&mut self, tree: &BspTree) -> Result<(), DifError> {
        let mut exported: HashMap<NodeId, BspIndex> = HashMap::new();
        let mut splits = Vec::new();

        for (id, node) in tree.pre_order() {
            match node {
                BspTreeNode::Leaf { polygons } => {
                    let it = &mut self.interior;
                    let leaf = narrow(it.bsp_solid_leaves.len() as u64, "solid leaf index")?;
                    it.bsp_solid_leaves.push(BspSolidLeaf {
                        surface_index: narrow(
                            it.solid_leaf_surfaces.len() as u64,
                            "solid leaf surface start",
                        )?,
                        surface_count: narrow(polygons.len() as u64, "solid leaf surface count")?,
                    });
                    for &p in polygons.iter() {
                        it.solid_leaf_surfaces.push(self.surface_of[p]);
                    }
                    exported.insert(id, BspIndex::solid_leaf(leaf));
                }

                BspTreeNode::Split { plane, front, back } => {
                    let plane_index = self.export_plane(plane.normal(), -plane.dist())?;
                    let it = &mut self.interior;
                    let index = narrow(it.bsp_nodes.len() as u64, "BSP node index")?;
                    it.bsp_nodes.push(BspNode {
                        plane_index,
                        ..Default::default()
                    });
                    splits.push((index, *front, *back));
                    exported.insert(id, BspIndex::node(index));
                }
            }
        }

        // children come after their parent in pre-order, so they are only known now
        for (index, front, back) in splits {
            let node = &mut self.interior.bsp_nodes[index as usize];
            node.front = exported[&front];
            node.back = exported[&back];
        }

        Ok(())
    }

    /// Groups the polygons, in the given order, into hulls of at most `batch_size` polygons.
    pub fn export_hulls(&mut self, order: &[PolygonId], batch_size: usize) -> Result<(), DifError> {
        let polygons = self.polygons;

        for batch in order.chunks(batch_size.max(1)) {
            let mut convex_hull = {
                let it = &self.interior;
                ConvexHull {
                    hull_start: narrow(it.hull_indices.len() as u64, "hull start")?,
                    hull_count: narrow(3 * batch.len() as u64, "hull point count")?,
                    surface_start: narrow(it.hull_surface_indices.len() as u64, "hull surfaces")?,
                    surface_count: narrow(batch.len() as u64, "hull surface count")?,
                    plane_start: narrow(it.hull_plane_indices.len() as u64, "hull planes")?,
                    poly_list_plane_start: narrow(
                        it.poly_list_plane_indices.len() as u64,
                        "poly list planes",
                    )?,
                    poly_list_point_start: narrow(
                        it.poly_list_point_indices.len() as u64,
                        "poly list points",
                    )?,
                    poly_list_string_start: 0,
                    ..Default::default()
                }
            };

            let mut hull_points = Vec::with_capacity(3 * batch.len());
            let mut hull_polygons = Vec::with_capacity(batch.len());
            for &id in batch.iter() {
                let plane = self.plane_of[id];
                let mut points = Vec::with_capacity(3);
                for p in polygons[id].points.iter() {
                    let index = self.export_point(*p)?;
                    self.interior.hull_indices.push(index);
                    self.interior.poly_list_point_indices.push(index);
                    points.push(index);
                }
                hull_points.extend_from_slice(&points);

                let it = &mut self.interior;
                it.hull_surface_indices.push(self.surface_of[id]);
                it.hull_plane_indices.push(plane);
                it.poly_list_plane_indices.push(plane);
                hull_polygons.push(HullPolygon { points, plane });
            }

            let bounds = BoxF::from_points(batch.iter().flat_map(|&id| polygons[id].points.iter()));
            convex_hull.set_bounds(&bounds);

            for &p in hull_points.iter() {
                let s = hull::emit_string(&hull_points, &hull_polygons, p)?;
                let offset = self.export_emit_string(s)?;
                self.interior.hull_emit_string_indices.push(offset);
            }

            self.interior.convex_hulls.push(convex_hull);
        }

        self.interior.poly_list_string_characters.push(0);

        trace!(
            "exported {} hulls, {} bytes of emit strings",
            self.interior.convex_hulls.len(),
            self.interior.convex_hull_emit_string_characters.len()
        );
        Ok(())
    }

    /// Writes a single zone holding every surface.
    pub fn export_zone(&mut self) -> Result<(), DifError> {
        let it = &mut self.interior;
        let count = it.surfaces.len();
        it.zones.push(Zone {
            surface_start: 0,
            surface_count: narrow(count as u64, "zone surface count")?,
            ..Default::default()
        });
        for i in 0..count {
            it.zone_surfaces.push(narrow(i as u64, "zone surface")?);
        }
        Ok(())
    }

    pub fn export_bounds(&mut self) {
        let bounds = BoxF::from_points(self.polygons.iter().flat_map(|p| p.points.iter()));
        self.interior.bounding_sphere = SphereF::enclosing(&bounds);
        self.interior.bounding_box = bounds;
    }

    /// Splits the XY footprint of the bounding box into a grid and lists, per cell, the hulls
    /// whose bounds overlap it.
    ///
    /// Bins are numbered X-major: the cell in column `i` and row `j` is bin `i * 16 + j`.
    pub fn export_coord_bins(&mut self) -> Result<(), DifError> {
        let it = &mut self.interior;
        let bb = it.bounding_box;
        let cell = (bb.max - bb.min) / COORD_BIN_DIM as f32;

        for i in 0..COORD_BIN_DIM {
            for j in 0..COORD_BIN_DIM {
                let mut bin_box = bb;
                bin_box.min.x = bb.min.x + i as f32 * cell.x;
                bin_box.max.x = bb.min.x + (i + 1) as f32 * cell.x;
                bin_box.min.y = bb.min.y + j as f32 * cell.y;
                bin_box.max.y = bb.min.y + (j + 1) as f32 * cell.y;

                let start = it.coord_bin_indices.len();
                for (k, hull) in it.convex_hulls.iter().enumerate() {
                    if bin_box.overlaps_xy(&hull.bounds()) {
                        it.coord_bin_indices.push(narrow(k as u64, "coord bin hull")?);
                    }
                }

                it.coord_bins.push(CoordBin {
                    bin_start: narrow(start as u64, "coord bin start")?,
                    bin_count: narrow((it.coord_bin_indices.len() - start) as u64, "coord bin count")?,
                });
            }
        }

        Ok(())
    }

    pub fn finish(self) -> Interior {
        self.interior
    }
}

#[cfg(test)]
mod test {
    use super::*;

    use crate::{
        builder::{BuildConfig, SplitMode},
        common::math::Hyperplane,
        dif::interior::COORD_BIN_COUNT,
    };

    use cgmath::{Vector2, Zero};

    fn triangle(points: [Vector3<f32>; 3], material: u32) -> Polygon {
        let [a, b, c] = points;
        let normal = (a - b).cross(c - b).normalize();
        Polygon {
            points,
            uvs: [Vector2::zero(), Vector2::unit_x(), Vector2::unit_y()],
            material,
            plane: Hyperplane::through_point(normal, a),
        }
    }

    // two triangles forming the unit square at z = 0, facing -Z
    fn square() -> Vec<Polygon> {
        let p = |x: f32, y: f32| Vector3::new(x, y, 0.0);
        vec![
            triangle([p(0.0, 0.0), p(1.0, 0.0), p(1.0, 1.0)], 0),
            triangle([p(0.0, 0.0), p(1.0, 1.0), p(0.0, 1.0)], 0),
        ]
    }

    fn export(polygons: &[Polygon], materials: &[String], config: &BuildConfig) -> Interior {
        let tree = BspTree::build(polygons, config);
        let order = tree.gather();
        let mut exporter = InteriorExporter::new(polygons, materials);
        exporter.export_surfaces(&order).unwrap();
        exporter.export_bsp(&tree).unwrap();
        exporter.export_hulls(&order, config.hull_batch_size).unwrap();
        exporter.export_zone().unwrap();
        exporter.export_bounds();
        exporter.export_coord_bins().unwrap();
        exporter.finish()
    }

    #[test]
    fn test_key_merges_zeroes() {
        assert_eq!(key(0.0), key(-0.0));
        assert_ne!(key(1.0), key(-1.0));
    }

    #[test]
    fn test_coincident_planes_and_points_shared() {
        let polygons = square();
        let materials = vec!["default".to_owned()];
        let it = export(&polygons, &materials, &BuildConfig::default());

        assert_eq!(it.planes.len(), 1);
        assert_eq!(it.normals.len(), 1);
        assert_eq!(it.normal2s, it.normals);
        assert_eq!(it.points.len(), 4);
        assert_eq!(it.surfaces[0].plane_index, it.surfaces[1].plane_index);

        // both surfaces refer to the same index for the shared corners
        let shared: Vec<u32> = it.indices[0..3]
            .iter()
            .filter(|i| it.indices[3..6].contains(i))
            .cloned()
            .collect();
        assert_eq!(shared.len(), 2);
    }

    #[test]
    fn test_negated_zero_plane_is_shared() {
        let materials = vec!["default".to_owned()];
        let polygons = square();
        let mut exporter = InteriorExporter::new(&polygons, &materials);
        let a = exporter
            .export_plane(Vector3::new(0.0, 0.0, 1.0), 0.0)
            .unwrap();
        let b = exporter
            .export_plane(Vector3::new(-0.0, 0.0, 1.0), -0.0)
            .unwrap();
        assert_eq!(a, b);
        assert_eq!(exporter.finish().planes.len(), 1);
    }

    #[test]
    fn test_materials_added_on_first_use() {
        let mut polygons = square();
        polygons[0].material = 1;
        polygons[1].material = 1;
        let materials = vec!["unused".to_owned(), "stone".to_owned()];

        let it = export(&polygons, &materials, &BuildConfig::default());
        assert_eq!(it.material_names, vec!["stone".to_owned()]);
        assert!(it.surfaces.iter().all(|s| s.texture_index == 0));
    }

    #[test]
    fn test_unknown_material_fails() {
        let mut polygons = square();
        polygons[0].material = 3;
        let materials = vec!["default".to_owned()];
        let mut exporter = InteriorExporter::new(&polygons, &materials);
        assert!(exporter.export_surfaces(&[0, 1]).is_err());
    }

    #[test]
    fn test_emit_strings_shared_between_hulls() {
        // same square twice, far apart, in separate hulls
        let mut polygons = square();
        for p in square() {
            let mut moved = p.clone();
            for v in moved.points.iter_mut() {
                v.x += 10.0;
            }
            polygons.push(moved);
        }
        let materials = vec!["default".to_owned()];
        let config = BuildConfig {
            hull_batch_size: 2,
            ..Default::default()
        };
        let it = export(&polygons, &materials, &config);

        assert_eq!(it.convex_hulls.len(), 2);
        assert_eq!(it.hull_emit_string_indices.len(), 12);
        let first: Vec<u32> = it.hull_emit_string_indices[..6].to_vec();
        let second: Vec<u32> = it.hull_emit_string_indices[6..].to_vec();
        assert_eq!(first, second);
        assert_eq!(it.poly_list_string_characters, vec![0]);
    }

    #[test]
    fn test_hull_ranges() {
        let polygons = square();
        let materials = vec!["default".to_owned()];
        let it = export(&polygons, &materials, &BuildConfig::default());

        assert_eq!(it.convex_hulls.len(), 1);
        let hull = &it.convex_hulls[0];
        assert_eq!(hull.hull_start, 0);
        assert_eq!(hull.hull_count, 6);
        assert_eq!(hull.surface_count, 2);
        assert_eq!(it.hull_indices.len(), 6);
        assert_eq!(it.hull_plane_indices, vec![0, 0]);
        assert_eq!(it.poly_list_point_indices, it.hull_indices);
        assert_eq!(hull.bounds().min, Vector3::zero());
        assert_eq!(hull.bounds().max, Vector3::new(1.0, 1.0, 0.0));
    }

    #[test]
    fn test_single_leaf_has_no_nodes() {
        let polygons = square();
        let materials = vec!["default".to_owned()];
        let it = export(&polygons, &materials, &BuildConfig::default());
        assert!(it.bsp_nodes.is_empty());
        assert_eq!(it.bsp_solid_leaves.len(), 1);
        assert_eq!(it.bsp_solid_leaves[0].surface_count, 2);
        assert_eq!(it.solid_leaf_surfaces, vec![0, 1]);
    }

    #[test]
    fn test_coord_bins_cover_grid() {
        let mut polygons = square();
        for p in square() {
            let mut moved = p.clone();
            for v in moved.points.iter_mut() {
                v.x += 3.0;
            }
            polygons.push(moved);
        }
        let materials = vec!["default".to_owned()];
        let config = BuildConfig {
            hull_batch_size: 2,
            split_mode: SplitMode::Fast,
            ..Default::default()
        };
        let it = export(&polygons, &materials, &config);

        assert_eq!(it.coord_bins.len(), COORD_BIN_COUNT);
        // the left column only sees the left hull, the right column only the right one
        let first = it.coord_bins[0];
        let last = it.coord_bins[COORD_BIN_COUNT - 1];
        assert_eq!(first.bin_count, 1);
        assert_eq!(last.bin_count, 1);
        assert_ne!(
            it.coord_bin_indices[first.bin_start as usize],
            it.coord_bin_indices[last.bin_start as usize]
        );

        let total: u32 = it.coord_bins.iter().map(|b| b.bin_count).sum();
        assert_eq!(total as usize, it.coord_bin_indices.len());
    }
}
