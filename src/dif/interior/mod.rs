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

//! Interiors: the level geometry blocks of the container.
//!
//! An interior is a set of parallel tables that refer into each other by index. Planes refer to
//! normals, surfaces to windings, planes, materials and texgen equations, BSP nodes to planes and
//! solid leaves, and convex hulls to ranges of the hull index lists.
//!
//! The field layout depends on the interior version and on which producer wrote the file. Most of
//! that is decided by [`Version`], but version 0 is ambiguous: two producers wrote incompatible
//! surface records under the same number. The reader resolves this by trying one layout and, on
//! failure, rewinding and trying the other (see [`FormatHypothesis`]).

pub mod bsp;
pub mod hull;
pub mod light;
pub mod static_mesh;
pub mod surface;

use std::io::{Read, Seek, SeekFrom, Write};

use crate::dif::{
    error::{DifError, DifErrorKind},
    io::{
        narrow, read_vec_as, read_vec_extra, read_vec_with, write_slice, write_vec_as,
        write_vec_extra, Readable, Writable,
    },
    types::{BoxF, ColorI, PlaneF, SphereF},
    version::{DifType, InteriorType, Version, MAX_INTERIOR_VERSION},
};

pub use self::{
    bsp::{BspIndex, BspNode, BspSolidLeaf},
    hull::{ConvexHull, CoordBin, COORD_BIN_COUNT, COORD_BIN_DIM},
    light::{AnimatedLight, LightMap, LightState, StateData},
    static_mesh::{Primitive, StaticMesh},
    surface::{
        FormatHypothesis, NullSurface, Surface, SurfaceFlags, SurfaceLightMap, SurfaceLimits,
    },
};

use cgmath::Vector3;
use failure::ResultExt;

/// Material name given to surfaces that should not be drawn.
pub const NULL_MATERIAL: &str = "NULL";

/// The one interior version that drops fields found both before and after it.
const SPARSE_VERSION: u32 = 4;

fn param_set(_: bool, param: u8) -> bool {
    param != 0
}

fn flagged(flag: bool, _: u8) -> bool {
    flag
}

fn flagged_zero_param(flag: bool, param: u8) -> bool {
    flag && param == 0
}

fn always(_: bool, _: u8) -> bool {
    true
}

fn never(_: bool, _: u8) -> bool {
    false
}

#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Plane {
    pub normal_index: u16,
    pub plane_distance: f32,
}

impl Readable for Plane {
    fn read<R>(reader: &mut R, version: &mut Version) -> Result<Self, DifError>
    where
        R: Read + Seek,
    {
        Ok(Plane {
            normal_index: u16::read(reader, version)?,
            plane_distance: f32::read(reader, version)?,
        })
    }
}

impl Writable for Plane {
    fn write<W>(&self, writer: &mut W, version: &Version) -> Result<(), DifError>
    where
        W: Write,
    {
        self.normal_index.write(writer, version)?;
        self.plane_distance.write(writer, version)
    }
}

/// Maps a world position to texture coordinates: `u = planeX · p + dX`, `v = planeY · p + dY`.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct TexGenEq {
    pub plane_x: PlaneF,
    pub plane_y: PlaneF,
}

impl TexGenEq {
    pub fn uv(&self, p: Vector3<f32>) -> (f32, f32) {
        (self.plane_x.distance(p), self.plane_y.distance(p))
    }
}

impl Readable for TexGenEq {
    fn read<R>(reader: &mut R, version: &mut Version) -> Result<Self, DifError>
    where
        R: Read + Seek,
    {
        Ok(TexGenEq {
            plane_x: PlaneF::read(reader, version)?,
            plane_y: PlaneF::read(reader, version)?,
        })
    }
}

impl Writable for TexGenEq {
    fn write<W>(&self, writer: &mut W, version: &Version) -> Result<(), DifError>
    where
        W: Write,
    {
        self.plane_x.write(writer, version)?;
        self.plane_y.write(writer, version)
    }
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct WindingIndex {
    pub winding_start: u32,
    pub winding_count: u32,
}

impl Readable for WindingIndex {
    fn read<R>(reader: &mut R, version: &mut Version) -> Result<Self, DifError>
    where
        R: Read + Seek,
    {
        Ok(WindingIndex {
            winding_start: u32::read(reader, version)?,
            winding_count: u32::read(reader, version)?,
        })
    }
}

impl Writable for WindingIndex {
    fn write<W>(&self, writer: &mut W, version: &Version) -> Result<(), DifError>
    where
        W: Write,
    {
        self.winding_start.write(writer, version)?;
        self.winding_count.write(writer, version)
    }
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct Edge {
    pub point_index_0: i32,
    pub point_index_1: i32,
    pub surface_index_0: i32,
    pub surface_index_1: i32,
}

impl Readable for Edge {
    fn read<R>(reader: &mut R, version: &mut Version) -> Result<Self, DifError>
    where
        R: Read + Seek,
    {
        Ok(Edge {
            point_index_0: i32::read(reader, version)?,
            point_index_1: i32::read(reader, version)?,
            surface_index_0: i32::read(reader, version)?,
            surface_index_1: i32::read(reader, version)?,
        })
    }
}

impl Writable for Edge {
    fn write<W>(&self, writer: &mut W, version: &Version) -> Result<(), DifError>
    where
        W: Write,
    {
        self.point_index_0.write(writer, version)?;
        self.point_index_1.write(writer, version)?;
        self.surface_index_0.write(writer, version)?;
        self.surface_index_1.write(writer, version)
    }
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct Zone {
    pub portal_start: u16,
    pub portal_count: u16,
    pub surface_start: u32,
    pub surface_count: u32,
    pub static_mesh_start: u32,
    pub static_mesh_count: u32,
}

impl Readable for Zone {
    fn read<R>(reader: &mut R, version: &mut Version) -> Result<Self, DifError>
    where
        R: Read + Seek,
    {
        let mut zone = Zone {
            portal_start: u16::read(reader, version)?,
            portal_count: u16::read(reader, version)?,
            surface_start: u32::read(reader, version)?,
            surface_count: u32::read(reader, version)?,
            ..Default::default()
        };
        if version.interior.version >= 12 {
            zone.static_mesh_start = u32::read(reader, version)?;
            zone.static_mesh_count = u32::read(reader, version)?;
        }
        Ok(zone)
    }
}

impl Writable for Zone {
    fn write<W>(&self, writer: &mut W, version: &Version) -> Result<(), DifError>
    where
        W: Write,
    {
        self.portal_start.write(writer, version)?;
        self.portal_count.write(writer, version)?;
        self.surface_start.write(writer, version)?;
        self.surface_count.write(writer, version)?;
        if version.interior.version >= 12 {
            self.static_mesh_start.write(writer, version)?;
            self.static_mesh_count.write(writer, version)?;
        }
        Ok(())
    }
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct Portal {
    pub plane_index: u16,
    pub tri_fan_count: u16,
    pub tri_fan_start: u32,
    pub zone_front: u16,
    pub zone_back: u16,
}

impl Readable for Portal {
    fn read<R>(reader: &mut R, version: &mut Version) -> Result<Self, DifError>
    where
        R: Read + Seek,
    {
        Ok(Portal {
            plane_index: u16::read(reader, version)?,
            tri_fan_count: u16::read(reader, version)?,
            tri_fan_start: u32::read(reader, version)?,
            zone_front: u16::read(reader, version)?,
            zone_back: u16::read(reader, version)?,
        })
    }
}

impl Writable for Portal {
    fn write<W>(&self, writer: &mut W, version: &Version) -> Result<(), DifError>
    where
        W: Write,
    {
        self.plane_index.write(writer, version)?;
        self.tri_fan_count.write(writer, version)?;
        self.tri_fan_start.write(writer, version)?;
        self.zone_front.write(writer, version)?;
        self.zone_back.write(writer, version)
    }
}

/// Edge records found in interiors of versions 2 through 5. Faces are stored from version 3.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct Edge2 {
    pub vertices: [u32; 2],
    pub normals: [u32; 2],
    pub faces: [u32; 2],
}

impl Readable for Edge2 {
    fn read<R>(reader: &mut R, version: &mut Version) -> Result<Self, DifError>
    where
        R: Read + Seek,
    {
        let mut edge = Edge2::default();
        edge.vertices = [u32::read(reader, version)?, u32::read(reader, version)?];
        edge.normals = [u32::read(reader, version)?, u32::read(reader, version)?];
        if version.interior.version >= 3 {
            edge.faces = [u32::read(reader, version)?, u32::read(reader, version)?];
        }
        Ok(edge)
    }
}

impl Writable for Edge2 {
    fn write<W>(&self, writer: &mut W, version: &Version) -> Result<(), DifError>
    where
        W: Write,
    {
        let mut fields = vec![self.vertices, self.normals];
        if version.interior.version >= 3 {
            fields.push(self.faces);
        }
        for pair in fields {
            pair[0].write(writer, version)?;
            pair[1].write(writer, version)?;
        }
        Ok(())
    }
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct TexMatrix {
    pub t: i32,
    pub n: i32,
    pub b: i32,
}

impl Readable for TexMatrix {
    fn read<R>(reader: &mut R, version: &mut Version) -> Result<Self, DifError>
    where
        R: Read + Seek,
    {
        Ok(TexMatrix {
            t: i32::read(reader, version)?,
            n: i32::read(reader, version)?,
            b: i32::read(reader, version)?,
        })
    }
}

impl Writable for TexMatrix {
    fn write<W>(&self, writer: &mut W, version: &Version) -> Result<(), DifError>
    where
        W: Write,
    {
        self.t.write(writer, version)?;
        self.n.write(writer, version)?;
        self.b.write(writer, version)
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Interior {
    pub detail_level: u32,
    pub min_pixels: u32,
    pub bounding_box: BoxF,
    pub bounding_sphere: SphereF,
    pub has_alarm_state: u8,
    pub num_light_state_entries: u32,

    pub normals: Vec<Vector3<f32>>,
    pub planes: Vec<Plane>,
    pub points: Vec<Vector3<f32>>,
    pub point_visibility: Vec<u8>,
    pub tex_gen_eqs: Vec<TexGenEq>,
    pub bsp_nodes: Vec<BspNode>,
    pub bsp_solid_leaves: Vec<BspSolidLeaf>,
    pub material_names: Vec<String>,
    pub indices: Vec<u32>,
    pub winding_indices: Vec<WindingIndex>,
    pub edges: Vec<Edge>,
    pub zones: Vec<Zone>,
    pub zone_surfaces: Vec<u16>,
    pub zone_static_meshes: Vec<u32>,
    pub zone_portal_list: Vec<u16>,
    pub portals: Vec<Portal>,
    pub surfaces: Vec<Surface>,
    pub edge2s: Vec<Edge2>,
    pub normal2s: Vec<Vector3<f32>>,
    pub normal_indices: Vec<u16>,
    pub normal_lmap_indices: Vec<u32>,
    pub alarm_lmap_indices: Vec<u32>,
    pub null_surfaces: Vec<NullSurface>,
    pub light_maps: Vec<LightMap>,
    pub solid_leaf_surfaces: Vec<u32>,
    pub animated_lights: Vec<AnimatedLight>,
    pub light_states: Vec<LightState>,
    pub state_datas: Vec<StateData>,
    pub state_data_flags: u32,
    pub state_data_buffers: Vec<u8>,
    pub name_buffer_characters: Vec<u8>,

    pub convex_hulls: Vec<ConvexHull>,
    pub convex_hull_emit_string_characters: Vec<u8>,
    pub hull_indices: Vec<u32>,
    pub hull_plane_indices: Vec<u16>,
    pub hull_emit_string_indices: Vec<u32>,
    pub hull_surface_indices: Vec<u32>,
    pub poly_list_plane_indices: Vec<u16>,
    pub poly_list_point_indices: Vec<u32>,
    pub poly_list_string_characters: Vec<u8>,
    /// Exactly [`COORD_BIN_COUNT`] entries in a well-formed interior; missing bins are written
    /// empty.
    pub coord_bins: Vec<CoordBin>,
    pub coord_bin_indices: Vec<u16>,
    pub coord_bin_mode: u32,

    pub base_ambient_color: ColorI,
    pub alarm_ambient_color: ColorI,
    pub static_meshes: Vec<StaticMesh>,
    pub tex_normals: Vec<Vector3<f32>>,
    pub tex_matrices: Vec<TexMatrix>,
    pub tex_mat_indices: Vec<u32>,
    pub extended_light_map_data: u32,
    pub light_map_border_size: u32,
}

impl Interior {
    /// The plane of `surface` as `normal · p + d = 0`, facing the way the surface does.
    pub fn surface_plane(&self, surface: &Surface) -> Option<PlaneF> {
        let plane = self.planes.get(surface.plane_index as usize)?;
        let normal = *self.normals.get(plane.normal_index as usize)?;
        let mut out = PlaneF {
            normal,
            d: plane.plane_distance,
        };
        if surface.plane_flipped {
            out.normal = -out.normal;
            out.d = -out.d;
        }
        Some(out)
    }

    /// Scales every texture generation equation, so textures repeat `factor` times as often.
    pub fn rescale_textures(&mut self, factor: f32) {
        for eq in self.tex_gen_eqs.iter_mut() {
            for plane in [&mut eq.plane_x, &mut eq.plane_y].iter_mut() {
                plane.normal *= factor;
                plane.d *= factor;
            }
        }
    }

    /// Points every surface for which `pred` holds at the `NULL` material, adding it if needed.
    ///
    /// `pred` receives the surface and the name of its current material. Returns the number of
    /// surfaces changed.
    pub fn null_surfaces_where<F>(&mut self, mut pred: F) -> usize
    where
        F: FnMut(&Surface, &str) -> bool,
    {
        let mut null_index = self
            .material_names
            .iter()
            .position(|name| name == NULL_MATERIAL);

        let mut changed = 0;
        for i in 0..self.surfaces.len() {
            let matches = {
                let surface = &self.surfaces[i];
                let material = self
                    .material_names
                    .get(surface.texture_index as usize)
                    .map(String::as_str)
                    .unwrap_or("");
                material != NULL_MATERIAL && pred(surface, material)
            };
            if !matches {
                continue;
            }

            let index = match null_index {
                Some(i) => i,
                None => {
                    self.material_names.push(NULL_MATERIAL.to_owned());
                    let i = self.material_names.len() - 1;
                    null_index = Some(i);
                    i
                }
            };
            self.surfaces[i].texture_index = index as u16;
            changed += 1;
        }

        changed
    }

    fn read_surfaces<R>(
        reader: &mut R,
        version: &mut Version,
        layout: FormatHypothesis,
        limits: &SurfaceLimits,
    ) -> Result<Vec<Surface>, DifError>
    where
        R: Read + Seek,
    {
        read_vec_with(reader, version, |r, v| {
            Surface::read_checked(r, v, layout, limits)
        })
    }

    /// Reads the surface list, falling back to the legacy layout once for version 0 interiors.
    fn read_surfaces_resolving<R>(
        reader: &mut R,
        version: &mut Version,
        limits: &SurfaceLimits,
    ) -> Result<Vec<Surface>, DifError>
    where
        R: Read + Seek,
    {
        let start = reader.seek(SeekFrom::Current(0)).context(DifErrorKind::Io)?;
        let hypothesis = FormatHypothesis::of(&version.interior);

        match Interior::read_surfaces(reader, version, hypothesis, limits) {
            Ok(surfaces) => {
                if version.dif.ty == DifType::Unknown {
                    version.dif.ty = DifType::Tge;
                }
                Ok(surfaces)
            }

            Err(e) => {
                if hypothesis == FormatHypothesis::Legacy || version.interior.version != 0 {
                    return Err(e);
                }

                debug!(
                    "Surfaces at {:#x} failed in the modern layout ({}), retrying as legacy",
                    start, e
                );
                version.interior.ty = InteriorType::Mbg;
                if version.dif.ty == DifType::Unknown {
                    version.dif.ty = DifType::Mbg;
                }

                reader.seek(SeekFrom::Start(start)).context(DifErrorKind::Io)?;
                Interior::read_surfaces(reader, version, FormatHypothesis::Legacy, limits)
                    .map_err(|e| {
                        debug!("Legacy surface layout failed too: {}", e);
                        DifErrorKind::LegacyFallbackFailed.into()
                    })
            }
        }
    }
}

fn read_u8_list_wide<R>(reader: &mut R, version: &mut Version) -> Result<Vec<u32>, DifError>
where
    R: Read + Seek,
{
    Ok(Vec::<u8>::read(reader, version)?
        .into_iter()
        .map(u32::from)
        .collect())
}

fn write_u8_list_wide<W>(
    writer: &mut W,
    version: &Version,
    items: &[u32],
    field: &'static str,
) -> Result<(), DifError>
where
    W: Write,
{
    let bytes = items
        .iter()
        .map(|&i| narrow::<u32, u8>(i, field))
        .collect::<Result<Vec<u8>, DifError>>()?;
    write_slice(writer, version, &bytes)
}

impl Readable for Interior {
    fn read<R>(reader: &mut R, version: &mut Version) -> Result<Self, DifError>
    where
        R: Read + Seek,
    {
        if version.interior.ty == InteriorType::Unknown {
            version.interior.ty = InteriorType::Tgea;
        }

        version.interior.version = u32::read(reader, version)?;
        if version.interior.version > MAX_INTERIOR_VERSION {
            return Err(DifErrorKind::UnsupportedInteriorVersion {
                version: version.interior.version,
            }
            .into());
        }
        let v = version.interior.version;
        debug!("Reading interior version {} ({})", v, version.interior.ty);

        let mut it = Interior::default();
        it.detail_level = u32::read(reader, version)?;
        it.min_pixels = u32::read(reader, version)?;
        it.bounding_box = BoxF::read(reader, version)?;
        it.bounding_sphere = SphereF::read(reader, version)?;
        it.has_alarm_state = u8::read(reader, version)?;
        it.num_light_state_entries = u32::read(reader, version)?;

        it.normals = Vec::read(reader, version)?;
        it.planes = Vec::read(reader, version)?;
        it.points = Vec::read(reader, version)?;
        if v != SPARSE_VERSION {
            it.point_visibility = Vec::read(reader, version)?;
        }
        it.tex_gen_eqs = Vec::read(reader, version)?;
        it.bsp_nodes = Vec::read(reader, version)?;
        it.bsp_solid_leaves = Vec::read(reader, version)?;

        version.material.version = u8::read(reader, version)?;
        it.material_names = Vec::read(reader, version)?;
        it.indices = read_vec_as::<_, u32, u16, _>(reader, version, param_set)?;
        it.winding_indices = Vec::read(reader, version)?;
        if v >= 12 {
            it.edges = Vec::read(reader, version)?;
        }
        it.zones = Vec::read(reader, version)?;
        it.zone_surfaces = read_vec_as::<_, u16, u16, _>(reader, version, never)?;
        if v >= 12 {
            it.zone_static_meshes = Vec::read(reader, version)?;
        }
        it.zone_portal_list = read_vec_as::<_, u16, u16, _>(reader, version, never)?;
        it.portals = Vec::read(reader, version)?;
        trace!(
            "{} normals, {} planes, {} points, {} materials, {} indices",
            it.normals.len(),
            it.planes.len(),
            it.points.len(),
            it.material_names.len(),
            it.indices.len()
        );

        let limits = SurfaceLimits {
            indices: it.indices.len(),
            planes: it.planes.len(),
            materials: it.material_names.len(),
            tex_gens: it.tex_gen_eqs.len(),
        };
        it.surfaces = Interior::read_surfaces_resolving(reader, version, &limits)?;
        debug!(
            "Read {} surfaces as {} ({})",
            it.surfaces.len(),
            version.interior.ty,
            version.dif.ty
        );

        if (2..=5).contains(&v) {
            it.edge2s = Vec::read(reader, version)?;
            if (4..=5).contains(&v) {
                it.normal2s = Vec::read(reader, version)?;
                it.normal_indices =
                    read_vec_as::<_, u16, u8, _>(reader, version, flagged_zero_param)?;
            }
        }

        if v == SPARSE_VERSION {
            it.normal_lmap_indices = read_u8_list_wide(reader, version)?;
        } else if v >= 13 {
            it.normal_lmap_indices = read_vec_as::<_, u32, u32, _>(reader, version, always)?;
            it.alarm_lmap_indices = read_vec_as::<_, u32, u32, _>(reader, version, always)?;
        } else {
            it.normal_lmap_indices = read_u8_list_wide(reader, version)?;
            it.alarm_lmap_indices = read_u8_list_wide(reader, version)?;
        }

        it.null_surfaces = Vec::read(reader, version)?;
        if v != SPARSE_VERSION {
            it.light_maps = Vec::read(reader, version)?;
            if !it.light_maps.is_empty() && version.interior.ty == InteriorType::Mbg {
                debug!("Interior carries lightmaps, retagging as TGE");
                version.interior.ty = InteriorType::Tge;
            }
        }
        it.solid_leaf_surfaces = read_vec_as::<_, u32, u16, _>(reader, version, flagged)?;
        it.animated_lights = Vec::read(reader, version)?;
        it.light_states = Vec::read(reader, version)?;

        if v != SPARSE_VERSION {
            it.state_datas = Vec::read(reader, version)?;
            let (flags, buffers) = read_vec_extra::<_, u32, u8>(reader, version)?;
            it.state_data_flags = flags;
            it.state_data_buffers = buffers;
            it.name_buffer_characters = Vec::read(reader, version)?;

            let sub_objects = u32::read(reader, version)?;
            if sub_objects != 0 {
                return Err(DifErrorKind::SubObjectsUnsupported { count: sub_objects }.into());
            }
        }

        it.convex_hulls = Vec::read(reader, version)?;
        it.convex_hull_emit_string_characters = Vec::read(reader, version)?;
        it.hull_indices = read_vec_as::<_, u32, u16, _>(reader, version, flagged)?;
        it.hull_plane_indices = read_vec_as::<_, u16, u16, _>(reader, version, always)?;
        it.hull_emit_string_indices = read_vec_as::<_, u32, u16, _>(reader, version, flagged)?;
        it.hull_surface_indices = read_vec_as::<_, u32, u16, _>(reader, version, flagged)?;
        it.poly_list_plane_indices = read_vec_as::<_, u16, u16, _>(reader, version, always)?;
        it.poly_list_point_indices = read_vec_as::<_, u32, u16, _>(reader, version, flagged)?;
        it.poly_list_string_characters = Vec::read(reader, version)?;
        trace!(
            "{} convex hulls, {} emit string bytes",
            it.convex_hulls.len(),
            it.convex_hull_emit_string_characters.len()
        );

        it.coord_bins = Vec::with_capacity(COORD_BIN_COUNT);
        for _ in 0..COORD_BIN_COUNT {
            it.coord_bins.push(CoordBin::read(reader, version)?);
        }
        it.coord_bin_indices = read_vec_as::<_, u16, u16, _>(reader, version, always)?;
        it.coord_bin_mode = u32::read(reader, version)?;

        if v == SPARSE_VERSION {
            it.base_ambient_color = ColorI::new(0, 0, 0, 255);
            it.alarm_ambient_color = ColorI::new(0, 0, 0, 255);
        } else {
            it.base_ambient_color = ColorI::read(reader, version)?;
            it.alarm_ambient_color = ColorI::read(reader, version)?;

            if v >= 10 {
                it.static_meshes = Vec::read(reader, version)?;
            }
            if v >= 11 {
                it.tex_normals = Vec::read(reader, version)?;
                it.tex_matrices = Vec::read(reader, version)?;
                it.tex_mat_indices = Vec::read(reader, version)?;
            } else {
                for _ in 0..3 {
                    u32::read(reader, version)?;
                }
            }

            it.extended_light_map_data = u32::read(reader, version)?;
            if it.extended_light_map_data != 0 {
                it.light_map_border_size = u32::read(reader, version)?;
                u32::read(reader, version)?;
            }
        }

        Ok(it)
    }
}

impl Writable for Interior {
    fn write<W>(&self, writer: &mut W, version: &Version) -> Result<(), DifError>
    where
        W: Write,
    {
        let v = version.interior.version;
        if v > MAX_INTERIOR_VERSION {
            return Err(DifErrorKind::UnsupportedInteriorVersion { version: v }.into());
        }

        v.write(writer, version)?;
        self.detail_level.write(writer, version)?;
        self.min_pixels.write(writer, version)?;
        self.bounding_box.write(writer, version)?;
        self.bounding_sphere.write(writer, version)?;
        self.has_alarm_state.write(writer, version)?;
        self.num_light_state_entries.write(writer, version)?;

        self.normals.write(writer, version)?;
        self.planes.write(writer, version)?;
        self.points.write(writer, version)?;
        if v != SPARSE_VERSION {
            self.point_visibility.write(writer, version)?;
        }
        self.tex_gen_eqs.write(writer, version)?;
        self.bsp_nodes.write(writer, version)?;
        self.bsp_solid_leaves.write(writer, version)?;

        version.material.version.write(writer, version)?;
        self.material_names.write(writer, version)?;
        write_vec_as::<_, u32, u16, _>(writer, version, &self.indices, param_set, None, "index")?;
        self.winding_indices.write(writer, version)?;
        if v >= 12 {
            self.edges.write(writer, version)?;
        }
        self.zones.write(writer, version)?;
        write_vec_as::<_, u16, u16, _>(
            writer,
            version,
            &self.zone_surfaces,
            never,
            None,
            "zoneSurface",
        )?;
        if v >= 12 {
            self.zone_static_meshes.write(writer, version)?;
        }
        write_vec_as::<_, u16, u16, _>(
            writer,
            version,
            &self.zone_portal_list,
            never,
            None,
            "zonePortalList",
        )?;
        self.portals.write(writer, version)?;
        self.surfaces.write(writer, version)?;

        if (2..=5).contains(&v) {
            self.edge2s.write(writer, version)?;
            if (4..=5).contains(&v) {
                self.normal2s.write(writer, version)?;
                write_vec_as::<_, u16, u8, _>(
                    writer,
                    version,
                    &self.normal_indices,
                    flagged_zero_param,
                    None,
                    "normalIndex",
                )?;
            }
        }

        if v == SPARSE_VERSION {
            write_u8_list_wide(writer, version, &self.normal_lmap_indices, "normalLMapIndex")?;
        } else if v >= 13 {
            write_vec_as::<_, u32, u32, _>(
                writer,
                version,
                &self.normal_lmap_indices,
                always,
                None,
                "normalLMapIndex",
            )?;
            write_vec_as::<_, u32, u32, _>(
                writer,
                version,
                &self.alarm_lmap_indices,
                always,
                None,
                "alarmLMapIndex",
            )?;
        } else {
            write_u8_list_wide(writer, version, &self.normal_lmap_indices, "normalLMapIndex")?;
            write_u8_list_wide(writer, version, &self.alarm_lmap_indices, "alarmLMapIndex")?;
        }

        self.null_surfaces.write(writer, version)?;
        if v != SPARSE_VERSION {
            self.light_maps.write(writer, version)?;
        }
        write_vec_as::<_, u32, u16, _>(
            writer,
            version,
            &self.solid_leaf_surfaces,
            flagged,
            None,
            "solidLeafSurface",
        )?;
        self.animated_lights.write(writer, version)?;
        self.light_states.write(writer, version)?;

        if v != SPARSE_VERSION {
            self.state_datas.write(writer, version)?;
            write_vec_extra(
                writer,
                version,
                &self.state_data_flags,
                &self.state_data_buffers,
            )?;
            self.name_buffer_characters.write(writer, version)?;
            0u32.write(writer, version)?;
        }

        self.convex_hulls.write(writer, version)?;
        self.convex_hull_emit_string_characters
            .write(writer, version)?;
        write_vec_as::<_, u32, u16, _>(
            writer,
            version,
            &self.hull_indices,
            flagged,
            None,
            "hullIndex",
        )?;
        write_vec_as::<_, u16, u16, _>(
            writer,
            version,
            &self.hull_plane_indices,
            always,
            None,
            "hullPlaneIndex",
        )?;
        write_vec_as::<_, u32, u16, _>(
            writer,
            version,
            &self.hull_emit_string_indices,
            flagged,
            None,
            "hullEmitStringIndex",
        )?;
        write_vec_as::<_, u32, u16, _>(
            writer,
            version,
            &self.hull_surface_indices,
            flagged,
            None,
            "hullSurfaceIndex",
        )?;
        write_vec_as::<_, u16, u16, _>(
            writer,
            version,
            &self.poly_list_plane_indices,
            always,
            None,
            "polyListPlaneIndex",
        )?;
        write_vec_as::<_, u32, u16, _>(
            writer,
            version,
            &self.poly_list_point_indices,
            flagged,
            None,
            "polyListPointIndex",
        )?;
        self.poly_list_string_characters.write(writer, version)?;

        if self.coord_bins.len() > COORD_BIN_COUNT {
            return Err(DifErrorKind::CountOverflow {
                count: self.coord_bins.len(),
            }
            .into());
        }
        for i in 0..COORD_BIN_COUNT {
            self.coord_bins
                .get(i)
                .cloned()
                .unwrap_or_default()
                .write(writer, version)?;
        }
        write_vec_as::<_, u16, u16, _>(
            writer,
            version,
            &self.coord_bin_indices,
            always,
            None,
            "coordBinIndex",
        )?;
        self.coord_bin_mode.write(writer, version)?;

        if v != SPARSE_VERSION {
            self.base_ambient_color.write(writer, version)?;
            self.alarm_ambient_color.write(writer, version)?;

            if v >= 10 {
                self.static_meshes.write(writer, version)?;
            }
            if v >= 11 {
                self.tex_normals.write(writer, version)?;
                self.tex_matrices.write(writer, version)?;
                self.tex_mat_indices.write(writer, version)?;
            } else {
                for _ in 0..3 {
                    0u32.write(writer, version)?;
                }
            }

            self.extended_light_map_data.write(writer, version)?;
            if self.extended_light_map_data != 0 {
                self.light_map_border_size.write(writer, version)?;
                0u32.write(writer, version)?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    use std::io::Cursor;

    use crate::dif::{io::ALTERNATE_COUNT_FLAG, version::InteriorType};

    fn tri_interior() -> Interior {
        let mut it = Interior::default();
        it.normals = vec![Vector3::new(0.0, 0.0, 1.0)];
        it.planes = vec![Plane {
            normal_index: 0,
            plane_distance: 0.0,
        }];
        it.points = vec![
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(1.0, 0.0, 0.0),
            Vector3::new(0.0, 1.0, 0.0),
        ];
        it.point_visibility = vec![0xFF; 3];
        it.tex_gen_eqs = vec![TexGenEq {
            plane_x: PlaneF::new(1.0, 0.0, 0.0, 0.0),
            plane_y: PlaneF::new(0.0, 1.0, 0.0, 0.0),
        }];
        it.material_names = vec!["grass".to_owned()];
        it.indices = vec![0, 1, 2];
        it.surfaces = vec![
            Surface {
                winding_start: 0,
                winding_count: 3,
                fan_mask: 15,
                ..Default::default()
            },
            Surface {
                winding_start: 0,
                winding_count: 3,
                plane_flipped: true,
                ..Default::default()
            },
        ];
        it.normal_lmap_indices = vec![0, 0];
        it.alarm_lmap_indices = vec![0, 0];
        it.coord_bins = vec![CoordBin::default(); COORD_BIN_COUNT];
        it
    }

    fn write_read(it: &Interior, write_version: Version, mut read_version: Version) -> (Interior, Version) {
        let mut out = Vec::new();
        it.write(&mut out, &write_version).unwrap();
        let back = Interior::read(&mut Cursor::new(out), &mut read_version).unwrap();
        (back, read_version)
    }

    #[test]
    fn test_round_trip_versions() {
        for &(v, ty) in [
            (0, InteriorType::Tge),
            (0, InteriorType::Tgea),
            (3, InteriorType::Tgea),
            (4, InteriorType::Tgea),
            (12, InteriorType::Tgea),
            (14, InteriorType::Tge),
        ]
        .iter()
        {
            let mut it = tri_interior();
            if v == SPARSE_VERSION {
                it.point_visibility.clear();
                it.alarm_lmap_indices.clear();
                it.base_ambient_color = ColorI::new(0, 0, 0, 255);
                it.alarm_ambient_color = ColorI::new(0, 0, 0, 255);
            }
            let version = Version::with_interior(v, ty);
            let (back, _) = write_read(&it, version, version);
            assert_eq!(back, it, "version {} {}", v, ty);
        }
    }

    fn put<T: Writable>(out: &mut Vec<u8>, value: T) {
        value.write(out, &Version::default()).unwrap();
    }

    fn put_empty(out: &mut Vec<u8>, lists: usize) {
        for _ in 0..lists {
            put(out, 0u32);
        }
    }

    fn put_flagged_count(out: &mut Vec<u8>, count: u32, param: u8) {
        put(out, count | ALTERNATE_COUNT_FLAG);
        put(out, param);
    }

    /// A version 4 interior whose tables are empty apart from the dual-width lists, which all
    /// carry the alternate count flag.
    fn flagged_sparse_stream(index_param: u8, normal_param: u8) -> Vec<u8> {
        let mut out = Vec::new();
        put(&mut out, SPARSE_VERSION);
        put(&mut out, 0u32);
        put(&mut out, 0u32);
        put(&mut out, BoxF::default());
        put(&mut out, SphereF::default());
        put(&mut out, 0u8);
        put(&mut out, 0u32);
        // normals, planes, points, texgens, nodes, solid leaves
        put_empty(&mut out, 6);
        put(&mut out, 1u8);
        put_empty(&mut out, 1);

        put_flagged_count(&mut out, 2, index_param);
        if index_param == 0 {
            put(&mut out, 70000u32);
            put(&mut out, 3u32);
        } else {
            put(&mut out, 7u16);
            put(&mut out, 8u16);
        }
        // windings, zones
        put_empty(&mut out, 2);
        put_flagged_count(&mut out, 2, 1);
        put(&mut out, 5u16);
        put(&mut out, 6u16);
        // zone portals, portals, surfaces, edge2s, normal2s
        put_empty(&mut out, 5);

        put_flagged_count(&mut out, 3, normal_param);
        if normal_param == 0 {
            for i in 1..=3u8 {
                put(&mut out, i);
            }
        } else {
            for i in 1..=3u16 {
                put(&mut out, i);
            }
        }
        // lightmap indices, null surfaces
        put_empty(&mut out, 2);
        put_flagged_count(&mut out, 1, 0);
        put(&mut out, 11u16);
        // animated lights, light states, hulls, emit string characters
        put_empty(&mut out, 4);
        put_flagged_count(&mut out, 2, 0);
        put(&mut out, 12u16);
        put(&mut out, 13u16);
        // the remaining hull and poly lists
        put_empty(&mut out, 6);
        for _ in 0..COORD_BIN_COUNT {
            put(&mut out, CoordBin::default());
        }
        put_empty(&mut out, 1);
        put(&mut out, 0u32);
        out
    }

    #[test]
    fn test_flagged_counts_zero_param() {
        let stream = flagged_sparse_stream(0, 0);
        let mut cursor = Cursor::new(stream);
        let mut version = Version::default();
        let it = Interior::read(&mut cursor, &mut version).unwrap();

        // a zero param keeps indices wide but narrows normal indices to bytes
        assert_eq!(it.indices, vec![70000, 3]);
        assert_eq!(it.normal_indices, vec![1, 2, 3]);
        // zone surfaces stay 16 bits whatever the flag says
        assert_eq!(it.zone_surfaces, vec![5, 6]);
        // the flag alone narrows these, param or not
        assert_eq!(it.solid_leaf_surfaces, vec![11]);
        assert_eq!(it.hull_indices, vec![12, 13]);
        assert_eq!(cursor.position(), cursor.get_ref().len() as u64);
    }

    #[test]
    fn test_flagged_counts_nonzero_param() {
        let stream = flagged_sparse_stream(1, 1);
        let mut cursor = Cursor::new(stream);
        let mut version = Version::default();
        let it = Interior::read(&mut cursor, &mut version).unwrap();

        assert_eq!(it.indices, vec![7, 8]);
        assert_eq!(it.normal_indices, vec![1, 2, 3]);
        assert_eq!(it.zone_surfaces, vec![5, 6]);
        assert_eq!(it.solid_leaf_surfaces, vec![11]);
        assert_eq!(it.hull_indices, vec![12, 13]);
        assert_eq!(cursor.position(), cursor.get_ref().len() as u64);
    }

    #[test]
    fn test_unsupported_version() {
        let mut version = Version::default();
        let err = Interior::read(&mut Cursor::new(vec![15, 0, 0, 0]), &mut version).unwrap_err();
        assert_eq!(
            err.kind(),
            DifErrorKind::UnsupportedInteriorVersion { version: 15 }
        );
    }

    #[test]
    fn test_version_zero_fallback() {
        // written without the trailing surface byte; read first with the modern layout, which
        // misreads the second surface's winding start
        let it = tri_interior();
        let (back, version) = write_read(
            &it,
            Version::with_interior(0, InteriorType::Mbg),
            Version::default(),
        );
        assert_eq!(back, it);
        assert_eq!(version.interior.ty, InteriorType::Mbg);
        assert_eq!(version.dif.ty, DifType::Mbg);
    }

    #[test]
    fn test_modern_success_sets_tge() {
        let it = tri_interior();
        let (_, version) = write_read(
            &it,
            Version::with_interior(0, InteriorType::Tgea),
            Version::default(),
        );
        assert_eq!(version.interior.ty, InteriorType::Tgea);
        assert_eq!(version.dif.ty, DifType::Tge);
    }

    #[test]
    fn test_nonzero_version_no_fallback() {
        let it = tri_interior();
        let mut out = Vec::new();
        it.write(&mut out, &Version::with_interior(2, InteriorType::Mbg))
            .unwrap();
        let mut version = Version::default();
        let err = Interior::read(&mut Cursor::new(out), &mut version).unwrap_err();
        assert_ne!(err.kind(), DifErrorKind::LegacyFallbackFailed);
    }

    #[test]
    fn test_both_layouts_fail() {
        let mut it = tri_interior();
        it.surfaces[1].plane_index = 1;
        // only one plane; write with a version that does not check references
        let mut out = Vec::new();
        it.write(&mut out, &Version::with_interior(0, InteriorType::Tgea))
            .unwrap();
        let mut version = Version::default();
        let err = Interior::read(&mut Cursor::new(out), &mut version).unwrap_err();
        assert_eq!(err.kind(), DifErrorKind::LegacyFallbackFailed);
    }

    #[test]
    fn test_sub_objects_rejected() {
        let it = tri_interior();
        let version = Version::with_interior(0, InteriorType::Tge);
        let mut out = Vec::new();
        it.write(&mut out, &version).unwrap();

        // the sub-object count follows the name buffer; find it from the end: 256 bins,
        // coord bin indices, mode, colors, tex counts, extended flag, then the hull lists
        let tail = COORD_BIN_COUNT * 8 + 4 + 4 + 8 + 12 + 4;
        let hull_lists = 4 * 9;
        let pos = out.len() - tail - hull_lists - 4;
        assert_eq!(&out[pos..pos + 4], &[0, 0, 0, 0]);
        out[pos] = 1;

        let mut read_version = version;
        let err = Interior::read(&mut Cursor::new(out), &mut read_version).unwrap_err();
        assert_eq!(err.kind(), DifErrorKind::SubObjectsUnsupported { count: 1 });
    }

    #[test]
    fn test_rescale_textures() {
        let mut it = tri_interior();
        it.rescale_textures(2.0);
        let (u, v) = it.tex_gen_eqs[0].uv(Vector3::new(1.0, 3.0, 0.0));
        assert_eq!((u, v), (2.0, 6.0));
    }

    #[test]
    fn test_null_surfaces_where() {
        let mut it = tri_interior();
        let changed = it.null_surfaces_where(|s, _| s.plane_flipped);
        assert_eq!(changed, 1);
        assert_eq!(it.material_names, vec!["grass", NULL_MATERIAL]);
        assert_eq!(it.surfaces[0].texture_index, 0);
        assert_eq!(it.surfaces[1].texture_index, 1);

        // already nulled surfaces are left alone
        assert_eq!(it.null_surfaces_where(|_, _| true), 1);
        assert_eq!(it.material_names.len(), 2);
    }

    #[test]
    fn test_surface_plane_flip() {
        let it = tri_interior();
        let front = it.surface_plane(&it.surfaces[0]).unwrap();
        let back = it.surface_plane(&it.surfaces[1]).unwrap();
        assert_eq!(front.normal, -back.normal);
    }
}
