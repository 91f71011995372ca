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

use std::io::{Read, Seek, Write};

use crate::dif::{
    error::{DifError, DifErrorKind},
    io::{check_index, narrow, Readable, Writable},
    version::{InteriorVersion, Version},
};

/// Set in a stored surface plane index when the surface faces away from its plane.
pub const PLANE_FLIP_FLAG: u16 = 0x8000;

/// Interior version from which surface counts and lightmap extents are stored as `u32`.
pub const WIDE_SURFACE_VERSION: u32 = 13;

bitflags! {
    pub struct SurfaceFlags: u8 {
        const DETAIL = 0b1;
        const AMBIGUOUS = 0b10;
        const ORPHAN = 0b100;
        const SHARED_LIGHT_MAPS = 0b1000;
        const OUTSIDE_VISIBLE = 0b10000;
    }
}

/// Which of the two incompatible surface layouts a reader is trying.
///
/// Version 0 interiors come from two producers that disagree on the surface record size, and
/// nothing in the header says which one wrote the file. A reader starts from the hypothesis
/// implied by the interior type and may switch from `Modern` to `Legacy` exactly once.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum FormatHypothesis {
    /// Surfaces end with an unused byte (and a brush id in versions 2 through 5).
    Modern,
    /// Surfaces end after the lightmap extents.
    Legacy,
}

impl FormatHypothesis {
    pub fn of(interior: &InteriorVersion) -> FormatHypothesis {
        if interior.is_tge() {
            FormatHypothesis::Legacy
        } else {
            FormatHypothesis::Modern
        }
    }
}

/// The sizes of the tables a surface refers into.
#[derive(Copy, Clone, Debug)]
pub struct SurfaceLimits {
    pub indices: usize,
    pub planes: usize,
    pub materials: usize,
    pub tex_gens: usize,
}

#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct SurfaceLightMap {
    pub final_word: u16,
    pub tex_gen_x_distance: f32,
    pub tex_gen_y_distance: f32,
}

impl Readable for SurfaceLightMap {
    fn read<R>(reader: &mut R, version: &mut Version) -> Result<Self, DifError>
    where
        R: Read + Seek,
    {
        Ok(SurfaceLightMap {
            final_word: u16::read(reader, version)?,
            tex_gen_x_distance: f32::read(reader, version)?,
            tex_gen_y_distance: f32::read(reader, version)?,
        })
    }
}

impl Writable for SurfaceLightMap {
    fn write<W>(&self, writer: &mut W, version: &Version) -> Result<(), DifError>
    where
        W: Write,
    {
        self.final_word.write(writer, version)?;
        self.tex_gen_x_distance.write(writer, version)?;
        self.tex_gen_y_distance.write(writer, version)
    }
}

/// A convex polygon drawn as a triangle strip over `index[winding_start..][..winding_count]`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Surface {
    pub winding_start: u32,
    pub winding_count: u32,
    pub plane_index: u16,
    pub plane_flipped: bool,
    pub texture_index: u16,
    pub tex_gen_index: u32,
    pub surface_flags: u8,
    pub fan_mask: u32,
    pub light_map: SurfaceLightMap,
    pub light_count: u16,
    pub light_state_info_start: u32,
    pub map_offset_x: u32,
    pub map_offset_y: u32,
    pub map_size_x: u32,
    pub map_size_y: u32,
    pub brush_id: u32,
}

impl Surface {
    pub fn flags(&self) -> SurfaceFlags {
        SurfaceFlags::from_bits_truncate(self.surface_flags)
    }

    pub fn set_flags(&mut self, flags: SurfaceFlags) {
        self.surface_flags = flags.bits();
    }

    /// The winding as a range of the interior's index buffer.
    pub fn winding(&self) -> std::ops::Range<usize> {
        let start = self.winding_start as usize;
        start..start + self.winding_count as usize
    }

    /// Reads one surface in the given layout, rejecting references outside `limits`.
    pub fn read_checked<R>(
        reader: &mut R,
        version: &mut Version,
        layout: FormatHypothesis,
        limits: &SurfaceLimits,
    ) -> Result<Surface, DifError>
    where
        R: Read + Seek,
    {
        let wide = version.interior.version >= WIDE_SURFACE_VERSION;

        let winding_start = u32::read(reader, version)?;
        let winding_count = if wide {
            u32::read(reader, version)?
        } else {
            u8::read(reader, version)? as u32
        };
        if winding_start as u64 + winding_count as u64 > limits.indices as u64 {
            return Err(DifErrorKind::WindingOutOfRange {
                start: winding_start,
                count: winding_count,
                len: limits.indices,
            }
            .into());
        }

        let raw_plane = u16::read(reader, version)?;
        let plane_flipped = raw_plane & PLANE_FLIP_FLAG != 0;
        let plane_index = raw_plane & !PLANE_FLIP_FLAG;
        check_index(plane_index, limits.planes, "surface plane")?;

        let texture_index = u16::read(reader, version)?;
        check_index(texture_index, limits.materials, "surface texture")?;

        let tex_gen_index = u32::read(reader, version)?;
        check_index(tex_gen_index, limits.tex_gens, "surface texgen")?;

        let surface_flags = u8::read(reader, version)?;
        let fan_mask = u32::read(reader, version)?;
        let light_map = SurfaceLightMap::read(reader, version)?;
        let light_count = u16::read(reader, version)?;
        let light_state_info_start = u32::read(reader, version)?;

        let mut extents = [0u32; 4];
        for e in extents.iter_mut() {
            *e = if wide {
                u32::read(reader, version)?
            } else {
                u8::read(reader, version)? as u32
            };
        }

        let mut brush_id = 0;
        if layout == FormatHypothesis::Modern {
            let _unused = u8::read(reader, version)?;
            if (2..=5).contains(&version.interior.version) {
                brush_id = u32::read(reader, version)?;
            }
        }

        Ok(Surface {
            winding_start,
            winding_count,
            plane_index,
            plane_flipped,
            texture_index,
            tex_gen_index,
            surface_flags,
            fan_mask,
            light_map,
            light_count,
            light_state_info_start,
            map_offset_x: extents[0],
            map_offset_y: extents[1],
            map_size_x: extents[2],
            map_size_y: extents[3],
            brush_id,
        })
    }
}

impl Writable for Surface {
    fn write<W>(&self, writer: &mut W, version: &Version) -> Result<(), DifError>
    where
        W: Write,
    {
        let wide = version.interior.version >= WIDE_SURFACE_VERSION;

        self.winding_start.write(writer, version)?;
        if wide {
            self.winding_count.write(writer, version)?;
        } else {
            narrow::<u32, u8>(self.winding_count, "surface winding count")?.write(writer, version)?;
        }

        if self.plane_index & PLANE_FLIP_FLAG != 0 {
            return Err(DifErrorKind::ValueTooWide {
                field: "surface plane",
                value: self.plane_index as u64,
            }
            .into());
        }
        let mut raw_plane = self.plane_index;
        if self.plane_flipped {
            raw_plane |= PLANE_FLIP_FLAG;
        }
        raw_plane.write(writer, version)?;

        self.texture_index.write(writer, version)?;
        self.tex_gen_index.write(writer, version)?;
        self.surface_flags.write(writer, version)?;
        self.fan_mask.write(writer, version)?;
        self.light_map.write(writer, version)?;
        self.light_count.write(writer, version)?;
        self.light_state_info_start.write(writer, version)?;

        for &e in [
            self.map_offset_x,
            self.map_offset_y,
            self.map_size_x,
            self.map_size_y,
        ]
        .iter()
        {
            if wide {
                e.write(writer, version)?;
            } else {
                narrow::<u32, u8>(e, "surface lightmap extent")?.write(writer, version)?;
            }
        }

        if FormatHypothesis::of(&version.interior) == FormatHypothesis::Modern {
            0u8.write(writer, version)?;
            if (2..=5).contains(&version.interior.version) {
                self.brush_id.write(writer, version)?;
            }
        }

        Ok(())
    }
}

/// A surface with no material, kept for collision only.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct NullSurface {
    pub winding_start: u32,
    pub plane_index: u16,
    pub surface_flags: u8,
    pub winding_count: u32,
}

impl NullSurface {
    fn read_sized<R>(reader: &mut R, version: &mut Version, wide: bool) -> Result<Self, DifError>
    where
        R: Read + Seek,
    {
        let winding_start = u32::read(reader, version)?;
        let plane_index = u16::read(reader, version)?;
        let surface_flags = u8::read(reader, version)?;
        let winding_count = if wide {
            u32::read(reader, version)?
        } else {
            u8::read(reader, version)? as u32
        };
        Ok(NullSurface {
            winding_start,
            plane_index,
            surface_flags,
            winding_count,
        })
    }

    fn write_sized<W>(&self, writer: &mut W, version: &Version, wide: bool) -> Result<(), DifError>
    where
        W: Write,
    {
        self.winding_start.write(writer, version)?;
        self.plane_index.write(writer, version)?;
        self.surface_flags.write(writer, version)?;
        if wide {
            self.winding_count.write(writer, version)
        } else {
            narrow::<u32, u8>(self.winding_count, "null surface winding count")?
                .write(writer, version)
        }
    }

    /// Reads a null surface as stored in vehicle collision data, which always has a `u32` count.
    pub fn read_wide<R>(reader: &mut R, version: &mut Version) -> Result<Self, DifError>
    where
        R: Read + Seek,
    {
        NullSurface::read_sized(reader, version, true)
    }

    pub fn write_wide<W>(&self, writer: &mut W, version: &Version) -> Result<(), DifError>
    where
        W: Write,
    {
        self.write_sized(writer, version, true)
    }
}

impl Readable for NullSurface {
    fn read<R>(reader: &mut R, version: &mut Version) -> Result<Self, DifError>
    where
        R: Read + Seek,
    {
        let wide = version.interior.version >= WIDE_SURFACE_VERSION;
        NullSurface::read_sized(reader, version, wide)
    }
}

impl Writable for NullSurface {
    fn write<W>(&self, writer: &mut W, version: &Version) -> Result<(), DifError>
    where
        W: Write,
    {
        self.write_sized(
            writer,
            version,
            version.interior.version >= WIDE_SURFACE_VERSION,
        )
    }
}

#[cfg(test)]
mod test {
    use super::*;

    use std::io::Cursor;

    use crate::dif::version::InteriorType;

    fn limits() -> SurfaceLimits {
        SurfaceLimits {
            indices: 8,
            planes: 4,
            materials: 2,
            tex_gens: 4,
        }
    }

    fn sample() -> Surface {
        Surface {
            winding_start: 2,
            winding_count: 3,
            plane_index: 3,
            plane_flipped: true,
            texture_index: 1,
            tex_gen_index: 0,
            surface_flags: SurfaceFlags::OUTSIDE_VISIBLE.bits(),
            fan_mask: 15,
            ..Default::default()
        }
    }

    fn read_surface(bytes: Vec<u8>, version: Version) -> Result<Surface, DifError> {
        let mut version = version;
        let layout = FormatHypothesis::of(&version.interior);
        Surface::read_checked(&mut Cursor::new(bytes), &mut version, layout, &limits())
    }

    #[test]
    fn test_flip_bit() {
        let version = Version::with_interior(0, InteriorType::Tge);
        let mut out = Vec::new();
        sample().write(&mut out, &version).unwrap();
        // winding start (4) + count (1), then the plane word
        assert_eq!(&out[5..7], &[0x03, 0x80]);

        let back = read_surface(out, version).unwrap();
        assert_eq!(back, sample());
        assert!(back.flags().contains(SurfaceFlags::OUTSIDE_VISIBLE));
    }

    #[test]
    fn test_layout_sizes() {
        let mut out = Vec::new();
        sample()
            .write(&mut out, &Version::with_interior(0, InteriorType::Mbg))
            .unwrap();
        let legacy_len = out.len();

        let mut out = Vec::new();
        sample()
            .write(&mut out, &Version::with_interior(0, InteriorType::Tgea))
            .unwrap();
        assert_eq!(out.len(), legacy_len + 1);

        let mut out = Vec::new();
        sample()
            .write(&mut out, &Version::with_interior(3, InteriorType::Tgea))
            .unwrap();
        assert_eq!(out.len(), legacy_len + 5);

        let mut out = Vec::new();
        sample()
            .write(&mut out, &Version::with_interior(13, InteriorType::Tgea))
            .unwrap();
        assert_eq!(out.len(), legacy_len + 1 + 3 + 4 * 3);
    }

    #[test]
    fn test_plane_out_of_range() {
        let version = Version::with_interior(0, InteriorType::Tge);
        let mut s = sample();
        s.plane_index = 4;
        let mut out = Vec::new();
        s.write(&mut out, &version).unwrap();
        let err = read_surface(out, version).unwrap_err();
        assert_eq!(
            err.kind(),
            DifErrorKind::IndexOutOfRange {
                field: "surface plane",
                index: 4,
                len: 4
            }
        );
    }

    #[test]
    fn test_winding_out_of_range() {
        let version = Version::with_interior(0, InteriorType::Tge);
        let mut s = sample();
        s.winding_start = 6;
        let mut out = Vec::new();
        s.write(&mut out, &version).unwrap();
        let err = read_surface(out, version).unwrap_err();
        assert_eq!(
            err.kind(),
            DifErrorKind::WindingOutOfRange {
                start: 6,
                count: 3,
                len: 8
            }
        );
    }

    #[test]
    fn test_null_surface_width() {
        let ns = NullSurface {
            winding_start: 1,
            plane_index: 2,
            surface_flags: 0,
            winding_count: 300,
        };
        let mut out = Vec::new();
        let err = ns
            .write(&mut out, &Version::with_interior(0, InteriorType::Tge))
            .unwrap_err();
        assert_eq!(
            err.kind(),
            DifErrorKind::ValueTooWide {
                field: "null surface winding count",
                value: 300
            }
        );

        let mut out = Vec::new();
        ns.write_wide(&mut out, &Version::default()).unwrap();
        let mut version = Version::default();
        let back = NullSurface::read_wide(&mut Cursor::new(out), &mut version).unwrap();
        assert_eq!(back, ns);
    }
}
