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

//! Interior resource (DIF) file handling.
//!
//! # File Format
//!
//! A DIF file is a flat little-endian stream with no directory: every block follows the one
//! before it, and most blocks are counted lists. The header is only the container version, which
//! is always 44.
//!
//! The blocks are, in order:
//!
//! ```text
//! u32              container version (44)
//! u8 [+ png]       preview image flag and image
//! Vec<Interior>    the level geometry
//! Vec<Interior>    sub-objects (moving platforms and the like)
//! Vec<Trigger>
//! Vec<InteriorPathFollower>
//! Vec<ForceField>
//! Vec<AiSpecialNode>
//! u32 [+ block]    vehicle collision flag and block
//! u32 [+ list]     game entity flag (2 when a list follows) and entities
//! u32              reserved, missing from some files
//! ```
//!
//! ## Versions
//!
//! Nearly every block changes shape with the interior version and with which producer wrote the
//! file, and the file itself names only part of that. Reading therefore threads a mutable
//! [`Version`] through every call. The reader fills it in as it goes and the caller gets the
//! resolved descriptor back. Writing takes the descriptor as given.
//!
//! ## Strings and images
//!
//! Strings are a `u8` length followed by raw bytes. Embedded PNG images (the preview and
//! lightmaps) carry no length at all; they end where the PNG trailer ends.

pub mod entity;
pub mod error;
pub mod force_field;
pub mod interior;
pub mod io;
pub mod path_follower;
pub mod trigger;
pub mod types;
pub mod vehicle_collision;
pub mod version;

pub use self::{
    entity::{AiSpecialNode, GameEntity},
    error::{DifError, DifErrorKind},
    force_field::ForceField,
    interior::Interior,
    io::{Readable, Writable},
    path_follower::InteriorPathFollower,
    trigger::Trigger,
    types::{BoxF, ColorI, Dictionary, PlaneF, Png, SphereF},
    vehicle_collision::VehicleCollision,
    version::{DifType, InteriorType, Version, DIF_VERSION},
};

use std::{
    fs::{self, File},
    io::{BufReader, BufWriter, Read, Seek, Write},
    path::{Path, PathBuf},
};

use failure::ResultExt;

/// Game entity flag value announcing that an entity list follows.
const GAME_ENTITY_LIST: u32 = 2;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Dif {
    pub preview: Option<Png>,
    pub interiors: Vec<Interior>,
    pub sub_objects: Vec<Interior>,
    pub triggers: Vec<Trigger>,
    pub path_followers: Vec<InteriorPathFollower>,
    pub force_fields: Vec<ForceField>,
    pub ai_special_nodes: Vec<AiSpecialNode>,
    pub vehicle_collision: Option<VehicleCollision>,
    pub game_entities: Vec<GameEntity>,
}

impl Dif {
    /// Reads a DIF from `reader`, starting from an unknown version.
    pub fn from_reader<R>(reader: &mut R) -> Result<(Dif, Version), DifError>
    where
        R: Read + Seek,
    {
        let mut version = Version::default();
        let dif = Dif::read(reader, &mut version)?;
        Ok((dif, version))
    }

    pub fn load<P>(path: P) -> Result<(Dif, Version), DifError>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        debug!("Loading {}", path.display());
        let file = File::open(path).context(DifErrorKind::Io)?;
        Dif::from_reader(&mut BufReader::new(file))
    }

    /// Writes the file to a temporary sibling of `path` and moves it into place once complete.
    pub fn save<P>(&self, path: P, version: &Version) -> Result<(), DifError>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        let tmp = temp_path(path);
        debug!("Saving {} via {}", path.display(), tmp.display());

        let result = self.save_to(&tmp, version);
        if result.is_err() {
            let _ = fs::remove_file(&tmp);
            return result;
        }

        fs::rename(&tmp, path).context(DifErrorKind::Io)?;
        Ok(())
    }

    fn save_to(&self, path: &Path, version: &Version) -> Result<(), DifError> {
        let file = File::create(path).context(DifErrorKind::Io)?;
        let mut writer = BufWriter::new(file);
        self.write(&mut writer, version)?;
        writer.flush().context(DifErrorKind::Io)?;
        writer
            .get_ref()
            .sync_all()
            .context(DifErrorKind::Io)?;
        Ok(())
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

impl Readable for Dif {
    fn read<R>(reader: &mut R, version: &mut Version) -> Result<Self, DifError>
    where
        R: Read + Seek,
    {
        let found = u32::read(reader, version)?;
        if found != DIF_VERSION {
            return Err(DifErrorKind::InvalidMagic { found }.into());
        }
        version.dif.version = found;

        let mut dif = Dif::default();
        if u8::read(reader, version)? != 0 {
            dif.preview = Some(Png::read(reader, version)?);
        }

        dif.interiors = Vec::read(reader, version)?;
        dif.sub_objects = Vec::read(reader, version)?;
        dif.triggers = Vec::read(reader, version)?;
        dif.path_followers = Vec::read(reader, version)?;
        dif.force_fields = Vec::read(reader, version)?;
        dif.ai_special_nodes = Vec::read(reader, version)?;

        if u32::read(reader, version)? != 0 {
            dif.vehicle_collision = Some(VehicleCollision::read(reader, version)?);
        }

        if u32::read(reader, version)? == GAME_ENTITY_LIST {
            dif.game_entities = Vec::read(reader, version)?;
        }

        if u32::read(reader, version).is_err() {
            warn!("DIF is missing its trailing reserved word");
        }

        if version.dif.ty == DifType::Unknown {
            version.dif.ty = if version.interior.ty == InteriorType::Mbg {
                DifType::Mbg
            } else {
                DifType::Tge
            };
        }

        debug!(
            "Read DIF: {} interiors, {} sub-objects, {} triggers, {} path followers ({}/{} v{})",
            dif.interiors.len(),
            dif.sub_objects.len(),
            dif.triggers.len(),
            dif.path_followers.len(),
            version.dif.ty,
            version.interior.ty,
            version.interior.version
        );

        Ok(dif)
    }
}

impl Writable for Dif {
    fn write<W>(&self, writer: &mut W, version: &Version) -> Result<(), DifError>
    where
        W: Write,
    {
        version.dif.version.write(writer, version)?;

        match self.preview {
            Some(ref png) => {
                1u8.write(writer, version)?;
                png.write(writer, version)?;
            }
            None => 0u8.write(writer, version)?,
        }

        self.interiors.write(writer, version)?;
        self.sub_objects.write(writer, version)?;
        self.triggers.write(writer, version)?;
        self.path_followers.write(writer, version)?;
        self.force_fields.write(writer, version)?;
        self.ai_special_nodes.write(writer, version)?;

        match self.vehicle_collision {
            Some(ref vc) => {
                1u32.write(writer, version)?;
                vc.write(writer, version)?;
            }
            None => 0u32.write(writer, version)?,
        }

        if self.game_entities.is_empty() {
            0u32.write(writer, version)?;
        } else {
            GAME_ENTITY_LIST.write(writer, version)?;
            self.game_entities.write(writer, version)?;
        }

        0u32.write(writer, version)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    use std::io::Cursor;

    use cgmath::{Quaternion, Vector3};

    use crate::dif::{
        interior::{CoordBin, Plane, Surface, TexGenEq, COORD_BIN_COUNT},
        path_follower::WayPoint,
        trigger::Polyhedron,
        types::PNG_TRAILER,
    };

    fn interior() -> Interior {
        let mut it = Interior::default();
        it.normals = vec![Vector3::new(0.0, 0.0, 1.0)];
        it.planes = vec![Plane {
            normal_index: 0,
            plane_distance: -1.0,
        }];
        it.points = vec![
            Vector3::new(0.0, 0.0, 1.0),
            Vector3::new(1.0, 0.0, 1.0),
            Vector3::new(1.0, 1.0, 1.0),
            Vector3::new(0.0, 1.0, 1.0),
        ];
        it.point_visibility = vec![0xFF; 4];
        it.tex_gen_eqs = vec![TexGenEq {
            plane_x: PlaneF::new(1.0, 0.0, 0.0, 0.0),
            plane_y: PlaneF::new(0.0, 1.0, 0.0, 0.0),
        }];
        it.material_names = vec!["stone".to_owned()];
        it.indices = vec![0, 1, 2, 0, 2, 3];
        it.surfaces = vec![
            Surface {
                winding_start: 0,
                winding_count: 3,
                ..Default::default()
            },
            Surface {
                winding_start: 3,
                winding_count: 3,
                ..Default::default()
            },
        ];
        it.normal_lmap_indices = vec![0, 0];
        it.alarm_lmap_indices = vec![0, 0];
        it.coord_bins = vec![CoordBin::default(); COORD_BIN_COUNT];
        it
    }

    fn preview() -> Png {
        let mut data = vec![0x89, b'P', b'N', b'G'];
        data.extend_from_slice(&PNG_TRAILER);
        Png { data }
    }

    fn full_dif(trigger_properties: Dictionary) -> Dif {
        let mut entity_properties = Dictionary::new();
        entity_properties.insert("rotation", "1 0 0 0");

        Dif {
            preview: Some(preview()),
            interiors: vec![interior()],
            sub_objects: vec![interior()],
            triggers: vec![Trigger {
                name: "t".to_owned(),
                datablock: "InBoundsTrigger".to_owned(),
                properties: trigger_properties,
                polyhedron: Polyhedron::default(),
                offset: Vector3::new(1.0, 2.0, 3.0),
            }],
            path_followers: vec![InteriorPathFollower {
                name: "mover".to_owned(),
                datablock: "PathedDefault".to_owned(),
                interior_res_index: 0,
                offset: Vector3::new(0.0, 0.0, 0.0),
                properties: Dictionary::new(),
                trigger_ids: vec![0],
                way_points: vec![WayPoint {
                    position: Vector3::new(0.0, 0.0, 5.0),
                    rotation: Quaternion::new(1.0, 0.0, 0.0, 0.0),
                    ms_to_next: 2000,
                    smoothing_type: 0,
                }],
                total_ms: 2000,
            }],
            force_fields: Vec::new(),
            ai_special_nodes: vec![AiSpecialNode {
                name: "node".to_owned(),
                position: Vector3::new(4.0, 5.0, 6.0),
            }],
            vehicle_collision: Some(VehicleCollision::default()),
            game_entities: vec![GameEntity {
                datablock: "GemItem".to_owned(),
                game_class: "Item".to_owned(),
                position: Vector3::new(0.5, 0.5, 1.0),
                properties: entity_properties,
            }],
        }
    }

    fn to_bytes(dif: &Dif, version: &Version) -> Vec<u8> {
        let mut out = Vec::new();
        dif.write(&mut out, version).unwrap();
        out
    }

    #[test]
    fn test_write_read_write_identical() {
        let dif = full_dif(Dictionary::new());
        let first = to_bytes(&dif, &Version::with_interior(0, InteriorType::Tgea));

        let (back, version) = Dif::from_reader(&mut Cursor::new(first.clone())).unwrap();
        assert_eq!(version.interior.ty, InteriorType::Tgea);
        assert_eq!(version.dif.ty, DifType::Tge);
        assert_eq!(back, dif);

        let second = to_bytes(&back, &version);
        assert_eq!(first, second);
    }

    #[test]
    fn test_mbg_fallback_reads_trigger_properties() {
        let mut properties = Dictionary::new();
        properties.insert("centerOnPoint", "1");
        let dif = full_dif(properties);
        let first = to_bytes(&dif, &Version::with_interior(0, InteriorType::Mbg));

        let (back, version) = Dif::from_reader(&mut Cursor::new(first.clone())).unwrap();
        assert_eq!(version.interior.ty, InteriorType::Mbg);
        assert_eq!(version.dif.ty, DifType::Mbg);
        assert_eq!(back.triggers[0].properties.get("centerOnPoint"), Some("1"));
        assert_eq!(to_bytes(&back, &version), first);
    }

    #[test]
    fn test_invalid_magic() {
        let mut version = Version::default();
        let err = Dif::read(&mut Cursor::new(vec![43, 0, 0, 0]), &mut version).unwrap_err();
        assert_eq!(err.kind(), DifErrorKind::InvalidMagic { found: 43 });
    }

    #[test]
    fn test_missing_reserved_word() {
        let dif = Dif::default();
        let mut bytes = to_bytes(&dif, &Version::default());
        let len = bytes.len();
        bytes.truncate(len - 4);

        let (back, version) = Dif::from_reader(&mut Cursor::new(bytes)).unwrap();
        assert_eq!(back, dif);
        // no interiors to decide from
        assert_eq!(version.dif.ty, DifType::Tge);
    }

    #[test]
    fn test_game_entity_flag() {
        let mut dif = Dif::default();
        let bytes = to_bytes(&dif, &Version::default());
        // empty entity list: flag 0 then the reserved word
        assert_eq!(&bytes[bytes.len() - 8..], &[0; 8]);

        dif.game_entities.push(GameEntity {
            datablock: String::new(),
            game_class: String::new(),
            position: Vector3::new(0.0, 0.0, 0.0),
            properties: Dictionary::new(),
        });
        let bytes = to_bytes(&dif, &Version::default());
        let (back, _) = Dif::from_reader(&mut Cursor::new(bytes)).unwrap();
        assert_eq!(back.game_entities.len(), 1);
    }

    #[test]
    fn test_out_of_range_surface_fails_whole_read() {
        let mut dif = full_dif(Dictionary::new());
        dif.interiors[0].surfaces[1].tex_gen_index = 1;
        let version = Version::with_interior(3, InteriorType::Tgea);
        let bytes = to_bytes(&dif, &version);

        let mut read_version = version;
        let err = Dif::read(&mut Cursor::new(bytes), &mut read_version).unwrap_err();
        assert_eq!(
            err.kind(),
            DifErrorKind::IndexOutOfRange {
                field: "surface texgen",
                index: 1,
                len: 1
            }
        );
    }

    #[test]
    fn test_save_and_load() {
        let dir = std::env::temp_dir().join(format!("difforge-test-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("cube.dif");

        let dif = full_dif(Dictionary::new());
        let version = Version::with_interior(0, InteriorType::Tgea);
        dif.save(&path, &version).unwrap();
        assert!(!temp_path(&path).exists());

        let (back, _) = Dif::load(&path).unwrap();
        assert_eq!(back, dif);
        fs::remove_dir_all(&dir).unwrap();
    }
}
