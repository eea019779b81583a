//! Binary navigation mesh file decoding and encoding
//!
//! The file is little-endian throughout. Every field of an area record is
//! consumed even when this engine ignores it, so the stream stays aligned
//! for the records that follow.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::collections::HashMap;
use std::io::{Cursor, Read, Write};

use navgraph_common::{Error, Result, Vec3};

/// Magic number for navigation mesh files
pub const NAV_MAGIC: u32 = 0xFEED_FACE;

/// Major version this engine understands
pub const NAV_MAJOR_VERSION: u32 = 16;

/// Number of directional connection lists per area
pub const NAV_DIRECTIONS: usize = 4;

/// A marked hiding position inside an area
#[derive(Debug, Clone, PartialEq)]
pub struct HidingSpot {
    pub pos: Vec3,
    pub flags: u8,
}

/// One spot along an encounter path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncounterSpot {
    pub order_id: u32,
    /// Parametric offset along the path, quantized to a byte
    pub offset: u8,
}

/// A precomputed approach route between two areas
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncounterPath {
    pub entry_area: u32,
    pub entry_dir: u8,
    pub dest_area: u32,
    pub dest_dir: u8,
    pub spots: Vec<EncounterSpot>,
}

/// Visibility relation to another area
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisibleArea {
    pub id: u32,
    pub attributes: u8,
}

/// One decoded area record.
///
/// The two stored corners are the north-west (minimum X/Y) and south-east
/// (maximum X/Y) corners; the other two corner heights are stored
/// separately to tolerate non-planar quads.
#[derive(Debug, Clone, PartialEq)]
pub struct RawArea {
    pub id: u32,
    pub flags: u32,
    pub nw: Vec3,
    pub se: Vec3,
    pub ne_z: f32,
    pub sw_z: f32,
    /// Target ids per direction, order north/east/south/west
    pub connections: [Vec<u32>; NAV_DIRECTIONS],
    pub hiding_spots: Vec<HidingSpot>,
    pub encounter_paths: Vec<EncounterPath>,
    pub place_id: u16,
    pub ladder_up: Vec<u32>,
    pub ladder_down: Vec<u32>,
    pub earliest_occupy: [f32; 2],
    pub light_intensity: [f32; 4],
    pub visible_areas: Vec<VisibleArea>,
    pub inherit_visibility_from: u32,
}

impl RawArea {
    /// Center of the area, the midpoint of the two stored diagonal corners
    pub fn center(&self) -> Vec3 {
        (self.nw + self.se) * 0.5
    }

    fn read_from<R: Read>(reader: &mut R) -> Result<Self> {
        let id = reader.read_u32::<LittleEndian>()?;
        let flags = reader.read_u32::<LittleEndian>()?;
        let nw = read_vec3(reader)?;
        let se = read_vec3(reader)?;
        let ne_z = reader.read_f32::<LittleEndian>()?;
        let sw_z = reader.read_f32::<LittleEndian>()?;

        let mut connections: [Vec<u32>; NAV_DIRECTIONS] = Default::default();
        for list in connections.iter_mut() {
            let count = reader.read_u32::<LittleEndian>()?;
            list.reserve(count as usize);
            for _ in 0..count {
                list.push(reader.read_u32::<LittleEndian>()?);
            }
        }

        let hiding_count = reader.read_u8()?;
        let mut hiding_spots = Vec::with_capacity(hiding_count as usize);
        for _ in 0..hiding_count {
            hiding_spots.push(HidingSpot {
                pos: read_vec3(reader)?,
                flags: reader.read_u8()?,
            });
        }

        let encounter_count = reader.read_u32::<LittleEndian>()?;
        let mut encounter_paths = Vec::with_capacity(encounter_count as usize);
        for _ in 0..encounter_count {
            let entry_area = reader.read_u32::<LittleEndian>()?;
            let entry_dir = reader.read_u8()?;
            let dest_area = reader.read_u32::<LittleEndian>()?;
            let dest_dir = reader.read_u8()?;
            let spot_count = reader.read_u8()?;
            let mut spots = Vec::with_capacity(spot_count as usize);
            for _ in 0..spot_count {
                spots.push(EncounterSpot {
                    order_id: reader.read_u32::<LittleEndian>()?,
                    offset: reader.read_u8()?,
                });
            }
            encounter_paths.push(EncounterPath {
                entry_area,
                entry_dir,
                dest_area,
                dest_dir,
                spots,
            });
        }

        let place_id = reader.read_u16::<LittleEndian>()?;

        let mut ladders: [Vec<u32>; 2] = Default::default();
        for list in ladders.iter_mut() {
            let count = reader.read_u32::<LittleEndian>()?;
            list.reserve(count as usize);
            for _ in 0..count {
                list.push(reader.read_u32::<LittleEndian>()?);
            }
        }
        let [ladder_up, ladder_down] = ladders;

        let earliest_occupy = [
            reader.read_f32::<LittleEndian>()?,
            reader.read_f32::<LittleEndian>()?,
        ];
        let light_intensity = [
            reader.read_f32::<LittleEndian>()?,
            reader.read_f32::<LittleEndian>()?,
            reader.read_f32::<LittleEndian>()?,
            reader.read_f32::<LittleEndian>()?,
        ];

        let visible_count = reader.read_u32::<LittleEndian>()?;
        let mut visible_areas = Vec::with_capacity(visible_count as usize);
        for _ in 0..visible_count {
            visible_areas.push(VisibleArea {
                id: reader.read_u32::<LittleEndian>()?,
                attributes: reader.read_u8()?,
            });
        }

        let inherit_visibility_from = reader.read_u32::<LittleEndian>()?;
        // Reserved trailing field, consumed for alignment.
        let _reserved = reader.read_u32::<LittleEndian>()?;

        Ok(Self {
            id,
            flags,
            nw,
            se,
            ne_z,
            sw_z,
            connections,
            hiding_spots,
            encounter_paths,
            place_id,
            ladder_up,
            ladder_down,
            earliest_occupy,
            light_intensity,
            visible_areas,
            inherit_visibility_from,
        })
    }

    fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_u32::<LittleEndian>(self.id)?;
        writer.write_u32::<LittleEndian>(self.flags)?;
        write_vec3(writer, self.nw)?;
        write_vec3(writer, self.se)?;
        writer.write_f32::<LittleEndian>(self.ne_z)?;
        writer.write_f32::<LittleEndian>(self.sw_z)?;

        for list in &self.connections {
            writer.write_u32::<LittleEndian>(list.len() as u32)?;
            for &target in list {
                writer.write_u32::<LittleEndian>(target)?;
            }
        }

        writer.write_u8(self.hiding_spots.len() as u8)?;
        for spot in &self.hiding_spots {
            write_vec3(writer, spot.pos)?;
            writer.write_u8(spot.flags)?;
        }

        writer.write_u32::<LittleEndian>(self.encounter_paths.len() as u32)?;
        for path in &self.encounter_paths {
            writer.write_u32::<LittleEndian>(path.entry_area)?;
            writer.write_u8(path.entry_dir)?;
            writer.write_u32::<LittleEndian>(path.dest_area)?;
            writer.write_u8(path.dest_dir)?;
            writer.write_u8(path.spots.len() as u8)?;
            for spot in &path.spots {
                writer.write_u32::<LittleEndian>(spot.order_id)?;
                writer.write_u8(spot.offset)?;
            }
        }

        writer.write_u16::<LittleEndian>(self.place_id)?;

        for list in [&self.ladder_up, &self.ladder_down] {
            writer.write_u32::<LittleEndian>(list.len() as u32)?;
            for &target in list {
                writer.write_u32::<LittleEndian>(target)?;
            }
        }

        for value in self.earliest_occupy {
            writer.write_f32::<LittleEndian>(value)?;
        }
        for value in self.light_intensity {
            writer.write_f32::<LittleEndian>(value)?;
        }

        writer.write_u32::<LittleEndian>(self.visible_areas.len() as u32)?;
        for visible in &self.visible_areas {
            writer.write_u32::<LittleEndian>(visible.id)?;
            writer.write_u8(visible.attributes)?;
        }

        writer.write_u32::<LittleEndian>(self.inherit_visibility_from)?;
        writer.write_u32::<LittleEndian>(0)?;
        Ok(())
    }
}

/// A fully decoded navigation mesh file
#[derive(Debug, Clone, PartialEq)]
pub struct NavFile {
    pub minor_version: u32,
    pub bsp_size: u32,
    pub analyzed: bool,
    pub places: Vec<String>,
    pub areas: Vec<RawArea>,
}

impl NavFile {
    /// Decodes a mesh file from raw bytes.
    ///
    /// Fails on a magic or major-version mismatch and on a mesh with zero
    /// areas; no partial result is returned.
    pub fn parse(bytes: &[u8]) -> Result<NavFile> {
        let mut reader = Cursor::new(bytes);

        let magic = reader.read_u32::<LittleEndian>()?;
        if magic != NAV_MAGIC {
            return Err(Error::WrongMagic(magic));
        }
        let version = reader.read_u32::<LittleEndian>()?;
        if version != NAV_MAJOR_VERSION {
            return Err(Error::WrongVersion(version));
        }

        let minor_version = reader.read_u32::<LittleEndian>()?;
        let bsp_size = reader.read_u32::<LittleEndian>()?;
        let analyzed = reader.read_u8()? != 0;

        let place_count = reader.read_u16::<LittleEndian>()?;
        let mut places = Vec::with_capacity(place_count as usize);
        for _ in 0..place_count {
            let len = reader.read_u16::<LittleEndian>()?;
            let mut buf = vec![0u8; len as usize];
            reader.read_exact(&mut buf)?;
            places.push(String::from_utf8_lossy(&buf).into_owned());
        }

        let area_count = reader.read_u32::<LittleEndian>()?;
        if area_count == 0 {
            return Err(Error::EmptyMesh);
        }
        let mut areas = Vec::with_capacity(area_count as usize);
        for _ in 0..area_count {
            areas.push(RawArea::read_from(&mut reader)?);
        }

        Ok(NavFile {
            minor_version,
            bsp_size,
            analyzed,
            places,
            areas,
        })
    }

    /// Encodes the mesh file to a writer, the exact inverse of [`parse`].
    ///
    /// [`parse`]: NavFile::parse
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_u32::<LittleEndian>(NAV_MAGIC)?;
        writer.write_u32::<LittleEndian>(NAV_MAJOR_VERSION)?;
        writer.write_u32::<LittleEndian>(self.minor_version)?;
        writer.write_u32::<LittleEndian>(self.bsp_size)?;
        writer.write_u8(self.analyzed as u8)?;

        writer.write_u16::<LittleEndian>(self.places.len() as u16)?;
        for place in &self.places {
            writer.write_u16::<LittleEndian>(place.len() as u16)?;
            writer.write_all(place.as_bytes())?;
        }

        writer.write_u32::<LittleEndian>(self.areas.len() as u32)?;
        for area in &self.areas {
            area.write_to(writer)?;
        }
        Ok(())
    }

    /// Encodes the mesh file into a byte vector
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        self.write_to(&mut out)?;
        Ok(out)
    }
}

fn read_vec3<R: Read>(reader: &mut R) -> Result<Vec3> {
    Ok(Vec3::new(
        reader.read_f32::<LittleEndian>()?,
        reader.read_f32::<LittleEndian>()?,
        reader.read_f32::<LittleEndian>()?,
    ))
}

fn write_vec3<W: Write>(writer: &mut W, v: Vec3) -> Result<()> {
    writer.write_f32::<LittleEndian>(v.x)?;
    writer.write_f32::<LittleEndian>(v.y)?;
    writer.write_f32::<LittleEndian>(v.z)?;
    Ok(())
}

/// FNV-1a over the raw file bytes, the memoization key for [`ParseCache`]
fn checksum(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for &b in bytes {
        hash ^= b as u64;
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash
}

/// Memoizes parses by input checksum so an unchanged file is only decoded
/// once per process lifetime.
#[derive(Debug, Default)]
pub struct ParseCache {
    entries: HashMap<u64, NavFile>,
}

impl ParseCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses the bytes, returning the cached result when the checksum is
    /// already known. Parse failures are not cached.
    pub fn parse(&mut self, bytes: &[u8]) -> Result<&NavFile> {
        let key = checksum(bytes);
        if !self.entries.contains_key(&key) {
            let file = NavFile::parse(bytes)?;
            self.entries.insert(key, file);
        }
        Ok(&self.entries[&key])
    }

    /// Number of distinct files decoded so far
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
