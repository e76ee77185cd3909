//! Projectile (PRO V1.0) definitions.
//!
//! Every projectile has a 0x100-byte header and a 0x100-byte animation
//! block. Area-of-effect projectiles (type 3) append a third block that
//! describes the explosion.

use std::io::{Cursor, Read, Seek, SeekFrom};

use bitflags::bitflags;
use byteorder::{LittleEndian, ReadBytesExt};
use serde::Serialize;

use crate::error::{FormatError, Result};
use crate::resref::ResRef;

pub const PRO_SIGNATURE: &[u8; 8] = b"PRO V1.0";

const HEADER_SIZE: usize = 0x100;
const BAM_SIZE: usize = 0x100;
const AREA_SIZE: usize = 0x100;
/// `kind` value of projectiles carrying an area extension.
pub const AREA_PROJECTILE: u16 = 3;
/// Explosion types at or above this have no explosion table row.
pub const NO_EXPLOSION: u8 = 0xff;

bitflags! {
    /// Area extension behaviour bits. Unknown bits are kept as read.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
    pub struct AreaFlags: u32 {
        const VISIBLE = 0x0001;
        const INANIMATE = 0x0002;
        const TRIGGER = 0x0004;
        const SYNC = 0x0008;
        const SECONDARY = 0x0010;
        const FRAGMENT = 0x0020;
        const ENEMY = 0x0040;
        const PARTY = 0x0080;
        const MAGE_LEVEL = 0x0100;
        const PRIEST_LEVEL = 0x0200;
        /// Draw the centre animation named by `vvc`.
        const VVC = 0x0400;
        const CONE = 0x0800;
        const _ = !0;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct IdsTarget {
    pub value: u16,
    pub kind: u16,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct BamSection {
    pub flags: u32,
    pub animation: ResRef,
    pub shadow: ResRef,
    pub sequence: u8,
    pub shadow_sequence: u8,
    pub light_intensity: u16,
    pub light_width: u16,
    pub light_height: u16,
    pub palette: ResRef,
    pub gradient: [u8; 7],
    pub smoke_period: u8,
    pub smoke_colors: [u8; 7],
    pub face_granularity: u8,
    pub smoke_animation: u16,
    pub trails: [ResRef; 3],
    pub trail_delays: [u16; 3],
    pub trail_flags: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct AreaExtension {
    pub flags: AreaFlags,
    pub trigger_radius: u16,
    pub explosion_radius: u16,
    /// Sound of the first explosion.
    pub sound: ResRef,
    pub delay: u16,
    pub fragment_animation: u16,
    pub fragment_projectile: u16,
    pub trigger_count: u8,
    pub explosion_type: u8,
    pub explosion_color: u16,
    pub explosion_projectile: u16,
    pub vvc: ResRef,
    pub cone_width: u16,
    pub spread: ResRef,
    pub secondary: ResRef,
    /// Sound of every later explosion.
    pub area_sound: ResRef,
    pub ap_flags: u32,
    pub dice_count: u16,
    pub dice_size: u16,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ProjectileRecord {
    pub name: ResRef,
    pub index: u32,
    pub kind: u16,
    pub speed: u16,
    pub sparkle_flags: u32,
    pub fire_sound: ResRef,
    pub arrival_sound: ResRef,
    pub travel_vvc: ResRef,
    pub spark_color: u16,
    pub extension_flags: u32,
    pub strref: u32,
    pub color: u32,
    pub color_speed: u16,
    pub screen_shake: u16,
    pub targets: [IdsTarget; 2],
    pub default_spell: ResRef,
    pub success_spell: ResRef,
    pub bam: BamSection,
    pub extension: Option<AreaExtension>,
}

impl ProjectileRecord {
    /// Empty record standing in for a projectile that could not be loaded.
    pub fn placeholder(name: ResRef, index: u32) -> Self {
        let mut record = ProjectileRecord::default();
        record.set_identifiers(name, index);
        record
    }

    pub fn set_identifiers(&mut self, name: ResRef, index: u32) {
        self.name = name;
        self.index = index;
    }

    /// Explosion table row of this projectile, if it explodes at all.
    pub fn explosion_type(&self) -> Option<u8> {
        self.extension
            .as_ref()
            .map(|ext| ext.explosion_type)
            .filter(|&kind| kind < NO_EXPLOSION)
    }

    pub fn decode<R: Read + Seek>(reader: &mut R) -> Result<Self> {
        let len = reader.seek(SeekFrom::End(0))?;
        reader.seek(SeekFrom::Start(0))?;
        let needed = (HEADER_SIZE + BAM_SIZE) as u64;
        if len < needed {
            return Err(FormatError::TruncatedRecord {
                section: "projectile header",
                start: 0,
                end: needed,
                len,
            });
        }
        let mut fixed = vec![0u8; HEADER_SIZE + BAM_SIZE];
        reader.read_exact(&mut fixed)?;
        if &fixed[..8] != PRO_SIGNATURE {
            return Err(FormatError::UnsupportedFormat {
                signature: String::from_utf8_lossy(&fixed[..8]).into_owned(),
            });
        }

        let mut record = read_header(&fixed[..HEADER_SIZE])?;
        record.bam = read_bam(&fixed[HEADER_SIZE..])?;

        if record.kind == AREA_PROJECTILE {
            let end = needed + AREA_SIZE as u64;
            if len < end {
                return Err(FormatError::TruncatedRecord {
                    section: "projectile area extension",
                    start: needed,
                    end,
                    len,
                });
            }
            let mut area = vec![0u8; AREA_SIZE];
            reader.read_exact(&mut area)?;
            record.extension = Some(read_area(&area)?);
        }
        Ok(record)
    }
}

fn read_header(raw: &[u8]) -> std::io::Result<ProjectileRecord> {
    let mut cursor = Cursor::new(raw);
    cursor.set_position(0x08);
    let kind = cursor.read_u16::<LittleEndian>()?;
    let speed = cursor.read_u16::<LittleEndian>()?;
    let sparkle_flags = cursor.read_u32::<LittleEndian>()?;
    let fire_sound = ResRef::read_from(&mut cursor)?;
    let arrival_sound = ResRef::read_from(&mut cursor)?;
    let travel_vvc = ResRef::read_from(&mut cursor)?;
    let spark_color = cursor.read_u16::<LittleEndian>()?;
    cursor.set_position(0x2c);
    let extension_flags = cursor.read_u32::<LittleEndian>()?;
    let strref = cursor.read_u32::<LittleEndian>()?;
    let color = cursor.read_u32::<LittleEndian>()?;
    let color_speed = cursor.read_u16::<LittleEndian>()?;
    let screen_shake = cursor.read_u16::<LittleEndian>()?;
    let mut targets = [IdsTarget::default(); 2];
    for target in &mut targets {
        target.value = cursor.read_u16::<LittleEndian>()?;
        target.kind = cursor.read_u16::<LittleEndian>()?;
    }
    let default_spell = ResRef::read_from(&mut cursor)?;
    let success_spell = ResRef::read_from(&mut cursor)?;

    Ok(ProjectileRecord {
        kind,
        speed,
        sparkle_flags,
        fire_sound,
        arrival_sound,
        travel_vvc,
        spark_color,
        extension_flags,
        strref,
        color,
        color_speed,
        screen_shake,
        targets,
        default_spell,
        success_spell,
        ..ProjectileRecord::default()
    })
}

fn read_bam(raw: &[u8]) -> std::io::Result<BamSection> {
    let mut cursor = Cursor::new(raw);
    let mut bam = BamSection {
        flags: cursor.read_u32::<LittleEndian>()?,
        animation: ResRef::read_from(&mut cursor)?,
        shadow: ResRef::read_from(&mut cursor)?,
        sequence: cursor.read_u8()?,
        shadow_sequence: cursor.read_u8()?,
        light_intensity: cursor.read_u16::<LittleEndian>()?,
        light_width: cursor.read_u16::<LittleEndian>()?,
        light_height: cursor.read_u16::<LittleEndian>()?,
        palette: ResRef::read_from(&mut cursor)?,
        ..BamSection::default()
    };
    cursor.read_exact(&mut bam.gradient)?;
    bam.smoke_period = cursor.read_u8()?;
    cursor.read_exact(&mut bam.smoke_colors)?;
    bam.face_granularity = cursor.read_u8()?;
    bam.smoke_animation = cursor.read_u16::<LittleEndian>()?;
    for trail in &mut bam.trails {
        *trail = ResRef::read_from(&mut cursor)?;
    }
    cursor.read_u16_into::<LittleEndian>(&mut bam.trail_delays)?;
    bam.trail_flags = cursor.read_u32::<LittleEndian>()?;
    Ok(bam)
}

fn read_area(raw: &[u8]) -> std::io::Result<AreaExtension> {
    let mut cursor = Cursor::new(raw);
    let flags = AreaFlags::from_bits_retain(cursor.read_u32::<LittleEndian>()?);
    let trigger_radius = cursor.read_u16::<LittleEndian>()?;
    let explosion_radius = cursor.read_u16::<LittleEndian>()?;
    let sound = ResRef::read_from(&mut cursor)?;
    let delay = cursor.read_u16::<LittleEndian>()?;
    let fragment_animation = cursor.read_u16::<LittleEndian>()?;
    let fragment_projectile = cursor.read_u16::<LittleEndian>()?;
    let trigger_count = cursor.read_u8()?;
    let explosion_type = cursor.read_u8()?;
    let explosion_color = cursor.read_u16::<LittleEndian>()?;
    let explosion_projectile = cursor.read_u16::<LittleEndian>()?;
    let vvc = ResRef::read_from(&mut cursor)?;
    let cone_width = cursor.read_u16::<LittleEndian>()?;
    cursor.set_position(0x28);
    let spread = ResRef::read_from(&mut cursor)?;
    let secondary = ResRef::read_from(&mut cursor)?;
    let area_sound = ResRef::read_from(&mut cursor)?;
    let ap_flags = cursor.read_u32::<LittleEndian>()?;
    let dice_count = cursor.read_u16::<LittleEndian>()?;
    let dice_size = cursor.read_u16::<LittleEndian>()?;

    Ok(AreaExtension {
        flags,
        trigger_radius,
        explosion_radius,
        sound,
        delay,
        fragment_animation,
        fragment_projectile,
        trigger_count,
        explosion_type,
        explosion_color,
        explosion_projectile,
        vvc,
        cone_width,
        spread,
        secondary,
        area_sound,
        ap_flags,
        dice_count,
        dice_size,
    })
}
