use std::io::{self, Cursor, Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use serde::Serialize;

use super::actor::ModifierKind;
use super::{read_fixed_string, write_fixed_string};
use crate::resref::ResRef;

const V1_ENTRY_SIZE: usize = 0x30;
const V2_ENTRY_SIZE: usize = 0x108;
const VARIABLE_LEN: usize = 32;

/// Timing modes that wait for a trigger before taking effect.
const DELAYED_TIMINGS: [u32; 3] = [3, 4, 5];

/// On-disk effect entry layout used by a creature generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EffectFormat {
    /// Compact 0x30-byte entries.
    V1,
    /// 0x108-byte entries shared with standalone effect files.
    V2,
}

impl EffectFormat {
    pub fn entry_size(self) -> usize {
        match self {
            EffectFormat::V1 => V1_ENTRY_SIZE,
            EffectFormat::V2 => V2_ENTRY_SIZE,
        }
    }

    /// Value stored in the creature header's effect-version byte.
    pub fn header_flag(self) -> u8 {
        match self {
            EffectFormat::V1 => 0,
            EffectFormat::V2 => 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Effect {
    pub opcode: u32,
    pub target: u32,
    pub power: u32,
    pub parameter1: i32,
    pub parameter2: u32,
    pub timing: u32,
    pub resistance: u32,
    pub duration: u32,
    pub probability1: u16,
    pub probability2: u16,
    pub resource: ResRef,
    pub dice_thrown: u32,
    pub dice_sides: u32,
    pub saving_throw: u32,
    pub save_bonus: i32,
    pub special: u32,
    // Only persisted by the version-2 layout.
    pub primary_type: u32,
    pub min_level: u32,
    pub max_level: u32,
    pub parameter3: u32,
    pub parameter4: u32,
    pub resource2: ResRef,
    pub resource3: ResRef,
    pub variable: String,
    pub caster_level: u32,
}

impl Effect {
    /// Permanent stat modifier targeting self.
    pub fn stat_modifier(opcode: u32, value: i32, kind: ModifierKind) -> Self {
        Effect {
            opcode,
            target: 1,
            parameter1: value,
            parameter2: kind as u32,
            timing: 9,
            probability1: 100,
            ..Effect::default()
        }
    }

    pub fn is_active(&self) -> bool {
        !DELAYED_TIMINGS.contains(&self.timing)
    }

    pub fn decode(entry: &[u8], format: EffectFormat) -> io::Result<Self> {
        let mut cursor = Cursor::new(entry);
        match format {
            EffectFormat::V1 => read_v1(&mut cursor),
            EffectFormat::V2 => read_v2(&mut cursor),
        }
    }

    pub fn encode<W: Write>(&self, writer: &mut W, format: EffectFormat) -> io::Result<()> {
        match format {
            EffectFormat::V1 => write_v1(self, writer),
            EffectFormat::V2 => write_v2(self, writer),
        }
    }
}

fn read_v1<R: Read>(reader: &mut R) -> io::Result<Effect> {
    let opcode = u32::from(reader.read_u16::<LittleEndian>()?);
    let target = u32::from(reader.read_u8()?);
    let power = u32::from(reader.read_u8()?);
    let parameter1 = reader.read_i32::<LittleEndian>()?;
    let parameter2 = reader.read_u32::<LittleEndian>()?;
    let timing = u32::from(reader.read_u8()?);
    let resistance = u32::from(reader.read_u8()?);
    let duration = reader.read_u32::<LittleEndian>()?;
    let probability1 = u16::from(reader.read_u8()?);
    let probability2 = u16::from(reader.read_u8()?);
    let resource = ResRef::read_from(reader)?;
    let dice_thrown = reader.read_u32::<LittleEndian>()?;
    let dice_sides = reader.read_u32::<LittleEndian>()?;
    let saving_throw = reader.read_u32::<LittleEndian>()?;
    let save_bonus = reader.read_i32::<LittleEndian>()?;
    let special = reader.read_u32::<LittleEndian>()?;

    Ok(Effect {
        opcode,
        target,
        power,
        parameter1,
        parameter2,
        timing,
        resistance,
        duration,
        probability1,
        probability2,
        resource,
        dice_thrown,
        dice_sides,
        saving_throw,
        save_bonus,
        special,
        ..Effect::default()
    })
}

fn write_v1<W: Write>(fx: &Effect, writer: &mut W) -> io::Result<()> {
    writer.write_u16::<LittleEndian>(fx.opcode as u16)?;
    writer.write_u8(fx.target as u8)?;
    writer.write_u8(fx.power as u8)?;
    writer.write_i32::<LittleEndian>(fx.parameter1)?;
    writer.write_u32::<LittleEndian>(fx.parameter2)?;
    writer.write_u8(fx.timing as u8)?;
    writer.write_u8(fx.resistance as u8)?;
    writer.write_u32::<LittleEndian>(fx.duration)?;
    writer.write_u8(fx.probability1 as u8)?;
    writer.write_u8(fx.probability2 as u8)?;
    fx.resource.write_to(writer)?;
    writer.write_u32::<LittleEndian>(fx.dice_thrown)?;
    writer.write_u32::<LittleEndian>(fx.dice_sides)?;
    writer.write_u32::<LittleEndian>(fx.saving_throw)?;
    writer.write_i32::<LittleEndian>(fx.save_bonus)?;
    writer.write_u32::<LittleEndian>(fx.special)?;
    Ok(())
}

fn read_v2<R: Read>(reader: &mut R) -> io::Result<Effect> {
    skip(reader, 8)?;
    let opcode = reader.read_u32::<LittleEndian>()?;
    let target = reader.read_u32::<LittleEndian>()?;
    let power = reader.read_u32::<LittleEndian>()?;
    let parameter1 = reader.read_i32::<LittleEndian>()?;
    let parameter2 = reader.read_u32::<LittleEndian>()?;
    let timing = u32::from(reader.read_u16::<LittleEndian>()?);
    skip(reader, 2)?;
    let duration = reader.read_u32::<LittleEndian>()?;
    let probability1 = reader.read_u16::<LittleEndian>()?;
    let probability2 = reader.read_u16::<LittleEndian>()?;
    let resource = ResRef::read_from(reader)?;
    let dice_thrown = reader.read_u32::<LittleEndian>()?;
    let dice_sides = reader.read_u32::<LittleEndian>()?;
    let saving_throw = reader.read_u32::<LittleEndian>()?;
    let save_bonus = reader.read_i32::<LittleEndian>()?;
    let special = reader.read_u32::<LittleEndian>()?;
    let primary_type = reader.read_u32::<LittleEndian>()?;
    skip(reader, 4)?;
    let min_level = reader.read_u32::<LittleEndian>()?;
    let max_level = reader.read_u32::<LittleEndian>()?;
    let resistance = reader.read_u32::<LittleEndian>()?;
    let parameter3 = reader.read_u32::<LittleEndian>()?;
    let parameter4 = reader.read_u32::<LittleEndian>()?;
    // 0x60: parameter5 and time applied, both runtime state.
    skip(reader, 8)?;
    let resource2 = ResRef::read_from(reader)?;
    let resource3 = ResRef::read_from(reader)?;
    // 0x78: caster/target coordinates and source bookkeeping.
    skip(reader, 0x28)?;
    let mut variable = [0u8; VARIABLE_LEN];
    reader.read_exact(&mut variable)?;
    let caster_level = reader.read_u32::<LittleEndian>()?;

    Ok(Effect {
        opcode,
        target,
        power,
        parameter1,
        parameter2,
        timing,
        resistance,
        duration,
        probability1,
        probability2,
        resource,
        dice_thrown,
        dice_sides,
        saving_throw,
        save_bonus,
        special,
        primary_type,
        min_level,
        max_level,
        parameter3,
        parameter4,
        resource2,
        resource3,
        variable: read_fixed_string(&variable),
        caster_level,
    })
}

fn write_v2<W: Write>(fx: &Effect, writer: &mut W) -> io::Result<()> {
    let mut entry = Vec::with_capacity(V2_ENTRY_SIZE);
    entry.extend_from_slice(&[0u8; 8]);
    entry.write_u32::<LittleEndian>(fx.opcode)?;
    entry.write_u32::<LittleEndian>(fx.target)?;
    entry.write_u32::<LittleEndian>(fx.power)?;
    entry.write_i32::<LittleEndian>(fx.parameter1)?;
    entry.write_u32::<LittleEndian>(fx.parameter2)?;
    entry.write_u16::<LittleEndian>(fx.timing as u16)?;
    entry.write_u16::<LittleEndian>(0)?;
    entry.write_u32::<LittleEndian>(fx.duration)?;
    entry.write_u16::<LittleEndian>(fx.probability1)?;
    entry.write_u16::<LittleEndian>(fx.probability2)?;
    fx.resource.write_to(&mut entry)?;
    entry.write_u32::<LittleEndian>(fx.dice_thrown)?;
    entry.write_u32::<LittleEndian>(fx.dice_sides)?;
    entry.write_u32::<LittleEndian>(fx.saving_throw)?;
    entry.write_i32::<LittleEndian>(fx.save_bonus)?;
    entry.write_u32::<LittleEndian>(fx.special)?;
    entry.write_u32::<LittleEndian>(fx.primary_type)?;
    entry.extend_from_slice(&[0u8; 4]);
    entry.write_u32::<LittleEndian>(fx.min_level)?;
    entry.write_u32::<LittleEndian>(fx.max_level)?;
    entry.write_u32::<LittleEndian>(fx.resistance)?;
    entry.write_u32::<LittleEndian>(fx.parameter3)?;
    entry.write_u32::<LittleEndian>(fx.parameter4)?;
    entry.extend_from_slice(&[0u8; 8]);
    fx.resource2.write_to(&mut entry)?;
    fx.resource3.write_to(&mut entry)?;
    entry.extend_from_slice(&[0u8; 0x28]);
    let mut variable = [0u8; VARIABLE_LEN];
    write_fixed_string(&mut variable, &fx.variable);
    entry.extend_from_slice(&variable);
    entry.write_u32::<LittleEndian>(fx.caster_level)?;
    entry.resize(V2_ENTRY_SIZE, 0);
    writer.write_all(&entry)
}

fn skip<R: Read>(reader: &mut R, count: usize) -> io::Result<()> {
    let mut scratch = [0u8; 0x30];
    reader.read_exact(&mut scratch[..count])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Effect {
        Effect {
            opcode: 44,
            target: 1,
            power: 3,
            parameter1: -2,
            parameter2: 0,
            timing: 2,
            resistance: 1,
            duration: 60,
            probability1: 100,
            probability2: 0,
            resource: ResRef::new("SPWI101"),
            dice_thrown: 2,
            dice_sides: 6,
            saving_throw: 4,
            save_bonus: -1,
            special: 7,
            ..Effect::default()
        }
    }

    #[test]
    fn entries_have_fixed_sizes() {
        let fx = sample();
        for format in [EffectFormat::V1, EffectFormat::V2] {
            let mut out = Vec::new();
            fx.encode(&mut out, format).unwrap();
            assert_eq!(out.len(), format.entry_size());
        }
    }

    #[test]
    fn v1_uses_narrow_opcode_and_timing() {
        let mut out = Vec::new();
        sample().encode(&mut out, EffectFormat::V1).unwrap();
        assert_eq!(&out[0..2], &44u16.to_le_bytes());
        assert_eq!(out[2], 1);
        assert_eq!(out[0x0c], 2);
        assert_eq!(&out[0x14..0x1b], b"SPWI101");
        assert_eq!(Effect::decode(&out, EffectFormat::V1).unwrap(), sample());
    }

    #[test]
    fn v2_keeps_extended_fields() {
        let fx = Effect {
            resource2: ResRef::new("EXTRA"),
            variable: "KILLCOUNT".to_string(),
            caster_level: 12,
            min_level: 1,
            max_level: 20,
            ..sample()
        };
        let mut out = Vec::new();
        fx.encode(&mut out, EffectFormat::V2).unwrap();
        assert_eq!(&out[0x08..0x0c], &44u32.to_le_bytes());
        assert_eq!(&out[0x4c..0x50], &1u32.to_le_bytes());
        assert_eq!(&out[0x50..0x54], &20u32.to_le_bytes());
        assert_eq!(&out[0x54..0x58], &1u32.to_le_bytes());
        assert_eq!(&out[0x68..0x6d], b"EXTRA");
        assert_eq!(&out[0xa0..0xa9], b"KILLCOUNT");
        assert_eq!(&out[0xc0..0xc4], &12u32.to_le_bytes());
        assert_eq!(Effect::decode(&out, EffectFormat::V2).unwrap(), fx);
    }

    #[test]
    fn v2_reads_fields_at_their_offsets() {
        let mut entry = vec![0u8; V2_ENTRY_SIZE];
        entry[..8].copy_from_slice(b"EFF V2.0");
        entry[0x08..0x0c].copy_from_slice(&44u32.to_le_bytes());
        entry[0x4c..0x50].copy_from_slice(&5u32.to_le_bytes());
        entry[0x50..0x54].copy_from_slice(&9u32.to_le_bytes());
        entry[0x54..0x58].copy_from_slice(&2u32.to_le_bytes());
        entry[0x58..0x5c].copy_from_slice(&3u32.to_le_bytes());
        entry[0x5c..0x60].copy_from_slice(&4u32.to_le_bytes());
        entry[0x60..0x68].copy_from_slice(&[0xaa; 8]);
        entry[0x70..0x78].copy_from_slice(b"THIRDRES");
        entry[0xa0..0xa9].copy_from_slice(b"KILLCOUNT");
        entry[0xc0..0xc4].copy_from_slice(&12u32.to_le_bytes());

        let fx = Effect::decode(&entry, EffectFormat::V2).unwrap();
        assert_eq!(fx.opcode, 44);
        assert_eq!(fx.min_level, 5);
        assert_eq!(fx.max_level, 9);
        assert_eq!(fx.resistance, 2);
        assert_eq!(fx.parameter3, 3);
        assert_eq!(fx.parameter4, 4);
        assert_eq!(fx.resource2, ResRef::default());
        assert_eq!(fx.resource3, ResRef::new("THIRDRES"));
        assert_eq!(fx.variable, "KILLCOUNT");
        assert_eq!(fx.caster_level, 12);
    }

    #[test]
    fn delayed_timings_are_inactive() {
        let mut fx = sample();
        assert!(fx.is_active());
        fx.timing = 4;
        assert!(!fx.is_active());
    }
}
