use std::io::{self, Cursor, Read};

use byteorder::{ByteOrder, LittleEndian, ReadBytesExt, WriteBytesExt};

use super::actor::{ActorRecord, NAME_LEN, QuickSlot, QuickSlots};
use super::layout::{ChrLayout, EMPTY_SLOT};
use super::{CHR_SIGNATURE, CreVersion, read_fixed_string, write_fixed_string};
use crate::error::{FormatError, Result};
use crate::resref::ResRef;

const NAME_OFFSET: usize = 0x08;
const CRE_OFFSET: usize = 0x28;
const CRE_LENGTH: usize = 0x2c;

/// Character sheet wrapper around an embedded creature record.
#[derive(Debug)]
pub(super) struct ChrHeader {
    pub name: String,
    pub cre_offset: u32,
    pub cre_length: u32,
    pub layout: ChrLayout,
}

impl ChrHeader {
    pub fn parse(prefix: &[u8]) -> Result<Self> {
        let layout =
            layout_for_tag(&prefix[4..8]).ok_or_else(|| FormatError::UnsupportedFormat {
                signature: String::from_utf8_lossy(&prefix[..8]).into_owned(),
            })?;
        Ok(ChrHeader {
            name: read_fixed_string(&prefix[NAME_OFFSET..NAME_OFFSET + NAME_LEN]),
            cre_offset: LittleEndian::read_u32(&prefix[CRE_OFFSET..]),
            cre_length: LittleEndian::read_u32(&prefix[CRE_LENGTH..]),
            layout,
        })
    }

    /// Bytes of quick-slot arrays following the prefix.
    pub fn arrays_size(&self) -> usize {
        self.layout.header_size() - ChrLayout::PREFIX_SIZE
    }

    /// Decodes the quick-slot arrays, skipping empty entries.
    pub fn quick_slots(&self, arrays: &[u8]) -> io::Result<QuickSlots> {
        let mut cursor = Cursor::new(arrays);
        let weapons = read_slot_array(&mut cursor, self.layout.weapons)?;
        let mut spells = Vec::with_capacity(self.layout.spells);
        for _ in 0..self.layout.spells {
            let spell = ResRef::read_from(&mut cursor)?;
            if spell.is_set() {
                spells.push(spell);
            }
        }
        if self.layout.spell_classes {
            let mut classes = vec![0u8; self.layout.spells + 1];
            cursor.read_exact(&mut classes)?;
        }
        let items = read_slot_array(&mut cursor, self.layout.items)?;
        Ok(QuickSlots {
            weapons,
            spells,
            items,
        })
    }
}

fn layout_for_tag(tag: &[u8]) -> Option<ChrLayout> {
    CreVersion::ALL
        .into_iter()
        .filter_map(|version| version.layout().chr)
        .find(|chr| chr.signature.as_slice() == tag)
}

// All slots first, then the matching abilities.
fn read_slot_array<R: Read>(reader: &mut R, capacity: usize) -> io::Result<Vec<QuickSlot>> {
    let mut slots = Vec::with_capacity(capacity);
    for _ in 0..capacity {
        slots.push(reader.read_u16::<LittleEndian>()?);
    }
    let mut list = Vec::with_capacity(capacity);
    for slot in slots {
        let ability = reader.read_u16::<LittleEndian>()?;
        if slot != EMPTY_SLOT {
            list.push(QuickSlot { slot, ability });
        }
    }
    Ok(list)
}

fn write_slot_array(out: &mut Vec<u8>, list: &[QuickSlot], capacity: usize) -> io::Result<()> {
    for index in 0..capacity {
        let slot = list.get(index).map_or(EMPTY_SLOT, |quick| quick.slot);
        out.write_u16::<LittleEndian>(slot)?;
    }
    for index in 0..capacity {
        let ability = list.get(index).map_or(0, |quick| quick.ability);
        out.write_u16::<LittleEndian>(ability)?;
    }
    Ok(())
}

/// Quick slots as they will be saved: entries pointing at empty inventory
/// slots or forgotten spells are dropped before the caps apply.
pub(super) fn saved_quick_slots(actor: &ActorRecord, chr: &ChrLayout) -> QuickSlots {
    let occupied = |quick: &&QuickSlot| actor.inventory.slot(usize::from(quick.slot)).is_some();
    QuickSlots {
        weapons: actor
            .quick_slots
            .weapons
            .iter()
            .filter(occupied)
            .take(chr.weapons)
            .copied()
            .collect(),
        spells: actor
            .quick_slots
            .spells
            .iter()
            .filter(|spell| actor.knows_spell(spell))
            .take(chr.spells)
            .copied()
            .collect(),
        items: actor
            .quick_slots
            .items
            .iter()
            .filter(occupied)
            .take(chr.items)
            .copied()
            .collect(),
    }
}

/// Builds the sheet header for a creature of `cre_len` bytes that follows it.
pub(super) fn build_header(
    actor: &ActorRecord,
    chr: &ChrLayout,
    cre_len: usize,
) -> Result<Vec<u8>> {
    let quick = saved_quick_slots(actor, chr);
    let size = chr.header_size();

    let mut out = vec![0u8; ChrLayout::PREFIX_SIZE];
    out[0..4].copy_from_slice(CHR_SIGNATURE);
    out[4..8].copy_from_slice(chr.signature);
    write_fixed_string(&mut out[NAME_OFFSET..NAME_OFFSET + NAME_LEN], &actor.name);
    LittleEndian::write_u32(&mut out[CRE_OFFSET..], size as u32);
    LittleEndian::write_u32(&mut out[CRE_LENGTH..], cre_len as u32);

    write_slot_array(&mut out, &quick.weapons, chr.weapons)?;
    for index in 0..chr.spells {
        quick
            .spells
            .get(index)
            .copied()
            .unwrap_or_default()
            .write_to(&mut out)?;
    }
    if chr.spell_classes {
        out.resize(out.len() + chr.spells + 1, 0);
    }
    write_slot_array(&mut out, &quick.items, chr.items)?;
    debug_assert_eq!(out.len(), size);
    Ok(out)
}
