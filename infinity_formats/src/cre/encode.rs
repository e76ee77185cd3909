use std::io::Write;

use byteorder::{ByteOrder, LittleEndian, WriteBytesExt};
use log::debug;

use super::actor::ActorRecord;
use super::chr;
use super::layout::{
    ChrLayout, DEATH_VARIABLE_LEN, EMPTY_SLOT, FLAGS_OFFSET, ITEM_SIZE, KNOWN_SPELL_SIZE,
    LARGE_PORTRAIT_OFFSET, LONG_NAME_OFFSET, Layout, MEMORIZATION_SIZE, MEMORIZED_SIZE,
    SHORT_NAME_OFFSET, SMALL_PORTRAIT_OFFSET, SectionTable,
};
use super::{CRE_SIGNATURE, EFFECT_VERSION_OFFSET, write_fixed_string};
use crate::error::{FormatError, Result};

/// Writes `actor` to `sink`, as a plain creature or wrapped in a character
/// sheet. Returns the number of bytes written.
pub fn encode<W: Write>(actor: &ActorRecord, sink: &mut W, chr: bool) -> Result<usize> {
    let layout = actor.version.layout();
    let cre = encode_cre(actor, layout)?;
    let written = match chr_layout(layout, chr)? {
        Some(chr_layout) => {
            let header = chr::build_header(actor, &chr_layout, cre.len())?;
            sink.write_all(&header)?;
            sink.write_all(&cre)?;
            header.len() + cre.len()
        }
        None => {
            sink.write_all(&cre)?;
            cre.len()
        }
    };
    debug!("encoded {:?} actor, {written} bytes", actor.version);
    Ok(written)
}

/// Size [`encode`] would produce, without building the record.
pub fn stored_size(actor: &ActorRecord, chr: bool) -> Result<usize> {
    let layout = actor.version.layout();
    let memorized: usize = actor.spell_pages.iter().map(|page| page.memorized.len()).sum();
    let mut size = layout.header_size
        + actor.known_spells.len() * KNOWN_SPELL_SIZE
        + actor.spell_pages.len() * MEMORIZATION_SIZE
        + memorized * MEMORIZED_SIZE
        + actor.effects.len() * layout.effects.entry_size()
        + actor.inventory.occupied() * ITEM_SIZE
        + layout.slot_table_size();
    if layout.overlays.is_some() {
        size += actor.overlays.len();
    }
    if let Some(chr_layout) = chr_layout(layout, chr)? {
        size += chr_layout.header_size();
    }
    Ok(size)
}

fn chr_layout(layout: &Layout, chr: bool) -> Result<Option<ChrLayout>> {
    if !chr {
        return Ok(None);
    }
    layout
        .chr
        .map(Some)
        .ok_or(FormatError::UnsupportedVersion {
            version: layout.version,
            mode: "character sheet",
        })
}

fn encode_cre(actor: &ActorRecord, layout: &Layout) -> Result<Vec<u8>> {
    let mut header = if actor.raw_header.len() == layout.header_size {
        actor.raw_header.clone()
    } else {
        vec![0u8; layout.header_size]
    };
    write_header(actor, layout, &mut header);

    let mut body = Vec::new();
    let mut table = SectionTable::default();
    // Section offsets count from the start of the creature record.
    let at = |body: &Vec<u8>| (layout.header_size + body.len()) as u32;

    table.known_offset = at(&body);
    table.known_count = actor.known_spells.len() as u32;
    for spell in &actor.known_spells {
        spell.resref.write_to(&mut body)?;
        body.write_u16::<LittleEndian>(spell.level)?;
        body.write_u16::<LittleEndian>(spell.kind)?;
    }

    table.memorization_offset = at(&body);
    table.memorization_count = actor.spell_pages.len() as u32;
    let mut index = 0u32;
    for page in &actor.spell_pages {
        let count = page.memorized.len() as u32;
        body.write_u16::<LittleEndian>(page.level)?;
        body.write_u16::<LittleEndian>(page.slots)?;
        body.write_u16::<LittleEndian>(page.slots_effective)?;
        body.write_u16::<LittleEndian>(page.kind)?;
        body.write_u32::<LittleEndian>(index)?;
        body.write_u32::<LittleEndian>(count)?;
        index += count;
    }

    table.memorized_offset = at(&body);
    table.memorized_count = index;
    for spell in actor.spell_pages.iter().flat_map(|page| page.memorized.iter()) {
        spell.resref.write_to(&mut body)?;
        body.write_u32::<LittleEndian>(spell.flags)?;
    }

    table.effects_offset = at(&body);
    table.effects_count = actor.effects.len() as u32;
    for fx in &actor.effects {
        fx.encode(&mut body, layout.effects)?;
    }

    table.items_offset = at(&body);
    let mut slots = vec![EMPTY_SLOT; layout.item_slots + 2];
    let mut count = 0u16;
    for (slot, item) in actor.inventory.items() {
        if slot >= layout.item_slots {
            continue;
        }
        item.resref.write_to(&mut body)?;
        body.write_u16::<LittleEndian>(item.expiration)?;
        for charge in item.charges {
            body.write_u16::<LittleEndian>(charge)?;
        }
        body.write_u32::<LittleEndian>(item.flags)?;
        slots[slot] = count;
        count += 1;
    }
    table.items_count = u32::from(count);
    slots[layout.item_slots] = actor.inventory.equipped_slot;
    slots[layout.item_slots + 1] = actor.inventory.equipped_ability;

    table.slots_offset = at(&body);
    for slot in slots {
        body.write_u16::<LittleEndian>(slot)?;
    }

    if let Some(pair) = layout.overlays {
        let (offset, size) = if actor.overlays.is_empty() {
            (0, 0)
        } else {
            (at(&body), actor.overlays.len() as u32)
        };
        body.extend_from_slice(&actor.overlays);
        LittleEndian::write_u32(&mut header[pair..], offset);
        LittleEndian::write_u32(&mut header[pair + 4..], size);
    }

    table.write(&mut header, layout.section_table);
    header.extend_from_slice(&body);
    Ok(header)
}

fn write_header(actor: &ActorRecord, layout: &Layout, header: &mut [u8]) {
    header[0..4].copy_from_slice(CRE_SIGNATURE);
    header[4..8].copy_from_slice(actor.version.signature());
    header[EFFECT_VERSION_OFFSET] = layout.effects.header_flag();
    LittleEndian::write_u32(&mut header[LONG_NAME_OFFSET..], actor.long_name);
    LittleEndian::write_u32(&mut header[SHORT_NAME_OFFSET..], actor.short_name);
    LittleEndian::write_u32(&mut header[FLAGS_OFFSET..], actor.flags);
    for field in layout.stat_fields() {
        field.width.write(header, field.offset, actor.base(field.stat));
    }
    put_resref(header, SMALL_PORTRAIT_OFFSET, actor.small_portrait.as_bytes());
    put_resref(header, LARGE_PORTRAIT_OFFSET, actor.large_portrait.as_bytes());
    for (script, &offset) in actor.scripts.iter().zip(layout.scripts.iter()) {
        put_resref(header, offset, script.as_bytes());
    }
    put_resref(header, layout.dialog, actor.dialog.as_bytes());
    write_fixed_string(
        &mut header[layout.death_variable..layout.death_variable + DEATH_VARIABLE_LEN],
        &actor.death_variable,
    );
    (layout.write_colors)(actor, header);
}

fn put_resref(header: &mut [u8], offset: usize, name: &[u8; 8]) {
    header[offset..offset + 8].copy_from_slice(name);
}
