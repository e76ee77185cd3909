use std::io::{Cursor, Read, Seek, SeekFrom};

use byteorder::{ByteOrder, LittleEndian, ReadBytesExt};
use log::{debug, warn};

use super::actor::{ActorRecord, CreItem, KnownSpell, MemorizedSpell, SpellPage};
use super::chr::ChrHeader;
use super::effect::Effect;
use super::layout::{
    ChrLayout, DEATH_VARIABLE_LEN, EMPTY_SLOT, FLAGS_OFFSET, ITEM_SIZE, KNOWN_SPELL_SIZE,
    LARGE_PORTRAIT_OFFSET, LONG_NAME_OFFSET, Layout, MEMORIZATION_SIZE, MEMORIZED_SIZE,
    SHORT_NAME_OFFSET, SMALL_PORTRAIT_OFFSET, SectionTable,
};
use super::{
    CHR_SIGNATURE, CRE_SIGNATURE, CreVersion, DecodeOptions, SubVersionPolicy, read_fixed_string,
};
use crate::error::{FormatError, Result};
use crate::resref::ResRef;

/// Decodes a creature or character sheet with the default options.
pub fn decode<R: Read + Seek>(reader: &mut R) -> Result<ActorRecord> {
    decode_with(reader, &DecodeOptions::default())
}

pub fn decode_with<R: Read + Seek>(reader: &mut R, options: &DecodeOptions) -> Result<ActorRecord> {
    let len = reader.seek(SeekFrom::End(0))?;
    let mut sections = SectionReader {
        reader,
        base: 0,
        limit: len,
    };
    let signature = sections.fetch("signature", 0, 8)?;
    if signature.starts_with(CRE_SIGNATURE) {
        decode_cre(&mut sections, &signature, options)
    } else if signature.starts_with(CHR_SIGNATURE) {
        decode_chr(&mut sections, options)
    } else {
        Err(unsupported(&signature))
    }
}

/// Bounds-checked access to one record inside a stream. Offsets are relative
/// to `base`; nothing past `limit` is ever read.
struct SectionReader<'a, R> {
    reader: &'a mut R,
    base: u64,
    limit: u64,
}

impl<R: Read + Seek> SectionReader<'_, R> {
    fn fetch(&mut self, section: &'static str, offset: u64, size: usize) -> Result<Vec<u8>> {
        let start = self.base + offset;
        let end = start + size as u64;
        if end > self.limit {
            return Err(FormatError::TruncatedRecord {
                section,
                start,
                end,
                len: self.limit,
            });
        }
        self.reader.seek(SeekFrom::Start(start))?;
        let mut buf = vec![0u8; size];
        self.reader.read_exact(&mut buf)?;
        Ok(buf)
    }

    /// Reads `count` entries of `entry_size`; offset or count zero is empty.
    fn section(
        &mut self,
        section: &'static str,
        offset: u32,
        count: u32,
        entry_size: usize,
    ) -> Result<Vec<u8>> {
        if offset == 0 || count == 0 {
            return Ok(Vec::new());
        }
        self.fetch(section, u64::from(offset), count as usize * entry_size)
    }
}

fn unsupported(signature: &[u8]) -> FormatError {
    FormatError::UnsupportedFormat {
        signature: String::from_utf8_lossy(signature).into_owned(),
    }
}

fn decode_chr<R: Read + Seek>(
    sections: &mut SectionReader<'_, R>,
    options: &DecodeOptions,
) -> Result<ActorRecord> {
    let prefix = sections.fetch("character sheet header", 0, ChrLayout::PREFIX_SIZE)?;
    let header = ChrHeader::parse(&prefix)?;
    let arrays = sections.fetch(
        "quick slots",
        ChrLayout::PREFIX_SIZE as u64,
        header.arrays_size(),
    )?;
    let quick_slots = header.quick_slots(&arrays)?;

    let start = u64::from(header.cre_offset);
    let end = start + u64::from(header.cre_length);
    if end > sections.limit {
        return Err(FormatError::TruncatedRecord {
            section: "embedded creature",
            start,
            end,
            len: sections.limit,
        });
    }
    sections.base = start;
    sections.limit = end;

    let signature = sections.fetch("signature", 0, 8)?;
    if !signature.starts_with(CRE_SIGNATURE) {
        return Err(unsupported(&signature));
    }
    let mut actor = decode_cre(sections, &signature, options)?;
    actor.name = header.name;
    actor.quick_slots = quick_slots;
    Ok(actor)
}

fn decode_cre<R: Read + Seek>(
    sections: &mut SectionReader<'_, R>,
    signature: &[u8],
    options: &DecodeOptions,
) -> Result<ActorRecord> {
    let Some(tagged) = CreVersion::from_signature(&signature[4..8]) else {
        return match options.sub_version_policy {
            SubVersionPolicy::Reject => Err(unsupported(signature)),
            SubVersionPolicy::DefaultRecord => {
                warn!(
                    "unknown creature version {:?}, substituting an empty actor",
                    String::from_utf8_lossy(signature)
                );
                Ok(ActorRecord::default())
            }
            SubVersionPolicy::BestEffort => {
                warn!(
                    "unknown creature version {:?}, reading header only",
                    String::from_utf8_lossy(signature)
                );
                let layout = CreVersion::V1_0.layout();
                let header = sections.fetch("header", 0, layout.header_size)?;
                let mut actor = ActorRecord::new(CreVersion::V1_0);
                read_header(&header, layout, &mut actor);
                actor.recompute_modified();
                Ok(actor)
            }
        };
    };

    let header_size = tagged.layout().header_size;
    let header = sections.fetch("header", 0, header_size)?;
    let version = tagged.refine(&header);
    let layout = version.layout();
    debug!("decoding {version:?} creature ({} byte header)", layout.header_size);

    let mut actor = ActorRecord::new(version);
    read_header(&header, layout, &mut actor);
    let table = SectionTable::read(&header, layout.section_table);

    actor.known_spells = read_known_spells(sections, &table)?;
    actor.spell_pages = read_spell_pages(sections, &table)?;
    read_inventory(sections, &table, layout, &mut actor)?;
    actor.effects = read_effects(sections, &table, layout)?;

    if let Some(at) = layout.overlays {
        let offset = LittleEndian::read_u32(&header[at..]);
        let size = LittleEndian::read_u32(&header[at + 4..]);
        actor.overlays = sections.section("overlays", offset, size, 1)?;
    }

    actor.recompute_modified();
    Ok(actor)
}

fn read_header(header: &[u8], layout: &Layout, actor: &mut ActorRecord) {
    actor.long_name = LittleEndian::read_u32(&header[LONG_NAME_OFFSET..]);
    actor.short_name = LittleEndian::read_u32(&header[SHORT_NAME_OFFSET..]);
    actor.flags = LittleEndian::read_u32(&header[FLAGS_OFFSET..]);
    for field in layout.stat_fields() {
        actor.base_stats[field.stat] = field.width.read(header, field.offset);
    }
    actor.small_portrait = resref_at(header, SMALL_PORTRAIT_OFFSET);
    actor.large_portrait = resref_at(header, LARGE_PORTRAIT_OFFSET);
    for (script, &offset) in actor.scripts.iter_mut().zip(layout.scripts.iter()) {
        *script = resref_at(header, offset);
    }
    actor.dialog = resref_at(header, layout.dialog);
    actor.death_variable = read_fixed_string(
        &header[layout.death_variable..layout.death_variable + DEATH_VARIABLE_LEN],
    );
    (layout.read_colors)(header, actor);
    actor.raw_header = header.to_vec();
}

fn resref_at(header: &[u8], offset: usize) -> ResRef {
    ResRef::from_raw(&header[offset..offset + 8])
}

fn read_known_spells<R: Read + Seek>(
    sections: &mut SectionReader<'_, R>,
    table: &SectionTable,
) -> Result<Vec<KnownSpell>> {
    let raw = sections.section(
        "known spells",
        table.known_offset,
        table.known_count,
        KNOWN_SPELL_SIZE,
    )?;
    let mut spells = Vec::with_capacity(raw.len() / KNOWN_SPELL_SIZE);
    for entry in raw.chunks_exact(KNOWN_SPELL_SIZE) {
        let mut cursor = Cursor::new(entry);
        let resref = ResRef::read_from(&mut cursor)?;
        let level = cursor.read_u16::<LittleEndian>()?;
        let kind = cursor.read_u16::<LittleEndian>()?;
        spells.push(KnownSpell {
            resref,
            level,
            kind,
        });
    }
    Ok(spells)
}

fn read_spell_pages<R: Read + Seek>(
    sections: &mut SectionReader<'_, R>,
    table: &SectionTable,
) -> Result<Vec<SpellPage>> {
    let pages_raw = sections.section(
        "memorization",
        table.memorization_offset,
        table.memorization_count,
        MEMORIZATION_SIZE,
    )?;
    let memorized_raw = sections.section(
        "memorized spells",
        table.memorized_offset,
        table.memorized_count,
        MEMORIZED_SIZE,
    )?;

    let mut memorized = Vec::with_capacity(memorized_raw.len() / MEMORIZED_SIZE);
    for entry in memorized_raw.chunks_exact(MEMORIZED_SIZE) {
        let mut cursor = Cursor::new(entry);
        let resref = ResRef::read_from(&mut cursor)?;
        let flags = cursor.read_u32::<LittleEndian>()?;
        memorized.push(MemorizedSpell { resref, flags });
    }

    let mut pages = Vec::with_capacity(pages_raw.len() / MEMORIZATION_SIZE);
    for entry in pages_raw.chunks_exact(MEMORIZATION_SIZE) {
        let mut cursor = Cursor::new(entry);
        let level = cursor.read_u16::<LittleEndian>()?;
        let slots = cursor.read_u16::<LittleEndian>()?;
        let slots_effective = cursor.read_u16::<LittleEndian>()?;
        let kind = cursor.read_u16::<LittleEndian>()?;
        let index = cursor.read_u32::<LittleEndian>()? as usize;
        let count = cursor.read_u32::<LittleEndian>()? as usize;

        let start = index.min(memorized.len());
        let end = index.saturating_add(count).min(memorized.len());
        if end - start != count {
            warn!(
                "spell page kind {kind} level {level} claims {count} spells from {index}, \
                 only {} exist",
                end - start
            );
        }
        pages.push(SpellPage {
            kind,
            level,
            slots,
            slots_effective,
            memorized: memorized[start..end].to_vec(),
        });
    }
    Ok(pages)
}

fn read_inventory<R: Read + Seek>(
    sections: &mut SectionReader<'_, R>,
    table: &SectionTable,
    layout: &Layout,
    actor: &mut ActorRecord,
) -> Result<()> {
    let raw = sections.section("items", table.items_offset, table.items_count, ITEM_SIZE)?;
    let mut items = Vec::with_capacity(raw.len() / ITEM_SIZE);
    for entry in raw.chunks_exact(ITEM_SIZE) {
        let mut cursor = Cursor::new(entry);
        let resref = ResRef::read_from(&mut cursor)?;
        let expiration = cursor.read_u16::<LittleEndian>()?;
        let mut charges = [0u16; 3];
        cursor.read_u16_into::<LittleEndian>(&mut charges)?;
        let flags = cursor.read_u32::<LittleEndian>()?;
        items.push(CreItem {
            resref,
            expiration,
            charges,
            flags,
        });
    }

    if table.slots_offset == 0 {
        if !items.is_empty() {
            warn!("{} items but no slot table, dropping them", items.len());
        }
        return Ok(());
    }
    let raw = sections.fetch(
        "item slots",
        u64::from(table.slots_offset),
        layout.slot_table_size(),
    )?;
    let mut slots = vec![0u16; layout.item_slots + 2];
    LittleEndian::read_u16_into(&raw, &mut slots);

    for (index, &item_index) in slots[..layout.item_slots].iter().enumerate() {
        if item_index == EMPTY_SLOT {
            continue;
        }
        match items.get(usize::from(item_index)) {
            Some(item) => {
                let _ = actor.inventory.put(index, item.clone());
            }
            None => warn!("slot {index} refers to missing item {item_index}"),
        }
    }
    actor.inventory.equipped_slot = slots[layout.item_slots];
    actor.inventory.equipped_ability = slots[layout.item_slots + 1];
    Ok(())
}

fn read_effects<R: Read + Seek>(
    sections: &mut SectionReader<'_, R>,
    table: &SectionTable,
    layout: &Layout,
) -> Result<Vec<Effect>> {
    let entry_size = layout.effects.entry_size();
    let raw = sections.section(
        "effects",
        table.effects_offset,
        table.effects_count,
        entry_size,
    )?;
    raw.chunks_exact(entry_size)
        .map(|entry| Effect::decode(entry, layout.effects).map_err(FormatError::from))
        .collect()
}
