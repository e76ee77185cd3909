use byteorder::{ByteOrder, LittleEndian};

use super::CreVersion;
use super::actor::{ActorRecord, COLOR_COUNT, MAX_SCRIPTS};
use super::effect::EffectFormat;
use super::stats::*;

pub(crate) const LONG_NAME_OFFSET: usize = 0x08;
pub(crate) const SHORT_NAME_OFFSET: usize = 0x0c;
pub(crate) const FLAGS_OFFSET: usize = 0x10;
pub(crate) const INLINE_COLORS_OFFSET: usize = 0x2c;
pub(crate) const SMALL_PORTRAIT_OFFSET: usize = 0x34;
pub(crate) const LARGE_PORTRAIT_OFFSET: usize = 0x3c;
pub(crate) const DEATH_VARIABLE_LEN: usize = 32;

pub(crate) const KNOWN_SPELL_SIZE: usize = 0x0c;
pub(crate) const MEMORIZATION_SIZE: usize = 0x10;
pub(crate) const MEMORIZED_SIZE: usize = 0x0c;
pub(crate) const ITEM_SIZE: usize = 0x14;
pub(crate) const EMPTY_SLOT: u16 = 0xffff;

const PST_COLOR_COUNT_OFFSET: usize = 0x2e4;
const PST_COLORS_OFFSET: usize = 0x2e8;
const PST_PLACEMENTS_OFFSET: usize = 0x2f9;

/// Width and signedness of a fixed header field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldWidth {
    U8,
    I8,
    U16,
    I16,
    U32,
}

impl FieldWidth {
    pub fn read(self, header: &[u8], offset: usize) -> i32 {
        match self {
            FieldWidth::U8 => i32::from(header[offset]),
            FieldWidth::I8 => i32::from(header[offset] as i8),
            FieldWidth::U16 => i32::from(LittleEndian::read_u16(&header[offset..])),
            FieldWidth::I16 => i32::from(LittleEndian::read_i16(&header[offset..])),
            FieldWidth::U32 => LittleEndian::read_u32(&header[offset..]) as i32,
        }
    }

    pub fn write(self, header: &mut [u8], offset: usize, value: i32) {
        match self {
            FieldWidth::U8 | FieldWidth::I8 => header[offset] = value as u8,
            FieldWidth::U16 | FieldWidth::I16 => {
                LittleEndian::write_u16(&mut header[offset..], value as u16)
            }
            FieldWidth::U32 => LittleEndian::write_u32(&mut header[offset..], value as u32),
        }
    }
}

/// One stat persisted in the creature header.
#[derive(Debug, Clone, Copy)]
pub struct StatField {
    pub stat: usize,
    pub offset: usize,
    pub width: FieldWidth,
}

const fn field(stat: usize, offset: usize, width: FieldWidth) -> StatField {
    StatField {
        stat,
        offset,
        width,
    }
}

/// Quick-slot arrays of the character sheet header. Every array has a fixed
/// capacity and position; the embedded creature follows the last one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChrLayout {
    pub signature: &'static [u8; 4],
    pub weapons: usize,
    pub spells: usize,
    /// One class byte per quick spell plus a pad byte, after the spell names.
    pub spell_classes: bool,
    pub items: usize,
}

impl ChrLayout {
    /// Bytes before the quick-slot arrays: signature, name, creature offset
    /// and length.
    pub const PREFIX_SIZE: usize = 0x30;

    pub fn header_size(&self) -> usize {
        let classes = if self.spell_classes { self.spells + 1 } else { 0 };
        Self::PREFIX_SIZE + self.weapons * 4 + self.spells * 8 + classes + self.items * 4
    }
}

/// Everything that differs between creature generations.
pub struct Layout {
    pub version: CreVersion,
    pub header_size: usize,
    pub section_table: usize,
    pub dialog: usize,
    pub scripts: [usize; MAX_SCRIPTS],
    pub death_variable: usize,
    pub item_slots: usize,
    pub effects: EffectFormat,
    /// Offset of the overlay offset/size pair, when the generation has one.
    pub overlays: Option<usize>,
    pub chr: Option<ChrLayout>,
    pub stat_tables: &'static [&'static [StatField]],
    pub read_colors: fn(&[u8], &mut ActorRecord),
    pub write_colors: fn(&ActorRecord, &mut [u8]),
}

impl Layout {
    pub fn for_version(version: CreVersion) -> &'static Layout {
        match version {
            CreVersion::V1_0 => &V1_0,
            CreVersion::V1_1 => &V1_1,
            CreVersion::V1_2 => &V1_2,
            CreVersion::V9_0 => &V9_0,
            CreVersion::V2_2 => &V2_2,
        }
    }

    /// Bytes taken by the slot table: every slot plus the equipped slot and ability.
    pub fn slot_table_size(&self) -> usize {
        (self.item_slots + 2) * 2
    }

    pub fn stat_fields(&self) -> impl Iterator<Item = &'static StatField> {
        self.stat_tables.iter().flat_map(|table| table.iter())
    }
}

/// Offsets and counts of the variable-length sections, relative to the
/// start of the creature record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct SectionTable {
    pub known_offset: u32,
    pub known_count: u32,
    pub memorization_offset: u32,
    pub memorization_count: u32,
    pub memorized_offset: u32,
    pub memorized_count: u32,
    pub slots_offset: u32,
    pub items_offset: u32,
    pub items_count: u32,
    pub effects_offset: u32,
    pub effects_count: u32,
}

impl SectionTable {
    pub const SIZE: usize = 11 * 4;

    pub fn read(header: &[u8], at: usize) -> Self {
        let mut words = [0u32; 11];
        LittleEndian::read_u32_into(&header[at..at + Self::SIZE], &mut words);
        let [
            known_offset,
            known_count,
            memorization_offset,
            memorization_count,
            memorized_offset,
            memorized_count,
            slots_offset,
            items_offset,
            items_count,
            effects_offset,
            effects_count,
        ] = words;
        SectionTable {
            known_offset,
            known_count,
            memorization_offset,
            memorization_count,
            memorized_offset,
            memorized_count,
            slots_offset,
            items_offset,
            items_count,
            effects_offset,
            effects_count,
        }
    }

    pub fn write(&self, header: &mut [u8], at: usize) {
        let words = [
            self.known_offset,
            self.known_count,
            self.memorization_offset,
            self.memorization_count,
            self.memorized_offset,
            self.memorized_count,
            self.slots_offset,
            self.items_offset,
            self.items_count,
            self.effects_offset,
            self.effects_count,
        ];
        LittleEndian::write_u32_into(&words, &mut header[at..at + Self::SIZE]);
    }
}

/// Fields at the same place in every generation.
const COMMON_STATS: &[StatField] = &[
    field(XPVALUE, 0x14, FieldWidth::U32),
    field(XP, 0x18, FieldWidth::U32),
    field(GOLD, 0x1c, FieldWidth::U32),
    field(STATE_ID, 0x20, FieldWidth::U32),
    field(HITPOINTS, 0x24, FieldWidth::I16),
    field(MAXHITPOINTS, 0x26, FieldWidth::I16),
    field(ANIMATION_ID, 0x28, FieldWidth::U32),
    field(REPUTATION, 0x44, FieldWidth::U8),
    field(HIDEINSHADOWS, 0x45, FieldWidth::U8),
    field(ARMORCLASS, 0x46, FieldWidth::I16),
    field(ACCRUSHINGMOD, 0x4a, FieldWidth::I16),
    field(ACMISSILEMOD, 0x4c, FieldWidth::I16),
    field(ACPIERCINGMOD, 0x4e, FieldWidth::I16),
    field(ACSLASHINGMOD, 0x50, FieldWidth::I16),
    field(TOHIT, 0x52, FieldWidth::U8),
];

const CLASSIC_STATS: &[StatField] = &[
    field(NUMBEROFATTACKS, 0x53, FieldWidth::U8),
    field(SAVEVSDEATH, 0x54, FieldWidth::U8),
    field(SAVEVSWANDS, 0x55, FieldWidth::U8),
    field(SAVEVSPOLY, 0x56, FieldWidth::U8),
    field(SAVEVSBREATH, 0x57, FieldWidth::U8),
    field(SAVEVSSPELL, 0x58, FieldWidth::U8),
    field(RESISTFIRE, 0x59, FieldWidth::I8),
    field(RESISTCOLD, 0x5a, FieldWidth::I8),
    field(RESISTELECTRICITY, 0x5b, FieldWidth::I8),
    field(RESISTACID, 0x5c, FieldWidth::I8),
    field(RESISTMAGIC, 0x5d, FieldWidth::I8),
    field(RESISTMAGICFIRE, 0x5e, FieldWidth::I8),
    field(RESISTMAGICCOLD, 0x5f, FieldWidth::I8),
    field(RESISTSLASHING, 0x60, FieldWidth::I8),
    field(RESISTCRUSHING, 0x61, FieldWidth::I8),
    field(RESISTPIERCING, 0x62, FieldWidth::I8),
    field(RESISTMISSILE, 0x63, FieldWidth::I8),
    field(DETECTILLUSIONS, 0x64, FieldWidth::U8),
    field(SETTRAPS, 0x65, FieldWidth::U8),
    field(LORE, 0x66, FieldWidth::U8),
    field(LOCKPICKING, 0x67, FieldWidth::U8),
    field(STEALTH, 0x68, FieldWidth::U8),
    field(TRAPS, 0x69, FieldWidth::U8),
    field(PICKPOCKET, 0x6a, FieldWidth::U8),
    field(FATIGUE, 0x6b, FieldWidth::U8),
    field(INTOXICATION, 0x6c, FieldWidth::U8),
    field(LUCK, 0x6d, FieldWidth::I8),
    field(TRACKING, 0x82, FieldWidth::U8),
    field(LEVEL, 0x234, FieldWidth::U8),
    field(LEVEL2, 0x235, FieldWidth::U8),
    field(LEVEL3, 0x236, FieldWidth::U8),
    field(SEX, 0x237, FieldWidth::U8),
    field(STR, 0x238, FieldWidth::U8),
    field(STREXTRA, 0x239, FieldWidth::U8),
    field(INT, 0x23a, FieldWidth::U8),
    field(WIS, 0x23b, FieldWidth::U8),
    field(DEX, 0x23c, FieldWidth::U8),
    field(CON, 0x23d, FieldWidth::U8),
    field(CHR, 0x23e, FieldWidth::U8),
    field(MORALE, 0x23f, FieldWidth::U8),
    field(MORALEBREAK, 0x240, FieldWidth::U8),
    field(HATEDRACE, 0x241, FieldWidth::U8),
    field(MORALERECOVERYTIME, 0x242, FieldWidth::U16),
    field(KIT, 0x244, FieldWidth::U32),
];

const CLASSIC_ALLEGIANCE: &[StatField] = &allegiance(0x270);

// Icewind keeps extra death variables and a saved location at 0x270.
const ICEWIND_ALLEGIANCE: &[StatField] = &allegiance(0x2d8);

/// EA through ALIGNMENT, laid out identically wherever the block starts.
const fn allegiance(at: usize) -> [StatField; 7] {
    [
        field(EA, at, FieldWidth::U8),
        field(GENERAL, at + 1, FieldWidth::U8),
        field(RACE, at + 2, FieldWidth::U8),
        field(CLASS, at + 3, FieldWidth::U8),
        field(SPECIFIC, at + 4, FieldWidth::U8),
        field(GENDER, at + 5, FieldWidth::U8),
        field(ALIGNMENT, at + 11, FieldWidth::U8),
    ]
}

const SEQUEL_STATS: &[StatField] = &[
    field(NUMBEROFATTACKS, 0x53, FieldWidth::U8),
    field(SAVEFORTITUDE, 0x54, FieldWidth::U8),
    field(SAVEREFLEX, 0x55, FieldWidth::U8),
    field(SAVEWILL, 0x56, FieldWidth::U8),
    field(RESISTFIRE, 0x57, FieldWidth::I8),
    field(RESISTCOLD, 0x58, FieldWidth::I8),
    field(RESISTELECTRICITY, 0x59, FieldWidth::I8),
    field(RESISTACID, 0x5a, FieldWidth::I8),
    field(RESISTMAGIC, 0x5b, FieldWidth::I8),
    field(RESISTMAGICFIRE, 0x5c, FieldWidth::I8),
    field(RESISTMAGICCOLD, 0x5d, FieldWidth::I8),
    field(RESISTSLASHING, 0x5e, FieldWidth::I8),
    field(RESISTCRUSHING, 0x5f, FieldWidth::I8),
    field(RESISTPIERCING, 0x60, FieldWidth::I8),
    field(RESISTMISSILE, 0x61, FieldWidth::I8),
    field(FATIGUE, 0x66, FieldWidth::U8),
    field(INTOXICATION, 0x67, FieldWidth::U8),
    field(LUCK, 0x68, FieldWidth::I8),
    field(LEVEL, 0x8b, FieldWidth::U8),
    field(LEVEL2, 0x8c, FieldWidth::U8),
    field(LEVEL3, 0x8d, FieldWidth::U8),
    field(STR, 0x266, FieldWidth::U8),
    field(INT, 0x267, FieldWidth::U8),
    field(WIS, 0x268, FieldWidth::U8),
    field(DEX, 0x269, FieldWidth::U8),
    field(CON, 0x26a, FieldWidth::U8),
    field(CHR, 0x26b, FieldWidth::U8),
    field(MORALE, 0x26c, FieldWidth::U8),
    field(MORALEBREAK, 0x26d, FieldWidth::U8),
    field(MORALERECOVERYTIME, 0x26e, FieldWidth::U16),
    field(KIT, 0x270, FieldWidth::U32),
    field(EA, 0x384, FieldWidth::U8),
    field(GENERAL, 0x385, FieldWidth::U8),
    field(RACE, 0x386, FieldWidth::U8),
    field(CLASS, 0x387, FieldWidth::U8),
    field(SPECIFIC, 0x388, FieldWidth::U8),
    field(GENDER, 0x389, FieldWidth::U8),
    field(ALIGNMENT, 0x38f, FieldWidth::U8),
];

const CLASSIC_SCRIPTS: [usize; MAX_SCRIPTS] = [0x248, 0x250, 0x258, 0x260, 0x268];
const SEQUEL_SCRIPTS: [usize; MAX_SCRIPTS] = [0x1b8, 0x1c0, 0x1c8, 0x1d0, 0x1d8];

const CLASSIC: Layout = Layout {
    version: CreVersion::V1_0,
    header_size: 0x2d4,
    section_table: 0x2a0,
    dialog: 0x2cc,
    scripts: CLASSIC_SCRIPTS,
    death_variable: 0x280,
    item_slots: 38,
    effects: EffectFormat::V1,
    overlays: None,
    chr: Some(ChrLayout {
        signature: b"V1.0",
        weapons: 4,
        spells: 3,
        spell_classes: false,
        items: 3,
    }),
    stat_tables: &[COMMON_STATS, CLASSIC_STATS, CLASSIC_ALLEGIANCE],
    read_colors: read_inline_colors,
    write_colors: write_inline_colors,
};

static V1_0: Layout = CLASSIC;

static V1_1: Layout = Layout {
    version: CreVersion::V1_1,
    effects: EffectFormat::V2,
    chr: Some(ChrLayout {
        signature: b"V2.0",
        weapons: 4,
        spells: 3,
        spell_classes: false,
        items: 3,
    }),
    ..CLASSIC
};

static V1_2: Layout = Layout {
    version: CreVersion::V1_2,
    header_size: 0x378,
    item_slots: 46,
    overlays: Some(0x2d4),
    chr: None,
    read_colors: read_wide_colors,
    write_colors: write_wide_colors,
    ..CLASSIC
};

static V9_0: Layout = Layout {
    version: CreVersion::V9_0,
    header_size: 0x33c,
    section_table: 0x308,
    dialog: 0x334,
    death_variable: 0x2e8,
    effects: EffectFormat::V2,
    chr: Some(ChrLayout {
        signature: b"V9.0",
        weapons: 4,
        spells: 3,
        spell_classes: false,
        items: 3,
    }),
    stat_tables: &[COMMON_STATS, CLASSIC_STATS, ICEWIND_ALLEGIANCE],
    ..CLASSIC
};

static V2_2: Layout = Layout {
    version: CreVersion::V2_2,
    header_size: 0x62e,
    section_table: 0x5fa,
    dialog: 0x626,
    scripts: SEQUEL_SCRIPTS,
    death_variable: 0x394,
    item_slots: 50,
    effects: EffectFormat::V2,
    overlays: None,
    chr: Some(ChrLayout {
        signature: b"V2.2",
        weapons: 8,
        spells: 9,
        spell_classes: true,
        items: 3,
    }),
    stat_tables: &[COMMON_STATS, SEQUEL_STATS],
    read_colors: read_inline_colors,
    write_colors: write_inline_colors,
};

fn read_inline_colors(header: &[u8], actor: &mut ActorRecord) {
    for (index, color) in actor.colors.iter_mut().enumerate() {
        *color = u16::from(header[INLINE_COLORS_OFFSET + index]);
    }
    actor.color_placements = [0; COLOR_COUNT];
}

fn write_inline_colors(actor: &ActorRecord, header: &mut [u8]) {
    for (index, color) in actor.colors.iter().enumerate() {
        header[INLINE_COLORS_OFFSET + index] = *color as u8;
    }
}

// The planescape header keeps 16-bit colours and their placements past the
// classic block; the inline bytes are left untouched.
fn read_wide_colors(header: &[u8], actor: &mut ActorRecord) {
    let count = LittleEndian::read_u32(&header[PST_COLOR_COUNT_OFFSET..]) as usize;
    let count = count.min(COLOR_COUNT);
    actor.colors = [0; COLOR_COUNT];
    actor.color_placements = [0; COLOR_COUNT];
    for index in 0..count {
        actor.colors[index] = LittleEndian::read_u16(&header[PST_COLORS_OFFSET + index * 2..]);
        actor.color_placements[index] = header[PST_PLACEMENTS_OFFSET + index];
    }
}

fn write_wide_colors(actor: &ActorRecord, header: &mut [u8]) {
    LittleEndian::write_u32(&mut header[PST_COLOR_COUNT_OFFSET..], COLOR_COUNT as u32);
    for index in 0..COLOR_COUNT {
        LittleEndian::write_u16(
            &mut header[PST_COLORS_OFFSET + index * 2..],
            actor.colors[index],
        );
        header[PST_PLACEMENTS_OFFSET + index] = actor.color_placements[index];
    }
}
