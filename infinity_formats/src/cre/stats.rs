//! Stat indices into the actor stat arrays.

pub const MAX_STATS: usize = 256;

pub const HITPOINTS: usize = 0;
pub const MAXHITPOINTS: usize = 1;
pub const ARMORCLASS: usize = 2;
pub const ACCRUSHINGMOD: usize = 3;
pub const ACMISSILEMOD: usize = 4;
pub const ACPIERCINGMOD: usize = 5;
pub const ACSLASHINGMOD: usize = 6;
pub const TOHIT: usize = 7;
pub const NUMBEROFATTACKS: usize = 8;
pub const SAVEVSDEATH: usize = 9;
pub const SAVEVSWANDS: usize = 10;
pub const SAVEVSPOLY: usize = 11;
pub const SAVEVSBREATH: usize = 12;
pub const SAVEVSSPELL: usize = 13;
pub const RESISTFIRE: usize = 14;
pub const RESISTCOLD: usize = 15;
pub const RESISTELECTRICITY: usize = 16;
pub const RESISTACID: usize = 17;
pub const RESISTMAGIC: usize = 18;
pub const RESISTMAGICFIRE: usize = 19;
pub const RESISTMAGICCOLD: usize = 20;
pub const RESISTSLASHING: usize = 21;
pub const RESISTCRUSHING: usize = 22;
pub const RESISTPIERCING: usize = 23;
pub const RESISTMISSILE: usize = 24;
pub const LORE: usize = 25;
pub const LOCKPICKING: usize = 26;
pub const STEALTH: usize = 27;
pub const TRAPS: usize = 28;
pub const PICKPOCKET: usize = 29;
pub const FATIGUE: usize = 30;
pub const INTOXICATION: usize = 31;
pub const LUCK: usize = 32;
pub const TRACKING: usize = 33;
pub const LEVEL: usize = 34;
pub const SEX: usize = 35;
pub const STR: usize = 36;
pub const STREXTRA: usize = 37;
pub const INT: usize = 38;
pub const WIS: usize = 39;
pub const DEX: usize = 40;
pub const CON: usize = 41;
pub const CHR: usize = 42;
pub const XPVALUE: usize = 43;
pub const XP: usize = 44;
pub const GOLD: usize = 45;
pub const MORALEBREAK: usize = 46;
pub const MORALERECOVERYTIME: usize = 47;
pub const REPUTATION: usize = 48;
pub const HATEDRACE: usize = 49;
pub const LEVEL2: usize = 68;
pub const LEVEL3: usize = 69;
pub const HIDEINSHADOWS: usize = 133;
pub const DETECTILLUSIONS: usize = 134;
pub const SETTRAPS: usize = 135;
pub const KIT: usize = 152;
pub const MORALE: usize = 156;
pub const NOCIRCLE: usize = 166;
pub const UNSELECTABLE: usize = 167;
pub const ANIMATION_ID: usize = 201;
pub const STATE_ID: usize = 202;
pub const EA: usize = 234;
pub const GENERAL: usize = 235;
pub const RACE: usize = 236;
pub const CLASS: usize = 237;
pub const SPECIFIC: usize = 238;
pub const GENDER: usize = 239;
pub const ALIGNMENT: usize = 240;

// Third-edition saves reuse the classic slots.
pub const SAVEFORTITUDE: usize = SAVEVSDEATH;
pub const SAVEREFLEX: usize = SAVEVSWANDS;
pub const SAVEWILL: usize = SAVEVSPOLY;

/// `STATE_ID` bit set on dead creatures.
pub const STATE_DEAD: i32 = 0x800;

/// Effect opcodes that modify a single stat through parameter1/parameter2.
const STAT_OPCODES: &[(u32, usize)] = &[
    (0, ARMORCLASS),
    (1, NUMBEROFATTACKS),
    (6, CHR),
    (10, CON),
    (15, DEX),
    (18, MAXHITPOINTS),
    (19, INT),
    (21, LORE),
    (22, LUCK),
    (27, RESISTACID),
    (28, RESISTCOLD),
    (29, RESISTELECTRICITY),
    (30, RESISTFIRE),
    (33, SAVEVSDEATH),
    (34, SAVEVSWANDS),
    (35, SAVEVSPOLY),
    (36, SAVEVSBREATH),
    (37, SAVEVSSPELL),
    (44, STR),
    (49, WIS),
    (54, TOHIT),
    (59, STEALTH),
    (86, RESISTSLASHING),
    (87, RESISTCRUSHING),
    (88, RESISTPIERCING),
    (89, RESISTMISSILE),
    (90, LOCKPICKING),
    (91, TRAPS),
    (92, PICKPOCKET),
    (93, FATIGUE),
    (94, INTOXICATION),
    (95, TRACKING),
    (96, LEVEL),
    (97, STREXTRA),
    (106, MORALEBREAK),
    (166, RESISTMAGIC),
];

pub fn stat_for_opcode(opcode: u32) -> Option<usize> {
    STAT_OPCODES
        .iter()
        .find(|(code, _)| *code == opcode)
        .map(|(_, stat)| *stat)
}
