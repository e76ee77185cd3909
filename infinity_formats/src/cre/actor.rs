use serde::Serialize;

use super::CreVersion;
use super::effect::Effect;
use super::stats::{MAX_STATS, stat_for_opcode};
use crate::resref::ResRef;

pub const MAX_SCRIPTS: usize = 5;
pub const COLOR_COUNT: usize = 7;
/// Longest character name the sheet header can hold.
pub const NAME_LEN: usize = 32;

/// How an effect combines `parameter1` with a stat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[repr(u32)]
pub enum ModifierKind {
    Cumulative = 0,
    Flat = 1,
    Percent = 2,
}

impl ModifierKind {
    pub fn from_parameter(value: u32) -> Option<Self> {
        match value {
            0 => Some(ModifierKind::Cumulative),
            1 => Some(ModifierKind::Flat),
            2 => Some(ModifierKind::Percent),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct CreItem {
    pub resref: ResRef,
    pub expiration: u16,
    pub charges: [u16; 3],
    pub flags: u32,
}

/// Fixed number of equipment slots; each holds at most one item.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Inventory {
    slots: Vec<Option<CreItem>>,
    pub equipped_slot: u16,
    pub equipped_ability: u16,
}

impl Inventory {
    pub fn with_slots(count: usize) -> Self {
        Inventory {
            slots: vec![None; count],
            equipped_slot: 0,
            equipped_ability: 0,
        }
    }

    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    pub fn slot(&self, index: usize) -> Option<&CreItem> {
        self.slots.get(index).and_then(Option::as_ref)
    }

    /// Stores `item` in `index`, returning whatever was there. Out-of-range
    /// slots reject the item and hand it back.
    pub fn put(&mut self, index: usize, item: CreItem) -> Result<Option<CreItem>, CreItem> {
        match self.slots.get_mut(index) {
            Some(slot) => Ok(slot.replace(item)),
            None => Err(item),
        }
    }

    pub fn take(&mut self, index: usize) -> Option<CreItem> {
        self.slots.get_mut(index).and_then(Option::take)
    }

    /// Occupied slots in slot order.
    pub fn items(&self) -> impl Iterator<Item = (usize, &CreItem)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.as_ref().map(|item| (index, item)))
    }

    pub fn occupied(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    pub(crate) fn resize(&mut self, count: usize) {
        self.slots.resize(count, None);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KnownSpell {
    pub resref: ResRef,
    pub level: u16,
    pub kind: u16,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemorizedSpell {
    pub resref: ResRef,
    pub flags: u32,
}

/// One memorisation table entry: the spells prepared for a kind and level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpellPage {
    pub kind: u16,
    pub level: u16,
    pub slots: u16,
    pub slots_effective: u16,
    pub memorized: Vec<MemorizedSpell>,
}

impl SpellPage {
    pub fn new(kind: u16, level: u16, slots: u16) -> Self {
        SpellPage {
            kind,
            level,
            slots,
            slots_effective: slots,
            memorized: Vec::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        usize::from(self.slots.max(self.slots_effective))
    }

    /// Adds a prepared spell unless the page is full.
    pub fn memorize(&mut self, resref: ResRef) -> bool {
        if self.memorized.len() >= self.capacity() {
            return false;
        }
        self.memorized.push(MemorizedSpell { resref, flags: 1 });
        true
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QuickSlot {
    pub slot: u16,
    pub ability: u16,
}

/// Character sheet shortcuts; only persisted in character-sheet mode.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct QuickSlots {
    pub weapons: Vec<QuickSlot>,
    pub spells: Vec<ResRef>,
    pub items: Vec<QuickSlot>,
}

/// Unified in-memory creature.
///
/// `modified` always equals the base stats with every active effect applied;
/// mutators that touch either input recompute it before returning.
#[derive(Debug, Clone, Serialize)]
pub struct ActorRecord {
    pub version: CreVersion,
    pub name: String,
    pub long_name: u32,
    pub short_name: u32,
    pub flags: u32,
    pub colors: [u16; COLOR_COUNT],
    pub color_placements: [u8; COLOR_COUNT],
    pub small_portrait: ResRef,
    pub large_portrait: ResRef,
    pub scripts: [ResRef; MAX_SCRIPTS],
    pub dialog: ResRef,
    pub death_variable: String,
    pub inventory: Inventory,
    pub known_spells: Vec<KnownSpell>,
    pub spell_pages: Vec<SpellPage>,
    pub quick_slots: QuickSlots,
    #[serde(skip)]
    pub overlays: Vec<u8>,
    pub(crate) base_stats: Vec<i32>,
    modified: Vec<i32>,
    pub(crate) effects: Vec<Effect>,
    /// Header bytes as read, so fields we do not model survive a save.
    #[serde(skip)]
    pub(crate) raw_header: Vec<u8>,
}

impl ActorRecord {
    pub fn new(version: CreVersion) -> Self {
        ActorRecord {
            version,
            name: String::new(),
            long_name: u32::MAX,
            short_name: u32::MAX,
            flags: 0,
            colors: [0; COLOR_COUNT],
            color_placements: [0; COLOR_COUNT],
            small_portrait: ResRef::EMPTY,
            large_portrait: ResRef::EMPTY,
            scripts: [ResRef::EMPTY; MAX_SCRIPTS],
            dialog: ResRef::EMPTY,
            death_variable: String::new(),
            inventory: Inventory::with_slots(version.layout().item_slots),
            known_spells: Vec::new(),
            spell_pages: Vec::new(),
            quick_slots: QuickSlots::default(),
            overlays: Vec::new(),
            base_stats: vec![0; MAX_STATS],
            modified: vec![0; MAX_STATS],
            effects: Vec::new(),
            raw_header: Vec::new(),
        }
    }

    /// Re-targets the record at another generation. The inventory is resized
    /// to that generation's slot count and the captured header is dropped.
    pub fn convert_to(&mut self, version: CreVersion) {
        if self.version == version {
            return;
        }
        self.version = version;
        self.inventory.resize(version.layout().item_slots);
        self.raw_header.clear();
    }

    pub fn set_name(&mut self, name: &str) {
        let mut end = name.len().min(NAME_LEN);
        while !name.is_char_boundary(end) {
            end -= 1;
        }
        self.name = name[..end].to_string();
    }

    pub fn set_script(&mut self, index: usize, script: ResRef) -> bool {
        match self.scripts.get_mut(index) {
            Some(slot) => {
                *slot = script;
                true
            }
            None => false,
        }
    }

    /// Current value with all active effects applied.
    pub fn stat(&self, index: usize) -> i32 {
        self.modified.get(index).copied().unwrap_or(0)
    }

    pub fn base(&self, index: usize) -> i32 {
        self.base_stats.get(index).copied().unwrap_or(0)
    }

    /// Difference between the modified and base value.
    pub fn modifier_delta(&self, index: usize) -> i32 {
        clamp_i32(i64::from(self.stat(index)) - i64::from(self.base(index)))
    }

    pub fn set_base(&mut self, index: usize, value: i32) -> bool {
        let Some(slot) = self.base_stats.get_mut(index) else {
            return false;
        };
        *slot = value;
        self.recompute_modified();
        true
    }

    pub fn base_stats(&self) -> &[i32] {
        &self.base_stats
    }

    pub fn modified_stats(&self) -> &[i32] {
        &self.modified
    }

    pub fn effects(&self) -> &[Effect] {
        &self.effects
    }

    pub fn add_effect(&mut self, effect: Effect) {
        self.effects.push(effect);
        self.recompute_modified();
    }

    /// Drops every effect with `opcode`, returning how many were removed.
    pub fn remove_effects(&mut self, opcode: u32) -> usize {
        let before = self.effects.len();
        self.effects.retain(|fx| fx.opcode != opcode);
        let removed = before - self.effects.len();
        if removed > 0 {
            self.recompute_modified();
        }
        removed
    }

    pub fn set_effects(&mut self, effects: Vec<Effect>) {
        self.effects = effects;
        self.recompute_modified();
    }

    pub fn memorize_spell(&mut self, kind: u16, level: u16, resref: ResRef) -> bool {
        self.spell_pages
            .iter_mut()
            .find(|page| page.kind == kind && page.level == level)
            .is_some_and(|page| page.memorize(resref))
    }

    pub fn knows_spell(&self, resref: &ResRef) -> bool {
        self.known_spells.iter().any(|spell| spell.resref == *resref)
            || self
                .spell_pages
                .iter()
                .flat_map(|page| page.memorized.iter())
                .any(|spell| spell.resref == *resref)
    }

    pub(crate) fn recompute_modified(&mut self) {
        self.modified.copy_from_slice(&self.base_stats);
        for index in 0..self.effects.len() {
            let fx = &self.effects[index];
            if !fx.is_active() {
                continue;
            }
            let (Some(stat), Some(kind)) = (
                stat_for_opcode(fx.opcode),
                ModifierKind::from_parameter(fx.parameter2),
            ) else {
                continue;
            };
            let value = fx.parameter1;
            self.new_mod(stat, value, kind);
        }
    }

    /// Applies one modifier to the modified value and returns the change.
    fn new_mod(&mut self, stat: usize, value: i32, kind: ModifierKind) -> i32 {
        let old = self.modified[stat];
        let new = match kind {
            ModifierKind::Cumulative => old.saturating_add(value),
            ModifierKind::Flat => value,
            ModifierKind::Percent => {
                clamp_i32(i64::from(self.base_stats[stat]) * i64::from(value) / 100)
            }
        };
        self.modified[stat] = new;
        clamp_i32(i64::from(new) - i64::from(old))
    }
}

fn clamp_i32(value: i64) -> i32 {
    value.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}

impl Default for ActorRecord {
    fn default() -> Self {
        ActorRecord::new(CreVersion::V1_0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cre::stats::{ARMORCLASS, CON, DEX, MAXHITPOINTS, STR};

    #[test]
    fn modified_tracks_base_and_effects() {
        let mut actor = ActorRecord::default();
        actor.set_base(STR, 12);
        assert_eq!(actor.stat(STR), 12);

        actor.add_effect(Effect::stat_modifier(44, 3, ModifierKind::Cumulative));
        assert_eq!(actor.stat(STR), 15);
        assert_eq!(actor.modifier_delta(STR), 3);

        actor.set_base(STR, 10);
        assert_eq!(actor.stat(STR), 13);

        assert_eq!(actor.remove_effects(44), 1);
        assert_eq!(actor.stat(STR), 10);
    }

    #[test]
    fn flat_and_percent_modifiers() {
        let mut actor = ActorRecord::default();
        actor.set_base(DEX, 14);
        actor.set_base(MAXHITPOINTS, 40);
        actor.set_effects(vec![
            Effect::stat_modifier(15, 18, ModifierKind::Flat),
            Effect::stat_modifier(18, 150, ModifierKind::Percent),
        ]);
        assert_eq!(actor.stat(DEX), 18);
        assert_eq!(actor.stat(MAXHITPOINTS), 60);
        assert_eq!(actor.base(MAXHITPOINTS), 40);
    }

    #[test]
    fn extreme_parameters_saturate() {
        let mut actor = ActorRecord::default();
        actor.set_base(ARMORCLASS, -10);
        actor.add_effect(Effect::stat_modifier(0, i32::MAX, ModifierKind::Flat));
        assert_eq!(actor.stat(ARMORCLASS), i32::MAX);
        assert_eq!(actor.modifier_delta(ARMORCLASS), i32::MAX);

        actor.set_base(MAXHITPOINTS, i32::MAX);
        actor.set_effects(vec![
            Effect::stat_modifier(18, i32::MAX, ModifierKind::Percent),
            Effect::stat_modifier(18, i32::MIN, ModifierKind::Cumulative),
        ]);
        assert_eq!(actor.stat(MAXHITPOINTS), -1);

        actor.set_base(STR, i32::MIN);
        actor.set_effects(vec![Effect::stat_modifier(44, i32::MAX, ModifierKind::Flat)]);
        assert_eq!(actor.modifier_delta(STR), i32::MAX);
    }

    #[test]
    fn delayed_effects_do_not_count() {
        let mut actor = ActorRecord::default();
        actor.set_base(CON, 9);
        let mut fx = Effect::stat_modifier(10, 2, ModifierKind::Cumulative);
        fx.timing = 4;
        actor.add_effect(fx);
        assert_eq!(actor.stat(CON), 9);
    }

    #[test]
    fn inventory_and_pages_are_bounded() {
        let mut actor = ActorRecord::default();
        let slots = actor.inventory.slot_count();
        let item = CreItem {
            resref: ResRef::new("SW1H01"),
            ..CreItem::default()
        };
        assert!(actor.inventory.put(slots, item.clone()).is_err());
        assert_eq!(actor.inventory.put(2, item.clone()), Ok(None));
        assert_eq!(actor.inventory.occupied(), 1);

        actor.spell_pages.push(SpellPage::new(1, 0, 1));
        assert!(actor.memorize_spell(1, 0, ResRef::new("SPWI112")));
        assert!(!actor.memorize_spell(1, 0, ResRef::new("SPWI110")));
        assert!(!actor.memorize_spell(1, 3, ResRef::new("SPWI304")));
        assert!(actor.knows_spell(&ResRef::new("SPWI112")));
    }

    #[test]
    fn names_and_scripts_are_bounded() {
        let mut actor = ActorRecord::default();
        actor.set_name(&"x".repeat(40));
        assert_eq!(actor.name.len(), NAME_LEN);
        assert!(!actor.set_script(MAX_SCRIPTS, ResRef::new("DPLAYER2")));
        assert!(actor.set_script(0, ResRef::new("DPLAYER2")));
    }
}
