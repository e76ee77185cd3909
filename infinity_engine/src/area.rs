//! Selection circles drawn under actors on the area map.

use infinity_formats::cre::stats::{EA, MORALEBREAK, NOCIRCLE, STATE_DEAD, STATE_ID, UNSELECTABLE};
use infinity_formats::ActorRecord;
use serde::Serialize;

// Enemy-ally values.
const PC: i32 = 2;
const FAMILIAR: i32 = 3;
const ALLY: i32 = 4;
const CONTROLLED: i32 = 5;
const CHARMED: i32 = 6;
const GOODBUTRED: i32 = 28;
const GOODCUTOFF: i32 = 30;
const EVILCUTOFF: i32 = 200;
const EVILBUTGREEN: i32 = 201;
const ENEMY: i32 = 255;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CircleHue {
    Magenta,
    Yellow,
    Green,
    Red,
    Cyan,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SelectionCircle {
    pub hue: CircleHue,
    /// Bright variant for selected actors, dark otherwise.
    pub bright: bool,
    pub radius_x: u16,
    pub radius_y: u16,
}

/// How an actor on the map is outlined, if at all.
///
/// `circle_size` and `draws_circle` come from the actor's animation; a
/// selected actor is always outlined unless its animation has no circle.
///
/// Hues are picked by strict priority. An unselectable actor stays magenta
/// even when broken morale or its allegiance would pick another hue, and
/// even when its allegiance is a cutoff marker that otherwise hides the
/// circle. Later checks never repaint it green or red.
pub fn selection_circle(
    actor: &ActorRecord,
    selected: bool,
    draws_circle: bool,
    circle_size: u16,
) -> Option<SelectionCircle> {
    if !(draws_circle || selected) || circle_size == 0 {
        return None;
    }
    if actor.stat(NOCIRCLE) != 0 || actor.stat(STATE_ID) & STATE_DEAD != 0 {
        return None;
    }

    let hue = if actor.base(UNSELECTABLE) != 0 {
        CircleHue::Magenta
    } else if actor.base(MORALEBREAK) < actor.stat(MORALEBREAK) {
        CircleHue::Yellow
    } else {
        match actor.base(EA) {
            // The cutoff markers are not real allegiances.
            GOODCUTOFF | EVILCUTOFF => return None,
            PC | FAMILIAR | ALLY | CONTROLLED | CHARMED | EVILBUTGREEN => CircleHue::Green,
            ENEMY | GOODBUTRED => CircleHue::Red,
            _ => CircleHue::Cyan,
        }
    };

    Some(SelectionCircle {
        hue,
        bright: selected,
        radius_x: circle_size * 10,
        radius_y: circle_size * 15 / 2,
    })
}
