// The RM2 global-shout catalog.
//
// Literals and prefixes are lower-case; matching lower-cases the message.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use super::model::{EventSignature, Extraction, LeadingToken, ReminderSpec};
use crate::core::roles::{
    BD_ROLE_NAME, BSIM_ROLE_NAME, FSWAR_ROLE_NAME, FV_ROLE_NAME, HQWAR_ROLE_NAME, MI_ROLE_NAME,
    OUTLAW_ROLE_NAME, PVP_BATTLE_ROLE_NAME, PVP_TOURNAMENT_ROLE_NAME, SEASONAL_EVENT_ROLE_NAME,
    UNI_ROLE_NAME,
};

/// Seasonal events switched on for the current time of year
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Seasons {
    #[serde(default)]
    pub halloween: bool,
    #[serde(default)]
    pub christmas: bool,
}

pub const BIG_SANTA_EVENT: &str = "big_santa";

/// Big Santa respawns seven hours after it is defeated
pub const BIG_SANTA_CYCLE_MINUTES: i64 = 7 * 60;
pub const REMINDER_LEAD_MINUTES: i64 = 15;
pub const BIG_SANTA_REMINDER: &str = "{role} Big Santa will spawn in 15 minutes! (at {timestamp})";

fn year_round() -> Vec<EventSignature> {
    vec![
        EventSignature::exact(
            "fswar_street_2",
            "**food shop war is starting in 15 minutes in street 2!**",
            FSWAR_ROLE_NAME,
            "{role} Food Shop War (street 2) starts in 15 minutes!",
        ),
        EventSignature::exact(
            "fswar_signus_ax1",
            "**food shop war is starting in 15 minutes in signus ax-1!**",
            FSWAR_ROLE_NAME,
            "{role} Food Shop War (Signus AX-1) starts in 15 minutes!",
        ),
        EventSignature::exact(
            "fswar_downtown_4",
            "**food shop war is starting in 15 minutes in downtown 4!**",
            FSWAR_ROLE_NAME,
            "{role} Food Shop War (Downtown 4) starts in 15 minutes!",
        ),
        EventSignature::exact(
            "hq_war",
            "**hq war starting in 5 minutes!**",
            HQWAR_ROLE_NAME,
            "{role} HQ War starts in 5 minutes!",
        ),
        EventSignature::exact(
            "pvp_tournament",
            "**pvp tournament starts in 20 minutes, please opt in in the special battle arena!**",
            PVP_TOURNAMENT_ROLE_NAME,
            "{role} PvP Tournament starts in 20 minutes!  Opt in!",
        ),
        EventSignature::exact(
            "uni_raid",
            "**sky skirmish complete, join the uni raid within 5 minutes (solo or as a group)!**",
            UNI_ROLE_NAME,
            "{role} Uni open for 5 minutes",
        ),
        EventSignature::exact(
            "uni_dungeon",
            "**sky dungeon skirmish complete, join the uni sky dungeon raid within 5 minutes (solo or as a group)!**",
            UNI_ROLE_NAME,
            "{role} Uni Dungeon open for 5 minutes",
        ),
        // The shout has appeared both with and without the exclamation mark
        EventSignature::exact(
            "battle_dimension",
            "**battle dimension starts in 30 minutes**",
            BD_ROLE_NAME,
            "{role} Battle Dimension opens in 30 minutes",
        ),
        EventSignature::exact(
            "battle_dimension_excl",
            "**battle dimension starts in 30 minutes!**",
            BD_ROLE_NAME,
            "{role} Battle Dimension opens in 30 minutes",
        ),
        EventSignature::exact(
            "battle_match",
            "**battle match starts in 30 minutes!**",
            BD_ROLE_NAME,
            "{role} Battle Match starts in 30 minutes!",
        ),
        EventSignature::exact(
            "battle_match_opens",
            "**battle match opens in 30 minutes!**",
            BD_ROLE_NAME,
            "{role} Battle Match opens in 30 minutes!",
        ),
        EventSignature::exact(
            "battle_simulation",
            "**battle simulation opens in 5 minutes!**",
            BSIM_ROLE_NAME,
            "{role} Battle Simulation opens in 5 minutes!",
        ),
        EventSignature::exact(
            "freedom_village",
            "**sky city is launching an attack on freedom village in 30 minutes!**",
            FV_ROLE_NAME,
            "{role} Freedom Village in 30 minutes!",
        ),
        EventSignature::exact(
            "monster_invasion",
            "**monster invasion starts in 30 minutes!**",
            MI_ROLE_NAME,
            "{role} Monster Invasion starts in 30 minutes!",
        ),
        EventSignature::prefix(
            "open_pvp_battle",
            "**open pvp battle starts in 30 minutes in",
            Extraction::after("map", "in", 2),
            PVP_BATTLE_ROLE_NAME,
            "{role} Open PvP Battle starts in 30 minutes in {map}!",
        ),
        EventSignature::prefix(
            "outlaw",
            "**player ",
            Extraction::after("map", "at", 1).with_leading(LeadingToken {
                field: "player",
                index: 1,
                followed_by: &["became", "an", "outlaw", "at"],
            }),
            OUTLAW_ROLE_NAME,
            "{role} {player} became an outlaw at {map}!",
        ),
    ]
}

fn halloween() -> Vec<EventSignature> {
    vec![EventSignature::prefix(
        "friendly_hallowvern",
        "**friendly hallowvern appeared in",
        Extraction::after("map", "in", 1),
        SEASONAL_EVENT_ROLE_NAME,
        "{role} Friendly Hallowvern appeared in {map}!",
    )]
}

fn christmas() -> Vec<EventSignature> {
    vec![EventSignature::exact(
        "big_santa_defeated",
        "**big santa has been defeated!**",
        SEASONAL_EVENT_ROLE_NAME,
        "{role} Big Santa has been defeated! Next spawn in 7 hours.",
    )
    .with_reminder(ReminderSpec {
        event_type: BIG_SANTA_EVENT,
        cycle: Duration::minutes(BIG_SANTA_CYCLE_MINUTES),
        lead: Duration::minutes(REMINDER_LEAD_MINUTES),
        template: BIG_SANTA_REMINDER,
    })]
}

/// All signatures active for the given seasons, in catalog order.
pub fn signatures(seasons: &Seasons) -> Vec<EventSignature> {
    let mut all = year_round();
    if seasons.halloween {
        all.extend(halloween());
    }
    if seasons.christmas {
        all.extend(christmas());
    }
    all
}
