use crate::core::parser::normalize_name;
use crate::domain::model::{CardEntry, Player, RuleId, RuleViolation, Severity, ValidationResult};
use std::collections::{BTreeSet, HashSet};

pub const DECK_SIZE: u64 = 100;
pub const MAX_GAME_CHANGERS: usize = 3;

const COLOR_ORDER: [&str; 5] = ["W", "U", "B", "R", "G"];

fn violation(
    rule: RuleId,
    player: Option<Player>,
    card_names: Vec<String>,
    detail: String,
) -> RuleViolation {
    RuleViolation {
        rule,
        severity: Severity::Error,
        player,
        card_names,
        detail,
    }
}

fn color_rank(symbol: &str) -> usize {
    COLOR_ORDER
        .iter()
        .position(|color| *color == symbol)
        .unwrap_or(COLOR_ORDER.len())
}

/// `{R,U}` in WUBRG order, `{}` for colorless.
pub fn format_identity<'a>(identity: impl IntoIterator<Item = &'a String>) -> String {
    let mut symbols: Vec<&str> = identity.into_iter().map(String::as_str).collect();
    symbols.sort_by_key(|symbol| (color_rank(symbol), *symbol));
    symbols.dedup();
    format!("{{{}}}", symbols.join(","))
}

fn identity_of(entry: &CardEntry) -> Option<BTreeSet<String>> {
    entry
        .catalog_record
        .as_ref()
        .map(|record| record.color_identity.iter().cloned().collect())
}

/// 跨玩家的組牌規則；所有規則都會執行，不會提前中止
pub fn evaluate(player1: &ValidationResult, player2: &ValidationResult) -> Vec<RuleViolation> {
    let players = [(Player::One, player1), (Player::Two, player2)];

    let unresolved: Vec<String> = players
        .iter()
        .filter(|(_, result)| result.commander.catalog_record.is_none())
        .map(|(_, result)| result.commander.name.clone())
        .collect();
    if !unresolved.is_empty() {
        tracing::info!("Skipping deck rules: commander data missing");
        return vec![violation(
            RuleId::CommandersUnresolved,
            None,
            unresolved,
            "Commander data is missing for one or both players, so deck rules were not checked."
                .to_string(),
        )];
    }

    let mut violations = Vec::new();
    check_deck_size(&players, &mut violations);
    check_commander_colors(&players, &mut violations);
    check_shared_cards(player1, player2, &mut violations);
    check_color_identity(&players, &mut violations);
    check_game_changers(&players, &mut violations);

    tracing::debug!("Rule engine produced {} violations", violations.len());
    violations
}

fn check_deck_size(players: &[(Player, &ValidationResult)], out: &mut Vec<RuleViolation>) {
    for (player, result) in players {
        let total = result.total_cards();
        if total != DECK_SIZE {
            out.push(violation(
                RuleId::DeckSize,
                Some(*player),
                Vec::new(),
                format!("{} has {} cards.", player, total),
            ));
        }
    }
}

fn check_commander_colors(players: &[(Player, &ValidationResult)], out: &mut Vec<RuleViolation>) {
    for (player, result) in players {
        let Some(record) = &result.commander.catalog_record else {
            continue;
        };
        if record.color_identity.len() > 1 {
            out.push(violation(
                RuleId::CommanderColors,
                Some(*player),
                vec![record.name.clone()],
                format!(
                    "{}: '{}' has color identity {}.",
                    player,
                    record.name,
                    format_identity(&record.color_identity)
                ),
            ));
        }
    }
}

fn non_land_names(result: &ValidationResult) -> impl Iterator<Item = (&CardEntry, String)> + '_ {
    result
        .decklist
        .iter()
        .filter(|entry| {
            entry
                .catalog_record
                .as_ref()
                .is_some_and(|record| !record.is_land())
        })
        .map(|entry| (entry, normalize_name(&entry.name)))
}

fn check_shared_cards(
    player1: &ValidationResult,
    player2: &ValidationResult,
    out: &mut Vec<RuleViolation>,
) {
    let first_deck: HashSet<String> = non_land_names(player1).map(|(_, key)| key).collect();

    let mut reported = HashSet::new();
    let shared: Vec<String> = non_land_names(player2)
        .filter(|(_, key)| first_deck.contains(key) && reported.insert(key.clone()))
        .map(|(entry, _)| entry.name.clone())
        .collect();

    if !shared.is_empty() {
        let detail = format!("Both decks contain: {}.", shared.join(", "));
        out.push(violation(RuleId::SharedCards, None, shared, detail));
    }
}

fn check_color_identity(players: &[(Player, &ValidationResult)], out: &mut Vec<RuleViolation>) {
    let allowed: BTreeSet<String> = players
        .iter()
        .filter_map(|(_, result)| identity_of(&result.commander))
        .flatten()
        .collect();

    for (player, result) in players {
        for entry in &result.decklist {
            let Some(record) = &entry.catalog_record else {
                continue;
            };
            // 無色牌永遠合法
            if record.is_colorless() {
                continue;
            }
            let identity: BTreeSet<String> = record.color_identity.iter().cloned().collect();
            if identity.is_subset(&allowed) {
                continue;
            }
            out.push(violation(
                RuleId::ColorIdentity,
                Some(*player),
                vec![entry.name.clone()],
                format!(
                    "{}: '{}' has color identity {}, outside the allowed {}.",
                    player,
                    entry.name,
                    format_identity(&identity),
                    format_identity(&allowed)
                ),
            ));
        }
    }
}

fn check_game_changers(players: &[(Player, &ValidationResult)], out: &mut Vec<RuleViolation>) {
    for (player, result) in players {
        let flagged = |entry: &CardEntry| {
            entry
                .catalog_record
                .as_ref()
                .is_some_and(|record| record.is_game_changer())
        };

        let mut names = Vec::new();
        let mut listing = Vec::new();
        if flagged(&result.commander) {
            names.push(result.commander.name.clone());
            listing.push(format!("{} (commander)", result.commander.name));
        }
        for entry in result.decklist.iter().filter(|entry| flagged(*entry)) {
            names.push(entry.name.clone());
            listing.push(entry.name.clone());
        }

        if names.len() > MAX_GAME_CHANGERS {
            out.push(violation(
                RuleId::GameChangers,
                Some(*player),
                names.clone(),
                format!(
                    "{} has {} Game Changers ({} over the limit of {}): {}.",
                    player,
                    names.len(),
                    names.len() - MAX_GAME_CHANGERS,
                    MAX_GAME_CHANGERS,
                    listing.join(", ")
                ),
            ));
        }
    }
}
