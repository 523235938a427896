use crate::domain::model::CardRequest;
use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;

/// 解析後的牌表：去重後的卡片與結構性錯誤
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedDecklist {
    pub cards: Vec<CardRequest>,
    pub errors: Vec<String>,
}

impl ParsedDecklist {
    pub fn total_quantity(&self) -> u64 {
        self.cards.iter().map(|card| u64::from(card.quantity)).sum()
    }
}

fn line_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    // "4 Name", "4x Name", "4xName", "4 x Name" or just "Name"
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)^(?:(\d+)(?:x\s*|\s+x\s+|\s+))?(.+)$").expect("decklist line pattern")
    })
}

fn quantity_only_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?i)^\d+\s*x?$").expect("quantity-only pattern"))
}

/// Rewrites the split-card separator to the canonical `" // "` spacing.
pub fn normalize_separator(name: &str) -> String {
    if !name.contains("//") {
        return name.trim().to_string();
    }
    name.split("//")
        .map(str::trim)
        .collect::<Vec<_>>()
        .join(" // ")
}

/// Case-insensitive comparison key for a card name.
pub fn normalize_name(name: &str) -> String {
    normalize_separator(name).to_lowercase()
}

/// Name before the split separator, already normalized.
pub fn front_face(name: &str) -> String {
    let normalized = normalize_name(name);
    match normalized.split_once(" // ") {
        Some((front, _)) => front.to_string(),
        None => normalized,
    }
}

pub fn parse_decklist(text: &str) -> ParsedDecklist {
    let mut parsed = ParsedDecklist::default();
    let mut positions: HashMap<String, usize> = HashMap::new();

    // 行號以原始文字為準，空白行也要計入
    let normalized = text.replace("\r\n", "\n");
    let lines = normalized
        .split(['\n', '\r'])
        .enumerate()
        .map(|(index, line)| (index + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty());

    for (line_number, line) in lines {

        if quantity_only_pattern().is_match(line) {
            parsed
                .errors
                .push(format!("Line {}: '{}' has no card name.", line_number, line));
            continue;
        }

        let Some(captures) = line_pattern().captures(line) else {
            parsed
                .errors
                .push(format!("Line {}: could not parse '{}'.", line_number, line));
            continue;
        };

        let quantity = match captures.get(1) {
            Some(digits) => match digits.as_str().parse::<u32>() {
                Ok(0) => {
                    parsed.errors.push(format!(
                        "Line {}: quantity for '{}' must be at least 1.",
                        line_number, line
                    ));
                    continue;
                }
                Ok(quantity) => quantity,
                Err(_) => {
                    parsed.errors.push(format!(
                        "Line {}: quantity '{}' is too large.",
                        line_number,
                        digits.as_str()
                    ));
                    continue;
                }
            },
            None => 1,
        };

        let name = captures
            .get(2)
            .map(|m| m.as_str().trim())
            .unwrap_or_default();
        let key = normalize_name(name);

        match positions.get(&key) {
            Some(&position) => {
                let card = &mut parsed.cards[position];
                card.quantity = card.quantity.saturating_add(quantity);
            }
            None => {
                positions.insert(key, parsed.cards.len());
                parsed.cards.push(CardRequest {
                    name: name.to_string(),
                    quantity,
                    is_commander: false,
                });
            }
        }
    }

    tracing::debug!(
        "Parsed decklist: {} unique cards, {} total, {} line errors",
        parsed.cards.len(),
        parsed.total_quantity(),
        parsed.errors.len()
    );

    parsed
}

/// Commander first, then the decklist in first-seen order. The commander is never merged.
pub fn build_requests(commander: &str, decklist: &ParsedDecklist) -> Vec<CardRequest> {
    let mut requests = Vec::with_capacity(decklist.cards.len() + 1);
    requests.push(CardRequest {
        name: commander.trim().to_string(),
        quantity: 1,
        is_commander: true,
    });
    requests.extend(decklist.cards.iter().cloned());
    requests
}

/// One `"<qty>x <name>"` line per card.
pub fn format_decklist(cards: &[CardRequest]) -> String {
    cards
        .iter()
        .map(|card| format!("{}x {}", card.quantity, card.name))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(parsed: &ParsedDecklist) -> Vec<(&str, u32)> {
        parsed
            .cards
            .iter()
            .map(|card| (card.name.as_str(), card.quantity))
            .collect()
    }

    #[test]
    fn test_parse_quantity_formats() {
        let parsed = parse_decklist("1 Sol Ring\n2x Island\n3X Forest\n4xSwamp\n5 x Plains\nArcane Signet");

        assert!(parsed.errors.is_empty());
        assert_eq!(
            names(&parsed),
            vec![
                ("Sol Ring", 1),
                ("Island", 2),
                ("Forest", 3),
                ("Swamp", 4),
                ("Plains", 5),
                ("Arcane Signet", 1),
            ]
        );
    }

    #[test]
    fn test_names_starting_with_x_are_not_eaten() {
        let parsed = parse_decklist("1 Xenagos, God of Revels\nXantcha, Sleeper Agent");
        assert_eq!(
            names(&parsed),
            vec![("Xenagos, God of Revels", 1), ("Xantcha, Sleeper Agent", 1)]
        );
    }

    #[test]
    fn test_mixed_line_endings_and_blank_lines() {
        let parsed = parse_decklist("1 Sol Ring\r\n\r\n   \n2 Island\r3 Mountain\n");
        assert_eq!(
            names(&parsed),
            vec![("Sol Ring", 1), ("Island", 2), ("Mountain", 3)]
        );
    }

    #[test]
    fn test_duplicates_merge_with_first_display_name() {
        let parsed = parse_decklist("2 Island\n1 Sol Ring\n3x ISLAND\n  island  ");
        assert_eq!(names(&parsed), vec![("Island", 6), ("Sol Ring", 1)]);
    }

    #[test]
    fn test_split_card_spacing_merges() {
        let parsed = parse_decklist("1 Fire // Ice\n1 fire//ice");
        assert_eq!(names(&parsed), vec![("Fire // Ice", 2)]);
    }

    #[test]
    fn test_empty_decklist_is_not_an_error() {
        let parsed = parse_decklist("");
        assert!(parsed.cards.is_empty());
        assert!(parsed.errors.is_empty());

        let parsed = parse_decklist("\n  \r\n");
        assert!(parsed.cards.is_empty());
        assert!(parsed.errors.is_empty());
    }

    #[test]
    fn test_structural_errors_are_reported_and_skipped() {
        let parsed = parse_decklist("4x\n0 Island\n99999999999 Forest\n1 Sol Ring");
        assert_eq!(names(&parsed), vec![("Sol Ring", 1)]);
        assert_eq!(parsed.errors.len(), 3);
        assert!(parsed.errors[0].contains("has no card name"));
        assert!(parsed.errors[1].contains("at least 1"));
        assert!(parsed.errors[2].contains("too large"));
    }

    #[test]
    fn test_error_line_numbers_count_blank_lines() {
        let parsed = parse_decklist("1 Sol Ring\n\n\n0 Island");
        assert_eq!(
            parsed.errors,
            vec!["Line 4: quantity for '0 Island' must be at least 1.".to_string()]
        );

        let parsed = parse_decklist("1 Sol Ring\r\n\r\n4x\r0 Island");
        assert!(parsed.errors[0].starts_with("Line 3:"));
        assert!(parsed.errors[1].starts_with("Line 4:"));
    }

    #[test]
    fn test_sum_of_quantities_matches_input() {
        let raw = "10 Island\n5x Mountain\nSol Ring\n3 island\n2 Command Tower";
        let parsed = parse_decklist(raw);
        assert_eq!(parsed.total_quantity(), 10 + 5 + 1 + 3 + 2);
    }

    #[test]
    fn test_parsing_normalized_output_is_idempotent() {
        let raw = "2 Island\nsol ring\n1 Sol Ring\n3x Fire//Ice\n1 Xenagos, God of Revels";
        let first = parse_decklist(raw);
        let second = parse_decklist(&format_decklist(&first.cards));

        assert_eq!(names(&first), names(&second));
        assert_eq!(format_decklist(&second.cards), format_decklist(&first.cards));
    }

    #[test]
    fn test_commander_is_prepended_and_never_merged() {
        let parsed = parse_decklist("1 Krenko, Mob Boss\n98 Mountain");
        let requests = build_requests("  Krenko, Mob Boss ", &parsed);

        assert_eq!(requests.len(), 3);
        assert!(requests[0].is_commander);
        assert_eq!(requests[0].name, "Krenko, Mob Boss");
        assert_eq!(requests[0].quantity, 1);
        assert!(!requests[1].is_commander);
        assert_eq!(requests[1].name, "Krenko, Mob Boss");
    }

    #[test]
    fn test_front_face_and_normalization() {
        assert_eq!(normalize_separator("Fire//Ice"), "Fire // Ice");
        assert_eq!(normalize_name(" Fire //  Ice "), "fire // ice");
        assert_eq!(
            front_face("Fable of the Mirror-Breaker // Reflection of Kiki-Jiki"),
            "fable of the mirror-breaker"
        );
        assert_eq!(front_face("Sol Ring"), "sol ring");
    }
}
