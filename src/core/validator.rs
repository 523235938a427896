use crate::core::catalog::{resolve_names, LookupSettings};
use crate::core::parser::{build_requests, normalize_separator, parse_decklist, ParsedDecklist};
use crate::core::reconcile::reconcile;
use crate::core::rules;
use crate::domain::model::{CardEntry, DeckSubmission, PairValidation, ValidationResult};
use crate::domain::ports::CardCatalog;

pub const MISSING_COMMANDER: &str = "Commander name is missing.";
pub const DECK_NOT_VALIDATED: &str = "Commander missing, deck not validated.";

/// 兩位玩家的完整驗證流程：解析 → 批次查詢 → 模糊備援 → 對應 → 規則
pub struct DeckValidator<C: CardCatalog> {
    catalog: C,
    settings: LookupSettings,
}

impl<C: CardCatalog> DeckValidator<C> {
    pub fn new(catalog: C, settings: LookupSettings) -> Self {
        Self { catalog, settings }
    }

    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    pub async fn validate_player(&self, submission: &DeckSubmission) -> ValidationResult {
        let parsed = parse_decklist(&submission.decklist);

        if submission.commander.trim().is_empty() {
            tracing::warn!("Commander name missing, skipping catalog lookup");
            return missing_commander_result(parsed);
        }

        let requests = build_requests(&submission.commander, &parsed);
        let names: Vec<String> = requests
            .iter()
            .map(|request| normalize_separator(&request.name))
            .collect();

        let lookup = resolve_names(&self.catalog, &names, &self.settings).await;
        let mut result = reconcile(&requests, &lookup);

        if !parsed.errors.is_empty() {
            let mut errors = parsed.errors;
            errors.append(&mut result.errors);
            result.errors = errors;
        }

        tracing::info!(
            "Validated deck for '{}': {} entries, {} errors",
            result.commander.name,
            result.entry_count(),
            result.errors.len()
        );
        result
    }

    /// Both pipelines run concurrently; each one keeps its own request spacing.
    pub async fn validate_pair(
        &self,
        player1: &DeckSubmission,
        player2: &DeckSubmission,
    ) -> PairValidation {
        let (player1, player2) =
            tokio::join!(self.validate_player(player1), self.validate_player(player2));
        let violations = rules::evaluate(&player1, &player2);

        PairValidation {
            player1,
            player2,
            violations,
            validated_at: chrono::Utc::now(),
        }
    }
}

fn missing_commander_result(parsed: ParsedDecklist) -> ValidationResult {
    let decklist = parsed
        .cards
        .iter()
        .map(|card| CardEntry::unresolved(&card.name, card.quantity, DECK_NOT_VALIDATED))
        .collect();

    let mut errors = vec![MISSING_COMMANDER.to_string()];
    errors.extend(parsed.errors);

    ValidationResult {
        commander: CardEntry::unresolved("", 1, MISSING_COMMANDER),
        decklist,
        errors,
        warnings: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::catalog::tests::{record, Call, FakeCatalog};
    use crate::domain::model::RuleId;

    fn catalog() -> FakeCatalog {
        FakeCatalog::with_cards(vec![
            record("Krenko, Mob Boss", &["R"], "Legendary Creature — Goblin Warrior"),
            record("Talrand, Sky Summoner", &["U"], "Legendary Creature — Merfolk Wizard"),
            record("Mountain", &[], "Basic Land — Mountain"),
            record("Island", &[], "Basic Land — Island"),
            record("Sol Ring", &[], "Artifact"),
            record("Fire // Ice", &["R"], "Instant // Instant"),
        ])
    }

    #[tokio::test]
    async fn test_missing_commander_skips_network() {
        let validator = DeckValidator::new(catalog(), LookupSettings::default());
        let submission = DeckSubmission::new("   ", "1 Sol Ring\n98 Mountain");

        let result = validator.validate_player(&submission).await;

        assert!(validator.catalog().calls().await.is_empty());
        assert_eq!(result.errors, vec![MISSING_COMMANDER.to_string()]);
        assert_eq!(result.commander.error.as_deref(), Some(MISSING_COMMANDER));
        assert_eq!(result.decklist.len(), 2);
        assert!(result
            .decklist
            .iter()
            .all(|entry| entry.catalog_record.is_none()
                && entry.error.as_deref() == Some(DECK_NOT_VALIDATED)));
    }

    #[tokio::test]
    async fn test_validate_player_sends_normalized_names() {
        let validator = DeckValidator::new(catalog(), LookupSettings::default());
        let submission = DeckSubmission::new("Krenko, Mob Boss", "1 fire//ice\n98 Mountain");

        let result = validator.validate_player(&submission).await;

        assert!(result.errors.is_empty());
        assert_eq!(result.decklist[0].name, "Fire // Ice");
        assert_eq!(
            validator.catalog().calls().await,
            vec![Call::Collection(vec![
                "Krenko, Mob Boss".to_string(),
                "fire // ice".to_string(),
                "Mountain".to_string(),
            ])]
        );
    }

    #[tokio::test]
    async fn test_parse_errors_lead_the_error_list() {
        let validator = DeckValidator::new(catalog(), LookupSettings::default());
        let submission = DeckSubmission::new("Krenko, Mob Boss", "3x\n1 Unknown Card");

        let result = validator.validate_player(&submission).await;

        assert_eq!(result.errors.len(), 2);
        assert!(result.errors[0].starts_with("Line 1:"));
        assert_eq!(result.errors[1], "Card 'Unknown Card' not found by Scryfall.");
    }

    #[tokio::test]
    async fn test_validate_pair_runs_rules() {
        let validator = DeckValidator::new(catalog(), LookupSettings::default());
        let player1 = DeckSubmission::new("Krenko, Mob Boss", "1 Sol Ring\n98 Mountain");
        let player2 = DeckSubmission::new("Talrand, Sky Summoner", "1 Sol Ring\n98 Island");

        let pair = validator.validate_pair(&player1, &player2).await;

        assert!(pair.player1.errors.is_empty());
        assert!(pair.player2.errors.is_empty());
        assert_eq!(pair.violations.len(), 1);
        assert_eq!(pair.violations[0].rule, RuleId::SharedCards);
        assert!(!pair.is_valid());
    }

    #[tokio::test]
    async fn test_huge_quantities_become_a_deck_size_violation() {
        let validator = DeckValidator::new(catalog(), LookupSettings::default());
        let player1 = DeckSubmission::new("Krenko, Mob Boss", "4294967295 Mountain\n1 Island");
        let player2 = DeckSubmission::new("Talrand, Sky Summoner", "99 Island");

        let pair = validator.validate_pair(&player1, &player2).await;

        assert_eq!(pair.player1.total_cards(), 4_294_967_297);
        assert_eq!(pair.violations.len(), 1);
        assert_eq!(pair.violations[0].rule, RuleId::DeckSize);
        assert_eq!(pair.violations[0].detail, "Player 1 has 4294967297 cards.");
    }

    #[tokio::test]
    async fn test_validate_pair_without_commanders() {
        let validator = DeckValidator::new(catalog(), LookupSettings::default());
        let player1 = DeckSubmission::new("", "99 Mountain");
        let player2 = DeckSubmission::new("Nobody, the Unknown", "99 Island");

        let pair = validator.validate_pair(&player1, &player2).await;

        assert_eq!(pair.violations.len(), 1);
        assert_eq!(pair.violations[0].rule, RuleId::CommandersUnresolved);
    }
}
