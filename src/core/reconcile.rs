use crate::core::catalog::LookupOutcome;
use crate::core::parser::{front_face, normalize_name};
use crate::domain::model::{CardEntry, CardRequest, CatalogRecord, ValidationResult};

fn unclaimed<'a>(
    records: &'a [CatalogRecord],
    claimed: &'a [bool],
) -> impl Iterator<Item = (usize, &'a CatalogRecord)> + 'a {
    records
        .iter()
        .enumerate()
        .filter(move |(index, _)| !claimed[*index])
}

/// Picks the first unclaimed record for `key`: exact name, then front face, then any declared face.
fn find_record(key: &str, records: &[CatalogRecord], claimed: &[bool]) -> Option<usize> {
    unclaimed(records, claimed)
        .find(|(_, record)| normalize_name(&record.name) == key)
        .or_else(|| unclaimed(records, claimed).find(|(_, record)| front_face(&record.name) == key))
        .or_else(|| {
            unclaimed(records, claimed).find(|(_, record)| {
                record
                    .card_faces
                    .iter()
                    .flatten()
                    .any(|face| normalize_name(&face.name) == key)
            })
        })
        .map(|(index, _)| index)
}

fn was_reported_missing(key: &str, not_found: &[String]) -> bool {
    not_found.iter().any(|name| {
        let candidate = normalize_name(name);
        candidate == key || front_face(&candidate) == front_face(key)
    })
}

fn resolved_entry(request: &CardRequest, record: CatalogRecord) -> CardEntry {
    let is_legal = record.is_commander_legal();
    let error = (!is_legal).then(|| format!("'{}' is not legal in Commander.", record.name));
    CardEntry {
        name: record.name.clone(),
        quantity: request.quantity,
        catalog_record: Some(record),
        is_legal,
        error,
    }
}

/// 將查詢結果對應回原始請求，組成單一玩家的驗證結果
pub fn reconcile(requests: &[CardRequest], lookup: &LookupOutcome) -> ValidationResult {
    let mut claimed = vec![false; lookup.found.len()];
    let mut commander: Option<CardEntry> = None;
    let mut decklist = Vec::with_capacity(requests.len().saturating_sub(1));
    let mut errors = Vec::new();

    for request in requests {
        let key = normalize_name(&request.name);

        let entry = if let Some(index) = find_record(&key, &lookup.found, &claimed) {
            claimed[index] = true;
            resolved_entry(request, lookup.found[index].clone())
        } else if let Some(alias) = lookup
            .fuzzy_matches
            .iter()
            .find(|alias| normalize_name(&alias.requested) == key)
        {
            resolved_entry(request, alias.record.clone())
        } else if was_reported_missing(&key, &lookup.not_found) {
            CardEntry::unresolved(
                &request.name,
                request.quantity,
                format!("Card '{}' not found by Scryfall.", request.name),
            )
        } else {
            tracing::warn!(
                "'{}' was neither returned nor reported missing by the catalog",
                request.name
            );
            CardEntry::unresolved(
                &request.name,
                request.quantity,
                format!("Data for '{}' missing after Scryfall fetch.", request.name),
            )
        };

        if let Some(error) = &entry.error {
            errors.push(error.clone());
        }

        if request.is_commander && commander.is_none() {
            commander = Some(entry);
        } else {
            decklist.push(entry);
        }
    }

    let commander = match commander {
        Some(entry) => entry,
        None => {
            let name = requests
                .iter()
                .find(|request| request.is_commander)
                .map(|request| request.name.clone())
                .unwrap_or_default();
            let message = format!("Commander '{}' not found or failed to process.", name);
            if !errors.contains(&message) {
                errors.push(message.clone());
            }
            CardEntry::unresolved(name, 1, message)
        }
    };

    ValidationResult {
        commander,
        decklist,
        errors,
        warnings: lookup.warnings.clone(),
    }
}
