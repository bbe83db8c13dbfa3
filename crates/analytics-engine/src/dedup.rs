//! Collapses resubmissions of the same real-world transaction.
//!
//! A transaction is identified by the normalized buyer identity plus the
//! vehicle (plate and renavam). When the same key shows up more than once,
//! the most recent submission wins.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use chrono::{DateTime, Utc};
use shared_types::SaleDocument;

use crate::extractors::timestamp::parse_timestamp;
use crate::text::{digits, normalize};

/// Composite identity key. Records with no identity at all key on their own
/// id, so two distinct anonymous records never collide.
pub fn canonical_key(doc: &SaleDocument) -> String {
    let name = normalize(&doc.buyer_name);
    let tax_id = digits(&doc.buyer_tax_id);
    let plate = normalize(&doc.plate).replace(' ', "");
    let renavam = digits(&doc.renavam);

    if name.is_empty() && tax_id.is_empty() && plate.is_empty() && renavam.is_empty() {
        return doc.id.clone();
    }
    format!("{name}|{tax_id}|{plate}|{renavam}")
}

/// Deduplicate by canonical key, keeping the later submission on collision.
/// Unparsable timestamps compare as oldest, and on equal timestamps the
/// first-seen record stays, which makes the pass idempotent.
pub fn deduplicate(records: &[SaleDocument]) -> Vec<SaleDocument> {
    let mut order: Vec<String> = Vec::new();
    let mut by_key: HashMap<String, SaleDocument> = HashMap::new();

    for doc in records {
        let key = canonical_key(doc);
        match by_key.entry(key.clone()) {
            Entry::Vacant(slot) => {
                slot.insert(doc.clone());
                order.push(key);
            }
            Entry::Occupied(mut slot) => {
                if submitted_at(doc) > submitted_at(slot.get()) {
                    slot.insert(doc.clone());
                }
            }
        }
    }

    order
        .into_iter()
        .filter_map(|key| by_key.remove(&key))
        .collect()
}

fn submitted_at(doc: &SaleDocument) -> Option<DateTime<Utc>> {
    // None sorts before any Some, so "unparsable" loses every collision.
    parse_timestamp(&doc.created_at)
}
