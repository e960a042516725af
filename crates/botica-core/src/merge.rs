//! # Keyed Merge
//!
//! Idempotent upsert by natural key, used by imports and backup restore.
//!
//! ```text
//! natural identifier ("F-0042")
//!        │
//!        ▼
//! deterministic key  (UUID v5 in a fixed namespace)
//!        │
//!        ▼
//! fetch existing ── none ──► insert incoming            (Created)
//!        │
//!        ▼
//! field-level merge: incoming wins unless absent/blank   (Updated)
//!        │
//!        ▼
//! write
//! ```
//!
//! Importing the same spreadsheet twice therefore produces the same rows.

use uuid::Uuid;

use crate::types::{Client, Order};

/// Namespace for client keys derived from import codes.
const CLIENT_NAMESPACE: Uuid = Uuid::from_u128(0x6c1e_9b3a_4f0d_5e21_9a7c_2b8d_1f30_a001);

/// Namespace for order keys derived from (client code, reference).
const ORDER_NAMESPACE: Uuid = Uuid::from_u128(0x6c1e_9b3a_4f0d_5e21_9a7c_2b8d_1f30_a002);

/// Canonical form of a natural code: trimmed and uppercased.
pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

/// Deterministic client id for an import code.
///
/// ```rust
/// use botica_core::merge::client_key;
///
/// assert_eq!(client_key("f-0042"), client_key(" F-0042 "));
/// assert_ne!(client_key("F-0042"), client_key("F-0043"));
/// ```
pub fn client_key(code: &str) -> String {
    Uuid::new_v5(&CLIENT_NAMESPACE, normalize_code(code).as_bytes()).to_string()
}

/// Deterministic order id for an imported order, identified by its client
/// code and a grouping token (reference, or date when there is none).
pub fn order_key(client_code: &str, token: &str) -> String {
    let name = format!("{}\u{1f}{}", normalize_code(client_code), token.trim());
    Uuid::new_v5(&ORDER_NAMESPACE, name.as_bytes()).to_string()
}

/// Random id for records created by hand.
pub fn random_key() -> String {
    Uuid::new_v4().to_string()
}

/// Result of [`merge_or_insert`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    Created,
    Updated,
}

/// Types that can absorb a newer copy of themselves field by field.
pub trait KeyedMerge {
    /// Overwrites fields of `self` with present fields of `incoming`.
    /// Identity and creation time stay with `self`.
    fn merge_from(&mut self, incoming: Self);
}

/// Fetch-or-default step of the keyed merge.
pub fn merge_or_insert<T: KeyedMerge>(existing: Option<T>, incoming: T) -> (T, MergeOutcome) {
    match existing {
        Some(mut current) => {
            current.merge_from(incoming);
            (current, MergeOutcome::Updated)
        }
        None => (incoming, MergeOutcome::Created),
    }
}

/// Replaces `slot` with `incoming` unless `incoming` is absent or blank.
pub fn prefer_incoming(slot: &mut Option<String>, incoming: Option<String>) {
    if let Some(value) = incoming {
        if !value.trim().is_empty() {
            *slot = Some(value);
        }
    }
}

impl KeyedMerge for Client {
    fn merge_from(&mut self, incoming: Client) {
        if !incoming.name.trim().is_empty() {
            self.name = incoming.name;
        }
        prefer_incoming(&mut self.code, incoming.code);
        prefer_incoming(&mut self.address, incoming.address);
        prefer_incoming(&mut self.city, incoming.city);
        prefer_incoming(&mut self.province, incoming.province);
        prefer_incoming(&mut self.postal_code, incoming.postal_code);
        prefer_incoming(&mut self.phone, incoming.phone);
        prefer_incoming(&mut self.email, incoming.email);
        prefer_incoming(&mut self.contact_person, incoming.contact_person);
        prefer_incoming(&mut self.notes, incoming.notes);
        self.updated_at = self.updated_at.max(incoming.updated_at);
    }
}

/// Lines, date, status and owner come from the import; reference and notes
/// keep their stored value when the import leaves them blank.
impl KeyedMerge for Order {
    fn merge_from(&mut self, incoming: Order) {
        self.client_id = incoming.client_id;
        self.date = incoming.date;
        self.status = incoming.status;
        self.lines = incoming.lines;
        prefer_incoming(&mut self.reference, incoming.reference);
        prefer_incoming(&mut self.notes, incoming.notes);
        self.recompute_totals();
        self.updated_at = self.updated_at.max(incoming.updated_at);
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
