// ============================================================
// Layer 4 — User Histories and Next-Item Samples
// ============================================================
// Interactions are grouped per user and stable-sorted by
// timestamp (ties and missing timestamps keep file order).
//
// A history h = [h0, h1, ..., h(n-1)] yields one sample per
// prefix: for i in 1..n
//
//   item_seq     = last max_len items of h[..i], left-padded with 0
//   item_seq_len = min(i, max_len)
//   target       = h[i]
//
// Left padding keeps the most recent item at the final
// position, which is where the model reads its prediction.

use std::collections::HashMap;

use crate::data::{dataset::SeqSample, vocab::{ItemVocab, PADDING_ID}};
use crate::domain::interaction::Interaction;

#[derive(Debug, Clone, PartialEq)]
pub struct UserHistory {
    pub user:  String,
    /// Dense item ids, oldest first.
    pub items: Vec<i64>,
}

/// Group `interactions` per user (users in order of first appearance)
/// and order each history by time. Items missing from `vocab` are dropped.
pub fn group_histories(interactions: &[Interaction], vocab: &ItemVocab) -> Vec<UserHistory> {
    let mut order: Vec<String> = Vec::new();
    let mut events: HashMap<&str, Vec<(f64, i64)>> = HashMap::new();

    for interaction in interactions {
        let Some(id) = vocab.id(&interaction.item) else {
            tracing::warn!("Item '{}' is not in the vocabulary, skipped", interaction.item);
            continue;
        };
        let entry = events.entry(interaction.user.as_str()).or_insert_with(|| {
            order.push(interaction.user.clone());
            Vec::new()
        });
        entry.push((interaction.timestamp.unwrap_or(0.0), id));
    }

    order
        .into_iter()
        .map(|user| {
            let mut user_events = events.remove(user.as_str()).unwrap_or_default();
            // sort_by is stable
            user_events.sort_by(|a, b| a.0.total_cmp(&b.0));
            UserHistory {
                user,
                items: user_events.into_iter().map(|(_, id)| id).collect(),
            }
        })
        .collect()
}

/// Keep the last `max_len` of `items` and pad on the left with 0.
/// Returns the padded sequence and the count of real items in it.
pub fn left_pad(items: &[i64], max_len: usize) -> (Vec<i64>, usize) {
    let kept = &items[items.len().saturating_sub(max_len)..];
    let mut padded = vec![PADDING_ID; max_len - kept.len()];
    padded.extend_from_slice(kept);
    (padded, kept.len())
}

/// One sample per prefix of `history`, in time order.
pub fn prefix_samples(history: &UserHistory, max_len: usize) -> Vec<SeqSample> {
    (1..history.items.len())
        .map(|i| {
            let (item_seq, item_seq_len) = left_pad(&history.items[..i], max_len);
            SeqSample { item_seq, item_seq_len, target: history.items[i] }
        })
        .collect()
}
