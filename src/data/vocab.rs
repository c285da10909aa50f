// ============================================================
// Layer 4 — Item Vocabulary
// ============================================================
// Raw item tokens → dense model ids.
//
//   id 0      padding / "no item", never assigned to a token
//   id 1..=n  items in order of first appearance
//
// item_size() = n + 1 is the row count of the item embedding
// table and the width of every full-catalog score vector.

use std::collections::HashMap;

use crate::domain::interaction::Interaction;

pub const PADDING_ID: i64 = 0;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemVocab {
    /// tokens[i] has id i + 1
    tokens: Vec<String>,
    index:  HashMap<String, i64>,
}

impl ItemVocab {
    /// Assign ids in order of first appearance in `interactions`.
    pub fn build(interactions: &[Interaction]) -> Self {
        let mut vocab = Self::default();
        for interaction in interactions {
            vocab.insert(&interaction.item);
        }
        tracing::debug!("Item vocabulary: {} items", vocab.len());
        vocab
    }

    /// Rebuild from a saved token list (position i → id i + 1).
    pub fn from_tokens(tokens: Vec<String>) -> Self {
        let mut vocab = Self::default();
        for token in &tokens {
            vocab.insert(token);
        }
        vocab
    }

    fn insert(&mut self, token: &str) -> i64 {
        if let Some(&id) = self.index.get(token) {
            return id;
        }
        self.tokens.push(token.to_string());
        let id = self.tokens.len() as i64;
        self.index.insert(token.to_string(), id);
        id
    }

    pub fn id(&self, token: &str) -> Option<i64> {
        self.index.get(token).copied()
    }

    pub fn token(&self, id: i64) -> Option<&str> {
        if id <= PADDING_ID {
            return None;
        }
        self.tokens.get(id as usize - 1).map(String::as_str)
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// Number of real items (padding excluded).
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Catalog size including padding.
    pub fn item_size(&self) -> usize {
        self.tokens.len() + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn log(items: &[&str]) -> Vec<Interaction> {
        items.iter().map(|i| Interaction::new("u", *i, None)).collect()
    }

    #[test]
    fn test_ids_start_at_one_in_appearance_order() {
        let vocab = ItemVocab::build(&log(&["b", "a", "b", "c"]));
        assert_eq!(vocab.id("b"), Some(1));
        assert_eq!(vocab.id("a"), Some(2));
        assert_eq!(vocab.id("c"), Some(3));
        assert_eq!(vocab.id("zzz"), None);
        assert_eq!(vocab.item_size(), 4);
    }

    #[test]
    fn test_padding_has_no_token() {
        let vocab = ItemVocab::build(&log(&["x"]));
        assert_eq!(vocab.token(PADDING_ID), None);
        assert_eq!(vocab.token(1), Some("x"));
        assert_eq!(vocab.token(2), None);
    }

    #[test]
    fn test_token_list_round_trip() {
        let vocab = ItemVocab::build(&log(&["q", "w", "e"]));
        let rebuilt = ItemVocab::from_tokens(vocab.tokens().to_vec());
        assert_eq!(rebuilt, vocab);
    }
}
