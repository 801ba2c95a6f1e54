//! # Alfabetos de Tags e Palavras
//!
//! Mapeia símbolos (strings) para ids inteiros densos, para que as tabelas
//! do HMM e o estado do aprendiz de Brill sejam vetores indexados em vez de
//! mapas por string.
//!
//! Os ids são atribuídos em **ordem alfabética**. Assim a ordem dos ids é a
//! ordem fixa usada em todos os desempates: Viterbi escolhe o predecessor de
//! menor id e o aprendiz de Brill compara candidatos pela tupla de ids.

use std::collections::{BTreeSet, HashMap};
use std::ops::Index;

use serde::{Deserialize, Serialize};

use crate::tagger::Sentence;

/// Alfabeto imutável: construído uma vez a partir do corpus de treino.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct Vocabulary {
    symbols: Vec<String>,
    ids: HashMap<String, usize>,
}

impl Vocabulary {
    /// Constrói o alfabeto ordenado a partir de qualquer coleção de símbolos
    /// (duplicatas são ignoradas).
    pub fn from_symbols<I, S>(symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let sorted: BTreeSet<String> = symbols.into_iter().map(Into::into).collect();
        Self::from(sorted.into_iter().collect::<Vec<_>>())
    }

    /// Alfabeto de tags observadas no corpus.
    pub fn tags_of(corpus: &[Sentence]) -> Self {
        Self::from_symbols(corpus.iter().flatten().map(|t| t.tag.as_str()))
    }

    /// Alfabeto de palavras observadas no corpus.
    pub fn words_of(corpus: &[Sentence]) -> Self {
        Self::from_symbols(corpus.iter().flatten().map(|t| t.word.as_str()))
    }

    #[inline]
    pub fn id(&self, symbol: &str) -> Option<usize> {
        self.ids.get(symbol).copied()
    }

    /// Símbolo de um id. Entra em pânico se o id não pertencer ao alfabeto.
    #[inline]
    pub fn symbol(&self, id: usize) -> &str {
        &self.symbols[id]
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.ids.contains_key(symbol)
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }
}

/// `vocab[symbol]`: id de um símbolo que com certeza pertence ao alfabeto,
/// como os tokens do próprio corpus que o construiu.
///
/// # Panics
/// Se o símbolo não pertencer ao alfabeto.
impl Index<&str> for Vocabulary {
    type Output = usize;

    fn index(&self, symbol: &str) -> &usize {
        &self.ids[symbol]
    }
}

impl From<Vec<String>> for Vocabulary {
    /// Assume `symbols` já ordenado e sem repetições (é o formato serializado).
    fn from(symbols: Vec<String>) -> Self {
        let ids = symbols
            .iter()
            .enumerate()
            .map(|(i, s)| (s.clone(), i))
            .collect();
        Self { symbols, ids }
    }
}

impl From<Vocabulary> for Vec<String> {
    fn from(vocab: Vocabulary) -> Self {
        vocab.symbols
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_follow_alphabetical_order() {
        let vocab = Vocabulary::from_symbols(["VERB", "DET", "NOUN", "DET"]);
        assert_eq!(vocab.len(), 3);
        assert_eq!(vocab.symbols(), &["DET", "NOUN", "VERB"]);
        assert_eq!(vocab.id("DET"), Some(0));
        assert_eq!(vocab.id("VERB"), Some(2));
        assert_eq!(vocab.id("ADJ"), None);
        assert_eq!(vocab.symbol(1), "NOUN");
        assert_eq!(vocab["NOUN"], 1);
    }

    #[test]
    #[should_panic]
    fn test_index_of_unknown_symbol_panics() {
        let vocab = Vocabulary::from_symbols(["DET"]);
        let _ = vocab["ADJ"];
    }

    #[test]
    fn test_alphabets_from_corpus() {
        let corpus = vec![
            Sentence::from_pairs(&[("a", "DET"), ("dog", "NOUN")]),
            Sentence::from_pairs(&[("dog", "VERB")]),
        ];
        assert_eq!(Vocabulary::tags_of(&corpus).symbols(), &["DET", "NOUN", "VERB"]);
        assert_eq!(Vocabulary::words_of(&corpus).symbols(), &["a", "dog"]);
    }

    #[test]
    fn test_serde_keeps_ids() {
        let vocab = Vocabulary::from_symbols(["b", "a"]);
        let json = serde_json::to_string(&vocab).unwrap();
        assert_eq!(json, r#"["a","b"]"#);
        let back: Vocabulary = serde_json::from_str(&json).unwrap();
        assert_eq!(back, vocab);
        assert_eq!(back.id("b"), Some(1));
    }
}
