//! # Baseline Unigrama com Backoff
//!
//! Para cada palavra do treino, escolhe a tag com que ela foi mais vezes
//! anotada. Palavras nunca vistas recebem uma tag padrão fixa (ex: `NN`).
//!
//! Serve apenas para produzir o estado inicial do aprendiz de Brill.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};
use crate::tagger::{validate_training_corpus, Sentence, Tagger};

/// Etiquetador unigrama imutável.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnigramTagger {
    /// palavra → tag mais frequente, em ordem para que o JSON salvo seja estável
    table: BTreeMap<String, String>,
    /// Tag de backoff para palavras fora da tabela
    default_tag: String,
}

impl UnigramTagger {
    /// Constrói a tabela palavra → tag mais frequente.
    ///
    /// Empates de frequência ficam com a tag que apareceu **primeiro** para
    /// aquela palavra, na ordem do corpus.
    pub fn train(corpus: &[Sentence], default_tag: &str) -> Result<Self> {
        if default_tag.is_empty() {
            return Err(ConfigError::EmptyDefaultTag.into());
        }
        validate_training_corpus(corpus)?;

        // Contagens em ordem de primeira ocorrência
        let mut counts: HashMap<&str, Vec<(&str, usize)>> = HashMap::new();
        for token in corpus.iter().flatten() {
            let tags = counts.entry(token.word.as_str()).or_default();
            match tags.iter_mut().find(|(tag, _)| *tag == token.tag) {
                Some((_, n)) => *n += 1,
                None => tags.push((token.tag.as_str(), 1)),
            }
        }

        let table = counts
            .into_iter()
            .map(|(word, tags)| {
                let mut best = tags[0];
                for &(tag, n) in &tags[1..] {
                    if n > best.1 {
                        best = (tag, n);
                    }
                }
                (word.to_string(), best.0.to_string())
            })
            .collect();

        Ok(Self {
            table,
            default_tag: default_tag.to_string(),
        })
    }

    #[inline]
    pub fn tag_word(&self, word: &str) -> &str {
        self.table
            .get(word)
            .map(String::as_str)
            .unwrap_or(&self.default_tag)
    }

    pub fn default_tag(&self) -> &str {
        &self.default_tag
    }

    /// Número de palavras com tag aprendida.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

impl Tagger for UnigramTagger {
    fn tag_words(&self, words: &[&str]) -> Vec<String> {
        words.iter().map(|w| self.tag_word(w).to_string()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scenario_b_unseen_word_falls_back() {
        let corpus = vec![
            Sentence::from_pairs(&[("I", "PRON"), ("run", "VERB")]),
            Sentence::from_pairs(&[("they", "PRON"), ("run", "VERB")]),
        ];
        let tagger = UnigramTagger::train(&corpus, "NN").unwrap();
        assert_eq!(tagger.tag_word("run"), "VERB");
        assert_eq!(tagger.tag_word("jog"), "NN");
        assert_eq!(tagger.tag_words(&["they", "jog"]), vec!["PRON", "NN"]);
    }

    #[test]
    fn test_most_frequent_tag_wins() {
        let corpus = vec![
            Sentence::from_pairs(&[("book", "NOUN"), ("book", "VERB"), ("book", "VERB")]),
        ];
        let tagger = UnigramTagger::train(&corpus, "NN").unwrap();
        assert_eq!(tagger.tag_word("book"), "VERB");
    }

    #[test]
    fn test_ties_keep_first_encountered_tag() {
        let corpus = vec![
            Sentence::from_pairs(&[("saw", "VERB"), ("saw", "NOUN")]),
            Sentence::from_pairs(&[("saw", "NOUN"), ("saw", "VERB")]),
        ];
        let tagger = UnigramTagger::train(&corpus, "NN").unwrap();
        assert_eq!(tagger.tag_word("saw"), "VERB");
    }

    #[test]
    fn test_serialization_is_reproducible() {
        let corpus = vec![
            Sentence::from_pairs(&[("the", "DT"), ("dog", "NN"), ("barks", "VBZ")]),
            Sentence::from_pairs(&[("a", "DT"), ("cat", "NN"), ("sleeps", "VBZ")]),
        ];
        let first = serde_json::to_string(&UnigramTagger::train(&corpus, "NN").unwrap()).unwrap();
        for _ in 0..5 {
            let again = serde_json::to_string(&UnigramTagger::train(&corpus, "NN").unwrap()).unwrap();
            assert_eq!(again, first);
        }
        assert!(first.find("\"a\"").unwrap() < first.find("\"the\"").unwrap());
    }

    #[test]
    fn test_empty_default_tag_is_rejected() {
        let corpus = vec![Sentence::from_pairs(&[("a", "DET")])];
        assert!(matches!(
            UnigramTagger::train(&corpus, ""),
            Err(crate::error::PosError::Configuration(ConfigError::EmptyDefaultTag))
        ));
    }
}
