//! # Tokens Etiquetados, Sentenças e o Contrato `Tagger`
//!
//! Tipos compartilhados pelos dois motores de etiquetagem:
//!
//! | Tipo            | Papel                                                  |
//! |-----------------|--------------------------------------------------------|
//! | [`TaggedToken`] | Par (palavra, tag), imutável depois de lido            |
//! | [`Sentence`]    | Sequência ordenada e não vazia de tokens               |
//! | [`Tagger`]      | `tag(palavras) -> tokens etiquetados`, comum a HMM e Brill |
//!
//! A ordem dos tokens importa: ela define o contexto à esquerda e à direita
//! usado tanto pelas transições do HMM quanto pelos templates de Brill.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{InvalidInputError, Result};

/// Uma palavra com sua tag morfossintática.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaggedToken {
    pub word: String,
    pub tag: String,
}

impl TaggedToken {
    pub fn new(word: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            word: word.into(),
            tag: tag.into(),
        }
    }
}

impl std::fmt::Display for TaggedToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.word, self.tag)
    }
}

/// Sentença anotada: sequência ordenada de [`TaggedToken`].
///
/// Nunca é vazia quando vem do leitor de corpus; sentenças vazias são
/// descartadas no carregamento.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Sentence {
    tokens: Vec<TaggedToken>,
}

impl Sentence {
    pub fn new(tokens: Vec<TaggedToken>) -> Self {
        Self { tokens }
    }

    /// Atalho para testes e exemplos: `Sentence::from_pairs(&[("a", "DET")])`.
    pub fn from_pairs(pairs: &[(&str, &str)]) -> Self {
        Self {
            tokens: pairs.iter().map(|(w, t)| TaggedToken::new(*w, *t)).collect(),
        }
    }

    pub fn push(&mut self, token: TaggedToken) {
        self.tokens.push(token);
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn tokens(&self) -> &[TaggedToken] {
        &self.tokens
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TaggedToken> {
        self.tokens.iter()
    }

    pub fn words(&self) -> Vec<&str> {
        self.tokens.iter().map(|t| t.word.as_str()).collect()
    }

    pub fn tags(&self) -> Vec<&str> {
        self.tokens.iter().map(|t| t.tag.as_str()).collect()
    }

    pub fn into_tokens(self) -> Vec<TaggedToken> {
        self.tokens
    }
}

impl From<Vec<TaggedToken>> for Sentence {
    fn from(tokens: Vec<TaggedToken>) -> Self {
        Self { tokens }
    }
}

impl<'a> IntoIterator for &'a Sentence {
    type Item = &'a TaggedToken;
    type IntoIter = std::slice::Iter<'a, TaggedToken>;

    fn into_iter(self) -> Self::IntoIter {
        self.tokens.iter()
    }
}

/// Verifica a restrição de entrada comum aos dois treinadores:
/// corpus não vazio, nenhuma sentença vazia e nenhuma palavra ou tag vazia.
pub fn validate_training_corpus(corpus: &[Sentence]) -> Result<()> {
    if corpus.is_empty() {
        return Err(InvalidInputError::EmptyCorpus.into());
    }
    for (index, sentence) in corpus.iter().enumerate() {
        if sentence.is_empty() {
            return Err(InvalidInputError::EmptySentence { index }.into());
        }
        for (token, t) in sentence.iter().enumerate() {
            let field = if t.word.is_empty() {
                "palavra"
            } else if t.tag.is_empty() {
                "tag"
            } else {
                continue;
            };
            return Err(InvalidInputError::EmptyTokenField {
                sentence: index,
                token,
                field,
            }
            .into());
        }
    }
    Ok(())
}

/// Contrato uniforme de etiquetagem.
///
/// Implementações recebem apenas as palavras (as tags de entrada, se
/// existirem, são ignoradas) e devolvem exatamente uma tag por palavra.
/// Modelos treinados são imutáveis, por isso a etiquetagem em lote pode
/// rodar em paralelo.
pub trait Tagger: Sync {
    /// Uma tag por palavra, na mesma ordem.
    fn tag_words(&self, words: &[&str]) -> Vec<String>;

    fn tag(&self, words: &[&str]) -> Vec<TaggedToken> {
        let tags = self.tag_words(words);
        debug_assert_eq!(tags.len(), words.len());
        words
            .iter()
            .zip(tags)
            .map(|(word, tag)| TaggedToken::new(*word, tag))
            .collect()
    }

    /// Re-etiqueta sentenças anotadas descartando suas tags originais.
    fn tag_sentences(&self, sentences: &[Sentence]) -> Vec<Vec<TaggedToken>> {
        sentences
            .par_iter()
            .map(|sentence| self.tag(&sentence.words()))
            .collect()
    }
}
