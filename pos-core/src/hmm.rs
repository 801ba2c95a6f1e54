//! # Hidden Markov Model (HMM) para POS Tagging
//!
//! Implementação clássica de HMM onde:
//! - **Estados Ocultos**: Tags (DET, NOUN, VERB, etc.)
//! - **Observações**: Palavras
//!
//! O modelo aprende:
//! 1. Probabilidade de Transição: P(tag_atual | tag_anterior)
//! 2. Probabilidade de Emissão: P(palavra | tag)
//! 3. Probabilidade Inicial: P(tag_inicial)
//!
//! A decodificação é feita via algoritmo de Viterbi ([`crate::viterbi`]),
//! maximizando P(tags | palavras).

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::Smoothing;
use crate::error::Result;
use crate::tagger::{validate_training_corpus, Sentence, Tagger};
use crate::viterbi::{viterbi_decode, MarkovModel};
use crate::vocab::Vocabulary;

/// Tabelas de probabilidade de um HMM treinado.
///
/// O HMM é um modelo **generativo** que modela a probabilidade conjunta $P(x, y)$
/// de observações $x$ (palavras) e estados ocultos $y$ (tags).
///
/// # Componentes
/// - **Transição**: Probabilidade de uma tag seguir outra ($P(y_i | y_{i-1})$).
/// - **Emissão**: Probabilidade de uma palavra ser gerada por uma tag ($P(x_i | y_i)$).
/// - **Inicial**: Probabilidade de uma tag começar a frase ($P(y_0)$).
///
/// # Armazenamento
/// Matrizes densas indexadas pelos ids do [`Vocabulary`], em **log-space**
/// para evitar underflow numérico ao multiplicar muitas probabilidades pequenas.
/// $$ \log(A \cdot B) = \log(A) + \log(B) $$
///
/// As tabelas são imutáveis depois do treino. Na desserialização os tamanhos
/// são conferidos contra os alfabetos, então um modelo carregado nunca indexa
/// fora das tabelas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "HmmTables")]
pub struct HmmModel {
    smoothing: Smoothing,
    /// Tags conhecidas; o id define a ordem de desempate.
    tags: Vocabulary,
    /// Palavras vistas no treino (para reconhecer palavras desconhecidas).
    words: Vocabulary,
    /// $\log P(y_0)$, um por tag.
    initial: Vec<f64>,
    /// $\log P(y_i | y_{i-1})$, linha `prev`: `transition[prev * n_tags + next]`.
    transition: Vec<f64>,
    /// $\log P(x | y)$, linha `tag` com `n_words + 1` colunas; a última é `<UNK>`.
    emission: Vec<f64>,
}

/// Forma serializada de [`HmmModel`], ainda não conferida.
#[derive(Deserialize)]
struct HmmTables {
    smoothing: Smoothing,
    tags: Vocabulary,
    words: Vocabulary,
    initial: Vec<f64>,
    transition: Vec<f64>,
    emission: Vec<f64>,
}

impl TryFrom<HmmTables> for HmmModel {
    type Error = String;

    fn try_from(t: HmmTables) -> Result<Self, Self::Error> {
        t.smoothing.validate().map_err(|e| e.to_string())?;
        let n_tags = t.tags.len();
        if n_tags == 0 {
            return Err("HMM sem tags".to_string());
        }
        let n_cols = t.words.len() + 1;
        for (table, found, expected) in [
            ("initial", t.initial.len(), n_tags),
            ("transition", t.transition.len(), n_tags * n_tags),
            ("emission", t.emission.len(), n_tags * n_cols),
        ] {
            if found != expected {
                return Err(format!("tabela {table} com {found} entradas, esperado {expected}"));
            }
        }
        Ok(Self {
            smoothing: t.smoothing,
            tags: t.tags,
            words: t.words,
            initial: t.initial,
            transition: t.transition,
            emission: t.emission,
        })
    }
}

impl HmmModel {
    /// Estima as três distribuições a partir de sentenças anotadas.
    ///
    /// # Processo de Treinamento
    /// 1. **Contagem**: conta a tag inicial de cada sentença, cada par de tags
    ///    adjacentes (transição) e cada par (tag, palavra) (emissão).
    /// 2. **Smoothing**: converte contagens em probabilidades com a suavização
    ///    aditiva escolhida, para que nenhum evento tenha probabilidade zero.
    /// 3. **Log-Probabilidades**: guarda tudo em logaritmo.
    ///
    /// # Suporte de cada distribuição
    /// - Inicial e transição: o conjunto de tags.
    /// - Emissão: as palavras do treino **mais um** evento `<UNK>`, a massa
    ///   reservada a palavras nunca vistas com aquela tag. Assim cada
    ///   distribuição soma exatamente 1.
    ///
    /// # Erros
    /// `InvalidInput` se o corpus for vazio ou tiver sentença vazia;
    /// `ConfigurationError` se `smoothing` for inválida.
    pub fn estimate(corpus: &[Sentence], smoothing: Smoothing) -> Result<Self> {
        smoothing.validate()?;
        validate_training_corpus(corpus)?;

        let tags = Vocabulary::tags_of(corpus);
        let words = Vocabulary::words_of(corpus);
        let n_tags = tags.len();
        let n_words = words.len();
        let n_cols = n_words + 1;

        // 1. Contagem das frequências brutas
        let mut start_counts = vec![0usize; n_tags];
        let mut transition_counts = vec![0usize; n_tags * n_tags];
        let mut outgoing = vec![0usize; n_tags];
        let mut emission_counts = vec![0usize; n_tags * n_cols];
        let mut tag_counts = vec![0usize; n_tags];

        for sentence in corpus {
            let mut prev: Option<usize> = None;
            for token in sentence {
                // Ambos os alfabetos foram construídos a partir deste corpus
                let (t, w) = (tags[token.tag.as_str()], words[token.word.as_str()]);
                tag_counts[t] += 1;
                emission_counts[t * n_cols + w] += 1;
                match prev {
                    None => start_counts[t] += 1,
                    Some(p) => {
                        transition_counts[p * n_tags + t] += 1;
                        outgoing[p] += 1;
                    }
                }
                prev = Some(t);
            }
        }

        // 2. Normalização com smoothing
        let initial = start_counts
            .iter()
            .map(|&c| smoothing.probability(c, corpus.len(), n_tags).ln())
            .collect();

        let transition = transition_counts
            .iter()
            .enumerate()
            .map(|(i, &c)| smoothing.probability(c, outgoing[i / n_tags], n_tags).ln())
            .collect();

        // A coluna <UNK> tem contagem zero: recebe γ / (N_t + γ·(|V| + 1))
        let emission = emission_counts
            .iter()
            .enumerate()
            .map(|(i, &c)| smoothing.probability(c, tag_counts[i / n_cols], n_cols).ln())
            .collect();

        debug!(
            %smoothing,
            n_tags,
            n_words,
            sentences = corpus.len(),
            "tabelas do HMM estimadas"
        );

        Ok(Self {
            smoothing,
            tags,
            words,
            initial,
            transition,
            emission,
        })
    }

    pub fn smoothing(&self) -> Smoothing {
        self.smoothing
    }

    pub fn tags(&self) -> &Vocabulary {
        &self.tags
    }

    pub fn words(&self) -> &Vocabulary {
        &self.words
    }

    /// $P(y_0 = tag)$, ou `None` para tag desconhecida.
    pub fn initial_prob(&self, tag: &str) -> Option<f64> {
        let t = self.tags.id(tag)?;
        Some(self.initial[t].exp())
    }

    /// $P(next | prev)$, ou `None` se alguma tag for desconhecida.
    pub fn transition_prob(&self, prev: &str, next: &str) -> Option<f64> {
        let p = self.tags.id(prev)?;
        let n = self.tags.id(next)?;
        Some(self.log_transition(p, n).exp())
    }

    /// $P(word | tag)$; palavras fora do treino recebem a massa `<UNK>` da tag.
    pub fn emission_prob(&self, tag: &str, word: &str) -> Option<f64> {
        let t = self.tags.id(tag)?;
        Some(self.log_emission(t, self.words.id(word)).exp())
    }

    /// Massa reservada a palavras nunca vistas com `tag`.
    pub fn unknown_prob(&self, tag: &str) -> Option<f64> {
        let t = self.tags.id(tag)?;
        Some(self.log_emission(t, None).exp())
    }

    /// Decodifica as palavras e devolve a sequência de tags mais provável.
    pub fn predict(&self, words: &[&str]) -> Vec<String> {
        viterbi_decode(self, words)
            .best_path
            .into_iter()
            .map(|t| self.tags.symbol(t).to_string())
            .collect()
    }

    #[inline]
    fn n_cols(&self) -> usize {
        self.words.len() + 1
    }
}

impl MarkovModel for HmmModel {
    fn n_states(&self) -> usize {
        self.tags.len()
    }

    fn observation(&self, word: &str) -> Option<usize> {
        self.words.id(word)
    }

    fn log_initial(&self, state: usize) -> f64 {
        self.initial[state]
    }

    fn log_transition(&self, prev: usize, next: usize) -> f64 {
        self.transition[prev * self.tags.len() + next]
    }

    fn log_emission(&self, state: usize, observation: Option<usize>) -> f64 {
        let col = observation.unwrap_or(self.words.len());
        self.emission[state * self.n_cols() + col]
    }
}

impl Tagger for HmmModel {
    fn tag_words(&self, words: &[&str]) -> Vec<String> {
        self.predict(words)
    }
}
