//! # Motor de Regras de Transformação
//!
//! Uma regra de Brill reescreve a tag de um token quando:
//! 1. a tag **atual** do token é a tag de origem da regra, e
//! 2. o contexto definido pelo template é satisfeito.
//!
//! ```text
//! NN->VB if Pos:TO@[-1]         "troque NN por VB se a tag anterior for TO"
//! VB->NN if Word:the@[-1]       "troque VB por NN se a palavra anterior for 'the'"
//! NN->JJ if Pos:DT@[-1] & Pos:NN@[1]
//! ```
//!
//! ## Features e Templates
//!
//! - [`Feature`]: olha a **tag** (`Pos`) ou a **palavra** (`Word`) em uma ou
//!   mais posições relativas. Com várias posições, basta que **alguma** tenha
//!   o valor pedido.
//! - [`Template`]: conjunção de features. Instanciado com valores concretos,
//!   vira a condição de uma [`Rule`].
//!
//! Posições fora da sentença nunca satisfazem uma feature.
//!
//! ## Aplicação simultânea
//!
//! Todas as posições onde a regra dispara são encontradas no estado anterior à
//! regra e só então reescritas. Uma regra nunca dispara em cascata sobre a
//! própria saída, e o score calculado por [`Rule::score`] é exatamente a
//! variação de acertos produzida por [`Rule::apply_corpus`].

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::tagger::{Sentence, TaggedToken};

/// O que uma feature observa no token vizinho.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureKind {
    /// A tag atual do token.
    Pos,
    /// A palavra do token.
    Word,
}

impl fmt::Display for FeatureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pos => f.write_str("Pos"),
            Self::Word => f.write_str("Word"),
        }
    }
}

/// Uma feature posicional: tipo + posições relativas ao token alvo.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Feature {
    kind: FeatureKind,
    positions: Vec<isize>,
}

impl Feature {
    /// Posições são ordenadas e deduplicadas.
    pub fn new(kind: FeatureKind, positions: &[isize]) -> Self {
        let mut positions = positions.to_vec();
        positions.sort_unstable();
        positions.dedup();
        Self { kind, positions }
    }

    pub fn pos(positions: &[isize]) -> Self {
        Self::new(FeatureKind::Pos, positions)
    }

    pub fn word(positions: &[isize]) -> Self {
        Self::new(FeatureKind::Word, positions)
    }

    pub fn kind(&self) -> FeatureKind {
        self.kind
    }

    pub fn positions(&self) -> &[isize] {
        &self.positions
    }

    fn max_offset(&self) -> usize {
        self.positions
            .iter()
            .map(|p| p.unsigned_abs())
            .max()
            .unwrap_or(0)
    }

    /// Índices absolutos (dentro da sentença) que esta feature observa.
    fn indices(&self, index: usize, len: usize) -> impl Iterator<Item = usize> + '_ {
        self.positions.iter().filter_map(move |&offset| {
            let j = index as isize + offset;
            (j >= 0 && (j as usize) < len).then_some(j as usize)
        })
    }

    #[inline]
    fn pick<'s, X>(&self, words: &'s [X], tags: &'s [X]) -> &'s [X] {
        match self.kind {
            FeatureKind::Pos => tags,
            FeatureKind::Word => words,
        }
    }

    /// A feature vale `value` em alguma de suas posições?
    pub(crate) fn holds<X: PartialEq>(&self, value: &X, words: &[X], tags: &[X], index: usize) -> bool {
        let seq = self.pick(words, tags);
        self.indices(index, seq.len()).any(|j| seq[j] == *value)
    }

    /// Valores distintos (ordenados) observados nas posições da feature.
    pub(crate) fn values<X: Copy + Ord>(&self, words: &[X], tags: &[X], index: usize) -> Vec<X> {
        let seq = self.pick(words, tags);
        let mut values: Vec<X> = self.indices(index, seq.len()).map(|j| seq[j]).collect();
        values.sort_unstable();
        values.dedup();
        values
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:?}", self.kind, self.positions)
    }
}

/// Forma de contexto que uma regra pode assumir: conjunção de features.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Template {
    features: Vec<Feature>,
}

impl Template {
    pub fn new(features: Vec<Feature>) -> Result<Self, ConfigError> {
        let template = Self { features };
        template.validate()?;
        Ok(template)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.features.is_empty() {
            return Err(ConfigError::InvalidTemplate("template sem features".into()));
        }
        if let Some(feature) = self.features.iter().find(|f| f.positions.is_empty()) {
            return Err(ConfigError::InvalidTemplate(format!("{feature} sem posições")));
        }
        Ok(())
    }

    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    /// Maior distância, em tokens, que o template enxerga a partir do alvo.
    pub fn max_offset(&self) -> usize {
        self.features.iter().map(Feature::max_offset).max().unwrap_or(0)
    }

    /// Os oito templates padrão:
    /// tag em −1, +1, −2, +2; tags em −1 **e** +1; tags em −2 **e** +2;
    /// palavra em −1; palavra em +1.
    pub fn defaults() -> Vec<Template> {
        let single = |f: Feature| Template { features: vec![f] };
        let pair = |a: Feature, b: Feature| Template { features: vec![a, b] };
        vec![
            single(Feature::pos(&[-1])),
            single(Feature::pos(&[1])),
            single(Feature::pos(&[-2])),
            single(Feature::pos(&[2])),
            pair(Feature::pos(&[-1]), Feature::pos(&[1])),
            pair(Feature::pos(&[-2]), Feature::pos(&[2])),
            single(Feature::word(&[-1])),
            single(Feature::word(&[1])),
        ]
    }

    /// Todas as tuplas de valores que tornariam o template verdadeiro em `index`
    /// (produto cartesiano dos valores de cada feature), em ordem crescente.
    pub(crate) fn instantiations<X: Copy + Ord>(&self, words: &[X], tags: &[X], index: usize) -> Vec<Vec<X>> {
        let mut tuples: Vec<Vec<X>> = vec![Vec::with_capacity(self.features.len())];
        for feature in &self.features {
            let values = feature.values(words, tags, index);
            if values.is_empty() {
                return vec![];
            }
            tuples = tuples
                .into_iter()
                .flat_map(|prefix| {
                    values.iter().map(move |&v| {
                        let mut tuple = prefix.clone();
                        tuple.push(v);
                        tuple
                    })
                })
                .collect();
        }
        tuples
    }

    /// As features valem `values` (uma por feature) em `index`?
    pub(crate) fn matches<X: PartialEq>(&self, values: &[X], words: &[X], tags: &[X], index: usize) -> bool {
        self.features
            .iter()
            .zip(values)
            .all(|(feature, value)| feature.holds(value, words, tags, index))
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, feature) in self.features.iter().enumerate() {
            if i > 0 {
                f.write_str(" & ")?;
            }
            write!(f, "{feature}")?;
        }
        Ok(())
    }
}

/// Uma feature com o valor que ela precisa observar.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Condition {
    pub feature: Feature,
    pub value: String,
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}@{:?}", self.feature.kind, self.value, self.feature.positions)
    }
}

/// Regra de transformação: `from -> to` quando todas as condições valem.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rule {
    /// Índice do template (no conjunto usado no treino) que gerou a regra.
    pub template: usize,
    pub from: String,
    pub to: String,
    pub conditions: Vec<Condition>,
}

/// Quantas posições uma regra corrigiria (`good`) e estragaria (`bad`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleScore {
    pub good: usize,
    pub bad: usize,
}

impl RuleScore {
    /// Score líquido: bons − ruins.
    pub fn net(&self) -> isize {
        self.good as isize - self.bad as isize
    }
}

impl Rule {
    /// Instancia `template` com um valor por feature.
    pub fn new(
        template_id: usize,
        template: &Template,
        from: impl Into<String>,
        to: impl Into<String>,
        values: Vec<String>,
    ) -> Result<Self, ConfigError> {
        if values.len() != template.features.len() {
            return Err(ConfigError::InvalidTemplate(format!(
                "{template} espera {} valores, recebeu {}",
                template.features.len(),
                values.len()
            )));
        }
        let conditions = template
            .features
            .iter()
            .cloned()
            .zip(values)
            .map(|(feature, value)| Condition { feature, value })
            .collect();
        Ok(Self {
            template: template_id,
            from: from.into(),
            to: to.into(),
            conditions,
        })
    }

    /// As condições têm exatamente as features de `template`?
    pub fn instantiates(&self, template: &Template) -> bool {
        self.conditions.len() == template.features.len()
            && self
                .conditions
                .iter()
                .zip(&template.features)
                .all(|(c, f)| c.feature == *f)
    }

    /// A regra dispara no token `index`, dado o estado atual `tags`?
    pub fn fires_at(&self, words: &[&str], tags: &[&str], index: usize) -> bool {
        tags[index] == self.from
            && self.conditions.iter().all(|c| {
                c.feature
                    .holds(&c.value.as_str(), words, tags, index)
            })
    }

    /// Aplica a regra a uma sentença, reescrevendo `tags` no lugar.
    /// Retorna as posições alteradas.
    pub fn apply(&self, words: &[&str], tags: &mut [String]) -> Vec<usize> {
        if !tags.iter().any(|t| *t == self.from) {
            return vec![];
        }
        let firing: Vec<usize> = {
            let current: Vec<&str> = tags.iter().map(String::as_str).collect();
            (0..current.len())
                .filter(|&i| self.fires_at(words, &current, i))
                .collect()
        };
        for &i in &firing {
            tags[i] = self.to.clone();
        }
        firing
    }

    /// Aplica a regra a um corpus etiquetado. Retorna quantos tokens mudaram.
    pub fn apply_corpus(&self, corpus: &mut [Vec<TaggedToken>]) -> usize {
        let mut changed = 0;
        for sentence in corpus.iter_mut() {
            let words: Vec<String> = sentence.iter().map(|t| t.word.clone()).collect();
            let words: Vec<&str> = words.iter().map(String::as_str).collect();
            let mut tags: Vec<String> = sentence.iter().map(|t| t.tag.clone()).collect();
            for i in self.apply(&words, &mut tags) {
                sentence[i].tag = std::mem::take(&mut tags[i]);
                changed += 1;
            }
        }
        changed
    }

    /// Conta, sobre o corpus inteiro, quantas tags erradas a regra corrigiria
    /// (`good`) e quantas certas ela estragaria (`bad`).
    ///
    /// `corpus` e `gold` devem estar alinhados sentença a sentença.
    pub fn score(&self, corpus: &[Vec<TaggedToken>], gold: &[Sentence]) -> RuleScore {
        let mut score = RuleScore::default();
        for (sentence, reference) in corpus.iter().zip(gold) {
            let words: Vec<&str> = sentence.iter().map(|t| t.word.as_str()).collect();
            let tags: Vec<&str> = sentence.iter().map(|t| t.tag.as_str()).collect();
            for (i, expected) in reference.iter().enumerate().take(tags.len()) {
                if !self.fires_at(&words, &tags, i) {
                    continue;
                }
                if tags[i] == expected.tag {
                    score.bad += 1;
                } else if self.to == expected.tag {
                    score.good += 1;
                }
            }
        }
        score
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}->{} if ", self.from, self.to)?;
        for (i, condition) in self.conditions.iter().enumerate() {
            if i > 0 {
                f.write_str(" & ")?;
            }
            write!(f, "{condition}")?;
        }
        Ok(())
    }
}
