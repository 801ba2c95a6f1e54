//! # Avaliação
//!
//! Compara tags previstas com o corpus de referência:
//!
//! - **acurácia por item**: tokens com tag correta / total de tokens;
//! - **acurácia por sentença**: sentenças sem nenhum erro / total;
//! - **precisão, revocação e F1** por tag.
//!
//! A acurácia por item é a métrica usada na seleção de modelo.

use std::collections::BTreeMap;
use std::fmt;

use crate::tagger::{Sentence, TaggedToken, Tagger};

/// Contagens de uma tag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TagMeasure {
    /// Previsões corretas desta tag
    pub num_correct: usize,
    /// Ocorrências da tag na referência
    pub num_observation: usize,
    /// Vezes que a tag foi prevista
    pub num_prediction: usize,
}

impl TagMeasure {
    pub fn precision(&self) -> f64 {
        ratio(self.num_correct, self.num_prediction)
    }

    pub fn recall(&self) -> f64 {
        ratio(self.num_correct, self.num_observation)
    }

    pub fn f1(&self) -> f64 {
        let (p, r) = (self.precision(), self.recall());
        if p + r > 0.0 {
            2.0 * p * r / (p + r)
        } else {
            0.0
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Evaluation {
    /// Ordenado por tag para que o relatório seja estável
    tags: BTreeMap<String, TagMeasure>,
    item_correct: usize,
    item_total: usize,
    sentence_correct: usize,
    sentence_total: usize,
}

impl Evaluation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Avalia um etiquetador sobre sentenças anotadas.
    pub fn of<T: Tagger + ?Sized>(tagger: &T, gold: &[Sentence]) -> Self {
        let predicted = tagger.tag_sentences(gold);
        let mut evaluation = Self::new();
        for (reference, prediction) in gold.iter().zip(&predicted) {
            evaluation.accumulate(reference, prediction);
        }
        evaluation
    }

    /// Soma uma sentença. Tokens são pareados por posição.
    pub fn accumulate(&mut self, reference: &Sentence, prediction: &[TaggedToken]) {
        let mut matched = 0;
        for (r, p) in reference.iter().zip(prediction) {
            self.tags.entry(r.tag.clone()).or_default().num_observation += 1;
            self.tags.entry(p.tag.clone()).or_default().num_prediction += 1;
            if r.tag == p.tag {
                self.tags.entry(r.tag.clone()).or_default().num_correct += 1;
                matched += 1;
            }
            self.item_total += 1;
        }
        self.item_correct += matched;
        if matched == reference.len() {
            self.sentence_correct += 1;
        }
        self.sentence_total += 1;
    }

    /// 0.0 quando nada foi avaliado.
    pub fn item_accuracy(&self) -> f64 {
        ratio(self.item_correct, self.item_total)
    }

    pub fn sentence_accuracy(&self) -> f64 {
        ratio(self.sentence_correct, self.sentence_total)
    }

    pub fn item_total(&self) -> usize {
        self.item_total
    }

    pub fn tag(&self, tag: &str) -> Option<&TagMeasure> {
        self.tags.get(tag)
    }

    pub fn tags(&self) -> impl Iterator<Item = (&str, &TagMeasure)> + '_ {
        self.tags.iter().map(|(tag, m)| (tag.as_str(), m))
    }

    /// Média simples de F1 sobre as tags presentes na referência.
    pub fn macro_f1(&self) -> f64 {
        let observed: Vec<&TagMeasure> = self.tags.values().filter(|m| m.num_observation > 0).collect();
        if observed.is_empty() {
            return 0.0;
        }
        observed.iter().map(|m| m.f1()).sum::<f64>() / observed.len() as f64
    }
}

/// Acurácia por token de um etiquetador; 0.0 para um conjunto de teste vazio.
pub fn accuracy<T: Tagger + ?Sized>(tagger: &T, gold: &[Sentence]) -> f64 {
    Evaluation::of(tagger, gold).item_accuracy()
}

#[inline]
fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

impl fmt::Display for Evaluation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:<10} {:>9} {:>9} {:>9} {:>7}", "tag", "precisão", "revocação", "F1", "suporte")?;
        for (tag, m) in &self.tags {
            if m.num_observation == 0 {
                continue;
            }
            writeln!(
                f,
                "{:<10} {:>9.4} {:>9.4} {:>9.4} {:>7}",
                tag,
                m.precision(),
                m.recall(),
                m.f1(),
                m.num_observation
            )?;
        }
        writeln!(f, "macro F1: {:.4}", self.macro_f1())?;
        writeln!(
            f,
            "acurácia por item: {:.4} ({}/{})",
            self.item_accuracy(),
            self.item_correct,
            self.item_total
        )?;
        write!(
            f,
            "acurácia por sentença: {:.4} ({}/{})",
            self.sentence_accuracy(),
            self.sentence_correct,
            self.sentence_total
        )
    }
}
