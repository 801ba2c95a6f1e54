//! # Brill — Aprendizado Baseado em Transformações
//!
//! O etiquetador de Brill parte de um baseline simples e aprende, de forma
//! gulosa, uma **lista ordenada de regras** que corrigem os erros do baseline.
//!
//! ## Treinamento
//!
//! ```text
//! estado  ← baseline(corpus)
//! repita até max_rules:
//!     para cada regra candidata r:
//!         score(r) = corrigidos(r) − estragados(r)
//!     r* ← argmax score  (empate: menor (template, from, valores, to))
//!     se score(r*) < min_score: pare
//!     estado ← aplica(r*, estado)
//! ```
//!
//! ## Contagem incremental
//!
//! Recalcular o score de todas as candidatas a cada iteração custa
//! `O(N × templates)` por regra. Aqui os scores são mantidos em dois mapas:
//!
//! | Mapa     | Chave                        | Conta posições onde...                     |
//! |----------|------------------------------|--------------------------------------------|
//! | `fixes`  | (contexto, tag destino)      | tag atual ≠ gold, gold = destino           |
//! | `breaks` | contexto                     | tag atual = gold                           |
//!
//! Um *contexto* é (template, tag de origem, valores das features). O score de
//! uma candidata é `fixes[c, to] − breaks[c]`.
//!
//! Aplicar uma regra só altera as contribuições das posições a até
//! `R = max_offset` tokens de uma posição reescrita. Essas posições são
//! subtraídas, a regra é aplicada e elas são somadas de novo. O resultado é
//! idêntico ao recálculo completo.
//!
//! ## Etiquetagem
//!
//! Baseline, depois cada regra na ordem aprendida, uma vez cada.

use std::collections::{BTreeSet, HashMap};
use std::hash::Hash;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::baseline::UnigramTagger;
use crate::config::BrillConfig;
use crate::error::{InvalidInputError, Result};
use crate::rules::{FeatureKind, Rule, Template};
use crate::tagger::{validate_training_corpus, Sentence, TaggedToken, Tagger};
use crate::vocab::Vocabulary;

/// Regra aprendida com as estatísticas que a fizeram ser escolhida.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LearnedRule {
    pub rule: Rule,
    /// Erros corrigidos no momento em que foi aprendida
    pub good: usize,
    /// Acertos estragados no momento em que foi aprendida
    pub bad: usize,
}

impl LearnedRule {
    pub fn score(&self) -> isize {
        self.good as isize - self.bad as isize
    }
}

/// Resumo da contribuição de um template para a lista de regras.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TemplateStats {
    pub template: usize,
    pub n_rules: usize,
    pub good: usize,
    pub bad: usize,
}

impl TemplateStats {
    pub fn score(&self) -> isize {
        self.good as isize - self.bad as isize
    }
}

/// Etiquetador treinado: baseline unigrama + regras em ordem.
///
/// Na desserialização cada regra é conferida contra o template que diz
/// instanciar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BrillParts")]
pub struct BrillTagger {
    baseline: UnigramTagger,
    templates: Vec<Template>,
    rules: Vec<LearnedRule>,
}

#[derive(Deserialize)]
struct BrillParts {
    baseline: UnigramTagger,
    templates: Vec<Template>,
    rules: Vec<LearnedRule>,
}

impl TryFrom<BrillParts> for BrillTagger {
    type Error = String;

    fn try_from(parts: BrillParts) -> Result<Self, Self::Error> {
        for template in &parts.templates {
            template.validate().map_err(|e| e.to_string())?;
        }
        for (i, learned) in parts.rules.iter().enumerate() {
            let rule = &learned.rule;
            match parts.templates.get(rule.template) {
                Some(template) if rule.instantiates(template) => {}
                Some(template) => {
                    return Err(format!("regra {i} ({rule}) não instancia o template {template}"));
                }
                None => {
                    return Err(format!(
                        "regra {i} usa o template {} de {}",
                        rule.template,
                        parts.templates.len()
                    ));
                }
            }
        }
        Ok(Self::new(parts.baseline, parts.templates, parts.rules))
    }
}

impl BrillTagger {
    pub fn new(baseline: UnigramTagger, templates: Vec<Template>, rules: Vec<LearnedRule>) -> Self {
        Self {
            baseline,
            templates,
            rules,
        }
    }

    pub fn baseline(&self) -> &UnigramTagger {
        &self.baseline
    }

    pub fn templates(&self) -> &[Template] {
        &self.templates
    }

    pub fn rules(&self) -> &[LearnedRule] {
        &self.rules
    }

    /// Quantas regras cada template gerou e quanto elas corrigiram,
    /// na ordem dos templates.
    pub fn template_statistics(&self) -> Vec<TemplateStats> {
        let mut stats: Vec<TemplateStats> = (0..self.templates.len())
            .map(|template| TemplateStats {
                template,
                n_rules: 0,
                good: 0,
                bad: 0,
            })
            .collect();
        for learned in &self.rules {
            if let Some(entry) = stats.get_mut(learned.rule.template) {
                entry.n_rules += 1;
                entry.good += learned.good;
                entry.bad += learned.bad;
            }
        }
        stats
    }
}

impl Tagger for BrillTagger {
    fn tag_words(&self, words: &[&str]) -> Vec<String> {
        let mut tags = self.baseline.tag_words(words);
        for learned in &self.rules {
            learned.rule.apply(words, &mut tags);
        }
        tags
    }
}

/// Treina o baseline e aprende as regras sobre o mesmo corpus.
#[derive(Debug, Clone)]
pub struct BrillTrainer {
    config: BrillConfig,
}

impl BrillTrainer {
    pub fn new(config: BrillConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &BrillConfig {
        &self.config
    }

    pub fn train(&self, corpus: &[Sentence]) -> Result<BrillTagger> {
        validate_training_corpus(corpus)?;
        let baseline = UnigramTagger::train(corpus, &self.config.default_tag)?;
        info!(
            words = baseline.len(),
            default_tag = baseline.default_tag(),
            "baseline unigrama treinado"
        );

        let initial: Vec<Vec<TaggedToken>> = corpus
            .iter()
            .map(|sentence| baseline.tag(&sentence.words()))
            .collect();
        let rules = learn_rules(&initial, corpus, &self.config)?;

        Ok(BrillTagger::new(baseline, self.config.templates.clone(), rules))
    }
}

/// Aprende regras a partir de um estado inicial e do corpus de referência.
///
/// `initial` e `gold` precisam ter as mesmas sentenças, com as mesmas
/// palavras; só as tags diferem. Determinístico: mesma entrada, mesma lista.
pub fn learn_rules(
    initial: &[Vec<TaggedToken>],
    gold: &[Sentence],
    config: &BrillConfig,
) -> Result<Vec<LearnedRule>> {
    config.validate()?;
    validate_training_corpus(gold)?;
    if initial.len() != gold.len() {
        return Err(InvalidInputError::MisalignedCorpora {
            index: initial.len().min(gold.len()),
        }
        .into());
    }
    for (index, (state, reference)) in initial.iter().zip(gold).enumerate() {
        let aligned = state.len() == reference.len()
            && state.iter().zip(reference).all(|(a, b)| a.word == b.word);
        if !aligned {
            return Err(InvalidInputError::MisalignedCorpora { index }.into());
        }
    }

    let mut learner = Learner::new(&config.templates, initial, gold);
    let mut errors = learner.errors();
    info!(
        sentences = gold.len(),
        templates = config.templates.len(),
        errors,
        "iniciando aprendizado de regras"
    );

    let mut rules = Vec::new();
    while rules.len() < config.max_rules {
        let Some((candidate, good, bad)) = learner.best(config.min_score, config.min_accuracy) else {
            break;
        };
        let rule = learner.to_rule(&candidate)?;
        let changed = learner.apply(&candidate);
        errors -= good - bad;
        debug!(%rule, good, bad, changed, errors, "regra aprendida");
        rules.push(LearnedRule { rule, good, bad });
    }

    if rules.is_empty() {
        warn!("nenhuma regra atingiu o score mínimo");
    }
    info!(rules = rules.len(), errors, "aprendizado concluído");
    Ok(rules)
}

/// Contexto de uma regra: template, tag de origem e um valor por feature.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
struct Context {
    template: usize,
    from: usize,
    values: Vec<usize>,
}

/// Regra candidata. A ordem derivada é a ordem de desempate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
struct Candidate {
    context: Context,
    to: usize,
}

/// Estado do aprendiz sobre ids inteiros.
struct Learner<'a> {
    templates: &'a [Template],
    tags: Vocabulary,
    words: Vocabulary,
    word_ids: Vec<Vec<usize>>,
    gold: Vec<Vec<usize>>,
    current: Vec<Vec<usize>>,
    /// Posições (sentença, token) agrupadas pela tag atual
    by_tag: Vec<BTreeSet<(usize, usize)>>,
    fixes: HashMap<Candidate, usize>,
    breaks: HashMap<Context, usize>,
    radius: usize,
}

impl<'a> Learner<'a> {
    fn new(templates: &'a [Template], initial: &[Vec<TaggedToken>], gold: &[Sentence]) -> Self {
        let tags = Vocabulary::from_symbols(
            gold.iter()
                .flatten()
                .chain(initial.iter().flatten())
                .map(|t| t.tag.as_str()),
        );
        let words = Vocabulary::words_of(gold);

        // Os alfabetos foram construídos a partir destes mesmos tokens
        let intern = |vocab: &Vocabulary, symbol: &str| vocab[symbol];
        let word_ids: Vec<Vec<usize>> = gold
            .iter()
            .map(|s| s.iter().map(|t| intern(&words, &t.word)).collect())
            .collect();
        let gold_ids: Vec<Vec<usize>> = gold
            .iter()
            .map(|s| s.iter().map(|t| intern(&tags, &t.tag)).collect())
            .collect();
        let current: Vec<Vec<usize>> = initial
            .iter()
            .map(|s| s.iter().map(|t| intern(&tags, &t.tag)).collect())
            .collect();

        Self::from_ids(templates, tags, words, word_ids, gold_ids, current)
    }

    fn from_ids(
        templates: &'a [Template],
        tags: Vocabulary,
        words: Vocabulary,
        word_ids: Vec<Vec<usize>>,
        gold: Vec<Vec<usize>>,
        current: Vec<Vec<usize>>,
    ) -> Self {
        let mut learner = Self {
            templates,
            by_tag: vec![BTreeSet::new(); tags.len()],
            tags,
            words,
            word_ids,
            gold,
            current,
            fixes: HashMap::new(),
            breaks: HashMap::new(),
            radius: templates.iter().map(Template::max_offset).max().unwrap_or(0),
        };
        for s in 0..learner.current.len() {
            for i in 0..learner.current[s].len() {
                learner.by_tag[learner.current[s][i]].insert((s, i));
                learner.update(s, i, true);
            }
        }
        learner
    }

    fn errors(&self) -> usize {
        self.current
            .iter()
            .zip(&self.gold)
            .map(|(cur, gold)| cur.iter().zip(gold).filter(|(a, b)| a != b).count())
            .sum()
    }

    /// Soma (ou subtrai) as contribuições da posição `(s, i)` aos contadores.
    fn update(&mut self, s: usize, i: usize, add: bool) {
        let from = self.current[s][i];
        let gold = self.gold[s][i];
        let templates = self.templates;
        for (template, shape) in templates.iter().enumerate() {
            let instances = shape.instantiations(&self.word_ids[s], &self.current[s], i);
            for values in instances {
                let context = Context {
                    template,
                    from,
                    values,
                };
                if from == gold {
                    bump(&mut self.breaks, context, add);
                } else {
                    bump(&mut self.fixes, Candidate { context, to: gold }, add);
                }
            }
        }
    }

    /// Melhor candidata acima dos limiares, com (bons, ruins).
    fn best(&self, min_score: usize, min_accuracy: Option<f64>) -> Option<(Candidate, usize, usize)> {
        let mut best: Option<(&Candidate, isize, usize, usize)> = None;
        for (candidate, &good) in &self.fixes {
            let bad = self.breaks.get(&candidate.context).copied().unwrap_or(0);
            let score = good as isize - bad as isize;
            if score < min_score as isize {
                continue;
            }
            if let Some(min_accuracy) = min_accuracy {
                if (good as f64) / ((good + bad) as f64) < min_accuracy {
                    continue;
                }
            }
            let better = match best {
                None => true,
                Some((current, best_score, ..)) => {
                    score > best_score || (score == best_score && candidate < current)
                }
            };
            if better {
                best = Some((candidate, score, good, bad));
            }
        }
        best.map(|(candidate, _, good, bad)| (candidate.clone(), good, bad))
    }

    fn to_rule(&self, candidate: &Candidate) -> Result<Rule> {
        let context = &candidate.context;
        let template = &self.templates[context.template];
        let values = template
            .features()
            .iter()
            .zip(&context.values)
            .map(|(feature, &id)| match feature.kind() {
                FeatureKind::Pos => self.tags.symbol(id).to_string(),
                FeatureKind::Word => self.words.symbol(id).to_string(),
            })
            .collect();
        let rule = Rule::new(
            context.template,
            template,
            self.tags.symbol(context.from),
            self.tags.symbol(candidate.to),
            values,
        )?;
        Ok(rule)
    }

    /// Aplica a candidata ao estado atual e atualiza os contadores.
    /// Retorna quantas posições mudaram.
    fn apply(&mut self, candidate: &Candidate) -> usize {
        let Candidate { context, to } = candidate;
        let template = &self.templates[context.template];

        let firing: Vec<(usize, usize)> = self.by_tag[context.from]
            .iter()
            .copied()
            .filter(|&(s, i)| template.matches(&context.values, &self.word_ids[s], &self.current[s], i))
            .collect();

        let mut affected = BTreeSet::new();
        for &(s, i) in &firing {
            let last = self.current[s].len() - 1;
            let lo = i.saturating_sub(self.radius);
            let hi = (i + self.radius).min(last);
            affected.extend((lo..=hi).map(|j| (s, j)));
        }

        for &(s, j) in &affected {
            self.update(s, j, false);
        }
        for &(s, i) in &firing {
            self.by_tag[context.from].remove(&(s, i));
            self.current[s][i] = *to;
            self.by_tag[*to].insert((s, i));
        }
        for &(s, j) in &affected {
            self.update(s, j, true);
        }
        firing.len()
    }
}

fn bump<K: Hash + Eq>(counts: &mut HashMap<K, usize>, key: K, add: bool) {
    use std::collections::hash_map::Entry;

    if add {
        *counts.entry(key).or_insert(0) += 1;
    } else if let Entry::Occupied(mut entry) = counts.entry(key) {
        *entry.get_mut() -= 1;
        if *entry.get() == 0 {
            entry.remove();
        }
    }
}
