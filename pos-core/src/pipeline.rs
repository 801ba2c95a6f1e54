//! # Pipeline de Treino e Seleção de Modelo
//!
//! Orquestra o fluxo completo sobre corpora já carregados:
//!
//! 1. **HMM**: treina um modelo para cada suavização candidata, mede a
//!    acurácia de cada um no corpus de teste e fica com o melhor.
//! 2. **Brill**: treina baseline + regras uma vez e mede a acurácia.
//!
//! O resultado é um [`TrainedTagger`], que pode etiquetar novas sentenças e
//! ser salvo em JSON para reuso.
//!
//! ## Seleção no conjunto de teste
//!
//! A escolha da suavização usa o **próprio corpus de teste**, não um conjunto
//! de validação separado. A acurácia reportada para o modelo vencedor é,
//! portanto, otimista. O primeiro candidato é sempre mantido, mesmo que
//! todas as acurácias sejam zero; em empate fica o candidato anterior.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::brill::{BrillTagger, BrillTrainer};
use crate::config::{BrillConfig, HmmConfig, TaggerKind};
use crate::error::{PosError, Result};
use crate::evaluation::accuracy;
use crate::hmm::HmmModel;
use crate::tagger::{validate_training_corpus, Sentence, Tagger};

/// Configuração dos dois motores; só a do motor escolhido é usada.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub hmm: HmmConfig,
    pub brill: BrillConfig,
}

/// Um etiquetador treinado, de qualquer um dos motores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "model", rename_all = "snake_case")]
pub enum TrainedTagger {
    Hmm(HmmModel),
    Brill(BrillTagger),
}

impl TrainedTagger {
    pub fn kind(&self) -> TaggerKind {
        match self {
            Self::Hmm(_) => TaggerKind::Hmm,
            Self::Brill(_) => TaggerKind::Brill,
        }
    }

    /// Salva o modelo em JSON.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|e| PosError::io(path, e))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer(&mut writer, self)?;
        writer.flush().map_err(|e| PosError::io(path, e))?;
        info!(path = %path.display(), kind = %self.kind(), "modelo salvo");
        Ok(())
    }

    /// Carrega um modelo salvo por [`TrainedTagger::save`].
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| PosError::io(path, e))?;
        let tagger: Self = serde_json::from_reader(BufReader::new(file))?;
        info!(path = %path.display(), kind = %tagger.kind(), "modelo carregado");
        Ok(tagger)
    }
}

impl Tagger for TrainedTagger {
    fn tag_words(&self, words: &[&str]) -> Vec<String> {
        match self {
            Self::Hmm(model) => model.tag_words(words),
            Self::Brill(tagger) => tagger.tag_words(words),
        }
    }
}

/// Acurácia de uma configuração avaliada.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidateReport {
    pub label: String,
    pub accuracy: f64,
}

/// Modelo escolhido e a acurácia de todas as configurações testadas.
#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    pub tagger: TrainedTagger,
    pub accuracy: f64,
    pub candidates: Vec<CandidateReport>,
}

/// Treina o motor `kind` em `train` e o avalia em `test`.
pub fn train(
    kind: TaggerKind,
    config: &PipelineConfig,
    train: &[Sentence],
    test: &[Sentence],
) -> Result<TrainingOutcome> {
    validate_training_corpus(train)?;
    info!(
        %kind,
        train_sentences = train.len(),
        test_sentences = test.len(),
        "iniciando treino"
    );
    match kind {
        TaggerKind::Hmm => train_hmm(&config.hmm, train, test),
        TaggerKind::Brill => train_brill(&config.brill, train, test),
    }
}

fn train_hmm(config: &HmmConfig, train: &[Sentence], test: &[Sentence]) -> Result<TrainingOutcome> {
    config.validate()?;

    let mut best: Option<(HmmModel, f64)> = None;
    let mut candidates = Vec::with_capacity(config.candidates.len());
    for &smoothing in &config.candidates {
        let model = HmmModel::estimate(train, smoothing)?;
        let acc = accuracy(&model, test);
        info!(%smoothing, accuracy = acc * 100.0, "HMM avaliado");
        candidates.push(CandidateReport {
            label: format!("HMM {smoothing}"),
            accuracy: acc,
        });
        let better = match &best {
            None => true,
            Some((_, best_acc)) => acc > *best_acc,
        };
        if better {
            best = Some((model, acc));
        }
    }

    // `validate` garante ao menos um candidato
    let (model, accuracy) = best.ok_or(crate::error::ConfigError::NoSmoothingCandidates)?;
    info!(smoothing = %model.smoothing(), accuracy = accuracy * 100.0, "melhor HMM selecionado");
    Ok(TrainingOutcome {
        tagger: TrainedTagger::Hmm(model),
        accuracy,
        candidates,
    })
}

fn train_brill(config: &BrillConfig, train: &[Sentence], test: &[Sentence]) -> Result<TrainingOutcome> {
    let tagger = BrillTrainer::new(config.clone())?.train(train)?;
    for stats in tagger.template_statistics().iter().filter(|s| s.n_rules > 0) {
        debug!(
            template = %tagger.templates()[stats.template],
            rules = stats.n_rules,
            score = stats.score(),
            "contribuição do template"
        );
    }

    let acc = accuracy(&tagger, test);
    info!(rules = tagger.rules().len(), accuracy = acc * 100.0, "Brill avaliado");
    Ok(TrainingOutcome {
        tagger: TrainedTagger::Brill(tagger),
        accuracy: acc,
        candidates: vec![CandidateReport {
            label: "Brill".to_string(),
            accuracy: acc,
        }],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Smoothing;
    use crate::error::{ConfigError, InvalidInputError};

    fn train_corpus() -> Vec<Sentence> {
        vec![
            Sentence::from_pairs(&[("the", "DT"), ("dog", "NN"), ("barks", "VBZ")]),
            Sentence::from_pairs(&[("the", "DT"), ("cat", "NN"), ("sleeps", "VBZ")]),
            Sentence::from_pairs(&[("a", "DT"), ("run", "NN"), ("helps", "VBZ")]),
            Sentence::from_pairs(&[("I", "PRP"), ("want", "VBP"), ("to", "TO"), ("run", "VB")]),
        ]
    }

    fn test_corpus() -> Vec<Sentence> {
        vec![
            Sentence::from_pairs(&[("a", "DT"), ("dog", "NN"), ("sleeps", "VBZ")]),
            Sentence::from_pairs(&[("the", "DT"), ("cat", "NN"), ("barks", "VBZ")]),
        ]
    }

    #[test]
    fn test_hmm_pipeline_reports_every_candidate() {
        let outcome = train(TaggerKind::Hmm, &PipelineConfig::default(), &train_corpus(), &test_corpus()).unwrap();
        assert_eq!(outcome.candidates.len(), 3);
        assert_eq!(outcome.tagger.kind(), TaggerKind::Hmm);
        assert_eq!(outcome.accuracy, 1.0);
        // Todos acertam tudo: o primeiro candidato é mantido
        match &outcome.tagger {
            TrainedTagger::Hmm(model) => assert_eq!(model.smoothing(), Smoothing::Laplace),
            other => panic!("esperava HMM, veio {:?}", other.kind()),
        }
    }

    #[test]
    fn test_first_candidate_kept_when_all_score_zero() {
        let test = vec![Sentence::from_pairs(&[("dog", "XX")])];
        let config = PipelineConfig {
            hmm: HmmConfig {
                candidates: vec![Smoothing::Lidstone { gamma: 0.5 }, Smoothing::Laplace],
            },
            ..Default::default()
        };
        let outcome = train(TaggerKind::Hmm, &config, &train_corpus(), &test).unwrap();
        assert_eq!(outcome.accuracy, 0.0);
        match &outcome.tagger {
            TrainedTagger::Hmm(model) => assert_eq!(model.smoothing(), Smoothing::Lidstone { gamma: 0.5 }),
            other => panic!("esperava HMM, veio {:?}", other.kind()),
        }
    }

    #[test]
    fn test_empty_test_set_scores_zero() {
        let outcome = train(TaggerKind::Brill, &PipelineConfig::default(), &train_corpus(), &[]).unwrap();
        assert_eq!(outcome.accuracy, 0.0);
    }

    #[test]
    fn test_brill_pipeline() {
        let outcome = train(TaggerKind::Brill, &PipelineConfig::default(), &train_corpus(), &test_corpus()).unwrap();
        assert_eq!(outcome.tagger.kind(), TaggerKind::Brill);
        assert_eq!(outcome.candidates.len(), 1);
        assert_eq!(outcome.accuracy, 1.0);
        assert_eq!(outcome.tagger.tag_words(&["to", "run"]), vec!["TO", "VB"]);
    }

    #[test]
    fn test_invalid_inputs_fail_before_training() {
        let err = train(TaggerKind::Hmm, &PipelineConfig::default(), &[], &test_corpus()).unwrap_err();
        assert!(matches!(err, PosError::InvalidInput(InvalidInputError::EmptyCorpus)));

        let config = PipelineConfig {
            hmm: HmmConfig {
                candidates: vec![Smoothing::Lidstone { gamma: -1.0 }],
            },
            ..Default::default()
        };
        let err = train(TaggerKind::Hmm, &config, &train_corpus(), &test_corpus()).unwrap_err();
        assert!(matches!(err, PosError::Configuration(ConfigError::NonPositiveGamma(_))));

        let config = PipelineConfig {
            brill: BrillConfig {
                max_rules: 0,
                ..Default::default()
            },
            ..Default::default()
        };
        let err = train(TaggerKind::Brill, &config, &train_corpus(), &test_corpus()).unwrap_err();
        assert!(matches!(err, PosError::Configuration(ConfigError::NonPositiveMaxRules)));
    }

    #[test]
    fn test_save_and_load_model() {
        let dir = tempfile::tempdir().unwrap();
        for kind in [TaggerKind::Hmm, TaggerKind::Brill] {
            let outcome = train(kind, &PipelineConfig::default(), &train_corpus(), &test_corpus()).unwrap();
            let path = dir.path().join(format!("{kind}.json"));
            outcome.tagger.save(&path).unwrap();
            let loaded = TrainedTagger::load(&path).unwrap();
            assert_eq!(loaded, outcome.tagger);
            let words = ["the", "zebra", "wants", "to", "run"];
            assert_eq!(loaded.tag_words(&words), outcome.tagger.tag_words(&words));
        }
    }

    #[test]
    fn test_load_rejects_tables_that_do_not_fit() {
        let dir = tempfile::tempdir().unwrap();
        for kind in [TaggerKind::Hmm, TaggerKind::Brill] {
            let outcome = train(kind, &PipelineConfig::default(), &train_corpus(), &test_corpus()).unwrap();
            let path = dir.path().join(format!("{kind}.json"));
            outcome.tagger.save(&path).unwrap();

            let mut value: serde_json::Value = serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
            match kind {
                TaggerKind::Hmm => {
                    let transition = value["model"]["transition"].as_array_mut().unwrap();
                    transition.truncate(transition.len() - 1);
                }
                TaggerKind::Brill => value["model"]["rules"][0]["rule"]["template"] = serde_json::json!(99),
            }
            std::fs::write(&path, serde_json::to_vec(&value).unwrap()).unwrap();

            match TrainedTagger::load(&path) {
                Err(PosError::Serialization(_)) => {}
                other => panic!("esperava erro de desserialização para {kind}, veio {other:?}"),
            }
        }
    }

    #[test]
    fn test_saved_model_is_byte_identical_across_runs() {
        let dir = tempfile::tempdir().unwrap();
        let mut saved = Vec::new();
        for run in 0..3 {
            let outcome = train(TaggerKind::Brill, &PipelineConfig::default(), &train_corpus(), &test_corpus()).unwrap();
            let path = dir.path().join(format!("brill-{run}.json"));
            outcome.tagger.save(&path).unwrap();
            saved.push(std::fs::read(&path).unwrap());
        }
        assert!(saved.windows(2).all(|pair| pair[0] == pair[1]));
    }

    #[test]
    fn test_load_missing_model_names_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.json");
        match TrainedTagger::load(&path) {
            Err(PosError::Io { path: p, .. }) => assert_eq!(p, path),
            other => panic!("esperava erro de I/O, veio {other:?}"),
        }
    }
}
