//! # pos-core — Etiquetagem Morfossintática (POS Tagging)
//!
//! Este crate implementa dois etiquetadores clássicos, treinados a partir de
//! um corpus anotado no formato `palavra tag` (uma por linha, sentenças
//! separadas por linha em branco):
//!
//! 1.  **HMM** ([`hmm`] + [`viterbi`]): estima probabilidades iniciais, de
//!     transição e de emissão com suavização aditiva (Laplace ou Lidstone) e
//!     decodifica a sequência de tags mais provável com Viterbi.
//! 2.  **Brill** ([`baseline`] + [`rules`] + [`brill`]): parte de um
//!     etiquetador unigrama com tag padrão e aprende uma lista ordenada de
//!     regras de transformação que corrigem seus erros.
//!
//! ## Exemplo de Uso
//!
//! ```rust
//! use pos_core::{train, PipelineConfig, Sentence, TaggerKind, Tagger};
//!
//! let corpus = vec![
//!     Sentence::from_pairs(&[("the", "DET"), ("dog", "NOUN"), ("barks", "VERB")]),
//!     Sentence::from_pairs(&[("a", "DET"), ("cat", "NOUN"), ("sleeps", "VERB")]),
//! ];
//!
//! let outcome = train(TaggerKind::Hmm, &PipelineConfig::default(), &corpus, &corpus).unwrap();
//! let tags = outcome.tagger.tag_words(&["the", "cat", "barks"]);
//! assert_eq!(tags, vec!["DET", "NOUN", "VERB"]);
//! ```
//!
//! ## Módulos Principais
//!
//! - [`corpus`]: leitura e escrita do formato de corpus.
//! - [`config`]: motor, suavização e parâmetros do aprendiz de Brill.
//! - [`pipeline`]: treino, seleção de modelo e persistência.
//! - [`evaluation`]: acurácia e métricas por tag.

pub mod baseline;
pub mod brill;
pub mod config;
pub mod corpus;
pub mod error;
pub mod evaluation;
pub mod hmm;
pub mod pipeline;
pub mod rules;
pub mod tagger;
pub mod viterbi;
pub mod vocab;

pub use baseline::UnigramTagger;
pub use brill::{learn_rules, BrillTagger, BrillTrainer, LearnedRule};
pub use config::{BrillConfig, HmmConfig, Smoothing, TaggerKind};
pub use corpus::{load_corpus, read_corpus, save_tagged, write_tagged};
pub use error::{ConfigError, InvalidInputError, PosError, Result};
pub use evaluation::{accuracy, Evaluation};
pub use hmm::HmmModel;
pub use pipeline::{train, PipelineConfig, TrainedTagger, TrainingOutcome};
pub use rules::{Feature, FeatureKind, Rule, RuleScore, Template};
pub use tagger::{Sentence, TaggedToken, Tagger};
pub use viterbi::{viterbi_decode, ViterbiResult};
pub use vocab::Vocabulary;
