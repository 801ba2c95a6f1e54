//! # Configuração dos Etiquetadores
//!
//! A superfície de configuração consumida pelo núcleo:
//!
//! - [`TaggerKind`]: qual motor treinar (`hmm` ou `brill`).
//! - [`Smoothing`]: política de suavização aditiva do HMM.
//! - [`HmmConfig`]: as suavizações candidatas testadas na seleção de modelo.
//! - [`BrillConfig`]: templates, limite de regras e limiares do aprendiz.
//!
//! Todos os tipos têm `Default` sensato e são validados uma única vez, na
//! entrada do treinamento.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::rules::Template;

/// Motor de etiquetagem.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaggerKind {
    /// Hidden Markov Model com decodificação de Viterbi.
    #[default]
    Hmm,
    /// Baseline unigrama + regras de transformação de Brill.
    Brill,
}

impl FromStr for TaggerKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hmm" => Ok(Self::Hmm),
            "brill" => Ok(Self::Brill),
            other => Err(ConfigError::UnknownTagger(other.to_string())),
        }
    }
}

impl fmt::Display for TaggerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hmm => f.write_str("hmm"),
            Self::Brill => f.write_str("brill"),
        }
    }
}

/// Suavização aditiva usada para converter contagens em probabilidades.
///
/// Para um evento `x` com contagem `c(x)`, total `N` e suporte de tamanho `B`:
///
/// $$ P(x) = \frac{c(x) + \gamma}{N + \gamma B} $$
///
/// - **Laplace**: `γ = 1` (add-one).
/// - **Lidstone**: `γ` configurável, positivo.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Smoothing {
    Laplace,
    Lidstone { gamma: f64 },
}

impl Smoothing {
    /// Constrói a partir do nome (`"laplace"` ou `"lidstone"`).
    /// `gamma` só é considerado para Lidstone.
    pub fn from_name(name: &str, gamma: f64) -> Result<Self, ConfigError> {
        let smoothing = match name.to_ascii_lowercase().as_str() {
            "laplace" => Self::Laplace,
            "lidstone" => Self::Lidstone { gamma },
            _ => return Err(ConfigError::UnknownSmoothing(name.to_string())),
        };
        smoothing.validate()?;
        Ok(smoothing)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        match *self {
            Self::Laplace => Ok(()),
            Self::Lidstone { gamma } if gamma.is_finite() && gamma > 0.0 => Ok(()),
            Self::Lidstone { gamma } => Err(ConfigError::NonPositiveGamma(gamma)),
        }
    }

    #[inline]
    pub fn gamma(&self) -> f64 {
        match *self {
            Self::Laplace => 1.0,
            Self::Lidstone { gamma } => gamma,
        }
    }

    /// Probabilidade suavizada de um evento com `count` ocorrências entre
    /// `total`, sobre um suporte de `bins` eventos.
    #[inline]
    pub fn probability(&self, count: usize, total: usize, bins: usize) -> f64 {
        let gamma = self.gamma();
        (count as f64 + gamma) / (total as f64 + gamma * bins as f64)
    }
}

impl FromStr for Smoothing {
    type Err = ConfigError;

    /// `"laplace"` ou `"lidstone:<gamma>"`, ex: `"lidstone:0.1"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(':') {
            None => Self::from_name(s, f64::NAN),
            Some((name, gamma)) => {
                let gamma = gamma
                    .trim()
                    .parse::<f64>()
                    .map_err(|_| ConfigError::UnknownSmoothing(s.to_string()))?;
                Self::from_name(name.trim(), gamma)
            }
        }
    }
}

impl Default for Smoothing {
    fn default() -> Self {
        Self::Laplace
    }
}

impl fmt::Display for Smoothing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Laplace => f.write_str("Laplace"),
            Self::Lidstone { gamma } => write!(f, "Lidstone(gamma={gamma})"),
        }
    }
}

/// Configuração do HMM: cada suavização é treinada e a de maior acurácia vence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HmmConfig {
    pub candidates: Vec<Smoothing>,
}

impl HmmConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.candidates.is_empty() {
            return Err(ConfigError::NoSmoothingCandidates);
        }
        self.candidates.iter().try_for_each(Smoothing::validate)
    }
}

impl Default for HmmConfig {
    fn default() -> Self {
        Self {
            candidates: vec![
                Smoothing::Laplace,
                Smoothing::Lidstone { gamma: 0.1 },
                Smoothing::Lidstone { gamma: 0.8 },
            ],
        }
    }
}

/// Configuração do aprendiz de Brill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrillConfig {
    /// Formas de contexto que as regras podem assumir.
    pub templates: Vec<Template>,
    /// Número máximo de regras aprendidas.
    pub max_rules: usize,
    /// Score líquido mínimo (bons − ruins) para aceitar uma regra.
    pub min_score: usize,
    /// Fração mínima bons / (bons + ruins), se definida.
    pub min_accuracy: Option<f64>,
    /// Tag atribuída pelo baseline a palavras não vistas no treino.
    pub default_tag: String,
}

impl BrillConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_rules == 0 {
            return Err(ConfigError::NonPositiveMaxRules);
        }
        if self.min_score == 0 {
            return Err(ConfigError::NonPositiveMinScore);
        }
        if let Some(acc) = self.min_accuracy {
            if !(0.0..=1.0).contains(&acc) {
                return Err(ConfigError::InvalidMinAccuracy(acc));
            }
        }
        if self.default_tag.is_empty() {
            return Err(ConfigError::EmptyDefaultTag);
        }
        if self.templates.is_empty() {
            return Err(ConfigError::EmptyTemplateSet);
        }
        self.templates.iter().try_for_each(Template::validate)
    }
}

impl Default for BrillConfig {
    fn default() -> Self {
        Self {
            templates: Template::defaults(),
            max_rules: 200,
            min_score: 1,
            min_accuracy: None,
            default_tag: "NN".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tagger_kind_from_str() {
        assert_eq!("hmm".parse::<TaggerKind>(), Ok(TaggerKind::Hmm));
        assert_eq!("brill".parse::<TaggerKind>(), Ok(TaggerKind::Brill));
        assert_eq!(
            "crf".parse::<TaggerKind>(),
            Err(ConfigError::UnknownTagger("crf".to_string()))
        );
    }

    #[test]
    fn test_smoothing_from_name() {
        assert_eq!(Smoothing::from_name("laplace", 0.0), Ok(Smoothing::Laplace));
        assert_eq!(
            Smoothing::from_name("Lidstone", 0.1),
            Ok(Smoothing::Lidstone { gamma: 0.1 })
        );
        assert_eq!(
            Smoothing::from_name("good-turing", 0.1),
            Err(ConfigError::UnknownSmoothing("good-turing".to_string()))
        );
        assert!(matches!(
            Smoothing::from_name("lidstone", 0.0),
            Err(ConfigError::NonPositiveGamma(_))
        ));
        assert!(Smoothing::Lidstone { gamma: f64::NAN }.validate().is_err());
    }

    #[test]
    fn test_smoothing_from_str() {
        assert_eq!("laplace".parse::<Smoothing>(), Ok(Smoothing::Laplace));
        assert_eq!("Lidstone:0.5".parse::<Smoothing>(), Ok(Smoothing::Lidstone { gamma: 0.5 }));
        assert!(matches!(
            "lidstone".parse::<Smoothing>(),
            Err(ConfigError::NonPositiveGamma(_))
        ));
        assert!(matches!(
            "lidstone:abc".parse::<Smoothing>(),
            Err(ConfigError::UnknownSmoothing(_))
        ));
        assert!(matches!(
            "witten-bell".parse::<Smoothing>(),
            Err(ConfigError::UnknownSmoothing(_))
        ));
    }

    #[test]
    fn test_laplace_is_lidstone_one() {
        let laplace = Smoothing::Laplace.probability(3, 10, 5);
        let lidstone = Smoothing::Lidstone { gamma: 1.0 }.probability(3, 10, 5);
        assert!((laplace - lidstone).abs() < 1e-12);
        assert!((laplace - 4.0 / 15.0).abs() < 1e-12);
    }

    #[test]
    fn test_brill_config_validation() {
        assert!(BrillConfig::default().validate().is_ok());

        let config = BrillConfig { max_rules: 0, ..Default::default() };
        assert_eq!(config.validate(), Err(ConfigError::NonPositiveMaxRules));

        let config = BrillConfig { default_tag: String::new(), ..Default::default() };
        assert_eq!(config.validate(), Err(ConfigError::EmptyDefaultTag));

        let config = BrillConfig { templates: vec![], ..Default::default() };
        assert_eq!(config.validate(), Err(ConfigError::EmptyTemplateSet));

        let config = BrillConfig { min_accuracy: Some(1.5), ..Default::default() };
        assert!(matches!(config.validate(), Err(ConfigError::InvalidMinAccuracy(_))));
    }

    #[test]
    fn test_hmm_config_default_candidates() {
        let config = HmmConfig::default();
        assert_eq!(config.candidates.len(), 3);
        assert!(config.validate().is_ok());
        assert_eq!(
            HmmConfig { candidates: vec![] }.validate(),
            Err(ConfigError::NoSmoothingCandidates)
        );
    }

    #[test]
    fn test_brill_config_deserializes_with_defaults() {
        let config: BrillConfig = serde_json::from_str(r#"{"max_rules": 10}"#).unwrap();
        assert_eq!(config.max_rules, 10);
        assert_eq!(config.default_tag, "NN");
        assert_eq!(config.templates.len(), 8);
    }
}
