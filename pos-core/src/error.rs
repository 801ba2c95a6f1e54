//! # Erros do Núcleo
//!
//! Taxonomia de erros estruturados. O núcleo nunca formata mensagens para o
//! usuário final: devolve valores que a camada de linha de comando decide como
//! exibir.
//!
//! - [`InvalidInputError`]: dados ruins (corpus vazio, linha malformada, campo vazio).
//! - [`ConfigError`]: configuração inválida (suavização desconhecida, γ ≤ 0, `max_rules` = 0).
//!
//! A validação acontece na fronteira onde o dado ruim é inspecionado pela
//! primeira vez: leitura do corpus ou entrada do treinamento.

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T, E = PosError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum PosError {
    #[error(transparent)]
    InvalidInput(#[from] InvalidInputError),

    #[error(transparent)]
    Configuration(#[from] ConfigError),

    #[error("falha ao acessar {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("modelo inválido: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl PosError {
    pub(crate) fn io<P>(path: P, source: std::io::Error) -> Self
    where
        P: Into<PathBuf>,
    {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Entrada inválida detectada na leitura do corpus ou no início do treino.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidInputError {
    #[error("InvalidInput: corpus de treino vazio")]
    EmptyCorpus,

    #[error("InvalidInput: sentença {index} não tem tokens")]
    EmptySentence { index: usize },

    /// Linha sem espaço separando palavra e tag.
    #[error("InvalidInput: linha {line} malformada: {content:?}")]
    MalformedLine { line: usize, content: String },

    #[error("InvalidInput: linha {line} com {field} vazio")]
    EmptyField { line: usize, field: &'static str },

    /// Token com palavra ou tag vazia numa sentença montada em código.
    #[error("InvalidInput: sentença {sentence}, token {token} com {field} vazio")]
    EmptyTokenField {
        sentence: usize,
        token: usize,
        field: &'static str,
    },

    /// Estado inicial e corpus de referência com sentenças de tamanhos ou palavras diferentes.
    #[error("InvalidInput: sentença {index} não corresponde ao corpus de referência")]
    MisalignedCorpora { index: usize },
}

/// Configuração rejeitada na entrada do treinamento.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("ConfigurationError: suavização desconhecida {0:?}")]
    UnknownSmoothing(String),

    #[error("ConfigurationError: gamma deve ser positivo e finito, recebido {0}")]
    NonPositiveGamma(f64),

    #[error("ConfigurationError: max_rules deve ser positivo")]
    NonPositiveMaxRules,

    #[error("ConfigurationError: min_score deve ser positivo")]
    NonPositiveMinScore,

    #[error("ConfigurationError: min_accuracy deve estar em [0, 1], recebido {0}")]
    InvalidMinAccuracy(f64),

    #[error("ConfigurationError: etiquetador desconhecido {0:?}")]
    UnknownTagger(String),

    #[error("ConfigurationError: conjunto de templates vazio")]
    EmptyTemplateSet,

    #[error("ConfigurationError: template inválido: {0}")]
    InvalidTemplate(String),

    #[error("ConfigurationError: tag padrão vazia")]
    EmptyDefaultTag,

    #[error("ConfigurationError: nenhuma configuração de suavização para testar")]
    NoSmoothingCandidates,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_errors_convert_into_pos_error() {
        let err: PosError = InvalidInputError::EmptyCorpus.into();
        assert!(matches!(
            err,
            PosError::InvalidInput(InvalidInputError::EmptyCorpus)
        ));

        let err: PosError = ConfigError::NonPositiveGamma(-0.5).into();
        assert!(matches!(err, PosError::Configuration(_)));
    }

    #[test]
    fn test_error_messages_name_the_kind() {
        let err = InvalidInputError::MalformedLine {
            line: 3,
            content: "dogNN".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.starts_with("InvalidInput"));
        assert!(msg.contains("linha 3"));

        let msg = ConfigError::UnknownSmoothing("witten-bell".into()).to_string();
        assert!(msg.starts_with("ConfigurationError"));
    }
}
