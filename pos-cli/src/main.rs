//! Linha de comando: treina HMM ou Brill, avalia no corpus de teste e grava a
//! saída etiquetada no mesmo formato da entrada.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use pos_core::{
    config::{BrillConfig, HmmConfig, Smoothing, TaggerKind},
    corpus::{load_corpus, save_tagged},
    evaluation::Evaluation,
    pipeline::{train, PipelineConfig},
    Tagger,
};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(version, about = "Etiquetagem morfossintática com HMM e Brill")]
struct Args {
    /// Motor de etiquetagem: `hmm` ou `brill`
    #[arg(long)]
    tagger: TaggerKind,

    /// Corpus de treino (`palavra tag` por linha)
    #[arg(long)]
    train: PathBuf,

    /// Corpus de teste, usado para avaliação e seleção de modelo
    #[arg(long)]
    test: PathBuf,

    /// Arquivo de saída com o corpus de teste etiquetado
    #[arg(long)]
    output: PathBuf,

    /// Número máximo de regras de Brill
    #[arg(long, default_value_t = 200)]
    max_rules: usize,

    /// Score líquido mínimo de uma regra de Brill
    #[arg(long, default_value_t = 1)]
    min_score: usize,

    /// Tag para palavras desconhecidas no baseline de Brill
    #[arg(long, default_value = "NN")]
    default_tag: String,

    /// Valores de gamma para Lidstone (substituem 0.1 e 0.8)
    #[arg(long = "gamma")]
    gammas: Vec<f64>,

    /// Não testa a suavização de Laplace
    #[arg(long)]
    no_laplace: bool,

    /// Suavização candidata do HMM: `laplace` ou `lidstone:<gamma>` (repetível;
    /// substitui a lista padrão)
    #[arg(long = "smoothing", conflicts_with_all = ["gammas", "no_laplace"])]
    smoothings: Vec<Smoothing>,

    /// Salva o modelo escolhido em JSON
    #[arg(long)]
    save_model: Option<PathBuf>,
}

impl Args {
    fn pipeline_config(&self) -> PipelineConfig {
        let mut hmm = HmmConfig::default();
        if !self.smoothings.is_empty() {
            hmm.candidates = self.smoothings.clone();
        } else if !self.gammas.is_empty() || self.no_laplace {
            let gammas: Vec<f64> = if self.gammas.is_empty() {
                hmm.candidates
                    .iter()
                    .filter_map(|s| match s {
                        Smoothing::Lidstone { gamma } => Some(*gamma),
                        Smoothing::Laplace => None,
                    })
                    .collect()
            } else {
                self.gammas.clone()
            };
            hmm.candidates = (!self.no_laplace)
                .then_some(Smoothing::Laplace)
                .into_iter()
                .chain(gammas.into_iter().map(|gamma| Smoothing::Lidstone { gamma }))
                .collect();
        }

        PipelineConfig {
            hmm,
            brill: BrillConfig {
                max_rules: self.max_rules,
                min_score: self.min_score,
                default_tag: self.default_tag.clone(),
                ..Default::default()
            },
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    debug!(?args, "argumentos");

    info!(path = %args.train.display(), "carregando corpus de treino");
    let train_sents = load_corpus(&args.train)
        .with_context(|| format!("não foi possível ler o corpus de treino {}", args.train.display()))?;
    info!(path = %args.test.display(), "carregando corpus de teste");
    let test_sents = load_corpus(&args.test)
        .with_context(|| format!("não foi possível ler o corpus de teste {}", args.test.display()))?;

    let config = args.pipeline_config();
    let outcome = train(args.tagger, &config, &train_sents, &test_sents).context("falha no treinamento")?;
    for candidate in &outcome.candidates {
        info!("Acurácia {}: {:.4}%", candidate.label, candidate.accuracy * 100.0);
    }

    let tagged = outcome.tagger.tag_sentences(&test_sents);
    let mut evaluation = Evaluation::new();
    for (reference, prediction) in test_sents.iter().zip(&tagged) {
        evaluation.accumulate(reference, prediction);
    }
    debug!("\n{evaluation}");

    save_tagged(&args.output, &tagged)
        .with_context(|| format!("não foi possível gravar {}", args.output.display()))?;
    info!(path = %args.output.display(), "saída gravada");

    if let Some(path) = &args.save_model {
        outcome
            .tagger
            .save(path)
            .with_context(|| format!("não foi possível salvar o modelo em {}", path.display()))?;
    }
    Ok(())
}
