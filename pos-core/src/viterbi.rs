//! # Algoritmo de Viterbi — Decodificação de Sequências HMM
//!
//! O algoritmo de Viterbi é um método de **programação dinâmica** que encontra
//! a sequência de tags mais provável de forma eficiente.
//!
//! ## Intuição
//!
//! Com T tags possíveis por token, uma busca exaustiva custaria `O(T^N)` para
//! N tokens. O Viterbi explora que a **melhor sequência até o token i com tag t**
//! depende apenas da **melhor sequência até o token i-1 com alguma tag anterior**
//! → `O(N × T²)`.
//!
//! ## Algoritmo
//!
//! ```text
//! Inicialização: best[0][t] = log P(t) + log P(w_0 | t)
//!
//! Recursão: best[i][t] = max_{t'} [best[i-1][t'] + log P(t | t')] + log P(w_i | t)
//!
//! Backtracking: reconstrói o caminho ótimo de trás pra frente
//! ```
//!
//! Tudo em log-space, para não haver underflow em sentenças longas.
//!
//! ## Desempate
//!
//! Empates são resolvidos pelo **menor índice de estado**. Como os índices
//! seguem a ordem alfabética das tags (ver [`crate::vocab`]), o resultado nunca
//! depende da ordem de iteração de um mapa.

/// Interface das três distribuições que o decodificador consome.
///
/// Qualquer tabela de probabilidades que a implemente pode ser decodificada;
/// o decodificador apenas lê, nunca modifica.
pub trait MarkovModel {
    /// Número de estados ocultos (tags). Deve ser positivo.
    fn n_states(&self) -> usize;

    /// Traduz uma palavra para o id de observação, `None` se nunca vista no treino.
    fn observation(&self, word: &str) -> Option<usize>;

    /// $\log P(y_0 = s)$
    fn log_initial(&self, state: usize) -> f64;

    /// $\log P(y_i = next | y_{i-1} = prev)$
    fn log_transition(&self, prev: usize, next: usize) -> f64;

    /// $\log P(x_i | y_i = s)$; para `None` usa a massa reservada a palavras desconhecidas.
    fn log_emission(&self, state: usize, observation: Option<usize>) -> f64;
}

/// Resultado do Viterbi: sequência ótima de estados e seu log-score.
#[derive(Debug, Clone, PartialEq)]
pub struct ViterbiResult {
    /// Índice do estado escolhido para cada token
    pub best_path: Vec<usize>,
    /// $\log P(x, y^*)$ da melhor sequência (0.0 para entrada vazia)
    pub best_score: f64,
}

/// Executa o Viterbi sobre uma sequência de palavras.
///
/// O tamanho de `best_path` é sempre igual ao de `words`; uma sentença vazia
/// resulta em caminho vazio.
pub fn viterbi_decode<M>(model: &M, words: &[&str]) -> ViterbiResult
where
    M: MarkovModel + ?Sized,
{
    let n_states = model.n_states();
    if words.is_empty() || n_states == 0 {
        debug_assert!(words.is_empty(), "modelo sem estados");
        return ViterbiResult {
            best_path: vec![],
            best_score: 0.0,
        };
    }

    let n_tokens = words.len();
    let observations: Vec<Option<usize>> = words.iter().map(|w| model.observation(w)).collect();

    // Transições lidas uma única vez: trans[prev * n + next]
    let transitions: Vec<f64> = (0..n_states)
        .flat_map(|prev| (0..n_states).map(move |next| (prev, next)))
        .map(|(prev, next)| model.log_transition(prev, next))
        .collect();

    // best[t] = melhor log-score acumulado terminando na tag t no token atual
    let mut best: Vec<f64> = (0..n_states)
        .map(|s| model.log_initial(s) + model.log_emission(s, observations[0]))
        .collect();
    // backptr[i][t] = tag anterior que maximiza best[i][t]
    let mut backptr: Vec<Vec<usize>> = vec![vec![0usize; n_states]; n_tokens];
    let mut next_best = vec![f64::NEG_INFINITY; n_states];

    for i in 1..n_tokens {
        for (s, slot) in next_best.iter_mut().enumerate() {
            let mut best_prev_score = f64::NEG_INFINITY;
            let mut best_prev = 0;
            for prev in 0..n_states {
                let score = best[prev] + transitions[prev * n_states + s];
                // `>` estrito: em empate fica o menor índice
                if score > best_prev_score {
                    best_prev_score = score;
                    best_prev = prev;
                }
            }
            *slot = best_prev_score + model.log_emission(s, observations[i]);
            backptr[i][s] = best_prev;
        }
        std::mem::swap(&mut best, &mut next_best);
    }

    // === Backtracking ===
    let (mut state, best_score) = best_in_slice(&best);
    let mut best_path = vec![0usize; n_tokens];
    best_path[n_tokens - 1] = state;
    for i in (1..n_tokens).rev() {
        state = backptr[i][state];
        best_path[i - 1] = state;
    }

    ViterbiResult {
        best_path,
        best_score,
    }
}

/// Retorna (índice, valor) do primeiro máximo em um slice
fn best_in_slice(scores: &[f64]) -> (usize, f64) {
    let mut best = (0, f64::NEG_INFINITY);
    for (i, &v) in scores.iter().enumerate() {
        if v > best.1 {
            best = (i, v);
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Modelo de brinquedo com tabelas explícitas (probabilidades, não logs).
    struct Toy {
        initial: Vec<f64>,
        transition: Vec<Vec<f64>>,
        emission: Vec<Vec<f64>>,
        words: Vec<&'static str>,
        unknown: f64,
    }

    impl MarkovModel for Toy {
        fn n_states(&self) -> usize {
            self.initial.len()
        }

        fn observation(&self, word: &str) -> Option<usize> {
            self.words.iter().position(|w| *w == word)
        }

        fn log_initial(&self, state: usize) -> f64 {
            self.initial[state].ln()
        }

        fn log_transition(&self, prev: usize, next: usize) -> f64 {
            self.transition[prev][next].ln()
        }

        fn log_emission(&self, state: usize, observation: Option<usize>) -> f64 {
            observation
                .map(|o| self.emission[state][o])
                .unwrap_or(self.unknown)
                .ln()
        }
    }

    fn weather() -> Toy {
        // Estados: 0 = Chuva, 1 = Sol; observações: passear, comprar, limpar
        Toy {
            initial: vec![0.6, 0.4],
            transition: vec![vec![0.7, 0.3], vec![0.4, 0.6]],
            emission: vec![vec![0.1, 0.4, 0.5], vec![0.6, 0.3, 0.1]],
            words: vec!["passear", "comprar", "limpar"],
            unknown: 0.5,
        }
    }

    #[test]
    fn test_viterbi_classic_example() {
        let result = viterbi_decode(&weather(), &["passear", "comprar", "limpar"]);
        assert_eq!(result.best_path, vec![1, 0, 0]);
        let expected = (0.4f64 * 0.6 * 0.4 * 0.4 * 0.7 * 0.5).ln();
        assert!((result.best_score - expected).abs() < 1e-9);
    }

    #[test]
    fn test_viterbi_empty() {
        let result = viterbi_decode(&weather(), &[]);
        assert!(result.best_path.is_empty());
    }

    #[test]
    fn test_viterbi_length_matches_input() {
        let model = weather();
        for n in 1..20 {
            let words: Vec<&str> = (0..n).map(|i| ["limpar", "xyz", "passear"][i % 3]).collect();
            assert_eq!(viterbi_decode(&model, &words).best_path.len(), n);
        }
    }

    #[test]
    fn test_ties_choose_lowest_state() {
        let uniform = Toy {
            initial: vec![0.5, 0.5],
            transition: vec![vec![0.5, 0.5], vec![0.5, 0.5]],
            emission: vec![vec![1.0], vec![1.0]],
            words: vec!["x"],
            unknown: 0.5,
        };
        let result = viterbi_decode(&uniform, &["x", "x", "x"]);
        assert_eq!(result.best_path, vec![0, 0, 0]);
    }

    #[test]
    fn test_long_sentence_does_not_underflow() {
        let model = weather();
        let words = vec!["comprar"; 5000];
        let result = viterbi_decode(&model, &words);
        assert!(result.best_score.is_finite());
        assert_eq!(result.best_path.len(), 5000);
    }
}
