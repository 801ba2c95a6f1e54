//! # Corpus Etiquetado — Leitura e Escrita
//!
//! Formato em texto UTF-8, um token por linha:
//!
//! ```text
//! The DET
//! dog NOUN
//!
//! It PRON
//! barks VERB
//! ```
//!
//! - Cada linha é `<palavra><espaço><tag>`, separada no **último** espaço,
//!   então a palavra pode conter espaços.
//! - Uma linha em branco encerra a sentença; linhas em branco consecutivas
//!   são ignoradas e nunca geram sentenças vazias.
//! - A última sentença é emitida mesmo sem linha em branco no final.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use crate::error::{InvalidInputError, PosError, Result};
use crate::tagger::{Sentence, TaggedToken};

/// Lê um corpus etiquetado de qualquer fonte bufferizada.
///
/// Erros de formato são reportados com o número da linha (base 1) já na
/// leitura, nunca adiados para o treino.
pub fn read_corpus<R: BufRead>(reader: R) -> Result<Vec<Sentence>> {
    let mut sentences = Vec::new();
    let mut sentence = Sentence::default();

    for (i, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| PosError::io("<corpus>", e))?;
        let line = line.trim();
        if line.is_empty() {
            if !sentence.is_empty() {
                sentences.push(std::mem::take(&mut sentence));
            }
            continue;
        }
        sentence.push(parse_line(line, i + 1)?);
    }
    if !sentence.is_empty() {
        sentences.push(sentence);
    }

    Ok(sentences)
}

fn parse_line(line: &str, line_no: usize) -> Result<TaggedToken> {
    let (word, tag) = line
        .rsplit_once(' ')
        .ok_or_else(|| InvalidInputError::MalformedLine {
            line: line_no,
            content: line.to_string(),
        })?;
    if word.is_empty() {
        return Err(InvalidInputError::EmptyField {
            line: line_no,
            field: "palavra",
        }
        .into());
    }
    if tag.is_empty() {
        return Err(InvalidInputError::EmptyField {
            line: line_no,
            field: "tag",
        }
        .into());
    }
    Ok(TaggedToken::new(word, tag))
}

/// Abre e lê um arquivo de corpus.
pub fn load_corpus<P: AsRef<Path>>(path: P) -> Result<Vec<Sentence>> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| PosError::io(path, e))?;
    read_corpus(BufReader::new(file)).map_err(|e| match e {
        PosError::Io { source, .. } => PosError::io(path, source),
        other => other,
    })
}

/// Escreve sentenças etiquetadas no mesmo formato da entrada, com uma linha
/// em branco após cada sentença.
pub fn write_tagged<W: Write>(mut writer: W, sentences: &[Vec<TaggedToken>]) -> std::io::Result<()> {
    for sentence in sentences {
        for token in sentence {
            writeln!(writer, "{} {}", token.word, token.tag)?;
        }
        writeln!(writer)?;
    }
    writer.flush()
}

/// Cria (ou sobrescreve) `path` com a saída etiquetada.
pub fn save_tagged<P: AsRef<Path>>(path: P, sentences: &[Vec<TaggedToken>]) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path).map_err(|e| PosError::io(path, e))?;
    write_tagged(BufWriter::new(file), sentences).map_err(|e| PosError::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read(text: &str) -> Result<Vec<Sentence>> {
        read_corpus(text.as_bytes())
    }

    #[test]
    fn test_blank_lines_split_sentences() {
        let corpus = read("The DET\ndog NOUN\n\n\n\nIt PRON\nbarks VERB\n").unwrap();
        assert_eq!(corpus.len(), 2);
        assert_eq!(corpus[0], Sentence::from_pairs(&[("The", "DET"), ("dog", "NOUN")]));
        assert_eq!(corpus[1].tags(), vec!["PRON", "VERB"]);
    }

    #[test]
    fn test_last_sentence_without_trailing_blank_line() {
        let corpus = read("\n\na DET\ndog NOUN").unwrap();
        assert_eq!(corpus.len(), 1);
        assert_eq!(corpus[0].len(), 2);
    }

    #[test]
    fn test_split_on_last_space() {
        let corpus = read("New York PROPN\n").unwrap();
        assert_eq!(corpus[0].tokens()[0], TaggedToken::new("New York", "PROPN"));
    }

    #[test]
    fn test_surrounding_whitespace_is_trimmed() {
        let corpus = read("  dog NOUN  \r\n").unwrap();
        assert_eq!(corpus[0].tokens()[0], TaggedToken::new("dog", "NOUN"));
    }

    #[test]
    fn test_malformed_line_reports_line_number() {
        let err = read("a DET\ndogNOUN\n").unwrap_err();
        match err {
            PosError::InvalidInput(InvalidInputError::MalformedLine { line, content }) => {
                assert_eq!(line, 2);
                assert_eq!(content, "dogNOUN");
            }
            other => panic!("erro inesperado: {other:?}"),
        }
    }

    #[test]
    fn test_trailing_space_only_is_malformed() {
        let err = read("a  \nb NN\n").unwrap_err();
        assert!(matches!(
            err,
            PosError::InvalidInput(InvalidInputError::MalformedLine { line: 1, .. })
        ));
    }

    #[test]
    fn test_empty_field_is_rejected() {
        assert!(matches!(
            parse_line(" NN", 7),
            Err(PosError::InvalidInput(InvalidInputError::EmptyField { line: 7, field: "palavra" }))
        ));
        assert!(matches!(
            parse_line("dog ", 2),
            Err(PosError::InvalidInput(InvalidInputError::EmptyField { line: 2, field: "tag" }))
        ));
    }

    #[test]
    fn test_write_round_trips_through_reader() {
        let tagged = vec![
            vec![TaggedToken::new("a", "DET"), TaggedToken::new("dog", "NOUN")],
            vec![TaggedToken::new("runs", "VERB")],
        ];
        let mut out = Vec::new();
        write_tagged(&mut out, &tagged).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, "a DET\ndog NOUN\n\nruns VERB\n\n");

        let back = read(&text).unwrap();
        let back: Vec<Vec<TaggedToken>> = back.into_iter().map(Sentence::into_tokens).collect();
        assert_eq!(back, tagged);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nao-existe.txt");
        let err = load_corpus(&path).unwrap_err();
        match err {
            PosError::Io { path: p, .. } => assert_eq!(p, path),
            other => panic!("erro inesperado: {other:?}"),
        }
    }

    #[test]
    fn test_save_and_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.txt");
        save_tagged(&path, &[vec![TaggedToken::new("jog", "NN")]]).unwrap();
        let corpus = load_corpus(&path).unwrap();
        assert_eq!(corpus, vec![Sentence::from_pairs(&[("jog", "NN")])]);
    }
}
