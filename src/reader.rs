/*!
Sentence readers. Both input shapes are turned into a sequence of raw sentences, each a sequence
of records (ordered string fields). Typing the records is left to the stage records in
`sentence.rs`; the readers only care about sentence boundaries, comments and padding.
*/
use crate::error::{FormatError, SrlError};
use crate::token::{CORE_COLUMNS, PLACEHOLDER};
use either::Either;
use log::info;
use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::Path;

/// A token record as read from disk.
pub type Record = Vec<String>;

/// A sentence as read from disk.
pub type RawSentence = Vec<Record>;

/// Treebank records are padded to at least the core columns, one predicate sense column and one
/// argument column, so that sentences without any predicate still have an argument slot.
pub const TREEBANK_MIN_COLUMNS: usize = CORE_COLUMNS + 2;

const COMMENT_PREFIX: char = '#';

/// Reads whitespace-delimited CoNLL-U (Universal PropBank) sentences.
pub struct TreebankReader<R> {
    lines: Lines<R>,
    line: usize,
}

impl<R: BufRead> TreebankReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line: 0,
        }
    }
}

/// Pads every record with placeholders up to the width of the first record (and at least
/// `TREEBANK_MIN_COLUMNS`).
fn pad_sentence(mut sentence: RawSentence) -> RawSentence {
    let width = sentence
        .first()
        .map_or(TREEBANK_MIN_COLUMNS, |first| first.len().max(TREEBANK_MIN_COLUMNS));
    for record in sentence.iter_mut() {
        if record.len() < width {
            record.resize(width, String::from(PLACEHOLDER));
        }
    }
    sentence
}

impl<R: BufRead> Iterator for TreebankReader<R> {
    type Item = Result<RawSentence, SrlError>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut sentence = RawSentence::new();
        loop {
            let line = match self.lines.next() {
                Some(Ok(line)) => line,
                Some(Err(e)) => {
                    return Some(Err(SrlError::io(
                        format!("reading treebank line {}", self.line + 1),
                        e,
                    )))
                }
                None => break,
            };
            self.line += 1;
            if line.starts_with(COMMENT_PREFIX) {
                continue;
            }
            let record: Record = line.split_whitespace().map(String::from).collect();
            if record.is_empty() {
                if sentence.is_empty() {
                    continue;
                }
                break;
            }
            sentence.push(record);
        }
        if sentence.is_empty() {
            None
        } else {
            Some(Ok(pad_sentence(sentence)))
        }
    }
}

/// Reads the tab-delimited files written by the pipeline stages. Fields may be quoted with a
/// backslash.
pub struct TabularReader<R> {
    lines: Lines<R>,
    line: usize,
}

impl<R: BufRead> TabularReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line: 0,
        }
    }

    fn parse_line(&self, line: &str) -> Result<Record, SrlError> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .quote(b'\\')
            .has_headers(false)
            .flexible(true)
            .from_reader(line.as_bytes());
        let mut record = csv::StringRecord::new();
        let found = reader
            .read_record(&mut record)
            .map_err(|e| SrlError::csv(format!("parsing line {}", self.line), e))?;
        if !found || record.is_empty() {
            return Err(FormatError::NoFields { line: self.line }.into());
        }
        Ok(record.iter().map(String::from).collect())
    }
}

impl<R: BufRead> Iterator for TabularReader<R> {
    type Item = Result<RawSentence, SrlError>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut sentence = RawSentence::new();
        loop {
            let line = match self.lines.next() {
                Some(Ok(line)) => line,
                Some(Err(e)) => {
                    return Some(Err(SrlError::io(
                        format!("reading tabular line {}", self.line + 1),
                        e,
                    )))
                }
                None => break,
            };
            self.line += 1;
            if line.starts_with(COMMENT_PREFIX) {
                continue;
            }
            if line.is_empty() {
                if sentence.is_empty() {
                    continue;
                }
                break;
            }
            match self.parse_line(&line) {
                Ok(record) => sentence.push(record),
                Err(e) => return Some(Err(e)),
            }
        }
        (!sentence.is_empty()).then_some(Ok(sentence))
    }
}

/// Returns `true` when the path names one of the intermediate tabular files.
pub fn is_tabular<P: AsRef<Path>>(path: P) -> bool {
    path.as_ref()
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("tsv"))
}

/// Opens `path` and iterates over its sentences. `.tsv` files are read with the tabular reader,
/// anything else is treated as a treebank.
pub fn read_sentences<P: AsRef<Path>>(
    path: P,
) -> Result<impl Iterator<Item = Result<RawSentence, SrlError>>, SrlError> {
    let path = path.as_ref();
    let file = File::open(path)
        .map_err(|e| SrlError::io(format!("opening {}", path.display()), e))?;
    let reader = BufReader::new(file);
    Ok(if is_tabular(path) {
        Either::Right(TabularReader::new(reader))
    } else {
        Either::Left(TreebankReader::new(reader))
    })
}

/// Reads every sentence of `path` into memory. The file handle is released before returning.
pub fn read_all<P: AsRef<Path>>(path: P) -> Result<Vec<RawSentence>, SrlError> {
    let sentences = read_sentences(path.as_ref())?.collect::<Result<Vec<_>, _>>()?;
    info!(
        "read {} sentences from {}",
        sentences.len(),
        path.as_ref().display()
    );
    Ok(sentences)
}
