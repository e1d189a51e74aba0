/*!
Writers for the stage records. Every sentence (or view) is written as tab-delimited rows followed
by a single blank line, so that the tabular reader gives back the same records.
*/
use crate::error::SrlError;
use crate::sentence::ToRecords;
use log::info;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

fn tabular_writer<W: Write>(writer: W) -> csv::Writer<W> {
    csv::WriterBuilder::new()
        .delimiter(b'\t')
        .quote(b'\\')
        .quote_style(csv::QuoteStyle::Necessary)
        .has_headers(false)
        .flexible(true)
        .from_writer(writer)
}

/// Writes `sentences` to `writer`. Returns the number of sentences written.
pub fn write_sentences<'a, T, I, W>(sentences: I, mut writer: W) -> Result<usize, SrlError>
where
    T: ToRecords + 'a,
    I: IntoIterator<Item = &'a T>,
    W: Write,
{
    let mut count = 0;
    for sentence in sentences {
        // The csv writer cannot emit an empty record, so each sentence is encoded on its own and
        // the separator is written to the output directly.
        let mut csv_writer = tabular_writer(Vec::new());
        for record in sentence.to_records() {
            csv_writer
                .write_record(&record)
                .map_err(|e| SrlError::csv(format!("writing sentence {}", count + 1), e))?;
        }
        let encoded = csv_writer.into_inner().map_err(|e| {
            let source = io::Error::new(e.error().kind(), e.error().to_string());
            SrlError::io(format!("encoding sentence {}", count + 1), source)
        })?;
        writer
            .write_all(&encoded)
            .map_err(|e| SrlError::io(format!("writing sentence {}", count + 1), e))?;
        writer
            .write_all(b"\n")
            .map_err(|e| SrlError::io("writing a sentence separator", e))?;
        count += 1;
    }
    writer
        .flush()
        .map_err(|e| SrlError::io("flushing the output", e))?;
    Ok(count)
}

/// Creates (or truncates) `path` and writes `sentences` to it.
pub fn write_sentences_to<'a, T, I, P>(sentences: I, path: P) -> Result<usize, SrlError>
where
    T: ToRecords + 'a,
    I: IntoIterator<Item = &'a T>,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let file = File::create(path)
        .map_err(|e| SrlError::io(format!("creating {}", path.display()), e))?;
    let count = write_sentences(sentences, BufWriter::new(file))?;
    info!("wrote {} sentences to {}", count, path.display());
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::{read_all, RawSentence, Record, TabularReader};
    use crate::sentence::{PredicateSentence, View};
    use std::io::Cursor;

    struct Rows(Vec<Record>);

    impl ToRecords for Rows {
        fn to_records(&self) -> Vec<Record> {
            self.0.clone()
        }
    }

    fn record(fields: &[&str]) -> Record {
        fields.iter().map(|s| String::from(*s)).collect()
    }

    fn predicate_records() -> RawSentence {
        vec![
            record(&["1", "It", "it", "PRON", "PRP", "_", "2", "nsubj", "_", "_", "_", "_", "ARG0"]),
            record(&["2", "rains", "rain", "VERB", "VBZ", "_", "0", "root", "_", "SpaceAfter=No", "PRED", "PRED", "V"]),
        ]
    }

    #[test]
    fn test_blank_line_after_each_sentence() {
        let sentences = vec![
            Rows(vec![record(&["1", "a"]), record(&["2", "b"])]),
            Rows(vec![record(&["1", "c"])]),
        ];
        let mut buffer = Vec::new();
        let count = write_sentences(&sentences, &mut buffer).unwrap();
        assert_eq!(count, 2);
        assert_eq!(String::from_utf8(buffer).unwrap(), "1\ta\n2\tb\n\n1\tc\n\n");
    }

    #[test]
    fn test_fields_with_delimiters_are_quoted() {
        let sentences = vec![Rows(vec![record(&["1", "a\tb", "c"])])];
        let mut buffer = Vec::new();
        write_sentences(&sentences, &mut buffer).unwrap();
        let read = TabularReader::new(Cursor::new(buffer))
            .collect::<Result<Vec<_>, _>>()
            .unwrap();
        assert_eq!(read, vec![vec![record(&["1", "a\tb", "c"])]]);
    }

    #[test]
    fn test_predicate_sentences_round_trip_through_a_file() {
        let sentence = PredicateSentence::try_from(predicate_records()).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample-pred_iden-rule.tsv");
        write_sentences_to(&[sentence.clone(), sentence.clone()], &path).unwrap();
        let read = read_all(&path).unwrap();
        assert_eq!(read.len(), 2);
        let parsed = PredicateSentence::try_from(read[1].clone()).unwrap();
        assert_eq!(parsed, sentence);
    }

    #[test]
    fn test_distinct_sentences_round_trip_through_a_file() {
        let sentences = vec![
            Rows(vec![record(&["1", "a", "x"]), record(&["2", "b", "y"])]),
            Rows(vec![record(&["1", "c"]), record(&["2", "d\te"]), record(&["3", "f"])]),
        ];
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("two.tsv");
        assert_eq!(write_sentences_to(&sentences, &path).unwrap(), 2);
        let read = read_all(&path).unwrap();
        let expected: Vec<RawSentence> = sentences.iter().map(|s| s.0.clone()).collect();
        assert_eq!(read, expected);
    }

    #[test]
    fn test_views_round_trip() {
        let mut records = predicate_records();
        for r in records.iter_mut() {
            r.push(String::from("_"));
        }
        let view = View::try_from(records.clone()).unwrap();
        let mut buffer = Vec::new();
        write_sentences(&[view], &mut buffer).unwrap();
        let read = TabularReader::new(Cursor::new(buffer))
            .collect::<Result<Vec<_>, _>>()
            .unwrap();
        assert_eq!(read, vec![records]);
    }
}
