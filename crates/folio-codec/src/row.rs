use std::borrow::Cow;

use folio_types::{FieldType, Record, Schema, Value};

use crate::escape::DELIMITER;
use crate::field::{encode, try_decode};

/// Something best-effort decoding had to paper over.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Anomaly {
    /// The row has a different number of tokens than the schema has fields.
    /// Missing trailing fields decode as absent; extra tokens are ignored.
    FieldCount { expected: usize, actual: usize },
    /// A token did not parse as its declared type and was kept as raw text.
    Fallback { field: String, expected: FieldType },
    /// The line was not valid UTF-8 and was read as Latin-1 from byte
    /// `valid_up_to` onwards.
    Latin1 { valid_up_to: usize },
}

/// A row decoded against a schema, plus any anomalies met on the way.
#[derive(Clone, Debug, PartialEq)]
pub struct DecodedRow {
    pub record: Record,
    pub anomalies: Vec<Anomaly>,
}

impl DecodedRow {
    pub fn is_clean(&self) -> bool {
        self.anomalies.is_empty()
    }
}

/// The text of one raw line, without its terminator.
///
/// Lines that are not valid UTF-8 are read as Latin-1, which maps every byte
/// to a character, so no line is ever unreadable.
pub fn line_text(bytes: &[u8]) -> (Cow<'_, str>, Option<Anomaly>) {
    match std::str::from_utf8(bytes) {
        Ok(text) => (Cow::Borrowed(text), None),
        Err(e) => (
            Cow::Owned(bytes.iter().copied().map(char::from).collect()),
            Some(Anomaly::Latin1 {
                valid_up_to: e.valid_up_to(),
            }),
        ),
    }
}

/// The header line for a schema: field names joined by the delimiter.
pub fn header_line(schema: &Schema) -> String {
    schema.field_names().collect::<Vec<_>>().join(",")
}

/// Encode a record as one row (without the trailing newline).
pub fn encode_row(record: &Record) -> String {
    record
        .values()
        .iter()
        .map(encode)
        .collect::<Vec<_>>()
        .join(",")
}

/// The encoded token in column `index` of a row, if present.
///
/// Primary-key matching compares this token against the encoded key, so no
/// other column has to be decoded.
pub fn key_token(line: &str, index: usize) -> Option<&str> {
    line.split(DELIMITER).nth(index)
}

/// Decode one row (without its newline) against `schema`.
pub fn decode_row(schema: &Schema, line: &str) -> DecodedRow {
    let tokens: Vec<&str> = line.split(DELIMITER).collect();
    let mut anomalies = Vec::new();
    if tokens.len() != schema.len() {
        anomalies.push(Anomaly::FieldCount {
            expected: schema.len(),
            actual: tokens.len(),
        });
    }

    let values = schema
        .fields()
        .iter()
        .enumerate()
        .map(|(i, field)| match tokens.get(i) {
            None => Value::Null,
            Some(token) => match try_decode(token, &field.ty) {
                Ok(value) => value,
                Err(e) => {
                    anomalies.push(Anomaly::Fallback {
                        field: field.name.clone(),
                        expected: field.ty.clone(),
                    });
                    Value::Text(e.raw)
                }
            },
        })
        .collect();

    DecodedRow {
        record: Record::new(values),
        anomalies,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema() -> Schema {
        Schema::builder("RandomModel")
            .field("pk", FieldType::Integer)
            .field("field_1", FieldType::Text)
            .field("field_2", FieldType::Integer)
            .primary_key("pk")
            .build()
            .unwrap()
    }

    #[test]
    fn invalid_utf8_lines_read_as_latin1() {
        let (text, anomaly) = line_text(b"2,Caf\xe9");
        assert_eq!(text, "2,Café");
        assert_eq!(anomaly, Some(Anomaly::Latin1 { valid_up_to: 5 }));

        let (text, anomaly) = line_text("2,Café".as_bytes());
        assert!(matches!(text, Cow::Borrowed("2,Café")));
        assert_eq!(anomaly, None);
    }

    #[test]
    fn header_and_row_layout() {
        assert_eq!(header_line(&schema()), "pk,field_1,field_2");
        let record = Record::new(vec![1.into(), "apple".into(), 1.into()]);
        assert_eq!(encode_row(&record), "1,apple,1");
    }

    #[test]
    fn embedded_commas_are_escaped_in_rows() {
        let record = Record::new(vec![1.into(), "cheese, bacon, mmm".into(), 1.into()]);
        let row = encode_row(&record);
        assert_eq!(row, "1,cheese%2C bacon%2C mmm,1");

        let decoded = decode_row(&schema(), &row);
        assert!(decoded.is_clean());
        assert_eq!(decoded.record, record);
    }

    #[test]
    fn key_token_is_whole_column() {
        assert_eq!(key_token("10,apple,1", 0), Some("10"));
        assert_eq!(key_token("10,apple,1", 1), Some("apple"));
        assert_eq!(key_token("10", 2), None);
    }

    #[test]
    fn short_rows_decode_best_effort() {
        let decoded = decode_row(&schema(), "1,apple");
        assert_eq!(
            decoded.anomalies,
            vec![Anomaly::FieldCount { expected: 3, actual: 2 }]
        );
        assert_eq!(decoded.record.get(1), Some(&Value::from("apple")));
        assert_eq!(decoded.record.get(2), Some(&Value::Null));
    }

    #[test]
    fn bad_tokens_fall_back_to_text() {
        let decoded = decode_row(&schema(), "1,apple,lots");
        assert_eq!(decoded.record.get(2), Some(&Value::from("lots")));
        assert!(matches!(
            decoded.anomalies.as_slice(),
            [Anomaly::Fallback { field, .. }] if field == "field_2"
        ));
    }

    #[test]
    fn structured_row_round_trip() {
        let schema = Schema::builder("Book")
            .field("id", FieldType::Text)
            .field("authors", FieldType::List)
            .field("image_links", FieldType::Map.optional())
            .primary_key("id")
            .build()
            .unwrap();
        let record = Record::new(vec![
            "b1".into(),
            json!(["A, B", "C"]).into(),
            Value::Null,
        ]);
        let row = encode_row(&record);
        assert_eq!(row.split(',').count(), 3);
        assert_eq!(decode_row(&schema, &row).record, record);
    }
}
