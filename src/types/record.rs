//! SMDR record type and structural validation

use std::fmt;

/// Number of comma-separated fields in one SMDR line
pub const SMDR_FIELD_COUNT: usize = 38;

/// One SMDR line, split into its fields in arrival order.
///
/// Fields are kept verbatim; only the field count is checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmdrRecord {
    fields: Vec<String>,
}

/// Outcome of validating one decoded payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validation {
    /// The payload has exactly [`SMDR_FIELD_COUNT`] fields
    Valid(SmdrRecord),
    /// The payload has a different number of fields
    Invalid {
        /// Number of fields actually found
        field_count: usize,
    },
}

impl Validation {
    /// Whether the payload passed validation
    pub fn is_valid(&self) -> bool {
        matches!(self, Validation::Valid(_))
    }

    /// The validated record, if any
    pub fn into_record(self) -> Option<SmdrRecord> {
        match self {
            Validation::Valid(record) => Some(record),
            Validation::Invalid { .. } => None,
        }
    }
}

/// Split a decoded payload on commas and accept it iff it has exactly 38 fields.
///
/// A single trailing line terminator (`\n` or `\r\n`) is not part of the
/// last field.
pub fn validate(payload: &str) -> Validation {
    let line = strip_line_terminator(payload);
    let fields: Vec<String> = line.split(',').map(str::to_owned).collect();

    if fields.len() == SMDR_FIELD_COUNT {
        Validation::Valid(SmdrRecord { fields })
    } else {
        Validation::Invalid {
            field_count: fields.len(),
        }
    }
}

fn strip_line_terminator(payload: &str) -> &str {
    match payload.strip_suffix('\n') {
        Some(rest) => rest.strip_suffix('\r').unwrap_or(rest),
        None => payload,
    }
}

impl SmdrRecord {
    /// Fields in original order
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Consume the record, returning its fields
    pub fn into_fields(self) -> Vec<String> {
        self.fields
    }
}

impl fmt::Display for SmdrRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.fields.join(","))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line_with(count: usize) -> String {
        (0..count)
            .map(|i| format!("f{}", i))
            .collect::<Vec<_>>()
            .join(",")
    }

    #[test]
    fn accepts_exactly_38_fields_in_order() {
        let line = line_with(38);
        let record = validate(&line).into_record().expect("38 fields should validate");
        assert_eq!(record.fields().len(), SMDR_FIELD_COUNT);
        assert_eq!(record.fields()[0], "f0");
        assert_eq!(record.fields()[37], "f37");
        assert_eq!(record.to_string(), line);
    }

    #[test]
    fn rejects_other_field_counts() {
        for count in [1, 37, 39, 76] {
            assert_eq!(
                validate(&line_with(count)),
                Validation::Invalid { field_count: count },
                "{} fields should be rejected",
                count
            );
        }
        assert!(!validate("").is_valid());
    }

    #[test]
    fn keeps_empty_fields() {
        let line = ",".repeat(SMDR_FIELD_COUNT - 1);
        let record = validate(&line).into_record().unwrap();
        assert!(record.fields().iter().all(String::is_empty));
    }

    #[test]
    fn trailing_line_terminator_is_not_a_field() {
        let line = line_with(38);
        let crlf = validate(&format!("{}\r\n", line)).into_record().unwrap();
        let lf = validate(&format!("{}\n", line)).into_record().unwrap();
        assert_eq!(crlf.fields()[37], "f37");
        assert_eq!(crlf, lf);
    }

    #[test]
    fn two_lines_in_one_payload_are_rejected() {
        let payload = format!("{}\r\n{}\r\n", line_with(38), line_with(38));
        assert_eq!(validate(&payload), Validation::Invalid { field_count: 75 });
    }

    #[test]
    fn field_content_is_not_inspected() {
        let mut fields: Vec<String> = (0..38).map(|i| i.to_string()).collect();
        fields[3] = " quoted \"value\" ".to_string();
        let record = validate(&fields.join(",")).into_record().unwrap();
        assert_eq!(record.into_fields(), fields);
    }
}
