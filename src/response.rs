//! Typed views over the JSON the model sends back.
//!
//! Responses are parsed into a [`serde_json::Value`] first and then picked
//! apart field by field, so a broken response can be reported as a missing
//! field or a mismatched type rather than a generic decode failure.

use serde_json::{Map, Value};

use crate::error::ResponseError;

/// What the model proposes to run for a question.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryPlan {
    pub sql: Vec<String>,
    pub rationale: String,
    pub valid: bool,
}

impl QueryPlan {
    pub fn parse(raw: &str) -> Result<Self, ResponseError> {
        let object = parse_object(raw)?;

        let sql = match field(&object, "sql")? {
            Value::String(statement) => vec![statement.clone()],
            Value::Array(items) => items
                .iter()
                .map(|item| item.as_str().map(str::to_string))
                .collect::<Option<Vec<_>>>()
                .ok_or(ResponseError::SchemaMismatch {
                    field: "sql",
                    expected: "an array of strings",
                })?,
            _ => {
                return Err(ResponseError::SchemaMismatch {
                    field: "sql",
                    expected: "an array of strings",
                })
            }
        };

        let rationale = field(&object, "rationale")?
            .as_str()
            .ok_or(ResponseError::SchemaMismatch {
                field: "rationale",
                expected: "a string",
            })?
            .to_string();

        let valid = match field(&object, "valid")? {
            Value::Bool(flag) => *flag,
            Value::Number(n) => n.as_f64() == Some(1.0),
            _ => {
                return Err(ResponseError::SchemaMismatch {
                    field: "valid",
                    expected: "0 or 1",
                })
            }
        };

        if valid && sql.is_empty() {
            return Err(ResponseError::SchemaMismatch {
                field: "sql",
                expected: "a non-empty array",
            });
        }

        Ok(Self {
            sql,
            rationale,
            valid,
        })
    }

    /// The only statement that gets executed. Later statements are ignored.
    pub fn first_statement(&self) -> Option<&str> {
        self.sql.first().map(String::as_str)
    }
}

/// Bar chart parameters produced by the second model call.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSpec {
    pub labels: Vec<String>,
    pub data: Vec<f64>,
    pub xlabel: String,
    pub ylabel: String,
    pub title: String,
}

impl ChartSpec {
    pub fn parse(raw: &str) -> Result<Self, ResponseError> {
        let object = parse_object(raw)?;

        let labels = string_list(field(&object, "labels")?).ok_or(ResponseError::SchemaMismatch {
            field: "labels",
            expected: "an array of strings",
        })?;

        let data = number_list(field(&object, "data")?).ok_or(ResponseError::SchemaMismatch {
            field: "data",
            expected: "an array of numbers",
        })?;

        if labels.len() != data.len() {
            return Err(ResponseError::SchemaMismatch {
                field: "data",
                expected: "one value per label",
            });
        }

        Ok(Self {
            labels,
            data,
            xlabel: text(&object, "xlabel")?,
            ylabel: text(&object, "ylabel")?,
            title: text(&object, "title")?,
        })
    }
}

fn parse_object(raw: &str) -> Result<Map<String, Value>, ResponseError> {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(object)) => Ok(object),
        Ok(other) => Err(ResponseError::ParseFailure(format!(
            "expected an object, got {other}"
        ))),
        Err(e) => Err(ResponseError::ParseFailure(e.to_string())),
    }
}

fn field<'a>(object: &'a Map<String, Value>, name: &'static str) -> Result<&'a Value, ResponseError> {
    object.get(name).ok_or(ResponseError::MissingField(name))
}

fn text(object: &Map<String, Value>, name: &'static str) -> Result<String, ResponseError> {
    field(object, name)?
        .as_str()
        .map(str::to_string)
        .ok_or(ResponseError::SchemaMismatch {
            field: name,
            expected: "a string",
        })
}

fn string_list(value: &Value) -> Option<Vec<String>> {
    value
        .as_array()?
        .iter()
        .map(|item| match item {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
        .collect()
}

fn number_list(value: &Value) -> Option<Vec<f64>> {
    value
        .as_array()?
        .iter()
        .map(|item| match item {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_valid_plan() {
        let plan = QueryPlan::parse(
            r#"{"sql": ["SELECT COUNT(*) FROM employees;"], "rationale": "Count rows.", "valid": 1}"#,
        )
        .unwrap();

        assert!(plan.valid);
        assert_eq!(plan.rationale, "Count rows.");
        assert_eq!(plan.first_statement(), Some("SELECT COUNT(*) FROM employees;"));
    }

    #[test]
    fn only_one_counts_as_valid() {
        let plan = QueryPlan::parse(r#"{"sql": [], "rationale": "No such data.", "valid": 0}"#).unwrap();
        assert!(!plan.valid);

        let plan = QueryPlan::parse(r#"{"sql": ["SELECT 1"], "rationale": "", "valid": 2}"#).unwrap();
        assert!(!plan.valid);

        let plan = QueryPlan::parse(r#"{"sql": ["SELECT 1"], "rationale": "", "valid": true}"#).unwrap();
        assert!(plan.valid);
    }

    #[test]
    fn bare_string_sql_becomes_single_statement() {
        let plan = QueryPlan::parse(r#"{"sql": "SHOW TABLES", "rationale": "List.", "valid": 1}"#).unwrap();
        assert_eq!(plan.sql, vec!["SHOW TABLES".to_string()]);
    }

    #[test]
    fn non_json_is_a_parse_failure() {
        let err = QueryPlan::parse("I think you want SELECT * FROM employees").unwrap_err();
        assert!(matches!(err, ResponseError::ParseFailure(_)));

        let err = QueryPlan::parse("[1, 2]").unwrap_err();
        assert!(matches!(err, ResponseError::ParseFailure(_)));
    }

    #[test]
    fn reports_missing_fields() {
        let err = QueryPlan::parse(r#"{"sql": ["SELECT 1"], "valid": 1}"#).unwrap_err();
        assert!(matches!(err, ResponseError::MissingField("rationale")));

        let err = QueryPlan::parse(r#"{"sql": ["SELECT 1"], "rationale": "x"}"#).unwrap_err();
        assert!(matches!(err, ResponseError::MissingField("valid")));
    }

    #[test]
    fn reports_type_mismatches() {
        let err = QueryPlan::parse(r#"{"sql": [1], "rationale": "x", "valid": 1}"#).unwrap_err();
        assert!(matches!(err, ResponseError::SchemaMismatch { field: "sql", .. }));

        let err = QueryPlan::parse(r#"{"sql": ["SELECT 1"], "rationale": "x", "valid": "1"}"#).unwrap_err();
        assert!(matches!(err, ResponseError::SchemaMismatch { field: "valid", .. }));

        let err = QueryPlan::parse(r#"{"sql": [], "rationale": "x", "valid": 1}"#).unwrap_err();
        assert!(matches!(err, ResponseError::SchemaMismatch { field: "sql", .. }));
    }

    #[test]
    fn parses_chart_with_mixed_values() {
        let chart = ChartSpec::parse(
            r#"{"labels": ["d001", 2], "data": [10, "20.5"], "xlabel": "dept", "ylabel": "count", "title": "Headcount"}"#,
        )
        .unwrap();

        assert_eq!(chart.labels, vec!["d001".to_string(), "2".to_string()]);
        assert_eq!(chart.data, vec![10.0, 20.5]);
        assert_eq!(chart.title, "Headcount");
    }

    #[test]
    fn chart_lengths_must_match() {
        let err = ChartSpec::parse(
            r#"{"labels": ["a", "b"], "data": [1], "xlabel": "", "ylabel": "", "title": ""}"#,
        )
        .unwrap_err();
        assert!(matches!(err, ResponseError::SchemaMismatch { field: "data", .. }));
    }
}
