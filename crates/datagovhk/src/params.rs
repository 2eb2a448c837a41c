//! Tool argument acquisition for `datagovhk call`.
//!
//! `--params` names a JSON file if one exists at that path, otherwise it is
//! inline JSON. Without `--params`, piped stdin is read instead.

use std::io::{IsTerminal, Read};
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde_json::{Map, Value};

/// Resolve the tool arguments from `--params` or stdin.
pub fn acquire(raw: Option<&str>) -> Result<Map<String, Value>> {
    match raw {
        Some(raw) => from_argument(raw),
        None => {
            let stdin = std::io::stdin();
            if stdin.is_terminal() {
                return Ok(Map::new());
            }
            let mut input = String::new();
            stdin
                .lock()
                .read_to_string(&mut input)
                .context("failed to read parameters from stdin")?;
            from_stdin(&input)
        }
    }
}

/// Interpret a `--params` value.
pub fn from_argument(raw: &str) -> Result<Map<String, Value>> {
    let path = Path::new(raw);
    if path.is_file() {
        tracing::info!(path = %path.display(), "reading parameters from file");
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read parameters file {}", path.display()))?;
        let value = serde_json::from_str(&text)
            .with_context(|| format!("invalid JSON in parameters file {}", path.display()))?;
        return into_object(value);
    }

    // Shells sometimes hand the JSON over still quoted and escaped.
    let cleaned = raw
        .trim_matches(|c| c == '"' || c == '\'')
        .replace("\\\"", "\"");
    tracing::debug!(params = %cleaned, "inline parameters");
    let value = serde_json::from_str(&cleaned)
        .with_context(|| format!("invalid JSON for --params: {}", raw))?;
    into_object(value)
}

/// Interpret piped stdin; blank input means no arguments.
pub fn from_stdin(input: &str) -> Result<Map<String, Value>> {
    let input = input.trim();
    if input.is_empty() {
        return Ok(Map::new());
    }
    tracing::info!("using parameters from stdin");
    let value = serde_json::from_str(input).context("invalid JSON on stdin")?;
    into_object(value)
}

fn into_object(value: Value) -> Result<Map<String, Value>> {
    match value {
        Value::Object(map) => Ok(map),
        other => bail!("tool parameters must be a JSON object, got {}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    #[test]
    fn test_inline_json() {
        let params = from_argument(r#"{"category": "finance", "page": 2}"#).unwrap();
        assert_eq!(Value::Object(params), json!({"category": "finance", "page": 2}));
    }

    #[test]
    fn test_inline_json_quoted_and_escaped() {
        let params = from_argument(r#"'{\"language\": \"tc\"}'"#).unwrap();
        assert_eq!(params["language"], "tc");

        let params = from_argument(r#""{\"package_id\": \"x\"}""#).unwrap();
        assert_eq!(params["package_id"], "x");
    }

    #[test]
    fn test_file_takes_precedence() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"package_id": "from-file"}}"#).unwrap();

        let params = from_argument(file.path().to_str().unwrap()).unwrap();
        assert_eq!(params["package_id"], "from-file");
    }

    #[test]
    fn test_invalid_json_file_is_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();

        let err = from_argument(file.path().to_str().unwrap()).unwrap_err();
        assert!(err.to_string().contains("invalid JSON in parameters file"));
    }

    #[test]
    fn test_invalid_inline_json_is_error() {
        let err = from_argument("{category: finance}").unwrap_err();
        assert!(err.to_string().contains("invalid JSON for --params"));
    }

    #[test]
    fn test_non_object_rejected() {
        assert!(from_argument("[1, 2]").is_err());
        assert!(from_stdin("42").is_err());
    }

    #[test]
    fn test_blank_stdin_is_empty_object() {
        assert!(from_stdin("").unwrap().is_empty());
        assert!(from_stdin("  \n").unwrap().is_empty());
    }

    #[test]
    fn test_stdin_json() {
        let params = from_stdin("{\"category\": \"health\"}\n").unwrap();
        assert_eq!(params["category"], "health");
    }
}
