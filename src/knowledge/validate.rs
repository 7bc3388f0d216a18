/// Lines examined before a file is considered validated.
pub const MAX_VALIDATED_LINES: usize = 20;
/// Errors accumulated before validation stops early.
pub const MAX_VALIDATION_ERRORS: usize = 5;

/// Why an uploaded JSONL file was refused. `line_number` and `snippet`
/// point at the first offending line so the admin can fix the file without
/// re-uploading blindly.
#[derive(Debug)]
pub struct JsonlRejection {
    pub line_number: usize,
    pub snippet: String,
    pub errors: Vec<String>,
}

/// Strict admit/reject gate run before a JSONL asset enters the corpus.
///
/// Examines up to [`MAX_VALIDATED_LINES`] non-blank, non-comment lines;
/// each must parse to a JSON object carrying `input_prompt` and
/// `generated_code`. Any offending line rejects the whole file — unlike
/// sampling, which would just skip it. Returns the number of validated
/// lines on acceptance.
pub fn validate_jsonl(raw: &[u8]) -> Result<usize, JsonlRejection> {
    let text = String::from_utf8_lossy(super::strip_bom(raw));

    let mut considered = 0;
    let mut errors: Vec<String> = Vec::new();
    let mut first_error: Option<(usize, String)> = None;

    for (idx, line) in text.lines().enumerate() {
        let line_number = idx + 1;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        if considered == MAX_VALIDATED_LINES {
            break;
        }
        considered += 1;

        let problem = match serde_json::from_str::<serde_json::Value>(trimmed) {
            Err(e) => Some(format!("invalid JSON: {e}")),
            Ok(serde_json::Value::Object(map)) => {
                if !map.contains_key("input_prompt") {
                    Some("missing required field 'input_prompt'".to_string())
                } else if !map.contains_key("generated_code") {
                    Some("missing required field 'generated_code'".to_string())
                } else {
                    None
                }
            }
            Ok(_) => Some("expected a JSON object".to_string()),
        };

        if let Some(problem) = problem {
            if first_error.is_none() {
                first_error = Some((line_number, super::snippet(trimmed)));
            }
            errors.push(format!("line {line_number}: {problem}"));
            if errors.len() == MAX_VALIDATION_ERRORS {
                break;
            }
        }
    }

    if let Some((line_number, snippet)) = first_error {
        return Err(JsonlRejection {
            line_number,
            snippet,
            errors,
        });
    }

    if considered == 0 {
        return Err(JsonlRejection {
            line_number: 0,
            snippet: String::new(),
            errors: vec!["file contains no JSONL records".to_string()],
        });
    }

    Ok(considered)
}
