use serde_json::{json, Value};

use crate::cli::client::ApiFailure;
use crate::cli::OutputFormat;

/// Output a success message in the appropriate format
pub fn output_success(output_format: &OutputFormat, message: &str, data: Option<&Value>) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = json!({
                "success": true,
                "message": message
            });
            if let Some(data) = data {
                response["data"] = data.clone();
            }
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            println!("✓ {}", message);
        }
    }
    Ok(())
}

/// Output an error in the appropriate format, including per-field messages
pub fn output_error(output_format: &OutputFormat, error: &anyhow::Error) -> anyhow::Result<()> {
    let failure = error.downcast_ref::<ApiFailure>();
    match output_format {
        OutputFormat::Json => {
            let mut response = json!({
                "success": false,
                "error": error.to_string()
            });
            if let Some(failure) = failure {
                response["status"] = json!(failure.status);
                if let Some(code) = &failure.code {
                    response["code"] = json!(code);
                }
                if !failure.field_errors.is_empty() {
                    response["field_errors"] = json!(failure.field_errors);
                }
                if let Some(secs) = failure.retry_after {
                    response["retry_after"] = json!(secs);
                }
            }
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            eprintln!("Error: {}", error);
            if let Some(failure) = failure {
                for (field, message) in &failure.field_errors {
                    eprintln!("  {}: {}", field, message);
                }
                if let Some(secs) = failure.retry_after {
                    eprintln!("  retry in {}s", secs);
                }
            }
        }
    }
    Ok(())
}

/// Print raw data as JSON, or key/value lines in text mode
pub fn output_record(output_format: &OutputFormat, data: &Value) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(data)?),
        OutputFormat::Text => {
            if let Some(obj) = data.as_object() {
                for (key, value) in obj {
                    println!("{:<20} {}", format!("{}:", key), display_value(value));
                }
            } else {
                println!("{}", display_value(data));
            }
        }
    }
    Ok(())
}

/// One line per note in text mode
pub fn output_notes(output_format: &OutputFormat, notes: &Value) -> anyhow::Result<()> {
    let list = notes.as_array().cloned().unwrap_or_default();
    match output_format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&json!({ "notes": list }))?),
        OutputFormat::Text => {
            if list.is_empty() {
                println!("No notes found");
                return Ok(());
            }
            for note in &list {
                println!("{}", note_line(note));
            }
            println!("{} note(s)", list.len());
        }
    }
    Ok(())
}

pub fn note_line(note: &Value) -> String {
    let pin = if note["isPinned"].as_bool().unwrap_or(false) { "*" } else { " " };
    let category = note["category"].as_str().map(|c| format!(" [{}]", c)).unwrap_or_default();
    format!(
        "{}{:>6}  {}{}",
        pin,
        note["id"].as_i64().unwrap_or_default(),
        note["title"].as_str().unwrap_or_default(),
        category
    )
}

pub fn display_value(value: &Value) -> String {
    match value {
        Value::Null => "-".to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Password from the flag, the environment, or an interactive prompt
pub fn resolve_password(password: Option<String>) -> anyhow::Result<String> {
    if let Some(password) = password {
        return Ok(password);
    }
    if let Ok(password) = std::env::var("MINI_NOTES_PASSWORD") {
        return Ok(password);
    }
    eprint!("Password: ");
    let mut line = String::new();
    std::io::stdin().read_line(&mut line)?;
    let password = line.trim_end_matches(['\r', '\n']).to_string();
    if password.is_empty() {
        anyhow::bail!("a password is required");
    }
    Ok(password)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn note_line_marks_pins_and_categories() {
        let note = json!({"id": 12, "title": "Groceries", "category": "Home", "isPinned": true});
        assert_eq!(note_line(&note), "*    12  Groceries [Home]");

        let note = json!({"id": 3, "title": "Loose", "category": null, "isPinned": false});
        assert_eq!(note_line(&note), "      3  Loose");
    }

    #[test]
    fn display_value_renders_nulls_as_dash() {
        assert_eq!(display_value(&Value::Null), "-");
        assert_eq!(display_value(&json!("x")), "x");
        assert_eq!(display_value(&json!(4)), "4");
    }

    #[test]
    fn explicit_password_wins() {
        assert_eq!(resolve_password(Some("hunter22".into())).unwrap(), "hunter22");
    }
}
