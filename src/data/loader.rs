use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::error::ValidationError;
use crate::models::Form;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("{path} must contain at least one form")]
    Empty { path: String },

    #[error("Form {form} in {path} is invalid: {source}")]
    Invalid {
        path: String,
        form: String,
        #[source]
        source: ValidationError,
    },
}

/// Load and validate a JSON array of forms.
pub fn load_forms_from_json<P: AsRef<Path>>(path: P) -> Result<Vec<Form>, LoadError> {
    let path = path.as_ref();
    let display = path.display().to_string();

    let json_content = fs::read_to_string(path).map_err(|source| LoadError::Read {
        path: display.clone(),
        source,
    })?;

    parse_forms(&json_content, &display)
}

fn parse_forms(json_content: &str, path: &str) -> Result<Vec<Form>, LoadError> {
    let forms: Vec<Form> = serde_json::from_str(json_content).map_err(|source| LoadError::Parse {
        path: path.to_string(),
        source,
    })?;

    if forms.is_empty() {
        return Err(LoadError::Empty {
            path: path.to_string(),
        });
    }

    for form in &forms {
        form.validate().map_err(|source| LoadError::Invalid {
            path: path.to_string(),
            form: form.id.clone(),
            source,
        })?;
    }

    Ok(forms)
}
