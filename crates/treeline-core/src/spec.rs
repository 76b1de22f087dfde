//! Package request spec parsing.
//!
//! Accepts the notation used in install requests:
//! - `react`
//! - `react@18.2.0`
//! - `react@^18.0.0`
//! - `@types/node`
//! - `@types/node@^20`

use crate::error::AnalyzeError;

/// A parsed package request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageSpec {
    /// Full package name (`@scope/name` or `name`).
    pub name: String,
    /// Scope without the `@` prefix, if scoped.
    pub scope: Option<String>,
    /// Version descriptor; `None` means the `latest` dist-tag.
    pub descriptor: Option<String>,
}

impl PackageSpec {
    /// Parse a package request string.
    ///
    /// # Errors
    /// Returns `InvalidArguments` for empty input, empty descriptors, and
    /// malformed names.
    pub fn parse(input: &str) -> Result<Self, AnalyzeError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(AnalyzeError::invalid_arguments("empty package spec"));
        }

        // The descriptor delimiter is any '@' past the first character, so
        // scoped names keep their leading '@'
        let delimiter = input
            .char_indices()
            .skip(1)
            .find(|(_, c)| *c == '@')
            .map(|(idx, _)| idx);
        let (name, descriptor) = match delimiter {
            Some(idx) => {
                let (name, rest) = input.split_at(idx);
                let descriptor = &rest[1..];
                if descriptor.is_empty() {
                    return Err(AnalyzeError::invalid_arguments(format!(
                        "empty version descriptor in '{input}'"
                    )));
                }
                (name, Some(descriptor.to_string()))
            }
            None => (input, None),
        };

        let scope = validate_name(name)?;

        Ok(Self {
            name: name.to_string(),
            scope,
            descriptor,
        })
    }

    /// Whether this is a scoped package.
    #[must_use]
    pub fn is_scoped(&self) -> bool {
        self.scope.is_some()
    }

    /// URL-encode the name for registry paths (`@scope/pkg` ->
    /// `@scope%2Fpkg`).
    #[must_use]
    pub fn url_encoded_name(&self) -> String {
        if self.is_scoped() {
            self.name.replace('/', "%2F")
        } else {
            self.name.clone()
        }
    }
}

/// Validate a package name; returns the scope for scoped names.
fn validate_name(name: &str) -> Result<Option<String>, AnalyzeError> {
    if let Some(scoped) = name.strip_prefix('@') {
        let Some((scope, rest)) = scoped.split_once('/') else {
            return Err(AnalyzeError::invalid_arguments(format!(
                "scoped package '{name}' is missing '/'"
            )));
        };
        if scope.is_empty() || rest.is_empty() {
            return Err(AnalyzeError::invalid_arguments(format!(
                "scoped package '{name}' has an empty scope or name"
            )));
        }
        validate_chars(scope, name)?;
        validate_chars(rest, name)?;
        return Ok(Some(scope.to_string()));
    }

    validate_chars(name, name)?;
    Ok(None)
}

fn validate_chars(part: &str, full: &str) -> Result<(), AnalyzeError> {
    for c in part.chars() {
        if !c.is_alphanumeric() && !matches!(c, '-' | '_' | '.') {
            return Err(AnalyzeError::invalid_arguments(format!(
                "invalid character '{c}' in package name '{full}'"
            )));
        }
    }
    Ok(())
}
