//! `%s` URL templates, kept compatible with `PRISMA_CLI_URL` and
//! `PRISMA_ENGINE_URL` values written for printf-style substitution.

use crate::error::ValidationError;

const PLACEHOLDER: &str = "%s";

/// Checks that `template` holds exactly `expected` placeholders.
pub(crate) fn validate(
    name: &'static str,
    template: &str,
    expected: usize,
) -> Result<(), ValidationError> {
    let found = template.matches(PLACEHOLDER).count();
    if found == expected {
        Ok(())
    } else {
        Err(ValidationError::TemplatePlaceholders {
            name,
            template: template.to_owned(),
            expected,
            found,
        })
    }
}

/// Substitutes `values` into the placeholders of `template`, left to right.
///
/// Callers validate the placeholder count up front; surplus placeholders are
/// left untouched and surplus values are ignored.
pub(crate) fn fill(template: &str, values: &[&str]) -> String {
    let mut out = String::with_capacity(template.len() + values.iter().map(|v| v.len()).sum::<usize>());
    let mut pieces = template.split(PLACEHOLDER);
    if let Some(head) = pieces.next() {
        out.push_str(head);
    }
    let mut values = values.iter();
    for piece in pieces {
        match values.next() {
            Some(value) => out.push_str(value),
            None => out.push_str(PLACEHOLDER),
        }
        out.push_str(piece);
    }
    out
}
