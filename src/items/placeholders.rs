// src/items/placeholders.rs

//! `{name}` placeholder expansion for manifest strings.

use std::collections::HashMap;

use crate::errors::{JobdagError, Result};

/// Values available to manifest templates. `{{` and `}}` produce literal
/// braces.
#[derive(Debug, Clone, Default)]
pub struct Placeholders {
    values: HashMap<&'static str, String>,
}

impl Placeholders {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.values.insert(key, value.into());
        self
    }

    pub fn expand(&self, template: &str) -> Result<String> {
        let mut out = String::with_capacity(template.len());
        let mut chars = template.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '{' if chars.peek() == Some(&'{') => {
                    chars.next();
                    out.push('{');
                }
                '}' if chars.peek() == Some(&'}') => {
                    chars.next();
                    out.push('}');
                }
                '{' => {
                    let mut key = String::new();
                    let mut closed = false;
                    for k in chars.by_ref() {
                        if k == '}' {
                            closed = true;
                            break;
                        }
                        key.push(k);
                    }
                    if !closed {
                        return Err(JobdagError::ConfigError(format!(
                            "unterminated placeholder in '{template}'"
                        )));
                    }
                    let value = self.values.get(key.trim()).ok_or_else(|| {
                        JobdagError::ConfigError(format!(
                            "unknown placeholder '{{{key}}}' in '{template}'"
                        ))
                    })?;
                    out.push_str(value);
                }
                other => out.push(other),
            }
        }

        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars() -> Placeholders {
        Placeholders::new()
            .set("output", "fig2/output")
            .set("cores", "8")
    }

    #[test]
    fn expands_known_placeholders() {
        let s = vars().expand("run -c {cores} > {output}/x.json").unwrap();
        assert_eq!(s, "run -c 8 > fig2/output/x.json");
    }

    #[test]
    fn doubled_braces_are_literal() {
        let s = vars().expand("awk '{{print $1}}' {output}/a").unwrap();
        assert_eq!(s, "awk '{print $1}' fig2/output/a");
    }

    #[test]
    fn unknown_and_unterminated_placeholders_fail() {
        assert!(matches!(
            vars().expand("{nope}"),
            Err(JobdagError::ConfigError(msg)) if msg.contains("nope")
        ));
        assert!(vars().expand("echo {output").is_err());
    }
}
