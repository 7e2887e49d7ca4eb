//! `${VAR}` and `${VAR:-default}` expansion for configuration strings.

use crate::ConfigError;

/// Expand environment variable references in `value`.
///
/// Only the braced forms are recognized; a string without `${` is returned
/// unchanged, so bare `$` in paths survives.
pub(crate) fn expand_env(value: &str, field: &str) -> Result<String, ConfigError> {
    if !value.contains("${") {
        return Ok(value.to_owned());
    }

    shellexpand::env_with_context(value, |var| std::env::var(var).map(Some))
        .map(std::borrow::Cow::into_owned)
        .map_err(|e| ConfigError::EnvVar {
            field: field.to_owned(),
            message: format!("${{{}}} not set", e.var_name),
        })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_expand_var() {
        // SAFETY: variable name is unique to this test
        unsafe {
            std::env::set_var("GLOSS_TEST_TERMS_DIR", "/srv/terms");
        }
        let result = expand_env("${GLOSS_TEST_TERMS_DIR}/site.yaml", "terms.file").unwrap();
        assert_eq!(result, "/srv/terms/site.yaml");
        unsafe {
            std::env::remove_var("GLOSS_TEST_TERMS_DIR");
        }
    }

    #[test]
    fn test_expand_default() {
        // SAFETY: variable name is unique to this test
        unsafe {
            std::env::remove_var("GLOSS_TEST_UNSET_TEMPLATES");
        }
        let result = expand_env("${GLOSS_TEST_UNSET_TEMPLATES:-templates}", "wrap.templates_dir")
            .unwrap();
        assert_eq!(result, "templates");
    }

    #[test]
    fn test_expand_missing_var() {
        // SAFETY: variable name is unique to this test
        unsafe {
            std::env::remove_var("GLOSS_TEST_MISSING");
        }
        let err = expand_env("${GLOSS_TEST_MISSING}", "terms.file").unwrap_err();

        assert!(matches!(err, ConfigError::EnvVar { .. }));
        assert_eq!(
            err.to_string(),
            "Environment variable error in terms.file: ${GLOSS_TEST_MISSING} not set"
        );
    }

    #[test]
    fn test_literal_unchanged() {
        assert_eq!(expand_env("terms.yaml", "terms.file").unwrap(), "terms.yaml");
        assert_eq!(expand_env("cost$/terms.yaml", "terms.file").unwrap(), "cost$/terms.yaml");
    }
}
