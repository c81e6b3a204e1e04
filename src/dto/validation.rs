//! Validation helpers for DTOs.

use validator::ValidationError;

use crate::dao::models::OPTION_COUNT;

/// Validates that a question carries exactly four non-empty answer options.
pub fn validate_options(options: &[String]) -> Result<(), ValidationError> {
    if options.len() != OPTION_COUNT {
        let mut err = ValidationError::new("options_count");
        err.message = Some(
            format!(
                "a question must have exactly {OPTION_COUNT} options (got {})",
                options.len()
            )
            .into(),
        );
        return Err(err);
    }

    if options.iter().any(|option| option.trim().is_empty()) {
        let mut err = ValidationError::new("options_empty");
        err.message = Some("answer options must not be empty".into());
        return Err(err);
    }

    Ok(())
}

/// Validates that the recorded answer matches one of the options verbatim.
pub fn validate_answer(answer: &str, options: &[String]) -> Result<(), ValidationError> {
    if !options.iter().any(|option| option == answer) {
        let mut err = ValidationError::new("answer_not_an_option");
        err.message = Some("the answer must equal one of the options".into());
        return Err(err);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> Vec<String> {
        vec![
            "Port Royal".into(),
            "Tortuga".into(),
            "Nassau".into(),
            "Havana".into(),
        ]
    }

    #[test]
    fn test_validate_options_valid() {
        assert!(validate_options(&options()).is_ok());
    }

    #[test]
    fn test_validate_options_wrong_count() {
        assert!(validate_options(&options()[..3]).is_err()); // too few
        let mut five = options();
        five.push("Kingston".into());
        assert!(validate_options(&five).is_err()); // too many
        assert!(validate_options(&[]).is_err()); // empty
    }

    #[test]
    fn test_validate_options_blank_entry() {
        let mut opts = options();
        opts[2] = "   ".into();
        assert!(validate_options(&opts).is_err());
    }

    #[test]
    fn test_validate_answer() {
        assert!(validate_answer("Nassau", &options()).is_ok());
        assert!(validate_answer("Kingston", &options()).is_err());
        assert!(validate_answer("nassau", &options()).is_err()); // case sensitive
    }
}
