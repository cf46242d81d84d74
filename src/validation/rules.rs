/// Rejects values made only of whitespace.
pub fn not_blank(value: &str, _context: &()) -> garde::Result {
    if value.trim().is_empty() {
        return Err(garde::Error::new("must not be blank"));
    }
    Ok(())
}

/// `not_blank` for optional fields. Absent values pass.
pub fn not_blank_if_present(value: &Option<String>, context: &()) -> garde::Result {
    match value {
        Some(value) => not_blank(value, context),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_values_are_rejected() {
        assert!(not_blank("", &()).is_err());
        assert!(not_blank("  \t", &()).is_err());
        assert!(not_blank("admins", &()).is_ok());
        assert!(not_blank_if_present(&None, &()).is_ok());
        assert!(not_blank_if_present(&Some(" ".to_string()), &()).is_err());
    }
}
