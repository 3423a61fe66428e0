use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum IndicatorError {
    /// The series is shorter than the rule's lookback. Callers skip the vote
    /// rather than treating it as a Hold.
    #[error("insufficient data: {required} bars required, {available} available")]
    InsufficientData { required: usize, available: usize },
}

/// Fail with `InsufficientData` unless at least `required` bars are present.
pub fn ensure_history(available: usize, required: usize) -> Result<(), IndicatorError> {
    if available < required {
        return Err(IndicatorError::InsufficientData {
            required,
            available,
        });
    }
    Ok(())
}
