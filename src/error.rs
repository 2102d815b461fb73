/// Failure category.
///
/// The pipeline driver uses the kind to decide whether a failure aborts the
/// whole run or only excludes the candidate model that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing or malformed input file.
    DataLoad,
    /// Invalid configuration (flags, fractions, ranges).
    Config,
    /// Singular or rank-deficient design matrix for a candidate model.
    Fit,
    /// A required column is absent from a dataset.
    SchemaMismatch,
    /// An evaluation set has zero rows.
    EmptyEvaluationSet,
    /// Not enough usable data to continue (no rows, no fit-able candidate).
    InsufficientData,
    /// Both-direction stepwise selection revisited a predictor set.
    SelectionCycle,
    /// A numeric invariant was broken mid-pipeline.
    Internal,
}

impl ErrorKind {
    /// Process exit code for this kind: 2 = input/config, 3 = data, 4 = internal.
    pub fn exit_code(self) -> u8 {
        match self {
            ErrorKind::DataLoad | ErrorKind::Config | ErrorKind::SchemaMismatch => 2,
            ErrorKind::Fit | ErrorKind::EmptyEvaluationSet | ErrorKind::InsufficientData => 3,
            ErrorKind::SelectionCycle | ErrorKind::Internal => 4,
        }
    }
}

#[derive(Clone)]
pub struct AppError {
    kind: ErrorKind,
    message: String,
}

impl AppError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn data_load(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::DataLoad, message)
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Config, message)
    }

    pub fn fit(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Fit, message)
    }

    pub fn schema_mismatch(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::SchemaMismatch, message)
    }

    pub fn empty_evaluation_set(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::EmptyEvaluationSet, message)
    }

    pub fn insufficient_data(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InsufficientData, message)
    }

    pub fn selection_cycle(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::SelectionCycle, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn exit_code(&self) -> u8 {
        self.kind.exit_code()
    }

    /// Whether the driver may record this failure against one candidate model
    /// and continue with the remaining policies.
    pub fn is_candidate_scoped(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::Fit
                | ErrorKind::SchemaMismatch
                | ErrorKind::EmptyEvaluationSet
                | ErrorKind::SelectionCycle
        )
    }

    /// Prefix the message with identifying context (dataset variant, policy).
    pub fn context(self, prefix: impl AsRef<str>) -> Self {
        Self {
            kind: self.kind,
            message: format!("{}: {}", prefix.as_ref(), self.message),
        }
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("kind", &self.kind)
            .field("exit_code", &self.exit_code())
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_follow_kind() {
        assert_eq!(AppError::data_load("x").exit_code(), 2);
        assert_eq!(AppError::fit("x").exit_code(), 3);
        assert_eq!(AppError::selection_cycle("x").exit_code(), 4);
    }

    #[test]
    fn candidate_scoped_kinds() {
        assert!(AppError::fit("x").is_candidate_scoped());
        assert!(AppError::schema_mismatch("x").is_candidate_scoped());
        assert!(AppError::selection_cycle("x").is_candidate_scoped());
        assert!(!AppError::data_load("x").is_candidate_scoped());
        assert!(!AppError::config("x").is_candidate_scoped());
    }

    #[test]
    fn context_keeps_kind() {
        let err = AppError::fit("singular design matrix").context("baseline/forward");
        assert_eq!(err.kind(), ErrorKind::Fit);
        assert_eq!(err.to_string(), "baseline/forward: singular design matrix");
    }
}
