use thiserror::Error;

/// Failures raised by the forward and reverse transforms.
#[derive(Debug, Error)]
pub enum TransformError {
    /// A dynamic type import did not match the accepted
    /// `import("M").a["b"]…` grammar.
    #[error("invalid dynamic import expression: {0}")]
    InvalidDynamicImport(String),

    /// The input did not parse as the expected module kind.
    #[error("failed to parse {context}: {message}")]
    Parse {
        context: &'static str,
        message: String,
    },
}
