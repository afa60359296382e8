use thiserror::Error;

pub type Result<T> = std::result::Result<T, GraphError>;

#[derive(Error, Debug)]
pub enum GraphError {
    #[error("Invalid input: {0}")]
    Input(String),

    #[error("Format error: {0}")]
    Format(String),

    #[error("Execution error: {0}")]
    Execution(String),

    #[error("Empty input: {0}")]
    EmptyInput(String),
}

impl GraphError {
    /// Input-validation failures exit with a distinct status.
    pub fn is_input(&self) -> bool {
        matches!(self, GraphError::Input(_))
    }
}
