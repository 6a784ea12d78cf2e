use thiserror::Error;

/// The error type shared by all varray crates.
///
/// Wraps a boxed [`ErrorKind`] to keep `Result<T>` small on the happy path.
#[derive(Debug, Error)]
#[error(transparent)]
pub struct Error(Box<ErrorKind>);

impl Error {
    pub fn kind(&self) -> &ErrorKind {
        self.0.as_ref()
    }

    pub fn into_kind(self) -> ErrorKind {
        *self.0
    }

    /// A field's on-disk shape does not match its declared shape class, or a
    /// selection mask's length does not match the axis it selects over.
    pub fn dimension(path: impl Into<String>) -> Error {
        Error(ErrorKind::Dimension { path: path.into() }.into())
    }

    /// A shape class that mandates an auxiliary run-length index found none.
    pub fn missing_index(path: impl Into<String>) -> Error {
        Error(ErrorKind::MissingIndex { path: path.into() }.into())
    }

    /// A requested field path does not resolve in the store.
    pub fn not_found(path: impl Into<String>) -> Error {
        Error(ErrorKind::NotFound { path: path.into() }.into())
    }

    /// A field name does not match any recognized field family.
    pub fn invalid_field_name(name: impl Into<String>) -> Error {
        Error(ErrorKind::InvalidFieldName { name: name.into() }.into())
    }

    /// Zero variants selected when at least one field extraction is requested.
    pub fn empty_selection() -> Error {
        Error(ErrorKind::EmptySelection.into())
    }

    pub fn invalid_configuration(
        value: impl Into<String>,
        message: impl Into<String>,
    ) -> Error {
        Error(
            ErrorKind::InvalidConfiguration {
                value: value.into(),
                message: message.into(),
            }
            .into(),
        )
    }
}

#[derive(Debug, Error)]
pub enum ErrorKind {
    #[error("invalid dimension of '{path}'")]
    Dimension { path: String },

    #[error("auxiliary run-length index of '{path}' is missing")]
    MissingIndex { path: String },

    #[error("'{path}' does not exist in the store")]
    NotFound { path: String },

    #[error(
        "'{name}' is not a recognized field name; recognized forms are: \
         variant.id, sample.id, position, chromosome, allele, annotation/id, \
         annotation/qual, annotation/filter, genotype, phase, \
         annotation/info/NAME, annotation/format/NAME"
    )]
    InvalidFieldName { name: String },

    #[error("there is no selected variant")]
    EmptySelection,

    #[error("invalid configuration '{value}': {message}")]
    InvalidConfiguration { value: String, message: String },
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Error(kind.into())
    }
}
