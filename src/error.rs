use crate::{
    lensing::sie::{LookupError, SieTableError},
    params::DomainError,
    special::SpecialFunctionError,
};

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("invalid physical parameters: {0}")]
    Domain(#[from] DomainError),
    #[error("special function evaluation failed: {0}")]
    Special(#[from] SpecialFunctionError),
    #[error("SIE amplification lookup failed: {0}")]
    Lookup(#[from] LookupError),
    #[error("failed to load the SIE table: {0}")]
    SieTable(#[from] SieTableError),
    #[error("optimizer failed: {0}")]
    Optimizer(String),
    #[error("failed to write the sweep results: {0}")]
    Csv(#[from] csv::Error),
    #[error("failed to write the sweep results: {0}")]
    Io(#[from] std::io::Error),
}
impl Error {
    /// Recovers a crate error passed through the argmin cost function
    pub(crate) fn from_argmin(err: argmin::core::Error) -> Self {
        match err.downcast::<Error>() {
            Ok(err) => err,
            Err(err) => Error::Optimizer(err.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lensing::sie::LookupError;

    #[test]
    fn messages_carry_their_cause() {
        let err = Error::from(LookupError::Miss { radius: 0.37 });
        let message = err.to_string();
        assert!(message.starts_with("SIE amplification lookup failed: "));
        assert!(message.contains("0.37"), "{message}");
        let err = Error::from(DomainError::LensMass(-1f64));
        assert!(err.to_string().contains("-1"), "{err}");
    }
}
