pub type Result<T> = std::result::Result<T, crate::error::Error>;

/// Verifies a dimension predicate for the named store path, failing with a
/// `Dimension` error when it does not hold.
#[macro_export]
macro_rules! verify_dim {
    ($path:expr, $expr:expr) => {{
        let result = $expr;
        $crate::result::verify_dim(result, &$path)?;
    }};
}

#[inline]
pub fn verify_dim(predicate: bool, path: &str) -> Result<()> {
    if predicate {
        Ok(())
    } else {
        dimension_error(path)
    }
}

#[cold]
fn dimension_error(path: &str) -> Result<()> {
    Err(crate::error::Error::dimension(path))
}
