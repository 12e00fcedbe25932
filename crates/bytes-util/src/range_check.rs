//! Bounds checks for decoded syntax elements.

/// Checks that a decoded value lies in the inclusive range \[LOWER, UPPER\].
///
/// Evaluates to an [`std::io::Result<()>`] whose error is
/// [`std::io::ErrorKind::InvalidData`] and names the offending expression, so
/// it composes with `?` right after the read:
///
/// ```rust
/// # fn parse(value: u32) -> std::io::Result<()> {
/// bytes_util::range_check!(value, 0, 31)?;
/// # Ok(())
/// # }
/// assert!(parse(3).is_ok());
/// assert!(parse(32).is_err());
/// ```
#[macro_export]
macro_rules! range_check {
    ($n:expr, $lower:expr, $upper:expr) => {{
        let n = $n;

        #[allow(unused_comparisons, clippy::manual_range_contains)]
        if n < $lower || n > $upper {
            ::std::result::Result::Err(::std::io::Error::new(
                ::std::io::ErrorKind::InvalidData,
                format!("{} is out of range [{}, {}]: {}", stringify!($n), $lower, $upper, n),
            ))
        } else {
            ::std::result::Result::Ok(())
        }
    }};
}
