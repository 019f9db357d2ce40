use std::fmt;

/// A value that must never show up in logs. Both `Display` and `Debug` print a redaction marker.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Secret<T>(T);

const REDACTED: &str = "****";

impl<T> Secret<T> {
    pub fn new(value: T) -> Self {
        Self(value)
    }

    pub fn reveal(&self) -> &T {
        &self.0
    }
}

impl<T> fmt::Debug for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Secret").field(&format_args!("{REDACTED}")).finish()
    }
}

impl<T> fmt::Display for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(REDACTED)
    }
}
