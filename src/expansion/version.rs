use std::fmt;
use std::sync::Arc;

/// Opaque content version token reported by the host.
///
/// Only equality matters: an entry is reused while the token is unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentVersion(Arc<str>);

impl ContentVersion {
    pub fn new(token: impl Into<Arc<str>>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Version derived from the text itself, for hosts that do not track
    /// versions. Equal text always yields an equal version.
    pub fn of_content(text: &str) -> Self {
        Self::new(format!("fnv:{:016x}", fnv1a_hash(text)))
    }

    /// Version qualified by a settings generation. Generation 0 leaves the
    /// token unchanged.
    pub fn with_generation(&self, generation: u64) -> Self {
        if generation == 0 {
            return self.clone();
        }
        Self::new(format!("{}+g{}", self.0, generation))
    }
}

/// FNV-1a 64-bit hash. Fast and non-cryptographic; used only for change
/// detection.
#[inline]
fn fnv1a_hash(text: &str) -> u64 {
    const FNV_OFFSET: u64 = 0xcbf29ce484222325;
    const FNV_PRIME: u64 = 0x100000001b3;

    let mut hash = FNV_OFFSET;
    for byte in text.bytes() {
        hash ^= byte as u64;
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

impl Default for ContentVersion {
    fn default() -> Self {
        Self::new("0")
    }
}

impl fmt::Display for ContentVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ContentVersion {
    fn from(token: &str) -> Self {
        Self::new(token)
    }
}

impl From<String> for ContentVersion {
    fn from(token: String) -> Self {
        Self::new(token)
    }
}

impl From<i32> for ContentVersion {
    fn from(version: i32) -> Self {
        Self::new(version.to_string())
    }
}

impl From<u64> for ContentVersion {
    fn from(version: u64) -> Self {
        Self::new(version.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_version_is_deterministic() {
        let text = "/** @derive(Debug) */ class User {}";
        assert_eq!(ContentVersion::of_content(text), ContentVersion::of_content(text));
        assert_ne!(
            ContentVersion::of_content(text),
            ContentVersion::of_content("class User {}")
        );
    }

    #[test]
    fn fnv1a_hash_of_empty_is_offset_basis() {
        assert_eq!(fnv1a_hash(""), 0xcbf29ce484222325);
    }

    #[test]
    fn generation_qualifies_token() {
        let version = ContentVersion::from(3);
        assert_eq!(version.with_generation(0), version);
        assert_eq!(version.with_generation(2).as_str(), "3+g2");
        assert_ne!(version.with_generation(1), version.with_generation(2));
    }

    #[test]
    fn numeric_versions_display_as_tokens() {
        assert_eq!(ContentVersion::from(7).to_string(), "7");
        assert_eq!(ContentVersion::default().as_str(), "0");
    }
}
