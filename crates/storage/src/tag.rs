use crate::error::{Error, ErrorKind};
use derive_more::Display;
use std::str::FromStr;

/// User-assigned label on an [`Item`](crate::Item).
///
/// Surrounding whitespace is trimmed on construction; the remaining text must
/// be non-empty and at most [`Tag::MAX_LENGTH`] characters.
#[derive(Debug, Display, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Tag(String);

impl Tag {
    pub const MAX_LENGTH: usize = 128;

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Tag {
    type Error = Error;
    fn try_from(value: String) -> Result<Self, Self::Error> {
        let trimmed = value.trim();
        if trimmed.is_empty() || trimmed.chars().count() > Self::MAX_LENGTH {
            exn::bail!(ErrorKind::InvalidTag(value));
        }
        Ok(Self(trimmed.to_string()))
    }
}
impl TryFrom<&str> for Tag {
    type Error = Error;
    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::try_from(value.to_string())
    }
}
impl FromStr for Tag {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::try_from(s)
    }
}
impl AsRef<str> for Tag {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("fantasy", "fantasy")]
    #[case("  to-read ", "to-read")]
    #[case("science fiction", "science fiction")]
    #[case("книги", "книги")]
    fn test_valid_tags(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(Tag::try_from(input).unwrap().as_str(), expected);
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    #[case("\t\n")]
    fn test_empty_tags_rejected(#[case] input: &str) {
        let err = Tag::try_from(input).unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidTag(_)));
    }

    #[test]
    fn test_length_is_counted_in_characters() {
        // 128 two-byte characters is 256 bytes, but still a valid tag.
        let max = "é".repeat(Tag::MAX_LENGTH);
        assert!(Tag::try_from(max.as_str()).is_ok());
        let over = "a".repeat(Tag::MAX_LENGTH + 1);
        assert!(Tag::try_from(over.as_str()).is_err());
    }

    #[test]
    fn test_ordering_is_lexicographic() {
        let mut tags = vec![Tag::try_from("b").unwrap(), Tag::try_from("a").unwrap()];
        tags.sort();
        assert_eq!(tags[0].as_str(), "a");
    }
}
