use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Deserializer};

static TOML_REGEX: OnceLock<Regex> = OnceLock::new();

fn toml_regex() -> &'static Regex {
    &TOML_REGEX.get_or_init(|| {
        let pattern = r"^[[:space:]]*\+\+\+(\r?\n(?s).*?(?-s))\+\+\+[[:space:]]*(?:$|(?:\r?\n((?s).*(?-s))$))";
        Regex::new(pattern).expect("failed to compile regex for TOML front matter")
    })
}

/// Splits a document into its TOML front matter and the content that follows.
///
/// Returns `None` when the document has no front matter block at all.
pub fn parse_front_matter<'a, T>(content: &'a str) -> Result<Option<(T, &'a str)>, toml::de::Error>
where
    T: serde::de::DeserializeOwned,
{
    let Some(captures) = toml_regex().captures(content) else {
        return Ok(None);
    };

    let front_matter = captures.get(1).map_or("", |m| m.as_str());
    let content = captures.get(2).map_or("", |m| m.as_str());

    Ok(Some((toml::from_str(front_matter)?, content)))
}

pub fn from_toml_datetime<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;
    use std::str::FromStr;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum DatetimeOrString {
        Datetime(toml::value::Datetime),
        String(String),
    }

    match DatetimeOrString::deserialize(deserializer)? {
        DatetimeOrString::Datetime(datetime) => Ok(Some(datetime.to_string())),
        DatetimeOrString::String(string) => match toml::value::Datetime::from_str(&string) {
            Ok(datetime) => Ok(Some(datetime.to_string())),
            Err(err) => Err(D::Error::custom(err)),
        },
    }
}

#[cfg(test)]
mod tests {
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    use super::*;

    #[derive(Debug, Deserialize)]
    struct TestFrontMatter {
        title: Option<String>,
        #[serde(default, deserialize_with = "from_toml_datetime")]
        date: Option<String>,
    }

    #[test]
    fn test_parse_front_matter() {
        let document = indoc! {r#"
            +++
            title = "Hello, world!"
            date = 2024-01-02
            +++

            Some content.
        "#};

        let (front_matter, content) =
            parse_front_matter::<TestFrontMatter>(document).unwrap().unwrap();

        assert_eq!(front_matter.title.as_deref(), Some("Hello, world!"));
        assert_eq!(front_matter.date.as_deref(), Some("2024-01-02"));
        assert_eq!(content.trim(), "Some content.");
    }

    #[test]
    fn test_parse_front_matter_without_a_block() {
        let result = parse_front_matter::<TestFrontMatter>("Just some content.").unwrap();

        assert!(result.is_none());
    }

    #[test]
    fn test_parse_front_matter_with_invalid_toml() {
        let document = indoc! {r#"
            +++
            title = not quoted
            +++
        "#};

        assert!(parse_front_matter::<TestFrontMatter>(document).is_err());
    }
}
