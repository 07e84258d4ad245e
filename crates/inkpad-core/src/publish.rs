//! Platform-specific export of a document body.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Lines this long (in characters) or longer are dropped for Toutiao.
pub const TOUTIAO_MAX_LINE: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Markdown,
    Wechat,
    Toutiao,
    Zhihu,
}

impl Platform {
    pub const ALL: [Platform; 4] = [
        Platform::Markdown,
        Platform::Wechat,
        Platform::Toutiao,
        Platform::Zhihu,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Platform::Markdown => "markdown",
            Platform::Wechat => "wechat",
            Platform::Toutiao => "toutiao",
            Platform::Zhihu => "zhihu",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Platform::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                format!(
                    "unknown platform '{}' (expected one of: markdown, wechat, toutiao, zhihu)",
                    s
                )
            })
    }
}

/// Format `body` for pasting into `platform`'s editor.
///
/// Toutiao gets a condensed version without overlong paragraphs; every
/// other platform takes the markdown unchanged.
pub fn export(body: &str, platform: Platform) -> String {
    match platform {
        Platform::Toutiao => body
            .split('\n')
            .filter(|line| line.chars().count() < TOUTIAO_MAX_LINE)
            .collect::<Vec<_>>()
            .join("\n"),
        Platform::Markdown | Platform::Wechat | Platform::Zhihu => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toutiao_drops_long_lines() {
        let long = "长".repeat(200);
        let body = format!("# Title\n{}\nshort", long);
        assert_eq!(export(&body, Platform::Toutiao), "# Title\nshort");
        let almost = "x".repeat(199);
        assert_eq!(export(&almost, Platform::Toutiao), almost);
    }

    #[test]
    fn other_platforms_are_unchanged() {
        let body = format!("a\n{}\n", "y".repeat(500));
        for p in [Platform::Markdown, Platform::Wechat, Platform::Zhihu] {
            assert_eq!(export(&body, p), body);
        }
    }

    #[test]
    fn parses_case_insensitively() {
        assert_eq!("WeChat".parse::<Platform>(), Ok(Platform::Wechat));
        assert!("myspace".parse::<Platform>().is_err());
    }
}
