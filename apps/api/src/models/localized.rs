use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// UI language. The upstream backend localizes suggestion scoring and detail
/// records per language, so every fetch is keyed by one of these.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lang {
    #[default]
    Fi,
    Sv,
    En,
}

impl Lang {
    pub const ALL: [Lang; 3] = [Lang::Fi, Lang::Sv, Lang::En];

    pub fn as_str(&self) -> &'static str {
        match self {
            Lang::Fi => "fi",
            Lang::Sv => "sv",
            Lang::En => "en",
        }
    }
}

impl fmt::Display for Lang {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Lang {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fi" => Ok(Lang::Fi),
            "sv" => Ok(Lang::Sv),
            "en" => Ok(Lang::En),
            other => Err(format!("unsupported language '{other}'")),
        }
    }
}

/// A text value carried in all supported languages at once.
/// Falls back to Finnish, then to any present translation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocalizedText(pub HashMap<Lang, String>);

impl LocalizedText {
    pub fn get(&self, lang: Lang) -> Option<&str> {
        self.0
            .get(&lang)
            .or_else(|| self.0.get(&Lang::Fi))
            .or_else(|| Lang::ALL.iter().find_map(|l| self.0.get(l)))
            .map(String::as_str)
    }

    pub fn from_fi(text: impl Into<String>) -> Self {
        let mut map = HashMap::new();
        map.insert(Lang::Fi, text.into());
        Self(map)
    }
}
