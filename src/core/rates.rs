use serde::{Deserialize, Deserializer, Serialize};

/// Assumed annual rate for escalating plans, independent of any category.
pub const ESCALATING_ANNUAL_RATE: f64 = 0.15;

/// Assumed annual rate for freeform plans, independent of any category.
pub const FREEFORM_ANNUAL_RATE: f64 = 0.12;

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    LargeCap,
    #[default]
    MidCap,
    SmallCap,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::LargeCap, Category::MidCap, Category::SmallCap];

    /// Resolves a user-supplied category key. Anything unrecognised lands on
    /// the default arm (`MidCap`).
    pub fn from_key(key: &str) -> Self {
        let normalized = key
            .trim()
            .to_ascii_lowercase()
            .replace(['_', ' '], "-");
        match normalized.as_str() {
            "large-cap" | "largecap" | "large" => Category::LargeCap,
            "mid-cap" | "midcap" | "mid" => Category::MidCap,
            "small-cap" | "smallcap" | "small" => Category::SmallCap,
            _ => Category::default(),
        }
    }

    pub fn annual_rate(self) -> f64 {
        match self {
            Category::LargeCap => 0.10,
            Category::MidCap => 0.12,
            Category::SmallCap => 0.15,
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            Category::LargeCap => "large-cap",
            Category::MidCap => "mid-cap",
            Category::SmallCap => "small-cap",
        }
    }
}

impl<'de> Deserialize<'de> for Category {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let key = String::deserialize(deserializer)?;
        Ok(Category::from_key(&key))
    }
}

pub fn rate_for(category: Category) -> f64 {
    category.annual_rate()
}
