use serde::{Deserialize, Serialize};

/// Which upstream a listing came from. Tagged once at the ingestion
/// boundary; downstream stages only ever look at this discriminant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Marketplace,
    Classifieds,
}

impl Source {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Source::Marketplace => "marketplace",
            Source::Classifieds => "classifieds",
        }
    }
}

/// A raw listing as returned by one provider, already mapped out of the
/// provider's native JSON shape. Lives only within one aggregation pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Listing {
    pub source: Source,

    /// Provider-native id (marketplace slug, classifieds item id).
    pub id: String,

    pub title: String,

    /// Manufacturer style/SKU code, when the provider supplies one.
    /// Classifieds listings carry free-text titles only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style_code: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    /// Provider-supplied category/type tag, used by the junk filter.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    /// Popularity counter from the provider, used as a ranking proxy.
    #[serde(default)]
    pub demand: u64,
}

impl Listing {
    pub fn new(source: Source, id: impl Into<String>, title: impl Into<String>) -> Self {
        Listing {
            source,
            id: id.into(),
            title: title.into(),
            style_code: None,
            price: None,
            url: None,
            image: None,
            category: None,
            demand: 0,
        }
    }
}
