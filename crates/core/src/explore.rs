//! Community recommendation templates and the explore feed query.

use serde::{Deserialize, Serialize};

use crate::controls::Pagination;
use crate::types::TemplateId;
use crate::vaporizer::VaporizerSummary;

/// Templates shown per explore page.
pub const PAGE_SIZE: usize = 9;

/// Who shared a template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateAuthor {
    pub name: String,
    pub handle: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

/// Explore feed category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateCategory {
    Beginner,
    Flavor,
    Clouds,
    Portable,
    Budget,
    Medical,
}

impl TemplateCategory {
    pub const ALL: [Self; 6] = [
        Self::Beginner,
        Self::Flavor,
        Self::Clouds,
        Self::Portable,
        Self::Budget,
        Self::Medical,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Beginner => "beginner",
            Self::Flavor => "flavor",
            Self::Clouds => "clouds",
            Self::Portable => "portable",
            Self::Budget => "budget",
            Self::Medical => "medical",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Beginner => "Beginner Friendly",
            Self::Flavor => "Flavor Chasers",
            Self::Clouds => "Cloud Chasers",
            Self::Portable => "On the Go",
            Self::Budget => "Budget Picks",
            Self::Medical => "Medical",
        }
    }

    /// Parse a query-string value; unknown values yield `None`.
    #[must_use]
    pub fn from_param(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == s)
    }
}

/// The quiz answers behind a shared template, summarized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferenceSummary {
    pub experience: String,
    pub usage: String,
    pub budget: String,
    #[serde(default)]
    pub top_priorities: Vec<String>,
}

/// A shared recommendation in the explore feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommunityTemplate {
    pub id: TemplateId,
    pub title: String,
    pub description: String,
    pub author: TemplateAuthor,
    #[serde(default)]
    pub likes: u32,
    #[serde(default)]
    pub downloads: u32,
    #[serde(default)]
    pub comments: u32,
    pub category: TemplateCategory,
    #[serde(default)]
    pub tags: Vec<String>,
    pub vaporizer: VaporizerSummary,
    pub preferences: PreferenceSummary,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub trending: bool,
    #[serde(default = "default_public")]
    pub is_public: bool,
}

const fn default_public() -> bool {
    true
}

impl CommunityTemplate {
    /// Case-insensitive match against title, description, tags, author and
    /// vaporizer name. `needle` must already be lower-cased.
    fn matches(&self, needle: &str) -> bool {
        let hit = |s: &str| s.to_lowercase().contains(needle);
        hit(&self.title)
            || hit(&self.description)
            || hit(&self.author.name)
            || hit(&self.vaporizer.name)
            || self.tags.iter().any(|t| hit(t))
    }
}

/// Explore feed ordering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExploreSort {
    /// Trending templates first, then by likes.
    #[default]
    Trending,
    Popular,
    MostDownloaded,
    MostDiscussed,
}

impl ExploreSort {
    pub const ALL: [Self; 4] = [
        Self::Trending,
        Self::Popular,
        Self::MostDownloaded,
        Self::MostDiscussed,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Trending => "trending",
            Self::Popular => "popular",
            Self::MostDownloaded => "most_downloaded",
            Self::MostDiscussed => "most_discussed",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Trending => "Trending",
            Self::Popular => "Most Liked",
            Self::MostDownloaded => "Most Downloaded",
            Self::MostDiscussed => "Most Discussed",
        }
    }

    /// Parse a query-string value, falling back to the default.
    #[must_use]
    pub fn from_param(s: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|sort| sort.as_str() == s)
            .unwrap_or_default()
    }
}

/// Search, filter, sort and page state of the explore feed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExploreQuery {
    pub search: Option<String>,
    pub category: Option<TemplateCategory>,
    pub sort: ExploreSort,
    /// 1-based requested page.
    pub page: usize,
}

/// One page of filtered templates.
#[derive(Debug, Clone)]
pub struct ExplorePage<'a> {
    pub items: Vec<&'a CommunityTemplate>,
    pub pagination: Pagination,
}

impl ExploreQuery {
    /// Filter, sort and paginate `templates`.
    #[must_use]
    pub fn apply<'a>(&self, templates: &'a [CommunityTemplate]) -> ExplorePage<'a> {
        let needle = self
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase);

        let mut items: Vec<&CommunityTemplate> = templates
            .iter()
            .filter(|t| t.is_public)
            .filter(|t| self.category.is_none_or(|c| t.category == c))
            .filter(|t| needle.as_deref().is_none_or(|n| t.matches(n)))
            .collect();

        match self.sort {
            ExploreSort::Trending => {
                items.sort_by(|a, b| b.trending.cmp(&a.trending).then(b.likes.cmp(&a.likes)));
            }
            ExploreSort::Popular => items.sort_by(|a, b| b.likes.cmp(&a.likes)),
            ExploreSort::MostDownloaded => items.sort_by(|a, b| b.downloads.cmp(&a.downloads)),
            ExploreSort::MostDiscussed => items.sort_by(|a, b| b.comments.cmp(&a.comments)),
        }

        let pagination = Pagination::new(items.len(), PAGE_SIZE, self.page);
        let items = items
            .into_iter()
            .skip(pagination.offset())
            .take(PAGE_SIZE)
            .collect();

        ExplorePage { items, pagination }
    }
}

/// Featured public templates, in source order.
#[must_use]
pub fn featured(templates: &[CommunityTemplate]) -> Vec<&CommunityTemplate> {
    templates
        .iter()
        .filter(|t| t.is_public && t.featured)
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn template(id: i32, title: &str, category: TemplateCategory) -> CommunityTemplate {
        CommunityTemplate {
            id: TemplateId::new(id),
            title: title.to_string(),
            description: format!("{title} setup"),
            author: TemplateAuthor {
                name: "Sam Rivera".to_string(),
                handle: "@sam".to_string(),
                avatar_url: None,
            },
            likes: 0,
            downloads: 0,
            comments: 0,
            category,
            tags: Vec::new(),
            vaporizer: VaporizerSummary {
                slug: "mighty-plus".to_string(),
                name: "Mighty+".to_string(),
                manufacturer: "Storz & Bickel".to_string(),
                image_url: None,
                match_percentage: Some(94),
            },
            preferences: PreferenceSummary {
                experience: "Beginner".to_string(),
                usage: "Daily".to_string(),
                budget: "$300-$400".to_string(),
                top_priorities: vec!["Flavor".to_string()],
            },
            featured: false,
            trending: false,
            is_public: true,
        }
    }

    fn ids(page: &ExplorePage<'_>) -> Vec<i32> {
        page.items.iter().map(|t| t.id.as_i32()).collect()
    }

    #[test]
    fn test_private_templates_are_hidden() {
        let mut hidden = template(1, "Secret", TemplateCategory::Flavor);
        hidden.is_public = false;
        let templates = vec![hidden, template(2, "Open", TemplateCategory::Flavor)];
        let page = ExploreQuery::default().apply(&templates);
        assert_eq!(ids(&page), vec![2]);
    }

    #[test]
    fn test_search_is_case_insensitive_across_fields() {
        let mut tagged = template(1, "Morning", TemplateCategory::Flavor);
        tagged.tags = vec!["Terpenes".to_string()];
        let templates = vec![
            tagged,
            template(2, "Cloud Nine", TemplateCategory::Clouds),
            template(3, "Road trip", TemplateCategory::Portable),
        ];

        let query = ExploreQuery {
            search: Some("terp".to_string()),
            ..ExploreQuery::default()
        };
        assert_eq!(ids(&query.apply(&templates)), vec![1]);

        let query = ExploreQuery {
            search: Some("  MIGHTY ".to_string()),
            ..ExploreQuery::default()
        };
        assert_eq!(query.apply(&templates).items.len(), 3);
    }

    #[test]
    fn test_category_filter() {
        let templates = vec![
            template(1, "A", TemplateCategory::Flavor),
            template(2, "B", TemplateCategory::Budget),
        ];
        let query = ExploreQuery {
            category: Some(TemplateCategory::Budget),
            ..ExploreQuery::default()
        };
        assert_eq!(ids(&query.apply(&templates)), vec![2]);
    }

    #[test]
    fn test_trending_sort_puts_trending_first() {
        let mut a = template(1, "A", TemplateCategory::Flavor);
        a.likes = 500;
        let mut b = template(2, "B", TemplateCategory::Flavor);
        b.trending = true;
        b.likes = 10;
        let mut c = template(3, "C", TemplateCategory::Flavor);
        c.trending = true;
        c.likes = 40;
        let templates = vec![a, b, c];
        assert_eq!(ids(&ExploreQuery::default().apply(&templates)), vec![3, 2, 1]);
    }

    #[test]
    fn test_sorts_are_stable() {
        let mut templates: Vec<CommunityTemplate> = (1..=4)
            .map(|i| template(i, "T", TemplateCategory::Clouds))
            .collect();
        templates[2].downloads = 9;
        let query = ExploreQuery {
            sort: ExploreSort::MostDownloaded,
            ..ExploreQuery::default()
        };
        assert_eq!(ids(&query.apply(&templates)), vec![3, 1, 2, 4]);
    }

    #[test]
    fn test_pagination_of_feed() {
        let templates: Vec<CommunityTemplate> = (1..=20)
            .map(|i| template(i, "T", TemplateCategory::Clouds))
            .collect();
        let query = ExploreQuery {
            sort: ExploreSort::Popular,
            page: 3,
            ..ExploreQuery::default()
        };
        let page = query.apply(&templates);
        assert_eq!(ids(&page), vec![19, 20]);
        assert_eq!(page.pagination.total_pages(), 3);
        assert!(!page.pagination.has_next());

        let beyond = ExploreQuery {
            page: 99,
            ..query
        };
        assert_eq!(beyond.apply(&templates).pagination.page(), 3);
    }

    #[test]
    fn test_featured_only_public() {
        let mut a = template(1, "A", TemplateCategory::Flavor);
        a.featured = true;
        let mut b = template(2, "B", TemplateCategory::Flavor);
        b.featured = true;
        b.is_public = false;
        let templates = vec![a, b, template(3, "C", TemplateCategory::Flavor)];
        let ids: Vec<i32> = featured(&templates).iter().map(|t| t.id.as_i32()).collect();
        assert_eq!(ids, vec![1]);
    }

    #[test]
    fn test_param_parsing() {
        assert_eq!(
            TemplateCategory::from_param("medical"),
            Some(TemplateCategory::Medical)
        );
        assert_eq!(TemplateCategory::from_param("all"), None);
        assert_eq!(
            ExploreSort::from_param("most_discussed"),
            ExploreSort::MostDiscussed
        );
        assert_eq!(ExploreSort::from_param("bogus"), ExploreSort::Trending);
    }
}
