//! Explore feed: community recommendation templates.
//!
//! All UI state (search, category, sort, page and the open preview) lives in
//! the query string, so every view is linkable and the back button works.

use std::borrow::Borrow;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Query, State},
    response::IntoResponse,
};
use serde::Deserialize;
use vaporwise_core::TemplateId;
use vaporwise_core::explore::{CommunityTemplate, ExploreQuery, ExploreSort, TemplateCategory};

use crate::filters;
use crate::middleware::OptionalAuth;
use crate::state::AppState;

/// Explore query parameters.
///
/// Everything is taken as text so a hand-edited link with a junk `page` or
/// `preview` still renders the feed instead of failing extraction.
#[derive(Debug, Default, Deserialize)]
pub struct ExploreParams {
    pub q: Option<String>,
    pub category: Option<String>,
    pub sort: Option<String>,
    pub page: Option<String>,
    pub preview: Option<String>,
}

impl ExploreParams {
    /// Requested page, `1` when missing or not a number.
    fn page(&self) -> usize {
        self.page
            .as_deref()
            .and_then(|p| p.trim().parse().ok())
            .unwrap_or(1)
    }

    fn preview_id(&self) -> Option<TemplateId> {
        self.preview.as_deref().and_then(|p| p.trim().parse().ok())
    }

    fn query(&self) -> ExploreQuery {
        ExploreQuery {
            search: self.q.clone().filter(|q| !q.trim().is_empty()),
            category: self
                .category
                .as_deref()
                .and_then(TemplateCategory::from_param),
            sort: self
                .sort
                .as_deref()
                .map(ExploreSort::from_param)
                .unwrap_or_default(),
            page: self.page(),
        }
    }
}

/// Community template display data for templates.
#[derive(Debug, Clone)]
pub struct TemplateCard {
    pub id: TemplateId,
    pub title: String,
    pub description: String,
    pub author_name: String,
    pub author_handle: String,
    pub category: &'static str,
    pub tags: Vec<String>,
    pub likes: u32,
    pub downloads: u32,
    pub comments: u32,
    pub trending: bool,
    pub vaporizer_slug: String,
    pub vaporizer_name: String,
    pub manufacturer: String,
    pub image_url: Option<String>,
    pub match_percentage: Option<u8>,
    pub experience: String,
    pub usage: String,
    pub budget: String,
    pub top_priorities: Vec<String>,
}

impl From<&CommunityTemplate> for TemplateCard {
    fn from(t: &CommunityTemplate) -> Self {
        Self {
            id: t.id,
            title: t.title.clone(),
            description: t.description.clone(),
            author_name: t.author.name.clone(),
            author_handle: t.author.handle.clone(),
            category: t.category.label(),
            tags: t.tags.clone(),
            likes: t.likes,
            downloads: t.downloads,
            comments: t.comments,
            trending: t.trending,
            vaporizer_slug: t.vaporizer.slug.clone(),
            vaporizer_name: t.vaporizer.name.clone(),
            manufacturer: t.vaporizer.manufacturer.clone(),
            image_url: t.vaporizer.image_url.clone(),
            match_percentage: t.vaporizer.match_percentage,
            experience: t.preferences.experience.clone(),
            usage: t.preferences.usage.clone(),
            budget: t.preferences.budget.clone(),
            top_priorities: t.preferences.top_priorities.clone(),
        }
    }
}

/// A select option in the filter bar.
#[derive(Debug, Clone)]
pub struct FilterOption {
    pub value: &'static str,
    pub label: &'static str,
    pub selected: bool,
}

/// Current explore state, used to build links that change one thing.
#[derive(Debug, Clone)]
pub struct ExploreState {
    pub search: String,
    pub category: Option<TemplateCategory>,
    pub sort: ExploreSort,
    pub page: usize,
}

impl ExploreState {
    /// Link to this view with a different page and an optional preview.
    #[must_use]
    pub fn href(&self, page: usize, preview: Option<TemplateId>) -> String {
        let mut params = Vec::new();
        if !self.search.is_empty() {
            params.push(format!("q={}", urlencoding::encode(&self.search)));
        }
        if let Some(category) = self.category {
            params.push(format!("category={}", category.as_str()));
        }
        if self.sort != ExploreSort::default() {
            params.push(format!("sort={}", self.sort.as_str()));
        }
        if page > 1 {
            params.push(format!("page={page}"));
        }
        if let Some(id) = preview {
            params.push(format!("preview={id}"));
        }

        if params.is_empty() {
            "/explore".to_string()
        } else {
            format!("/explore?{}", params.join("&"))
        }
    }

    /// Link to a template's preview on the current page.
    #[must_use]
    pub fn preview_href(&self, id: impl Borrow<TemplateId>) -> String {
        self.href(self.page, Some(*id.borrow()))
    }

    /// Link that closes the preview.
    #[must_use]
    pub fn close_href(&self) -> String {
        self.href(self.page, None)
    }
}

/// Explore page template.
#[derive(Template, WebTemplate)]
#[template(path = "explore/index.html")]
pub struct ExploreTemplate {
    pub user: Option<String>,
    pub state: ExploreState,
    pub categories: Vec<FilterOption>,
    pub sorts: Vec<FilterOption>,
    pub featured: Vec<TemplateCard>,
    pub templates: Vec<TemplateCard>,
    pub total_items: usize,
    pub current_page: usize,
    pub total_pages: usize,
    pub previous_href: Option<String>,
    pub next_href: Option<String>,
    pub preview: Option<TemplateCard>,
}

/// Display the explore feed.
pub async fn index(
    State(state): State<AppState>,
    auth: OptionalAuth,
    Query(params): Query<ExploreParams>,
) -> impl IntoResponse {
    let query = params.query();
    let fixtures = state.fixtures();
    let page = query.apply(fixtures.templates());
    let pagination = page.pagination;

    let view_state = ExploreState {
        search: query.search.clone().unwrap_or_default(),
        category: query.category,
        sort: query.sort,
        page: pagination.page(),
    };

    let categories = TemplateCategory::ALL
        .iter()
        .map(|c| FilterOption {
            value: c.as_str(),
            label: c.label(),
            selected: query.category == Some(*c),
        })
        .collect();

    let sorts = ExploreSort::ALL
        .iter()
        .map(|s| FilterOption {
            value: s.as_str(),
            label: s.label(),
            selected: query.sort == *s,
        })
        .collect();

    // Featured strip only on the unfiltered first page
    let featured = if view_state.search.is_empty()
        && view_state.category.is_none()
        && pagination.page() == 1
    {
        fixtures
            .featured_templates()
            .into_iter()
            .map(TemplateCard::from)
            .collect()
    } else {
        Vec::new()
    };

    let preview = params
        .preview_id()
        .and_then(|id| fixtures.template(id))
        .map(TemplateCard::from);

    ExploreTemplate {
        user: auth.greeting(),
        previous_href: pagination
            .has_previous()
            .then(|| view_state.href(pagination.page() - 1, None)),
        next_href: pagination
            .has_next()
            .then(|| view_state.href(pagination.page() + 1, None)),
        categories,
        sorts,
        featured,
        templates: page.items.into_iter().map(TemplateCard::from).collect(),
        total_items: pagination.total_items(),
        current_page: pagination.page(),
        total_pages: pagination.total_pages(),
        preview,
        state: view_state,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> ExploreState {
        ExploreState {
            search: String::new(),
            category: None,
            sort: ExploreSort::default(),
            page: 1,
        }
    }

    #[test]
    fn test_href_defaults_to_bare_path() {
        assert_eq!(state().href(1, None), "/explore");
    }

    #[test]
    fn test_href_keeps_filters() {
        let s = ExploreState {
            search: "dry herb".to_string(),
            category: Some(TemplateCategory::Flavor),
            sort: ExploreSort::Popular,
            page: 2,
        };
        assert_eq!(
            s.href(3, Some(TemplateId::new(7))),
            "/explore?q=dry%20herb&category=flavor&sort=popular&page=3&preview=7"
        );
        assert_eq!(
            s.close_href(),
            "/explore?q=dry%20herb&category=flavor&sort=popular&page=2"
        );
    }

    #[test]
    fn test_params_ignore_unknown_category() {
        let params = ExploreParams {
            category: Some("vape-tricks".to_string()),
            ..ExploreParams::default()
        };
        assert_eq!(params.query().category, None);
        assert_eq!(params.query().page, 1);
    }

    #[test]
    fn test_params_tolerate_junk_numbers() {
        let params = ExploreParams {
            page: Some("abc".to_string()),
            preview: Some("-x".to_string()),
            ..ExploreParams::default()
        };
        assert_eq!(params.query().page, 1);
        assert_eq!(params.preview_id(), None);

        let params = ExploreParams {
            page: Some(" 3 ".to_string()),
            preview: Some("7".to_string()),
            ..ExploreParams::default()
        };
        assert_eq!(params.query().page, 3);
        assert_eq!(params.preview_id(), Some(TemplateId::new(7)));
    }
}
