//! Per-run match configuration and page gating.

use std::collections::BTreeSet;

use crate::error::SkipReason;

/// Tag whose children are never annotated, whatever the configuration says.
pub const ANCHOR_TAG: &str = "a";

/// Page id in the allow list that enables every page.
pub const ALL_PAGES: u32 = 0;

/// The page being rendered.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PageContext {
    /// Page id.
    pub id: u32,
    /// Page type. Only type 0 (normal pages) is annotated.
    pub page_type: u32,
    /// Language id used to select terms.
    pub language: u32,
}

impl PageContext {
    /// Normal page with the default language.
    #[must_use]
    pub fn new(id: u32) -> Self {
        Self {
            id,
            ..Self::default()
        }
    }
}

/// Which pages may be annotated.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageRules {
    /// Allowed page ids. Containing [`ALL_PAGES`] enables every page and
    /// disables `excluded_pages`.
    pub allowed_pages: Vec<u32>,
    /// Excluded page ids.
    pub excluded_pages: Vec<u32>,
    /// Glossary detail page, never annotated.
    pub detail_page: Option<u32>,
    /// Glossary list page, never annotated.
    pub list_page: Option<u32>,
}

impl Default for PageRules {
    fn default() -> Self {
        Self {
            allowed_pages: vec![ALL_PAGES],
            excluded_pages: Vec::new(),
            detail_page: None,
            list_page: None,
        }
    }
}

impl PageRules {
    /// Check the page against the allow/exclude lists and glossary pages.
    pub fn check(&self, page: u32) -> Result<(), SkipReason> {
        if !self.allowed_pages.contains(&ALL_PAGES)
            && (self.excluded_pages.contains(&page) || !self.allowed_pages.contains(&page))
        {
            return Err(SkipReason::PageNotAllowed(page));
        }
        if self.detail_page == Some(page) || self.list_page == Some(page) {
            return Err(SkipReason::GlossaryPage(page));
        }
        Ok(())
    }
}

/// Immutable configuration for one annotation run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MatchConfig {
    /// Tags whose content is annotated, in processing order.
    pub target_tags: Vec<String>,
    /// Tags that may not be the immediate parent of a target element.
    /// [`ANCHOR_TAG`] is always added by [`MatchConfig::forbidden_parents`].
    pub forbidden_parent_tags: BTreeSet<String>,
    /// Maximum replacements per term within one element. Zero or negative
    /// disables replacement.
    pub max_replacements: i64,
    /// Storage ids terms are loaded from.
    pub storage_scope: Vec<u32>,
    /// Page allow/exclude rules.
    pub rules: PageRules,
    /// The page being rendered.
    pub page: PageContext,
}

impl MatchConfig {
    /// Create a configuration targeting `tags` on `page`, with default rules,
    /// no forbidden parents besides the anchor tag and storage scope 0.
    pub fn new<I, S>(tags: I, page: PageContext) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            target_tags: normalize_tags(tags),
            forbidden_parent_tags: BTreeSet::new(),
            max_replacements: 9999,
            storage_scope: vec![0],
            rules: PageRules::default(),
            page,
        }
    }

    /// Set forbidden parent tags.
    #[must_use]
    pub fn with_forbidden_parents<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.forbidden_parent_tags = normalize_tags(tags).into_iter().collect();
        self
    }

    /// Set the per-term replacement cap.
    #[must_use]
    pub fn with_max_replacements(mut self, max: i64) -> Self {
        self.max_replacements = max;
        self
    }

    /// Set the storage scope.
    #[must_use]
    pub fn with_storage_scope(mut self, scope: Vec<u32>) -> Self {
        self.storage_scope = scope;
        self
    }

    /// Set the page rules.
    #[must_use]
    pub fn with_rules(mut self, rules: PageRules) -> Self {
        self.rules = rules;
        self
    }

    /// Decide whether this run may touch the document.
    ///
    /// Checks, in order: target tags present, normal page type, storage scope
    /// present, page allowed, page not a glossary page.
    pub fn gate(&self) -> Result<(), SkipReason> {
        if self.target_tags.is_empty() {
            return Err(SkipReason::NoTargetTags);
        }
        if self.page.page_type != 0 {
            return Err(SkipReason::PageType(self.page.page_type));
        }
        if self.storage_scope.is_empty() {
            return Err(SkipReason::NoStorageScope);
        }
        self.rules.check(self.page.id)
    }

    /// Forbidden parent tags including the anchor tag.
    pub fn forbidden_parents(&self) -> BTreeSet<String> {
        let mut tags = self.forbidden_parent_tags.clone();
        tags.insert(ANCHOR_TAG.to_owned());
        tags
    }
}

/// Trim, lowercase and deduplicate tag names, keeping first-seen order.
fn normalize_tags<I, S>(tags: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = BTreeSet::new();
    tags.into_iter()
        .map(|tag| tag.as_ref().trim().to_ascii_lowercase())
        .filter(|tag| !tag.is_empty() && seen.insert(tag.clone()))
        .collect()
}
