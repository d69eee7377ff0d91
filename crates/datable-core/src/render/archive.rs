//! Date-archive navigation list.
//!
//! Produces
//!
//! ```text
//! <ul>
//!   <li class="archive-year"><a href="…">2010</a>
//!     <ul class="archive-months">
//!       <li class="archive-month"><a href="…" class="current">July</a></li>
//!     </ul>
//!   </li>
//! </ul>
//! ```
//!
//! from an [`ArchiveCollection`] and the request's [`Selection`].

use chrono::{Locale, NaiveDate, TimeZone, Utc};

use crate::models::{ArchiveCollection, ArchiveTarget, Selection};
use crate::render::markup::{Element, Node};

pub const YEAR_ITEM_CLASS: &str = "archive-year";
pub const MONTHS_LIST_CLASS: &str = "archive-months";
pub const MONTH_ITEM_CLASS: &str = "archive-month";
pub const CURRENT_CLASS: &str = "current";

// ---------------------------------------------------------------------------
// Link targets
// ---------------------------------------------------------------------------

/// Turns an archive target into a link href.
pub trait UrlFor {
    fn url_for(&self, target: &ArchiveTarget) -> String;
}

/// `base?year=Y` and `base?year=Y&month=M`.
#[derive(Clone, Debug, Default)]
pub struct QueryStringUrls {
    base: String,
}

impl QueryStringUrls {
    pub fn new(base: impl Into<String>) -> Self {
        Self { base: base.into() }
    }
}

impl UrlFor for QueryStringUrls {
    fn url_for(&self, target: &ArchiveTarget) -> String {
        match target.month {
            Some(month) => format!("{}?year={}&month={month}", self.base, target.year),
            None => format!("{}?year={}", self.base, target.year),
        }
    }
}

impl<F> UrlFor for F
where
    F: Fn(&ArchiveTarget) -> String,
{
    fn url_for(&self, target: &ArchiveTarget) -> String {
        self(target)
    }
}

// ---------------------------------------------------------------------------
// Month names
// ---------------------------------------------------------------------------

/// Display name of a month within a given year.
pub trait MonthNames {
    fn month_name(&self, year: i32, month: u32) -> String;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct EnglishMonthNames;

impl MonthNames for EnglishMonthNames {
    fn month_name(&self, _year: i32, month: u32) -> String {
        u8::try_from(month)
            .ok()
            .and_then(|m| chrono::Month::try_from(m).ok())
            .map(|m| m.name().to_string())
            .unwrap_or_else(|| month.to_string())
    }
}

/// Month names in a chrono locale (`%B`).
#[derive(Clone, Copy, Debug)]
pub struct LocalizedMonthNames {
    locale: Locale,
}

impl LocalizedMonthNames {
    pub fn new(locale: Locale) -> Self {
        Self { locale }
    }
}

impl MonthNames for LocalizedMonthNames {
    fn month_name(&self, year: i32, month: u32) -> String {
        NaiveDate::from_ymd_opt(year, month, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|dt| {
                Utc.from_utc_datetime(&dt)
                    .format_localized("%B", self.locale)
                    .to_string()
            })
            .unwrap_or_else(|| EnglishMonthNames.month_name(year, month))
    }
}

// ---------------------------------------------------------------------------
// Renderer
// ---------------------------------------------------------------------------

pub struct ArchiveRenderer<U = QueryStringUrls, M = EnglishMonthNames> {
    urls: U,
    names: M,
}

impl Default for ArchiveRenderer {
    fn default() -> Self {
        Self::new(QueryStringUrls::default(), EnglishMonthNames)
    }
}

impl<U: UrlFor, M: MonthNames> ArchiveRenderer<U, M> {
    pub fn new(urls: U, names: M) -> Self {
        Self { urls, names }
    }

    fn link(&self, label: String, target: ArchiveTarget, current: bool) -> Element {
        Element::new("a")
            .attr("href", self.urls.url_for(&target))
            .attr_opt("class", current.then_some(CURRENT_CLASS))
            .text(label)
    }

    fn year_link(&self, year: i32, selection: &Selection) -> Element {
        self.link(
            year.to_string(),
            ArchiveTarget { year, month: None },
            selection.is_year_current(year),
        )
    }

    fn month_link(&self, year: i32, month: u32, selection: &Selection) -> Element {
        self.link(
            self.names.month_name(year, month),
            ArchiveTarget {
                year,
                month: Some(month),
            },
            selection.is_month_current(year, month),
        )
    }

    /// Build the archive list as a node tree.
    pub fn tree(&self, collection: &ArchiveCollection, selection: &Selection) -> Node {
        let mut list = Element::new("ul");
        for (&year, months) in collection {
            let mut item = Element::new("li")
                .attr("class", YEAR_ITEM_CLASS)
                .child(self.year_link(year, selection));
            if !months.is_empty() {
                let inner = months.iter().fold(
                    Element::new("ul").attr("class", MONTHS_LIST_CLASS),
                    |ul, &month| {
                        ul.child(
                            Element::new("li")
                                .attr("class", MONTH_ITEM_CLASS)
                                .child(self.month_link(year, month, selection)),
                        )
                    },
                );
                item = item.child(inner);
            }
            list = list.child(item);
        }
        list.into()
    }

    pub fn render(&self, collection: &ArchiveCollection, selection: &Selection) -> String {
        self.tree(collection, selection).to_html()
    }
}

/// Render with query-string links under `base` and English month names.
pub fn render_archive(collection: &ArchiveCollection, selection: &Selection, base: &str) -> String {
    ArchiveRenderer::new(QueryStringUrls::new(base), EnglishMonthNames).render(collection, selection)
}
