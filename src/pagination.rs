//! Common functionality for paging data.

/// The config for pagination
#[derive(Debug, Clone)]
pub struct PaginationConfig {
    /// The page number to default to when not specified in a request.
    pub default_page: u64,
    /// The maximum transactions to display per page when not specified in a request.
    pub default_page_size: u64,
    /// The maximum number of pages to show in the pagination indicator.
    pub max_pages: u64,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_page: 1,
            default_page_size: 20,
            max_pages: 5,
        }
    }
}

/// A single element of the pagination control.
#[derive(Debug, PartialEq, Eq)]
pub enum PaginationIndicator {
    /// A link to a page.
    Page(u64),
    /// The current page (not a link).
    CurrPage(u64),
    /// A gap between page links.
    Ellipsis,
    /// A link to the next page.
    NextButton(u64),
    /// A link to the previous page.
    BackButton(u64),
}

/// Build the sequence of indicators to render for the given page position.
pub fn create_pagination_indicators(
    curr_page: u64,
    page_count: u64,
    max_pages: u64,
) -> Vec<PaginationIndicator> {
    let map_page = |page| {
        if page == curr_page {
            PaginationIndicator::CurrPage(page)
        } else {
            PaginationIndicator::Page(page)
        }
    };

    let mut indicators: Vec<PaginationIndicator> = if page_count <= max_pages {
        (1..=page_count).map(map_page).collect()
    } else if curr_page <= (max_pages / 2) {
        (1..=max_pages).map(map_page).collect()
    } else if curr_page > (page_count - max_pages / 2) {
        ((page_count - max_pages + 1)..=page_count)
            .map(map_page)
            .collect()
    } else {
        ((curr_page - max_pages / 2)..=(curr_page + max_pages / 2))
            .map(map_page)
            .collect()
    };

    if page_count > max_pages {
        if curr_page > (max_pages / 2) + 1 {
            indicators.insert(0, PaginationIndicator::Page(1));
            indicators.insert(1, PaginationIndicator::Ellipsis);
        }

        if curr_page < (page_count - max_pages / 2) {
            indicators.push(PaginationIndicator::Ellipsis);
            indicators.push(PaginationIndicator::Page(page_count));
        }
    }

    if curr_page > 1 {
        indicators.insert(0, PaginationIndicator::BackButton(curr_page - 1));
    }

    if curr_page < page_count {
        indicators.push(PaginationIndicator::NextButton(curr_page + 1));
    }

    indicators
}
