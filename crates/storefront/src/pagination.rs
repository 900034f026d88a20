//! Page-number window calculator for listing pages.
//!
//! Computes which page buttons to render so the control stays a bounded
//! width no matter how many pages a listing has.

use serde::{Deserialize, Serialize};

/// One entry of a pagination window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "page")]
pub enum PageEntry {
    /// A clickable page number.
    Page(u32),
    /// A gap of two or more hidden pages.
    Ellipsis,
}

/// Compute the window of page entries to render.
///
/// `current_page` must be within `1..=total_pages` and `total_pages` at
/// least 1. `max_visible` is the width of the contiguous block anchored at
/// whichever end `current_page` is near; values below 3 are widened to 3,
/// since the window must anchor both endpoints around the current page.
///
/// Totals up to `max_visible + 1` render in full with no ellipsis. Beyond
/// that the window always starts at page 1 and ends at `total_pages`:
/// near the start it shows the first `max_visible` pages, near the end the
/// last `max_visible`, and in the middle the three pages centered on
/// `current_page`. A gap that would hide exactly one page renders that
/// page instead of an ellipsis, so an ellipsis always stands for at least
/// two pages and never appears twice in a row.
#[must_use]
pub fn compute_window(current_page: u32, total_pages: u32, max_visible: u32) -> Vec<PageEntry> {
    debug_assert!(total_pages >= 1, "total_pages must be at least 1");
    debug_assert!(
        (1..=total_pages).contains(&current_page),
        "current_page must be within 1..=total_pages"
    );

    let max_visible = max_visible.max(3);

    // Small totals: every page fits
    if total_pages <= max_visible + 1 {
        return (1..=total_pages).map(PageEntry::Page).collect();
    }

    let mut entries = Vec::new();

    if current_page <= max_visible - 1 {
        // Near the start: first block, gap, last page
        push_pages(&mut entries, 1, max_visible);
        push_gap(&mut entries, max_visible, total_pages);
        entries.push(PageEntry::Page(total_pages));
    } else if current_page >= total_pages - max_visible + 2 {
        // Near the end: first page, gap, last block
        entries.push(PageEntry::Page(1));
        push_gap(&mut entries, 1, total_pages - max_visible + 1);
        push_pages(&mut entries, total_pages - max_visible + 1, total_pages);
    } else {
        // Middle: both endpoints, three pages centered on current_page
        entries.push(PageEntry::Page(1));
        push_gap(&mut entries, 1, current_page - 1);
        push_pages(&mut entries, current_page - 1, current_page + 1);
        push_gap(&mut entries, current_page + 1, total_pages);
        entries.push(PageEntry::Page(total_pages));
    }

    entries
}

/// Push the inclusive page range `from..=to`.
fn push_pages(entries: &mut Vec<PageEntry>, from: u32, to: u32) {
    entries.extend((from..=to).map(PageEntry::Page));
}

/// Push whatever stands between two already-emitted pages.
///
/// A single hidden page is emitted as that page; two or more become one
/// ellipsis. Interval math alone would happily emit an ellipsis that
/// "hides" only one page, so this boundary is guarded explicitly.
fn push_gap(entries: &mut Vec<PageEntry>, after: u32, before: u32) {
    let hidden = before.saturating_sub(after + 1);
    match hidden {
        0 => {}
        1 => entries.push(PageEntry::Page(after + 1)),
        _ => entries.push(PageEntry::Ellipsis),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::PageEntry::{Ellipsis, Page};

    fn pages(entries: &[PageEntry]) -> Vec<u32> {
        entries
            .iter()
            .filter_map(|entry| match entry {
                Page(n) => Some(*n),
                Ellipsis => None,
            })
            .collect()
    }

    #[test]
    fn test_small_totals_render_in_full() {
        for max_visible in 3..=8 {
            for total_pages in 1..=max_visible + 1 {
                for current_page in 1..=total_pages {
                    let window = compute_window(current_page, total_pages, max_visible);
                    let expected: Vec<PageEntry> = (1..=total_pages).map(Page).collect();
                    assert_eq!(
                        window, expected,
                        "current={current_page} total={total_pages} max={max_visible}"
                    );
                }
            }
        }
    }

    #[test]
    fn test_endpoints_always_anchored() {
        let total_pages = 20;
        for current_page in 1..=total_pages {
            let window = compute_window(current_page, total_pages, 6);
            assert_eq!(window.first(), Some(&Page(1)), "current={current_page}");
            assert_eq!(
                window.last(),
                Some(&Page(total_pages)),
                "current={current_page}"
            );
        }
    }

    #[test]
    fn test_no_adjacent_ellipses() {
        for max_visible in 3..=8 {
            for total_pages in 1..=30 {
                for current_page in 1..=total_pages {
                    let window = compute_window(current_page, total_pages, max_visible);
                    let adjacent = window
                        .windows(2)
                        .any(|pair| matches!(pair, [Ellipsis, Ellipsis]));
                    assert!(
                        !adjacent,
                        "current={current_page} total={total_pages} max={max_visible}"
                    );
                }
            }
        }
    }

    #[test]
    fn test_near_start_literal() {
        assert_eq!(
            compute_window(5, 20, 6),
            vec![
                Page(1),
                Page(2),
                Page(3),
                Page(4),
                Page(5),
                Page(6),
                Ellipsis,
                Page(20)
            ]
        );
    }

    #[test]
    fn test_near_end_literal() {
        assert_eq!(
            compute_window(18, 20, 6),
            vec![
                Page(1),
                Ellipsis,
                Page(15),
                Page(16),
                Page(17),
                Page(18),
                Page(19),
                Page(20)
            ]
        );
    }

    #[test]
    fn test_middle_window_centers_on_current() {
        assert_eq!(
            compute_window(10, 20, 6),
            vec![
                Page(1),
                Ellipsis,
                Page(9),
                Page(10),
                Page(11),
                Ellipsis,
                Page(20)
            ]
        );
    }

    #[test]
    fn test_single_page_gap_collapses_to_that_page() {
        // total = max_visible + 2 leaves exactly one hidden page at either
        // end; the window must show it instead of an ellipsis
        let window = compute_window(1, 8, 6);
        assert_eq!(window, (1..=8).map(Page).collect::<Vec<_>>());

        let window = compute_window(8, 8, 6);
        assert_eq!(window, (1..=8).map(Page).collect::<Vec<_>>());
    }

    #[test]
    fn test_pages_strictly_increasing() {
        for total_pages in 1..=30 {
            for current_page in 1..=total_pages {
                let window = compute_window(current_page, total_pages, 6);
                let numbers = pages(&window);
                assert!(
                    numbers.windows(2).all(|pair| pair[0] < pair[1]),
                    "current={current_page} total={total_pages}: {numbers:?}"
                );
            }
        }
    }

    #[test]
    fn test_stateless_and_repeatable() {
        let first = compute_window(7, 40, 6);
        let second = compute_window(7, 40, 6);
        assert_eq!(first, second);
    }
}
