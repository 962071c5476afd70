//! Planner properties checked over a spread of snapshot sizes

use pagesnap::{plan, FitMode, PageFormat, PaginationPlanner, PlacementPlan, SourceImage};

const SIZES: &[(u32, u32)] = &[
    (800, 600),
    (800, 4000),
    (1, 1),
    (1, 5000),
    (1280, 720),
    (1280, 1811),
    (1280, 1810),
    (1440, 12000),
    (3, 7),
    (4096, 65535),
];

/// Thin snapshots in the grid need a few thousand pages.
fn planner() -> PaginationPlanner {
    PaginationPlanner::new(FitMode::Tile).with_max_pages(10_000)
}

fn tiled(w: u32, h: u32, page: &PageFormat) -> PlacementPlan {
    planner().plan(&SourceImage::new(w, h).unwrap(), page).unwrap()
}

fn pages() -> Vec<PageFormat> {
    vec![
        PageFormat::new(210.0, 297.0).unwrap(),
        PageFormat::new(297.0, 210.0).unwrap(),
        PageFormat::new(612.0, 792.0).unwrap(),
        PageFormat::new(8.5, 11.0).unwrap(),
    ]
}

#[test]
fn scenario_a_single_page() {
    let a4 = PageFormat::new(210.0, 297.0).unwrap();
    let p = plan(&SourceImage::new(800, 600).unwrap(), &a4).unwrap();
    assert_eq!(p.page_count(), 1);
    assert_eq!(p.placements()[0].vertical_offset, 0.0);
    assert_eq!(p.fitted_width(), 210.0);
    assert!((p.fitted_height() - 157.5).abs() < 1e-9);
}

#[test]
fn scenario_b_four_pages() {
    let a4 = PageFormat::new(210.0, 297.0).unwrap();
    let p = plan(&SourceImage::new(800, 4000).unwrap(), &a4).unwrap();
    let indices: Vec<usize> = p.iter().map(|pl| pl.page_index).collect();
    assert_eq!(indices, vec![0, 1, 2, 3]);
}

#[test]
fn fitting_pages_are_single_with_zero_offset() {
    for page in pages() {
        for &(w, h) in SIZES {
            let p = tiled(w, h, &page);
            if p.fitted_height() <= page.content_height() {
                assert_eq!(p.page_count(), 1, "{}x{}", w, h);
                assert_eq!(p.placements()[0].vertical_offset, 0.0);
            }
        }
    }
}

#[test]
fn multi_page_count_is_ceiling() {
    for page in pages() {
        for &(w, h) in SIZES {
            let p = tiled(w, h, &page);
            if p.fitted_height() > page.content_height() {
                let expected = (p.fitted_height() / page.content_height()).ceil() as usize;
                assert_eq!(p.page_count(), expected, "{}x{} on {:?}", w, h, page);
            }
        }
    }
}

#[test]
fn indices_sequential_and_offsets_descend() {
    for page in pages() {
        for &(w, h) in SIZES {
            let p = tiled(w, h, &page);
            for (k, pair) in p.placements().windows(2).enumerate() {
                assert_eq!(pair[0].page_index, k);
                assert_eq!(pair[1].page_index, k + 1);
                assert!(pair[1].vertical_offset < pair[0].vertical_offset);
            }
            assert_eq!(p.placements()[0].page_index, 0);
        }
    }
}

#[test]
fn slices_cover_without_gap_or_overlap() {
    for page in pages() {
        for &(w, h) in SIZES {
            let p = tiled(w, h, &page);
            let tol = 1e-9 * p.fitted_height().max(1.0);
            let mut covered = 0.0;
            for k in 0..p.page_count() {
                let (top, bottom) = p.visible_slice(k).unwrap();
                assert!((top - covered).abs() <= tol, "{}x{} page {}", w, h, k);
                assert!(bottom > top);
                covered = bottom;
            }
            assert!((covered - p.fitted_height()).abs() <= tol);
        }
    }
}

#[test]
fn planning_is_deterministic() {
    let planner = planner();
    for page in pages() {
        for &(w, h) in SIZES {
            let src = SourceImage::new(w, h).unwrap();
            assert_eq!(planner.plan(&src, &page).unwrap(), planner.plan(&src, &page).unwrap());
        }
    }
}

#[test]
fn shrink_mode_never_pages() {
    let planner = PaginationPlanner::new(FitMode::ShrinkToPage);
    for page in pages() {
        for &(w, h) in SIZES {
            let p = planner.plan(&SourceImage::new(w, h).unwrap(), &page).unwrap();
            assert_eq!(p.page_count(), 1);
            assert!(p.fitted_height() <= page.content_height());
            assert!(p.fitted_width() <= page.content_width() + 1e-9);
        }
    }
}

#[test]
fn page_limit_applies_across_the_grid() {
    let limited = PaginationPlanner::new(FitMode::Tile).with_max_pages(8);
    for page in pages() {
        for &(w, h) in SIZES {
            let src = SourceImage::new(w, h).unwrap();
            let unlimited = planner().page_count(&src, &page).unwrap();
            match limited.plan(&src, &page) {
                Ok(p) => assert_eq!(p.page_count(), unlimited),
                Err(pagesnap::Error::PageLimitExceeded { pages, limit }) => {
                    assert_eq!(limit, 8);
                    assert_eq!(pages, unlimited);
                    assert!(unlimited > 8);
                }
                Err(e) => panic!("{}x{}: unexpected error {}", w, h, e),
            }
        }
    }
}
