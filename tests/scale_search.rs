use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use screenmatch::{
    Correlator, ImageView, MatchConfig, Matcher, Method, OwnedImage, ScalarCorrelator,
    ScaleSchedule, ScoreMap, ScreenMatchResult, Template, TemplatePlan,
};
use std::sync::atomic::{AtomicUsize, Ordering};

fn make_template(width: usize, height: usize) -> Vec<u8> {
    let mut data = Vec::with_capacity(width * height);
    for y in 0..height {
        for x in 0..width {
            let value = ((x * 13) ^ (y * 7) ^ (x * y)) & 0xFF;
            data.push(value as u8);
        }
    }
    data
}

fn plan_of(data: &[u8], width: usize, height: usize) -> TemplatePlan {
    Template::new(data.to_vec(), width, height)
        .unwrap()
        .plan()
        .unwrap()
}

fn screen_with_copies(
    width: usize,
    height: usize,
    tpl: &[u8],
    tpl_width: usize,
    tpl_height: usize,
    origins: &[(usize, usize)],
) -> OwnedImage {
    let mut screen = OwnedImage::filled(width, height, 0).unwrap();
    let view = ImageView::from_slice(tpl, tpl_width, tpl_height).unwrap();
    for &(x, y) in origins {
        screen.paste(view, x, y);
    }
    screen
}

struct CountingCorrelator {
    calls: AtomicUsize,
}

impl Correlator for CountingCorrelator {
    fn correlate(
        &self,
        image: ImageView<'_, u8>,
        template: &TemplatePlan,
        method: Method,
    ) -> ScreenMatchResult<ScoreMap> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        ScalarCorrelator.correlate(image, template, method)
    }
}

#[test]
fn single_native_occurrence_is_centered_on_the_copy() {
    let (tw, th) = (24, 16);
    let tpl = make_template(tw, th);
    let screen = screen_with_copies(120, 80, &tpl, tw, th, &[(30, 20)]);

    let matches = Matcher::scalar()
        .find_all(&screen, &plan_of(&tpl, tw, th))
        .unwrap();

    assert_eq!(matches.len(), 1);
    let m = matches[0];
    assert_eq!((m.center_x, m.center_y), (42, 28));
    assert_eq!((m.width, m.height), (24, 16));
    assert_eq!((m.left(), m.top()), (30, 20));
    assert!(m.similarity > 0.99, "similarity {}", m.similarity);
}

#[test]
fn absent_template_yields_no_matches() {
    let (tw, th) = (24, 16);
    let tpl = make_template(tw, th);
    let screen = OwnedImage::filled(120, 80, 0).unwrap();

    let matches = Matcher::scalar()
        .find_all(&screen, &plan_of(&tpl, tw, th))
        .unwrap();
    assert!(matches.is_empty());
}

#[test]
fn side_by_side_copies_are_all_recovered() {
    let (tw, th) = (16, 12);
    let tpl = make_template(tw, th);
    let screen = screen_with_copies(120, 40, &tpl, tw, th, &[(4, 10), (44, 10), (84, 10)]);

    let matches = Matcher::scalar()
        .find_all(&screen, &plan_of(&tpl, tw, th))
        .unwrap();

    assert_eq!(matches.len(), 3);
    let mut centers: Vec<(u32, u32)> = matches.iter().map(|m| (m.center_x, m.center_y)).collect();
    centers.sort_unstable();
    assert_eq!(centers, vec![(12, 16), (52, 16), (92, 16)]);
    assert!(matches.iter().all(|m| m.similarity > 0.7));
}

#[test]
fn occurrence_cap_counts_the_first_match() {
    let (tw, th) = (16, 12);
    let tpl = make_template(tw, th);
    let screen = screen_with_copies(120, 40, &tpl, tw, th, &[(4, 10), (44, 10), (84, 10)]);
    let plan = plan_of(&tpl, tw, th);

    for cap in 1..=3 {
        let matcher = Matcher::scalar().with_config(MatchConfig {
            max_occurrences: cap,
            schedule: ScaleSchedule::native_only(),
            ..MatchConfig::default()
        });
        assert_eq!(matcher.find_all(&screen, &plan).unwrap().len(), cap);
    }

    let none = Matcher::scalar().with_config(MatchConfig {
        max_occurrences: 0,
        ..MatchConfig::default()
    });
    assert!(none.find_all(&screen, &plan).unwrap().is_empty());
}

#[test]
fn raising_the_threshold_never_adds_matches() {
    let (tw, th) = (20, 14);
    let tpl = make_template(tw, th);
    let mut screen = screen_with_copies(160, 50, &tpl, tw, th, &[(10, 18)]);

    // Second copy with noise so it scores below the exact one.
    let mut rng = StdRng::seed_from_u64(7);
    for y in 0..th {
        for x in 0..tw {
            let noise: i32 = rng.random_range(-60..=60);
            let value = (tpl[y * tw + x] as i32 + noise).clamp(0, 255) as u8;
            screen.fill_rect(90 + x, 18 + y, 1, 1, value);
        }
    }

    let plan = plan_of(&tpl, tw, th);
    let counts: Vec<usize> = [0.3f32, 0.5, 0.7, 0.9, 0.99]
        .iter()
        .map(|&threshold| {
            Matcher::scalar()
                .with_config(MatchConfig {
                    threshold,
                    schedule: ScaleSchedule::native_only(),
                    ..MatchConfig::default()
                })
                .find_all(&screen, &plan)
                .unwrap()
                .len()
        })
        .collect();

    assert!(counts.windows(2).all(|w| w[0] >= w[1]), "counts {counts:?}");
    assert!(counts[0] >= 2);
    assert_eq!(counts[4], 1);
}

#[test]
fn pyramid_stops_once_the_screen_is_smaller_than_the_template() {
    let tpl = [0u8, 255, 255, 0].repeat(100);
    let plan = plan_of(&tpl, 40, 10);
    let screen = OwnedImage::filled(100, 50, 0).unwrap();

    let matcher = Matcher::new(CountingCorrelator {
        calls: AtomicUsize::new(0),
    });
    assert!(matcher.find_all(&screen, &plan).unwrap().is_empty());
    // Widths 100 down to 40 are searched; 36 < 40 ends the pyramid.
    assert_eq!(matcher.correlator().calls.load(Ordering::Relaxed), 15);
}

#[test]
fn template_larger_than_screen_is_not_an_error() {
    let tpl = make_template(64, 64);
    let screen = OwnedImage::filled(32, 32, 0).unwrap();
    let matches = Matcher::scalar()
        .find_all(&screen, &plan_of(&tpl, 64, 64))
        .unwrap();
    assert!(matches.is_empty());
}

#[test]
fn upscaled_occurrence_maps_back_to_source_pixels() {
    // 4x4 blocks of 8 px with distinct levels.
    let (tw, th) = (32, 32);
    let mut tpl = vec![0u8; tw * th];
    for y in 0..th {
        for x in 0..tw {
            let (bx, by) = (x / 8, y / 8);
            tpl[y * tw + x] = (((bx * 7 + by * 13 + bx * by * 5) % 11) * 23 + 10) as u8;
        }
    }

    // Nearest-neighbour 2x copy at (60, 40).
    let mut screen = OwnedImage::filled(200, 160, 0).unwrap();
    for y in 0..th * 2 {
        for x in 0..tw * 2 {
            screen.fill_rect(60 + x, 40 + y, 1, 1, tpl[(y / 2) * tw + x / 2]);
        }
    }

    let matcher = Matcher::scalar().with_config(MatchConfig {
        threshold: 0.5,
        max_occurrences: 1,
        ..MatchConfig::default()
    });
    let matches = matcher.find_all(&screen, &plan_of(&tpl, tw, th)).unwrap();

    assert_eq!(matches.len(), 1);
    let m = matches[0];
    assert!(m.center_x.abs_diff(92) <= 4, "center_x {}", m.center_x);
    assert!(m.center_y.abs_diff(72) <= 4, "center_y {}", m.center_y);
    assert!((56..=70).contains(&m.width), "width {}", m.width);
    assert!((56..=70).contains(&m.height), "height {}", m.height);
}

#[test]
fn ccorr_finds_the_exact_copy() {
    let (tw, th) = (16, 12);
    let tpl = make_template(tw, th);
    let screen = screen_with_copies(80, 40, &tpl, tw, th, &[(30, 14)]);

    let matches = Matcher::scalar()
        .with_config(MatchConfig {
            method: Method::CcorrNormed,
            threshold: 0.99,
            max_occurrences: 1,
            schedule: ScaleSchedule::native_only(),
            ..MatchConfig::default()
        })
        .find_all(&screen, &plan_of(&tpl, tw, th))
        .unwrap();

    assert_eq!(matches.len(), 1);
    assert_eq!((matches[0].left(), matches[0].top()), (30, 14));
}

#[test]
fn sqdiff_scores_are_raw_distances() {
    let (tw, th) = (16, 12);
    let tpl = make_template(tw, th);
    let screen = screen_with_copies(80, 40, &tpl, tw, th, &[(30, 14)]);
    let plan = plan_of(&tpl, tw, th);

    let map = ScalarCorrelator
        .correlate(screen.view(), &plan, Method::SqdiffNormed)
        .unwrap();
    let exact = map.get(30, 14).unwrap();
    assert!(exact.abs() < 1e-4, "exact placement scored {exact}");

    // The maximum is the worst placement, not the copy.
    let (best, loc) = map.max_loc().unwrap();
    assert_ne!(loc, (30, 14));
    assert!(best > exact);
}

#[test]
fn perturbed_copy_reports_its_own_score() {
    let (tw, th) = (40, 30);
    let tpl = make_template(tw, th);
    let mut rng = StdRng::seed_from_u64(11);
    let noisy: Vec<u8> = tpl
        .iter()
        .map(|&v| (v as i32 + rng.random_range(-20..=20)).clamp(0, 255) as u8)
        .collect();
    let screen = screen_with_copies(200, 150, &noisy, tw, th, &[(100, 80)]);
    let plan = plan_of(&tpl, tw, th);

    let matches = Matcher::scalar()
        .with_config(MatchConfig {
            threshold: 0.7,
            schedule: ScaleSchedule::native_only(),
            ..MatchConfig::default()
        })
        .find_all(&screen, &plan)
        .unwrap();

    assert_eq!(matches.len(), 1);
    let m = matches[0];
    assert_eq!((m.left(), m.top()), (100, 80));

    let expected = ScalarCorrelator
        .correlate(screen.view(), &plan, Method::CcoeffNormed)
        .unwrap()
        .get(100, 80)
        .unwrap();
    assert_eq!(m.similarity, expected);
    assert!(m.similarity > 0.9 && m.similarity < 0.999, "similarity {}", m.similarity);
}
