//! Reference examples of request normalization.
//!
//! Each case is `(requested w, h, stretch, keep_aspect) → (w, h)` against a
//! fixed original, mirroring the table published for API consumers.

use image_variants::geometry::{AspectRatio, Crop, Dimensions};
use image_variants::variant::{
    ImageAttributes, ImageFormat, VariantNormalizer, density_multiplier,
};
use image_variants::{ResolvedVariant, VariantRequest};

fn original(width: u32, height: u32) -> ImageAttributes {
    ImageAttributes::new(ImageFormat::Jpeg, Dimensions::new(width, height))
}

fn normalize(request: &VariantRequest, original: ImageAttributes) -> ResolvedVariant {
    VariantNormalizer::default()
        .normalize(request, &original)
        .unwrap_or_else(|e| panic!("{request:?} against {:?}: {e}", original.dimensions))
}

fn request(width: u32, height: u32, stretch: bool, keep_aspect: bool) -> VariantRequest {
    VariantRequest {
        stretch,
        keep_aspect,
        ..VariantRequest::sized(width, height)
    }
}

fn check(original: ImageAttributes, cases: &[(u32, u32, bool, bool, u32, u32)]) {
    for &(w, h, stretch, keep, expected_w, expected_h) in cases {
        let variant = normalize(&request(w, h, stretch, keep), original);
        assert_eq!(
            variant.output,
            Dimensions::new(expected_w, expected_h),
            "{w}x{h} stretch={stretch} keep_aspect={keep} on {}",
            original.dimensions
        );
    }
}

// =============================================================================
// 1024x768 original
// =============================================================================

#[test]
fn valid_dimensions_are_kept() {
    check(
        original(1024, 768),
        &[
            (800, 700, false, false, 800, 700),
            (800, 700, true, false, 800, 700),
            (1024, 768, false, false, 1024, 768),
            (1024, 768, true, false, 1024, 768),
        ],
    );
}

#[test]
fn without_stretch_exceeding_sizes_shrink_to_fit() {
    check(
        original(1024, 768),
        &[
            (1024, 1000, false, false, 786, 768),
            (1200, 768, false, false, 1024, 655),
            (1600, 1200, false, false, 1024, 768),
            (1600, 1500, false, false, 819, 768),
        ],
    );
}

#[test]
fn with_stretch_exceeding_sizes_are_allowed() {
    check(
        original(1024, 768),
        &[
            (1024, 1000, true, false, 1024, 1000),
            (1200, 768, true, false, 1200, 768),
            (1600, 1200, true, false, 1600, 1200),
        ],
    );
}

#[test]
fn unspecified_side_follows_original_proportions() {
    check(
        original(1024, 768),
        &[
            (1024, 0, false, false, 1024, 768),
            (1024, 0, true, false, 1024, 768),
            (0, 768, false, false, 1024, 768),
            (0, 768, true, false, 1024, 768),
            (1600, 0, false, false, 1024, 768),
            (1600, 0, true, false, 1600, 1200),
            (0, 1200, false, false, 1024, 768),
            (0, 1200, true, false, 1600, 1200),
        ],
    );
}

#[test]
fn keep_aspect_enforces_original_ratio() {
    check(original(1024, 768), &[(800, 200, false, true, 800, 600)]);
    check(original(1000, 500), &[(300, 90, false, true, 300, 150)]);
    check(original(500, 1000), &[(300, 90, false, true, 45, 90)]);
}

#[test]
fn keep_aspect_without_stretch_takes_largest_fitting_size() {
    check(original(1000, 500), &[(3000, 900, false, true, 1000, 500)]);
    check(original(500, 1000), &[(3000, 900, false, true, 450, 900)]);
}

#[test]
fn keep_aspect_with_stretch_may_exceed_original() {
    check(original(1000, 500), &[(2000, 2000, true, true, 2000, 1000)]);
    check(original(50, 100), &[(2000, 2000, true, true, 1000, 2000)]);
}

#[test]
fn exceeding_sizes_snap_to_largest_side() {
    check(
        original(100, 100),
        &[
            (10000, 1000, false, false, 100, 10),
            (1000, 10000, false, false, 10, 100),
            (1000, 100, false, false, 100, 10),
            (100, 1000, false, false, 10, 100),
        ],
    );
}

#[test]
fn no_size_and_no_crop_is_the_unmodified_original() {
    let variant = normalize(&VariantRequest::default(), original(1024, 768));
    assert!(variant.is_empty());
    let stretched = normalize(&VariantRequest::default().stretched(), original(1024, 768));
    assert_eq!(variant, stretched);
}

// =============================================================================
// 628x419 original
// =============================================================================

#[test]
fn smaller_than_original() {
    check(original(628, 419), &[(500, 300, false, false, 500, 300)]);
}

#[test]
fn larger_than_original() {
    check(
        original(628, 419),
        &[
            (700, 500, false, false, 587, 419),
            (700, 500, true, false, 700, 500),
        ],
    );
}

#[test]
fn one_side_and_original_proportions() {
    check(
        original(628, 419),
        &[
            (700, 0, false, false, 628, 419),
            (0, 300, false, false, 450, 300),
            (700, 0, true, false, 700, 467),
        ],
    );
}

#[test]
fn largest_image_fitting_in_frame() {
    check(
        original(628, 419),
        &[
            (700, 700, false, true, 628, 419),
            (500, 300, false, true, 500, 334),
        ],
    );
}

#[test]
fn other_output_format_keeps_size() {
    for format in [ImageFormat::Png, ImageFormat::Gif] {
        let variant = normalize(&VariantRequest::default().as_format(format), original(628, 419));
        assert_eq!(variant.format, format);
        assert_eq!(variant.target_dimensions(), Dimensions::new(628, 419));
    }
}

#[test]
fn ratio_arithmetic_for_628x419() {
    let ratio = AspectRatio::from_sides(628, 419).unwrap();
    assert_eq!(ratio.calculate_height_for_width(700).unwrap(), 467);
    assert_eq!(ratio.calculate_width_for_height(300).unwrap(), 450);
}

// =============================================================================
// Crops
// =============================================================================

#[test]
fn crop_without_size_uses_crop_size() {
    let variant = normalize(
        &VariantRequest::default().cropped(Crop::new(50, 50, 700, 700)),
        original(1024, 768),
    );
    assert_eq!(variant.output, Dimensions::new(700, 700));
    assert_eq!(variant.crop, Crop::new(50, 50, 700, 700));
}

#[test]
fn crop_covering_original_is_the_whole_image() {
    let whole = Crop::whole(Dimensions::new(1024, 768));
    for crop in [Crop::new(0, 0, 1024, 768), Crop::new(-1, -1, 2000, 2000)] {
        let variant = normalize(&VariantRequest::default().cropped(crop), original(1024, 768));
        assert_eq!(variant.crop, whole);
        assert_eq!(variant.output, Dimensions::new(1024, 768));
    }
}

#[test]
fn crop_hanging_off_the_origin_is_clamped() {
    let variant = normalize(
        &VariantRequest::default().cropped(Crop::new(-5, -10, 200, 300)),
        original(200, 300),
    );
    assert_eq!(variant.crop, Crop::new(0, 0, 195, 290));
}

#[test]
fn without_stretch_size_is_limited_to_crop() {
    let request = VariantRequest::sized(600, 400).cropped(Crop::new(50, 50, 300, 200));
    assert_eq!(
        normalize(&request, original(1024, 768)).output,
        Dimensions::new(300, 200)
    );
}

#[test]
fn with_stretch_missing_side_follows_crop() {
    let crop = Crop::new(50, 50, 300, 200);
    for (w, h) in [(600, 0), (0, 400)] {
        let request = VariantRequest::sized(w, h).cropped(crop).stretched();
        assert_eq!(
            normalize(&request, original(1024, 768)).output,
            Dimensions::new(600, 400)
        );
    }
}

// =============================================================================
// Density multipliers
// =============================================================================

fn multiplier_for(original: ImageAttributes, w: u32, h: u32, crop: Option<Crop>) -> (u32, u32) {
    let mut request = VariantRequest::sized(w, h).stretched();
    request.crop = crop;
    let variant = normalize(&request, original);
    let m = density_multiplier(variant.output, variant.crop.dimensions());
    (m.horizontal, m.vertical)
}

#[test]
fn multiplier_from_output_without_crop() {
    let o = original(1024, 768);
    assert_eq!(multiplier_for(o, 800, 700, None), (1, 1));
    assert_eq!(multiplier_for(o, 1024, 768, None), (1, 1));
    assert_eq!(multiplier_for(o, 1025, 768, None), (2, 1));
    assert_eq!(multiplier_for(o, 1024, 769, None), (1, 2));
}

#[test]
fn multiplier_from_crop_and_output() {
    let o = original(100, 100);
    assert_eq!(multiplier_for(o, 1000, 1000, None), (10, 10));
    let cases = [
        (1000, 1000, Crop::new(1, 1, 5, 10), (200, 100)),
        (1000, 1000, Crop::new(1, 1, 10, 5), (100, 200)),
        (1000, 1000, Crop::new(1, 1, 10, 10), (100, 100)),
        (500, 1000, Crop::new(1, 1, 10, 10), (50, 100)),
        (1000, 500, Crop::new(1, 1, 10, 10), (100, 50)),
        (500, 1000, Crop::new(1, 1, 5, 10), (100, 100)),
        (1000, 500, Crop::new(1, 1, 10, 5), (100, 100)),
    ];
    for (w, h, crop, expected) in cases {
        assert_eq!(multiplier_for(o, w, h, Some(crop)), expected, "{w}x{h} {crop}");
    }
}

// =============================================================================
// Aspect ratio without a size
// =============================================================================

fn ratio(text: &str) -> AspectRatio {
    text.parse().unwrap()
}

#[test]
fn aspect_only_takes_largest_matching_region() {
    let o = original(1600, 1200);
    let cases = [("16/9", 1600, 900), ("3/4", 900, 1200), ("4/3", 1600, 1200)];
    for (r, w, h) in cases {
        let variant = normalize(&VariantRequest::default().with_aspect_ratio(ratio(r)), o);
        assert_eq!(variant.output, Dimensions::new(w, h), "{r} on {}", o.dimensions);
    }
}

#[test]
fn aspect_only_stays_inside_original_when_stretched() {
    let o = original(600, 100);
    for stretch in [false, true] {
        let request = VariantRequest { stretch, ..VariantRequest::default() }
            .with_aspect_ratio(ratio("4/3"));
        let variant = normalize(&request, o);
        assert_eq!(variant.output, Dimensions::new(133, 100), "stretch={stretch}");
    }
}

// =============================================================================
// Maximum bounds on 1600x1200
// =============================================================================

#[test]
fn max_bounds_shrink_the_output() {
    let o = original(1600, 1200);
    let cases = [
        (VariantRequest::default().bounded(640, 480), 640, 480),
        (VariantRequest::sized(800, 600).bounded(640, 480), 640, 480),
        (VariantRequest::sized(400, 300).bounded(640, 480), 400, 300),
        (VariantRequest::default().bounded(800, 0), 800, 600),
        (VariantRequest::default().bounded(0, 600), 800, 600),
        (VariantRequest::default().bounded(2000, 2000), 1600, 1200),
    ];
    for (request, w, h) in cases {
        assert_eq!(normalize(&request, o).output, Dimensions::new(w, h), "{request:?}");
    }
}

#[test]
fn max_bounds_follow_explicit_aspect_ratio() {
    let o = original(1600, 1200);
    let cases = [
        ((2000, 0), 1600, 900),
        ((1280, 0), 1280, 720),
        ((0, 720), 1280, 720),
    ];
    for ((mw, mh), w, h) in cases {
        let request = VariantRequest::default()
            .with_aspect_ratio(ratio("16/9"))
            .bounded(mw, mh);
        assert_eq!(normalize(&request, o).output, Dimensions::new(w, h), "max {mw}x{mh}");
    }
}

// =============================================================================
// Crop picked inside a display box
// =============================================================================

#[test]
fn crop_box_maps_display_coordinates_onto_original() {
    let o = original(1600, 1200);
    let display = Dimensions::new(450, 300);
    let cases = [
        (Crop::new(0, 0, 450, 300), Crop::new(0, 0, 1600, 1200)),
        (Crop::new(0, 0, 225, 150), Crop::new(0, 0, 900, 600)),
        (Crop::new(100, 75, 200, 150), Crop::new(400, 300, 800, 600)),
    ];
    for (crop, expected) in cases {
        let request = VariantRequest::default().cropped(crop.with_bounds(display));
        let variant = normalize(&request, o);
        assert_eq!(variant.crop, expected, "{crop}");
        assert_eq!(variant.output, expected.dimensions(), "{crop}");
    }
}
