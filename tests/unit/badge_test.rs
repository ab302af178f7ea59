use rstest::rstest;

use tabsound::services::badge::{render_badge, Badge, BADGE_COLOR};

#[test]
fn test_zero_count_renders_blank() {
    let badge = render_badge(0);
    assert_eq!(badge.text, "");
    assert_eq!(badge.color, None);
    assert_eq!(badge, Badge::blank());
}

#[rstest]
#[case(1, "1")]
#[case(2, "2")]
#[case(9, "9")]
#[case(42, "42")]
fn test_nonzero_count_renders_decimal(#[case] count: usize, #[case] expected: &str) {
    let badge = render_badge(count);
    assert_eq!(badge.text, expected);
    assert_eq!(badge.color.as_deref(), Some(BADGE_COLOR));
}

#[test]
fn test_color_is_fixed() {
    // One highlight color for any nonzero count.
    assert_eq!(render_badge(1).color, render_badge(500).color);
}
