use concord::deliberation::{Polarity, PolarityMarkers};

#[test]
fn negative_phrase_wins_over_its_positive_prefix() {
    let markers = PolarityMarkers::default();
    assert_eq!(markers.polarity(0, "you should not quit"), Some(Polarity::Negative));
    assert_eq!(markers.polarity(0, "you shouldn't quit"), Some(Polarity::Negative));
    assert_eq!(markers.polarity(0, "you should quit"), Some(Polarity::Positive));
    assert_eq!(markers.polarity(0, "quit now"), None);
}

#[test]
fn markers_match_whole_words_only() {
    let markers = PolarityMarkers::default();
    assert_eq!(markers.contradicts("keep going", "restart later"), None);
    assert_eq!(markers.contradicts("we can try", "we cannot try"), Some(8));
}

#[test]
fn first_matching_pair_decides() {
    let markers = PolarityMarkers::default();
    let index = markers
        .contradicts("we should increase the dose", "we should not decrease the dose")
        .expect("texts disagree");
    assert_eq!(index, 0);
}

#[test]
fn custom_policy_replaces_defaults() {
    let markers = PolarityMarkers::new([("yes", "no")]).expect("valid markers");
    assert_eq!(markers.len(), 1);
    assert_eq!(markers.contradicts("yes please", "no thanks"), Some(0));
    assert_eq!(markers.contradicts("should rest", "should not rest"), None);
}
