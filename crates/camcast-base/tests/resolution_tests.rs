use camcast_base::{RESOLUTION_MODES, Resolution};

#[test]
fn test_new_rejects_zero_sides() {
    assert!(Resolution::new(0, 240).is_none());
    assert!(Resolution::new(320, 0).is_none());
    assert!(Resolution::new(0, 0).is_none());
}

#[test]
fn test_new_accessors() {
    let res = Resolution::new(320, 240).unwrap();
    assert_eq!(res.width(), 320);
    assert_eq!(res.height(), 240);
    assert_eq!(res.pixel_count(), 76800);
    assert_eq!(res.to_string(), "320x240");
}

#[test]
fn test_from_mode_known_ids() {
    assert_eq!(Resolution::from_mode(1), Resolution::new(160, 120));
    assert_eq!(Resolution::from_mode(4), Resolution::new(320, 240));
    assert_eq!(Resolution::from_mode(9), Resolution::new(640, 480));
    assert_eq!(Resolution::from_mode(11), Resolution::new(1024, 768));
}

#[test]
fn test_from_mode_unknown_ids() {
    assert!(Resolution::from_mode(0).is_none());
    assert!(Resolution::from_mode(12).is_none());
}

#[test]
fn test_mode_table_is_dense_and_positive() {
    for (index, (id, res)) in RESOLUTION_MODES.iter().enumerate() {
        assert_eq!(*id as usize, index + 1);
        assert!(res.width() > 0 && res.height() > 0);
        // every mode is convertible as packed 4:2:2
        assert_eq!(res.width() % 2, 0);
    }
}
