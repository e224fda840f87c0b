use crate::{
    lookup_register_name,
    sign_extend_16,
    RegId,
};

#[test]
fn sign_extend_preserves_small_positive_values() {
    assert_eq!(sign_extend_16(7), 7);
    assert_eq!(sign_extend_16(0), 0);
}

#[test]
fn sign_extend_negates_high_bit_values() {
    assert_eq!(sign_extend_16(0xFFFF), -1);
    assert_eq!(sign_extend_16(0x8000), -32768);
}

#[test]
fn register_names_round_trip_through_reg_id() {
    for (name, id) in crate::REGISTER_NAMES {
        assert_eq!(lookup_register_name(name), Some(id));
    }
    assert_eq!(lookup_register_name("NOPE"), None);
}

#[test]
fn reg_id_rejects_out_of_range_index() {
    assert!(RegId::new(31).is_some());
    assert!(RegId::new(32).is_none());
}

#[test]
fn reg_id_displays_symbolic_name_when_known() {
    assert_eq!(RegId::PC.to_string(), "$PC");
    assert_eq!(RegId::new(5).unwrap().to_string(), "$5");
}

#[cfg(feature = "serde")]
#[test]
fn reg_id_round_trips_through_json() {
    for id in [RegId::ZERO, RegId::PC, RegId::SP, RegId::new(17).unwrap()] {
        let json = serde_json::to_string(&id).unwrap();
        let back: RegId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
