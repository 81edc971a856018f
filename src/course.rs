use std::collections::HashSet;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Slots are compared after rounding to 2 decimal places; two values closer
/// than this are the same slot.
const SLOT_TOLERANCE: Decimal = dec!(0.01);

/// Display status of a single slot on the course
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotStatus {
    Sponsored,
    Available,
}

/// Generate the ascending slot sequence for a course.
///
/// Slots run from `increment` up to `total_miles` stepping by `increment`.
/// The final element always equals `total_miles`: when the stepped sequence
/// does not land on it (e.g. a 13.1-mile half marathon with 1-mile slots),
/// the fractional finish is appended as its own slot.
///
/// Inputs are validated at runner creation; non-positive values yield an
/// empty course here rather than a panic.
pub fn generate_slots(total_miles: Decimal, increment: Decimal) -> Vec<Decimal> {
    if total_miles <= Decimal::ZERO || increment <= Decimal::ZERO {
        return Vec::new();
    }

    let total = total_miles.round_dp(2);
    let mut slots = Vec::new();
    let mut cursor = increment;

    while cursor <= total {
        slots.push(cursor.round_dp(2));
        cursor += increment;
    }

    let lands_on_finish = slots
        .last()
        .map(|last| (*last - total).abs() < SLOT_TOLERANCE)
        .unwrap_or(false);

    if !lands_on_finish {
        slots.push(total);
    }

    slots
}

/// Classify a slot against the set of confirmed mile numbers.
pub fn classify_slot(slot: Decimal, confirmed: &HashSet<Decimal>) -> SlotStatus {
    if confirmed.contains(&normalize_slot(slot)) {
        SlotStatus::Sponsored
    } else {
        SlotStatus::Available
    }
}

/// Normalize a mile number for membership checks.
pub fn normalize_slot(slot: Decimal) -> Decimal {
    slot.round_dp(2).normalize()
}

/// Display label for landmark slots: the first slot, the slot nearest the
/// midpoint (within half an increment) and the finish. Purely a display
/// hint; has no effect on availability.
pub fn featured_label(
    slot: Decimal,
    total_miles: Decimal,
    increment: Decimal,
) -> Option<&'static str> {
    let slot = slot.round_dp(2);
    let total = total_miles.round_dp(2);

    if (slot - increment.round_dp(2)).abs() < SLOT_TOLERANCE {
        return Some("Start");
    }

    if (slot - total).abs() < SLOT_TOLERANCE {
        return Some("Finish");
    }

    let halfway = total / dec!(2);
    if (slot - halfway).abs() < increment / dec!(2) {
        return Some("Halfway");
    }

    None
}

/// Landmark slots of a course paired with their labels, in course order.
pub fn featured_slots(total_miles: Decimal, increment: Decimal) -> Vec<(Decimal, &'static str)> {
    generate_slots(total_miles, increment)
        .into_iter()
        .filter_map(|slot| featured_label(slot, total_miles, increment).map(|label| (slot, label)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_half_marathon_slots() {
        // 13.1 with 1-mile slots: 1..13 plus the fractional finish
        let slots = generate_slots(dec!(13.1), dec!(1));
        assert_eq!(slots.len(), 14);
        assert_eq!(slots[0], dec!(1));
        assert_eq!(slots[12], dec!(13));
        assert_eq!(*slots.last().unwrap(), dec!(13.1));
    }

    #[test]
    fn test_whole_number_course_has_no_extra_slot() {
        let slots = generate_slots(dec!(5), dec!(1));
        assert_eq!(slots, vec![dec!(1), dec!(2), dec!(3), dec!(4), dec!(5)]);
    }

    #[test]
    fn test_fractional_increment() {
        // 26.2 in half-mile slots: 52 stepped slots plus the finish
        let slots = generate_slots(dec!(26.2), dec!(0.5));
        assert_eq!(slots.len(), 53);
        assert_eq!(slots[0], dec!(0.5));
        assert_eq!(slots[51], dec!(26.0));
        assert_eq!(*slots.last().unwrap(), dec!(26.2));
    }

    #[test]
    fn test_slots_are_strictly_increasing_with_ceil_length() {
        let cases = [
            (dec!(26.2), dec!(1)),
            (dec!(13.1), dec!(1)),
            (dec!(10), dec!(3)),
            (dec!(0.3), dec!(1)),
        ];

        for (total, increment) in cases {
            let slots = generate_slots(total, increment);
            let expected_len = (total / increment).ceil();
            assert_eq!(Decimal::from(slots.len() as i64), expected_len);
            assert!(slots.windows(2).all(|w| w[0] < w[1]));
            assert!((*slots.last().unwrap() - total).abs() <= dec!(0.01));
        }
    }

    #[test]
    fn test_increment_larger_than_total_yields_single_finish_slot() {
        let slots = generate_slots(dec!(0.3), dec!(1));
        assert_eq!(slots, vec![dec!(0.3)]);
    }

    #[test]
    fn test_non_positive_inputs_yield_empty_course() {
        assert!(generate_slots(dec!(0), dec!(1)).is_empty());
        assert!(generate_slots(dec!(-5), dec!(1)).is_empty());
        assert!(generate_slots(dec!(10), dec!(0)).is_empty());
    }

    #[test]
    fn test_classify_slot_by_normalized_equality() {
        let confirmed: HashSet<Decimal> =
            [dec!(5), dec!(13.1)].iter().map(|m| normalize_slot(*m)).collect();

        assert_eq!(classify_slot(dec!(5.00), &confirmed), SlotStatus::Sponsored);
        assert_eq!(classify_slot(dec!(13.1), &confirmed), SlotStatus::Sponsored);
        assert_eq!(classify_slot(dec!(6), &confirmed), SlotStatus::Available);
    }

    #[test]
    fn test_featured_labels_for_marathon() {
        let total = dec!(26.2);
        let inc = dec!(1);

        assert_eq!(featured_label(dec!(1), total, inc), Some("Start"));
        assert_eq!(featured_label(dec!(13), total, inc), Some("Halfway"));
        assert_eq!(featured_label(dec!(26.2), total, inc), Some("Finish"));
        assert_eq!(featured_label(dec!(7), total, inc), None);
    }

    #[test]
    fn test_halfway_window_is_half_an_increment() {
        // midpoint of 26.2 is 13.1; with 1-mile slots both 13 and 13.1
        // fall inside the window, 12 does not
        assert_eq!(featured_label(dec!(13.1), dec!(26.2), dec!(1)), Some("Halfway"));
        assert_eq!(featured_label(dec!(12), dec!(26.2), dec!(1)), None);
    }

    #[test]
    fn test_featured_slots_for_marathon_course() {
        let featured = featured_slots(dec!(26.2), dec!(1));
        assert_eq!(
            featured,
            vec![
                (dec!(1), "Start"),
                (dec!(13), "Halfway"),
                (dec!(26.2), "Finish"),
            ]
        );
    }

    #[test]
    fn test_first_slot_of_fractional_increment_is_start() {
        assert_eq!(featured_label(dec!(0.5), dec!(26.2), dec!(0.5)), Some("Start"));
        assert_eq!(featured_label(dec!(1), dec!(26.2), dec!(0.5)), None);
    }
}
