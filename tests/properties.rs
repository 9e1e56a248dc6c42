//! Property tests for the encoding laws.

use proptest::prelude::*;

use reolkode::ean::{self, Data12, Price, SegmentWidths, encode_modules};

proptest! {
    /// Appending the computed check digit always validates.
    #[test]
    fn prop_checksum_round_trip(data in "[0-9]{12}") {
        let check = ean::compute_check_digit(&data).unwrap();
        prop_assert!(check <= 9);
        let full = format!("{}{}", data, check);
        prop_assert!(ean::validate_ean13(&full).is_ok());
    }

    /// Any other final digit is rejected.
    #[test]
    fn prop_wrong_check_digit_fails(data in "[0-9]{12}", wrong in 0u8..10) {
        let check = ean::compute_check_digit(&data).unwrap();
        prop_assume!(wrong != check);
        let full = format!("{}{}", data, wrong);
        prop_assert!(ean::validate_ean13(&full).is_err());
    }

    /// Total weighted sum including the check digit is a multiple of 10.
    #[test]
    fn prop_weighted_sum_law(data in "[0-9]{12}") {
        let code = Data12::parse(&data).unwrap().into_ean13();
        let sum: u32 = code
            .digits()
            .iter()
            .enumerate()
            .map(|(i, &d)| d as u32 * if i % 2 == 1 { 3 } else { 1 })
            .sum();
        prop_assert_eq!(sum % 10, 0);
    }

    /// Composition always yields exactly shelf + price width digits.
    #[test]
    fn prop_padding_invariant(
        shelf_width in 1usize..12,
        shelf in "[A-Z0-9 -]{0,12}",
        cents in 0u64..1_000_000_000_000,
    ) {
        let widths = SegmentWidths::new(shelf_width, 12 - shelf_width).unwrap();
        let digits = shelf.chars().filter(|c| c.is_ascii_digit()).count();
        let cents = cents % 10u64.pow(widths.price as u32);
        prop_assume!(digits <= widths.shelf);

        let data = ean::compose_data12(&shelf, Price::from_cents(cents as i64), widths).unwrap();
        prop_assert_eq!(data.as_str().len(), 12);
        prop_assert!(data.as_str().bytes().all(|b| b.is_ascii_digit()));
    }

    /// Every valid code expands to 95 modules, the same way every time.
    #[test]
    fn prop_pattern_length_and_purity(data in "[0-9]{12}") {
        let code = Data12::parse(&data).unwrap().into_ean13();
        let first = encode_modules(&code);
        prop_assert_eq!(first.len(), 95);
        prop_assert_eq!(first, encode_modules(&code));
    }
}
