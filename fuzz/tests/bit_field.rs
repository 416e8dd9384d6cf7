//! Bit-field extraction agrees with a shift-and-mask reference, and
//! out-of-word ranges are always rejected.

use scmi_core::bits;

fn main() {
    bolero::check!()
        .with_type::<(u32, u8, u8)>()
        .for_each(|&(word, low, high)| {
            let (low, high) = (u32::from(low), u32::from(high));
            let extracted = bits::extract(word, low, high);
            let reserved = bits::reserved_zero(word, low, high);

            if low > high || high >= 32 {
                assert!(extracted.is_err());
                assert!(reserved.is_err());
                return;
            }

            let width = high - low + 1;
            let reference = (u64::from(word) >> low) & ((1u64 << width) - 1);
            assert_eq!(extracted, Ok(reference as u32));
            assert_eq!(reserved, Ok(reference == 0));
        });
}
