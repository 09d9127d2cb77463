#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use atlas_execution::{to_percentage, to_shares};
use atlas_types::Percentage;

#[derive(Arbitrary, Debug)]
struct ConvertInput {
    thousandths: u32,
    total_shares: u64,
}

fuzz_target!(|data: ConvertInput| {
    let requested = Percentage::from_thousandths(data.thousandths);
    let Ok(shares) = to_shares(requested, data.total_shares) else {
        return;
    };
    assert!(shares <= data.total_shares);

    let back = to_percentage(shares, data.total_shares).expect("shares within supply");
    assert!(back <= requested);
});
