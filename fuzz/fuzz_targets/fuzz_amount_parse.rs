#![no_main]

use libfuzzer_sys::fuzz_target;

use atlas_types::TokenAmount;

fuzz_target!(|data: &[u8]| {
    let Ok(raw) = std::str::from_utf8(data) else {
        return;
    };
    if let Ok(amount) = raw.parse::<TokenAmount>() {
        let shown = amount.to_string();
        assert_eq!(shown.parse::<TokenAmount>(), Ok(amount));
    }
});
