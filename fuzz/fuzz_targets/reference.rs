#![no_main]
use libfuzzer_sys::fuzz_target;
use versetrace::BibleModel;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        let model = BibleModel::standard();
        for result in model.search(s) {
            if let Ok(passage) = result {
                let formatted = model.formatter().format_passage(&passage);
                let _ = model.parse_passage(&formatted);
            }
        }
    }
});
