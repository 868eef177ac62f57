#![no_main]

use libfuzzer_sys::fuzz_target;
use testbase::generator::ScriptDescriptor;
use testbase_core::naming::extract_binaries;

fuzz_target!(|data: &[u8]| {
    // Convert bytes to UTF-8 string (ignore invalid UTF-8)
    if let Ok(s) = std::str::from_utf8(data) {
        let descriptor = ScriptDescriptor::scan("fuzz.py", s);
        for binary in descriptor
            .declared_binaries_combined
            .iter()
            .chain(&descriptor.declared_binaries_split)
        {
            assert!(!binary.is_empty());
            assert!(!binary.contains(char::is_whitespace));
        }
        let _ = extract_binaries(s);
    }
});
