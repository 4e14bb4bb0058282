#![no_main]

use libfuzzer_sys::fuzz_target;
use scopecfg::config::ConfigLoader;

fuzz_target!(|data: &[u8]| {
    if let Ok(yaml) = std::str::from_utf8(data) {
        // Malformed input must surface as an error or issues, never a panic.
        if let Ok(result) = ConfigLoader::with_defaults().load_from_str(yaml) {
            let _ = scopecfg::config::validate(&result.config);
        }
    }
});
