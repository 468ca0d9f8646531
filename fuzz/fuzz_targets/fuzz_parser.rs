#![no_main]

use libfuzzer_sys::fuzz_target;
use looptrace::parser::Parser;

fuzz_target!(|data: &[u8]| {
    let Ok(source) = std::str::from_utf8(data) else {
        return;
    };

    if source.len() > 100_000 {
        return;
    }

    // Either a program or a SyntaxError, never a panic
    let _ = Parser::new(source).parse_program();
});
