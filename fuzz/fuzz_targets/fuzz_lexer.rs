#![no_main]

use libfuzzer_sys::fuzz_target;
use looptrace::lexer::{Lexer, TokenKind};

fuzz_target!(|data: &[u8]| {
    let Ok(source) = std::str::from_utf8(data) else {
        return;
    };

    if source.len() > 100_000 {
        return;
    }

    let mut lexer = Lexer::new(source);

    // Consume all tokens; spans must always slice cleanly
    loop {
        let token = lexer.next_token();
        let _ = lexer.slice(token.span);
        if matches!(token.kind, TokenKind::Eof) {
            break;
        }
    }
});
