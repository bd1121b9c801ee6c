#![no_main]

use article_markdown_converter::converter::{ConversionOptions, MarkdownConverter};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Conversion must never panic; errors are fine
    for preserve_links in [false, true] {
        let converter = MarkdownConverter::with_options(ConversionOptions {
            preserve_links,
            max_length: 256,
            continuation_hint: "...".to_string(),
        });
        if let Ok(markdown) = converter.convert_bytes(data) {
            assert!(markdown.chars().count() <= 256 + 3);
        }
    }
});
