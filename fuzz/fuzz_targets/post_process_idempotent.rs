#![no_main]

use article_markdown_converter::post_process;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    for preserve_links in [false, true] {
        let once = post_process(data, preserve_links, 0, "");
        let twice = post_process(&once, preserve_links, 0, "");
        assert_eq!(once, twice);
    }
});
