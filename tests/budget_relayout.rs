mod common;

use common::budget_alloc::BudgetAlloc;
use common::fixtures::{corpus_text, display_settings, standard_engine};
use richtext_stream::{tokenize_plain_text, ParserOptions, SourceString};
use richtext_stream_layout::CommandStream;

// Reusing an output stream for plain text should not allocate at all once
// its buffers have grown; leave slack for the test harness.
const RELAYOUT_ALLOC_LIMIT: usize = 2;

#[global_allocator]
static ALLOC: BudgetAlloc = BudgetAlloc::new();

#[test]
fn relayout_into_reused_stream_does_not_allocate() {
    let engine = standard_engine();
    let settings = display_settings();
    let text = corpus_text(7, 3000);
    let tokens = tokenize_plain_text(SourceString::from(text.as_str()), ParserOptions::default());
    let mut stream = CommandStream::new();
    engine
        .calculate_layout(&tokens, &mut stream, &settings)
        .unwrap_or_else(|e| panic!("warm-up layout: {}", e));
    let warm = stream.snapshot();

    for pass in 0..8 {
        let (_, usage) = ALLOC.measure(|| {
            engine
                .calculate_layout(&tokens, &mut stream, &settings)
                .unwrap_or_else(|e| panic!("layout pass {}: {}", pass, e))
        });
        assert!(
            usage.alloc_count <= RELAYOUT_ALLOC_LIMIT,
            "pass {} allocated {} times ({:.1}KB peak)",
            pass,
            usage.alloc_count,
            usage.peak_kib()
        );
    }
    assert_eq!(stream.snapshot(), warm);
}
