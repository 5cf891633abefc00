//! DHAT heap profiler for richtext-stream.
//!
//! Profiles allocation patterns across the layout pipeline:
//! tokenize -> layout -> relayout.
//!
//! Usage:
//!   cargo run -p richtext-stream-heap-profile --release -- [OPTIONS] [INPUTS...]
//!
//! Inputs are UTF-8 text files, or `gen:<words>` for a generated corpus.
//!
//! Outputs dhat-<phase>-<input>.json files in the output directory (default: target/memory).
//! Open in https://nnethercote.github.io/dh_view/dh_view.html

#[global_allocator]
static ALLOC: dhat::Alloc = dhat::Alloc;

use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;

use richtext_stream::{tokenize_plain_text, ParserOptions, SourceString, TokenStream};
use richtext_stream_layout::{
    CommandStream, FixedAdvanceFace, Font, TextLayoutEngine, TextLayoutSettings,
};

const DISPLAY_WIDTH: i32 = 480;
const DISPLAY_HEIGHT: i32 = 800;
const RELAYOUT_PASSES: usize = 16;

const DEFAULT_INPUTS: &[&str] = &["gen:2000", "gen:20000"];

const USAGE: &str = "\
Usage: heap-profile [OPTIONS] [INPUTS...]

Options:
  --phase <tokenize|layout|relayout|full>  Pipeline phase to profile (default: layout)
  --out-dir <DIR>                          Output directory for dhat JSON (default: target/memory)
  --aggregate                              One profile for all inputs (default: one per input)

Inputs are text files or gen:<words>. Each input is profiled in its own
process unless --aggregate is given.";

#[derive(Clone, Copy, PartialEq, Eq)]
enum Phase {
    Tokenize,
    Layout,
    Relayout,
    Full,
}

impl Phase {
    const NAMES: [(&'static str, Phase); 4] = [
        ("tokenize", Phase::Tokenize),
        ("layout", Phase::Layout),
        ("relayout", Phase::Relayout),
        ("full", Phase::Full),
    ];

    fn parse(s: &str) -> Option<Self> {
        Self::NAMES
            .iter()
            .find(|(name, _)| *name == s)
            .map(|(_, phase)| *phase)
    }

    fn name(self) -> &'static str {
        Self::NAMES
            .iter()
            .find(|(_, phase)| *phase == self)
            .map_or("unknown", |(name, _)| *name)
    }
}

/// How this process was asked to run.
enum Mode {
    /// Profile every input under one DHAT session.
    Aggregate,
    /// Spawn one child per input.
    PerInput,
    /// Child process: profile exactly one input.
    Child,
}

struct Options {
    phase: Phase,
    out_dir: PathBuf,
    inputs: Vec<String>,
    mode: Mode,
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Options, String> {
    let mut options = Options {
        phase: Phase::Layout,
        out_dir: PathBuf::from("target/memory"),
        inputs: Vec::new(),
        mode: Mode::PerInput,
    };
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--phase" => {
                let value = args.next().unwrap_or_default();
                options.phase =
                    Phase::parse(&value).ok_or_else(|| format!("unknown phase: {}", value))?;
            }
            "--out-dir" => {
                let value = args.next().ok_or("--out-dir needs a directory")?;
                options.out_dir = PathBuf::from(value);
            }
            "--aggregate" => options.mode = Mode::Aggregate,
            // Internal: set on spawned children.
            "--single-input" => options.mode = Mode::Child,
            _ => options.inputs.push(arg),
        }
    }
    if options.inputs.is_empty() {
        options.inputs = DEFAULT_INPUTS.iter().map(|s| s.to_string()).collect();
    }
    if matches!(options.mode, Mode::Child) && options.inputs.len() != 1 {
        return Err("--single-input expects exactly one input".to_string());
    }
    Ok(options)
}

/// Deterministic word soup with paragraph breaks.
fn generated_text(words: usize) -> String {
    const WORDS: &[&str] = &[
        "the", "layout", "engine", "wraps", "long", "paragraphs", "into", "lines", "of",
        "positioned", "text", "and", "keeps", "each", "command", "compact",
        "extraordinarilylongcompoundword",
    ];
    let mut state = 0x2545_f491_4f6c_dd1du64;
    let mut out = String::with_capacity(words * 7);
    for i in 0..words {
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        if i > 0 {
            out.push(if state % 29 == 0 { '\n' } else { ' ' });
        }
        out.push_str(WORDS[(state >> 8) as usize % WORDS.len()]);
    }
    out
}

fn load_input(input: &str) -> String {
    if let Some(words) = input.strip_prefix("gen:") {
        let words = words
            .parse::<usize>()
            .unwrap_or_else(|e| panic!("bad word count in {}: {}", input, e));
        return generated_text(words);
    }
    std::fs::read_to_string(input).unwrap_or_else(|e| panic!("read {}: {}", input, e))
}

/// Short name of an input for output file names.
fn short_name(input: &str) -> String {
    if let Some(words) = input.strip_prefix("gen:") {
        return format!("generated-{words}");
    }
    Path::new(input)
        .file_stem()
        .map_or_else(|| "unknown".to_string(), |s| s.to_string_lossy().into_owned())
}

fn profile_path(out_dir: &Path, phase: Phase, input: Option<&str>) -> PathBuf {
    match input {
        Some(input) => out_dir.join(format!("dhat-{}-{}.json", phase.name(), short_name(input))),
        None => out_dir.join(format!("dhat-{}.json", phase.name())),
    }
}

fn settings(height: Option<i32>) -> TextLayoutSettings {
    let face = FixedAdvanceFace::new(9, 16)
        .with_glyph('i', 4)
        .with_glyph('l', 4)
        .with_glyph('m', 14)
        .with_glyph('w', 13)
        .with_line_spacing(18);
    TextLayoutSettings::new(Font::uniform(Arc::new(face)), Some(DISPLAY_WIDTH), height)
        .with_hyphenation(true)
}

fn layout_passes(
    input: &str,
    tokens: &TokenStream,
    settings: &TextLayoutSettings,
    passes: usize,
) -> CommandStream {
    let engine = TextLayoutEngine::new();
    let mut stream = CommandStream::new();
    for _ in 0..passes {
        let summary = engine
            .calculate_layout(tokens, &mut stream, settings)
            .unwrap_or_else(|e| panic!("layout {}: {}", input, e));
        if summary.line_count == 0 {
            panic!("layout {} produced zero lines", input);
        }
    }
    stream
}

fn profile_input(input: &str, phase: Phase) {
    let tokens = tokenize_plain_text(SourceString::from(load_input(input)), ParserOptions::default());
    match phase {
        Phase::Tokenize => {}
        Phase::Layout => {
            layout_passes(input, &tokens, &settings(Some(DISPLAY_HEIGHT)), 1);
        }
        // Page-flip simulation: one reused output stream, many passes.
        Phase::Relayout => {
            layout_passes(input, &tokens, &settings(Some(DISPLAY_HEIGHT)), RELAYOUT_PASSES);
        }
        Phase::Full => {
            let stream = layout_passes(input, &tokens, &settings(None), 1);
            let _bytes = stream
                .snapshot()
                .to_postcard()
                .unwrap_or_else(|e| panic!("snapshot {}: {}", input, e));
        }
    }
}

fn run_child(options: &Options) {
    let input = &options.inputs[0];
    let path = profile_path(&options.out_dir, options.phase, Some(input));
    let _profiler = dhat::Profiler::builder().file_name(path).build();
    profile_input(input, options.phase);
}

fn run_aggregate(options: &Options) {
    let path = profile_path(&options.out_dir, options.phase, None);
    eprintln!(
        "heap-profile: phase={}, inputs={} (aggregate), out={}",
        options.phase.name(),
        options.inputs.len(),
        path.display()
    );
    let _profiler = dhat::Profiler::builder().file_name(path).build();
    for input in &options.inputs {
        eprintln!("  profiling: {}", input);
        profile_input(input, options.phase);
    }
}

/// Returns false if any child failed.
fn run_per_input(options: &Options) -> bool {
    let self_exe = std::env::current_exe().unwrap_or_else(|e| {
        eprintln!("Failed to determine own executable path: {}", e);
        std::process::exit(1);
    });
    eprintln!(
        "heap-profile: phase={}, inputs={} (per-input), out={}",
        options.phase.name(),
        options.inputs.len(),
        options.out_dir.display()
    );

    let mut all_ok = true;
    for input in &options.inputs {
        let path = profile_path(&options.out_dir, options.phase, Some(input));
        let status = Command::new(&self_exe)
            .args(["--single-input", "--phase", options.phase.name(), "--out-dir"])
            .arg(&options.out_dir)
            .arg(input)
            .status();
        match status {
            Ok(s) if s.success() => eprintln!("  {} -> {}", input, path.display()),
            Ok(s) => {
                eprintln!("  {} FAILED (exit {})", input, s.code().unwrap_or(-1));
                all_ok = false;
            }
            Err(e) => {
                eprintln!("  {} FAILED to spawn: {}", input, e);
                all_ok = false;
            }
        }
    }
    all_ok
}

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.iter().any(|arg| arg == "--help" || arg == "-h") {
        eprintln!("{}", USAGE);
        return;
    }
    let options = parse_args(args.into_iter()).unwrap_or_else(|e| {
        eprintln!("{}\n\n{}", e, USAGE);
        std::process::exit(1);
    });

    std::fs::create_dir_all(&options.out_dir).unwrap_or_else(|e| {
        eprintln!("Failed to create output dir {}: {}", options.out_dir.display(), e);
        std::process::exit(1);
    });

    match options.mode {
        Mode::Child => run_child(&options),
        Mode::Aggregate => run_aggregate(&options),
        Mode::PerInput => {
            let ok = run_per_input(&options);
            eprintln!("Open profiles in https://nnethercote.github.io/dh_view/dh_view.html");
            if !ok {
                std::process::exit(1);
            }
        }
    }
}
