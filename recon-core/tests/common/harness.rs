//! Runs fixture cases whole and in random chunks

use crate::common::{Gen, TestCase};
use recon_core::{recon, StreamingParser, Value};

/// Result of running a test
#[derive(Debug)]
pub struct TestResult {
    pub passed: bool,
    pub input: String,
    pub chunks: Vec<usize>,
    pub seed: u64,
    pub errors: Vec<String>,
}

impl TestResult {
    /// Print detailed failure info
    pub fn print_failure(&self, case_id: &str) {
        eprintln!("\n=== FAILED: {} ===", case_id);
        eprintln!("Seed: {} (set RECON_TEST_SEED={} to reproduce)", self.seed, self.seed);
        eprintln!("\nInput:\n{}", self.input);
        if !self.chunks.is_empty() {
            eprintln!("\nChunk lengths: {:?}", self.chunks);
        }
        eprintln!("\nErrors:");
        for e in &self.errors {
            eprintln!("  - {}", e);
        }
    }
}

fn check(case: &TestCase, outcome: &Result<Value, recon_core::Diagnostic>, errors: &mut Vec<String>) {
    match (outcome, &case.canonical, &case.error) {
        (Ok(value), Some(canonical), None) => {
            let written = recon::to_string(value);
            if &written != canonical {
                errors.push(format!("wrote {:?}, expected {:?}", written, canonical));
            }
            if recon::size_of(value) != written.len() {
                errors.push(format!("size_of {} != written length {}", recon::size_of(value), written.len()));
            }
            match recon::parse(&written) {
                Ok(reparsed) if &reparsed == value => {}
                Ok(reparsed) => errors.push(format!("reparsed {:?}, expected {:?}", reparsed, value)),
                Err(diagnostic) => errors.push(format!("canonical text failed to parse: {}", diagnostic)),
            }
        }
        (Ok(_), None, None) => {}
        (Err(diagnostic), _, Some(message)) => {
            if !diagnostic.message.contains(message.as_str()) {
                errors.push(format!("diagnostic {:?} does not mention {:?}", diagnostic.message, message));
            }
        }
        (Ok(value), _, Some(_)) => errors.push(format!("expected an error, parsed {:?}", value)),
        (Err(diagnostic), _, None) => errors.push(format!("unexpected error: {}", diagnostic)),
    }
}

/// Parse the whole document at once
pub fn run_test(case: &TestCase) -> TestResult {
    let mut errors = Vec::new();
    check(case, &recon::parse(&case.recon), &mut errors);
    TestResult {
        passed: errors.is_empty(),
        input: case.recon.clone(),
        chunks: Vec::new(),
        seed: 0,
        errors,
    }
}

/// Feed the document as random byte chunks, which may split codepoints
pub fn run_chunked(case: &TestCase, gen: &mut Gen) -> TestResult {
    let bytes = case.recon.as_bytes();
    let chunks = gen.chunking(bytes.len());
    let mut parser = StreamingParser::new();
    let mut offset = 0;
    for &len in &chunks {
        if parser.feed_bytes(&bytes[offset..offset + len]).done {
            break;
        }
        offset += len;
    }
    let outcome = parser.finish();

    let mut errors = Vec::new();
    check(case, &outcome, &mut errors);
    if let (Ok(whole), Ok(chunked)) = (recon::parse(&case.recon), &outcome) {
        if &whole != chunked {
            errors.push(format!("chunked {:?} != whole {:?}", chunked, whole));
        }
    }
    TestResult {
        passed: errors.is_empty(),
        input: case.recon.clone(),
        chunks,
        seed: gen.seed,
        errors,
    }
}
