//! Parse Recon from stdin in chunks and print its canonical form.
//!
//! RUST_LOG=recon_core=trace cargo run --example stdin_parse < file.recon

use std::io::Read;

use recon_core::{recon, StreamingParser};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let mut stdin = std::io::stdin().lock();
    let mut source = Vec::new();
    let mut parser = StreamingParser::new().with_id("<stdin>");
    let mut chunk = [0u8; 4096];
    loop {
        let n = stdin.read(&mut chunk).unwrap();
        if n == 0 {
            break;
        }
        source.extend_from_slice(&chunk[..n]);
        if parser.feed_bytes(&chunk[..n]).done {
            break;
        }
    }

    match parser.finish() {
        Ok(value) => println!("{}", recon::to_string(&value)),
        Err(diagnostic) => {
            eprintln!("{}", diagnostic.render(&String::from_utf8_lossy(&source)));
            std::process::exit(1);
        }
    }
}
