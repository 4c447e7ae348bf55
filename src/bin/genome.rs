//! genome CLI — commit-reveal seeds and trait genomes
//!
//! Commands:
//!   genome hash     — commitment hash of a secret
//!   genome seed     — token seed from its four published inputs
//!   genome encode   — genome record for a seed and bonus level
//!   genome layout   — write the reference trait layout as JSON
//!   genome verify   — re-derive every finalized record in a store
//!   genome demo     — full protocol run (stub or oracle randomness)

use genome_core::protocol::GenomeEvent;
use genome_core::randomness::{OracleConfig, RandomnessSource};
use genome_core::{
    compute_genome, compute_token_seed, hash_secret, CommitmentStore, DeterministicSource,
    GenomeProvider, OracleSource, ProviderConfig, RevealError, TraitConfigRegistry, Word,
    MAX_BONUS,
};
use std::env;

const STORE_FILE: &str = "genome-store.json";
const OPERATOR: &str = "operator";

fn print_usage() {
    println!(
        r#"
╔══════════════════════════════════════════════════════════════╗
║        genome v0.1 — Commit-Reveal Trait Genomes             ║
╚══════════════════════════════════════════════════════════════╝

Usage: genome <command> [options]

Commands:
  hash    <secret>                                Commitment hash of a secret
  seed    <token-id> <bonus> <secret> <random>    Token seed from published inputs
  encode  <seed> <bonus> [layout.json]            Genome for a seed
  layout  <out.json>                              Write the reference trait layout
  verify  [store.json] [layout.json]              Verify finalized records
  demo    [stub|oracle]                           Run the full protocol

Values are hex, with or without 0x. Bonus levels range 0..={max}.

Examples:
  genome hash 0xAA
  genome seed 1 0 0xAA 0xBB
  genome encode 0x19 0
  genome demo oracle
"#,
        max = MAX_BONUS
    );
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        print_usage();
        return;
    }

    let result = match args[1].as_str() {
        "hash" => cmd_hash(&args[2..]),
        "seed" => cmd_seed(&args[2..]),
        "encode" => cmd_encode(&args[2..]),
        "layout" => cmd_layout(&args[2..]),
        "verify" => cmd_verify(&args[2..]),
        "demo" => cmd_demo(&args[2..]).await,
        "help" | "--help" | "-h" => {
            print_usage();
            Ok(())
        }
        other => {
            eprintln!("Unknown command: {}", other);
            print_usage();
            std::process::exit(2);
        }
    };

    if let Err(e) = result {
        eprintln!("  Error: {}", e);
        std::process::exit(1);
    }
}

fn usage_error(usage: &str) -> RevealError {
    RevealError::Storage(format!("usage: {}", usage))
}

fn parse_word(s: &str) -> Result<Word, RevealError> {
    Word::from_hex(s).map_err(|e| RevealError::Storage(format!("invalid hex '{}': {}", s, e)))
}

fn parse_bonus(s: &str) -> Result<u8, RevealError> {
    s.parse()
        .map_err(|_| RevealError::Storage(format!("invalid bonus level '{}'", s)))
}

/// Six-trait layout used when no layout file is given
fn reference_registry() -> Result<TraitConfigRegistry, RevealError> {
    TraitConfigRegistry::reference_layout(&[
        (vec![1, 3, 4, 1], vec![5, 2, 1, 1]),
        (vec![1, 1], vec![1, 1]),
        (vec![1, 1, 1], vec![2, 2, 2]),
        (vec![1], vec![2]),
        (vec![1], vec![2]),
        (vec![1], vec![2]),
    ])
}

fn load_registry(path: Option<&String>) -> Result<TraitConfigRegistry, RevealError> {
    match path {
        Some(p) => TraitConfigRegistry::load(p),
        None => reference_registry(),
    }
}

fn cmd_hash(args: &[String]) -> Result<(), RevealError> {
    let secret = parse_word(args.first().ok_or_else(|| usage_error("genome hash <secret>"))?)?;
    println!("{}", hash_secret(&secret));
    Ok(())
}

fn cmd_seed(args: &[String]) -> Result<(), RevealError> {
    if args.len() < 4 {
        return Err(usage_error("genome seed <token-id> <bonus> <secret> <random>"));
    }
    let token_id: u64 = args[0]
        .parse()
        .map_err(|_| RevealError::Storage(format!("invalid token id '{}'", args[0])))?;
    let bonus = parse_bonus(&args[1])?;
    let secret = parse_word(&args[2])?;
    let random = parse_word(&args[3])?;
    println!("{}", compute_token_seed(token_id, bonus, &secret, &random));
    Ok(())
}

fn cmd_encode(args: &[String]) -> Result<(), RevealError> {
    if args.len() < 2 {
        return Err(usage_error("genome encode <seed> <bonus> [layout.json]"));
    }
    let seed = parse_word(&args[0])?;
    let bonus = parse_bonus(&args[1])?;
    let registry = load_registry(args.get(2))?;
    println!("{}", compute_genome(&registry, &seed, bonus)?);
    Ok(())
}

fn cmd_layout(args: &[String]) -> Result<(), RevealError> {
    let out = args.first().ok_or_else(|| usage_error("genome layout <out.json>"))?;
    reference_registry()?.save(out)?;
    println!("  Reference layout written to {}", out);
    Ok(())
}

fn cmd_verify(args: &[String]) -> Result<(), RevealError> {
    let path = args.first().map(String::as_str).unwrap_or(STORE_FILE);
    let store = CommitmentStore::open(path, OPERATOR)?;
    let registry = load_registry(args.get(1))?;

    println!("\n  {}", store.summary());
    println!("  {}", "-".repeat(60));
    let mut failures = 0;
    for record in store.iter().filter(|r| r.is_finalized()) {
        let ok = record.verify(&registry)?;
        if !ok {
            failures += 1;
        }
        println!("  [{}] {}", if ok { "ok" } else { "FAIL" }, record.summary());
    }
    if failures > 0 {
        return Err(RevealError::Storage(format!("{} records failed verification", failures)));
    }
    Ok(())
}

async fn cmd_demo(args: &[String]) -> Result<(), RevealError> {
    println!(
        r#"
╔══════════════════════════════════════════════════════════════╗
║              genome — Commit-Reveal Demo                     ║
╚══════════════════════════════════════════════════════════════╝
"#
    );
    let config = ProviderConfig::default();
    let store = CommitmentStore::open(STORE_FILE, OPERATOR)?;
    match args.first().map(String::as_str) {
        Some("oracle") => {
            let oracle = OracleSource::new(OracleConfig::default())?;
            run_demo(GenomeProvider::with_parts(config, reference_registry()?, store, oracle)).await
        }
        _ => {
            let stub = DeterministicSource::default();
            run_demo(GenomeProvider::with_parts(config, reference_registry()?, store, stub)).await
        }
    }
}

async fn run_demo<S: RandomnessSource>(mut provider: GenomeProvider<S>) -> Result<(), RevealError> {
    let first = provider.store().iter().map(|r| r.token_id + 1).max().unwrap_or(1);
    let tokens: Vec<(u64, u8)> = (0..3u64).map(|i| (first + i, (i as u8) * 12)).collect();

    println!("Step 1: Publishing secret commitments...");
    println!("{}", "-".repeat(60));
    let mut secrets = Vec::new();
    for &(token_id, _) in &tokens {
        let secret = Word::from(rand::random::<u128>());
        provider.publish_secret_hash(OPERATOR, token_id, hash_secret(&secret))?;
        println!("  Token {}: commitment {}", token_id, hash_secret(&secret));
        secrets.push(secret);
    }

    println!("\nStep 2: Requesting randomness...");
    println!("{}", "-".repeat(60));
    for (&(token_id, bonus), secret) in tokens.iter().zip(&secrets) {
        let req = provider.request_reveal(OPERATOR, token_id, bonus, hash_secret(secret), vec![])?;
        println!("  Token {}: bonus {} | request {}", token_id, bonus, req.request_id);
    }

    println!("\nStep 3: Waiting for deliveries...");
    println!("{}", "-".repeat(60));
    let mut delivered = 0;
    while delivered < tokens.len() {
        match provider.next_delivery().await {
            Some(Ok(token_id)) => {
                delivered += 1;
                println!("  Token {}: randomness received", token_id);
            }
            Some(Err(e)) => return Err(e),
            None => break,
        }
    }

    println!("\nStep 4: Revealing secrets...");
    println!("{}", "-".repeat(60));
    for (&(token_id, _), secret) in tokens.iter().zip(&secrets) {
        let genome = provider.reveal_secret_and_compute_genome(OPERATOR, token_id, *secret)?;
        println!("  Token {}: genome {}", token_id, genome);
    }

    println!("\nStep 5: Independent verification...");
    println!("{}", "-".repeat(60));
    for &(token_id, _) in &tokens {
        if let Some(record) = provider.get_commitment(token_id) {
            println!("  Token {}: verified={}", token_id, record.verify(provider.registry())?);
        }
    }

    let finalized = provider
        .drain_events()
        .into_iter()
        .filter(|n| matches!(n.event, GenomeEvent::GenomeFinalized { .. }))
        .count();
    println!("\n  {} genomes finalized", finalized);
    provider.store().save()?;
    println!("  Saved to {}", STORE_FILE);
    Ok(())
}
