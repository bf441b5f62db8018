// crates/docchain-core/tests/fingerprint.rs
// ============================================================================
// Module: Fingerprinter Tests
// Description: Verifies streaming fingerprint determinism and input limits.
// ============================================================================
//! ## Overview
//! Ensures fingerprints match known SHA-256 vectors, do not depend on read
//! chunking, accept empty input, and surface reader failures as read errors.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use std::io;
use std::io::Read;

use docchain_core::Fingerprinter;
use docchain_core::HashAlgorithm;
use docchain_core::InputError;
use docchain_core::hashing::hash_bytes;
use docchain_core::hashing::hashes_match;
use docchain_core::normalize_hash;
use proptest::prelude::*;

/// SHA-256 of the empty byte sequence.
const EMPTY_SHA256: &str = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";
/// SHA-256 of `abc`.
const ABC_SHA256: &str = "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad";

/// Reader that yields at most `step` bytes per call.
struct TrickleReader<'a> {
    /// Remaining bytes.
    data: &'a [u8],
    /// Maximum bytes per read.
    step: usize,
}

impl Read for TrickleReader<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let take = self.step.min(buf.len()).min(self.data.len());
        buf[..take].copy_from_slice(&self.data[..take]);
        self.data = &self.data[take..];
        Ok(take)
    }
}

/// Reader that always fails.
struct FailingReader;

impl Read for FailingReader {
    fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
        Err(io::Error::other("disk unplugged"))
    }
}

#[test]
fn fingerprint_matches_known_vectors() {
    let fingerprinter = Fingerprinter::default();
    let abc = fingerprinter.fingerprint_bytes(b"abc").expect("abc");
    assert_eq!(abc.hex(), ABC_SHA256);
    assert_eq!(abc.byte_len, 3);
    assert_eq!(abc.digest.algorithm, HashAlgorithm::Sha256);
}

#[test]
fn empty_input_yields_empty_digest() {
    let fingerprint = Fingerprinter::default().fingerprint_bytes(&[]).expect("empty");
    assert!(fingerprint.is_empty());
    assert_eq!(fingerprint.hex(), EMPTY_SHA256);
}

#[test]
fn fingerprint_agrees_with_one_shot_hash() {
    let data = vec![0x5a_u8; 20_000];
    let streamed = Fingerprinter::default().fingerprint_bytes(&data).expect("stream");
    assert_eq!(streamed.digest, hash_bytes(HashAlgorithm::Sha256, &data));
}

#[test]
fn input_over_limit_is_rejected() {
    let fingerprinter = Fingerprinter::default().with_limit(4);
    assert!(fingerprinter.fingerprint_bytes(b"1234").is_ok());
    let err = fingerprinter.fingerprint_bytes(b"12345").unwrap_err();
    assert!(matches!(err, InputError::TooLarge { limit: 4 }));
}

#[test]
fn reader_failure_is_a_read_error() {
    let err = Fingerprinter::default().fingerprint_reader(FailingReader).unwrap_err();
    match err {
        InputError::Read(inner) => assert_eq!(inner.to_string(), "disk unplugged"),
        InputError::TooLarge { .. } => panic!("expected read error"),
    }
}

#[test]
fn zero_chunk_size_falls_back_to_default() {
    let fingerprinter = Fingerprinter::default().with_chunk_size(0);
    let fingerprint = fingerprinter.fingerprint_bytes(b"abc").expect("abc");
    assert_eq!(fingerprint.hex(), ABC_SHA256);
}

#[test]
fn normalize_hash_strips_prefix_and_case() {
    assert_eq!(normalize_hash("0xABCdef"), "abcdef");
    assert_eq!(normalize_hash("  0Xff  "), "ff");
    assert_eq!(normalize_hash("abc"), "abc");
    assert!(hashes_match(&format!("0x{}", ABC_SHA256.to_uppercase()), ABC_SHA256));
    assert!(!hashes_match(ABC_SHA256, EMPTY_SHA256));
}

proptest! {
    #[test]
    fn chunking_never_changes_the_digest(
        data in proptest::collection::vec(any::<u8>(), 0..4096),
        chunk_size in 1_usize..512,
        step in 1_usize..97,
    ) {
        let whole = Fingerprinter::default().fingerprint_bytes(&data).unwrap();
        let chunked = Fingerprinter::default()
            .with_chunk_size(chunk_size)
            .fingerprint_reader(TrickleReader { data: &data, step })
            .unwrap();
        prop_assert_eq!(&whole, &chunked);
        prop_assert_eq!(whole.byte_len, data.len() as u64);
    }

    #[test]
    fn fingerprinting_is_deterministic(data in proptest::collection::vec(any::<u8>(), 0..2048)) {
        let first = Fingerprinter::default().fingerprint_bytes(&data).unwrap();
        let second = Fingerprinter::default().fingerprint_bytes(&data).unwrap();
        prop_assert_eq!(first, second);
    }
}
