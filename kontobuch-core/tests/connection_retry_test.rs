//! Test for connection retry logic
//!
//! Run with: cargo test --test connection_retry_test -- --nocapture

use std::sync::{Arc, Barrier};
use std::thread;
use std::time::{Duration, Instant};
use tempfile::TempDir;

use kontobuch_core::adapters::duckdb::DuckDbRepository;
use kontobuch_core::services::{import_statement, ImportOptions};
use kontobuch_core::HeadlessNamer;

const STATEMENT: &str = "\
:20:REF1
:25:DE00ACCOUNT
:60F:C230101EUR100,00
:61:2301150115CR50,00NTRFNONREF
:86:166?00GUTSCHRIFT?20SVWZ+Rent?32Landlord
:62F:C230131EUR150,00
";

/// Test that concurrent connection attempts work with retry logic
#[test]
fn test_concurrent_connections() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("test.duckdb");

    // Create initial database
    {
        let repo = DuckDbRepository::new(&db_path).unwrap();
        repo.ensure_schema().unwrap();
    }

    // Use a barrier to synchronize thread starts
    let barrier = Arc::new(Barrier::new(3));
    let db_path = Arc::new(db_path);

    let mut handles = vec![];

    for i in 0..3 {
        let barrier = Arc::clone(&barrier);
        let db_path = Arc::clone(&db_path);

        let handle = thread::spawn(move || {
            barrier.wait();

            let start = Instant::now();
            match DuckDbRepository::new(&db_path) {
                Ok(_repo) => {
                    println!("Thread {}: opened after {:?}", i, start.elapsed());
                    // Hold the connection briefly to create contention
                    thread::sleep(Duration::from_millis(100));
                    Ok(())
                }
                Err(e) => {
                    println!("Thread {}: FAILED after {:?}: {}", i, start.elapsed(), e);
                    Err(e.to_string())
                }
            }
        });

        handles.push(handle);
    }

    let failures: Vec<String> = handles
        .into_iter()
        .filter_map(|h| h.join().unwrap().err())
        .collect();

    assert!(failures.is_empty(), "All connections should succeed: {:?}", failures);
}

/// Sequential opens see what earlier connections wrote
#[test]
fn test_sequential_connections() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("test_sequential.duckdb");

    for i in 0..5 {
        let start = Instant::now();
        let repo = DuckDbRepository::new(&db_path).unwrap();
        repo.ensure_schema().unwrap();
        println!("Connection {}: opened in {:?}", i, start.elapsed());

        let summary =
            import_statement(&repo, STATEMENT, &HeadlessNamer, &ImportOptions::default()).unwrap();
        assert_eq!(summary.transactions_inserted, usize::from(i == 0));
        assert_eq!(repo.get_transaction_count().unwrap(), 1);
    }
}
