//! Concurrent pipeline invocations.
//!
//! Run with: `cargo test -p docpreview-processing --test concurrency_test`

mod helpers;

use helpers::fixtures;
use helpers::tools::{Behavior, FakeLauncher};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

const CALLS: usize = 50;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_parallel_video_previews_use_distinct_workspaces() {
    let launcher = FakeLauncher::with_delay(
        Behavior::Produces(fixtures::png(96, 64)),
        Duration::from_millis(20),
    );
    let test = Arc::new(helpers::setup_pipeline(launcher.clone()));

    let mut handles = Vec::with_capacity(CALLS);
    for i in 0..CALLS {
        let test = test.clone();
        handles.push(tokio::spawn(async move {
            // Same filename on every call, distinct payload sizes.
            let payload = vec![i as u8; 100 + i];
            test.pipeline
                .generate_preview(&payload, Some("video/mp4"), Some("clip.mp4"))
                .await
        }));
    }

    for handle in handles {
        let preview = handle.await.unwrap().expect("preview");
        assert_eq!(preview.dimensions(), (96, 64));
    }

    let calls = launcher.calls();
    assert_eq!(calls.len(), CALLS);
    let workspaces: HashSet<_> = calls.iter().map(|c| c.workspace()).collect();
    assert_eq!(workspaces.len(), CALLS);

    let sizes: HashSet<_> = calls.iter().filter_map(|c| c.input_len).collect();
    assert_eq!(sizes.len(), CALLS);

    assert_eq!(test.leftovers(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_parallel_mixed_failures_leave_nothing_behind() {
    let launcher = FakeLauncher::with_delay(
        Behavior::Fails {
            code: 1,
            output: String::new(),
        },
        Duration::from_millis(10),
    );
    let test = Arc::new(helpers::setup_pipeline(launcher.clone()));

    let mut handles = Vec::with_capacity(CALLS);
    for i in 0..CALLS {
        let test = test.clone();
        handles.push(tokio::spawn(async move {
            let (content_type, filename) = if i % 2 == 0 {
                ("video/mp4", "clip.mp4")
            } else {
                ("application/msword", "memo.doc")
            };
            test.pipeline
                .generate_preview(b"payload", Some(content_type), Some(filename))
                .await
        }));
    }

    for handle in handles {
        assert!(handle.await.unwrap().is_none());
    }
    assert_eq!(launcher.calls().len(), CALLS);
    assert_eq!(test.leftovers(), 0);
}
