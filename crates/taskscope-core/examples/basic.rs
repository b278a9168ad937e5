//! Two workers under a main task, then a printed snapshot.
#![allow(clippy::print_stdout, reason = "Demo output")]

use std::sync::Arc;
use std::time::Duration;

use taskscope_core::snapshot::sort_by_id;
use taskscope_core::{Carrier, Registry, attach, attach_current};
use tokio::task::JoinSet;
use tokio::time::sleep;

#[tokio::main]
async fn main() {
    let registry = Registry::new().shared();
    let (main_task, _) = attach(&registry, &Carrier::root(), "main");

    let mut workers = JoinSet::new();
    for index in 1..=2u64 {
        let registry = Arc::clone(&registry);
        workers.spawn(main_task.clone().scope(async move {
            let (worker, _) = attach_current(&registry, format!("worker {index}"));
            sleep(Duration::from_secs(index)).await;
            worker.done();
        }));
    }

    while workers.join_next().await.is_some() {}

    let mut snapshots = registry.snapshot();
    sort_by_id(&mut snapshots);

    println!("------- snapshot -------");
    for snapshot in snapshots {
        println!(
            "ID: {} Name: {} Parent: {} State: {} Duration: {:?}",
            snapshot.id, snapshot.name, snapshot.parent_id, snapshot.state, snapshot.duration
        );
    }
}
