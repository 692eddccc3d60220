// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;

use edw_container::driver::fake::FakeContainerDriver;
use edw_container::object_store::fake::FakeObjectStore;
use edw_container::snapshot::CandidateFile;
use edw_core::clock::FakeClock;
use edw_storage::kv::fake::FakeKvStore;

use super::*;

fn provisioner() -> (Provisioner<FakeClock>, Arc<FakeContainerDriver>, Arc<FakeObjectStore>) {
    let kv = Arc::new(FakeKvStore::new());
    let driver = Arc::new(FakeContainerDriver::new());
    let object_store = Arc::new(FakeObjectStore::new());
    let liveness = Arc::new(DriverLiveness(driver.clone() as Arc<dyn ContainerDriver>));
    let sandbox_store = Arc::new(SandboxStore::new(kv.clone(), liveness));
    let lock = Arc::new(DistributedLock::new(kv));
    let provisioner = Provisioner::new(sandbox_store, lock, driver.clone(), object_store.clone(), FakeClock::new());
    (provisioner, driver, object_store)
}

#[tokio::test]
async fn provisioning_a_fresh_chat_creates_a_container_and_persists_state() {
    let (provisioner, driver, _object_store) = provisioner();
    let user_id = UserId::new("u1");
    let chat_id = ChatId::new("c1");

    let sandbox_id = provisioner.provision(&user_id, &chat_id).await.unwrap();

    let sandbox = provisioner.sandbox_store.get(&sandbox_id).await.unwrap().unwrap();
    assert_eq!(sandbox.chat_id, chat_id);
    assert!(driver.calls.lock().iter().any(|c| c.starts_with("create:")));
}

#[tokio::test]
async fn provisioning_the_same_chat_twice_returns_the_same_sandbox() {
    let (provisioner, driver, _object_store) = provisioner();
    let user_id = UserId::new("u1");
    let chat_id = ChatId::new("c1");

    let first = provisioner.provision(&user_id, &chat_id).await.unwrap();
    let second = provisioner.provision(&user_id, &chat_id).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(driver.calls.lock().iter().filter(|c| c.starts_with("create:")).count(), 1);
}

#[tokio::test]
async fn provisioning_restores_a_backup_when_one_exists() {
    let (provisioner, driver, object_store) = provisioner();
    let user_id = UserId::new("u1");
    let chat_id = ChatId::new("c1");

    let files = vec![CandidateFile { rel_path: "src/index.ts".to_string(), size: 5, contents: b"hello".to_vec() }];
    let archive = edw_container::backup::build_tar_gz(&files).unwrap();
    object_store.objects.lock().push((edw_container::backup::backup_archive_key("u1", "c1"), archive, "application/gzip".to_string()));

    provisioner.provision(&user_id, &chat_id).await.unwrap();

    assert!(driver.calls.lock().iter().any(|c| c.starts_with("put_archive:")));
}

#[tokio::test]
async fn provisioning_without_a_backup_does_not_call_put_archive() {
    let (provisioner, driver, _object_store) = provisioner();
    provisioner.provision(&UserId::new("u1"), &ChatId::new("c1")).await.unwrap();
    assert!(!driver.calls.lock().iter().any(|c| c.starts_with("put_archive:")));
}
