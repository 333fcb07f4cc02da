//! ClaimStore port - cluster 上の claim (PVC) へのアクセス
//!
//! # 設計原則
//! - label の set / remove は 1 key ずつ独立した呼び出し（複数 label をまとめる
//!   transaction はない）
//! - optimistic concurrency（resourceVersion 比較）も持たない。scheduler と controller が
//!   同じ claim の label を競合して書き換えうることは呼び出し側の前提
//! - namespace が空文字なら全 namespace を対象にする

use async_trait::async_trait;

use crate::domain::{Claim, ReaperError};

#[async_trait]
pub trait ClaimStore: Send + Sync {
    async fn list_claims(&self, namespace: &str) -> Result<Vec<Claim>, ReaperError>;

    /// Returns `ReaperError::NotFound` if the claim does not exist.
    async fn get_claim(&self, namespace: &str, name: &str) -> Result<Claim, ReaperError>;

    async fn delete_claim(&self, namespace: &str, name: &str) -> Result<(), ReaperError>;

    async fn set_claim_label(
        &self,
        namespace: &str,
        name: &str,
        key: &str,
        value: &str,
    ) -> Result<(), ReaperError>;

    async fn remove_claim_label(
        &self,
        namespace: &str,
        name: &str,
        key: &str,
    ) -> Result<(), ReaperError>;

    /// Claims matching `storage_class` that no live workload references.
    async fn list_unattached_claims(
        &self,
        namespace: &str,
        storage_class: &str,
    ) -> Result<Vec<Claim>, ReaperError>;
}
