use crate::domain::model::{AllianceSpec, PartyId, PartyMeta, SeatAllocation, VoteRecord};
use crate::domain::policy::{CanvasSettings, OverlapRule, TieBreak};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::collections::BTreeMap;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
    fn exists(&self, path: &str) -> impl std::future::Future<Output = bool> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn data_dir(&self) -> &str;
    fn output_path(&self) -> &str;
    fn canvas(&self) -> CanvasSettings;
    fn tie_break(&self) -> TieBreak;
    fn overlap_rule(&self) -> OverlapRule;
    fn gesture_script(&self) -> Option<&str>;
}

/// Everything the session needs, already typed.
#[derive(Debug, Clone, Default)]
pub struct SessionInput {
    pub votes: Vec<VoteRecord>,
    pub seats: Vec<SeatAllocation>,
    pub alliances: Vec<AllianceSpec>,
    pub parties: BTreeMap<PartyId, PartyMeta>,
}

#[async_trait]
pub trait SessionSource: Send + Sync {
    async fn load(&self) -> Result<SessionInput>;
}
