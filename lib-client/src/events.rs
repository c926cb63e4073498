//! Campaign contract event history and live polling.

use std::time::Duration;

use alloy::primitives::{TxHash, U256};
use alloy::rpc::types::Log;
use alloy::sol_types::SolEventInterface;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::abi::R2SCampaign::R2SCampaignEvents;
use crate::contract::ContractHandle;
use crate::error::{Result, SdkError};
use crate::rpc::LogQuery;

/// Channel depth between the poller and the consumer
const EVENT_BUFFER: usize = 256;

/// One decoded campaign event with its position in the chain
#[derive(Debug, Clone)]
pub struct EventRecord {
    pub block_number: Option<u64>,
    pub transaction_hash: Option<TxHash>,
    pub log_index: Option<u64>,
    pub event: R2SCampaignEvents,
}

impl EventRecord {
    /// Decode a raw log; `None` for logs that are not campaign events.
    pub fn from_log(log: &Log) -> Option<Self> {
        let decoded = R2SCampaignEvents::decode_log(&log.inner).ok()?;
        Some(Self {
            block_number: log.block_number,
            transaction_hash: log.transaction_hash,
            log_index: log.log_index,
            event: decoded.data,
        })
    }

    /// Campaign the event belongs to
    pub fn campaign_id(&self) -> U256 {
        match &self.event {
            R2SCampaignEvents::CampaignCreated(e) => e.campaignId,
            R2SCampaignEvents::CampaignUpdated(e) => e.campaignId,
            R2SCampaignEvents::FeeCollected(e) => e.campaignId,
            R2SCampaignEvents::ParticipationCreated(e) => e.campaignId,
            R2SCampaignEvents::ParticipationSettled(e) => e.campaignId,
            R2SCampaignEvents::RefundProcessed(e) => e.campaignId,
        }
    }
}

/// Fetch and decode every campaign event in `[from_block, to_block]`.
pub(crate) async fn fetch_events(
    campaign: &ContractHandle,
    from_block: u64,
    to_block: Option<u64>,
) -> Result<Vec<EventRecord>> {
    let logs = campaign
        .rpc()
        .logs(LogQuery {
            address: campaign.address(),
            topic0: None,
            from_block,
            to_block,
        })
        .await
        .map_err(SdkError::from_node)?;

    Ok(logs.iter().filter_map(EventRecord::from_log).collect())
}

/// Live stream of campaign events
///
/// Dropping the stream stops the poller.
#[derive(Debug)]
pub struct EventStream {
    rx: mpsc::Receiver<Result<EventRecord>>,
    task: JoinHandle<()>,
}

impl EventStream {
    /// Next event, `None` once the poller stopped
    pub async fn recv(&mut self) -> Option<Result<EventRecord>> {
        self.rx.recv().await
    }
}

impl Drop for EventStream {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Spawn a poller delivering campaign events from `from_block` onwards.
///
/// Transport failures are reported on the stream and polling continues;
/// any other failure ends the stream.
pub(crate) fn watch_events(
    campaign: ContractHandle,
    from_block: u64,
    poll_interval: Duration,
) -> EventStream {
    let (tx, rx) = mpsc::channel(EVENT_BUFFER);

    let task = tokio::spawn(async move {
        let mut next_block = from_block;
        loop {
            match poll_once(&campaign, next_block).await {
                Ok(Some((records, head))) => {
                    debug!(
                        "Event poll {}..={} found {} events",
                        next_block,
                        head,
                        records.len()
                    );
                    for record in records {
                        if tx.send(Ok(record)).await.is_err() {
                            return;
                        }
                    }
                    next_block = head + 1;
                }
                Ok(None) => {}
                Err(err) => {
                    let fatal = !matches!(err, SdkError::Connection(_));
                    warn!("Event poll from block {} failed: {}", next_block, err);
                    if tx.send(Err(err)).await.is_err() || fatal {
                        return;
                    }
                }
            }

            if tx.is_closed() {
                return;
            }
            tokio::time::sleep(poll_interval).await;
        }
    });

    EventStream { rx, task }
}

async fn poll_once(
    campaign: &ContractHandle,
    next_block: u64,
) -> Result<Option<(Vec<EventRecord>, u64)>> {
    let head = campaign
        .rpc()
        .latest_block_number()
        .await
        .map_err(SdkError::from_node)?;
    if head < next_block {
        return Ok(None);
    }
    let records = fetch_events(campaign, next_block, Some(head)).await?;
    Ok(Some((records, head)))
}
