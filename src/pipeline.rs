use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::announcement::compose;
use crate::auth::{authorize, AllowList, Authorization};
use crate::catalog::{CatalogResolver, DeviceRecord};
use crate::config::AnnouncementConfig;
use crate::dispatch::AnnouncementSink;
use crate::error::PipelineError;

/// Stages a `/post` command moves through, used for log context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Authorizing,
    Resolving,
    Composing,
    Dispatching,
}

/// Runs `/post` and `/id`. Holds only immutable state, so one instance is
/// shared by every concurrent command.
pub struct Pipeline {
    allow_list: AllowList,
    resolver: CatalogResolver,
    branding: AnnouncementConfig,
    sink: Arc<dyn AnnouncementSink>,
}

impl Pipeline {
    pub fn new(
        allow_list: AllowList,
        resolver: CatalogResolver,
        branding: AnnouncementConfig,
        sink: Arc<dyn AnnouncementSink>,
    ) -> Self {
        Self {
            allow_list,
            resolver,
            branding,
            sink,
        }
    }

    /// Authorize, look up, compose and broadcast. Returns the record that
    /// was announced.
    pub async fn post<S: AsRef<str>>(
        &self,
        caller_id: u64,
        args: &[S],
    ) -> Result<DeviceRecord, PipelineError> {
        let codename = match args.first().map(|a| a.as_ref().trim()) {
            Some(c) if !c.is_empty() => c,
            _ => return Err(PipelineError::Usage),
        };

        debug!("{:?}: caller {}", Stage::Authorizing, caller_id);
        if authorize(caller_id, &self.allow_list) == Authorization::Denied {
            return Err(PipelineError::Unauthorized { caller_id });
        }

        debug!("{:?}: codename '{}'", Stage::Resolving, codename);
        let record = self.resolver.resolve(codename).await?;

        debug!("{:?}: {} ({})", Stage::Composing, record.device, record.codename);
        let announcement = compose(&record, &self.branding);

        debug!(
            "{:?}: {} button row(s)",
            Stage::Dispatching,
            announcement.rows.len()
        );
        self.sink.send_announcement(&announcement).await?;

        Ok(record)
    }

    /// Reply text for `/post <codename>`.
    pub async fn handle_post<S: AsRef<str>>(&self, caller_id: u64, args: &[S]) -> String {
        match self.post(caller_id, args).await {
            Ok(record) => {
                info!(
                    "Posted announcement for {} on behalf of {}",
                    record.codename, caller_id
                );
                format!("✅ Posted announcement for {}", record.codename)
            }
            Err(e) => {
                warn!("/post from {} failed ({:?}): {:#}", caller_id, e.kind(), e);
                e.reply()
            }
        }
    }

    /// Reply text for `/id`. Open to everyone so new operators can find
    /// their id for the allow-list.
    pub fn handle_id(&self, caller_id: u64) -> String {
        format!("Your Telegram ID: {}", caller_id)
    }
}
