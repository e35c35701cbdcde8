mod crawl;
mod domains;
mod health;
mod keywords;
mod login;
mod schedule;
mod verify;

pub use crawl::cmd_crawl;
pub use domains::{DomainListOptions, cmd_list_domains, cmd_show_domain};
pub use health::cmd_health;
pub use keywords::{cmd_add_keyword, cmd_list_keywords, cmd_remove_keyword};
pub use login::cmd_login;
pub use schedule::cmd_save_schedule;
pub use verify::cmd_verify;

use std::sync::Arc;

use tokio::sync::broadcast;

use crate::clients::BackendClient;
use crate::config::Config;
use crate::domain::events::NotificationEvent;

pub(crate) fn event_bus(config: &Config) -> broadcast::Sender<NotificationEvent> {
    let (tx, _) = broadcast::channel(config.general.event_bus_buffer_size.max(1));
    tx
}

/// Builds the backend client, letting `JUDOLWATCH_TOKEN` override the
/// configured access token.
pub(crate) fn backend(
    config: &Config,
    bus: &broadcast::Sender<NotificationEvent>,
) -> anyhow::Result<Arc<BackendClient>> {
    let mut backend_config = config.backend.clone();
    if let Ok(token) = std::env::var("JUDOLWATCH_TOKEN")
        && !token.is_empty()
    {
        backend_config.access_token = Some(token);
    }
    Ok(Arc::new(BackendClient::new(&backend_config, bus.clone())?))
}
