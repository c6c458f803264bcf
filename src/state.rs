use crate::config::Config;
use crate::notices::NoticeBoard;
use crate::remote::HttpRemote;
use crate::storage::ProgressStore;
use crate::sync::SyncClient;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<Mutex<ProgressStore>>,
    pub remote: HttpRemote,
    pub sync: SyncClient<HttpRemote>,
    pub notices: NoticeBoard,
}

impl AppState {
    pub fn new(config: &Config, store: ProgressStore) -> Self {
        let remote = HttpRemote::new(config.remote_url.clone());
        let notices = NoticeBoard::new();
        let sync = SyncClient::new(Arc::new(remote.clone()), notices.clone(), config.sync_cooldown);
        Self {
            store: Arc::new(Mutex::new(store)),
            remote,
            sync,
            notices,
        }
    }
}
