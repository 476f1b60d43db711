use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;
use thiserror::Error;

use crate::models::UserId;
use crate::sync::RemoteRow;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Remote sync is not configured")]
    Disabled,

    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Remote returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Remote row could not be decoded: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Remote unavailable: {0}")]
    Unavailable(String),

    #[error(transparent)]
    Local(#[from] anyhow::Error),
}

/// A table holding one row per user, upserted by user id.
pub trait RemoteStore {
    fn fetch(&self, user: &UserId) -> Result<Option<RemoteRow>, SyncError>;
    fn upsert(&self, row: &RemoteRow) -> Result<(), SyncError>;
    fn delete(&self, user: &UserId) -> Result<(), SyncError>;
}

/// In-process remote. Clones share the same rows, and the store can be
/// switched offline to exercise the failure paths.
#[derive(Clone, Default)]
pub struct MemoryRemote {
    rows: Rc<RefCell<HashMap<String, RemoteRow>>>,
    offline: Rc<Cell<bool>>,
}

impl MemoryRemote {
    pub fn set_offline(&self, offline: bool) {
        self.offline.set(offline);
    }

    pub fn row(&self, user: &UserId) -> Option<RemoteRow> {
        self.rows.borrow().get(user.as_str()).cloned()
    }

    pub fn insert(&self, row: RemoteRow) {
        self.rows.borrow_mut().insert(row.user_id.clone(), row);
    }

    fn check_online(&self) -> Result<(), SyncError> {
        if self.offline.get() {
            return Err(SyncError::Unavailable("offline".into()));
        }
        Ok(())
    }
}

impl RemoteStore for MemoryRemote {
    fn fetch(&self, user: &UserId) -> Result<Option<RemoteRow>, SyncError> {
        self.check_online()?;
        Ok(self.row(user))
    }

    fn upsert(&self, row: &RemoteRow) -> Result<(), SyncError> {
        self.check_online()?;
        self.insert(row.clone());
        Ok(())
    }

    fn delete(&self, user: &UserId) -> Result<(), SyncError> {
        self.check_online()?;
        self.rows.borrow_mut().remove(user.as_str());
        Ok(())
    }
}
