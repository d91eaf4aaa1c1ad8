//! 快照存储 - 基础设施层
//!
//! 只暴露 save / load / clear 三个能力，存储里最多只有一份快照

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::{debug, warn};

use crate::error::PersistenceError;
use crate::models::SessionSnapshot;

/// 快照槽位名
pub const SNAPSHOT_KEY: &str = "aiExamProState";

/// 快照存储能力
///
/// 职责：
/// - 覆盖写入唯一的快照
/// - 读取快照，结构不兼容的内容视为不存在
/// - 幂等删除
/// - 不认识考试流程
pub trait SnapshotStore {
    fn save(&self, snapshot: &SessionSnapshot) -> Result<(), PersistenceError>;

    /// 读取快照，不存在或无法恢复时返回 `Ok(None)`
    fn load(&self) -> Result<Option<SessionSnapshot>, PersistenceError>;

    fn clear(&self) -> Result<(), PersistenceError>;
}

/// 把存储中的原始文本解析为快照，失败一律视为"没有快照"
fn decode_snapshot(raw: &str) -> Option<SessionSnapshot> {
    match serde_json::from_str::<SessionSnapshot>(raw) {
        Ok(snapshot) if snapshot.is_consistent() => Some(snapshot),
        Ok(_) => {
            warn!("⚠️ 快照内容不一致，忽略");
            None
        }
        Err(e) => {
            warn!("⚠️ 快照无法解析，忽略: {}", e);
            None
        }
    }
}

/// 基于本地文件的快照存储
pub struct FileSnapshotStore {
    path: PathBuf,
}

impl FileSnapshotStore {
    /// 在指定目录下创建存储，文件名为 `aiExamProState.json`
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(format!("{}.json", SNAPSHOT_KEY)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn unavailable(&self, source: std::io::Error) -> PersistenceError {
        PersistenceError::Unavailable {
            path: self.path.display().to_string(),
            source,
        }
    }
}

impl SnapshotStore for FileSnapshotStore {
    fn save(&self, snapshot: &SessionSnapshot) -> Result<(), PersistenceError> {
        let content = serde_json::to_string(snapshot)?;
        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir).map_err(|e| self.unavailable(e))?;
        }

        // 先写临时文件再改名，避免读到写了一半的快照
        let tmp_path = self.path.with_extension("json.tmp");
        std::fs::write(&tmp_path, content).map_err(|e| self.unavailable(e))?;
        std::fs::rename(&tmp_path, &self.path).map_err(|e| self.unavailable(e))?;

        debug!("快照已保存: {} (剩余 {} 秒)", self.path.display(), snapshot.time_left);
        Ok(())
    }

    fn load(&self) -> Result<Option<SessionSnapshot>, PersistenceError> {
        match std::fs::read_to_string(&self.path) {
            Ok(raw) => Ok(decode_snapshot(&raw)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(self.unavailable(e)),
        }
    }

    fn clear(&self) -> Result<(), PersistenceError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                debug!("快照已删除: {}", self.path.display());
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.unavailable(e)),
        }
    }
}

/// 内存快照存储
///
/// 没有可用磁盘时的兜底实现，也用于测试。内部保存序列化后的文本，
/// 与文件存储走同一条解析路径
#[derive(Default)]
pub struct MemorySnapshotStore {
    slot: Mutex<Option<String>>,
}

impl MemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 预置任意原始内容（可以是损坏的数据）
    pub fn with_raw(raw: impl Into<String>) -> Self {
        Self {
            slot: Mutex::new(Some(raw.into())),
        }
    }

    /// 当前存储的原始内容
    pub fn raw(&self) -> Option<String> {
        self.slot.lock().ok().and_then(|slot| slot.clone())
    }

    pub fn is_empty(&self) -> bool {
        self.raw().is_none()
    }
}

impl SnapshotStore for MemorySnapshotStore {
    fn save(&self, snapshot: &SessionSnapshot) -> Result<(), PersistenceError> {
        let content = serde_json::to_string(snapshot)?;
        let mut slot = self.slot.lock().map_err(|_| PersistenceError::Poisoned)?;
        *slot = Some(content);
        Ok(())
    }

    fn load(&self) -> Result<Option<SessionSnapshot>, PersistenceError> {
        let slot = self.slot.lock().map_err(|_| PersistenceError::Poisoned)?;
        Ok(slot.as_deref().and_then(decode_snapshot))
    }

    fn clear(&self) -> Result<(), PersistenceError> {
        let mut slot = self.slot.lock().map_err(|_| PersistenceError::Poisoned)?;
        *slot = None;
        Ok(())
    }
}

impl<S: SnapshotStore + ?Sized> SnapshotStore for Box<S> {
    fn save(&self, snapshot: &SessionSnapshot) -> Result<(), PersistenceError> {
        (**self).save(snapshot)
    }

    fn load(&self) -> Result<Option<SessionSnapshot>, PersistenceError> {
        (**self).load()
    }

    fn clear(&self) -> Result<(), PersistenceError> {
        (**self).clear()
    }
}

impl<S: SnapshotStore + ?Sized> SnapshotStore for std::sync::Arc<S> {
    fn save(&self, snapshot: &SessionSnapshot) -> Result<(), PersistenceError> {
        (**self).save(snapshot)
    }

    fn load(&self) -> Result<Option<SessionSnapshot>, PersistenceError> {
        (**self).load()
    }

    fn clear(&self) -> Result<(), PersistenceError> {
        (**self).clear()
    }
}
