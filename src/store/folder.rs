// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Branchtrail-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Branchtrail and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! One JSON file per session under `<root>/<owner>/<session>.json`.

use std::fs;
use std::io;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use super::{
    apply_update, check_rev, now_ms, session_from_new, NewSession, SessionStore, SessionUpdate,
    StoreError,
};
use crate::model::{BranchNode, OwnerId, Session, SessionId};

const SESSION_FILE_EXTENSION: &str = "json";
const TEMP_FILE_PREFIX: &str = ".branchtrail.tmp.";

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum WriteDurability {
    /// Fast, best-effort persistence.
    ///
    /// - Writes a temp file and renames atomically into place.
    /// - Does not perform per-file fsync/sync.
    #[default]
    BestEffort,

    /// Slower, best-effort durability.
    ///
    /// Attempts to flush written file contents and rename operations to stable storage where
    /// possible. Exact guarantees are platform/filesystem-dependent.
    Durable,
}

/// On-disk shape of one session. Field names are the persistence schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct SessionRecord {
    id: SessionId,
    user_id: OwnerId,
    title: String,
    tree_json: BranchNode,
    #[serde(default)]
    token_usage: u64,
    #[serde(default)]
    rev: u64,
    #[serde(default)]
    created_at: u64,
}

impl SessionRecord {
    fn from_session(session: &Session) -> Self {
        Self {
            id: session.session_id().clone(),
            user_id: session.owner_id().clone(),
            title: session.title().to_owned(),
            tree_json: session.root().clone(),
            token_usage: session.token_usage(),
            rev: session.rev(),
            created_at: session.created_at_ms(),
        }
    }

    fn into_session(self) -> Session {
        let mut session = Session::new(self.id, self.user_id, self.title, self.tree_json);
        session.set_token_usage(self.token_usage);
        session.set_rev(self.rev);
        session.set_created_at_ms(self.created_at);
        session
    }
}

#[derive(Debug, Default)]
struct Clock {
    last_created_at: u64,
}

impl Clock {
    /// Wall-clock millis, forced strictly increasing so insertion order survives a reload.
    fn next(&mut self) -> u64 {
        let now = now_ms().max(self.last_created_at + 1);
        self.last_created_at = now;
        now
    }
}

#[derive(Debug)]
pub struct FolderStore {
    root: PathBuf,
    durability: WriteDurability,
    /// Serializes read-modify-write cycles within this process.
    lock: Mutex<Clock>,
}

impl FolderStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            durability: WriteDurability::default(),
            lock: Mutex::new(Clock::default()),
        }
    }

    pub fn with_durability(mut self, durability: WriteDurability) -> Self {
        self.durability = durability;
        self
    }

    pub fn durability(&self) -> WriteDurability {
        self.durability
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn owner_dir(&self, owner: &OwnerId) -> PathBuf {
        self.root.join(encode_persisted_id_segment(owner.as_str()))
    }

    pub fn session_path(&self, owner: &OwnerId, session_id: &SessionId) -> PathBuf {
        self.owner_dir(owner).join(format!(
            "{}.{SESSION_FILE_EXTENSION}",
            encode_persisted_id_segment(session_id.as_str())
        ))
    }

    fn read_record(&self, path: &Path, session_id: &SessionId) -> Result<Session, StoreError> {
        match fs::symlink_metadata(path) {
            Ok(md) if md.file_type().is_symlink() => {
                return Err(StoreError::SymlinkRefused { path: path.to_path_buf() });
            }
            Ok(_) => {}
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound { session_id: session_id.clone() });
            }
            Err(source) => return Err(StoreError::Io { path: path.to_path_buf(), source }),
        }
        load_record(path)
    }

    fn write_record(&self, owner: &OwnerId, session: &Session) -> Result<(), StoreError> {
        let path = self.session_path(owner, session.session_id());
        let mut json = serde_json::to_vec_pretty(&SessionRecord::from_session(session))
            .map_err(|source| StoreError::Json { path: path.clone(), source })?;
        json.push(b'\n');
        create_dir_all_safe(&self.root, &self.owner_dir(owner))?;
        write_atomic(&path, &json, self.durability)?;
        tracing::debug!(path = %path.display(), rev = session.rev(), "session written");
        Ok(())
    }
}

fn load_record(path: &Path) -> Result<Session, StoreError> {
    let bytes =
        fs::read(path).map_err(|source| StoreError::Io { path: path.to_path_buf(), source })?;
    let record: SessionRecord = serde_json::from_slice(&bytes)
        .map_err(|source| StoreError::Json { path: path.to_path_buf(), source })?;
    Ok(record.into_session())
}

impl SessionStore for FolderStore {
    fn list(&self, owner: &OwnerId) -> Result<Vec<Session>, StoreError> {
        let dir = self.owner_dir(owner);
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => return Err(StoreError::Io { path: dir, source }),
        };

        let mut sessions = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| StoreError::Io { path: dir.clone(), source })?;
            let path = entry.path();
            let file_type = entry
                .file_type()
                .map_err(|source| StoreError::Io { path: path.clone(), source })?;
            let is_session_file = file_type.is_file()
                && path.extension().is_some_and(|ext| ext == SESSION_FILE_EXTENSION)
                && !entry.file_name().to_string_lossy().starts_with('.');
            if !is_session_file {
                continue;
            }
            sessions.push(load_record(&path)?);
        }

        sessions.sort_by(|a, b| {
            b.created_at_ms()
                .cmp(&a.created_at_ms())
                .then_with(|| a.session_id().cmp(b.session_id()))
        });
        Ok(sessions)
    }

    fn insert(&self, owner: &OwnerId, session: NewSession) -> Result<Session, StoreError> {
        let mut clock = self.lock.lock().expect("folder store lock poisoned");
        let path = self.session_path(owner, &session.session_id);
        match fs::symlink_metadata(&path) {
            Ok(_) => return Err(StoreError::AlreadyExists { session_id: session.session_id }),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(source) => return Err(StoreError::Io { path, source }),
        }

        let stored = session_from_new(owner, session, clock.next());
        self.write_record(owner, &stored)?;
        Ok(stored)
    }

    fn fetch(&self, owner: &OwnerId, session_id: &SessionId) -> Result<Session, StoreError> {
        self.read_record(&self.session_path(owner, session_id), session_id)
    }

    fn update(
        &self,
        owner: &OwnerId,
        session_id: &SessionId,
        update: SessionUpdate,
    ) -> Result<Session, StoreError> {
        let _guard = self.lock.lock().expect("folder store lock poisoned");
        let mut stored = self.read_record(&self.session_path(owner, session_id), session_id)?;
        check_rev(session_id, update.expected_rev, stored.rev())?;
        apply_update(&mut stored, update);
        self.write_record(owner, &stored)?;
        Ok(stored)
    }

    fn delete(&self, owner: &OwnerId, session_id: &SessionId) -> Result<(), StoreError> {
        let _guard = self.lock.lock().expect("folder store lock poisoned");
        let path = self.session_path(owner, session_id);
        match fs::symlink_metadata(&path) {
            Ok(md) if md.file_type().is_symlink() => {
                return Err(StoreError::SymlinkRefused { path });
            }
            Ok(_) => {}
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound { session_id: session_id.clone() });
            }
            Err(source) => return Err(StoreError::Io { path, source }),
        }
        fs::remove_file(&path).map_err(|source| StoreError::Io { path: path.clone(), source })?;
        tracing::debug!(path = %path.display(), "session file removed");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "folder"
    }
}

/// Maps an id to a file name that is safe on every platform. Ids that are already safe are
/// used verbatim; anything else is hex-encoded behind a `~` marker.
fn encode_persisted_id_segment(segment: &str) -> String {
    if !needs_safe_filename_encoding(segment) {
        return segment.to_owned();
    }

    const HEX: &[u8; 16] = b"0123456789abcdef";
    let mut out = String::with_capacity(1 + segment.len().saturating_mul(2));
    out.push('~');
    for &b in segment.as_bytes() {
        out.push(HEX[(b >> 4) as usize] as char);
        out.push(HEX[(b & 0x0f) as usize] as char);
    }
    out
}

fn needs_safe_filename_encoding(segment: &str) -> bool {
    if segment.starts_with('~') || segment.starts_with('.') {
        return true;
    }
    if segment.ends_with(' ') || segment.ends_with('.') {
        return true;
    }

    let trimmed = segment.trim_end_matches([' ', '.']);
    let base = trimmed.split('.').next().unwrap_or(trimmed);
    if is_windows_device_name(base) {
        return true;
    }

    segment.chars().any(|ch| {
        matches!(ch, '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*')
            || ch <= '\u{1f}'
            || ch == '\u{7f}'
    })
}

fn is_windows_device_name(base: &str) -> bool {
    let base = base.to_ascii_uppercase();
    match base.as_str() {
        "CON" | "PRN" | "AUX" | "NUL" => true,
        _ => base
            .strip_prefix("COM")
            .or_else(|| base.strip_prefix("LPT"))
            .is_some_and(|num| matches!(num, "1" | "2" | "3" | "4" | "5" | "6" | "7" | "8" | "9")),
    }
}

/// Creates `dir` (which must be inside `root`) without following symlinks.
fn create_dir_all_safe(root: &Path, dir: &Path) -> Result<(), StoreError> {
    fs::create_dir_all(root).map_err(|source| StoreError::Io { path: root.to_path_buf(), source })?;

    match fs::symlink_metadata(dir) {
        Ok(md) if md.file_type().is_symlink() => {
            Err(StoreError::SymlinkRefused { path: dir.to_path_buf() })
        }
        Ok(md) if md.is_dir() => Ok(()),
        Ok(_) => Err(StoreError::Io {
            path: dir.to_path_buf(),
            source: io::Error::new(io::ErrorKind::AlreadyExists, "expected directory"),
        }),
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            fs::create_dir(dir).map_err(|source| StoreError::Io { path: dir.to_path_buf(), source })
        }
        Err(source) => Err(StoreError::Io { path: dir.to_path_buf(), source }),
    }
}

fn rename_overwrite(from: &Path, to: &Path) -> io::Result<()> {
    #[cfg(windows)]
    {
        match fs::rename(from, to) {
            Ok(()) => Ok(()),
            Err(err)
                if matches!(
                    err.kind(),
                    io::ErrorKind::AlreadyExists | io::ErrorKind::PermissionDenied
                ) =>
            {
                let _ = fs::remove_file(to);
                fs::rename(from, to)
            }
            Err(err) => Err(err),
        }
    }

    #[cfg(not(windows))]
    {
        fs::rename(from, to)
    }
}

/// Writes `contents` to a sibling temp file and renames it over `path`.
fn write_atomic(
    path: &Path,
    contents: &[u8],
    durability: WriteDurability,
) -> Result<(), StoreError> {
    match fs::symlink_metadata(path) {
        Ok(md) if md.file_type().is_symlink() => {
            return Err(StoreError::SymlinkRefused { path: path.to_path_buf() });
        }
        Ok(_) => {}
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(source) => return Err(StoreError::Io { path: path.to_path_buf(), source }),
    }

    let (Some(parent), Some(file_name)) = (path.parent(), path.file_name()) else {
        return Err(StoreError::Io {
            path: path.to_path_buf(),
            source: io::Error::other("path has no parent or file name"),
        });
    };

    let nanos = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_nanos();
    let tmp_path =
        parent.join(format!("{TEMP_FILE_PREFIX}{}.{nanos}", file_name.to_string_lossy()));

    let mut file = fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&tmp_path)
        .map_err(|source| StoreError::Io { path: tmp_path.clone(), source })?;

    file.write_all(contents)
        .map_err(|source| StoreError::Io { path: tmp_path.clone(), source })?;

    if durability == WriteDurability::Durable {
        file.sync_all()
            .map_err(|source| StoreError::Io { path: tmp_path.clone(), source })?;
    }
    drop(file);

    if let Err(source) = rename_overwrite(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(StoreError::Io { path: path.to_path_buf(), source });
    }

    if durability == WriteDurability::Durable {
        #[cfg(unix)]
        {
            let dir = fs::File::open(parent)
                .map_err(|source| StoreError::Io { path: parent.to_path_buf(), source })?;
            dir.sync_all()
                .map_err(|source| StoreError::Io { path: parent.to_path_buf(), source })?;
        }
    }

    Ok(())
}
