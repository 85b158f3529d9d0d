//! User repository for JSON storage
//!
//! Manages loading and saving users to users.json. Also serves as the actor
//! directory the audit query service resolves names through.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;

use crate::audit::{ActorDirectory, ActorSummary};
use crate::error::{AuditError, AuditResult};
use crate::models::user::normalize_email;
use crate::models::{User, UserId};

use super::file_io::{read_json, write_json_atomic};

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
struct UserData {
    users: Vec<User>,
}

/// Repository for user persistence
pub struct UserRepository {
    path: PathBuf,
    data: RwLock<HashMap<UserId, User>>,
    /// Index: normalized email -> user id
    by_email: RwLock<HashMap<String, UserId>>,
}

fn lock_err(e: impl std::fmt::Display) -> AuditError {
    AuditError::Storage(format!("Failed to acquire lock: {}", e))
}

impl UserRepository {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            data: RwLock::new(HashMap::new()),
            by_email: RwLock::new(HashMap::new()),
        }
    }

    /// Load users from disk
    pub fn load(&self) -> AuditResult<()> {
        let file_data: UserData = read_json(&self.path)?;

        let mut data = self.data.write().map_err(lock_err)?;
        let mut by_email = self.by_email.write().map_err(lock_err)?;
        data.clear();
        by_email.clear();

        for user in file_data.users {
            by_email.insert(normalize_email(&user.email), user.id);
            data.insert(user.id, user);
        }

        Ok(())
    }

    /// Save users to disk
    pub fn save(&self) -> AuditResult<()> {
        let data = self.data.read().map_err(lock_err)?;

        let mut users: Vec<_> = data.values().cloned().collect();
        users.sort_by(|a, b| a.email.cmp(&b.email));

        write_json_atomic(&self.path, &UserData { users })
    }

    pub fn get(&self, id: UserId) -> AuditResult<Option<User>> {
        let data = self.data.read().map_err(lock_err)?;
        Ok(data.get(&id).cloned())
    }

    /// Get a user by email (case-insensitive)
    pub fn get_by_email(&self, email: &str) -> AuditResult<Option<User>> {
        let data = self.data.read().map_err(lock_err)?;
        let by_email = self.by_email.read().map_err(lock_err)?;
        Ok(by_email
            .get(&normalize_email(email))
            .and_then(|id| data.get(id))
            .cloned())
    }

    pub fn get_all(&self) -> AuditResult<Vec<User>> {
        let data = self.data.read().map_err(lock_err)?;
        let mut users: Vec<_> = data.values().cloned().collect();
        users.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
        Ok(users)
    }

    /// Check whether an email belongs to a user other than `exclude`
    pub fn email_exists(&self, email: &str, exclude: Option<UserId>) -> AuditResult<bool> {
        let by_email = self.by_email.read().map_err(lock_err)?;
        Ok(by_email
            .get(&normalize_email(email))
            .is_some_and(|id| Some(*id) != exclude))
    }

    /// Insert or update a user
    pub fn upsert(&self, user: User) -> AuditResult<()> {
        let mut data = self.data.write().map_err(lock_err)?;
        let mut by_email = self.by_email.write().map_err(lock_err)?;

        if let Some(old) = data.get(&user.id) {
            by_email.remove(&normalize_email(&old.email));
        }
        by_email.insert(normalize_email(&user.email), user.id);
        data.insert(user.id, user);
        Ok(())
    }

    pub fn count(&self) -> AuditResult<usize> {
        let data = self.data.read().map_err(lock_err)?;
        Ok(data.len())
    }
}

impl ActorDirectory for UserRepository {
    fn lookup(&self, id: UserId) -> AuditResult<Option<ActorSummary>> {
        Ok(self.get(id)?.map(|user| user.summary()))
    }

    fn search(&self, term: &str) -> AuditResult<Vec<UserId>> {
        let term = term.trim().to_lowercase();
        if term.is_empty() {
            return Ok(Vec::new());
        }

        let data = self.data.read().map_err(lock_err)?;
        Ok(data
            .values()
            .filter(|u| u.name.to_lowercase().contains(&term) || u.email.contains(&term))
            .map(|u| u.id)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserRole;
    use tempfile::TempDir;

    fn create_test_repo() -> (TempDir, UserRepository) {
        let temp_dir = TempDir::new().unwrap();
        let repo = UserRepository::new(temp_dir.path().join("users.json"));
        (temp_dir, repo)
    }

    #[test]
    fn test_get_by_email_is_case_insensitive() {
        let (_temp_dir, repo) = create_test_repo();
        repo.upsert(User::new("Rina", "rina@portal.id", UserRole::Admin))
            .unwrap();

        assert!(repo.get_by_email("RINA@portal.id").unwrap().is_some());
        assert!(repo.get_by_email("other@portal.id").unwrap().is_none());
    }

    #[test]
    fn test_email_index_follows_updates() {
        let (_temp_dir, repo) = create_test_repo();
        let mut user = User::new("Rina", "rina@portal.id", UserRole::Admin);
        repo.upsert(user.clone()).unwrap();

        user.email = "rina@sintesis.id".into();
        repo.upsert(user.clone()).unwrap();

        assert!(!repo.email_exists("rina@portal.id", None).unwrap());
        assert!(repo.email_exists("rina@sintesis.id", None).unwrap());
        assert!(!repo.email_exists("rina@sintesis.id", Some(user.id)).unwrap());
    }

    #[test]
    fn test_actor_directory() {
        let (_temp_dir, repo) = create_test_repo();
        let rina = User::new("Rina Wulandari", "rina@portal.id", UserRole::Admin);
        let bima = User::new("Bima", "bima@portal.id", UserRole::Mentor);
        repo.upsert(rina.clone()).unwrap();
        repo.upsert(bima.clone()).unwrap();

        let summary = repo.lookup(rina.id).unwrap().unwrap();
        assert_eq!(summary.name, "Rina Wulandari");
        assert_eq!(summary.contact, "rina@portal.id");
        assert!(repo.lookup(UserId::new()).unwrap().is_none());

        assert_eq!(repo.search("wulan").unwrap(), vec![rina.id]);
        assert_eq!(repo.search("BIMA@").unwrap(), vec![bima.id]);
        assert_eq!(repo.search("portal.id").unwrap().len(), 2);
        assert!(repo.search("  ").unwrap().is_empty());
    }

    #[test]
    fn test_save_and_reload() {
        let (temp_dir, repo) = create_test_repo();
        let user = User::new("Rina", "rina@portal.id", UserRole::Admin);
        repo.upsert(user.clone()).unwrap();
        repo.save().unwrap();

        let repo2 = UserRepository::new(temp_dir.path().join("users.json"));
        repo2.load().unwrap();
        assert_eq!(repo2.get(user.id).unwrap().unwrap(), user);
    }
}
