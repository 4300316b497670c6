use crate::db::{decode, encode, Database, StoreError};
use crate::error::AppError;
use crate::models::todo::{Todo, TodoPatch};
use bincode::{Decode, Encode};
use tracing::{debug, info};

const TODOS_TREE: &str = "todos";

// Keys are `owner_id ++ 0x00 ++ todo_id`. Ids are uuids, so the separator
// never appears inside either half.
const KEY_SEPARATOR: u8 = 0;

#[derive(Debug, Encode, Decode)]
struct StoredTodo {
    id: String,
    title: String,
    completed: bool,
    created_at: i64, // milliseconds since epoch
    owner_id: String,
    seq: u64,
}

impl From<StoredTodo> for Todo {
    fn from(stored: StoredTodo) -> Self {
        Todo {
            id: stored.id,
            title: stored.title,
            completed: stored.completed,
            created_at: chrono::DateTime::from_timestamp_millis(stored.created_at)
                .unwrap_or_else(chrono::Utc::now),
            owner_id: stored.owner_id,
        }
    }
}

fn owner_prefix(owner_id: &str) -> Vec<u8> {
    let mut prefix = Vec::with_capacity(owner_id.len() + 1);
    prefix.extend_from_slice(owner_id.as_bytes());
    prefix.push(KEY_SEPARATOR);
    prefix
}

fn todo_key(owner_id: &str, id: &str) -> Vec<u8> {
    let mut key = owner_prefix(owner_id);
    key.extend_from_slice(id.as_bytes());
    key
}

fn validate_title(title: &str) -> Result<&str, AppError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(AppError::InvalidInput("Title is required".to_string()));
    }
    Ok(trimmed)
}

/// Todo store. Every operation is scoped by owner; there is no way to reach
/// a todo without knowing who owns it.
pub struct TodoRepository {
    db: Database,
}

impl TodoRepository {
    pub fn new(db: Database) -> Self {
        TodoRepository { db }
    }

    fn tree(&self) -> Result<sled::Tree, StoreError> {
        self.db.tree(TODOS_TREE)
    }

    pub async fn create(&self, owner_id: &str, title: &str) -> Result<Todo, AppError> {
        let title = validate_title(title)?;
        let tree = self.tree()?;

        let stored = StoredTodo {
            id: uuid::Uuid::new_v4().to_string(),
            title: title.to_string(),
            completed: false,
            created_at: chrono::Utc::now().timestamp_millis(),
            owner_id: owner_id.to_string(),
            seq: self.db.db.generate_id().map_err(StoreError::from)?,
        };

        tree.insert(todo_key(owner_id, &stored.id), encode(&stored)?)
            .map_err(StoreError::from)?;

        info!(owner_id = %owner_id, todo_id = %stored.id, "Todo created");

        Ok(Todo::from(stored))
    }

    /// All todos of one owner, newest first.
    pub async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<Todo>, AppError> {
        let tree = self.tree()?;

        let mut stored = Vec::new();
        for entry in tree.scan_prefix(owner_prefix(owner_id)) {
            let (_, value) = entry.map_err(StoreError::from)?;
            stored.push(decode::<StoredTodo>(&value)?);
        }
        stored.sort_by(|a, b| b.seq.cmp(&a.seq));

        Ok(stored.into_iter().map(Todo::from).collect())
    }

    /// Owner-scoped point read. Returns the raw bytes too, for compare-and-swap.
    fn fetch(tree: &sled::Tree, key: &[u8]) -> Result<(sled::IVec, StoredTodo), AppError> {
        let data = tree
            .get(key)
            .map_err(StoreError::from)?
            .ok_or(AppError::NotFound)?;
        let stored = decode::<StoredTodo>(&data)?;
        Ok((data, stored))
    }

    pub async fn find_by_id_and_owner(&self, id: &str, owner_id: &str) -> Result<Todo, AppError> {
        let tree = self.tree()?;
        let (_, stored) = Self::fetch(&tree, &todo_key(owner_id, id))?;
        Ok(Todo::from(stored))
    }

    /// Apply a partial update. Retries if the record changed underneath us.
    pub async fn update(&self, id: &str, owner_id: &str, patch: TodoPatch) -> Result<Todo, AppError> {
        let title = match patch.title.as_deref() {
            Some(title) => Some(validate_title(title)?.to_string()),
            None => None,
        };

        let tree = self.tree()?;
        let key = todo_key(owner_id, id);

        loop {
            let (current, mut stored) = Self::fetch(&tree, &key)?;
            if let Some(title) = &title {
                stored.title = title.clone();
            }
            if let Some(completed) = patch.completed {
                stored.completed = completed;
            }

            let swapped = tree
                .compare_and_swap(&key, Some(&current), Some(encode(&stored)?))
                .map_err(StoreError::from)?;

            match swapped {
                Ok(()) => {
                    info!(owner_id = %owner_id, todo_id = %id, "Todo updated");
                    return Ok(Todo::from(stored));
                }
                Err(_) => debug!(todo_id = %id, "Concurrent update, retrying"),
            }
        }
    }

    pub async fn delete(&self, id: &str, owner_id: &str) -> Result<(), AppError> {
        let tree = self.tree()?;

        match tree
            .remove(todo_key(owner_id, id))
            .map_err(StoreError::from)?
        {
            Some(_) => {
                info!(owner_id = %owner_id, todo_id = %id, "Todo deleted");
                Ok(())
            }
            None => Err(AppError::NotFound),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALICE: &str = "5b0ad7a4-6f3c-4f0e-9d5c-1f1f8a1c0a01";
    const BOB: &str = "9e2cbe43-0c44-4b7e-8a8e-6a4c3c2b0b02";

    fn repo() -> TodoRepository {
        TodoRepository::new(Database::in_memory().unwrap())
    }

    #[tokio::test]
    async fn test_create_then_list_newest_first() {
        let repo = repo();
        repo.create(ALICE, "Walk dog").await.unwrap();
        let milk = repo.create(ALICE, "Buy milk").await.unwrap();

        let todos = repo.list_by_owner(ALICE).await.unwrap();
        assert_eq!(todos.len(), 2);
        assert_eq!(todos[0], milk);
        assert_eq!(todos[0].title, "Buy milk");
        assert!(!todos[0].completed);
        assert_eq!(todos[0].owner_id, ALICE);
        assert_eq!(todos[1].title, "Walk dog");
    }

    #[tokio::test]
    async fn test_list_is_owner_scoped() {
        let repo = repo();
        repo.create(ALICE, "Alice's task").await.unwrap();
        repo.create(BOB, "Bob's task").await.unwrap();

        let todos = repo.list_by_owner(BOB).await.unwrap();
        assert_eq!(todos.len(), 1);
        assert_eq!(todos[0].title, "Bob's task");
    }

    #[tokio::test]
    async fn test_create_trims_and_rejects_empty_title() {
        let repo = repo();

        let todo = repo.create(ALICE, "  Buy milk  ").await.unwrap();
        assert_eq!(todo.title, "Buy milk");

        assert!(matches!(
            repo.create(ALICE, "").await,
            Err(AppError::InvalidInput(_))
        ));
        assert!(matches!(
            repo.create(ALICE, "   ").await,
            Err(AppError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_other_owner_gets_not_found() {
        let repo = repo();
        let todo = repo.create(BOB, "Secret").await.unwrap();

        assert!(matches!(
            repo.find_by_id_and_owner(&todo.id, ALICE).await,
            Err(AppError::NotFound)
        ));

        let patch = TodoPatch {
            title: Some("Hijacked".to_string()),
            completed: Some(true),
        };
        assert!(matches!(
            repo.update(&todo.id, ALICE, patch).await,
            Err(AppError::NotFound)
        ));
        assert!(matches!(
            repo.delete(&todo.id, ALICE).await,
            Err(AppError::NotFound)
        ));

        // Bob's todo survives untouched
        let still_there = repo.find_by_id_and_owner(&todo.id, BOB).await.unwrap();
        assert_eq!(still_there, todo);
    }

    #[tokio::test]
    async fn test_partial_update_leaves_other_fields() {
        let repo = repo();
        let todo = repo.create(ALICE, "Buy milk").await.unwrap();

        let toggled = repo
            .update(
                &todo.id,
                ALICE,
                TodoPatch {
                    completed: Some(true),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(toggled.completed);
        assert_eq!(toggled.title, "Buy milk");

        let renamed = repo
            .update(
                &todo.id,
                ALICE,
                TodoPatch {
                    title: Some("Buy oat milk".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(renamed.title, "Buy oat milk");
        assert!(renamed.completed);
        assert_eq!(renamed.created_at, todo.created_at);

        let stored = repo.find_by_id_and_owner(&todo.id, ALICE).await.unwrap();
        assert_eq!(stored, renamed);
    }

    #[tokio::test]
    async fn test_update_rejects_empty_title() {
        let repo = repo();
        let todo = repo.create(ALICE, "Buy milk").await.unwrap();

        let result = repo
            .update(
                &todo.id,
                ALICE,
                TodoPatch {
                    title: Some("  ".to_string()),
                    completed: Some(true),
                },
            )
            .await;
        assert!(matches!(result, Err(AppError::InvalidInput(_))));

        // Rejected patches change nothing
        let stored = repo.find_by_id_and_owner(&todo.id, ALICE).await.unwrap();
        assert_eq!(stored, todo);
    }

    #[tokio::test]
    async fn test_update_missing_todo() {
        let repo = repo();
        let result = repo.update("missing", ALICE, TodoPatch::default()).await;

        assert!(matches!(result, Err(AppError::NotFound)));
    }

    #[tokio::test]
    async fn test_delete_twice() {
        let repo = repo();
        let todo = repo.create(ALICE, "Buy milk").await.unwrap();

        assert!(repo.delete(&todo.id, ALICE).await.is_ok());
        assert!(matches!(
            repo.delete(&todo.id, ALICE).await,
            Err(AppError::NotFound)
        ));
        assert!(repo.list_by_owner(ALICE).await.unwrap().is_empty());
    }
}
