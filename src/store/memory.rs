//! In-memory implementation of every store trait, for tests.
//!
//! One mutex guards all tables, so each call is atomic the way a single
//! statement or transaction is in Postgres.

use std::{
    collections::{HashMap, HashSet},
    sync::{Arc, Mutex, MutexGuard},
};

use async_trait::async_trait;
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use super::{Storage, StoreError, StoreResult};
use crate::{
    comments::{
        repo::CommentStore,
        repo_types::{Comment, CommentWithAuthor, NewComment},
    },
    feed::query::{FeedQuery, SortOrder},
    followers::repo::FollowerStore,
    posts::{
        repo::PostStore,
        repo_types::{NewPost, Post, PostWithMetadata},
    },
    users::{
        repo::UserStore,
        repo_types::{NewUser, Role, User},
        roles::RoleStore,
    },
};

struct Invitation {
    user_id: Uuid,
    expiry: OffsetDateTime,
}

struct Tables {
    roles: Vec<Role>,
    users: HashMap<Uuid, User>,
    invitations: HashMap<String, Invitation>,
    posts: HashMap<Uuid, Post>,
    comments: Vec<Comment>,
    // (followed, follower)
    followers: HashSet<(Uuid, Uuid)>,
    clock: OffsetDateTime,
}

impl Tables {
    /// Strictly increasing timestamps so ordering assertions are stable.
    fn tick(&mut self) -> OffsetDateTime {
        self.clock += Duration::seconds(1);
        self.clock
    }
}

pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        let role = |id: i64, name: &str, level: i32| Role {
            id,
            name: name.into(),
            description: format!("{name} role"),
            level,
        };
        Self {
            tables: Mutex::new(Tables {
                roles: vec![role(1, "user", 1), role(2, "moderator", 2), role(3, "admin", 3)],
                users: HashMap::new(),
                invitations: HashMap::new(),
                posts: HashMap::new(),
                comments: Vec::new(),
                followers: HashSet::new(),
                clock: OffsetDateTime::now_utc() - Duration::days(1),
            }),
        }
    }
}

impl MemoryStore {
    fn lock(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().expect("memory store poisoned")
    }

    /// Insert an already-active user with the given role.
    pub fn seed_active_user(&self, username: &str, role_name: &str) -> User {
        let mut t = self.lock();
        let role = t
            .roles
            .iter()
            .find(|r| r.name == role_name)
            .cloned()
            .expect("seeded role exists");
        let now = t.tick();
        let user = User {
            id: Uuid::new_v4(),
            username: username.into(),
            email: format!("{username}@example.com"),
            password_hash: crate::auth::password::hash_password("password123")
                .expect("hash"),
            is_active: true,
            role,
            created_at: now,
            updated_at: now,
        };
        t.users.insert(user.id, user.clone());
        user
    }

    /// Existence regardless of the active flag.
    pub fn user_exists(&self, user_id: Uuid) -> bool {
        self.lock().users.contains_key(&user_id)
    }

    pub fn user_count(&self) -> usize {
        self.lock().users.len()
    }

    pub fn is_active(&self, user_id: Uuid) -> Option<bool> {
        self.lock().users.get(&user_id).map(|u| u.is_active)
    }

    pub fn invitation_count(&self, user_id: Uuid) -> usize {
        self.lock()
            .invitations
            .values()
            .filter(|i| i.user_id == user_id)
            .count()
    }

    pub fn invitation_hashes(&self) -> Vec<String> {
        self.lock().invitations.keys().cloned().collect()
    }

    pub fn follower_edges(&self) -> usize {
        self.lock().followers.len()
    }
}

impl Storage {
    pub fn memory() -> Self {
        Self::from_memory(Arc::new(MemoryStore::default()))
    }

    pub fn from_memory(m: Arc<MemoryStore>) -> Self {
        Self {
            users: m.clone(),
            posts: m.clone(),
            comments: m.clone(),
            followers: m.clone(),
            roles: m,
        }
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create_and_invite(
        &self,
        user: NewUser,
        token_hash: &str,
        expires_at: OffsetDateTime,
    ) -> StoreResult<User> {
        let mut t = self.lock();
        if t.users.values().any(|u| u.username == user.username) {
            return Err(StoreError::DuplicateUsername);
        }
        if t.users.values().any(|u| u.email == user.email) {
            return Err(StoreError::DuplicateEmail);
        }
        let role = t
            .roles
            .iter()
            .find(|r| r.name == user.role_name)
            .cloned()
            .ok_or(StoreError::NotFound)?;
        if t.invitations.contains_key(token_hash) {
            return Err(StoreError::Conflict);
        }
        let now = t.tick();
        let created = User {
            id: Uuid::new_v4(),
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
            is_active: false,
            role,
            created_at: now,
            updated_at: now,
        };
        t.users.insert(created.id, created.clone());
        t.invitations.insert(
            token_hash.to_string(),
            Invitation {
                user_id: created.id,
                expiry: expires_at,
            },
        );
        Ok(created)
    }

    async fn activate(&self, token_hash: &str) -> StoreResult<()> {
        let mut t = self.lock();
        let now = OffsetDateTime::now_utc();
        let user_id = match t.invitations.get(token_hash) {
            Some(inv) if inv.expiry > now => inv.user_id,
            _ => return Err(StoreError::NotFound),
        };
        let user = t.users.get_mut(&user_id).ok_or(StoreError::NotFound)?;
        user.is_active = true;
        user.updated_at = now;
        t.invitations.retain(|_, inv| inv.user_id != user_id);
        Ok(())
    }

    async fn delete(&self, user_id: Uuid) -> StoreResult<()> {
        let mut t = self.lock();
        if t.users.remove(&user_id).is_none() {
            return Err(StoreError::NotFound);
        }
        t.invitations.retain(|_, inv| inv.user_id != user_id);
        t.posts.retain(|_, p| p.user_id != user_id);
        t.comments.retain(|c| c.user_id != user_id);
        t.followers
            .retain(|(followed, follower)| *followed != user_id && *follower != user_id);
        Ok(())
    }

    async fn discard_invited(&self, token_hash: &str) -> StoreResult<()> {
        let mut t = self.lock();
        let user_id = t
            .invitations
            .get(token_hash)
            .map(|inv| inv.user_id)
            .filter(|id| t.users.get(id).is_some_and(|u| !u.is_active))
            .ok_or(StoreError::NotFound)?;
        t.users.remove(&user_id);
        t.invitations.retain(|_, inv| inv.user_id != user_id);
        Ok(())
    }

    async fn get_by_id(&self, user_id: Uuid) -> StoreResult<User> {
        self.lock()
            .users
            .get(&user_id)
            .filter(|u| u.is_active)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn get_by_email(&self, email: &str) -> StoreResult<User> {
        self.lock()
            .users
            .values()
            .find(|u| u.email == email && u.is_active)
            .cloned()
            .ok_or(StoreError::NotFound)
    }
}

#[async_trait]
impl RoleStore for MemoryStore {
    async fn get_by_name(&self, name: &str) -> StoreResult<Role> {
        self.lock()
            .roles
            .iter()
            .find(|r| r.name == name)
            .cloned()
            .ok_or(StoreError::NotFound)
    }
}

#[async_trait]
impl PostStore for MemoryStore {
    async fn create(&self, post: NewPost) -> StoreResult<Post> {
        let mut t = self.lock();
        if !t.users.contains_key(&post.user_id) {
            return Err(StoreError::NotFound);
        }
        let now = t.tick();
        let created = Post {
            id: Uuid::new_v4(),
            user_id: post.user_id,
            title: post.title,
            content: post.content,
            tags: post.tags,
            version: 0,
            created_at: now,
            updated_at: now,
        };
        t.posts.insert(created.id, created.clone());
        Ok(created)
    }

    async fn get_by_id(&self, post_id: Uuid) -> StoreResult<Post> {
        self.lock()
            .posts
            .get(&post_id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn update(&self, post: &Post) -> StoreResult<Post> {
        let mut t = self.lock();
        let now = t.tick();
        let stored = match t.posts.get_mut(&post.id) {
            Some(p) if p.version == post.version => p,
            _ => return Err(StoreError::VersionConflict),
        };
        stored.title = post.title.clone();
        stored.content = post.content.clone();
        stored.tags = post.tags.clone();
        stored.version += 1;
        stored.updated_at = now;
        Ok(stored.clone())
    }

    async fn delete(&self, post_id: Uuid) -> StoreResult<()> {
        let mut t = self.lock();
        if t.posts.remove(&post_id).is_none() {
            return Err(StoreError::NotFound);
        }
        t.comments.retain(|c| c.post_id != post_id);
        Ok(())
    }

    async fn user_feed(
        &self,
        user_id: Uuid,
        query: &FeedQuery,
    ) -> StoreResult<Vec<PostWithMetadata>> {
        let t = self.lock();
        let search = query.search.as_ref().map(|s| s.to_lowercase());
        let mut rows: Vec<PostWithMetadata> = t
            .posts
            .values()
            .filter(|p| p.user_id == user_id || t.followers.contains(&(p.user_id, user_id)))
            .filter(|p| match &search {
                Some(s) => {
                    p.title.to_lowercase().contains(s.as_str())
                        || p.content.to_lowercase().contains(s.as_str())
                }
                None => true,
            })
            .filter(|p| query.tags.iter().all(|tag| p.tags.contains(tag)))
            .filter(|p| query.since.map_or(true, |since| p.created_at >= since))
            .filter(|p| query.until.map_or(true, |until| p.created_at <= until))
            .map(|p| PostWithMetadata {
                post: p.clone(),
                username: t
                    .users
                    .get(&p.user_id)
                    .map(|u| u.username.clone())
                    .unwrap_or_default(),
                comments_count: t.comments.iter().filter(|c| c.post_id == p.id).count() as i64,
            })
            .collect();

        rows.sort_by(|a, b| {
            (a.post.created_at, a.post.id).cmp(&(b.post.created_at, b.post.id))
        });
        if query.sort == SortOrder::Desc {
            rows.reverse();
        }
        Ok(rows
            .into_iter()
            .skip(query.offset as usize)
            .take(query.limit as usize)
            .collect())
    }
}

#[async_trait]
impl CommentStore for MemoryStore {
    async fn create(&self, comment: NewComment) -> StoreResult<Comment> {
        let mut t = self.lock();
        if !t.posts.contains_key(&comment.post_id) || !t.users.contains_key(&comment.user_id) {
            return Err(StoreError::NotFound);
        }
        let now = t.tick();
        let created = Comment {
            id: Uuid::new_v4(),
            post_id: comment.post_id,
            user_id: comment.user_id,
            content: comment.content,
            created_at: now,
            updated_at: now,
        };
        t.comments.push(created.clone());
        Ok(created)
    }

    async fn list_by_post(&self, post_id: Uuid) -> StoreResult<Vec<CommentWithAuthor>> {
        let t = self.lock();
        let mut out: Vec<CommentWithAuthor> = t
            .comments
            .iter()
            .filter(|c| c.post_id == post_id)
            .filter_map(|c| {
                t.users.get(&c.user_id).map(|u| CommentWithAuthor {
                    comment: c.clone(),
                    username: u.username.clone(),
                })
            })
            .collect();
        out.sort_by(|a, b| b.comment.created_at.cmp(&a.comment.created_at));
        Ok(out)
    }
}

#[async_trait]
impl FollowerStore for MemoryStore {
    async fn follow(&self, follower_id: Uuid, user_id: Uuid) -> StoreResult<()> {
        let mut t = self.lock();
        if !t.users.contains_key(&user_id) || !t.users.contains_key(&follower_id) {
            return Err(StoreError::NotFound);
        }
        if !t.followers.insert((user_id, follower_id)) {
            return Err(StoreError::Conflict);
        }
        Ok(())
    }

    async fn unfollow(&self, follower_id: Uuid, user_id: Uuid) -> StoreResult<()> {
        if !self.lock().followers.remove(&(user_id, follower_id)) {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}
