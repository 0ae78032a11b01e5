//! In-memory repositories shared by the integration tests.
//!
//! Mirrors the Postgres adapter: newest-first post listing, oldest-first
//! comments, the author-or-admin write policy, and cascading post deletes.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use time::{Duration, OffsetDateTime, macros::datetime};
use uuid::Uuid;

use inkpost::application::analytics::AnalyticsService;
use inkpost::application::comments::CommentService;
use inkpost::application::posts::PostService;
use inkpost::application::profiles::ProfileService;
use inkpost::application::repos::{
    Actor, AnalyticsRepo, CommentsRepo, CommentsWriteRepo, CreateCommentParams, CreatePostParams,
    CreateProfileParams, HealthRepo, PostsRepo, PostsWriteRepo, ProfilesRepo, ProfilesWriteRepo,
    RepoError, UpdatePostParams, UpdateProfileParams,
};
use inkpost::application::session::{ProfileIdentityProvider, Session};
use inkpost::cache::{CacheConfig, CacheHandles};
use inkpost::domain::entities::{
    AnalyticsSnapshot, CommentRecord, CommentWithAuthor, PostListing, PostRecord, ProfileRecord,
};
use inkpost::domain::types::UserRole;
use inkpost::infra::http::ApiState;

#[derive(Default)]
struct Tables {
    profiles: Vec<ProfileRecord>,
    posts: Vec<PostRecord>,
    comments: Vec<CommentRecord>,
}

/// Number of read queries that reached the store, per operation.
#[derive(Default)]
pub struct ReadCounters {
    pub list_posts: AtomicUsize,
    pub find_post: AtomicUsize,
    pub list_comments: AtomicUsize,
    pub find_profile: AtomicUsize,
    pub snapshot: AtomicUsize,
}

impl ReadCounters {
    pub fn get(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    ticks: AtomicI64,
    pub reads: ReadCounters,
    fail_views: AtomicBool,
    fail_pings: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().expect("tables lock")
    }

    /// Strictly increasing timestamps, one second apart.
    fn now(&self) -> OffsetDateTime {
        let tick = self.ticks.fetch_add(1, Ordering::SeqCst);
        datetime!(2024-03-01 12:00 UTC) + Duration::seconds(tick)
    }

    pub fn fail_views(&self, fail: bool) {
        self.fail_views.store(fail, Ordering::SeqCst);
    }

    pub fn fail_pings(&self, fail: bool) {
        self.fail_pings.store(fail, Ordering::SeqCst);
    }

    pub fn seed_profile(&self, name: &str, role: UserRole) -> ProfileRecord {
        let profile = ProfileRecord {
            id: Uuid::new_v4(),
            name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase()),
            role,
            bio: None,
            avatar_url: None,
            created_at: self.now(),
        };
        self.tables().profiles.push(profile.clone());
        profile
    }

    pub fn seed_post(&self, author_id: Uuid, title: &str) -> PostRecord {
        let now = self.now();
        let post = PostRecord {
            id: Uuid::new_v4(),
            title: title.to_string(),
            content: format!("{title} body"),
            excerpt: format!("{title} body"),
            author_id,
            tags: Vec::new(),
            image_url: None,
            views: 0,
            created_at: now,
            updated_at: now,
        };
        self.tables().posts.push(post.clone());
        post
    }

    pub fn views(&self, post_id: Uuid) -> Option<i64> {
        self.tables()
            .posts
            .iter()
            .find(|post| post.id == post_id)
            .map(|post| post.views)
    }

    /// Overwrite a view counter without going through the services.
    pub fn set_views(&self, post_id: Uuid, views: i64) {
        if let Some(post) = self.tables().posts.iter_mut().find(|post| post.id == post_id) {
            post.views = views;
        }
    }

    pub fn comment_count(&self) -> usize {
        self.tables().comments.len()
    }

    fn profile(tables: &Tables, id: Uuid) -> Result<ProfileRecord, RepoError> {
        tables
            .profiles
            .iter()
            .find(|profile| profile.id == id)
            .cloned()
            .ok_or_else(|| RepoError::InvalidInput {
                message: format!("unknown profile {id}"),
            })
    }

    fn listing(tables: &Tables, post: &PostRecord) -> Result<PostListing, RepoError> {
        let comment_count = tables
            .comments
            .iter()
            .filter(|comment| comment.post_id == post.id)
            .count() as u64;
        Ok(PostListing {
            post: post.clone(),
            author: Self::profile(tables, post.author_id)?,
            comment_count,
        })
    }
}

#[async_trait]
impl PostsRepo for MemoryStore {
    async fn list_posts(&self) -> Result<Vec<PostListing>, RepoError> {
        self.reads.list_posts.fetch_add(1, Ordering::SeqCst);
        let tables = self.tables();
        let mut posts: Vec<&PostRecord> = tables.posts.iter().collect();
        posts.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        posts
            .into_iter()
            .map(|post| Self::listing(&tables, post))
            .collect()
    }

    async fn find_post(&self, id: Uuid) -> Result<Option<PostListing>, RepoError> {
        self.reads.find_post.fetch_add(1, Ordering::SeqCst);
        let tables = self.tables();
        tables
            .posts
            .iter()
            .find(|post| post.id == id)
            .map(|post| Self::listing(&tables, post))
            .transpose()
    }
}

#[async_trait]
impl PostsWriteRepo for MemoryStore {
    async fn create_post(&self, params: CreatePostParams) -> Result<PostRecord, RepoError> {
        let now = self.now();
        let mut tables = self.tables();
        Self::profile(&tables, params.author_id)?;
        let post = PostRecord {
            id: Uuid::new_v4(),
            title: params.title,
            content: params.content,
            excerpt: params.excerpt,
            author_id: params.author_id,
            tags: params.tags,
            image_url: params.image_url,
            views: 0,
            created_at: now,
            updated_at: now,
        };
        tables.posts.push(post.clone());
        Ok(post)
    }

    async fn update_post(
        &self,
        actor: Actor,
        params: UpdatePostParams,
    ) -> Result<PostRecord, RepoError> {
        let now = self.now();
        let mut tables = self.tables();
        let post = tables
            .posts
            .iter_mut()
            .find(|post| post.id == params.id)
            .ok_or(RepoError::NotFound)?;
        if !actor.may_modify(post.author_id) {
            return Err(RepoError::Forbidden);
        }

        if let Some(title) = params.title {
            post.title = title;
        }
        if let Some(content) = params.content {
            post.content = content;
        }
        if let Some(excerpt) = params.excerpt {
            post.excerpt = excerpt;
        }
        if let Some(tags) = params.tags {
            post.tags = tags;
        }
        if let Some(image_url) = params.image_url {
            post.image_url = (!image_url.is_empty()).then_some(image_url);
        }
        post.updated_at = now;
        Ok(post.clone())
    }

    async fn delete_post(&self, actor: Actor, id: Uuid) -> Result<(), RepoError> {
        let mut tables = self.tables();
        let post = tables
            .posts
            .iter()
            .find(|post| post.id == id)
            .ok_or(RepoError::NotFound)?;
        if !actor.may_modify(post.author_id) {
            return Err(RepoError::Forbidden);
        }

        tables.posts.retain(|post| post.id != id);
        tables.comments.retain(|comment| comment.post_id != id);
        Ok(())
    }

    async fn increment_views(&self, id: Uuid) -> Result<(), RepoError> {
        if self.fail_views.load(Ordering::SeqCst) {
            return Err(RepoError::Timeout);
        }
        let mut tables = self.tables();
        let post = tables
            .posts
            .iter_mut()
            .find(|post| post.id == id)
            .ok_or(RepoError::NotFound)?;
        post.views += 1;
        Ok(())
    }
}

#[async_trait]
impl CommentsRepo for MemoryStore {
    async fn list_comments(&self, post_id: Uuid) -> Result<Vec<CommentWithAuthor>, RepoError> {
        self.reads.list_comments.fetch_add(1, Ordering::SeqCst);
        let tables = self.tables();
        let mut comments: Vec<&CommentRecord> = tables
            .comments
            .iter()
            .filter(|comment| comment.post_id == post_id)
            .collect();
        comments.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        comments
            .into_iter()
            .map(|comment| {
                Ok(CommentWithAuthor {
                    comment: comment.clone(),
                    author: Self::profile(&tables, comment.author_id)?,
                })
            })
            .collect()
    }
}

#[async_trait]
impl CommentsWriteRepo for MemoryStore {
    async fn create_comment(
        &self,
        params: CreateCommentParams,
    ) -> Result<CommentWithAuthor, RepoError> {
        let now = self.now();
        let mut tables = self.tables();
        if !tables.posts.iter().any(|post| post.id == params.post_id) {
            return Err(RepoError::NotFound);
        }
        let author = Self::profile(&tables, params.author_id)?;
        let comment = CommentRecord {
            id: Uuid::new_v4(),
            post_id: params.post_id,
            author_id: params.author_id,
            content: params.content,
            created_at: now,
        };
        tables.comments.push(comment.clone());
        Ok(CommentWithAuthor { comment, author })
    }
}

#[async_trait]
impl ProfilesRepo for MemoryStore {
    async fn find_profile(&self, id: Uuid) -> Result<Option<ProfileRecord>, RepoError> {
        self.reads.find_profile.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .tables()
            .profiles
            .iter()
            .find(|profile| profile.id == id)
            .cloned())
    }
}

#[async_trait]
impl ProfilesWriteRepo for MemoryStore {
    async fn create_profile(
        &self,
        params: CreateProfileParams,
    ) -> Result<ProfileRecord, RepoError> {
        let now = self.now();
        let mut tables = self.tables();
        if tables.profiles.iter().any(|profile| profile.id == params.id) {
            return Err(RepoError::Duplicate {
                constraint: "profiles_pkey".to_string(),
            });
        }
        let profile = ProfileRecord {
            id: params.id,
            name: params.name,
            email: params.email,
            role: params.role,
            bio: params.bio,
            avatar_url: params.avatar_url,
            created_at: now,
        };
        tables.profiles.push(profile.clone());
        Ok(profile)
    }

    async fn update_profile(
        &self,
        actor: Actor,
        params: UpdateProfileParams,
    ) -> Result<ProfileRecord, RepoError> {
        let mut tables = self.tables();
        let profile = tables
            .profiles
            .iter_mut()
            .find(|profile| profile.id == params.id)
            .ok_or(RepoError::NotFound)?;
        if !actor.may_modify(profile.id) {
            return Err(RepoError::Forbidden);
        }

        if let Some(name) = params.name {
            profile.name = name;
        }
        if let Some(bio) = params.bio {
            profile.bio = (!bio.is_empty()).then_some(bio);
        }
        if let Some(avatar_url) = params.avatar_url {
            profile.avatar_url = (!avatar_url.is_empty()).then_some(avatar_url);
        }
        Ok(profile.clone())
    }
}

#[async_trait]
impl AnalyticsRepo for MemoryStore {
    async fn snapshot(&self) -> Result<AnalyticsSnapshot, RepoError> {
        self.reads.snapshot.fetch_add(1, Ordering::SeqCst);
        let tables = self.tables();
        Ok(AnalyticsSnapshot {
            total_posts: tables.posts.len() as u64,
            total_comments: tables.comments.len() as u64,
            total_users: tables.profiles.len() as u64,
            total_views: tables.posts.iter().map(|post| post.views.max(0) as u64).sum(),
        })
    }
}

#[async_trait]
impl HealthRepo for MemoryStore {
    async fn ping(&self) -> Result<(), RepoError> {
        if self.fail_pings.load(Ordering::SeqCst) {
            return Err(RepoError::from_persistence("connection refused"));
        }
        Ok(())
    }
}

pub fn enabled_cache() -> Option<CacheHandles> {
    CacheHandles::build(CacheConfig::default())
}

pub struct Services {
    pub posts: Arc<PostService>,
    pub comments: Arc<CommentService>,
    pub profiles: Arc<ProfileService>,
    pub analytics: Arc<AnalyticsService>,
}

pub fn services(store: &Arc<MemoryStore>, cache: Option<CacheHandles>) -> Services {
    Services {
        posts: Arc::new(
            PostService::new(store.clone(), store.clone()).with_cache_opt(cache.clone()),
        ),
        comments: Arc::new(
            CommentService::new(store.clone(), store.clone()).with_cache_opt(cache.clone()),
        ),
        profiles: Arc::new(
            ProfileService::new(store.clone(), store.clone()).with_cache_opt(cache.clone()),
        ),
        analytics: Arc::new(AnalyticsService::new(store.clone()).with_cache_opt(cache)),
    }
}

pub fn api_state(store: &Arc<MemoryStore>, cache: Option<CacheHandles>) -> ApiState {
    let services = services(store, cache);
    ApiState {
        posts: services.posts,
        comments: services.comments,
        profiles: services.profiles,
        analytics: services.analytics,
        identity: Arc::new(ProfileIdentityProvider::new(store.clone())),
        health: store.clone(),
    }
}

pub fn session_for(profile: &ProfileRecord) -> Session {
    Session::authenticated(profile.id, profile.name.clone(), profile.role)
}
