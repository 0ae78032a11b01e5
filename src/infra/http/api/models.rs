use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::application::comments::CreateCommentCommand;
use crate::application::posts::{CreatePostCommand, UpdatePostCommand};
use crate::application::profiles::{CreateProfileCommand, UpdateProfileCommand};

#[derive(Debug, Deserialize, Serialize)]
pub struct PostCreateRequest {
    pub title: String,
    pub content: String,
    pub excerpt: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub image_url: Option<String>,
}

impl From<PostCreateRequest> for CreatePostCommand {
    fn from(request: PostCreateRequest) -> Self {
        Self {
            title: request.title,
            content: request.content,
            excerpt: request.excerpt,
            tags: request.tags,
            image_url: request.image_url,
        }
    }
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct PostUpdateRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub excerpt: Option<String>,
    pub tags: Option<Vec<String>>,
    pub image_url: Option<String>,
}

impl From<PostUpdateRequest> for UpdatePostCommand {
    fn from(request: PostUpdateRequest) -> Self {
        Self {
            title: request.title,
            content: request.content,
            excerpt: request.excerpt,
            tags: request.tags,
            image_url: request.image_url,
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct CommentCreateRequest {
    pub content: String,
}

impl From<CommentCreateRequest> for CreateCommentCommand {
    fn from(request: CommentCreateRequest) -> Self {
        Self {
            content: request.content,
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct ProfileCreateRequest {
    /// Optional; defaults to the forwarded subject and must match it.
    pub id: Option<Uuid>,
    pub name: String,
    pub email: String,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
}

impl From<ProfileCreateRequest> for CreateProfileCommand {
    fn from(request: ProfileCreateRequest) -> Self {
        Self {
            id: request.id,
            name: request.name,
            email: request.email,
            bio: request.bio,
            avatar_url: request.avatar_url,
        }
    }
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ProfileUpdateRequest {
    pub name: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
}

impl From<ProfileUpdateRequest> for UpdateProfileCommand {
    fn from(request: ProfileUpdateRequest) -> Self {
        Self {
            name: request.name,
            bio: request.bio,
            avatar_url: request.avatar_url,
        }
    }
}
