//! Blog posts: a flat, paginated collection addressed by id or slug.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::collection::entity::{default_true, Entity};
use crate::collection::page::{PageRequest, Pagination};
use crate::collection::payload::{self, Payload};
use crate::collection::repository::Repository;
use crate::document::validate::{require_text, validate_slug};
use crate::document::{DocumentId, Record, ValidationError};
use crate::error::{CoreError, CoreResult};
use crate::events::{ContentEvent, EventBus};
use crate::store::{DocumentStore, Filter, Query, Sort};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Blog {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub excerpt: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub featured_image: Option<String>,
    #[serde(default = "default_true")]
    pub is_published: bool,
}

impl Entity for Blog {
    const COLLECTION: &'static str = "blogs";
    const NAME: &'static str = "Blog";

    fn validate(&self) -> Result<(), ValidationError> {
        require_text(&[("title", &self.title), ("content", &self.content)])?;
        validate_slug(&self.slug)
    }
}

#[derive(Debug, Clone, Default)]
pub struct BlogQuery {
    pub page: PageRequest,
    pub category: Option<String>,
    pub tag: Option<String>,
    pub published: Option<bool>,
}

impl BlogQuery {
    fn filter(&self) -> Filter {
        let filter = Filter::new()
            .eq_opt("category", self.category.clone())
            .eq_opt("isPublished", self.published);
        match &self.tag {
            Some(tag) => filter.contains("tags", tag.as_str()),
            None => filter,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BlogPage {
    pub blogs: Vec<Record<Blog>>,
    pub pagination: Pagination,
}

pub struct BlogService {
    blogs: Repository<Blog>,
    events: EventBus,
}

impl BlogService {
    pub fn new(store: Arc<dyn DocumentStore>, events: EventBus) -> Self {
        Self {
            blogs: Repository::new(store),
            events,
        }
    }

    /// One page of posts, newest first, with the total of all matches.
    pub async fn list(&self, query: &BlogQuery) -> CoreResult<BlogPage> {
        let filter = query.filter();
        let total = self.blogs.count(&filter).await?;
        let page = Query::new(filter)
            .sort(Sort::newest_first())
            .skip(query.page.skip())
            .limit(query.page.limit);
        let blogs = self.blogs.find(&page).await?;
        Ok(BlogPage {
            blogs,
            pagination: Pagination::new(query.page, total),
        })
    }

    pub async fn get(&self, id: &DocumentId) -> CoreResult<Record<Blog>> {
        self.blogs.get_404(id).await
    }

    pub async fn by_slug(&self, slug: &str) -> CoreResult<Record<Blog>> {
        self.blogs
            .find_one(Filter::new().eq("slug", slug))
            .await?
            .ok_or_else(|| CoreError::not_found(Blog::NAME))
    }

    pub async fn create(&self, mut payload: Payload) -> CoreResult<Record<Blog>> {
        payload::normalise_slug(&mut payload, "title", None);
        let blog: Blog = payload::decode(payload)?;
        self.ensure_slug_free(&blog.slug, None).await?;

        let record = self.blogs.insert(&blog).await?;
        self.events
            .publish(ContentEvent::created(Blog::COLLECTION, &record.id));
        tracing::info!(blog_id = %record.id, slug = %record.body.slug, "blog created");
        Ok(record)
    }

    pub async fn update(&self, id: &DocumentId, mut patch: Payload) -> CoreResult<Record<Blog>> {
        let current = self.blogs.get_404(id).await?;
        payload::normalise_slug(&mut patch, "title", Some(current.body.title.as_str()));
        let blog = payload::merge(&current.body, patch)?;
        if blog.slug != current.body.slug {
            self.ensure_slug_free(&blog.slug, Some(id)).await?;
        }

        let record = self
            .blogs
            .replace(id, &blog)
            .await?
            .ok_or_else(|| CoreError::not_found(Blog::NAME))?;
        self.events
            .publish(ContentEvent::updated(Blog::COLLECTION, &record.id));
        Ok(record)
    }

    pub async fn delete(&self, id: &DocumentId) -> CoreResult<()> {
        if !self.blogs.delete(id).await? {
            return Err(CoreError::not_found(Blog::NAME));
        }
        self.events.publish(ContentEvent::deleted(Blog::COLLECTION, id));
        Ok(())
    }

    async fn ensure_slug_free(&self, slug: &str, except: Option<&DocumentId>) -> CoreResult<()> {
        if self.blogs.is_taken("slug", slug, except).await? {
            return Err(CoreError::Conflict(format!("A blog with slug `{slug}` already exists")));
        }
        Ok(())
    }
}
