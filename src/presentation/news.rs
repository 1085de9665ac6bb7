//! View models and templates for the news pages.

use askama::Template;
use chrono_tz::Tz;

use crate::domain::news::{NewsRecord, display_date};

use super::views::LayoutContext;

pub struct NewsRowView {
    pub id: i64,
    pub title: String,
    pub summary: String,
    pub image: String,
    pub date: String,
}

impl NewsRowView {
    pub fn from_record(record: &NewsRecord, tz: Tz) -> Self {
        Self {
            id: record.id,
            title: record.title.clone(),
            summary: record.summary.clone(),
            image: record.image.clone(),
            date: display_date(record.created_at, tz),
        }
    }
}

pub struct NewsListView {
    pub items: Vec<NewsRowView>,
}

impl NewsListView {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Shared by the create and edit pages; `current_image` is only set when editing.
pub struct NewsFormView {
    pub heading: &'static str,
    pub edit_id: Option<i64>,
    pub submit_label: &'static str,
    pub title: String,
    pub summary: String,
    pub body: String,
    pub current_image: Option<String>,
    pub max_image_label: String,
}

impl NewsFormView {
    pub fn create(max_image_label: String) -> Self {
        Self {
            heading: "Add news",
            edit_id: None,
            submit_label: "Publish",
            title: String::new(),
            summary: String::new(),
            body: String::new(),
            current_image: None,
            max_image_label,
        }
    }

    pub fn edit(record: &NewsRecord, max_image_label: String) -> Self {
        Self {
            heading: "Edit news",
            edit_id: Some(record.id),
            submit_label: "Save changes",
            title: record.title.clone(),
            summary: record.summary.clone(),
            body: record.body.clone(),
            current_image: Some(record.image.clone()),
            max_image_label,
        }
    }
}

/// Single post as shown on the show and delete-confirmation pages.
pub struct NewsDetailView {
    pub id: i64,
    pub title: String,
    pub summary: String,
    pub body: String,
    pub image: String,
    pub date: String,
}

impl NewsDetailView {
    pub fn from_record(record: NewsRecord, tz: Tz) -> Self {
        let date = display_date(record.created_at, tz);
        Self {
            id: record.id,
            title: record.title,
            summary: record.summary,
            body: record.body,
            image: record.image,
            date,
        }
    }
}

#[derive(Template)]
#[template(path = "news/list.html")]
pub struct NewsListTemplate {
    pub view: LayoutContext<NewsListView>,
}

#[derive(Template)]
#[template(path = "news/form.html")]
pub struct NewsFormTemplate {
    pub view: LayoutContext<NewsFormView>,
}

#[derive(Template)]
#[template(path = "news/show.html")]
pub struct NewsShowTemplate {
    pub view: LayoutContext<NewsDetailView>,
}

#[derive(Template)]
#[template(path = "news/delete.html")]
pub struct NewsDeleteTemplate {
    pub view: LayoutContext<NewsDetailView>,
}
