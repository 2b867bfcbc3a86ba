use clap::{Subcommand, ValueEnum};
use serde_json::{json, Map, Value};

use crate::cli::client::ApiClient;
use crate::cli::commands::auth::require_session;
use crate::cli::utils::{note_line, output_notes, output_record, output_success};
use crate::cli::OutputFormat;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SortBy {
    Title,
    CreatedAt,
    UpdatedAt,
}

impl SortBy {
    fn as_param(self) -> &'static str {
        match self {
            SortBy::Title => "title",
            SortBy::CreatedAt => "created_at",
            SortBy::UpdatedAt => "updated_at",
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Order {
    Asc,
    Desc,
}

#[derive(Subcommand)]
pub enum NotesCommands {
    #[command(about = "List notes")]
    List {
        #[arg(long, help = "Only notes in this category (case-insensitive)")]
        category: Option<String>,
        #[arg(long, help = "Only pinned (true) or unpinned (false) notes")]
        pinned: Option<bool>,
        #[arg(long, help = "Match text in title or content")]
        search: Option<String>,
        #[arg(long, value_enum)]
        sort_by: Option<SortBy>,
        #[arg(long, value_enum)]
        order: Option<Order>,
    },

    #[command(about = "Show one note")]
    Show { id: i64 },

    #[command(about = "Create a note")]
    Create {
        title: String,
        #[arg(long, default_value = "")]
        content: String,
        #[arg(long)]
        category: Option<String>,
        #[arg(long, help = "Hex color, e.g. #FFEEAA")]
        color: Option<String>,
        #[arg(long)]
        pinned: bool,
    },

    #[command(about = "Change fields of a note")]
    Edit {
        id: i64,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        content: Option<String>,
        #[arg(long, conflicts_with = "clear_category")]
        category: Option<String>,
        #[arg(long)]
        clear_category: bool,
        #[arg(long, conflicts_with = "clear_color")]
        color: Option<String>,
        #[arg(long)]
        clear_color: bool,
        #[arg(long)]
        pinned: Option<bool>,
    },

    #[command(about = "Delete a note")]
    Delete { id: i64 },

    #[command(about = "Toggle the pinned flag of a note")]
    Pin { id: i64 },
}

pub async fn handle(cmd: NotesCommands, client: &mut ApiClient, output_format: OutputFormat) -> anyhow::Result<()> {
    require_session(client)?;

    match cmd {
        NotesCommands::List { category, pinned, search, sort_by, order } => {
            let path = list_path(category.as_deref(), pinned, search.as_deref(), sort_by, order);
            let reply = client.get(&path).await?;
            output_notes(&output_format, reply.data())
        }
        NotesCommands::Show { id } => {
            let reply = client.get(&format!("/api/notes/{}", id)).await?;
            output_record(&output_format, reply.data())
        }
        NotesCommands::Create { title, content, category, color, pinned } => {
            let mut body = json!({ "title": title, "content": content, "isPinned": pinned });
            if let Some(category) = category {
                body["category"] = json!(category);
            }
            if let Some(color) = color {
                body["color"] = json!(color);
            }
            let reply = client.post("/api/notes", &body).await?;
            output_success(
                &output_format,
                &format!("Created note {}", note_line(reply.data()).trim()),
                Some(reply.data()),
            )
        }
        NotesCommands::Edit { id, title, content, category, clear_category, color, clear_color, pinned } => {
            let mut body = Map::new();
            if let Some(title) = title {
                body.insert("title".into(), json!(title));
            }
            if let Some(content) = content {
                body.insert("content".into(), json!(content));
            }
            if clear_category {
                body.insert("category".into(), Value::Null);
            } else if let Some(category) = category {
                body.insert("category".into(), json!(category));
            }
            if clear_color {
                body.insert("color".into(), Value::Null);
            } else if let Some(color) = color {
                body.insert("color".into(), json!(color));
            }
            if let Some(pinned) = pinned {
                body.insert("isPinned".into(), json!(pinned));
            }
            let reply = client.put(&format!("/api/notes/{}", id), &Value::Object(body)).await?;
            output_success(&output_format, &format!("Updated note {}", id), Some(reply.data()))
        }
        NotesCommands::Delete { id } => {
            client.delete(&format!("/api/notes/{}", id), None).await?;
            output_success(&output_format, &format!("Deleted note {}", id), None)
        }
        NotesCommands::Pin { id } => {
            let path = format!("/api/notes/{}", id);
            let current = client.get(&path).await?;
            let pinned = !current.data()["isPinned"].as_bool().unwrap_or(false);
            let reply = client.put(&path, &json!({ "isPinned": pinned })).await?;
            let verb = if pinned { "Pinned" } else { "Unpinned" };
            output_success(&output_format, &format!("{} note {}", verb, id), Some(reply.data()))
        }
    }
}

fn list_path(
    category: Option<&str>,
    pinned: Option<bool>,
    search: Option<&str>,
    sort_by: Option<SortBy>,
    order: Option<Order>,
) -> String {
    let mut query = url::form_urlencoded::Serializer::new(String::new());
    if let Some(category) = category {
        query.append_pair("category", category);
    }
    if let Some(pinned) = pinned {
        query.append_pair("isPinned", if pinned { "true" } else { "false" });
    }
    if let Some(search) = search {
        query.append_pair("search", search);
    }
    if let Some(sort_by) = sort_by {
        query.append_pair("sortBy", sort_by.as_param());
    }
    if let Some(order) = order {
        query.append_pair("order", match order {
            Order::Asc => "asc",
            Order::Desc => "desc",
        });
    }
    let query = query.finish();
    if query.is_empty() {
        "/api/notes".to_string()
    } else {
        format!("/api/notes?{}", query)
    }
}
